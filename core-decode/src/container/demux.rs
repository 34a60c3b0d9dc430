//! General demuxer backend: symphonia's ISO-MP4 reader and AAC decoder,
//! reached through the temp-file bridge.
//!
//! Stages and their failures:
//!
//! 1. persist input → `TempFileWrite`
//! 2. open the temp file and probe the container → `Open`
//! 3. select an AAC audio stream → `Probe`
//! 4. open a decoder for it → `OpenStream`
//! 5. read / decode / convert loop → `Read`, `Allocate`, `OutputTooLarge`
//! 6. resolve output channels and rate → `Negotiate`
//! 7. nothing decoded → `Empty`
//!
//! The temp file is closed on every path, including failures.

use crate::buffer::{ensure_output_fits, PcmBuffer};
use crate::chunks::pull_chunks;
use crate::config::DecodeConfig;
use crate::container::temp_file::TempFileBridge;
use crate::decoder::symphonia::{
    declared_channels, default_channels, expected_codec, make_decoder, probe_format,
    select_track, PacketPump,
};
use crate::decoder::DecodedAudio;
use crate::error::ContainerError;
use crate::format::AudioContainer;
use symphonia::core::audio::{Channels, SignalSpec};
use symphonia::core::io::MediaSource;
use tracing::{debug, instrument, warn};

/// Decode MPEG-4 audio through a temp file.
#[instrument(skip(input, config), fields(bytes = input.len()))]
pub fn decode(input: &[u8], config: &DecodeConfig) -> Result<DecodedAudio, ContainerError> {
    let bridge = TempFileBridge::persist(input, AudioContainer::Mp4a.extension(), config)?;

    let result = decode_file(&bridge, config);

    if let Err(e) = bridge.close() {
        // The decode result stands either way
        debug!("Temp file cleanup failed after decode: {}", e);
    }

    result
}

fn decode_file(bridge: &TempFileBridge, config: &DecodeConfig) -> Result<DecodedAudio, ContainerError> {
    let file = bridge.reopen().map_err(|e| {
        warn!("Failed to reopen temp file: {}", e);
        ContainerError::Open(format!("Failed to reopen temp file: {}", e))
    })?;

    let source = Box::new(file) as Box<dyn MediaSource>;
    let reader = probe_format(source, AudioContainer::Mp4a).map_err(|e| {
        warn!("Container probe failed: {}", e);
        ContainerError::Open(format!("Failed to open container: {}", e))
    })?;

    let codec = expected_codec(AudioContainer::Mp4a);
    let track = select_track(reader.as_ref(), codec).ok_or_else(|| {
        warn!("No AAC audio stream in container");
        ContainerError::Probe("no AAC audio stream".to_string())
    })?;
    let track_id = track.id;
    let params = track.codec_params.clone();
    debug!(
        "Selected track {} of {} (codec {:?})",
        track_id,
        reader.tracks().len(),
        params.codec
    );

    let declared = declared_channels(&params);
    if let (Some(frames), Some(channels)) = (params.n_frames, declared) {
        ensure_output_fits(frames, channels.count() as u32, config.max_output_samples).map_err(
            |e| {
                warn!("Rejecting container before decode: {}", e);
                ContainerError::from(e)
            },
        )?;
    }

    let decoder = make_decoder(&params).map_err(|e| {
        warn!("Failed to open stream decoder: {}", e);
        ContainerError::OpenStream(format!("Failed to create codec decoder: {}", e))
    })?;

    let mut pump = PacketPump::new(reader, decoder, track_id);
    let mut samples = PcmBuffer::with_limits(config.initial_capacity_samples, config.max_output_samples);
    let mut scratch = Vec::new();

    pull_chunks(&mut samples, &mut scratch, |out| pump.next_chunk(out)).map_err(|e| {
        let err = ContainerError::from(e);
        warn!("Container read failed: {}", err);
        err
    })?;

    if samples.is_empty() {
        warn!("Container stream produced no samples");
        return Err(ContainerError::Empty);
    }

    let output = negotiate(declared, params.sample_rate, pump.spec())?;
    debug!(
        "Decoded {} samples, output layout {:?} @ {} Hz",
        samples.len(),
        output.layout,
        output.sample_rate
    );

    Ok(DecodedAudio {
        samples,
        channels: output.layout.count() as u32,
        sample_rate: output.sample_rate,
    })
}

/// Resolved interleaved output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutputFormat {
    layout: Channels,
    sample_rate: u32,
}

/// Fix the output format from what the decoder produced and what the
/// container declared.
///
/// Decoded buffers win. A decoded layout with no positions falls back to the
/// declared layout; a declared layout whose count disagrees with the decoded
/// count is replaced by the default layout for that count.
fn negotiate(
    declared: Option<Channels>,
    declared_rate: Option<u32>,
    decoded: Option<SignalSpec>,
) -> Result<OutputFormat, ContainerError> {
    let count = decoded
        .map(|spec| spec.channels.count())
        .filter(|&count| count > 0)
        .or_else(|| declared.map(|layout| layout.count()))
        .unwrap_or(0);

    let layout = match declared {
        Some(layout) if layout.count() == count => layout,
        _ => {
            let layout = default_channels(count as u32);
            debug!("No usable channel layout, using default for {} channels", count);
            layout
        }
    };

    let sample_rate = decoded
        .map(|spec| spec.rate)
        .filter(|&rate| rate > 0)
        .or(declared_rate)
        .unwrap_or(0);

    if layout.count() == 0 || sample_rate == 0 {
        warn!(
            "Cannot negotiate output: {} channels @ {} Hz",
            layout.count(),
            sample_rate
        );
        return Err(ContainerError::Negotiate(format!(
            "{} channels @ {} Hz",
            layout.count(),
            sample_rate
        )));
    }

    Ok(OutputFormat { layout, sample_rate })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo() -> Channels {
        Channels::FRONT_LEFT | Channels::FRONT_RIGHT
    }

    #[test]
    fn test_negotiate_prefers_decoded_spec() {
        let decoded = SignalSpec::new(48000, stereo());
        let output = negotiate(Some(stereo()), Some(44100), Some(decoded)).unwrap();
        assert_eq!(output.layout, stereo());
        assert_eq!(output.sample_rate, 48000);
    }

    #[test]
    fn test_negotiate_defaults_layout_from_count() {
        let six = Channels::FRONT_LEFT
            | Channels::FRONT_RIGHT
            | Channels::FRONT_CENTRE
            | Channels::LFE1
            | Channels::REAR_LEFT
            | Channels::REAR_RIGHT;
        let decoded = SignalSpec::new(44100, six);

        // Declared layout disagrees with what was decoded
        let output = negotiate(Some(stereo()), None, Some(decoded)).unwrap();
        assert_eq!(output.layout.count(), 6);

        let output = negotiate(None, Some(22050), None);
        assert!(matches!(output, Err(ContainerError::Negotiate(_))));
    }

    #[test]
    fn test_negotiate_falls_back_to_declared() {
        let output = negotiate(Some(Channels::FRONT_LEFT), Some(8000), None).unwrap();
        assert_eq!(output.layout, Channels::FRONT_LEFT);
        assert_eq!(output.sample_rate, 8000);
    }

    #[test]
    fn test_negotiate_rejects_missing_rate() {
        let result = negotiate(Some(stereo()), None, None);
        assert!(matches!(result, Err(ContainerError::Negotiate(_))));
    }

    #[test]
    fn test_garbage_fails_at_open_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let config = DecodeConfig::default().with_temp_dir(dir.path());

        let err = decode(&[0x42u8; 1024], &config).unwrap_err();
        assert!(matches!(err, ContainerError::Open(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_flac_stream_fails_at_open() {
        let dir = tempfile::tempdir().unwrap();
        let config = DecodeConfig::default().with_temp_dir(dir.path());

        let mut flac = b"fLaC\x80\0\0\x22".to_vec();
        flac.resize(2048, 0);
        let err = decode(&flac, &config).unwrap_err();
        assert!(matches!(err, ContainerError::Open(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_aac_track_decodes_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let config = DecodeConfig::default().with_temp_dir(dir.path());

        let m4a = include_bytes!("../../tests/fixtures/silence_mono.m4a");
        let audio = decode(m4a, &config).unwrap();
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.sample_rate, 44100);
        assert!(!audio.samples.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_temp_dir_is_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = DecodeConfig::default().with_temp_dir(dir.path().join("missing"));

        let err = decode(b"\0\0\0\x20ftypM4A ", &config).unwrap_err();
        assert!(matches!(err, ContainerError::TempFileWrite(_)));
    }
}
