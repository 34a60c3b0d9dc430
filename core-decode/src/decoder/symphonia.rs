//! # Symphonia Decode Primitives
//!
//! The decode-entire-input primitive shared by the lossless and transform
//! adapters, plus the probe / track / decoder / packet-pump pieces the
//! general demuxer composes with its own staged error mapping.
//!
//! ```text
//! MediaSource → MediaSourceStream → FormatReader → Decoder → PacketPump → PcmBuffer
//! ```
//!
//! The crate builds symphonia with `default-features = false`, so the
//! registries only carry the readers and decoders enabled by this crate's
//! features. Each family opens its input with a registry holding its own
//! reader alone, and only decodes a track carrying its own codec.

use crate::buffer::{ensure_output_fits, PcmBuffer};
use crate::chunks::{pull_chunks, Pull};
use crate::config::DecodeConfig;
use crate::decoder::sample_converter::SampleConverter;
use crate::decoder::DecodedAudio;
use crate::error::{BufferError, ContainerError, DecodeError};
use crate::format::AudioContainer;
use std::io::{Cursor, ErrorKind};
use std::sync::OnceLock;
use symphonia::core::audio::{Channels, SignalSpec};
use symphonia::core::codecs::{
    CodecParameters, CodecRegistry, CodecType, Decoder, DecoderOptions, CODEC_TYPE_AAC,
    CODEC_TYPE_FLAC, CODEC_TYPE_MP3, CODEC_TYPE_VORBIS,
};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Track};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::{Hint, Probe};
use tracing::{debug, error, trace, warn};

/// Decode errors tolerated in a row before the stream is considered broken.
const MAX_CONSECUTIVE_ERRORS: usize = 10;

fn codec_registry() -> &'static CodecRegistry {
    static CODECS: OnceLock<CodecRegistry> = OnceLock::new();

    CODECS.get_or_init(|| {
        let mut codecs = CodecRegistry::new();

        #[cfg(feature = "decoder-flac")]
        codecs.register_all::<symphonia_bundle_flac::FlacDecoder>();

        #[cfg(feature = "decoder-vorbis")]
        codecs.register_all::<symphonia_codec_vorbis::VorbisDecoder>();

        #[cfg(feature = "container-demux")]
        codecs.register_all::<symphonia_codec_aac::AacDecoder>();

        debug!("Initialized symphonia codec registry");
        codecs
    })
}

/// Reader registry holding only the format reader of one family.
///
/// symphonia's `Probe` ignores the hint and accepts whichever registered
/// reader's marker it finds first, so families never share one.
fn reader_registry(container: AudioContainer) -> &'static Probe {
    static FLAC: OnceLock<Probe> = OnceLock::new();
    static OGG: OnceLock<Probe> = OnceLock::new();
    static ISOMP4: OnceLock<Probe> = OnceLock::new();
    static NONE: OnceLock<Probe> = OnceLock::new();

    let cell = match container {
        AudioContainer::Flac => &FLAC,
        AudioContainer::Vorbis => &OGG,
        AudioContainer::Mp4a => &ISOMP4,
        AudioContainer::Mp3 => &NONE,
    };

    cell.get_or_init(|| {
        let mut readers = Probe::default();

        match container {
            #[cfg(feature = "decoder-flac")]
            AudioContainer::Flac => readers.register_all::<symphonia_bundle_flac::FlacReader>(),
            #[cfg(feature = "decoder-vorbis")]
            AudioContainer::Vorbis => readers.register_all::<symphonia_format_ogg::OggReader>(),
            #[cfg(feature = "container-demux")]
            AudioContainer::Mp4a => readers.register_all::<symphonia_format_isomp4::IsoMp4Reader>(),
            _ => debug!("No bundled reader for {}", container),
        }

        debug!("Initialized {} reader registry", container);
        readers
    })
}

/// Codec a family's track must carry to be decoded.
pub(crate) fn expected_codec(container: AudioContainer) -> CodecType {
    match container {
        AudioContainer::Flac => CODEC_TYPE_FLAC,
        AudioContainer::Vorbis => CODEC_TYPE_VORBIS,
        AudioContainer::Mp3 => CODEC_TYPE_MP3,
        AudioContainer::Mp4a => CODEC_TYPE_AAC,
    }
}

/// Probe hint for a container family.
pub(crate) fn hint_for(container: AudioContainer) -> Hint {
    let mut hint = Hint::new();
    hint.with_extension(container.extension());
    hint.mime_type(container.mime_type());
    hint
}

/// Open a format reader for `source` using only the reader of `container`.
pub(crate) fn probe_format(
    source: Box<dyn MediaSource>,
    container: AudioContainer,
) -> Result<Box<dyn FormatReader>, SymphoniaError> {
    let mss = MediaSourceStream::new(source, Default::default());

    let probed = reader_registry(container).format(
        &hint_for(container),
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    Ok(probed.format)
}

/// Pick the audio track carrying `codec`: the container's default track if
/// it matches, else the first track that does.
pub(crate) fn select_track(reader: &dyn FormatReader, codec: CodecType) -> Option<&Track> {
    reader
        .default_track()
        .filter(|track| track.codec_params.codec == codec)
        .or_else(|| {
            reader
                .tracks()
                .iter()
                .find(|track| track.codec_params.codec == codec)
        })
}

/// Instantiate a decoder for a track's codec parameters.
pub(crate) fn make_decoder(params: &CodecParameters) -> Result<Box<dyn Decoder>, SymphoniaError> {
    codec_registry().make(params, &DecoderOptions::default())
}

/// Channel set declared by the codec parameters, if any.
pub(crate) fn declared_channels(params: &CodecParameters) -> Option<Channels> {
    params
        .channels
        .or_else(|| params.channel_layout.map(|layout| layout.into_channels()))
}

/// Default channel set for a bare channel count.
///
/// Mono maps to front-left, stereo to front-left | front-right, anything
/// else to the first `count` positions.
#[cfg_attr(not(feature = "container-demux"), allow(dead_code))]
pub(crate) fn default_channels(count: u32) -> Channels {
    match count {
        0 => Channels::empty(),
        1 => Channels::FRONT_LEFT,
        2 => Channels::FRONT_LEFT | Channels::FRONT_RIGHT,
        n if n >= 32 => Channels::all(),
        n => Channels::from_bits_truncate((1u32 << n) - 1),
    }
}

/// Failure inside the packet pump.
#[derive(Debug)]
pub(crate) enum PumpError {
    /// The format reader failed for a reason other than end of stream.
    Read(String),
    /// The decoder failed fatally or too many packets in a row were corrupt.
    Decode(String),
    Buffer(BufferError),
}

impl From<BufferError> for PumpError {
    fn from(err: BufferError) -> Self {
        PumpError::Buffer(err)
    }
}

impl From<PumpError> for DecodeError {
    fn from(err: PumpError) -> Self {
        match err {
            PumpError::Read(msg) | PumpError::Decode(msg) => DecodeError::DecodeFailed(msg),
            PumpError::Buffer(err) => err.into(),
        }
    }
}

impl From<PumpError> for ContainerError {
    fn from(err: PumpError) -> Self {
        match err {
            PumpError::Read(msg) | PumpError::Decode(msg) => ContainerError::Read(msg),
            PumpError::Buffer(err) => err.into(),
        }
    }
}

/// Reads packets of one track, decodes them and converts each decoded
/// buffer to interleaved `i16`.
pub(crate) struct PacketPump {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    finished: bool,
    consecutive_errors: usize,
    spec: Option<SignalSpec>,
    packets: u64,
}

impl PacketPump {
    pub(crate) fn new(reader: Box<dyn FormatReader>, decoder: Box<dyn Decoder>, track_id: u32) -> Self {
        Self {
            reader,
            decoder,
            track_id,
            finished: false,
            consecutive_errors: 0,
            spec: None,
            packets: 0,
        }
    }

    /// Signal spec of the first decoded buffer.
    pub(crate) fn spec(&self) -> Option<SignalSpec> {
        self.spec
    }

    /// Decode the next non-empty packet of the track into `out`.
    pub(crate) fn next_chunk(&mut self, out: &mut Vec<i16>) -> Result<Pull, PumpError> {
        loop {
            if self.finished {
                return Ok(Pull::End);
            }

            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    self.finish();
                    return Ok(Pull::End);
                }
                Err(SymphoniaError::ResetRequired) => {
                    // Chained stream; only the first one is decoded.
                    debug!("Track list changed, ending at first stream");
                    self.finish();
                    return Ok(Pull::End);
                }
                Err(e) => {
                    error!("Fatal format reader error: {}", e);
                    return Err(PumpError::Read(format!("Failed to read packet: {}", e)));
                }
            };

            // Drain metadata revisions read along with the packet
            while !self.reader.metadata().is_latest() {
                self.reader.metadata().pop();
            }

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    self.consecutive_errors = 0;
                    self.packets += 1;

                    if self.spec.is_none() {
                        let spec = *decoded.spec();
                        debug!(
                            "First decoded packet: {} Hz, {} channels",
                            spec.rate,
                            spec.channels.count()
                        );
                        self.spec = Some(spec);
                    }

                    if decoded.frames() == 0 {
                        continue;
                    }

                    trace!("Decoded packet {}: {} frames", self.packets, decoded.frames());
                    SampleConverter::append_interleaved_i16(&decoded, out)?;
                    return Ok(Pull::Chunk);
                }
                Err(SymphoniaError::DecodeError(msg)) => {
                    self.consecutive_errors += 1;
                    warn!(
                        "Skipping corrupt packet ({}/{}): {}",
                        self.consecutive_errors, MAX_CONSECUTIVE_ERRORS, msg
                    );

                    if self.consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!("Too many consecutive decode errors, giving up");
                        return Err(PumpError::Decode(format!(
                            "{} consecutive corrupt packets: {}",
                            MAX_CONSECUTIVE_ERRORS, msg
                        )));
                    }
                }
                Err(e) => {
                    error!("Fatal decoder error: {}", e);
                    return Err(PumpError::Decode(format!("Failed to decode packet: {}", e)));
                }
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        let result = self.decoder.finalize();
        if let Some(verify_ok) = result.verify_ok {
            debug!("Decoder verification after {} packets: {}", self.packets, verify_ok);
        }
    }
}

/// Decode an entire in-memory input with the bundled symphonia readers.
///
/// Failures map into the simple family: anything the backend rejects is
/// `DecodeFailed`, the size ceiling is `OutputTooLarge`, allocation failure
/// is `OutOfMemory`.
pub(crate) fn decode_entire(
    input: &[u8],
    container: AudioContainer,
    config: &DecodeConfig,
) -> Result<DecodedAudio, DecodeError> {
    if !container.has_leading_signature(input) {
        warn!("Input does not start with a {} stream", container);
        return Err(DecodeError::DecodeFailed(format!(
            "missing {} stream signature",
            container
        )));
    }

    let mut owned = Vec::new();
    owned
        .try_reserve_exact(input.len())
        .map_err(|_| DecodeError::OutOfMemory)?;
    owned.extend_from_slice(input);

    let source = Box::new(Cursor::new(owned)) as Box<dyn MediaSource>;
    let reader = probe_format(source, container).map_err(|e| {
        warn!("Format probe failed for {}: {}", container, e);
        DecodeError::DecodeFailed(format!("Failed to probe format: {}", e))
    })?;

    let codec = expected_codec(container);
    let track = select_track(reader.as_ref(), codec).ok_or_else(|| {
        warn!("No track with codec {} in {} input", codec, container);
        DecodeError::DecodeFailed(format!("No {} audio track", container))
    })?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    if let (Some(frames), Some(channels)) = (params.n_frames, declared_channels(&params)) {
        ensure_output_fits(frames, channels.count() as u32, config.max_output_samples)
            .map_err(|e| {
                warn!("Rejecting {} input before decode: {}", container, e);
                DecodeError::from(e)
            })?;
    }

    let decoder = make_decoder(&params).map_err(|e| {
        warn!("Failed to create {} decoder: {}", container, e);
        DecodeError::DecodeFailed(format!("Failed to create codec decoder: {}", e))
    })?;

    let mut pump = PacketPump::new(reader, decoder, track_id);
    let mut samples = PcmBuffer::with_limits(config.initial_capacity_samples, config.max_output_samples);
    let mut scratch = Vec::new();

    pull_chunks(&mut samples, &mut scratch, |out| pump.next_chunk(out)).map_err(|e| {
        let err = DecodeError::from(e);
        warn!("Decoding {} failed mid-stream: {}", container, err);
        err
    })?;

    let (channels, sample_rate) = match pump.spec() {
        Some(spec) => (spec.channels.count() as u32, spec.rate),
        None => (
            declared_channels(&params).map_or(0, |c| c.count() as u32),
            params.sample_rate.unwrap_or(0),
        ),
    };

    if samples.is_empty() || channels == 0 || sample_rate == 0 {
        warn!("{} input produced no usable samples", container);
        return Err(DecodeError::DecodeFailed(
            "backend produced no samples".to_string(),
        ));
    }

    debug!(
        "Decoded {} samples ({} channels @ {} Hz) from {} input",
        samples.len(),
        channels,
        sample_rate,
        container
    );

    Ok(DecodedAudio {
        samples,
        channels,
        sample_rate,
    })
}
