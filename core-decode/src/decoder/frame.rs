//! # Frame-Based Adapter
//!
//! Explicit decode loop for raw MPEG audio frames.
//!
//! Each step decodes at most one frame starting at the current offset. A step
//! reports how many bytes it consumed and, if a frame was decoded, its samples
//! and parameters. Desynchronized bytes consume input without producing a
//! frame and are skipped. The loop ends at end of input or on a step that
//! consumes nothing, so it makes at most `input.len()` steps.
//!
//! Channel count and sample rate come from the first frame that yields
//! samples. Later frames that report different parameters are still appended
//! but do not change the reported metadata.

use crate::buffer::PcmBuffer;
use crate::config::DecodeConfig;
#[cfg(feature = "decoder-mp3")]
use crate::decoder::DecodeAll;
use crate::decoder::DecodedAudio;
use crate::error::{DecodeError, Result};
use tracing::{debug, trace, warn};

/// Parameters of one decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub channels: u32,
    pub sample_rate: u32,
}

/// Outcome of decoding at one offset.
#[derive(Debug)]
pub struct FrameStep<'a> {
    /// Bytes consumed from the front of the input slice.
    pub consumed: usize,
    /// Interleaved samples of the decoded frame, if any.
    pub frame: Option<(FrameInfo, &'a [i16])>,
}

impl<'a> FrameStep<'a> {
    pub fn skipped(consumed: usize) -> Self {
        Self {
            consumed,
            frame: None,
        }
    }
}

/// A decoder that turns the frame at the front of a byte slice into samples.
pub trait FrameSource {
    fn decode_frame(&mut self, input: &[u8]) -> FrameStep<'_>;
}

/// Run the frame loop over the whole input.
pub fn decode_frames<S: FrameSource>(
    source: &mut S,
    input: &[u8],
    config: &DecodeConfig,
) -> Result<DecodedAudio> {
    let mut samples = PcmBuffer::with_limits(config.initial_capacity_samples, config.max_output_samples);
    let mut first: Option<FrameInfo> = None;
    let mut offset = 0usize;
    let mut frames = 0u64;
    let mut skipped_bytes = 0usize;

    while offset < input.len() {
        let step = source.decode_frame(&input[offset..]);

        if let Some((info, pcm)) = step.frame {
            if !pcm.is_empty() && info.channels > 0 && info.sample_rate > 0 {
                samples.push(pcm)?;
                frames += 1;

                match first {
                    None => {
                        debug!(
                            "First frame at offset {}: {} channels @ {} Hz",
                            offset, info.channels, info.sample_rate
                        );
                        first = Some(info);
                    }
                    Some(first) if first != info => {
                        trace!(
                            "Frame {} reports {:?}, keeping first frame's {:?}",
                            frames,
                            info,
                            first
                        );
                    }
                    Some(_) => {}
                }
            }
        } else {
            skipped_bytes += step.consumed;
        }

        if step.consumed == 0 {
            debug!("No forward progress at offset {}, stopping", offset);
            break;
        }
        offset = offset.saturating_add(step.consumed);
    }

    if skipped_bytes > 0 {
        debug!("Skipped {} bytes without a decodable frame", skipped_bytes);
    }

    match first {
        Some(info) if !samples.is_empty() => {
            debug!(
                "Decoded {} frames into {} samples",
                frames,
                samples.len()
            );
            Ok(DecodedAudio {
                samples,
                channels: info.channels,
                sample_rate: info.sample_rate,
            })
        }
        _ => {
            warn!("No decodable frame in {} input bytes", input.len());
            Err(DecodeError::DecodeFailed("no decodable frame".to_string()))
        }
    }
}

/// MPEG audio frames decoded by nanomp3.
#[cfg(feature = "decoder-mp3")]
pub struct NanoMp3Frames {
    inner: nanomp3::Decoder,
    pcm: [f32; nanomp3::MAX_SAMPLES_PER_FRAME],
    out: [i16; nanomp3::MAX_SAMPLES_PER_FRAME],
}

#[cfg(feature = "decoder-mp3")]
impl NanoMp3Frames {
    pub fn new() -> Self {
        Self {
            inner: nanomp3::Decoder::new(),
            pcm: [0.0; nanomp3::MAX_SAMPLES_PER_FRAME],
            out: [0; nanomp3::MAX_SAMPLES_PER_FRAME],
        }
    }
}

#[cfg(feature = "decoder-mp3")]
impl Default for NanoMp3Frames {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "decoder-mp3")]
impl FrameSource for NanoMp3Frames {
    fn decode_frame(&mut self, input: &[u8]) -> FrameStep<'_> {
        let (consumed, info) = self.inner.decode(input, &mut self.pcm);

        let Some(info) = info else {
            return FrameStep::skipped(consumed);
        };

        let channels = info.channels.num() as usize;
        // samples_produced counts frames (per channel)
        let total = info
            .samples_produced
            .saturating_mul(channels)
            .min(nanomp3::MAX_SAMPLES_PER_FRAME);

        for (dst, &src) in self.out[..total].iter_mut().zip(&self.pcm[..total]) {
            *dst = f32_to_i16(src);
        }

        FrameStep {
            consumed,
            frame: Some((
                FrameInfo {
                    channels: channels as u32,
                    sample_rate: info.sample_rate,
                },
                &self.out[..total],
            )),
        }
    }
}

/// MPEG audio adapter: the frame loop driven by nanomp3.
#[cfg(feature = "decoder-mp3")]
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameAdapter;

#[cfg(feature = "decoder-mp3")]
impl DecodeAll for FrameAdapter {
    type Error = DecodeError;

    fn decode_all(&self, input: &[u8], config: &DecodeConfig) -> Result<DecodedAudio> {
        let mut source = NanoMp3Frames::new();
        decode_frames(&mut source, input, config)
    }
}

/// Float to 16-bit conversion with the reference decoder's rounding.
pub fn f32_to_i16(sample: f32) -> i16 {
    let scaled = sample * 32768.0;
    if scaled >= 32766.5 {
        return i16::MAX;
    }
    if scaled <= -32767.5 {
        return i16::MIN;
    }
    let mut rounded = (scaled + 0.5) as i16;
    rounded -= (rounded < 0) as i16;
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed script of steps, one per call.
    struct Scripted {
        steps: Vec<(usize, Option<(FrameInfo, Vec<i16>)>)>,
        calls: usize,
        current: Vec<i16>,
    }

    impl Scripted {
        fn new(steps: Vec<(usize, Option<(FrameInfo, Vec<i16>)>)>) -> Self {
            Self {
                steps,
                calls: 0,
                current: Vec::new(),
            }
        }
    }

    impl FrameSource for Scripted {
        fn decode_frame(&mut self, _input: &[u8]) -> FrameStep<'_> {
            let step = self.steps.get(self.calls).cloned();
            self.calls += 1;

            match step {
                Some((consumed, Some((info, pcm)))) => {
                    self.current = pcm;
                    FrameStep {
                        consumed,
                        frame: Some((info, self.current.as_slice())),
                    }
                }
                Some((consumed, None)) => FrameStep::skipped(consumed),
                None => FrameStep::skipped(0),
            }
        }
    }

    const STEREO: FrameInfo = FrameInfo {
        channels: 2,
        sample_rate: 44100,
    };

    #[test]
    fn test_skips_junk_and_appends_frames() {
        let mut source = Scripted::new(vec![
            (3, None),
            (4, Some((STEREO, vec![1, 2, 3, 4]))),
            (4, Some((STEREO, vec![5, 6]))),
        ]);

        let decoded = decode_frames(&mut source, &[0u8; 11], &DecodeConfig::default()).unwrap();

        assert_eq!(decoded.samples.as_slice(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(source.calls, 3);
    }

    #[test]
    fn test_first_frame_parameters_win() {
        let mono = FrameInfo {
            channels: 1,
            sample_rate: 22050,
        };
        let mut source = Scripted::new(vec![
            (2, Some((STEREO, vec![1, 1]))),
            (2, Some((mono, vec![2]))),
        ]);

        let decoded = decode_frames(&mut source, &[0u8; 4], &DecodeConfig::default()).unwrap();

        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.samples.as_slice(), &[1, 1, 2]);
    }

    #[test]
    fn test_zero_consumed_terminates() {
        let mut source = Scripted::new(vec![(0, None)]);
        let result = decode_frames(&mut source, &[0u8; 1000], &DecodeConfig::default());

        assert!(matches!(result, Err(DecodeError::DecodeFailed(_))));
        assert_eq!(source.calls, 1);
    }

    #[test]
    fn test_zero_consumed_after_frame_keeps_output() {
        let mut source = Scripted::new(vec![(0, Some((STEREO, vec![7, 7])))]);
        let decoded = decode_frames(&mut source, &[0u8; 10], &DecodeConfig::default()).unwrap();

        assert_eq!(decoded.samples.as_slice(), &[7, 7]);
        assert_eq!(source.calls, 1);
    }

    #[test]
    fn test_all_junk_is_decode_failed() {
        let steps = (0..10).map(|_| (1, None)).collect();
        let mut source = Scripted::new(steps);
        let result = decode_frames(&mut source, &[0u8; 10], &DecodeConfig::default());

        assert!(matches!(result, Err(DecodeError::DecodeFailed(_))));
        assert_eq!(source.calls, 10);
    }

    #[test]
    fn test_ceiling_applies_to_frames() {
        let mut source = Scripted::new(vec![
            (1, Some((STEREO, vec![0; 4]))),
            (1, Some((STEREO, vec![0; 4]))),
        ]);
        let config = DecodeConfig::default().with_max_output_samples(6);
        let result = decode_frames(&mut source, &[0u8; 2], &config);

        assert!(matches!(result, Err(DecodeError::OutputTooLarge { samples: 8 })));
    }

    #[test]
    fn test_f32_to_i16() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), i16::MIN);
        assert_eq!(f32_to_i16(2.0), i16::MAX);
        assert_eq!(f32_to_i16(-2.0), i16::MIN);
        assert_eq!(f32_to_i16(0.5), 16384);
        assert_eq!(f32_to_i16(-0.5), -16384);
    }

    #[cfg(feature = "decoder-mp3")]
    #[test]
    fn test_nanomp3_garbage_yields_no_frame() {
        let mut source = NanoMp3Frames::new();
        let result = decode_frames(&mut source, &[0u8; 2048], &DecodeConfig::default());
        assert!(matches!(result, Err(DecodeError::DecodeFailed(_))));
    }
}
