//! # Sample Format Converter
//!
//! Converts symphonia's decoded buffers (any sample type, planar) into
//! interleaved signed 16-bit samples.

use crate::error::BufferError;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// Sample converter that normalizes audio to interleaved `i16`.
pub struct SampleConverter;

impl SampleConverter {
    /// Append the contents of `buffer` to `out` as interleaved `i16`.
    ///
    /// Integer sources wider than 16 bits keep their top 16 bits; float
    /// sources are scaled and clamped by symphonia's conversion rules.
    pub fn append_interleaved_i16(
        buffer: &AudioBufferRef<'_>,
        out: &mut Vec<i16>,
    ) -> Result<(), BufferError> {
        match buffer {
            AudioBufferRef::S16(buf) => Self::convert_and_interleave(buf, |sample: i16| sample, out),
            AudioBufferRef::F32(buf) => {
                Self::convert_and_interleave(buf, |sample: f32| sample.into_sample(), out)
            }
            AudioBufferRef::F64(buf) => {
                Self::convert_and_interleave(buf, |sample: f64| sample.into_sample(), out)
            }
            AudioBufferRef::S32(buf) => {
                Self::convert_and_interleave(buf, |sample: i32| sample.into_sample(), out)
            }
            AudioBufferRef::S24(buf) => {
                Self::convert_and_interleave(buf, |sample| IntoSample::into_sample(sample), out)
            }
            AudioBufferRef::S8(buf) => {
                Self::convert_and_interleave(buf, |sample: i8| sample.into_sample(), out)
            }
            AudioBufferRef::U32(buf) => {
                Self::convert_and_interleave(buf, |sample: u32| sample.into_sample(), out)
            }
            AudioBufferRef::U24(buf) => {
                Self::convert_and_interleave(buf, |sample| IntoSample::into_sample(sample), out)
            }
            AudioBufferRef::U16(buf) => {
                Self::convert_and_interleave(buf, |sample: u16| sample.into_sample(), out)
            }
            AudioBufferRef::U8(buf) => {
                Self::convert_and_interleave(buf, |sample: u8| sample.into_sample(), out)
            }
        }
    }

    /// Convert and interleave planar samples of any type (LLLL RRRR → LRLR).
    fn convert_and_interleave<T>(
        buf: &AudioBuffer<T>,
        convert: fn(T) -> i16,
        out: &mut Vec<i16>,
    ) -> Result<(), BufferError>
    where
        T: Sample + Copy,
    {
        let num_channels = buf.spec().channels.count();
        let num_frames = buf.frames();
        let total = num_frames
            .checked_mul(num_channels)
            .ok_or(BufferError::OutOfMemory { requested: usize::MAX })?;

        out.try_reserve(total)
            .map_err(|_| BufferError::OutOfMemory { requested: total })?;

        for frame_idx in 0..num_frames {
            for chan_idx in 0..num_channels {
                out.push(convert(buf.chan(chan_idx)[frame_idx]));
            }
        }

        Ok(())
    }
}
