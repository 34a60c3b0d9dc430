//! # PCM Accumulation Buffer
//!
//! Owned, growable store of interleaved `i16` samples used by every adapter
//! that produces samples in pieces.
//!
//! ## Growth Policy
//!
//! - First allocation is `min_capacity` samples (4096 by default)
//! - Capacity doubles until it covers the pending push, so reallocations stay
//!   O(log n)
//! - Capacity never exceeds the output ceiling, and the byte size of every
//!   requested capacity is checked before allocating
//! - A failed push releases everything accumulated so far

use crate::error::BufferError;
use bytes::Bytes;
use std::mem::size_of;
use tracing::{debug, warn};

/// Smallest capacity allocated on first push.
pub const MIN_CAPACITY: usize = 4096;

/// Largest sample count whose byte length still fits an `i32` length field.
pub const DEFAULT_MAX_SAMPLES: usize = (i32::MAX / 2) as usize;

/// Growable owner of interleaved 16-bit samples.
#[derive(Debug)]
pub struct PcmBuffer {
    samples: Vec<i16>,
    min_capacity: usize,
    max_samples: usize,
}

impl Default for PcmBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PcmBuffer {
    /// Create an empty buffer with the default growth limits.
    pub fn new() -> Self {
        Self::with_limits(MIN_CAPACITY, DEFAULT_MAX_SAMPLES)
    }

    /// Create an empty buffer. Nothing is allocated until the first push.
    pub fn with_limits(min_capacity: usize, max_samples: usize) -> Self {
        Self {
            samples: Vec::new(),
            min_capacity: min_capacity.max(1),
            max_samples,
        }
    }

    /// Append samples, growing by doubling if needed.
    ///
    /// # Errors
    ///
    /// - [`BufferError::OutputTooLarge`] if the total would pass the ceiling
    /// - [`BufferError::OutOfMemory`] if the new capacity is not addressable or
    ///   the allocator refuses it
    ///
    /// On error the buffer is emptied and its memory released.
    pub fn push(&mut self, samples: &[i16]) -> Result<(), BufferError> {
        if samples.is_empty() {
            return Ok(());
        }

        if let Err(err) = self.reserve_for(samples.len()) {
            warn!(
                "Releasing {} accumulated samples after growth failure: {}",
                self.samples.len(),
                err
            );
            self.release();
            return Err(err);
        }

        self.samples.extend_from_slice(samples);
        Ok(())
    }

    fn reserve_for(&mut self, count: usize) -> Result<(), BufferError> {
        let len = self.samples.len();
        let needed = len
            .checked_add(count)
            .ok_or(BufferError::OutputTooLarge {
                samples: u64::MAX,
                limit: self.max_samples,
            })?;

        if needed > self.max_samples {
            return Err(BufferError::OutputTooLarge {
                samples: needed as u64,
                limit: self.max_samples,
            });
        }

        let capacity = self.samples.capacity();
        if needed <= capacity {
            return Ok(());
        }

        let mut new_capacity = if capacity == 0 {
            self.min_capacity
        } else {
            capacity
        };
        while new_capacity < needed {
            new_capacity = new_capacity
                .checked_mul(2)
                .ok_or(BufferError::OutOfMemory { requested: needed })?;
        }
        // Doubling may overshoot the ceiling; the ceiling still covers `needed`.
        let new_capacity = new_capacity.min(self.max_samples);

        let byte_len = new_capacity
            .checked_mul(size_of::<i16>())
            .filter(|bytes| *bytes <= isize::MAX as usize)
            .ok_or(BufferError::OutOfMemory {
                requested: new_capacity,
            })?;

        self.samples
            .try_reserve_exact(new_capacity - len)
            .map_err(|_| BufferError::OutOfMemory {
                requested: new_capacity,
            })?;

        debug!(
            "Grew PCM buffer from {} to {} samples ({} bytes)",
            capacity, new_capacity, byte_len
        );
        Ok(())
    }

    fn release(&mut self) {
        self.samples = Vec::new();
    }

    /// Number of samples (all channels) accumulated.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Allocated capacity in samples. Always `>= len()`.
    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.samples
    }

    /// Consume the buffer into little-endian bytes.
    pub fn into_le_bytes(self) -> Result<Bytes, BufferError> {
        let byte_len = self
            .samples
            .len()
            .checked_mul(size_of::<i16>())
            .ok_or(BufferError::OutOfMemory {
                requested: self.samples.len(),
            })?;

        let mut out = Vec::new();
        out.try_reserve_exact(byte_len)
            .map_err(|_| BufferError::OutOfMemory {
                requested: self.samples.len(),
            })?;

        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }

        Ok(Bytes::from(out))
    }
}

/// Check a claimed `frames * channels` sample count against the ceiling
/// before anything is allocated from it.
///
/// The product is computed in 64 bits so hostile headers cannot wrap it.
pub fn ensure_output_fits(
    frames: u64,
    channels: u32,
    max_samples: usize,
) -> Result<usize, BufferError> {
    let samples = frames
        .checked_mul(u64::from(channels))
        .unwrap_or(u64::MAX);

    if samples > max_samples as u64 {
        return Err(BufferError::OutputTooLarge {
            samples,
            limit: max_samples,
        });
    }

    Ok(samples as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_buffer_is_unallocated() {
        let buffer = PcmBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 0);
    }

    #[test]
    fn test_first_push_allocates_min_capacity() {
        let mut buffer = PcmBuffer::new();
        buffer.push(&[1, 2, 3]).unwrap();
        assert_eq!(buffer.len(), 3);
        assert!(buffer.capacity() >= MIN_CAPACITY);
        assert_eq!(buffer.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_capacity_doubles() {
        let mut buffer = PcmBuffer::with_limits(4, 1024);
        buffer.push(&[0; 4]).unwrap();
        let first = buffer.capacity();
        assert!(first >= 4);

        buffer.push(&[0; 1]).unwrap();
        assert!(buffer.capacity() >= 8);

        // One large push doubles repeatedly in a single reallocation
        buffer.push(&[0; 100]).unwrap();
        assert_eq!(buffer.len(), 105);
        assert!(buffer.capacity() >= 128);
    }

    #[test]
    fn test_empty_push_is_noop() {
        let mut buffer = PcmBuffer::new();
        buffer.push(&[]).unwrap();
        assert_eq!(buffer.capacity(), 0);
    }

    #[test]
    fn test_push_past_ceiling_fails_and_releases() {
        let mut buffer = PcmBuffer::with_limits(4, 10);
        buffer.push(&[7; 8]).unwrap();

        let err = buffer.push(&[7; 3]).unwrap_err();
        assert_eq!(
            err,
            BufferError::OutputTooLarge {
                samples: 11,
                limit: 10
            }
        );
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 0);
    }

    #[test]
    fn test_capacity_clamped_to_ceiling() {
        let mut buffer = PcmBuffer::with_limits(8, 10);
        buffer.push(&[1; 9]).unwrap();
        buffer.push(&[1; 1]).unwrap();
        assert_eq!(buffer.len(), 10);
        assert!(buffer.capacity() >= 10);
    }

    #[test]
    fn test_into_le_bytes() {
        let mut buffer = PcmBuffer::new();
        buffer.push(&[1, -1, 0x1234, i16::MIN]).unwrap();
        let bytes = buffer.into_le_bytes().unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[0x01, 0x00, 0xFF, 0xFF, 0x34, 0x12, 0x00, 0x80]
        );
    }

    #[test]
    fn test_ensure_output_fits() {
        assert_eq!(ensure_output_fits(1000, 2, DEFAULT_MAX_SAMPLES).unwrap(), 2000);
        assert!(ensure_output_fits(DEFAULT_MAX_SAMPLES as u64, 1, DEFAULT_MAX_SAMPLES).is_ok());
        assert!(matches!(
            ensure_output_fits(DEFAULT_MAX_SAMPLES as u64, 2, DEFAULT_MAX_SAMPLES),
            Err(BufferError::OutputTooLarge { .. })
        ));
        // 36-bit frame count (FLAC maximum) times 8 channels
        assert!(matches!(
            ensure_output_fits((1u64 << 36) - 1, 8, DEFAULT_MAX_SAMPLES),
            Err(BufferError::OutputTooLarge { .. })
        ));
        assert!(matches!(
            ensure_output_fits(u64::MAX, u32::MAX, DEFAULT_MAX_SAMPLES),
            Err(BufferError::OutputTooLarge { samples: u64::MAX, .. })
        ));
    }

    proptest! {
        /// Chunked pushes produce the same contents as one push.
        #[test]
        fn chunked_push_matches_single_push(
            samples in proptest::collection::vec(any::<i16>(), 0..20_000),
            cuts in proptest::collection::vec(1usize..3000, 0..32),
        ) {
            let mut whole = PcmBuffer::new();
            whole.push(&samples).unwrap();

            let mut chunked = PcmBuffer::with_limits(1, DEFAULT_MAX_SAMPLES);
            let mut rest = samples.as_slice();
            for cut in cuts {
                let (head, tail) = rest.split_at(cut.min(rest.len()));
                chunked.push(head).unwrap();
                rest = tail;
            }
            chunked.push(rest).unwrap();

            prop_assert_eq!(chunked.as_slice(), whole.as_slice());
            prop_assert!(chunked.capacity() >= chunked.len());
        }
    }
}
