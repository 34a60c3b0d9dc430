//! Shared chunk-pull loop.
//!
//! Every backend that produces samples in pieces reads one chunk into a
//! scratch vector, appends it to the [`PcmBuffer`], and repeats until the
//! source reports end of stream or fails.

use crate::buffer::PcmBuffer;
use crate::error::BufferError;
use tracing::trace;

/// Outcome of one read callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    /// The scratch vector holds the next chunk (possibly empty).
    Chunk,
    /// Natural end of stream. Anything left in the scratch vector is still
    /// appended.
    End,
}

/// Pull chunks from `read` into `buffer` until [`Pull::End`] or an error.
///
/// `scratch` is cleared before each call to `read` and reused across calls.
/// An error from `read` or from the buffer aborts immediately; the caller
/// owns cleanup of whatever `read` borrowed, the buffer releases itself.
///
/// Returns the number of chunks pulled.
pub fn pull_chunks<E, F>(
    buffer: &mut PcmBuffer,
    scratch: &mut Vec<i16>,
    mut read: F,
) -> Result<usize, E>
where
    E: From<BufferError>,
    F: FnMut(&mut Vec<i16>) -> Result<Pull, E>,
{
    let mut chunks = 0usize;

    loop {
        scratch.clear();
        let step = read(scratch)?;

        if !scratch.is_empty() {
            buffer.push(scratch)?;
            chunks += 1;
        }

        if step == Pull::End {
            trace!("Chunk pull finished after {} chunks", chunks);
            return Ok(chunks);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContainerError;

    #[test]
    fn test_pulls_until_end() {
        let mut buffer = PcmBuffer::new();
        let mut scratch = Vec::new();
        let mut calls = 0;

        let chunks = pull_chunks::<ContainerError, _>(&mut buffer, &mut scratch, |out| {
            calls += 1;
            if calls > 3 {
                return Ok(Pull::End);
            }
            out.extend_from_slice(&[calls as i16; 4]);
            Ok(Pull::Chunk)
        })
        .unwrap();

        assert_eq!(chunks, 3);
        assert_eq!(buffer.len(), 12);
        assert_eq!(&buffer.as_slice()[..4], &[1, 1, 1, 1]);
        assert_eq!(&buffer.as_slice()[8..], &[3, 3, 3, 3]);
    }

    #[test]
    fn test_end_with_trailing_samples() {
        let mut buffer = PcmBuffer::new();
        let mut scratch = Vec::new();

        pull_chunks::<ContainerError, _>(&mut buffer, &mut scratch, |out| {
            out.push(5);
            Ok(Pull::End)
        })
        .unwrap();

        assert_eq!(buffer.as_slice(), &[5]);
    }

    #[test]
    fn test_read_error_aborts() {
        let mut buffer = PcmBuffer::new();
        let mut scratch = Vec::new();
        let mut calls = 0;

        let result = pull_chunks(&mut buffer, &mut scratch, |out| {
            calls += 1;
            if calls == 2 {
                return Err(ContainerError::Read("device gone".to_string()));
            }
            out.push(1);
            Ok(Pull::Chunk)
        });

        assert!(matches!(result, Err(ContainerError::Read(_))));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_buffer_ceiling_aborts() {
        let mut buffer = PcmBuffer::with_limits(4, 6);
        let mut scratch = Vec::new();

        let result = pull_chunks::<ContainerError, _>(&mut buffer, &mut scratch, |out| {
            out.extend_from_slice(&[0; 4]);
            Ok(Pull::Chunk)
        });

        assert!(matches!(result, Err(ContainerError::OutputTooLarge { samples: 8 })));
        assert!(buffer.is_empty());
    }
}
