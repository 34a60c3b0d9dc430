//! # Decode Error Types
//!
//! One error enum per adapter family, plus the buffer error both families
//! absorb. Each family error knows its own numeric status; the numbers only
//! leave the crate through [`crate::status`].

use crate::status::{ContainerStatus, SimpleStatus, StatusCode, StatusFamily};
use thiserror::Error;

/// Failures of the sample accumulator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Allocation failed or the requested capacity is not addressable.
    #[error("Out of memory growing PCM buffer to {requested} samples")]
    OutOfMemory { requested: usize },

    /// The sample count would exceed the output-size ceiling.
    #[error("Output of {samples} samples exceeds the {limit} sample ceiling")]
    OutputTooLarge { samples: u64, limit: usize },
}

/// Errors of the single-stage adapters (FLAC, Vorbis, MPEG frames).
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Input was empty.
    #[error("Invalid input: empty buffer")]
    InvalidInput,

    /// Backend produced no usable samples.
    #[error("Decoding error: {0}")]
    DecodeFailed(String),

    /// Allocation failure at any stage.
    #[error("Out of memory")]
    OutOfMemory,

    /// Sample count would overflow the output length representation.
    #[error("Output too large: {samples} samples")]
    OutputTooLarge { samples: u64 },

    /// The decoder for this format is not compiled into this build.
    #[error("No decode backend available: {0}")]
    UnsupportedBackend(&'static str),
}

impl DecodeError {
    pub fn status(&self) -> SimpleStatus {
        match self {
            DecodeError::InvalidInput => SimpleStatus::InvalidInput,
            DecodeError::DecodeFailed(_) => SimpleStatus::DecodeFailed,
            DecodeError::OutOfMemory => SimpleStatus::OutOfMemory,
            DecodeError::OutputTooLarge { .. } => SimpleStatus::OutputTooLarge,
            DecodeError::UnsupportedBackend(_) => SimpleStatus::UnsupportedBackend,
        }
    }
}

impl From<BufferError> for DecodeError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::OutOfMemory { .. } => DecodeError::OutOfMemory,
            BufferError::OutputTooLarge { samples, .. } => DecodeError::OutputTooLarge { samples },
        }
    }
}

/// Errors of the staged container-demuxer backends. Each variant names the
/// stage that failed.
#[derive(Error, Debug)]
pub enum ContainerError {
    /// Input was empty.
    #[error("Invalid input: empty buffer")]
    InvalidInput,

    /// The container could not be opened.
    #[error("Failed to open container: {0}")]
    Open(String),

    /// The audio stream or its decoder could not be opened.
    #[error("Failed to open audio stream: {0}")]
    OpenStream(String),

    /// The source stream format could not be determined.
    #[error("Failed to probe source format: {0}")]
    Probe(String),

    /// The 16-bit interleaved output format could not be negotiated.
    #[error("Failed to negotiate output format: {0}")]
    Negotiate(String),

    /// Chunk or accumulation buffer allocation failed.
    #[error("Buffer allocation failed")]
    Allocate,

    /// A read or decode call failed mid-stream.
    #[error("Read failed: {0}")]
    Read(String),

    /// The stream decoded cleanly but yielded no samples.
    #[error("Stream produced no samples")]
    Empty,

    /// The input could not be persisted for the file-based backend.
    #[error("Failed to write temp file: {0}")]
    TempFileWrite(#[source] std::io::Error),

    /// Sample count would overflow the output length representation.
    #[error("Output too large: {samples} samples")]
    OutputTooLarge { samples: u64 },

    /// No container backend is available on this build/platform.
    #[error("No container backend available: {0}")]
    UnsupportedBackend(&'static str),
}

impl ContainerError {
    pub fn status(&self) -> ContainerStatus {
        match self {
            ContainerError::InvalidInput => ContainerStatus::InvalidInput,
            ContainerError::Open(_) => ContainerStatus::OpenFailed,
            ContainerError::OpenStream(_) => ContainerStatus::OpenStreamFailed,
            ContainerError::Probe(_) => ContainerStatus::ProbeFailed,
            ContainerError::Negotiate(_) => ContainerStatus::NegotiateFailed,
            ContainerError::Allocate => ContainerStatus::AllocateFailed,
            ContainerError::Read(_) => ContainerStatus::ReadFailed,
            ContainerError::Empty => ContainerStatus::Empty,
            ContainerError::TempFileWrite(_) => ContainerStatus::TempFileWriteFailed,
            ContainerError::OutputTooLarge { .. } => ContainerStatus::OutputTooLarge,
            ContainerError::UnsupportedBackend(_) => ContainerStatus::UnsupportedBackend,
        }
    }
}

impl From<BufferError> for ContainerError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::OutOfMemory { .. } => ContainerError::Allocate,
            BufferError::OutputTooLarge { samples, .. } => {
                ContainerError::OutputTooLarge { samples }
            }
        }
    }
}

/// Failure of one decode call, tagged by adapter family.
#[derive(Error, Debug)]
pub enum DecodeFailure {
    #[error(transparent)]
    Simple(#[from] DecodeError),

    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl DecodeFailure {
    /// The invalid-input failure in the given family's numbering.
    pub fn invalid_input(family: StatusFamily) -> Self {
        match family {
            StatusFamily::Simple => DecodeError::InvalidInput.into(),
            StatusFamily::Container => ContainerError::InvalidInput.into(),
        }
    }

    /// The out-of-memory failure in the given family's numbering.
    pub fn out_of_memory(family: StatusFamily) -> Self {
        match family {
            StatusFamily::Simple => DecodeError::OutOfMemory.into(),
            StatusFamily::Container => ContainerError::Allocate.into(),
        }
    }

    /// The "decoded nothing" failure in the given family's numbering.
    pub fn no_samples(family: StatusFamily) -> Self {
        match family {
            StatusFamily::Simple => {
                DecodeError::DecodeFailed("backend produced no samples".to_string()).into()
            }
            StatusFamily::Container => ContainerError::Empty.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            DecodeFailure::Simple(err) => StatusCode::Simple(err.status()),
            DecodeFailure::Container(err) => StatusCode::Container(err.status()),
        }
    }
}

/// Result type for single-stage adapters.
pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_error_maps_into_both_families() {
        let oom = BufferError::OutOfMemory { requested: 8 };
        assert!(matches!(DecodeError::from(oom.clone()), DecodeError::OutOfMemory));
        assert!(matches!(ContainerError::from(oom), ContainerError::Allocate));

        let too_large = BufferError::OutputTooLarge {
            samples: 10,
            limit: 4,
        };
        assert!(matches!(
            DecodeError::from(too_large.clone()),
            DecodeError::OutputTooLarge { samples: 10 }
        ));
        assert!(matches!(
            ContainerError::from(too_large),
            ContainerError::OutputTooLarge { samples: 10 }
        ));
    }

    #[test]
    fn test_family_constructors_keep_family() {
        assert_eq!(
            DecodeFailure::invalid_input(StatusFamily::Simple).status().code(),
            1
        );
        assert_eq!(
            DecodeFailure::invalid_input(StatusFamily::Container).status().code(),
            1
        );
        assert_eq!(
            DecodeFailure::out_of_memory(StatusFamily::Container).status().code(),
            6
        );
        assert_eq!(DecodeFailure::no_samples(StatusFamily::Simple).status().code(), 2);
        assert_eq!(DecodeFailure::no_samples(StatusFamily::Container).status().code(), 8);
    }

    #[test]
    fn test_error_messages() {
        let err = DecodeError::OutputTooLarge { samples: 42 };
        assert_eq!(err.to_string(), "Output too large: 42 samples");

        let err = ContainerError::Probe("no audio track".to_string());
        assert_eq!(err.to_string(), "Failed to probe source format: no audio track");
    }
}
