//! # Container-Demuxer Family
//!
//! MPEG-4 audio has no single portable decoder. In priority order:
//!
//! 1. the platform media service (AudioToolbox on macOS), reading straight
//!    from memory
//! 2. the general demuxer (symphonia ISO-MP4 + AAC) through a temp file, when
//!    the `container-demux` feature is enabled
//! 3. neither: "unsupported backend" without touching the input
//!
//! [`BackendPreference`] can pin one backend when both are built.

use crate::config::{BackendPreference, DecodeConfig};
use crate::decoder::{DecodeAll, DecodedAudio};
use crate::error::ContainerError;
use tracing::debug;

#[cfg(target_os = "macos")]
pub mod native;

#[cfg(feature = "container-demux")]
pub mod demux;

#[cfg(feature = "container-demux")]
pub mod temp_file;

#[cfg(feature = "container-demux")]
pub use temp_file::TempFileBridge;

/// The container backend selected for this build and preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerBackend {
    #[cfg(target_os = "macos")]
    Native,
    #[cfg(feature = "container-demux")]
    Demuxer,
    Unsupported(&'static str),
}

impl ContainerBackend {
    pub fn select(preference: BackendPreference) -> Self {
        let selected = match preference {
            BackendPreference::Auto => Self::native().or_else(Self::demuxer),
            BackendPreference::Native => Self::native(),
            BackendPreference::Demuxer => Self::demuxer(),
        };

        let backend = selected.unwrap_or(ContainerBackend::Unsupported(match preference {
            BackendPreference::Auto => "no MPEG-4 audio backend in this build",
            BackendPreference::Native => "native media service not available on this platform",
            BackendPreference::Demuxer => {
                "general demuxer not enabled. Enable 'container-demux' feature"
            }
        }));

        debug!("Container backend for {:?}: {}", preference, backend.name());
        backend
    }

    fn native() -> Option<Self> {
        #[cfg(target_os = "macos")]
        return Some(ContainerBackend::Native);
        #[cfg(not(target_os = "macos"))]
        return None;
    }

    fn demuxer() -> Option<Self> {
        #[cfg(feature = "container-demux")]
        return Some(ContainerBackend::Demuxer);
        #[cfg(not(feature = "container-demux"))]
        return None;
    }

    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(target_os = "macos")]
            ContainerBackend::Native => "audiotoolbox",
            #[cfg(feature = "container-demux")]
            ContainerBackend::Demuxer => "symphonia-isomp4",
            ContainerBackend::Unsupported(_) => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ContainerBackend::Unsupported(_))
    }
}

impl DecodeAll for ContainerBackend {
    type Error = ContainerError;

    fn decode_all(&self, input: &[u8], config: &DecodeConfig) -> Result<DecodedAudio, ContainerError> {
        match self {
            #[cfg(target_os = "macos")]
            ContainerBackend::Native => native::decode(input, config),
            #[cfg(feature = "container-demux")]
            ContainerBackend::Demuxer => demux::decode(input, config),
            ContainerBackend::Unsupported(reason) => {
                let _ = (input, config);
                Err(ContainerError::UnsupportedBackend(reason))
            }
        }
    }
}
