//! # Format Adapters
//!
//! One adapter per input family, all implementing [`DecodeAll`].
//!
//! ## Supported Formats
//!
//! | Family | Adapter | Backend | Feature Flag |
//! |--------|---------|---------|--------------|
//! | FLAC | [`LosslessAdapter`] | symphonia FLAC bundle | `decoder-flac` |
//! | Ogg Vorbis | [`TransformAdapter`] | symphonia Ogg + Vorbis | `decoder-vorbis` |
//! | MPEG audio | [`FrameAdapter`] | nanomp3 frame loop | `decoder-mp3` |
//! | MPEG-4 / AAC | [`ContainerBackend`] | AudioToolbox (macOS) or symphonia ISO-MP4 + AAC | `container-demux` |
//!
//! A family whose adapter is compiled out is still dispatchable; it resolves
//! to [`Backend::Unavailable`] and reports "unsupported backend".

use crate::buffer::PcmBuffer;
use crate::config::DecodeConfig;
use crate::container::ContainerBackend;
use crate::error::{DecodeError, DecodeFailure};
use crate::format::AudioContainer;

pub mod frame;

#[cfg(feature = "decoder-flac")]
mod lossless;

#[cfg(feature = "decoder-vorbis")]
mod transform;

#[cfg(feature = "core-decoder")]
mod sample_converter;

#[cfg(feature = "core-decoder")]
pub(crate) mod symphonia;

#[cfg(feature = "decoder-mp3")]
pub use frame::FrameAdapter;

#[cfg(feature = "decoder-flac")]
pub use lossless::LosslessAdapter;

#[cfg(feature = "decoder-vorbis")]
pub use transform::TransformAdapter;

#[cfg(feature = "core-decoder")]
pub use sample_converter::SampleConverter;

/// Samples and parameters of one complete decode.
#[derive(Debug)]
pub struct DecodedAudio {
    pub samples: PcmBuffer,
    pub channels: u32,
    pub sample_rate: u32,
}

/// Decode a complete in-memory input in one call.
///
/// Implementations either return every sample of the input or an error;
/// they never return a partial decode.
pub trait DecodeAll {
    type Error: Into<DecodeFailure>;

    fn decode_all(&self, input: &[u8], config: &DecodeConfig) -> Result<DecodedAudio, Self::Error>;
}

/// The adapter chosen for one input family on this build.
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    #[cfg(feature = "decoder-flac")]
    Lossless(LosslessAdapter),
    #[cfg(feature = "decoder-vorbis")]
    Transform(TransformAdapter),
    #[cfg(feature = "decoder-mp3")]
    Frame(FrameAdapter),
    Container(ContainerBackend),
    /// The simple-family decoder for this input is compiled out.
    Unavailable(&'static str),
}

impl Backend {
    /// Pick the adapter for `format`.
    pub fn select(format: AudioContainer, config: &DecodeConfig) -> Self {
        match format {
            AudioContainer::Flac => {
                #[cfg(feature = "decoder-flac")]
                return Backend::Lossless(LosslessAdapter);
                #[cfg(not(feature = "decoder-flac"))]
                return Backend::Unavailable(
                    "FLAC decoder not enabled. Enable 'decoder-flac' feature",
                );
            }
            AudioContainer::Vorbis => {
                #[cfg(feature = "decoder-vorbis")]
                return Backend::Transform(TransformAdapter);
                #[cfg(not(feature = "decoder-vorbis"))]
                return Backend::Unavailable(
                    "Vorbis decoder not enabled. Enable 'decoder-vorbis' feature",
                );
            }
            AudioContainer::Mp3 => {
                #[cfg(feature = "decoder-mp3")]
                return Backend::Frame(FrameAdapter);
                #[cfg(not(feature = "decoder-mp3"))]
                return Backend::Unavailable(
                    "MP3 decoder not enabled. Enable 'decoder-mp3' feature",
                );
            }
            AudioContainer::Mp4a => {
                Backend::Container(ContainerBackend::select(config.container_backend))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "decoder-flac")]
            Backend::Lossless(_) => "symphonia-flac",
            #[cfg(feature = "decoder-vorbis")]
            Backend::Transform(_) => "symphonia-vorbis",
            #[cfg(feature = "decoder-mp3")]
            Backend::Frame(_) => "nanomp3",
            Backend::Container(backend) => backend.name(),
            Backend::Unavailable(_) => "unavailable",
        }
    }

    /// Run the selected adapter.
    pub fn decode(&self, input: &[u8], config: &DecodeConfig) -> Result<DecodedAudio, DecodeFailure> {
        match self {
            #[cfg(feature = "decoder-flac")]
            Backend::Lossless(adapter) => adapter.decode_all(input, config).map_err(Into::into),
            #[cfg(feature = "decoder-vorbis")]
            Backend::Transform(adapter) => adapter.decode_all(input, config).map_err(Into::into),
            #[cfg(feature = "decoder-mp3")]
            Backend::Frame(adapter) => adapter.decode_all(input, config).map_err(Into::into),
            Backend::Container(backend) => backend.decode_all(input, config).map_err(Into::into),
            Backend::Unavailable(reason) => Err(DecodeError::UnsupportedBackend(reason).into()),
        }
    }
}
