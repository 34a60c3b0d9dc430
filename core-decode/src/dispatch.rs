//! # Dispatcher
//!
//! Selects the adapter for a format, runs it, and normalizes the outcome into
//! the status contract. A call either returns the complete decode with valid
//! metadata or empty output with a failure status.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use core_decode::{AudioContainer, DecodeConfig, Dispatcher};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::new(DecodeConfig::default())?;
//! let input = std::fs::read("song.ogg")?;
//!
//! match dispatcher.decode(AudioContainer::Vorbis, &input) {
//!     Ok(pcm) => println!("{} Hz, {} channels, {} frames", pcm.sample_rate, pcm.channels, pcm.frames()),
//!     Err(e) => eprintln!("decode failed with status {}: {}", e.status().code(), e),
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::DecodeConfig;
use crate::decoder::Backend;
use crate::error::{BufferError, ContainerError, DecodeError, DecodeFailure};
use crate::format::{sniff, AudioContainer};
use crate::status::{DecodeMetadata, StatusFamily};
use bytes::Bytes;
use core_runtime::Error as RuntimeError;
use tracing::{debug, info, instrument, warn};

/// A successful decode: little-endian interleaved `i16` PCM plus parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPcm {
    pub data: Bytes,
    pub channels: u32,
    pub sample_rate: u32,
}

impl DecodedPcm {
    /// Number of samples per channel.
    pub fn frames(&self) -> usize {
        self.data.len() / 2 / (self.channels.max(1) as usize)
    }

    /// Decode the PCM bytes back into samples.
    pub fn samples(&self) -> Vec<i16> {
        self.data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }
}

/// Routes each input family to its adapter.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: DecodeConfig,
}

impl Dispatcher {
    /// Create a dispatcher after validating `config`.
    pub fn new(config: DecodeConfig) -> Result<Self, RuntimeError> {
        config.validate().map_err(RuntimeError::Config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// The adapter that would handle `format` on this build.
    pub fn backend_for(&self, format: AudioContainer) -> Backend {
        Backend::select(format, &self.config)
    }

    /// Decode a complete input.
    ///
    /// Empty input is rejected before any backend runs.
    #[instrument(skip(self, input), fields(format = %format, bytes = input.len()))]
    pub fn decode(&self, format: AudioContainer, input: &[u8]) -> Result<DecodedPcm, DecodeFailure> {
        let family = format.family();

        if input.is_empty() {
            warn!("Rejecting empty {} input", format);
            return Err(DecodeFailure::invalid_input(family));
        }

        let backend = self.backend_for(format);
        debug!("Dispatching {} input to {}", format, backend.name());

        let decoded = backend.decode(input, &self.config).map_err(|e| {
            warn!(status = e.status().code(), "Decode via {} failed: {}", backend.name(), e);
            e
        })?;

        if decoded.samples.is_empty() || decoded.channels == 0 || decoded.sample_rate == 0 {
            warn!(
                "{} returned an unusable result: {} samples, {} channels @ {} Hz",
                backend.name(),
                decoded.samples.len(),
                decoded.channels,
                decoded.sample_rate
            );
            return Err(DecodeFailure::no_samples(family));
        }

        let channels = decoded.channels;
        let sample_rate = decoded.sample_rate;
        let data = decoded
            .samples
            .into_le_bytes()
            .map_err(|e| buffer_failure(family, e))?;

        info!(
            "Decoded {} input: {} channels @ {} Hz, {} bytes",
            format,
            channels,
            sample_rate,
            data.len()
        );

        Ok(DecodedPcm {
            data,
            channels,
            sample_rate,
        })
    }

    /// Decode and report through a caller-provided metadata array.
    ///
    /// Returns empty bytes on any failure.
    pub fn decode_into(&self, format: AudioContainer, input: &[u8], metadata_out: &mut [u32]) -> Bytes {
        match self.decode(format, input) {
            Ok(pcm) => {
                DecodeMetadata::success(format.family(), pcm.channels, pcm.sample_rate)
                    .write_to(metadata_out);
                pcm.data
            }
            Err(e) => {
                DecodeMetadata::failure(e.status()).write_to(metadata_out);
                Bytes::new()
            }
        }
    }

    /// Sniff the family from magic bytes, then decode.
    ///
    /// Unrecognized input fails with "decode failed" in the simple family.
    pub fn decode_any(&self, input: &[u8], metadata_out: &mut [u32]) -> Bytes {
        if input.is_empty() {
            DecodeMetadata::failure(DecodeFailure::invalid_input(StatusFamily::Simple).status())
                .write_to(metadata_out);
            return Bytes::new();
        }

        match sniff(input) {
            Some(format) => self.decode_into(format, input, metadata_out),
            None => {
                warn!("Unrecognized input format ({} bytes)", input.len());
                let failure: DecodeFailure =
                    DecodeError::DecodeFailed("unrecognized input format".to_string()).into();
                DecodeMetadata::failure(failure.status()).write_to(metadata_out);
                Bytes::new()
            }
        }
    }
}

fn buffer_failure(family: StatusFamily, err: BufferError) -> DecodeFailure {
    match family {
        StatusFamily::Simple => DecodeError::from(err).into(),
        StatusFamily::Container => ContainerError::from(err).into(),
    }
}

/// Decode `input` as `format` with the default configuration.
///
/// `metadata_out[0]` receives the status, `[1]` the channel count and `[2]`
/// the sample rate, as far as the array reaches.
pub fn decode_all(format: AudioContainer, input: &[u8], metadata_out: &mut [u32]) -> Bytes {
    Dispatcher::default().decode_into(format, input, metadata_out)
}

/// [`decode_all`] after sniffing the format.
pub fn decode_any(input: &[u8], metadata_out: &mut [u32]) -> Bytes {
    Dispatcher::default().decode_any(input, metadata_out)
}

pub fn decode_flac(input: &[u8], metadata_out: &mut [u32]) -> Bytes {
    decode_all(AudioContainer::Flac, input, metadata_out)
}

pub fn decode_vorbis(input: &[u8], metadata_out: &mut [u32]) -> Bytes {
    decode_all(AudioContainer::Vorbis, input, metadata_out)
}

pub fn decode_mp3(input: &[u8], metadata_out: &mut [u32]) -> Bytes {
    decode_all(AudioContainer::Mp3, input, metadata_out)
}

pub fn decode_mp4a(input: &[u8], metadata_out: &mut [u32]) -> Bytes {
    decode_all(AudioContainer::Mp4a, input, metadata_out)
}
