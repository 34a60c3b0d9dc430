//! # Decode Configuration
//!
//! Tunables for buffer growth, the output-size ceiling, the chunked read loop
//! and the temp-file bridge.

use crate::buffer::{DEFAULT_MAX_SAMPLES, MIN_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which container backend to use for MPEG-4 audio when more than one is
/// compiled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Native media service if the platform has one, else the general demuxer.
    #[default]
    Auto,
    /// Native media service only.
    Native,
    /// General demuxer only.
    Demuxer,
}

/// Decode pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// First allocation of the accumulation buffer, in samples.
    ///
    /// Default: 4096.
    #[serde(default = "default_initial_capacity_samples")]
    pub initial_capacity_samples: usize,

    /// Output-size ceiling in samples (all channels).
    ///
    /// Any decode whose sample count would exceed this fails with
    /// "output too large". The default keeps the byte length of the output
    /// inside an `i32`.
    ///
    /// Default: `i32::MAX / 2`.
    #[serde(default = "default_max_output_samples")]
    pub max_output_samples: usize,

    /// Frames requested per read call in the native container path.
    ///
    /// Default: 4096 frames (~93ms at 44.1kHz).
    #[serde(default = "default_chunk_frames")]
    pub chunk_frames: usize,

    /// Directory for bridge temp files. `None` uses the OS temp directory.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Temp file name prefix.
    ///
    /// Default: `"pcm-decode-"`.
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,

    #[serde(default)]
    pub container_backend: BackendPreference,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            initial_capacity_samples: default_initial_capacity_samples(),
            max_output_samples: default_max_output_samples(),
            chunk_frames: default_chunk_frames(),
            temp_dir: None,
            temp_prefix: default_temp_prefix(),
            container_backend: BackendPreference::default(),
        }
    }
}

impl DecodeConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_capacity_samples == 0 {
            return Err("initial_capacity_samples must be > 0".to_string());
        }

        if self.max_output_samples == 0 {
            return Err("max_output_samples must be > 0".to_string());
        }

        if self.chunk_frames == 0 {
            return Err("chunk_frames must be > 0".to_string());
        }

        if self.temp_prefix.is_empty() {
            return Err("temp_prefix must not be empty".to_string());
        }

        Ok(())
    }

    /// Use `dir` for bridge temp files.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_container_backend(mut self, backend: BackendPreference) -> Self {
        self.container_backend = backend;
        self
    }

    pub fn with_max_output_samples(mut self, max: usize) -> Self {
        self.max_output_samples = max;
        self
    }

    /// Chunk size in samples for a given channel count.
    pub fn chunk_samples(&self, channels: u32) -> usize {
        self.chunk_frames.saturating_mul(channels as usize)
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_initial_capacity_samples() -> usize {
    MIN_CAPACITY
}

fn default_max_output_samples() -> usize {
    DEFAULT_MAX_SAMPLES
}

fn default_chunk_frames() -> usize {
    4096 // ~93ms at 44.1kHz
}

fn default_temp_prefix() -> String {
    "pcm-decode-".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_capacity_samples, 4096);
        assert_eq!(config.max_output_samples, (i32::MAX / 2) as usize);
        assert_eq!(config.chunk_frames, 4096);
        assert_eq!(config.temp_prefix, "pcm-decode-");
        assert_eq!(config.container_backend, BackendPreference::Auto);
        assert!(config.temp_dir.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = DecodeConfig::default();

        config.initial_capacity_samples = 0;
        assert!(config.validate().is_err());
        config.initial_capacity_samples = 4096;

        config.chunk_frames = 0;
        assert!(config.validate().is_err());
        config.chunk_frames = 4096;

        config.max_output_samples = 0;
        assert!(config.validate().is_err());
        config.max_output_samples = 1;

        config.temp_prefix.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builders() {
        let config = DecodeConfig::default()
            .with_temp_dir("/tmp/decode")
            .with_container_backend(BackendPreference::Demuxer)
            .with_max_output_samples(10);

        assert_eq!(config.temp_dir, Some(PathBuf::from("/tmp/decode")));
        assert_eq!(config.container_backend, BackendPreference::Demuxer);
        assert_eq!(config.max_output_samples, 10);
    }

    #[test]
    fn test_chunk_samples_calculation() {
        let config = DecodeConfig::default();
        assert_eq!(config.chunk_samples(1), 4096);
        assert_eq!(config.chunk_samples(2), 8192);
        assert_eq!(config.chunk_samples(6), 24576);
    }
}
