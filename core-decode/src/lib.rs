//! # Decode-to-PCM Module
//!
//! Turns a complete in-memory encoded audio file into one flat buffer of
//! interleaved signed 16-bit little-endian PCM, plus channel count and sample
//! rate.
//!
//! ## Overview
//!
//! This crate handles:
//! - Growable sample accumulation with explicit overflow guards ([`PcmBuffer`])
//! - A uniform status contract across unrelated decoder backends ([`status`])
//! - Per-family adapters: FLAC, Ogg Vorbis, MPEG audio frames, MPEG-4 audio
//! - Backend selection for MPEG-4 audio (native service, general demuxer, or
//!   none) and a temp-file bridge for the file-only backend
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use core_decode::{decode_all, AudioContainer};
//!
//! let input = std::fs::read("song.flac").unwrap();
//! let mut meta = [0u32; 3];
//! let pcm = decode_all(AudioContainer::Flac, &input, &mut meta);
//!
//! if meta[0] == 0 {
//!     println!("{} channels @ {} Hz, {} bytes", meta[1], meta[2], pcm.len());
//! }
//! ```
//!
//! Every call is synchronous and either returns the full decode or an empty
//! buffer with a failure status; partial output is never returned.

pub mod buffer;
pub mod chunks;
pub mod config;
pub mod container;
pub mod decoder;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod status;

pub use buffer::PcmBuffer;
pub use config::{BackendPreference, DecodeConfig};
pub use container::ContainerBackend;
pub use decoder::{Backend, DecodeAll, DecodedAudio};
pub use dispatch::{
    decode_all, decode_any, decode_flac, decode_mp3, decode_mp4a, decode_vorbis, DecodedPcm,
    Dispatcher,
};
pub use error::{BufferError, ContainerError, DecodeError, DecodeFailure};
pub use format::AudioContainer;
pub use status::{ContainerStatus, DecodeMetadata, SimpleStatus, StatusCode, StatusFamily};
