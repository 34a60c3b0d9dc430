//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure shared by the decode crates:
//! - Logging and tracing infrastructure
//! - Runtime error type
//!
//! ## Overview
//!
//! The decode pipeline itself only emits `tracing` events. This crate is where a
//! host (or a test, or a demo binary) installs the subscriber that turns those
//! events into output.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
