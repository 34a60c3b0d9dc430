//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-decode`, `core-runtime`). Host applications can
//! depend on `pcm-workspace` and enable the documented features without needing
//! to wire each crate individually.

pub use core_decode as decode;
pub use core_runtime as runtime;

pub use core_decode::{decode_all, decode_any, AudioContainer, DecodeConfig, Dispatcher};
