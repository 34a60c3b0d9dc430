//! Decode a file to raw PCM
//!
//! Writes interleaved signed 16-bit little-endian samples next to the input
//! and prints the decode metadata.
//!
//! Run with:
//! ```bash
//! cargo run --example decode_file --package core-decode -- song.flac
//!
//! # Force the format instead of sniffing, with debug logs
//! RUST_LOG=core_decode=debug cargo run --example decode_file --package core-decode -- song.m4a mp4a
//! ```

use core_decode::{AudioContainer, DecodeConfig, Dispatcher};
use core_runtime::logging::{init_logging, strip_path, LogLevel, LoggingConfig};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

fn parse_format(name: &str) -> Option<AudioContainer> {
    match name {
        "flac" => Some(AudioContainer::Flac),
        "vorbis" | "ogg" => Some(AudioContainer::Vorbis),
        "mp3" => Some(AudioContainer::Mp3),
        "mp4a" | "m4a" | "aac" => Some(AudioContainer::Mp4a),
        _ => None,
    }
}

fn main() -> ExitCode {
    if let Err(e) = init_logging(LoggingConfig::default().with_level(LogLevel::Debug)) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1).map(PathBuf::from) else {
        eprintln!("usage: decode_file <input> [flac|vorbis|mp3|mp4a]");
        return ExitCode::FAILURE;
    };

    let input = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read {}: {}", strip_path(&path.to_string_lossy()), e);
            return ExitCode::FAILURE;
        }
    };

    let dispatcher = Dispatcher::new(DecodeConfig::default()).unwrap_or_default();
    let mut meta = [0u32; 3];
    let pcm = match args.get(2).and_then(|name| parse_format(name)) {
        Some(format) => dispatcher.decode_into(format, &input, &mut meta),
        None => dispatcher.decode_any(&input, &mut meta),
    };

    println!("status={} channels={} sample_rate={}", meta[0], meta[1], meta[2]);
    if meta[0] != 0 {
        return ExitCode::FAILURE;
    }

    let out = path.with_extension("pcm");
    if let Err(e) = std::fs::write(&out, &pcm) {
        error!("Failed to write {}: {}", out.display(), e);
        return ExitCode::FAILURE;
    }

    info!(
        "Wrote {} bytes ({} frames) to {}",
        pcm.len(),
        pcm.len() / 2 / meta[1] as usize,
        out.display()
    );
    ExitCode::SUCCESS
}
