//! # Temp-File Bridge
//!
//! Persists an in-memory input to a uniquely named file for backends that
//! only accept a path. The file is removed when the bridge is closed or
//! dropped, so every exit path of the caller cleans up.
//!
//! Names come from [`tempfile::Builder`] (`<prefix><random>.<ext>`), which
//! creates the file exclusively; concurrent calls never share a file.

use crate::config::DecodeConfig;
use crate::error::ContainerError;
use core_runtime::logging::strip_path;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

/// An input persisted to a temporary file.
#[derive(Debug)]
pub struct TempFileBridge {
    file: NamedTempFile,
}

impl TempFileBridge {
    /// Write `input` to a fresh temp file with the given extension.
    ///
    /// # Errors
    ///
    /// [`ContainerError::TempFileWrite`] if the file cannot be created,
    /// written or flushed. A partially written file is removed.
    pub fn persist(
        input: &[u8],
        extension: &str,
        config: &DecodeConfig,
    ) -> Result<Self, ContainerError> {
        let suffix = format!(".{}", extension);
        let mut builder = Builder::new();
        builder.prefix(&config.temp_prefix).suffix(&suffix);

        let created = match &config.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };

        let mut file = created.map_err(|e| {
            warn!("Failed to create temp file: {}", e);
            ContainerError::TempFileWrite(e)
        })?;

        file.write_all(input)
            .and_then(|_| file.flush())
            .map_err(|e| {
                warn!("Failed to write {} bytes to temp file: {}", input.len(), e);
                ContainerError::TempFileWrite(e)
            })?;

        debug!(
            file = %strip_path(&file.path().to_string_lossy()),
            bytes = input.len(),
            "Persisted input to temp file"
        );

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Open an independent read handle to the persisted input.
    pub fn reopen(&self) -> io::Result<File> {
        self.file.reopen()
    }

    /// Delete the file now, reporting failure instead of ignoring it.
    pub fn close(self) -> io::Result<()> {
        let name = strip_path(&self.file.path().to_string_lossy()).to_string();
        let result = self.file.close();

        match &result {
            Ok(()) => debug!(file = %name, "Removed temp file"),
            Err(e) => warn!(file = %name, "Failed to remove temp file: {}", e),
        }

        result
    }
}
