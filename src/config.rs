//! Export configuration
//!
//! Settings shared by every export: where files go, how many frames are
//! read per chunk, and which container is written. Loaded from an optional
//! JSON file; fields missing from the file keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackportError};
use crate::output::ContainerFormat;

/// Default destination directory for exported tracks
pub const DEFAULT_DESTINATION: &str = "./hd24_export";

/// Default number of frames read per chunk
pub const DEFAULT_CHUNK_FRAMES: usize = 1024;

/// Export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving one file per exported track
    pub destination: PathBuf,
    /// Frames read from the song per chunk (bounds memory use)
    pub chunk_frames: usize,
    /// Container written for each track
    pub format: ContainerFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            destination: PathBuf::from(DEFAULT_DESTINATION),
            chunk_frames: DEFAULT_CHUNK_FRAMES,
            format: ContainerFormat::Aiff,
        }
    }
}

impl ExportConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| TrackportError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config: ExportConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the destination directory
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Set the chunk size in frames
    pub fn with_chunk_frames(mut self, chunk_frames: usize) -> Self {
        self.chunk_frames = chunk_frames;
        self
    }

    /// Set the output container
    pub fn with_format(mut self, format: ContainerFormat) -> Self {
        self.format = format;
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.chunk_frames == 0 {
            return Err(TrackportError::Config {
                reason: "chunk_frames must be at least 1".to_string(),
            });
        }
        if self.destination.as_os_str().is_empty() {
            return Err(TrackportError::Config {
                reason: "destination must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
