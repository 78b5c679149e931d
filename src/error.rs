//! Error handling for Trackport
//!
//! Two layers of failure exist. `TrackportError` covers everything that stops
//! an operation outright (volume access, validation, session transitions).
//! `TrackFailure` covers a single channel that could not be exported; it is
//! recorded in the export result and never aborts the job.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for Trackport operations
pub type Result<T> = std::result::Result<T, TrackportError>;

/// Main error type for Trackport operations
#[derive(Error, Debug)]
pub enum TrackportError {
    // Volume Errors
    #[error("Volume is not open")]
    VolumeNotOpen,

    #[error("Volume not found: {path}")]
    VolumeNotFound { path: PathBuf },

    #[error("Invalid volume: {reason}")]
    InvalidVolume { reason: String },

    #[error("Song read failed: {reason}")]
    SongRead { reason: String },

    #[error("No song at catalog index {index}")]
    SongNotFound { index: usize },

    // Export Validation Errors
    #[error("No song selected")]
    NoCurrentSong,

    #[error("No tracks selected")]
    NoChannelsSelected,

    // Session Errors
    #[error("Cannot {action} while an export is running")]
    SessionBusy { action: &'static str },

    #[error("Cannot {action} in state {from}")]
    InvalidTransition { from: String, action: &'static str },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrackportError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            TrackportError::VolumeNotOpen => "VOLUME_NOT_OPEN",
            TrackportError::VolumeNotFound { .. } => "VOLUME_NOT_FOUND",
            TrackportError::InvalidVolume { .. } => "INVALID_VOLUME",
            TrackportError::SongRead { .. } => "SONG_READ",
            TrackportError::SongNotFound { .. } => "SONG_NOT_FOUND",
            TrackportError::NoCurrentSong => "NO_CURRENT_SONG",
            TrackportError::NoChannelsSelected => "NO_CHANNELS_SELECTED",
            TrackportError::SessionBusy { .. } => "SESSION_BUSY",
            TrackportError::InvalidTransition { .. } => "INVALID_TRANSITION",
            TrackportError::Config { .. } => "CONFIG_ERROR",
            TrackportError::Io(_) => "IO_ERROR",
            TrackportError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the operator can fix this and try again
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrackportError::NoCurrentSong
                | TrackportError::NoChannelsSelected
                | TrackportError::SessionBusy { .. }
                | TrackportError::SongNotFound { .. }
                | TrackportError::Config { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            TrackportError::VolumeNotOpen => {
                Some("Check that the device or image is connected and readable.")
            }
            TrackportError::VolumeNotFound { .. } => Some("Check the device or image path."),
            TrackportError::NoCurrentSong => Some("Select a song before exporting."),
            TrackportError::NoChannelsSelected => {
                Some("Select at least one track to export.")
            }
            TrackportError::SessionBusy { .. } => Some("Wait for the running export to finish."),
            TrackportError::SongNotFound { .. } => Some("Run 'trackport list' to see song numbers."),
            _ => None,
        }
    }
}

/// Why a single channel could not be exported
///
/// Recorded per channel in the export result. The remaining channels of the
/// job are still processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TrackFailure {
    /// The output stream could not be opened
    CannotCreateOutput(String),
    /// The output stream accepted fewer bytes than requested
    TruncatedWrite { requested: usize, written: usize },
    /// The song could not be read to the end
    SourceUnreadable(String),
    /// The output stream could not be finalized on close
    FinalizeFailed(String),
}

impl TrackFailure {
    /// Short machine-readable name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            TrackFailure::CannotCreateOutput(_) => "cannot_create_output",
            TrackFailure::TruncatedWrite { .. } => "truncated_write",
            TrackFailure::SourceUnreadable(_) => "source_unreadable",
            TrackFailure::FinalizeFailed(_) => "finalize_failed",
        }
    }
}

impl fmt::Display for TrackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackFailure::CannotCreateOutput(detail) => {
                write!(f, "cannot create output: {}", detail)
            }
            TrackFailure::TruncatedWrite { requested, written } => {
                write!(f, "truncated write: {} of {} bytes", written, requested)
            }
            TrackFailure::SourceUnreadable(detail) => write!(f, "source unreadable: {}", detail),
            TrackFailure::FinalizeFailed(detail) => write!(f, "finalize failed: {}", detail),
        }
    }
}
