//! Trackport - Multitrack Recorder Track Export
//!
//! Trackport browses a multitrack recorder's storage volume, lets an
//! operator pick a song and a subset of its tracks, and exports each
//! selected track as an independent mono 24-bit file.
//!
//! # Architecture
//!
//! - `volume`: driver interface to the recorder volume (projects, songs,
//!   multi-track read cursor)
//! - `browse`: song catalog, track selection and the session state machine
//!   that front ends drive
//! - `export`: job validation and the per-channel export engine
//! - `output`: container writers receiving the packed sample bytes

pub mod browse;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod output;
pub mod volume;

pub use browse::{Catalog, CatalogEntry, SelectionState, Session, SessionState};
pub use config::ExportConfig;
pub use error::{Result, TrackFailure, TrackportError};
pub use export::{ExportEngine, ExportJob, ExportResult, ProgressEvent, ProgressSink};
pub use output::{ContainerFormat, FileOutputFactory};
