//! Track Export Module
//!
//! Turns a track selection into one mono file per selected channel:
//! - Job construction and validation
//! - Chunked sample source over the song cursor
//! - 24-bit packing
//! - The per-channel export loop and its progress events

pub mod engine;
pub mod job;
pub mod packing;
pub mod progress;
pub mod source;

pub use engine::{ExportEngine, ExportResult};
pub use job::{track_file_name, ExportJob};
pub use packing::pack_le24;
pub use progress::{LogSink, NullSink, ProgressEvent, ProgressSink, TrackOutcome};
pub use source::{FrameBlock, SampleSource};
