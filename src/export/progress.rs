//! Export progress reporting
//!
//! The engine reports raw counts only. Turning them into percentages or
//! status lines is up to the front end; `ProgressEvent` offers fraction
//! helpers for convenience.

use log::{info, warn};

use crate::browse::selection::track_label;
use crate::error::TrackFailure;

/// Progress after one chunk write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Tracks fully processed before the current one
    pub tracks_completed: usize,
    /// Tracks in the job
    pub tracks_total: usize,
    /// Frames written for the current track so far
    pub frames_written: u64,
    /// Frames in the song
    pub frames_total: u64,
}

impl ProgressEvent {
    /// Fraction of the current track written, 0.0 to 1.0
    pub fn track_fraction(&self) -> f64 {
        if self.frames_total == 0 {
            return 1.0;
        }
        self.frames_written as f64 / self.frames_total as f64
    }

    /// Fraction of the whole job done, 0.0 to 1.0
    ///
    /// Never decreases across track boundaries.
    pub fn overall_fraction(&self) -> f64 {
        if self.tracks_total == 0 {
            return 1.0;
        }
        (self.tracks_completed as f64 + self.track_fraction()) / self.tracks_total as f64
    }
}

/// How one track ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// All frames written and the file closed
    Completed { frames: u64 },
    /// The track was abandoned
    Failed(TrackFailure),
}

/// Receives progress from a running export
///
/// Called synchronously from the export loop; implementations must return
/// promptly.
pub trait ProgressSink {
    /// Called after every chunk written
    fn on_progress(&mut self, event: &ProgressEvent);

    /// Called before a track's output is opened; `ordinal` is 1-based
    fn on_track_started(&mut self, _channel: usize, _ordinal: usize, _total: usize) {}

    /// Called once a track's output has been closed (or failed to open)
    fn on_track_finished(&mut self, _channel: usize, _outcome: &TrackOutcome) {}
}

/// Discards all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_progress(&mut self, _event: &ProgressEvent) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressEvent),
{
    fn on_progress(&mut self, event: &ProgressEvent) {
        self(event)
    }
}

/// Reports progress through the `log` facade
///
/// Chunk events are logged at most once per `step_percent` of track progress.
#[derive(Debug, Clone)]
pub struct LogSink {
    step_percent: u32,
    last_percent: Option<u32>,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(10)
    }
}

impl LogSink {
    pub fn new(step_percent: u32) -> Self {
        LogSink {
            step_percent: step_percent.max(1),
            last_percent: None,
        }
    }

    /// Percentage to report for `event`, if a step boundary was crossed
    fn advance(&mut self, event: &ProgressEvent) -> Option<u32> {
        let percent = (event.track_fraction() * 100.0) as u32;
        let due = match self.last_percent {
            None => true,
            Some(last) => percent >= last + self.step_percent || percent == 100,
        };
        if !due || self.last_percent == Some(percent) {
            return None;
        }
        self.last_percent = Some(percent);
        Some(percent)
    }
}

impl ProgressSink for LogSink {
    fn on_progress(&mut self, event: &ProgressEvent) {
        if let Some(percent) = self.advance(event) {
            info!(
                "Track {}/{}: {}% ({} of {} frames)",
                event.tracks_completed + 1,
                event.tracks_total,
                percent,
                event.frames_written,
                event.frames_total
            );
        }
    }

    fn on_track_started(&mut self, channel: usize, ordinal: usize, total: usize) {
        self.last_percent = None;
        info!("Exporting {} ({} of {})", track_label(channel), ordinal, total);
    }

    fn on_track_finished(&mut self, channel: usize, outcome: &TrackOutcome) {
        match outcome {
            TrackOutcome::Completed { frames } => {
                info!("{} done, {} frames", track_label(channel), frames)
            }
            TrackOutcome::Failed(failure) => warn!("{} failed: {}", track_label(channel), failure),
        }
    }
}
