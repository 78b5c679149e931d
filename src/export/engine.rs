//! Track export engine
//!
//! For every selected channel, in ascending order, the engine opens one mono
//! output, rewinds the song, and makes a full pass over its interleaved
//! frames keeping only that channel's column. Channels never share a pass,
//! and one channel's failure never stops the others.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::Serialize;

use super::job::ExportJob;
use super::packing::{pack_column, BYTES_PER_SAMPLE};
use super::progress::{ProgressEvent, ProgressSink, TrackOutcome};
use super::source::SampleSource;
use crate::config::{ExportConfig, DEFAULT_CHUNK_FRAMES};
use crate::error::TrackFailure;
use crate::output::{OutputFactory, OutputStream, StreamSpec};

/// Outcome of a whole export job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportResult {
    /// Channels whose file was fully written and closed
    pub succeeded: BTreeSet<usize>,
    /// Channels that failed, with the reason
    pub failed: BTreeMap<usize, TrackFailure>,
    /// Payload bytes written across all channels, including abandoned ones
    pub bytes_written: u64,
    /// Files of the succeeded channels, in channel order
    pub files: Vec<PathBuf>,
}

impl ExportResult {
    /// A job succeeds when at least one channel was exported
    pub fn is_success(&self) -> bool {
        !self.succeeded.is_empty()
    }

    /// Channels to select for a retry
    pub fn failed_channels(&self) -> Vec<usize> {
        self.failed.keys().copied().collect()
    }

    /// Channels attempted
    pub fn track_count(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Runs export jobs with a fixed chunk size
#[derive(Debug, Clone, Copy)]
pub struct ExportEngine {
    chunk_frames: usize,
}

impl Default for ExportEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_FRAMES)
    }
}

impl ExportEngine {
    /// Engine reading `chunk_frames` frames per chunk (at least 1)
    pub fn new(chunk_frames: usize) -> Self {
        ExportEngine {
            chunk_frames: chunk_frames.max(1),
        }
    }

    /// Engine using the configured chunk size
    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.chunk_frames)
    }

    /// Frames read per chunk
    pub fn chunk_frames(&self) -> usize {
        self.chunk_frames
    }

    /// Export every channel of `job`
    ///
    /// `source` must wrap the cursor of the job's song and is exclusively
    /// held for the duration of the call.
    pub fn run(
        &self,
        job: &ExportJob,
        source: &mut SampleSource<'_>,
        output: &dyn OutputFactory,
        sink: &mut dyn ProgressSink,
    ) -> ExportResult {
        let song = job.song();
        let total = job.channels().len();
        let spec = StreamSpec::mono_24bit(song.sample_rate_hz, job.format());
        let mut result = ExportResult::default();

        info!(
            "Exporting {} track(s) of '{}' to {} as {}",
            total,
            song.song_name,
            job.destination().display(),
            job.format()
        );

        for (completed, &channel) in job.channels().iter().enumerate() {
            sink.on_track_started(channel, completed + 1, total);
            let path = job.output_path(channel);

            let outcome = if channel >= source.channel_count() {
                TrackOutcome::Failed(TrackFailure::SourceUnreadable(format!(
                    "song has {} channels",
                    source.channel_count()
                )))
            } else {
                match output.create(&path, &spec) {
                    Ok(mut stream) => {
                        let pass = self.transcode_channel(
                            channel,
                            completed,
                            total,
                            job,
                            source,
                            stream.as_mut(),
                            sink,
                            &mut result.bytes_written,
                        );
                        // Closed whether or not the pass finished
                        let closed = stream.close();
                        match (pass, closed) {
                            (Ok(frames), Ok(())) => TrackOutcome::Completed { frames },
                            (Ok(_), Err(e)) => {
                                TrackOutcome::Failed(TrackFailure::FinalizeFailed(e.to_string()))
                            }
                            (Err(failure), _) => TrackOutcome::Failed(failure),
                        }
                    }
                    Err(e) => TrackOutcome::Failed(TrackFailure::CannotCreateOutput(format!(
                        "{}: {}",
                        path.display(),
                        e
                    ))),
                }
            };

            match &outcome {
                TrackOutcome::Completed { frames } => {
                    debug!("Channel {} complete: {} frames", channel, frames);
                    result.succeeded.insert(channel);
                    result.files.push(path);
                }
                TrackOutcome::Failed(failure) => {
                    warn!("Channel {} failed: {}", channel, failure);
                    result.failed.insert(channel, failure.clone());
                }
            }
            sink.on_track_finished(channel, &outcome);
        }

        info!(
            "Export of '{}' finished: {} succeeded, {} failed",
            song.song_name,
            result.succeeded.len(),
            result.failed.len()
        );
        result
    }

    /// One full pass over the song for a single channel
    #[allow(clippy::too_many_arguments)]
    fn transcode_channel(
        &self,
        channel: usize,
        completed: usize,
        total: usize,
        job: &ExportJob,
        source: &mut SampleSource<'_>,
        stream: &mut dyn OutputStream,
        sink: &mut dyn ProgressSink,
        bytes_written: &mut u64,
    ) -> Result<u64, TrackFailure> {
        source
            .reset()
            .map_err(|e| TrackFailure::SourceUnreadable(e.to_string()))?;

        let frames_total = job.song().frame_count;
        let mut frames_written: u64 = 0;
        let mut packed = Vec::with_capacity(self.chunk_frames * BYTES_PER_SAMPLE);

        while frames_written < frames_total {
            let request = (self.chunk_frames as u64).min(frames_total - frames_written) as usize;
            let block = source
                .read_frames(request)
                .map_err(|e| TrackFailure::SourceUnreadable(e.to_string()))?;
            let received = block.len();
            if received == 0 {
                break;
            }

            packed.clear();
            pack_column(block.samples(), block.channels(), channel, &mut packed);

            let written = match stream.write_raw(&packed) {
                Ok(n) => n,
                Err(e) => {
                    warn!("Write failed for channel {}: {}", channel, e);
                    0
                }
            };
            *bytes_written += written as u64;
            if written != packed.len() {
                return Err(TrackFailure::TruncatedWrite {
                    requested: packed.len(),
                    written,
                });
            }

            frames_written += received as u64;
            sink.on_progress(&ProgressEvent {
                tracks_completed: completed,
                tracks_total: total,
                frames_written,
                frames_total,
            });

            if received < request {
                break;
            }
        }

        Ok(frames_written)
    }
}
