//! Export job construction
//!
//! `ExportJob::begin` is the single validation gate in front of the engine.
//! It touches nothing on disk; the job it returns is an immutable snapshot of
//! the song and the selected tracks.

use std::path::{Path, PathBuf};

use crate::browse::catalog::{Catalog, CatalogEntry};
use crate::browse::selection::SelectionState;
use crate::error::{Result, TrackportError};
use crate::output::ContainerFormat;

/// One export request: a song and the tracks to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    song_index: usize,
    song: CatalogEntry,
    channels: Vec<usize>,
    destination: PathBuf,
    format: ContainerFormat,
}

impl ExportJob {
    /// Validate the selection and snapshot it into a job
    ///
    /// # Errors
    /// * `NoCurrentSong` - no song is current, or the current index no longer
    ///   exists in `catalog`
    /// * `NoChannelsSelected` - the current song has no marked tracks
    pub fn begin(
        selection: &SelectionState,
        catalog: &Catalog,
        destination: &Path,
        format: ContainerFormat,
    ) -> Result<Self> {
        let song_index = selection.current_song().ok_or(TrackportError::NoCurrentSong)?;
        let song = catalog
            .get(song_index)
            .ok_or(TrackportError::NoCurrentSong)?
            .clone();

        let channels: Vec<usize> = selection
            .selected_channels()
            .into_iter()
            .filter(|&channel| channel < song.channel_count)
            .collect();
        if channels.is_empty() {
            return Err(TrackportError::NoChannelsSelected);
        }

        Ok(ExportJob {
            song_index,
            song,
            channels,
            destination: destination.to_path_buf(),
            format,
        })
    }

    /// Catalog index of the song
    pub fn song_index(&self) -> usize {
        self.song_index
    }

    /// Catalog entry of the song
    pub fn song(&self) -> &CatalogEntry {
        &self.song
    }

    /// Zero-based channels to export, ascending
    pub fn channels(&self) -> &[usize] {
        &self.channels
    }

    /// Directory receiving the track files
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Container for every track file
    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// Full output path for a zero-based channel
    pub fn output_path(&self, channel: usize) -> PathBuf {
        self.destination
            .join(track_file_name(&self.song.song_name, channel + 1, self.format))
    }
}

/// File name for one exported track: `<song>_Track<NN>.<ext>`
///
/// `track_number` is 1-based and padded to two digits.
pub fn track_file_name(song_name: &str, track_number: usize, format: ContainerFormat) -> String {
    format!("{}_Track{:02}.{}", song_name, track_number, format.extension())
}
