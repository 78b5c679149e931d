//! Song catalog
//!
//! A flat list of every readable song on an opened volume, in project order
//! then song order. Built once per opened volume.

use log::{info, warn};
use serde::Serialize;

use crate::error::{Result, TrackportError};
use crate::volume::{Song, Volume};

/// One song row in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// 1-based project position on the volume
    pub project_id: u32,
    /// 1-based song position within the project
    pub song_id: u32,
    pub project_name: String,
    pub song_name: String,
    pub sample_rate_hz: u32,
    /// Physical tracks recorded for the song
    pub channel_count: usize,
    /// Interleaved frames in the song
    pub frame_count: u64,
    /// Duration as reported by the driver
    pub duration: String,
}

/// All readable songs of one volume, with their driver handles
pub struct Catalog {
    volume_name: String,
    entries: Vec<CatalogEntry>,
    songs: Vec<Box<dyn Song>>,
}

impl Catalog {
    /// Walk every project and song of `volume`
    ///
    /// Projects or songs the driver cannot read are skipped. Fails only when
    /// the volume itself is not open.
    pub fn build(volume: &dyn Volume) -> Result<Self> {
        if !volume.is_open() {
            return Err(TrackportError::VolumeNotOpen);
        }

        let mut entries = Vec::new();
        let mut songs = Vec::new();

        for project_id in 1..=volume.project_count() {
            let Some(project_name) = volume.project_name(project_id) else {
                warn!("Skipping unreadable project {}", project_id);
                continue;
            };

            for song_id in 1..=volume.song_count(project_id) {
                let Some(song) = volume.open_song(project_id, song_id) else {
                    warn!("Skipping unreadable song {}.{}", project_id, song_id);
                    continue;
                };

                entries.push(CatalogEntry {
                    project_id,
                    song_id,
                    project_name: project_name.clone(),
                    song_name: song.name().to_string(),
                    sample_rate_hz: song.sample_rate(),
                    channel_count: song.channel_count(),
                    frame_count: song.frame_count(),
                    duration: song.duration_display(),
                });
                songs.push(song);
            }
        }

        info!(
            "Catalog built for '{}': {} songs in {} projects",
            volume.name(),
            entries.len(),
            volume.project_count()
        );

        Ok(Catalog {
            volume_name: volume.name(),
            entries,
            songs,
        })
    }

    /// Label of the volume the catalog was built from
    pub fn volume_name(&self) -> &str {
        &self.volume_name
    }

    /// All entries in display order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Entry at `index`
    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    /// Driver handle of the song at `index`
    ///
    /// The handle carries the song's read cursor; whoever holds this borrow
    /// owns the cursor.
    pub fn song_mut(&mut self, index: usize) -> Option<&mut (dyn Song + 'static)> {
        self.songs.get_mut(index).map(|song| song.as_mut())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("volume_name", &self.volume_name)
            .field("entries", &self.entries)
            .finish()
    }
}
