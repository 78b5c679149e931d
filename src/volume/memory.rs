//! In-memory volume
//!
//! Holds songs as interleaved sample vectors. Used by tests and by front ends
//! that already have the sample data in memory.

use std::sync::Arc;

use super::{Song, Volume, SAMPLE_MASK};
use crate::error::{Result, TrackportError};

/// A song backed by an interleaved sample vector
///
/// Clones share the sample data but each carries its own cursor.
#[derive(Debug, Clone)]
pub struct MemorySong {
    name: String,
    sample_rate: u32,
    channels: usize,
    frames: u64,
    samples: Arc<Vec<u32>>,
    position: u64,
    fail_at: Option<u64>,
}

impl MemorySong {
    /// Create a song from interleaved samples
    ///
    /// Trailing samples that do not fill a whole frame are ignored.
    pub fn new(name: impl Into<String>, sample_rate: u32, channels: usize, samples: Vec<u32>) -> Self {
        let frames = if channels == 0 {
            0
        } else {
            (samples.len() / channels) as u64
        };

        MemorySong {
            name: name.into(),
            sample_rate,
            channels,
            frames,
            samples: Arc::new(samples),
            position: 0,
            fail_at: None,
        }
    }

    /// Create a song by evaluating `sample(frame, channel)` for every slot
    pub fn from_fn<F>(
        name: impl Into<String>,
        sample_rate: u32,
        channels: usize,
        frames: u64,
        mut sample: F,
    ) -> Self
    where
        F: FnMut(u64, usize) -> u32,
    {
        let mut samples = Vec::with_capacity(frames as usize * channels);
        for frame in 0..frames {
            for channel in 0..channels {
                samples.push(sample(frame, channel) & SAMPLE_MASK);
            }
        }
        Self::new(name, sample_rate, channels, samples)
    }

    /// Make every read at or beyond `frame` fail
    pub fn with_read_failure_at(mut self, frame: u64) -> Self {
        self.fail_at = Some(frame);
        self
    }

    /// Current cursor position
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl Song for MemorySong {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn seek(&mut self, frame: u64) -> Result<()> {
        self.position = frame.min(self.frames);
        Ok(())
    }

    fn read_frame(&mut self, frame: &mut [u32]) -> Result<()> {
        if self.fail_at.is_some_and(|at| self.position >= at) {
            return Err(TrackportError::SongRead {
                reason: format!("injected failure at frame {}", self.position),
            });
        }
        if self.position >= self.frames {
            return Err(TrackportError::SongRead {
                reason: format!("read past end of '{}' ({} frames)", self.name, self.frames),
            });
        }

        let start = self.position as usize * self.channels;
        let row = &self.samples[start..start + self.channels];
        let n = frame.len().min(self.channels);
        frame[..n].copy_from_slice(&row[..n]);
        self.position += 1;
        Ok(())
    }
}

/// A project of in-memory songs; `None` entries are unreadable songs
#[derive(Debug, Clone)]
pub struct MemoryProject {
    name: String,
    songs: Vec<Option<MemorySong>>,
}

impl MemoryProject {
    /// Create an empty project
    pub fn new(name: impl Into<String>) -> Self {
        MemoryProject {
            name: name.into(),
            songs: Vec::new(),
        }
    }

    /// Append a song
    pub fn with_song(mut self, song: MemorySong) -> Self {
        self.songs.push(Some(song));
        self
    }

    /// Append a song slot the driver cannot read
    pub fn with_unreadable_song(mut self) -> Self {
        self.songs.push(None);
        self
    }
}

/// A volume held entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryVolume {
    name: String,
    open: bool,
    projects: Vec<Option<MemoryProject>>,
}

impl MemoryVolume {
    /// Create an open, empty volume
    pub fn new(name: impl Into<String>) -> Self {
        MemoryVolume {
            name: name.into(),
            open: true,
            projects: Vec::new(),
        }
    }

    /// Append a project
    pub fn with_project(mut self, project: MemoryProject) -> Self {
        self.projects.push(Some(project));
        self
    }

    /// Append a project slot the driver cannot read
    pub fn with_unreadable_project(mut self) -> Self {
        self.projects.push(None);
        self
    }

    /// Mark the volume as closed
    pub fn close(&mut self) {
        self.open = false;
    }

    fn project(&self, project_id: u32) -> Option<&MemoryProject> {
        let index = (project_id as usize).checked_sub(1)?;
        self.projects.get(index)?.as_ref()
    }
}

impl Volume for MemoryVolume {
    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn project_count(&self) -> u32 {
        self.projects.len() as u32
    }

    fn project_name(&self, project_id: u32) -> Option<String> {
        self.project(project_id).map(|p| p.name.clone())
    }

    fn song_count(&self, project_id: u32) -> u32 {
        self.project(project_id).map_or(0, |p| p.songs.len() as u32)
    }

    fn open_song(&self, project_id: u32, song_id: u32) -> Option<Box<dyn Song>> {
        let project = self.project(project_id)?;
        let index = (song_id as usize).checked_sub(1)?;
        let song = project.songs.get(index)?.as_ref()?;
        Some(Box::new(song.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_song() -> MemorySong {
        MemorySong::from_fn("Ramp", 48000, 3, 4, |frame, channel| {
            (frame as u32) * 10 + channel as u32
        })
    }

    #[test]
    fn test_memory_song_geometry() {
        let song = ramp_song();
        assert_eq!(song.frame_count(), 4);
        assert_eq!(song.channel_count(), 3);
        assert_eq!(song.sample_rate(), 48000);
        assert_eq!(song.duration_display(), "00:00:00.00");
    }

    #[test]
    fn test_read_frame_advances_cursor() {
        let mut song = ramp_song();
        let mut frame = [0u32; 3];

        song.read_frame(&mut frame).unwrap();
        assert_eq!(frame, [0, 1, 2]);
        song.read_frame(&mut frame).unwrap();
        assert_eq!(frame, [10, 11, 12]);
        assert_eq!(song.position(), 2);

        song.seek(0).unwrap();
        song.read_frame(&mut frame).unwrap();
        assert_eq!(frame, [0, 1, 2]);
    }

    #[test]
    fn test_read_past_end_fails() {
        let mut song = ramp_song();
        song.seek(4).unwrap();
        let mut frame = [0u32; 3];
        assert!(song.read_frame(&mut frame).is_err());
    }

    #[test]
    fn test_from_fn_masks_to_24_bits() {
        let mut song = MemorySong::from_fn("Wide", 44100, 1, 1, |_, _| 0xFFAB_CDEF);
        let mut frame = [0u32; 1];
        song.read_frame(&mut frame).unwrap();
        assert_eq!(frame[0], 0x00AB_CDEF);
    }

    #[test]
    fn test_injected_read_failure() {
        let mut song = ramp_song().with_read_failure_at(2);
        let mut frame = [0u32; 3];
        assert!(song.read_frame(&mut frame).is_ok());
        assert!(song.read_frame(&mut frame).is_ok());
        assert!(matches!(
            song.read_frame(&mut frame),
            Err(TrackportError::SongRead { .. })
        ));
    }

    #[test]
    fn test_volume_ids_are_one_based() {
        let volume = MemoryVolume::new("Disk")
            .with_project(MemoryProject::new("First").with_song(ramp_song()))
            .with_unreadable_project();

        assert_eq!(volume.project_count(), 2);
        assert_eq!(volume.project_name(1).as_deref(), Some("First"));
        assert_eq!(volume.project_name(0), None);
        assert_eq!(volume.project_name(2), None);
        assert_eq!(volume.song_count(1), 1);
        assert_eq!(volume.song_count(2), 0);
        assert!(volume.open_song(1, 1).is_some());
        assert!(volume.open_song(1, 0).is_none());
        assert!(volume.open_song(1, 2).is_none());
    }

    #[test]
    fn test_close_volume() {
        let mut volume = MemoryVolume::new("Disk");
        assert!(volume.is_open());
        volume.close();
        assert!(!volume.is_open());
    }
}
