//! Volume Driver Module
//!
//! The interface to the recorder's storage volume. A volume holds projects,
//! a project holds songs, and a song exposes its sample geometry plus a
//! single stateful read cursor over interleaved multi-track frames.
//!
//! Projects and songs are addressed by 1-based ordinal ids that are only
//! stable while the volume stays open.

pub mod image;
pub mod memory;

pub use image::ImageVolume;
pub use memory::{MemorySong, MemoryVolume};

use crate::error::Result;

/// Upper bound on physical tracks per song for the supported hardware
pub const MAX_CHANNELS: usize = 24;

/// Mask selecting the 24 significant bits of a raw sample
pub const SAMPLE_MASK: u32 = 0x00FF_FFFF;

/// One song on the volume, with its shared read cursor
pub trait Song {
    /// Song name as stored on the volume
    fn name(&self) -> &str;

    /// Sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Number of physical tracks recorded
    fn channel_count(&self) -> usize;

    /// Total number of interleaved frames
    fn frame_count(&self) -> u64;

    /// Human-readable duration, `HH:MM:SS.ff`
    fn duration_display(&self) -> String {
        format_duration(self.frame_count(), self.sample_rate())
    }

    /// Move the read cursor to `frame`
    fn seek(&mut self, frame: u64) -> Result<()>;

    /// Read the frame under the cursor into `frame` and advance by one
    ///
    /// `frame` holds one raw sample per physical channel. Only the low 24
    /// bits of each sample are significant.
    fn read_frame(&mut self, frame: &mut [u32]) -> Result<()>;
}

/// An opened storage volume
pub trait Volume {
    /// Whether the volume is open and readable
    fn is_open(&self) -> bool;

    /// Volume label
    fn name(&self) -> String;

    /// Number of projects (ids run 1..=count)
    fn project_count(&self) -> u32;

    /// Name of a project, `None` when the project cannot be read
    fn project_name(&self, project_id: u32) -> Option<String>;

    /// Number of songs in a project (ids run 1..=count)
    fn song_count(&self, project_id: u32) -> u32;

    /// Open a handle to a song, `None` when the song cannot be read
    fn open_song(&self, project_id: u32, song_id: u32) -> Option<Box<dyn Song>>;
}

/// Format a frame count as `HH:MM:SS.ff` (hundredths of a second)
pub fn format_duration(frames: u64, sample_rate: u32) -> String {
    if sample_rate == 0 {
        return "00:00:00.00".to_string();
    }
    let rate = sample_rate as u64;
    let total_secs = frames / rate;
    let hundredths = (frames % rate) * 100 / rate;

    format!(
        "{:02}:{:02}:{:02}.{:02}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        hundredths
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 48000, "00:00:00.00" ; "empty song")]
    #[test_case(48000, 48000, "00:00:01.00" ; "one second")]
    #[test_case(44100 * 61 + 22050, 44100, "00:01:01.50" ; "minute and a half second")]
    #[test_case(48000 * 3723, 48000, "01:02:03.00" ; "over an hour")]
    #[test_case(100, 0, "00:00:00.00" ; "zero rate")]
    fn test_format_duration(frames: u64, rate: u32, expected: &str) {
        assert_eq!(format_duration(frames, rate), expected);
    }
}
