//! Chunked sample source over a song's read cursor
//!
//! The song cursor is shared, mutable driver state: a previous export (or
//! anything else) may have left it anywhere. The adapter therefore treats
//! its position as unknown until `reset` has been called, and refuses to
//! read before that.

use std::slice::ChunksExact;

use log::debug;

use crate::error::{Result, TrackportError};
use crate::volume::Song;

/// Chunked, resettable view of one song's interleaved frames
pub struct SampleSource<'a> {
    song: &'a mut dyn Song,
    channels: usize,
    frames_total: u64,
    position: Option<u64>,
    buffer: Vec<u32>,
}

impl<'a> SampleSource<'a> {
    /// Wrap a song handle; the caller must `reset` before reading
    pub fn new(song: &'a mut dyn Song) -> Self {
        let channels = song.channel_count();
        let frames_total = song.frame_count();
        SampleSource {
            song,
            channels,
            frames_total,
            position: None,
            buffer: Vec::new(),
        }
    }

    /// Move the cursor to frame 0
    pub fn reset(&mut self) -> Result<()> {
        self.song.seek(0)?;
        self.position = Some(0);
        debug!("Sample source reset for '{}'", self.song.name());
        Ok(())
    }

    /// Read up to `max_frames` frames
    ///
    /// Returns fewer frames only at the end of the song. The returned block
    /// borrows an internal buffer that is reused by the next call, so memory
    /// stays bounded by the largest `max_frames` requested.
    pub fn read_frames(&mut self, max_frames: usize) -> Result<FrameBlock<'_>> {
        let position = self.position.ok_or_else(|| TrackportError::SongRead {
            reason: "cursor position unknown, reset before reading".to_string(),
        })?;

        let remaining = self.frames_total.saturating_sub(position);
        let frames = (max_frames as u64).min(remaining) as usize;

        self.buffer.clear();
        self.buffer.resize(frames * self.channels, 0);

        if self.channels > 0 {
            for (index, frame) in self.buffer.chunks_exact_mut(self.channels).enumerate() {
                if let Err(e) = self.song.read_frame(frame) {
                    // Whatever was consumed is lost; the position is unknown again
                    self.position = None;
                    debug!("Read failed after {} frames of chunk: {}", index, e);
                    return Err(e);
                }
            }
        } else if frames > 0 {
            let mut empty: [u32; 0] = [];
            for _ in 0..frames {
                self.song.read_frame(&mut empty)?;
            }
        }

        self.position = Some(position + frames as u64);

        Ok(FrameBlock {
            samples: &self.buffer,
            channels: self.channels,
            frames,
        })
    }

    /// Physical channels per frame
    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// Total frames in the song
    pub fn frame_count(&self) -> u64 {
        self.frames_total
    }

    /// Frames read since the last reset, `None` before the first reset
    pub fn position(&self) -> Option<u64> {
        self.position
    }
}

/// A chunk of interleaved frames
#[derive(Debug, Clone, Copy)]
pub struct FrameBlock<'b> {
    samples: &'b [u32],
    channels: usize,
    frames: usize,
}

impl<'b> FrameBlock<'b> {
    /// Number of frames in the block
    pub fn len(&self) -> usize {
        self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Samples per frame
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Raw interleaved samples
    pub fn samples(&self) -> &'b [u32] {
        self.samples
    }

    /// Frames, each one sample per physical channel
    pub fn frames(&self) -> ChunksExact<'b, u32> {
        self.samples.chunks_exact(self.channels.max(1))
    }
}
