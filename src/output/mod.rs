//! Output Stream Module
//!
//! The boundary to the audio container writers. The export engine only ever
//! opens a stream, appends pre-packed sample bytes and closes it again; the
//! writers in this module take care of the container headers.

pub mod aiff;
pub mod wav;

use std::fmt;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use aiff::AiffStream;
pub use wav::WavStream;

/// Container format of exported track files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// Audio Interchange File Format (default)
    #[default]
    Aiff,
    /// RIFF WAVE
    Wav,
}

impl ContainerFormat {
    /// File extension used for track files in this container
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Aiff => "aif",
            ContainerFormat::Wav => "wav",
        }
    }

    /// Parse a format name as given on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "aiff" | "aif" => Some(ContainerFormat::Aiff),
            "wav" | "wave" => Some(ContainerFormat::Wav),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerFormat::Aiff => write!(f, "AIFF"),
            ContainerFormat::Wav => write!(f, "WAV"),
        }
    }
}

/// Stream configuration for one exported track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (always 1 for exported tracks)
    pub channels: u16,
    /// Bits per sample (always 24 for exported tracks)
    pub bits_per_sample: u16,
    /// Target container
    pub format: ContainerFormat,
}

impl StreamSpec {
    /// Mono 24-bit PCM at the given rate
    pub fn mono_24bit(sample_rate: u32, format: ContainerFormat) -> Self {
        StreamSpec {
            sample_rate,
            channels: 1,
            bits_per_sample: 24,
            format,
        }
    }

    /// Bytes occupied by one frame in the packed payload
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }
}

/// An open output file accepting raw pre-packed sample bytes
pub trait OutputStream {
    /// Append raw bytes, returning how many bytes were actually written
    fn write_raw(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Finalize the container and release the file
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Opens output streams for exported tracks
pub trait OutputFactory {
    /// Create a new stream at `path`, replacing any existing file
    fn create(&self, path: &Path, spec: &StreamSpec) -> io::Result<Box<dyn OutputStream>>;
}

/// Opens real files using the container writers in this module
#[derive(Debug, Clone, Copy, Default)]
pub struct FileOutputFactory;

impl OutputFactory for FileOutputFactory {
    fn create(&self, path: &Path, spec: &StreamSpec) -> io::Result<Box<dyn OutputStream>> {
        match spec.format {
            ContainerFormat::Aiff => Ok(Box::new(AiffStream::create(path, spec)?)),
            ContainerFormat::Wav => Ok(Box::new(WavStream::create(path, spec)?)),
        }
    }
}
