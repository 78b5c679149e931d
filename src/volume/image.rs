//! Directory image volume
//!
//! An image is a directory holding a `volume.json` manifest and one raw data
//! file per song. Data files store interleaved frames, 3 bytes per sample,
//! most significant byte first.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{Song, Volume, MAX_CHANNELS, SAMPLE_MASK};
use crate::error::{Result, TrackportError};

/// Manifest file name inside an image directory
pub const MANIFEST_FILE: &str = "volume.json";

/// Bytes per stored sample
pub const BYTES_PER_SAMPLE: usize = 3;

/// Top-level manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeManifest {
    /// Volume label
    pub name: String,
    /// Projects in volume order
    #[serde(default)]
    pub projects: Vec<ProjectManifest>,
}

/// One project entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub name: String,
    #[serde(default)]
    pub songs: Vec<SongManifest>,
}

/// One song entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongManifest {
    pub name: String,
    pub sample_rate: u32,
    pub channels: usize,
    pub frames: u64,
    /// Data file, relative to the image directory
    pub data: PathBuf,
}

/// A volume read from an image directory
#[derive(Debug)]
pub struct ImageVolume {
    root: PathBuf,
    manifest: VolumeManifest,
    open: bool,
}

impl ImageVolume {
    /// Open an image directory (or its manifest file directly)
    pub fn open(path: &Path) -> Result<Self> {
        let manifest_path = if path.is_dir() {
            path.join(MANIFEST_FILE)
        } else {
            path.to_path_buf()
        };

        if !manifest_path.exists() {
            return Err(TrackportError::VolumeNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(&manifest_path)?;
        let manifest: VolumeManifest =
            serde_json::from_str(&content).map_err(|e| TrackportError::InvalidVolume {
                reason: format!("{}: {}", manifest_path.display(), e),
            })?;

        let root = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        debug!(
            "Opened image '{}' at {} ({} projects)",
            manifest.name,
            root.display(),
            manifest.projects.len()
        );

        Ok(ImageVolume {
            root,
            manifest,
            open: true,
        })
    }

    /// Write every readable song of `source` into a new image at `dir`
    pub fn create(dir: &Path, source: &dyn Volume) -> Result<Self> {
        if !source.is_open() {
            return Err(TrackportError::VolumeNotOpen);
        }
        fs::create_dir_all(dir)?;

        let mut manifest = VolumeManifest {
            name: source.name(),
            projects: Vec::new(),
        };

        for project_id in 1..=source.project_count() {
            let Some(project_name) = source.project_name(project_id) else {
                continue;
            };
            let mut project = ProjectManifest {
                name: project_name,
                songs: Vec::new(),
            };

            for song_id in 1..=source.song_count(project_id) {
                let Some(mut song) = source.open_song(project_id, song_id) else {
                    continue;
                };
                let data = PathBuf::from(format!("p{:02}_s{:02}.raw", project_id, song_id));
                write_song_data(&dir.join(&data), song.as_mut())?;

                project.songs.push(SongManifest {
                    name: song.name().to_string(),
                    sample_rate: song.sample_rate(),
                    channels: song.channel_count(),
                    frames: song.frame_count(),
                    data,
                });
            }
            manifest.projects.push(project);
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;

        Ok(ImageVolume {
            root: dir.to_path_buf(),
            manifest,
            open: true,
        })
    }

    /// Release the volume; later reads see it as closed
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Image directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project(&self, project_id: u32) -> Option<&ProjectManifest> {
        let index = (project_id as usize).checked_sub(1)?;
        self.manifest.projects.get(index)
    }
}

impl Volume for ImageVolume {
    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> String {
        self.manifest.name.clone()
    }

    fn project_count(&self) -> u32 {
        self.manifest.projects.len() as u32
    }

    fn project_name(&self, project_id: u32) -> Option<String> {
        if !self.open {
            return None;
        }
        self.project(project_id).map(|p| p.name.clone())
    }

    fn song_count(&self, project_id: u32) -> u32 {
        self.project(project_id).map_or(0, |p| p.songs.len() as u32)
    }

    fn open_song(&self, project_id: u32, song_id: u32) -> Option<Box<dyn Song>> {
        if !self.open {
            return None;
        }
        let project = self.project(project_id)?;
        let entry = project.songs.get((song_id as usize).checked_sub(1)?)?;

        if entry.channels > MAX_CHANNELS {
            warn!(
                "Song '{}' reports {} channels (max {})",
                entry.name, entry.channels, MAX_CHANNELS
            );
            return None;
        }

        let path = self.root.join(&entry.data);
        match ImageSong::open(&path, entry) {
            Ok(song) => Some(Box::new(song)),
            Err(e) => {
                warn!("Song '{}' unreadable: {}", entry.name, e);
                None
            }
        }
    }
}

/// A song read from a raw data file
///
/// The data file is opened on the first `seek` and held until the song is
/// dropped, so a catalog of many songs keeps no descriptors open.
struct ImageSong {
    name: String,
    sample_rate: u32,
    channels: usize,
    frames: u64,
    path: PathBuf,
    reader: Option<BufReader<File>>,
    position: u64,
    row: Vec<u8>,
}

impl ImageSong {
    fn open(path: &Path, entry: &SongManifest) -> Result<Self> {
        let row_len = entry.channels * BYTES_PER_SAMPLE;
        let needed = entry
            .frames
            .checked_mul(row_len as u64)
            .ok_or_else(|| TrackportError::InvalidVolume {
                reason: format!(
                    "'{}' declares {} frames of {} channels",
                    entry.name, entry.frames, entry.channels
                ),
            })?;
        let available = fs::metadata(path)?.len();
        if available < needed {
            return Err(TrackportError::InvalidVolume {
                reason: format!(
                    "{} holds {} bytes, expected {}",
                    path.display(),
                    available,
                    needed
                ),
            });
        }

        Ok(ImageSong {
            name: entry.name.clone(),
            sample_rate: entry.sample_rate,
            channels: entry.channels,
            frames: entry.frames,
            path: path.to_path_buf(),
            reader: None,
            position: 0,
            row: vec![0; row_len],
        })
    }
}

impl Song for ImageSong {
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
        let frame = frame.min(self.frames);
        let offset = frame * self.row.len() as u64;
        let reader = match self.reader.take() {
            Some(reader) => reader,
            None => BufReader::new(File::open(&self.path)?),
        };
        let reader = self.reader.insert(reader);
        reader.seek(SeekFrom::Start(offset))?;
        self.position = frame;
        Ok(())
    }

    fn read_frame(&mut self, frame: &mut [u32]) -> Result<()> {
        if self.position >= self.frames {
            return Err(TrackportError::SongRead {
                reason: format!("read past end of '{}' ({} frames)", self.name, self.frames),
            });
        }

        let reader = self.reader.as_mut().ok_or_else(|| TrackportError::SongRead {
            reason: format!("'{}' read before seek", self.name),
        })?;
        reader
            .read_exact(&mut self.row)
            .map_err(|e| TrackportError::SongRead {
                reason: format!("'{}' frame {}: {}", self.name, self.position, e),
            })?;

        for (slot, bytes) in frame.iter_mut().zip(self.row.chunks_exact(BYTES_PER_SAMPLE)) {
            *slot = decode_sample_be(bytes);
        }
        self.position += 1;
        Ok(())
    }
}

fn write_song_data(path: &Path, song: &mut dyn Song) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    let mut frame = vec![0u32; song.channel_count()];

    song.seek(0)?;
    for _ in 0..song.frame_count() {
        song.read_frame(&mut frame)?;
        for &sample in &frame {
            out.write_all(&encode_sample_be(sample))?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Stored byte order: most significant byte first
fn encode_sample_be(sample: u32) -> [u8; 3] {
    let bytes = (sample & SAMPLE_MASK).to_be_bytes();
    [bytes[1], bytes[2], bytes[3]]
}

fn decode_sample_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}
