//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command. The terminal front end
//! is a thin renderer over `Session`; it never touches the song cursor.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::info;

use super::ExportArgs;
use crate::browse::{track_label, Catalog, Session};
use crate::config::ExportConfig;
use crate::error::{Result, TrackportError};
use crate::export::{ExportResult, LogSink, ProgressEvent, ProgressSink, TrackOutcome};
use crate::output::{ContainerFormat, FileOutputFactory};
use crate::volume::{ImageVolume, Volume};

const RULE: &str = "======================================================================";

/// Show volume name and counts.
pub fn info(image: &Path) -> Result<()> {
    let volume = ImageVolume::open(image)?;
    let session = Session::open(&volume)?;

    println!("Volume name: {}", volume.name());
    println!("Projects:    {}", volume.project_count());
    println!("Songs:       {}", session.catalog().len());

    Ok(())
}

/// List every song grouped by project.
pub fn list(image: &Path) -> Result<()> {
    let volume = ImageVolume::open(image)?;
    let session = Session::open(&volume)?;
    print!("{}", render_listing(&volume, session.catalog()));
    Ok(())
}

/// Project headers come from the volume so projects without songs still
/// show up; song lines come from the catalog and carry its numbering.
fn render_listing(volume: &dyn Volume, catalog: &Catalog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Volume name: {}", catalog.volume_name());
    if volume.project_count() == 0 {
        let _ = writeln!(out, "No projects found on this volume.");
        return out;
    }

    for project_id in 1..=volume.project_count() {
        let _ = writeln!(out, "{}", RULE);
        match volume.project_name(project_id) {
            Some(name) => {
                let _ = writeln!(out, "Project {}: {}", project_id, name);
            }
            None => {
                let _ = writeln!(out, "Project {}: (unreadable)", project_id);
                continue;
            }
        }

        let mut any = false;
        for (index, entry) in catalog.iter().enumerate() {
            if entry.project_id != project_id {
                continue;
            }
            any = true;
            let _ = writeln!(
                out,
                "  {:>3}. Song {}.{}: {:<20} {}, {:>2} ch, {} Hz",
                index + 1,
                entry.project_id,
                entry.song_id,
                entry.song_name,
                entry.duration,
                entry.channel_count,
                entry.sample_rate_hz
            );
        }
        if !any {
            let _ = writeln!(out, "      No songs in this project.");
        }
    }
    let _ = writeln!(out, "{}", RULE);
    out
}

/// Show the tracks of one song.
pub fn tracks(image: &Path, song: usize) -> Result<()> {
    let volume = ImageVolume::open(image)?;
    let mut session = Session::open(&volume)?;
    select_song_number(&mut session, song)?;

    if let Some(entry) = session.current_song() {
        println!("Track Selection - {}", entry.song_name);
        println!(
            "Project: {}  |  Rate: {} Hz  |  Tracks: {}  |  Duration: {}",
            entry.project_name, entry.sample_rate_hz, entry.channel_count, entry.duration
        );
        println!("{:-<70}", "");
        for channel in 0..entry.channel_count {
            println!("  {}", track_label(channel));
        }
    }

    Ok(())
}

/// Export selected tracks of one song.
pub fn export(args: &ExportArgs) -> Result<ExportResult> {
    let config = resolve_config(args)?;
    let volume = ImageVolume::open(&args.image)?;
    let mut session = Session::open(&volume)?;
    select_song_number(&mut session, args.song)?;

    let channel_count = session.current_song().map_or(0, |entry| entry.channel_count);
    if args.all {
        session.select_all()?;
    } else {
        for &track in &args.tracks {
            if track == 0 || track > channel_count {
                return Err(TrackportError::Config {
                    reason: format!("track {} out of range 1..={}", track, channel_count),
                });
            }
            if !session.selection().is_selected(track - 1) {
                session.toggle(track - 1)?;
            }
        }
    }

    let selected = session.selection().selected_count();
    if selected == 0 {
        return Err(TrackportError::NoChannelsSelected);
    }

    info!("Export directory: {}", config.destination.display());
    fs::create_dir_all(&config.destination)?;

    // Keep stdout for the JSON report; progress goes to the log instead
    let mut sink: Box<dyn ProgressSink> = if args.json {
        Box::new(LogSink::default())
    } else {
        println!(
            "Exporting {} track(s) to {} format...",
            selected, config.format
        );
        println!("Export directory: {}", config.destination.display());
        Box::new(ConsoleSink::default())
    };
    let result = session.export(&config, &FileOutputFactory, sink.as_mut())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result, &config);
    }

    Ok(result)
}

/// Merge config file, defaults and command-line overrides.
fn resolve_config(args: &ExportArgs) -> Result<ExportConfig> {
    let mut config = match &args.config {
        Some(path) => ExportConfig::load(path)?,
        None => ExportConfig::default(),
    };

    if let Some(out) = &args.out {
        config = config.with_destination(out);
    }
    if let Some(name) = &args.format {
        let format = ContainerFormat::from_name(name).ok_or_else(|| TrackportError::Config {
            reason: format!("unknown format '{}', expected aiff or wav", name),
        })?;
        config = config.with_format(format);
    }
    if let Some(chunk) = args.chunk {
        config = config.with_chunk_frames(chunk);
    }

    config.validate()?;
    Ok(config)
}

/// Select a song by its 1-based listing number.
fn select_song_number(session: &mut Session, song: usize) -> Result<()> {
    let selected = match song.checked_sub(1) {
        Some(index) => session.select_song(index)?,
        None => false,
    };
    if !selected {
        return Err(TrackportError::SongNotFound { index: song });
    }
    Ok(())
}

fn print_summary(result: &ExportResult, config: &ExportConfig) {
    println!();
    if result.is_success() {
        println!("Export completed successfully!");
        println!(
            "Exported {} bytes to {} {} file(s) in {}",
            result.bytes_written,
            result.succeeded.len(),
            config.format,
            config.destination.display()
        );
    } else {
        println!("Export failed!");
    }

    if !result.failed.is_empty() {
        println!("Failed tracks:");
        for (channel, failure) in &result.failed {
            println!("  {}: {}", track_label(*channel), failure);
        }
        let retry: Vec<String> = result
            .failed_channels()
            .iter()
            .map(|c| (c + 1).to_string())
            .collect();
        println!("Re-run with --tracks {} to retry.", retry.join(","));
    }
}

/// Prints a status line per track and a percentage that overwrites itself.
#[derive(Debug, Default)]
struct ConsoleSink {
    last_percent: Option<u32>,
}

impl ProgressSink for ConsoleSink {
    fn on_progress(&mut self, event: &ProgressEvent) {
        let percent = (event.track_fraction() * 100.0) as u32;
        if self.last_percent == Some(percent) {
            return;
        }
        self.last_percent = Some(percent);
        print!("\r  Progress: {:>3}%", percent);
        let _ = io::stdout().flush();
    }

    fn on_track_started(&mut self, channel: usize, ordinal: usize, total: usize) {
        self.last_percent = None;
        println!("Exporting track {} of {} ({})...", ordinal, total, track_label(channel));
    }

    fn on_track_finished(&mut self, _channel: usize, outcome: &TrackOutcome) {
        match outcome {
            TrackOutcome::Completed { .. } => println!("\r  Progress: 100% done"),
            TrackOutcome::Failed(failure) => println!("\r  Error: {}", failure),
        }
    }
}
