//! CLI Module
//!
//! Command-line front end for Trackport.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Trackport - export individual tracks from multitrack recorder volumes
#[derive(Parser, Debug)]
#[command(name = "trackport")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show volume name and project/song counts
    #[command(name = "info")]
    Info {
        /// Path to the volume image
        image: PathBuf,
    },

    /// List every song on the volume
    #[command(name = "list")]
    List {
        /// Path to the volume image
        image: PathBuf,
    },

    /// Show the tracks of one song
    #[command(name = "tracks")]
    Tracks {
        /// Path to the volume image
        image: PathBuf,

        /// Song number as shown by `list` (1-based)
        song: usize,
    },

    /// Export selected tracks of one song as mono files
    #[command(name = "export")]
    Export(ExportArgs),
}

/// Arguments of the `export` command
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Path to the volume image
    pub image: PathBuf,

    /// Song number as shown by `list` (1-based)
    pub song: usize,

    /// Track numbers to export (1-based, comma separated)
    #[arg(short, long, value_delimiter = ',', conflicts_with = "all")]
    pub tracks: Vec<usize>,

    /// Export every track of the song
    #[arg(short, long)]
    pub all: bool,

    /// Destination directory
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Output container: aiff or wav
    #[arg(short, long)]
    pub format: Option<String>,

    /// Frames read per chunk
    #[arg(long)]
    pub chunk: Option<usize>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the export result as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export_tracks() {
        let cli = Cli::parse_from([
            "trackport", "export", "disk", "3", "--tracks", "1,4,12", "--format", "wav",
        ]);
        match cli.command {
            Some(Commands::Export(args)) => {
                assert_eq!(args.song, 3);
                assert_eq!(args.tracks, vec![1, 4, 12]);
                assert_eq!(args.format.as_deref(), Some("wav"));
                assert!(!args.all);
            }
            other => panic!("Expected export command, got: {:?}", other),
        }
    }

    #[test]
    fn test_tracks_conflict_with_all() {
        let result = Cli::try_parse_from(["trackport", "export", "disk", "1", "--all", "-t", "2"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
