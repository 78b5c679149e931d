//! Trackport CLI
//!
//! Command-line interface for browsing recorder volumes and exporting tracks.

use anyhow::{bail, Context};
use clap::Parser;
use env_logger::Env;
use log::info;

use trackport::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Trackport v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Trackport v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Info { image } => commands::info(&image)
            .with_context(|| format!("cannot read volume {}", image.display())),
        Commands::List { image } => commands::list(&image)
            .with_context(|| format!("cannot list volume {}", image.display())),
        Commands::Tracks { image, song } => commands::tracks(&image, song)
            .with_context(|| format!("cannot show tracks of song {}", song)),
        Commands::Export(args) => {
            let result = commands::export(&args).map_err(|e| {
                let message = match e.recovery_suggestion() {
                    Some(hint) => format!("export failed ({})", hint),
                    None => "export failed".to_string(),
                };
                anyhow::Error::new(e).context(message)
            })?;
            if !result.is_success() {
                bail!("no track was exported");
            }
            Ok(())
        }
    }
}
