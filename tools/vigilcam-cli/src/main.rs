//! Command-line interface for motion detection tooling.
//!
//! Usage:
//!   vigilcam simulate [OPTIONS]    Run synthetic motion through a session
//!   vigilcam regions <NAME>        Inspect a persisted region profile
//!   vigilcam check                 Check configuration and grid geometry

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "vigilcam",
    about = "Macroblock-vector motion detection for camera surveillance",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a synthetic moving object through a detection session
    Simulate {
        /// Number of frames to synthesize
        #[arg(long, default_value = "120")]
        frames: u32,

        /// Side of the moving cell cluster, in grid cells
        #[arg(long, default_value = "3")]
        object_size: usize,

        /// Horizontal speed in vector units per frame
        #[arg(long, default_value = "10")]
        speed: i16,

        /// Region profile to load before simulating
        #[arg(long)]
        regions: Option<String>,

        /// Emit a stats line for every detected frame
        #[arg(long)]
        stats: bool,
    },

    /// Inspect a persisted region profile
    Regions {
        /// Profile name; omit to list all profiles
        name: Option<String>,
    },

    /// Check configuration and derived detector geometry
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => vigilcam_common::config::AppConfig::load_from(path)?,
        None => vigilcam_common::config::AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    vigilcam_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Simulate {
            frames,
            object_size,
            speed,
            regions,
            stats,
        } => commands::simulate::run(config, frames, object_size, speed, regions, stats).await,
        Commands::Regions { name } => commands::regions::run(config, name),
        Commands::Check => commands::check::run(config),
    }
}
