//! PRZNT - Main Entry Point
//!
//! Commands:
//! - replay: Run a recorded landmark session through the posture engine
//! - config: Print a configuration preset

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use cli::{init_logging, replay};
use posture::PostureConfig;
use session::feed::DEFAULT_CAPACITY;
use std::path::PathBuf;
use tracing::info;

/// PRZNT - presenter posture coaching
#[derive(Parser)]
#[command(name = "prznt")]
#[command(version)]
#[command(about = "Classify presenter posture from body landmarks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded session (one JSON frame per line)
    Replay {
        /// Frames file
        frames: PathBuf,

        /// Engine configuration file (TOML, JSON, ...)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Emit logs as JSON
        #[arg(long)]
        json_logs: bool,

        /// Frame feed capacity
        #[arg(long, default_value_t = DEFAULT_CAPACITY)]
        buffer: usize,
    },

    /// Print a configuration preset
    Config {
        #[arg(long, value_enum, default_value = "default")]
        preset: Preset,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Default,
    Strict,
    Lenient,
}

impl Preset {
    fn config(self) -> PostureConfig {
        match self {
            Preset::Default => PostureConfig::default(),
            Preset::Strict => PostureConfig::strict(),
            Preset::Lenient => PostureConfig::lenient(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            frames,
            config,
            json_logs,
            buffer,
        } => {
            init_logging(json_logs)?;
            info!("=== PRZNT v{} ===", env!("CARGO_PKG_VERSION"));

            let config = match config {
                Some(path) => PostureConfig::load(&path)?,
                None => PostureConfig::default(),
            };
            let report = replay(&frames, config, buffer).await?;
            println!("{}", report.to_json()?);
        }
        Commands::Config { preset } => {
            println!("{}", serde_json::to_string_pretty(&preset.config())?);
        }
    }

    Ok(())
}
