// SPDX-License-Identifier: GPL-3.0-only

use barcode_scan::Config;
use barcode_scan::backends::camera::Facing;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "barcode-scan")]
#[command(about = "Scan 1-D barcodes from a live camera feed")]
#[command(version = env!("BUILD_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/barcode-scan/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Scan until Ctrl+C, printing every barcode read (default)
    Scan {
        /// Replay image files or directories as the camera
        #[arg(short, long, num_args = 1..)]
        image: Vec<PathBuf>,

        /// V4L2 device node to capture from (e.g. /dev/video0)
        #[arg(short, long, conflicts_with = "image")]
        device: Option<String>,

        /// Camera facing: environment, user or external
        #[arg(short, long)]
        facing: Option<String>,

        /// Stop after the first barcode
        #[arg(long)]
        once: bool,
    },

    /// Decode barcodes in image files
    Decode {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=barcode_scan=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) if path.exists() => Config::load_from(path)?,
        Some(_) => Config::default(),
        None => Config::load()?,
    };

    let command = cli.command.unwrap_or(Commands::Scan {
        image: Vec::new(),
        device: None,
        facing: None,
        once: false,
    });

    match command {
        Commands::List => cli::list_cameras(&config),
        Commands::Scan {
            image,
            device,
            facing,
            once,
        } => {
            let config = cli::apply_scan_overrides(
                config,
                image,
                device,
                facing.as_deref().map(Facing::from_location),
            );
            tokio::runtime::Runtime::new()?.block_on(cli::scan(config, once))
        }
        Commands::Decode { images } => cli::decode_images(&config, &images),
        Commands::Config { save } => cli::show_config(&config, cli.config.as_deref(), save),
    }
}
