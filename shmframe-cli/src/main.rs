// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! shmframe CLI
//!
//! Command-line interface for publishing and inspecting shared memory frames.

use clap::{Parser, Subcommand};

mod commands;
mod pattern;

/// shmframe - Single-slot shared memory video frame publisher
#[derive(Parser)]
#[command(name = "shmframe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults apply if shmframe.yaml is absent)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish a synthetic test pattern until interrupted
    Run {
        /// Frame width in pixels
        #[arg(long, default_value_t = 640)]
        width: u32,

        /// Frame height in pixels
        #[arg(long, default_value_t = 480)]
        height: u32,

        /// Production cycles per second
        #[arg(long, default_value_t = 30)]
        fps: u32,

        /// Stop after this many cycles
        #[arg(long)]
        frames: Option<u64>,

        /// Halve the frame size every N cycles to exercise region recreation
        #[arg(long)]
        resize_every: Option<u64>,

        /// Print publisher counters as JSON on exit
        #[arg(long)]
        stats_json: bool,
    },

    /// Read the current frame header from a region
    Inspect {
        /// Region name (overrides the configuration)
        #[arg(short, long)]
        name: Option<String>,

        /// Keep polling until interrupted
        #[arg(short, long)]
        watch: bool,

        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: String,
    },

    /// Remove a stale shared memory name left behind by a publisher
    Clean {
        /// Region name (overrides the configuration)
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Run {
            width,
            height,
            fps,
            frames,
            resize_every,
            stats_json,
        } => {
            let options = commands::run::RunOptions {
                width,
                height,
                fps,
                frames,
                resize_every,
                stats_json,
            };
            commands::run::execute(cli.config.as_deref(), options).await
        }
        Commands::Inspect {
            name,
            watch,
            interval_ms,
            json,
        } => {
            commands::inspect::execute(cli.config.as_deref(), name, watch, interval_ms, json)
                .await
        }
        Commands::Validate { file } => commands::validate::execute(&file).await,
        Commands::Clean { name } => commands::clean::execute(cli.config.as_deref(), name).await,
    }
}
