// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! shmlink CLI
//!
//! Create, inspect and poke at named shared-memory regions from a shell.

use clap::{Parser, Subcommand};
use shmlink_core::BackendKind;

mod commands;
mod tui;

/// shmlink - Named cross-process shared-memory regions
#[derive(Parser)]
#[command(name = "shmlink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "shmlink.yaml", global = true)]
    pub config: String,

    /// OS primitive family for region commands
    #[arg(short, long, default_value = "posix", global = true)]
    pub backend: BackendKind,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create every region in the config file and hold them until Ctrl+C
    Up,

    /// Create a single region
    Create {
        /// Region name
        name: String,

        /// Payload size in bytes
        #[arg(short, long, default_value_t = 0)]
        payload: usize,

        /// Keep the region alive until Ctrl+C
        #[arg(long)]
        hold: bool,
    },

    /// Show a region's header, payload checksum and OS identifiers
    Inspect {
        /// Region name
        name: String,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Write the header scalar (also stamps the time and raises LAM)
    PutScalar {
        name: String,
        value: f64,
    },

    /// Read the header scalar
    GetScalar { name: String },

    /// Write the payload from a hex string
    PutPayload {
        name: String,
        /// Payload bytes as hex, exactly the region's payload size
        hex: String,
    },

    /// Print the payload as hex
    GetPayload { name: String },

    /// Read or set the LAM (look-at-me) flag
    Lam {
        name: String,

        /// New value for the flag
        #[arg(long)]
        set: Option<bool>,
    },

    /// Remove a region's leftover OS objects
    Cleanup { name: String },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: String,
    },

    /// Live dashboard of a region's header
    Monitor { name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays scriptable.
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let backend = cli.backend;
    match cli.command {
        Commands::Up => commands::up::execute(&cli.config).await,
        Commands::Create {
            name,
            payload,
            hold,
        } => commands::create::execute(&name, payload, hold, backend).await,
        Commands::Inspect { name, json } => commands::inspect::execute(&name, json, backend).await,
        Commands::PutScalar { name, value } => {
            commands::scalar::put(&name, value, backend).await
        }
        Commands::GetScalar { name } => commands::scalar::get(&name, backend).await,
        Commands::PutPayload { name, hex } => commands::payload::put(&name, &hex, backend).await,
        Commands::GetPayload { name } => commands::payload::get(&name, backend).await,
        Commands::Lam { name, set } => commands::lam::execute(&name, set, backend).await,
        Commands::Cleanup { name } => commands::cleanup::execute(&name, backend).await,
        Commands::Validate { file } => commands::validate::execute(&file).await,
        Commands::Monitor { name } => commands::monitor::execute(&name, backend).await,
    }
}
