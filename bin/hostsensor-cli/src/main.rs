// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # hostsensor
//!
//! Command-line interface for the hostsensor poller.
//!
//! ## Usage
//! ```bash
//! # Dump every chip and feature the driver sees
//! hostsensor scan --json
//!
//! # Read one value through the poller
//! hostsensor --config hostsensor.toml read temperature "Core 0"
//!
//! # Poll all configured labels every 5 seconds
//! hostsensor --config hostsensor.toml watch --interval 5
//! ```

mod commands;

use clap::{Parser, Subcommand};
use sensor_poller::MetricKind;

#[derive(Parser)]
#[command(
    name = "hostsensor",
    about = "Hardware sensor poller (hwmon / lm-sensors)",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one driver scan and print every reading.
    Scan {
        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Read a single value through the poller.
    Read {
        /// Metric family: temperature or voltage.
        family: MetricKind,

        /// Feature label, as configured for the family.
        label: String,
    },

    /// Poll every configured label periodically.
    Watch {
        /// Seconds between reads.
        #[arg(short, long, default_value_t = 5)]
        interval: u64,

        /// Stop after this many rounds (runs until Ctrl-C if omitted).
        #[arg(short = 'n', long)]
        count: Option<u64>,
    },

    /// Scan once and report availability and scan statistics.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan { json } => commands::scan::execute(config, json).await,
        Commands::Read { family, label } => commands::read::execute(config, family, label).await,
        Commands::Watch { interval, count } => {
            commands::watch::execute(config, interval, count).await
        }
        Commands::Status => commands::status::execute(config).await,
    }
}
