// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared setup.

pub mod read;
pub mod scan;
pub mod status;
pub mod watch;

use anyhow::Context;
use sensor_driver::HwmonDriver;
use sensor_poller::{PollerConfig, SensorPoller};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the level follows the `-v` count.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the config file if one was given, otherwise the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PollerConfig> {
    match path {
        Some(p) => PollerConfig::from_file(p)
            .with_context(|| format!("loading {}", p.display())),
        None => Ok(PollerConfig::default()),
    }
}

/// Builds a poller whose first scan is due immediately.
pub fn eager_poller(mut config: PollerConfig) -> anyhow::Result<SensorPoller<HwmonDriver>> {
    config.startup_delay_secs = 0;
    let driver = HwmonDriver::new(&config.hwmon_root);
    Ok(SensorPoller::new(&config, driver)?)
}

/// Formats an optional reading for display.
pub fn format_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:>8.3} {unit}"),
        None => format!("{:>8} {unit}", "--"),
    }
}
