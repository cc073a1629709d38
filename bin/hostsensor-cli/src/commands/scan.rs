// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `hostsensor scan` command: one raw driver scan.
//!
//! Bypasses the poller so every chip and feature is shown, including the
//! ones no family is configured for. Useful for finding the labels to put
//! in the config file.

use sensor_driver::{HwmonDriver, SensorDriver};
use sensor_poller::PollerConfig;

pub async fn execute(config: PollerConfig, json: bool) -> anyhow::Result<()> {
    let driver = HwmonDriver::new(&config.hwmon_root);
    let snapshot = driver.scan(&config.config_filename)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("  hwmon root:  {}", config.hwmon_root.display());
    println!("  config:      {}", config.config_filename.display());
    println!();

    for (chip, readings) in snapshot.chips() {
        println!("  {chip}");
        if readings.is_empty() {
            println!("    (no features)");
        }
        for (label, value) in readings {
            println!("    {label:<24} {value:>10.3}");
        }
        println!();
    }

    println!("{}", snapshot.summary());
    Ok(())
}
