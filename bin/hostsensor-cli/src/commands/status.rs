// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `hostsensor status` command: availability and configured values.

use sensor_poller::{MetricKind, PollOutcome, PollerConfig};

pub async fn execute(config: PollerConfig) -> anyhow::Result<()> {
    println!("  Configuration");
    println!("   Sensors config: {}", config.config_filename.display());
    println!("   hwmon root:     {}", config.hwmon_root.display());
    for kind in MetricKind::ALL {
        let family = config.family(kind);
        let interval = if family.is_enabled() {
            format!("every {}s", family.poll_interval_secs)
        } else {
            "disabled".to_string()
        };
        println!(
            "   {:<15} {} labels, {interval}",
            format!("{}:", kind.name()),
            family.labels.len()
        );
    }
    println!();

    let poller = super::eager_poller(config)?;
    let outcome = poller.poll();

    println!("  Scan");
    match outcome {
        PollOutcome::Scanned { matched } => {
            println!("   Status:         available ({matched} configured labels found)")
        }
        PollOutcome::Failed => println!("   Status:         UNAVAILABLE"),
        PollOutcome::NotDue | PollOutcome::Contended => println!("   Status:         not scanned"),
    }
    println!("   Heartbeat:      {}", poller.check_heartbeat());
    println!("   Next scan in:   {}s", poller.next_scan_in().as_secs());
    if let Some(err) = poller.stats().last_error {
        println!("   Last error:     {err}");
    }
    println!();

    if poller.check_heartbeat() {
        println!("  Values");
        for kind in MetricKind::ALL {
            for (label, value) in poller.family(kind).cache().entries() {
                println!(
                    "   {:<12} {label:<24} {}",
                    kind.name(),
                    super::format_value(value, kind.unit())
                );
            }
        }
        println!();
    }

    println!("{}", poller.stats().summary());
    Ok(())
}
