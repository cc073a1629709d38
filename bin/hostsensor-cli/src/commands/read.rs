// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `hostsensor read` command: one value through the poller.

use sensor_poller::{FamilyConfig, MetricKind, PollerConfig};

pub async fn execute(mut config: PollerConfig, family: MetricKind, label: String) -> anyhow::Result<()> {
    // Bind the requested label even if the config file does not list it.
    let family_config: &mut FamilyConfig = match family {
        MetricKind::Temperature => &mut config.temperature,
        MetricKind::Voltage => &mut config.voltage,
    };
    if !family_config.labels.contains(&label) {
        family_config.labels.push(label.clone());
    }

    let poller = super::eager_poller(config)?;
    let value = poller.read(family, &label);

    if !poller.check_heartbeat() {
        let reason = poller.stats().last_error.unwrap_or_else(|| "unknown".into());
        anyhow::bail!("sensors unavailable: {reason}");
    }

    match value {
        Some(v) => println!("{family} {label}: {v:.3} {}", family.unit()),
        None => anyhow::bail!("no {family} reading labelled '{label}'"),
    }
    Ok(())
}
