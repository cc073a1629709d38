// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Poller configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! config_filename = "/etc/sensors3.conf"
//! hwmon_root = "/sys/class/hwmon"
//! startup_delay_secs = 15
//!
//! [temperature]
//! labels = ["Core 0", "Core 1"]
//! poll_interval_secs = 90
//!
//! [voltage]
//! labels = ["Vcore"]
//! poll_interval_secs = 0      # disabled for scheduling
//! ```

use crate::{MetricKind, PollerError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default driver configuration source.
pub const DEFAULT_CONFIG_FILENAME: &str = "/etc/sensors3.conf";

/// Default poll interval for each family, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: i64 = 90;

/// Delay before the first scan becomes eligible, in seconds.
pub const DEFAULT_STARTUP_DELAY_SECS: u64 = 15;

/// Per-family settings.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FamilyConfig {
    /// Feature labels bound to this family's value slots, in order.
    pub labels: Vec<String>,
    /// Poll interval in seconds. Zero or negative disables the family for
    /// scheduling purposes; its values are still refreshed by other
    /// families' scans.
    pub poll_interval_secs: i64,
}

impl FamilyConfig {
    /// Creates a family config with the given labels and interval.
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>, poll_interval_secs: i64) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            poll_interval_secs,
        }
    }

    /// Returns `true` if the family takes part in scheduling.
    pub fn is_enabled(&self) -> bool {
        self.poll_interval_secs > 0
    }
}

impl Default for FamilyConfig {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

/// Configuration for the sensor poller.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Path handed to the driver on every scan.
    pub config_filename: PathBuf,
    /// Root of the sysfs hwmon tree (used when building an `HwmonDriver`).
    pub hwmon_root: PathBuf,
    /// Seconds after construction before the first scan may run.
    pub startup_delay_secs: u64,
    /// Temperature family.
    pub temperature: FamilyConfig,
    /// Voltage family.
    pub voltage: FamilyConfig,
}

impl PollerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, PollerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PollerError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, PollerError> {
        toml::from_str(toml_str)
            .map_err(|e| PollerError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, PollerError> {
        toml::to_string_pretty(self)
            .map_err(|e| PollerError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Returns the settings of one family.
    pub fn family(&self, kind: MetricKind) -> &FamilyConfig {
        match kind {
            MetricKind::Temperature => &self.temperature,
            MetricKind::Voltage => &self.voltage,
        }
    }

    /// Rejects empty and duplicate labels.
    pub fn validate(&self) -> Result<(), PollerError> {
        for kind in MetricKind::ALL {
            let mut seen = HashSet::new();
            for label in &self.family(kind).labels {
                if label.trim().is_empty() {
                    return Err(PollerError::ConfigError(format!(
                        "empty label in {} family",
                        kind.name()
                    )));
                }
                if !seen.insert(label.as_str()) {
                    return Err(PollerError::DuplicateLabel {
                        family: kind.name().to_string(),
                        label: label.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            config_filename: PathBuf::from(DEFAULT_CONFIG_FILENAME),
            hwmon_root: PathBuf::from(sensor_driver::DEFAULT_HWMON_ROOT),
            startup_delay_secs: DEFAULT_STARTUP_DELAY_SECS,
            temperature: FamilyConfig::default(),
            voltage: FamilyConfig::default(),
        }
    }
}
