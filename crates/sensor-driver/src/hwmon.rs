// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Linux hwmon driver.
//!
//! Every hardware monitoring chip registered with the kernel appears as
//! `/sys/class/hwmon/hwmonN/`, with one `<kind><n>_input` attribute per
//! channel and an optional `<kind><n>_label`. Raw values are integers in
//! milli-units (micro-watts for power):
//!
//! | Prefix  | Kind        | Raw unit | Reported unit |
//! |---------|-------------|----------|---------------|
//! | `temp`  | temperature | m°C      | °C            |
//! | `in`    | voltage     | mV       | V             |
//! | `curr`  | current     | mA       | A             |
//! | `power` | power       | µW       | W             |
//! | `fan`   | fan speed   | RPM      | RPM           |
//!
//! Labels are resolved the way `sensors(1)` does: a `label` statement in
//! the configuration source wins, then the chip's own `_label` attribute,
//! then the bare channel name.

use crate::session::ScanSession;
use crate::{DriverError, SensorDriver, Snapshot};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Default sysfs directory listing hwmon chips.
pub const DEFAULT_HWMON_ROOT: &str = "/sys/class/hwmon";

/// Channel types exposed by hwmon chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureKind {
    Temperature,
    Voltage,
    Fan,
    Current,
    Power,
}

impl FeatureKind {
    /// Maps a sysfs attribute prefix to a kind.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "temp" => Some(Self::Temperature),
            "in" => Some(Self::Voltage),
            "fan" => Some(Self::Fan),
            "curr" => Some(Self::Current),
            "power" => Some(Self::Power),
            _ => None,
        }
    }

    /// The sysfs attribute prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Temperature => "temp",
            Self::Voltage => "in",
            Self::Fan => "fan",
            Self::Current => "curr",
            Self::Power => "power",
        }
    }

    /// Divisor from the raw sysfs integer to the reported unit.
    pub fn scale(self) -> f64 {
        match self {
            Self::Temperature | Self::Voltage | Self::Current => 1_000.0,
            Self::Power => 1_000_000.0,
            Self::Fan => 1.0,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Voltage => "V",
            Self::Fan => "RPM",
            Self::Current => "A",
            Self::Power => "W",
        }
    }
}

/// Reads chips from a sysfs hwmon tree.
///
/// # Example
/// ```no_run
/// use sensor_driver::{HwmonDriver, SensorDriver};
/// use std::path::Path;
///
/// let driver = HwmonDriver::default();
/// let snapshot = driver.scan(Path::new("/etc/sensors3.conf")).unwrap();
/// for (chip, readings) in snapshot.chips() {
///     println!("{chip}: {} readings", readings.len());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HwmonDriver {
    root: PathBuf,
    open_sessions: Arc<AtomicUsize>,
}

impl HwmonDriver {
    /// Creates a driver reading chips below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            open_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The hwmon root this driver scans.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of scan sessions currently holding resources.
    ///
    /// Zero whenever no scan is running.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::Acquire)
    }
}

impl Default for HwmonDriver {
    fn default() -> Self {
        Self::new(DEFAULT_HWMON_ROOT)
    }
}

impl SensorDriver for HwmonDriver {
    fn name(&self) -> &str {
        "hwmon"
    }

    fn scan(&self, config_source: &Path) -> Result<Snapshot, DriverError> {
        let session = ScanSession::init(&self.root, config_source, Arc::clone(&self.open_sessions))?;
        let config = session.config();
        let mut snapshot = Snapshot::new();

        for chip in session.chips()? {
            snapshot.add_chip(chip.id.as_str());

            for feature in chip.features()? {
                if config.is_ignored(&chip.id, &chip.name, &feature.name) {
                    tracing::trace!("{}: {} ignored by config", chip.id, feature.name);
                    continue;
                }

                let value = feature.read_value()?;
                let label = match config.label_for(&chip.id, &chip.name, &feature.name) {
                    Some(label) => label.to_string(),
                    None => feature.sysfs_label()?.unwrap_or_else(|| feature.name.clone()),
                };

                tracing::trace!(
                    "{}: {} ({label}) = {value} {}",
                    chip.id,
                    feature.name,
                    feature.kind.unit()
                );
                snapshot.insert(chip.id.as_str(), label, value);
            }
        }

        tracing::debug!("hwmon scan of {}: {}", self.root.display(), snapshot.summary());
        Ok(snapshot)
    }
}

/// Reads a sysfs attribute and returns its trimmed content.
pub(crate) fn read_sysfs_file(path: &Path) -> Result<String, DriverError> {
    if !path.exists() {
        return Err(DriverError::NotAvailable {
            path: path.display().to_string(),
        });
    }
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| DriverError::Read {
            path: path.display().to_string(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a throwaway hwmon tree plus config file under the temp dir.
    /// The caller is responsible for cleanup.
    struct Fixture {
        base: PathBuf,
    }

    impl Fixture {
        fn new(name: &str) -> Self {
            let base = std::env::temp_dir()
                .join("hostsensor_test")
                .join(format!("{name}_{}", std::process::id()));
            let _ = std::fs::remove_dir_all(&base);
            std::fs::create_dir_all(base.join("hwmon")).unwrap();
            Self { base }
        }

        fn root(&self) -> PathBuf {
            self.base.join("hwmon")
        }

        fn attr(&self, chip: &str, attr: &str, content: &str) -> &Self {
            let dir = self.root().join(chip);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(attr), format!("{content}\n")).unwrap();
            self
        }

        fn config(&self, content: &str) -> PathBuf {
            let path = self.base.join("sensors3.conf");
            std::fs::write(&path, content).unwrap();
            path
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.base);
        }
    }

    #[test]
    fn test_scan_reads_and_scales() {
        let fx = Fixture::new("scales");
        fx.attr("hwmon0", "name", "coretemp")
            .attr("hwmon0", "temp1_input", "42500")
            .attr("hwmon0", "temp1_label", "Core0")
            .attr("hwmon1", "name", "nct6775")
            .attr("hwmon1", "in0_input", "1216")
            .attr("hwmon1", "fan1_input", "1100")
            .attr("hwmon1", "power1_input", "15500000");
        let conf = fx.config("");

        let snap = HwmonDriver::new(fx.root()).scan(&conf).unwrap();
        assert_eq!(snap.num_chips(), 2);

        let core = snap.chip("coretemp-hwmon0").unwrap();
        assert_eq!(core.get("Core0"), Some(&42.5));

        let nct = snap.chip("nct6775-hwmon1").unwrap();
        assert!((nct["in0"] - 1.216).abs() < 1e-9);
        assert_eq!(nct["fan1"], 1100.0);
        assert!((nct["power1"] - 15.5).abs() < 1e-9);
    }

    #[test]
    fn test_config_labels_and_ignores() {
        let fx = Fixture::new("labels");
        fx.attr("hwmon2", "name", "nct6775")
            .attr("hwmon2", "in0_input", "1000")
            .attr("hwmon2", "in0_label", "from-sysfs")
            .attr("hwmon2", "in1_input", "garbage");
        let conf = fx.config("chip \"nct6775-*\"\n  label in0 \"Vcore\"\n  ignore in1\n");

        let snap = HwmonDriver::new(fx.root()).scan(&conf).unwrap();
        let chip = snap.chip("nct6775-hwmon2").unwrap();
        assert_eq!(chip.get("Vcore"), Some(&1.0));
        assert!(!chip.contains_key("from-sysfs"));
        assert_eq!(chip.len(), 1);
    }

    #[test]
    fn test_chip_without_name_uses_dir() {
        let fx = Fixture::new("noname");
        fx.attr("hwmon5", "temp1_input", "30000");
        let conf = fx.config("");

        let snap = HwmonDriver::new(fx.root()).scan(&conf).unwrap();
        assert_eq!(snap.chip("hwmon5-hwmon5").unwrap().get("temp1"), Some(&30.0));
    }

    #[test]
    fn test_empty_root_is_not_an_error() {
        let fx = Fixture::new("empty");
        let conf = fx.config("# empty\n");
        let snap = HwmonDriver::new(fx.root()).scan(&conf).unwrap();
        assert!(snap.is_empty());
    }

    #[test]
    fn test_unparsable_value_fails_and_releases() {
        let fx = Fixture::new("badvalue");
        fx.attr("hwmon0", "name", "acpitz")
            .attr("hwmon0", "temp1_input", "not_a_number");
        let conf = fx.config("");

        let driver = HwmonDriver::new(fx.root());
        let result = driver.scan(&conf);
        assert!(matches!(result, Err(DriverError::Parse { .. })));
        assert_eq!(driver.open_sessions(), 0);
    }

    #[test]
    fn test_missing_config_fails() {
        let fx = Fixture::new("noconf");
        let driver = HwmonDriver::new(fx.root());
        let result = driver.scan(&fx.base.join("missing.conf"));
        assert!(matches!(result, Err(DriverError::Config { .. })));
        assert_eq!(driver.open_sessions(), 0);
    }

    #[test]
    fn test_missing_root_fails() {
        let fx = Fixture::new("noroot");
        let conf = fx.config("");
        let driver = HwmonDriver::new(fx.base.join("does-not-exist"));
        assert!(matches!(
            driver.scan(&conf),
            Err(DriverError::NotAvailable { .. })
        ));
    }

    #[test]
    fn test_sessions_released_after_success() {
        let fx = Fixture::new("release");
        fx.attr("hwmon0", "name", "k10temp").attr("hwmon0", "temp1_input", "50000");
        let conf = fx.config("");
        let driver = HwmonDriver::new(fx.root());
        for _ in 0..3 {
            driver.scan(&conf).unwrap();
        }
        assert_eq!(driver.open_sessions(), 0);
    }

    #[test]
    fn test_feature_kind_prefix_roundtrip() {
        for kind in [
            FeatureKind::Temperature,
            FeatureKind::Voltage,
            FeatureKind::Fan,
            FeatureKind::Current,
            FeatureKind::Power,
        ] {
            assert_eq!(FeatureKind::from_prefix(kind.prefix()), Some(kind));
        }
        assert_eq!(FeatureKind::from_prefix("humidity"), None);
    }
}
