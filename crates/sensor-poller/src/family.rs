// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Metric families and their per-label value caches.
//!
//! Each family owns an [`IndexCache`]: one slot per configured label. The
//! set of slots is fixed when the poller is built; a scan only changes the
//! numbers stored in them. Slots are atomics so readers never take a lock.

use crate::config::FamilyConfig;
use sensor_driver::Snapshot;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// The metric families served by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Temperature,
    Voltage,
}

impl MetricKind {
    /// Every family, in fold order.
    pub const ALL: [MetricKind; 2] = [MetricKind::Temperature, MetricKind::Voltage];

    /// Lower-case name, as used in config files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Voltage => "voltage",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Voltage => "V",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "temperature" | "temp" => Ok(Self::Temperature),
            "voltage" | "volt" | "in" => Ok(Self::Voltage),
            other => Err(format!(
                "unknown metric family '{other}'; expected 'temperature' or 'voltage'"
            )),
        }
    }
}

/// One cached value.
#[derive(Debug)]
struct Slot {
    label: String,
    bits: AtomicU64,
    present: AtomicBool,
}

impl Slot {
    fn new(label: String) -> Self {
        Self {
            label,
            bits: AtomicU64::new(0),
            present: AtomicBool::new(false),
        }
    }

    fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
        self.present.store(true, Ordering::Release);
    }

    fn load(&self) -> Option<f64> {
        if self.present.load(Ordering::Acquire) {
            Some(f64::from_bits(self.bits.load(Ordering::Acquire)))
        } else {
            None
        }
    }
}

/// Fixed set of labelled value slots.
///
/// Slots are written only by [`fold`](Self::fold), which the poller calls
/// while it holds the scan lock. Callers get read access:
///
/// ```compile_fail
/// use sensor_poller::IndexCache;
///
/// let cache = IndexCache::new(&["Core0"]);
/// cache.set("Core0", 99.0);
/// ```
#[derive(Debug)]
pub struct IndexCache {
    slots: Vec<Slot>,
    by_label: HashMap<String, usize>,
}

impl IndexCache {
    /// Creates one empty slot per label, in order. Repeated labels share the
    /// first slot.
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut slots = Vec::with_capacity(labels.len());
        let mut by_label = HashMap::with_capacity(labels.len());
        for label in labels {
            let label = label.as_ref();
            if by_label.contains_key(label) {
                continue;
            }
            by_label.insert(label.to_string(), slots.len());
            slots.push(Slot::new(label.to_string()));
        }
        Self { slots, by_label }
    }

    /// The configured labels, in configuration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.label.as_str())
    }

    /// Returns `true` if `label` has a slot.
    pub fn contains(&self, label: &str) -> bool {
        self.by_label.contains_key(label)
    }

    /// The cached value for `label`; `None` if the label is not configured
    /// or was never found in a scan.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.by_label.get(label).and_then(|&i| self.slots[i].load())
    }

    /// Overwrites the value for `label`. Returns `false` for unknown labels.
    #[cfg(test)]
    fn set(&self, label: &str, value: f64) -> bool {
        match self.by_label.get(label) {
            Some(&i) => {
                self.slots[i].store(value);
                true
            }
            None => false,
        }
    }

    /// Copies every configured label found in `snapshot` into its slot.
    ///
    /// Labels missing from the snapshot keep their previous value. Returns
    /// the number of slots updated.
    pub fn fold(&self, snapshot: &Snapshot) -> usize {
        let mut matched = 0;
        for slot in &self.slots {
            if let Some(value) = snapshot.find(&slot.label) {
                slot.store(value);
                matched += 1;
            }
        }
        matched
    }

    /// `(label, value)` for every slot, in configuration order.
    pub fn entries(&self) -> Vec<(&str, Option<f64>)> {
        self.slots
            .iter()
            .map(|s| (s.label.as_str(), s.load()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A metric family: its value slots and its poll interval.
#[derive(Debug)]
pub struct MetricFamily {
    kind: MetricKind,
    poll_interval_secs: AtomicI64,
    cache: IndexCache,
}

impl MetricFamily {
    pub fn new(kind: MetricKind, config: &FamilyConfig) -> Self {
        Self {
            kind,
            poll_interval_secs: AtomicI64::new(config.poll_interval_secs),
            cache: IndexCache::new(config.labels.as_slice()),
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Current poll interval in seconds (≤ 0 means disabled).
    pub fn poll_interval_secs(&self) -> i64 {
        self.poll_interval_secs.load(Ordering::Acquire)
    }

    /// Changes the poll interval. Takes effect when the next scan attempt
    /// reschedules.
    pub fn set_poll_interval_secs(&self, secs: i64) {
        self.poll_interval_secs.store(secs, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.poll_interval_secs() > 0
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, &str, f64)]) -> Snapshot {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_metric_kind_parse() {
        assert_eq!("temperature".parse::<MetricKind>(), Ok(MetricKind::Temperature));
        assert_eq!("Voltage".parse::<MetricKind>(), Ok(MetricKind::Voltage));
        assert!("humidity".parse::<MetricKind>().is_err());
        assert_eq!(MetricKind::Voltage.to_string(), "voltage");
    }

    #[test]
    fn test_empty_slots() {
        let c = IndexCache::new(&["Core0", "Core1"]);
        assert_eq!(c.len(), 2);
        assert_eq!(c.get("Core0"), None);
        assert_eq!(c.get("unknown"), None);
        assert_eq!(c.labels().collect::<Vec<_>>(), vec!["Core0", "Core1"]);
    }

    #[test]
    fn test_fold_updates_matches_only() {
        let c = IndexCache::new(&["Core0", "Core1"]);
        let n = c.fold(&snapshot(&[("chip1", "Core0", 42.5), ("chip1", "Other", 1.0)]));
        assert_eq!(n, 1);
        assert_eq!(c.get("Core0"), Some(42.5));
        assert_eq!(c.get("Core1"), None);
        assert!(!c.contains("Other"));
    }

    #[test]
    fn test_fold_keeps_previous_values() {
        let c = IndexCache::new(&["Core0"]);
        c.fold(&snapshot(&[("chip1", "Core0", 40.0)]));
        let n = c.fold(&snapshot(&[("chip1", "Unrelated", 1.0)]));
        assert_eq!(n, 0);
        assert_eq!(c.get("Core0"), Some(40.0));
    }

    #[test]
    fn test_fold_label_across_chips() {
        let c = IndexCache::new(&["temp1"]);
        c.fold(&snapshot(&[("acpitz-hwmon0", "temp1", 27.8), ("nvme-hwmon3", "temp1", 35.9)]));
        assert_eq!(c.get("temp1"), Some(35.9));
    }

    #[test]
    fn test_set_unknown_label() {
        let c = IndexCache::new(&["Vcore"]);
        assert!(c.set("Vcore", 1.2));
        assert!(!c.set("in7", 3.3));
        assert_eq!(c.get("Vcore"), Some(1.2));
    }

    #[test]
    fn test_repeated_labels_share_slot() {
        let c = IndexCache::new(&["a", "a", "b"]);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_negative_and_zero_values_are_kept() {
        let c = IndexCache::new(&["cold", "zero"]);
        c.set("cold", -12.5);
        c.set("zero", 0.0);
        assert_eq!(c.get("cold"), Some(-12.5));
        assert_eq!(c.get("zero"), Some(0.0));
    }

    #[test]
    fn test_family_interval() {
        let f = MetricFamily::new(MetricKind::Voltage, &FamilyConfig::new(["in0"], 0));
        assert!(!f.is_enabled());
        f.set_poll_interval_secs(30);
        assert!(f.is_enabled());
        assert_eq!(f.poll_interval_secs(), 30);
        assert_eq!(f.cache().entries(), vec![("in0", None)]);
    }
}
