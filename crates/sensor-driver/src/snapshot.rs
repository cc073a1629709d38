// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The result of a single scan.
//!
//! A [`Snapshot`] maps each chip id to the features it exposed during the
//! scan, keyed by feature label. Both levels are ordered maps so iteration
//! order (and therefore "last match wins" folding) is deterministic.

use std::collections::BTreeMap;

/// Readings for one chip: feature label → value in natural units.
pub type ChipReadings = BTreeMap<String, f64>;

/// Every reading produced by one scan, grouped by chip.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Snapshot {
    chips: BTreeMap<String, ChipReadings>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reading, creating the chip entry on first use.
    ///
    /// A later reading for the same `(chip, label)` replaces the earlier one.
    pub fn insert(&mut self, chip: impl Into<String>, label: impl Into<String>, value: f64) {
        self.chips
            .entry(chip.into())
            .or_default()
            .insert(label.into(), value);
    }

    /// Registers a chip that exposed no (non-ignored) features.
    pub fn add_chip(&mut self, chip: impl Into<String>) {
        self.chips.entry(chip.into()).or_default();
    }

    /// Returns the readings of one chip.
    pub fn chip(&self, chip: &str) -> Option<&ChipReadings> {
        self.chips.get(chip)
    }

    /// Iterates chips in ascending chip-id order.
    pub fn chips(&self) -> impl Iterator<Item = (&str, &ChipReadings)> {
        self.chips.iter().map(|(id, r)| (id.as_str(), r))
    }

    /// Looks a label up across all chips.
    ///
    /// When several chips expose the same label, the chip with the greatest
    /// id wins, matching the order in which a caller folding chip by chip
    /// would overwrite earlier matches.
    pub fn find(&self, label: &str) -> Option<f64> {
        self.chips
            .values()
            .filter_map(|readings| readings.get(label).copied())
            .last()
    }

    /// Number of chips seen.
    pub fn num_chips(&self) -> usize {
        self.chips.len()
    }

    /// Total number of readings across all chips.
    pub fn num_readings(&self) -> usize {
        self.chips.values().map(|r| r.len()).sum()
    }

    /// Returns `true` if the scan saw no chips at all.
    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "Snapshot: {} chips, {} readings",
            self.num_chips(),
            self.num_readings()
        )
    }
}

impl<C, L> FromIterator<(C, L, f64)> for Snapshot
where
    C: Into<String>,
    L: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (C, L, f64)>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for (chip, label, value) in iter {
            snapshot.insert(chip, label, value);
        }
        snapshot
    }
}
