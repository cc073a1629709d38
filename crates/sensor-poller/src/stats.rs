// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scan statistics for diagnostics.
//!
//! [`ScanStats`] counts how often the poller scanned, how often scans
//! failed, and how often a due scan was skipped because another caller was
//! already scanning.

use std::time::Duration;

/// Cumulative statistics about scan attempts.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ScanStats {
    /// Scans actually started (lock acquired).
    pub attempts: u64,
    /// Scans that returned a snapshot.
    pub successes: u64,
    /// Scans that failed or panicked.
    pub failures: u64,
    /// Due scans skipped because the lock was held.
    pub contended: u64,
    /// Slots updated by the most recent successful fold, across families.
    pub last_matched: usize,
    /// Wall-clock duration of the most recent scan.
    pub last_scan_duration: Duration,
    /// Error text of the most recent failure.
    pub last_error: Option<String>,
}

impl ScanStats {
    /// Fraction of attempts that succeeded, in `[0.0, 1.0]`.
    ///
    /// Returns `0.0` if nothing was attempted yet.
    pub fn success_ratio(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.successes as f64 / self.attempts as f64
    }

    pub(crate) fn record_success(&mut self, matched: usize, took: Duration) {
        self.attempts += 1;
        self.successes += 1;
        self.last_matched = matched;
        self.last_scan_duration = took;
    }

    pub(crate) fn record_failure(&mut self, error: String, took: Duration) {
        self.attempts += 1;
        self.failures += 1;
        self.last_scan_duration = took;
        self.last_error = Some(error);
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Scans: {} attempted ({} ok, {} failed, {:.0}% ok), {} contended, \
             last matched {} labels in {:.2}ms",
            self.attempts,
            self.successes,
            self.failures,
            self.success_ratio() * 100.0,
            self.contended,
            self.last_matched,
            self.last_scan_duration.as_secs_f64() * 1000.0,
        )
    }
}
