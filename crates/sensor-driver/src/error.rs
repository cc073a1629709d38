// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for sensor scans.

/// Errors that can occur while initializing, enumerating, or reading chips.
///
/// Callers of [`SensorDriver::scan`](crate::SensorDriver::scan) usually
/// treat every variant the same way ("the scan failed"); the variants exist
/// so the failure can be logged meaningfully.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The configuration source could not be read or parsed.
    #[error("invalid sensors config {path}: {detail}")]
    Config { path: String, detail: String },

    /// The hwmon root does not exist on this host.
    #[error("sensor path not found: {path}")]
    NotAvailable { path: String },

    /// Failed to read a sysfs attribute or list a directory.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// A sysfs attribute did not contain the expected integer.
    #[error("failed to parse value from {path}: {detail}")]
    Parse { path: String, detail: String },

    /// The driver panicked mid-scan.
    #[error("driver panicked during scan: {0}")]
    Panicked(String),
}
