// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the poller.
//!
//! Scan failures never surface here: they are absorbed by the scheduler and
//! reported through the availability flag. Only construction can fail.

/// Errors that can occur while configuring a [`SensorPoller`](crate::SensorPoller).
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    /// The configuration file could not be read, parsed, or is inconsistent.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A family lists the same label twice.
    #[error("duplicate label '{label}' in {family} family")]
    DuplicateLabel { family: String, label: String },
}
