// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # sensor-poller
//!
//! Serves cached hardware sensor readings with per-family poll intervals.
//!
//! The poller sits between a host that asks for values ("temperature of
//! `Core 0`") and a [`SensorDriver`](sensor_driver::SensorDriver) that can
//! only produce a full scan of every chip. Reads are cheap and never block
//! on hardware: a read triggers at most one scan system-wide, and only when
//! the scan is due.
//!
//! # Key Components
//!
//! - [`SensorPoller`]: the refresh scheduler and the public read API.
//! - [`MetricFamily`] / [`IndexCache`]: per-family label slots, fixed at
//!   construction, updated on every successful scan.
//! - [`ScheduleState`] / [`ScanLock`]: availability flag, next scan time,
//!   and the try-only lock that prevents overlapping scans.
//! - [`PollerConfig`]: TOML configuration.
//! - [`ScanStats`]: scan counters for diagnostics.
//!
//! # Availability
//!
//! Values are only served while the most recent scan succeeded. A failed
//! scan hides every cached value until a later scan succeeds;
//! [`SensorPoller::check_heartbeat`] reports the same flag.
//!
//! # Example
//! ```no_run
//! use sensor_driver::HwmonDriver;
//! use sensor_poller::{PollerConfig, SensorPoller};
//! use std::path::Path;
//!
//! let config = PollerConfig::from_file(Path::new("hostsensor.toml")).unwrap();
//! let poller = SensorPoller::new(&config, HwmonDriver::new(&config.hwmon_root)).unwrap();
//!
//! if let Some(t) = poller.get_temperature("node0", "Core 0") {
//!     println!("Core 0: {t:.1} °C");
//! }
//! ```

pub mod clock;
mod config;
mod error;
mod family;
mod poller;
pub mod schedule;
mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    FamilyConfig, PollerConfig, DEFAULT_CONFIG_FILENAME, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_STARTUP_DELAY_SECS,
};
pub use error::PollerError;
pub use family::{IndexCache, MetricFamily, MetricKind};
pub use poller::{PollOutcome, SensorPoller};
pub use schedule::{ScanLock, ScheduleState, FALLBACK_INTERVAL};
pub use stats::ScanStats;
