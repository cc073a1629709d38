// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # sensor-driver
//!
//! Wraps a hardware monitoring backend behind a single `scan` operation.
//!
//! A scan is one full driver lifecycle:
//!
//! ```text
//! init(config_source) → enumerate chips → read features → release
//! ```
//!
//! and produces a [`Snapshot`]: chip id → feature label → value. Resources
//! acquired by `init` are owned by a scan-scoped guard and released on every
//! exit path, so nothing leaks between scans.
//!
//! # Drivers
//! - [`HwmonDriver`]: reads `/sys/class/hwmon` and applies `label` /
//!   `ignore` statements from an lm-sensors configuration file.
//! - `MockDriver` (feature `mock`): scriptable results and concurrency
//!   accounting for tests.
//!
//! # Example
//! ```no_run
//! use sensor_driver::{HwmonDriver, SensorDriver};
//! use std::path::Path;
//!
//! let snapshot = HwmonDriver::default()
//!     .scan(Path::new("/etc/sensors3.conf"))
//!     .expect("scan failed");
//! println!("{}", snapshot.summary());
//! ```

pub mod config;
mod driver;
mod error;
pub mod hwmon;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod session;
mod snapshot;

pub use config::SensorsConfig;
pub use driver::SensorDriver;
pub use error::DriverError;
pub use hwmon::{FeatureKind, HwmonDriver, DEFAULT_HWMON_ROOT};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockDriver;
pub use snapshot::{ChipReadings, Snapshot};
