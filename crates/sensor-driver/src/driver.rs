// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`SensorDriver`] trait.

use crate::{DriverError, Snapshot};
use std::path::Path;

/// A source of sensor snapshots.
///
/// One call to [`scan`](SensorDriver::scan) is one complete driver
/// lifecycle: initialize from `config_source`, enumerate chips and
/// features, read every value, release. Implementations must release their
/// resources on every exit path, including errors.
pub trait SensorDriver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Performs one full scan.
    fn scan(&self, config_source: &Path) -> Result<Snapshot, DriverError>;
}

impl<D: SensorDriver + ?Sized> SensorDriver for std::sync::Arc<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn scan(&self, config_source: &Path) -> Result<Snapshot, DriverError> {
        (**self).scan(config_source)
    }
}

impl<D: SensorDriver + ?Sized> SensorDriver for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn scan(&self, config_source: &Path) -> Result<Snapshot, DriverError> {
        (**self).scan(config_source)
    }
}
