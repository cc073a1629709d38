// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A scriptable in-memory driver for tests.
//!
//! [`MockDriver`] returns queued outcomes in order, then falls back to a
//! default outcome. It counts invocations and records the highest number of
//! scans that were ever in flight at the same time, which is what
//! concurrency tests assert on.
//!
//! ```
//! use sensor_driver::{MockDriver, SensorDriver, Snapshot};
//! use std::path::Path;
//!
//! let driver = MockDriver::new();
//! driver.push_ok([("chip1", "Core0", 42.5)].into_iter().collect());
//! driver.push_err("bus timeout");
//!
//! assert!(driver.scan(Path::new("cfg")).is_ok());
//! assert!(driver.scan(Path::new("cfg")).is_err());
//! assert_eq!(driver.scan(Path::new("cfg")).unwrap(), Snapshot::new());
//! assert_eq!(driver.calls(), 3);
//! ```

use crate::{DriverError, SensorDriver, Snapshot};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Outcome {
    Ok(Snapshot),
    Err(String),
    Panic(String),
}

/// A driver whose results are programmed by the test.
#[derive(Debug)]
pub struct MockDriver {
    queue: Mutex<VecDeque<Outcome>>,
    fallback: Mutex<Outcome>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_config: Mutex<Option<PathBuf>>,
}

impl MockDriver {
    /// Creates a driver that returns an empty snapshot until programmed.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Outcome::Ok(Snapshot::new())),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            last_config: Mutex::new(None),
        }
    }

    /// Makes every scan sleep for `delay` before returning.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues a successful scan.
    pub fn push_ok(&self, snapshot: Snapshot) {
        lock(&self.queue).push_back(Outcome::Ok(snapshot));
    }

    /// Queues a failed scan.
    pub fn push_err(&self, detail: impl Into<String>) {
        lock(&self.queue).push_back(Outcome::Err(detail.into()));
    }

    /// Queues a scan that panics.
    pub fn push_panic(&self, message: impl Into<String>) {
        lock(&self.queue).push_back(Outcome::Panic(message.into()));
    }

    /// Sets the outcome used once the queue is empty.
    pub fn set_default_ok(&self, snapshot: Snapshot) {
        *lock(&self.fallback) = Outcome::Ok(snapshot);
    }

    /// Makes every unqueued scan fail.
    pub fn set_default_err(&self, detail: impl Into<String>) {
        *lock(&self.fallback) = Outcome::Err(detail.into());
    }

    /// Total number of `scan` invocations.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }

    /// Highest number of simultaneous `scan` invocations observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::Acquire)
    }

    /// The `config_source` passed to the most recent scan.
    pub fn last_config_source(&self) -> Option<PathBuf> {
        lock(&self.last_config).clone()
    }

    fn next_outcome(&self) -> Outcome {
        let queued = lock(&self.queue).pop_front();
        queued.unwrap_or_else(|| lock(&self.fallback).clone())
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorDriver for MockDriver {
    fn name(&self) -> &str {
        "mock"
    }

    fn scan(&self, config_source: &Path) -> Result<Snapshot, DriverError> {
        let _in_flight = InFlight::enter(self);
        self.calls.fetch_add(1, Ordering::AcqRel);
        *lock(&self.last_config) = Some(config_source.to_path_buf());

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        match self.next_outcome() {
            Outcome::Ok(snapshot) => Ok(snapshot),
            Outcome::Err(detail) => Err(DriverError::Config {
                path: config_source.display().to_string(),
                detail,
            }),
            Outcome::Panic(message) => panic!("{message}"),
        }
    }
}

/// Tracks one in-flight scan; decrements on drop, including on panic.
struct InFlight<'a> {
    driver: &'a MockDriver,
}

impl<'a> InFlight<'a> {
    fn enter(driver: &'a MockDriver) -> Self {
        let now = driver.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        driver.max_in_flight.fetch_max(now, Ordering::AcqRel);
        Self { driver }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.driver.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_then_fallback() {
        let d = MockDriver::new();
        let snap: Snapshot = [("c", "Core0", 1.0)].into_iter().collect();
        d.push_ok(snap.clone());
        d.set_default_err("down");

        assert_eq!(d.scan(Path::new("a")).unwrap(), snap);
        assert!(d.scan(Path::new("b")).is_err());
        assert!(d.scan(Path::new("c")).is_err());
        assert_eq!(d.calls(), 3);
        assert_eq!(d.last_config_source(), Some(PathBuf::from("c")));
    }

    #[test]
    fn test_panic_outcome_releases_in_flight() {
        let d = MockDriver::new();
        d.push_panic("boom");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = d.scan(Path::new("x"));
        }));
        assert!(result.is_err());
        assert_eq!(d.in_flight.load(Ordering::Acquire), 0);
        assert_eq!(d.max_in_flight(), 1);
    }
}
