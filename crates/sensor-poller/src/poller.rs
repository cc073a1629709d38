// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The refresh scheduler.
//!
//! Every read first gives the scheduler a chance to refresh:
//!
//! ```text
//! read(kind, label)
//!   ├─ scan not due yet ───────────────┐
//!   ├─ lock held by another caller ────┤
//!   └─ lock acquired → scan → fold     │
//!        reschedule, release lock      │
//!                                      ▼
//!              last scan ok ? cached value : None
//! ```
//!
//! Scan failures are logged and turned into "unavailable"; they never reach
//! the caller. A caller that loses the race for the lock serves whatever is
//! cached right now, even if another thread is mid-scan.

use crate::clock::{Clock, SystemClock};
use crate::family::{MetricFamily, MetricKind};
use crate::schedule::{next_scan_interval, ScanLock, ScheduleState};
use crate::{PollerConfig, PollerError, ScanStats};
use sensor_driver::{DriverError, SensorDriver, Snapshot};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// What a call to [`SensorPoller::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The next scan is not due yet.
    NotDue,
    /// A scan was due but another caller holds the lock.
    Contended,
    /// A scan ran and returned a snapshot; `matched` slots were updated.
    Scanned { matched: usize },
    /// A scan ran and failed.
    Failed,
}

/// Polls a [`SensorDriver`] and serves cached temperature and voltage values.
///
/// The poller is `Sync`; share it between threads with an `Arc`.
///
/// # Example
/// ```
/// use sensor_driver::MockDriver;
/// use sensor_poller::{FamilyConfig, MetricKind, PollerConfig, SensorPoller};
///
/// let driver = MockDriver::new();
/// driver.set_default_ok([("chip1", "Core0", 42.5)].into_iter().collect());
///
/// let config = PollerConfig {
///     startup_delay_secs: 0,
///     temperature: FamilyConfig::new(["Core0"], 90),
///     ..Default::default()
/// };
/// let poller = SensorPoller::new(&config, driver).unwrap();
///
/// assert_eq!(poller.read(MetricKind::Temperature, "Core0"), Some(42.5));
/// assert!(poller.check_heartbeat());
/// ```
#[derive(Debug)]
pub struct SensorPoller<D, C = SystemClock> {
    driver: D,
    clock: C,
    config_filename: PathBuf,
    temperature: MetricFamily,
    voltage: MetricFamily,
    schedule: ScheduleState,
    lock: ScanLock,
    stats: Mutex<ScanStats>,
    contended: AtomicU64,
}

impl<D: SensorDriver> SensorPoller<D> {
    /// Creates a poller driven by the system clock.
    pub fn new(config: &PollerConfig, driver: D) -> Result<Self, PollerError> {
        Self::with_clock(config, driver, SystemClock)
    }
}

impl<D: SensorDriver, C: Clock> SensorPoller<D, C> {
    /// Creates a poller with an explicit time source.
    ///
    /// The first scan becomes eligible `startup_delay_secs` after this call.
    pub fn with_clock(config: &PollerConfig, driver: D, clock: C) -> Result<Self, PollerError> {
        config.validate()?;

        let schedule = ScheduleState::new(
            clock.now(),
            Duration::from_secs(config.startup_delay_secs),
        );

        tracing::info!(
            "sensor poller using '{}' driver, config '{}', {} temperature / {} voltage labels",
            driver.name(),
            config.config_filename.display(),
            config.temperature.labels.len(),
            config.voltage.labels.len(),
        );

        Ok(Self {
            driver,
            clock,
            config_filename: config.config_filename.clone(),
            temperature: MetricFamily::new(MetricKind::Temperature, &config.temperature),
            voltage: MetricFamily::new(MetricKind::Voltage, &config.voltage),
            schedule,
            lock: ScanLock::new(),
            stats: Mutex::new(ScanStats::default()),
            contended: AtomicU64::new(0),
        })
    }

    /// Refreshes if due, then returns the cached value for `index`.
    ///
    /// Returns `None` when the last scan failed (whatever is cached), when
    /// the label is not configured for this family, or when no scan has
    /// found it yet.
    pub fn read(&self, kind: MetricKind, index: &str) -> Option<f64> {
        self.poll();
        if !self.schedule.last_scan_succeeded() {
            return None;
        }
        self.family(kind).cache().get(index)
    }

    /// Temperature read for a host node.
    pub fn get_temperature(&self, node: &str, index: &str) -> Option<f64> {
        let value = self.read(MetricKind::Temperature, index);
        tracing::trace!("node {node}: temperature[{index}] = {value:?}");
        value
    }

    /// Voltage read for a host node.
    pub fn get_voltage(&self, node: &str, index: &str) -> Option<f64> {
        let value = self.read(MetricKind::Voltage, index);
        tracing::trace!("node {node}: voltage[{index}] = {value:?}");
        value
    }

    /// Availability: `true` iff the most recent scan attempt succeeded.
    pub fn check_heartbeat(&self) -> bool {
        self.schedule.last_scan_succeeded()
    }

    /// Same as [`check_heartbeat`](Self::check_heartbeat).
    pub fn is_available(&self) -> bool {
        self.check_heartbeat()
    }

    /// Runs a scan if one is due and the lock is free.
    pub fn poll(&self) -> PollOutcome {
        if !self.schedule.is_due(self.clock.now()) {
            return PollOutcome::NotDue;
        }
        self.try_scan()
    }

    /// Takes the lock, then scans if the scan is still due.
    ///
    /// The due check is repeated under the lock: a caller that saw the scan
    /// as due may only get the lock after another caller has finished that
    /// scan and rescheduled.
    fn try_scan(&self) -> PollOutcome {
        let Some(_guard) = self.lock.try_acquire() else {
            self.contended.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("scan already in progress, serving cached values");
            return PollOutcome::Contended;
        };
        if !self.schedule.is_due(self.clock.now()) {
            tracing::trace!("scan finished by another caller, serving cached values");
            return PollOutcome::NotDue;
        }

        let started = Instant::now();
        let outcome = match self.scan() {
            Ok(snapshot) => {
                let matched = self.fold(&snapshot);
                self.schedule.set_last_scan_succeeded(true);
                tracing::info!(
                    "{}, {matched} configured labels updated",
                    snapshot.summary()
                );
                if let Ok(mut stats) = self.stats.lock() {
                    stats.record_success(matched, started.elapsed());
                }
                PollOutcome::Scanned { matched }
            }
            Err(e) => {
                self.schedule.set_last_scan_succeeded(false);
                tracing::warn!("sensor scan failed: {e}");
                if let Ok(mut stats) = self.stats.lock() {
                    stats.record_failure(e.to_string(), started.elapsed());
                }
                PollOutcome::Failed
            }
        };

        let interval = self.next_interval();
        self.schedule.reschedule(self.clock.now(), interval);
        tracing::debug!("next sensor scan in {}s", interval.as_secs());

        outcome
    }

    /// Calls the driver, turning a panic into a [`DriverError`].
    fn scan(&self) -> Result<Snapshot, DriverError> {
        let config = self.config_filename.as_path();
        catch_unwind(AssertUnwindSafe(|| self.driver.scan(config)))
            .unwrap_or_else(|payload| Err(DriverError::Panicked(panic_message(payload.as_ref()))))
    }

    /// Copies matching readings into every family's cache.
    fn fold(&self, snapshot: &Snapshot) -> usize {
        MetricKind::ALL
            .iter()
            .map(|&kind| self.family(kind).cache().fold(snapshot))
            .sum()
    }

    fn next_interval(&self) -> Duration {
        next_scan_interval(MetricKind::ALL.iter().map(|&k| self.family(k).poll_interval_secs()))
    }

    /// Returns one family.
    pub fn family(&self, kind: MetricKind) -> &MetricFamily {
        match kind {
            MetricKind::Temperature => &self.temperature,
            MetricKind::Voltage => &self.voltage,
        }
    }

    /// Changes a family's poll interval; applies from the next reschedule.
    pub fn set_poll_interval(&self, kind: MetricKind, secs: i64) {
        self.family(kind).set_poll_interval_secs(secs);
    }

    /// When the next scan becomes eligible.
    pub fn next_eligible_scan_time(&self) -> Instant {
        self.schedule.next_eligible_at()
    }

    /// Time left until the next scan becomes eligible.
    pub fn next_scan_in(&self) -> Duration {
        self.schedule.time_until_due(self.clock.now())
    }

    /// A copy of the scan statistics.
    pub fn stats(&self) -> ScanStats {
        let mut stats = self
            .stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();
        stats.contended = self.contended.load(Ordering::Relaxed);
        stats
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
