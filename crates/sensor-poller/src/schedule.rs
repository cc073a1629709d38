// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scan scheduling state and the scan lock.
//!
//! [`ScheduleState`] holds the availability flag and the next eligible scan
//! time as atomics, so the "is a scan due?" and "was the last scan good?"
//! checks never block. [`ScanLock`] is a try-only flag: a caller that loses
//! the race skips the scan instead of waiting for hardware I/O.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Interval used when no family has a positive poll interval.
pub const FALLBACK_INTERVAL: Duration = Duration::from_secs(99_999);

/// Computes the delay until the next scan from the families' poll
/// intervals (seconds). Non-positive intervals are ignored.
pub fn next_scan_interval(intervals: impl IntoIterator<Item = i64>) -> Duration {
    intervals
        .into_iter()
        .filter(|&secs| secs > 0)
        .min()
        .map(|secs| Duration::from_secs(secs as u64))
        .unwrap_or(FALLBACK_INTERVAL)
}

/// Availability flag and next eligible scan time.
///
/// Times are stored as nanoseconds past an origin instant captured at
/// construction.
#[derive(Debug)]
pub struct ScheduleState {
    origin: Instant,
    next_eligible_ns: AtomicU64,
    last_scan_succeeded: AtomicBool,
}

impl ScheduleState {
    /// Starts unavailable, with the first scan eligible `startup_delay`
    /// after `now`.
    pub fn new(now: Instant, startup_delay: Duration) -> Self {
        Self {
            origin: now,
            next_eligible_ns: AtomicU64::new(duration_ns(startup_delay)),
            last_scan_succeeded: AtomicBool::new(false),
        }
    }

    /// Returns `true` once `now` has reached the next eligible scan time.
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_eligible_at()
    }

    pub fn next_eligible_at(&self) -> Instant {
        self.origin + Duration::from_nanos(self.next_eligible_ns.load(Ordering::Acquire))
    }

    /// Time left until the next scan may run (zero if already due).
    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.next_eligible_at().saturating_duration_since(now)
    }

    /// Sets the next eligible scan time to `now + interval`.
    pub fn reschedule(&self, now: Instant, interval: Duration) {
        let at = now.saturating_duration_since(self.origin) + interval;
        self.next_eligible_ns
            .store(duration_ns(at), Ordering::Release);
    }

    pub fn last_scan_succeeded(&self) -> bool {
        self.last_scan_succeeded.load(Ordering::Acquire)
    }

    pub fn set_last_scan_succeeded(&self, ok: bool) {
        self.last_scan_succeeded.store(ok, Ordering::Release);
    }
}

pub(crate) fn duration_ns(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Non-blocking, non-reentrant lock around scan-and-fold.
#[derive(Debug, Default)]
pub struct ScanLock {
    held: AtomicBool,
}

/// Releases the [`ScanLock`] when dropped.
#[derive(Debug)]
pub struct ScanLockGuard<'a> {
    lock: &'a ScanLock,
}

impl ScanLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lock if it is free. Never waits.
    pub fn try_acquire(&self) -> Option<ScanLockGuard<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| ScanLockGuard { lock: self })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

impl Drop for ScanLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.held.store(false, Ordering::Release);
    }
}
