// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `hostsensor watch` command: periodic reads of every configured label.
//!
//! Reads go through the poller, so the hardware is only scanned when the
//! shortest enabled poll interval has elapsed; in between, rounds print the
//! cached values.

use sensor_driver::SensorDriver;
use sensor_poller::{MetricKind, PollerConfig, SensorPoller};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub async fn execute(config: PollerConfig, interval: u64, count: Option<u64>) -> anyhow::Result<()> {
    if config.temperature.labels.is_empty() && config.voltage.labels.is_empty() {
        anyhow::bail!("no labels configured; run `hostsensor scan` and add some to the config");
    }

    let poller = Arc::new(super::eager_poller(config)?);
    let rounds = run_rounds(
        Arc::clone(&poller),
        Duration::from_secs(interval.max(1)),
        count,
        tokio::signal::ctrl_c(),
    )
    .await?;

    tracing::info!("watch finished after {rounds} rounds");
    println!("{}", poller.stats().summary());
    Ok(())
}

/// Prints a round of readings every `interval` until `count` rounds have run
/// or `shutdown` completes. Returns the number of rounds printed.
///
/// `shutdown` is created once by the caller, so a signal delivered while a
/// round is running is seen at the next tick.
async fn run_rounds<D, F>(
    poller: Arc<SensorPoller<D>>,
    interval: Duration,
    count: Option<u64>,
    shutdown: F,
) -> anyhow::Result<u64>
where
    D: SensorDriver + 'static,
    F: Future,
{
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(interval);
    let mut round = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!("interrupted after {round} rounds");
                break;
            }
            _ = ticker.tick() => {}
        }

        // Scans block on sysfs I/O; keep them off the async workers.
        let p = Arc::clone(&poller);
        let rows = tokio::task::spawn_blocking(move || {
            MetricKind::ALL
                .iter()
                .flat_map(|&kind| {
                    let labels: Vec<String> =
                        p.family(kind).cache().labels().map(str::to_string).collect();
                    labels
                        .into_iter()
                        .map(|label| {
                            let value = p.read(kind, &label);
                            (kind, label, value)
                        })
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        })
        .await?;

        round += 1;
        let status = if poller.check_heartbeat() { "ok" } else { "UNAVAILABLE" };
        println!(
            "── round {round} · sensors {status} · next scan in {}s",
            poller.next_scan_in().as_secs()
        );
        for (kind, label, value) in rows {
            println!(
                "   {:<12} {label:<24} {}",
                kind.name(),
                super::format_value(value, kind.unit())
            );
        }

        if count.is_some_and(|n| round >= n) {
            break;
        }
    }

    Ok(round)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_driver::MockDriver;
    use sensor_poller::FamilyConfig;
    use tokio::sync::oneshot;

    fn mock_poller() -> (Arc<SensorPoller<Arc<MockDriver>>>, Arc<MockDriver>) {
        let driver = Arc::new(MockDriver::new());
        driver.set_default_ok([("chip1", "Core0", 42.5)].into_iter().collect());
        let config = PollerConfig {
            startup_delay_secs: 0,
            temperature: FamilyConfig::new(["Core0"], 90),
            ..Default::default()
        };
        let poller = SensorPoller::new(&config, Arc::clone(&driver)).unwrap();
        (Arc::new(poller), driver)
    }

    #[tokio::test]
    async fn test_stops_after_count() {
        let (poller, driver) = mock_poller();
        let rounds = run_rounds(
            Arc::clone(&poller),
            Duration::from_millis(1),
            Some(3),
            std::future::pending::<()>(),
        )
        .await
        .unwrap();
        assert_eq!(rounds, 3);
        assert_eq!(driver.calls(), 1);
        assert!(poller.check_heartbeat());
    }

    #[tokio::test]
    async fn test_signal_before_tick_is_not_lost() {
        let (poller, _driver) = mock_poller();
        let (tx, rx) = oneshot::channel::<()>();
        tx.send(()).unwrap();

        let rounds = tokio::time::timeout(
            Duration::from_secs(5),
            run_rounds(poller, Duration::from_millis(1), None, rx),
        )
        .await
        .expect("watch loop ignored the shutdown signal")
        .unwrap();
        assert_eq!(rounds, 0);
    }

    #[tokio::test]
    async fn test_signal_during_round_stops_next_tick() {
        let (poller, _driver) = mock_poller();
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(run_rounds(poller, Duration::from_millis(20), None, rx));
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(()).unwrap();

        let rounds = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("watch loop ignored the shutdown signal")
            .unwrap()
            .unwrap();
        assert!(rounds >= 1);
    }
}
