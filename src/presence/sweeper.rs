use std::sync::Arc;

use chrono::TimeDelta;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

use super::engine::PresenceEngine;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(15_000);

/// Background task that evicts stale participants every `period`.
///
/// A participant is stale once untouched for one full period.
pub struct Sweeper {
    engine: Arc<PresenceEngine>,
    period: Duration,
    threshold: TimeDelta,
}

/// Stops the sweeper. Dropping the handle stops it as well.
pub struct SweeperHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Sweeper {
    pub fn new(engine: Arc<PresenceEngine>, period: Duration) -> Self {
        // tokio intervals cannot tick at zero.
        let period = period.max(Duration::from_millis(1));
        let threshold = TimeDelta::from_std(period).unwrap_or(TimeDelta::MAX);
        Self {
            engine,
            period,
            threshold,
        }
    }

    pub fn spawn(self) -> SweeperHandle {
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(shutdown_rx));
        SweeperHandle { shutdown, task }
    }

    async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        log::info!("Sweeper started, period {}ms", self.period.as_millis());

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(),
                _ = &mut shutdown => break,
            }
        }

        log::info!("Sweeper stopped");
    }

    fn tick(&self) {
        match self.engine.sweep(self.threshold) {
            Ok(report) if report.is_empty() => log::debug!("Sweep: nobody stale"),
            Ok(report) => log::info!(
                "Sweep: evicted {}, unannounced {}",
                report.evicted.len(),
                report.unannounced.len()
            ),
            // Next tick retries.
            Err(err) => log::error!("Sweep failed: {err}"),
        }
    }
}

impl SweeperHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(err) = self.task.await {
            log::warn!("Sweeper task ended abnormally: {err}");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}
