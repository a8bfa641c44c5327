//! Periodic sampling loops and the fan recompute notifier
//!
//! The scheduler owns two tokio tasks: one refreshes temperature sensors,
//! the other refreshes and drives fan sensors. Both tick on the same fixed
//! interval. The fan task can also be woken through a [`Notifier`], which is
//! how a profile change takes effect without waiting for the next tick.
//! Passes do blocking file I/O and run on the blocking thread pool.

use crate::errors::{FanProfileError, Result};
use crate::registry::Registry;
use crate::sysfs::AttributeIo;
use chrono::Local;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{self, JoinHandle};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Wakes the fan loop for an immediate out-of-cycle pass.
///
/// `notify` resolves once the fan loop has taken the notification. One more
/// notification may wait in the slot while a pass is running; any further
/// callers wait until the slot frees up.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<oneshot::Sender<()>>,
}

impl Notifier {
    pub async fn notify(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(ack_tx)
            .await
            .map_err(|_| FanProfileError::SchedulerStopped)?;
        ack_rx.await.map_err(|_| FanProfileError::SchedulerStopped)
    }
}

#[derive(Debug, Default)]
struct PassCounters {
    temperature: AtomicU64,
    fan: AtomicU64,
}

pub struct Scheduler {
    registry: Arc<Registry>,
    io: Arc<dyn AttributeIo>,
    interval: Duration,
    primary: String,
    notifications: mpsc::Receiver<oneshot::Sender<()>>,
}

impl Scheduler {
    /// Create a scheduler and the notifier that feeds its fan loop.
    ///
    /// `primary` names the temperature sensor used as reference for
    /// temperature-driven profiles.
    pub fn new(
        registry: Arc<Registry>,
        io: Arc<dyn AttributeIo>,
        interval: Duration,
        primary: impl Into<String>,
    ) -> (Self, Notifier) {
        let (tx, notifications) = mpsc::channel(1);
        let scheduler = Self {
            registry,
            io,
            interval,
            primary: primary.into(),
            notifications,
        };
        (scheduler, Notifier { tx })
    }

    /// Spawn both loops on the current tokio runtime
    pub fn start(self) -> SchedulerHandle {
        info!("Starting sampling loops every {:?}", self.interval);
        let counters = Arc::new(PassCounters::default());

        let temperature = tokio::spawn(run_temperatures(
            self.registry.clone(),
            self.io.clone(),
            self.interval,
            counters.clone(),
        ));
        let fan = tokio::spawn(run_fans(
            self.registry,
            self.io,
            self.interval,
            self.primary,
            self.notifications,
            counters.clone(),
        ));

        SchedulerHandle {
            temperature,
            fan,
            counters,
        }
    }
}

/// Running sampling loops
pub struct SchedulerHandle {
    temperature: JoinHandle<()>,
    fan: JoinHandle<()>,
    counters: Arc<PassCounters>,
}

impl SchedulerHandle {
    /// Number of completed temperature passes
    pub fn temperature_passes(&self) -> u64 {
        self.counters.temperature.load(Ordering::SeqCst)
    }

    /// Number of completed fan passes, periodic and notified
    pub fn fan_passes(&self) -> u64 {
        self.counters.fan.load(Ordering::SeqCst)
    }

    /// Cancel both loops and wait until they are gone
    pub async fn stop(self) {
        self.temperature.abort();
        self.fan.abort();
        let _ = self.temperature.await;
        let _ = self.fan.await;
        debug!("Sampling loops stopped");
    }
}

/// First tick one full period after start, like a plain ticker
fn ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn run_temperatures(
    registry: Arc<Registry>,
    io: Arc<dyn AttributeIo>,
    period: Duration,
    counters: Arc<PassCounters>,
) {
    let mut ticker = ticker(period);
    loop {
        ticker.tick().await;
        let (registry, io) = (registry.clone(), io.clone());
        let pass = task::spawn_blocking(move || registry.sample_temperatures(io.as_ref(), Local::now()));
        match pass.await {
            Ok(report) => debug!(
                "temperature pass: {} refreshed, {} failed",
                report.refreshed, report.failed
            ),
            Err(e) => warn!("temperature pass panicked: {}", e),
        }
        counters.temperature.fetch_add(1, Ordering::SeqCst);
    }
}

async fn run_fans(
    registry: Arc<Registry>,
    io: Arc<dyn AttributeIo>,
    period: Duration,
    primary: String,
    mut notifications: mpsc::Receiver<oneshot::Sender<()>>,
    counters: Arc<PassCounters>,
) {
    let mut ticker = ticker(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            Some(ack) = notifications.recv() => {
                let _ = ack.send(());
                debug!("fan recompute requested");
            }
        }

        let (registry, io, primary) = (registry.clone(), io.clone(), primary.clone());
        let pass =
            task::spawn_blocking(move || registry.control_fans(io.as_ref(), Local::now(), &primary));
        match pass.await {
            Ok(report) => debug!(
                "fan pass: {} refreshed, {} failed",
                report.refreshed, report.failed
            ),
            Err(e) => warn!("fan pass panicked: {}", e),
        }
        counters.fan.fetch_add(1, Ordering::SeqCst);
    }
}
