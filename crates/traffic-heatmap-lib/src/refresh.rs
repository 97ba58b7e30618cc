//! Cancellable repeating task

use crate::runtime;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

/// A timer that calls `on_tick` every `period` until cancelled or dropped.
///
/// The callback runs on the timer task and must not block; it is expected to
/// spawn whatever work the tick triggers. Dropping the handle aborts the timer
/// but not the work already spawned by earlier ticks.
pub struct RefreshTask {
    handle: tokio::task::JoinHandle<()>,
    period: Duration,
}

impl RefreshTask {
    /// Start the timer. The first tick fires after `first_delay`, the following
    /// ones every `period`.
    pub fn spawn<F>(period: Duration, first_delay: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let handle = runtime::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + first_delay, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                on_tick();
            }
        });

        tracing::trace!(
            "Refresh timer armed (first tick in {:?}, then every {:?})",
            first_delay,
            period
        );
        Self { handle, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stop the timer
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
