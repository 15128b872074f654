//! # Status Poller
//!
//! A cancellable periodic task. The first tick fires immediately, then every
//! `interval`. Each tick's work is awaited before the next tick is taken,
//! so fetches never overlap; a tick that overruns delays the schedule
//! instead of bursting.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to the periodic task. Dropping it stops the task.
#[derive(Debug)]
pub struct Poller {
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl Poller {
    /// Stopped poller with the given period.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: None,
        }
    }

    /// Poll period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the task is running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start calling `tick` on schedule. Returns `false` and leaves the
    /// running task alone if already started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F, Fut>(&mut self, mut tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_running() {
            return false;
        }
        let period = self.interval;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tick().await;
            }
        }));
        tracing::debug!(interval = ?period, "status poller started");
        true
    }

    /// Stop the task. Returns `false` if it was not running.
    pub fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                tracing::debug!("status poller stopped");
                true
            }
            None => false,
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
