//! Periodic pull+fetch scheduling for monitored tabs.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Handle to one scheduled monitor.
///
/// Cancelling is idempotent and dropping the handle cancels as well, so a
/// monitor never outlives the tab that owns it.
#[derive(Debug)]
pub struct PollHandle {
    id: u64,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Schedule `tick` every `period`, starting one period from now.
    ///
    /// The loop ends when `tick` resolves to `false` (its owner is gone).
    pub(crate) fn spawn<F, Fut>(id: u64, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !tick().await {
                    debug!(poll_id = id, "Monitor owner gone, stopping");
                    break;
                }
            }
        });

        Self {
            id,
            task: Some(task),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the schedule. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(poll_id = self.id, "Monitor cancelled");
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
