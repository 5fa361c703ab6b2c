//! A cancel-and-reschedule timer
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Runs an action once its input has been quiet for a given delay.
///
/// At most one action is pending at any time: scheduling a new one aborts the previous one,
/// whether it is still waiting for its delay or already running.
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending action (if any) by `action`, to be run after the delay.
    ///
    /// This must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    /// Abort the pending action. This is a no-op if there is none
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether an action is waiting or running
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().map_or(false, |handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
