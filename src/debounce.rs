// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Cancellable single-slot timer for debouncing field edits

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// Runs an action once its input has been quiet for `delay`.
///
/// At most one timer is outstanding: scheduling again cancels the previous
/// one. Once the delay elapses the action is spawned as its own task, so a
/// later `cancel` (or dropping the debouncer) never aborts work in flight.
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

    /// Replace any pending timer with a new one that fires `action`
    pub fn schedule<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(action);
        }));
    }

    /// Drop the pending timer, if any. Returns whether one was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                trace!("Cancelled pending debounce timer");
                true
            }
            _ => false,
        }
    }

    /// Whether a timer is still waiting to fire
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_action(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(1500));

        debouncer.schedule(counting_action(&fired));
        tokio::time::sleep(Duration::from_millis(1400)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_cancels_previous() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(1500));

        debouncer.schedule(counting_action(&fired));
        tokio::time::sleep(Duration::from_millis(1000)).await;
        debouncer.schedule(counting_action(&fired));
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let mut debouncer = Debouncer::new(Duration::from_millis(1500));
            debouncer.schedule(counting_action(&fired));
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_does_not_abort_action() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        let counter = fired.clone();
        debouncer.schedule(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!debouncer.cancel());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
