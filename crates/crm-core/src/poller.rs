//! Background polling with explicit cancellation.
//!
//! [`spawn_poller`] runs a fetch on an interval and publishes changed values
//! through a [`Subscription`]. Failures back off exponentially up to a cap;
//! the first success resets the delay. Cancelling (or dropping) the
//! subscription stops the loop, and anything fetched after that is discarded.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::config::PollConfig;
use crate::error::Result;

/// Interval bookkeeping for a polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let max = max.max(base);
        Self {
            base,
            max,
            current: base,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn on_success(&mut self) -> Duration {
        self.current = self.base;
        self.current
    }

    pub fn on_failure(&mut self) -> Duration {
        self.current = self.current.saturating_mul(2).min(self.max);
        self.current
    }
}

impl From<PollConfig> for Backoff {
    fn from(config: PollConfig) -> Self {
        Self::new(config.interval(), config.max_interval())
    }
}

/// Handle to a running poller. Dropping it cancels the loop.
pub struct Subscription<T> {
    cancel_tx: watch::Sender<bool>,
    updates: watch::Receiver<Option<T>>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Clone> Subscription<T> {
    /// Most recent value, if any fetch has succeeded yet
    pub fn latest(&self) -> Option<T> {
        self.updates.borrow().clone()
    }

    /// Wait for the next distinct value. `None` once the poller has stopped.
    pub async fn changed(&mut self) -> Option<T> {
        self.updates.changed().await.ok()?;
        self.latest()
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop polling and wait for the loop to exit
    pub async fn cancel(mut self) {
        let _ = self.cancel_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// Start polling `fetch` on the tokio runtime.
pub fn spawn_poller<T, F, Fut>(backoff: impl Into<Backoff>, fetch: F) -> Subscription<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (updates_tx, updates) = watch::channel(None);
    let handle = tokio::spawn(run_poll_loop(backoff.into(), fetch, updates_tx, cancel_rx));

    Subscription {
        cancel_tx,
        updates,
        handle: Some(handle),
    }
}

/// Poll the new-leads counter for one agent
pub fn watch_new_leads(
    api: ApiClient,
    agent_id: impl Into<String>,
    backoff: impl Into<Backoff>,
) -> Subscription<u64> {
    let agent_id = agent_id.into();
    spawn_poller(backoff, move || {
        let api = api.clone();
        let agent_id = agent_id.clone();
        async move { api.new_leads_count(&agent_id).await }
    })
}

/// Resolves once cancellation is requested or the sender is gone
async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    loop {
        if *cancel_rx.borrow() {
            return;
        }
        if cancel_rx.changed().await.is_err() {
            return;
        }
    }
}

async fn run_poll_loop<T, F, Fut>(
    mut backoff: Backoff,
    mut fetch: F,
    updates_tx: watch::Sender<Option<T>>,
    mut cancel_rx: watch::Receiver<bool>,
) where
    T: PartialEq,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    debug!(interval_ms = backoff.current().as_millis() as u64, "poller started");

    loop {
        let outcome = tokio::select! {
            _ = cancelled(&mut cancel_rx) => break,
            outcome = fetch() => outcome,
        };

        let delay = match outcome {
            Ok(value) => {
                updates_tx.send_if_modified(|current| {
                    if current.as_ref() == Some(&value) {
                        false
                    } else {
                        *current = Some(value);
                        true
                    }
                });
                backoff.on_success()
            }
            Err(e) => {
                let delay = backoff.on_failure();
                warn!(error = %e, retry_ms = delay.as_millis() as u64, "poll failed");
                delay
            }
        };

        tokio::select! {
            _ = cancelled(&mut cancel_rx) => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    debug!("poller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrmError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast() -> Backoff {
        Backoff::new(Duration::from_millis(5), Duration::from_millis(20))
    }

    #[test]
    fn test_backoff_doubles_and_resets() {
        let mut backoff = Backoff::new(Duration::from_secs(30), Duration::from_secs(100));
        assert_eq!(backoff.on_failure(), Duration::from_secs(60));
        assert_eq!(backoff.on_failure(), Duration::from_secs(100));
        assert_eq!(backoff.on_failure(), Duration::from_secs(100));
        assert_eq!(backoff.on_success(), Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_max_never_below_base() {
        let mut backoff = Backoff::new(Duration::from_secs(30), Duration::from_secs(10));
        assert_eq!(backoff.on_failure(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_publishes_only_distinct_values() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut sub = spawn_poller(fast(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, CrmError>(5u64) }
        });

        assert_eq!(sub.changed().await, Some(5));
        let repeat = tokio::time::timeout(Duration::from_millis(60), sub.changed()).await;
        assert!(repeat.is_err(), "unchanged value must not notify");
        assert!(calls.load(Ordering::SeqCst) > 1);
        assert_eq!(sub.latest(), Some(5));
        sub.cancel().await;
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut sub = spawn_poller(fast(), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(CrmError::Http {
                        status: 503,
                        body: String::new(),
                    })
                } else {
                    Ok(n as u64)
                }
            }
        });

        assert_eq!(sub.changed().await, Some(2));
        sub.cancel().await;
    }

    #[tokio::test]
    async fn test_cancel_stops_fetching() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut sub = spawn_poller(fast(), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, CrmError>(n) }
        });
        sub.changed().await;
        assert!(sub.is_active());

        sub.cancel().await;
        let after_cancel = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_cancel);
    }

    #[tokio::test]
    async fn test_cancel_discards_in_flight_fetch() {
        let sub = spawn_poller(fast(), || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, CrmError>(1u64)
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let updates = sub.updates.clone();
        tokio::time::timeout(Duration::from_secs(1), sub.cancel())
            .await
            .expect("cancel must not wait for the fetch");
        assert_eq!(*updates.borrow(), None);
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut sub = spawn_poller(fast(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, CrmError>(()) }
        });
        sub.changed().await;
        drop(sub);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_drop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_drop);
    }
}
