//! The reconcile loop: pops requests off the work queue and runs the
//! reconciler, retrying failures with per-object exponential backoff.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::queue::{QueueReceiver, Request, WorkQueue};
use crate::reconcile::PlatformOperatorReconciler;

/// Per-request exponential backoff.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    failures: HashMap<Request, u32>,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: HashMap::new(),
        }
    }

    /// Records a failure for `request` and returns how long to wait before retrying.
    pub fn next(&mut self, request: &Request) -> Duration {
        let failures = self.failures.entry(request.clone()).or_insert(0);
        let exp = (*failures).min(31);
        *failures = failures.saturating_add(1);
        self.base
            .checked_mul(1u32 << exp)
            .map_or(self.max, |d| d.min(self.max))
    }

    pub fn reset(&mut self, request: &Request) {
        self.failures.remove(request);
    }

    pub fn failures(&self, request: &Request) -> u32 {
        self.failures.get(request).copied().unwrap_or(0)
    }
}

/// Runs reconcile passes one request at a time.
pub struct Controller {
    reconciler: Arc<PlatformOperatorReconciler>,
    queue: WorkQueue,
    receiver: QueueReceiver,
    backoff: Backoff,
}

impl Controller {
    pub fn new(
        reconciler: Arc<PlatformOperatorReconciler>,
        queue: WorkQueue,
        receiver: QueueReceiver,
        backoff: Backoff,
    ) -> Self {
        Self {
            reconciler,
            queue,
            receiver,
            backoff,
        }
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// Processes requests until `shutdown` resolves or the queue closes.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        info!("PlatformOperator controller started");
        tokio::pin!(shutdown);
        loop {
            let next = tokio::select! {
                _ = &mut shutdown => {
                    info!("PlatformOperator controller shutting down");
                    break;
                }
                next = self.receiver.recv() => next,
            };
            match next {
                Some(request) => self.process(request).await,
                None => {
                    debug!("Work queue closed");
                    break;
                }
            }
        }
    }

    async fn process(&mut self, request: Request) {
        match self.reconciler.reconcile(&request.name).await {
            Ok(result) => {
                self.backoff.reset(&request);
                if let Some(delay) = result.requeue_after {
                    self.queue.add_after(request, delay);
                }
            }
            Err(e) => {
                let delay = self.backoff.next(&request);
                warn!(
                    name = %request,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "Reconcile failed, requeueing"
                );
                self.queue.add_after(request, delay);
            }
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("reconciler", &self.reconciler)
            .field("queue", &self.queue)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut backoff = Backoff::new(Duration::from_millis(5), Duration::from_millis(30));
        let req = Request::new("a");
        assert_eq!(backoff.next(&req), Duration::from_millis(5));
        assert_eq!(backoff.next(&req), Duration::from_millis(10));
        assert_eq!(backoff.next(&req), Duration::from_millis(20));
        assert_eq!(backoff.next(&req), Duration::from_millis(30));
        assert_eq!(backoff.failures(&req), 4);
    }

    #[test]
    fn test_backoff_is_per_request_and_resets() {
        let mut backoff = Backoff::new(Duration::from_millis(5), Duration::from_secs(1));
        let a = Request::new("a");
        let b = Request::new("b");
        backoff.next(&a);
        backoff.next(&a);
        assert_eq!(backoff.next(&b), Duration::from_millis(5));

        backoff.reset(&a);
        assert_eq!(backoff.failures(&a), 0);
        assert_eq!(backoff.next(&a), Duration::from_millis(5));
    }

    #[test]
    fn test_backoff_many_failures_stays_at_max() {
        let mut backoff = Backoff::new(Duration::from_millis(5), Duration::from_secs(960));
        let req = Request::new("a");
        for _ in 0..100 {
            assert!(backoff.next(&req) <= Duration::from_secs(960));
        }
        assert_eq!(backoff.next(&req), Duration::from_secs(960));
    }
}
