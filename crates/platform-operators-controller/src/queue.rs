//! De-duplicating work queue of reconcile requests.
//!
//! A request is pending at most once: adding a name that is already waiting
//! is a no-op. Once the controller pops a request, the name can be added
//! again, so changes that arrive during a pass trigger one more pass.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tokio::sync::mpsc;
use tracing::trace;

/// Asks for one reconcile pass of the named PlatformOperator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Request {
    pub name: String,
}

impl Request {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Producer side of the queue. Cheap to clone.
#[derive(Clone)]
pub struct WorkQueue {
    pending: Arc<DashSet<Request>>,
    sender: mpsc::UnboundedSender<Request>,
}

/// Consumer side of the queue, owned by the controller loop.
pub struct QueueReceiver {
    pending: Arc<DashSet<Request>>,
    receiver: mpsc::UnboundedReceiver<Request>,
}

/// Creates a connected queue and receiver.
pub fn work_queue() -> (WorkQueue, QueueReceiver) {
    let pending = Arc::new(DashSet::new());
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        WorkQueue {
            pending: pending.clone(),
            sender,
        },
        QueueReceiver { pending, receiver },
    )
}

impl WorkQueue {
    /// Enqueues `request` unless it is already pending. Returns whether it was added.
    pub fn add(&self, request: Request) -> bool {
        if !self.pending.insert(request.clone()) {
            trace!(name = %request, "Request already pending");
            return false;
        }
        if self.sender.send(request.clone()).is_err() {
            self.pending.remove(&request);
            return false;
        }
        true
    }

    /// Enqueues `request` once `delay` has elapsed.
    pub fn add_after(&self, request: Request, delay: Duration) {
        if delay.is_zero() {
            self.add(request);
            return;
        }
        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(request);
        });
    }

    pub fn is_pending(&self, request: &Request) -> bool {
        self.pending.contains(request)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkQueue")
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl QueueReceiver {
    /// Waits for the next request. Returns `None` once every producer is gone.
    pub async fn recv(&mut self) -> Option<Request> {
        let request = self.receiver.recv().await?;
        self.pending.remove(&request);
        Some(request)
    }
}

impl fmt::Debug for QueueReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueReceiver")
            .field("pending", &self.pending.len())
            .finish()
    }
}
