//! Watches: turn object change events into reconcile requests.
//!
//! Each watch pairs a [`RequestMapper`] with the work queue inside a
//! [`WatchHook`] registered on the hook registry. Mappers never see the
//! queue, so they can be tested by feeding them events directly.
//!
//! Events can be lost when the dispatcher falls behind. A mapper that can
//! enumerate every PlatformOperator returns them from
//! [`RequestMapper::resync`]; the hook enqueues that set at startup and after
//! every lag, so no change goes unreconciled.

mod mappers;

use std::sync::Arc;

use async_trait::async_trait;
use platform_operators_core::events::{HookError, ResourceEvent, ResourceHook};
use tracing::{debug, info};

use crate::queue::{Request, WorkQueue};

pub use mappers::{BundleDeploymentMapper, CatalogSourceMapper, PlatformOperatorMapper};

/// Maps a change on one kind of object to the PlatformOperators to reconcile.
///
/// Mapping never fails: problems are logged and yield no requests.
#[async_trait]
pub trait RequestMapper: Send + Sync {
    fn name(&self) -> &str;

    /// The object kind this mapper watches.
    fn kind(&self) -> &'static str;

    async fn map(&self, event: &ResourceEvent) -> Vec<Request>;

    /// Requests that bring every PlatformOperator up to date. Empty when the
    /// mapper cannot enumerate them.
    async fn resync(&self) -> Vec<Request> {
        Vec::new()
    }
}

/// Hook that feeds a mapper's requests into the work queue.
pub struct WatchHook {
    mapper: Arc<dyn RequestMapper>,
    kinds: [&'static str; 1],
    queue: WorkQueue,
}

impl WatchHook {
    pub fn new(mapper: Arc<dyn RequestMapper>, queue: WorkQueue) -> Self {
        let kinds = [mapper.kind()];
        Self {
            mapper,
            kinds,
            queue,
        }
    }

    /// Enqueues the mapper's full resync set, returning how many were new.
    async fn resync(&self) -> usize {
        self.mapper
            .resync()
            .await
            .into_iter()
            .filter(|request| self.queue.add(request.clone()))
            .count()
    }
}

#[async_trait]
impl ResourceHook for WatchHook {
    fn name(&self) -> &str {
        self.mapper.name()
    }

    fn kinds(&self) -> &[&str] {
        &self.kinds
    }

    async fn handle(&self, event: &ResourceEvent) -> Result<(), HookError> {
        let requests = self.mapper.map(event).await;
        debug!(
            watch = %self.mapper.name(),
            kind = %event.kind,
            name = %event.name,
            event_type = %event.event_type,
            requests = requests.len(),
            "Mapped change event"
        );
        for request in requests {
            self.queue.add(request);
        }
        Ok(())
    }

    async fn on_start(&self) -> Result<(), HookError> {
        let queued = self.resync().await;
        if queued > 0 {
            info!(watch = %self.mapper.name(), queued, "Initial sync queued");
        }
        Ok(())
    }

    async fn on_lagged(&self, missed: u64) -> Result<(), HookError> {
        let queued = self.resync().await;
        info!(
            watch = %self.mapper.name(),
            missed,
            queued,
            "Resynced after missed events"
        );
        Ok(())
    }
}

impl std::fmt::Debug for WatchHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHook")
            .field("mapper", &self.mapper.name())
            .field("kind", &self.kinds[0])
            .finish()
    }
}
