//! Wires the store, event hooks, work queue and controller together.

use std::future::Future;
use std::sync::Arc;

use platform_operators_core::events::{EventBroadcaster, HookError, HookRegistry, HookSystemBuilder};
use platform_operators_storage::{DynStore, EventedStore, StorageError};
use platform_operators_store_memory::InMemoryStore;
use tracing::info;

use crate::bootstrap::{BootstrapStats, seed_objects};
use crate::config::OperatorConfig;
use crate::controller::{Backoff, Controller};
use crate::queue::{WorkQueue, work_queue};
use crate::reconcile::PlatformOperatorReconciler;
use crate::sourcer::{DynSourcer, StaticSourcer};
use crate::watches::{
    BundleDeploymentMapper, CatalogSourceMapper, PlatformOperatorMapper, RequestMapper, WatchHook,
};

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("bootstrap failed: {0}")]
    Bootstrap(#[source] StorageError),

    #[error(transparent)]
    Hook(#[from] HookError),
}

pub struct OperatorBuilder {
    config: OperatorConfig,
    sourcer: Option<DynSourcer>,
}

impl OperatorBuilder {
    pub fn new(config: OperatorConfig) -> Self {
        Self {
            config,
            sourcer: None,
        }
    }

    /// Replaces the sourcer built from `[sources]`.
    pub fn with_sourcer(mut self, sourcer: DynSourcer) -> Self {
        self.sourcer = Some(sourcer);
        self
    }

    pub async fn build(self) -> Result<OperatorManager, ManagerError> {
        self.config.validate().map_err(ManagerError::Config)?;

        let broadcaster = Arc::new(EventBroadcaster::with_capacity(
            self.config.controller.event_buffer_capacity,
        ));
        let store: DynStore = Arc::new(EventedStore::new(InMemoryStore::new(), broadcaster.clone()));
        let (queue, receiver) = work_queue();

        let mappers: [Arc<dyn RequestMapper>; 3] = [
            Arc::new(PlatformOperatorMapper),
            Arc::new(BundleDeploymentMapper),
            Arc::new(CatalogSourceMapper::new(store.clone())),
        ];
        let mut hooks = HookSystemBuilder::with_timeout(self.config.hook_timeout());
        for mapper in mappers {
            hooks = hooks
                .register(Arc::new(WatchHook::new(mapper, queue.clone())))
                .await;
        }
        let hooks = hooks.start(broadcaster.subscribe());

        let bootstrap = seed_objects(store.as_ref(), &self.config.bootstrap)
            .await
            .map_err(ManagerError::Bootstrap)?;

        let sourcer = self
            .sourcer
            .unwrap_or_else(|| Arc::new(StaticSourcer::from_config(&self.config.sources)));
        let reconciler = Arc::new(
            PlatformOperatorReconciler::new(store.clone(), sourcer)
                .with_field_manager(self.config.controller.field_manager.clone()),
        );
        let backoff = Backoff::new(self.config.base_backoff(), self.config.max_backoff());
        let controller = Controller::new(reconciler.clone(), queue.clone(), receiver, backoff);

        info!(
            field_manager = %reconciler.field_manager(),
            hooks = hooks.hook_count().await,
            "Operator manager built"
        );

        Ok(OperatorManager {
            store,
            hooks,
            queue,
            reconciler,
            controller,
            bootstrap,
        })
    }
}

impl std::fmt::Debug for OperatorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorBuilder")
            .field("config", &self.config)
            .field("custom_sourcer", &self.sourcer.is_some())
            .finish()
    }
}

/// A built operator, ready to run.
pub struct OperatorManager {
    store: DynStore,
    hooks: Arc<HookRegistry>,
    queue: WorkQueue,
    reconciler: Arc<PlatformOperatorReconciler>,
    controller: Controller,
    bootstrap: BootstrapStats,
}

impl OperatorManager {
    pub fn builder(config: OperatorConfig) -> OperatorBuilder {
        OperatorBuilder::new(config)
    }

    /// The evented store. Writes through it trigger reconciles once running.
    pub fn store(&self) -> DynStore {
        self.store.clone()
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    pub fn reconciler(&self) -> &Arc<PlatformOperatorReconciler> {
        &self.reconciler
    }

    pub fn bootstrap_stats(&self) -> BootstrapStats {
        self.bootstrap
    }

    /// Starts the watches, which enqueue every existing PlatformOperator,
    /// then runs the controller until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ManagerError>
    where
        F: Future<Output = ()> + Send,
    {
        self.hooks.on_start().await?;
        info!(pending = self.queue.len(), "Watches started");

        self.controller.run(shutdown).await;
        info!("Operator manager stopped");
        Ok(())
    }
}

impl std::fmt::Debug for OperatorManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorManager")
            .field("backend", &self.store.backend_name())
            .field("controller", &self.controller)
            .field("bootstrap", &self.bootstrap)
            .finish()
    }
}
