//! Hook registry and dispatcher.
//!
//! The registry holds the registered hooks; the dispatcher drains the
//! broadcast channel and routes each event to the matching hooks.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, error, info, warn};

use super::hooks::{HookError, ResourceHook};
use super::types::ResourceEvent;

/// Default timeout for hook execution.
const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Hook Registry
// ============================================================================

pub struct HookRegistry {
    hooks: RwLock<Vec<Arc<dyn ResourceHook>>>,
    timeout: Duration,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_HOOK_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
            timeout,
        }
    }

    pub async fn register(&self, hook: Arc<dyn ResourceHook>) {
        let name = hook.name().to_string();
        self.hooks.write().await.push(hook);
        debug!(hook = %name, "Registered hook");
    }

    pub async fn hook_count(&self) -> usize {
        self.hooks.read().await.len()
    }

    pub async fn get_matching_hooks(&self, event: &ResourceEvent) -> Vec<Arc<dyn ResourceHook>> {
        let hooks = self.hooks.read().await;
        hooks.iter().filter(|h| h.matches(event)).cloned().collect()
    }

    /// Dispatch an event to all matching hooks.
    ///
    /// Each hook runs in its own task with a timeout and panic recovery;
    /// errors are logged and never propagate.
    pub async fn dispatch(&self, event: &ResourceEvent) {
        let hooks = self.get_matching_hooks(event).await;

        if hooks.is_empty() {
            debug!(kind = %event.kind, name = %event.name, "No hooks matched event");
            return;
        }

        let timeout = self.timeout;

        for hook in hooks {
            let event = event.clone();

            tokio::spawn(async move {
                let hook_name = hook.name().to_string();

                let result = tokio::time::timeout(timeout, async {
                    AssertUnwindSafe(hook.handle(&event)).catch_unwind().await
                })
                .await;

                match result {
                    Ok(Ok(Ok(()))) => {
                        debug!(hook = %hook_name, "Hook executed successfully");
                    }
                    Ok(Ok(Err(e))) => {
                        warn!(
                            hook = %hook_name,
                            error = %e,
                            "Hook execution failed"
                        );
                    }
                    Ok(Err(panic)) => {
                        let panic_msg = if let Some(s) = panic.downcast_ref::<&str>() {
                            s.to_string()
                        } else if let Some(s) = panic.downcast_ref::<String>() {
                            s.clone()
                        } else {
                            "Unknown panic".to_string()
                        };
                        error!(
                            hook = %hook_name,
                            panic = %panic_msg,
                            "Hook panicked!"
                        );
                    }
                    Err(_) => {
                        error!(
                            hook = %hook_name,
                            timeout_secs = timeout.as_secs(),
                            "Hook timed out"
                        );
                    }
                }
            });
        }
    }

    /// Runs every hook's `on_start`. Failures are logged and do not stop
    /// the remaining hooks.
    pub async fn on_start(&self) -> Result<(), HookError> {
        let hooks = self.hooks.read().await;
        for hook in hooks.iter() {
            if let Err(e) = hook.on_start().await {
                warn!(hook = %hook.name(), error = %e, "Hook on_start failed");
            }
        }
        Ok(())
    }

    /// Tells every hook that `missed` events were dropped.
    ///
    /// Hooks run one after another, each bounded by the hook timeout.
    pub async fn on_lagged(&self, missed: u64) {
        let hooks = self.hooks.read().await;
        for hook in hooks.iter() {
            match tokio::time::timeout(self.timeout, hook.on_lagged(missed)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(hook = %hook.name(), error = %e, "Hook on_lagged failed");
                }
                Err(_) => {
                    error!(
                        hook = %hook.name(),
                        timeout_secs = self.timeout.as_secs(),
                        "Hook on_lagged timed out"
                    );
                }
            }
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Hook Dispatcher
// ============================================================================

/// Consumes events from a broadcast channel and routes them to hooks.
pub struct HookDispatcher {
    registry: Arc<HookRegistry>,
}

impl HookDispatcher {
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    /// Run until the channel is closed.
    pub async fn run(self, mut receiver: broadcast::Receiver<ResourceEvent>) {
        info!("Starting hook dispatcher");

        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.registry.dispatch(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "Dispatcher lagged, missed events");
                    self.registry.on_lagged(n).await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Hook dispatcher channel closed, stopping");
                    break;
                }
            }
        }
    }
}

impl std::fmt::Debug for HookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookDispatcher")
            .field("registry", &self.registry)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

pub struct HookSystemBuilder {
    registry: HookRegistry,
}

impl HookSystemBuilder {
    pub fn new() -> Self {
        Self {
            registry: HookRegistry::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            registry: HookRegistry::with_timeout(timeout),
        }
    }

    pub async fn register(self, hook: Arc<dyn ResourceHook>) -> Self {
        self.registry.register(hook).await;
        self
    }

    /// Build the registry and spawn its dispatcher as a background task.
    pub fn start(self, receiver: broadcast::Receiver<ResourceEvent>) -> Arc<HookRegistry> {
        let registry = Arc::new(self.registry);
        let dispatcher = HookDispatcher::new(registry.clone());
        tokio::spawn(dispatcher.run(receiver));
        registry
    }
}

impl Default for HookSystemBuilder {
    fn default() -> Self {
        Self::new()
    }
}
