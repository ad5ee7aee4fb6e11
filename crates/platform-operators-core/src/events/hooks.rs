//! Hook trait for reacting to object change events.
//!
//! Hooks are asynchronous handlers. Each invocation runs in its own tokio task,
//! so a failing or panicking hook never affects the others.

use async_trait::async_trait;

use super::types::ResourceEvent;

/// Error type for hook operations.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Hook execution failed: {0}")]
    Execution(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HookError {
    pub fn execution(msg: impl Into<String>) -> Self {
        HookError::Execution(msg.into())
    }
}

/// Handler for object change events.
///
/// # Example
///
/// ```ignore
/// struct LogHook;
///
/// #[async_trait]
/// impl ResourceHook for LogHook {
///     fn name(&self) -> &str { "log" }
///     fn kinds(&self) -> &[&str] { &["BundleDeployment"] }
///
///     async fn handle(&self, event: &ResourceEvent) -> Result<(), HookError> {
///         tracing::info!(name = %event.name, "changed");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ResourceHook: Send + Sync {
    /// Unique name for this hook (for logging).
    fn name(&self) -> &str;

    /// Kinds this hook is interested in. Empty matches every kind.
    fn kinds(&self) -> &[&str];

    /// Handle a change event. Should return quickly.
    async fn handle(&self, event: &ResourceEvent) -> Result<(), HookError>;

    /// Called once before events are delivered.
    async fn on_start(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Called when the dispatcher fell behind and `missed` events were
    /// dropped. Hooks that derive state from events should rebuild it here.
    async fn on_lagged(&self, _missed: u64) -> Result<(), HookError> {
        Ok(())
    }

    fn matches(&self, event: &ResourceEvent) -> bool {
        let kinds = self.kinds();
        kinds.is_empty() || kinds.contains(&event.kind.as_str())
    }
}
