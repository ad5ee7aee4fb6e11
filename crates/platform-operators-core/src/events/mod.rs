//! Change events for stored objects.
//!
//! The object store publishes a [`ResourceEvent`] on the [`EventBroadcaster`]
//! after every successful write. Watches subscribe through [`ResourceHook`]s
//! registered with a [`HookRegistry`]; the [`HookDispatcher`] drains the
//! broadcast channel and runs each matching hook in its own task. When the
//! dispatcher falls behind and events are dropped, hooks are told through
//! [`ResourceHook::on_lagged`].
//!
//! ```text
//!   ObjectStore write ──▶ EventBroadcaster ──▶ HookDispatcher
//!                                                   │
//!                                     ┌─────────────┼─────────────┐
//!                                     ▼             ▼             ▼
//!                                  Hook 1        Hook 2        Hook 3
//! ```
//!
//! # Example
//!
//! ```ignore
//! use platform_operators_core::events::{EventBroadcaster, HookSystemBuilder, ResourceEvent};
//!
//! let broadcaster = EventBroadcaster::new_shared();
//! let registry = HookSystemBuilder::new()
//!     .register(my_hook)
//!     .await
//!     .start(broadcaster.subscribe());
//!
//! broadcaster.send(ResourceEvent::deleted("BundleDeployment", "cert-manager"));
//! ```

pub mod broadcaster;
pub mod hooks;
pub mod registry;
pub mod types;

pub use broadcaster::EventBroadcaster;
pub use hooks::{HookError, ResourceHook};
pub use registry::{HookDispatcher, HookRegistry, HookSystemBuilder};
pub use types::{ResourceEvent, ResourceEventType};
