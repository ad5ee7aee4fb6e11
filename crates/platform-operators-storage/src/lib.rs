//! # platform-operators-storage
//!
//! Object store abstraction for the platform operators controller.
//!
//! This crate defines the [`ObjectStore`] trait every backend implements, the
//! [`EventedStore`] wrapper that turns writes into change events, and typed
//! helpers over the [`Resource`](platform_operators_core::Resource) kinds.
//! Backends live in separate crates.
//!
//! ## Example
//!
//! ```ignore
//! use platform_operators_core::api::PlatformOperator;
//! use platform_operators_storage::typed::get_typed;
//!
//! let po: Option<PlatformOperator> = get_typed(store.as_ref(), None, "cert-manager").await?;
//! ```

mod error;
pub mod evented;
mod traits;
pub mod typed;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use evented::EventedStore;
pub use traits::ObjectStore;
pub use types::{ListParams, ListResult, ObjectKey, PatchParams, StoredObject};

pub type StorageResult<T> = Result<T, StorageError>;

/// Shared handle to a store trait object.
pub type DynStore = std::sync::Arc<dyn ObjectStore>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use platform_operators_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::evented::EventedStore;
    pub use crate::traits::ObjectStore;
    pub use crate::typed::{create_typed, get_typed, key_for, list_typed, patch_status_typed};
    pub use crate::types::{ListParams, ListResult, ObjectKey, PatchParams, StoredObject};
    pub use crate::{DynStore, StorageResult};
}
