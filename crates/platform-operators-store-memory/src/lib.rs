//! In-memory object store backend.
//!
//! Provides an implementation of the `ObjectStore` trait from
//! `platform-operators-storage` on a papaya lock-free HashMap.
//!
//! # Example
//!
//! ```ignore
//! use platform_operators_store_memory::InMemoryStore;
//! use platform_operators_storage::ObjectStore;
//!
//! let store = InMemoryStore::new();
//! let created = store.create(&serde_json::json!({
//!     "apiVersion": "platform.openshift.io/v1alpha1",
//!     "kind": "PlatformOperator",
//!     "metadata": {"name": "cert-manager"},
//!     "spec": {"package": {"name": "openshift-cert-manager-operator"}}
//! })).await?;
//! ```

pub mod store;

pub use platform_operators_storage::{DynStore, ObjectStore, StorageError, StoredObject};
pub use store::InMemoryStore;

/// Creates a new shareable in-memory store.
pub fn create_store() -> DynStore {
    std::sync::Arc::new(InMemoryStore::new())
}
