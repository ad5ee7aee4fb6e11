//! The object store trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;
use crate::types::{ListParams, ListResult, ObjectKey, PatchParams, StoredObject};

/// Contract for the API object store the controller reads and writes.
///
/// Objects are JSON documents carrying `apiVersion`, `kind` and `metadata`,
/// keyed by [`ObjectKey`]. Implementations must be thread-safe (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// use platform_operators_storage::{ObjectKey, ObjectStore, StorageError, StoredObject};
///
/// async fn get_operator(store: &dyn ObjectStore, name: &str) -> Result<StoredObject, StorageError> {
///     let key = ObjectKey::cluster("PlatformOperator", name);
///     store
///         .get(&key)
///         .await?
///         .ok_or_else(|| StorageError::not_found("PlatformOperator", name))
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Creates a new object.
    ///
    /// The store assigns `metadata.uid`, `metadata.resourceVersion` and
    /// `metadata.creationTimestamp`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if an object with the same key exists.
    /// Returns `StorageError::Invalid` if the object has no kind or name.
    async fn create(&self, object: &Value) -> Result<StoredObject, StorageError>;

    /// Reads an object. Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing objects.
    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StorageError>;

    /// Lists objects of a kind, ordered by namespace and name.
    async fn list(&self, kind: &str, params: &ListParams) -> Result<ListResult, StorageError>;

    /// Replaces an existing object, keeping its status subtree.
    ///
    /// When `if_match` is given the update only succeeds if the current
    /// `resourceVersion` equals it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the object does not exist.
    /// Returns `StorageError::Conflict` if `if_match` does not match.
    async fn update(
        &self,
        object: &Value,
        if_match: Option<&str>,
    ) -> Result<StoredObject, StorageError>;

    /// Replaces the status subtree of an existing object.
    ///
    /// Only `status` is taken from `object`; everything else is kept. The
    /// field manager is recorded in `metadata.managedFields`. A patch that
    /// leaves the status unchanged writes nothing and returns the current
    /// object with its `resourceVersion` untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Invalid` if `object` carries non-empty
    /// `metadata.managedFields`.
    /// Returns `StorageError::NotFound` if the object does not exist.
    async fn patch_status(
        &self,
        object: &Value,
        params: &PatchParams,
    ) -> Result<StoredObject, StorageError>;

    /// Deletes an object, returning its last stored state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the object does not exist.
    async fn delete(&self, key: &ObjectKey) -> Result<StoredObject, StorageError>;

    /// Returns the name of this backend for logging.
    fn backend_name(&self) -> &'static str;
}
