//! EventedStore - an object store wrapper that emits change events.
//!
//! All operations are delegated to the inner store; after each successful
//! write a `ResourceEvent` is sent to the broadcaster. Watches are built on
//! these events.
//!
//! # Example
//!
//! ```ignore
//! use platform_operators_storage::EventedStore;
//! use platform_operators_core::events::EventBroadcaster;
//!
//! let broadcaster = EventBroadcaster::new_shared();
//! let store = EventedStore::new(InMemoryStore::new(), broadcaster);
//!
//! // Subscribers now see a created event for this object
//! store.create(&operator_json).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use platform_operators_core::events::{EventBroadcaster, ResourceEvent, ResourceEventType};
use serde_json::Value;
use tracing::debug;

use crate::error::StorageError;
use crate::traits::ObjectStore;
use crate::types::{ListParams, ListResult, ObjectKey, PatchParams, StoredObject};

/// An object store wrapper that emits events after successful writes.
///
/// Events are emitted **after** the write succeeds, so every event
/// corresponds to a change that is visible to readers.
pub struct EventedStore<S: ObjectStore> {
    inner: S,
    broadcaster: Arc<EventBroadcaster>,
}

impl<S: ObjectStore> EventedStore<S> {
    pub fn new(inner: S, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self { inner, broadcaster }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }

    fn emit_written(&self, event_type: ResourceEventType, stored: &StoredObject) {
        if self.broadcaster.subscriber_count() == 0 {
            return;
        }
        let event = ResourceEvent::new(
            event_type,
            stored.key.kind.clone(),
            stored.key.name.clone(),
            Some(stored.object.clone()),
        )
        .with_namespace(stored.key.namespace.clone())
        .with_resource_version(stored.resource_version.clone());
        let count = self.broadcaster.send(event);
        debug!(
            kind = %stored.key.kind,
            name = %stored.key.name,
            event = %event_type,
            subscribers = count,
            "Emitted object event"
        );
    }

}

/// True when the store handed back the version the request was based on,
/// i.e. the write was a no-op.
fn unchanged(request: &Value, stored: &StoredObject) -> bool {
    request
        .pointer("/metadata/resourceVersion")
        .and_then(Value::as_str)
        .is_some_and(|rv| rv == stored.resource_version)
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for EventedStore<S> {
    async fn create(&self, object: &Value) -> Result<StoredObject, StorageError> {
        let stored = self.inner.create(object).await?;
        self.emit_written(ResourceEventType::Created, &stored);
        Ok(stored)
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StorageError> {
        self.inner.get(key).await
    }

    async fn list(&self, kind: &str, params: &ListParams) -> Result<ListResult, StorageError> {
        self.inner.list(kind, params).await
    }

    async fn update(
        &self,
        object: &Value,
        if_match: Option<&str>,
    ) -> Result<StoredObject, StorageError> {
        let stored = self.inner.update(object, if_match).await?;
        if !unchanged(object, &stored) {
            self.emit_written(ResourceEventType::Updated, &stored);
        }
        Ok(stored)
    }

    async fn patch_status(
        &self,
        object: &Value,
        params: &PatchParams,
    ) -> Result<StoredObject, StorageError> {
        let stored = self.inner.patch_status(object, params).await?;
        if !unchanged(object, &stored) {
            self.emit_written(ResourceEventType::Updated, &stored);
        }
        Ok(stored)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<StoredObject, StorageError> {
        let stored = self.inner.delete(key).await?;
        self.emit_written(ResourceEventType::Deleted, &stored);
        Ok(stored)
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}
