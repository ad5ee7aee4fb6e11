//! Typed access to the object store.
//!
//! Thin helpers that convert between [`Resource`] kinds and the JSON form the
//! store holds.

use platform_operators_core::Resource;

use crate::error::StorageError;
use crate::traits::ObjectStore;
use crate::types::{ListParams, ObjectKey, PatchParams, StoredObject};

/// Key of a kind `R` object.
pub fn key_for<R: Resource>(namespace: Option<&str>, name: &str) -> ObjectKey {
    ObjectKey {
        kind: R::KIND.to_string(),
        namespace: namespace.map(str::to_string),
        name: name.to_string(),
    }
}

fn decode<R: Resource>(stored: StoredObject) -> Result<R, StorageError> {
    Ok(R::from_value(stored.object)?)
}

/// Reads a kind `R` object; `Ok(None)` when absent.
pub async fn get_typed<R: Resource>(
    store: &dyn ObjectStore,
    namespace: Option<&str>,
    name: &str,
) -> Result<Option<R>, StorageError> {
    store
        .get(&key_for::<R>(namespace, name))
        .await?
        .map(decode::<R>)
        .transpose()
}

pub async fn create_typed<R: Resource>(
    store: &dyn ObjectStore,
    object: &R,
) -> Result<R, StorageError> {
    let stored = store.create(&object.to_value()?).await?;
    decode(stored)
}

/// Lists every kind `R` object matching `params`.
pub async fn list_typed<R: Resource>(
    store: &dyn ObjectStore,
    params: &ListParams,
) -> Result<Vec<R>, StorageError> {
    store
        .list(R::KIND, params)
        .await?
        .items
        .into_iter()
        .map(decode::<R>)
        .collect()
}

pub async fn patch_status_typed<R: Resource>(
    store: &dyn ObjectStore,
    object: &R,
    params: &PatchParams,
) -> Result<R, StorageError> {
    let stored = store.patch_status(&object.to_value()?, params).await?;
    decode(stored)
}
