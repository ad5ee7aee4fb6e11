use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;
use platform_operators_core::{ManagedFieldsEntry, generate_uid, now, validate_name};
use platform_operators_storage::{
    ListParams, ListResult, ObjectKey, ObjectStore, PatchParams, StorageError, StoredObject,
};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

const STATUS_SUBRESOURCE: &str = "status";

/// In-memory object store using papaya lock-free HashMap.
///
/// Reads never block. Writes are serialized through a single mutex so that
/// existence checks and `resourceVersion` comparisons are atomic with the
/// write that follows them.
#[derive(Debug)]
pub struct InMemoryStore {
    data: PapayaHashMap<ObjectKey, StoredObject>,
    /// Monotonic counter backing `resourceVersion`.
    version_counter: AtomicU64,
    write_lock: Mutex<()>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: PapayaHashMap::new(),
            version_counter: AtomicU64::new(1),
            write_lock: Mutex::new(()),
        }
    }

    fn next_version(&self) -> String {
        self.version_counter
            .fetch_add(1, Ordering::SeqCst)
            .to_string()
    }

    /// Number of stored objects across all kinds.
    pub fn len(&self) -> usize {
        self.data.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.data.pin().clear();
    }

    fn current(&self, key: &ObjectKey) -> Result<StoredObject, StorageError> {
        self.data
            .pin()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(&key.kind, &key.name))
    }

    fn commit(&self, key: ObjectKey, mut object: Value) -> Result<StoredObject, StorageError> {
        let version = self.next_version();
        metadata_mut(&mut object)?.insert("resourceVersion".into(), Value::String(version.clone()));
        let stored = StoredObject::new(key.clone(), version, object);
        self.data.pin().insert(key, stored.clone());
        Ok(stored)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn metadata_mut(object: &mut Value) -> Result<&mut Map<String, Value>, StorageError> {
    let root = object
        .as_object_mut()
        .ok_or_else(|| StorageError::invalid("object must be a JSON object"))?;
    root.entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| StorageError::invalid("metadata must be a JSON object"))
}

fn has_managed_fields(object: &Value) -> bool {
    object
        .pointer("/metadata/managedFields")
        .and_then(Value::as_array)
        .is_some_and(|fields| !fields.is_empty())
}

/// Records `manager` as the owner of the status subtree, replacing an older
/// entry of the same manager.
fn record_status_manager(
    metadata: &mut Map<String, Value>,
    manager: &str,
    api_version: Option<String>,
) -> Result<(), StorageError> {
    let mut entries: Vec<ManagedFieldsEntry> = match metadata.remove("managedFields") {
        Some(value) => serde_json::from_value(value)?,
        None => Vec::new(),
    };
    entries.retain(|e| {
        !(e.manager == manager && e.subresource.as_deref() == Some(STATUS_SUBRESOURCE))
    });
    entries.push(ManagedFieldsEntry {
        manager: manager.to_string(),
        operation: "Apply".to_string(),
        api_version,
        time: Some(now()),
        subresource: Some(STATUS_SUBRESOURCE.to_string()),
    });
    metadata.insert("managedFields".into(), serde_json::to_value(entries)?);
    Ok(())
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn create(&self, object: &Value) -> Result<StoredObject, StorageError> {
        let key = ObjectKey::from_object(object)?;
        validate_name(&key.name)?;

        let _guard = self.write_lock.lock().await;
        if self.data.pin().get(&key).is_some() {
            return Err(StorageError::already_exists(&key.kind, &key.name));
        }

        let mut object = object.clone();
        let metadata = metadata_mut(&mut object)?;
        metadata.insert("uid".into(), Value::String(generate_uid()));
        metadata.insert("creationTimestamp".into(), serde_json::to_value(now())?);
        metadata.insert("generation".into(), Value::from(1));

        self.commit(key, object)
    }

    async fn get(&self, key: &ObjectKey) -> Result<Option<StoredObject>, StorageError> {
        Ok(self.data.pin().get(key).cloned())
    }

    async fn list(&self, kind: &str, params: &ListParams) -> Result<ListResult, StorageError> {
        let guard = self.data.pin();
        let mut items: Vec<StoredObject> = guard
            .iter()
            .filter(|(key, stored)| key.kind == kind && params.matches(stored))
            .map(|(_, stored)| stored.clone())
            .collect();
        items.sort_by(|a, b| a.key.cmp(&b.key));
        if let Some(limit) = params.limit {
            items.truncate(limit);
        }
        Ok(ListResult::with_items(items))
    }

    async fn update(
        &self,
        object: &Value,
        if_match: Option<&str>,
    ) -> Result<StoredObject, StorageError> {
        let key = ObjectKey::from_object(object)?;

        let _guard = self.write_lock.lock().await;
        let current = self.current(&key)?;
        if let Some(expected) = if_match {
            if expected != current.resource_version {
                return Err(StorageError::conflict(
                    &key.kind,
                    &key.name,
                    expected,
                    &current.resource_version,
                ));
            }
        }

        let mut object = object.clone();
        let spec_changed = object.get("spec") != current.object.get("spec");
        let old_meta = current.object.get("metadata");
        let generation = old_meta
            .and_then(|m| m.get("generation"))
            .and_then(Value::as_i64)
            .unwrap_or(1);

        let metadata = metadata_mut(&mut object)?;
        for field in ["uid", "creationTimestamp", "managedFields"] {
            match old_meta.and_then(|m| m.get(field)) {
                Some(value) => metadata.insert(field.into(), value.clone()),
                None => metadata.remove(field),
            };
        }
        let generation = if spec_changed { generation + 1 } else { generation };
        metadata.insert("generation".into(), Value::from(generation));

        // status is only written through patch_status
        if let Some(root) = object.as_object_mut() {
            match current.object.get("status") {
                Some(status) => root.insert("status".into(), status.clone()),
                None => root.remove("status"),
            };
        }

        self.commit(key, object)
    }

    async fn patch_status(
        &self,
        object: &Value,
        params: &PatchParams,
    ) -> Result<StoredObject, StorageError> {
        if has_managed_fields(object) {
            return Err(StorageError::invalid(
                "metadata.managedFields must be nil in a status patch",
            ));
        }
        let key = ObjectKey::from_object(object)?;

        let _guard = self.write_lock.lock().await;
        let current = self.current(&key)?;

        let requested = object.get("status").filter(|s| !s.is_null());
        if requested == current.object.get("status") {
            return Ok(current);
        }

        let mut updated = current.object;
        let api_version = object
            .get("apiVersion")
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(root) = updated.as_object_mut() {
            match requested {
                Some(status) => root.insert("status".into(), status.clone()),
                None => root.remove("status"),
            };
        }
        record_status_manager(metadata_mut(&mut updated)?, &params.field_manager, api_version)?;

        self.commit(key, updated)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<StoredObject, StorageError> {
        let _guard = self.write_lock.lock().await;
        self.data
            .pin()
            .remove(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(&key.kind, &key.name))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn operator(name: &str) -> Value {
        json!({
            "apiVersion": "platform.openshift.io/v1alpha1",
            "kind": "PlatformOperator",
            "metadata": {"name": name},
            "spec": {"package": {"name": "openshift-cert-manager-operator"}}
        })
    }

    #[tokio::test]
    async fn test_create_assigns_metadata() {
        let store = InMemoryStore::new();
        let stored = store.create(&operator("cert-manager")).await.unwrap();

        let meta = &stored.object["metadata"];
        assert!(meta["uid"].as_str().is_some());
        assert!(meta["creationTimestamp"].as_str().is_some());
        assert_eq!(meta["resourceVersion"], stored.resource_version.as_str());
        assert_eq!(meta["generation"], 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_create_duplicate_rejected() {
        let store = InMemoryStore::new();
        store.create(&operator("a")).await.unwrap();
        let err = store.create(&operator("a")).await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_create_invalid_name() {
        let store = InMemoryStore::new();
        let err = store.create(&operator("Not_Valid")).await.unwrap_err();
        assert!(matches!(err, StorageError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = InMemoryStore::new();
        let got = store
            .get(&ObjectKey::cluster("PlatformOperator", "missing"))
            .await
            .unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_list_filters_kind_and_sorts() {
        let store = InMemoryStore::new();
        store.create(&operator("b")).await.unwrap();
        store.create(&operator("a")).await.unwrap();
        store
            .create(&json!({
                "kind": "CatalogSource",
                "metadata": {"name": "c", "namespace": "openshift-marketplace"}
            }))
            .await
            .unwrap();

        let result = store
            .list("PlatformOperator", &ListParams::new())
            .await
            .unwrap();
        assert_eq!(result.names(), vec!["a".to_string(), "b".to_string()]);

        let limited = store
            .list("PlatformOperator", &ListParams::new().with_limit(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);

        let catalogs = store
            .list(
                "CatalogSource",
                &ListParams::new().in_namespace("openshift-marketplace"),
            )
            .await
            .unwrap();
        assert_eq!(catalogs.names(), vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn test_update_conflict_and_status_preserved() {
        let store = InMemoryStore::new();
        let created = store.create(&operator("a")).await.unwrap();

        let mut with_status = created.object.clone();
        with_status["status"] = json!({"conditions": [{"type": "Installed", "status": "True"}]});
        store
            .patch_status(&with_status, &PatchParams::apply("test"))
            .await
            .unwrap();

        let err = store
            .update(&created.object, Some(&created.resource_version))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let mut changed = created.object.clone();
        changed["spec"]["package"]["name"] = json!("other");
        let updated = store.update(&changed, None).await.unwrap();
        assert_eq!(updated.object["metadata"]["generation"], 2);
        assert_eq!(updated.object["status"]["conditions"][0]["type"], "Installed");
        assert_eq!(
            updated.object["metadata"]["uid"],
            created.object["metadata"]["uid"]
        );
    }

    #[tokio::test]
    async fn test_patch_status_replaces_status_only() {
        let store = InMemoryStore::new();
        let created = store.create(&operator("a")).await.unwrap();

        let mut request = created.object.clone();
        request["spec"]["package"]["name"] = json!("ignored");
        request["metadata"]
            .as_object_mut()
            .unwrap()
            .remove("managedFields");
        request["status"] = json!({"activeBundleDeployment": {"name": "a"}});

        let patched = store
            .patch_status(&request, &PatchParams::apply("platformoperator"))
            .await
            .unwrap();

        assert_eq!(
            patched.object["spec"]["package"]["name"],
            "openshift-cert-manager-operator"
        );
        assert_eq!(patched.object["status"]["activeBundleDeployment"]["name"], "a");
        assert_ne!(patched.resource_version, created.resource_version);
        let managers = patched.object["metadata"]["managedFields"].as_array().unwrap();
        assert_eq!(managers.len(), 1);
        assert_eq!(managers[0]["manager"], "platformoperator");
        assert_eq!(managers[0]["subresource"], "status");

        // a second patch from the same manager keeps a single entry
        let mut again = request.clone();
        again["status"] = json!({});
        let patched = store
            .patch_status(&again, &PatchParams::apply("platformoperator"))
            .await
            .unwrap();
        assert_eq!(
            patched.object["metadata"]["managedFields"]
                .as_array()
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_patch_status_unchanged_is_noop() {
        let store = InMemoryStore::new();
        let created = store.create(&operator("a")).await.unwrap();

        let mut request = created.object.clone();
        request["status"] = json!({"conditions": []});
        let first = store
            .patch_status(&request, &PatchParams::apply("platformoperator"))
            .await
            .unwrap();
        let second = store
            .patch_status(&request, &PatchParams::apply("platformoperator"))
            .await
            .unwrap();
        assert_eq!(first.resource_version, second.resource_version);
    }

    #[tokio::test]
    async fn test_patch_status_rejects_managed_fields() {
        let store = InMemoryStore::new();
        let created = store.create(&operator("a")).await.unwrap();

        let mut request = created.object.clone();
        request["metadata"]["managedFields"] = json!([{"manager": "x", "operation": "Apply"}]);
        let err = store
            .patch_status(&request, &PatchParams::apply("platformoperator"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_patch_status_missing_object() {
        let store = InMemoryStore::new();
        let err = store
            .patch_status(&operator("gone"), &PatchParams::apply("platformoperator"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryStore::new();
        store.create(&operator("a")).await.unwrap();
        let key = ObjectKey::cluster("PlatformOperator", "a");
        let removed = store.delete(&key).await.unwrap();
        assert_eq!(removed.name(), "a");
        assert!(store.is_empty());
        assert!(store.delete(&key).await.unwrap_err().is_not_found());
    }
}
