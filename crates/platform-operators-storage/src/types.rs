//! Data types used by the object store traits.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageError;

/// Identifies one stored object: kind, optional namespace and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    /// Key for a cluster-scoped object.
    #[must_use]
    pub fn cluster(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: None,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn namespaced(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// Reads `kind`, `metadata.namespace` and `metadata.name` from an object.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Invalid` when `kind` or `metadata.name` is missing or empty.
    pub fn from_object(object: &Value) -> Result<Self, StorageError> {
        let kind = object
            .get("kind")
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StorageError::invalid("object has no kind"))?;
        let metadata = object.get("metadata");
        let name = metadata
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| StorageError::invalid(format!("{kind} has no metadata.name")))?;
        let namespace = metadata
            .and_then(|m| m.get("namespace"))
            .and_then(Value::as_str)
            .filter(|ns| !ns.is_empty())
            .map(str::to_string);

        Ok(Self {
            kind: kind.to_string(),
            namespace,
            name: name.to_string(),
        })
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.kind, ns, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

/// An object as held by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub key: ObjectKey,
    /// Opaque version string, also present as `metadata.resourceVersion`.
    pub resource_version: String,
    /// The full object as JSON.
    pub object: Value,
}

impl StoredObject {
    #[must_use]
    pub fn new(key: ObjectKey, resource_version: impl Into<String>, object: Value) -> Self {
        Self {
            key,
            resource_version: resource_version.into(),
            object,
        }
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn kind(&self) -> &str {
        &self.key.kind
    }
}

/// Filters for a list operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    /// Restrict to one namespace. `None` lists across all namespaces.
    pub namespace: Option<String>,
    pub limit: Option<usize>,
}

impl ListParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a stored object passes the namespace filter.
    #[must_use]
    pub fn matches(&self, stored: &StoredObject) -> bool {
        match &self.namespace {
            Some(ns) => stored.key.namespace.as_deref() == Some(ns.as_str()),
            None => true,
        }
    }
}

/// Result of a list operation.
#[derive(Debug, Clone, Default)]
pub struct ListResult {
    pub items: Vec<StoredObject>,
}

impl ListResult {
    #[must_use]
    pub fn with_items(items: Vec<StoredObject>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Names of the listed objects, in list order.
    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|i| i.key.name.clone()).collect()
    }
}

/// Options for a status patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchParams {
    /// Recorded in `metadata.managedFields` as the writer of the status subtree.
    pub field_manager: String,
}

impl PatchParams {
    #[must_use]
    pub fn apply(field_manager: impl Into<String>) -> Self {
        Self {
            field_manager: field_manager.into(),
        }
    }
}
