//! Change notification types.

use serde::{Deserialize, Serialize};

use crate::time::{self, Time};

/// Type of object change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceEventType {
    Created,
    Updated,
    Deleted,
}

impl ResourceEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceEventType::Created => "created",
            ResourceEventType::Updated => "updated",
            ResourceEventType::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ResourceEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A change to a stored object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEvent {
    pub event_type: ResourceEventType,
    /// Object kind (e.g., "PlatformOperator", "BundleDeployment")
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    /// The object as it was written (None for deletions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<serde_json::Value>,
    pub timestamp: Time,
}

impl ResourceEvent {
    pub fn new(
        event_type: ResourceEventType,
        kind: impl Into<String>,
        name: impl Into<String>,
        object: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_type,
            kind: kind.into(),
            name: name.into(),
            namespace: None,
            resource_version: None,
            object,
            timestamp: time::now(),
        }
    }

    pub fn created(
        kind: impl Into<String>,
        name: impl Into<String>,
        object: serde_json::Value,
    ) -> Self {
        Self::new(ResourceEventType::Created, kind, name, Some(object))
    }

    pub fn updated(
        kind: impl Into<String>,
        name: impl Into<String>,
        object: serde_json::Value,
    ) -> Self {
        Self::new(ResourceEventType::Updated, kind, name, Some(object))
    }

    pub fn deleted(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(ResourceEventType::Deleted, kind, name, None)
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_resource_version(mut self, resource_version: impl Into<String>) -> Self {
        self.resource_version = Some(resource_version.into());
        self
    }
}
