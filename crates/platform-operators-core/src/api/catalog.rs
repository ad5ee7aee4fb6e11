//! `operators.coreos.com/v1alpha1` CatalogSource.
//!
//! The controller never resolves packages against catalogs itself; it only
//! needs to notice that a catalog changed.

use serde::{Deserialize, Serialize};

use crate::meta::{ObjectMeta, Resource, TypeMeta};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSource {
    #[serde(flatten)]
    pub types: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: CatalogSourceSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSourceSpec {
    #[serde(default)]
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

impl CatalogSource {
    /// A gRPC catalog served from `image` in `namespace`.
    pub fn grpc(
        namespace: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            types: TypeMeta::of::<Self>(),
            metadata: ObjectMeta {
                namespace: Some(namespace.into()),
                ..ObjectMeta::named(name)
            },
            spec: CatalogSourceSpec {
                source_type: "grpc".into(),
                image: Some(image.into()),
                display_name: None,
                publisher: None,
            },
        }
    }
}

impl Resource for CatalogSource {
    const API_VERSION: &'static str = "operators.coreos.com/v1alpha1";
    const KIND: &'static str = "CatalogSource";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
