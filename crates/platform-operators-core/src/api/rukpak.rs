//! `core.rukpak.io/v1alpha1` BundleDeployment.
//!
//! Only the subset of the schema the controller writes or inspects is typed
//! here. The installer owns `status`; this side only reads it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::meta::{ObjectMeta, Resource, TypeMeta};

/// Provisioner that turns an unpacked plain bundle into cluster objects.
pub const PROVISIONER_PLAIN: &str = "core-rukpak-io-plain";
/// Provisioner that unpacks registry+v1 bundle images.
pub const PROVISIONER_REGISTRY: &str = "core-rukpak-io-registry";

/// Bundle contents were unpacked from their source.
pub const TYPE_UNPACKED: &str = "Unpacked";
pub const TYPE_HAS_VALID_BUNDLE: &str = "HasValidBundle";
pub const TYPE_INSTALLED: &str = "Installed";

pub const REASON_UNPACK_FAILED: &str = "UnpackFailed";
pub const REASON_INSTALL_FAILED: &str = "InstallFailed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleDeployment {
    #[serde(flatten)]
    pub types: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: BundleDeploymentSpec,
    #[serde(default)]
    pub status: BundleDeploymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleDeploymentSpec {
    #[serde(default)]
    pub provisioner_class_name: String,
    #[serde(default)]
    pub template: BundleTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BundleTemplate {
    #[serde(default)]
    pub metadata: TemplateMeta,
    #[serde(default)]
    pub spec: BundleSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TemplateMeta {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSpec {
    #[serde(default)]
    pub provisioner_class_name: String,
    #[serde(default)]
    pub source: BundleSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Image,
    Git,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BundleSource {
    #[serde(rename = "type", default)]
    pub type_: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSource {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_secret_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleDeploymentStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_bundle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl BundleDeployment {
    pub fn new(metadata: ObjectMeta, spec: BundleDeploymentSpec) -> Self {
        Self {
            types: TypeMeta::of::<Self>(),
            metadata,
            spec,
            status: BundleDeploymentStatus::default(),
        }
    }

    /// The bundle image this deployment was generated for, if it is image sourced.
    pub fn image_ref(&self) -> Option<&str> {
        self.spec
            .template
            .spec
            .source
            .image
            .as_ref()
            .map(|i| i.reference.as_str())
    }
}

impl Resource for BundleDeployment {
    const API_VERSION: &'static str = "core.rukpak.io/v1alpha1";
    const KIND: &'static str = "BundleDeployment";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
