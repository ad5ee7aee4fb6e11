//! `platform.openshift.io/v1alpha1` PlatformOperator.

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::meta::{ObjectMeta, Resource, TypeMeta};

/// Condition type reporting whether the requested package is installed.
pub const TYPE_INSTALLED: &str = "Installed";

/// The package could not be resolved from any configured source.
pub const REASON_SOURCE_FAILED: &str = "SourceFailed";
/// Creating or reading the generated BundleDeployment failed.
pub const REASON_INSTALL_FAILED: &str = "InstallFailed";
pub const REASON_INSTALL_SUCCESSFUL: &str = "InstallSuccessful";

/// Desired state: a named package that should be installed on the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformOperator {
    #[serde(flatten)]
    pub types: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PlatformOperatorSpec,
    #[serde(default)]
    pub status: PlatformOperatorStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlatformOperatorSpec {
    #[serde(default)]
    pub package: Package,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Package {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOperatorStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_bundle_deployment: Option<ActiveBundleDeployment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActiveBundleDeployment {
    #[serde(default)]
    pub name: String,
}

impl PlatformOperator {
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            types: TypeMeta::of::<Self>(),
            metadata: ObjectMeta::named(name),
            spec: PlatformOperatorSpec {
                package: Package {
                    name: package.into(),
                },
            },
            status: PlatformOperatorStatus::default(),
        }
    }

    pub fn package_name(&self) -> &str {
        &self.spec.package.name
    }

    /// Record `name` as the BundleDeployment currently backing this operator.
    pub fn set_active_bundle_deployment(&mut self, name: impl Into<String>) {
        self.status.active_bundle_deployment = Some(ActiveBundleDeployment { name: name.into() });
    }

    pub fn active_bundle_deployment(&self) -> Option<&str> {
        self.status
            .active_bundle_deployment
            .as_ref()
            .map(|a| a.name.as_str())
    }
}

impl Resource for PlatformOperator {
    const API_VERSION: &'static str = "platform.openshift.io/v1alpha1";
    const KIND: &'static str = "PlatformOperator";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
