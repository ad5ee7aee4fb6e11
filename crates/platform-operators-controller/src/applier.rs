//! Builds the BundleDeployment that installs a sourced bundle.

use std::collections::BTreeMap;

use platform_operators_core::api::rukpak::{PROVISIONER_PLAIN, PROVISIONER_REGISTRY};
use platform_operators_core::api::{
    BundleDeployment, BundleDeploymentSpec, BundleSource, BundleSpec, BundleTemplate,
    ImageSource, PlatformOperator, SourceType, TemplateMeta,
};
use platform_operators_core::{ObjectMeta, OwnerReference, Resource};

/// Label on generated bundles naming the PlatformOperator they belong to.
pub const OWNER_NAME_LABEL: &str = "platform.openshift.io/owner-name";

/// The BundleDeployment for `po`, unpacking `image` with the registry
/// provisioner and installing it with the plain provisioner.
///
/// The result shares the PlatformOperator's name and is controlled by it.
pub fn new_bundle_deployment(po: &PlatformOperator, image: &str) -> BundleDeployment {
    let owner = OwnerReference {
        api_version: PlatformOperator::API_VERSION.to_string(),
        kind: PlatformOperator::KIND.to_string(),
        name: po.metadata.name.clone(),
        uid: po.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    };
    let metadata = ObjectMeta {
        owner_references: vec![owner],
        ..ObjectMeta::named(po.metadata.name.clone())
    };

    let spec = BundleDeploymentSpec {
        provisioner_class_name: PROVISIONER_PLAIN.to_string(),
        template: BundleTemplate {
            metadata: TemplateMeta {
                labels: BTreeMap::from([(OWNER_NAME_LABEL.to_string(), po.metadata.name.clone())]),
                annotations: BTreeMap::new(),
            },
            spec: BundleSpec {
                provisioner_class_name: PROVISIONER_REGISTRY.to_string(),
                source: BundleSource {
                    type_: SourceType::Image,
                    image: Some(ImageSource {
                        reference: image.to_string(),
                        image_pull_secret_name: None,
                    }),
                },
            },
        },
    };

    BundleDeployment::new(metadata, spec)
}
