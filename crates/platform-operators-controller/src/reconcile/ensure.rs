use platform_operators_core::api::{BundleDeployment, PlatformOperator};
use platform_operators_storage::typed::{create_typed, get_typed};
use platform_operators_storage::{DynStore, StorageError};
use tracing::{debug, info};

use crate::applier::new_bundle_deployment;
use crate::sourcer::{DynSourcer, SourceError};

/// Result of making sure a PlatformOperator has its BundleDeployment.
#[derive(Debug)]
pub enum EnsureOutcome {
    /// The BundleDeployment exists, either found or just created.
    Ready(BundleDeployment),
    /// No BundleDeployment exists and the package could not be resolved.
    SourceFailed(SourceError),
    /// Reading or creating the BundleDeployment failed.
    InstallFailed(StorageError),
}

/// Returns the BundleDeployment named after a PlatformOperator, creating it
/// from a freshly sourced bundle when it does not exist yet.
///
/// An existing BundleDeployment is returned as-is: upgrades are not
/// supported, so its spec is never compared against what would be generated
/// now. A concurrent creator losing the race surfaces as `InstallFailed`
/// with an `AlreadyExists` error; the next pass then finds the winner.
#[derive(Clone)]
pub struct BundleDeploymentEnsurer {
    store: DynStore,
    sourcer: DynSourcer,
}

impl BundleDeploymentEnsurer {
    pub fn new(store: DynStore, sourcer: DynSourcer) -> Self {
        Self { store, sourcer }
    }

    pub async fn ensure(&self, po: &PlatformOperator) -> EnsureOutcome {
        let name = po.metadata.name.as_str();
        match get_typed::<BundleDeployment>(self.store.as_ref(), None, name).await {
            Ok(Some(existing)) => {
                debug!(name = %name, "BundleDeployment already exists");
                return EnsureOutcome::Ready(existing);
            }
            Ok(None) => {}
            Err(e) => return EnsureOutcome::InstallFailed(e),
        }

        let bundle = match self.sourcer.source(po).await {
            Ok(bundle) => bundle,
            Err(e) => return EnsureOutcome::SourceFailed(e),
        };

        let desired = new_bundle_deployment(po, &bundle.image);
        match create_typed(self.store.as_ref(), &desired).await {
            Ok(created) => {
                info!(
                    name = %name,
                    package = %bundle.package,
                    image = %bundle.image,
                    "Created BundleDeployment"
                );
                EnsureOutcome::Ready(created)
            }
            Err(e) => EnsureOutcome::InstallFailed(e),
        }
    }
}

impl std::fmt::Debug for BundleDeploymentEnsurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleDeploymentEnsurer")
            .field("backend", &self.store.backend_name())
            .finish_non_exhaustive()
    }
}
