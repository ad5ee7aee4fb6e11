use platform_operators_core::api::PlatformOperator;
use platform_operators_core::set_status_condition;
use platform_operators_storage::typed::{get_typed, patch_status_typed};
use platform_operators_storage::{DynStore, PatchParams};
use tracing::{debug, error, info};

use super::ensure::{BundleDeploymentEnsurer, EnsureOutcome};
use super::inspect::inspect_bundle_deployment;
use super::status::{Outcome, synthesize};
use super::{ReconcileError, ReconcileResult};
use crate::sourcer::DynSourcer;

/// Field manager recorded on status patches unless configured otherwise.
pub const DEFAULT_FIELD_MANAGER: &str = "platformoperator";

/// Drives one PlatformOperator toward having an installed BundleDeployment.
///
/// Holds no state of its own besides injected handles, so one instance can
/// serve any number of records.
#[derive(Clone)]
pub struct PlatformOperatorReconciler {
    store: DynStore,
    ensurer: BundleDeploymentEnsurer,
    field_manager: String,
}

impl PlatformOperatorReconciler {
    pub fn new(store: DynStore, sourcer: DynSourcer) -> Self {
        Self {
            ensurer: BundleDeploymentEnsurer::new(store.clone(), sourcer),
            store,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
        }
    }

    pub fn with_field_manager(mut self, field_manager: impl Into<String>) -> Self {
        self.field_manager = field_manager.into();
        self
    }

    pub fn field_manager(&self) -> &str {
        &self.field_manager
    }

    /// Runs one reconcile pass for the PlatformOperator `name`.
    ///
    /// A missing PlatformOperator is not an error and nothing is written.
    /// Once the record has been read its status is published exactly once,
    /// whatever the pass outcome; a failure to publish is logged and does
    /// not change the result.
    pub async fn reconcile(&self, name: &str) -> Result<ReconcileResult, ReconcileError> {
        info!(name = %name, "Reconciling PlatformOperator");

        let mut po = match get_typed::<PlatformOperator>(self.store.as_ref(), None, name).await {
            Ok(Some(po)) => po,
            Ok(None) => {
                debug!(name = %name, "PlatformOperator not found, nothing to do");
                return Ok(ReconcileResult::done());
            }
            Err(e) => return Err(ReconcileError::Fetch(e)),
        };

        let result = self.converge(&mut po).await;
        self.publish_status(po).await;

        debug!(name = %name, ok = result.is_ok(), "Finished reconciling PlatformOperator");
        result
    }

    async fn converge(&self, po: &mut PlatformOperator) -> Result<ReconcileResult, ReconcileError> {
        let outcome = match self.ensurer.ensure(po).await {
            EnsureOutcome::Ready(bd) => match inspect_bundle_deployment(&bd.status.conditions) {
                Some(failure) => Outcome::ChildReportedFailure(failure),
                None => Outcome::Success(bd.metadata.name),
            },
            EnsureOutcome::SourceFailed(e) => Outcome::ResolutionFailed(e),
            EnsureOutcome::InstallFailed(e) => Outcome::InstallFailed(e),
        };

        set_status_condition(&mut po.status.conditions, synthesize(&outcome));
        if let Outcome::Success(bd_name) = &outcome {
            po.set_active_bundle_deployment(bd_name.clone());
        }

        match outcome.into_error() {
            Some(e) => Err(e),
            None => Ok(ReconcileResult::done()),
        }
    }

    async fn publish_status(&self, mut po: PlatformOperator) {
        po.metadata.managed_fields.clear();
        let params = PatchParams::apply(self.field_manager.clone());
        if let Err(e) = patch_status_typed(self.store.as_ref(), &po, &params).await {
            error!(
                name = %po.metadata.name,
                error = %e,
                category = %e.category(),
                "Failed to patch PlatformOperator status"
            );
        }
    }
}

impl std::fmt::Debug for PlatformOperatorReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformOperatorReconciler")
            .field("field_manager", &self.field_manager)
            .field("ensurer", &self.ensurer)
            .finish()
    }
}
