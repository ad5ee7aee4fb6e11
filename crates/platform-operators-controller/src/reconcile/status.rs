use platform_operators_core::api::platform::{
    REASON_INSTALL_FAILED, REASON_INSTALL_SUCCESSFUL, REASON_SOURCE_FAILED, TYPE_INSTALLED,
};
use platform_operators_core::{Condition, ConditionStatus};
use platform_operators_storage::StorageError;

use super::{ReconcileError, sourcing_failure};
use crate::sourcer::SourceError;

/// How a reconcile pass ended, before it is published as a condition.
#[derive(Debug)]
pub enum Outcome {
    /// The named BundleDeployment exists and reports no failure.
    Success(String),
    ResolutionFailed(SourceError),
    InstallFailed(StorageError),
    /// The BundleDeployment reported a failure; carries the condition to publish.
    ChildReportedFailure(Condition),
}

impl Outcome {
    /// The error a pass ending in this outcome returns. Child-reported
    /// failures are not errors: the BundleDeployment watch re-triggers the
    /// pass when the child changes.
    pub fn into_error(self) -> Option<ReconcileError> {
        match self {
            Outcome::ResolutionFailed(e) => Some(ReconcileError::Source(e)),
            Outcome::InstallFailed(e) => Some(ReconcileError::Install(e)),
            Outcome::Success(_) | Outcome::ChildReportedFailure(_) => None,
        }
    }
}

/// Maps an outcome to the `Installed` condition published on the PlatformOperator.
pub fn synthesize(outcome: &Outcome) -> Condition {
    match outcome {
        Outcome::Success(name) => Condition::new(
            TYPE_INSTALLED,
            ConditionStatus::True,
            REASON_INSTALL_SUCCESSFUL,
            format!("Successfully applied the {name} BundleDeployment resource"),
        ),
        Outcome::ResolutionFailed(e) => Condition::new(
            TYPE_INSTALLED,
            ConditionStatus::False,
            REASON_SOURCE_FAILED,
            sourcing_failure(e),
        ),
        Outcome::InstallFailed(e) => Condition::new(
            TYPE_INSTALLED,
            ConditionStatus::False,
            REASON_INSTALL_FAILED,
            e.to_string(),
        ),
        Outcome::ChildReportedFailure(condition) => condition.clone(),
    }
}
