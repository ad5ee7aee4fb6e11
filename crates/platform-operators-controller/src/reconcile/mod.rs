//! Reconciliation of PlatformOperators.
//!
//! One pass fetches the PlatformOperator, makes sure its BundleDeployment
//! exists, folds the BundleDeployment's health into a single `Installed`
//! condition and publishes the status:
//! - [`ensure`]: find or create the BundleDeployment
//! - [`inspect`]: read failures reported by the BundleDeployment
//! - [`status`]: map the pass outcome to a condition
//! - [`platform_operator`]: the pass itself

pub mod ensure;
pub mod inspect;
pub mod platform_operator;
pub mod status;

use std::time::Duration;

use platform_operators_storage::StorageError;

use crate::sourcer::SourceError;

pub use ensure::{BundleDeploymentEnsurer, EnsureOutcome};
pub use inspect::inspect_bundle_deployment;
pub use platform_operator::PlatformOperatorReconciler;
pub use status::{Outcome, synthesize};

/// What the controller should do after a successful pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileResult {
    pub requeue_after: Option<Duration>,
}

impl ReconcileResult {
    /// Nothing more to do until the next change event.
    pub fn done() -> Self {
        Self::default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Reading the PlatformOperator failed for a reason other than absence.
    #[error(transparent)]
    Fetch(StorageError),

    #[error("{}", sourcing_failure(.0))]
    Source(SourceError),

    #[error(transparent)]
    Install(StorageError),
}

/// Text reported for a failed package resolution, both as the pass error and
/// as the `SourceFailed` condition message.
pub(crate) fn sourcing_failure(err: &SourceError) -> String {
    format!("{err}: failed to run sourcing logic")
}

impl ReconcileError {
    pub fn is_source_failure(&self) -> bool {
        matches!(self, Self::Source(_))
    }
}
