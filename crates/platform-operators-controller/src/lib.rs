//! Controller that installs platform operators.
//!
//! Each PlatformOperator names an operator package. The controller resolves
//! the package to a bundle image, creates a BundleDeployment that installs
//! it and reports progress through the PlatformOperator's `Installed`
//! condition. Changes to PlatformOperators, their BundleDeployments and
//! CatalogSources all trigger reconciliation.

pub mod applier;
pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod manager;
pub mod observability;
pub mod queue;
pub mod reconcile;
pub mod sourcer;
pub mod watches;

pub use config::OperatorConfig;
pub use controller::{Backoff, Controller};
pub use manager::{ManagerError, OperatorBuilder, OperatorManager};
pub use observability::init_tracing;
pub use queue::{QueueReceiver, Request, WorkQueue, work_queue};
pub use reconcile::{PlatformOperatorReconciler, ReconcileError, ReconcileResult};
pub use sourcer::{DynSourcer, SourceError, SourcedBundle, Sourcer, StaticSourcer};
