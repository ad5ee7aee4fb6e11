//! Typed API kinds the controller reads and writes.
//!
//! - [`platform`]: `PlatformOperator`, the user-facing desired state
//! - [`rukpak`]: `BundleDeployment`, the generated child handed to the installer
//! - [`catalog`]: `CatalogSource`, watched only for change notifications

pub mod catalog;
pub mod platform;
pub mod rukpak;

pub use catalog::{CatalogSource, CatalogSourceSpec};
pub use platform::{
    ActiveBundleDeployment, Package, PlatformOperator, PlatformOperatorSpec,
    PlatformOperatorStatus,
};
pub use rukpak::{
    BundleDeployment, BundleDeploymentSpec, BundleDeploymentStatus, BundleSource, BundleSpec,
    BundleTemplate, ImageSource, SourceType, TemplateMeta,
};
