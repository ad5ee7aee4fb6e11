//! Core API types for the platform operators controller.
//!
//! - [`api`]: typed `PlatformOperator`, `BundleDeployment` and `CatalogSource` kinds
//! - [`condition`]: status condition helpers
//! - [`events`]: change events, hooks and dispatch
//! - [`meta`]: object metadata and the [`Resource`] trait

pub mod api;
pub mod condition;
pub mod error;
pub mod events;
pub mod id;
pub mod meta;
pub mod time;

pub use condition::{
    Condition, ConditionStatus, find_status_condition, is_status_condition_false,
    is_status_condition_true, set_status_condition,
};
pub use error::{CoreError, Result};
pub use id::{generate_uid, validate_name};
pub use meta::{ManagedFieldsEntry, ObjectMeta, OwnerReference, Resource, TypeMeta};
pub use time::{Time, now};
