use platform_operators_core::api::{platform, rukpak};
use platform_operators_core::{Condition, ConditionStatus, find_status_condition};

/// BundleDeployment condition types that can report a failure, in the order
/// the installer progresses through them.
const FAILURE_CONDITION_TYPES: [&str; 3] = [
    rukpak::TYPE_UNPACKED,
    rukpak::TYPE_HAS_VALID_BUNDLE,
    rukpak::TYPE_INSTALLED,
];

/// Looks for a failure reported by a BundleDeployment.
///
/// Returns the `Installed=False` condition to publish on the owning
/// PlatformOperator, carrying the BundleDeployment's reason and message, or
/// `None` when no recognized condition reports a failure.
pub fn inspect_bundle_deployment(conditions: &[Condition]) -> Option<Condition> {
    FAILURE_CONDITION_TYPES
        .iter()
        .filter_map(|type_| find_status_condition(conditions, type_))
        .find(|c| !c.is_true())
        .map(|failed| {
            let reason = if failed.reason.is_empty() {
                platform::REASON_INSTALL_FAILED
            } else {
                failed.reason.as_str()
            };
            Condition::new(
                platform::TYPE_INSTALLED,
                ConditionStatus::False,
                reason,
                failed.message.clone(),
            )
        })
}
