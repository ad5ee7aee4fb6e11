//! Object names and UIDs.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CoreError, Result};

/// Maximum length of a DNS-1123 subdomain.
const MAX_NAME_LENGTH: usize = 253;

fn subdomain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
            .expect("static regex is valid")
    })
}

/// Generate a fresh object UID.
pub fn generate_uid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Validate that `name` is a DNS-1123 subdomain, which is what every object
/// name handled by this controller must be.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CoreError::invalid_name(name, "must not be empty"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(CoreError::invalid_name(
            name,
            format!("must be no more than {MAX_NAME_LENGTH} characters"),
        ));
    }
    if !subdomain_regex().is_match(name) {
        return Err(CoreError::invalid_name(
            name,
            "must consist of lower case alphanumeric characters, '-' or '.'",
        ));
    }
    Ok(())
}
