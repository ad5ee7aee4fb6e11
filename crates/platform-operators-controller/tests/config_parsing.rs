use std::{env, fs};

use platform_operators_controller::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("platform-operators.toml");

    let toml_content = r#"
[logging]
level = "debug"

[controller]
field_manager = "platformoperator"
base_backoff_ms = 10
max_backoff_ms = 60000

[sources.packages]
openshift-cert-manager-operator = "quay.io/bundles/cert-manager:v1.10.0"

[[bootstrap.platform_operators]]
name = "cert-manager"
package = "openshift-cert-manager-operator"

[[bootstrap.catalog_sources]]
name = "redhat-operators"
image = "registry.redhat.io/redhat/redhat-operator-index:v4.12"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.controller.base_backoff_ms, 10);
    assert_eq!(cfg.controller.hook_timeout_secs, 30);
    assert_eq!(
        cfg.sources.packages.get("openshift-cert-manager-operator").map(String::as_str),
        Some("quay.io/bundles/cert-manager:v1.10.0")
    );
    assert_eq!(cfg.bootstrap.platform_operators.len(), 1);
    assert_eq!(cfg.bootstrap.catalog_sources[0].namespace, "openshift-marketplace");

    // 2) Env override should win over file
    unsafe {
        env::set_var("PLATFORM_OPERATORS__CONTROLLER__FIELD_MANAGER", "po-controller");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.controller.field_manager, "po-controller");
    unsafe {
        env::remove_var("PLATFORM_OPERATORS__CONTROLLER__FIELD_MANAGER");
    }

    // 3) Validation rejects an inverted backoff range
    let bad = r#"
[controller]
base_backoff_ms = 1000
max_backoff_ms = 10
"#;
    let bad_path = dir.path().join("bad.toml");
    fs::write(&bad_path, bad).expect("write bad toml");
    let err = load_config(bad_path.to_str()).expect_err("inverted backoff must fail");
    assert!(err.contains("base_backoff_ms"), "unexpected error: {err}");

    // 4) A missing file falls back to defaults
    let missing = dir.path().join("absent.toml");
    let cfg_default = load_config(missing.to_str()).expect("defaults are valid");
    assert_eq!(cfg_default.controller.field_manager, "platformoperator");
    assert!(cfg_default.bootstrap.platform_operators.is_empty());
}
