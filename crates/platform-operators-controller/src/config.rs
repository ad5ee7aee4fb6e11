use std::collections::BTreeMap;
use std::time::Duration;

use platform_operators_core::validate_name;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OperatorConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Package to bundle image table for the static sourcer
    #[serde(default)]
    pub sources: SourcesConfig,
    /// Objects seeded into the store at startup
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl OperatorConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Controller validations
        if self.controller.field_manager.trim().is_empty() {
            return Err("controller.field_manager must not be empty".into());
        }
        if self.controller.base_backoff_ms == 0 {
            return Err("controller.base_backoff_ms must be > 0".into());
        }
        if self.controller.base_backoff_ms > self.controller.max_backoff_ms {
            return Err("controller.base_backoff_ms must be <= controller.max_backoff_ms".into());
        }
        if self.controller.hook_timeout_secs == 0 {
            return Err("controller.hook_timeout_secs must be > 0".into());
        }
        if self.controller.event_buffer_capacity == 0 {
            return Err("controller.event_buffer_capacity must be > 0".into());
        }
        // Sources validation
        for (package, image) in &self.sources.packages {
            if image.trim().is_empty() {
                return Err(format!("sources.packages.{package} must name an image"));
            }
        }
        // Bootstrap validation
        for po in &self.bootstrap.platform_operators {
            validate_name(&po.name).map_err(|e| format!("bootstrap.platform_operators: {e}"))?;
            if po.package.trim().is_empty() {
                return Err(format!(
                    "bootstrap.platform_operators.{} requires a package",
                    po.name
                ));
            }
        }
        for cs in &self.bootstrap.catalog_sources {
            validate_name(&cs.name).map_err(|e| format!("bootstrap.catalog_sources: {e}"))?;
            validate_name(&cs.namespace)
                .map_err(|e| format!("bootstrap.catalog_sources namespace: {e}"))?;
        }
        Ok(())
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.controller.base_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.controller.max_backoff_ms)
    }

    pub fn hook_timeout(&self) -> Duration {
        Duration::from_secs(self.controller.hook_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Field manager recorded on PlatformOperator status patches
    #[serde(default = "default_field_manager")]
    pub field_manager: String,
    /// First retry delay after a failed reconcile; doubles per consecutive failure
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_hook_timeout_secs")]
    pub hook_timeout_secs: u64,
    /// Store events buffered per watcher; a watcher that falls further
    /// behind resyncs every PlatformOperator
    #[serde(default = "default_event_buffer_capacity")]
    pub event_buffer_capacity: usize,
}

fn default_field_manager() -> String {
    "platformoperator".into()
}
fn default_base_backoff_ms() -> u64 {
    5
}
fn default_max_backoff_ms() -> u64 {
    1000 * 60 * 16
}
fn default_hook_timeout_secs() -> u64 {
    30
}
fn default_event_buffer_capacity() -> usize {
    1024
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            field_manager: default_field_manager(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            hook_timeout_secs: default_hook_timeout_secs(),
            event_buffer_capacity: default_event_buffer_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourcesConfig {
    /// Package name -> bundle image reference
    #[serde(default)]
    pub packages: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub platform_operators: Vec<BootstrapPlatformOperator>,
    #[serde(default)]
    pub catalog_sources: Vec<BootstrapCatalogSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapPlatformOperator {
    pub name: String,
    pub package: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapCatalogSource {
    pub name: String,
    #[serde(default = "default_catalog_namespace")]
    pub namespace: String,
    pub image: String,
}

fn default_catalog_namespace() -> String {
    "openshift-marketplace".into()
}

pub mod loader {
    use super::OperatorConfig;
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    pub const DEFAULT_CONFIG_PATH: &str = "platform-operators.toml";

    pub fn load_config(path: Option<&str>) -> Result<OperatorConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., PLATFORM_OPERATORS__CONTROLLER__FIELD_MANAGER=po
        builder = builder.add_source(
            Environment::with_prefix("PLATFORM_OPERATORS")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: OperatorConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_with_default_path<P: AsRef<Path>>(
        path: Option<P>,
    ) -> Result<OperatorConfig, String> {
        let p = path
            .as_ref()
            .map(|p| p.as_ref().to_string_lossy().to_string());
        load_config(p.as_deref())
    }
}
