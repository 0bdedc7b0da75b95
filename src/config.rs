//! Build-time switches and runtime configuration for tensorview
//!
//! Bounds checking and the read-only escape hatch are fixed when the crate is
//! compiled. The runtime configuration only controls presentation and reports
//! the build switches back for diagnostics.

use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::TensorResult;

/// Whether shape evaluation, slicing and linear access validate their
/// arguments. On in debug builds and whenever the `bounds-check` feature is
/// enabled; compiled out otherwise.
pub const BOUNDS_CHECKING: bool = cfg!(any(debug_assertions, feature = "bounds-check"));

/// Whether read-only views may be turned into mutable ones
/// (`always-mutable` feature).
pub const ALWAYS_MUTABLE: bool = cfg!(feature = "always-mutable");

/// Report of the build-time safety switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub bounds_checking: bool,
    pub always_mutable: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            bounds_checking: BOUNDS_CHECKING,
            always_mutable: ALWAYS_MUTABLE,
        }
    }
}

impl SafetyConfig {
    fn is_build(&self) -> bool {
        *self == SafetyConfig::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Elements printed before the rest is elided
    pub max_elements: usize,
    /// Digits after the decimal point, `None` for the element's own format
    pub precision: Option<usize>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_elements: 64,
            precision: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TensorConfig {
    pub safety: SafetyConfig,
    pub display: DisplayConfig,
}

impl TensorConfig {
    pub fn from_json(content: &str) -> TensorResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> TensorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replaces the safety section with what this build actually does.
    fn pin_safety(&mut self) {
        if !self.safety.is_build() {
            tracing::warn!(
                requested = ?self.safety,
                "safety switches are fixed at build time; ignoring requested values"
            );
            self.safety = SafetyConfig::default();
        }
    }
}

/// Configuration manager
#[derive(Debug, Default)]
pub struct ConfigManager {
    config: RwLock<TensorConfig>,
    config_file: Option<PathBuf>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file(&mut self, path: &Path) -> TensorResult<()> {
        let content = std::fs::read_to_string(path)?;
        let mut config = TensorConfig::from_json(&content)?;
        config.pin_safety();

        *self.config.write() = config;
        self.config_file = Some(path.to_path_buf());

        tracing::info!("Configuration loaded from {:?}", path);
        Ok(())
    }

    pub fn save_to_file(&self, path: &Path) -> TensorResult<()> {
        let content = self.config.read().to_json()?;
        std::fs::write(path, content)?;

        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    pub fn get_config(&self) -> TensorConfig {
        self.config.read().clone()
    }

    pub fn update_config<F>(&mut self, f: F) -> TensorResult<()>
    where
        F: FnOnce(&mut TensorConfig),
    {
        {
            let mut config = self.config.write();
            f(&mut config);
            config.pin_safety();
        }

        if let Some(ref path) = self.config_file {
            self.save_to_file(path)?;
        }

        Ok(())
    }
}

lazy_static! {
    static ref CONFIG_MANAGER: RwLock<ConfigManager> = RwLock::new(ConfigManager::new());
}

/// Get the global configuration
pub fn get_config() -> TensorConfig {
    CONFIG_MANAGER.read().get_config()
}

/// Display settings of the global configuration
pub(crate) fn display_config() -> DisplayConfig {
    CONFIG_MANAGER.read().config.read().display.clone()
}

/// Update the global configuration
pub fn update_config<F>(f: F) -> TensorResult<()>
where
    F: FnOnce(&mut TensorConfig),
{
    CONFIG_MANAGER.write().update_config(f)
}

/// Load the global configuration from a JSON file
pub fn load_config_from_file(path: &Path) -> TensorResult<()> {
    CONFIG_MANAGER.write().load_from_file(path)
}

/// Create a configuration builder for easy setup
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: TensorConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(mut self, f: impl FnOnce(&mut DisplayConfig)) -> Self {
        f(&mut self.config.display);
        self
    }

    pub fn build(self) -> TensorConfig {
        self.config
    }

    pub fn apply(self) -> TensorResult<()> {
        update_config(|config| *config = self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .display(|d| {
                d.max_elements = 8;
                d.precision = Some(2);
            })
            .build();

        assert_eq!(config.display.max_elements, 8);
        assert_eq!(config.display.precision, Some(2));
        assert_eq!(config.safety, SafetyConfig::default());
    }

    #[test]
    fn test_safety_reports_build() {
        let safety = SafetyConfig::default();
        assert_eq!(safety.bounds_checking, BOUNDS_CHECKING);
        assert_eq!(safety.always_mutable, ALWAYS_MUTABLE);
        #[cfg(debug_assertions)]
        assert!(safety.bounds_checking);
    }

    #[test]
    fn test_config_manager_pins_safety() {
        let mut manager = ConfigManager::new();
        manager
            .update_config(|c| {
                c.safety.bounds_checking = !BOUNDS_CHECKING;
                c.display.max_elements = 3;
            })
            .unwrap();

        let config = manager.get_config();
        assert_eq!(config.safety.bounds_checking, BOUNDS_CHECKING);
        assert_eq!(config.display.max_elements, 3);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = TensorConfig::from_json(r#"{ "display": { "precision": 3 } }"#).unwrap();
        assert_eq!(config.display.precision, Some(3));
        assert_eq!(config.display.max_elements, 64);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("tensorview_config.json");

        let mut writer = ConfigManager::new();
        writer.update_config(|c| c.display.max_elements = 12).unwrap();
        writer.save_to_file(&config_path).unwrap();

        let mut manager = ConfigManager::new();
        manager.load_from_file(&config_path).unwrap();

        assert_eq!(manager.get_config().display.max_elements, 12);
        assert_eq!(manager.config_file(), Some(config_path.as_path()));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempdir().unwrap();
        let mut manager = ConfigManager::new();
        let err = manager
            .load_from_file(&temp_dir.path().join("missing.json"))
            .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::Config);
    }
}
