//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `GAPFILL_HISTORY_DEPTH`, `GAPFILL_LOG`
//! 2. Project-local: `.gapfill/config.toml`
//! 3. Global: `~/.gapfill/config.toml`

use gapfill_core::{GapfillError, Result};
use gapfill_infer::BindingRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Snapshots kept before the oldest is dropped
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Typing pause that starts a new undo step
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            throttle_ms: default_throttle_ms(),
        }
    }
}

fn default_max_depth() -> usize {
    100
}
fn default_throttle_ms() -> u64 {
    750
}

/// Debounced write settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    500
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `full` or `compact`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "full".to_string()
}

/// Resolved configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapfillConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Raw identifier name -> semantic binding key
    #[serde(default)]
    pub bindings: BTreeMap<String, String>,
}

impl GapfillConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = GapfillConfig::default();

        // Layer 1: Global config (~/.gapfill/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        // Layer 2: Project-local config (.gapfill/config.toml)
        let local_path = PathBuf::from(".gapfill/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        // Layer 3: Environment variable overrides
        Self::apply_env_overrides(&mut config)?;

        Ok(config)
    }

    /// Load config from a specific file path only (for testing)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.history.throttle_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.persistence.debounce_ms)
    }

    /// Build the binding registry from the `[bindings]` table
    pub fn binding_registry(&self) -> Result<BindingRegistry> {
        let mut registry = BindingRegistry::new();
        registry.extend(self.bindings.clone())?;
        Ok(registry)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".gapfill").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<GapfillConfig> {
        let content = std::fs::read_to_string(path)?;
        let config: GapfillConfig = toml::from_str(&content).map_err(|e| {
            GapfillError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    fn merge_into(base: &mut GapfillConfig, overlay: GapfillConfig) {
        if overlay.history.max_depth != default_max_depth() {
            base.history.max_depth = overlay.history.max_depth;
        }
        if overlay.history.throttle_ms != default_throttle_ms() {
            base.history.throttle_ms = overlay.history.throttle_ms;
        }
        if overlay.persistence.debounce_ms != default_debounce_ms() {
            base.persistence.debounce_ms = overlay.persistence.debounce_ms;
        }
        if overlay.logging.level != default_log_level() {
            base.logging.level = overlay.logging.level;
        }
        if overlay.logging.format != default_log_format() {
            base.logging.format = overlay.logging.format;
        }
        base.bindings.extend(overlay.bindings);
    }

    fn apply_env_overrides(config: &mut GapfillConfig) -> Result<()> {
        if let Ok(depth) = std::env::var("GAPFILL_HISTORY_DEPTH") {
            config.history.max_depth = depth.parse().map_err(|_| {
                GapfillError::ConfigError(format!(
                    "GAPFILL_HISTORY_DEPTH must be a positive integer, got '{}'",
                    depth
                ))
            })?;
        }
        if let Ok(level) = std::env::var("GAPFILL_LOG") {
            config.logging.level = level;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_config(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gapfill_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_config_from_file() {
        let config_str = r#"
[history]
throttle_ms = 1200

[persistence]
debounce_ms = 250

[bindings]
i = "loop_counter"
"#;
        let path = temp_config(config_str);
        let config = GapfillConfig::load_from_file(&path).unwrap();

        assert_eq!(config.throttle(), Duration::from_millis(1200));
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.bindings.get("i").map(String::as_str), Some("loop_counter"));

        let registry = config.binding_registry().unwrap();
        assert_eq!(registry.key_for("i"), Some("loop_counter"));

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_env_var_override() {
        let path = temp_config("[logging]\nlevel = \"warn\"\n");

        std::env::set_var("GAPFILL_LOG", "trace");
        let config = GapfillConfig::load_from_file(&path).unwrap();
        assert_eq!(config.logging.level, "trace");
        std::env::remove_var("GAPFILL_LOG");

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_malformed_config() {
        let path = temp_config("[history\nmax_depth = 3");
        assert!(matches!(
            GapfillConfig::load_from_file(&path),
            Err(GapfillError::ConfigError(_))
        ));
        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_defaults() {
        let config = GapfillConfig::default();
        assert_eq!(config.history.max_depth, 100);
        assert_eq!(config.throttle(), Duration::from_millis(750));
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.logging.level, "info");
        assert!(config.bindings.is_empty());
    }

    #[test]
    fn test_merge_overlay() {
        let mut base = GapfillConfig::default();
        base.bindings.insert("i".to_string(), "counter".to_string());
        let mut overlay = GapfillConfig::default();
        overlay.history.max_depth = 10;
        overlay.bindings.insert("j".to_string(), "inner".to_string());

        GapfillConfig::merge_into(&mut base, overlay);
        assert_eq!(base.history.max_depth, 10);
        assert_eq!(base.history.throttle_ms, 750);
        assert_eq!(base.bindings.len(), 2);
    }
}
