//! Binding registry for known identifier names

use gapfill_constraint::is_identifier;
use gapfill_core::{GapfillError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

/// TOML file format for binding definitions
///
/// ```toml
/// [bindings]
/// i = "loop_counter"
/// ledPin = "led_pin"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct BindingFile {
    #[serde(default)]
    pub bindings: BTreeMap<String, String>,
}

/// Project-wide lookup from raw identifier names to semantic binding keys.
///
/// Only consulted by inference; grading never needs it.
#[derive(Debug, Clone, Default)]
pub struct BindingRegistry {
    bindings: HashMap<String, String>,
}

impl BindingRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load bindings from a directory of TOML files
    ///
    /// Expects `path/bindings/*.toml` files
    pub fn load_from_directory<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut registry = Self::new();
        let bindings_path = path.as_ref().join("bindings");

        if bindings_path.exists() {
            for entry in fs::read_dir(&bindings_path)? {
                let entry = entry?;
                let file_path = entry.path();
                if file_path.extension().map(|e| e == "toml").unwrap_or(false) {
                    registry.load_file(&file_path)?;
                }
            }
        }

        Ok(registry)
    }

    /// Load bindings from a TOML file
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let content = fs::read_to_string(path)?;
        self.load_string(&content)
    }

    /// Load bindings from a TOML string
    pub fn load_string(&mut self, content: &str) -> Result<()> {
        let file: BindingFile = toml::from_str(content).map_err(|e| {
            GapfillError::ConfigError(format!("Failed to parse bindings TOML: {}", e))
        })?;

        for (name, key) in file.bindings {
            self.register(name, key)?;
        }

        Ok(())
    }

    /// Register a raw identifier name under a semantic key.
    /// A later registration of the same name replaces the earlier one.
    pub fn register(&mut self, name: impl Into<String>, key: impl Into<String>) -> Result<()> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(GapfillError::ConfigError(format!(
                "Binding name '{}' is not an identifier",
                name
            )));
        }
        let key = key.into();
        debug!("Binding '{}' -> '{}'", name, key);
        self.bindings.insert(name, key);
        Ok(())
    }

    /// Register every entry of a map, e.g. the `[bindings]` config table
    pub fn extend<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, key) in entries {
            self.register(name, key)?;
        }
        Ok(())
    }

    /// The semantic key for a raw identifier name
    pub fn key_for(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    /// Get the number of registered names
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toml() -> &'static str {
        r#"
[bindings]
i = "loop_counter"
ledPin = "led_pin"
"#
    }

    #[test]
    fn test_load_from_string() {
        let mut registry = BindingRegistry::new();
        registry.load_string(sample_toml()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.key_for("i"), Some("loop_counter"));
        assert_eq!(registry.key_for("j"), None);
    }

    #[test]
    fn test_rejects_non_identifier_names() {
        let mut registry = BindingRegistry::new();
        let result = registry.load_string("[bindings]\n\"a.b\" = \"x\"\n");
        assert!(matches!(result, Err(GapfillError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let mut registry = BindingRegistry::new();
        assert!(registry.load_string("[bindings\n").is_err());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = BindingRegistry::new();
        registry.register("ledPin", "led").unwrap();
        registry.register("ledPin", "output_pin").unwrap();
        assert_eq!(registry.key_for("ledPin"), Some("output_pin"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = std::env::temp_dir().join(format!("gapfill_bindings_test_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(dir.join("bindings")).unwrap();
        fs::write(dir.join("bindings").join("arduino.toml"), sample_toml()).unwrap();
        fs::write(dir.join("bindings").join("notes.txt"), "ignored").unwrap();

        let registry = BindingRegistry::load_from_directory(&dir).unwrap();
        assert_eq!(registry.len(), 2);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = std::env::temp_dir().join(format!("gapfill_missing_{}", uuid::Uuid::new_v4()));
        let registry = BindingRegistry::load_from_directory(&dir).unwrap();
        assert!(registry.is_empty());
    }
}
