//! CLI command implementations

pub mod blank;
pub mod grade;
pub mod history;
pub mod infer;
pub mod init;
pub mod meta;
pub mod show;

use anyhow::{Context as _, Result};
use gapfill_constraint::ValueMap;
use gapfill_core::DisplayId;
use gapfill_infer::BindingRegistry;
use gapfill_session::{FileStore, GapfillConfig, Session};
use std::path::PathBuf;

/// Settings shared by every command
pub struct Context {
    pub workspace: PathBuf,
    pub format: String,
    pub config: GapfillConfig,
}

impl Context {
    pub fn new(workspace: PathBuf, format: String, config: GapfillConfig) -> Self {
        Self {
            workspace,
            format,
            config,
        }
    }

    pub fn json(&self) -> bool {
        self.format == "json"
    }

    /// Bindings from `<workspace>/bindings/*.toml` plus the `[bindings]`
    /// config table, config entries winning
    pub fn registry(&self) -> Result<BindingRegistry> {
        let mut registry = BindingRegistry::load_from_directory(&self.workspace)?;
        registry.extend(self.config.bindings.clone())?;
        Ok(registry)
    }

    pub fn open(&self) -> Result<Session<FileStore>> {
        let store = FileStore::open(&self.workspace)?;
        let session = Session::open(store, self.registry()?, &self.config)
            .with_context(|| format!("Failed to open workspace {}", self.workspace.display()))?;
        Ok(session)
    }

    /// Open the workspace, run an edit, and save
    pub fn edit<T, F>(&self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Session<FileStore>) -> Result<T>,
    {
        let mut session = self.open()?;
        let value = edit(&mut session)?;
        session.close()?;
        Ok(value)
    }
}

pub fn parse_id(s: &str) -> Result<DisplayId> {
    Ok(DisplayId::new(s)?)
}

/// Parse `id=value` pairs. The value may itself contain `=`.
pub fn parse_values(pairs: &[String]) -> Result<ValueMap> {
    let mut values = ValueMap::new();
    for pair in pairs {
        let (id, value) = pair
            .split_once('=')
            .with_context(|| format!("expected id=value, got '{}'", pair))?;
        values.insert(parse_id(id.trim())?, value.to_string());
    }
    Ok(values)
}

/// Byte range of the `nth` (1-based) occurrence of `needle`
pub fn nth_occurrence(haystack: &str, needle: &str, nth: usize) -> Option<(usize, usize)> {
    if needle.is_empty() || nth == 0 {
        return None;
    }
    haystack
        .match_indices(needle)
        .nth(nth - 1)
        .map(|(start, m)| (start, start + m.len()))
}

pub fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values() {
        let values = parse_values(&["1=13".to_string(), "name=a==b".to_string()]).unwrap();
        assert_eq!(values[&DisplayId::from_number(1)], "13");
        assert_eq!(values[&DisplayId::new("name").unwrap()], "a==b");
    }

    #[test]
    fn test_parse_values_rejects_bad_pairs() {
        assert!(parse_values(&["13".to_string()]).is_err());
        assert!(parse_values(&["a-b=1".to_string()]).is_err());
    }

    #[test]
    fn test_nth_occurrence() {
        let text = "i = i + 1;";
        assert_eq!(nth_occurrence(text, "i", 1), Some((0, 1)));
        assert_eq!(nth_occurrence(text, "i", 2), Some((4, 5)));
        assert_eq!(nth_occurrence(text, "i", 3), None);
        assert_eq!(nth_occurrence(text, "i", 0), None);
        assert_eq!(nth_occurrence(text, "", 1), None);
    }
}
