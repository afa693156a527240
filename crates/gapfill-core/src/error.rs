//! Error types for Gapfill

use thiserror::Error;

/// The main error type for Gapfill operations
#[derive(Debug, Error)]
pub enum GapfillError {
    #[error("Invalid selection {start}..{end} for a template of {len} bytes")]
    InvalidSelection { start: usize, end: usize, len: usize },

    #[error("Selection is empty or whitespace-only")]
    EmptySelection,

    #[error("Selection overlaps placeholder __BLANK[{0}]__")]
    NestedPlaceholder(String),

    #[error("Invalid display id: {0:?}")]
    InvalidDisplayId(String),

    #[error("Blank not found: {0}")]
    BlankNotFound(String),

    #[error("Blank {0} already has a record")]
    RecordExists(String),

    #[error("Cannot rename blank {from} to {to}: {to} is already a different blank")]
    DisplayIdCollision { from: String, to: String },

    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("Inconsistent blank store: {0}")]
    InconsistentStore(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),

    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Result type alias for Gapfill operations
pub type Result<T> = std::result::Result<T, GapfillError>;

impl From<toml::de::Error> for GapfillError {
    fn from(err: toml::de::Error) -> Self {
        GapfillError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for GapfillError {
    fn from(err: toml::ser::Error) -> Self {
        GapfillError::TomlSerError(err.to_string())
    }
}

impl From<serde_json::Error> for GapfillError {
    fn from(err: serde_json::Error) -> Self {
        GapfillError::JsonError(err.to_string())
    }
}
