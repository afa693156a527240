//! Blank identities and display ids

use crate::error::{GapfillError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The permanent identity of a blank.
///
/// Minted once when a blank is created and never reused. Display ids may be
/// renamed or renumbered; the identity stays the same for the blank's
/// whole lifetime and is the join key for its metadata.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlankUid(Uuid);

impl BlankUid {
    /// Mint a fresh identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (for deserialization/testing)
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BlankUid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BlankUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlankUid({})", self.0)
    }
}

impl fmt::Display for BlankUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BlankUid {
    type Err = GapfillError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| GapfillError::ParseError(format!("Invalid blank uid '{}': {}", s, e)))
    }
}

/// The author-visible label carried by a placeholder token.
///
/// Matches `[0-9A-Za-z_]+`. Unique within a template at any instant, but
/// reused over time as blanks are removed and renumbered.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayId(String);

impl DisplayId {
    /// Create a display id, validating the token grammar
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if Self::is_valid(&id) {
            Ok(Self(id))
        } else {
            Err(GapfillError::InvalidDisplayId(id))
        }
    }

    /// The display id for a positive sequence number
    pub fn from_number(n: u64) -> Self {
        Self(n.to_string())
    }

    /// Check a raw string against the display id grammar
    pub fn is_valid(id: &str) -> bool {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of an all-digit id
    pub fn as_number(&self) -> Option<u64> {
        if self.0.chars().all(|c| c.is_ascii_digit()) {
            self.0.parse().ok()
        } else {
            None
        }
    }
}

impl Borrow<str> for DisplayId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DisplayId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DisplayId {
    type Error = GapfillError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<DisplayId> for String {
    fn from(id: DisplayId) -> Self {
        id.0
    }
}

impl FromStr for DisplayId {
    type Err = GapfillError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Debug for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayId({})", self.0)
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_uid_generation() {
        let a = BlankUid::new();
        let b = BlankUid::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_uid_parse_roundtrip() {
        let uid = BlankUid::new();
        let parsed: BlankUid = uid.to_string().parse().unwrap();
        assert_eq!(uid, parsed);
        assert!("not-a-uuid".parse::<BlankUid>().is_err());
    }

    #[test]
    fn test_display_id_grammar() {
        assert!(DisplayId::new("1").is_ok());
        assert!(DisplayId::new("loop_var2").is_ok());
        assert!(DisplayId::new("").is_err());
        assert!(DisplayId::new("a-b").is_err());
        assert!(DisplayId::new("]__").is_err());
    }

    #[test]
    fn test_display_id_number() {
        assert_eq!(DisplayId::from_number(7).as_str(), "7");
        assert_eq!(DisplayId::new("12").unwrap().as_number(), Some(12));
        assert_eq!(DisplayId::new("x1").unwrap().as_number(), None);
    }

    #[test]
    fn test_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(DisplayId::from_number(3), "counter");
        assert_eq!(map.get("3"), Some(&"counter"));
    }

    #[test]
    fn test_display_id_rejects_invalid_json() {
        let ok: DisplayId = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(ok.as_str(), "4");
        assert!(serde_json::from_str::<DisplayId>("\"a b\"").is_err());
    }
}
