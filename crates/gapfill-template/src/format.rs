//! Persisted state format
//!
//! Serializes to the shape
//! `{ template, counter, store: { uidByDisplay, metaByUid } }`.

use gapfill_constraint::BlankMetadata;
use gapfill_core::{BlankUid, DisplayId, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root structure of a persisted template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub template: String,
    #[serde(default)]
    pub counter: u64,
    #[serde(default)]
    pub store: PersistedStore,
}

/// The identity and metadata maps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedStore {
    #[serde(default)]
    pub uid_by_display: BTreeMap<DisplayId, BlankUid>,
    #[serde(default)]
    pub meta_by_uid: BTreeMap<BlankUid, BlankMetadata>,
}

impl PersistedState {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_persisted_shape() {
        let json = r#"{
            "template": "int x = __BLANK[1]__;",
            "counter": 1,
            "store": {
                "uidByDisplay": { "1": "67e55044-10b1-426f-9247-bb680e5fe0c8" },
                "metaByUid": {
                    "67e55044-10b1-426f-9247-bb680e5fe0c8": {
                        "answer": "5",
                        "description": "initial value",
                        "constraint": { "kind": "number" }
                    }
                }
            }
        }"#;

        let state = PersistedState::from_json(json).unwrap();
        assert_eq!(state.counter, 1);
        let uid = state.store.uid_by_display[&DisplayId::from_number(1)];
        let meta = &state.store.meta_by_uid[&uid];
        assert_eq!(meta.answer, "5");
        assert_eq!(meta.description.as_deref(), Some("initial value"));
        assert!(!meta.overridden);
    }

    #[test]
    fn test_minimal_state() {
        let state = PersistedState::from_json(r#"{"template": "plain"}"#).unwrap();
        assert_eq!(state.counter, 0);
        assert!(state.store.uid_by_display.is_empty());
    }

    #[test]
    fn test_json_keys() {
        let state = PersistedState {
            template: String::new(),
            counter: 0,
            store: PersistedStore::default(),
        };
        let value: serde_json::Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();
        assert!(value["store"].get("uidByDisplay").is_some());
        assert!(value["store"].get("metaByUid").is_some());
    }
}
