//! Debounced, content-addressed writes of a serialized value

use crate::debounce::Debouncer;
use crate::kv::KeyValueStore;
use gapfill_core::{ContentHash, GapfillError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Writes one key of a [`KeyValueStore`].
///
/// Values are serialized when scheduled, so a later schedule captures the
/// newer state and replaces the pending write. A write whose bytes hash the
/// same as the last stored bytes is skipped.
pub struct Persister<S> {
    store: S,
    key: String,
    debouncer: Debouncer<String>,
    last_hash: Option<ContentHash>,
}

impl<S: KeyValueStore> Persister<S> {
    pub fn new(store: S, key: impl Into<String>, delay: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            debouncer: Debouncer::new(delay),
            last_hash: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read and deserialize the stored value, if any
    pub fn load<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        let Some(bytes) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        let value = serde_json::from_slice(&bytes).map_err(|e| {
            GapfillError::PersistenceError(format!("Failed to parse '{}': {}", self.key, e))
        })?;
        self.last_hash = Some(ContentHash::from_bytes(&bytes));
        debug!("Loaded '{}' ({} bytes)", self.key, bytes.len());
        Ok(Some(value))
    }

    /// Serialize `value` now and schedule it for writing
    pub fn schedule<T: Serialize>(&mut self, value: &T, now: Instant) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        if self.debouncer.schedule(json, now).is_some() {
            debug!("Pending write of '{}' superseded", self.key);
        }
        Ok(())
    }

    /// Write the pending value if its delay has elapsed. Returns whether
    /// bytes reached the store.
    pub fn poll(&mut self, now: Instant) -> Result<bool> {
        match self.debouncer.poll(now) {
            Some(json) => self.write(&json),
            None => Ok(false),
        }
    }

    /// Write the pending value immediately
    pub fn flush(&mut self) -> Result<bool> {
        match self.debouncer.flush() {
            Some(json) => self.write(&json),
            None => Ok(false),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    fn write(&mut self, json: &str) -> Result<bool> {
        let hash = ContentHash::from_bytes(json.as_bytes());
        if self.last_hash == Some(hash) {
            debug!("Skipping write of '{}': content unchanged", self.key);
            return Ok(false);
        }
        self.store.put(&self.key, json.as_bytes())?;
        self.last_hash = Some(hash);
        info!("Saved '{}' ({})", self.key, hash);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        text: String,
    }

    fn doc(text: &str) -> Doc {
        Doc {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_debounced_write() {
        let mut p = Persister::new(MemoryStore::new(), "doc", Duration::from_millis(500));
        let t0 = Instant::now();

        p.schedule(&doc("a"), t0).unwrap();
        assert!(!p.poll(t0 + Duration::from_millis(100)).unwrap());
        p.schedule(&doc("ab"), t0 + Duration::from_millis(200)).unwrap();
        assert!(!p.poll(t0 + Duration::from_millis(600)).unwrap());
        assert!(p.poll(t0 + Duration::from_millis(700)).unwrap());

        assert_eq!(p.store().writes(), 1);
        assert_eq!(p.load::<Doc>().unwrap(), Some(doc("ab")));
    }

    #[test]
    fn test_unchanged_content_skipped() {
        let mut p = Persister::new(MemoryStore::new(), "doc", Duration::from_millis(500));
        let t0 = Instant::now();

        p.schedule(&doc("a"), t0).unwrap();
        assert!(p.flush().unwrap());
        p.schedule(&doc("a"), t0).unwrap();
        assert!(!p.flush().unwrap());
        assert_eq!(p.store().writes(), 1);
    }

    #[test]
    fn test_flush_without_pending() {
        let mut p = Persister::new(MemoryStore::new(), "doc", Duration::from_millis(500));
        assert!(!p.flush().unwrap());
        assert!(!p.is_pending());
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let mut store = MemoryStore::new();
        store.put("bad", b"not json").unwrap();

        let mut p = Persister::new(store, "doc", Duration::ZERO);
        assert_eq!(p.load::<Doc>().unwrap(), None);

        let mut p = Persister::new(p.store().clone(), "bad", Duration::ZERO);
        assert!(matches!(p.load::<Doc>(), Err(GapfillError::PersistenceError(_))));
    }
}
