//! Undo/redo history of whole-workspace snapshots

use gapfill_core::DisplayId;
use gapfill_template::PersistedState;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// The workspace as it was before an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: PersistedState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<DisplayId>,
    /// The operation that followed this snapshot
    #[serde(default)]
    pub description: String,
}

/// Undo/redo stacks with bounded depth.
///
/// Structural edits push a snapshot every time. Continuous edits such as
/// typing a description go through [`History::push_throttled`], which
/// pushes once per pause in the edit stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    undo: Vec<Snapshot>,
    #[serde(default)]
    redo: Vec<Snapshot>,
    #[serde(skip, default = "default_max_depth")]
    max_depth: usize,
    #[serde(skip, default = "default_throttle")]
    throttle: Duration,
    #[serde(skip)]
    last_edit: Option<Instant>,
}

fn default_max_depth() -> usize {
    100
}

fn default_throttle() -> Duration {
    Duration::from_millis(750)
}

impl Default for History {
    fn default() -> Self {
        Self::new(default_max_depth(), default_throttle())
    }
}

impl History {
    pub fn new(max_depth: usize, throttle: Duration) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_depth: max_depth.max(1),
            throttle,
            last_edit: None,
        }
    }

    /// Apply limits to a history loaded from disk
    pub fn configure(&mut self, max_depth: usize, throttle: Duration) {
        self.max_depth = max_depth.max(1);
        self.throttle = throttle;
        self.trim();
    }

    /// Push a snapshot taken before an operation (clears redo)
    pub fn push(&mut self, snapshot: Snapshot) {
        debug!("History push: {}", snapshot.description);
        self.undo.push(snapshot);
        self.redo.clear();
        self.last_edit = None;
        self.trim();
    }

    /// Whether an edit at `now` would start a new undo step
    pub fn throttle_open(&self, now: Instant) -> bool {
        self.last_edit
            .map_or(true, |last| now.saturating_duration_since(last) >= self.throttle)
    }

    /// Close the current typing burst so the next throttled edit starts a
    /// new undo step
    pub fn end_burst(&mut self) {
        self.last_edit = None;
    }

    /// Push only if the edit stream paused for at least the throttle
    /// window. Redo is cleared either way. Returns whether a snapshot was
    /// pushed.
    pub fn push_throttled(&mut self, snapshot: Snapshot, now: Instant) -> bool {
        let open = self.throttle_open(now);
        if open {
            self.push(snapshot);
        } else {
            self.redo.clear();
        }
        self.last_edit = Some(now);
        open
    }

    /// Step back. `current` is the live state, kept for redo; returns the
    /// snapshot to restore.
    pub fn undo(&mut self, mut current: Snapshot) -> Option<Snapshot> {
        let snapshot = self.undo.pop()?;
        current.description = snapshot.description.clone();
        self.redo.push(current);
        self.last_edit = None;
        Some(snapshot)
    }

    /// Step forward again. `current` is the live state, kept for undo.
    pub fn redo(&mut self, mut current: Snapshot) -> Option<Snapshot> {
        let snapshot = self.redo.pop()?;
        current.description = snapshot.description.clone();
        self.undo.push(current);
        self.last_edit = None;
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo.last().map(|s| s.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo.last().map(|s| s.description.as_str())
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.last_edit = None;
    }

    fn trim(&mut self) {
        if self.undo.len() > self.max_depth {
            let excess = self.undo.len() - self.max_depth;
            self.undo.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(template: &str, description: &str) -> Snapshot {
        Snapshot {
            state: PersistedState {
                template: template.to_string(),
                counter: 0,
                store: Default::default(),
            },
            selection: None,
            description: description.to_string(),
        }
    }

    #[test]
    fn test_push_undo_redo() {
        let mut history = History::default();
        history.push(snap("a", "first"));
        assert!(history.can_undo());
        assert!(!history.can_redo());

        let restored = history.undo(snap("b", "")).unwrap();
        assert_eq!(restored.state.template, "a");
        assert_eq!(history.redo_description(), Some("first"));

        let replayed = history.redo(snap("a", "")).unwrap();
        assert_eq!(replayed.state.template, "b");
        assert_eq!(history.undo_description(), Some("first"));
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = History::default();
        history.push(snap("a", "one"));
        history.undo(snap("b", ""));
        assert!(history.can_redo());

        history.push(snap("a", "two"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_stacks() {
        let mut history = History::default();
        assert!(history.undo(snap("x", "")).is_none());
        assert!(history.redo(snap("x", "")).is_none());
    }

    #[test]
    fn test_max_depth() {
        let mut history = History::new(3, Duration::from_millis(750));
        for i in 0..5 {
            history.push(snap(&i.to_string(), "edit"));
        }
        assert_eq!(history.undo_depth(), 3);

        let oldest = (0..3).filter_map(|_| history.undo(snap("now", ""))).last().unwrap();
        assert_eq!(oldest.state.template, "2");
    }

    #[test]
    fn test_throttle_one_step_per_pause() {
        let mut history = History::new(100, Duration::from_millis(750));
        let t0 = Instant::now();

        assert!(history.push_throttled(snap("", "type"), t0));
        assert!(!history.push_throttled(snap("h", "type"), t0 + Duration::from_millis(200)));
        assert!(!history.push_throttled(snap("he", "type"), t0 + Duration::from_millis(600)));
        // The window is measured from the latest keystroke
        assert!(!history.push_throttled(snap("hel", "type"), t0 + Duration::from_millis(1200)));
        assert!(history.push_throttled(snap("hell", "type"), t0 + Duration::from_millis(2000)));

        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_throttled_edit_clears_redo() {
        let mut history = History::default();
        let t0 = Instant::now();
        history.push_throttled(snap("a", "type"), t0);
        history.undo(snap("b", ""));
        assert!(history.can_redo());

        history.push_throttled(snap("a", "type"), t0 + Duration::from_millis(10));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_structural_push_ends_typing_burst() {
        let mut history = History::default();
        let t0 = Instant::now();
        history.push_throttled(snap("a", "type"), t0);
        history.push(snap("b", "rename"));
        assert!(history.throttle_open(t0 + Duration::from_millis(1)));
    }

    #[test]
    fn test_end_burst_opens_throttle() {
        let mut history = History::default();
        let t0 = Instant::now();
        history.push_throttled(snap("a", "type"), t0);
        assert!(!history.throttle_open(t0 + Duration::from_millis(100)));

        history.end_burst();
        assert!(history.push_throttled(snap("b", "type"), t0 + Duration::from_millis(100)));
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_serde_keeps_stacks() {
        let mut history = History::new(5, Duration::from_millis(10));
        history.push(snap("a", "create"));
        let json = serde_json::to_string(&history).unwrap();
        let mut loaded: History = serde_json::from_str(&json).unwrap();
        loaded.configure(5, Duration::from_millis(10));
        assert_eq!(loaded.undo_depth(), 1);
        assert_eq!(loaded.undo_description(), Some("create"));
    }
}
