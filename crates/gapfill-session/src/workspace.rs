//! Workspace - the authoring facade over a template store
//!
//! Every structural edit captures a snapshot first and pushes it onto the
//! history only when the edit succeeded and changed something. Description
//! typing is applied through a debounced pending edit and snapshotted once
//! per pause.

use crate::config::GapfillConfig;
use crate::debounce::Debouncer;
use crate::history::{History, Snapshot};
use gapfill_constraint::{
    evaluate, grade, is_identifier, BlankMetadata, Constraint, GradeItem, GradeReport, ValueMap,
};
use gapfill_core::{BlankUid, DisplayId, GapfillError, Result};
use gapfill_infer::{BindingRegistry, InferenceEngine};
use gapfill_template::{fill, BlankStore, PersistedState, TemplateDiff};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

/// A description edit not yet applied to the store
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEdit {
    pub display_id: DisplayId,
    pub description: String,
}

pub struct Workspace {
    store: BlankStore,
    registry: BindingRegistry,
    history: History,
    selection: Option<DisplayId>,
    pending_edit: Debouncer<MetadataEdit>,
    /// Blank whose description was typed into last
    last_typed: Option<DisplayId>,
    /// Bumped on every applied change
    revision: u64,
}

impl Workspace {
    /// Start a workspace over fresh template text
    pub fn new(template: impl Into<String>, registry: BindingRegistry, config: &GapfillConfig) -> Self {
        let history = History::new(config.history.max_depth, config.throttle());
        Self::from_parts(BlankStore::new(template), registry, history, None, config)
    }

    /// Reassemble a workspace from loaded parts
    pub fn from_parts(
        store: BlankStore,
        registry: BindingRegistry,
        mut history: History,
        selection: Option<DisplayId>,
        config: &GapfillConfig,
    ) -> Self {
        history.configure(config.history.max_depth, config.throttle());
        let selection = selection.filter(|id| store.contains_placeholder(id));
        Self {
            store,
            registry,
            history,
            selection,
            pending_edit: Debouncer::new(config.debounce()),
            last_typed: None,
            revision: 0,
        }
    }

    pub fn store(&self) -> &BlankStore {
        &self.store
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> Option<&DisplayId> {
        self.selection.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn pending_edit(&self) -> Option<&MetadataEdit> {
        self.pending_edit.pending()
    }

    pub fn persisted_state(&self) -> PersistedState {
        self.store.to_persisted()
    }

    /// Capture the current state
    pub fn snapshot(&self, description: &str) -> Snapshot {
        Snapshot {
            state: self.store.to_persisted(),
            selection: self.selection.clone(),
            description: description.to_string(),
        }
    }

    // --- structural edits ---

    /// Turn `start..end` of the template into a blank with an inferred
    /// constraint, and select it
    pub fn create_blank(&mut self, start: usize, end: usize) -> Result<DisplayId> {
        let id = self.apply("Create blank", |ws| {
            let id = ws.store.create_blank(start, end)?;
            ws.repropose(&id)?;
            Ok(id)
        })?;
        self.selection = Some(id.clone());
        Ok(id)
    }

    /// Restore a blank's reference answer into the text
    pub fn remove_blank(&mut self, id: &DisplayId) -> Result<bool> {
        let removed = self.apply("Remove blank", |ws| {
            let removed = ws.store.remove_blank(id)?;
            if removed {
                ws.repropose_all()?;
            }
            Ok(removed)
        })?;
        if removed && self.selection.as_ref() == Some(id) {
            self.selection = None;
        }
        Ok(removed)
    }

    /// Drop a blank's record, leaving the placeholder orphaned
    pub fn delete_blank_record(&mut self, id: &DisplayId) -> Result<Option<BlankMetadata>> {
        self.apply("Delete blank record", |ws| {
            let deleted = ws.store.delete_blank_record(id);
            if deleted.is_some() {
                ws.repropose_all()?;
            }
            Ok(deleted)
        })
    }

    /// Give an orphaned placeholder a new record with an inferred constraint
    pub fn attach_record(&mut self, id: &DisplayId, answer: impl Into<String>) -> Result<BlankUid> {
        let answer = answer.into();
        self.apply("Attach record", |ws| {
            let uid = ws.store.attach_record(id, BlankMetadata::new(answer))?;
            ws.repropose(id)?;
            Ok(uid)
        })
    }

    pub fn rename_blank(&mut self, old: &DisplayId, new: &DisplayId) -> Result<()> {
        self.apply("Rename blank", |ws| ws.store.rename_blank(old, new))?;
        if self.selection.as_ref() == Some(old) {
            self.selection = Some(new.clone());
        }
        Ok(())
    }

    /// Renumber blanks 1..N by first appearance. Returns the ids that changed.
    pub fn renumber(&mut self) -> Result<HashMap<DisplayId, DisplayId>> {
        let mapping = self.apply("Renumber blanks", |ws| Ok(ws.store.renumber_by_appearance()))?;
        if let Some(new) = self.selection.as_ref().and_then(|id| mapping.get(id)) {
            self.selection = Some(new.clone());
        }
        Ok(mapping)
    }

    /// Replace the template text after a direct edit
    pub fn set_template(&mut self, template: impl Into<String>) -> Result<TemplateDiff> {
        let template = template.into();
        let diff = self.apply("Edit template", |ws| {
            let diff = ws.store.set_template(template);
            if !diff.removed.is_empty() {
                ws.repropose_all()?;
            }
            Ok(diff)
        })?;
        if let Some(id) = &self.selection {
            if !self.store.contains_placeholder(id) {
                self.selection = None;
            }
        }
        Ok(diff)
    }

    // --- metadata edits ---

    /// Replace a blank's constraint by hand
    pub fn set_constraint(&mut self, id: &DisplayId, constraint: Constraint) -> Result<()> {
        self.apply("Set constraint", |ws| ws.store.set_constraint(id, constraint))
    }

    /// Drop an author override and fall back to inference
    pub fn clear_constraint_override(&mut self, id: &DisplayId) -> Result<()> {
        self.apply("Clear constraint override", |ws| {
            ws.store.update_metadata(id, |meta| meta.overridden = false)?;
            ws.repropose(id)
        })
    }

    /// Set or clear a blank's binding name. While the blank keeps an
    /// identifier answer, other blanks with the same answer infer the same
    /// binding.
    pub fn set_binding(&mut self, id: &DisplayId, binding: Option<String>) -> Result<()> {
        self.apply("Set binding", |ws| {
            ws.store.update_metadata(id, |meta| meta.binding = binding)?;
            ws.repropose_all()
        })
    }

    /// Change a blank's reference answer, re-inferring unless overridden
    pub fn set_answer(&mut self, id: &DisplayId, answer: impl Into<String>) -> Result<()> {
        let answer = answer.into();
        self.apply("Set answer", |ws| {
            ws.store.update_metadata(id, |meta| meta.answer = answer)?;
            ws.repropose(id)
        })
    }

    /// Record a keystroke in a blank's description.
    ///
    /// The text is applied when the debounce delay passes ([`Workspace::tick`])
    /// or when something forces a flush. One undo step covers each burst of
    /// typing.
    pub fn type_description(&mut self, id: &DisplayId, text: impl Into<String>, now: Instant) -> Result<()> {
        if self.store.uid_of(id).is_none() {
            return Err(GapfillError::BlankNotFound(id.to_string()));
        }
        if self.last_typed.as_ref() != Some(id) {
            self.flush()?;
            self.history.end_burst();
        }
        if self.history.throttle_open(now) {
            self.flush()?;
        }

        let snapshot = self.snapshot("Edit description");
        self.history.push_throttled(snapshot, now);
        self.pending_edit.schedule(
            MetadataEdit {
                display_id: id.clone(),
                description: text.into(),
            },
            now,
        );
        self.last_typed = Some(id.clone());
        Ok(())
    }

    /// Apply a pending description edit whose delay has passed
    pub fn tick(&mut self, now: Instant) -> Result<bool> {
        match self.pending_edit.poll(now) {
            Some(edit) => self.apply_edit(edit).map(|_| true),
            None => Ok(false),
        }
    }

    /// Apply a pending description edit right away
    pub fn flush(&mut self) -> Result<bool> {
        match self.pending_edit.flush() {
            Some(edit) => self.apply_edit(edit).map(|_| true),
            None => Ok(false),
        }
    }

    /// Switch the selected blank, first applying any pending edit
    pub fn select(&mut self, id: Option<DisplayId>) -> Result<()> {
        self.flush()?;
        if let Some(id) = &id {
            if !self.store.contains_placeholder(id) {
                return Err(GapfillError::BlankNotFound(id.to_string()));
            }
        }
        if self.selection != id {
            debug!("Selection: {:?} -> {:?}", self.selection, id);
            self.history.end_burst();
            self.last_typed = None;
            self.selection = id;
            self.revision += 1;
        }
        Ok(())
    }

    // --- history ---

    pub fn undo(&mut self) -> Result<bool> {
        self.flush()?;
        let current = self.snapshot("");
        match self.history.undo(current) {
            Some(snapshot) => {
                info!("Undo: {}", snapshot.description);
                self.restore(snapshot)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn redo(&mut self) -> Result<bool> {
        self.flush()?;
        let current = self.snapshot("");
        match self.history.redo(current) {
            Some(snapshot) => {
                info!("Redo: {}", snapshot.description);
                self.restore(snapshot)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // --- grading ---

    /// Grade submissions for every distinct blank in order of first
    /// appearance. Blanks without a value are graded as empty.
    pub fn grade(&self, values: &ValueMap) -> GradeReport {
        let blanks = self.store.blanks();
        grade(
            blanks.iter().map(|(id, meta)| GradeItem {
                display_id: id,
                metadata: *meta,
            }),
            values,
        )
    }

    /// Check one submission against one blank's constraint
    pub fn evaluate_blank(&self, id: &DisplayId, submitted: &str, values: &ValueMap) -> Result<bool> {
        let meta = self
            .store
            .metadata(id)
            .ok_or_else(|| GapfillError::BlankNotFound(id.to_string()))?;
        Ok(evaluate(&meta.constraint, submitted, values))
    }

    /// Template text with values substituted
    pub fn render(&self, values: &ValueMap) -> String {
        fill(self.store.template(), values)
    }

    /// The constraint inference would propose for a blank right now
    pub fn proposed_constraint(&self, id: &DisplayId) -> Result<Constraint> {
        let meta = self
            .store
            .metadata(id)
            .ok_or_else(|| GapfillError::BlankNotFound(id.to_string()))?;
        let registry = self.effective_registry()?;
        Ok(InferenceEngine::new(&registry).propose(meta))
    }

    /// The loaded registry plus the bindings authors set on blanks with an
    /// identifier answer. These live in blank metadata, so they persist and
    /// follow undo with the rest of the store.
    fn effective_registry(&self) -> Result<BindingRegistry> {
        let mut registry = self.registry.clone();
        for meta in self.store.blanks().into_iter().filter_map(|(_, meta)| meta) {
            let answer = meta.answer.trim();
            if let Some(key) = &meta.binding {
                if is_identifier(answer) {
                    registry.register(answer, key.as_str())?;
                }
            }
        }
        Ok(registry)
    }

    // --- internals ---

    /// Run a store edit as one undoable step. A failed edit leaves the
    /// store as it was; an edit that changed nothing pushes no snapshot.
    fn apply<T, F>(&mut self, description: &str, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.flush()?;
        let snapshot = self.snapshot(description);
        let before = self.store.clone();

        match edit(self) {
            Ok(value) => {
                if self.store != before {
                    self.history.push(snapshot);
                    self.revision += 1;
                }
                Ok(value)
            }
            Err(e) => {
                self.store = before;
                Err(e)
            }
        }
    }

    fn apply_edit(&mut self, edit: MetadataEdit) -> Result<()> {
        let description = if edit.description.is_empty() {
            None
        } else {
            Some(edit.description)
        };
        // The blank may have been renamed or dropped since the edit was typed
        if self.store.uid_of(&edit.display_id).is_none() {
            debug!("Dropping description edit for missing blank {}", edit.display_id);
            return Ok(());
        }
        self.store
            .update_metadata(&edit.display_id, |meta| meta.description = description)?;
        self.revision += 1;
        Ok(())
    }

    /// Replace a non-overridden constraint with a fresh proposal
    fn repropose(&mut self, id: &DisplayId) -> Result<()> {
        let proposed = self.proposed_constraint(id)?;
        self.store
            .update_metadata(id, |meta| meta.constraint = proposed)
    }

    /// Re-infer every blank that is not overridden
    fn repropose_all(&mut self) -> Result<()> {
        let registry = self.effective_registry()?;
        let engine = InferenceEngine::new(&registry);
        let proposals: Vec<(DisplayId, Constraint)> = self
            .store
            .blanks()
            .into_iter()
            .filter_map(|(id, meta)| meta.map(|meta| (id, engine.propose(meta))))
            .collect();
        for (id, proposed) in proposals {
            self.store
                .update_metadata(&id, |meta| meta.constraint = proposed)?;
        }
        Ok(())
    }

    fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        self.store = BlankStore::from_persisted(snapshot.state)?;
        self.selection = snapshot.selection;
        self.revision += 1;
        Ok(())
    }
}
