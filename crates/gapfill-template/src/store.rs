//! BlankStore - template text plus the display id <-> identity map

use crate::format::{PersistedState, PersistedStore};
use crate::placeholder::{
    distinct_placeholders, placeholder_spans, placeholder_token, remap_placeholders,
    replace_placeholder,
};
use bimap::BiMap;
use gapfill_constraint::{BlankMetadata, Constraint};
use gapfill_core::{BlankUid, DisplayId, GapfillError, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Result of replacing the template text wholesale
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDiff {
    /// Placeholders in the new text that have no record
    pub added: Vec<DisplayId>,
    /// Records dropped because their placeholder disappeared
    pub removed: Vec<DisplayId>,
}

impl TemplateDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// The template store
///
/// Owns:
/// - The template text
/// - Display id allocation
/// - Bidirectional mapping: DisplayId <-> BlankUid
/// - Blank metadata keyed by identity
///
/// Invariant: every mapped display id appears in the text, and every
/// identity has exactly one display id. Placeholders without a record
/// (orphans) are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlankStore {
    template: String,
    /// Number of identities ever minted
    counter: u64,
    uid_by_display: BiMap<DisplayId, BlankUid>,
    meta_by_uid: HashMap<BlankUid, BlankMetadata>,
}

impl BlankStore {
    /// Create a store over template text. Any placeholders already in the
    /// text start out as orphans.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Number of blanks with a record
    pub fn len(&self) -> usize {
        self.uid_by_display.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uid_by_display.is_empty()
    }

    pub fn uid_of(&self, id: &DisplayId) -> Option<BlankUid> {
        self.uid_by_display.get_by_left(id).copied()
    }

    pub fn display_of(&self, uid: BlankUid) -> Option<&DisplayId> {
        self.uid_by_display.get_by_right(&uid)
    }

    pub fn metadata(&self, id: &DisplayId) -> Option<&BlankMetadata> {
        let uid = self.uid_by_display.get_by_left(id)?;
        self.meta_by_uid.get(uid)
    }

    pub fn metadata_by_uid(&self, uid: BlankUid) -> Option<&BlankMetadata> {
        self.meta_by_uid.get(&uid)
    }

    /// Edit a blank's metadata in place
    pub fn update_metadata<F>(&mut self, id: &DisplayId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut BlankMetadata),
    {
        let uid = self
            .uid_by_display
            .get_by_left(id)
            .ok_or_else(|| GapfillError::BlankNotFound(id.to_string()))?;
        let meta = self
            .meta_by_uid
            .get_mut(uid)
            .ok_or_else(|| GapfillError::InconsistentStore(format!("no metadata for {}", uid)))?;
        edit(meta);
        Ok(())
    }

    /// Distinct placeholders in order of first appearance, with their
    /// records (orphans have none)
    pub fn blanks(&self) -> Vec<(DisplayId, Option<&BlankMetadata>)> {
        distinct_placeholders(&self.template)
            .into_iter()
            .map(|id| {
                let meta = self.metadata(&id);
                (id, meta)
            })
            .collect()
    }

    /// Placeholders in the text that have no record
    pub fn orphans(&self) -> Vec<DisplayId> {
        distinct_placeholders(&self.template)
            .into_iter()
            .filter(|id| !self.uid_by_display.contains_left(id))
            .collect()
    }

    /// Whether the template text contains a placeholder for this id
    pub fn contains_placeholder(&self, id: &DisplayId) -> bool {
        placeholder_spans(&self.template)
            .iter()
            .any(|span| &span.id == id)
    }

    /// The smallest positive integer id not used in the text or the map
    pub fn next_display_id(&self) -> DisplayId {
        let used: HashSet<DisplayId> = distinct_placeholders(&self.template)
            .into_iter()
            .chain(self.uid_by_display.left_values().cloned())
            .collect();

        (1..)
            .map(DisplayId::from_number)
            .find(|id| !used.contains(id))
            .unwrap_or_else(|| DisplayId::from_number(u64::MAX))
    }

    /// Turn the byte range `start..end` of the template into a blank.
    ///
    /// The selected text becomes the blank's reference answer. Fails
    /// without touching the store if the selection is out of range,
    /// empty or whitespace-only, or overlaps an existing placeholder.
    pub fn create_blank(&mut self, start: usize, end: usize) -> Result<DisplayId> {
        if start > end
            || end > self.template.len()
            || !self.template.is_char_boundary(start)
            || !self.template.is_char_boundary(end)
        {
            return Err(GapfillError::InvalidSelection {
                start,
                end,
                len: self.template.len(),
            });
        }

        let selected = &self.template[start..end];
        if selected.trim().is_empty() {
            return Err(GapfillError::EmptySelection);
        }

        if let Some(span) = placeholder_spans(&self.template)
            .into_iter()
            .find(|span| span.range.start < end && start < span.range.end)
        {
            return Err(GapfillError::NestedPlaceholder(span.id.to_string()));
        }

        let answer = selected.to_string();
        let id = self.next_display_id();
        let token = placeholder_token(&id);

        // The new token must scan back as itself; neighbouring text could
        // otherwise fuse with it into a different placeholder.
        let mut candidate = self.template.clone();
        candidate.replace_range(start..end, &token);
        let spans = placeholder_spans(&candidate);
        let intact = spans.len() == placeholder_spans(&self.template).len() + 1
            && spans
                .iter()
                .any(|span| span.id == id && span.range == (start..start + token.len()));
        if !intact {
            warn!("Blank at {}..{} would merge with surrounding text", start, end);
            return Err(GapfillError::InvalidSelection {
                start,
                end,
                len: self.template.len(),
            });
        }

        let uid = BlankUid::new();
        self.template = candidate;
        self.uid_by_display.insert(id.clone(), uid);
        self.meta_by_uid.insert(uid, BlankMetadata::new(answer));
        self.counter += 1;

        info!("Created blank {} ({})", id, uid);
        Ok(id)
    }

    /// Inline a blank's reference answer back into the text and drop its
    /// record. Returns false if the placeholder is not in the text.
    pub fn remove_blank(&mut self, id: &DisplayId) -> Result<bool> {
        if !self.contains_placeholder(id) {
            debug!("Remove blank {}: placeholder absent", id);
            return Ok(false);
        }

        let uid = self
            .uid_by_display
            .get_by_left(id)
            .copied()
            .ok_or_else(|| GapfillError::BlankNotFound(id.to_string()))?;
        let answer = self
            .meta_by_uid
            .get(&uid)
            .map(|meta| meta.answer.clone())
            .ok_or_else(|| GapfillError::InconsistentStore(format!("no metadata for {}", uid)))?;

        self.template = replace_placeholder(&self.template, id, &answer);
        self.uid_by_display.remove_by_left(id);
        self.meta_by_uid.remove(&uid);
        self.detach_references(id);

        info!("Removed blank {} ({})", id, uid);
        Ok(true)
    }

    /// Drop a blank's identity and metadata, leaving its placeholder
    /// orphaned in the text.
    pub fn delete_blank_record(&mut self, id: &DisplayId) -> Option<BlankMetadata> {
        let (_, uid) = self.uid_by_display.remove_by_left(id)?;
        info!("Deleted record for blank {} ({})", id, uid);
        let meta = self.meta_by_uid.remove(&uid);
        self.detach_references(id);
        meta
    }

    /// Reset same-as rules that pointed at a dropped record back to the
    /// plain answer rule. A reference follows the identity it was set
    /// against, so it must not resolve to whatever takes the id next.
    fn detach_references(&mut self, dropped: &DisplayId) {
        let mut detached = Vec::new();
        for (id, uid) in self.uid_by_display.iter() {
            let Some(meta) = self.meta_by_uid.get_mut(uid) else {
                continue;
            };
            if meta.constraint.reference() == Some(dropped) {
                meta.constraint = Constraint::expression(meta.answer.trim());
                meta.overridden = false;
                detached.push(id.clone());
            }
        }
        detached.sort();
        for id in &detached {
            warn!("Blank {} referred to dropped blank {}; rule cleared", id, dropped);
        }
    }

    /// Give an orphaned placeholder a fresh identity and record
    pub fn attach_record(&mut self, id: &DisplayId, metadata: BlankMetadata) -> Result<BlankUid> {
        if self.uid_by_display.contains_left(id) {
            return Err(GapfillError::RecordExists(id.to_string()));
        }
        if !self.contains_placeholder(id) {
            return Err(GapfillError::BlankNotFound(id.to_string()));
        }

        let uid = BlankUid::new();
        self.uid_by_display.insert(id.clone(), uid);
        self.meta_by_uid.insert(uid, metadata);
        self.counter += 1;

        info!("Attached record to blank {} ({})", id, uid);
        Ok(uid)
    }

    /// Rename a display id everywhere it appears.
    ///
    /// The identity and metadata are untouched; same-as rules pointing at
    /// the old id follow the rename. Renaming onto an id already in use is
    /// a collision and leaves the store unchanged.
    pub fn rename_blank(&mut self, old: &DisplayId, new: &DisplayId) -> Result<()> {
        if old == new {
            return Ok(());
        }

        let old_present = self.contains_placeholder(old);
        if !old_present && !self.uid_by_display.contains_left(old) {
            return Err(GapfillError::BlankNotFound(old.to_string()));
        }

        if self.contains_placeholder(new) || self.uid_by_display.contains_left(new) {
            warn!("Rename {} -> {} rejected: {} is in use", old, new, new);
            return Err(GapfillError::DisplayIdCollision {
                from: old.to_string(),
                to: new.to_string(),
            });
        }

        let mapping = HashMap::from([(old.clone(), new.clone())]);
        self.apply_remap(&mapping);

        info!("Renamed blank {} -> {}", old, new);
        Ok(())
    }

    /// Renumber blanks 1..N in order of first appearance.
    ///
    /// Returns the ids that changed, as old -> new. An already sequential
    /// template is left untouched.
    pub fn renumber_by_appearance(&mut self) -> HashMap<DisplayId, DisplayId> {
        let mapping: HashMap<DisplayId, DisplayId> = distinct_placeholders(&self.template)
            .into_iter()
            .zip((1..).map(DisplayId::from_number))
            .filter(|(old, new)| old != new)
            .collect();

        if mapping.is_empty() {
            debug!("Renumber: already sequential");
            return mapping;
        }

        self.apply_remap(&mapping);
        info!("Renumbered {} blank(s)", mapping.len());
        mapping
    }

    /// Rewrite placeholders, identity entries and same-as targets in bulk
    fn apply_remap(&mut self, mapping: &HashMap<DisplayId, DisplayId>) {
        self.template = remap_placeholders(&self.template, mapping);

        let mut remapped = BiMap::new();
        for (id, uid) in self.uid_by_display.iter() {
            let id = mapping.get(id).unwrap_or(id).clone();
            if let Err((id, uid)) = remapped.insert_no_overwrite(id, *uid) {
                warn!("Dropping stale record {} ({}) during remap", id, uid);
                self.meta_by_uid.remove(&uid);
            }
        }
        self.uid_by_display = remapped;

        for meta in self.meta_by_uid.values_mut() {
            if let Some(target) = meta.constraint.reference_mut() {
                if let Some(new) = mapping.get(target) {
                    *target = new.clone();
                }
            }
        }
    }

    /// Replace the template text, e.g. after the author typed into it.
    ///
    /// Records whose placeholder no longer appears are dropped; new
    /// placeholders without a record are reported as added.
    pub fn set_template(&mut self, template: impl Into<String>) -> TemplateDiff {
        self.template = template.into();
        let present: HashSet<DisplayId> = distinct_placeholders(&self.template)
            .into_iter()
            .collect();

        let mut removed: Vec<DisplayId> = self
            .uid_by_display
            .left_values()
            .filter(|id| !present.contains(*id))
            .cloned()
            .collect();
        removed.sort();
        for id in &removed {
            if let Some((_, uid)) = self.uid_by_display.remove_by_left(id) {
                self.meta_by_uid.remove(&uid);
            }
        }
        for id in &removed {
            self.detach_references(id);
        }

        let added = self.orphans();
        if !removed.is_empty() || !added.is_empty() {
            info!(
                "Template edited: {} new placeholder(s), {} record(s) dropped",
                added.len(),
                removed.len()
            );
        }
        TemplateDiff { added, removed }
    }

    /// Set a blank's rule, marking it as an author override
    pub fn set_constraint(&mut self, id: &DisplayId, constraint: Constraint) -> Result<()> {
        constraint.validate(Some(id))?;
        self.update_metadata(id, |meta| {
            meta.constraint = constraint;
            meta.overridden = true;
        })
    }

    /// Verify the store invariant
    pub fn check_consistency(&self) -> Result<()> {
        let present: HashSet<DisplayId> = distinct_placeholders(&self.template)
            .into_iter()
            .collect();

        for (id, uid) in self.uid_by_display.iter() {
            if !present.contains(id) {
                return Err(GapfillError::InconsistentStore(format!(
                    "blank {} has a record but no placeholder",
                    id
                )));
            }
            if !self.meta_by_uid.contains_key(uid) {
                return Err(GapfillError::InconsistentStore(format!(
                    "blank {} ({}) has no metadata",
                    id, uid
                )));
            }
        }

        if let Some(uid) = self
            .meta_by_uid
            .keys()
            .find(|uid| !self.uid_by_display.contains_right(uid))
        {
            return Err(GapfillError::InconsistentStore(format!(
                "metadata {} has no display id",
                uid
            )));
        }

        Ok(())
    }

    /// Export the persisted shape
    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            template: self.template.clone(),
            counter: self.counter,
            store: PersistedStore {
                uid_by_display: self
                    .uid_by_display
                    .iter()
                    .map(|(id, uid)| (id.clone(), *uid))
                    .collect(),
                meta_by_uid: self
                    .meta_by_uid
                    .iter()
                    .map(|(uid, meta)| (*uid, meta.clone()))
                    .collect(),
            },
        }
    }

    /// Rebuild a store from its persisted shape, verifying the invariant
    pub fn from_persisted(state: PersistedState) -> Result<Self> {
        let mut uid_by_display = BiMap::new();
        for (id, uid) in state.store.uid_by_display {
            uid_by_display
                .insert_no_overwrite(id, uid)
                .map_err(|(id, uid)| {
                    GapfillError::InconsistentStore(format!(
                        "identity {} is mapped from more than one display id (including {})",
                        uid, id
                    ))
                })?;
        }

        let store = Self {
            template: state.template,
            counter: state.counter,
            uid_by_display,
            meta_by_uid: state.store.meta_by_uid.into_iter().collect(),
        };
        store.check_consistency()?;
        Ok(store)
    }
}
