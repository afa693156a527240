//! Session - a workspace bound to durable storage

use crate::config::GapfillConfig;
use crate::history::History;
use crate::kv::KeyValueStore;
use crate::persist::Persister;
use crate::workspace::Workspace;
use gapfill_core::{DisplayId, GapfillError, Result};
use gapfill_infer::BindingRegistry;
use gapfill_template::{BlankStore, PersistedState};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Key the workspace file is stored under
pub const WORKSPACE_KEY: &str = "workspace";

/// On-disk shape of a workspace: the persisted template state plus the
/// editing context needed to resume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceFile {
    #[serde(flatten)]
    pub state: PersistedState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<DisplayId>,
    #[serde(default)]
    pub history: History,
}

pub struct Session<S: KeyValueStore> {
    workspace: Workspace,
    persister: Persister<S>,
    saved_revision: u64,
}

impl<S: KeyValueStore> Session<S> {
    /// Start a new workspace over `template` and save it immediately
    pub fn create(
        store: S,
        template: impl Into<String>,
        registry: BindingRegistry,
        config: &GapfillConfig,
    ) -> Result<Self> {
        let persister = Persister::new(store, WORKSPACE_KEY, config.debounce());
        let workspace = Workspace::new(template, registry, config);
        let mut session = Self {
            workspace,
            persister,
            saved_revision: 0,
        };
        session.schedule(Instant::now())?;
        session.persister.flush()?;
        info!("Created workspace");
        Ok(session)
    }

    /// Resume the workspace saved in `store`
    pub fn open(store: S, registry: BindingRegistry, config: &GapfillConfig) -> Result<Self> {
        let mut persister = Persister::new(store, WORKSPACE_KEY, config.debounce());
        let file: WorkspaceFile = persister.load()?.ok_or_else(|| {
            GapfillError::PersistenceError("no workspace found; run `gapfill init` first".to_string())
        })?;

        let store = BlankStore::from_persisted(file.state)?;
        let workspace = Workspace::from_parts(store, registry, file.history, file.selection, config);
        info!("Opened workspace with {} blank(s)", workspace.store().len());

        let saved_revision = workspace.revision();
        Ok(Self {
            workspace,
            persister,
            saved_revision,
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    pub fn persister(&self) -> &Persister<S> {
        &self.persister
    }

    /// Advance time: apply due edits, schedule a save if anything changed,
    /// and write once the save is due. Returns whether bytes were written.
    pub fn tick(&mut self, now: Instant) -> Result<bool> {
        self.workspace.tick(now)?;
        if self.workspace.revision() != self.saved_revision {
            self.schedule(now)?;
        }
        self.persister.poll(now)
    }

    /// Apply and write everything pending right away
    pub fn save(&mut self) -> Result<bool> {
        self.workspace.flush()?;
        if self.workspace.revision() != self.saved_revision {
            self.schedule(Instant::now())?;
        }
        self.persister.flush()
    }

    /// End the session, writing any pending state
    pub fn close(mut self) -> Result<()> {
        self.save()?;
        Ok(())
    }

    fn schedule(&mut self, now: Instant) -> Result<()> {
        let file = WorkspaceFile {
            state: self.workspace.persisted_state(),
            selection: self.workspace.selection().cloned(),
            history: self.workspace.history().clone(),
        };
        self.persister.schedule(&file, now)?;
        self.saved_revision = self.workspace.revision();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{FileStore, MemoryStore};
    use std::time::Duration;

    fn config() -> GapfillConfig {
        GapfillConfig::default()
    }

    #[test]
    fn test_open_missing_workspace() {
        let result = Session::open(MemoryStore::new(), BindingRegistry::new(), &config());
        assert!(matches!(result, Err(GapfillError::PersistenceError(_))));
    }

    #[test]
    fn test_create_then_open() {
        let session = Session::create(MemoryStore::new(), "x = 1;", BindingRegistry::new(), &config()).unwrap();
        let store = session.persister().store().clone();

        let reopened = Session::open(store, BindingRegistry::new(), &config()).unwrap();
        assert_eq!(reopened.workspace().store().template(), "x = 1;");
    }

    #[test]
    fn test_tick_debounces_writes() {
        let mut session =
            Session::create(MemoryStore::new(), "a b c", BindingRegistry::new(), &config()).unwrap();
        assert_eq!(session.persister().store().writes(), 1);
        let t0 = Instant::now();

        session.workspace_mut().create_blank(4, 5).unwrap();
        assert!(!session.tick(t0).unwrap());
        session.workspace_mut().create_blank(0, 1).unwrap();
        assert!(!session.tick(t0 + Duration::from_millis(300)).unwrap());
        assert!(session.tick(t0 + Duration::from_millis(800)).unwrap());

        // Both edits reach the store in one write
        assert_eq!(session.persister().store().writes(), 2);
        assert!(!session.tick(t0 + Duration::from_millis(5000)).unwrap());
    }

    #[test]
    fn test_close_flushes_pending_description() {
        let mut session =
            Session::create(MemoryStore::new(), "x = 1;", BindingRegistry::new(), &config()).unwrap();
        let id = session.workspace_mut().create_blank(4, 5).unwrap();
        session
            .workspace_mut()
            .type_description(&id, "initial value", Instant::now())
            .unwrap();

        assert!(session.save().unwrap());
        let store = session.persister().store().clone();

        let reopened = Session::open(store, BindingRegistry::new(), &config()).unwrap();
        let meta = reopened.workspace().store().metadata(&id).unwrap();
        assert_eq!(meta.description.as_deref(), Some("initial value"));
        assert_eq!(reopened.workspace().selection(), Some(&id));
    }

    #[test]
    fn test_history_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("gapfill_session_test_{}", uuid::Uuid::new_v4()));

        {
            let store = FileStore::open(&dir).unwrap();
            let mut session = Session::create(store, "int x = 5;", BindingRegistry::new(), &config()).unwrap();
            session.workspace_mut().create_blank(8, 9).unwrap();
            session.close().unwrap();
        }

        let store = FileStore::open(&dir).unwrap();
        let mut session = Session::open(store, BindingRegistry::new(), &config()).unwrap();
        assert_eq!(session.workspace().store().template(), "int x = __BLANK[1]__;");
        assert!(session.workspace_mut().undo().unwrap());
        assert_eq!(session.workspace().store().template(), "int x = 5;");
        session.close().unwrap();

        let store = FileStore::open(&dir).unwrap();
        let mut session = Session::open(store, BindingRegistry::new(), &config()).unwrap();
        assert!(session.workspace_mut().redo().unwrap());
        assert_eq!(session.workspace().store().template(), "int x = __BLANK[1]__;");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_binding_survives_reopen() {
        let mut session = Session::create(
            MemoryStore::new(),
            "for (i = 0; i < n; i++) {}",
            BindingRegistry::new(),
            &config(),
        )
        .unwrap();
        let first = session.workspace_mut().create_blank(5, 6).unwrap();
        session
            .workspace_mut()
            .set_binding(&first, Some("loop_counter".to_string()))
            .unwrap();
        assert!(session.save().unwrap());

        let store = session.persister().store().clone();
        let mut reopened = Session::open(store, BindingRegistry::new(), &config()).unwrap();
        let template = reopened.workspace().store().template().to_string();
        let start = template.find("i <").unwrap();
        let second = reopened.workspace_mut().create_blank(start, start + 1).unwrap();

        assert_eq!(
            reopened.workspace().store().metadata(&second).unwrap().constraint,
            gapfill_constraint::Constraint::bound_identifier("loop_counter")
        );
    }

    #[test]
    fn test_workspace_file_shape() {
        let session = Session::create(MemoryStore::new(), "t", BindingRegistry::new(), &config()).unwrap();
        let bytes = session.persister().store().get(WORKSPACE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["template"], "t");
        assert!(value["store"].get("uidByDisplay").is_some());
        assert!(value.get("history").is_some());
    }
}
