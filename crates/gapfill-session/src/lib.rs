//! Gapfill Session - Authoring workspace with undo and durable storage
//!
//! Wraps a `BlankStore` in a `Workspace` that records undo snapshots,
//! debounces description typing, grades submissions, and persists itself
//! through a key-value store.

mod config;
mod debounce;
mod history;
mod kv;
mod persist;
mod session;
mod workspace;

pub use config::{GapfillConfig, HistoryConfig, LoggingConfig, PersistenceConfig};
pub use debounce::Debouncer;
pub use history::{History, Snapshot};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use persist::Persister;
pub use session::{Session, WorkspaceFile, WORKSPACE_KEY};
pub use workspace::{MetadataEdit, Workspace};
