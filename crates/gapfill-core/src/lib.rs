//! Gapfill Core - Foundational types for the Gapfill blank engine
//!
//! This crate provides the types that all other Gapfill crates depend on:
//! - `BlankUid` - Permanent blank identities
//! - `DisplayId` - Renumberable placeholder labels
//! - `ContentHash` - Fingerprints for skipping unchanged saves
//! - Error types and Result alias

mod error;
mod hash;
mod id;

pub use error::{GapfillError, Result};
pub use hash::ContentHash;
pub use id::{BlankUid, DisplayId};
