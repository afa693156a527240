//! Gapfill Template - Placeholder templates with stable blank identities
//!
//! A template is plain text containing `__BLANK[<id>]__` tokens. The
//! `BlankStore` owns the text, allocates display ids, and maps each display
//! id to a permanent `BlankUid` so metadata survives renames and
//! renumbering.

mod format;
mod placeholder;
mod store;

pub use format::{PersistedState, PersistedStore};
pub use placeholder::{
    distinct_placeholders, extract_placeholders, fill, placeholder_spans, placeholder_token,
    remap_placeholders, replace_placeholder, PlaceholderSpan,
};
pub use store::{BlankStore, TemplateDiff};
