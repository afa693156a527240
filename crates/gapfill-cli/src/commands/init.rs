//! Workspace initialization command

use super::Context;
use anyhow::Result;
use gapfill_session::{FileStore, KeyValueStore, Session, WORKSPACE_KEY};
use std::fs;
use std::path::Path;

pub fn run(ctx: &Context, file: &Path, force: bool) -> Result<()> {
    let template = fs::read_to_string(file)?;
    let mut store = FileStore::open(&ctx.workspace)?;

    if store.get(WORKSPACE_KEY)?.is_some() {
        if !force {
            anyhow::bail!(
                "Workspace '{}' already exists (use --force to replace it)",
                ctx.workspace.display()
            );
        }
        store.delete(WORKSPACE_KEY)?;
    }

    let session = Session::create(store, template, ctx.registry()?, &ctx.config)?;
    let placeholders = session.workspace().store().orphans().len();
    session.close()?;

    println!("Created workspace in {}", ctx.workspace.display());
    if placeholders > 0 {
        println!(
            "  {} placeholder(s) in the text have no record; use `gapfill attach` to add them.",
            placeholders
        );
    }
    Ok(())
}
