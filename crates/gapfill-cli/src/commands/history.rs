//! Undo and redo commands

use super::Context;
use anyhow::Result;

pub fn undo(ctx: &Context) -> Result<()> {
    let description = ctx.edit(|session| {
        let description = session
            .workspace()
            .history()
            .undo_description()
            .map(str::to_string);
        Ok(if session.workspace_mut().undo()? { description } else { None })
    })?;

    match description {
        Some(d) => println!("Undid: {}", d),
        None => println!("Nothing to undo."),
    }
    Ok(())
}

pub fn redo(ctx: &Context) -> Result<()> {
    let description = ctx.edit(|session| {
        let description = session
            .workspace()
            .history()
            .redo_description()
            .map(str::to_string);
        Ok(if session.workspace_mut().redo()? { description } else { None })
    })?;

    match description {
        Some(d) => println!("Redid: {}", d),
        None => println!("Nothing to redo."),
    }
    Ok(())
}
