//! Blank metadata commands

use super::{parse_id, Context};
use anyhow::{Context as _, Result};
use gapfill_constraint::Constraint;
use std::time::Instant;

pub fn describe(ctx: &Context, id: &str, text: &str) -> Result<()> {
    let id = parse_id(id)?;
    ctx.edit(|session| {
        session
            .workspace_mut()
            .type_description(&id, text, Instant::now())?;
        Ok(())
    })?;
    println!("Updated description of blank {}", id);
    Ok(())
}

pub fn answer(ctx: &Context, id: &str, answer: &str) -> Result<()> {
    let id = parse_id(id)?;
    let constraint = ctx.edit(|session| {
        session.workspace_mut().set_answer(&id, answer)?;
        Ok(current_constraint(session.workspace(), &id))
    })?;
    println!("Answer of blank {} set; constraint is {}", id, constraint);
    Ok(())
}

pub fn bind(ctx: &Context, id: &str, key: Option<String>) -> Result<()> {
    let id = parse_id(id)?;
    let cleared = key.is_none();
    let constraint = ctx.edit(|session| {
        session.workspace_mut().set_binding(&id, key)?;
        Ok(current_constraint(session.workspace(), &id))
    })?;
    if cleared {
        println!("Cleared binding of blank {}; constraint is {}", id, constraint);
    } else {
        println!("Bound blank {}; constraint is {}", id, constraint);
    }
    Ok(())
}

pub fn constrain(ctx: &Context, id: &str, json: Option<&str>, clear: bool) -> Result<()> {
    let id = parse_id(id)?;

    if clear {
        let constraint = ctx.edit(|session| {
            session.workspace_mut().clear_constraint_override(&id)?;
            Ok(current_constraint(session.workspace(), &id))
        })?;
        println!("Blank {} uses the inferred constraint {}", id, constraint);
        return Ok(());
    }

    let json = json.context("Give a constraint as JSON, or --clear")?;
    let constraint: Constraint =
        serde_json::from_str(json).with_context(|| format!("Invalid constraint JSON: {}", json))?;
    ctx.edit(|session| Ok(session.workspace_mut().set_constraint(&id, constraint.clone())?))?;
    println!("Blank {} now requires {}", id, constraint);
    Ok(())
}

fn current_constraint(workspace: &gapfill_session::Workspace, id: &gapfill_core::DisplayId) -> String {
    workspace
        .store()
        .metadata(id)
        .map(|m| m.constraint.to_string())
        .unwrap_or_else(|| "none".to_string())
}
