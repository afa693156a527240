//! Blank structure commands

use super::{nth_occurrence, parse_id, print_json, Context};
use anyhow::Result;
use std::fs;
use std::path::Path;

pub fn create(ctx: &Context, text: &str, nth: usize) -> Result<()> {
    let (id, constraint) = ctx.edit(|session| {
        let template = session.workspace().store().template().to_string();
        let (start, end) = nth_occurrence(&template, text, nth).ok_or_else(|| {
            anyhow::anyhow!("Occurrence {} of {:?} not found in the template", nth, text)
        })?;
        let id = session.workspace_mut().create_blank(start, end)?;
        let constraint = session
            .workspace()
            .store()
            .metadata(&id)
            .map(|m| m.constraint.clone());
        Ok((id, constraint))
    })?;

    if ctx.json() {
        return print_json(&serde_json::json!({ "id": id, "constraint": constraint }));
    }
    match constraint {
        Some(c) => println!("Created blank {} ({})", id, c),
        None => println!("Created blank {}", id),
    }
    Ok(())
}

pub fn remove(ctx: &Context, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let removed = ctx.edit(|session| Ok(session.workspace_mut().remove_blank(&id)?))?;
    if removed {
        println!("Removed blank {}", id);
    } else {
        println!("Blank {} is not in the template.", id);
    }
    Ok(())
}

pub fn delete_record(ctx: &Context, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let deleted = ctx.edit(|session| Ok(session.workspace_mut().delete_blank_record(&id)?))?;
    match deleted {
        Some(meta) => println!("Deleted record of blank {} (answer {:?})", id, meta.answer),
        None => println!("Blank {} has no record.", id),
    }
    Ok(())
}

pub fn attach(ctx: &Context, id: &str, answer: &str) -> Result<()> {
    let id = parse_id(id)?;
    let uid = ctx.edit(|session| Ok(session.workspace_mut().attach_record(&id, answer)?))?;
    println!("Attached record {} to blank {}", uid, id);
    Ok(())
}

pub fn rename(ctx: &Context, old: &str, new: &str) -> Result<()> {
    let old = parse_id(old)?;
    let new = parse_id(new)?;
    ctx.edit(|session| Ok(session.workspace_mut().rename_blank(&old, &new)?))?;
    println!("Renamed blank {} -> {}", old, new);
    Ok(())
}

pub fn renumber(ctx: &Context) -> Result<()> {
    let mapping = ctx.edit(|session| Ok(session.workspace_mut().renumber()?))?;

    if ctx.json() {
        let changes: serde_json::Map<String, serde_json::Value> = mapping
            .iter()
            .map(|(old, new)| (old.to_string(), serde_json::Value::String(new.to_string())))
            .collect();
        return print_json(&serde_json::Value::Object(changes));
    }

    if mapping.is_empty() {
        println!("Blanks are already numbered in order.");
    } else {
        let mut changes: Vec<_> = mapping.into_iter().collect();
        changes.sort();
        for (old, new) in changes {
            println!("  {} -> {}", old, new);
        }
    }
    Ok(())
}

pub fn edit(ctx: &Context, file: &Path) -> Result<()> {
    let template = fs::read_to_string(file)?;
    let diff = ctx.edit(|session| Ok(session.workspace_mut().set_template(template)?))?;

    if ctx.json() {
        return print_json(&serde_json::json!({ "added": diff.added, "removed": diff.removed }));
    }

    if diff.is_empty() {
        println!("Template updated; blanks unchanged.");
    }
    for id in &diff.removed {
        println!("  dropped record of blank {}", id);
    }
    for id in &diff.added {
        println!("  blank {} has no record; use `gapfill attach {} <answer>`", id, id);
    }
    Ok(())
}

pub fn select(ctx: &Context, id: Option<&str>) -> Result<()> {
    let id = id.map(parse_id).transpose()?;
    ctx.edit(|session| Ok(session.workspace_mut().select(id.clone())?))?;
    match id {
        Some(id) => println!("Selected blank {}", id),
        None => println!("Selection cleared."),
    }
    Ok(())
}
