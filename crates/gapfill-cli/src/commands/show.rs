//! Template display commands

use super::{parse_values, print_json, Context};
use anyhow::Result;

pub fn run(ctx: &Context) -> Result<()> {
    let session = ctx.open()?;
    let workspace = session.workspace();
    let store = workspace.store();
    let blanks = store.blanks();

    if ctx.json() {
        let entries: Vec<serde_json::Value> = blanks
            .iter()
            .map(|(id, meta)| {
                serde_json::json!({
                    "id": id,
                    "uid": store.uid_of(id),
                    "metadata": meta,
                    "selected": workspace.selection() == Some(id),
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "template": store.template(),
            "counter": store.counter(),
            "blanks": entries,
            "can_undo": workspace.history().can_undo(),
            "can_redo": workspace.history().can_redo(),
        }));
    }

    println!("{}", store.template());
    println!();

    if blanks.is_empty() {
        println!("No blanks.");
        return Ok(());
    }

    for (id, meta) in &blanks {
        let marker = if workspace.selection() == Some(id) { "*" } else { " " };
        match meta {
            Some(meta) => {
                let overridden = if meta.overridden { " [override]" } else { "" };
                println!("{} [{}] {:?} -> {}{}", marker, id, meta.answer, meta.constraint, overridden);
                if let Some(binding) = &meta.binding {
                    println!("      binding: {}", binding);
                }
                if let Some(description) = &meta.description {
                    println!("      {}", description);
                }
            }
            None => println!("{} [{}] (no record)", marker, id),
        }
    }
    Ok(())
}

pub fn render(ctx: &Context, values: &[String]) -> Result<()> {
    let session = ctx.open()?;
    let values = parse_values(values)?;
    let text = session.workspace().render(&values);

    if ctx.json() {
        print_json(&serde_json::json!({ "text": text }))
    } else {
        println!("{}", text);
        Ok(())
    }
}
