//! Grading command

use super::{parse_id, parse_values, print_json, Context};
use anyhow::{Context as _, Result};
use gapfill_constraint::{GradeReport, ValueMap};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub fn run(ctx: &Context, pairs: &[String], values_file: Option<&Path>) -> Result<()> {
    let mut values = match values_file {
        Some(path) => load_values(path)?,
        None => ValueMap::new(),
    };
    values.extend(parse_values(pairs)?);

    let session = ctx.open()?;
    let report = session.workspace().grade(&values);

    if ctx.json() {
        print_report_json(&report)?;
    } else {
        print_report_text(&report);
    }

    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}

fn load_values(path: &Path) -> Result<ValueMap> {
    let content = fs::read_to_string(path)?;
    let raw: BTreeMap<String, String> = serde_json::from_str(&content)
        .with_context(|| format!("{} must be a JSON object of id -> value", path.display()))?;
    raw.into_iter()
        .map(|(id, value)| -> Result<_> { Ok((parse_id(&id)?, value)) })
        .collect()
}

fn print_report_text(report: &GradeReport) {
    println!("{}", report.summary());
    println!();

    for outcome in &report.outcomes {
        match &outcome.failure {
            None => println!("  [PASS] {}: {:?}", outcome.display_id, outcome.submitted),
            Some(reason) => println!("  [FAIL] {}: {}", outcome.display_id, reason),
        }
    }
}

fn print_report_json(report: &GradeReport) -> Result<()> {
    let outcomes: Vec<serde_json::Value> = report
        .outcomes
        .iter()
        .map(|o| {
            serde_json::json!({
                "id": o.display_id,
                "submitted": o.submitted,
                "passed": o.passed(),
                "reason": o.failure.as_ref().map(|r| r.to_string()),
            })
        })
        .collect();
    let bindings: BTreeMap<&str, &str> = report.bindings.iter().collect();

    print_json(&serde_json::json!({
        "passed": report.all_passed(),
        "summary": report.summary(),
        "correct": report.pass_count(),
        "incorrect": report.fail_count(),
        "outcomes": outcomes,
        "bindings": bindings,
    }))
}
