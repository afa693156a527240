//! Constraint inference command

use super::{print_json, Context};
use anyhow::Result;
use gapfill_infer::{classify, InferenceEngine};

pub fn run(ctx: &Context, answer: &str) -> Result<()> {
    let registry = ctx.registry()?;
    let constraint = InferenceEngine::new(&registry).infer(answer);

    if ctx.json() {
        print_json(&serde_json::json!({
            "answer": answer,
            "shape": format!("{:?}", classify(answer)).to_lowercase(),
            "constraint": constraint,
        }))
    } else {
        println!("{}", constraint);
        Ok(())
    }
}
