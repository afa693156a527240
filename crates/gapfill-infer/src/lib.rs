//! Gapfill Infer - Best-effort constraint proposals
//!
//! Given the reference answer of a blank, propose the constraint a learner's
//! submission should satisfy. Known identifier names from the project's
//! binding registry become bound identifiers rather than literal matches.

mod engine;
mod registry;

pub use engine::{classify, infer, AnswerShape, InferenceEngine};
pub use registry::{BindingFile, BindingRegistry};
