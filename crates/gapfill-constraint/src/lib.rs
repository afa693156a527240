//! Gapfill Constraint - Validation rules for template blanks
//!
//! This crate provides the closed set of constraint kinds a blank can carry,
//! the per-blank metadata record, and the evaluator that grades learner
//! submissions against them.

mod evaluator;
mod lexical;
mod metadata;
mod report;
mod types;

pub use evaluator::{check, evaluate, grade, BindingTable, Evaluator, FailReason, GradeItem, ValueMap};
pub use lexical::{expressions_equivalent, is_identifier, is_quoted_literal, parse_number, tokenize};
pub use metadata::BlankMetadata;
pub use report::{BlankOutcome, GradeReport};
pub use types::Constraint;
