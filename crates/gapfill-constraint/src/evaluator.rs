//! Constraint evaluation engine
//!
//! Every check runs against values that are already materialized by the
//! caller. A same-as rule looks its target up in the value map and fails
//! closed when the target is missing or empty; there is no dependency
//! ordering, so reference cycles cannot loop.

use crate::lexical::{expressions_equivalent, is_identifier, parse_number};
use crate::metadata::BlankMetadata;
use crate::report::{BlankOutcome, GradeReport};
use crate::types::Constraint;
use gapfill_core::DisplayId;
use std::collections::HashMap;
use thiserror::Error;

/// Current submissions for every blank of a template, keyed by display id
pub type ValueMap = HashMap<DisplayId, String>;

/// Why a submission did not satisfy its constraint
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailReason {
    #[error("no value submitted")]
    Empty,

    #[error("'{0}' is not an accepted value")]
    NotAccepted(String),

    #[error("'{0}' is not an identifier")]
    NotIdentifier(String),

    #[error("'{0}' is not a number")]
    NotNumber(String),

    #[error("{value} is outside the allowed range")]
    OutOfRange {
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    #[error("{0} is not one of the accepted numbers")]
    NotInNumberSet(f64),

    #[error("'{0}' does not match the expected pattern")]
    PatternMismatch(String),

    #[error("pattern '{0}' cannot be compiled")]
    InvalidPattern(String),

    #[error("'{0}' does not match the expected expression")]
    ExpressionMismatch(String),

    #[error("blank {0} has no value to compare against")]
    UnresolvedReference(DisplayId),

    #[error("value differs from blank {0}")]
    ReferenceMismatch(DisplayId),

    #[error("'{found}' conflicts with '{expected}' already bound to '{key}'")]
    BindingConflict {
        key: String,
        expected: String,
        found: String,
    },

    #[error("blank {0} has no record")]
    MissingRecord(DisplayId),
}

/// Check a submission against a constraint, reporting why it failed.
pub fn check(
    constraint: &Constraint,
    submitted: &str,
    values: &ValueMap,
) -> Result<(), FailReason> {
    let value = submitted.trim();

    match constraint {
        Constraint::LiteralSet { accepted } => {
            if accepted.iter().any(|a| a == value) {
                Ok(())
            } else {
                Err(FailReason::NotAccepted(value.to_string()))
            }
        }

        Constraint::Identifier { .. } => {
            require_non_empty(value)?;
            if is_identifier(value) {
                Ok(())
            } else {
                Err(FailReason::NotIdentifier(value.to_string()))
            }
        }

        Constraint::Number { min, max, one_of } => {
            require_non_empty(value)?;
            let n = parse_number(value).ok_or_else(|| FailReason::NotNumber(value.to_string()))?;
            let below = min.is_some_and(|lo| n < lo);
            let above = max.is_some_and(|hi| n > hi);
            if below || above {
                return Err(FailReason::OutOfRange {
                    value: n,
                    min: *min,
                    max: *max,
                });
            }
            if let Some(set) = one_of {
                if !set.contains(&n) {
                    return Err(FailReason::NotInNumberSet(n));
                }
            }
            Ok(())
        }

        Constraint::StringPattern { one_of, pattern } => {
            if one_of.is_none() && pattern.is_none() {
                return require_non_empty(value);
            }

            let listed = one_of
                .as_ref()
                .is_some_and(|list| list.iter().any(|s| s == value));
            if listed {
                return Ok(());
            }

            match pattern {
                Some(pattern) => {
                    let re = regex_lite::Regex::new(&format!("^(?:{})$", pattern))
                        .map_err(|_| FailReason::InvalidPattern(pattern.clone()))?;
                    if re.is_match(value) {
                        Ok(())
                    } else {
                        Err(FailReason::PatternMismatch(value.to_string()))
                    }
                }
                None => Err(FailReason::NotAccepted(value.to_string())),
            }
        }

        Constraint::Expression { canonical } => {
            require_non_empty(value)?;
            if expressions_equivalent(value, canonical) {
                Ok(())
            } else {
                Err(FailReason::ExpressionMismatch(value.to_string()))
            }
        }

        Constraint::SameAs { target } => {
            require_non_empty(value)?;
            let other = values
                .get(target)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| FailReason::UnresolvedReference(target.clone()))?;
            if other == value {
                Ok(())
            } else {
                Err(FailReason::ReferenceMismatch(target.clone()))
            }
        }
    }
}

/// Evaluate a submission against a constraint.
///
/// Returns false for any failure, including unresolvable same-as targets.
pub fn evaluate(constraint: &Constraint, submitted: &str, values: &ValueMap) -> bool {
    check(constraint, submitted, values).is_ok()
}

fn require_non_empty(value: &str) -> Result<(), FailReason> {
    if value.is_empty() {
        Err(FailReason::Empty)
    } else {
        Ok(())
    }
}

/// Values recorded under semantic binding keys during one grading pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingTable {
    values: HashMap<String, String>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Record a value; the first value bound to a key wins.
    /// Returns true if the key was newly bound.
    pub fn record(&mut self, key: &str, value: &str) -> bool {
        if self.values.contains_key(key) {
            return false;
        }
        self.values.insert(key.to_string(), value.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Stateful evaluator that records bound values for reuse by later blanks
#[derive(Debug, Default)]
pub struct Evaluator {
    bindings: BindingTable,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one blank.
    ///
    /// `binding` is the blank's own binding name from its metadata. On a
    /// pass the submitted value is recorded under that name and under the
    /// constraint's binding key. A bound identifier fails if its key
    /// already holds a different value.
    pub fn evaluate_blank(
        &mut self,
        constraint: &Constraint,
        binding: Option<&str>,
        submitted: &str,
        values: &ValueMap,
    ) -> Result<(), FailReason> {
        check(constraint, submitted, values)?;
        let value = submitted.trim();

        if let Some(key) = constraint.binding_key() {
            if let Some(expected) = self.bindings.get(key) {
                if expected != value {
                    return Err(FailReason::BindingConflict {
                        key: key.to_string(),
                        expected: expected.to_string(),
                        found: value.to_string(),
                    });
                }
            }
        }

        for key in [constraint.binding_key(), binding].into_iter().flatten() {
            self.bindings.record(key, value);
        }
        Ok(())
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub fn into_bindings(self) -> BindingTable {
        self.bindings
    }
}

/// One blank to grade: its display id and its record, if it has one
#[derive(Debug, Clone, Copy)]
pub struct GradeItem<'a> {
    pub display_id: &'a DisplayId,
    pub metadata: Option<&'a BlankMetadata>,
}

/// Grade a sequence of blanks in order.
///
/// Callers pass blanks in order of first appearance so binding values are
/// recorded deterministically. A blank without a value in `values` is
/// graded as an empty submission; a blank without a record fails.
pub fn grade<'a>(items: impl IntoIterator<Item = GradeItem<'a>>, values: &ValueMap) -> GradeReport {
    let mut evaluator = Evaluator::new();
    let mut report = GradeReport::new();

    for item in items {
        let submitted = values
            .get(item.display_id)
            .map(String::as_str)
            .unwrap_or("");
        let result = match item.metadata {
            Some(meta) => evaluator.evaluate_blank(
                &meta.constraint,
                meta.binding.as_deref(),
                submitted,
                values,
            ),
            None => Err(FailReason::MissingRecord(item.display_id.clone())),
        };
        report.outcomes.push(BlankOutcome {
            display_id: item.display_id.clone(),
            submitted: submitted.to_string(),
            failure: result.err(),
        });
    }

    report.bindings = evaluator.into_bindings();
    report
}
