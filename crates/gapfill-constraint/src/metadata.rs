//! Per-blank metadata record

use crate::types::Constraint;
use serde::{Deserialize, Serialize};

/// Everything known about a blank, keyed by its permanent identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlankMetadata {
    /// Reference answer: the exact text the placeholder replaced
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Semantic binding name shared by blanks that always mean the same thing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    /// The rule used for grading
    pub constraint: Constraint,
    /// Set when the author replaced the inferred rule by hand
    #[serde(default)]
    pub overridden: bool,
}

impl BlankMetadata {
    /// New metadata whose rule compares against the answer text itself.
    /// Callers normally replace it with an inferred rule.
    pub fn new(answer: impl Into<String>) -> Self {
        let answer = answer.into();
        Self {
            constraint: Constraint::expression(answer.trim()),
            answer,
            description: None,
            binding: None,
            overridden: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }

    /// Replace the rule as an author override
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self.overridden = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults_to_expression() {
        let meta = BlankMetadata::new(" digitalRead(BUTTON) ");
        assert_eq!(meta.answer, " digitalRead(BUTTON) ");
        assert_eq!(meta.constraint, Constraint::expression("digitalRead(BUTTON)"));
        assert!(!meta.overridden);
    }

    #[test]
    fn test_with_constraint_marks_override() {
        let meta = BlankMetadata::new("13").with_constraint(Constraint::number());
        assert!(meta.overridden);
    }

    #[test]
    fn test_camel_case_shape() {
        let meta = BlankMetadata::new("i").with_binding("loop_counter");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["answer"], "i");
        assert_eq!(json["binding"], "loop_counter");
        assert_eq!(json["constraint"]["kind"], "expression");
        assert!(json.get("description").is_none());
    }
}
