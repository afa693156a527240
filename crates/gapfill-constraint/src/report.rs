//! Grading report types

use crate::evaluator::{BindingTable, FailReason};
use gapfill_core::DisplayId;

/// The result of grading a single blank
#[derive(Debug, Clone, PartialEq)]
pub struct BlankOutcome {
    pub display_id: DisplayId,
    pub submitted: String,
    pub failure: Option<FailReason>,
}

impl BlankOutcome {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// A complete grading report for one template
#[derive(Debug, Default)]
pub struct GradeReport {
    /// One outcome per distinct blank, in order of first appearance
    pub outcomes: Vec<BlankOutcome>,
    /// Values recorded under binding keys while grading
    pub bindings: BindingTable,
}

impl GradeReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every blank passed
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(BlankOutcome::passed)
    }

    pub fn pass_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn fail_count(&self) -> usize {
        self.outcomes.len() - self.pass_count()
    }

    /// Look up the outcome for a display id
    pub fn outcome(&self, display_id: &str) -> Option<&BlankOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.display_id.as_str() == display_id)
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        let total = self.outcomes.len();
        if total == 0 {
            return "No blanks to grade.".to_string();
        }

        format!(
            "{}/{} blank(s) correct, {} incorrect",
            self.pass_count(),
            total,
            self.fail_count(),
        )
    }
}
