//! Constraint inference engine
//!
//! Decision order, first match wins:
//! 1. a bare identifier known to the binding registry -> bound identifier
//! 2. a numeric literal -> any number
//! 3. a quoted string literal -> any non-empty string
//! 4. a bare identifier -> any identifier
//! 5. anything with structure (calls, operators, indexing) -> expression
//!
//! The result is a heuristic proposal. It never fails; authors override
//! it when the guess is wrong.

use crate::registry::BindingRegistry;
use gapfill_constraint::{is_identifier, is_quoted_literal, parse_number, BlankMetadata, Constraint};
use tracing::debug;

/// Lexical shape of a reference answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerShape {
    Identifier,
    Number,
    Quoted,
    Structured,
}

/// Classify a reference answer by its lexical shape
pub fn classify(reference: &str) -> AnswerShape {
    let text = reference.trim();
    if parse_number(text).is_some() {
        AnswerShape::Number
    } else if is_quoted_literal(text) {
        AnswerShape::Quoted
    } else if is_identifier(text) {
        AnswerShape::Identifier
    } else {
        AnswerShape::Structured
    }
}

/// Proposes constraints, consulting a binding registry
pub struct InferenceEngine<'a> {
    registry: &'a BindingRegistry,
}

impl<'a> InferenceEngine<'a> {
    pub fn new(registry: &'a BindingRegistry) -> Self {
        Self { registry }
    }

    /// Propose a constraint for a reference answer
    pub fn infer(&self, reference: &str) -> Constraint {
        let text = reference.trim();
        let shape = classify(text);

        let constraint = match shape {
            AnswerShape::Identifier => match self.registry.key_for(text) {
                Some(key) => Constraint::bound_identifier(key),
                None => Constraint::identifier(),
            },
            AnswerShape::Number => Constraint::number(),
            AnswerShape::Quoted => Constraint::string(),
            AnswerShape::Structured => Constraint::expression(text),
        };

        debug!("Inferred {} for {:?}", constraint.kind_name(), text);
        constraint
    }

    /// The constraint a blank should grade with.
    ///
    /// An author override is kept as is. Otherwise a blank with its own
    /// binding name and an identifier answer becomes a bound identifier,
    /// and anything else is inferred from the answer.
    pub fn propose(&self, metadata: &BlankMetadata) -> Constraint {
        if metadata.overridden {
            return metadata.constraint.clone();
        }

        match &metadata.binding {
            Some(binding) if is_identifier(metadata.answer.trim()) => {
                Constraint::bound_identifier(binding.clone())
            }
            _ => self.infer(&metadata.answer),
        }
    }
}

/// Propose a constraint for a reference answer
pub fn infer(reference: &str, registry: &BindingRegistry) -> Constraint {
    InferenceEngine::new(registry).infer(reference)
}
