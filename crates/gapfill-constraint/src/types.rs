//! Constraint type definitions

use gapfill_core::{DisplayId, GapfillError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The validation rule attached to a blank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// Trimmed submission must equal one of the accepted strings exactly
    LiteralSet { accepted: Vec<String> },
    /// Submission must be a bare identifier. A bound identifier also
    /// records its value under the semantic key while grading.
    Identifier {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        binding: Option<String>,
    },
    /// Submission must parse as a number, optionally within an inclusive
    /// range or an enumerated set
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        one_of: Option<Vec<f64>>,
    },
    /// Submission must match one of the listed strings or a regex; with
    /// neither it only has to be non-empty
    StringPattern {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        one_of: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    /// Token-wise comparison against the canonical answer text
    Expression { canonical: String },
    /// Submission must equal the current value of another blank
    SameAs { target: DisplayId },
}

impl Constraint {
    pub fn literal_set<I, S>(accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::LiteralSet {
            accepted: accepted.into_iter().map(Into::into).collect(),
        }
    }

    pub fn identifier() -> Self {
        Constraint::Identifier { binding: None }
    }

    pub fn bound_identifier(key: impl Into<String>) -> Self {
        Constraint::Identifier {
            binding: Some(key.into()),
        }
    }

    /// Any number
    pub fn number() -> Self {
        Constraint::Number {
            min: None,
            max: None,
            one_of: None,
        }
    }

    /// A number within an inclusive range; either bound may be open
    pub fn number_range(min: Option<f64>, max: Option<f64>) -> Self {
        Constraint::Number {
            min,
            max,
            one_of: None,
        }
    }

    pub fn number_one_of(values: Vec<f64>) -> Self {
        Constraint::Number {
            min: None,
            max: None,
            one_of: Some(values),
        }
    }

    /// Any non-empty string
    pub fn string() -> Self {
        Constraint::StringPattern {
            one_of: None,
            pattern: None,
        }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Constraint::StringPattern {
            one_of: None,
            pattern: Some(pattern.into()),
        }
    }

    pub fn expression(canonical: impl Into<String>) -> Self {
        Constraint::Expression {
            canonical: canonical.into(),
        }
    }

    pub fn same_as(target: DisplayId) -> Self {
        Constraint::SameAs { target }
    }

    /// Short name of the rule kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Constraint::LiteralSet { .. } => "literal_set",
            Constraint::Identifier { .. } => "identifier",
            Constraint::Number { .. } => "number",
            Constraint::StringPattern { .. } => "string_pattern",
            Constraint::Expression { .. } => "expression",
            Constraint::SameAs { .. } => "same_as",
        }
    }

    /// The blank this constraint depends on, if any
    pub fn reference(&self) -> Option<&DisplayId> {
        match self {
            Constraint::SameAs { target } => Some(target),
            _ => None,
        }
    }

    /// Mutable access to the reference target, used when blanks are renamed
    pub fn reference_mut(&mut self) -> Option<&mut DisplayId> {
        match self {
            Constraint::SameAs { target } => Some(target),
            _ => None,
        }
    }

    /// The semantic binding key of a bound identifier
    pub fn binding_key(&self) -> Option<&str> {
        match self {
            Constraint::Identifier { binding } => binding.as_deref(),
            _ => None,
        }
    }

    /// Check that the rule is satisfiable as written.
    ///
    /// `owner` is the display id of the blank carrying the constraint, so a
    /// same-as rule pointing at its own blank can be rejected.
    pub fn validate(&self, owner: Option<&DisplayId>) -> Result<()> {
        match self {
            Constraint::LiteralSet { accepted } => {
                if accepted.is_empty() {
                    return Err(GapfillError::InvalidConstraint(
                        "literal set accepts no values".to_string(),
                    ));
                }
            }
            Constraint::Number { min, max, one_of } => {
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(GapfillError::InvalidConstraint(format!(
                            "number range is empty: min {} > max {}",
                            lo, hi
                        )));
                    }
                }
                if one_of.as_ref().is_some_and(|v| v.is_empty()) {
                    return Err(GapfillError::InvalidConstraint(
                        "number set accepts no values".to_string(),
                    ));
                }
            }
            Constraint::StringPattern {
                pattern: Some(pattern),
                ..
            } => {
                regex_lite::Regex::new(pattern).map_err(|e| {
                    GapfillError::InvalidConstraint(format!(
                        "invalid pattern '{}': {}",
                        pattern, e
                    ))
                })?;
            }
            Constraint::SameAs { target } => {
                if owner == Some(target) {
                    return Err(GapfillError::InvalidConstraint(format!(
                        "blank {} cannot be the same as itself",
                        target
                    )));
                }
            }
            Constraint::Identifier { .. }
            | Constraint::StringPattern { .. }
            | Constraint::Expression { .. } => {}
        }
        Ok(())
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::LiteralSet { accepted } => write!(f, "one of {:?}", accepted),
            Constraint::Identifier { binding: None } => write!(f, "identifier"),
            Constraint::Identifier {
                binding: Some(key),
            } => write!(f, "identifier bound to '{}'", key),
            Constraint::Number { min, max, one_of } => {
                write!(f, "number")?;
                if let Some(values) = one_of {
                    write!(f, " in {:?}", values)?;
                }
                match (min, max) {
                    (None, None) => Ok(()),
                    (lo, hi) => write!(
                        f,
                        " [{}, {}]",
                        lo.map(|v| v.to_string()).unwrap_or_else(|| "-inf".to_string()),
                        hi.map(|v| v.to_string()).unwrap_or_else(|| "inf".to_string())
                    ),
                }
            }
            Constraint::StringPattern { one_of, pattern } => {
                write!(f, "string")?;
                if let Some(values) = one_of {
                    write!(f, " in {:?}", values)?;
                }
                if let Some(pattern) = pattern {
                    write!(f, " matching /{}/", pattern)?;
                }
                Ok(())
            }
            Constraint::Expression { canonical } => write!(f, "expression `{}`", canonical),
            Constraint::SameAs { target } => write!(f, "same as blank {}", target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_constraint_from_json() {
        let c: Constraint = serde_json::from_str(r#"{"kind":"number","min":0,"max":13}"#).unwrap();
        assert_eq!(c, Constraint::number_range(Some(0.0), Some(13.0)));
    }

    #[test]
    fn test_parse_same_as_from_toml() {
        let toml_str = r#"
kind = "same_as"
target = "2"
"#;
        let c: Constraint = toml::from_str(toml_str).unwrap();
        assert!(matches!(&c, Constraint::SameAs { target } if target.as_str() == "2"));
    }

    #[test]
    fn test_same_as_rejects_bad_target() {
        let result = serde_json::from_str::<Constraint>(r#"{"kind":"same_as","target":"a b"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unbound_identifier_serializes_without_binding() {
        let json = serde_json::to_string(&Constraint::identifier()).unwrap();
        assert_eq!(json, r#"{"kind":"identifier"}"#);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let c = Constraint::number_range(Some(10.0), Some(1.0));
        assert!(c.validate(None).is_err());
        assert!(Constraint::number_range(Some(1.0), None).validate(None).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_pattern() {
        assert!(Constraint::pattern("[a-z").validate(None).is_err());
        assert!(Constraint::pattern("[a-z]+").validate(None).is_ok());
    }

    #[test]
    fn test_validate_rejects_self_reference() {
        let id = DisplayId::from_number(2);
        let c = Constraint::same_as(id.clone());
        assert!(c.validate(Some(&id)).is_err());
        assert!(c.validate(Some(&DisplayId::from_number(1))).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_literal_set() {
        assert!(Constraint::literal_set(Vec::<String>::new()).validate(None).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Constraint::number_range(Some(0.0), Some(13.0)).to_string(),
            "number [0, 13]"
        );
        assert_eq!(
            Constraint::bound_identifier("loop_counter").to_string(),
            "identifier bound to 'loop_counter'"
        );
    }
}
