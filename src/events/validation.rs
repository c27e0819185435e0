//! Validation machinery shared by the event factories.
//!
//! Validation rules are enumerated per event type in the factory modules; this
//! module provides the error shape (which reports *every* violated rule, not
//! just the first) and the markup-stripping helper behind the "no markup"
//! rule.

use std::fmt;
use thiserror::Error;

/// A single violated validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The field the rule applies to.
    pub field: &'static str,
    /// A precise, caller-facing explanation of the violation.
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Violation {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Client-supplied data violated one or more schema rules.
///
/// Carries the full list of violations so the caller can report all problems
/// at once instead of fixing them one round-trip at a time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        debug_assert!(!violations.is_empty());
        ValidationError { violations }
    }

    /// Returns `Err` if any violations were collected, `Ok` otherwise.
    pub fn from_violations(violations: Vec<Violation>) -> Result<(), ValidationError> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations))
        }
    }

    /// The caller-facing messages, in rule-declaration order.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .violations
            .iter()
            .map(|v| v.message.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{joined}")
    }
}

/// Removes `<...>` tag sequences from the input.
///
/// The validation rules only need to know whether a value *differs* from its
/// tag-stripped form; anything inside angle brackets is treated as markup. An
/// unterminated `<` strips to the end of the string, so a dangling bracket is
/// also flagged as markup.
pub fn strip_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strip_markup_leaves_plain_text_alone() {
        assert_eq!(strip_markup("hello world"), "hello world");
        assert_eq!(strip_markup(""), "");
    }

    #[test]
    fn strip_markup_removes_tags_keeps_content() {
        assert_eq!(strip_markup("hello <b>world</b>"), "hello world");
        assert_eq!(strip_markup("<script>alert(1)</script>"), "alert(1)");
    }

    #[test]
    fn strip_markup_handles_unterminated_tag() {
        assert_eq!(strip_markup("hello <b world"), "hello ");
    }

    #[test]
    fn display_joins_all_violation_messages() {
        let err = ValidationError::new(vec![
            Violation::new("name", "A name is required."),
            Violation::new("url", "A url is required."),
        ]);
        assert_eq!(err.to_string(), "A name is required. A url is required.");
    }

    #[test]
    fn from_violations_is_ok_when_empty() {
        assert!(ValidationError::from_violations(vec![]).is_ok());
        assert!(
            ValidationError::from_violations(vec![Violation::new("f", "bad")]).is_err()
        );
    }

    proptest! {
        /// Stripping is idempotent: a stripped string contains no markup.
        #[test]
        fn strip_markup_idempotent(s in ".{0,200}") {
            let once = strip_markup(&s);
            let twice = strip_markup(&once);
            prop_assert_eq!(once, twice);
        }

        /// Tag-free strings survive stripping unchanged.
        #[test]
        fn tag_free_strings_unchanged(s in "[^<>]{0,200}") {
            prop_assert_eq!(strip_markup(&s), s);
        }
    }
}
