//! Post-binding validation hook.
//!
//! The binder does not check values semantically. A record that wants its
//! fields checked implements [`Validate`] and opts in with
//! `#[bind(validate)]`; the body binder then calls it on the populated record.

use std::fmt;

use thiserror::Error;

/// Record types that can report field-level validation failures.
///
/// # Example
///
/// ```rust
/// use archimedes_bind::{FieldViolation, Validate};
///
/// struct Signup {
///     name: String,
/// }
///
/// impl Validate for Signup {
///     fn validate(&self) -> Vec<FieldViolation> {
///         let mut violations = Vec::new();
///         if self.name.len() < 3 {
///             violations.push(FieldViolation::new("name", "must be at least 3 characters"));
///         }
///         violations
///     }
/// }
///
/// let signup = Signup { name: "al".into() };
/// assert_eq!(signup.validate().len(), 1);
/// ```
pub trait Validate {
    /// Returns every violation found on `self`; empty means valid.
    fn validate(&self) -> Vec<FieldViolation>;
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    field: String,
    message: String,
}

impl FieldViolation {
    /// Creates a violation for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the violation message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The record was bound but failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", join(.violations))]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

fn join(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Creates a validation error from the collected violations.
    #[must_use]
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    /// Returns the violations in the order the hook reported them.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Consumes the error and returns the violations.
    #[must_use]
    pub fn into_violations(self) -> Vec<FieldViolation> {
        self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display() {
        let violation = FieldViolation::new("email", "invalid format");
        assert_eq!(violation.field(), "email");
        assert_eq!(violation.message(), "invalid format");
        assert_eq!(violation.to_string(), "email: invalid format");
    }

    #[test]
    fn test_validation_error_lists_all_fields() {
        let err = ValidationError::new(vec![
            FieldViolation::new("name", "too short"),
            FieldViolation::new("age", "must be positive"),
        ]);

        assert_eq!(err.violations().len(), 2);
        assert_eq!(
            err.to_string(),
            "validation failed: name: too short; age: must be positive"
        );
        assert_eq!(err.into_violations()[1].field(), "age");
    }
}
