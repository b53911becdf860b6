//! # Error Types
//!
//! Domain-specific error types for sparks-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sparks-core errors (this file)                                        │
//! │  ├── DecodeError      - A stored row does not fit its entity           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  sparks-db errors (separate crate)                                     │
//! │  └── DbError          - Storage operation failures                     │
//! │                                                                         │
//! │  back office errors (in app)                                           │
//! │  └── AppError         - What the operator sees                         │
//! │                                                                         │
//! │  Flow: DecodeError → DbError → AppError → notification                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Programmer errors (a field reference naming an attribute its entity does
//! not declare, a join on a non-association) are not represented here: they
//! panic at the call site.

use thiserror::Error;

// =============================================================================
// Decode Error
// =============================================================================

/// A row read from storage could not be turned into an entity.
///
/// ## When This Occurs
/// - A column the entity needs is absent from the row
/// - A column holds a value of the wrong kind (text where a number belongs)
/// - A join attaches a row under an association the entity doesn't have
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The row has no such column.
    #[error("column '{column}' missing from row")]
    MissingColumn { column: String },

    /// The column holds an incompatible value.
    #[error("column '{column}' expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The column is NULL but the entity requires a value.
    #[error("column '{column}' is null")]
    UnexpectedNull { column: String },

    /// Text could not be parsed as a date or timestamp.
    #[error("column '{column}' has invalid {expected}: {value}")]
    InvalidFormat {
        column: String,
        expected: &'static str,
        value: String,
    },

    /// `attach` was called with an association the entity does not declare.
    #[error("{entity} has no association named '{association}'")]
    UnknownAssociation {
        entity: &'static str,
        association: String,
    },
}

impl DecodeError {
    /// Creates a MissingColumn error.
    pub fn missing(column: impl Into<String>) -> Self {
        DecodeError::MissingColumn {
            column: column.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input doesn't meet requirements.
/// Used for early validation before any storage call runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., an email without '@').
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_messages() {
        let err = DecodeError::TypeMismatch {
            column: "price_cents".to_string(),
            expected: "integer",
            found: "text",
        };
        assert_eq!(
            err.to_string(),
            "column 'price_cents' expected integer, found text"
        );
        assert_eq!(
            DecodeError::missing("name").to_string(),
            "column 'name' missing from row"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "email is required");

        let err = ValidationError::Negative {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must not be negative");
    }
}
