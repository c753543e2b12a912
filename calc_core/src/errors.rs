//! # Error Types
//!
//! Structured error types for calc_core. Every failure a calculator can hit
//! is resolved into one of these variants and handed back to the caller as a
//! value; nothing escapes a calculator as a panic.
//!
//! The variants follow the four failure classes a field calculation has:
//!
//! - **Input errors** ([`CalcError::InvalidInput`], [`CalcError::MissingField`]):
//!   detected before any table is consulted.
//! - **Lookup misses** ([`CalcError::DataNotFound`], [`CalcError::TableNotFound`]):
//!   each input was valid on its own but the combination has no reference row.
//! - **Derived failures** ([`CalcError::CalculationFailed`]): division by zero,
//!   degenerate geometry, or a search that found nothing.
//! - **Unexpected failures** ([`CalcError::Internal`]).
//!
//! ## Example
//!
//! ```rust
//! use calc_core::errors::{CalcError, CalcResult};
//!
//! fn validate_length(length_ft: f64) -> CalcResult<()> {
//!     if length_ft <= 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "One-Way Length",
//!             length_ft.to_string(),
//!             "Length must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for calc_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value could not be parsed or is out of its domain
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// No reference row exists for a key combination
    #[error("Data not found in {table} for {key}")]
    DataNotFound { table: String, key: String },

    /// No interpolation table exists for the requested selector
    #[error("Table not found: {table} for {key}")]
    TableNotFound { table: String, key: String },

    /// Calculation failed (division by zero, no valid layout, etc.)
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// Bundled data, settings, or JSON could not be (de)serialized
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Anything else, caught at the calculator boundary
    #[error("Calculation error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create a DataNotFound error
    pub fn data_not_found(table: impl Into<String>, key: impl Into<String>) -> Self {
        CalcError::DataNotFound {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Create a TableNotFound error
    pub fn table_not_found(table: impl Into<String>, key: impl Into<String>) -> Self {
        CalcError::TableNotFound {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(calculation_type: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        CalcError::Internal {
            message: message.into(),
        }
    }

    /// True when the inputs were individually valid but the combination has
    /// no reference data.
    pub fn is_lookup_miss(&self) -> bool {
        matches!(self, CalcError::DataNotFound { .. } | CalcError::TableNotFound { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::DataNotFound { .. } => "DATA_NOT_FOUND",
            CalcError::TableNotFound { .. } => "TABLE_NOT_FOUND",
            CalcError::CalculationFailed { .. } => "CALCULATION_FAILED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<toml::de::Error> for CalcError {
    fn from(err: toml::de::Error) -> Self {
        CalcError::serialization(err.to_string())
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("Room Length", "abc", "Not a valid number");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("test").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::data_not_found("ampacity", "x").error_code(), "DATA_NOT_FOUND");
        assert_eq!(CalcError::table_not_found("cu", "80/50/20").error_code(), "TABLE_NOT_FOUND");
    }

    #[test]
    fn test_lookup_miss_classification() {
        assert!(CalcError::data_not_found("ampacity", "x").is_lookup_miss());
        assert!(CalcError::table_not_found("cu", "x").is_lookup_miss());
        assert!(!CalcError::invalid_input("a", "b", "c").is_lookup_miss());
    }

    #[test]
    fn test_internal_message() {
        let err = CalcError::internal("boom");
        assert_eq!(err.to_string(), "Calculation error: boom");
    }
}
