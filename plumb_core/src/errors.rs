//! # Error Types
//!
//! Structured error types for plumb_core. Every failure names the quantity
//! or input that caused it so a caller can point the user at the offending
//! field or pipe section.
//!
//! ## Example
//!
//! ```rust
//! use plumb_core::errors::{CalcError, CalcResult};
//!
//! fn validate_fixtures(u: f64) -> CalcResult<()> {
//!     if u <= 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "U",
//!             u.to_string(),
//!             "Fixture count must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for plumb_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
///
/// Errors are scoped to a single calculation request; none of them is fatal
/// to the process and the engine never retries.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// A user-supplied value is unparsable, non-finite or out of range
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Consumer selector not present in the reference dataset
    #[error("Unknown consumer type: t={selector}")]
    UnknownConsumerType { selector: u32 },

    /// Pipe diameter has no velocity curve in the reference dataset
    #[error("Unknown pipe diameter: D={diameter_mm} mm")]
    UnknownDiameter { diameter_mm: u32 },

    /// A reference constant used as a divisor is zero
    #[error("Division by zero while computing {quantity}")]
    DivisionByZero { quantity: String },

    /// Degenerate table or no bracketing segment found
    #[error("Interpolation failed in {table} at x={x}: {reason}")]
    Interpolation {
        table: String,
        x: f64,
        reason: String,
    },

    /// Failure raised while calculating one pipe section
    #[error("Section {index}: {source}")]
    SectionFailed {
        index: usize,
        source: Box<CalcError>,
    },

    /// Reference tables violate a dataset invariant
    #[error("Invalid reference data in {table}: {reason}")]
    InvalidReferenceData { table: String, reason: String },

    /// A load calculation was requested before any section run succeeded
    #[error("No completed section calculation: run the hydraulic calculation first")]
    NoPriorCalculation,

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON/TOML/CSV serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
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

    /// Create a DivisionByZero error
    pub fn division_by_zero(quantity: impl Into<String>) -> Self {
        CalcError::DivisionByZero {
            quantity: quantity.into(),
        }
    }

    /// Create an Interpolation error
    pub fn interpolation(table: impl Into<String>, x: f64, reason: impl Into<String>) -> Self {
        CalcError::Interpolation {
            table: table.into(),
            x,
            reason: reason.into(),
        }
    }

    /// Create an InvalidReferenceData error
    pub fn invalid_reference_data(table: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidReferenceData {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    /// Attach pipe-section context to an error.
    ///
    /// Errors that already carry a section index are returned unchanged.
    pub fn in_section(self, index: usize) -> Self {
        match self {
            CalcError::SectionFailed { .. } => self,
            other => CalcError::SectionFailed {
                index,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through section context.
    pub fn root_cause(&self) -> &CalcError {
        match self {
            CalcError::SectionFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::UnknownConsumerType { .. } => "UNKNOWN_CONSUMER_TYPE",
            CalcError::UnknownDiameter { .. } => "UNKNOWN_DIAMETER",
            CalcError::DivisionByZero { .. } => "DIVISION_BY_ZERO",
            CalcError::Interpolation { .. } => "INTERPOLATION_FAILED",
            CalcError::SectionFailed { .. } => "SECTION_FAILED",
            CalcError::InvalidReferenceData { .. } => "INVALID_REFERENCE_DATA",
            CalcError::NoPriorCalculation => "NO_PRIOR_CALCULATION",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::serialization(err.to_string())
    }
}

impl From<csv::Error> for CalcError {
    fn from(err: csv::Error) -> Self {
        CalcError::serialization(err.to_string())
    }
}
