//! # Water-Supply Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` / request types - parameters (JSON-serializable)
//! - `*Result` / report types - results (JSON-serializable)
//! - a pure `calculate_*` function returning `CalcResult`
//!
//! ## Available Calculations
//!
//! - [`section`] - Per-section probability, flow coefficient, discharge and velocity
//! - [`aggregate`] - The 25-row battery of building flows and heat loads

pub mod aggregate;
pub mod section;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

pub use aggregate::{calculate_loads, AggregateQuantity, AggregateReport, AggregateRow, LoadInput};
pub use section::{
    calculate_batch, calculate_section, calculate_sections, CalculationResult, PipeSection,
    SectionBatch, SectionRequest,
};

/// How the velocity in a pipe section is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VelocityMode {
    /// Interpolate the tabulated discharge → velocity curve of the diameter
    #[default]
    TableInterpolation,
    /// v = 4Q / (πD²) for a full circular pipe
    ClosedFormPipeFlow,
}

impl VelocityMode {
    pub const ALL: [VelocityMode; 2] = [VelocityMode::TableInterpolation, VelocityMode::ClosedFormPipeFlow];

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "table" | "table_interpolation" | "interpolation" => Ok(VelocityMode::TableInterpolation),
            "formula" | "closed_form" | "closed_form_pipe_flow" => Ok(VelocityMode::ClosedFormPipeFlow),
            _ => Err(CalcError::invalid_input(
                "velocity_mode",
                s,
                "Expected one of: table, formula",
            )),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            VelocityMode::TableInterpolation => "Table interpolation",
            VelocityMode::ClosedFormPipeFlow => "Closed-form pipe flow",
        }
    }
}

impl std::fmt::Display for VelocityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// What a section batch does when one section fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Abort the batch with the first failure
    #[default]
    StopOnFirstError,
    /// Calculate every section and report failures alongside the results
    CollectErrors,
}

impl BatchPolicy {
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "stop" | "stop_on_first_error" => Ok(BatchPolicy::StopOnFirstError),
            "collect" | "collect_errors" => Ok(BatchPolicy::CollectErrors),
            _ => Err(CalcError::invalid_input(
                "policy",
                s,
                "Expected one of: stop, collect",
            )),
        }
    }
}

/// Parse a number typed into a form field. Accepts surrounding whitespace and
/// a decimal comma.
pub(crate) fn parse_number(field: &str, text: &str) -> CalcResult<f64> {
    let value = text
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| CalcError::invalid_input(field, text, "Not a number"))?;
    if !value.is_finite() {
        return Err(CalcError::invalid_input(field, text, "Value must be finite"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("U", " 12,5 ").unwrap(), 12.5);
        assert_eq!(parse_number("U", "40").unwrap(), 40.0);
        assert!(parse_number("U", "Введите U").is_err());
        assert!(parse_number("U", "inf").is_err());
        assert!(parse_number("U", "").is_err());
    }

    #[test]
    fn test_velocity_mode_parsing() {
        assert_eq!(VelocityMode::from_str_flexible("table").unwrap(), VelocityMode::TableInterpolation);
        assert_eq!(VelocityMode::from_str_flexible("Closed-Form").unwrap(), VelocityMode::ClosedFormPipeFlow);
        assert!(VelocityMode::from_str_flexible("guess").is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(VelocityMode::default(), VelocityMode::TableInterpolation);
        assert_eq!(BatchPolicy::default(), BatchPolicy::StopOnFirstError);
    }

    #[test]
    fn test_mode_serialization() {
        let json = serde_json::to_string(&VelocityMode::ClosedFormPipeFlow).unwrap();
        assert_eq!(json, "\"closed_form_pipe_flow\"");
        let policy: BatchPolicy = serde_json::from_str("\"collect_errors\"").unwrap();
        assert_eq!(policy, BatchPolicy::CollectErrors);
    }
}
