//! Tabulated design curves
//!
//! - [`ProbabilityAlphaCurve`]: N·P → α (SP 30.13330 appendix B)
//! - [`DiameterVelocityCurve`]: discharge → velocity for one nominal diameter
//!
//! Both validate their knots on construction, so evaluation only has to deal
//! with the query value.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::interpolation::Curve;

/// Check the shared knot invariants: ≥ 2 points, equal lengths, finite
/// values, strictly increasing x.
fn validate_knots(table: &str, xs: &[f64], ys: &[f64]) -> CalcResult<()> {
    if xs.len() < 2 {
        return Err(CalcError::invalid_reference_data(
            table,
            format!("need at least 2 points, got {}", xs.len()),
        ));
    }
    if xs.len() != ys.len() {
        return Err(CalcError::invalid_reference_data(
            table,
            format!("{} x values but {} y values", xs.len(), ys.len()),
        ));
    }
    if let Some(bad) = xs.iter().chain(ys.iter()).find(|v| !v.is_finite()) {
        return Err(CalcError::invalid_reference_data(
            table,
            format!("non-finite value {bad}"),
        ));
    }
    if let Some(i) = xs.windows(2).position(|w| w[0] >= w[1]) {
        return Err(CalcError::invalid_reference_data(
            table,
            format!(
                "x values must be strictly increasing ({} then {} at index {})",
                xs[i],
                xs[i + 1],
                i + 1
            ),
        ));
    }
    Ok(())
}

/// Flow coefficient α as a function of the probability coefficient N·P
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "KnotTable")]
pub struct ProbabilityAlphaCurve {
    x_values: Vec<f64>,
    y_values: Vec<f64>,
}

#[derive(Deserialize)]
struct KnotTable {
    x_values: Vec<f64>,
    y_values: Vec<f64>,
}

impl TryFrom<KnotTable> for ProbabilityAlphaCurve {
    type Error = CalcError;

    fn try_from(table: KnotTable) -> CalcResult<Self> {
        ProbabilityAlphaCurve::new(table.x_values, table.y_values)
    }
}

impl ProbabilityAlphaCurve {
    pub const TABLE: &'static str = "probability→alpha";

    /// Build a curve from parallel N·P and α sequences.
    pub fn new(x_values: Vec<f64>, y_values: Vec<f64>) -> CalcResult<Self> {
        validate_knots(Self::TABLE, &x_values, &y_values)?;
        Ok(Self { x_values, y_values })
    }

    pub fn x_values(&self) -> &[f64] {
        &self.x_values
    }

    pub fn y_values(&self) -> &[f64] {
        &self.y_values
    }

    /// α for the given N·P
    pub fn alpha(&self, probability: f64) -> CalcResult<f64> {
        self.evaluate(probability)
    }

    /// α at N·P = 0, i.e. the value every α-derived quantity keeps when no
    /// fixtures are connected.
    pub fn intercept(&self) -> CalcResult<f64> {
        self.evaluate(0.0)
    }
}

impl Curve for ProbabilityAlphaCurve {
    fn table_name(&self) -> String {
        Self::TABLE.to_string()
    }

    fn knots(&self) -> (&[f64], &[f64]) {
        (&self.x_values, &self.y_values)
    }
}

/// Velocity as a function of discharge for one nominal pipe diameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VelocityTable")]
pub struct DiameterVelocityCurve {
    /// Nominal diameter (mm)
    #[serde(rename = "d")]
    diameter_mm: u32,
    /// Discharge knots (L/s)
    q_values: Vec<f64>,
    /// Velocity knots (m/s)
    v_values: Vec<f64>,
}

#[derive(Deserialize)]
struct VelocityTable {
    d: u32,
    q_values: Vec<f64>,
    v_values: Vec<f64>,
}

impl TryFrom<VelocityTable> for DiameterVelocityCurve {
    type Error = CalcError;

    fn try_from(table: VelocityTable) -> CalcResult<Self> {
        DiameterVelocityCurve::new(table.d, table.q_values, table.v_values)
    }
}

impl DiameterVelocityCurve {
    /// Build a velocity curve for diameter `diameter_mm`.
    pub fn new(diameter_mm: u32, q_values: Vec<f64>, v_values: Vec<f64>) -> CalcResult<Self> {
        if diameter_mm == 0 {
            return Err(CalcError::invalid_reference_data(
                "pipe velocity",
                "diameter must be a positive number of millimeters",
            ));
        }
        validate_knots(&format!("velocity D{diameter_mm}"), &q_values, &v_values)?;
        Ok(Self {
            diameter_mm,
            q_values,
            v_values,
        })
    }

    pub fn diameter_mm(&self) -> u32 {
        self.diameter_mm
    }

    pub fn q_values(&self) -> &[f64] {
        &self.q_values
    }

    pub fn v_values(&self) -> &[f64] {
        &self.v_values
    }

    /// Velocity (m/s) for discharge `q` (L/s)
    pub fn velocity(&self, q: f64) -> CalcResult<f64> {
        self.evaluate(q)
    }
}

impl Curve for DiameterVelocityCurve {
    fn table_name(&self) -> String {
        format!("velocity D{}", self.diameter_mm)
    }

    fn knots(&self) -> (&[f64], &[f64]) {
        (&self.q_values, &self.v_values)
    }
}
