//! # Pipe Section Calculation
//!
//! Sizes one pipe section of a cold, hot or total water network per
//! SP 30.13330:
//!
//! 1. N·P = q_hru · U / (3600 · q_0)
//! 2. α from the N·P → α table
//! 3. q = 5 · q_0 · α (L/s)
//! 4. velocity, either read from the diameter's Q → v table or computed as
//!    4q / (πD²) depending on [`VelocityMode`]
//!
//! ## Example
//!
//! ```rust
//! use plumb_core::calculations::{calculate_sections, SectionRequest, PipeSection};
//! use plumb_core::reference::ReferenceDataset;
//!
//! let dataset = ReferenceDataset::standard().unwrap();
//! let request = SectionRequest::new(1, vec![
//!     PipeSection::new(1, 10.0, 20),
//!     PipeSection::new(2, 40.0, 32),
//! ]);
//! let batch = calculate_sections(dataset, &request).unwrap();
//! assert_eq!(batch.results.len(), 2);
//! assert!(batch.results[1].discharge > batch.results[0].discharge);
//! ```

use serde::{Deserialize, Serialize};

use super::{parse_number, BatchPolicy, VelocityMode};
use crate::equations;
use crate::errors::{CalcError, CalcResult};
use crate::reference::{ConsumerProfile, ReferenceDataset, Stream};
use crate::units::Millimeters;

/// One pipe section of the network.
///
/// ## JSON Example
///
/// ```json
/// { "U": 50, "D": 25 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipeSection {
    /// Ordinal number of the section, starting at 1
    #[serde(default)]
    pub index: usize,

    /// Number of fixtures (users) served, U
    #[serde(rename = "U")]
    pub fixtures: f64,

    /// Nominal diameter in mm, D
    #[serde(rename = "D")]
    pub diameter_mm: u32,
}

impl PipeSection {
    pub fn new(index: usize, fixtures: f64, diameter_mm: u32) -> Self {
        PipeSection {
            index,
            fixtures,
            diameter_mm,
        }
    }

    /// Build a section from form text.
    ///
    /// ```rust
    /// use plumb_core::calculations::PipeSection;
    ///
    /// let section = PipeSection::parse(2, " 12,5 ", "32").unwrap();
    /// assert_eq!(section.fixtures, 12.5);
    /// assert_eq!(section.diameter_mm, 32);
    /// assert!(PipeSection::parse(1, "Введите U", "25").is_err());
    /// ```
    pub fn parse(index: usize, u_text: &str, d_text: &str) -> CalcResult<Self> {
        let fixtures = parse_number("U", u_text)?;
        let d = parse_number("D", d_text)?;
        if d <= 0.0 || d.fract() != 0.0 || d > u32::MAX as f64 {
            return Err(CalcError::invalid_input(
                "D",
                d_text,
                "Diameter must be a whole positive number of millimeters",
            ));
        }
        let section = PipeSection::new(index, fixtures, d as u32);
        section.validate()?;
        Ok(section)
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        if !self.fixtures.is_finite() || self.fixtures <= 0.0 {
            return Err(CalcError::invalid_input(
                "U",
                self.fixtures.to_string(),
                "Fixture count must be a positive number",
            ));
        }
        if self.diameter_mm == 0 {
            return Err(CalcError::invalid_input(
                "D",
                "0",
                "Diameter must be positive",
            ));
        }
        Ok(())
    }
}

/// A batch of sections sharing one consumer type, stream and velocity mode.
///
/// ## JSON Example
///
/// ```json
/// {
///   "consumer": 1,
///   "stream": "hot",
///   "velocity_mode": "table_interpolation",
///   "policy": "collect_errors",
///   "sections": [ { "U": 10, "D": 20 }, { "U": 50, "D": 25 } ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRequest {
    /// Consumer selector t
    pub consumer: u32,

    #[serde(default)]
    pub stream: Stream,

    #[serde(default)]
    pub velocity_mode: VelocityMode,

    #[serde(default)]
    pub policy: BatchPolicy,

    pub sections: Vec<PipeSection>,
}

impl SectionRequest {
    /// Cold-water request with the default velocity mode and policy.
    pub fn new(consumer: u32, sections: Vec<PipeSection>) -> Self {
        SectionRequest {
            consumer,
            stream: Stream::default(),
            velocity_mode: VelocityMode::default(),
            policy: BatchPolicy::default(),
            sections,
        }
    }

    pub fn with_stream(mut self, stream: Stream) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_velocity_mode(mut self, mode: VelocityMode) -> Self {
        self.velocity_mode = mode;
        self
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Result of one section.
///
/// Field names follow the result table. For the hot and total streams
/// `q_chru`/`q_c0` carry that stream's constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Ordinal number of the section
    #[serde(rename = "section")]
    pub index: usize,

    /// Consumer selector
    pub t: u32,

    #[serde(rename = "U")]
    pub fixtures: f64,

    #[serde(rename = "D")]
    pub diameter_mm: u32,

    /// q_hru of the calculated stream (L/h)
    #[serde(rename = "q_chru")]
    pub q_hru: f64,

    /// q_0 of the calculated stream (L/s)
    #[serde(rename = "q_c0")]
    pub q0: f64,

    pub group: u32,

    /// Consumer category label
    pub consumer: String,

    /// Probability coefficient N·P
    #[serde(rename = "PcN")]
    pub probability: f64,

    pub alpha: f64,

    /// Design discharge (L/s)
    #[serde(rename = "Q")]
    pub discharge: f64,

    /// Velocity (m/s)
    pub velocity: f64,
}

/// Output of a section batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionBatch {
    /// Successful results in section order
    pub results: Vec<CalculationResult>,

    /// Section failures, each wrapped as `SectionFailed`. Only populated
    /// under [`BatchPolicy::CollectErrors`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<CalcError>,
}

impl SectionBatch {
    /// True when every section produced a result.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Calculate one section for an already resolved consumer profile.
///
/// Any failure is returned as `SectionFailed { index: section.index, .. }`.
pub fn calculate_section(
    dataset: &ReferenceDataset,
    profile: &ConsumerProfile,
    stream: Stream,
    section: &PipeSection,
    mode: VelocityMode,
) -> CalcResult<CalculationResult> {
    compute(dataset, profile, stream, section, mode).map_err(|e| e.in_section(section.index))
}

fn compute(
    dataset: &ReferenceDataset,
    profile: &ConsumerProfile,
    stream: Stream,
    section: &PipeSection,
    mode: VelocityMode,
) -> CalcResult<CalculationResult> {
    section.validate()?;
    let curve = dataset.curve_for(section.diameter_mm)?;
    let demand = profile.demand(stream);

    if demand.q0 == 0.0 {
        return Err(CalcError::division_by_zero(format!("q_{}_0", stream.code())));
    }
    let probability = equations::instantaneous_probability(demand.hru, section.fixtures, demand.q0);
    ensure_finite(probability, section.fixtures)?;
    let alpha = dataset.probability_curve().alpha(probability)?;
    let discharge = equations::design_discharge(demand.q0, alpha);
    ensure_finite(discharge.0, section.fixtures)?;

    let velocity = match mode {
        VelocityMode::TableInterpolation => curve.velocity(discharge.0)?,
        VelocityMode::ClosedFormPipeFlow => {
            equations::pipe_velocity(discharge, Millimeters(f64::from(section.diameter_mm))).0
        }
    };
    ensure_finite(velocity, section.fixtures)?;

    tracing::debug!(
        section = section.index,
        stream = stream.code(),
        probability,
        alpha,
        discharge = discharge.0,
        velocity,
        "section calculated"
    );

    Ok(CalculationResult {
        index: section.index,
        t: profile.t,
        fixtures: section.fixtures,
        diameter_mm: section.diameter_mm,
        q_hru: demand.hru,
        q0: demand.q0,
        group: profile.group,
        consumer: profile.label.clone(),
        probability,
        alpha,
        discharge: discharge.0,
        velocity,
    })
}

/// Reject a derived value that overflowed for a huge fixture count.
pub(crate) fn ensure_finite(value: f64, fixtures: f64) -> CalcResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::invalid_input(
            "U",
            fixtures.to_string(),
            "Fixture count is too large to calculate",
        ))
    }
}

/// Resolve the consumer type and run the whole batch.
pub fn calculate_sections(dataset: &ReferenceDataset, request: &SectionRequest) -> CalcResult<SectionBatch> {
    let profile = dataset.profile_for(request.consumer)?;
    calculate_batch(dataset, profile, request)
}

/// Run a batch against an already resolved profile.
///
/// Sections are numbered by position, starting at 1, regardless of the
/// `index` they carry.
pub fn calculate_batch(
    dataset: &ReferenceDataset,
    profile: &ConsumerProfile,
    request: &SectionRequest,
) -> CalcResult<SectionBatch> {
    tracing::debug!(
        consumer = profile.t,
        stream = request.stream.code(),
        mode = ?request.velocity_mode,
        sections = request.sections.len(),
        "running section batch"
    );

    let mut batch = SectionBatch::default();
    for (position, section) in request.sections.iter().enumerate() {
        let numbered = PipeSection {
            index: position + 1,
            ..*section
        };
        match calculate_section(dataset, profile, request.stream, &numbered, request.velocity_mode) {
            Ok(result) => batch.results.push(result),
            Err(err) => match request.policy {
                BatchPolicy::StopOnFirstError => return Err(err),
                BatchPolicy::CollectErrors => {
                    tracing::warn!(section = numbered.index, error = %err, "section failed");
                    batch.failures.push(err);
                }
            },
        }
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{DiameterVelocityCurve, ProbabilityAlphaCurve, StreamDemand};

    /// Dataset with round numbers that can be checked by hand.
    fn scenario_dataset() -> ReferenceDataset {
        let curve = ProbabilityAlphaCurve::new(vec![0.0, 10.0, 20.0], vec![0.0, 0.2, 1.0]).unwrap();
        let cold = StreamDemand::new(300.0, 0.3, 300.0, 250.0);
        let no_hot = StreamDemand::new(0.0, 0.0, 0.0, 0.0);
        ReferenceDataset::builder(curve)
            .consumer(ConsumerProfile::new(1, 1, "Scenario", cold, no_hot, cold).unwrap())
            .diameter(DiameterVelocityCurve::new(25, vec![0.0, 1.0, 2.0], vec![0.0, 0.5, 1.0]).unwrap())
            .diameter(DiameterVelocityCurve::new(50, vec![0.0, 4.0, 8.0], vec![0.0, 0.5, 1.0]).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_scenario_table_interpolation() {
        let dataset = scenario_dataset();
        let request = SectionRequest::new(1, vec![PipeSection::new(1, 50.0, 25)]);
        let batch = calculate_sections(&dataset, &request).unwrap();
        let r = &batch.results[0];

        assert!((r.probability - 13.8889).abs() < 1e-4);
        assert!((r.alpha - 0.5111).abs() < 1e-4);
        assert!((r.discharge - 0.7667).abs() < 1e-4);
        assert!((r.velocity - 0.3833).abs() < 1e-4);
        assert_eq!(r.q_hru, 300.0);
        assert_eq!(r.q0, 0.3);
        assert_eq!(r.consumer, "Scenario");
    }

    #[test]
    fn test_scenario_closed_form() {
        let dataset = scenario_dataset();
        let request = SectionRequest::new(1, vec![PipeSection::new(1, 50.0, 25)])
            .with_velocity_mode(VelocityMode::ClosedFormPipeFlow);
        let r = &calculate_sections(&dataset, &request).unwrap().results[0];
        // 4 · 0.0007667 / (π · 0.025²)
        assert!((r.velocity - 1.5619).abs() < 1e-3);
    }

    #[test]
    fn test_closed_form_doubling_diameter() {
        let dataset = scenario_dataset();
        let request = SectionRequest::new(
            1,
            vec![PipeSection::new(1, 50.0, 25), PipeSection::new(2, 50.0, 50)],
        )
        .with_velocity_mode(VelocityMode::ClosedFormPipeFlow);
        let batch = calculate_sections(&dataset, &request).unwrap();
        let ratio = batch.results[0].velocity / batch.results[1].velocity;
        assert!((ratio - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_closed_form_still_requires_known_diameter() {
        let dataset = scenario_dataset();
        let request = SectionRequest::new(1, vec![PipeSection::new(1, 50.0, 32)])
            .with_velocity_mode(VelocityMode::ClosedFormPipeFlow);
        let err = calculate_sections(&dataset, &request).unwrap_err();
        assert_eq!(err, CalcError::UnknownDiameter { diameter_mm: 32 }.in_section(1));
    }

    #[test]
    fn test_unknown_consumer_fails_whole_batch() {
        let dataset = scenario_dataset();
        let request = SectionRequest::new(7, vec![PipeSection::new(1, 50.0, 25)]);
        let err = calculate_sections(&dataset, &request).unwrap_err();
        assert_eq!(err, CalcError::UnknownConsumerType { selector: 7 });
    }

    #[test]
    fn test_zero_q0_is_division_by_zero() {
        let dataset = scenario_dataset();
        let request = SectionRequest::new(1, vec![PipeSection::new(1, 50.0, 25)]).with_stream(Stream::Hot);
        let err = calculate_sections(&dataset, &request).unwrap_err();
        assert_eq!(err.error_code(), "SECTION_FAILED");
        assert_eq!(err.root_cause(), &CalcError::division_by_zero("q_h_0"));
    }

    #[test]
    fn test_non_positive_fixtures_rejected() {
        let dataset = scenario_dataset();
        let request = SectionRequest::new(1, vec![PipeSection::new(1, 0.0, 25)]);
        let err = calculate_sections(&dataset, &request).unwrap_err();
        assert_eq!(err.root_cause().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_overflowing_fixtures_rejected() {
        let dataset = ReferenceDataset::standard().unwrap();
        for mode in VelocityMode::ALL {
            let request = SectionRequest::new(1, vec![PipeSection::new(1, 1e308, 25)]).with_velocity_mode(mode);
            let err = calculate_sections(dataset, &request).unwrap_err();
            match err.root_cause() {
                CalcError::InvalidInput { field, .. } => assert_eq!(field, "U"),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn test_stop_on_first_error_reports_position() {
        let dataset = scenario_dataset();
        let request = SectionRequest::new(
            1,
            vec![
                PipeSection::new(0, 10.0, 25),
                PipeSection::new(0, 10.0, 99),
                PipeSection::new(0, 10.0, 77),
            ],
        );
        let err = calculate_sections(&dataset, &request).unwrap_err();
        match err {
            CalcError::SectionFailed { index, .. } => assert_eq!(index, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_collect_errors_keeps_going() {
        let dataset = scenario_dataset();
        let request = SectionRequest::new(
            1,
            vec![
                PipeSection::new(1, 10.0, 25),
                PipeSection::new(2, 10.0, 99),
                PipeSection::new(3, 20.0, 50),
            ],
        )
        .with_policy(BatchPolicy::CollectErrors);
        let batch = calculate_sections(&dataset, &request).unwrap();
        assert!(!batch.is_complete());
        assert_eq!(batch.results.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(batch.failures, vec![CalcError::UnknownDiameter { diameter_mm: 99 }.in_section(2)]);
    }

    #[test]
    fn test_request_json() {
        let json = r#"{ "consumer": 1, "stream": "hot", "sections": [ { "U": 10, "D": 20 } ] }"#;
        let request: SectionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.stream, Stream::Hot);
        assert_eq!(request.velocity_mode, VelocityMode::TableInterpolation);
        assert_eq!(request.policy, BatchPolicy::StopOnFirstError);
        assert_eq!(request.sections[0].diameter_mm, 20);
    }

    #[test]
    fn test_result_serializes_with_table_names() {
        let dataset = scenario_dataset();
        let request = SectionRequest::new(1, vec![PipeSection::new(1, 50.0, 25)]);
        let batch = calculate_sections(&dataset, &request).unwrap();
        let json = serde_json::to_string(&batch).unwrap();
        for key in ["\"PcN\"", "\"q_chru\"", "\"q_c0\"", "\"Q\"", "\"velocity\""] {
            assert!(json.contains(key), "missing {key}");
        }
        assert!(!json.contains("failures"));
    }

    #[test]
    fn test_parse_rejects_fractional_diameter() {
        assert!(PipeSection::parse(1, "10", "25.5").is_err());
        assert!(PipeSection::parse(1, "-3", "25").is_err());
        assert_eq!(PipeSection::parse(1, "10", " 25 ").unwrap().diameter_mm, 25);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn results_grow_with_fixtures(
            a in 1.0_f64..2000.0,
            b in 1.0_f64..2000.0,
            t in 1u32..=14,
        ) {
            let dataset = ReferenceDataset::standard().unwrap();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let request = SectionRequest::new(
                t,
                vec![PipeSection::new(1, lo, 50), PipeSection::new(2, hi, 50)],
            );
            let batch = calculate_sections(dataset, &request).unwrap();
            let (r_lo, r_hi) = (&batch.results[0], &batch.results[1]);
            // one ulp of slack where a segment meets the next knot
            prop_assert!(r_lo.probability <= r_hi.probability);
            prop_assert!(r_lo.alpha <= r_hi.alpha + 1e-12);
            prop_assert!(r_lo.discharge <= r_hi.discharge + 1e-12);
        }
    }
}
