//! # Reference Dataset
//!
//! Immutable design tables of the SP 30.13330 methodology:
//!
//! - **Consumers**: demand constants per consumer category (appendix A)
//! - **Probability curve**: N·P → α (appendix B)
//! - **Velocity curves**: discharge → velocity per nominal pipe diameter
//!
//! The shipped tables are embedded TOML files, parsed once on first use and
//! shared for the lifetime of the process. Custom tables can be loaded from
//! a directory holding the same three files, or assembled in code with
//! [`ReferenceDatasetBuilder`].
//!
//! ## Example
//!
//! ```rust
//! use plumb_core::reference::ReferenceDataset;
//!
//! let dataset = ReferenceDataset::standard().unwrap();
//! let profile = dataset.profile_for(1).unwrap();
//! assert!(profile.cold.q0 > 0.0);
//! assert!(dataset.supported_diameters().contains(&25));
//! ```

pub mod consumers;
pub mod curves;

pub use consumers::{parse_selector, ConsumerProfile, Stream, StreamDemand};
pub use curves::{DiameterVelocityCurve, ProbabilityAlphaCurve};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::errors::{CalcError, CalcResult};

/// File names of the three reference tables
pub const CONSUMERS_FILE: &str = "consumers.toml";
pub const PROBABILITY_FILE: &str = "probability_alpha.toml";
pub const VELOCITY_FILE: &str = "pipe_velocity.toml";

const CONSUMERS_TOML: &str = include_str!("../../data/consumers.toml");
const PROBABILITY_TOML: &str = include_str!("../../data/probability_alpha.toml");
const VELOCITY_TOML: &str = include_str!("../../data/pipe_velocity.toml");

static STANDARD: OnceCell<ReferenceDataset> = OnceCell::new();

#[derive(Deserialize)]
struct ConsumersFile {
    consumer: Vec<ConsumerProfile>,
}

#[derive(Deserialize)]
struct VelocityFile {
    diameter: Vec<DiameterVelocityCurve>,
}

/// The complete set of reference tables.
///
/// Lookups are keyed and return an explicit error when the key is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDataset {
    consumers: BTreeMap<u32, ConsumerProfile>,
    probability: ProbabilityAlphaCurve,
    velocity: BTreeMap<u32, DiameterVelocityCurve>,
}

impl ReferenceDataset {
    /// The dataset shipped with the crate, parsed on first use.
    pub fn standard() -> CalcResult<&'static ReferenceDataset> {
        STANDARD.get_or_try_init(|| {
            let dataset = Self::from_toml(CONSUMERS_TOML, PROBABILITY_TOML, VELOCITY_TOML)?;
            tracing::debug!(
                consumers = dataset.consumers.len(),
                diameters = dataset.velocity.len(),
                knots = dataset.probability.x_values().len(),
                "loaded standard reference dataset"
            );
            Ok(dataset)
        })
    }

    /// Parse a dataset from the text of the three TOML tables.
    pub fn from_toml(consumers: &str, probability: &str, velocity: &str) -> CalcResult<Self> {
        let consumers: ConsumersFile = toml::from_str(consumers)
            .map_err(|e| CalcError::invalid_reference_data(CONSUMERS_FILE, e.to_string()))?;
        let probability: ProbabilityAlphaCurve = toml::from_str(probability)
            .map_err(|e| CalcError::invalid_reference_data(PROBABILITY_FILE, e.to_string()))?;
        let velocity: VelocityFile = toml::from_str(velocity)
            .map_err(|e| CalcError::invalid_reference_data(VELOCITY_FILE, e.to_string()))?;

        let mut builder = ReferenceDatasetBuilder::new(probability);
        for profile in consumers.consumer {
            builder = builder.consumer(profile);
        }
        for curve in velocity.diameter {
            builder = builder.diameter(curve);
        }
        builder.build()
    }

    /// Load a dataset from a directory containing `consumers.toml`,
    /// `probability_alpha.toml` and `pipe_velocity.toml`.
    pub fn load_dir(dir: &Path) -> CalcResult<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path).map_err(|e| {
                CalcError::file_error("read", path.display().to_string(), e.to_string())
            })
        };
        let dataset = Self::from_toml(
            &read(CONSUMERS_FILE)?,
            &read(PROBABILITY_FILE)?,
            &read(VELOCITY_FILE)?,
        )?;
        tracing::info!(path = %dir.display(), "loaded custom reference dataset");
        Ok(dataset)
    }

    /// Start assembling a dataset in code.
    pub fn builder(probability: ProbabilityAlphaCurve) -> ReferenceDatasetBuilder {
        ReferenceDatasetBuilder::new(probability)
    }

    /// Resolve a consumer selector to its demand constants.
    pub fn profile_for(&self, t: u32) -> CalcResult<&ConsumerProfile> {
        self.consumers
            .get(&t)
            .ok_or(CalcError::UnknownConsumerType { selector: t })
    }

    /// Velocity curve for a nominal diameter (mm).
    pub fn curve_for(&self, diameter_mm: u32) -> CalcResult<&DiameterVelocityCurve> {
        self.velocity
            .get(&diameter_mm)
            .ok_or(CalcError::UnknownDiameter { diameter_mm })
    }

    pub fn probability_curve(&self) -> &ProbabilityAlphaCurve {
        &self.probability
    }

    /// Configured diameters in ascending order
    pub fn supported_diameters(&self) -> Vec<u32> {
        self.velocity.keys().copied().collect()
    }

    pub fn supports_diameter(&self, diameter_mm: u32) -> bool {
        self.velocity.contains_key(&diameter_mm)
    }

    /// Consumer profiles in selector order
    pub fn consumers(&self) -> impl Iterator<Item = &ConsumerProfile> {
        self.consumers.values()
    }
}

/// Programmatic construction of a [`ReferenceDataset`].
///
/// ```rust
/// use plumb_core::reference::{
///     ConsumerProfile, DiameterVelocityCurve, ProbabilityAlphaCurve, ReferenceDataset, StreamDemand,
/// };
///
/// let curve = ProbabilityAlphaCurve::new(vec![0.0, 10.0, 20.0], vec![0.0, 0.2, 1.0]).unwrap();
/// let demand = StreamDemand::new(300.0, 0.3, 300.0, 250.0);
/// let dataset = ReferenceDataset::builder(curve)
///     .consumer(ConsumerProfile::new(1, 1, "Test", demand, demand, demand).unwrap())
///     .diameter(DiameterVelocityCurve::new(25, vec![0.0, 1.0, 2.0], vec![0.0, 0.5, 1.0]).unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(dataset.supported_diameters(), vec![25]);
/// ```
#[derive(Debug, Clone)]
pub struct ReferenceDatasetBuilder {
    consumers: Vec<ConsumerProfile>,
    probability: ProbabilityAlphaCurve,
    velocity: Vec<DiameterVelocityCurve>,
}

impl ReferenceDatasetBuilder {
    pub fn new(probability: ProbabilityAlphaCurve) -> Self {
        Self {
            consumers: Vec::new(),
            probability,
            velocity: Vec::new(),
        }
    }

    pub fn consumer(mut self, profile: ConsumerProfile) -> Self {
        self.consumers.push(profile);
        self
    }

    pub fn diameter(mut self, curve: DiameterVelocityCurve) -> Self {
        self.velocity.push(curve);
        self
    }

    /// Check uniqueness of keys and that every table is populated.
    pub fn build(self) -> CalcResult<ReferenceDataset> {
        let mut consumers = BTreeMap::new();
        for profile in self.consumers {
            let t = profile.t;
            if consumers.insert(t, profile).is_some() {
                return Err(CalcError::invalid_reference_data(
                    CONSUMERS_FILE,
                    format!("duplicate consumer selector t={t}"),
                ));
            }
        }

        let mut velocity = BTreeMap::new();
        for curve in self.velocity {
            let d = curve.diameter_mm();
            if velocity.insert(d, curve).is_some() {
                return Err(CalcError::invalid_reference_data(
                    VELOCITY_FILE,
                    format!("duplicate diameter D={d}"),
                ));
            }
        }

        if consumers.is_empty() {
            return Err(CalcError::invalid_reference_data(CONSUMERS_FILE, "no consumer profiles"));
        }
        if velocity.is_empty() {
            return Err(CalcError::invalid_reference_data(VELOCITY_FILE, "no pipe diameters"));
        }

        Ok(ReferenceDataset {
            consumers,
            probability: self.probability,
            velocity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_dataset_loads() {
        let dataset = ReferenceDataset::standard().unwrap();
        assert_eq!(
            dataset.supported_diameters(),
            vec![15, 20, 25, 32, 40, 50, 65, 80, 100, 125, 150]
        );
        assert_eq!(dataset.consumers().count(), 14);
        assert_eq!(dataset.probability_curve().x_values()[0], 0.015);
    }

    #[test]
    fn test_standard_constants_are_positive() {
        let dataset = ReferenceDataset::standard().unwrap();
        for profile in dataset.consumers() {
            for stream in Stream::ALL {
                let d = profile.demand(stream);
                assert!(d.hru > 0.0 && d.q0 > 0.0 && d.q0_hr > 0.0 && d.per_day > 0.0, "t={}", profile.t);
            }
        }
    }

    #[test]
    fn test_standard_is_shared() {
        let a = ReferenceDataset::standard().unwrap();
        let b = ReferenceDataset::standard().unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_unknown_lookups() {
        let dataset = ReferenceDataset::standard().unwrap();
        assert_eq!(
            dataset.profile_for(999).unwrap_err(),
            CalcError::UnknownConsumerType { selector: 999 }
        );
        assert_eq!(
            dataset.curve_for(17).unwrap_err(),
            CalcError::UnknownDiameter { diameter_mm: 17 }
        );
        assert!(!dataset.supports_diameter(17));
        assert!(dataset.supports_diameter(32));
    }

    #[test]
    fn test_consumers_listed_in_selector_order() {
        let dataset = ReferenceDataset::standard().unwrap();
        let ts: Vec<u32> = dataset.consumers().map(|p| p.t).collect();
        let mut sorted = ts.clone();
        sorted.sort_unstable();
        assert_eq!(ts, sorted);
    }

    #[test]
    fn test_duplicate_selector_rejected() {
        let curve = ProbabilityAlphaCurve::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        let demand = StreamDemand::new(1.0, 1.0, 1.0, 1.0);
        let profile = ConsumerProfile::new(1, 1, "A", demand, demand, demand).unwrap();
        let err = ReferenceDataset::builder(curve)
            .consumer(profile.clone())
            .consumer(profile)
            .diameter(DiameterVelocityCurve::new(25, vec![0.0, 1.0], vec![0.0, 1.0]).unwrap())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate consumer selector t=1"));
    }

    #[test]
    fn test_from_toml_reports_file() {
        let err = ReferenceDataset::from_toml("consumer = 5", PROBABILITY_TOML, VELOCITY_TOML).unwrap_err();
        match err {
            CalcError::InvalidReferenceData { table, .. } => assert_eq!(table, CONSUMERS_FILE),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_from_toml_rejects_bad_curve() {
        let bad_curve = "x_values = [0.0, 2.0, 1.0]\ny_values = [0.0, 1.0, 2.0]";
        let err = ReferenceDataset::from_toml(CONSUMERS_TOML, bad_curve, VELOCITY_TOML).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn test_load_dir_reads_standard_files() {
        let dir = std::env::temp_dir().join(format!("plumbline_dataset_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CONSUMERS_FILE), CONSUMERS_TOML).unwrap();
        fs::write(dir.join(PROBABILITY_FILE), PROBABILITY_TOML).unwrap();
        fs::write(dir.join(VELOCITY_FILE), VELOCITY_TOML).unwrap();

        let loaded = ReferenceDataset::load_dir(&dir);
        fs::remove_dir_all(&dir).unwrap();
        assert_eq!(&loaded.unwrap(), ReferenceDataset::standard().unwrap());
    }

    #[test]
    fn test_load_dir_missing_file() {
        let err = ReferenceDataset::load_dir(Path::new("/nonexistent/plumbline-data")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }
}
