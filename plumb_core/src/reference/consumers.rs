//! Consumer Profiles (SP 30.13330 Appendix A)
//!
//! Demand constants per consumer category. The methodology publishes twelve
//! numbers per category: four quantities for each of the total, hot and
//! cold streams. They are grouped here per stream so a calculator can select
//! one triplet with a [`Stream`] tag instead of carrying its own copy of the
//! formulas for every stream.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Water stream whose constants a calculation uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    /// Total (hot + cold) consumption
    Total,
    /// Hot water supply (ГВС)
    Hot,
    /// Cold water supply (ХВС)
    #[default]
    Cold,
}

impl Stream {
    /// All streams in reporting order
    pub const ALL: [Stream; 3] = [Stream::Total, Stream::Hot, Stream::Cold];

    /// Subscript used in constant names (q_tot_0, q_h_0, q_c_0)
    pub fn code(&self) -> &'static str {
        match self {
            Stream::Total => "tot",
            Stream::Hot => "h",
            Stream::Cold => "c",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "total" | "tot" | "общий" => Ok(Stream::Total),
            "hot" | "h" | "гвс" => Ok(Stream::Hot),
            "cold" | "c" | "хвс" => Ok(Stream::Cold),
            _ => Err(CalcError::invalid_input(
                "stream",
                s,
                "Expected one of: total, hot, cold",
            )),
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Stream::Total => "общий",
            Stream::Hot => "ГВС",
            Stream::Cold => "ХВС",
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Demand constants of one stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamDemand {
    /// Consumption per user in the hour of peak use, q_hru (L/h)
    pub hru: f64,
    /// Per-fixture flow, q_0 (L/s)
    pub q0: f64,
    /// Per-fixture flow, q_0_hr (L/h)
    pub q0_hr: f64,
    /// Consumption per user per day, q_u (L)
    pub per_day: f64,
}

impl StreamDemand {
    pub fn new(hru: f64, q0: f64, q0_hr: f64, per_day: f64) -> Self {
        Self {
            hru,
            q0,
            q0_hr,
            per_day,
        }
    }

    fn validate(&self, t: u32, stream: Stream) -> CalcResult<()> {
        let fields = [
            ("hru", self.hru),
            ("0", self.q0),
            ("0_hr", self.q0_hr),
            ("per_day", self.per_day),
        ];
        for (suffix, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(CalcError::invalid_reference_data(
                    "consumers",
                    format!(
                        "t={t}: q_{}_{suffix} must be a finite non-negative number, got {value}",
                        stream.code()
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Demand constants of one consumer category.
///
/// ## Serialized form
///
/// Profiles serialize flat, with the constant names of the methodology:
///
/// ```json
/// {
///   "t": 1, "group": 1, "label": "Жилые дома ...",
///   "q_tot_hru": 15.6, "q_h_hru": 10.0, "q_c_hru": 5.6,
///   "q_tot_0": 0.3, "q_h_0": 0.2, "q_c_0": 0.2,
///   "q_tot_0_hr": 300.0, "q_h_0_hr": 200.0, "q_c_0_hr": 200.0,
///   "q_tot": 250.0, "q_h": 105.0, "q_c": 145.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConsumerRecord", into = "ConsumerRecord")]
pub struct ConsumerProfile {
    /// Selector shown to the user
    pub t: u32,
    /// Category group (t_num)
    pub group: u32,
    /// Category description
    pub label: String,
    pub total: StreamDemand,
    pub hot: StreamDemand,
    pub cold: StreamDemand,
}

impl ConsumerProfile {
    /// Create a profile with all three streams set.
    ///
    /// # Example
    ///
    /// ```rust
    /// use plumb_core::reference::{ConsumerProfile, Stream, StreamDemand};
    ///
    /// let profile = ConsumerProfile::new(
    ///     1,
    ///     1,
    ///     "Test dwelling",
    ///     StreamDemand::new(15.6, 0.3, 300.0, 250.0),
    ///     StreamDemand::new(10.0, 0.2, 200.0, 105.0),
    ///     StreamDemand::new(5.6, 0.2, 200.0, 145.0),
    /// ).unwrap();
    /// assert_eq!(profile.demand(Stream::Hot).q0, 0.2);
    /// ```
    pub fn new(
        t: u32,
        group: u32,
        label: impl Into<String>,
        total: StreamDemand,
        hot: StreamDemand,
        cold: StreamDemand,
    ) -> CalcResult<Self> {
        let profile = ConsumerProfile {
            t,
            group,
            label: label.into(),
            total,
            hot,
            cold,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Constants of the selected stream
    pub fn demand(&self, stream: Stream) -> &StreamDemand {
        match stream {
            Stream::Total => &self.total,
            Stream::Hot => &self.hot,
            Stream::Cold => &self.cold,
        }
    }

    fn validate(&self) -> CalcResult<()> {
        for stream in Stream::ALL {
            self.demand(stream).validate(self.t, stream)?;
        }
        Ok(())
    }
}

/// Parse a consumer selector typed by the user.
///
/// Accepts integral values written either as integers or decimals ("3",
/// " 3.0 ").
pub fn parse_selector(text: &str) -> CalcResult<u32> {
    let trimmed = text.trim();
    if let Ok(t) = trimmed.parse::<u32>() {
        return Ok(t);
    }
    match trimmed.replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 => {
            Ok(value as u32)
        }
        _ => Err(CalcError::invalid_input(
            "t",
            text,
            "Consumer type must be a whole non-negative number",
        )),
    }
}

/// Flat on-disk layout of a consumer profile
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConsumerRecord {
    t: u32,
    group: u32,
    label: String,
    q_tot_hru: f64,
    q_h_hru: f64,
    q_c_hru: f64,
    q_tot_0: f64,
    q_h_0: f64,
    q_c_0: f64,
    q_tot_0_hr: f64,
    q_h_0_hr: f64,
    q_c_0_hr: f64,
    q_tot: f64,
    q_h: f64,
    q_c: f64,
}

impl TryFrom<ConsumerRecord> for ConsumerProfile {
    type Error = CalcError;

    fn try_from(r: ConsumerRecord) -> CalcResult<Self> {
        ConsumerProfile::new(
            r.t,
            r.group,
            r.label,
            StreamDemand::new(r.q_tot_hru, r.q_tot_0, r.q_tot_0_hr, r.q_tot),
            StreamDemand::new(r.q_h_hru, r.q_h_0, r.q_h_0_hr, r.q_h),
            StreamDemand::new(r.q_c_hru, r.q_c_0, r.q_c_0_hr, r.q_c),
        )
    }
}

impl From<ConsumerProfile> for ConsumerRecord {
    fn from(p: ConsumerProfile) -> Self {
        ConsumerRecord {
            t: p.t,
            group: p.group,
            label: p.label,
            q_tot_hru: p.total.hru,
            q_h_hru: p.hot.hru,
            q_c_hru: p.cold.hru,
            q_tot_0: p.total.q0,
            q_h_0: p.hot.q0,
            q_c_0: p.cold.q0,
            q_tot_0_hr: p.total.q0_hr,
            q_h_0_hr: p.hot.q0_hr,
            q_c_0_hr: p.cold.q0_hr,
            q_tot: p.total.per_day,
            q_h: p.hot.per_day,
            q_c: p.cold.per_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dwelling() -> ConsumerProfile {
        ConsumerProfile::new(
            1,
            1,
            "Dwelling",
            StreamDemand::new(15.6, 0.3, 300.0, 250.0),
            StreamDemand::new(10.0, 0.2, 200.0, 105.0),
            StreamDemand::new(5.6, 0.2, 200.0, 145.0),
        )
        .unwrap()
    }

    #[test]
    fn test_demand_selects_stream() {
        let p = dwelling();
        assert_eq!(p.demand(Stream::Total).hru, 15.6);
        assert_eq!(p.demand(Stream::Hot).per_day, 105.0);
        assert_eq!(p.demand(Stream::Cold).q0_hr, 200.0);
    }

    #[test]
    fn test_flat_serialization() {
        let json = serde_json::to_string(&dwelling()).unwrap();
        assert!(json.contains("\"q_h_hru\":10.0"));
        assert!(json.contains("\"q_c\":145.0"));
        assert!(!json.contains("\"hot\""));

        let roundtrip: ConsumerProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, dwelling());
    }

    #[test]
    fn test_negative_constant_rejected() {
        let result = ConsumerProfile::new(
            2,
            1,
            "Broken",
            StreamDemand::new(15.6, 0.3, 300.0, 250.0),
            StreamDemand::new(10.0, -0.2, 200.0, 105.0),
            StreamDemand::new(5.6, 0.2, 200.0, 145.0),
        );
        let err = result.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_REFERENCE_DATA");
        assert!(err.to_string().contains("q_h_0"));
    }

    #[test]
    fn test_zero_constant_accepted() {
        let profile = ConsumerProfile::new(
            3,
            1,
            "No hot supply",
            StreamDemand::new(5.6, 0.2, 200.0, 145.0),
            StreamDemand::new(0.0, 0.0, 0.0, 0.0),
            StreamDemand::new(5.6, 0.2, 200.0, 145.0),
        );
        assert!(profile.is_ok());
    }

    #[test]
    fn test_parse_selector() {
        assert_eq!(parse_selector("3").unwrap(), 3);
        assert_eq!(parse_selector(" 12.0 ").unwrap(), 12);
        assert!(parse_selector("2.5").is_err());
        assert!(parse_selector("Введите номер потребителя").is_err());
        assert!(parse_selector("-1").is_err());
    }

    #[test]
    fn test_stream_parsing() {
        assert_eq!(Stream::from_str_flexible("HOT").unwrap(), Stream::Hot);
        assert_eq!(Stream::from_str_flexible("хвс").unwrap(), Stream::Cold);
        assert!(Stream::from_str_flexible("steam").is_err());
    }
}
