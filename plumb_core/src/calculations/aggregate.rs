//! # Building Load Calculation
//!
//! Derives the standard battery of 25 quantities for one consumer category
//! and the total number of fixtures in the building:
//!
//! | Rows  | Quantity                                  | Unit   |
//! |-------|-------------------------------------------|--------|
//! | 1-3   | Instantaneous N·P (total, hot, cold)      | -      |
//! | 4-6   | Instantaneous α                           | -      |
//! | 7-9   | Design discharge q = 5·q_0·α              | л/с    |
//! | 10-12 | Hourly N·P_hr                             | -      |
//! | 13-15 | Hourly α_hr                               | -      |
//! | 16-18 | Hourly discharge q_hr = 0.005·q_0_hr·α_hr | м³/ч   |
//! | 19-21 | Daily volume q_u·U/1000                   | м³/сут |
//! | 22-23 | Peak hot-water heat load                  | кВт, Гкал/ч |
//! | 24-25 | Mean hot-water heat load                  | кВт, Гкал/ч |
//!
//! Every row is always emitted, in this order.
//!
//! ## Example
//!
//! ```rust
//! use plumb_core::calculations::{calculate_loads, AggregateQuantity, LoadInput};
//! use plumb_core::reference::ReferenceDataset;
//!
//! let dataset = ReferenceDataset::standard().unwrap();
//! let profile = dataset.profile_for(1).unwrap();
//! let report = calculate_loads(dataset, profile, &LoadInput::new(120.0)).unwrap();
//!
//! assert_eq!(report.rows.len(), 25);
//! let peak = report.get(AggregateQuantity::PeakHeatLoadKw).unwrap();
//! assert!(peak.value > 0.0);
//! ```

use serde::{Deserialize, Serialize};

use super::parse_number;
use super::section::ensure_finite;
use crate::equations;
use crate::errors::{CalcError, CalcResult};
use crate::reference::{ConsumerProfile, ReferenceDataset, Stream};
use crate::units::{Celsius, CubicMetersPerHour, GcalPerHour, Hours};

/// Default hot-water temperature (°C)
pub const DEFAULT_HOT_WATER_C: f64 = 60.0;
/// Default cold-water temperature (°C)
pub const DEFAULT_COLD_WATER_C: f64 = 5.0;
/// Default consumption period (h)
pub const DEFAULT_PERIOD_H: f64 = 24.0;

fn default_hot() -> f64 {
    DEFAULT_HOT_WATER_C
}

fn default_cold() -> f64 {
    DEFAULT_COLD_WATER_C
}

fn default_period() -> f64 {
    DEFAULT_PERIOD_H
}

/// Input parameters for the building load battery.
///
/// ## JSON Example
///
/// ```json
/// { "U": 120, "t_h": 60, "t_c": 5, "T": 24 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadInput {
    /// Total number of fixtures (users), U
    #[serde(rename = "U")]
    pub fixtures: f64,

    /// Hot-water temperature t_h (°C)
    #[serde(rename = "t_h", default = "default_hot")]
    pub hot_c: f64,

    /// Cold-water temperature t_c (°C)
    #[serde(rename = "t_c", default = "default_cold")]
    pub cold_c: f64,

    /// Consumption period T (h)
    #[serde(rename = "T", default = "default_period")]
    pub period_h: f64,
}

impl LoadInput {
    /// Input with the default temperatures (60/5 °C) and a 24 h period.
    pub fn new(fixtures: f64) -> Self {
        LoadInput {
            fixtures,
            hot_c: DEFAULT_HOT_WATER_C,
            cold_c: DEFAULT_COLD_WATER_C,
            period_h: DEFAULT_PERIOD_H,
        }
    }

    pub fn with_temperatures(mut self, hot_c: f64, cold_c: f64) -> Self {
        self.hot_c = hot_c;
        self.cold_c = cold_c;
        self
    }

    pub fn with_period(mut self, period_h: f64) -> Self {
        self.period_h = period_h;
        self
    }

    /// Build an input from form text.
    pub fn parse(u_text: &str, hot_text: &str, cold_text: &str, period_text: &str) -> CalcResult<Self> {
        let input = LoadInput {
            fixtures: parse_number("U", u_text)?,
            hot_c: parse_number("t_h", hot_text)?,
            cold_c: parse_number("t_c", cold_text)?,
            period_h: parse_number("T", period_text)?,
        };
        input.validate()?;
        Ok(input)
    }

    /// Validate input parameters.
    ///
    /// `U = 0` is accepted. `t_h ≤ t_c` is accepted as given.
    pub fn validate(&self) -> CalcResult<()> {
        if !self.fixtures.is_finite() || self.fixtures < 0.0 {
            return Err(CalcError::invalid_input(
                "U",
                self.fixtures.to_string(),
                "Fixture count cannot be negative",
            ));
        }
        if !self.hot_c.is_finite() {
            return Err(CalcError::invalid_input(
                "t_h",
                self.hot_c.to_string(),
                "Temperature must be finite",
            ));
        }
        if !self.cold_c.is_finite() {
            return Err(CalcError::invalid_input(
                "t_c",
                self.cold_c.to_string(),
                "Temperature must be finite",
            ));
        }
        if !self.period_h.is_finite() || self.period_h <= 0.0 {
            return Err(CalcError::invalid_input(
                "T",
                self.period_h.to_string(),
                "Period must be a positive number of hours",
            ));
        }
        Ok(())
    }
}

/// Identifies one row of the load battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateQuantity {
    Probability(Stream),
    Alpha(Stream),
    Discharge(Stream),
    HourlyProbability(Stream),
    HourlyAlpha(Stream),
    HourlyDischarge(Stream),
    DailyVolume(Stream),
    PeakHeatLoadKw,
    PeakHeatLoadGcal,
    MeanHeatLoadKw,
    MeanHeatLoadGcal,
}

impl AggregateQuantity {
    /// All rows in reporting order
    pub const ALL: [AggregateQuantity; 25] = {
        use AggregateQuantity::*;
        use Stream::{Cold, Hot, Total};
        [
            Probability(Total),
            Probability(Hot),
            Probability(Cold),
            Alpha(Total),
            Alpha(Hot),
            Alpha(Cold),
            Discharge(Total),
            Discharge(Hot),
            Discharge(Cold),
            HourlyProbability(Total),
            HourlyProbability(Hot),
            HourlyProbability(Cold),
            HourlyAlpha(Total),
            HourlyAlpha(Hot),
            HourlyAlpha(Cold),
            HourlyDischarge(Total),
            HourlyDischarge(Hot),
            HourlyDischarge(Cold),
            DailyVolume(Total),
            DailyVolume(Hot),
            DailyVolume(Cold),
            PeakHeatLoadKw,
            PeakHeatLoadGcal,
            MeanHeatLoadKw,
            MeanHeatLoadGcal,
        ]
    };

    /// Row label as printed in the report
    pub fn label(&self) -> &'static str {
        use AggregateQuantity::*;
        use Stream::{Cold, Hot, Total};
        match self {
            Probability(Total) => "Секундная вероятность действия приборов общая (P_tot*N)",
            Probability(Hot) => "Секундная вероятность действия приборов на ГВС (P_h*N)",
            Probability(Cold) => "Секундная вероятность действия приборов на ХВС (P_c*N)",
            Alpha(Total) => "Альфа секундная общая (a_tot)",
            Alpha(Hot) => "Альфа секундная на ГВС (a_h)",
            Alpha(Cold) => "Альфа секундная на ХВС (a_c)",
            Discharge(Total) => "Расчётный секундный расход общий (q_tot)",
            Discharge(Hot) => "Расчётный секундный расход на ГВС (q_h)",
            Discharge(Cold) => "Расчётный секундный расход на ХВС (q_c)",
            HourlyProbability(Total) => "Часовая вероятность действия приборов общая (P_tot*N)",
            HourlyProbability(Hot) => "Часовая вероятность действия приборов на ГВС (P_h*N)",
            HourlyProbability(Cold) => "Часовая вероятность действия приборов на ХВС (P_c*N)",
            HourlyAlpha(Total) => "Альфа часовая общая (a_tot_hr)",
            HourlyAlpha(Hot) => "Альфа часовая на ГВС (a_h_hr)",
            HourlyAlpha(Cold) => "Альфа часовая на ХВС (a_c_hr)",
            HourlyDischarge(Total) => "Часовой расход общий (q_tot_hr)",
            HourlyDischarge(Hot) => "Часовой расход на ГВС (q_h_hr)",
            HourlyDischarge(Cold) => "Часовой расход на ХВС (q_c_hr)",
            DailyVolume(Total) => "Суточный расход общий (Q_сут_tot)",
            DailyVolume(Hot) => "Суточный расход на ГВС (Q_сут_h)",
            DailyVolume(Cold) => "Суточный расход на ХВС (Q_сут_c)",
            PeakHeatLoadKw | PeakHeatLoadGcal => "Расход тепла на ГВС максимальный (Q(h,hr))",
            MeanHeatLoadKw | MeanHeatLoadGcal => "Расход тепла на ГВС средний (Q(h,T))",
        }
    }

    /// Unit as printed in the report
    pub fn unit(&self) -> &'static str {
        use AggregateQuantity::*;
        match self {
            Probability(_) | Alpha(_) | HourlyProbability(_) | HourlyAlpha(_) => "-",
            Discharge(_) => "л/с",
            HourlyDischarge(_) => "м³/ч",
            DailyVolume(_) => "м³/сут",
            PeakHeatLoadKw | MeanHeatLoadKw => "кВт",
            PeakHeatLoadGcal | MeanHeatLoadGcal => "Гкал/ч",
        }
    }

    /// True when the value is read through the N·P → α table.
    ///
    /// Both heat loads carry the 0.4·q_h_hr allowance, so they count too.
    pub fn depends_on_alpha(&self) -> bool {
        use AggregateQuantity::*;
        !matches!(self, Probability(_) | HourlyProbability(_) | DailyVolume(_))
    }
}

/// One row of the load battery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub quantity: AggregateQuantity,
    pub label: String,
    pub value: f64,
    pub unit: String,

    /// The row stays non-zero at U = 0 because the α table does not pass
    /// through the origin.
    pub zero_load_offset: bool,
}

impl AggregateRow {
    /// Value with four decimals, as shown in the report
    pub fn formatted_value(&self) -> String {
        format!("{:.4}", self.value)
    }
}

/// The complete battery for one consumer category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Consumer selector t
    pub consumer: u32,
    pub input: LoadInput,
    pub rows: Vec<AggregateRow>,
}

impl AggregateReport {
    /// Look up a row by quantity.
    pub fn get(&self, quantity: AggregateQuantity) -> Option<&AggregateRow> {
        self.rows.iter().find(|row| row.quantity == quantity)
    }
}

/// Instantaneous and hourly values of one stream
struct StreamLoads {
    probability: f64,
    alpha: f64,
    discharge: f64,
    hourly_probability: f64,
    hourly_alpha: f64,
    hourly_discharge: f64,
    daily_volume: f64,
}

fn stream_loads(
    dataset: &ReferenceDataset,
    profile: &ConsumerProfile,
    stream: Stream,
    fixtures: f64,
) -> CalcResult<StreamLoads> {
    let demand = profile.demand(stream);
    if demand.q0 == 0.0 {
        return Err(CalcError::division_by_zero(format!("q_{}_0", stream.code())));
    }
    if demand.q0_hr == 0.0 {
        return Err(CalcError::division_by_zero(format!("q_{}_0_hr", stream.code())));
    }

    let curve = dataset.probability_curve();
    let probability = equations::instantaneous_probability(demand.hru, fixtures, demand.q0);
    ensure_finite(probability, fixtures)?;
    let alpha = curve.alpha(probability)?;
    let hourly_probability = equations::hourly_probability(demand.hru, fixtures, demand.q0_hr);
    ensure_finite(hourly_probability, fixtures)?;
    let hourly_alpha = curve.alpha(hourly_probability)?;

    let loads = StreamLoads {
        probability,
        alpha,
        discharge: equations::design_discharge(demand.q0, alpha).0,
        hourly_probability,
        hourly_alpha,
        hourly_discharge: equations::hourly_discharge(demand.q0_hr, hourly_alpha).0,
        daily_volume: equations::daily_volume(demand.per_day, fixtures).0,
    };
    for value in [loads.discharge, loads.hourly_discharge, loads.daily_volume] {
        ensure_finite(value, fixtures)?;
    }
    Ok(loads)
}

/// Calculate the 25-row battery.
///
/// # Errors
///
/// - `InvalidInput` for a negative or non-finite `U`, non-finite
///   temperatures, or `T ≤ 0`; also when `U` is so large (or `T` so
///   small) that a derived value overflows
/// - `DivisionByZero` when a q_0 or q_0_hr constant of the profile is zero
pub fn calculate_loads(
    dataset: &ReferenceDataset,
    profile: &ConsumerProfile,
    input: &LoadInput,
) -> CalcResult<AggregateReport> {
    input.validate()?;

    let total = stream_loads(dataset, profile, Stream::Total, input.fixtures)?;
    let hot = stream_loads(dataset, profile, Stream::Hot, input.fixtures)?;
    let cold = stream_loads(dataset, profile, Stream::Cold, input.fixtures)?;

    let hot_c = Celsius(input.hot_c);
    let cold_c = Celsius(input.cold_c);
    let peak_hot = CubicMetersPerHour(hot.hourly_discharge);
    let mean_hot = equations::mean_hourly_flow(profile.hot.per_day, input.fixtures, Hours(input.period_h));
    let peak_kw = equations::heat_load(peak_hot, hot_c, cold_c, peak_hot);
    let mean_kw = equations::heat_load(mean_hot, hot_c, cold_c, peak_hot);
    ensure_finite(peak_kw.0, input.fixtures)?;
    if !mean_kw.0.is_finite() {
        return Err(CalcError::invalid_input(
            "T",
            input.period_h.to_string(),
            "Consumption period is too short to calculate",
        ));
    }

    let offset = dataset.probability_curve().intercept()? != 0.0;
    let by_stream = |stream: Stream| match stream {
        Stream::Total => &total,
        Stream::Hot => &hot,
        Stream::Cold => &cold,
    };

    let rows = AggregateQuantity::ALL
        .iter()
        .map(|&quantity| {
            use AggregateQuantity::*;
            let value = match quantity {
                Probability(s) => by_stream(s).probability,
                Alpha(s) => by_stream(s).alpha,
                Discharge(s) => by_stream(s).discharge,
                HourlyProbability(s) => by_stream(s).hourly_probability,
                HourlyAlpha(s) => by_stream(s).hourly_alpha,
                HourlyDischarge(s) => by_stream(s).hourly_discharge,
                DailyVolume(s) => by_stream(s).daily_volume,
                PeakHeatLoadKw => peak_kw.0,
                PeakHeatLoadGcal => GcalPerHour::from(peak_kw).0,
                MeanHeatLoadKw => mean_kw.0,
                MeanHeatLoadGcal => GcalPerHour::from(mean_kw).0,
            };
            AggregateRow {
                quantity,
                label: quantity.label().to_string(),
                value,
                unit: quantity.unit().to_string(),
                zero_load_offset: offset && quantity.depends_on_alpha(),
            }
        })
        .collect();

    tracing::debug!(
        consumer = profile.t,
        fixtures = input.fixtures,
        peak_kw = peak_kw.0,
        mean_kw = mean_kw.0,
        "load battery calculated"
    );

    Ok(AggregateReport {
        consumer: profile.t,
        input: *input,
        rows,
    })
}
