//! # Water-Supply Design Formulas
//!
//! The formulas of the SP 30.13330 methodology shared by the section and
//! aggregate calculators. Everything here is a pure function of its
//! arguments; divisor checks and table lookups happen in the callers.
//!
//! ## Notation
//!
//! - `q_hru` = Consumption per user in the hour of peak use (L/h)
//! - `q_0` = Per-fixture flow (L/s)
//! - `q_0_hr` = Per-fixture flow (L/h)
//! - `q_u` = Consumption per user per day (L)
//! - `U` = Number of users/fixtures served
//! - `N·P` = Probability coefficient (dimensionless)
//! - `α` = Flow coefficient read from the N·P table
//! - `t_h`, `t_c` = Hot and cold water temperatures (°C)
//! - `T` = Consumption period (h)
//!
//! ## References
//!
//! - SP 30.13330.2020 "Internal water supply and sewerage of buildings",
//!   section 5 and appendices A and B

use std::f64::consts::PI;

use crate::units::{
    Celsius, CubicMetersPerDay, CubicMetersPerHour, CubicMetersPerSecond, Hours, Kilowatts,
    LitersPerSecond, Meters, MetersPerSecond, Millimeters,
};

/// Seconds in one hour
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Multiplier in q = 5·q_0·α (L/s)
pub const DESIGN_FLOW_FACTOR: f64 = 5.0;

/// Multiplier in q_hr = 0.005·q_0_hr·α_hr (m³/h)
pub const HOURLY_FLOW_FACTOR: f64 = 0.005;

/// kW per (m³/h · °C) for water heating
pub const WATER_HEATING_FACTOR: f64 = 1.16;

/// Heat-loss allowance per m³/h of peak hot-water flow (kW)
pub const PIPE_HEAT_LOSS_FACTOR: f64 = 0.4;

// =============================================================================
// PROBABILITY COEFFICIENTS
// =============================================================================

/// Probability coefficient for instantaneous (per-second) flow
///
/// # Formula (SP 30.13330, 5.2.2)
/// - N·P = q_hru · U / (3600 · q_0)
///
/// The caller guarantees `q_0 != 0`.
#[inline]
pub fn instantaneous_probability(q_hru: f64, fixtures: f64, q_0: f64) -> f64 {
    (q_hru * fixtures) / (SECONDS_PER_HOUR * q_0)
}

/// Probability coefficient for hourly flow
///
/// # Formula (SP 30.13330, 5.2.5)
/// - N·P_hr = q_hru · U / q_0_hr
///
/// The caller guarantees `q_0_hr != 0`.
#[inline]
pub fn hourly_probability(q_hru: f64, fixtures: f64, q_0_hr: f64) -> f64 {
    q_hru * fixtures / q_0_hr
}

// =============================================================================
// DISCHARGES
// =============================================================================

/// Design instantaneous discharge
///
/// # Formula (SP 30.13330, 5.2.1)
/// - q = 5 · q_0 · α   [L/s]
#[inline]
pub fn design_discharge(q_0: f64, alpha: f64) -> LitersPerSecond {
    LitersPerSecond(DESIGN_FLOW_FACTOR * q_0 * alpha)
}

/// Design hourly discharge
///
/// # Formula (SP 30.13330, 5.2.4)
/// - q_hr = 0.005 · q_0_hr · α_hr   [m³/h]
#[inline]
pub fn hourly_discharge(q_0_hr: f64, alpha_hr: f64) -> CubicMetersPerHour {
    CubicMetersPerHour(HOURLY_FLOW_FACTOR * q_0_hr * alpha_hr)
}

/// Daily consumption volume
///
/// # Formula
/// - Q_day = q_u · U / 1000   [m³/day]
#[inline]
pub fn daily_volume(per_day: f64, fixtures: f64) -> CubicMetersPerDay {
    CubicMetersPerDay(per_day * fixtures / 1000.0)
}

/// Mean hourly flow over the consumption period
///
/// # Formula
/// - q_T = q_u · U / (1000 · T)   [m³/h]
///
/// The caller guarantees `T > 0`.
#[inline]
pub fn mean_hourly_flow(per_day: f64, fixtures: f64, period: Hours) -> CubicMetersPerHour {
    CubicMetersPerHour(per_day * fixtures / (1000.0 * period.0))
}

// =============================================================================
// VELOCITY
// =============================================================================

/// Mean velocity of a full circular pipe
///
/// # Formula
/// - v = 4 · Q / (π · D²)
///
/// with Q converted L/s → m³/s and D converted mm → m.
#[inline]
pub fn pipe_velocity(discharge: LitersPerSecond, diameter: Millimeters) -> MetersPerSecond {
    let q: CubicMetersPerSecond = discharge.into();
    let d: Meters = diameter.into();
    MetersPerSecond(4.0 * q.0 / (PI * d.0 * d.0))
}

// =============================================================================
// HEAT LOAD
// =============================================================================

/// Heat load for hot-water preparation
///
/// # Formula (SP 30.13330, 5.2.9)
/// - Q = 1.16 · q · (t_h − t_c) + 0.4 · q_h_hr   [kW]
///
/// `heated_flow` is the flow being heated (peak or mean hourly);
/// `peak_hot_flow` is the peak hourly hot discharge that sizes the
/// heat-loss allowance.
#[inline]
pub fn heat_load(
    heated_flow: CubicMetersPerHour,
    hot: Celsius,
    cold: Celsius,
    peak_hot_flow: CubicMetersPerHour,
) -> Kilowatts {
    Kilowatts(
        WATER_HEATING_FACTOR * heated_flow.0 * hot.delta(cold)
            + PIPE_HEAT_LOSS_FACTOR * peak_hot_flow.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantaneous_probability() {
        // 300 L/h · 50 / (3600 · 0.3)
        let pn = instantaneous_probability(300.0, 50.0, 0.3);
        assert!((pn - 13.888_888_9).abs() < 1e-6);
    }

    #[test]
    fn test_hourly_probability() {
        let pn = hourly_probability(10.0, 100.0, 200.0);
        assert!((pn - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_discharges() {
        assert!((design_discharge(0.3, 0.5).0 - 0.75).abs() < 1e-12);
        assert!((hourly_discharge(200.0, 2.558).0 - 2.558).abs() < 1e-12);
        assert!((daily_volume(105.0, 100.0).0 - 10.5).abs() < 1e-12);
        assert!((mean_hourly_flow(105.0, 100.0, Hours(24.0)).0 - 0.4375).abs() < 1e-12);
    }

    #[test]
    fn test_pipe_velocity() {
        // 1 L/s through 25 mm: 0.001 / (π·0.025²/4) ≈ 2.0372 m/s
        let v = pipe_velocity(LitersPerSecond(1.0), Millimeters(25.0));
        assert!((v.0 - 2.037_183).abs() < 1e-5);
    }

    #[test]
    fn test_doubling_diameter_quarters_velocity() {
        let q = LitersPerSecond(0.7667);
        let v1 = pipe_velocity(q, Millimeters(25.0));
        let v2 = pipe_velocity(q, Millimeters(50.0));
        assert!((v1.0 / v2.0 - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_heat_load() {
        let q = CubicMetersPerHour(2.0);
        let kw = heat_load(q, Celsius(60.0), Celsius(5.0), q);
        // 1.16·2·55 + 0.4·2
        assert!((kw.0 - 128.4).abs() < 1e-9);
    }
}
