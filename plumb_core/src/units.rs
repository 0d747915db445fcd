//! # Unit Types
//!
//! Type-safe wrappers for the hydraulic and thermal units that cross the
//! engine boundary. They are plain f64 newtypes so JSON stays clean (just
//! numbers) while the conversions between design-methodology units live in
//! one place.
//!
//! ## Units used by the methodology
//!
//! - Instantaneous discharge: liters per second (L/s)
//! - Hourly discharge: cubic meters per hour (m³/h)
//! - Daily volume: cubic meters per day (m³/day)
//! - Velocity: meters per second (m/s)
//! - Pipe diameter: millimeters (mm)
//! - Heat load: kilowatts (kW) and gigacalories per hour (Gcal/h)
//!
//! ## Example
//!
//! ```rust
//! use plumb_core::units::{GcalPerHour, Kilowatts, LitersPerSecond, CubicMetersPerSecond};
//!
//! let q = LitersPerSecond(2.5);
//! let q_si: CubicMetersPerSecond = q.into();
//! assert!((q_si.0 - 0.0025).abs() < 1e-12);
//!
//! let heat: GcalPerHour = Kilowatts(1000.0).into();
//! assert!((heat.0 - 0.8598452).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

/// Kilowatt to Gcal/h factor used by the methodology.
pub const GCAL_PER_HOUR_PER_KW: f64 = 0.000_859_845_2;

// ============================================================================
// Flow Units
// ============================================================================

/// Discharge in liters per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LitersPerSecond(pub f64);

/// Discharge in cubic meters per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CubicMetersPerSecond(pub f64);

/// Discharge in cubic meters per hour
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CubicMetersPerHour(pub f64);

/// Volume per day in cubic meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CubicMetersPerDay(pub f64);

impl From<LitersPerSecond> for CubicMetersPerSecond {
    fn from(q: LitersPerSecond) -> Self {
        CubicMetersPerSecond(q.0 / 1000.0)
    }
}

impl From<CubicMetersPerSecond> for LitersPerSecond {
    fn from(q: CubicMetersPerSecond) -> Self {
        LitersPerSecond(q.0 * 1000.0)
    }
}

// ============================================================================
// Geometry and Kinematics
// ============================================================================

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 / 1000.0)
    }
}

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

/// Velocity in meters per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetersPerSecond(pub f64);

// ============================================================================
// Thermal Units
// ============================================================================

/// Temperature in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Celsius(pub f64);

impl Celsius {
    /// Temperature difference self - other, in kelvin (= °C difference)
    pub fn delta(self, other: Celsius) -> f64 {
        self.0 - other.0
    }
}

/// Heat rate in kilowatts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilowatts(pub f64);

/// Heat rate in gigacalories per hour
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GcalPerHour(pub f64);

impl From<Kilowatts> for GcalPerHour {
    fn from(kw: Kilowatts) -> Self {
        GcalPerHour(kw.0 * GCAL_PER_HOUR_PER_KW)
    }
}

/// Duration in hours
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hours(pub f64);
