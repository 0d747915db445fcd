//! # Piecewise-Linear Interpolation
//!
//! Table-agnostic linear interpolation over two parallel sequences, with
//! linear extrapolation past either end. Used for both the probability →
//! alpha lookup and the discharge → velocity lookup.
//!
//! ## Policy
//!
//! 1. Fewer than two knots (or mismatched lengths) is an error.
//! 2. Below the first knot: extend the first segment.
//! 3. Above the last knot: extend the last segment.
//! 4. Otherwise: interpolate within the first bracketing segment. A query
//!    that lands exactly on a knot returns that knot's y value unchanged.
//! 5. A non-finite query (NaN or ±∞) is an error.
//!
//! ## Example
//!
//! ```rust
//! use plumb_core::interpolation::interpolate;
//!
//! let xs = [0.0, 1.0, 2.0];
//! let ys = [0.0, 0.5, 1.5];
//! assert_eq!(interpolate(0.5, &xs, &ys).unwrap(), 0.25);
//! assert_eq!(interpolate(-1.0, &xs, &ys).unwrap(), -0.5);
//! assert_eq!(interpolate(3.0, &xs, &ys).unwrap(), 2.5);
//! ```

use crate::errors::{CalcError, CalcResult};

/// Table name used in error messages for anonymous lookups.
const ANONYMOUS_TABLE: &str = "table";

/// Interpolate `x` over the knots `(xs, ys)`.
///
/// `xs` is expected to be strictly increasing; curve types validate this
/// when they are constructed.
pub fn interpolate(x: f64, xs: &[f64], ys: &[f64]) -> CalcResult<f64> {
    interpolate_named(ANONYMOUS_TABLE, x, xs, ys)
}

/// Same as [`interpolate`], naming the table in any error.
pub fn interpolate_named(table: &str, x: f64, xs: &[f64], ys: &[f64]) -> CalcResult<f64> {
    let n = xs.len();
    if n < 2 {
        return Err(CalcError::interpolation(
            table,
            x,
            format!("need at least 2 knots, got {n}"),
        ));
    }
    if ys.len() != n {
        return Err(CalcError::interpolation(
            table,
            x,
            format!("x/y length mismatch ({n} vs {})", ys.len()),
        ));
    }
    if !x.is_finite() {
        return Err(CalcError::interpolation(table, x, "query is not finite"));
    }

    if x < xs[0] {
        return Ok(segment(x, xs[0], xs[1], ys[0], ys[1]));
    }
    if x > xs[n - 1] {
        return Ok(segment(x, xs[n - 2], xs[n - 1], ys[n - 2], ys[n - 1]));
    }

    for i in 0..n - 1 {
        if xs[i] <= x && x <= xs[i + 1] {
            // Knots are returned verbatim so the lookup is exact on the table.
            if x == xs[i] {
                return Ok(ys[i]);
            }
            if x == xs[i + 1] {
                return Ok(ys[i + 1]);
            }
            return Ok(segment(x, xs[i], xs[i + 1], ys[i], ys[i + 1]));
        }
    }

    Err(CalcError::interpolation(table, x, "no bracketing segment"))
}

/// Straight line through (x0, y0) and (x1, y1), evaluated at x.
fn segment(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// A tabulated one-dimensional curve.
///
/// Implementors only expose their knots; evaluation goes through the shared
/// interpolation policy above.
pub trait Curve {
    /// Name used in error messages (e.g. "probability→alpha")
    fn table_name(&self) -> String;

    /// Parallel knot sequences (x strictly increasing)
    fn knots(&self) -> (&[f64], &[f64]);

    /// Evaluate the curve at `x`.
    fn evaluate(&self, x: f64) -> CalcResult<f64> {
        let (xs, ys) = self.knots();
        interpolate_named(&self.table_name(), x, xs, ys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XS: [f64; 3] = [0.0, 1.0, 2.0];
    const YS: [f64; 3] = [0.0, 0.5, 1.5];

    #[test]
    fn test_interior_point() {
        assert_eq!(interpolate(0.5, &XS, &YS).unwrap(), 0.25);
        assert!((interpolate(1.5, &XS, &YS).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_extrapolates_below_with_first_slope() {
        assert_eq!(interpolate(-1.0, &XS, &YS).unwrap(), -0.5);
    }

    #[test]
    fn test_extrapolates_above_with_last_slope() {
        assert_eq!(interpolate(3.0, &XS, &YS).unwrap(), 2.5);
    }

    #[test]
    fn test_knots_are_exact() {
        let xs = [0.015, 0.016, 0.1, 0.37, 10.0];
        let ys = [0.202, 0.205, 0.343, 0.588, 4.126];
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_eq!(interpolate(*x, &xs, &ys).unwrap(), *y);
        }
    }

    #[test]
    fn test_too_few_knots() {
        let err = interpolate(1.0, &[1.0], &[2.0]).unwrap_err();
        assert_eq!(err.error_code(), "INTERPOLATION_FAILED");

        let err = interpolate(1.0, &[], &[]).unwrap_err();
        assert_eq!(err.error_code(), "INTERPOLATION_FAILED");
    }

    #[test]
    fn test_length_mismatch() {
        let err = interpolate(0.5, &[0.0, 1.0], &[0.0]).unwrap_err();
        assert_eq!(err.error_code(), "INTERPOLATION_FAILED");
    }

    #[test]
    fn test_nan_query_rejected() {
        let err = interpolate_named("velocity D25", f64::NAN, &XS, &YS).unwrap_err();
        match err {
            CalcError::Interpolation { table, reason, .. } => {
                assert_eq!(table, "velocity D25");
                assert!(reason.contains("finite"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_infinite_query_rejected() {
        // flat first segment: 0 · -∞ would be NaN
        let flat = [1.0, 1.0];
        for x in [f64::INFINITY, f64::NEG_INFINITY] {
            let err = interpolate(x, &[0.0, 1.0], &flat).unwrap_err();
            assert_eq!(err.error_code(), "INTERPOLATION_FAILED");
        }
    }

    struct Line;

    impl Curve for Line {
        fn table_name(&self) -> String {
            "line".to_string()
        }

        fn knots(&self) -> (&[f64], &[f64]) {
            (&XS, &YS)
        }
    }

    #[test]
    fn test_curve_trait_evaluates_through_policy() {
        assert_eq!(Line.evaluate(3.0).unwrap(), 2.5);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strictly increasing knots built from positive gaps.
    fn knots() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
        (2usize..12).prop_flat_map(|n| {
            (
                -100.0_f64..100.0,
                prop::collection::vec(0.5_f64..50.0, n - 1),
                prop::collection::vec(-1000.0_f64..1000.0, n),
            )
                .prop_map(|(start, gaps, ys)| {
                    let mut xs = Vec::with_capacity(gaps.len() + 1);
                    xs.push(start);
                    for gap in gaps {
                        let last = xs[xs.len() - 1];
                        xs.push(last + gap);
                    }
                    (xs, ys)
                })
        })
    }

    proptest! {
        #[test]
        fn knots_return_their_y((xs, ys) in knots()) {
            for i in 0..xs.len() {
                prop_assert_eq!(interpolate(xs[i], &xs, &ys).unwrap(), ys[i]);
            }
        }

        #[test]
        fn linear_tables_stay_on_the_line(
            (xs, _) in knots(),
            a in -10.0_f64..10.0,
            b in -10.0_f64..10.0,
            x in -500.0_f64..500.0,
        ) {
            let ys: Vec<f64> = xs.iter().map(|xi| a * xi + b).collect();
            let y = interpolate(x, &xs, &ys).unwrap();
            let expected = a * x + b;
            let y_max = ys.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            let tol = 1e-8 * (1.0 + y_max + expected.abs());
            prop_assert!((y - expected).abs() <= tol, "y={} expected={}", y, expected);
        }
    }
}
