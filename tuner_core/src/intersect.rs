//! Intersection of two fitted lines.

use crate::error::{TuneError, TuneResult};
use crate::fit::LineFit;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub x: f64,
    pub y: f64,
}

/// Solve `a.slope * x + a.intercept == b.slope * x + b.intercept`.
///
/// Slopes whose difference is within `epsilon` are parallel; no NaN or infinity escapes.
pub fn intersect(a: &LineFit, b: &LineFit, epsilon: f64) -> TuneResult<Intersection> {
    let denom = a.slope - b.slope;
    if denom.abs() <= epsilon || denom == 0.0 {
        return Err(TuneError::ParallelLines {
            slope_a: a.slope,
            slope_b: b.slope,
            epsilon,
        });
    }
    let x = (b.intercept - a.intercept) / denom;
    let y = a.slope * x + a.intercept;
    if !x.is_finite() || !y.is_finite() {
        return Err(TuneError::ParallelLines {
            slope_a: a.slope,
            slope_b: b.slope,
            epsilon,
        });
    }
    Ok(Intersection { x, y })
}
