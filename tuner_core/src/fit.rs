//! Least-squares line fits over cursor-bounded windows of the PV curve.

use crate::error::{TuneError, TuneResult};
use crate::series::SampleSeries;

/// A closed time interval `[start, end]` selected by a pair of cursors.
///
/// `slot` is 1 for the pre-step slope and 2 for the post-step slope; it only travels into
/// error messages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitWindow {
    pub slot: u8,
    pub start: f64,
    pub end: f64,
}

impl FitWindow {
    pub fn new(slot: u8, start: f64, end: f64) -> Self {
        Self { slot, start, end }
    }
}

/// `pv = slope * time + intercept`, plus the window it was fitted on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    pub window: FitWindow,
    /// Number of samples that fell inside the window.
    pub samples: usize,
}

impl LineFit {
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Points for drawing the line across a plot view.
    ///
    /// Samples `points` evenly spaced x values over `x_range` (inclusive) and keeps the ones
    /// whose y falls inside `y_range`, so the drawn segment never leaves the axes.
    pub fn overlay(
        &self,
        x_range: (f64, f64),
        y_range: (f64, f64),
        points: usize,
    ) -> Vec<(f64, f64)> {
        let (x0, x1) = x_range;
        let (y_lo, y_hi) = if y_range.0 <= y_range.1 {
            y_range
        } else {
            (y_range.1, y_range.0)
        };
        let step = if points > 1 {
            (x1 - x0) / (points - 1) as f64
        } else {
            0.0
        };
        (0..points)
            .map(|i| {
                let x = x0 + step * i as f64;
                (x, self.eval(x))
            })
            .filter(|(_, y)| *y >= y_lo && *y <= y_hi)
            .collect()
    }
}

/// Ordinary least-squares fit of PV against time over the samples in `window`.
///
/// Errors:
/// - `InvalidWindow` when a bound is not finite or `start > end`.
/// - `InsufficientData` when fewer than two samples fall in the window.
/// - `DegenerateFit` when every selected sample shares one time stamp.
pub fn fit_line(series: &SampleSeries, window: FitWindow) -> TuneResult<LineFit> {
    let FitWindow { slot, start, end } = window;
    if !start.is_finite() || !end.is_finite() || start > end {
        return Err(TuneError::InvalidWindow {
            window: slot,
            start,
            end,
        });
    }

    // Centered sums in f64; two passes keep the variance term well conditioned
    let mut n = 0usize;
    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    for (x, y) in series.pv_window(start, end) {
        n += 1;
        sum_x += x;
        sum_y += y;
    }
    if n < 2 {
        return Err(TuneError::InsufficientData {
            window: slot,
            start,
            end,
            found: n,
        });
    }
    let mean_x = sum_x / n as f64;
    let mean_y = sum_y / n as f64;
    let mut sxx = 0.0f64;
    let mut sxy = 0.0f64;
    for (x, y) in series.pv_window(start, end) {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }
    if sxx == 0.0 || !sxx.is_finite() {
        return Err(TuneError::DegenerateFit {
            window: slot,
            time: mean_x,
        });
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    tracing::debug!(
        window = slot,
        start,
        end,
        samples = n,
        slope,
        intercept,
        "line fit"
    );
    Ok(LineFit {
        slope,
        intercept,
        window,
        samples: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(slope: f64, intercept: f64) -> LineFit {
        LineFit {
            slope,
            intercept,
            window: FitWindow::new(1, 0.0, 1.0),
            samples: 2,
        }
    }

    #[test]
    fn overlay_spans_x_range() {
        let pts = line(1.0, 0.0).overlay((0.0, 10.0), (-100.0, 100.0), 11);
        assert_eq!(pts.len(), 11);
        assert_eq!(pts[0], (0.0, 0.0));
        assert_eq!(pts[10], (10.0, 10.0));
    }

    #[test]
    fn overlay_clips_to_y_range() {
        let pts = line(1.0, 0.0).overlay((0.0, 10.0), (2.0, 5.0), 11);
        let xs: Vec<f64> = pts.iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn overlay_degenerate_counts() {
        assert!(line(1.0, 0.0).overlay((0.0, 1.0), (0.0, 1.0), 0).is_empty());
        assert_eq!(line(0.0, 0.5).overlay((0.0, 1.0), (0.0, 1.0), 1), vec![(0.0, 0.5)]);
    }
}
