//! Validated step-test samples.

use crate::error::{TuneError, TuneResult};
use tuner_config::Units;

/// Aligned time / PV / CV samples.
///
/// Invariants: all three columns share one length >= 1, every value is finite and time never
/// decreases. The series is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries {
    time: Vec<f64>,
    pv: Vec<f64>,
    cv: Vec<f64>,
}

impl SampleSeries {
    pub fn new(time: Vec<f64>, pv: Vec<f64>, cv: Vec<f64>) -> TuneResult<Self> {
        if time.len() != pv.len() || time.len() != cv.len() {
            return Err(TuneError::InvalidSeries(format!(
                "column lengths differ (time {}, pv {}, cv {})",
                time.len(),
                pv.len(),
                cv.len()
            )));
        }
        if time.is_empty() {
            return Err(TuneError::InvalidSeries("no samples".into()));
        }
        for (name, col) in [("time", &time), ("pv", &pv), ("cv", &cv)] {
            if let Some(i) = col.iter().position(|v| !v.is_finite()) {
                return Err(TuneError::InvalidSeries(format!(
                    "{name}[{i}] is not finite"
                )));
            }
        }
        if let Some(i) = time.windows(2).position(|w| w[1] < w[0]) {
            return Err(TuneError::InvalidSeries(format!(
                "time decreases at sample {} ({} -> {})",
                i + 1,
                time[i],
                time[i + 1]
            )));
        }
        Ok(Self { time, pv, cv })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn pv(&self) -> &[f64] {
        &self.pv
    }

    pub fn cv(&self) -> &[f64] {
        &self.cv
    }

    /// First and last time stamps.
    pub fn time_span(&self) -> (f64, f64) {
        // non-empty by construction
        (self.time[0], self.time[self.time.len() - 1])
    }

    /// `(time, pv)` pairs with `start <= time <= end`.
    pub fn pv_window(&self, start: f64, end: f64) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time
            .iter()
            .zip(&self.pv)
            .filter(move |(t, _)| **t >= start && **t <= end)
            .map(|(t, y)| (*t, *y))
    }
}

/// A validated series together with the unit labels from its file header.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub series: SampleSeries,
    pub units: Units,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_lengths() {
        let err = SampleSeries::new(vec![0.0, 1.0], vec![0.0], vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(err, TuneError::InvalidSeries(_)));
    }

    #[test]
    fn rejects_empty_and_decreasing_time() {
        assert!(SampleSeries::new(vec![], vec![], vec![]).is_err());
        let err = SampleSeries::new(vec![0.0, 2.0, 1.0], vec![0.0; 3], vec![0.0; 3]).unwrap_err();
        assert!(format!("{err}").contains("time decreases at sample 2"));
    }

    #[test]
    fn repeated_time_is_allowed() {
        let s = SampleSeries::new(vec![0.0, 1.0, 1.0], vec![0.0; 3], vec![0.0; 3]).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.time_span(), (0.0, 1.0));
    }

    #[test]
    fn window_is_closed_on_both_ends() {
        let s = SampleSeries::new(
            vec![0.0, 1.0, 2.0, 3.0],
            vec![10.0, 11.0, 12.0, 13.0],
            vec![0.0; 4],
        )
        .unwrap();
        let w: Vec<_> = s.pv_window(1.0, 2.0).collect();
        assert_eq!(w, vec![(1.0, 11.0), (2.0, 12.0)]);
    }
}
