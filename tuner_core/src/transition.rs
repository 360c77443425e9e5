//! Control-variable step detection.

use crate::error::{TuneError, TuneResult};
use crate::series::SampleSeries;

/// The commanded step in CV.
///
/// `index` and `time` refer to the last sample *before* the change, since dead time is
/// measured from the command, not from where the new value is first recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionEvent {
    pub index: usize,
    pub time: f64,
    /// CV value at `index`.
    pub before: f64,
    /// `cv[index + 1] - cv[index]`.
    pub magnitude: f64,
}

/// Find the first sample-to-sample change in CV. Later changes are ignored.
pub fn find_step(series: &SampleSeries) -> TuneResult<TransitionEvent> {
    let cv = series.cv();
    let i = cv
        .windows(2)
        .position(|w| w[1] != w[0])
        .ok_or(TuneError::NoTransition { samples: cv.len() })?;
    let event = TransitionEvent {
        index: i,
        time: series.time()[i],
        before: cv[i],
        magnitude: cv[i + 1] - cv[i],
    };
    tracing::debug!(
        index = event.index,
        time = event.time,
        magnitude = event.magnitude,
        "cv step"
    );
    Ok(event)
}
