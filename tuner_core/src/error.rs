use thiserror::Error;

use crate::session::Phase;

/// Which formula a zero divisor was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ProcessGain,
    ProportionalGain,
    IntegralGain,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::ProcessGain => "process gain (delta output is zero)",
            Stage::ProportionalGain => "proportional gain (Kp * (lambda + Td)^2 is zero)",
            Stage::IntegralGain => "integral gain (integral time is zero)",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TuneError {
    #[error("slope {window} window [{start}, {end}] holds {found} sample(s), need at least 2")]
    InsufficientData {
        window: u8,
        start: f64,
        end: f64,
        found: usize,
    },
    #[error("slope {window} window has every sample at time {time}; slope is undefined")]
    DegenerateFit { window: u8, time: f64 },
    #[error("slope {window} window [{start}, {end}] is reversed or not finite")]
    InvalidWindow { window: u8, start: f64, end: f64 },
    #[error("control variable never changes across {samples} samples")]
    NoTransition { samples: usize },
    #[error("fitted lines are parallel (slopes {slope_a} and {slope_b}, epsilon {epsilon})")]
    ParallelLines {
        slope_a: f64,
        slope_b: f64,
        epsilon: f64,
    },
    #[error(
        "dead time is negative ({dead_time}): PV transition at {pv_transition} precedes CV step at {cv_transition}"
    )]
    NegativeDeadTime {
        pv_transition: f64,
        cv_transition: f64,
        dead_time: f64,
    },
    #[error("division by zero computing {stage}")]
    DivisionByZero { stage: Stage },
    #[error("not a number: {input:?}")]
    InputParse { input: String },
    #[error("invalid sample series: {0}")]
    InvalidSeries(String),
    #[error("cursor position {value} is not finite")]
    InvalidCursor { value: f64 },
    #[error("need 4 cursors to calculate parameters, {placed} placed")]
    IncompleteCursors { placed: usize },
    #[error("cannot {op} in state '{phase}'")]
    State { op: &'static str, phase: Phase },
}

pub type TuneResult<T> = std::result::Result<T, TuneError>;
