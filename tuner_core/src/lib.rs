#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Lambda tuning for integrating processes (UI-agnostic).
//!
//! This crate turns a step test (time, PV, CV samples) plus four user-placed cursors into
//! PI gains. Plotting, cursor drawing and dialogs belong to the front end; it only feeds
//! cursor positions and lambda values in and reads readouts back.
//!
//! ## Architecture
//!
//! - **Series**: validated sample columns and their units (`series` module)
//! - **Curve fit**: least-squares line over a closed cursor window (`fit` module)
//! - **Transition**: first CV step (`transition` module)
//! - **Intersection**: PV transition time from the two fitted lines (`intersect` module)
//! - **Tuning**: dead time, process gain, lambda gains (`tuning` module)
//! - **Session**: state machine ordering the steps (`session` module)
//! - **Display**: labelled, unit-tagged, rounded readouts (`display` module)
//!
//! All math runs in `f64` and is never rounded; rounding happens only in `display`.

pub mod config;
pub mod conversions;
pub mod display;
pub mod error;
pub mod fit;
pub mod intersect;
pub mod series;
pub mod session;
pub mod transition;
pub mod tuning;

pub use config::{DisplayCfg, TunerCfg};
pub use display::{Quantity, Readout, readouts, round_to};
pub use error::{Stage, TuneError, TuneResult};
pub use fit::{FitWindow, LineFit, fit_line};
pub use intersect::{Intersection, intersect};
pub use series::{Dataset, SampleSeries};
pub use session::{CURSOR_COUNT, CursorPlacement, Cursors, Phase, SessionState, TuningSession};
pub use transition::{TransitionEvent, find_step};
pub use tuner_config::Units;
pub use tuning::{
    GainsReport, LambdaWarning, TuningGains, TuningParameters, compute_gains, compute_parameters,
    dead_time, lambda_gains, parse_lambda, process_gain,
};
