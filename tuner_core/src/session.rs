//! Tuning session: the state machine that orders load, cursor placement, parameter
//! calculation and gain calculation.
//!
//! ```text
//! Empty --load--> Loaded --begin_cursor_placement--> CursorsPlacing
//! CursorsPlacing --place_cursor x4, calculate_parameters--> ParametersReady
//! ParametersReady --submit_lambda--> GainsReady --submit_lambda--> GainsReady
//! any --reset--> Empty          any --load--> Loaded
//! ```
//!
//! A failing operation leaves the state exactly as it was.

use crate::config::{DisplayCfg, TunerCfg};
use crate::display::{self, Readout};
use crate::error::{TuneError, TuneResult};
use crate::series::Dataset;
use crate::tuning::{GainsReport, TuningParameters, compute_gains, compute_parameters, parse_lambda};
use tuner_config::Units;

/// Number of cursors that bound the two slope windows.
pub const CURSOR_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Loaded,
    CursorsPlacing,
    ParametersReady,
    GainsReady,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::Empty => "empty",
            Phase::Loaded => "loaded",
            Phase::CursorsPlacing => "placing cursors",
            Phase::ParametersReady => "parameters ready",
            Phase::GainsReady => "gains ready",
        })
    }
}

/// Cursor x-positions in placement order, at most `CURSOR_COUNT`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cursors {
    xs: Vec<f64>,
}

impl Cursors {
    pub fn as_slice(&self) -> &[f64] {
        &self.xs
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.xs.len() == CURSOR_COUNT
    }

    /// All four positions once placement is finished.
    pub fn complete(&self) -> Option<[f64; CURSOR_COUNT]> {
        <[f64; CURSOR_COUNT]>::try_from(self.xs.as_slice()).ok()
    }
}

/// Outcome of offering a cursor to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorPlacement {
    /// Stored as cursor number `index` (1-based); `complete` once the fourth lands.
    Placed { index: usize, complete: bool },
    /// Four cursors are already placed; the position was dropped.
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Empty,
    Loaded {
        data: Dataset,
    },
    CursorsPlacing {
        data: Dataset,
        cursors: Cursors,
    },
    ParametersReady {
        data: Dataset,
        params: TuningParameters,
    },
    GainsReady {
        data: Dataset,
        params: TuningParameters,
        report: GainsReport,
    },
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        match self {
            SessionState::Empty => Phase::Empty,
            SessionState::Loaded { .. } => Phase::Loaded,
            SessionState::CursorsPlacing { .. } => Phase::CursorsPlacing,
            SessionState::ParametersReady { .. } => Phase::ParametersReady,
            SessionState::GainsReady { .. } => Phase::GainsReady,
        }
    }

    pub fn data(&self) -> Option<&Dataset> {
        match self {
            SessionState::Empty => None,
            SessionState::Loaded { data }
            | SessionState::CursorsPlacing { data, .. }
            | SessionState::ParametersReady { data, .. }
            | SessionState::GainsReady { data, .. } => Some(data),
        }
    }
}

/// Owns the loaded data and everything derived from it.
#[derive(Debug, Default)]
pub struct TuningSession {
    cfg: TunerCfg,
    state: SessionState,
}

impl TuningSession {
    pub fn new(cfg: TunerCfg) -> Self {
        Self {
            cfg,
            state: SessionState::Empty,
        }
    }

    pub fn config(&self) -> &TunerCfg {
        &self.cfg
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.state.data()
    }

    /// Units of the loaded data, or empty units when nothing is loaded.
    pub fn units(&self) -> Units {
        self.dataset().map(|d| d.units.clone()).unwrap_or_default()
    }

    /// Cursors placed so far; empty outside `CursorsPlacing`.
    pub fn cursors(&self) -> &[f64] {
        match &self.state {
            SessionState::CursorsPlacing { cursors, .. } => cursors.as_slice(),
            _ => &[],
        }
    }

    pub fn parameters(&self) -> Option<&TuningParameters> {
        match &self.state {
            SessionState::ParametersReady { params, .. } | SessionState::GainsReady { params, .. } => {
                Some(params)
            }
            _ => None,
        }
    }

    pub fn gains(&self) -> Option<&GainsReport> {
        match &self.state {
            SessionState::GainsReady { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Store a dataset, replacing whatever the session held. Allowed in every phase.
    pub fn load(&mut self, data: Dataset) {
        tracing::info!(
            samples = data.series.len(),
            from = %self.phase(),
            "dataset loaded"
        );
        self.state = SessionState::Loaded { data };
    }

    /// Validate raw columns and load them. On error the session is untouched.
    pub fn load_data(&mut self, raw: &tuner_config::StepTestData) -> TuneResult<()> {
        let data = Dataset::try_from(raw)?;
        self.load(data);
        Ok(())
    }

    /// Start accepting cursors. From `CursorsPlacing` this clears the cursors placed so far.
    pub fn begin_cursor_placement(&mut self) -> TuneResult<()> {
        match std::mem::take(&mut self.state) {
            SessionState::Loaded { data } | SessionState::CursorsPlacing { data, .. } => {
                self.state = SessionState::CursorsPlacing {
                    data,
                    cursors: Cursors::default(),
                };
                tracing::info!("cursor placement started");
                Ok(())
            }
            other => self.refuse(other, "place cursors"),
        }
    }

    pub fn place_cursor(&mut self, x: f64) -> TuneResult<CursorPlacement> {
        let SessionState::CursorsPlacing { cursors, .. } = &mut self.state else {
            return Err(TuneError::State {
                op: "place a cursor",
                phase: self.phase(),
            });
        };
        if !x.is_finite() {
            return Err(TuneError::InvalidCursor { value: x });
        }
        if cursors.is_complete() {
            tracing::debug!(x, "cursor ignored; all cursors placed");
            return Ok(CursorPlacement::Ignored);
        }
        cursors.xs.push(x);
        let index = cursors.len();
        let complete = cursors.is_complete();
        tracing::debug!(index, x, complete, "cursor placed");
        Ok(CursorPlacement::Placed { index, complete })
    }

    /// Run the slope / intersection / step / dead time / process gain stages.
    ///
    /// Consumes the cursor set on success. On failure the session stays in
    /// `CursorsPlacing` with its cursors.
    pub fn calculate_parameters(&mut self) -> TuneResult<TuningParameters> {
        match std::mem::take(&mut self.state) {
            SessionState::CursorsPlacing { data, cursors } => {
                let Some(xs) = cursors.complete() else {
                    let placed = cursors.len();
                    self.state = SessionState::CursorsPlacing { data, cursors };
                    return Err(TuneError::IncompleteCursors { placed });
                };
                match compute_parameters(&data.series, xs, &self.cfg) {
                    Ok(params) => {
                        self.state = SessionState::ParametersReady { data, params };
                        Ok(params)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "parameter calculation failed");
                        self.state = SessionState::CursorsPlacing { data, cursors };
                        Err(e)
                    }
                }
            }
            other => self.refuse(other, "calculate parameters"),
        }
    }

    /// Compute gains for `lambda` against the stored parameters. Repeatable; the parameters
    /// are never touched, and a failure keeps any earlier gains.
    pub fn submit_lambda(&mut self, lambda: f64) -> TuneResult<GainsReport> {
        let Some(params) = self.parameters().copied() else {
            return Err(TuneError::State {
                op: "calculate gains",
                phase: self.phase(),
            });
        };
        let report = compute_gains(&params, lambda, &self.cfg)?;
        self.state = match std::mem::take(&mut self.state) {
            SessionState::ParametersReady { data, params }
            | SessionState::GainsReady { data, params, .. } => SessionState::GainsReady {
                data,
                params,
                report,
            },
            other => other,
        };
        Ok(report)
    }

    /// Parse free-form lambda text (commas stripped) and submit it.
    pub fn submit_lambda_text(&mut self, text: &str) -> TuneResult<GainsReport> {
        if self.parameters().is_none() {
            return Err(TuneError::State {
                op: "calculate gains",
                phase: self.phase(),
            });
        }
        let lambda = parse_lambda(text)?;
        self.submit_lambda(lambda)
    }

    /// Drop the data and everything derived from it.
    pub fn reset(&mut self) {
        tracing::info!(from = %self.phase(), "session reset");
        self.state = SessionState::Empty;
    }

    pub fn readouts(&self, cfg: &DisplayCfg) -> Vec<Readout> {
        display::readouts(
            self.parameters(),
            self.gains().map(|r| &r.gains),
            cfg,
            &self.units(),
        )
    }

    pub fn lambda_prompt(&self, cfg: &DisplayCfg) -> String {
        display::lambda_prompt(
            self.parameters(),
            self.cfg.min_lambda_multiple,
            cfg,
            &self.units(),
        )
    }

    fn refuse<T>(&mut self, state: SessionState, op: &'static str) -> TuneResult<T> {
        let phase = state.phase();
        self.state = state;
        Err(TuneError::State { op, phase })
    }
}
