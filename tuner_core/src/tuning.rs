//! Dead time, process gain and lambda-tuning gains for an integrating process.
//!
//! The pipeline runs in a fixed order, each stage consuming the previous one:
//!
//! 1. fit the pre-step and post-step PV slopes (`fit::fit_line`),
//! 2. intersect the two lines to get the PV transition time (`intersect::intersect`),
//! 3. find the CV step time and size (`transition::find_step`),
//! 4. `Td = t_pv - t_cv`,
//! 5. `Kp = (slope2 - slope1) / delta_output`,
//! 6. for a chosen lambda:
//!    `P = (2 lambda + Td) / (Kp (lambda + Td)^2)`, `It = 2 lambda + Td`, `I = P / It`.
//!
//! No value is rounded here.

use crate::config::TunerCfg;
use crate::error::{Stage, TuneError, TuneResult};
use crate::fit::{FitWindow, LineFit, fit_line};
use crate::intersect::{Intersection, intersect};
use crate::series::SampleSeries;
use crate::transition::{TransitionEvent, find_step};

/// Everything derived from the data and the four cursors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningParameters {
    pub fit1: LineFit,
    pub fit2: LineFit,
    /// Where the two PV lines meet; `x` is the PV transition time.
    pub pv_transition: Intersection,
    pub cv_step: TransitionEvent,
    pub dead_time: f64,
    pub process_gain: f64,
}

impl TuningParameters {
    #[inline]
    pub fn slope1(&self) -> f64 {
        self.fit1.slope
    }

    #[inline]
    pub fn slope2(&self) -> f64 {
        self.fit2.slope
    }

    #[inline]
    pub fn delta_output(&self) -> f64 {
        self.cv_step.magnitude
    }

    #[inline]
    pub fn pv_transition_time(&self) -> f64 {
        self.pv_transition.x
    }

    #[inline]
    pub fn cv_transition_time(&self) -> f64 {
        self.cv_step.time
    }

    /// Smallest lambda the method recommends: `multiple * Td`.
    #[inline]
    pub fn recommended_min_lambda(&self, multiple: f64) -> f64 {
        multiple * self.dead_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningGains {
    pub lambda: f64,
    pub proportional_gain: f64,
    pub integral_time: f64,
    pub integral_gain: f64,
}

/// Lambda below the recommended floor. Reported, never enforced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambdaWarning {
    pub lambda: f64,
    pub recommended_min: f64,
}

impl std::fmt::Display for LambdaWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lambda {} is below the recommended minimum {}",
            self.lambda, self.recommended_min
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainsReport {
    pub gains: TuningGains,
    pub warning: Option<LambdaWarning>,
}

/// `Td = pv_transition_time - cv_transition_time`; negative is an error, never clamped.
pub fn dead_time(pv_transition_time: f64, cv_transition_time: f64) -> TuneResult<f64> {
    let td = pv_transition_time - cv_transition_time;
    if td < 0.0 {
        return Err(TuneError::NegativeDeadTime {
            pv_transition: pv_transition_time,
            cv_transition: cv_transition_time,
            dead_time: td,
        });
    }
    Ok(td)
}

/// `Kp = (slope2 - slope1) / delta_output`.
pub fn process_gain(slope1: f64, slope2: f64, delta_output: f64) -> TuneResult<f64> {
    if delta_output == 0.0 {
        return Err(TuneError::DivisionByZero {
            stage: Stage::ProcessGain,
        });
    }
    Ok((slope2 - slope1) / delta_output)
}

/// Lambda-tuning PI gains for an integrating process.
pub fn lambda_gains(process_gain: f64, dead_time: f64, lambda: f64) -> TuneResult<TuningGains> {
    let p_numerator = 2.0 * lambda + dead_time;
    let p_denominator = process_gain * (lambda + dead_time).powi(2);
    if p_denominator == 0.0 {
        return Err(TuneError::DivisionByZero {
            stage: Stage::ProportionalGain,
        });
    }
    let proportional_gain = p_numerator / p_denominator;
    let integral_time = p_numerator;
    if integral_time == 0.0 {
        return Err(TuneError::DivisionByZero {
            stage: Stage::IntegralGain,
        });
    }
    Ok(TuningGains {
        lambda,
        proportional_gain,
        integral_time,
        integral_gain: proportional_gain / integral_time,
    })
}

/// Steps 1-5: slopes, PV transition, CV step, dead time and process gain.
///
/// `cursors` are in placement order: slope-1 start, slope-1 end, slope-2 start, slope-2 end.
pub fn compute_parameters(
    series: &SampleSeries,
    cursors: [f64; 4],
    cfg: &TunerCfg,
) -> TuneResult<TuningParameters> {
    let fit1 = fit_line(series, FitWindow::new(1, cursors[0], cursors[1]))?;
    let fit2 = fit_line(series, FitWindow::new(2, cursors[2], cursors[3]))?;
    let pv_transition = intersect(&fit1, &fit2, cfg.parallel_epsilon)?;
    let cv_step = find_step(series)?;
    let dead_time = dead_time(pv_transition.x, cv_step.time)?;
    let process_gain = process_gain(fit1.slope, fit2.slope, cv_step.magnitude)?;

    tracing::info!(
        slope1 = fit1.slope,
        slope2 = fit2.slope,
        pv_transition = pv_transition.x,
        cv_transition = cv_step.time,
        delta_output = cv_step.magnitude,
        dead_time,
        process_gain,
        "system parameters"
    );
    Ok(TuningParameters {
        fit1,
        fit2,
        pv_transition,
        cv_step,
        dead_time,
        process_gain,
    })
}

/// Step 6 for a given lambda, with the below-minimum hint attached.
pub fn compute_gains(
    params: &TuningParameters,
    lambda: f64,
    cfg: &TunerCfg,
) -> TuneResult<GainsReport> {
    if !lambda.is_finite() {
        return Err(TuneError::InputParse {
            input: lambda.to_string(),
        });
    }
    let gains = lambda_gains(params.process_gain, params.dead_time, lambda)?;
    let recommended_min = params.recommended_min_lambda(cfg.min_lambda_multiple);
    let warning = (lambda < recommended_min).then_some(LambdaWarning {
        lambda,
        recommended_min,
    });
    if let Some(w) = &warning {
        tracing::warn!(
            lambda,
            recommended_min = w.recommended_min,
            "lambda below recommended minimum"
        );
    }
    tracing::info!(
        lambda,
        proportional_gain = gains.proportional_gain,
        integral_time = gains.integral_time,
        integral_gain = gains.integral_gain,
        "lambda gains"
    );
    Ok(GainsReport { gains, warning })
}

/// Parse free-form lambda text. Thousands separators (`,`) are stripped first.
pub fn parse_lambda(text: &str) -> TuneResult<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(TuneError::InputParse {
            input: text.to_string(),
        }),
    }
}
