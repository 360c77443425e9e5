//! Runtime configuration for the tuning pipeline and its readouts.
//!
//! These are separate from the TOML-deserialized config in `tuner_config`; see
//! `conversions` for the mapping.

use crate::display::Quantity;

/// Numeric knobs of the pipeline.
#[derive(Debug, Clone)]
pub struct TunerCfg {
    /// Slopes closer than this are parallel; the intersection is refused.
    pub parallel_epsilon: f64,
    /// Recommended lambda floor as a multiple of dead time. Advisory only.
    pub min_lambda_multiple: f64,
}

impl Default for TunerCfg {
    fn default() -> Self {
        Self {
            parallel_epsilon: 1e-12,
            min_lambda_multiple: 3.0,
        }
    }
}

/// Which quantities to expose and how to round them for display.
///
/// Rounding here never feeds back into the math.
#[derive(Debug, Clone)]
pub struct DisplayCfg {
    pub slope_scale: f64,
    pub slope_decimals: u32,
    pub delta_output_decimals: u32,
    pub dead_time_decimals: u32,
    pub process_gain_decimals: u32,
    pub lambda_decimals: u32,
    pub proportional_gain_decimals: u32,
    pub integral_time_decimals: u32,
    pub integral_gain_decimals: u32,
    pub lambda_hint_decimals: u32,
    /// Display order.
    pub show: Vec<Quantity>,
}

impl DisplayCfg {
    pub fn decimals(&self, q: Quantity) -> u32 {
        match q {
            Quantity::Slope1 | Quantity::Slope2 => self.slope_decimals,
            Quantity::DeltaOutput => self.delta_output_decimals,
            Quantity::DeadTime => self.dead_time_decimals,
            Quantity::ProcessGain => self.process_gain_decimals,
            Quantity::Lambda => self.lambda_decimals,
            Quantity::ProportionalGain => self.proportional_gain_decimals,
            Quantity::IntegralTime => self.integral_time_decimals,
            Quantity::IntegralGain => self.integral_gain_decimals,
        }
    }
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            slope_scale: 1.0,
            slope_decimals: 4,
            delta_output_decimals: 8,
            dead_time_decimals: 4,
            process_gain_decimals: 8,
            lambda_decimals: 4,
            proportional_gain_decimals: 6,
            integral_time_decimals: 4,
            integral_gain_decimals: 6,
            lambda_hint_decimals: 2,
            show: Quantity::ALL.to_vec(),
        }
    }
}
