//! `From` implementations bridging `tuner_config` types to `tuner_core` types.
//!
//! Keeps the CLI free of field-by-field mapping.

use crate::config::{DisplayCfg, TunerCfg};
use crate::display::Quantity;
use crate::error::TuneError;
use crate::series::{Dataset, SampleSeries};

// ── TunerCfg ─────────────────────────────────────────────────────────────────

impl From<&tuner_config::Config> for TunerCfg {
    fn from(c: &tuner_config::Config) -> Self {
        Self {
            parallel_epsilon: c.fit.parallel_epsilon,
            min_lambda_multiple: c.lambda.min_dead_time_multiple,
        }
    }
}

// ── DisplayCfg ───────────────────────────────────────────────────────────────

impl From<tuner_config::ShowItem> for Quantity {
    fn from(s: tuner_config::ShowItem) -> Self {
        use tuner_config::ShowItem;
        match s {
            ShowItem::Slope1 => Quantity::Slope1,
            ShowItem::Slope2 => Quantity::Slope2,
            ShowItem::DeltaOutput => Quantity::DeltaOutput,
            ShowItem::DeadTime => Quantity::DeadTime,
            ShowItem::ProcessGain => Quantity::ProcessGain,
            ShowItem::Lambda => Quantity::Lambda,
            ShowItem::ProportionalGain => Quantity::ProportionalGain,
            ShowItem::IntegralTime => Quantity::IntegralTime,
            ShowItem::IntegralGain => Quantity::IntegralGain,
        }
    }
}

impl From<&tuner_config::DisplayCfg> for DisplayCfg {
    fn from(c: &tuner_config::DisplayCfg) -> Self {
        Self {
            slope_scale: c.slope_scale,
            slope_decimals: c.slope_decimals,
            delta_output_decimals: c.delta_output_decimals,
            dead_time_decimals: c.dead_time_decimals,
            process_gain_decimals: c.process_gain_decimals,
            lambda_decimals: c.lambda_decimals,
            proportional_gain_decimals: c.proportional_gain_decimals,
            integral_time_decimals: c.integral_time_decimals,
            integral_gain_decimals: c.integral_gain_decimals,
            lambda_hint_decimals: c.lambda_hint_decimals,
            show: c.show.iter().copied().map(Quantity::from).collect(),
        }
    }
}

// ── Dataset ──────────────────────────────────────────────────────────────────

impl TryFrom<&tuner_config::StepTestData> for Dataset {
    type Error = TuneError;

    fn try_from(raw: &tuner_config::StepTestData) -> Result<Self, Self::Error> {
        Ok(Self {
            series: SampleSeries::new(raw.time.clone(), raw.pv.clone(), raw.cv.clone())?,
            units: raw.units.clone(),
        })
    }
}
