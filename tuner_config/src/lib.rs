#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and step-test dataset loading for the lambda tuner.
//!
//! - `Config` and its sections are deserialized from TOML and validated. Every section is
//!   optional; an empty file yields the built-in defaults.
//! - The step-test CSV loader (`dataset` module) turns a `time,pv,cv` file into column vectors
//!   plus the unit labels found in the header.
use serde::Deserialize;
use serde::de::Deserializer;

pub mod dataset;

pub use dataset::{LoadError, StepTestData, Units, load_step_test_csv, parse_step_test_csv};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatasetCfg {
    /// Require `Name (unit)` header cells when a header row is present.
    pub parse_units: bool,
}

impl Default for DatasetCfg {
    fn default() -> Self {
        Self { parse_units: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FitCfg {
    /// Two fitted slopes closer than this are treated as parallel.
    pub parallel_epsilon: f64,
}

impl Default for FitCfg {
    fn default() -> Self {
        Self {
            parallel_epsilon: 1e-12,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LambdaCfg {
    /// Recommended lambda floor as a multiple of the dead time. Advisory only.
    pub min_dead_time_multiple: f64,
}

impl Default for LambdaCfg {
    fn default() -> Self {
        Self {
            min_dead_time_multiple: 3.0,
        }
    }
}

/// Derived quantities the display can show, in TOML spelling.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ShowItem {
    Slope1,
    Slope2,
    DeltaOutput,
    DeadTime,
    ProcessGain,
    Lambda,
    ProportionalGain,
    IntegralTime,
    IntegralGain,
}

impl ShowItem {
    pub const ALL: [ShowItem; 9] = [
        ShowItem::Slope1,
        ShowItem::Slope2,
        ShowItem::DeltaOutput,
        ShowItem::DeadTime,
        ShowItem::ProcessGain,
        ShowItem::Lambda,
        ShowItem::ProportionalGain,
        ShowItem::IntegralTime,
        ShowItem::IntegralGain,
    ];
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayCfg {
    /// Display-only multiplier for slopes (e.g. 1000.0 to show per-second slopes of a
    /// millisecond time base). Never applied to the math.
    pub slope_scale: f64,
    pub slope_decimals: u32,
    pub delta_output_decimals: u32,
    pub dead_time_decimals: u32,
    pub process_gain_decimals: u32,
    pub lambda_decimals: u32,
    pub proportional_gain_decimals: u32,
    pub integral_time_decimals: u32,
    pub integral_gain_decimals: u32,
    /// Precision of the recommended minimum lambda shown in the prompt.
    pub lambda_hint_decimals: u32,
    /// Which quantities to expose, in display order.
    #[serde(deserialize_with = "de_show")]
    pub show: Vec<ShowItem>,
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
            show: ShowItem::ALL.to_vec(),
        }
    }
}

/// Accepts either a list of names or a single name.
fn de_show<'de, D>(deserializer: D) -> Result<Vec<ShowItem>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ShowToml {
        One(ShowItem),
        Many(Vec<ShowItem>),
    }
    Ok(match ShowToml::deserialize(deserializer)? {
        ShowToml::One(item) => vec![item],
        ShowToml::Many(items) => items,
    })
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub dataset: DatasetCfg,
    pub fit: FitCfg,
    pub lambda: LambdaCfg,
    pub display: DisplayCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Largest precision accepted for any display field; f64 carries ~15 significant digits.
pub const MAX_DECIMALS: u32 = 15;

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Fit
        if !self.fit.parallel_epsilon.is_finite() || self.fit.parallel_epsilon < 0.0 {
            eyre::bail!("fit.parallel_epsilon must be finite and >= 0");
        }

        // Lambda
        let m = self.lambda.min_dead_time_multiple;
        if !m.is_finite() || m <= 0.0 {
            eyre::bail!("lambda.min_dead_time_multiple must be finite and > 0");
        }

        // Display
        let d = &self.display;
        if !d.slope_scale.is_finite() || d.slope_scale == 0.0 {
            eyre::bail!("display.slope_scale must be finite and non-zero");
        }
        for (name, decimals) in [
            ("slope_decimals", d.slope_decimals),
            ("delta_output_decimals", d.delta_output_decimals),
            ("dead_time_decimals", d.dead_time_decimals),
            ("process_gain_decimals", d.process_gain_decimals),
            ("lambda_decimals", d.lambda_decimals),
            ("proportional_gain_decimals", d.proportional_gain_decimals),
            ("integral_time_decimals", d.integral_time_decimals),
            ("integral_gain_decimals", d.integral_gain_decimals),
            ("lambda_hint_decimals", d.lambda_hint_decimals),
        ] {
            if decimals > MAX_DECIMALS {
                eyre::bail!("display.{name} must be <= {MAX_DECIMALS}");
            }
        }
        if d.show.is_empty() {
            eyre::bail!("display.show must list at least one quantity");
        }
        for (i, item) in d.show.iter().enumerate() {
            if d.show[..i].contains(item) {
                eyre::bail!("display.show lists {item:?} more than once");
            }
        }

        // Logging
        if let Some(rotation) = self.logging.rotation.as_deref()
            && !matches!(rotation, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rotation:?}");
        }

        Ok(())
    }
}
