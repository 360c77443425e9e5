//! Readouts: derived values paired with labels, units and display rounding.

use crate::config::DisplayCfg;
use crate::tuning::{TuningGains, TuningParameters};
use tuner_config::Units;

/// A derived quantity the front end can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
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

impl Quantity {
    pub const ALL: [Quantity; 9] = [
        Quantity::Slope1,
        Quantity::Slope2,
        Quantity::DeltaOutput,
        Quantity::DeadTime,
        Quantity::ProcessGain,
        Quantity::Lambda,
        Quantity::ProportionalGain,
        Quantity::IntegralTime,
        Quantity::IntegralGain,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Quantity::Slope1 => "Slope 1",
            Quantity::Slope2 => "Slope 2",
            Quantity::DeltaOutput => "∆Output",
            Quantity::DeadTime => "Td",
            Quantity::ProcessGain => "Process Gain, Kp",
            Quantity::Lambda => "Lambda, λ",
            Quantity::ProportionalGain => "Proportional Gain, P",
            Quantity::IntegralTime => "Integral Time, It",
            Quantity::IntegralGain => "Integral Gain, I",
        }
    }

    /// Stable machine name, matching the TOML spelling.
    pub fn key(self) -> &'static str {
        match self {
            Quantity::Slope1 => "slope1",
            Quantity::Slope2 => "slope2",
            Quantity::DeltaOutput => "delta_output",
            Quantity::DeadTime => "dead_time",
            Quantity::ProcessGain => "process_gain",
            Quantity::Lambda => "lambda",
            Quantity::ProportionalGain => "proportional_gain",
            Quantity::IntegralTime => "integral_time",
            Quantity::IntegralGain => "integral_gain",
        }
    }

    pub fn unit(self, units: &Units) -> String {
        match self {
            Quantity::Slope1 | Quantity::Slope2 => {
                if units.pv.is_empty() && units.time.is_empty() {
                    String::new()
                } else {
                    format!("{}/{}", units.pv, units.time)
                }
            }
            Quantity::DeltaOutput => units.cv.clone(),
            Quantity::DeadTime | Quantity::Lambda | Quantity::IntegralTime => units.time.clone(),
            Quantity::ProcessGain | Quantity::ProportionalGain | Quantity::IntegralGain => {
                String::new()
            }
        }
    }
}

/// One displayed line. `value` is unrounded; `rounded` applies scale and precision.
#[derive(Debug, Clone, PartialEq)]
pub struct Readout {
    pub quantity: Quantity,
    pub value: Option<f64>,
    pub rounded: Option<f64>,
    pub unit: String,
}

impl Readout {
    pub fn render(&self) -> String {
        let value = match self.rounded {
            Some(v) => v.to_string(),
            None => "-".to_string(),
        };
        if self.unit.is_empty() {
            format!("{}: {value}", self.quantity.label())
        } else {
            format!("{}: {value} {}", self.quantity.label(), self.unit)
        }
    }
}

/// Round half away from zero to `decimals` places. Values too large to scale are returned as-is.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.min(i32::MAX as u32) as i32);
    let scaled = (value * factor).round();
    if scaled.is_finite() {
        scaled / factor
    } else {
        value
    }
}

fn raw_value(
    q: Quantity,
    params: Option<&TuningParameters>,
    gains: Option<&TuningGains>,
) -> Option<f64> {
    match q {
        Quantity::Slope1 => params.map(TuningParameters::slope1),
        Quantity::Slope2 => params.map(TuningParameters::slope2),
        Quantity::DeltaOutput => params.map(TuningParameters::delta_output),
        Quantity::DeadTime => params.map(|p| p.dead_time),
        Quantity::ProcessGain => params.map(|p| p.process_gain),
        Quantity::Lambda => gains.map(|g| g.lambda),
        Quantity::ProportionalGain => gains.map(|g| g.proportional_gain),
        Quantity::IntegralTime => gains.map(|g| g.integral_time),
        Quantity::IntegralGain => gains.map(|g| g.integral_gain),
    }
}

/// Readouts for every quantity in `cfg.show`, in that order. Quantities not computed yet
/// carry `None`.
pub fn readouts(
    params: Option<&TuningParameters>,
    gains: Option<&TuningGains>,
    cfg: &DisplayCfg,
    units: &Units,
) -> Vec<Readout> {
    cfg.show
        .iter()
        .map(|&quantity| {
            let value = raw_value(quantity, params, gains);
            let scale = match quantity {
                Quantity::Slope1 | Quantity::Slope2 => cfg.slope_scale,
                _ => 1.0,
            };
            Readout {
                quantity,
                value,
                rounded: value.map(|v| round_to(v * scale, cfg.decimals(quantity))),
                unit: quantity.unit(units),
            }
        })
        .collect()
}

/// Text for the lambda prompt: time unit and the recommended minimum, when known.
pub fn lambda_prompt(
    params: Option<&TuningParameters>,
    min_multiple: f64,
    cfg: &DisplayCfg,
    units: &Units,
) -> String {
    let unit = if units.time.is_empty() {
        String::new()
    } else {
        format!(" (units: {})", units.time)
    };
    match params {
        Some(p) => format!(
            "Enter the lambda (λ) value{unit}. Minimum value ({min_multiple}*Td): {}",
            round_to(p.recommended_min_lambda(min_multiple), cfg.lambda_hint_decimals)
        ),
        None => format!("Enter the lambda (λ) value{unit}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_to(1.52778, 4), 1.5278);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(0.069444, 2), 0.07);
    }

    #[test]
    fn huge_values_pass_through() {
        assert_eq!(round_to(1e300, 15), 1e300);
    }

    #[test]
    fn units_follow_header() {
        let units = Units {
            time: "s".into(),
            pv: "%".into(),
            cv: "mA".into(),
        };
        assert_eq!(Quantity::Slope1.unit(&units), "%/s");
        assert_eq!(Quantity::DeltaOutput.unit(&units), "mA");
        assert_eq!(Quantity::IntegralTime.unit(&units), "s");
        assert_eq!(Quantity::ProcessGain.unit(&units), "");
        assert_eq!(Quantity::Slope2.unit(&Units::default()), "");
    }

    #[test]
    fn empty_readout_renders_dash() {
        let r = Readout {
            quantity: Quantity::DeadTime,
            value: None,
            rounded: None,
            unit: "s".into(),
        };
        assert_eq!(r.render(), "Td: - s");
    }
}
