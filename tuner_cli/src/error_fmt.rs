//! Human-readable error descriptions and structured JSON error formatting.

use tuner_config::LoadError;
use tuner_core::error::{TuneError, TuneResult};

/// Context attached to every config failure; carries the config path.
#[derive(Debug)]
pub struct ConfigContext(pub String);

impl std::fmt::Display for ConfigContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config {}", self.0)
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(le) = err.downcast_ref::<LoadError>() {
        return match le {
            LoadError::Open { path, reason } => format!(
                "What happened: Could not open {path} ({reason}).\nLikely causes: Wrong path or missing read permission.\nHow to fix: Check the file name and try `load <FILE>` again."
            ),
            LoadError::Empty => {
                "What happened: The dataset has no data rows.\nLikely causes: Empty export or only a header line.\nHow to fix: Export the step test again with at least a few samples.".to_string()
            }
            LoadError::TooFewColumns { line, found } => format!(
                "What happened: Line {line} has {found} column(s).\nLikely causes: Wrong delimiter or a truncated export.\nHow to fix: Provide comma-separated time, PV and CV columns."
            ),
            LoadError::NonNumeric {
                line,
                column,
                value,
            } => format!(
                "What happened: Line {line}, column {column} holds {value:?}, which is not a number.\nLikely causes: Stray text, a second header row or a locale decimal comma.\nHow to fix: Clean the file so every data cell is a plain number."
            ),
            LoadError::MissingUnits { column, header } => format!(
                "What happened: Header column {column} ({header:?}) has no unit.\nLikely causes: Headers like `Time` instead of `Time (s)`.\nHow to fix: Add units in parentheses, or set dataset.parse_units = false in the config."
            ),
            LoadError::Malformed { line, reason } => format!(
                "What happened: The CSV could not be read at line {line} ({reason}).\nLikely causes: Broken quoting or invalid UTF-8.\nHow to fix: Re-export the file as plain UTF-8 CSV."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TuneError>() {
        return humanize_tune(te);
    }

    if let Some(ce) = err.downcast_ref::<clap::Error>() {
        let rendered = ce.to_string();
        let first = rendered.lines().next().unwrap_or_default();
        return format!(
            "What happened: {}.\nLikely causes: A mistyped command or a missing argument.\nHow to fix: Type `help` for the list of commands.",
            first.trim_start_matches("error: ")
        );
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML ({}).\nLikely causes: A typo, an unknown display item or a value of the wrong type.\nHow to fix: Fix the file and run `tuner_cli check-config`.",
            te.message().trim_end()
        );
    }

    if let Some(ctx) = err.downcast_ref::<ConfigContext>() {
        let root = err.root_cause();
        return format!(
            "What happened: Cannot use config {} ({root}).\nLikely causes: Wrong --config path or an out-of-range value in the TOML.\nHow to fix: Edit the config file and run `tuner_cli check-config`, or omit --config to use defaults.",
            ctx.0
        );
    }

    let msg = err.to_string();

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn humanize_tune(te: &TuneError) -> String {
    match te {
        TuneError::InsufficientData { window, found, .. } => format!(
            "What happened: {te}.\nLikely causes: Cursors {a} and {b} are closer together than the sample spacing.\nHow to fix: Run `cursors` and place slope {window} cursors further apart ({found} sample(s) found).",
            a = 2 * window - 1,
            b = 2 * window,
        ),
        TuneError::DegenerateFit { .. } => format!(
            "What happened: {te}.\nLikely causes: Repeated time stamps inside the window.\nHow to fix: Widen the window so it spans more than one time value."
        ),
        TuneError::InvalidWindow { .. } => format!(
            "What happened: {te}.\nLikely causes: The end cursor of a window was placed before its start.\nHow to fix: Run `cursors` and place each pair left to right."
        ),
        TuneError::NoTransition { .. } => format!(
            "What happened: {te}.\nLikely causes: The file does not contain the output step.\nHow to fix: Load a step test where the controller output changes."
        ),
        TuneError::ParallelLines { .. } => format!(
            "What happened: {te}.\nLikely causes: Both windows sit on the same trend.\nHow to fix: Place slope 1 before the step and slope 2 after the response has settled."
        ),
        TuneError::NegativeDeadTime { .. } => format!(
            "What happened: {te}.\nLikely causes: Slope windows placed on the wrong side of the step, or PV drifting before the step.\nHow to fix: Re-place the cursors around the actual response."
        ),
        TuneError::DivisionByZero { .. } => format!(
            "What happened: {te}.\nLikely causes: A zero process gain or a lambda that cancels the dead time.\nHow to fix: Check the slopes and use a positive lambda."
        ),
        TuneError::InputParse { .. } => format!(
            "What happened: {te}.\nLikely causes: Text or several decimal points in the lambda value.\nHow to fix: Enter a plain number such as `lambda 1,500` or `lambda 12.5`."
        ),
        TuneError::InvalidSeries(_) => format!(
            "What happened: {te}.\nLikely causes: Unsorted time column or missing values.\nHow to fix: Sort the file by time and fill the gaps."
        ),
        TuneError::InvalidCursor { .. } => format!(
            "What happened: {te}.\nLikely causes: A non-numeric cursor position.\nHow to fix: Use `cursor <X>` with a finite time value."
        ),
        TuneError::IncompleteCursors { .. } => format!(
            "What happened: {te}.\nLikely causes: `calc` ran before all cursors were placed.\nHow to fix: Place the remaining cursors with `cursor <X>`."
        ),
        TuneError::State { .. } => format!(
            "What happened: {te}.\nLikely causes: Commands given out of order.\nHow to fix: Follow load, cursors, cursor x4, calc, lambda. Type `help` for the list."
        ),
    }
}

/// Stable name for the error kind, used as `reason` in JSON output.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(le) = err.downcast_ref::<LoadError>() {
        return match le {
            LoadError::Open { .. } => "Open",
            LoadError::Empty => "Empty",
            LoadError::TooFewColumns { .. } => "TooFewColumns",
            LoadError::NonNumeric { .. } => "NonNumeric",
            LoadError::MissingUnits { .. } => "MissingUnits",
            LoadError::Malformed { .. } => "Malformed",
        };
    }
    if let Some(te) = err.downcast_ref::<TuneError>() {
        return match te {
            TuneError::InsufficientData { .. } => "InsufficientData",
            TuneError::DegenerateFit { .. } => "DegenerateFit",
            TuneError::InvalidWindow { .. } => "InvalidWindow",
            TuneError::NoTransition { .. } => "NoTransition",
            TuneError::ParallelLines { .. } => "ParallelLines",
            TuneError::NegativeDeadTime { .. } => "NegativeDeadTime",
            TuneError::DivisionByZero { .. } => "DivisionByZero",
            TuneError::InputParse { .. } => "InputParse",
            TuneError::InvalidSeries(_) => "InvalidSeries",
            TuneError::InvalidCursor { .. } => "InvalidCursor",
            TuneError::IncompleteCursors { .. } => "IncompleteCursors",
            TuneError::State { .. } => "State",
        };
    }
    if err.downcast_ref::<clap::Error>().is_some() {
        return "Usage";
    }
    if err.downcast_ref::<toml::de::Error>().is_some() {
        return "ConfigParse";
    }
    if err.downcast_ref::<ConfigContext>().is_some() {
        return "Config";
    }
    "Error"
}

/// Stable exit codes for fatal errors: 2 for config, 3 for dataset loading, 4 for tuning,
/// 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<ConfigContext>().is_some() {
        return 2;
    }
    if err.downcast_ref::<LoadError>().is_some() {
        return 3;
    }
    if err.downcast_ref::<TuneError>().is_some() {
        return 4;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "event": "error",
        "reason": reason_name(err),
        "error": err.to_string(),
        "message": humanize(err),
    })
    .to_string()
}

/// Lift a core result into an eyre report so it formats like every other error.
pub fn report<T>(r: TuneResult<T>) -> eyre::Result<T> {
    r.map_err(eyre::Report::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuner_core::Phase;

    #[test]
    fn typed_errors_get_specific_text() {
        let e = eyre::Report::new(TuneError::NoTransition { samples: 3 });
        let h = humanize(&e);
        assert!(h.starts_with("What happened: control variable never changes"));
        assert_eq!(reason_name(&e), "NoTransition");
        assert_eq!(exit_code_for_error(&e), 4);

        let e = eyre::Report::new(LoadError::Empty);
        assert!(humanize(&e).contains("no data rows"));
        assert_eq!(exit_code_for_error(&e), 3);
    }

    #[test]
    fn state_errors_name_the_phase() {
        let e = eyre::Report::new(TuneError::State {
            op: "calculate parameters",
            phase: Phase::Loaded,
        });
        assert!(humanize(&e).contains("cannot calculate parameters in state 'loaded'"));
    }

    #[test]
    fn json_error_is_one_line() {
        let e = eyre::Report::new(TuneError::InputParse { input: "x".into() });
        let s = format_error_json(&e);
        assert!(!s.contains('\n'));
        let v: serde_json::Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v["event"], "error");
        assert_eq!(v["reason"], "InputParse");
    }

    #[test]
    fn untyped_errors_fall_back() {
        let e = eyre::eyre!("boom");
        assert!(humanize(&e).starts_with("Something went wrong."));
        assert_eq!(exit_code_for_error(&e), 1);
    }

    #[test]
    fn config_failures_keep_their_cause() {
        use eyre::WrapErr;
        let e = Err::<(), _>(eyre::eyre!("fit.parallel_epsilon must be >= 0"))
            .wrap_err(ConfigContext("tuner.toml".into()))
            .unwrap_err();
        let h = humanize(&e);
        assert!(h.contains("Cannot use config tuner.toml"));
        assert!(h.contains("parallel_epsilon"));
        assert_eq!(exit_code_for_error(&e), 2);
        assert_eq!(reason_name(&e), "Config");
    }

    #[test]
    fn config_hints_name_the_installed_binary() {
        use clap::CommandFactory;
        let bin = crate::cli::Cli::command().get_name().to_string();
        assert_eq!(bin, env!("CARGO_BIN_NAME"));

        let hint = format!("`{bin} check-config`");
        let parse = toml::from_str::<toml::Value>("a = ").unwrap_err();
        assert!(humanize(&eyre::Report::new(parse)).contains(&hint));
        let ctx = eyre::eyre!("bad").wrap_err(ConfigContext("tuner.toml".into()));
        assert!(humanize(&ctx).contains(&hint));
    }
}
