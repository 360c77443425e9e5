//! Line-oriented tuning session: one user action per input line.
//!
//! Every command maps onto one `TuningSession` operation. A failing command is reported and
//! the session keeps its previous state, so the user can correct the input and carry on.

use std::io::{BufRead, Write};
use std::path::Path;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use eyre::WrapErr;
use serde_json::{Value, json};
use tuner_core::{CursorPlacement, DisplayCfg, Quantity, Readout, TunerCfg, TuningSession};

use crate::cli::{ShellCommand, ShellLine};
use crate::error_fmt::{format_error_json, humanize, report};

const CURSOR_LABELS: [&str; tuner_core::CURSOR_COUNT] = [
    "slope 1 start",
    "slope 1 end",
    "slope 2 start",
    "slope 2 end",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    session: TuningSession,
    display: DisplayCfg,
    parse_units: bool,
    json: bool,
}

impl Shell {
    pub fn new(cfg: &tuner_config::Config, json: bool) -> Self {
        Self {
            session: TuningSession::new(TunerCfg::from(cfg)),
            display: DisplayCfg::from(&cfg.display),
            parse_units: cfg.dataset.parse_units,
            json,
        }
    }

    pub fn session(&self) -> &TuningSession {
        &self.session
    }

    /// Read commands until end of input or `quit`.
    ///
    /// Command failures go to `err` as text, or to `out` as JSON error events in JSON mode.
    /// Only I/O failures end the loop with an error.
    pub fn run<R: BufRead, W: Write, E: Write>(
        &mut self,
        input: R,
        out: &mut W,
        err: &mut E,
    ) -> eyre::Result<()> {
        self.emit(
            out,
            json!({ "event": "ready", "phase": self.session.phase().to_string() }),
            || "Lambda tuner ready. Type `help` for commands.".to_string(),
        )?;
        for line in input.lines() {
            let line = line.wrap_err("read session input")?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            tracing::debug!(input = line, "session command");
            match self.dispatch(line, out) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "command failed");
                    if self.json {
                        writeln!(out, "{}", format_error_json(&e))?;
                    } else {
                        writeln!(err, "{}", humanize(&e))?;
                    }
                }
            }
            out.flush()?;
        }
        out.flush()?;
        Ok(())
    }

    /// Parse and execute one input line.
    pub fn dispatch<W: Write>(&mut self, line: &str, out: &mut W) -> eyre::Result<Flow> {
        match ShellLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => self.execute(parsed.cmd, out),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) =>
            {
                self.help(out, e.to_string())?;
                Ok(Flow::Continue)
            }
            Err(e) => Err(eyre::Report::new(e)),
        }
    }

    pub fn execute<W: Write>(&mut self, cmd: ShellCommand, out: &mut W) -> eyre::Result<Flow> {
        match cmd {
            ShellCommand::Load { path } => self.load(&path, out)?,
            ShellCommand::Cursors => {
                report(self.session.begin_cursor_placement())?;
                self.emit(
                    out,
                    json!({ "event": "placing_cursors", "count": tuner_core::CURSOR_COUNT }),
                    || {
                        format!(
                            "Place {} cursors with `cursor <X>`: {}.",
                            tuner_core::CURSOR_COUNT,
                            CURSOR_LABELS.join(", ")
                        )
                    },
                )?;
            }
            ShellCommand::Cursor { x } => match report(self.session.place_cursor(x))? {
                CursorPlacement::Placed { index, complete } => {
                    let label = CURSOR_LABELS.get(index - 1).copied().unwrap_or("cursor");
                    self.emit(
                        out,
                        json!({
                            "event": "cursor",
                            "index": index,
                            "x": x,
                            "label": label,
                            "complete": complete,
                        }),
                        || {
                            let mut s = format!("Cursor {index} ({label}) at {x}");
                            if complete {
                                s.push_str("; all cursors placed, run `calc`");
                            }
                            s
                        },
                    )?;
                }
                CursorPlacement::Ignored => {
                    self.emit(out, json!({ "event": "cursor_ignored", "x": x }), || {
                        format!(
                            "All {} cursors placed; ignoring {x}",
                            tuner_core::CURSOR_COUNT
                        )
                    })?;
                }
            },
            ShellCommand::Calc => {
                let p = report(self.session.calculate_parameters())?;
                let readouts = self.session.readouts(&self.display);
                let prompt = self.session.lambda_prompt(&self.display);
                let multiple = self.session.config().min_lambda_multiple;
                let min_lambda = p.recommended_min_lambda(multiple);
                self.emit(
                    out,
                    json!({
                        "event": "parameters",
                        "slope1": p.slope1(),
                        "slope2": p.slope2(),
                        "pv_transition": p.pv_transition_time(),
                        "cv_transition": p.cv_transition_time(),
                        "delta_output": p.delta_output(),
                        "dead_time": p.dead_time,
                        "process_gain": p.process_gain,
                        "min_lambda": min_lambda,
                        "readouts": readouts_json(&readouts),
                        "prompt": prompt,
                    }),
                    || {
                        let mut lines = render_lines(&readouts, |r| r.value.is_some());
                        lines.push(prompt);
                        lines.join("\n")
                    },
                )?;
            }
            ShellCommand::Lambda { text } => {
                let rep = report(self.session.submit_lambda_text(&text.join(" ")))?;
                let readouts = self.session.readouts(&self.display);
                let warning = rep.warning.map(|w| {
                    json!({
                        "lambda": w.lambda,
                        "recommended_min": w.recommended_min,
                        "message": w.to_string(),
                    })
                });
                self.emit(
                    out,
                    json!({
                        "event": "gains",
                        "lambda": rep.gains.lambda,
                        "proportional_gain": rep.gains.proportional_gain,
                        "integral_time": rep.gains.integral_time,
                        "integral_gain": rep.gains.integral_gain,
                        "warning": warning,
                        "readouts": readouts_json(&readouts),
                    }),
                    || {
                        let mut lines = Vec::new();
                        if let Some(w) = &rep.warning {
                            lines.push(format!("Warning: {w}"));
                        }
                        lines.extend(render_lines(&readouts, |r| {
                            r.value.is_some() && is_gain(r.quantity)
                        }));
                        lines.join("\n")
                    },
                )?;
            }
            ShellCommand::Show => {
                let readouts = self.session.readouts(&self.display);
                let phase = self.session.phase();
                let cursors = self.session.cursors().to_vec();
                self.emit(
                    out,
                    json!({
                        "event": "readouts",
                        "phase": phase.to_string(),
                        "cursors": cursors,
                        "readouts": readouts_json(&readouts),
                    }),
                    || {
                        let mut lines = vec![format!("Phase: {phase}")];
                        if !cursors.is_empty() {
                            let xs: Vec<String> = cursors.iter().map(f64::to_string).collect();
                            lines.push(format!("Cursors: {}", xs.join(", ")));
                        }
                        lines.extend(render_lines(&readouts, |_| true));
                        lines.join("\n")
                    },
                )?;
            }
            ShellCommand::Reset => {
                self.session.reset();
                self.emit(out, json!({ "event": "reset" }), || {
                    "Session reset.".to_string()
                })?;
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Load a step-test CSV, replacing the session's data. On error nothing changes.
    pub fn load<W: Write>(&mut self, path: &Path, out: &mut W) -> eyre::Result<()> {
        let raw = tuner_config::load_step_test_csv(path, self.parse_units)?;
        report(self.session.load_data(&raw))?;
        let units = self.session.units();
        let samples = raw.len();
        let units_text = if units == tuner_config::Units::default() {
            "no units".to_string()
        } else {
            format!("time: {}, pv: {}, cv: {}", units.time, units.pv, units.cv)
        };
        self.emit(
            out,
            json!({
                "event": "loaded",
                "path": path.display().to_string(),
                "samples": samples,
                "units": { "time": units.time, "pv": units.pv, "cv": units.cv },
            }),
            || format!("Loaded {samples} samples from {} ({units_text})", path.display()),
        )?;
        Ok(())
    }

    fn help<W: Write>(&self, out: &mut W, rendered: String) -> std::io::Result<()> {
        let commands: Vec<Value> = ShellLine::command()
            .get_subcommands()
            .map(|c| {
                json!({
                    "name": c.get_name(),
                    "about": c.get_about().map(|a| a.to_string()),
                })
            })
            .collect();
        self.emit(out, json!({ "event": "help", "commands": commands }), || {
            rendered.trim_end().to_string()
        })
    }

    fn emit<W: Write>(
        &self,
        out: &mut W,
        value: Value,
        text: impl FnOnce() -> String,
    ) -> std::io::Result<()> {
        if self.json {
            writeln!(out, "{value}")
        } else {
            writeln!(out, "{}", text())
        }
    }
}

fn is_gain(q: Quantity) -> bool {
    matches!(
        q,
        Quantity::Lambda
            | Quantity::ProportionalGain
            | Quantity::IntegralTime
            | Quantity::IntegralGain
    )
}

fn render_lines(readouts: &[Readout], keep: impl Fn(&Readout) -> bool) -> Vec<String> {
    readouts
        .iter()
        .filter(|r| keep(r))
        .map(Readout::render)
        .collect()
}

fn readouts_json(readouts: &[Readout]) -> Value {
    readouts
        .iter()
        .map(|r| {
            json!({
                "key": r.quantity.key(),
                "label": r.quantity.label(),
                "value": r.value,
                "rounded": r.rounded,
                "unit": r.unit,
            })
        })
        .collect()
}
