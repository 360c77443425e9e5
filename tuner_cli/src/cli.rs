//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "tuner_cli", version, about = "Lambda tuning for integrating processes")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit JSON lines instead of text (responses, errors and logs)
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute; `tune` when omitted
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive tuning session driven by commands on stdin
    Tune {
        /// Step-test CSV to load before reading commands
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,
    },
    /// Parse and validate the config, then print the effective settings
    CheckConfig,
}

/// One line of session input.
#[derive(Parser, Debug)]
#[command(
    name = "session",
    no_binary_name = true,
    disable_version_flag = true,
    disable_help_flag = true,
    help_template = "{subcommands}"
)]
pub struct ShellLine {
    #[command(subcommand)]
    pub cmd: ShellCommand,
}

#[derive(Subcommand, Debug)]
pub enum ShellCommand {
    /// Load a step-test CSV (time, pv, cv), replacing any current data
    Load {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Start placing the four cursors (clears cursors placed so far)
    Cursors,
    /// Place the next cursor at time X
    Cursor {
        #[arg(value_name = "X", allow_negative_numbers = true)]
        x: f64,
    },
    /// Calculate slopes, dead time and process gain from the four cursors
    Calc,
    /// Calculate PI gains for a lambda value (commas are ignored)
    Lambda {
        #[arg(
            value_name = "VALUE",
            required = true,
            num_args = 1..,
            allow_hyphen_values = true
        )]
        text: Vec<String>,
    },
    /// Print all readouts
    Show,
    /// Discard the data and all results
    Reset,
    /// End the session
    #[command(alias = "exit")]
    Quit,
}
