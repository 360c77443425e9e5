mod cli;
mod error_fmt;
mod shell;

use std::io;
use std::path::Path;

use clap::Parser;
use eyre::{WrapErr, eyre};
use serde_json::{Value, json};
use tuner_config::Config;
use tuner_core::Quantity;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{ConfigContext, exit_code_for_error, format_error_json, humanize};
use crate::shell::Shell;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    color_eyre::install()?;

    let cfg = load_config(cli.config.as_deref())?;
    init_tracing(&cli, &cfg.logging)?;
    tracing::debug!(config = ?cli.config, "config loaded");

    match cli.cmd.unwrap_or(Commands::Tune { data: None }) {
        Commands::Tune { data } => tune(&cfg, data.as_deref(), cli.json),
        Commands::CheckConfig => check_config(&cfg, cli.config.as_deref(), cli.json),
    }
}

/// Read, parse and validate the TOML config; defaults when no path is given.
fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let ctx = || ConfigContext(path.display().to_string());
    let text = std::fs::read_to_string(path).wrap_err_with(ctx)?;
    let cfg = tuner_config::load_toml(&text).wrap_err_with(ctx)?;
    cfg.validate().wrap_err_with(ctx)?;
    Ok(cfg)
}

fn init_tracing(cli: &Cli, logging: &tuner_config::Logging) -> eyre::Result<()> {
    use tracing_subscriber::{
        EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt,
    };

    // RUST_LOG wins over --log-level
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let console = if cli.json {
        fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_filter(console_filter)
            .boxed()
    };

    let file = match &logging.file {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre!("logging.file {file:?} has no file name"))?;
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            let level = logging.level.as_deref().unwrap_or("info");
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(EnvFilter::new(level))
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| eyre!("failed to initialize logging: {e}"))
}

fn tune(cfg: &Config, data: Option<&Path>, json: bool) -> eyre::Result<()> {
    let mut shell = Shell::new(cfg, json);
    let mut out = io::stdout().lock();
    let mut err = io::stderr().lock();

    // A dataset named on the command line must load; otherwise there is nothing to tune
    if let Some(path) = data {
        shell.load(path, &mut out)?;
    }
    shell.run(io::stdin().lock(), &mut out, &mut err)?;
    tracing::info!(phase = %shell.session().phase(), "session ended");
    Ok(())
}

fn check_config(cfg: &Config, path: Option<&Path>, json: bool) -> eyre::Result<()> {
    let settings = effective_settings(cfg);
    if json {
        let source = path.map(|p| p.display().to_string());
        println!(
            "{}",
            json!({ "event": "config", "source": source, "settings": settings })
        );
        return Ok(());
    }

    match path {
        Some(p) => println!("Config OK: {}", p.display()),
        None => println!("Config OK: built-in defaults"),
    }
    if let Value::Object(sections) = &settings {
        for (section, fields) in sections {
            if let Value::Object(fields) = fields {
                for (key, value) in fields {
                    println!("{section}.{key} = {value}");
                }
            }
        }
    }
    Ok(())
}

fn effective_settings(cfg: &Config) -> Value {
    let d = &cfg.display;
    let show: Vec<&str> = d
        .show
        .iter()
        .map(|s| Quantity::from(*s).key())
        .collect();
    json!({
        "dataset": { "parse_units": cfg.dataset.parse_units },
        "fit": { "parallel_epsilon": cfg.fit.parallel_epsilon },
        "lambda": { "min_dead_time_multiple": cfg.lambda.min_dead_time_multiple },
        "display": {
            "slope_scale": d.slope_scale,
            "slope_decimals": d.slope_decimals,
            "delta_output_decimals": d.delta_output_decimals,
            "dead_time_decimals": d.dead_time_decimals,
            "process_gain_decimals": d.process_gain_decimals,
            "lambda_decimals": d.lambda_decimals,
            "proportional_gain_decimals": d.proportional_gain_decimals,
            "integral_time_decimals": d.integral_time_decimals,
            "integral_gain_decimals": d.integral_gain_decimals,
            "lambda_hint_decimals": d.lambda_hint_decimals,
            "show": show,
        },
        "logging": {
            "file": cfg.logging.file,
            "level": cfg.logging.level,
            "rotation": cfg.logging.rotation,
        },
    })
}
