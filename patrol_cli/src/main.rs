#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `patrol` binary: config loading, logging and command dispatch.

mod cli;
mod error_fmt;
mod logging;
mod run;

use clap::Parser;
use eyre::WrapErr;
use patrol_core::{PatrolError, ShutdownToken};

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn load_config(cli: &Cli) -> eyre::Result<patrol_config::Config> {
    match &cli.config {
        Some(path) => patrol_config::load_file(path),
        None => Ok(patrol_config::Config::default()),
    }
}

/// Apply `run` flag overrides on top of the file config.
fn apply_overrides(cfg: &mut patrol_config::Config, cmd: &Commands) {
    if let Commands::Run { arc, policy, .. } = cmd {
        if let Some(arc) = arc {
            cfg.scan.arc_width_deg = *arc;
        }
        if let Some(policy) = policy {
            cfg.reaction.policy = (*policy).into();
        }
    }
}

fn validated(cfg: &patrol_config::Config) -> eyre::Result<()> {
    cfg.validate()
        .map_err(|e| eyre::Report::new(PatrolError::Config(e.to_string())))
}

fn install_ctrlc(shutdown: &ShutdownToken) {
    let token = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::warn!("interrupt received, stopping patrol");
        token.trigger();
    }) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let mut cfg = load_config(&cli)?;
    apply_overrides(&mut cfg, &cli.cmd);
    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)
        .wrap_err("init logging")?;
    validated(&cfg)?;

    match cli.cmd {
        Commands::Run {
            duration_ms,
            virtual_time,
            start,
            ..
        } => {
            let shutdown = ShutdownToken::new();
            install_ctrlc(&shutdown);
            let opts = run::RunOptions {
                duration: duration_ms.map(std::time::Duration::from_millis),
                virtual_time,
                start,
            };
            let summary = run::run_patrol(&cfg, &opts, &shutdown)?;
            println!("{}", run::render_summary(&summary, cli.json));
        }
        Commands::CheckConfig => {
            let params = patrol_core::PatrolParams::from(&cfg);
            patrol_core::builder::validate_params(&params)?;
            println!("config ok");
        }
        Commands::SelfCheck => {
            run::self_check(&cfg)?;
            println!("self-check ok");
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(err) = real_main(cli) {
        tracing::error!(error = %err, "patrol failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}
