use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Cli, Command};
use crate::cli::commands::{check, exit_for_error, unlock};
use crate::config::load_config;
use crate::types::RunMode;

const CONFIG_FILE: &str = "/etc/proxsave.yaml";

pub mod args;
pub mod commands;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let mut config = match load_config(config_path.to_string_lossy().as_ref()) {
        Ok(config) => config,
        Err(err) => exit_for_error(&err),
    };
    let run_mode = RunMode {
        dry_run: cli.dry_run || config.dry_run,
        verbose: cli.verbose,
    };
    config.dry_run = run_mode.dry_run;

    match cli.command.unwrap_or_else(|| Command::Check(Default::default())) {
        Command::Check(args) => {
            check::run_check(config, run_mode, &args).context("pre-flight check")?
        }
        Command::Unlock => unlock::run_unlock(config).context("unlock")?,
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
