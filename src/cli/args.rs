use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "proxsave",
    version,
    about = "Pre-flight checks for Proxmox configuration backups"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub dry_run: bool,
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run all pre-flight checks and take the run lock.
    Check(CheckArgs),
    /// Remove the run lock left by a previous invocation.
    Unlock,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    #[arg(long)]
    pub skip_permission_check: bool,
    /// Estimated archive size in GB; enables the size-aware disk check.
    #[arg(long)]
    pub estimate_gb: Option<f64>,
    /// Leave the lock in place after a successful run.
    #[arg(long)]
    pub keep_lock: bool,
}
