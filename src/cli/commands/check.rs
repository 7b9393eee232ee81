use chrono::Local;
use signal_hook::consts::{SIGINT, SIGTERM};

use crate::checks::{CheckResult, Checker, LockGuard};
use crate::cli::args::CheckArgs;
use crate::cli::commands::exit_for_error;
use crate::config::CheckerConfig;
use crate::error::Result;
use crate::types::{CancelToken, RunMode};

pub fn format_result(result: &CheckResult) -> String {
    let status = if result.passed { "PASS" } else { "FAIL" };
    let code = result.code_str();
    if code.is_empty() {
        format!("[{}] {}: {}", status, result.name, result.message)
    } else {
        format!("[{}] {}: {} ({})", status, result.name, result.message, code)
    }
}

pub fn run_check(mut config: CheckerConfig, run_mode: RunMode, args: &CheckArgs) -> Result<()> {
    if args.skip_permission_check {
        config.skip_permission_check = true;
    }
    let mut checker = Checker::new(config)?;
    if let Some(gb) = args.estimate_gb {
        checker.set_estimated_size_gb(gb);
    }

    let cancel = CancelToken::new();
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, cancel.flag())?;
    }

    if run_mode.verbose {
        println!("{}", Local::now().format("%d-%m-%Y %H:%M"));
        println!("lock file: {}", checker.config().lock_file_path.display());
    }

    let report = checker.run_all_checks(&cancel);
    for result in &report.results {
        println!("{}", format_result(result));
    }
    if let Some(err) = report.failure {
        exit_for_error(&err);
    }
    if run_mode.dry_run {
        println!("dry-run: no changes made");
    }

    if args.keep_lock {
        println!(
            "all checks passed; lock kept at {}",
            checker.config().lock_file_path.display()
        );
        return Ok(());
    }
    let _guard = LockGuard::new(checker);
    println!("all checks passed");
    Ok(())
}
