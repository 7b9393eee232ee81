use crate::checks::Checker;
use crate::config::CheckerConfig;
use crate::error::Result;

pub fn run_unlock(config: CheckerConfig) -> Result<()> {
    let checker = Checker::new(config)?;
    let path = checker.config().lock_file_path.clone();
    match checker.lock_holder() {
        Some(holder) => println!(
            "removing lock {} (pid {} on {} since {})",
            path.display(),
            holder.pid,
            holder.host,
            holder.time
        ),
        None => println!("no readable lock at {}", path.display()),
    }
    checker.release_lock()?;
    Ok(())
}
