use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::checks::{CheckResult, Checker};
use crate::config::CheckerConfig;
use crate::types::{CheckCode, CheckName};
use crate::util::paths::{clean_path, is_degenerate};

pub const DIR_MODE: u32 = 0o755;

pub fn required_directories(cfg: &CheckerConfig) -> BTreeSet<PathBuf> {
    let lock_parent = cfg
        .lock_file_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    [
        &cfg.backup_path,
        &cfg.log_path,
        &cfg.lock_dir_path,
        &lock_parent,
    ]
    .into_iter()
    .map(|p| clean_path(p))
    .filter(|p| !is_degenerate(p))
    .collect()
}

impl Checker {
    pub fn check_directories(&self) -> CheckResult {
        let name = CheckName::Directories;
        let mut pending = Vec::new();

        for dir in required_directories(&self.config) {
            match self.fs.stat(&dir) {
                Ok(stat) if stat.is_dir => {
                    debug!("directory ok: {}", dir.display());
                }
                Ok(_) => {
                    return CheckResult::fail(
                        name,
                        CheckCode::NotDirectory,
                        format!("{} exists but is not a directory", dir.display()),
                    );
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    if self.config.dry_run {
                        info!("dry-run: would create directory {}", dir.display());
                        pending.push(dir);
                        continue;
                    }
                    if let Err(err) = self.fs.create_dir_all(&dir, DIR_MODE) {
                        return CheckResult::fail(
                            name,
                            CheckCode::CreateFailed,
                            format!("failed to create directory {}: {}", dir.display(), err),
                        )
                        .with_error(err);
                    }
                    info!("created directory {}", dir.display());
                    pending.push(dir);
                }
                Err(err) => {
                    return CheckResult::fail(
                        name,
                        CheckCode::StatFailed,
                        format!("failed to stat {}: {}", dir.display(), err),
                    )
                    .with_error(err);
                }
            }
        }

        let message = match (pending.len(), self.config.dry_run) {
            (0, _) => "All required directories exist".to_string(),
            (n, true) => format!("{} missing directories would be created (dry run)", n),
            (n, false) => format!("All required directories ready ({} created)", n),
        };
        CheckResult::pass(name, message)
    }
}
