use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use chrono::Utc;
use nix::errno::Errno;
use tracing::{debug, info, warn};

use crate::checks::{CheckResult, Checker};
use crate::types::{CheckCode, CheckName};

pub const PERMISSION_ATTEMPTS: u32 = 3;

fn is_transient(err: &io::Error) -> bool {
    err.raw_os_error() == Some(Errno::EIO as i32)
}

pub fn classify_write_error(err: &io::Error) -> CheckCode {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return CheckCode::PermissionDenied;
    }
    match err.raw_os_error() {
        Some(code) if code == Errno::EROFS as i32 => CheckCode::FsReadonly,
        Some(code) if code == Errno::EIO as i32 => CheckCode::FsIoError,
        _ => CheckCode::PermissionCheckFailed,
    }
}

fn scratch_file_name(dir: &Path) -> PathBuf {
    let ts = Utc::now().format("%Y%m%d%H%M%S%f");
    dir.join(format!(".proxsave-permcheck-{}-{}", std::process::id(), ts))
}

impl Checker {
    pub fn check_permissions(&self) -> CheckResult {
        let name = CheckName::Permissions;
        let mut dirs = vec![self.config.backup_path.clone()];
        if self.config.log_path != self.config.backup_path {
            dirs.push(self.config.log_path.clone());
        }

        if self.config.dry_run {
            for dir in &dirs {
                info!("dry-run: would test write access to {}", dir.display());
            }
            return CheckResult::pass(name, "Write permission checks skipped (dry run)")
                .with_code(CheckCode::PermissionCheck);
        }

        for dir in &dirs {
            if let Err((err, attempts)) = self.try_write(dir) {
                let code = classify_write_error(&err);
                return CheckResult::fail(
                    name,
                    code,
                    format!(
                        "cannot write to {} after {} attempt(s): {}",
                        dir.display(),
                        attempts,
                        err
                    ),
                )
                .with_error(err);
            }
            debug!("write access ok: {}", dir.display());
        }
        CheckResult::pass(name, "All directories are writable")
            .with_code(CheckCode::PermissionCheck)
    }

    fn try_write(&self, dir: &Path) -> Result<(), (io::Error, u32)> {
        let mut attempt = 1;
        loop {
            let scratch = scratch_file_name(dir);
            let err = match self.fs.create_file(&scratch) {
                Ok(()) => match self.fs.remove_file(&scratch) {
                    Ok(()) => return Ok(()),
                    Err(err) => return Err((err, attempt)),
                },
                Err(err) => err,
            };
            // A transient failure can still leave the file behind. EEXIST means
            // the name belongs to someone else.
            if err.kind() != io::ErrorKind::AlreadyExists {
                let _ = self.fs.remove_file(&scratch);
            }

            if !is_transient(&err) || attempt >= PERMISSION_ATTEMPTS {
                return Err((err, attempt));
            }
            warn!(
                "write test in {} failed ({}), retrying ({}/{})",
                dir.display(),
                err,
                attempt + 1,
                PERMISSION_ATTEMPTS
            );
            attempt += 1;
            thread::sleep(self.retry_delay);
        }
    }
}
