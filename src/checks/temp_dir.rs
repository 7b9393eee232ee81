use std::io;

use tracing::{debug, info, warn};

use crate::checks::directories::DIR_MODE;
use crate::checks::{CheckResult, Checker};
use crate::types::{CheckCode, CheckName};

impl Checker {
    pub fn check_temp_directory(&self) -> CheckResult {
        let name = CheckName::TempDirectory;
        let root = self.config.temp_root.clone();

        if let Err(err) = self.fs.stat(&root) {
            if err.kind() == io::ErrorKind::NotFound {
                if self.config.dry_run {
                    info!("dry-run: would create temp directory {}", root.display());
                    return CheckResult::pass(
                        name,
                        format!("Temp directory {} would be created (dry run)", root.display()),
                    );
                }
                if let Err(err) = self.fs.create_dir_all(&root, DIR_MODE) {
                    return CheckResult::fail(
                        name,
                        CheckCode::CreateFailed,
                        format!("cannot create temp directory {}: {}", root.display(), err),
                    )
                    .with_error(err);
                }
                debug!("created temp directory {}", root.display());
            }
        }

        match self.fs.stat(&root) {
            Ok(stat) if stat.is_dir => {}
            Ok(_) => {
                return CheckResult::fail(
                    name,
                    CheckCode::NotDirectory,
                    format!("temp path {} is not a directory", root.display()),
                );
            }
            Err(err) => {
                return CheckResult::fail(
                    name,
                    CheckCode::VerifyFailed,
                    format!("cannot verify temp directory {}: {}", root.display(), err),
                )
                .with_error(err);
            }
        }

        if self.config.dry_run {
            info!(
                "dry-run: would test write and symlink support in {}",
                root.display()
            );
            return CheckResult::pass(
                name,
                format!(
                    "Temp directory {} exists; write and symlink tests skipped (dry run)",
                    root.display()
                ),
            );
        }

        let pid = std::process::id();
        let scratch = root.join(format!(".proxsave-tmp-write-{}", pid));
        let link = root.join(format!(".proxsave-tmp-link-{}", pid));

        if let Err(err) = self.fs.write_file(&scratch, b"proxsave temp write test\n") {
            let _ = self.fs.remove_file(&scratch);
            return CheckResult::fail(
                name,
                CheckCode::NotWritable,
                format!("temp directory {} is not writable: {}", root.display(), err),
            )
            .with_error(err);
        }

        // A link left by a crashed run would make symlink() fail with EEXIST.
        let _ = self.fs.remove_file(&link);
        let symlink_result = self.fs.symlink(&scratch, &link);
        if symlink_result.is_ok() {
            if let Err(err) = self.fs.remove_file(&link) {
                warn!("cannot remove test symlink {}: {}", link.display(), err);
            }
        }
        if let Err(err) = self.fs.remove_file(&scratch) {
            warn!("cannot remove test file {}: {}", scratch.display(), err);
        }

        if let Err(err) = symlink_result {
            return CheckResult::fail(
                name,
                CheckCode::NoSymlinkSupport,
                format!(
                    "temp directory {} does not support symlinks: {}",
                    root.display(),
                    err
                ),
            )
            .with_error(err);
        }

        CheckResult::pass(
            name,
            format!(
                "Temp directory {} is writable and supports symlinks",
                root.display()
            ),
        )
    }
}
