use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::checks::{CheckResult, Checker};
use crate::error::{ProxsaveError, Result};
use crate::types::{CheckCode, CheckName};

pub const LOCK_FILE_MODE: u32 = 0o640;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockInfo {
    pub pid: u32,
    pub host: String,
    pub time: String,
}

impl LockInfo {
    pub fn current() -> Self {
        let host = nix::unistd::gethostname()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            pid: std::process::id(),
            host,
            time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    pub fn render(&self) -> String {
        format!("pid={}\nhost={}\ntime={}\n", self.pid, self.host, self.time)
    }

    // Unknown keys are ignored, a missing pid yields `None`.
    pub fn parse(contents: &str) -> Option<Self> {
        let mut pid = None;
        let mut host = String::new();
        let mut time = String::new();
        for line in contents.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "pid" => pid = value.trim().parse::<u32>().ok(),
                "host" => host = value.trim().to_string(),
                "time" => time = value.trim().to_string(),
                _ => {}
            }
        }
        Some(Self {
            pid: pid?,
            host,
            time,
        })
    }
}

pub fn lock_is_stale(age: Duration, max_age: Duration) -> bool {
    age >= max_age
}

pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h{}m{}s", h, m, s)
    } else if m > 0 {
        format!("{}m{}s", m, s)
    } else {
        format!("{}s", s)
    }
}

fn age_since(modified: SystemTime) -> Duration {
    SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO)
}

pub fn reclaim_marker_path(lock: &Path) -> PathBuf {
    let mut name = OsString::from(lock.as_os_str());
    name.push(".reclaim");
    PathBuf::from(name)
}

impl Checker {
    pub fn check_lock_file(&self) -> CheckResult {
        let name = CheckName::LockFile;
        let path = self.config.lock_file_path.clone();

        match self.fs.stat(&path) {
            Ok(stat) => {
                let age = age_since(stat.modified);
                if !lock_is_stale(age, self.config.max_lock_age) {
                    return self.busy_result(age);
                }
                if self.config.dry_run {
                    info!("dry-run: would replace stale lock file {}", path.display());
                    return CheckResult::pass(
                        name,
                        format!(
                            "Stale lock file {} (age {}) would be replaced (dry run)",
                            path.display(),
                            format_age(age)
                        ),
                    );
                }
                return self.replace_stale_lock(stat.modified, age);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return CheckResult::fail(
                    name,
                    CheckCode::LockStatFailed,
                    format!("cannot stat lock file {}: {}", path.display(), err),
                )
                .with_error(err);
            }
        }

        if self.config.dry_run {
            info!("dry-run: would create lock file {}", path.display());
            return CheckResult::pass(
                name,
                format!("Lock file {} would be created (dry run)", path.display()),
            );
        }
        self.acquire_lock()
    }

    fn replace_stale_lock(&self, observed: SystemTime, age: Duration) -> CheckResult {
        let marker = reclaim_marker_path(&self.config.lock_file_path);
        if let Err(result) = self.claim_reclaim_marker(&marker, age) {
            return result;
        }
        let result = self.remove_claimed_stale_lock(observed, age);
        match self.fs.remove_file(&marker) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!("cannot remove {}: {}", marker.display(), err),
        }
        result
    }

    fn claim_reclaim_marker(
        &self,
        marker: &Path,
        age: Duration,
    ) -> std::result::Result<(), CheckResult> {
        let name = CheckName::LockFile;
        for attempt in 0..2 {
            let err = match self.fs.open_exclusive(marker, LOCK_FILE_MODE) {
                Ok(_) => return Ok(()),
                Err(err) => err,
            };
            if err.kind() != io::ErrorKind::AlreadyExists {
                return Err(CheckResult::fail(
                    name,
                    CheckCode::LockCreateFailed,
                    format!("cannot create {}: {}", marker.display(), err),
                )
                .with_error(err));
            }
            // A marker older than the lock limit was left by a crashed reclaim.
            let abandoned = attempt == 0
                && self
                    .fs
                    .stat(marker)
                    .map(|s| lock_is_stale(age_since(s.modified), self.config.max_lock_age))
                    .unwrap_or(false);
            if !abandoned {
                return Err(self.busy_result(age));
            }
            warn!("removing abandoned reclaim marker {}", marker.display());
            match self.fs.remove_file(marker) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(CheckResult::fail(
                        name,
                        CheckCode::LockRemoveFailed,
                        format!("cannot remove {}: {}", marker.display(), err),
                    )
                    .with_error(err));
                }
            }
        }
        Err(self.busy_result(age))
    }

    fn remove_claimed_stale_lock(&self, observed: SystemTime, age: Duration) -> CheckResult {
        let name = CheckName::LockFile;
        let path = &self.config.lock_file_path;
        match self.fs.stat(path) {
            Ok(stat) if stat.modified != observed => {
                return self.busy_result(age_since(stat.modified));
            }
            Ok(_) => {
                warn!(
                    "removing stale lock file {} (age {}, max {})",
                    path.display(),
                    format_age(age),
                    format_age(self.config.max_lock_age)
                );
                match self.fs.remove_file(path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => {
                        return CheckResult::fail(
                            name,
                            CheckCode::LockRemoveFailed,
                            format!("cannot remove stale lock file {}: {}", path.display(), err),
                        )
                        .with_error(err);
                    }
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return CheckResult::fail(
                    name,
                    CheckCode::LockStatFailed,
                    format!("cannot stat lock file {}: {}", path.display(), err),
                )
                .with_error(err);
            }
        }
        self.acquire_lock()
    }

    fn acquire_lock(&self) -> CheckResult {
        let name = CheckName::LockFile;
        let path = &self.config.lock_file_path;

        let mut file = match self.fs.open_exclusive(path, LOCK_FILE_MODE) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                // Another instance won the race between our stat and create.
                let age = self
                    .fs
                    .stat(path)
                    .map(|s| age_since(s.modified))
                    .unwrap_or(Duration::ZERO);
                return self.busy_result(age);
            }
            Err(err) => {
                return CheckResult::fail(
                    name,
                    CheckCode::LockCreateFailed,
                    format!("cannot create lock file {}: {}", path.display(), err),
                )
                .with_error(err);
            }
        };

        let info = LockInfo::current();
        if let Err(err) = file.write_all(info.render().as_bytes()) {
            drop(file);
            let _ = self.fs.remove_file(path);
            return CheckResult::fail(
                name,
                CheckCode::LockCreateFailed,
                format!("cannot write lock file {}: {}", path.display(), err),
            )
            .with_error(err);
        }
        if let Err(err) = file.sync_all() {
            warn!("cannot sync lock file {}: {}", path.display(), err);
        }

        info!("acquired lock {} (pid {})", path.display(), info.pid);
        CheckResult::pass(name, format!("Lock acquired at {}", path.display()))
    }

    fn busy_result(&self, age: Duration) -> CheckResult {
        let path = &self.config.lock_file_path;
        let holder = self
            .lock_holder()
            .map(|h| format!(", held by pid {} on {} since {}", h.pid, h.host, h.time))
            .unwrap_or_default();
        CheckResult::fail(
            CheckName::LockFile,
            CheckCode::LockBusy,
            format!(
                "another backup is in progress: lock file {} age {} (max {}){}",
                path.display(),
                format_age(age),
                format_age(self.config.max_lock_age),
                holder
            ),
        )
    }

    pub fn lock_holder(&self) -> Option<LockInfo> {
        self.fs
            .read_to_string(&self.config.lock_file_path)
            .ok()
            .and_then(|c| LockInfo::parse(&c))
    }

    pub fn release_lock(&self) -> Result<()> {
        let path = &self.config.lock_file_path;
        if self.config.dry_run {
            info!("dry-run: would remove lock file {}", path.display());
            return Ok(());
        }
        match self.fs.remove_file(path) {
            Ok(()) => {
                info!("released lock {}", path.display());
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ProxsaveError::io_context("remove lock", path, err)),
        }
    }
}

pub struct LockGuard {
    checker: Checker,
}

impl LockGuard {
    pub fn new(checker: Checker) -> Self {
        Self { checker }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(err) = self.checker.release_lock() {
            warn!("{}", err);
        }
    }
}
