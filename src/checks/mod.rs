use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::CheckerConfig;
use crate::error::{ProxsaveError, Result};
use crate::fs::{FileSystem, HostFs};
use crate::types::{CancelToken, CheckCode, CheckName};

pub mod directories;
pub mod disk_space;
pub mod lock;
pub mod permissions;
pub mod temp_dir;

pub use lock::{LockGuard, LockInfo};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct CheckResult {
    pub name: CheckName,
    pub passed: bool,
    pub message: String,
    pub error: Option<ProxsaveError>,
    pub code: Option<CheckCode>,
}

impl CheckResult {
    pub fn pass(name: CheckName, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            message: message.into(),
            error: None,
            code: None,
        }
    }

    pub fn fail(name: CheckName, code: CheckCode, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            message: message.into(),
            error: None,
            code: Some(code),
        }
    }

    pub fn with_code(mut self, code: CheckCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_error(mut self, err: impl Into<ProxsaveError>) -> Self {
        self.error = Some(err.into());
        self
    }

    pub fn code_str(&self) -> &'static str {
        self.code.map(|c| c.as_str()).unwrap_or("")
    }
}

#[derive(Debug)]
pub struct CheckReport {
    pub results: Vec<CheckResult>,
    pub failure: Option<ProxsaveError>,
}

impl CheckReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct Checker {
    config: CheckerConfig,
    fs: Arc<dyn FileSystem>,
    retry_delay: Duration,
    estimated_gb: Option<f64>,
}

impl Checker {
    pub fn new(config: CheckerConfig) -> Result<Self> {
        let config = config.resolved();
        config.validate()?;
        Ok(Self {
            config,
            fs: Arc::new(HostFs),
            retry_delay: DEFAULT_RETRY_DELAY,
            estimated_gb: None,
        })
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn set_estimated_size_gb(&mut self, estimated_gb: f64) {
        self.estimated_gb = Some(estimated_gb);
    }

    pub fn run_all_checks(&mut self, cancel: &CancelToken) -> CheckReport {
        let mut results = Vec::new();
        for name in CheckName::ORDER {
            if cancel.is_cancelled() {
                warn!("pre-backup checks cancelled before {}", name);
                return CheckReport {
                    results,
                    failure: Some(ProxsaveError::Cancelled),
                };
            }
            let result = match name {
                CheckName::Directories => self.check_directories(),
                CheckName::TempDirectory => self.check_temp_directory(),
                CheckName::DiskSpace => match self.estimated_gb {
                    Some(gb) => self.check_disk_space_for_estimate(gb),
                    None => self.check_disk_space(),
                },
                CheckName::Permissions => {
                    if self.config.skip_permission_check {
                        debug!("permission check skipped by configuration");
                        continue;
                    }
                    self.check_permissions()
                }
                CheckName::LockFile => self.check_lock_file(),
            };

            if result.passed {
                debug!("check {} passed: {}", name, result.message);
                results.push(result);
                continue;
            }

            warn!("check {} failed: {}", name, result.message);
            let failure = ProxsaveError::Check {
                name,
                code: result.code.unwrap_or(CheckCode::StatFailed),
                message: result.message.clone(),
            };
            results.push(result);
            return CheckReport {
                results,
                failure: Some(failure),
            };
        }
        info!("all pre-backup checks passed");
        CheckReport {
            results,
            failure: None,
        }
    }
}
