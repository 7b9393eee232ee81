use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

pub const DEFAULT_LOCK_FILE_NAME: &str = ".backup.lock";
pub const DEFAULT_TEMP_ROOT: &str = "/tmp/proxsave";
pub const DEFAULT_MAX_LOCK_AGE_SECS: u64 = 2 * 60 * 60;
pub const DEFAULT_SAFETY_FACTOR: f64 = 1.5;
pub const DEFAULT_MIN_DISK_GB: f64 = 1.0;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigFile {
    pub backup_path: String,
    pub log_path: String,
    #[serde(default)]
    pub lock_dir_path: Option<String>,
    #[serde(default)]
    pub lock_file_path: Option<String>,
    #[serde(default)]
    pub lock_file_name: Option<String>,
    #[serde(default)]
    pub secondary_enabled: bool,
    #[serde(default)]
    pub secondary_path: Option<String>,
    #[serde(default)]
    pub cloud_enabled: bool,
    #[serde(default)]
    pub cloud_path: Option<String>,
    #[serde(default)]
    pub min_disk_primary_gb: Option<f64>,
    #[serde(default)]
    pub min_disk_secondary_gb: Option<f64>,
    #[serde(default)]
    pub min_disk_cloud_gb: Option<f64>,
    #[serde(default)]
    pub safety_factor: Option<f64>,
    #[serde(default)]
    pub max_lock_age_secs: Option<u64>,
    #[serde(default)]
    pub skip_permission_check: bool,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub temp_root: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckerConfig {
    pub backup_path: PathBuf,
    pub log_path: PathBuf,
    // Empty means "use `backup_path`".
    pub lock_dir_path: PathBuf,
    // Empty means "`lock_dir_path` joined with DEFAULT_LOCK_FILE_NAME".
    pub lock_file_path: PathBuf,
    pub secondary_path: PathBuf,
    pub secondary_enabled: bool,
    pub cloud_path: PathBuf,
    pub cloud_enabled: bool,
    pub min_disk_primary_gb: f64,
    pub min_disk_secondary_gb: f64,
    pub min_disk_cloud_gb: f64,
    pub safety_factor: f64,
    pub max_lock_age: Duration,
    pub skip_permission_check: bool,
    pub dry_run: bool,
    pub temp_root: PathBuf,
}

impl CheckerConfig {
    pub fn new(backup_path: impl Into<PathBuf>, log_path: impl Into<PathBuf>) -> Self {
        Self {
            backup_path: backup_path.into(),
            log_path: log_path.into(),
            lock_dir_path: PathBuf::new(),
            lock_file_path: PathBuf::new(),
            secondary_path: PathBuf::new(),
            secondary_enabled: false,
            cloud_path: PathBuf::new(),
            cloud_enabled: false,
            min_disk_primary_gb: DEFAULT_MIN_DISK_GB,
            min_disk_secondary_gb: DEFAULT_MIN_DISK_GB,
            min_disk_cloud_gb: 0.0,
            safety_factor: DEFAULT_SAFETY_FACTOR,
            max_lock_age: Duration::from_secs(DEFAULT_MAX_LOCK_AGE_SECS),
            skip_permission_check: false,
            dry_run: false,
            temp_root: PathBuf::from(DEFAULT_TEMP_ROOT),
        }
    }

    pub fn resolved(mut self) -> Self {
        if self.lock_dir_path.as_os_str().is_empty() {
            self.lock_dir_path = self.backup_path.clone();
        }
        if self.lock_file_path.as_os_str().is_empty() {
            self.lock_file_path = self.lock_dir_path.join(DEFAULT_LOCK_FILE_NAME);
        }
        if self.temp_root.as_os_str().is_empty() {
            self.temp_root = PathBuf::from(DEFAULT_TEMP_ROOT);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.backup_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("backup_path is required".to_string()).into());
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("log_path is required".to_string()).into());
        }
        if !self.backup_path.is_absolute() {
            return Err(ConfigError::Invalid("backup_path must be absolute".to_string()).into());
        }
        if !self.log_path.is_absolute() {
            return Err(ConfigError::Invalid("log_path must be absolute".to_string()).into());
        }
        if !self.lock_file_path.as_os_str().is_empty() && !self.lock_file_path.is_absolute() {
            return Err(
                ConfigError::Invalid("lock_file_path must be absolute".to_string()).into(),
            );
        }
        for (name, value) in [
            ("min_disk_primary_gb", self.min_disk_primary_gb),
            ("min_disk_secondary_gb", self.min_disk_secondary_gb),
            ("min_disk_cloud_gb", self.min_disk_cloud_gb),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be non-negative, got {}",
                    name, value
                ))
                .into());
            }
        }
        if self.safety_factor.is_nan() || self.safety_factor < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "safety_factor must be >= 1.0, got {}",
                self.safety_factor
            ))
            .into());
        }
        if self.max_lock_age.is_zero() {
            return Err(ConfigError::Invalid("max_lock_age must be positive".to_string()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxsaveError;

    #[test]
    fn lock_location_defaults_to_backup_path() {
        let cfg = CheckerConfig::new("/var/backups/pve", "/var/log/proxsave").resolved();
        assert_eq!(cfg.lock_dir_path, PathBuf::from("/var/backups/pve"));
        assert_eq!(
            cfg.lock_file_path,
            PathBuf::from("/var/backups/pve/.backup.lock")
        );
    }

    #[test]
    fn explicit_lock_dir_is_kept() {
        let mut cfg = CheckerConfig::new("/var/backups/pve", "/var/log/proxsave");
        cfg.lock_dir_path = PathBuf::from("/run/proxsave");
        let cfg = cfg.resolved();
        assert_eq!(cfg.lock_file_path, PathBuf::from("/run/proxsave/.backup.lock"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let base = CheckerConfig::new("/srv/backup", "/srv/log");
        assert!(base.validate().is_ok());

        let mut cfg = base.clone();
        cfg.backup_path = PathBuf::new();
        assert!(matches!(cfg.validate(), Err(ProxsaveError::Config(_))));

        let mut cfg = base.clone();
        cfg.log_path = PathBuf::from("relative/log");
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.min_disk_secondary_gb = -0.5;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.safety_factor = 0.9;
        assert!(cfg.validate().is_err());

        let mut cfg = base;
        cfg.max_lock_age = Duration::ZERO;
        assert!(cfg.validate().is_err());
    }
}
