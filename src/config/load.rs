use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::model::{
    CheckerConfig, ConfigFile, DEFAULT_LOCK_FILE_NAME, DEFAULT_MAX_LOCK_AGE_SECS,
};
use crate::error::{ConfigError, ProxsaveError, Result};

pub fn load_config(path: &str) -> Result<CheckerConfig> {
    let mut contents = String::new();
    File::open(path)
        .map_err(|e| ProxsaveError::message(format!("open config {}: {}", path, e)))?
        .read_to_string(&mut contents)
        .map_err(|e| ProxsaveError::message(format!("read config {}: {}", path, e)))?;
    let cfg: ConfigFile =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    parse_runtime(cfg)
}

fn parse_runtime(cfg: ConfigFile) -> Result<CheckerConfig> {
    let mut out = CheckerConfig::new(cfg.backup_path.trim(), cfg.log_path.trim());
    if let Some(dir) = cfg.lock_dir_path {
        out.lock_dir_path = PathBuf::from(dir.trim());
    }
    if let Some(file) = cfg.lock_file_path {
        out.lock_file_path = PathBuf::from(file.trim());
    }
    if let Some(name) = cfg.lock_file_name {
        let name = name.trim();
        if name.is_empty() || name.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "lock_file_name {:?} must be a plain file name",
                name
            ))
            .into());
        }
        if out.lock_file_path.as_os_str().is_empty() && name != DEFAULT_LOCK_FILE_NAME {
            let dir = if out.lock_dir_path.as_os_str().is_empty() {
                out.backup_path.clone()
            } else {
                out.lock_dir_path.clone()
            };
            out.lock_file_path = dir.join(name);
        }
    }
    out.secondary_enabled = cfg.secondary_enabled;
    out.secondary_path = cfg.secondary_path.map(PathBuf::from).unwrap_or_default();
    out.cloud_enabled = cfg.cloud_enabled;
    out.cloud_path = cfg.cloud_path.map(PathBuf::from).unwrap_or_default();
    if let Some(gb) = cfg.min_disk_primary_gb {
        out.min_disk_primary_gb = gb;
    }
    if let Some(gb) = cfg.min_disk_secondary_gb {
        out.min_disk_secondary_gb = gb;
    }
    if let Some(gb) = cfg.min_disk_cloud_gb {
        out.min_disk_cloud_gb = gb;
    }
    if let Some(factor) = cfg.safety_factor {
        out.safety_factor = factor;
    }
    out.max_lock_age =
        Duration::from_secs(cfg.max_lock_age_secs.unwrap_or(DEFAULT_MAX_LOCK_AGE_SECS));
    out.skip_permission_check = cfg.skip_permission_check;
    out.dry_run = cfg.dry_run;
    if let Some(root) = cfg.temp_root {
        out.temp_root = PathBuf::from(root.trim());
    }

    let out = out.resolved();
    out.validate()?;
    Ok(out)
}
