use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::checks::{CheckResult, Checker};
use crate::fs::FileSystem;
use crate::types::{CheckCode, CheckName};
use crate::util::paths::nearest_existing_ancestor;

const BYTES_PER_GB: f64 = (1u64 << 30) as f64;

pub fn available_gb(fs: &dyn FileSystem, path: &Path) -> io::Result<f64> {
    let usage = fs.statfs(path)?;
    Ok(usage.available_bytes() as f64 / BYTES_PER_GB)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Primary,
    Secondary,
    Cloud,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Secondary => "secondary",
            Role::Cloud => "cloud",
        }
    }

    fn is_critical(&self) -> bool {
        *self == Role::Primary
    }
}

struct Destination {
    role: Role,
    path: PathBuf,
    min_gb: f64,
}

struct Requirement {
    required_gb: f64,
    detail: String,
}

impl Checker {
    fn destinations(&self) -> Vec<Destination> {
        let cfg = &self.config;
        let mut out = vec![Destination {
            role: Role::Primary,
            path: cfg.backup_path.clone(),
            min_gb: cfg.min_disk_primary_gb,
        }];
        if cfg.secondary_enabled {
            out.push(Destination {
                role: Role::Secondary,
                path: cfg.secondary_path.clone(),
                min_gb: cfg.min_disk_secondary_gb,
            });
        }
        if cfg.cloud_enabled {
            if cfg.cloud_path.is_absolute() {
                out.push(Destination {
                    role: Role::Cloud,
                    path: cfg.cloud_path.clone(),
                    min_gb: cfg.min_disk_cloud_gb,
                });
            } else if !cfg.cloud_path.as_os_str().is_empty() {
                debug!(
                    "cloud destination {} has no local filesystem; skipping disk check",
                    cfg.cloud_path.display()
                );
            }
        }
        out.retain(|d| !d.path.as_os_str().is_empty());
        out
    }

    pub fn check_disk_space(&self) -> CheckResult {
        self.run_disk_check(|dest| Requirement {
            required_gb: dest.min_gb,
            detail: format!("minimum {:.2} GB", dest.min_gb),
        })
    }

    pub fn check_disk_space_for_estimate(&self, estimated_gb: f64) -> CheckResult {
        let factor = self.config.safety_factor;
        let scaled = estimated_gb.max(0.0) * factor;
        self.run_disk_check(|dest| Requirement {
            required_gb: dest.min_gb.max(scaled),
            detail: format!(
                "max(minimum {:.2} GB, estimated {:.2} GB x {:.2})",
                dest.min_gb, estimated_gb, factor
            ),
        })
    }

    fn run_disk_check<F>(&self, requirement: F) -> CheckResult
    where
        F: Fn(&Destination) -> Requirement,
    {
        let name = CheckName::DiskSpace;
        let mut ok = Vec::new();
        let mut warnings = Vec::new();

        for dest in self.destinations() {
            let req = requirement(&dest);
            if req.required_gb <= 0.0 {
                debug!("no disk space threshold for {} destination", dest.role.as_str());
                continue;
            }
            let stat_path = self.disk_stat_path(&dest.path);
            let available = match available_gb(self.fs.as_ref(), &stat_path) {
                Ok(gb) => gb,
                Err(err) => {
                    let message = format!(
                        "cannot read free space of {} destination {}: {}",
                        dest.role.as_str(),
                        dest.path.display(),
                        err
                    );
                    if dest.role.is_critical() {
                        return CheckResult::fail(name, CheckCode::DiskStatFailed, message)
                            .with_error(err);
                    }
                    warn!("{}", message);
                    warnings.push(message);
                    continue;
                }
            };

            if available >= req.required_gb {
                debug!(
                    "{} destination {}: {:.2} GB available, {:.2} GB required",
                    dest.role.as_str(),
                    dest.path.display(),
                    available,
                    req.required_gb
                );
                ok.push(format!(
                    "{} {:.2} GB free (need {:.2} GB = {})",
                    dest.role.as_str(),
                    available,
                    req.required_gb,
                    req.detail
                ));
                continue;
            }

            let message = format!(
                "insufficient disk space on {} destination {}: {:.2} GB available, {:.2} GB required ({})",
                dest.role.as_str(),
                dest.path.display(),
                available,
                req.required_gb,
                req.detail
            );
            if dest.role.is_critical() {
                return CheckResult::fail(name, CheckCode::DiskSpaceLow, message);
            }
            warn!("{}", message);
            warnings.push(message);
        }

        if ok.is_empty() && warnings.is_empty() {
            return CheckResult::pass(name, "No disk space thresholds configured");
        }
        if warnings.is_empty() {
            CheckResult::pass(name, format!("Disk space OK: {}", ok.join("; ")))
        } else {
            let mut parts = ok;
            parts.extend(warnings);
            CheckResult::pass(
                name,
                format!("Disk space OK with warnings: {}", parts.join("; ")),
            )
        }
    }

    // In dry-run a destination may not exist yet; measure where it would be created.
    fn disk_stat_path(&self, path: &Path) -> PathBuf {
        if !self.config.dry_run {
            return path.to_path_buf();
        }
        nearest_existing_ancestor(self.fs.as_ref(), path).unwrap_or_else(|| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::config::CheckerConfig;
    use crate::fs::fault::FaultFs;
    use crate::fs::FsUsage;

    const GB_BLOCKS_4K: u64 = (1 << 30) / 4096;

    fn gb(n: u64) -> FsUsage {
        FsUsage {
            available_blocks: n * GB_BLOCKS_4K,
            block_size: 4096,
        }
    }

    fn checker(cfg: CheckerConfig, fs: FaultFs) -> Checker {
        Checker::new(cfg).expect("checker").with_fs(Arc::new(fs))
    }

    fn base_config() -> CheckerConfig {
        let mut cfg = CheckerConfig::new("/srv/primary", "/srv/log");
        cfg.min_disk_primary_gb = 10.0;
        cfg
    }

    #[test]
    fn available_equal_to_minimum_passes() {
        let fs = FaultFs {
            statfs_usage: Some(gb(10)),
            ..Default::default()
        };
        let result = checker(base_config(), fs).check_disk_space();
        assert!(result.passed, "{}", result.message);
        assert!(result.code.is_none());
    }

    #[test]
    fn primary_below_minimum_is_critical() {
        let fs = FaultFs {
            statfs_usage: Some(FsUsage {
                available_blocks: 10 * GB_BLOCKS_4K - 1,
                block_size: 4096,
            }),
            ..Default::default()
        };
        let result = checker(base_config(), fs).check_disk_space();
        assert!(!result.passed);
        assert_eq!(result.code, Some(CheckCode::DiskSpaceLow));
        assert!(result.message.contains("primary"));
    }

    #[test]
    fn secondary_shortfall_is_a_warning() {
        let mut cfg = base_config();
        cfg.secondary_enabled = true;
        cfg.secondary_path = PathBuf::from("/mnt/secondary");
        cfg.min_disk_secondary_gb = 50.0;
        let fs = FaultFs {
            statfs_usage: Some(gb(100)),
            statfs_overrides: vec![(PathBuf::from("/mnt/secondary"), gb(5))],
            ..Default::default()
        };
        let result = checker(cfg, fs).check_disk_space();
        assert!(result.passed);
        assert!(result.message.starts_with("Disk space OK with warnings"));
        assert!(result.message.contains("secondary"));
    }

    #[test]
    fn cloud_shortfall_is_a_warning() {
        let mut cfg = base_config();
        cfg.cloud_enabled = true;
        cfg.cloud_path = PathBuf::from("/mnt/cloud");
        cfg.min_disk_cloud_gb = 50.0;
        let fs = FaultFs {
            statfs_usage: Some(gb(100)),
            statfs_overrides: vec![(PathBuf::from("/mnt/cloud"), gb(5))],
            ..Default::default()
        };
        let result = checker(cfg, fs).check_disk_space();
        assert!(result.passed, "{}", result.message);
        assert!(result.code.is_none());
        assert!(result.message.starts_with("Disk space OK with warnings"));
        assert!(result.message.contains("cloud"));
    }

    #[test]
    fn unreadable_cloud_path_is_a_warning() {
        let dir = TempDir::new().expect("tempdir");
        let mut cfg = CheckerConfig::new(dir.path(), dir.path());
        cfg.min_disk_primary_gb = 0.000_001;
        cfg.cloud_enabled = true;
        cfg.cloud_path = dir.path().join("not-mounted");
        cfg.min_disk_cloud_gb = 1.0;
        let result = checker(cfg, FaultFs::default()).check_disk_space();
        assert!(result.passed, "{}", result.message);
        assert!(result.message.contains("cloud"));
    }

    #[test]
    fn remote_cloud_spec_is_not_measured() {
        let mut cfg = base_config();
        cfg.cloud_enabled = true;
        cfg.cloud_path = PathBuf::from("s3remote:bucket/pve");
        cfg.min_disk_cloud_gb = 1000.0;
        let fs = FaultFs {
            statfs_usage: Some(gb(20)),
            ..Default::default()
        };
        let result = checker(cfg, fs).check_disk_space();
        assert_eq!(result.message.matches("cloud").count(), 0);
        assert!(result.passed);
    }

    #[test]
    fn estimate_raises_requirement() {
        let mut cfg = base_config();
        cfg.safety_factor = 2.0;
        let fs = FaultFs {
            statfs_usage: Some(gb(30)),
            ..Default::default()
        };
        let checker = checker(cfg, fs);

        let result = checker.check_disk_space_for_estimate(10.0);
        assert!(result.passed);
        assert!(result.message.contains("minimum 10.00 GB"));
        assert!(result.message.contains("estimated 10.00 GB x 2.00"));

        let result = checker.check_disk_space_for_estimate(20.0);
        assert!(!result.passed);
        assert!(result.message.contains("40.00 GB required"));
    }

    #[test]
    fn zero_thresholds_skip_statfs() {
        let mut cfg = base_config();
        cfg.min_disk_primary_gb = 0.0;
        let result = checker(cfg, FaultFs::default()).check_disk_space();
        assert!(result.passed);
        assert_eq!(result.message, "No disk space thresholds configured");
    }

    #[test]
    fn real_statfs_reads_tempdir() {
        let dir = TempDir::new().expect("tempdir");
        let gb = available_gb(&crate::fs::HostFs, dir.path()).expect("available");
        assert!(gb >= 0.0);
    }
}
