use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckName {
    Directories,
    TempDirectory,
    DiskSpace,
    Permissions,
    LockFile,
}

impl CheckName {
    pub const ORDER: [CheckName; 5] = [
        CheckName::Directories,
        CheckName::TempDirectory,
        CheckName::DiskSpace,
        CheckName::Permissions,
        CheckName::LockFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::Directories => "Directories",
            CheckName::TempDirectory => "Temp Directory",
            CheckName::DiskSpace => "Disk Space",
            CheckName::Permissions => "Permissions",
            CheckName::LockFile => "Lock File",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckCode {
    PermissionCheck,
    PermissionDenied,
    FsReadonly,
    FsIoError,
    PermissionCheckFailed,
    NotDirectory,
    StatFailed,
    CreateFailed,
    VerifyFailed,
    NotWritable,
    NoSymlinkSupport,
    DiskSpaceLow,
    DiskStatFailed,
    LockBusy,
    LockStatFailed,
    LockCreateFailed,
    LockRemoveFailed,
}

impl CheckCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckCode::PermissionCheck => "PERMISSION_CHECK",
            CheckCode::PermissionDenied => "PERMISSION_DENIED",
            CheckCode::FsReadonly => "FS_READONLY",
            CheckCode::FsIoError => "FS_IO_ERROR",
            CheckCode::PermissionCheckFailed => "PERMISSION_CHECK_FAILED",
            CheckCode::NotDirectory => "NOT_DIRECTORY",
            CheckCode::StatFailed => "STAT_FAILED",
            CheckCode::CreateFailed => "CREATE_FAILED",
            CheckCode::VerifyFailed => "VERIFY_FAILED",
            CheckCode::NotWritable => "NOT_WRITABLE",
            CheckCode::NoSymlinkSupport => "NO_SYMLINK_SUPPORT",
            CheckCode::DiskSpaceLow => "DISK_SPACE_LOW",
            CheckCode::DiskStatFailed => "DISK_STAT_FAILED",
            CheckCode::LockBusy => "LOCK_BUSY",
            CheckCode::LockStatFailed => "LOCK_STAT_FAILED",
            CheckCode::LockCreateFailed => "LOCK_CREATE_FAILED",
            CheckCode::LockRemoveFailed => "LOCK_REMOVE_FAILED",
        }
    }
}

impl fmt::Display for CheckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunMode {
    pub dry_run: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}
