use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use nix::errno::Errno;

use super::{FileStat, FileSystem, FsUsage, HostFs, SyncWrite};

#[derive(Default)]
pub(crate) struct FaultFs {
    pub create_file_errno: Option<Errno>,
    pub write_file_errno: Option<Errno>,
    pub symlink_errno: Option<Errno>,
    pub create_dir_errno: Option<Errno>,
    pub open_exclusive_errno: Option<Errno>,
    pub remove_errno: Option<Errno>,
    pub stat_errors: Vec<(PathBuf, Errno)>,
    pub writer_write_errno: Option<Errno>,
    pub writer_sync_errno: Option<Errno>,
    pub statfs_usage: Option<FsUsage>,
    pub statfs_overrides: Vec<(PathBuf, FsUsage)>,
    pub create_file_calls: AtomicUsize,
    pub touched: Mutex<Vec<String>>,
    pub remove_hook: Mutex<Option<(PathBuf, Box<dyn FnOnce() + Send>)>>,
}

fn errno_err(errno: Errno) -> io::Error {
    io::Error::from_raw_os_error(errno as i32)
}

impl FaultFs {
    pub fn create_file_calls(&self) -> usize {
        self.create_file_calls.load(Ordering::SeqCst)
    }

    pub fn touched(&self) -> Vec<String> {
        self.touched.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn before_remove(&self, path: &Path, hook: impl FnOnce() + Send + 'static) {
        if let Ok(mut slot) = self.remove_hook.lock() {
            *slot = Some((path.to_path_buf(), Box::new(hook)));
        }
    }

    fn record(&self, op: &str, path: &Path) {
        if let Ok(mut touched) = self.touched.lock() {
            touched.push(format!("{} {}", op, path.display()));
        }
    }

    fn take_remove_hook(&self, path: &Path) -> Option<Box<dyn FnOnce() + Send>> {
        let mut slot = self.remove_hook.lock().ok()?;
        match slot.as_ref() {
            Some((target, _)) if target == path => slot.take().map(|(_, hook)| hook),
            _ => None,
        }
    }
}

struct FaultWriter {
    inner: Box<dyn SyncWrite>,
    write_errno: Option<Errno>,
    sync_errno: Option<Errno>,
}

impl Write for FaultWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.write_errno {
            Some(errno) => Err(errno_err(errno)),
            None => self.inner.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl SyncWrite for FaultWriter {
    fn sync_all(&mut self) -> io::Result<()> {
        match self.sync_errno {
            Some(errno) => Err(errno_err(errno)),
            None => self.inner.sync_all(),
        }
    }
}

impl FileSystem for FaultFs {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        if let Some((_, errno)) = self.stat_errors.iter().find(|(p, _)| p == path) {
            return Err(errno_err(*errno));
        }
        HostFs.stat(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        // Taken before running so a hook that removes the same path does not recurse.
        if let Some(hook) = self.take_remove_hook(path) {
            hook();
        }
        self.record("remove", path);
        match self.remove_errno {
            Some(errno) => Err(errno_err(errno)),
            None => HostFs.remove_file(path),
        }
    }

    fn open_exclusive(&self, path: &Path, mode: u32) -> io::Result<Box<dyn SyncWrite>> {
        self.record("open_exclusive", path);
        if let Some(errno) = self.open_exclusive_errno {
            return Err(errno_err(errno));
        }
        let inner = HostFs.open_exclusive(path, mode)?;
        if self.writer_write_errno.is_none() && self.writer_sync_errno.is_none() {
            return Ok(inner);
        }
        Ok(Box::new(FaultWriter {
            inner,
            write_errno: self.writer_write_errno,
            sync_errno: self.writer_sync_errno,
        }))
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        self.record("mkdir", path);
        match self.create_dir_errno {
            Some(errno) => Err(errno_err(errno)),
            None => HostFs.create_dir_all(path, mode),
        }
    }

    fn create_file(&self, path: &Path) -> io::Result<()> {
        self.create_file_calls.fetch_add(1, Ordering::SeqCst);
        self.record("create", path);
        match self.create_file_errno {
            Some(errno) => Err(errno_err(errno)),
            None => HostFs.create_file(path),
        }
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.record("write", path);
        match self.write_file_errno {
            Some(errno) => Err(errno_err(errno)),
            None => HostFs.write_file(path, data),
        }
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        self.record("symlink", link);
        match self.symlink_errno {
            Some(errno) => Err(errno_err(errno)),
            None => HostFs.symlink(target, link),
        }
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        HostFs.read_to_string(path)
    }

    fn statfs(&self, path: &Path) -> io::Result<FsUsage> {
        if let Some((_, usage)) = self.statfs_overrides.iter().find(|(p, _)| p == path) {
            return Ok(*usage);
        }
        match self.statfs_usage {
            Some(usage) => Ok(usage),
            None => HostFs.statfs(path),
        }
    }
}
