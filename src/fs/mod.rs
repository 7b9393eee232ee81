use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{symlink, DirBuilderExt, OpenOptionsExt};
use std::path::Path;
use std::time::SystemTime;

use nix::sys::statvfs::statvfs;

#[cfg(test)]
pub(crate) mod fault;

#[derive(Debug, Clone, Copy)]
pub struct FileStat {
    pub is_dir: bool,
    pub modified: SystemTime,
}

#[derive(Debug, Clone, Copy)]
pub struct FsUsage {
    pub available_blocks: u64,
    pub block_size: u64,
}

impl FsUsage {
    pub fn available_bytes(&self) -> u64 {
        self.available_blocks.saturating_mul(self.block_size)
    }
}

pub trait SyncWrite: Write {
    fn sync_all(&mut self) -> io::Result<()>;
}

impl SyncWrite for File {
    fn sync_all(&mut self) -> io::Result<()> {
        File::sync_all(self)
    }
}

pub trait FileSystem: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<FileStat>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn open_exclusive(&self, path: &Path, mode: u32) -> io::Result<Box<dyn SyncWrite>>;

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    fn create_file(&self, path: &Path) -> io::Result<()>;

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    fn statfs(&self, path: &Path) -> io::Result<FsUsage>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl FileSystem for HostFs {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let meta = fs::metadata(path)?;
        Ok(FileStat {
            is_dir: meta.is_dir(),
            modified: meta.modified()?,
        })
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn open_exclusive(&self, path: &Path, mode: u32) -> io::Result<Box<dyn SyncWrite>> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(mode)
            .open(path)?;
        Ok(Box::new(file))
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        DirBuilder::new().recursive(true).mode(mode).create(path)
    }

    fn create_file(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(path)?;
        drop(file);
        Ok(())
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        fs::write(path, data)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        symlink(target, link)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn statfs(&self, path: &Path) -> io::Result<FsUsage> {
        let stat = statvfs(path).map_err(io::Error::from)?;
        Ok(FsUsage {
            available_blocks: stat.blocks_available() as u64,
            block_size: stat.fragment_size() as u64,
        })
    }
}
