use std::path::{Component, Path, PathBuf};

use crate::fs::FileSystem;

pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let (after_normal, at_root) = match out.components().next_back() {
                    Some(Component::Normal(_)) => (true, false),
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => (false, true),
                    _ => (false, false),
                };
                if after_normal {
                    out.pop();
                } else if !at_root {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() && !path.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

pub fn is_degenerate(path: &Path) -> bool {
    let s = path.as_os_str();
    s.is_empty() || s == "." || s == "/"
}

pub fn nearest_existing_ancestor(fs: &dyn FileSystem, path: &Path) -> Option<PathBuf> {
    let mut current = Some(path);
    while let Some(candidate) = current {
        if fs.stat(candidate).is_ok() {
            return Some(candidate.to_path_buf());
        }
        current = candidate.parent();
    }
    None
}
