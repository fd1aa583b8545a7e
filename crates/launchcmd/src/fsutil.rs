// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Filesystem primitives: tree copies, write protection and shared directories.

use std::fs;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};

use nix::sys::stat::{Mode, umask};
use walkdir::WalkDir;

use crate::Result;

#[cfg(test)]
#[path = "./fsutil_test.rs"]
mod fsutil_test;

const WRITE_BITS: u32 = 0o222;
const OWNER_WRITE: u32 = 0o200;

/// Mode of metadata directories, writable by the owning group.
pub const SHARED_DIR_MODE: u32 = 0o775;

/// Remove every write bit from `path` and everything below it.
pub fn set_read_only<P: AsRef<Path>>(path: P) -> Result<()> {
    update_modes(path.as_ref(), |mode| mode & !WRITE_BITS)
}

/// Give the owner write access to `path` and everything below it.
pub fn set_writable<P: AsRef<Path>>(path: P) -> Result<()> {
    update_modes(path.as_ref(), |mode| mode | OWNER_WRITE)
}

/// Whether any write bit is set on `path`.
pub fn is_writable<P: AsRef<Path>>(path: P) -> Result<bool> {
    let mode = fs::symlink_metadata(path)?.permissions().mode();
    Ok(mode & WRITE_BITS != 0)
}

fn update_modes(root: &Path, update: impl Fn(u32) -> u32) -> Result<()> {
    for entry in WalkDir::new(root) {
        let entry = entry?;
        // permissions of a symlink are those of its target
        if entry.path_is_symlink() {
            continue;
        }
        let mut permissions = entry.metadata()?.permissions();
        let mode = permissions.mode();
        let updated = update(mode);
        if updated != mode {
            permissions.set_mode(updated);
            fs::set_permissions(entry.path(), permissions)?;
        }
    }
    Ok(())
}

/// Temporarily regained write access to a tree.
///
/// Write bits are stripped again when the guard is dropped, unless the
/// tree has been removed in the meantime.
#[derive(Debug)]
pub struct WriteAccess {
    path: PathBuf,
}

impl WriteAccess {
    pub fn acquire<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        set_writable(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WriteAccess {
    fn drop(&mut self) {
        if fs::symlink_metadata(&self.path).is_err() {
            return;
        }
        if let Err(err) = set_read_only(&self.path) {
            tracing::warn!(path = %self.path.display(), "failed to restore write protection: {err}");
        }
    }
}

/// Cleared process umask, restored on drop.
#[derive(Debug)]
pub struct ClearedUmask {
    previous: Mode,
}

impl ClearedUmask {
    pub fn new() -> Self {
        Self {
            previous: umask(Mode::empty()),
        }
    }
}

impl Default for ClearedUmask {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ClearedUmask {
    fn drop(&mut self) {
        umask(self.previous);
    }
}

/// Create a directory (and missing parents) with [`SHARED_DIR_MODE`],
/// ignoring the process umask.
pub fn create_shared_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let missing: Vec<&Path> = path.ancestors().take_while(|p| !p.exists()).collect();

    let _umask = ClearedUmask::new();
    for dir in missing.into_iter().rev() {
        fs::DirBuilder::new().mode(SHARED_DIR_MODE).create(dir)?;
        // the umask is process wide, pin the mode in case it changed under us
        fs::set_permissions(dir, fs::Permissions::from_mode(SHARED_DIR_MODE))?;
    }
    Ok(())
}

/// Copy a single file, creating its parent directories.
pub fn copy_file<S: AsRef<Path>, D: AsRef<Path>>(src: S, dst: D) -> Result<()> {
    let dst = dst.as_ref();
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src.as_ref(), dst)?;
    Ok(())
}

/// Recursively copy the contents of `src` into `dst`.
///
/// File modes are preserved, symlinks are recreated as symlinks.
pub fn copy_tree<S: AsRef<Path>, D: AsRef<Path>>(src: S, dst: D) -> Result<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);

        if entry.path_is_symlink() {
            let link = fs::read_link(entry.path())?;
            std::os::unix::fs::symlink(link, &target)?;
        } else if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
