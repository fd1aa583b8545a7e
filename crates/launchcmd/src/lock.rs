// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Advisory exclusive locks on the directories mutated by releases and installs.

use std::fs::File;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};

use crate::{Error, Result};

#[cfg(test)]
#[path = "./lock_test.rs"]
mod lock_test;

/// An exclusive `flock` held on an existing directory until dropped.
///
/// Locking the directory itself avoids creating lock files in trees that
/// other tools enumerate.
pub struct TargetLock {
    path: PathBuf,
    _lock: Flock<File>,
}

impl std::fmt::Debug for TargetLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetLock").field("path", &self.path).finish()
    }
}

impl TargetLock {
    /// Block until the lock on `path` is acquired.
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(lock) = Self::try_acquire(path)? {
            return Ok(lock);
        }

        tracing::info!(path = %path.display(), "waiting for another process to release its lock");
        let lock = Flock::lock(open(path)?, FlockArg::LockExclusive).map_err(|(_, errno)| {
            Error::Lock {
                path: path.to_path_buf(),
                errno,
            }
        })?;
        Ok(Self::held(path, lock))
    }

    /// Acquire the lock on `path` unless someone else holds it.
    fn try_acquire(path: &Path) -> Result<Option<Self>> {
        match Flock::lock(open(path)?, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => Ok(Some(Self::held(path, lock))),
            Err((_, Errno::EWOULDBLOCK)) => Ok(None),
            Err((_, errno)) => Err(Error::Lock {
                path: path.to_path_buf(),
                errno,
            }),
        }
    }

    fn held(path: &Path, lock: Flock<File>) -> Self {
        tracing::debug!(path = %path.display(), "locked");
        Self {
            path: path.to_path_buf(),
            _lock: lock,
        }
    }
}

impl Drop for TargetLock {
    fn drop(&mut self) {
        tracing::debug!(path = %self.path.display(), "unlocked");
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|error| Error::ReadFailed {
        path: path.to_path_buf(),
        error,
    })
}
