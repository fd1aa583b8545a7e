// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Release manifests and integrity checks of released trees.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::fsutil::is_writable;
use crate::package::{PackageName, Version};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./manifest_test.rs"]
mod manifest_test;

/// Record written once into every release directory.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Manifest {
    pub package: PackageName,
    pub version: Version,
    pub comment: String,

    /// Released files, relative to the release root.
    pub files: Vec<PathBuf>,

    /// Sha256 of each released file.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checksums: BTreeMap<PathBuf, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<ReleaseMetadata>,
}

/// When, where and by which tool version a release was made.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ReleaseMetadata {
    pub timestamp: DateTime<Utc>,
    pub launchcmd_version: String,
    pub hostname: String,
}

impl Manifest {
    pub fn new(package: PackageName, version: Version, comment: String, files: Vec<PathBuf>) -> Self {
        Self {
            package,
            version,
            comment,
            files,
            checksums: BTreeMap::new(),
            released: None,
        }
    }

    /// Location of the manifest inside a release directory.
    pub fn path_in<P: AsRef<Path>>(release_dir: P, package: &PackageName) -> PathBuf {
        release_dir.as_ref().join(package.manifest_filename())
    }

    /// Record the checksum of every listed file, read from `root`.
    pub fn compute_checksums<P: AsRef<Path>>(&mut self, root: P) -> Result<()> {
        let root = root.as_ref();
        self.checksums = self
            .files
            .iter()
            .map(|file| Ok((file.clone(), sha256_file(&root.join(file))?)))
            .collect::<Result<_>>()?;
        Ok(())
    }

    /// Stamp the release metadata with the current time and host.
    pub fn stamp(&mut self) {
        self.released = Some(ReleaseMetadata {
            timestamp: Utc::now(),
            launchcmd_version: env!("CARGO_PKG_VERSION").to_string(),
            hostname: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string()),
        });
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|error| Error::ReadFailed {
            path: path.to_path_buf(),
            error,
        })?;
        serde_yaml::from_str(&yaml).map_err(|error| Error::InvalidManifest {
            path: path.to_path_buf(),
            error,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).map_err(|error| Error::InvalidManifest {
            path: path.to_path_buf(),
            error,
        })?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Compare the tree at `root` against this manifest.
    pub fn verify<P: AsRef<Path>>(&self, root: P) -> Result<Vec<ReleaseChange>> {
        let root = root.as_ref();
        let mut changes = Vec::new();

        for file in &self.files {
            let path = root.join(file);
            if !path.is_file() {
                changes.push(ReleaseChange {
                    kind: ReleaseChangeKind::Missing,
                    path: file.clone(),
                    expected: self.checksums.get(file).cloned(),
                    actual: None,
                });
                continue;
            }
            let Some(expected) = self.checksums.get(file) else {
                continue;
            };
            let actual = sha256_file(&path)?;
            if &actual != expected {
                changes.push(ReleaseChange {
                    kind: ReleaseChangeKind::Modified,
                    path: file.clone(),
                    expected: Some(expected.clone()),
                    actual: Some(actual),
                });
            }
        }

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.path_is_symlink() && is_writable(entry.path())? {
                changes.push(ReleaseChange {
                    kind: ReleaseChangeKind::Writable,
                    path: entry
                        .path()
                        .strip_prefix(root)
                        .unwrap_or(entry.path())
                        .to_path_buf(),
                    expected: None,
                    actual: None,
                });
            }
        }

        Ok(changes)
    }
}

/// Hex encoded sha256 of a file's content.
pub fn sha256_file(path: &Path) -> Result<String> {
    let content = std::fs::read(path).map_err(|error| Error::ReadFailed {
        path: path.to_path_buf(),
        error,
    })?;
    Ok(format!("{:x}", Sha256::digest(&content)))
}

/// A single difference between a manifest and its release tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseChange {
    pub kind: ReleaseChangeKind,
    pub path: PathBuf,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

/// Types of release mismatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseChangeKind {
    Modified,
    Missing,
    /// Write protection was lifted.
    Writable,
}
