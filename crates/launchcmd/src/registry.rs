// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Enumeration of released packages and of the tags installed at a level.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::level::tags_dir;
use crate::package::{PackageName, ReleaseTag, Version};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./registry_test.rs"]
mod registry_test;

/// Every released version of every package in the software bank.
///
/// A missing software bank yields an empty result.
pub fn list_released<P: AsRef<Path>>(
    software_root: P,
) -> Result<BTreeMap<PackageName, BTreeSet<Version>>> {
    let software_root = software_root.as_ref();
    let mut released = BTreeMap::new();

    for name in list_entries(software_root, EntryKind::Directory)? {
        let Ok(package) = PackageName::new(name.as_str()) else {
            tracing::warn!(entry = %name, "ignoring invalid package directory in software bank");
            continue;
        };
        let versions = released_versions(software_root, &package)?;
        released.insert(package, versions);
    }

    Ok(released)
}

/// The highest released version of a package, if any.
pub fn latest_release<P: AsRef<Path>>(
    software_root: P,
    package: &PackageName,
) -> Result<Option<Version>> {
    Ok(released_versions(software_root.as_ref(), package)?.pop_last())
}

fn released_versions(software_root: &Path, package: &PackageName) -> Result<BTreeSet<Version>> {
    let package_dir = software_root.join(package.as_str());
    let mut versions = BTreeSet::new();
    for name in list_entries(&package_dir, EntryKind::Directory)? {
        match Version::parse(&name) {
            Ok(version) => {
                versions.insert(version);
            }
            Err(_) => {
                tracing::warn!(%package, entry = %name, "ignoring invalid version directory");
            }
        }
    }
    Ok(versions)
}

/// Names of the tag markers installed at a level.
///
/// A level without metadata yields an empty result.
pub fn list_installed_tags<P: AsRef<Path>>(level_dir: P) -> Result<BTreeSet<String>> {
    Ok(list_entries(&tags_dir(level_dir), EntryKind::Any)?
        .into_iter()
        .collect())
}

/// Installed tags of a level, parsed. Malformed markers are skipped.
pub fn installed_packages<P: AsRef<Path>>(level_dir: P) -> Result<Vec<ReleaseTag>> {
    let level_dir = level_dir.as_ref();
    let mut tags = Vec::new();
    for name in list_installed_tags(level_dir)? {
        match name.parse::<ReleaseTag>() {
            Ok(tag) => tags.push(tag),
            Err(_) => {
                tracing::warn!(level = %level_dir.display(), entry = %name, "ignoring malformed installed tag");
            }
        }
    }
    tags.sort();
    Ok(tags)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    Any,
}

/// Sorted, non-hidden entry names of a directory, empty if it does not exist.
fn list_entries(dir: &Path, kind: EntryKind) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => {
            return Err(Error::ReadFailed {
                path: dir.to_path_buf(),
                error,
            });
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if kind == EntryKind::Directory && !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}
