// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Installing releases at a level, one version per package.

use std::path::{Path, PathBuf};

use crate::fsutil::{WriteAccess, copy_tree, create_shared_dir, set_read_only};
use crate::level::{common_dir, install_dir, packages_dir, resolve_chain, tags_dir};
use crate::lock::TargetLock;
use crate::package::{PackageName, ReleaseTag, Version};
use crate::registry::{installed_packages, list_installed_tags};
use crate::settings::Settings;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./install_test.rs"]
mod install_test;

/// What an install changed at its level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub tag: ReleaseTag,
    pub install_dir: PathBuf,
    /// Other versions of the package that were uninstalled first.
    pub replaced: Vec<ReleaseTag>,
}

/// Install `package#version` at the level found at `location`.
///
/// Any other installed version of the package is removed first.
pub fn install<P: AsRef<Path>>(
    settings: &Settings,
    package: &PackageName,
    version: &Version,
    location: P,
) -> Result<InstallOutcome> {
    let release_dir = settings.release_dir(package, version);
    if !release_dir.is_dir() {
        return Err(Error::ReleaseNotFound {
            package: package.to_string(),
            version: version.to_string(),
        });
    }

    let level = level_directory(settings, location.as_ref())?;
    let _lock = TargetLock::acquire(&level)?;

    let tag = ReleaseTag::new(package.clone(), version.clone());
    if list_installed_tags(&level)?.contains(&tag.to_string()) {
        return Err(Error::AlreadyInstalled {
            tag: tag.to_string(),
            level,
        });
    }

    let mut replaced = Vec::new();
    for installed in installed_packages(&level)? {
        if &installed.package == package {
            remove_installed(&level, &installed)?;
            replaced.push(installed);
        }
    }

    let target = install_dir(&level, package);
    if target.exists() {
        tracing::warn!(path = %target.display(), "removing untagged install directory");
        let access = WriteAccess::acquire(&target)?;
        std::fs::remove_dir_all(access.path())?;
    }

    create_shared_dir(packages_dir(&level))?;
    create_shared_dir(tags_dir(&level))?;

    copy_tree(&release_dir, &target)?;
    set_read_only(&target)?;
    // the release may belong to another user
    if let Err(err) = set_read_only(&release_dir) {
        tracing::warn!(path = %release_dir.display(), "failed to protect release: {err}");
    }

    let marker = tags_dir(&level).join(tag.to_string());
    std::fs::File::create(&marker)?;
    set_read_only(&marker)?;

    tracing::info!(%tag, level = %level.display(), "installed");
    Ok(InstallOutcome {
        tag,
        install_dir: target,
        replaced,
    })
}

/// Remove `package#version` from the level found at `location`.
///
/// The level metadata is removed entirely once no package is left.
pub fn uninstall<P: AsRef<Path>>(
    settings: &Settings,
    package: &PackageName,
    version: &Version,
    location: P,
) -> Result<()> {
    let level = level_directory(settings, location.as_ref())?;
    let _lock = TargetLock::acquire(&level)?;

    let tag = ReleaseTag::new(package.clone(), version.clone());
    if !list_installed_tags(&level)?.contains(&tag.to_string()) {
        return Err(Error::NotInstalled {
            tag: tag.to_string(),
            level,
        });
    }
    remove_installed(&level, &tag)
}

/// Remove an installed tag and its tree. The caller holds the level lock.
fn remove_installed(level: &Path, tag: &ReleaseTag) -> Result<()> {
    let target = install_dir(level, &tag.package);
    if target.exists() {
        let access = WriteAccess::acquire(&target)?;
        std::fs::remove_dir_all(access.path())?;
    } else {
        tracing::warn!(%tag, path = %target.display(), "install directory already missing");
    }

    let marker = tags_dir(level).join(tag.to_string());
    let access = WriteAccess::acquire(&marker)?;
    std::fs::remove_file(access.path())?;
    tracing::info!(%tag, level = %level.display(), "uninstalled");

    if list_installed_tags(level)?.is_empty() {
        let common = common_dir(level);
        let access = WriteAccess::acquire(&common)?;
        std::fs::remove_dir_all(access.path())?;
        tracing::debug!(level = %level.display(), "removed empty level metadata");
    }
    Ok(())
}

/// The level directory at `location`, which must be a level below the project root.
fn level_directory(settings: &Settings, location: &Path) -> Result<PathBuf> {
    let chain = resolve_chain(settings.project_root(), location)?;
    match chain.leaf() {
        Some(level) => Ok(level.directory.clone()),
        None => Err(Error::InvalidLocation {
            location: location.to_path_buf(),
            reason: "packages are installed at a level, not at the project root".to_string(),
        }),
    }
}
