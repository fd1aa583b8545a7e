// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Resolution of locations into chains of typed level directories.

use std::path::{Component, Path, PathBuf};

use crate::package::PackageName;
use crate::{COMMON_DIRNAME, Error, LEVEL_MARKER_PREFIX, PACKAGES_DIRNAME, Result, TAGS_DIRNAME};

#[cfg(test)]
#[path = "./level_test.rs"]
mod level_test;

/// Prefix of the variables exported for each level of a chain.
pub const LEVEL_VAR_PREFIX: &str = "LAUNCHCMD_LEVEL_";

/// A directory of the project tree tagged with a level type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub directory: PathBuf,
    /// Lower-cased marker suffix, eg: "episode".
    pub level_type: String,
}

impl Level {
    /// Last component of the level directory.
    pub fn name(&self) -> String {
        self.directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Variable carrying this level's name, eg: `LAUNCHCMD_LEVEL_EPISODE`.
    pub fn variable_name(&self) -> String {
        format!("{LEVEL_VAR_PREFIX}{}", self.level_type.to_ascii_uppercase())
    }
}

/// Ordered levels from the outermost ancestor down to a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChain {
    pub root: PathBuf,
    pub levels: Vec<Level>,
}

impl LevelChain {
    pub fn leaf(&self) -> Option<&Level> {
        self.levels.last()
    }

    /// The leaf level directory, or the project root for an empty chain.
    pub fn directory(&self) -> &Path {
        self.leaf().map(|l| l.directory.as_path()).unwrap_or(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Level> {
        self.levels.iter()
    }
}

impl<'a> IntoIterator for &'a LevelChain {
    type Item = &'a Level;
    type IntoIter = std::slice::Iter<'a, Level>;

    fn into_iter(self) -> Self::IntoIter {
        self.levels.iter()
    }
}

/// Resolve every level from the project root down to `location`.
///
/// `location` may be absolute (under `root`) or relative to `root`; both
/// spellings of the same location produce the same chain.
pub fn resolve_chain<R, L>(root: R, location: L) -> Result<LevelChain>
where
    R: AsRef<Path>,
    L: AsRef<Path>,
{
    let root = root.as_ref();
    let location = location.as_ref();

    let mut levels = Vec::new();
    let mut directory = root.to_path_buf();
    for segment in relative_segments(root, location)? {
        directory.push(segment);
        let level_type = resolve_type(&directory)?;
        tracing::debug!(directory = %directory.display(), %level_type, "resolved level");
        levels.push(Level {
            directory: directory.clone(),
            level_type,
        });
    }

    Ok(LevelChain {
        root: root.to_path_buf(),
        levels,
    })
}

/// Split `location` into path segments below `root`.
fn relative_segments<'a>(root: &Path, location: &'a Path) -> Result<Vec<&'a std::ffi::OsStr>> {
    let relative = location.strip_prefix(root).unwrap_or(location);
    let invalid = |reason: &str| Error::InvalidLocation {
        location: location.to_path_buf(),
        reason: reason.to_string(),
    };

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment),
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid("parent directory references are not allowed")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid(&format!(
                    "not inside the project root {}",
                    root.display()
                )));
            }
        }
    }
    Ok(segments)
}

/// Determine the type of a level from its single marker file.
pub fn resolve_type<P: AsRef<Path>>(level_dir: P) -> Result<String> {
    let level_dir = level_dir.as_ref();
    let markers = level_markers(level_dir)?;

    if markers.len() > 1 {
        return Err(Error::AmbiguousLevelMarker {
            directory: level_dir.to_path_buf(),
            markers,
        });
    }
    let Some(marker) = markers.first() else {
        return Err(Error::NoLevelMarker(level_dir.to_path_buf()));
    };

    let level_type = marker
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .and_then(|n| n.strip_prefix(LEVEL_MARKER_PREFIX).map(str::to_ascii_lowercase))
        .unwrap_or_default();

    let valid = !level_type.is_empty()
        && level_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(Error::InvalidLevelType {
            directory: level_dir.to_path_buf(),
            level_type,
        });
    }
    Ok(level_type)
}

fn level_markers(level_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}*",
        glob::Pattern::escape(&level_dir.to_string_lossy()),
        LEVEL_MARKER_PREFIX
    );
    let paths = glob::glob(&pattern).map_err(|err| Error::InvalidLocation {
        location: level_dir.to_path_buf(),
        reason: err.to_string(),
    })?;

    let mut markers = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| Error::ReadFailed {
            path: err.path().to_path_buf(),
            error: err.into_error(),
        })?;
        markers.push(path);
    }
    Ok(markers)
}

/// Metadata directory of a level.
pub fn common_dir<P: AsRef<Path>>(level_dir: P) -> PathBuf {
    level_dir.as_ref().join(COMMON_DIRNAME)
}

/// Directory holding the installed package trees of a level.
pub fn packages_dir<P: AsRef<Path>>(level_dir: P) -> PathBuf {
    common_dir(level_dir).join(PACKAGES_DIRNAME)
}

/// Directory holding the installed tags of a level.
pub fn tags_dir<P: AsRef<Path>>(level_dir: P) -> PathBuf {
    common_dir(level_dir).join(TAGS_DIRNAME)
}

/// Directory a package is installed into at a level.
pub fn install_dir<P: AsRef<Path>>(level_dir: P, package: &PackageName) -> PathBuf {
    packages_dir(level_dir).join(package.as_str())
}
