// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Root directories shared by every operation.

use std::path::{Path, PathBuf};

use crate::package::{PackageName, Version};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./settings_test.rs"]
mod settings_test;

/// Environment variable naming the project root.
pub const PROJECT_ROOT_VAR: &str = "LAUNCHCMD_PROJECT_ROOT";

/// Environment variable naming the software bank root.
pub const SOFTWARE_ROOT_VAR: &str = "LAUNCHCMD_SOFTWARE_ROOT";

/// Location of the project tree and of the software bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    project_root: PathBuf,
    software_root: PathBuf,
}

impl Settings {
    /// Both roots must be absolute.
    pub fn new(project_root: impl Into<PathBuf>, software_root: impl Into<PathBuf>) -> Result<Self> {
        let project_root = project_root.into();
        let software_root = software_root.into();
        require_absolute(PROJECT_ROOT_VAR, &project_root)?;
        require_absolute(SOFTWARE_ROOT_VAR, &software_root)?;
        Ok(Self {
            project_root,
            software_root,
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Root of the software bank holding every release.
    pub fn software_root(&self) -> &Path {
        &self.software_root
    }

    /// Directory holding every released version of a package.
    pub fn package_dir(&self, package: &PackageName) -> PathBuf {
        self.software_root.join(package.as_str())
    }

    /// Directory of a single release.
    pub fn release_dir(&self, package: &PackageName, version: &Version) -> PathBuf {
        self.package_dir(package).join(version.to_string())
    }
}

fn require_absolute(name: &'static str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidSetting {
            name,
            reason: "must not be empty".to_string(),
        });
    }
    if !path.is_absolute() {
        return Err(Error::InvalidSetting {
            name,
            reason: format!("{} is not an absolute path", path.display()),
        });
    }
    Ok(())
}
