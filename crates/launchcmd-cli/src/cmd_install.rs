// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `launchcmd install` and `launchcmd uninstall` commands.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use launchcmd::{PackageName, Version};
use miette::Result;

/// Install a released package at a level
///
/// Any other version of the package installed at the level is removed.
#[derive(Debug, Args)]
pub struct CmdInstall {
    #[clap(flatten)]
    pub roots: crate::RootFlags,

    /// Package to install
    pub package: PackageName,

    /// Released version to install
    pub version: Version,

    /// Level directory (default: current directory)
    pub location: Option<PathBuf>,
}

impl CmdInstall {
    pub fn run(&mut self) -> Result<i32> {
        let settings = self.roots.settings()?;
        let location = crate::location(self.location.as_deref())?;

        let outcome = launchcmd::install(&settings, &self.package, &self.version, &location)?;

        for replaced in &outcome.replaced {
            println!("{} {}", "Replaced".yellow(), replaced.to_string().cyan());
        }
        println!(
            "{} {} at {}",
            "Installed".green().bold(),
            outcome.tag.to_string().cyan(),
            location.display()
        );
        Ok(0)
    }
}

/// Remove an installed package from a level
#[derive(Debug, Args)]
pub struct CmdUninstall {
    #[clap(flatten)]
    pub roots: crate::RootFlags,

    /// Package to remove
    pub package: PackageName,

    /// Installed version
    pub version: Version,

    /// Level directory (default: current directory)
    pub location: Option<PathBuf>,
}

impl CmdUninstall {
    pub fn run(&mut self) -> Result<i32> {
        let settings = self.roots.settings()?;
        let location = crate::location(self.location.as_deref())?;

        launchcmd::uninstall(&settings, &self.package, &self.version, &location)?;

        println!(
            "{} {}{}{} from {}",
            "Uninstalled".green().bold(),
            self.package,
            launchcmd::TAG_SEPARATOR,
            self.version,
            location.display()
        );
        Ok(0)
    }
}
