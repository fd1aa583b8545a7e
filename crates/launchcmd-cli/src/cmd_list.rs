// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `launchcmd released` and `launchcmd installed` commands.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use launchcmd::PackageName;
use miette::Result;

/// List released packages
#[derive(Debug, Args)]
pub struct CmdReleased {
    #[clap(flatten)]
    pub roots: crate::RootFlags,

    /// Only list the versions of this package
    pub package: Option<PackageName>,
}

impl CmdReleased {
    pub fn run(&mut self) -> Result<i32> {
        let settings = self.roots.settings()?;
        let released = launchcmd::list_released(settings.software_root())?;

        for (package, versions) in &released {
            if self.package.as_ref().is_some_and(|p| p != package) {
                continue;
            }
            let versions: Vec<String> = versions.iter().map(ToString::to_string).collect();
            println!("{}: {}", package.to_string().bold(), versions.join(", "));
        }

        if let Some(package) = self.package.as_ref().filter(|p| !released.contains_key(*p)) {
            tracing::warn!(%package, "package was never released");
        }
        Ok(0)
    }
}

/// List the packages installed at a level
#[derive(Debug, Args)]
pub struct CmdInstalled {
    #[clap(flatten)]
    pub roots: crate::RootFlags,

    /// Level directory (default: current directory)
    pub location: Option<PathBuf>,
}

impl CmdInstalled {
    pub fn run(&mut self) -> Result<i32> {
        let settings = self.roots.settings()?;
        let location = crate::location(self.location.as_deref())?;
        let chain = launchcmd::resolve_chain(settings.project_root(), &location)?;

        for level in &chain {
            let installed = launchcmd::installed_packages(&level.directory)?;
            println!(
                "{} {}",
                level.level_type.blue().bold(),
                level.directory.display()
            );
            if installed.is_empty() {
                println!("  {}", "(nothing installed)".dimmed());
            }
            for tag in installed {
                println!("  {} {}", tag.package.to_string().cyan(), tag.version);
            }
        }
        Ok(0)
    }
}
