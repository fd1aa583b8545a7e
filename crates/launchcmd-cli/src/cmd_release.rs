// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `launchcmd release` command.

use std::path::PathBuf;

use clap::{ArgGroup, Args, ValueEnum};
use colored::Colorize;
use launchcmd::{Bump, Git, PackageName, ReleaseRequest, VersionControl};
use miette::Result;

/// Release a repository into the software bank
///
/// The repository must be clean and every file is released read-only under
/// `<software root>/<package>/<version>`, after tagging the repository with
/// `<package>#<version>`.
#[derive(Debug, Args)]
#[clap(group(ArgGroup::new("target").required(true).args(["version", "bump"])))]
pub struct CmdRelease {
    #[clap(flatten)]
    pub roots: crate::RootFlags,

    /// Repository to release
    #[clap(short, long, default_value = ".")]
    pub repository: PathBuf,

    /// Package name (default: the repository directory name)
    #[clap(short, long)]
    pub package: Option<String>,

    /// Version to release, eg: 1.2.0
    #[clap(long)]
    pub version: Option<String>,

    /// Release the latest version bumped by one level
    #[clap(long, value_enum)]
    pub bump: Option<BumpLevel>,

    /// Why this release is made
    #[clap(short = 'm', long = "message")]
    pub comment: String,

    /// Executable used for version control
    #[clap(long, env = "LAUNCHCMD_GIT", default_value = "git")]
    pub git: PathBuf,

    /// Files to release (default: every tracked file)
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BumpLevel {
    Major,
    Minor,
    Patch,
}

impl From<BumpLevel> for Bump {
    fn from(level: BumpLevel) -> Self {
        match level {
            BumpLevel::Major => Bump::Major,
            BumpLevel::Minor => Bump::Minor,
            BumpLevel::Patch => Bump::Patch,
        }
    }
}

impl CmdRelease {
    pub fn run(&mut self) -> Result<i32> {
        let settings = self.roots.settings()?;
        let git = Git::with_program(&self.git);

        let package = match &self.package {
            Some(name) => PackageName::new(name.as_str())?,
            None => launchcmd::package_name_from_repository(&self.repository)?,
        };
        let version = match (&self.version, self.bump) {
            (Some(version), _) => version.clone(),
            (None, Some(bump)) => launchcmd::next_version(&settings, &package, bump.into())?.to_string(),
            (None, None) => return Err(miette::miette!("Either --version or --bump is required")),
        };

        let files = if self.files.is_empty() {
            git.tracked_files(&self.repository)?
        } else {
            self.files.clone()
        };

        let request = ReleaseRequest {
            repository: self.repository.clone(),
            package: package.to_string(),
            version,
            comment: self.comment.clone(),
            files,
        };
        let released = launchcmd::release(&settings, &request, &git)?;

        println!(
            "{} {} ({} files) to {}",
            "Released".green().bold(),
            released.tag.to_string().cyan(),
            released.manifest.files.len(),
            released.directory.display()
        );
        Ok(0)
    }
}
