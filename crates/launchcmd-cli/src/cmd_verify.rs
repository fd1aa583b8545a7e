// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `launchcmd verify` command.

use clap::Args;
use colored::Colorize;
use launchcmd::{PackageName, ReleaseChangeKind, Version};
use miette::Result;

/// Check a release against its manifest
///
/// Exits with 1 when any released file was modified, removed, or made
/// writable again.
#[derive(Debug, Args)]
pub struct CmdVerify {
    #[clap(flatten)]
    pub roots: crate::RootFlags,

    /// Released package
    pub package: PackageName,

    /// Released version
    pub version: Version,
}

impl CmdVerify {
    pub fn run(&mut self) -> Result<i32> {
        let settings = self.roots.settings()?;
        let changes = launchcmd::verify_release(&settings, &self.package, &self.version)?;

        if changes.is_empty() {
            println!(
                "{} {}{}{} matches its manifest",
                "✓".green(),
                self.package,
                launchcmd::TAG_SEPARATOR,
                self.version
            );
            return Ok(0);
        }

        println!("{}", "Release does not match its manifest:".red().bold());
        for change in &changes {
            let kind = match change.kind {
                ReleaseChangeKind::Modified => "modified".yellow(),
                ReleaseChangeKind::Missing => "missing".red(),
                ReleaseChangeKind::Writable => "writable".yellow(),
            };
            println!("  {kind:>9} {}", change.path.display());
            if let (Some(expected), Some(actual)) = (&change.expected, &change.actual) {
                tracing::debug!(path = %change.path.display(), %expected, %actual, "checksum mismatch");
            }
        }
        Ok(1)
    }
}
