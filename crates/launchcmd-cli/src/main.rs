// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! launchcmd - Level Environments and Package Releases CLI

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::Result;

mod cmd_activate;
mod cmd_deactivate;
mod cmd_install;
mod cmd_list;
mod cmd_release;
mod cmd_verify;

use cmd_activate::CmdActivate;
use cmd_deactivate::CmdDeactivate;
use cmd_install::{CmdInstall, CmdUninstall};
use cmd_list::{CmdInstalled, CmdReleased};
use cmd_release::CmdRelease;
use cmd_verify::CmdVerify;


#[derive(Parser)]
#[clap(
    name = "launchcmd",
    about = "Level environments and package releases",
    version,
    long_about = "Compose shell environments from level directories and manage immutable package releases"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

#[derive(Parser, Clone, Debug, Default)]
pub struct RootFlags {
    /// Root of the project tree
    #[clap(long, env = "LAUNCHCMD_PROJECT_ROOT")]
    pub project_root: Option<PathBuf>,

    /// Root of the software bank
    #[clap(long, env = "LAUNCHCMD_SOFTWARE_ROOT")]
    pub software_root: Option<PathBuf>,
}

impl RootFlags {
    pub fn settings(&self) -> Result<launchcmd::Settings> {
        Ok(launchcmd::Settings::new(
            resolve(self.project_root.as_deref())?,
            resolve(self.software_root.as_deref())?,
        )?)
    }
}

/// Anchor a path to the current directory and resolve its links, so it
/// compares with the physical paths returned by the system. Unset roots stay
/// empty and missing paths are kept as given.
fn resolve(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) if !path.as_os_str().is_empty() => {
            let absolute = std::path::absolute(path)
                .map_err(|err| miette::miette!("Failed to resolve {}: {err}", path.display()))?;
            Ok(dunce::canonicalize(&absolute).unwrap_or(absolute))
        }
        _ => Ok(PathBuf::new()),
    }
}

/// A location given on the command line, relative to the current directory.
pub fn location(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => resolve(Some(path)),
        None => std::env::current_dir()
            .map_err(|err| miette::miette!("Failed to read current directory: {err}")),
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the command entering the environment of a location
    Activate(CmdActivate),

    /// Print the command leaving the current environment
    Deactivate(CmdDeactivate),

    /// Release a repository into the software bank
    Release(CmdRelease),

    /// Install a released package at a level
    Install(CmdInstall),

    /// Remove an installed package from a level
    Uninstall(CmdUninstall),

    /// List released packages
    Released(CmdReleased),

    /// List the packages installed at a level
    Installed(CmdInstalled),

    /// Check a release against its manifest
    Verify(CmdVerify),
}

impl Opt {
    fn run(self) -> Result<i32> {
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        // stdout carries the generated shell commands
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        match self.cmd {
            Command::Activate(mut cmd) => cmd.run(),
            Command::Deactivate(mut cmd) => cmd.run(),
            Command::Release(mut cmd) => cmd.run(),
            Command::Install(mut cmd) => cmd.run(),
            Command::Uninstall(mut cmd) => cmd.run(),
            Command::Released(mut cmd) => cmd.run(),
            Command::Installed(mut cmd) => cmd.run(),
            Command::Verify(mut cmd) => cmd.run(),
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}
