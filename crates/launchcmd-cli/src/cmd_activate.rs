// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `launchcmd activate` command.

use std::path::PathBuf;

use clap::Args;
use miette::Result;

/// Print the command entering the environment of a location
///
/// The output is meant to be evaluated by the calling shell, eg:
/// `eval "$(launchcmd activate $LAUNCHCMD_PROJECT_ROOT/demo/film/ep01)"`.
/// A relative location is taken from the current directory.
#[derive(Debug, Args)]
pub struct CmdActivate {
    #[clap(flatten)]
    pub roots: crate::RootFlags,

    /// Executable of the environment module system
    #[clap(long, env = "LAUNCHCMD_MODULE_COMMAND", default_value = "module")]
    pub module_command: String,

    /// Location to activate (default: current directory)
    pub location: Option<PathBuf>,
}

impl CmdActivate {
    pub fn run(&mut self) -> Result<i32> {
        let settings = self.roots.settings()?;
        let location = crate::location(self.location.as_deref())?;

        let chain = launchcmd::resolve_chain(settings.project_root(), &location)?;
        let state = launchcmd::EnvironmentState::from_process();
        let mut modules = launchcmd::ModuleCommand::with_program(self.module_command.clone());
        let transition = launchcmd::compose_activation(&chain, &state, &mut modules)?;

        tracing::info!(
            levels = chain.len(),
            modules = transition.modules_to_load.len(),
            "activating {}",
            chain.directory().display()
        );
        println!("{}", transition.to_shell());
        Ok(0)
    }
}
