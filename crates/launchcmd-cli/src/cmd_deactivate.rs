// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `launchcmd deactivate` command.

use clap::Args;
use miette::Result;

/// Print the command leaving the current environment
#[derive(Debug, Args)]
pub struct CmdDeactivate {
    /// Executable of the environment module system
    #[clap(long, env = "LAUNCHCMD_MODULE_COMMAND", default_value = "module")]
    pub module_command: String,
}

impl CmdDeactivate {
    pub fn run(&mut self) -> Result<i32> {
        let state = launchcmd::EnvironmentState::from_process();
        let mut modules = launchcmd::ModuleCommand::with_program(self.module_command.clone());
        let transition = launchcmd::compose_deactivation(&state, &mut modules)?;

        if !transition.commands.is_empty() {
            println!("{}", transition.to_shell());
        }
        Ok(0)
    }
}
