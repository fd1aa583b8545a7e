// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Composition of the shell transition into a level chain's environment.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::environment::{
    EnvironmentState, LIST_SEPARATOR, LOADED_MODULES_VAR, MODULE_SYSTEM_LOADED_VAR,
    MODULES_SNAPSHOT_VAR, ShellCommand, join_commands, shadow_name,
};
use crate::level::{LevelChain, install_dir};
use crate::module::{ModuleAdapter, find_module_descriptor};
use crate::registry::installed_packages;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./compose_test.rs"]
mod compose_test;

/// Everything needed to move a shell from one environment to another.
#[derive(Debug, Clone, Default)]
pub struct Transition {
    /// Stale variables, never including one that is about to be set.
    pub vars_to_unset: Vec<String>,

    /// Variables to export, live level variables and their shadows included.
    pub vars_to_set: BTreeMap<String, String>,

    /// Previously loaded descriptors that are no longer required.
    pub modules_to_unload: Vec<PathBuf>,

    /// Descriptors required by the chain, outermost level first.
    pub modules_to_load: Vec<PathBuf>,

    /// Directory to change into, if any.
    pub directory: Option<PathBuf>,

    /// Ordered commands performing the transition.
    pub commands: Vec<ShellCommand>,

    /// The environment once the commands have run.
    pub state: EnvironmentState,
}

impl Transition {
    /// Render the commands as a single `&&`-joined shell command.
    pub fn to_shell(&self) -> String {
        join_commands(&self.commands)
    }
}

/// Compute the transition from `state` into the environment of `chain`.
///
/// Commands are ordered: unset stale variables, set variables, unload
/// modules, load modules, change directory. Empty steps are omitted.
pub fn compose_activation(
    chain: &LevelChain,
    state: &EnvironmentState,
    modules: &mut dyn ModuleAdapter,
) -> Result<Transition> {
    let mut vars_to_set = BTreeMap::new();
    for level in chain {
        vars_to_set.insert(level.variable_name(), level.name());
    }
    let shadows: Vec<(String, String)> = vars_to_set
        .iter()
        .map(|(name, value)| (shadow_name(name), value.clone()))
        .collect();
    vars_to_set.extend(shadows);

    let modules_to_load = resolve_modules(chain)?;
    let required: BTreeSet<String> = modules_to_load
        .iter()
        .map(|m| m.to_string_lossy().into_owned())
        .collect();
    let snapshot = state.modules_snapshot();
    let protected: BTreeSet<String> = snapshot.iter().flatten().cloned().collect();
    let modules_to_unload: Vec<PathBuf> = state
        .loaded_modules()
        .into_iter()
        .filter(|m| !required.contains(m) && !protected.contains(m))
        .map(PathBuf::from)
        .collect();

    let mut stale: BTreeSet<String> = state
        .live_level_vars()
        .chain(state.shadow_level_vars())
        .map(String::from)
        .collect();
    if modules_to_load.is_empty() {
        if state.get(LOADED_MODULES_VAR).is_some() {
            stale.insert(LOADED_MODULES_VAR.to_string());
        }
    } else {
        vars_to_set.insert(
            LOADED_MODULES_VAR.to_string(),
            join_list(modules_to_load.iter().map(|m| m.to_string_lossy())),
        );
        if snapshot.is_none() {
            vars_to_set.insert(
                MODULES_SNAPSHOT_VAR.to_string(),
                state.get(MODULE_SYSTEM_LOADED_VAR).unwrap_or_default().to_string(),
            );
        }
    }
    let vars_to_unset: Vec<String> = stale
        .into_iter()
        .filter(|name| !vars_to_set.contains_key(name))
        .collect();

    tracing::debug!(
        unset = ?vars_to_unset,
        set = vars_to_set.len(),
        unload = modules_to_unload.len(),
        load = modules_to_load.len(),
        "composed activation"
    );

    finish(
        state,
        modules,
        vars_to_unset,
        vars_to_set,
        modules_to_unload,
        modules_to_load,
        Some(chain.directory().to_path_buf()),
    )
}

/// Compute the transition that removes every trace of a previous activation.
pub fn compose_deactivation(
    state: &EnvironmentState,
    modules: &mut dyn ModuleAdapter,
) -> Result<Transition> {
    let mut stale: BTreeSet<String> = state
        .live_level_vars()
        .chain(state.shadow_level_vars())
        .map(String::from)
        .collect();
    for name in [LOADED_MODULES_VAR, MODULES_SNAPSHOT_VAR] {
        if state.get(name).is_some() {
            stale.insert(name.to_string());
        }
    }

    let protected: BTreeSet<String> = state
        .modules_snapshot()
        .unwrap_or_default()
        .into_iter()
        .collect();
    let modules_to_unload = state
        .loaded_modules()
        .into_iter()
        .filter(|m| !protected.contains(m))
        .map(PathBuf::from)
        .collect();

    finish(
        state,
        modules,
        stale.into_iter().collect(),
        BTreeMap::new(),
        modules_to_unload,
        Vec::new(),
        None,
    )
}

fn finish(
    state: &EnvironmentState,
    modules: &mut dyn ModuleAdapter,
    vars_to_unset: Vec<String>,
    vars_to_set: BTreeMap<String, String>,
    modules_to_unload: Vec<PathBuf>,
    modules_to_load: Vec<PathBuf>,
    directory: Option<PathBuf>,
) -> Result<Transition> {
    let mut commands = Vec::new();
    let mut next = state.clone();

    for name in &vars_to_unset {
        next.unset(name);
        commands.push(ShellCommand::Unset(name.clone()));
    }
    for (name, value) in &vars_to_set {
        next.set(name.clone(), value.clone());
        commands.push(ShellCommand::Export {
            name: name.clone(),
            value: value.clone(),
        });
    }
    for descriptor in &modules_to_unload {
        commands.push(ShellCommand::Run(modules.unload(descriptor)?));
    }
    for descriptor in &modules_to_load {
        commands.push(ShellCommand::Run(modules.load(descriptor)?));
    }
    if let Some(directory) = &directory {
        commands.push(ShellCommand::ChangeDirectory(directory.clone()));
    }

    Ok(Transition {
        vars_to_unset,
        vars_to_set,
        modules_to_unload,
        modules_to_load,
        directory,
        commands,
        state: next,
    })
}

/// Module descriptors of every package installed along the chain.
fn resolve_modules(chain: &LevelChain) -> Result<Vec<PathBuf>> {
    let mut seen = BTreeSet::new();
    let mut descriptors = Vec::new();

    for level in chain {
        for tag in installed_packages(&level.directory)? {
            let root = install_dir(&level.directory, &tag.package);
            let descriptor = match find_module_descriptor(&root) {
                Ok(descriptor) => descriptor,
                Err(Error::ModuleNotFound(_) | Error::ReadFailed { .. }) => {
                    tracing::warn!(%tag, root = %root.display(), "installed package has no module descriptor");
                    continue;
                }
                Err(err) => return Err(err),
            };
            if seen.insert(descriptor.clone()) {
                descriptors.push(descriptor);
            }
        }
    }

    Ok(descriptors)
}

fn join_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for item in items {
        if !joined.is_empty() {
            joined.push(LIST_SEPARATOR);
        }
        joined.push_str(item.as_ref());
    }
    joined
}
