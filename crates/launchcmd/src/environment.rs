// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Explicit shell environment snapshots and the commands that change them.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::level::LEVEL_VAR_PREFIX;

#[cfg(test)]
#[path = "./environment_test.rs"]
mod environment_test;

/// Prefix turning a live variable name into its cached shadow.
pub const SHADOW_PREFIX: &str = "_";

/// Cached list of module descriptors loaded by the last activation.
pub const LOADED_MODULES_VAR: &str = "_LAUNCHCMD_LOADED_MODULES";

/// Modules loaded in the shell before the first activation.
pub const MODULES_SNAPSHOT_VAR: &str = "_LAUNCHCMD_LOADEDMODULES_SNAPSHOT";

/// Variable maintained by the module system itself.
pub const MODULE_SYSTEM_LOADED_VAR: &str = "LOADEDMODULES";

/// Separator of list-valued variables.
pub const LIST_SEPARATOR: char = ':';

/// Shadow name of a live variable.
pub fn shadow_name(name: &str) -> String {
    format!("{SHADOW_PREFIX}{name}")
}

/// Snapshot of the variables relevant to level activation.
///
/// This is passed into and returned from composition instead of reading and
/// writing the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentState {
    vars: BTreeMap<String, String>,
}

impl EnvironmentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the relevant variables of the current process.
    pub fn from_process() -> Self {
        std::env::vars().filter(|(name, _)| is_tracked(name)).collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn unset(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Names of the currently exported `LAUNCHCMD_LEVEL_*` variables.
    pub fn live_level_vars(&self) -> impl Iterator<Item = &str> {
        self.vars
            .keys()
            .map(String::as_str)
            .filter(|name| name.starts_with(LEVEL_VAR_PREFIX))
    }

    /// Names of the cached shadows of level variables.
    pub fn shadow_level_vars(&self) -> impl Iterator<Item = &str> {
        let prefix = shadow_name(LEVEL_VAR_PREFIX);
        self.vars
            .keys()
            .map(String::as_str)
            .filter(move |name| name.starts_with(&prefix))
    }

    /// Module descriptors recorded as loaded by the previous activation.
    pub fn loaded_modules(&self) -> Vec<String> {
        self.list(LOADED_MODULES_VAR)
    }

    /// Modules the shell had loaded before launchcmd touched it, if recorded.
    pub fn modules_snapshot(&self) -> Option<Vec<String>> {
        self.vars
            .contains_key(MODULES_SNAPSHOT_VAR)
            .then(|| self.list(MODULES_SNAPSHOT_VAR))
    }

    fn list(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|value| {
                value
                    .split(LIST_SEPARATOR)
                    .filter(|item| !item.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvironmentState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn is_tracked(name: &str) -> bool {
    name.starts_with(LEVEL_VAR_PREFIX)
        || name.starts_with(&shadow_name(LEVEL_VAR_PREFIX))
        || name == LOADED_MODULES_VAR
        || name == MODULES_SNAPSHOT_VAR
        || name == MODULE_SYSTEM_LOADED_VAR
}

/// A single step of a generated shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Unset(String),
    Export { name: String, value: String },
    ChangeDirectory(PathBuf),
    /// Command text produced by a module adapter, emitted verbatim.
    Run(String),
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset(name) => write!(f, "unset {name}"),
            Self::Export { name, value } => write!(f, "export {name}={}", quote(value)),
            Self::ChangeDirectory(path) => write!(f, "cd {}", quote(&path.to_string_lossy())),
            Self::Run(command) => f.write_str(command),
        }
    }
}

/// Join commands so each one only runs if the previous one succeeded.
pub fn join_commands(commands: &[ShellCommand]) -> String {
    commands
        .iter()
        .map(ShellCommand::to_string)
        .collect::<Vec<_>>()
        .join(" && ")
}

/// Double-quote a value for a POSIX shell.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
