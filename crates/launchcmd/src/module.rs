// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Module descriptors and the adapter that loads and unloads them.

use std::path::{Path, PathBuf};

use crate::environment::quote;
use crate::{Error, MODULE_EXTENSION, Result};

#[cfg(test)]
#[path = "./module_test.rs"]
mod module_test;

/// Capability to load and unload module descriptors.
///
/// Each call returns the shell command performing the operation; the
/// composer places it in the generated command sequence.
pub trait ModuleAdapter {
    fn load(&mut self, descriptor: &Path) -> Result<String>;
    fn unload(&mut self, descriptor: &Path) -> Result<String>;
}

/// Adapter for the environment modules system (`module load <file>`).
#[derive(Debug, Clone)]
pub struct ModuleCommand {
    program: String,
}

impl ModuleCommand {
    /// Use a different entry point than `module`, eg: `ml`.
    pub fn with_program<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ModuleCommand {
    fn default() -> Self {
        Self::with_program("module")
    }
}

impl ModuleAdapter for ModuleCommand {
    fn load(&mut self, descriptor: &Path) -> Result<String> {
        Ok(format!(
            "{} load {}",
            self.program,
            quote(&descriptor.to_string_lossy())
        ))
    }

    fn unload(&mut self, descriptor: &Path) -> Result<String> {
        Ok(format!(
            "{} unload {}",
            self.program,
            quote(&descriptor.to_string_lossy())
        ))
    }
}

/// Find the single module descriptor directly inside a package root.
///
/// The root may be a repository, a release or an install directory.
pub fn find_module_descriptor<P: AsRef<Path>>(root: P) -> Result<PathBuf> {
    let root = root.as_ref();
    let mut modules = Vec::new();
    for entry in std::fs::read_dir(root).map_err(|error| Error::ReadFailed {
        path: root.to_path_buf(),
        error,
    })? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == MODULE_EXTENSION) {
            modules.push(path);
        }
    }
    modules.sort();

    if modules.len() > 1 {
        return Err(Error::AmbiguousModule {
            root: root.to_path_buf(),
            modules,
        });
    }
    modules
        .pop()
        .ok_or_else(|| Error::ModuleNotFound(root.to_path_buf()))
}
