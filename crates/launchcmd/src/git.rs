// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Version control operations needed to release a repository.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{Error, Result};

#[cfg(test)]
#[path = "./git_test.rs"]
mod git_test;

/// Version control surface used by the release workflow.
///
/// Every call is synchronous and targets a single working copy.
pub trait VersionControl {
    /// Changed paths, one `git status --porcelain` line each.
    fn status(&self, repository: &Path) -> Result<Vec<String>>;

    /// Every local tag.
    fn tags(&self, repository: &Path) -> Result<Vec<String>>;

    /// Fetch the remote's tags locally.
    fn pull_tags(&self, repository: &Path) -> Result<()>;

    fn create_tag(&self, repository: &Path, tag: &str) -> Result<()>;

    fn push_tag(&self, repository: &Path, tag: &str) -> Result<()>;

    /// Tracked files, relative to the repository root.
    fn tracked_files(&self, repository: &Path) -> Result<Vec<PathBuf>>;
}

/// [`VersionControl`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct Git {
    program: PathBuf,
}

impl Git {
    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn base_command(&self, repository: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-c")
            .arg("core.quotepath=off")
            .current_dir(repository);
        command
    }

    /// Run git and return its stdout split into non-empty lines.
    fn run(&self, repository: &Path, args: &[&str]) -> Result<Vec<String>> {
        let failed = |message: String| Error::Git {
            repository: repository.to_path_buf(),
            command: args.join(" "),
            message,
        };

        tracing::debug!(repository = %repository.display(), "git {}", args.join(" "));
        let output = self
            .base_command(repository)
            .args(args)
            .output()
            .map_err(|err| failed(format!("failed to launch git: {err}")))?;
        if !output.status.success() {
            return Err(failed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| failed("git produced non-UTF-8 output".to_string()))?;
        Ok(parse_lines(&stdout))
    }
}

impl Default for Git {
    fn default() -> Self {
        Self::with_program("git")
    }
}

impl VersionControl for Git {
    fn status(&self, repository: &Path) -> Result<Vec<String>> {
        self.run(repository, &["status", "--porcelain"])
    }

    fn tags(&self, repository: &Path) -> Result<Vec<String>> {
        self.run(repository, &["tag"])
    }

    fn pull_tags(&self, repository: &Path) -> Result<()> {
        self.run(repository, &["pull", "--quiet", "--tags"])?;
        Ok(())
    }

    fn create_tag(&self, repository: &Path, tag: &str) -> Result<()> {
        self.run(repository, &["tag", tag])?;
        Ok(())
    }

    fn push_tag(&self, repository: &Path, tag: &str) -> Result<()> {
        self.run(repository, &["push", "--quiet", "origin", tag])?;
        Ok(())
    }

    fn tracked_files(&self, repository: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .run(repository, &["ls-files"])?
            .into_iter()
            .map(PathBuf::from)
            .collect())
    }
}

/// Split command output into lines, dropping surrounding blank lines.
///
/// Leading spaces are kept since porcelain status lines start with them.
fn parse_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
