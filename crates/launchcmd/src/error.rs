// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for launchcmd operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[cfg(test)]
#[path = "./error_test.rs"]
mod error_test;

/// Convenience Result type with launchcmd Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of every [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, raised before any side effect.
    Validation,
    /// Something that must exist does not.
    NotFound,
    /// The requested change collides with existing state.
    StateConflict,
    /// An underlying tool or filesystem primitive failed.
    ExternalTool,
}

/// Errors that can occur during launchcmd operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Invalid package name {0:?}")]
    #[diagnostic(
        code(launchcmd::invalid_package_name),
        help("Package names may only contain ASCII letters and digits")
    )]
    InvalidPackageName(String),

    #[error("Invalid version {0:?}")]
    #[diagnostic(
        code(launchcmd::invalid_version),
        help("Versions must look like MAJOR.MINOR.PATCH, eg: 1.0.0")
    )]
    InvalidVersion(String),

    #[error("Invalid release tag {0:?}")]
    #[diagnostic(code(launchcmd::invalid_tag), help("Expected <package>#<version>"))]
    InvalidTag(String),

    #[error("A release comment is required")]
    #[diagnostic(code(launchcmd::empty_comment))]
    EmptyComment,

    #[error("No files were given to release")]
    #[diagnostic(code(launchcmd::no_files))]
    NoFiles,

    #[error("Module descriptor {0:?} is not part of the released files")]
    #[diagnostic(
        code(launchcmd::module_not_released),
        help("Add the package's .module file to the file list")
    )]
    ModuleNotReleased(PathBuf),

    #[error("File {file:?} is outside of repository {repository:?}")]
    #[diagnostic(code(launchcmd::file_outside_repository))]
    FileOutsideRepository { file: PathBuf, repository: PathBuf },

    #[error("Not a git repository, no .git found in {0:?}")]
    #[diagnostic(code(launchcmd::not_a_repository))]
    NotARepository(PathBuf),

    #[error("Repository {repository:?} has {} uncommitted change(s)", .changes.len())]
    #[diagnostic(
        code(launchcmd::dirty_repository),
        help("Commit and push all changes before releasing")
    )]
    DirtyRepository {
        repository: PathBuf,
        changes: Vec<String>,
    },

    #[error("Invalid location {location:?}: {reason}")]
    #[diagnostic(code(launchcmd::invalid_location))]
    InvalidLocation { location: PathBuf, reason: String },

    #[error("Invalid level type {level_type:?} in {directory:?}")]
    #[diagnostic(
        code(launchcmd::invalid_level_type),
        help("Level types may only contain ASCII letters, digits and underscores")
    )]
    InvalidLevelType {
        directory: PathBuf,
        level_type: String,
    },

    #[error("Invalid setting {name}: {reason}")]
    #[diagnostic(code(launchcmd::invalid_setting))]
    InvalidSetting { name: &'static str, reason: String },

    #[error("{0:?} is not a valid level, no level file found (.launchcmd_level_*)")]
    #[diagnostic(code(launchcmd::no_level_marker))]
    NoLevelMarker(PathBuf),

    #[error("{directory:?} is not a valid level, multiple level files found: {markers:?}")]
    #[diagnostic(
        code(launchcmd::ambiguous_level_marker),
        help("Remove all but one .launchcmd_level_* file")
    )]
    AmbiguousLevelMarker {
        directory: PathBuf,
        markers: Vec<PathBuf>,
    },

    #[error("No module descriptor (*.module) found in {0:?}")]
    #[diagnostic(code(launchcmd::module_not_found))]
    ModuleNotFound(PathBuf),

    #[error("Expected module descriptor {expected:?}, found {found:?}")]
    #[diagnostic(
        code(launchcmd::module_name_mismatch),
        help("The module descriptor must be named after the package")
    )]
    ModuleNameMismatch { expected: String, found: PathBuf },

    #[error("Multiple module descriptors found in {root:?}: {modules:?}")]
    #[diagnostic(code(launchcmd::ambiguous_module))]
    AmbiguousModule { root: PathBuf, modules: Vec<PathBuf> },

    #[error("File to release not found: {0:?}")]
    #[diagnostic(code(launchcmd::file_not_found))]
    FileNotFound(PathBuf),

    #[error("Release {package}#{version} not found")]
    #[diagnostic(
        code(launchcmd::release_not_found),
        help("Run 'launchcmd released' to list available releases")
    )]
    ReleaseNotFound { package: String, version: String },

    #[error("{tag} is not installed at {level:?}")]
    #[diagnostic(code(launchcmd::not_installed))]
    NotInstalled { tag: String, level: PathBuf },

    #[error("Software bank {0:?} does not exist")]
    #[diagnostic(code(launchcmd::software_bank_not_found))]
    SoftwareBankNotFound(PathBuf),

    #[error("Tag {0} already exists")]
    #[diagnostic(
        code(launchcmd::tag_exists),
        help("Releases are immutable, pick a new version")
    )]
    TagExists(String),

    #[error("Release directory {0:?} already exists")]
    #[diagnostic(
        code(launchcmd::release_exists),
        help("Releases are immutable, pick a new version")
    )]
    ReleaseExists(PathBuf),

    #[error("{tag} is already installed at {level:?}")]
    #[diagnostic(code(launchcmd::already_installed))]
    AlreadyInstalled { tag: String, level: PathBuf },

    #[error("Invalid manifest {path:?}: {error}")]
    #[diagnostic(code(launchcmd::invalid_manifest))]
    InvalidManifest {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },

    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(launchcmd::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("git {command} failed in {repository:?}: {message}")]
    #[diagnostic(code(launchcmd::git_failed))]
    Git {
        repository: PathBuf,
        command: String,
        message: String,
    },

    #[error("Failed to lock {path:?}: {errno}")]
    #[diagnostic(code(launchcmd::lock_failed))]
    Lock {
        path: PathBuf,
        #[source]
        errno: nix::errno::Errno,
    },

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(launchcmd::io_error))]
    Io(#[from] std::io::Error),

    /// Directory walk error passthrough
    #[error(transparent)]
    #[diagnostic(code(launchcmd::walk_error))]
    Walk(#[from] walkdir::Error),
}

impl Error {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPackageName(_)
            | Self::InvalidVersion(_)
            | Self::InvalidTag(_)
            | Self::EmptyComment
            | Self::NoFiles
            | Self::ModuleNotReleased(_)
            | Self::FileOutsideRepository { .. }
            | Self::NotARepository(_)
            | Self::DirtyRepository { .. }
            | Self::InvalidLocation { .. }
            | Self::InvalidLevelType { .. }
            | Self::InvalidSetting { .. }
            | Self::InvalidManifest { .. } => ErrorKind::Validation,
            Self::NoLevelMarker(_)
            | Self::ModuleNotFound(_)
            | Self::ModuleNameMismatch { .. }
            | Self::FileNotFound(_)
            | Self::ReleaseNotFound { .. }
            | Self::NotInstalled { .. }
            | Self::SoftwareBankNotFound(_) => ErrorKind::NotFound,
            Self::AmbiguousLevelMarker { .. }
            | Self::AmbiguousModule { .. }
            | Self::TagExists(_)
            | Self::ReleaseExists(_)
            | Self::AlreadyInstalled { .. } => ErrorKind::StateConflict,
            Self::ReadFailed { .. }
            | Self::Git { .. }
            | Self::Lock { .. }
            | Self::Io(_)
            | Self::Walk(_) => ErrorKind::ExternalTool,
        }
    }
}
