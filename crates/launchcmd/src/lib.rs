// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! launchcmd - Level Environments and Package Releases
//!
//! This crate provides the core library for composing shell environments from
//! a hierarchy of "level" directories and for releasing and installing
//! immutable, versioned packages into that hierarchy.
//!
//! # Overview
//!
//! Every directory below the project root that carries a
//! `.launchcmd_level_<type>` marker is a level. Activating a location resolves
//! its chain of levels, exports one `LAUNCHCMD_LEVEL_<TYPE>` variable per level,
//! loads the modules of every package installed along the chain and changes
//! into the leaf directory.
//!
//! ```text
//! $PROJECT_ROOT/
//!   demo/                      .launchcmd_level_project
//!     film/                    .launchcmd_level_division
//!       ep01/                  .launchcmd_level_episode
//!         .common/packages/houdini/houdini.module
//!         .common/tags/houdini#1.2.0
//!
//! $SOFTWARE_ROOT/
//!   houdini/1.2.0/             read-only release
//!     houdini.module
//!     houdini.manifest
//! ```

pub mod compose;
pub mod environment;
pub mod error;
pub mod fsutil;
pub mod git;
pub mod install;
pub mod level;
pub mod lock;
pub mod manifest;
pub mod module;
pub mod package;
pub mod registry;
pub mod release;
pub mod settings;

pub use compose::{Transition, compose_activation, compose_deactivation};
pub use environment::{EnvironmentState, ShellCommand};
pub use error::{Error, ErrorKind, Result};
pub use git::{Git, VersionControl};
pub use install::{InstallOutcome, install, uninstall};
pub use level::{Level, LevelChain, resolve_chain, resolve_type};
pub use manifest::{Manifest, ReleaseChange, ReleaseChangeKind};
pub use module::{ModuleAdapter, ModuleCommand, find_module_descriptor};
pub use package::{Bump, PackageName, ReleaseTag, Version};
pub use registry::{installed_packages, latest_release, list_installed_tags, list_released};
pub use release::{
    Release, ReleaseRequest, next_version, package_name_from_repository, release, verify_release,
};
pub use settings::Settings;

/// Prefix of the marker files that declare a level's type.
pub const LEVEL_MARKER_PREFIX: &str = ".launchcmd_level_";

/// Name of the per-level metadata directory.
pub const COMMON_DIRNAME: &str = ".common";

/// Name of the directory holding installed package trees, inside [`COMMON_DIRNAME`].
pub const PACKAGES_DIRNAME: &str = "packages";

/// Name of the directory holding installed tags, inside [`COMMON_DIRNAME`].
pub const TAGS_DIRNAME: &str = "tags";

/// File extension of module descriptors.
pub const MODULE_EXTENSION: &str = "module";

/// File extension of release manifests.
pub const MANIFEST_EXTENSION: &str = "manifest";

/// Separator between package and version in tags.
pub const TAG_SEPARATOR: char = '#';
