// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Immutable, tagged releases of a repository into the software bank.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use crate::fsutil::{copy_file, set_read_only};
use crate::git::VersionControl;
use crate::lock::TargetLock;
use crate::manifest::{Manifest, ReleaseChange};
use crate::module::find_module_descriptor;
use crate::package::{Bump, PackageName, ReleaseTag, Version};
use crate::registry::latest_release;
use crate::settings::Settings;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./release_test.rs"]
mod release_test;

/// Marker of a version control working copy.
const REPOSITORY_MARKER: &str = ".git";

/// First version of a package that was never released.
pub fn initial_version() -> Version {
    Version::new(0, 1, 0)
}

/// Everything needed to release a repository.
#[derive(Debug, Clone, Default)]
pub struct ReleaseRequest {
    pub repository: PathBuf,
    pub package: String,
    pub version: String,
    pub comment: String,
    /// Files to release, absolute or relative to the repository.
    pub files: Vec<PathBuf>,
}

/// A completed release.
#[derive(Debug, Clone)]
pub struct Release {
    pub tag: ReleaseTag,
    pub directory: PathBuf,
    pub manifest: Manifest,
}

/// A request that passed every check not requiring the bank lock.
struct ValidatedRequest {
    repository: PathBuf,
    tag: ReleaseTag,
    comment: String,
    files: Vec<PathBuf>,
}

/// Release a repository as `<package>#<version>`.
///
/// Every check runs before anything is tagged, copied or written. Once the
/// tag is pushed, failures are reported but nothing is rolled back.
pub fn release(
    settings: &Settings,
    request: &ReleaseRequest,
    vcs: &dyn VersionControl,
) -> Result<Release> {
    let validated = validate(settings, request, vcs)?;

    let _lock = TargetLock::acquire(settings.software_root())?;

    let directory = settings.release_dir(&validated.tag.package, &validated.tag.version);
    if directory.exists() {
        return Err(Error::ReleaseExists(directory));
    }

    let changes = vcs.status(&validated.repository)?;
    if !changes.is_empty() {
        return Err(Error::DirtyRepository {
            repository: validated.repository,
            changes,
        });
    }

    commit(validated, directory, vcs)
}

fn validate(
    settings: &Settings,
    request: &ReleaseRequest,
    vcs: &dyn VersionControl,
) -> Result<ValidatedRequest> {
    let repository = dunce::canonicalize(&request.repository)
        .map_err(|_| Error::NotARepository(request.repository.clone()))?;
    if !repository.join(REPOSITORY_MARKER).exists() {
        return Err(Error::NotARepository(repository));
    }

    let package = PackageName::new(request.package.as_str())?;
    let version = Version::parse(&request.version)?;
    let comment = request.comment.trim();
    if comment.is_empty() {
        return Err(Error::EmptyComment);
    }

    let module = find_module_descriptor(&repository)?;
    if module.file_name().and_then(|n| n.to_str()) != Some(package.module_filename().as_str()) {
        return Err(Error::ModuleNameMismatch {
            expected: package.module_filename(),
            found: module,
        });
    }

    let files = relative_files(&repository, &request.files, &package)?;
    let module = PathBuf::from(package.module_filename());
    if !files.contains(&module) {
        return Err(Error::ModuleNotReleased(module));
    }

    if !settings.software_root().is_dir() {
        return Err(Error::SoftwareBankNotFound(
            settings.software_root().to_path_buf(),
        ));
    }

    let tag = ReleaseTag::new(package, version);
    vcs.pull_tags(&repository)?;
    let tag_name = tag.to_string();
    if vcs.tags(&repository)?.iter().any(|t| t == &tag_name) {
        return Err(Error::TagExists(tag_name));
    }

    Ok(ValidatedRequest {
        repository,
        tag,
        comment: comment.to_string(),
        files,
    })
}

/// Normalise the requested files to unique paths relative to the repository.
///
/// Paths are resolved lexically so a symlinked entry keeps the path it was
/// requested under; its content is released in place of the link.
fn relative_files(
    repository: &Path,
    files: &[PathBuf],
    package: &PackageName,
) -> Result<Vec<PathBuf>> {
    if files.is_empty() {
        return Err(Error::NoFiles);
    }

    let manifest = PathBuf::from(package.manifest_filename());
    let mut seen = BTreeSet::new();
    let mut relative = Vec::new();
    for file in files {
        let outside = || Error::FileOutsideRepository {
            file: file.clone(),
            repository: repository.to_path_buf(),
        };
        let path = repository_relative(repository, file).ok_or_else(outside)?;
        if path.as_os_str().is_empty() || path.starts_with(REPOSITORY_MARKER) {
            return Err(outside());
        }

        let absolute = repository.join(&path);
        // follows links, the released content is the link target's
        if !absolute.is_file() {
            return Err(Error::FileNotFound(absolute));
        }
        if path == manifest {
            tracing::warn!(file = %path.display(), "skipping file, the release manifest replaces it");
            continue;
        }
        if seen.insert(path.clone()) {
            relative.push(path);
        }
    }
    Ok(relative)
}

/// `file` relative to the canonical `repository`, without following links in
/// the file's own path. `None` when it lies outside the repository.
fn repository_relative(repository: &Path, file: &Path) -> Option<PathBuf> {
    let normalized = normalize_lexically(&repository.join(file))?;
    if let Ok(relative) = normalized.strip_prefix(repository) {
        return Some(relative.to_path_buf());
    }

    // an absolute spelling through a link to the repository itself
    let name = normalized.file_name()?;
    let parent = dunce::canonicalize(normalized.parent()?).ok()?;
    parent
        .join(name)
        .strip_prefix(repository)
        .ok()
        .map(Path::to_path_buf)
}

/// Drop `.` and resolve `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            other => normalized.push(other),
        }
    }
    Some(normalized)
}

fn commit(
    validated: ValidatedRequest,
    directory: PathBuf,
    vcs: &dyn VersionControl,
) -> Result<Release> {
    let ValidatedRequest {
        repository,
        tag,
        comment,
        files,
    } = validated;
    let tag_name = tag.to_string();

    vcs.create_tag(&repository, &tag_name)?;
    vcs.push_tag(&repository, &tag_name)?;
    tracing::info!(tag = %tag_name, "tagged release");

    std::fs::create_dir_all(&directory)?;
    for file in &files {
        copy_file(repository.join(file), directory.join(file))?;
    }

    let mut manifest = Manifest::new(tag.package.clone(), tag.version.clone(), comment, files);
    manifest.compute_checksums(&directory)?;
    manifest.stamp();
    manifest.save(Manifest::path_in(&directory, &tag.package))?;

    set_read_only(&directory)?;
    tracing::info!(tag = %tag_name, directory = %directory.display(), "released");

    Ok(Release {
        tag,
        directory,
        manifest,
    })
}

/// The version following the latest release of `package`.
pub fn next_version(settings: &Settings, package: &PackageName, bump: Bump) -> Result<Version> {
    Ok(latest_release(settings.software_root(), package)?
        .map(|latest| latest.bump(bump))
        .unwrap_or_else(initial_version))
}

/// Check a release against the checksums and protection recorded at release time.
pub fn verify_release(
    settings: &Settings,
    package: &PackageName,
    version: &Version,
) -> Result<Vec<ReleaseChange>> {
    let directory = settings.release_dir(package, version);
    if !directory.is_dir() {
        return Err(Error::ReleaseNotFound {
            package: package.to_string(),
            version: version.to_string(),
        });
    }
    let manifest = Manifest::load(Manifest::path_in(&directory, package))?;
    manifest.verify(&directory)
}

/// Package name implied by a repository directory, eg: `~/dev/nuke` -> `nuke`.
pub fn package_name_from_repository<P: AsRef<Path>>(repository: P) -> Result<PackageName> {
    let repository = repository.as_ref();
    let canonical = dunce::canonicalize(repository)
        .map_err(|_| Error::NotARepository(repository.to_path_buf()))?;
    let stem = canonical
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    PackageName::new(stem)
}
