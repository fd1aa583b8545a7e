// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::fsutil::{SHARED_DIR_MODE, is_writable, set_writable};
use crate::{ErrorKind, LEVEL_MARKER_PREFIX};

struct Site {
    tmp: TempDir,
    settings: Settings,
}

impl Site {
    fn episode(&self) -> PathBuf {
        self.settings.project_root().join("demo/ep01")
    }

    /// Put a read-only release of `package` into the software bank.
    fn release(&self, package: &str, version: &str) {
        let dir = self.settings.software_root().join(package).join(version);
        std::fs::create_dir_all(dir.join("bin")).unwrap();
        std::fs::write(dir.join(format!("{package}.module")), "#%Module").unwrap();
        std::fs::write(dir.join("bin").join(package), version).unwrap();
        set_read_only(&dir).unwrap();
    }
}

impl Drop for Site {
    fn drop(&mut self) {
        let _ = set_writable(self.tmp.path());
    }
}

fn create_level(dir: &Path, level_type: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(format!("{LEVEL_MARKER_PREFIX}{level_type}")), "").unwrap();
}

#[fixture]
fn site() -> Site {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path().join("projects");
    create_level(&project.join("demo"), "project");
    create_level(&project.join("demo/ep01"), "episode");
    let settings = Settings::new(project, tmp.path().join("software")).unwrap();
    let site = Site { tmp, settings };
    site.release("nuke", "1.0.0");
    site.release("nuke", "2.0.0");
    site.release("houdini", "19.0.0");
    site
}

fn pkg(name: &str) -> PackageName {
    PackageName::new(name).unwrap()
}

fn ver(version: &str) -> Version {
    Version::parse(version).unwrap()
}

fn tags(level: &Path) -> Vec<String> {
    list_installed_tags(level).unwrap().into_iter().collect()
}

#[rstest]
fn test_install(site: Site) {
    let outcome = install(&site.settings, &pkg("nuke"), &ver("1.0.0"), site.episode())
        .expect("Should install release");

    assert_eq!(outcome.tag.to_string(), "nuke#1.0.0");
    assert!(outcome.replaced.is_empty());
    assert_eq!(outcome.install_dir, site.episode().join(".common/packages/nuke"));
    assert_eq!(std::fs::read_to_string(outcome.install_dir.join("bin/nuke")).unwrap(), "1.0.0");
    assert!(!is_writable(outcome.install_dir.join("bin/nuke")).unwrap());

    let marker = site.episode().join(".common/tags/nuke#1.0.0");
    assert_eq!(std::fs::metadata(&marker).unwrap().len(), 0);
    assert!(!is_writable(&marker).unwrap());

    for dir in [".common", ".common/packages", ".common/tags"] {
        let mode = std::fs::metadata(site.episode().join(dir))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, SHARED_DIR_MODE, "{dir} should be group writable");
    }
}

#[rstest]
fn test_install_relative_location(site: Site) {
    let outcome = install(&site.settings, &pkg("nuke"), &ver("1.0.0"), "demo/ep01").unwrap();
    assert_eq!(outcome.install_dir, site.episode().join(".common/packages/nuke"));
}

#[rstest]
fn test_install_replaces_other_version(site: Site) {
    install(&site.settings, &pkg("nuke"), &ver("1.0.0"), site.episode()).unwrap();
    let outcome = install(&site.settings, &pkg("nuke"), &ver("2.0.0"), site.episode()).unwrap();

    assert_eq!(outcome.replaced.len(), 1);
    assert_eq!(outcome.replaced[0].to_string(), "nuke#1.0.0");
    assert_eq!(tags(&site.episode()), vec!["nuke#2.0.0"]);
    assert_eq!(std::fs::read_to_string(outcome.install_dir.join("bin/nuke")).unwrap(), "2.0.0");
}

#[rstest]
fn test_install_copy_failure_after_replacing(site: Site) {
    install(&site.settings, &pkg("nuke"), &ver("1.0.0"), site.episode()).unwrap();

    // a socket cannot be copied, even with root privileges
    let broken = site.settings.software_root().join("nuke/3.0.0");
    std::fs::create_dir_all(broken.join("bin")).unwrap();
    std::fs::write(broken.join("nuke.module"), "#%Module").unwrap();
    drop(std::os::unix::net::UnixListener::bind(broken.join("bin/nuke.sock")).unwrap());
    set_read_only(&broken).unwrap();

    let err = install(&site.settings, &pkg("nuke"), &ver("3.0.0"), site.episode()).unwrap_err();
    assert!(matches!(err, Error::Io(_)));

    // the previous version is gone and the new one is not tagged
    assert!(tags(&site.episode()).is_empty());
    let leftover = site.episode().join(".common/packages/nuke");
    assert!(leftover.is_dir());
    assert!(!leftover.join("bin/nuke").exists());

    // the next install cleans up the untagged tree
    let outcome = install(&site.settings, &pkg("nuke"), &ver("1.0.0"), site.episode()).unwrap();
    assert!(outcome.replaced.is_empty());
    assert_eq!(tags(&site.episode()), vec!["nuke#1.0.0"]);
    assert_eq!(std::fs::read_to_string(leftover.join("bin/nuke")).unwrap(), "1.0.0");
    assert!(!leftover.join("bin/nuke.sock").exists());
}

#[rstest]
fn test_install_twice_is_a_conflict(site: Site) {
    install(&site.settings, &pkg("nuke"), &ver("1.0.0"), site.episode()).unwrap();
    let err = install(&site.settings, &pkg("nuke"), &ver("1.0.0"), site.episode()).unwrap_err();
    assert!(matches!(err, Error::AlreadyInstalled { .. }));
    assert_eq!(err.kind(), ErrorKind::StateConflict);
}

#[rstest]
fn test_install_missing_release(site: Site) {
    let err = install(&site.settings, &pkg("nuke"), &ver("3.0.0"), site.episode()).unwrap_err();
    assert!(matches!(err, Error::ReleaseNotFound { .. }));
    assert!(!site.episode().join(".common").exists());
}

#[rstest]
fn test_install_at_project_root(site: Site) {
    let err = install(
        &site.settings,
        &pkg("nuke"),
        &ver("1.0.0"),
        site.settings.project_root(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidLocation { .. }));
}

#[rstest]
fn test_install_outside_level(site: Site) {
    let plain = site.settings.project_root().join("demo/plain");
    std::fs::create_dir_all(&plain).unwrap();
    let err = install(&site.settings, &pkg("nuke"), &ver("1.0.0"), &plain).unwrap_err();
    assert!(matches!(err, Error::NoLevelMarker(_)));
}

#[rstest]
fn test_uninstall_last_package_removes_metadata(site: Site) {
    install(&site.settings, &pkg("nuke"), &ver("1.0.0"), site.episode()).unwrap();
    uninstall(&site.settings, &pkg("nuke"), &ver("1.0.0"), site.episode())
        .expect("Should uninstall package");
    assert!(!site.episode().join(".common").exists());
}

#[rstest]
fn test_uninstall_keeps_other_packages(site: Site) {
    install(&site.settings, &pkg("nuke"), &ver("2.0.0"), site.episode()).unwrap();
    install(&site.settings, &pkg("houdini"), &ver("19.0.0"), site.episode()).unwrap();

    uninstall(&site.settings, &pkg("nuke"), &ver("2.0.0"), site.episode()).unwrap();

    assert_eq!(tags(&site.episode()), vec!["houdini#19.0.0"]);
    assert!(!site.episode().join(".common/packages/nuke").exists());
    assert!(site.episode().join(".common/packages/houdini").is_dir());
}

#[rstest]
fn test_uninstall_not_installed(site: Site) {
    install(&site.settings, &pkg("nuke"), &ver("1.0.0"), site.episode()).unwrap();
    let err = uninstall(&site.settings, &pkg("nuke"), &ver("2.0.0"), site.episode()).unwrap_err();
    assert!(matches!(err, Error::NotInstalled { ref tag, .. } if tag == "nuke#2.0.0"));
    assert_eq!(tags(&site.episode()), vec!["nuke#1.0.0"]);
}

#[rstest]
fn test_levels_are_independent(site: Site) {
    let project = site.settings.project_root().join("demo");
    install(&site.settings, &pkg("nuke"), &ver("1.0.0"), &project).unwrap();
    install(&site.settings, &pkg("nuke"), &ver("2.0.0"), site.episode()).unwrap();

    assert_eq!(tags(&project), vec!["nuke#1.0.0"]);
    assert_eq!(tags(&site.episode()), vec!["nuke#2.0.0"]);
}
