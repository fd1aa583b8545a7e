// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

fn version(v: &str) -> Version {
    Version::parse(v).unwrap()
}

#[rstest]
fn test_list_released() {
    let tmp = TempDir::new().unwrap();
    for dir in ["nuke/1.0.0", "nuke/1.10.0", "nuke/1.2.0", "houdini/19.0.0"] {
        std::fs::create_dir_all(tmp.path().join(dir)).unwrap();
    }
    // noise that must be ignored
    std::fs::create_dir_all(tmp.path().join("nuke/latest")).unwrap();
    std::fs::write(tmp.path().join("nuke/notes.txt"), "").unwrap();
    std::fs::write(tmp.path().join("README"), "").unwrap();
    std::fs::create_dir_all(tmp.path().join(".trash")).unwrap();

    let released = list_released(tmp.path()).expect("Should list releases");

    assert_eq!(released.len(), 2);
    let nuke: Vec<Version> = released[&PackageName::new("nuke").unwrap()]
        .iter()
        .cloned()
        .collect();
    assert_eq!(nuke, vec![version("1.0.0"), version("1.2.0"), version("1.10.0")]);
    assert!(released.contains_key(&PackageName::new("houdini").unwrap()));
}

#[rstest]
fn test_list_released_missing_root() {
    let tmp = TempDir::new().unwrap();
    let released = list_released(tmp.path().join("missing")).unwrap();
    assert!(released.is_empty());
}

#[rstest]
fn test_latest_release() {
    let tmp = TempDir::new().unwrap();
    for dir in ["nuke/1.9.0", "nuke/1.10.0"] {
        std::fs::create_dir_all(tmp.path().join(dir)).unwrap();
    }
    let nuke = PackageName::new("nuke").unwrap();
    let maya = PackageName::new("maya").unwrap();

    assert_eq!(latest_release(tmp.path(), &nuke).unwrap(), Some(version("1.10.0")));
    assert_eq!(latest_release(tmp.path(), &maya).unwrap(), None);
}

#[rstest]
fn test_released_versions_keep_their_spelling() {
    let tmp = TempDir::new().unwrap();
    for dir in ["nuke/01.0.0", "nuke/1.0.0", "nuke/18446744073709551616.0.0"] {
        std::fs::create_dir_all(tmp.path().join(dir)).unwrap();
    }
    let nuke = PackageName::new("nuke").unwrap();

    let released = list_released(tmp.path()).unwrap();
    let names: Vec<String> = released[&nuke].iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["01.0.0", "1.0.0", "18446744073709551616.0.0"]);
    assert_eq!(
        latest_release(tmp.path(), &nuke).unwrap(),
        Some(version("18446744073709551616.0.0"))
    );
}

#[rstest]
fn test_list_installed_tags() {
    let tmp = TempDir::new().unwrap();
    let tags = tags_dir(tmp.path());
    std::fs::create_dir_all(&tags).unwrap();
    std::fs::write(tags.join("nuke#1.0.0"), "").unwrap();
    std::fs::write(tags.join("houdini#19.0.0"), "").unwrap();

    let installed = list_installed_tags(tmp.path()).unwrap();
    assert_eq!(
        installed.into_iter().collect::<Vec<_>>(),
        vec!["houdini#19.0.0".to_string(), "nuke#1.0.0".to_string()]
    );
}

#[rstest]
fn test_list_installed_tags_without_metadata() {
    let tmp = TempDir::new().unwrap();
    assert!(list_installed_tags(tmp.path()).unwrap().is_empty());
    assert!(installed_packages(tmp.path()).unwrap().is_empty());
}

#[rstest]
fn test_installed_packages_skips_malformed_tags() {
    let tmp = TempDir::new().unwrap();
    let tags = tags_dir(tmp.path());
    std::fs::create_dir_all(&tags).unwrap();
    std::fs::write(tags.join("nuke#1.0.0"), "").unwrap();
    std::fs::write(tags.join("garbage"), "").unwrap();

    let installed = installed_packages(tmp.path()).unwrap();
    assert_eq!(installed.len(), 1);
    assert_eq!(installed[0].to_string(), "nuke#1.0.0");
}
