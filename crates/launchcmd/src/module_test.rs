// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

#[rstest]
fn test_find_single_descriptor() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("houdini.module"), "#%Module").unwrap();
    std::fs::write(tmp.path().join("README.md"), "").unwrap();

    let found = find_module_descriptor(tmp.path()).expect("Should find descriptor");
    assert_eq!(found, tmp.path().join("houdini.module"));
}

#[rstest]
fn test_find_descriptor_missing() {
    let tmp = TempDir::new().unwrap();
    // directories named like descriptors do not count
    std::fs::create_dir(tmp.path().join("nested.module")).unwrap();

    match find_module_descriptor(tmp.path()) {
        Err(Error::ModuleNotFound(root)) => assert_eq!(root, tmp.path()),
        other => panic!("Expected ModuleNotFound, got: {:?}", other),
    }
}

#[rstest]
fn test_find_descriptor_ambiguous() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("a.module"), "").unwrap();
    std::fs::write(tmp.path().join("b.module"), "").unwrap();

    match find_module_descriptor(tmp.path()) {
        Err(Error::AmbiguousModule { modules, .. }) => assert_eq!(modules.len(), 2),
        other => panic!("Expected AmbiguousModule, got: {:?}", other),
    }
}

#[rstest]
fn test_find_descriptor_in_missing_root() {
    let tmp = TempDir::new().unwrap();
    let result = find_module_descriptor(tmp.path().join("missing"));
    assert!(matches!(result, Err(Error::ReadFailed { .. })));
}

#[rstest]
fn test_module_command() {
    let mut adapter = ModuleCommand::default();
    let descriptor = Path::new("/levels/ep01/.common/packages/nuke/nuke.module");

    assert_eq!(
        adapter.load(descriptor).unwrap(),
        "module load \"/levels/ep01/.common/packages/nuke/nuke.module\""
    );
    assert_eq!(
        adapter.unload(descriptor).unwrap(),
        "module unload \"/levels/ep01/.common/packages/nuke/nuke.module\""
    );

    let mut lmod = ModuleCommand::with_program("ml");
    assert!(lmod.load(descriptor).unwrap().starts_with("ml load "));
}
