// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

fn mode(path: &Path) -> u32 {
    fs::symlink_metadata(path).unwrap().permissions().mode() & 0o777
}

fn sample_tree(root: &Path) {
    fs::create_dir_all(root.join("bin")).unwrap();
    fs::write(root.join("pkg.module"), "#%Module").unwrap();
    fs::write(root.join("bin/tool"), "#!/bin/sh").unwrap();
    fs::set_permissions(root.join("bin/tool"), fs::Permissions::from_mode(0o755)).unwrap();
}

#[rstest]
fn test_read_only_and_back() {
    let tmp = TempDir::new().unwrap();
    let tree = tmp.path().join("tree");
    sample_tree(&tree);

    set_read_only(&tree).unwrap();
    for path in [tree.clone(), tree.join("bin"), tree.join("bin/tool"), tree.join("pkg.module")] {
        assert_eq!(mode(&path) & 0o222, 0, "{path:?} should be read-only");
        assert!(!is_writable(&path).unwrap());
    }
    // execute bits survive
    assert_eq!(mode(&tree.join("bin/tool")), 0o555);

    set_writable(&tree).unwrap();
    assert!(is_writable(tree.join("bin/tool")).unwrap());
    assert_eq!(mode(&tree.join("bin/tool")), 0o755);
}

#[rstest]
fn test_write_access_restores_protection() {
    let tmp = TempDir::new().unwrap();
    let tree = tmp.path().join("tree");
    sample_tree(&tree);
    set_read_only(&tree).unwrap();

    {
        let access = WriteAccess::acquire(&tree).unwrap();
        assert!(is_writable(access.path().join("pkg.module")).unwrap());
    }
    assert!(!is_writable(tree.join("pkg.module")).unwrap());
}

#[rstest]
fn test_write_access_on_removed_tree() {
    let tmp = TempDir::new().unwrap();
    let tree = tmp.path().join("tree");
    sample_tree(&tree);
    set_read_only(&tree).unwrap();

    let access = WriteAccess::acquire(&tree).unwrap();
    fs::remove_dir_all(&tree).unwrap();
    drop(access);
    assert!(!tree.exists());
}

#[rstest]
fn test_copy_tree_preserves_layout_and_modes() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    sample_tree(&src);
    std::os::unix::fs::symlink("pkg.module", src.join("alias.module")).unwrap();
    set_read_only(&src).unwrap();

    let dst = tmp.path().join("dst");
    copy_tree(&src, &dst).unwrap();

    assert_eq!(fs::read_to_string(dst.join("bin/tool")).unwrap(), "#!/bin/sh");
    assert_eq!(mode(&dst.join("bin/tool")), 0o555);
    assert_eq!(
        fs::read_link(dst.join("alias.module")).unwrap(),
        PathBuf::from("pkg.module")
    );
    // directories are created fresh so the copy stays removable
    assert!(is_writable(dst.join("bin")).unwrap());

    set_writable(&src).unwrap();
}

#[rstest]
fn test_copy_file_creates_parents() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("a.txt");
    fs::write(&src, "a").unwrap();

    copy_file(&src, tmp.path().join("deep/er/a.txt")).unwrap();
    assert_eq!(fs::read_to_string(tmp.path().join("deep/er/a.txt")).unwrap(), "a");
}

#[rstest]
fn test_create_shared_dir_ignores_umask() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join(".common/tags");

    create_shared_dir(&dir).unwrap();

    assert_eq!(mode(&dir), SHARED_DIR_MODE);
    assert_eq!(mode(&tmp.path().join(".common")), SHARED_DIR_MODE);
}
