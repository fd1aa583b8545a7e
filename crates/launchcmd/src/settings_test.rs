// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

#[rstest]
fn test_release_dir() {
    let settings = Settings::new("/projects", "/software").unwrap();
    let package = PackageName::new("houdini").unwrap();
    let version = Version::parse("1.2.0").unwrap();

    assert_eq!(
        settings.release_dir(&package, &version),
        PathBuf::from("/software/houdini/1.2.0")
    );
}

#[rstest]
#[case("", "/software")]
#[case("projects", "/software")]
#[case("/projects", "relative/software")]
fn test_roots_must_be_absolute(#[case] project: &str, #[case] software: &str) {
    match Settings::new(project, software) {
        Err(Error::InvalidSetting { .. }) => {}
        other => panic!("Expected InvalidSetting, got: {:?}", other),
    }
}
