// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use crate::environment::{
    EnvironmentState, LOADED_MODULES_VAR, MODULES_SNAPSHOT_VAR, ShellCommand, join_commands, quote,
};

#[test]
fn test_render_commands() {
    let commands = vec![
        ShellCommand::Unset("LAUNCHCMD_LEVEL_SHOT".to_string()),
        ShellCommand::Export {
            name: "LAUNCHCMD_LEVEL_PROJECT".to_string(),
            value: "demo".to_string(),
        },
        ShellCommand::Run("module load \"/a/b.module\"".to_string()),
        ShellCommand::ChangeDirectory(PathBuf::from("/projects/demo")),
    ];

    let script = join_commands(&commands);

    assert_eq!(
        script,
        "unset LAUNCHCMD_LEVEL_SHOT && export LAUNCHCMD_LEVEL_PROJECT=\"demo\" \
         && module load \"/a/b.module\" && cd \"/projects/demo\""
    );
}

#[test]
fn test_quote_escapes_shell_characters() {
    let quoted = quote("value with $dollar and \"quotes\" and `ticks` \\");
    assert_eq!(
        quoted,
        "\"value with \\$dollar and \\\"quotes\\\" and \\`ticks\\` \\\\\""
    );
}

#[test]
fn test_level_and_shadow_vars() {
    let state: EnvironmentState = [
        ("LAUNCHCMD_LEVEL_PROJECT", "demo"),
        ("_LAUNCHCMD_LEVEL_PROJECT", "demo"),
        ("LAUNCHCMD_PROJECT_ROOT", "/projects"),
        ("HOME", "/home/me"),
    ]
    .into_iter()
    .collect();

    let live: Vec<&str> = state.live_level_vars().collect();
    let shadows: Vec<&str> = state.shadow_level_vars().collect();
    assert_eq!(live, vec!["LAUNCHCMD_LEVEL_PROJECT"]);
    assert_eq!(shadows, vec!["_LAUNCHCMD_LEVEL_PROJECT"]);
}

#[test]
fn test_loaded_modules_and_snapshot() {
    let mut state = EnvironmentState::new();
    assert!(state.loaded_modules().is_empty());
    assert_eq!(state.modules_snapshot(), None);

    state.set(LOADED_MODULES_VAR, "/a.module:/b.module");
    state.set(MODULES_SNAPSHOT_VAR, "");
    assert_eq!(state.loaded_modules(), vec!["/a.module", "/b.module"]);
    assert_eq!(state.modules_snapshot(), Some(Vec::new()));
}
