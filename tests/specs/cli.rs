//! `hidsd`'s non-daemon entry points: `--version` and `--help`.

use crate::prelude::hidsd_binary;
use assert_cmd::Command;

#[test]
fn version_flag_prints_the_crate_version_and_exits_zero() {
    let assert = Command::new(hidsd_binary())
        .arg("--version")
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("hidsd"), "stdout: {stdout}");
}

#[test]
fn help_flag_documents_configuration_env_vars() {
    let assert = Command::new(hidsd_binary())
        .arg("--help")
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("HIDS_CONFIG"), "stdout: {stdout}");
    assert!(stdout.contains("HIDS_LOG_DIR"), "stdout: {stdout}");
}
