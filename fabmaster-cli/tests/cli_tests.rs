//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

/// Build command for the fabmaster-cli binary.
fn fabmaster_cli() -> Command {
    cargo_bin_cmd!("fabmaster-cli")
}

/// Path to the library's test fixtures (relative to workspace).
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("fabmaster")
        .join("tests")
        .join("fixtures")
}

fn board_path() -> PathBuf {
    fixtures_dir().join("minimal_board.txt")
}

#[test]
fn test_cli_help() {
    let mut cmd = fabmaster_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("FABMASTER"));
}

#[test]
fn test_cli_version() {
    let mut cmd = fabmaster_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_import_summary() {
    let mut cmd = fabmaster_cli();

    cmd.arg("import").arg(board_path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Footprints:     2"))
        .stdout(predicate::str::contains("Vias:           1"));
}

#[test]
fn test_cli_import_json_output() {
    let mut cmd = fabmaster_cli();

    cmd.arg("import").arg(board_path()).arg("--format").arg("json");
    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["stats"]["footprints"], 2);
    assert!(json["diagnostics"].is_array());
}

#[test]
fn test_cli_import_writes_board() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("board.json");

    let mut cmd = fabmaster_cli();
    cmd.arg("import").arg(board_path()).arg("--output").arg(&out);
    cmd.assert().success();

    let text = std::fs::read_to_string(&out).unwrap();
    let board: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(board["footprints"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_cli_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("options.json");
    std::fs::write(&config, r#"{"assign_zone_nets": false}"#).unwrap();

    let mut cmd = fabmaster_cli();
    cmd.arg("import")
        .arg(board_path())
        .arg("--config")
        .arg(&config)
        .arg("--format")
        .arg("json");
    let output = cmd.output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["stats"]["zones"], 2);
}

#[test]
fn test_cli_no_zone_nets_flag() {
    let mut cmd = fabmaster_cli();
    cmd.arg("import")
        .arg(board_path())
        .arg("--no-zone-nets")
        .arg("--format")
        .arg("json");
    let output = cmd.output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["stats"]["zones"], 2);
}

#[test]
fn test_cli_bad_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("options.json");
    std::fs::write(&config, "not json").unwrap();

    let mut cmd = fabmaster_cli();
    cmd.arg("import").arg(board_path()).arg("--config").arg(&config);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}

#[test]
fn test_cli_import_nonexistent_file() {
    let mut cmd = fabmaster_cli();

    cmd.arg("import").arg("does_not_exist.txt");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_fail_on_warning() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.txt");
    std::fs::write(
        &path,
        "A!VIA_X!VIA_Y!PAD_STACK_NAME!NET_NAME!\nJ!X!X!X!X!X!X!MILS!X!X!X\nS!1!2!\n",
    )
    .unwrap();

    let mut cmd = fabmaster_cli();
    cmd.arg("import").arg(&path);
    cmd.assert().success();

    let mut cmd = fabmaster_cli();
    cmd.arg("import").arg(&path).arg("--fail-on").arg("warning");
    cmd.assert().code(1);
}

#[test]
fn test_cli_github_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.txt");
    std::fs::write(
        &path,
        "A!VIA_X!VIA_Y!PAD_STACK_NAME!NET_NAME!\nJ!X!X!X!X!X!X!MILS!X!X!X\nS!1!2!\n",
    )
    .unwrap();

    let mut cmd = fabmaster_cli();
    cmd.arg("import").arg(&path).arg("--format").arg("github");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("::warning file="))
        .stdout(predicate::str::contains("line=3"));
}

#[test]
fn test_cli_sections_command() {
    let mut cmd = fabmaster_cli();

    cmd.arg("sections").arg(board_path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pad stacks"))
        .stdout(predicate::str::contains("full layers"));
}

#[test]
fn test_cli_layers_command() {
    let mut cmd = fabmaster_cli();

    cmd.arg("layers").arg(board_path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("F.Cu"))
        .stdout(predicate::str::contains("B.SilkS"));
}

#[test]
fn test_cli_output_formats_are_different() {
    let mut cmd_human = fabmaster_cli();
    cmd_human.arg("import").arg(board_path()).arg("--format").arg("human");
    let human_output = cmd_human.output().unwrap();

    let mut cmd_json = fabmaster_cli();
    cmd_json.arg("import").arg(board_path()).arg("--format").arg("json");
    let json_output = cmd_json.output().unwrap();

    assert_ne!(
        human_output.stdout, json_output.stdout,
        "Different formats should produce different output"
    );
}
