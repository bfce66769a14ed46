use assert_cmd::Command;

fn bin() -> Command {
    Command::cargo_bin("astartectl").unwrap()
}

const ASTARTE_ENV: [&str; 5] = [
    "ASTARTE_REALM",
    "ASTARTE_APPENGINE_URL",
    "ASTARTE_APPENGINE_TOKEN",
    "ASTARTE_REALM_MANAGEMENT_URL",
    "ASTARTE_REALM_MANAGEMENT_TOKEN",
];

fn scrubbed() -> (Command, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let mut cmd = bin();
    cmd.env("XDG_CONFIG_HOME", tmp.path());
    for var in ASTARTE_ENV {
        cmd.env_remove(var);
    }
    (cmd, tmp)
}

#[test]
fn help_works() {
    bin().arg("--help").assert().success();
}

#[test]
fn version_works() {
    bin().arg("--version").assert().success();
}

#[test]
fn completions_bash() {
    bin().args(["completions", "--shell", "bash"]).assert().success();
}

#[test]
fn invalid_device_id_fails_with_code_1() {
    let (mut cmd, _tmp) = scrubbed();
    let assert = cmd
        .args(["devices", "describe", "definitely-not-an-id"])
        .assert()
        .failure();
    let output = assert.get_output();
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("is not a valid Astarte device ID"),
        "stdout was: {stdout}"
    );
}

#[test]
fn missing_configuration_fails_with_code_1() {
    let (mut cmd, _tmp) = scrubbed();
    let assert = cmd.args(["devices", "list"]).assert().failure();
    let output = assert.get_output();
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("configuration error"), "stdout was: {stdout}");
}

#[test]
fn unknown_flag_is_a_usage_error() {
    bin().arg("--nonexistent").assert().failure();
}
