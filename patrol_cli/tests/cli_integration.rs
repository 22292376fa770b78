use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use assert_cmd::Command;
use tempfile::tempdir;

// Short moves and ticks so real-time runs stay quick
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[scan]
walk_heading_deg = 0.0
arc_width_deg = 30.0
scan_speed_dps = 20.0
head_align_ms = 0

[timing]
min_interval_ms = 20
max_interval_ms = 100

[reaction]
policy = "halt"
distance_mm = 250.0
interval_ms = 50

[tilt]
tolerance = 1.5
settle_ms = 10
max_corrections = 1

[hardware]
sensor_timeout_ms = 60
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["check-config"], 0, "config ok", "stdout")]
#[case(&["self-check"], 0, "self-check ok", "stdout")]
#[case(&["run", "--virtual-time", "--duration-ms", "1000", "--start"], 0, "patrol finished", "stdout")]
#[case(&["run", "--virtual-time"], 2, "--duration-ms", "stderr")]
#[case(&["run", "--policy", "dance"], 2, "invalid value", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("patrol_cli").unwrap();

    // Always include a valid config to avoid relying on defaults
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn virtual_run_reacts_to_scripted_obstacle() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("patrol_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .args(["run", "--virtual-time", "--duration-ms", "2000", "--start"])
        .env("PATROL_SIM_DISTANCES", "900,900,120");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("reactions=0").not())
        .stdout(predicate::str::contains("mode=scanning"))
        .stdout(predicate::str::contains("reason=deadline"));
}

#[rstest]
fn without_start_the_robot_stays_idle() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("patrol_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .args(["run", "--virtual-time", "--duration-ms", "1000"])
        .env("PATROL_SIM_DISTANCES", "120");

    // Idle ticks sleep max_interval_ms: 10 ticks in 1s
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ticks=10"))
        .stdout(predicate::str::contains("reactions=0"))
        .stdout(predicate::str::contains("mode=idle"));
}

#[rstest]
fn stdin_start_command_begins_scanning() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("patrol_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .args(["run", "--duration-ms", "800"])
        .write_stdin("hello robot\n{\"run\":\"start\",\"scanArcWidth\":\"45\"}\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("mode=scanning"));
}

#[rstest]
fn arc_override_reaches_the_loop() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    // 360 degrees spins: every tick sleeps max_interval_ms
    let mut cmd = Command::cargo_bin("patrol_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .args([
            "run",
            "--arc",
            "360",
            "--virtual-time",
            "--duration-ms",
            "1000",
            "--start",
        ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ticks=10"))
        .stdout(predicate::str::contains("reversals=0"));
}
