#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ignite(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ignite").unwrap();
    cmd.current_dir(dir.path()).env("IGNITION_ROOT", dir.path());
    cmd
}

fn write_config(dir: &TempDir, yaml: &str) {
    std::fs::create_dir_all(dir.path().join(".ignition")).unwrap();
    std::fs::write(dir.path().join(".ignition/config.yaml"), yaml).unwrap();
}

const TWO_COMPONENT_CONFIG: &str = r#"
version: 1
components:
  - name: alpha
    priority: 1
    command: "echo alpha started"
  - name: beta
    priority: 2
    command: "echo beta started"
launch:
  retries: 1
"#;

// ---------------------------------------------------------------------------
// ignite init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();
    ignite(&dir).arg("init").assert().success();
    assert!(dir.path().join(".ignition/config.yaml").exists());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    ignite(&dir).arg("init").assert().success();
    ignite(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

// ---------------------------------------------------------------------------
// ignite run
// ---------------------------------------------------------------------------

#[test]
fn run_without_config_fails() {
    let dir = TempDir::new().unwrap();
    ignite(&dir)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no project configuration"));
}

#[test]
fn run_launches_in_priority_order_and_checkpoints() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, TWO_COMPONENT_CONFIG);
    ignite(&dir)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Launch complete"));

    let checkpoint =
        std::fs::read_to_string(dir.path().join(".ignition/checkpoint.json")).unwrap();
    assert!(checkpoint.contains("\"last_component\": \"beta\""));
}

#[test]
fn rerun_after_success_is_noop() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, TWO_COMPONENT_CONFIG);
    ignite(&dir).arg("run").assert().success();
    ignite(&dir)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to do"));
}

#[test]
fn run_fresh_relaunches_everything() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, TWO_COMPONENT_CONFIG);
    ignite(&dir).arg("run").assert().success();
    ignite(&dir)
        .args(["run", "--fresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"));
}

#[test]
fn run_halts_on_failure_with_exit_code_2() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"
components:
  - name: good
    priority: 1
    command: "true"
  - name: bad
    priority: 2
    command: "false"
  - name: never
    priority: 3
    command: "true"
launch:
  retries: 1
"#,
    );
    ignite(&dir)
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("'bad' failed to start"));

    // checkpoint stays at the last healthy component
    let checkpoint =
        std::fs::read_to_string(dir.path().join(".ignition/checkpoint.json")).unwrap();
    assert!(checkpoint.contains("\"last_component\": \"good\""));
}

#[test]
fn run_resumes_past_checkpointed_components() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"
components:
  - name: one
    priority: 1
    command: "echo one >> launches.log"
  - name: two
    priority: 2
    command: "echo two >> launches.log"
launch:
  retries: 1
"#,
    );
    ignite(&dir).arg("run").assert().success();
    // Force a resume from "one" and confirm "one" does not relaunch
    std::fs::write(
        dir.path().join(".ignition/checkpoint.json"),
        r#"{"last_component": "one"}"#,
    )
    .unwrap();
    std::fs::remove_file(dir.path().join("launches.log")).unwrap();
    ignite(&dir).arg("run").assert().success();
    let log = std::fs::read_to_string(dir.path().join("launches.log")).unwrap();
    assert_eq!(log, "two\n");
}

#[test]
fn run_skip_on_failure_continues() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"
components:
  - name: bad
    priority: 1
    command: "false"
  - name: good
    priority: 2
    command: "true"
launch:
  retries: 1
"#,
    );
    ignite(&dir)
        .args(["run", "--skip-on-failure"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped"));
}

#[test]
fn run_writes_servant_endpoints() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"
components:
  - name: only
    command: "true"
servants:
  - name: deepseek
    address: http://localhost:9400
"#,
    );
    ignite(&dir).arg("run").assert().success();
    let endpoints =
        std::fs::read_to_string(dir.path().join(".ignition/servant_endpoints.txt")).unwrap();
    assert_eq!(endpoints, "deepseek=http://localhost:9400\n");
}

#[test]
fn run_json_output() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, TWO_COMPONENT_CONFIG);
    let output = ignite(&dir).args(["run", "--json"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["components"].as_array().unwrap().len(), 2);
}

#[test]
fn run_records_history() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, TWO_COMPONENT_CONFIG);
    ignite(&dir).arg("run").assert().success();
    let history = std::fs::read_to_string(dir.path().join(".ignition/history.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&history).unwrap();
    assert_eq!(value["runs"].as_array().unwrap().len(), 1);
    assert_eq!(value["best_sequence"]["success_rate"], 1.0);
}

// ---------------------------------------------------------------------------
// ignite checkpoint
// ---------------------------------------------------------------------------

#[test]
fn checkpoint_show_empty() {
    let dir = TempDir::new().unwrap();
    ignite(&dir)
        .args(["checkpoint", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No checkpoint"));
}

#[test]
fn checkpoint_clear_forces_full_restart() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, TWO_COMPONENT_CONFIG);
    ignite(&dir).arg("run").assert().success();
    ignite(&dir).args(["checkpoint", "clear"]).assert().success();
    ignite(&dir)
        .args(["checkpoint", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No checkpoint"));
}

#[test]
fn checkpoint_clear_is_idempotent() {
    let dir = TempDir::new().unwrap();
    ignite(&dir).args(["checkpoint", "clear"]).assert().success();
    ignite(&dir).args(["checkpoint", "clear"]).assert().success();
}

#[test]
fn corrupt_checkpoint_degrades_to_fresh_start() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, TWO_COMPONENT_CONFIG);
    std::fs::write(dir.path().join(".ignition/checkpoint.json"), "garbage{{").unwrap();
    ignite(&dir)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"));
}

// ---------------------------------------------------------------------------
// ignite status
// ---------------------------------------------------------------------------

#[test]
fn status_lists_components() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, TWO_COMPONENT_CONFIG);
    ignite(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"))
        .stdout(predicate::str::contains("beta"));
}

#[test]
fn status_json_reflects_checkpoint() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, TWO_COMPONENT_CONFIG);
    ignite(&dir).arg("run").assert().success();
    let output = ignite(&dir).args(["status", "--json"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["checkpoint"], "beta");
    assert_eq!(value["complete"], true);
}

// ---------------------------------------------------------------------------
// ignite config validate
// ---------------------------------------------------------------------------

#[test]
fn config_validate_accepts_clean_config() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "components:\n  - name: web\n    command: \"true\"\n",
    );
    ignite(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn config_validate_rejects_duplicates() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "components:\n  - name: web\n    command: \"true\"\n  - name: web\n    command: \"true\"\n",
    );
    ignite(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("duplicate component"));
}

// ---------------------------------------------------------------------------
// ignite repair / route without configuration
// ---------------------------------------------------------------------------

#[test]
fn repair_without_provider_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "components: []\n");
    std::fs::write(dir.path().join("broken.py"), "x = 1\n").unwrap();
    ignite(&dir)
        .args(["repair", "--module", "broken.py", "--test", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no remediation provider"));
}

#[test]
fn route_without_router_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "components: []\n");
    ignite(&dir)
        .args(["route", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no router configured"));
}
