use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use serial_test::serial;
use tempfile::TempDir;

fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .display()
        .to_string()
}

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let config = dir.path().join("config.yaml");
        std::fs::write(
            &config,
            format!(
                "artifacts_dir: {}\nremote_labeler:\n  api_key_env: LABELPILOT_TEST_ABSENT_KEY\n",
                dir.path().join("artifacts").display()
            ),
        )
        .expect("write config");
        Self { dir, config }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("labelpilot").expect("binary");
        cmd.current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .env_remove("LABELPILOT_POLICY_OVERRIDE_JSON")
            .env_remove("LABELPILOT_POLICY_CLI_OVERRIDES")
            .arg("--config")
            .arg(&self.config);
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(["--output", "json"])
            .args(args)
            .output()
            .expect("run binary");
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("json stdout")
    }
}

#[test]
#[serial]
fn plans_lists_full_catalogue() {
    let ws = Workspace::new();
    let plans = ws.json(&["plans"]);
    let plans = plans.as_array().unwrap();
    assert_eq!(plans.len(), 12);
    let login = plans.iter().find(|p| p["taskType"] == "login").unwrap();
    assert_eq!(login["steps"][2]["intent"], "login-button");
    assert_eq!(login["steps"][2]["risk"], "medium");
}

#[test]
#[serial]
fn plans_rejects_unknown_task() {
    let ws = Workspace::new();
    ws.cmd().args(["plans", "teleport"]).assert().failure();
}

#[test]
#[serial]
fn login_run_executes_full_plan() {
    let ws = Workspace::new();
    let report = ws.json(&[
        "run",
        &fixture("login.json"),
        "--task",
        "login",
        "-i",
        "input-username=alice",
        "-i",
        "input-password=hunter2",
    ]);
    assert_eq!(report["result"]["status"], "success");
    assert_eq!(
        report["result"]["actionsTaken"],
        serde_json::json!(["type input-username", "type input-password", "click login-button"])
    );
    let actions = report["browserActions"].as_array().unwrap();
    assert_eq!(actions.len(), 3);
    assert_eq!(actions[1]["selector"], "#password");
    assert_eq!(actions[1]["chars"], 7);
    assert_eq!(report["taskType"], "login");
}

#[test]
#[serial]
fn dry_run_reports_plan_without_acting() {
    let ws = Workspace::new();
    let report = ws.json(&["run", &fixture("login.json"), "--task", "login", "--dry-run"]);
    assert_eq!(report["result"]["status"], "dry-run");
    assert_eq!(report["result"]["plannedActions"].as_array().unwrap().len(), 3);
    assert!(report["browserActions"].as_array().unwrap().is_empty());
}

#[test]
#[serial]
fn search_without_submit_button_succeeds() {
    let ws = Workspace::new();
    let report = ws.json(&[
        "run",
        &fixture("search.json"),
        "--task",
        "search",
        "-i",
        "search-box=rust",
    ]);
    assert_eq!(report["result"]["status"], "success");
    assert_eq!(
        report["result"]["actionsTaken"],
        serde_json::json!(["type search-box"])
    );
    assert_eq!(
        report["browserActions"][0]["selector"],
        "[aria-label=\"Search the catalog\"]"
    );
}

#[test]
#[serial]
fn unconfirmed_delete_is_incomplete() {
    let ws = Workspace::new();
    let report = ws.json(&["run", &fixture("delete_account.json"), "--task", "deleteAccount"]);
    assert_eq!(report["result"]["status"], "incomplete");
    assert_eq!(report["result"]["reason"], "intent-not-found");
    assert_eq!(report["metrics"]["highRiskSkippedCount"], 1);
    assert_eq!(
        report["result"]["fallbackUI"]["suggestion"],
        "Try refreshing or entering manually."
    );
}

#[test]
#[serial]
fn missing_input_fails_with_run_screenshot() {
    let ws = Workspace::new();
    let report = ws.json(&["run", &fixture("login.json"), "--task", "login"]);
    assert_eq!(report["result"]["status"], "failure");
    assert_eq!(report["result"]["reason"], "missing-input");
    let run_id = report["runId"].as_str().unwrap();
    let path = PathBuf::from(report["result"]["screenshotPath"].as_str().unwrap());
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        format!("error_{run_id}.png")
    );
    assert!(path.exists());
}

#[test]
#[serial]
fn missing_snapshot_is_navigation_failure() {
    let ws = Workspace::new();
    let report = ws.json(&["run", "file:///nonexistent/page.json", "--task", "navigation"]);
    assert_eq!(report["result"]["status"], "failure");
    assert_eq!(report["result"]["reason"], "navigation-failed");
}

#[test]
#[serial]
fn configuration_errors_exit_non_zero() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["run", &fixture("login.json"), "--task", "teleport"])
        .assert()
        .failure();
    ws.cmd()
        .args(["run", &fixture("login.json"), "--task", "login", "--timeout-ms", "0"])
        .assert()
        .failure();
    ws.cmd()
        .args(["run", &fixture("login.json"), "--task", "login", "--remote"])
        .assert()
        .failure();
}

#[test]
#[serial]
fn label_hides_other_unless_asked() {
    let ws = Workspace::new();
    let labeled = ws.json(&["label", &fixture("login.json")]);
    let intents: Vec<&str> = labeled["chunks"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|chunk| chunk["elements"].as_array().unwrap())
        .map(|el| el["intent"].as_str().unwrap())
        .collect();
    assert!(intents.contains(&"input-username"));
    assert!(intents.contains(&"login-button"));
    assert!(!intents.contains(&"other"));

    let all = ws.json(&["label", &fixture("login.json"), "--all"]);
    assert!(all["chunks"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|chunk| chunk["elements"].as_array().unwrap())
        .any(|el| el["intent"] == "other"));
    assert_eq!(all["metrics"]["originalElementCount"], 9);
}

#[test]
#[serial]
fn set_overrides_reach_policy_show() {
    let ws = Workspace::new();
    let snapshot = ws.json(&["--set", "confidence.low=0.6", "policy", "show"]);
    assert_eq!(snapshot["confidence"]["low"], 0.6);
    assert_eq!(snapshot["risk"]["submit-payment"]["tier"], "high");

    let provenance = ws.json(&["--set", "run.timeout_ms=900", "policy", "provenance"]);
    assert_eq!(provenance["run.timeout_ms"], "Cli");
}

#[test]
#[serial]
fn counters_are_reported_on_request() {
    let ws = Workspace::new();
    let report = ws.json(&[
        "run",
        &fixture("search.json"),
        "--task",
        "search",
        "-i",
        "search-box=rust",
        "--counters",
    ]);
    assert_eq!(report["counters"]["runs"]["success"], 1);
    assert_eq!(report["counters"]["labeling"]["runs"], 1);
}

#[test]
#[serial]
fn human_output_summarizes_run() {
    let ws = Workspace::new();
    let output = ws
        .cmd()
        .args(["run", &fixture("login.json"), "--task", "login", "--dry-run"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Status: dry-run"));
    assert!(stdout.contains("click login-button"));
}
