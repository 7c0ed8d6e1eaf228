//! Integration tests for the taskboard CLI
//!
//! These tests run the compiled binary against temporary project directories
//! and, for board commands, an in-process stub gateway.

mod common;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use common::{StubGateway, TOKEN};

const TASKBOARD_VARS: &[&str] = &[
    "TASKBOARD_GATEWAY_URL",
    "TASKBOARD_REFERENCE_PATH",
    "TASKBOARD_AGGREGATOR_PATH",
    "TASKBOARD_TASKS_PATH",
    "TASKBOARD_TOKEN",
    "TASKBOARD_WORKSPACE_ID",
];

/// Helper to create a taskboard Command isolated from the caller's environment
fn taskboard() -> Command {
    let mut cmd = cargo_bin_cmd!("taskboard");
    for var in TASKBOARD_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Helper to create a temporary project directory
fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

fn write_config(dir: &TempDir, content: &str) {
    let config_dir = dir.path().join(".taskboard");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("taskboard.toml"), content).unwrap();
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_taskboard_help() {
        taskboard()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("board"))
            .stdout(predicate::str::contains("config"));
    }

    #[test]
    fn test_taskboard_version() {
        taskboard().arg("--version").assert().success();
    }

    #[test]
    fn test_board_help_lists_subcommands() {
        taskboard()
            .args(["board", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("show"))
            .stdout(predicate::str::contains("move"))
            .stdout(predicate::str::contains("statuses"));
    }

    #[test]
    fn test_unknown_command_fails() {
        taskboard().arg("frobnicate").assert().failure();
    }
}

// =============================================================================
// Configuration Tests
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = create_temp_project();

        taskboard()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Using default configuration"))
            .stdout(predicate::str::contains("http://localhost:8080"));
    }

    #[test]
    fn test_config_init_creates_toml() {
        let dir = create_temp_project();

        taskboard()
            .current_dir(dir.path())
            .args(["config", "init", "--workspace", "17"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created taskboard.toml"));

        let content = fs::read_to_string(dir.path().join(".taskboard/taskboard.toml")).unwrap();
        assert!(content.contains("[gateway]"));
        assert!(content.contains("workspace_id = 17"));
    }

    #[test]
    fn test_config_init_does_not_overwrite() {
        let dir = create_temp_project();
        write_config(&dir, "[session]\nworkspace_id = 3\n");

        taskboard()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));

        let content = fs::read_to_string(dir.path().join(".taskboard/taskboard.toml")).unwrap();
        assert!(content.contains("workspace_id = 3"));
    }

    #[test]
    fn test_config_validate_warns_without_token() {
        let dir = create_temp_project();

        taskboard()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("TASKBOARD_TOKEN is not set"));
    }

    #[test]
    fn test_config_validate_with_config() {
        let dir = create_temp_project();
        write_config(
            &dir,
            r#"
[gateway]
url = "https://gw.example.com"
timeout_secs = 5

[session]
workspace_id = 9
"#,
        );

        taskboard()
            .current_dir(dir.path())
            .env("TASKBOARD_TOKEN", "abc")
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid."));
    }

    #[test]
    fn test_config_validate_reports_bad_url() {
        let dir = create_temp_project();
        write_config(&dir, "[gateway]\nurl = \"gw.example.com\"\n");

        taskboard()
            .current_dir(dir.path())
            .env("TASKBOARD_TOKEN", "abc")
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration warnings:"))
            .stdout(predicate::str::contains("gw.example.com"));
    }

    #[test]
    fn test_config_show_applies_env_and_cli_overrides() {
        let dir = create_temp_project();
        write_config(&dir, "[session]\nworkspace_id = 4\n");

        taskboard()
            .current_dir(dir.path())
            .env("TASKBOARD_GATEWAY_URL", "http://env-gateway:9000")
            .args(["config", "show", "--workspace", "8"])
            .assert()
            .success()
            .stdout(predicate::str::contains("workspace_id = 4"))
            .stdout(predicate::str::contains("gateway_url = \"http://env-gateway:9000\""))
            .stdout(predicate::str::contains("workspace_id = 8"))
            .stdout(predicate::str::contains("TASKBOARD_TOKEN = (not set)"));
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        let dir = create_temp_project();

        taskboard()
            .current_dir(dir.path())
            .args(["config", "show", "--config", "missing.toml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read config file"));
    }
}

// =============================================================================
// Board Tests
// =============================================================================

mod board {
    use super::*;

    fn board_cmd(dir: &TempDir, base_url: &str) -> Command {
        let mut cmd = taskboard();
        cmd.current_dir(dir.path())
            .env("TASKBOARD_TOKEN", TOKEN)
            .env("TASKBOARD_WORKSPACE_ID", "42")
            .env("TASKBOARD_GATEWAY_URL", base_url);
        cmd
    }

    #[test]
    fn test_board_requires_workspace() {
        let dir = create_temp_project();

        taskboard()
            .current_dir(dir.path())
            .env("TASKBOARD_TOKEN", TOKEN)
            .args(["board", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No workspace selected"));
    }

    #[test]
    fn test_board_requires_token() {
        let dir = create_temp_project();

        taskboard()
            .current_dir(dir.path())
            .args(["board", "show", "--workspace", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("TASKBOARD_TOKEN"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_board_show_renders_columns() {
        let gw = StubGateway::new();
        let base = gw.spawn().await;
        let dir = create_temp_project();

        board_cmd(&dir, &base)
            .args(["board", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Workspace 42"))
            .stdout(predicate::str::contains("To do (2)"))
            .stdout(predicate::str::contains("In progress (0)"))
            .stdout(predicate::str::contains("Write docs"))
            .stdout(predicate::str::contains("Unassigned"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_board_show_json() {
        let gw = StubGateway::new();
        let base = gw.spawn().await;
        let dir = create_temp_project();

        let output = board_cmd(&dir, &base)
            .args(["board", "show", "--json"])
            .output()
            .unwrap();

        assert!(output.status.success());
        let groups: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(groups.as_array().map(Vec::len), Some(3));
        assert_eq!(groups[0]["tasks"][0]["taskId"], 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_board_statuses_in_catalog_order() {
        let gw = StubGateway::new();
        let base = gw.spawn().await;
        let dir = create_temp_project();

        board_cmd(&dir, &base)
            .args(["board", "statuses"])
            .assert()
            .success()
            .stdout(predicate::str::is_match("(?s)TODO.*IN_PROGRESS.*DONE").unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_board_move_confirms() {
        let gw = StubGateway::new();
        let base = gw.spawn().await;
        let dir = create_temp_project();

        board_cmd(&dir, &base)
            .args(["board", "move", "1", "DONE", "--assignee", "5"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Task #1 is now DONE"));

        let put = gw
            .requests()
            .into_iter()
            .find(|r| r.method == "PUT")
            .expect("status update sent");
        assert_eq!(put.path, "/tasks/tasks/1/status");
        assert_eq!(
            put.body,
            Some(serde_json::json!({"statusCode": "DONE", "assigneeId": 5}))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_board_move_rejected_by_gateway_fails() {
        let gw = StubGateway::new();
        gw.fail_updates();
        let base = gw.spawn().await;
        let dir = create_temp_project();

        board_cmd(&dir, &base)
            .args(["board", "move", "2", "DONE"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Task #2 was not moved"))
            .stderr(predicate::str::contains("HTTP 500"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_board_move_to_unknown_status_fails() {
        let gw = StubGateway::new();
        let base = gw.spawn().await;
        let dir = create_temp_project();

        board_cmd(&dir, &base)
            .args(["board", "move", "1", "ARCHIVED"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not part of the workspace catalog"));

        assert!(gw.requests().iter().all(|r| r.method != "PUT"));
    }

    #[test]
    fn test_board_unreachable_gateway_fails() {
        let dir = create_temp_project();

        board_cmd(&dir, "http://127.0.0.1:9")
            .args(["board", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Could not load the board"));
    }
}
