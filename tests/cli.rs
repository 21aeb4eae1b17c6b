//! Integration tests for CLI commands

#![allow(deprecated)]

use assert_cmd::{assert::OutputAssertExt, cargo::CommandCargoExt};
use conductor_cli::config::{Config, ProviderConfig};
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

const ENGAGEMENT_QUERY: &str =
    "List out the component engagements of a specific group 'Office USA' along with the team members";

/// Write `config` into a fresh temp dir; the dir doubles as working directory
fn workspace(config: &Config) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, config.to_toml().unwrap()).unwrap();
    (tmp, path)
}

fn builtin_config() -> Config {
    let mut config = Config::default();
    for provider in config.providers.values_mut() {
        if let Some(catalog) = provider.catalog().map(str::to_string) {
            *provider = ProviderConfig::Builtin { catalog };
        }
    }
    config
}

fn conductor(tmp: &TempDir, config: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("conductor").unwrap();
    cmd.current_dir(tmp.path()).arg("--config").arg(config);
    cmd
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("conductor").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("provider"))
        .stdout(predicate::str::contains("tools"));
}

#[test]
fn test_ask_offline_over_self_hosted_providers() {
    // Default config: every catalog runs as a child `conductor provider` process
    let (tmp, config) = workspace(&Config::default());

    let mut cmd = conductor(&tmp, &config);
    cmd.args(["ask", "--offline", ENGAGEMENT_QUERY]);

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("[EngagementAgent]: "))
        .stdout(predicate::str::contains("[TeamManagementAgent]: "))
        .stdout(predicate::str::contains("Kochi"))
        .stdout(predicate::str::contains("Dhilip"))
        .stdout(predicate::str::contains("[Supervisor]: "))
        .stdout(predicate::str::contains("[ITStaffAgent]").not());
}

#[test]
fn test_ask_blank_query() {
    let (tmp, config) = workspace(&builtin_config());

    let mut cmd = conductor(&tmp, &config);
    cmd.args(["ask", "--offline", "   "]);

    cmd.assert()
        .success()
        .stdout(predicate::str::diff("Please enter a query.\n"));
}

#[test]
fn test_ask_blank_query_needs_no_model() {
    // Default backend is the hosted model, and its key is missing
    let mut config = Config::default();
    config.llm.api_key_env = "CONDUCTOR_CLI_TEST_MISSING_KEY".into();
    let (tmp, path) = workspace(&config);

    conductor(&tmp, &path)
        .env_remove("CONDUCTOR_CLI_TEST_MISSING_KEY")
        .args(["ask", "   "])
        .assert()
        .success()
        .stdout(predicate::str::diff("Please enter a query.\n"))
        .stderr(predicate::str::contains("API key").not());

    let output = conductor(&tmp, &path)
        .env_remove("CONDUCTOR_CLI_TEST_MISSING_KEY")
        .args(["ask", "--json", ""])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["error"], "Please enter a query.");
}

#[test]
fn test_ask_json_output() {
    let (tmp, config) = workspace(&builtin_config());

    let output = conductor(&tmp, &config)
        .args(["ask", "--offline", "--json", "Who", "is", "on", "the", "on-call", "rotation?"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["entries"][0]["producer"], "ITStaffAgent");
    assert_eq!(value["states"][0]["state"], "idle");
    assert!(value["response"]
        .as_str()
        .unwrap()
        .contains("get_on_call_rotation"));
}

#[test]
fn test_ask_unmatched_query_reports_error_message() {
    let (tmp, config) = workspace(&builtin_config());

    let mut cmd = conductor(&tmp, &config);
    cmd.args(["ask", "--offline", "zzz qqq"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("An error occurred: "));
}

#[test]
fn test_ask_without_api_key_fails() {
    let mut config = builtin_config();
    config.llm.api_key_env = "CONDUCTOR_CLI_TEST_MISSING_KEY".into();
    let (tmp, path) = workspace(&config);

    let mut cmd = conductor(&tmp, &path);
    cmd.env_remove("CONDUCTOR_CLI_TEST_MISSING_KEY")
        .args(["ask", "Check the status of the VPN system."]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--offline"));
}

#[test]
fn test_tools_table() {
    let (tmp, config) = workspace(&Config::default());

    let mut cmd = conductor(&tmp, &config);
    cmd.args(["tools", "service_desk"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("get_active_tickets"))
        .stdout(predicate::str::contains("system_name?: string"));
}

#[test]
fn test_tools_unknown_provider() {
    let (tmp, config) = workspace(&builtin_config());

    let mut cmd = conductor(&tmp, &config);
    cmd.args(["tools", "weather"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown provider 'weather'"));
}

#[test]
fn test_config_prints_toml() {
    let (tmp, config) = workspace(&builtin_config());

    let mut cmd = conductor(&tmp, &config);
    cmd.arg("config");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("max_rounds = 50"))
        .stdout(predicate::str::contains("transport = \"builtin\""));
}

#[test]
fn test_invalid_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[supervisor]\nmax_rounds = 0\n").unwrap();

    let mut cmd = conductor(&tmp, &path);
    cmd.args(["ask", "--offline", "anything"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("max_rounds"));
}
