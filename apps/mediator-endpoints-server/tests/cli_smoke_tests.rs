#![allow(clippy::unwrap_used, clippy::expect_used)]

//! CLI smoke tests for the mediator-endpoints-server binary.

use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn run_server(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mediator-endpoints-server"))
        .args(args)
        .env_remove("MEDIATOR_ENDPOINTS__ROUTE_PREFIX")
        .env_remove("MEDIATOR_ENDPOINTS__BODY_LIMIT_BYTES")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute mediator-endpoints-server")
}

fn quickstart_config() -> String {
    format!("{}/config/quickstart.yaml", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn help_lists_subcommands() {
    let output = run_server(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run"));
    assert!(stdout.contains("check"));
    assert!(stdout.contains("--config"));
}

#[test]
fn missing_config_file_fails() {
    let output = run_server(&["--config", "/nonexistent/config.yaml", "check"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"), "{stderr}");
}

#[test]
fn invalid_config_key_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "route_prefx: /api\n").unwrap();

    let output = run_server(&["--config", path.to_str().unwrap(), "check"]);
    assert!(!output.status.success());
}

#[test]
fn check_prints_conventional_endpoints() {
    let config = quickstart_config();
    let output = run_server(&["--config", &config, "check"]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration is valid"));
    assert!(
        stdout.contains("GET      /api/GetGreeting -> GetGreeting.Index"),
        "{stdout}"
    );
    assert!(
        stdout.contains("GET      /api/ListGreetings/Index -> ListGreetings.Index"),
        "{stdout}"
    );
    assert!(
        stdout.contains("POST     /api/AddGreeting -> AddGreeting.Index"),
        "{stdout}"
    );
    assert!(
        stdout.contains("DELETE   /api/RemoveGreeting -> RemoveGreeting.Index"),
        "{stdout}"
    );
}

#[test]
fn check_fails_on_unroutable_prefix() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("routes.yaml");
    std::fs::write(
        &path,
        "route_prefix: \"/api/{tenant}\"\nstrip_suffixes: [Query, Command]\n",
    )
    .unwrap();

    let output = run_server(&["--config", path.to_str().unwrap(), "check"]);
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stdout.contains("Configuration is valid"), "{stdout}");
    assert!(stderr.contains("not a valid route path"), "{stderr}");
}

#[test]
fn print_config_emits_yaml() {
    let config = quickstart_config();
    let output = run_server(&["--config", &config, "--print-config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_saphyr::from_str(&stdout).unwrap();
    assert_eq!(parsed["route_prefix"], "/api");
    assert_eq!(parsed["classifications"]["GetGreetingQuery"], "query");
}
