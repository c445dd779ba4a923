// shellhist/tests/cli_integration_tests.rs
//! Integration tests for the operator commands: rules, config, test, stats,
//! status and search.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(unused_imports)]
#[cfg(test)]
mod test_setup {
    use std::sync::Once;
    static INIT: Once = Once::new();

    pub fn setup_logger() {
        INIT.call_once(|| {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
                .is_test(true)
                .try_init()
                .ok();
        });
    }
}

struct TestEnv {
    _dir: TempDir,
    config: PathBuf,
    data: PathBuf,
}

impl TestEnv {
    fn new() -> Result<Self> {
        test_setup::setup_logger();
        let dir = tempfile::tempdir()?;
        let config = dir.path().join("config").join("config.json");
        let data = dir.path().join("data");
        Ok(Self { _dir: dir, config, data })
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo_bin!("shellhist"));
        cmd.env("HISTORY_CONFIG_PATH", &self.config)
            .env("HISTORY_DATA_DIR", &self.data)
            .env_remove("HISTORY_CLIENT_URL")
            .env_remove("HISTORY_API_KEY")
            .env_remove("RUST_LOG");
        cmd
    }

    fn config_json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&fs::read_to_string(&self.config)?)?)
    }
}

#[test]
fn rules_add_list_remove_cycle() -> Result<()> {
    let env = TestEnv::new()?;

    env.cmd()
        .args(["rules", "add", "--name", "aws", "--pattern", "AKIA[0-9A-Z]{16}", "--replacement", "[AWS_KEY]"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added redaction rule: aws"));
    env.cmd()
        .args(["rules", "add", "--name", "password", "--pattern", r"--password[= ]\S+"])
        .assert()
        .success();

    let json = env.config_json()?;
    assert_eq!(json["redaction_rules"][1]["replacement"], "[REDACTED]");

    env.cmd()
        .args(["rules", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configured redaction rules (2)"))
        .stdout(predicate::str::contains("AKIA[0-9A-Z]{16}"));

    env.cmd()
        .args(["rules", "remove", "aws"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed redaction rule: aws"));
    assert_eq!(env.config_json()?["redaction_rules"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[test]
fn duplicate_and_invalid_rules_fail() -> Result<()> {
    let env = TestEnv::new()?;
    env.cmd()
        .args(["rules", "add", "--name", "tok", "--pattern", "token=\\w+"])
        .assert()
        .success();

    env.cmd()
        .args(["rules", "add", "--name", "tok", "--pattern", "other"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    env.cmd()
        .args(["rules", "add", "--name", "broken", "--pattern", "([unclosed"])
        .assert()
        .failure();

    env.cmd()
        .args(["rules", "remove", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
    Ok(())
}

#[test]
fn redaction_alias_works() -> Result<()> {
    let env = TestEnv::new()?;
    env.cmd()
        .args(["redaction", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No redaction rules configured."));
    Ok(())
}

#[test]
fn rules_test_previews_without_sending() -> Result<()> {
    let env = TestEnv::new()?;
    env.cmd()
        .args(["rules", "add", "--name", "bearer", "--pattern", r"Bearer\s+\S+", "--replacement", "Bearer [TOKEN]"])
        .assert()
        .success();

    env.cmd()
        .args(["--server", "http://127.0.0.1:9", "rules", "test", "curl -H 'Authorization: bearer abc.def'"])
        .assert()
        .success()
        .stdout(predicate::str::contains("curl -H 'Authorization: Bearer [TOKEN]"))
        .stdout(predicate::str::contains("Matched rules: bearer"));

    assert!(!env.data.join("buffer.json").exists());
    Ok(())
}

#[test]
fn config_set_and_show_masks_key() -> Result<()> {
    let env = TestEnv::new()?;
    env.cmd()
        .args(["config", "set-server", "https://history.example.com/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Server URL set to: https://history.example.com"));
    env.cmd()
        .args(["config", "set-api-key", "sk_live_0123456789abcdef"])
        .assert()
        .success();

    env.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Server URL: https://history.example.com"))
        .stdout(predicate::str::contains("API Key: sk_live_...cdef"))
        .stdout(predicate::str::contains("0123456789").not());
    Ok(())
}

#[test]
fn environment_overrides_file_but_is_not_persisted() -> Result<()> {
    let env = TestEnv::new()?;
    env.cmd().args(["config", "set-server", "http://file:1"]).assert().success();

    env.cmd()
        .env("HISTORY_CLIENT_URL", "http://env:2")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Server URL: http://env:2"));

    assert_eq!(env.config_json()?["server_url"], "http://file:1");
    Ok(())
}

#[test]
fn set_server_rejects_non_http_url() -> Result<()> {
    let env = TestEnv::new()?;
    env.cmd()
        .args(["config", "set-server", "localhost:3000"])
        .assert()
        .failure();
    assert!(!env.config.exists());
    Ok(())
}

#[test]
fn connectivity_test_reports_health_and_key() -> Result<()> {
    let env = TestEnv::new()?;
    let mut server = mockito::Server::new();
    let _health = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body(r#"{"status": "healthy"}"#)
        .create();
    let _stats = server
        .mock("GET", "/api/v1/stats/")
        .match_header("x-api-key", "good-key")
        .with_status(200)
        .with_body("{}")
        .create();

    env.cmd().args(["config", "set-server", server.url().as_str()]).assert().success();
    env.cmd().args(["config", "set-api-key", "good-key"]).assert().success();

    env.cmd()
        .arg("test")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Connected to {}", server.url())))
        .stdout(predicate::str::contains("Status: healthy"))
        .stdout(predicate::str::contains("API key accepted"));
    Ok(())
}

#[test]
fn connectivity_test_fails_when_unreachable() -> Result<()> {
    let env = TestEnv::new()?;
    env.cmd()
        .args(["--server", "http://127.0.0.1:9", "test"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Cannot connect to http://127.0.0.1:9"));
    Ok(())
}

#[test]
fn rejected_key_raises_alert_then_good_key_clears_it() -> Result<()> {
    let env = TestEnv::new()?;
    let mut server = mockito::Server::new();
    let _health = server.mock("GET", "/health").with_status(200).with_body("{}").create();
    let _bad = server
        .mock("GET", "/api/v1/stats/")
        .match_header("x-api-key", "bad")
        .with_status(403)
        .create();
    let _good = server
        .mock("GET", "/api/v1/stats/")
        .match_header("x-api-key", "fixed")
        .with_status(200)
        .with_body(r#"{"total_commands": 3}"#)
        .create();

    env.cmd().args(["config", "set-server", server.url().as_str()]).assert().success();
    env.cmd().args(["config", "set-api-key", "bad"]).assert().success();
    env.cmd().arg("test").assert().failure().stdout(predicate::str::contains("API key rejected"));
    assert!(env.data.join("auth_failed").exists());

    env.cmd()
        .args(["status"])
        .assert()
        .success()
        .stderr(predicate::str::contains("rejected the configured API key"));

    env.cmd().args(["config", "set-api-key", "fixed"]).assert().success();
    env.cmd()
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total commands: 3"));
    assert!(!env.data.join("auth_failed").exists());
    Ok(())
}

#[test]
fn stats_falls_back_to_local_buffer() -> Result<()> {
    let env = TestEnv::new()?;
    env.cmd()
        .args(["--server", "http://127.0.0.1:9", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Buffered commands: 0"))
        .stdout(predicate::str::contains("buffer.json"));
    Ok(())
}

#[test]
fn search_prints_history_lines() -> Result<()> {
    let env = TestEnv::new()?;
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/api/v1/commands/")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("q".into(), "docker".into()),
            mockito::Matcher::UrlEncoded("limit".into(), "50".into()),
            mockito::Matcher::UrlEncoded("username".into(), "ops".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"items": [
                {"command": "docker ps", "hostname": "web-1", "exit_code": 0, "timestamp": "2026-04-01T12:30:45.000001Z"},
                {"command": "docker logs api", "hostname": "web-2", "exit_code": null, "timestamp": "2026-04-01T12:31:00"}
            ]}"#,
        )
        .create();

    env.cmd()
        .args(["--server", server.url().as_str(), "search", "docker", "--user", "ops"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[2026-04-01 12:30:45] web-1: docker ps (exit: 0)"))
        .stdout(predicate::str::contains("[2026-04-01 12:31:00] web-2: docker logs api\n"));
    Ok(())
}

#[test]
fn status_reports_local_state_as_json() -> Result<()> {
    let env = TestEnv::new()?;
    env.cmd()
        .args(["--server", "http://127.0.0.1:9", "capture", "make"])
        .assert()
        .success();

    let output = env.cmd().args(["status", "--json"]).output()?;
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["buffered"], 1);
    assert!(report["session_id"].is_string());
    assert!(report["oldest_buffered"].is_string());
    assert!(report["credential_alert"].is_null());
    Ok(())
}
