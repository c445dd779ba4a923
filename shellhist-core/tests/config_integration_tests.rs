// shellhist-core/tests/config_integration_tests.rs
use anyhow::Result;
use std::fs;
use std::sync::{Arc, Barrier};
use tempfile::tempdir;

use shellhist_core::{
    ConfigOverrides, ConfigStore, EnvValues, HistoryError, RedactionRule, RuleEngine,
    DEFAULT_SERVER_URL,
};

#[test]
fn file_written_by_management_commands_loads_back() -> Result<()> {
    let dir = tempdir()?;
    let store = ConfigStore::new(dir.path().join("shell-history").join("config.json"));

    store.set_server("https://history.example.com")?;
    store.set_api_key("abcdefgh12345678wxyz")?;
    store.add_rule(RedactionRule::new("token", r"token=\w+", "token=[REDACTED]"))?;

    let config = store.load_with_env(&ConfigOverrides::default(), &EnvValues::default())?;
    assert_eq!(config.server_url, "https://history.example.com");
    assert_eq!(config.masked_api_key().as_deref(), Some("abcdefgh...wxyz"));
    assert_eq!(config.redaction_rules.len(), 1);

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(store.path())?)?;
    assert_eq!(raw["redaction_rules"][0]["name"], "token");
    Ok(())
}

#[test]
fn precedence_override_env_file_default() -> Result<()> {
    let dir = tempdir()?;
    let store = ConfigStore::new(dir.path().join("config.json"));

    let defaults = store.load_with_env(&ConfigOverrides::default(), &EnvValues::default())?;
    assert_eq!(defaults.server_url, DEFAULT_SERVER_URL);

    store.set_server("http://from-file:3000")?;
    let env = EnvValues {
        server_url: Some("http://from-env:3000".into()),
        api_key: Some("env-key".into()),
    };
    let loaded = store.load_with_env(&ConfigOverrides::default(), &env)?;
    assert_eq!(loaded.server_url, "http://from-env:3000");
    assert_eq!(loaded.api_key, "env-key");

    let overrides = ConfigOverrides {
        server_url: Some("http://from-flag:3000".into()),
        api_key: None,
    };
    let loaded = store.load_with_env(&overrides, &env)?;
    assert_eq!(loaded.server_url, "http://from-flag:3000");

    // Environment values are never persisted.
    let file = store.read_file()?;
    assert_eq!(file.server_url, "http://from-file:3000");
    assert!(file.api_key.is_empty());
    Ok(())
}

#[test]
fn hand_edited_file_with_bad_rule_still_redacts_with_the_rest() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
  "server_url": "http://localhost:3000",
  "redaction_rules": [
    {"name": "broken", "pattern": "([unclosed", "replacement": "x"},
    {"name": "gh_token", "pattern": "ghp_[a-z0-9]{8}", "replacement": "[GH]"}
  ]
}"#,
    )?;

    let config = ConfigStore::new(&path).load_with_env(&ConfigOverrides::default(), &EnvValues::default())?;
    let engine = RuleEngine::new(&config.redaction_rules);
    assert_eq!(engine.active_rules(), 1);
    assert_eq!(engine.skipped_rules(), 1);
    assert_eq!(engine.redact("push GHP_ABCD1234").text, "push [GH]");
    Ok(())
}

#[test]
fn unparseable_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "server_url = nope").unwrap();
    let err = ConfigStore::new(&path)
        .load_with_env(&ConfigOverrides::default(), &EnvValues::default())
        .unwrap_err();
    assert!(matches!(err, HistoryError::ConfigParse(..)));
}

#[test]
fn concurrent_rule_additions_are_all_kept() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("config.json");
    let workers = 12;
    let barrier = Arc::new(Barrier::new(workers));

    let handles: Vec<_> = (0..workers)
        .map(|n| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                let store = ConfigStore::new(path);
                barrier.wait();
                store
                    .add_rule(RedactionRule::new(format!("rule_{}", n), format!("secret{}", n), "*"))
                    .unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(ConfigStore::new(&path).list_rules()?.len(), workers);
    Ok(())
}
