//! Coverage for config loading from disk and the environment.

use std::collections::HashMap;
use std::path::PathBuf;

use smarttask::config::AppConfig;
use smarttask::extractors::ExtractorKind;

fn env_with(pairs: Vec<(&str, String)>) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();
    move |key| map.get(key).cloned()
}

fn write_config(dir: &tempfile::TempDir, contents: &str) -> String {
    let path = dir.path().join("config.toml");
    if let Err(err) = std::fs::write(&path, contents) {
        panic!("config should be written: {err}");
    }
    path.to_string_lossy().into_owned()
}

#[test]
fn load_reads_file_from_config_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(
        &dir,
        r#"
[extractor]
kind = "remote"

[llm]
model = "gpt-4o-mini"
api_key = "sk-from-file"
"#,
    );

    let config = match AppConfig::load(env_with(vec![("SMARTTASK_CONFIG_PATH", path)])) {
        Ok(config) => config,
        Err(err) => panic!("config should load: {err}"),
    };
    assert_eq!(config.extractor.kind, ExtractorKind::Remote);
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.llm.api_key(), Some("sk-from-file"));
    assert_eq!(config.llm.base_url, "https://api.openai.com");
}

#[test]
fn env_overrides_file_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(
        &dir,
        "[llm]\nmodel = \"gpt-4o-mini\"\n\n[logging]\nlevel = \"debug\"\n",
    );

    let config = AppConfig::load(env_with(vec![
        ("SMARTTASK_CONFIG_PATH", path),
        ("OPENAI_MODEL", "gpt-4o".to_owned()),
        ("SMARTTASK_LOGS_DIR", "/tmp/smarttask".to_owned()),
    ]))
    .expect("config should load");
    assert_eq!(config.llm.model, "gpt-4o");
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.logs_dir, Some(PathBuf::from("/tmp/smarttask")));
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(&dir, "[llm\nmodel = ");

    let result = AppConfig::load(env_with(vec![("SMARTTASK_CONFIG_PATH", path)]));
    assert!(result.is_err());
}

#[test]
fn missing_file_means_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nope.toml").to_string_lossy().into_owned();

    let config = AppConfig::load(env_with(vec![("SMARTTASK_CONFIG_PATH", path)]))
        .expect("defaults");
    assert_eq!(config.extractor.kind, ExtractorKind::Rules);
    assert!(config.llm.api_key().is_none());
}

#[test]
fn remote_without_key_is_rejected() {
    let config = AppConfig::default();
    let err = match config.validate_for(ExtractorKind::Remote) {
        Ok(()) => panic!("remote without key should fail"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("OPENAI_API_KEY"));
}
