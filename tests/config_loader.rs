use std::io::Write;
use std::time::Duration;

use dagrun::config::{default_config_path, load_and_validate, load_from_path, parse_and_validate};
use dagrun::errors::DagrunError;
use dagrun::types::LogLevel;
use tempfile::NamedTempFile;

#[test]
fn test_full_run_table_is_loaded() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[run]
concurrency = 4
timeout_ms = 2500
dry_run = true
log_level = "debug"
"#
    )
    .unwrap();

    let settings = load_and_validate(file.path()).unwrap();
    assert_eq!(settings.run.concurrency, Some(4));
    assert_eq!(settings.run.log_level, Some(LogLevel::Debug));

    let config = settings.run_config();
    assert_eq!(config.concurrency, Some(4));
    assert_eq!(config.timeout, Some(Duration::from_millis(2500)));
    assert!(config.dry_run);
    assert!(config.cancel.is_none());
}

#[test]
fn test_empty_file_uses_defaults() {
    let file = NamedTempFile::new().unwrap();

    let settings = load_and_validate(file.path()).unwrap();
    let config = settings.run_config();
    assert_eq!(config.concurrency, None);
    assert_eq!(config.timeout, None);
    assert!(!config.dry_run);
}

#[test]
fn test_zero_concurrency_returns_config_error() {
    let result = parse_and_validate("[run]\nconcurrency = 0\n");

    match result {
        Err(DagrunError::ConfigError(msg)) => {
            assert!(msg.contains("concurrency"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_zero_timeout_returns_config_error() {
    let result = parse_and_validate("[run]\ntimeout_ms = 0\n");

    match result {
        Err(DagrunError::ConfigError(msg)) => {
            assert!(msg.contains("timeout_ms"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_key_returns_toml_error() {
    let result = parse_and_validate("[run]\nparallelism = 3\n");

    match result {
        Err(DagrunError::TomlError(_)) => {}
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_raw_load_does_not_validate() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[run]\nconcurrency = 0\n").unwrap();

    let raw = load_from_path(file.path()).unwrap();
    assert_eq!(raw.run.concurrency, Some(0));
}

#[test]
fn test_missing_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("nope.toml"));

    assert!(matches!(result, Err(DagrunError::IoError(_))));
}

#[test]
fn test_default_config_path() {
    assert_eq!(default_config_path().to_str(), Some("Dagrun.toml"));
}
