//! Unit tests for configuration loading and root folder resolution
//!
//! Tests that manipulate CPATH_ROOT_FOLDER are marked with #[serial] so they
//! never race each other.

use cpath_common::config::{
    default_root_folder, load_toml_config, resolve_root_folder, TomlConfig, DEFAULT_ADMIN_CREDENTIAL,
    DEFAULT_DATABASE_FILE, DEFAULT_PORT, ROOT_FOLDER_ENV,
};
use cpath_common::{Error, Tag};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

#[test]
fn test_defaults_when_empty() {
    let config = TomlConfig::from_toml_str("").unwrap();

    assert_eq!(config.port(), DEFAULT_PORT);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.default_admin_credential(), DEFAULT_ADMIN_CREDENTIAL);
    assert!(config.scoring.priority.is_none());
    assert_eq!(config.sessions.idle_timeout_secs, 4 * 60 * 60);
    assert_eq!(config.sessions.submitted_retention_secs, 600);
    assert_eq!(config.sessions.sweep_interval_secs, 60);
    assert_eq!(
        config.database_path(Path::new("/srv/cp")),
        PathBuf::from("/srv/cp").join(DEFAULT_DATABASE_FILE)
    );
    assert!(config.question_bank_path(Path::new("/srv/cp")).is_none());
}

#[test]
fn test_full_config_parses() {
    let config = TomlConfig::from_toml_str(
        r#"
        root_folder = "/data/coursepath"
        port = 6100
        database_file = "results.db"
        question_bank = "bank.toml"
        default_admin_credential = "Start-Here-9"

        [logging]
        level = "debug"

        [scoring]
        priority = ["ai_hl", "aa_hl", "ai_sl", "aa_sl"]

        [sessions]
        idle_timeout_secs = 900
        sweep_interval_secs = 30
        "#,
    )
    .unwrap();

    let root = Path::new("/data/coursepath");
    assert_eq!(config.root_folder.as_deref(), Some(root));
    assert_eq!(config.port(), 6100);
    assert_eq!(config.database_path(root), root.join("results.db"));
    assert_eq!(config.question_bank_path(root), Some(root.join("bank.toml")));
    assert_eq!(config.default_admin_credential(), "Start-Here-9");
    assert_eq!(config.logging.level, "debug");
    assert_eq!(
        config.scoring.priority,
        Some(vec![Tag::AiHl, Tag::AaHl, Tag::AiSl, Tag::AaSl])
    );
    assert_eq!(config.sessions.idle_timeout_secs, 900);
    assert_eq!(config.sessions.submitted_retention_secs, 600);
    assert_eq!(config.sessions.sweep_interval_secs, 30);
}

#[test]
fn test_absolute_question_bank_path_kept() {
    let config = TomlConfig::from_toml_str("question_bank = \"/etc/coursepath/bank.toml\"").unwrap();
    assert_eq!(
        config.question_bank_path(Path::new("/ignored")),
        Some(PathBuf::from("/etc/coursepath/bank.toml"))
    );
}

#[test]
fn test_unknown_tag_in_priority_rejected() {
    let result = TomlConfig::from_toml_str("[scoring]\npriority = [\"aa_hl\", \"zz\"]");
    assert!(matches!(result, Err(Error::TomlParse(_))));
}

#[test]
fn test_explicit_config_file_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = 7001\n").unwrap();

    let (config, source) = load_toml_config(Some(&path)).unwrap();
    assert_eq!(config.port(), 7001);
    assert_eq!(source, Some(path));
}

#[test]
fn test_explicit_config_file_missing_is_error() {
    let result = load_toml_config(Some(Path::new("/nonexistent/coursepath/config.toml")));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_explicit_config_file_invalid_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = \"not a number\"\n").unwrap();

    let result = load_toml_config(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };

    let resolved = resolve_root_folder(Some(Path::new("/from/cli")), &config);
    assert_eq!(resolved, PathBuf::from("/from/cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };

    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/from/env"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_toml_beats_default() {
    env::remove_var(ROOT_FOLDER_ENV);
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };

    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/from/toml"));
}

#[test]
#[serial]
fn test_falls_back_to_platform_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolved = resolve_root_folder(None, &TomlConfig::default());
    assert_eq!(resolved, default_root_folder());
    assert!(resolved.to_string_lossy().contains("coursepath"));
}
