use std::fs;

use testscout_core::config::{DEFAULT_BASE_PORT, DEFAULT_GLOB, DEFAULT_OPTS, PROJECT_CONFIG_FILE};
use testscout_core::{Config, ConfigError, RunnerConfig};
use tempfile::TempDir;

#[test]
fn test_config_from_toml() {
    let toml_str = r#"
[discovery]
glob = "test/**/*.spec.ts"

[runner]
opts = ".mocharc"
framework_path = "vendor/mocha"
base_port = 12000
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.discovery.glob, "test/**/*.spec.ts");
    assert_eq!(config.runner.opts, ".mocharc");
    assert_eq!(config.runner.framework_path.as_deref(), Some("vendor/mocha"));
    assert_eq!(config.runner.base_port, 12000);
}

#[test]
fn test_partial_config_keeps_defaults() {
    let config: Config = toml::from_str("[runner]\nbase_port = 11000\n").unwrap();
    assert_eq!(config.discovery.glob, DEFAULT_GLOB);
    assert_eq!(config.runner.opts, DEFAULT_OPTS);
    assert_eq!(config.runner.base_port, 11000);
}

#[test]
fn test_load_prefers_project_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join(PROJECT_CONFIG_FILE),
        "[discovery]\nglob = \"spec/*.js\"\n",
    )
    .unwrap();

    let config = Config::load(temp_dir.path()).unwrap();
    assert_eq!(config.discovery.glob, "spec/*.js");
    assert_eq!(config.runner.base_port, DEFAULT_BASE_PORT);
}

#[test]
fn test_invalid_files_are_errors() {
    let temp_dir = TempDir::new().unwrap();
    let broken = temp_dir.path().join("broken.toml");
    fs::write(&broken, "[discovery\n").unwrap();
    assert!(matches!(Config::from_file(&broken), Err(ConfigError::ParseError(_))));

    let zero_port = temp_dir.path().join("zero.toml");
    fs::write(&zero_port, "[runner]\nbase_port = 0\n").unwrap();
    assert!(matches!(Config::from_file(&zero_port), Err(ConfigError::Invalid(_))));

    assert!(matches!(
        Config::from_file(temp_dir.path().join("missing.toml")),
        Err(ConfigError::ReadError(_))
    ));
}

#[test]
fn test_provider_settings_are_rooted() {
    let temp_dir = TempDir::new().unwrap();
    let settings = Config::default().provider_settings(temp_dir.path());
    assert_eq!(settings.glob_pattern, DEFAULT_GLOB);
    assert_eq!(settings.options_file_path, temp_dir.path().join("test/mocha.opts"));
    assert_eq!(settings.framework_install_path, None);
}

#[test]
fn test_framework_path_resolution_order() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let installed = root.join("node_modules").join("mocha");
    fs::create_dir_all(&installed).unwrap();

    let runner = RunnerConfig::default();
    assert_eq!(runner.resolve_framework_path(root), Some(installed.clone()));

    // Relative configured paths are tried against the root before the default
    fs::create_dir_all(root.join("vendor/mocha")).unwrap();
    let runner = RunnerConfig {
        framework_path: Some("vendor/mocha".to_string()),
        ..RunnerConfig::default()
    };
    assert_eq!(runner.resolve_framework_path(root), Some(root.join("vendor/mocha")));

    // Absolute configured paths win outright
    let elsewhere = TempDir::new().unwrap();
    let runner = RunnerConfig {
        framework_path: Some(elsewhere.path().to_string_lossy().to_string()),
        ..RunnerConfig::default()
    };
    assert_eq!(runner.resolve_framework_path(root), Some(elsewhere.path().to_path_buf()));

    // A configured path that does not exist falls back to node_modules
    let runner = RunnerConfig {
        framework_path: Some("nowhere".to_string()),
        ..RunnerConfig::default()
    };
    assert_eq!(runner.resolve_framework_path(root), Some(installed));
}
