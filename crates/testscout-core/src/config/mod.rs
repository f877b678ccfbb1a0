//! Configuration management for testscout.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `testscout.toml` file
//! 3. User config `~/.config/testscout/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Test file discovery configuration.
    pub discovery: DiscoveryConfig,

    /// External runner configuration.
    pub runner: RunnerConfig,
}

impl Config {
    /// Load configuration for a project root.
    ///
    /// Searches for config in order:
    /// 1. `<root>/testscout.toml` (project local)
    /// 2. `~/.config/testscout/config.toml` (user config)
    /// 3. Falls back to defaults
    ///
    /// Environment overrides apply in every case.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let project_config = root.as_ref().join(PROJECT_CONFIG_FILE);
        if project_config.exists() {
            return Self::from_file(project_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(USER_CONFIG_DIR).join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(glob) = std::env::var("TESTSCOUT_GLOB") {
            self.discovery.glob = glob;
        }
        if let Ok(opts) = std::env::var("TESTSCOUT_OPTS") {
            self.runner.opts = opts;
        }
        if let Ok(path) = std::env::var("TESTSCOUT_FRAMEWORK_PATH") {
            self.runner.framework_path = Some(path);
        }
        if let Ok(script) = std::env::var("TESTSCOUT_RUNNER_SCRIPT") {
            self.runner.script = Some(PathBuf::from(script));
        }
        if let Ok(port) = std::env::var("TESTSCOUT_BASE_PORT") {
            if let Ok(n) = port.parse() {
                self.runner.base_port = n;
            }
        }
    }

    /// Empty strings are treated as "use the default", anything else must be usable.
    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.discovery.glob.trim().is_empty() {
            self.discovery.glob = DEFAULT_GLOB.to_string();
        }
        if self.runner.opts.trim().is_empty() {
            self.runner.opts = DEFAULT_OPTS.to_string();
        }
        if self.runner.framework_path.as_deref().is_some_and(|p| p.trim().is_empty()) {
            self.runner.framework_path = None;
        }
        if self.runner.base_port == 0 {
            return Err(ConfigError::Invalid("runner.base_port must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Resolve the settings handed to discovery and the runner for a root.
    pub fn provider_settings(&self, root: &Path) -> ProviderSettings {
        ProviderSettings {
            glob_pattern: self.discovery.glob.clone(),
            options_file_path: root.join(&self.runner.opts),
            framework_install_path: self.runner.resolve_framework_path(root),
        }
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Resolved settings for one project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub glob_pattern: String,
    pub options_file_path: PathBuf,
    pub framework_install_path: Option<PathBuf>,
}

/// Test file discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Glob selecting test files, relative to the project root.
    pub glob: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            glob: DEFAULT_GLOB.to_string(),
        }
    }
}

/// External runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Options file passed to the framework, relative to the project root.
    pub opts: String,

    /// Framework installation, absolute or relative to the project root.
    pub framework_path: Option<String>,

    /// Runner entry script used in debug launch configurations.
    pub script: Option<PathBuf>,

    /// First port tried when negotiating a runner connection.
    pub base_port: u16,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            opts: DEFAULT_OPTS.to_string(),
            framework_path: None, // Probe node_modules
            script: None,
            base_port: DEFAULT_BASE_PORT,
        }
    }
}

impl RunnerConfig {
    /// Locate the framework installation for a project root.
    ///
    /// Tries the configured path as given, then relative to the root, then
    /// `<root>/node_modules/mocha`.
    pub fn resolve_framework_path(&self, root: &Path) -> Option<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(configured) = &self.framework_path {
            candidates.push(PathBuf::from(configured));
            candidates.push(root.join(configured));
        }
        candidates.push(DEFAULT_FRAMEWORK_DIR.iter().fold(root.to_path_buf(), |p, c| p.join(c)));

        let found = candidates.into_iter().find(|candidate| candidate.exists());
        match &found {
            Some(path) => tracing::info!(path = %path.display(), "using test framework installation"),
            None => tracing::info!(root = %root.display(), "no test framework installation found"),
        }
        found
    }
}
