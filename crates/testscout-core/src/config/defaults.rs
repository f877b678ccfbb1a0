//! Default values for testscout configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Discovery Defaults
// ============================================================================

/// Glob (relative to the project root) selecting test files.
pub const DEFAULT_GLOB: &str = "src/**/*.test.js";

/// Directories never searched for test files.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &["node_modules", ".git"];

// ============================================================================
// Runner Defaults
// ============================================================================

/// Options file handed to the test framework, relative to the project root.
pub const DEFAULT_OPTS: &str = "test/mocha.opts";

/// Framework installation probed when none is configured.
pub const DEFAULT_FRAMEWORK_DIR: &[&str] = &["node_modules", "mocha"];

/// First port tried when negotiating a runner connection.
pub const DEFAULT_BASE_PORT: u16 = 10000;

/// Launch configuration name shown by debuggers.
pub const DEBUG_LAUNCH_NAME: &str = "Mocha Tests";

/// Debugger type used for launch configurations.
pub const DEBUG_LAUNCH_TYPE: &str = "node";

// ============================================================================
// File Locations
// ============================================================================

/// Project-local configuration file name.
pub const PROJECT_CONFIG_FILE: &str = "testscout.toml";

/// Directory under the user config dir holding `config.toml`.
pub const USER_CONFIG_DIR: &str = "testscout";

/// Version reported to callers on initialize.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
