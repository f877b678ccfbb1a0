//! Discovery error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering tests.
///
/// All of them are scoped to a single file or directory; a batch skips the
/// failing file and continues.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Source file could not be read.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No syntax tree could be built for the file.
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    /// Test files could not be enumerated.
    #[error("Failed to enumerate test files under {}: {message}", root.display())]
    Enumeration { root: PathBuf, message: String },
}

impl DiscoveryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DiscoveryError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        DiscoveryError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}
