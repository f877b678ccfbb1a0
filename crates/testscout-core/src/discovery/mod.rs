//! Static discovery of BDD-style test declarations.
//!
//! Source files are parsed with tree-sitter and walked without executing
//! anything. Every `suite`, `describe`, `it` and `test` call (optionally
//! suffixed with `.skip` or `.only`) becomes a [`TestCase`] under a synthetic
//! File root.
//!
//! ## Components
//!
//! - [`GrammarRegistry`] - Maps file extensions to tree-sitter grammars
//! - `finder` - The syntax-tree walk
//! - [`PreviousGeneration`] - Carries ids and results over from the last pass
//! - [`find_duplicates`] - Reports full titles declared twice in one file
//!
//! # Example
//!
//! ```ignore
//! use testscout_core::discovery::Discoverer;
//!
//! let discoverer = Discoverer::new();
//! let first = discoverer.discover(path, &[])?;
//! // After an edit, ids and results survive for unchanged declarations.
//! let second = discoverer.discover(path, &first)?;
//! ```

mod duplicates;
mod error;
mod finder;
mod grammar;
mod reconcile;

pub use duplicates::{find_duplicates, log_duplicates, DuplicateTitle, SourceLocation};
pub use error::DiscoveryError;
pub use finder::declaration_kind;
pub use grammar::{Grammar, GrammarRegistry};
pub use reconcile::PreviousGeneration;

use std::path::Path;

use crate::case::TestCase;
use crate::paths::normalize_path;

/// Discovers the test hierarchy of single files.
///
/// Holds no state between calls, so one instance can serve any number of
/// files, in parallel if the caller wishes.
#[derive(Debug, Clone, Default)]
pub struct Discoverer {
    registry: GrammarRegistry,
}

impl Discoverer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: GrammarRegistry) -> Self {
        Self { registry }
    }

    /// Reads and discovers one file.
    ///
    /// `previous` is the last generation of nodes for the same path; matching
    /// full titles keep their id and run results.
    pub fn discover(&self, path: &Path, previous: &[TestCase]) -> Result<Vec<TestCase>, DiscoveryError> {
        // Invalid UTF-8 is replaced, not rejected
        let bytes = std::fs::read(path).map_err(|e| DiscoveryError::io(path, e))?;
        let content = String::from_utf8_lossy(&bytes);
        self.discover_source(path, &content, previous)
    }

    /// Discovers already-loaded source text attributed to `path`.
    pub fn discover_source(
        &self,
        path: &Path,
        content: &str,
        previous: &[TestCase],
    ) -> Result<Vec<TestCase>, DiscoveryError> {
        let normalized = normalize_path(path);
        let grammar = self.registry.grammar_for_path(path);
        let tree = grammar
            .parse_tree(content)
            .map_err(|message| DiscoveryError::parse(&normalized, message))?;

        if tree.root_node().has_error() {
            tracing::warn!(path = %normalized, language = grammar.language_name(), "syntax errors in test file, discovering what parsed");
        }

        let cases = finder::find_test_cases(&normalized, content, &tree, previous);
        tracing::debug!(path = %normalized, found = cases.len(), "discovered test file");
        Ok(cases)
    }
}

/// Discovers one file with the built-in grammars.
pub fn discover(path: &Path, previous: &[TestCase]) -> Result<Vec<TestCase>, DiscoveryError> {
    Discoverer::new().discover(path, previous)
}
