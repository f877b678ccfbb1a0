//! Tree-sitter grammars for test sources, keyed by file extension.

use std::collections::HashMap;
use std::path::Path;

use tree_sitter::{Language, Node, Parser as TSParser, Tree};

/// A tree-sitter grammar together with the extensions it handles.
#[derive(Clone)]
pub struct Grammar {
    language: Language,
    language_name: &'static str,
    extensions: &'static [&'static str],
}

impl Grammar {
    pub fn new(language: Language, language_name: &'static str, extensions: &'static [&'static str]) -> Self {
        Self { language, language_name, extensions }
    }

    /// JavaScript, including JSX.
    pub fn javascript() -> Self {
        Self::new(
            tree_sitter_javascript::LANGUAGE.into(),
            "JavaScript",
            &["js", "jsx", "mjs", "cjs"],
        )
    }

    /// TypeScript without JSX.
    pub fn typescript() -> Self {
        Self::new(
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            "TypeScript",
            &["ts", "mts", "cts"],
        )
    }

    /// TypeScript with JSX.
    pub fn tsx() -> Self {
        Self::new(tree_sitter_typescript::LANGUAGE_TSX.into(), "TSX", &["tsx"])
    }

    pub fn language_name(&self) -> &'static str {
        self.language_name
    }

    pub fn supported_extensions(&self) -> &[&'static str] {
        self.extensions
    }

    /// Parse source code into a tree-sitter tree.
    pub fn parse_tree(&self, content: &str) -> Result<Tree, String> {
        let mut parser = TSParser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| format!("Failed to set language: {}", e))?;

        parser
            .parse(content, None)
            .ok_or_else(|| "Failed to parse content".to_string())
    }
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("language_name", &self.language_name)
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// Get text for a node from source content.
pub fn node_text<'a>(node: &Node, content: &'a str) -> &'a str {
    &content[node.byte_range()]
}

/// Get the zero-based line of a node.
pub fn node_line(node: &Node) -> u32 {
    node.start_position().row as u32
}

/// Registry of grammars.
///
/// Maps file extensions to grammars. Paths with an unknown extension are
/// parsed as JavaScript.
#[derive(Debug, Clone)]
pub struct GrammarRegistry {
    grammars: HashMap<String, Grammar>,
    fallback: Grammar,
}

impl GrammarRegistry {
    /// Create a new registry with all built-in grammars.
    pub fn new() -> Self {
        let mut registry = Self {
            grammars: HashMap::new(),
            fallback: Grammar::javascript(),
        };

        registry.register(Grammar::javascript());
        registry.register(Grammar::typescript());
        registry.register(Grammar::tsx());

        registry
    }

    /// Register a grammar for its supported extensions.
    pub fn register(&mut self, grammar: Grammar) {
        for ext in grammar.supported_extensions() {
            self.grammars.insert(ext.to_lowercase(), grammar.clone());
        }
    }

    /// Get a grammar for the given file extension.
    pub fn grammar_for_extension(&self, extension: &str) -> Option<&Grammar> {
        self.grammars.get(&extension.to_lowercase())
    }

    /// Get the grammar for a file path, falling back to JavaScript.
    pub fn grammar_for_path(&self, path: &Path) -> &Grammar {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| self.grammar_for_extension(ext))
            .unwrap_or(&self.fallback)
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}
