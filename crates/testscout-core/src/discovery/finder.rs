//! Syntax-tree walk recovering `suite`/`describe`/`it`/`test` declarations.

use tree_sitter::{Node, Tree};

use super::grammar::{node_line, node_text};
use super::reconcile::PreviousGeneration;
use crate::case::{TestCase, TestCaseId, TestKind};

/// The enclosing declaration new nodes attach to.
#[derive(Debug, Clone)]
struct ParentScope {
    id: TestCaseId,
    full_title: String,
}

impl ParentScope {
    fn of(case: &TestCase) -> Self {
        Self {
            id: case.id,
            full_title: case.full_title.clone(),
        }
    }

    fn child_full_title(&self, title: &str) -> String {
        if self.full_title.is_empty() {
            title.to_string()
        } else {
            format!("{} {}", self.full_title, title)
        }
    }
}

/// Maps a resolved call target to the declaration it introduces.
///
/// `.skip` and `.only` modifiers declare the same node as the bare keyword.
pub fn declaration_kind(callee: &str) -> Option<TestKind> {
    let keyword = callee
        .strip_suffix(".skip")
        .or_else(|| callee.strip_suffix(".only"))
        .unwrap_or(callee);

    match keyword {
        "suite" => Some(TestKind::Suite),
        "describe" => Some(TestKind::Describe),
        "it" | "test" => Some(TestKind::Test),
        _ => None,
    }
}

/// Walks a parsed file and returns its nodes in pre-order, File root first.
///
/// Returns an empty list when the file declares nothing.
pub fn find_test_cases(path: &str, content: &str, tree: &Tree, previous: &[TestCase]) -> Vec<TestCase> {
    let mut generation = PreviousGeneration::new(previous);
    let mut root = TestCase::file_root(path);
    generation.fill(&mut root);

    let scope = ParentScope::of(&root);
    let mut found = vec![root];
    let walker = Walker { content, path };

    let program = tree.root_node();
    let mut cursor = program.walk();
    for statement in program.named_children(&mut cursor) {
        walker.visit(statement, &scope, &mut generation, &mut found);
    }

    if found.len() == 1 {
        return Vec::new();
    }
    found[0].has_children = true;
    found
}

struct Walker<'a> {
    content: &'a str,
    path: &'a str,
}

impl<'a> Walker<'a> {
    fn text(&self, node: &Node) -> &'a str {
        node_text(node, self.content)
    }

    fn visit(
        &self,
        node: Node,
        parent: &ParentScope,
        generation: &mut PreviousGeneration,
        found: &mut Vec<TestCase>,
    ) {
        match node.kind() {
            "expression_statement" => {
                if let Some(expression) = node.named_child(0) {
                    self.visit(expression, parent, generation, found);
                }
            }
            "call_expression" => self.visit_call(node, parent, generation, found),
            "arrow_function" | "function_expression" | "function" => {
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit(body, parent, generation, found);
                }
            }
            "statement_block" => {
                let mut cursor = node.walk();
                for statement in node.named_children(&mut cursor) {
                    self.visit(statement, parent, generation, found);
                }
            }
            // import_statement, lexical_declaration, variable_declaration,
            // function_declaration and everything else declare nothing.
            _ => {}
        }
    }

    fn visit_call(
        &self,
        node: Node,
        parent: &ParentScope,
        generation: &mut PreviousGeneration,
        found: &mut Vec<TestCase>,
    ) {
        let Some(callee) = node.child_by_field_name("function") else {
            return;
        };
        let arguments = call_arguments(&node);

        match self.callee_name(callee).as_deref().and_then(declaration_kind) {
            Some(kind) => self.declare(kind, callee, &arguments, parent, generation, found),
            None => {
                // Not a declaration, but callbacks such as `cases.forEach(c => it(c, ...))`
                // may still declare tests.
                for argument in arguments.into_iter().filter(is_function) {
                    self.visit(argument, parent, generation, found);
                }
            }
        }
    }

    fn declare(
        &self,
        kind: TestKind,
        callee: Node,
        arguments: &[Node],
        parent: &ParentScope,
        generation: &mut PreviousGeneration,
        found: &mut Vec<TestCase>,
    ) {
        let title = arguments
            .first()
            .and_then(|argument| self.title(*argument))
            .unwrap_or_default();
        let full_title = parent.child_full_title(&title);

        let mut case = TestCase::new(kind, title, full_title, self.path, node_line(&callee), Some(parent.id));
        generation.fill(&mut case);

        let index = found.len();
        let scope = ParentScope::of(&case);
        found.push(case);

        if kind.is_container() {
            if let Some(body) = arguments.get(1) {
                self.visit(*body, &scope, generation, found);
            }
            found[index].has_children = found.len() > index + 1;
        }
    }

    /// Resolves a call target to dotted text, e.g. `describe.skip`.
    fn callee_name(&self, node: Node) -> Option<String> {
        match node.kind() {
            "identifier" => Some(self.text(&node).to_string()),
            "member_expression" => {
                let object = node.child_by_field_name("object")?;
                let property = node.child_by_field_name("property")?;
                Some(format!("{}.{}", self.callee_name(object)?, self.text(&property)))
            }
            _ => None,
        }
    }

    /// Evaluates a title argument.
    ///
    /// Only string and template literals without substitutions, bare
    /// identifiers and `+` concatenations of those are understood.
    fn title(&self, node: Node) -> Option<String> {
        match node.kind() {
            "string" => Some(unescape(strip_delimiters(self.text(&node)))),
            "template_string" => {
                let mut cursor = node.walk();
                let has_substitution = node
                    .named_children(&mut cursor)
                    .any(|c| c.kind() == "template_substitution");
                if has_substitution {
                    None
                } else {
                    Some(unescape(strip_delimiters(self.text(&node))))
                }
            }
            "identifier" => Some(self.text(&node).to_string()),
            "binary_expression" => {
                let operator = node.child_by_field_name("operator")?;
                if operator.kind() != "+" {
                    return None;
                }
                let left = self.title(node.child_by_field_name("left")?)?;
                let right = self.title(node.child_by_field_name("right")?)?;
                Some(left + &right)
            }
            _ => None,
        }
    }
}

fn call_arguments<'t>(call: &Node<'t>) -> Vec<Node<'t>> {
    let Some(arguments) = call.child_by_field_name("arguments") else {
        return Vec::new();
    };
    if arguments.kind() != "arguments" {
        // Tagged template
        return Vec::new();
    }
    let mut cursor = arguments.walk();
    arguments
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

fn is_function(node: &Node) -> bool {
    matches!(node.kind(), "arrow_function" | "function_expression" | "function")
}

fn strip_delimiters(text: &str) -> &str {
    if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        ""
    }
}

/// Decodes JavaScript string escape sequences.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            // Line continuation
            Some('\n') => {}
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\x");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
