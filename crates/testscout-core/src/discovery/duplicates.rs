//! Detection of declarations sharing a full title within one file.
//!
//! Runner events and selection filters address nodes by path and full title,
//! so two declarations with the same full title cannot be told apart.

use std::collections::HashMap;

use serde::Serialize;

use crate::case::TestCase;

/// Where a declaration lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub path: String,
    pub line: u32,
}

/// A full title declared more than once in the same file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateTitle {
    pub full_title: String,
    pub occurrences: Vec<SourceLocation>,
}

impl DuplicateTitle {
    /// One line per occurrence, suitable for operator output.
    pub fn report_lines(&self) -> Vec<String> {
        self.occurrences
            .iter()
            .map(|at| format!("Duplicated test {} - Source {}:{}", self.full_title, at.path, at.line))
            .collect()
    }
}

/// Groups nodes by path and full title and returns every group with more
/// than one member, in first-seen order.
pub fn find_duplicates(cases: &[TestCase]) -> Vec<DuplicateTitle> {
    let mut groups: Vec<DuplicateTitle> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for case in cases {
        let location = SourceLocation {
            path: case.path.clone(),
            line: case.line,
        };
        match index.get(&(case.path.as_str(), case.full_title.as_str())) {
            Some(&at) => groups[at].occurrences.push(location),
            None => {
                index.insert((case.path.as_str(), case.full_title.as_str()), groups.len());
                groups.push(DuplicateTitle {
                    full_title: case.full_title.clone(),
                    occurrences: vec![location],
                });
            }
        }
    }

    groups.retain(|group| group.occurrences.len() > 1);
    groups
}

/// Logs every occurrence of every duplicate.
pub fn log_duplicates(duplicates: &[DuplicateTitle]) {
    for duplicate in duplicates {
        for line in duplicate.report_lines() {
            tracing::warn!("{}", line);
        }
    }
}
