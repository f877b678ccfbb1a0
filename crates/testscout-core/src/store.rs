use std::collections::{HashMap, HashSet};

use crate::case::{TestCase, TestCaseId};
use crate::paths::normalize_path;

/// The current generation of discovered test cases across all files.
///
/// Nodes of one file are replaced as a unit on re-discovery.
#[derive(Debug, Clone, Default)]
pub struct TestCaseStore {
    cases: Vec<TestCase>,
}

impl TestCaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cases(cases: Vec<TestCase>) -> Self {
        Self { cases }
    }

    pub fn all(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn get(&self, id: TestCaseId) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.id == id)
    }

    /// Removes and returns every node of `path`.
    pub fn take_path(&mut self, path: &str) -> Vec<TestCase> {
        let (taken, kept): (Vec<TestCase>, Vec<TestCase>) = std::mem::take(&mut self.cases)
            .into_iter()
            .partition(|c| c.path == path);
        self.cases = kept;
        taken
    }

    /// Removes every node of `path`, returning how many were removed.
    pub fn remove_path(&mut self, path: &str) -> usize {
        let before = self.cases.len();
        self.cases.retain(|c| c.path != path);
        before - self.cases.len()
    }

    /// Drops every node whose path is not in `paths`.
    pub fn retain_paths(&mut self, paths: &HashSet<String>) {
        self.cases.retain(|c| paths.contains(&c.path));
    }

    /// Appends a freshly discovered file generation.
    pub fn extend(&mut self, cases: impl IntoIterator<Item = TestCase>) {
        self.cases.extend(cases);
    }

    /// Returns clones of the nodes with the given ids, in the order requested.
    pub fn select(&self, ids: &[TestCaseId]) -> Vec<TestCase> {
        ids.iter().filter_map(|id| self.get(*id).cloned()).collect()
    }

    /// Finds the node a runner event addresses.
    ///
    /// If several nodes share the title the first one wins and the ambiguity
    /// is logged.
    pub fn position_by_title(&self, full_title: &str, path: &str) -> Option<usize> {
        let path = normalize_path(path);
        let mut matches = self
            .cases
            .iter()
            .enumerate()
            .filter(|(_, c)| c.full_title == full_title && c.path == path)
            .map(|(i, _)| i);

        let first = matches.next()?;
        if matches.next().is_some() {
            tracing::warn!(full_title, path = %path, "runner event matches several test cases, using the first");
        }
        Some(first)
    }

    pub fn get_index(&self, index: usize) -> Option<&TestCase> {
        self.cases.get(index)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut TestCase> {
        self.cases.get_mut(index)
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, TestCase> {
        self.cases.iter_mut()
    }

    /// Maps each parent id to the positions of its direct children.
    pub fn children_index(&self) -> HashMap<TestCaseId, Vec<usize>> {
        let mut index: HashMap<TestCaseId, Vec<usize>> = HashMap::new();
        for (position, case) in self.cases.iter().enumerate() {
            if let Some(parent) = case.parent_id {
                index.entry(parent).or_default().push(position);
            }
        }
        index
    }
}
