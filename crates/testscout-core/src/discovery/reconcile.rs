//! Identity preservation across discovery passes.

use std::collections::{HashMap, VecDeque};

use crate::case::TestCase;

/// The previous generation of one file's nodes, indexed by full title.
///
/// Each previous node can be claimed once; nodes sharing a full title are
/// handed out in their original order.
#[derive(Debug, Default)]
pub struct PreviousGeneration<'a> {
    by_title: HashMap<&'a str, VecDeque<&'a TestCase>>,
}

impl<'a> PreviousGeneration<'a> {
    pub fn new(previous: &'a [TestCase]) -> Self {
        let mut by_title: HashMap<&'a str, VecDeque<&'a TestCase>> = HashMap::new();
        for case in previous {
            by_title.entry(case.full_title.as_str()).or_default().push_back(case);
        }
        Self { by_title }
    }

    /// Takes the next unclaimed previous node with this full title.
    pub fn claim(&mut self, full_title: &str) -> Option<&'a TestCase> {
        self.by_title.get_mut(full_title).and_then(VecDeque::pop_front)
    }

    /// Carries over id and run history if a previous node matches.
    ///
    /// Returns true when a match was found.
    pub fn fill(&mut self, case: &mut TestCase) -> bool {
        match self.claim(&case.full_title) {
            Some(previous) => {
                case.inherit_from(previous);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{TestKind, TestStatus};

    fn passed(full_title: &str) -> TestCase {
        let mut case = TestCase::new(TestKind::Test, "t", full_title, "/a.js", 1, None);
        case.status = TestStatus::Passed;
        case.duration = Some(7);
        case.session_id = Some(3);
        case
    }

    #[test]
    fn test_fill_copies_identity_and_results() {
        let previous = vec![passed("outer works")];
        let mut generation = PreviousGeneration::new(&previous);

        let mut fresh = TestCase::new(TestKind::Test, "works", "outer works", "/a.js", 4, None);
        assert!(generation.fill(&mut fresh));
        assert_eq!(fresh.id, previous[0].id);
        assert_eq!(fresh.status, TestStatus::Passed);
        assert_eq!(fresh.duration, Some(7));
        assert_eq!(fresh.session_id, Some(3));
        assert_eq!(fresh.line, 4);
    }

    #[test]
    fn test_duplicate_titles_are_claimed_once_each() {
        let previous = vec![passed("a b"), passed("a b")];
        let mut generation = PreviousGeneration::new(&previous);

        assert_eq!(generation.claim("a b").map(|c| c.id), Some(previous[0].id));
        assert_eq!(generation.claim("a b").map(|c| c.id), Some(previous[1].id));
        assert!(generation.claim("a b").is_none());
    }

    #[test]
    fn test_unmatched_node_stays_fresh() {
        let previous = vec![passed("outer works")];
        let mut generation = PreviousGeneration::new(&previous);

        let mut fresh = TestCase::new(TestKind::Test, "renamed", "outer renamed", "/a.js", 4, None);
        let id = fresh.id;
        assert!(!generation.fill(&mut fresh));
        assert_eq!(fresh.id, id);
        assert_eq!(fresh.status, TestStatus::NotRun);
    }
}
