//! Selection/grouping of test cases into per-file runner filters.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::case::TestCase;

/// Per-file filter handed to the runner.
///
/// `None` means "run every test in the file".
pub type ExecutionPlan = BTreeMap<String, Option<String>>;

/// Filter selecting one node: its escaped full title, or `None` for a File root.
pub fn leaf_filter(case: &TestCase) -> Option<String> {
    if case.parent_id.is_none() {
        return None;
    }
    Some(regex::escape(&case.full_title))
}

/// Groups selected nodes by path and combines their filters.
///
/// Filters of one file are joined with `|` in selection order. Selecting a
/// File root anywhere collapses that file to run-all.
pub fn plan(selected: &[TestCase]) -> ExecutionPlan {
    let mut plan = ExecutionPlan::new();

    for case in selected {
        let filter = leaf_filter(case);
        match plan.entry(case.path.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(filter);
            }
            Entry::Occupied(mut slot) => {
                let combined = match (slot.get().as_deref(), filter) {
                    (Some(existing), Some(filter)) => Some(format!("{}|{}", existing, filter)),
                    _ => None,
                };
                slot.insert(combined);
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::TestKind;

    fn leaf(path: &str, full_title: &str, parent: &TestCase) -> TestCase {
        TestCase::new(TestKind::Test, "t", full_title, path, 1, Some(parent.id))
    }

    #[test]
    fn test_escapes_metacharacters() {
        let root = TestCase::file_root("/a.js");
        let case = leaf("/a.js", "math adds (1+1)", &root);
        assert_eq!(leaf_filter(&case).unwrap(), r"math adds \(1\+1\)");
    }

    #[test]
    fn test_alternation_in_encounter_order() {
        let root = TestCase::file_root("/a.js");
        let plan = plan(&[leaf("/a.js", "b", &root), leaf("/a.js", "a", &root)]);
        assert_eq!(plan.get("/a.js"), Some(&Some("b|a".to_string())));
    }

    #[test]
    fn test_whole_file_wins_in_either_order() {
        let root = TestCase::file_root("/a.js");
        let test = leaf("/a.js", "outer works", &root);

        let after = plan(&[test.clone(), root.clone()]);
        assert_eq!(after.get("/a.js"), Some(&None));

        let before = plan(&[root.clone(), test]);
        assert_eq!(before.get("/a.js"), Some(&None));
    }

    #[test]
    fn test_groups_by_file() {
        let root_a = TestCase::file_root("/a.js");
        let root_b = TestCase::file_root("/b.js");
        let plan = plan(&[leaf("/a.js", "x", &root_a), root_b, leaf("/a.js", "y", &root_a)]);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan["/a.js"], Some("x|y".to_string()));
        assert_eq!(plan["/b.js"], None);
    }

    #[test]
    fn test_empty_selection() {
        assert!(plan(&[]).is_empty());
    }
}
