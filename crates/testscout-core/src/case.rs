use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a discovered test case.
///
/// Minted the first time a declaration is seen and carried over on every
/// later discovery pass that finds the same full title in the same file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestCaseId(Uuid);

impl TestCaseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TestCaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TestCaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for TestCaseId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Kind of node in the discovered hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestKind {
    /// Synthetic root, one per source file
    File,
    /// `suite(...)` container
    Suite,
    /// `describe(...)` container
    Describe,
    /// `it(...)` or `test(...)` leaf
    Test,
}

impl TestKind {
    /// Returns true for the kinds that can hold nested declarations.
    pub fn is_container(&self) -> bool {
        !matches!(self, TestKind::Test)
    }

    /// Returns a human-readable name for the kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            TestKind::File => "File",
            TestKind::Suite => "Suite",
            TestKind::Describe => "Describe",
            TestKind::Test => "Test",
        }
    }
}

/// Outcome of the latest run that touched a test case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    #[default]
    NotRun,
    Passed,
    Failed,
    Skipped,
}

impl TestStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            TestStatus::NotRun => "Not run",
            TestStatus::Passed => "Passed",
            TestStatus::Failed => "Failed",
            TestStatus::Skipped => "Skipped",
        }
    }
}

/// One node of the discovered test hierarchy plus its latest run outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: TestCaseId,
    pub kind: TestKind,
    /// Declared name (file basename for File nodes)
    pub title: String,
    /// Ancestor titles and own title joined by single spaces
    pub full_title: String,
    /// Normalized absolute path of the declaring file
    pub path: String,
    /// Zero-based line of the declaring keyword
    pub line: u32,
    /// Owning node; `None` only for File roots
    pub parent_id: Option<TestCaseId>,
    pub is_test_case: bool,
    pub has_children: bool,
    /// `title` followed by `path`
    pub identity_key: String,

    pub status: TestStatus,
    pub is_running: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Elapsed milliseconds, never negative
    pub duration: Option<i64>,
    pub error_message: Option<String>,
    pub error_stack_trace: Option<String>,
    pub session_id: Option<u64>,
}

impl TestCase {
    /// Creates a freshly discovered node with no run history.
    pub fn new(
        kind: TestKind,
        title: impl Into<String>,
        full_title: impl Into<String>,
        path: impl Into<String>,
        line: u32,
        parent_id: Option<TestCaseId>,
    ) -> Self {
        let title = title.into();
        let path = path.into();
        let identity_key = format!("{}{}", title, path);

        Self {
            id: TestCaseId::new(),
            kind,
            title,
            full_title: full_title.into(),
            path,
            line,
            parent_id,
            is_test_case: kind == TestKind::Test,
            has_children: false,
            identity_key,
            status: TestStatus::NotRun,
            is_running: false,
            start_time: None,
            end_time: None,
            duration: None,
            error_message: None,
            error_stack_trace: None,
            session_id: None,
        }
    }

    /// Creates the synthetic File root for a normalized path.
    pub fn file_root(path: impl Into<String>) -> Self {
        let path = path.into();
        let title = path.rsplit('/').next().unwrap_or(path.as_str()).to_string();
        Self::new(TestKind::File, title, "", path, 0, None)
    }

    /// Returns true if this node is the File root of its path.
    pub fn is_file_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Carries identity and run history over from the previous generation.
    pub fn inherit_from(&mut self, previous: &TestCase) {
        self.id = previous.id;
        self.status = previous.status;
        self.start_time = previous.start_time;
        self.end_time = previous.end_time;
        self.duration = previous.duration;
        self.error_message = previous.error_message.clone();
        self.error_stack_trace = previous.error_stack_trace.clone();
        self.session_id = previous.session_id;
    }

    /// Copies every run field of `source`, used when a container failure
    /// invalidates its subtree.
    pub fn copy_run_fields(&mut self, source: &TestCase) {
        self.status = source.status;
        self.is_running = source.is_running;
        self.start_time = source.start_time;
        self.end_time = source.end_time;
        self.duration = source.duration;
        self.error_message = source.error_message.clone();
        self.error_stack_trace = source.error_stack_trace.clone();
        self.session_id = source.session_id;
    }

    /// Stamps the end time and derives the duration from the start time.
    pub fn stamp_end(&mut self, now: DateTime<Utc>) {
        self.end_time = Some(now);
        self.duration = self
            .start_time
            .map(|start| (now - start).num_milliseconds().max(0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_file_root_uses_basename() {
        let root = TestCase::file_root("/work/src/math.test.js");
        assert_eq!(root.kind, TestKind::File);
        assert_eq!(root.title, "math.test.js");
        assert_eq!(root.full_title, "");
        assert!(root.is_file_root());
        assert!(!root.is_test_case);
        assert_eq!(root.identity_key, "math.test.js/work/src/math.test.js");
    }

    #[test]
    fn test_only_leaves_are_test_cases() {
        let leaf = TestCase::new(TestKind::Test, "works", "outer works", "/a.js", 3, None);
        let container = TestCase::new(TestKind::Describe, "outer", "outer", "/a.js", 1, None);
        assert!(leaf.is_test_case);
        assert!(!container.is_test_case);
        assert!(container.kind.is_container());
    }

    #[test]
    fn test_stamp_end_clamps_negative_duration() {
        let now = Utc::now();
        let mut case = TestCase::new(TestKind::Test, "t", "t", "/a.js", 0, None);
        case.start_time = Some(now + Duration::milliseconds(50));
        case.stamp_end(now);
        assert_eq!(case.duration, Some(0));

        case.start_time = Some(now - Duration::milliseconds(120));
        case.stamp_end(now);
        assert_eq!(case.duration, Some(120));
    }

    #[test]
    fn test_stamp_end_without_start_leaves_duration_unset() {
        let mut case = TestCase::new(TestKind::Test, "t", "t", "/a.js", 0, None);
        case.stamp_end(Utc::now());
        assert!(case.end_time.is_some());
        assert_eq!(case.duration, None);
    }

    #[test]
    fn test_ids_are_unique_and_parse() {
        let a = TestCaseId::new();
        let b = TestCaseId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().parse::<TestCaseId>().unwrap(), a);
    }
}
