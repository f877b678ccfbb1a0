use serde::{Deserialize, Serialize};

/// Lifecycle event kinds emitted by the external runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// The run began
    Start,
    SuiteStart,
    TestStart,
    TestPass,
    TestFail,
    TestPending,
    /// A container-level failure outside any hook
    Failure,
    /// A setup/teardown hook failed
    HookFail,
    SuiteEnd,
    /// The run completed
    End,
    /// Anything this version does not understand
    #[serde(other)]
    Unknown,
}

/// Error details attached to failure events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerFailure {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stack: Option<String>,
}

/// One lifecycle event, addressed to a node by full title and path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub full_title: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<RunnerFailure>,
}

impl RunnerEvent {
    pub fn new(kind: EventKind, full_title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind,
            full_title: full_title.into(),
            path: path.into(),
            err: None,
        }
    }

    /// Attaches failure details.
    pub fn with_error(mut self, message: impl Into<String>, stack: impl Into<String>) -> Self {
        self.err = Some(RunnerFailure {
            message: Some(message.into()),
            stack: Some(stack.into()),
        });
        self
    }

    pub fn error_message(&self) -> Option<String> {
        self.err.as_ref().and_then(|e| e.message.clone())
    }

    pub fn error_stack(&self) -> Option<String> {
        self.err.as_ref().and_then(|e| e.stack.clone())
    }
}
