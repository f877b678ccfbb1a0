use serde::{Deserialize, Serialize};

use crate::case::TestStatus;

/// Aggregate counters of the run in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSession {
    /// Caller-supplied id of the run
    pub session_id: u64,
    pub successes: u32,
    pub failures: u32,
    pub skipped: u32,
}

impl RunSession {
    pub fn new(session_id: u64) -> Self {
        Self {
            session_id,
            ..Default::default()
        }
    }

    /// Zeroes the counters, keeping the session id.
    pub fn reset(&mut self) {
        *self = Self::new(self.session_id);
    }

    pub fn record_success(&mut self) {
        self.successes += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Status a closing container takes from the whole run so far.
    pub fn aggregate_status(&self) -> TestStatus {
        if self.failures > 0 {
            TestStatus::Failed
        } else if self.skipped > 0 {
            TestStatus::Skipped
        } else {
            TestStatus::Passed
        }
    }
}
