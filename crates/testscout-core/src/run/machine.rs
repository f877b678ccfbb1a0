//! Applies runner lifecycle events to the discovered test cases.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::event::{EventKind, RunnerEvent};
use super::session::RunSession;
use crate::case::{TestCase, TestCaseId, TestStatus};
use crate::store::TestCaseStore;

/// Nodes changed by one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// The node the event addressed, after the update
    pub updated: TestCase,
    /// Descendants that inherited a container failure, in depth-first order
    pub cascaded: Vec<TestCase>,
}

impl Transition {
    /// Every changed node, addressed node first.
    pub fn into_updates(self) -> Vec<TestCase> {
        let mut updates = Vec::with_capacity(1 + self.cascaded.len());
        updates.push(self.updated);
        updates.extend(self.cascaded);
        updates
    }
}

/// State machine for one run.
///
/// Events must be applied one at a time, in the order the runner emitted
/// them: container status and failure cascading depend on what came before.
#[derive(Debug, Clone)]
pub struct RunStateMachine {
    session: RunSession,
}

impl RunStateMachine {
    pub fn new(session_id: u64) -> Self {
        Self {
            session: RunSession::new(session_id),
        }
    }

    pub fn session(&self) -> &RunSession {
        &self.session
    }

    /// Applies an event stamped with the current time.
    pub fn apply(&mut self, cases: &mut TestCaseStore, event: &RunnerEvent) -> Option<Transition> {
        self.apply_at(cases, event, Utc::now())
    }

    /// Applies an event at a given instant.
    ///
    /// Returns `None` if the event kind is unknown or no node matches.
    pub fn apply_at(
        &mut self,
        cases: &mut TestCaseStore,
        event: &RunnerEvent,
        now: DateTime<Utc>,
    ) -> Option<Transition> {
        match event.kind {
            EventKind::Unknown => {
                tracing::debug!(full_title = %event.full_title, "ignoring unknown runner event");
                return None;
            }
            EventKind::Start => self.session.reset(),
            _ => {}
        }

        let Some(index) = cases.position_by_title(&event.full_title, &event.path) else {
            tracing::warn!(
                kind = ?event.kind,
                full_title = %event.full_title,
                path = %event.path,
                "runner event does not match any discovered test case"
            );
            return None;
        };

        let session_id = self.session.session_id;
        let case = cases.get_index_mut(index)?;

        match event.kind {
            EventKind::Start | EventKind::SuiteStart | EventKind::TestStart => {
                // Timing left over from an earlier session no longer applies
                case.start_time = Some(now);
                case.end_time = None;
                case.duration = None;
                case.is_running = true;
            }
            EventKind::TestPass => {
                self.session.record_success();
                case.is_running = false;
                case.status = TestStatus::Passed;
                case.session_id = Some(session_id);
                case.stamp_end(now);
            }
            EventKind::TestFail => {
                self.session.record_failure();
                fail(case, event, session_id, now);
            }
            EventKind::TestPending => {
                self.session.record_skip();
                case.is_running = false;
                case.status = TestStatus::Skipped;
                case.session_id = Some(session_id);
                case.duration = Some(0);
            }
            EventKind::Failure | EventKind::HookFail => {
                self.session.record_failure();
                fail(case, event, session_id, now);
                let updated = case.clone();
                let cascaded = cascade(cases, &updated);
                return Some(Transition { updated, cascaded });
            }
            EventKind::SuiteEnd | EventKind::End => {
                case.is_running = false;
                case.session_id = Some(session_id);
                case.end_time = Some(now);
                case.status = self.session.aggregate_status();
            }
            EventKind::Unknown => return None,
        }

        Some(Transition {
            updated: case.clone(),
            cascaded: Vec::new(),
        })
    }

    /// Clears `is_running` on every node after the runner went away.
    ///
    /// Returns the nodes that changed.
    pub fn cancel_running(cases: &mut TestCaseStore) -> Vec<TestCase> {
        cases
            .iter_mut()
            .filter(|case| case.is_running)
            .map(|case| {
                case.is_running = false;
                case.clone()
            })
            .collect()
    }
}

fn fail(case: &mut TestCase, event: &RunnerEvent, session_id: u64, now: DateTime<Utc>) {
    case.is_running = false;
    case.status = TestStatus::Failed;
    case.error_message = event.error_message();
    case.error_stack_trace = event.error_stack();
    case.session_id = Some(session_id);
    case.stamp_end(now);
}

/// Copies the run fields of `source` onto its whole subtree.
fn cascade(cases: &mut TestCaseStore, source: &TestCase) -> Vec<TestCase> {
    let children = cases.children_index();
    let mut updated = Vec::new();
    propagate(cases, &children, source.id, source, &mut updated);
    updated
}

fn propagate(
    cases: &mut TestCaseStore,
    children: &HashMap<TestCaseId, Vec<usize>>,
    parent: TestCaseId,
    source: &TestCase,
    updated: &mut Vec<TestCase>,
) {
    let Some(positions) = children.get(&parent) else {
        return;
    };
    for &position in positions {
        let Some(child) = cases.get_index_mut(position) else {
            continue;
        };
        child.copy_run_fields(source);
        let child_id = child.id;
        updated.push(child.clone());
        propagate(cases, children, child_id, source, updated);
    }
}
