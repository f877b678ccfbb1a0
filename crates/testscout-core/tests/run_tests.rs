use std::path::Path;

use chrono::{Duration, Utc};
use testscout_core::{Discoverer, EventKind, RunStateMachine, RunnerEvent, TestCaseStore, TestStatus};

const PATH: &str = "/work/src/login.test.js";

const LOGIN: &str = r#"
describe('login', () => {
  before(() => connect());

  describe('with password', () => {
    it('accepts valid', () => {});
    describe('when locked', () => {
      it('rejects', () => {});
    });
  });

  it('logs out', () => {});
});
"#;

fn store() -> TestCaseStore {
    let cases = Discoverer::new()
        .discover_source(Path::new(PATH), LOGIN, &[])
        .unwrap();
    TestCaseStore::from_cases(cases)
}

fn event(kind: EventKind, full_title: &str) -> RunnerEvent {
    RunnerEvent::new(kind, full_title, PATH)
}

fn status_of(store: &TestCaseStore, full_title: &str) -> TestStatus {
    store
        .all()
        .iter()
        .find(|c| c.full_title == full_title)
        .map(|c| c.status)
        .unwrap()
}

#[test]
fn test_hook_failure_cascades_through_nested_containers() {
    let mut cases = store();
    let mut machine = RunStateMachine::new(5);

    let transition = machine
        .apply(
            &mut cases,
            &event(EventKind::HookFail, "login with password").with_error("db down", "at connect"),
        )
        .unwrap();

    let cascaded: Vec<&str> = transition.cascaded.iter().map(|c| c.full_title.as_str()).collect();
    assert_eq!(
        cascaded,
        vec![
            "login with password accepts valid",
            "login with password when locked",
            "login with password when locked rejects",
        ]
    );
    for title in &cascaded {
        assert_eq!(status_of(&cases, title), TestStatus::Failed);
    }
    assert_eq!(status_of(&cases, "login logs out"), TestStatus::NotRun);
    assert_eq!(machine.session().failures, 1);
}

#[test]
fn test_full_run_sequence() {
    let mut cases = store();
    let mut machine = RunStateMachine::new(1);
    let t0 = Utc::now();
    let at = |ms: i64| t0 + Duration::milliseconds(ms);

    let script = [
        (EventKind::Start, "", 0),
        (EventKind::SuiteStart, "login", 1),
        (EventKind::SuiteStart, "login with password", 2),
        (EventKind::TestStart, "login with password accepts valid", 3),
        (EventKind::TestPass, "login with password accepts valid", 13),
        (EventKind::SuiteStart, "login with password when locked", 14),
        (EventKind::TestStart, "login with password when locked rejects", 15),
        (EventKind::TestPending, "login with password when locked rejects", 15),
        (EventKind::SuiteEnd, "login with password when locked", 16),
        (EventKind::SuiteEnd, "login with password", 17),
        (EventKind::TestStart, "login logs out", 18),
        (EventKind::TestPass, "login logs out", 20),
        (EventKind::SuiteEnd, "login", 21),
        (EventKind::End, "", 22),
    ];
    for (kind, title, ms) in script {
        assert!(machine.apply_at(&mut cases, &event(kind, title), at(ms)).is_some());
    }

    let accepted = cases
        .all()
        .iter()
        .find(|c| c.full_title == "login with password accepts valid")
        .unwrap();
    assert_eq!(accepted.status, TestStatus::Passed);
    assert_eq!(accepted.duration, Some(10));

    assert_eq!(status_of(&cases, "login with password when locked rejects"), TestStatus::Skipped);
    // Containers take the status of the whole run so far
    assert_eq!(status_of(&cases, "login with password when locked"), TestStatus::Skipped);
    assert_eq!(status_of(&cases, "login"), TestStatus::Skipped);
    assert_eq!(status_of(&cases, ""), TestStatus::Skipped);

    let session = machine.session();
    assert_eq!((session.successes, session.failures, session.skipped), (2, 0, 1));
    assert!(RunStateMachine::cancel_running(&mut cases).is_empty());
}

#[test]
fn test_events_for_other_files_are_ignored() {
    let mut cases = store();
    let mut machine = RunStateMachine::new(1);
    let foreign = RunnerEvent::new(EventKind::TestPass, "login logs out", "/work/src/other.test.js");

    assert!(machine.apply(&mut cases, &foreign).is_none());
    assert_eq!(status_of(&cases, "login logs out"), TestStatus::NotRun);
}

#[test]
fn test_runner_events_from_json() {
    let line = r#"{"type":"testFail","fullTitle":"login logs out","path":"/work/src/login.test.js","err":{"message":"boom","stack":"at logout"}}"#;
    let parsed: RunnerEvent = serde_json::from_str(line).unwrap();

    let mut cases = store();
    let mut machine = RunStateMachine::new(8);
    let updated = machine.apply(&mut cases, &parsed).unwrap().updated;
    assert_eq!(updated.status, TestStatus::Failed);
    assert_eq!(updated.error_message.as_deref(), Some("boom"));
    assert_eq!(updated.session_id, Some(8));
}
