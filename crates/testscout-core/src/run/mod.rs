//! Test run tracking.
//!
//! The external runner reports lifecycle events (`start`, `suiteStart`,
//! `testPass`, `hookFail`, `suiteEnd`, ...) addressed by full title and path.
//! [`RunStateMachine`] resolves each event to a discovered [`TestCase`],
//! updates its status and timing, cascades container failures to the
//! subtree and keeps the [`RunSession`] counters.
//!
//! [`TestCase`]: crate::case::TestCase

mod event;
mod machine;
mod runner;
mod session;

pub use event::{EventKind, RunnerEvent, RunnerFailure};
pub use machine::{RunStateMachine, Transition};
pub use runner::{
    find_available_port, DebugLaunchConfig, FrameworkArguments, RunnerConnection, RunnerConnector,
    RunnerError, RunnerHandle, RunnerInitialize, RunnerMessage,
};
pub use session::RunSession;
