//! Contracts of the external runner collaborator.
//!
//! Spawning the runner process, its wire protocol and its shutdown live
//! behind these traits; the server only drives them.

use std::net::{Ipv4Addr, TcpListener};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use super::event::RunnerEvent;
use crate::config::{DEBUG_LAUNCH_NAME, DEBUG_LAUNCH_TYPE};
use crate::planner::ExecutionPlan;

/// Errors reported by the runner collaborator.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to connect to runner: {0}")]
    Connection(String),

    #[error("Runner rejected initialization: {0}")]
    Initialize(String),

    #[error("Failed to terminate runner: {0}")]
    Terminate(String),

    #[error("No free port found starting at {start}")]
    NoFreePort { start: u16 },
}

/// Arguments forwarded to the test framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkArguments {
    pub opts_path: PathBuf,
}

/// First message sent to a connected runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerInitialize {
    /// Filter per test file; `None` runs the whole file
    pub per_file_plan: ExecutionPlan,
    pub framework_path: Option<PathBuf>,
    pub framework_arguments: FrameworkArguments,
}

/// Messages arriving from a connected runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerMessage {
    Update(RunnerEvent),
    Closed,
}

/// Control handle of a connected runner.
#[async_trait]
pub trait RunnerHandle: Send + Sync {
    /// Hands the plan to the runner and waits for its acknowledgement.
    async fn initialize(&self, request: RunnerInitialize) -> Result<(), RunnerError>;

    /// Stops the runner process. The event stream closes afterwards.
    async fn terminate(&self) -> Result<(), RunnerError>;
}

/// A live runner connection.
pub struct RunnerConnection {
    pub handle: Arc<dyn RunnerHandle>,
    pub events: mpsc::UnboundedReceiver<RunnerMessage>,
}

/// Starts runners.
#[async_trait]
pub trait RunnerConnector: Send + Sync {
    /// Picks the port the runner will listen on.
    fn negotiate_port(&self, preferred: u16) -> Result<u16, RunnerError> {
        find_available_port(preferred)
    }

    /// Launches a runner for `root` on `port`. `headless` is false when a
    /// debugger will attach.
    async fn connect(&self, root: &Path, port: u16, headless: bool) -> Result<RunnerConnection, RunnerError>;
}

/// Returns the first port at or above `start` that can be bound on localhost.
pub fn find_available_port(start: u16) -> Result<u16, RunnerError> {
    (start..=u16::MAX)
        .find(|port| TcpListener::bind((Ipv4Addr::LOCALHOST, *port)).is_ok())
        .ok_or(RunnerError::NoFreePort { start })
}

/// Launch configuration a debugger uses to start the runner itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugLaunchConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub request: String,
    pub stop_on_entry: bool,
    pub cwd: PathBuf,
    pub program: Option<PathBuf>,
    pub runtime_executable: Option<PathBuf>,
    pub args: Vec<String>,
}

impl DebugLaunchConfig {
    pub fn new(root: &Path, program: Option<PathBuf>, port: u16) -> Self {
        Self {
            name: DEBUG_LAUNCH_NAME.to_string(),
            kind: DEBUG_LAUNCH_TYPE.to_string(),
            request: "launch".to_string(),
            stop_on_entry: false,
            cwd: root.to_path_buf(),
            program,
            runtime_executable: None,
            args: vec![format!("--port={}", port)],
        }
    }
}
