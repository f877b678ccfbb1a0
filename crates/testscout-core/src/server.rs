//! The operations exposed to a test-explorer client.
//!
//! [`TestServer`] owns the current generation of test cases, drives
//! discovery over files and directories and runs selected tests through a
//! [`RunnerConnector`]. Every change a client should render is pushed on the
//! notification channel as it happens.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::case::{TestCase, TestCaseId};
use crate::config::{Config, SERVER_VERSION};
use crate::discovery::{find_duplicates, log_duplicates, Discoverer, DiscoveryError, DuplicateTitle};
use crate::files::list_test_files;
use crate::paths::normalize_path;
use crate::planner;
use crate::run::{
    DebugLaunchConfig, FrameworkArguments, RunSession, RunStateMachine, RunnerConnection, RunnerConnector,
    RunnerError, RunnerHandle, RunnerInitialize, RunnerMessage,
};
use crate::store::TestCaseStore;

/// Errors surfaced to the client.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("None of the requested test cases are known")]
    NothingSelected,
}

/// Pushed to the client as things change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum Notification {
    TestCaseUpdate(TestCase),
    DataOutput(String),
    DebugInformation(DebugLaunchConfig),
}

/// Answer to `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub success: bool,
    pub version: String,
    /// Glob the client should watch to report file changes
    pub watch_files_glob: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileChangeType {
    Created,
    Changed,
    Deleted,
}

/// A file-system change reported by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub change_type: FileChangeType,
}

/// Result of a discovery request.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Every known test case after the request
    pub test_cases: Vec<TestCase>,
    pub duplicates: Vec<DuplicateTitle>,
    /// Files that could not be discovered, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

/// Completion signal of a run.
pub type RunOutcome = RunSession;

/// Test-explorer backend for one project root.
pub struct TestServer {
    root: PathBuf,
    config: Config,
    discoverer: Discoverer,
    cases: Mutex<TestCaseStore>,
    notifications: mpsc::UnboundedSender<Notification>,
    connector: Arc<dyn RunnerConnector>,
    active_runner: Mutex<Option<Arc<dyn RunnerHandle>>>,
}

impl TestServer {
    pub fn new(
        root: impl Into<PathBuf>,
        config: Config,
        connector: Arc<dyn RunnerConnector>,
        notifications: mpsc::UnboundedSender<Notification>,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            discoverer: Discoverer::new(),
            cases: Mutex::new(TestCaseStore::new()),
            notifications,
            connector,
            active_runner: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn initialize(&self) -> ServerInfo {
        ServerInfo {
            success: true,
            version: SERVER_VERSION.to_string(),
            watch_files_glob: self.config.discovery.glob.clone(),
        }
    }

    /// Snapshot of every known test case.
    pub fn test_cases(&self) -> Vec<TestCase> {
        self.lock_cases().all().to_vec()
    }

    /// Discovers every test file under `directory`.
    ///
    /// Files that no longer match the glob are forgotten; the others keep
    /// their ids and results where declarations are unchanged.
    pub fn discover_for_directory(&self, directory: &Path) -> Result<DiscoveryReport, ServerError> {
        let files = list_test_files(directory, &self.config.discovery.glob)?;
        let keep: HashSet<String> = files.iter().map(normalize_path).collect();
        self.lock_cases().retain_paths(&keep);

        Ok(self.discover_files(&files))
    }

    /// Applies file-system changes: deleted files are forgotten, the rest
    /// are re-discovered.
    pub fn discover_for_changed_files(&self, changes: &[FileChange]) -> DiscoveryReport {
        let mut files = Vec::new();
        for change in changes {
            match change.change_type {
                FileChangeType::Deleted => {
                    let removed = self.lock_cases().remove_path(&normalize_path(&change.path));
                    tracing::debug!(path = %change.path.display(), removed, "forgot deleted test file");
                }
                FileChangeType::Created | FileChangeType::Changed => files.push(change.path.clone()),
            }
        }

        self.discover_files(&files)
    }

    fn discover_files(&self, files: &[PathBuf]) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        for (i, file) in files.iter().enumerate() {
            let path = normalize_path(file);
            self.notify(Notification::DataOutput(format!(
                "Discovering test for file {} - {}/{}",
                path,
                i + 1,
                files.len()
            )));

            let previous = self.lock_cases().take_path(&path);
            match self.discoverer.discover(file, &previous) {
                Ok(discovered) => {
                    let duplicates = find_duplicates(&discovered);
                    self.report_duplicates(&duplicates);
                    report.duplicates.extend(duplicates);
                    self.lock_cases().extend(discovered);
                }
                Err(e) => {
                    // Keep the last good generation so ids and results survive
                    self.lock_cases().extend(previous);
                    tracing::warn!(path = %path, error = %e, "skipping test file");
                    self.notify(Notification::DataOutput(format!("Skipping {}: {}", path, e)));
                    report.skipped.push((file.clone(), e.to_string()));
                }
            }
        }

        report.test_cases = self.test_cases();
        report
    }

    fn report_duplicates(&self, duplicates: &[DuplicateTitle]) {
        log_duplicates(duplicates);
        for duplicate in duplicates {
            for line in duplicate.report_lines() {
                self.notify(Notification::DataOutput(line));
            }
        }
    }

    /// Runs the selected test cases and waits for the runner to finish.
    ///
    /// Every node touched by the run is pushed as a `TestCaseUpdate`.
    pub async fn run_selected(
        &self,
        ids: &[TestCaseId],
        session_id: u64,
        debug: bool,
    ) -> Result<RunOutcome, ServerError> {
        let selected = self.lock_cases().select(ids);
        if selected.is_empty() {
            return Err(ServerError::NothingSelected);
        }
        let per_file_plan = planner::plan(&selected);
        let debug_run = debug;
        tracing::info!(
            session_id,
            files = per_file_plan.len(),
            tests = selected.len(),
            debug_run,
            "starting test run"
        );

        let port = self.connector.negotiate_port(self.config.runner.base_port)?;
        if debug {
            self.notify(Notification::DebugInformation(DebugLaunchConfig::new(
                &self.root,
                self.config.runner.script.clone(),
                port,
            )));
        }

        let RunnerConnection { handle, mut events } = self.connector.connect(&self.root, port, !debug).await?;
        *self.lock_active() = Some(Arc::clone(&handle));

        let settings = self.config.provider_settings(&self.root);
        let request = RunnerInitialize {
            per_file_plan,
            framework_path: settings.framework_install_path,
            framework_arguments: FrameworkArguments {
                opts_path: settings.options_file_path,
            },
        };
        if let Err(e) = handle.initialize(request).await {
            self.finish_run();
            return Err(e.into());
        }

        if debug {
            // The debugger starts its own runner, which reports on this connection.
            if let Err(e) = handle.terminate().await {
                tracing::warn!(error = %e, "failed to stop runner process before debugging");
            }
        }

        let mut machine = RunStateMachine::new(session_id);
        while let Some(message) = events.recv().await {
            match message {
                RunnerMessage::Update(event) => {
                    let transition = machine.apply(&mut self.lock_cases(), &event);
                    if let Some(transition) = transition {
                        for case in transition.into_updates() {
                            self.notify(Notification::TestCaseUpdate(case));
                        }
                    }
                }
                RunnerMessage::Closed => break,
            }
        }

        self.finish_run();
        let outcome = *machine.session();
        tracing::info!(
            session_id,
            successes = outcome.successes,
            failures = outcome.failures,
            skipped = outcome.skipped,
            "test run finished"
        );
        Ok(outcome)
    }

    /// Stops the active run, if any. Returns whether a run was active.
    pub async fn cancel_run(&self) -> Result<bool, ServerError> {
        let active = self.lock_active().clone();
        match active {
            Some(handle) => {
                tracing::info!("cancelling test run");
                handle.terminate().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn finish_run(&self) {
        self.lock_active().take();
        let cleared = RunStateMachine::cancel_running(&mut self.lock_cases());
        for case in cleared {
            self.notify(Notification::TestCaseUpdate(case));
        }
    }

    fn notify(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            tracing::debug!("notification receiver dropped");
        }
    }

    fn lock_cases(&self) -> MutexGuard<'_, TestCaseStore> {
        self.cases.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<Arc<dyn RunnerHandle>>> {
        self.active_runner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
