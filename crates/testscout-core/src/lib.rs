pub mod case;
pub mod config;
pub mod discovery;
pub mod files;
pub mod paths;
pub mod planner;
pub mod run;
pub mod server;
pub mod store;

pub use case::{TestCase, TestCaseId, TestKind, TestStatus};
pub use config::{Config, ConfigError, DiscoveryConfig, ProviderSettings, RunnerConfig};
pub use discovery::{find_duplicates, Discoverer, DiscoveryError, DuplicateTitle};
pub use files::list_test_files;
pub use planner::{plan, ExecutionPlan};
pub use run::{EventKind, RunSession, RunStateMachine, RunnerEvent};
pub use server::{DiscoveryReport, FileChange, FileChangeType, Notification, ServerError, ServerInfo, TestServer};
pub use store::TestCaseStore;
