use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, Context};
use testscout_core::discovery::{find_duplicates, log_duplicates};
use testscout_core::paths::normalize_path;
use testscout_core::{
    list_test_files, plan, Config, Discoverer, RunStateMachine, RunnerEvent, TestCase, TestCaseStore,
};

#[derive(Parser)]
#[command(name = "testscout")]
#[command(about = "Discover, plan and replay BDD-style test runs", long_about = None)]
struct Cli {
    /// Use this config file instead of the project or user config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every discovered test case as JSON
    Discover {
        /// Project root
        root: PathBuf,
    },
    /// List full titles declared more than once in a file
    Duplicates { root: PathBuf },
    /// Print the per-file runner filters for a selection
    Plan {
        root: PathBuf,
        /// Full titles or test file paths
        #[arg(required = true)]
        selectors: Vec<String>,
    },
    /// Feed recorded runner events through the run state machine
    Replay {
        root: PathBuf,
        /// Newline-delimited JSON runner events
        events: PathBuf,
        #[arg(long, default_value_t = 1)]
        session: u64,
    },
    /// Print the default configuration
    Config,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Logs go to stderr so JSON output stays clean
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Discover { root } => {
            let config = load_config(cli.config.as_deref(), &root)?;
            let cases = discover_root(&root, &config)?;
            println!("{}", serde_json::to_string_pretty(cases.all())?);
        }
        Commands::Duplicates { root } => {
            let config = load_config(cli.config.as_deref(), &root)?;
            let cases = discover_root(&root, &config)?;
            let duplicates = find_duplicates(cases.all());
            if duplicates.is_empty() {
                println!("No duplicated tests found.");
            }
            for duplicate in &duplicates {
                for line in duplicate.report_lines() {
                    println!("{}", line);
                }
            }
        }
        Commands::Plan { root, selectors } => {
            let config = load_config(cli.config.as_deref(), &root)?;
            let cases = discover_root(&root, &config)?;
            let selected = select(&cases, &selectors);
            if selected.is_empty() {
                bail!("No test cases match {:?}", selectors);
            }
            println!("{}", serde_json::to_string_pretty(&plan(&selected))?);
        }
        Commands::Replay { root, events, session } => {
            let config = load_config(cli.config.as_deref(), &root)?;
            let mut cases = discover_root(&root, &config)?;
            replay(&mut cases, &events, session)?;
        }
        Commands::Config => {
            print!("{}", Config::default_config_string());
        }
    }

    Ok(())
}

fn load_config(explicit: Option<&Path>, root: &Path) -> color_eyre::Result<Config> {
    let config = match explicit {
        Some(path) => Config::from_file(path).wrap_err_with(|| format!("loading {}", path.display()))?,
        None => Config::load(root).wrap_err("loading configuration")?,
    };
    Ok(config)
}

/// Discovers every test file under `root`, skipping files that fail to parse.
fn discover_root(root: &Path, config: &Config) -> color_eyre::Result<TestCaseStore> {
    let files = list_test_files(root, &config.discovery.glob)?;
    let discoverer = Discoverer::new();
    let mut store = TestCaseStore::new();

    for (i, file) in files.iter().enumerate() {
        tracing::info!("Discovering test for file {} - {}/{}", file.display(), i + 1, files.len());
        match discoverer.discover(file, &[]) {
            Ok(cases) => {
                log_duplicates(&find_duplicates(&cases));
                store.extend(cases);
            }
            Err(e) => tracing::warn!(path = %file.display(), error = %e, "skipping test file"),
        }
    }

    Ok(store)
}

/// A selector naming a test file picks its File root; anything else is
/// matched against full titles.
fn select(cases: &TestCaseStore, selectors: &[String]) -> Vec<TestCase> {
    let paths: HashSet<String> = selectors.iter().map(normalize_path).collect();
    cases
        .all()
        .iter()
        .filter(|case| {
            if case.is_file_root() {
                paths.contains(&case.path)
            } else {
                selectors.iter().any(|s| *s == case.full_title)
            }
        })
        .cloned()
        .collect()
}

fn replay(cases: &mut TestCaseStore, events: &Path, session: u64) -> color_eyre::Result<()> {
    let reader = BufReader::new(File::open(events).wrap_err_with(|| format!("opening {}", events.display()))?);
    let mut machine = RunStateMachine::new(session);

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: RunnerEvent =
            serde_json::from_str(&line).wrap_err_with(|| format!("{}:{}", events.display(), number + 1))?;
        if let Some(transition) = machine.apply(cases, &event) {
            for case in transition.into_updates() {
                println!("{}", serde_json::to_string(&case)?);
            }
        }
    }

    for case in RunStateMachine::cancel_running(cases) {
        println!("{}", serde_json::to_string(&case)?);
    }
    println!("{}", serde_json::to_string(machine.session())?);
    Ok(())
}
