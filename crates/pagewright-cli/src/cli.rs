//! Command-line arguments.

use camino::Utf8PathBuf;
use clap::Parser;
use pagewright::{LogLevel, RunOverrides};

/// Run browser-driven BDD features.
#[derive(Parser, Debug, Default)]
#[command(version, about)]
pub struct Cli {
    /// Directory searched for `*.feature` files.
    #[arg(long, value_name = "DIR")]
    pub features: Option<Utf8PathBuf>,

    /// Run the suite of this role. Repeat to select several.
    #[arg(long = "role", value_name = "NAME")]
    pub roles: Vec<String>,

    /// Also run untagged scenarios when roles are selected.
    #[arg(long)]
    pub include_anonymous: bool,

    /// Log every role in again instead of reusing stored session state.
    #[arg(long)]
    pub regenerate_state: bool,

    /// Directory holding per-role session state.
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<Utf8PathBuf>,

    /// Number of scenarios run at once.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Abort the run after this many seconds. 0 disables the deadline.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// URL that page paths are resolved against.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Write a JSON report to this file.
    #[arg(long, value_name = "FILE")]
    pub report: Option<Utf8PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<LogLevel>,

    /// Bind every step without running anything.
    #[arg(long, conflicts_with = "list_steps")]
    pub check: bool,

    /// Print the registered step definitions as JSON and exit.
    #[arg(long)]
    pub list_steps: bool,
}

impl Cli {
    /// Settings that override the environment.
    #[must_use]
    pub fn overrides(&self) -> RunOverrides {
        RunOverrides {
            log_level: self.log_level,
            features_dir: self.features.clone(),
            state_dir: self.state_dir.clone(),
            workers: self.workers,
            timeout_secs: self.timeout_secs,
            regenerate_state: self.regenerate_state,
            base_url: self.base_url.clone(),
        }
    }
}
