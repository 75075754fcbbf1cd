//! CLI command definitions
//!
//! Defines the clap commands for the functest CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::common::config::Overrides;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured test cases one after another
    Run(RunArgs),

    /// List configured cases and the scenario files found
    #[command(alias = "ls")]
    List(RunArgs),

    /// Load every configured case without running anything
    Check(RunArgs),
}

/// Configuration sources shared by all commands
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Case identifiers to run instead of the configured list
    pub cases: Vec<String>,

    /// Configuration file (default: ./functest.toml, then the user config dir)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Base URL of the service under test
    #[arg(long, short = 'e')]
    pub endpoint: Option<String>,

    /// Ticks a case may stay pending before the run times out
    #[arg(long, short = 't')]
    pub timeout: Option<u64>,

    /// Tick period in milliseconds
    #[arg(long = "tick-ms")]
    pub tick_ms: Option<u64>,

    /// Directory holding case_<id>.yaml scenario files
    #[arg(long)]
    pub cases_dir: Option<PathBuf>,
}

impl RunArgs {
    /// Values that override the configuration file
    pub fn overrides(&self) -> Overrides {
        Overrides {
            endpoint: self.endpoint.clone(),
            cases: self.cases.clone(),
            timeout: self.timeout,
            tick_period_ms: self.tick_ms,
            cases_dir: self.cases_dir.clone(),
        }
    }
}
