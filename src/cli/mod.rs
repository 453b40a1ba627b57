//! Command-line interface for crawlerfeeder.
//!
//! Loads the configuration, selects the process set and run mode, and runs
//! the pipeline with either the built-in operations or a caller-supplied
//! table.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::builtin;
use crate::config::{Config, DEFAULT_PROCESS_SET};
use crate::core::{Operations, Orchestrator, RunMode};
use crate::domain::{PhaseOutcome, RunReport, StepStatus};

/// Crawler & Feeder. Executes a list of tasks in a three steps process to
/// crawl and feed from data sources to data sources.
#[derive(Parser, Debug)]
#[command(name = "crawlerfeeder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the YAML file that contains the process configuration
    #[arg(short, long, env = "CRAWLERFEEDER_CONFIG")]
    pub config: PathBuf,

    /// Specifies the set of tasks that will be processed
    #[arg(short, long, default_value = DEFAULT_PROCESS_SET)]
    pub process_set: String,

    /// Saves pending changes into the given file, before making any change
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Executes all the processes except those in the feed step
    #[arg(long, conflicts_with_all = ["skip_unsafe", "safe_run"])]
    pub dry_run: bool,

    /// Skips the feed step if there are errors or warnings
    #[arg(long, conflicts_with = "safe_run")]
    pub skip_unsafe: bool,

    /// Executes all the processes except wet ones, and unsafe ones once
    /// there are errors or warnings
    #[arg(long)]
    pub safe_run: bool,

    /// Print lots of debugging statements
    #[arg(short, long, conflicts_with = "verbose")]
    pub debug: bool,

    /// Be verbose
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Run mode selected by the mutually exclusive switches
    pub fn run_mode(&self) -> RunMode {
        RunMode::from_flags(self.dry_run, self.skip_unsafe, self.safe_run)
    }

    /// Default log filter for the selected verbosity
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }

    /// Execute with the built-in operations
    pub async fn execute(self) -> Result<()> {
        self.execute_with(Operations::new()).await
    }

    /// Execute with the built-in operations plus `operations`, which take
    /// precedence over built-ins of the same name
    pub async fn execute_with(self, operations: Operations) -> Result<()> {
        let operations = builtin::operations().extend(operations);
        let config = Config::from_file(&self.config)?;
        let mut orchestrator =
            Orchestrator::new(config, &self.process_set, self.run_mode(), operations)?;
        if let Some(path) = self.output_file {
            orchestrator = orchestrator.with_output_file(path);
        }

        let report = orchestrator.run().await?;
        print_summary(&report);

        Ok(())
    }
}

/// Print a one-line summary per step to stderr
fn print_summary(report: &RunReport) {
    for step in &report.steps {
        match step.status {
            StepStatus::Completed => {
                eprintln!("  [{}] {} ({}ms)", step.phase, step.descriptor, step.duration_ms)
            }
            StepStatus::Skipped(reason) => {
                eprintln!("  [{}] {} skipped: {}", step.phase, step.descriptor, reason)
            }
        }
    }

    if let PhaseOutcome::Skipped(reason) = report.feed {
        eprintln!("  [feed] phase skipped: {}", reason);
    }

    eprintln!(
        "\n[Run {} of '{}' completed in {} mode: {} warning(s), {} error(s)]",
        report.id,
        report.process_set,
        report.mode,
        report.warnings.len(),
        report.errors.len()
    );
}
