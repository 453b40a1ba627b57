//! Main orchestrator for pipeline execution.
//!
//! Sequences the four phases of a run (instantiate, crawl, parse, feed),
//! owns the data-source registry and both data stores, and asks the
//! run-mode gate whether the feed phase executes.
//!
//! Crawl and feed steps follow the same two-step pattern. For a descriptor
//! `svc.op`, the local operation `op` is called with `svc`'s configuration
//! parameters and must return the parameters for `svc`'s capability, which
//! is then called with them. For a descriptor `op`, the local operation is
//! the whole step.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::domain::{PhaseOutcome, RunReport, StepRecord, Workspace};
use crate::sources::SourceKinds;

use super::dispatch::{Dispatch, Operations, Params};
use super::error::PipelineError;
use super::pipeline::{Descriptor, Phase, ProcessSet};
use super::registry::SourceRegistry;
use super::safety::RunMode;

/// Main pipeline orchestrator
pub struct Orchestrator {
    config: Config,
    process_set: ProcessSet,
    mode: RunMode,
    operations: Operations,
    kinds: SourceKinds,
    registry: SourceRegistry,
    workspace: Workspace,
    output_file: Option<PathBuf>,
    report: RunReport,
}

impl Orchestrator {
    /// Create an orchestrator for a process set
    ///
    /// Fails before any phase runs when the process set does not exist or
    /// one of its descriptors is malformed.
    pub fn new(
        config: Config,
        process_set: &str,
        mode: RunMode,
        operations: Operations,
    ) -> Result<Self> {
        let process_set = config.process_set(process_set)?;
        let report = RunReport::new(process_set.name.clone(), mode);

        Ok(Self {
            config,
            process_set,
            mode,
            operations,
            kinds: SourceKinds::builtin(),
            registry: SourceRegistry::new(),
            workspace: Workspace::new(),
            output_file: None,
            report,
        })
    }

    /// Replace the table of data-source kinds
    pub fn with_source_kinds(mut self, kinds: SourceKinds) -> Self {
        self.kinds = kinds;
        self
    }

    /// Save the parsed data to `path` before the feed decision
    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn process_set(&self) -> &ProcessSet {
        &self.process_set
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Execute the whole pipeline
    ///
    /// Any failure aborts the run immediately.
    #[instrument(skip(self), fields(process_set = %self.process_set.name, mode = %self.mode))]
    pub async fn run(&mut self) -> Result<RunReport> {
        info!("## Instantiate data sources...");
        self.instantiate()?;

        info!("## [1/3. Crawler]: Crawling data from data sources...");
        self.crawl().await?;

        info!("## [2/3. Parser]: Parsing data...");
        self.parse()?;

        if let Some(path) = &self.output_file {
            info!("### Saving pending changes into '{}'...", path.display());
            self.workspace.save_pending(path).await?;
        }

        info!("## [3/3. Feeder]: Feeding sources with parsed data...");
        match self.mode.feed_gate(&self.workspace.diagnostics) {
            Some(reason) => {
                info!("### Skipping changes because {}.", reason);
                self.report.feed = PhaseOutcome::Skipped(reason);
            }
            None => {
                self.feed().await?;
                self.report.feed = PhaseOutcome::Ran;
            }
        }

        self.report.completed_at = Some(Utc::now());
        self.report.warnings = self.workspace.diagnostics.warnings().to_vec();
        self.report.errors = self.workspace.diagnostics.errors().to_vec();
        info!(
            steps = self.report.steps.len(),
            warnings = self.report.warnings.len(),
            errors = self.report.errors.len(),
            "Run completed"
        );

        Ok(self.report.clone())
    }

    /// Build every data source of the process set
    ///
    /// This is the first phase of a run: stores, diagnostics and the report
    /// of any previous run are discarded.
    pub fn instantiate(&mut self) -> Result<()> {
        self.workspace.reset();
        self.report = RunReport::new(self.process_set.name.clone(), self.mode);
        self.registry.clear();

        for name in &self.process_set.sources {
            info!("### Instantiating '{}' service...", name);
            let params = self.config.source_params(name)?;
            let source = self
                .kinds
                .build(name, params)
                .with_context(|| format!("Failed to instantiate data source '{}'", name))?;
            self.registry.insert(name.clone(), source);
        }

        Ok(())
    }

    /// Crawl data from data sources into the crawled-data store
    pub async fn crawl(&mut self) -> Result<()> {
        for descriptor in &self.process_set.crawlers {
            log_dispatch(Phase::Crawl, descriptor);
            let started = Instant::now();

            let params = match &descriptor.service {
                Some(service) => self.config.source_params(service)?.clone(),
                None => Params::new(),
            };
            let value = match self.operations.invoke(
                Phase::Crawl,
                &descriptor.operation,
                self.mode,
                &mut self.workspace,
                &params,
            )? {
                Dispatch::Ran(value) => value,
                Dispatch::Skipped(reason) => {
                    self.report
                        .steps
                        .push(StepRecord::skipped(Phase::Crawl, descriptor.to_string(), reason));
                    continue;
                }
            };

            let crawled = match &descriptor.service {
                Some(service) => {
                    let request = into_params(&descriptor.operation, value)?;
                    self.registry
                        .get(service)?
                        .crawl(request)
                        .await
                        .with_context(|| format!("crawl step '{}' failed", descriptor))?
                }
                None => value,
            };

            self.workspace
                .crawled
                .insert(descriptor.operation.clone(), crawled)?;
            self.report.steps.push(StepRecord::completed(
                Phase::Crawl,
                descriptor.to_string(),
                elapsed_ms(started),
            ));
        }

        Ok(())
    }

    /// Run the parse operations in order
    ///
    /// Parse operations read the crawled data and write the parsed data
    /// themselves; their return value is ignored.
    pub fn parse(&mut self) -> Result<()> {
        for descriptor in &self.process_set.parsers {
            log_dispatch(Phase::Parse, descriptor);
            let started = Instant::now();

            let record = match self.operations.invoke(
                Phase::Parse,
                &descriptor.operation,
                self.mode,
                &mut self.workspace,
                &Params::new(),
            )? {
                Dispatch::Ran(_) => StepRecord::completed(
                    Phase::Parse,
                    descriptor.to_string(),
                    elapsed_ms(started),
                ),
                Dispatch::Skipped(reason) => {
                    StepRecord::skipped(Phase::Parse, descriptor.to_string(), reason)
                }
            };
            self.report.steps.push(record);
        }

        Ok(())
    }

    /// Feed data sources with the parsed data
    ///
    /// Runs unconditionally; [`run`](Self::run) decides whether it is called.
    pub async fn feed(&mut self) -> Result<()> {
        for descriptor in &self.process_set.feeders {
            log_dispatch(Phase::Feed, descriptor);
            let started = Instant::now();

            let params = match &descriptor.service {
                Some(service) => self.config.source_params(service)?.clone(),
                None => Params::new(),
            };
            let value = match self.operations.invoke(
                Phase::Feed,
                &descriptor.operation,
                self.mode,
                &mut self.workspace,
                &params,
            )? {
                Dispatch::Ran(value) => value,
                Dispatch::Skipped(reason) => {
                    self.report
                        .steps
                        .push(StepRecord::skipped(Phase::Feed, descriptor.to_string(), reason));
                    continue;
                }
            };

            if let Some(service) = &descriptor.service {
                let request = into_params(&descriptor.operation, value)?;
                let result = self
                    .registry
                    .get(service)?
                    .feed(request)
                    .await
                    .with_context(|| format!("feed step '{}' failed", descriptor))?;
                debug!(step = %descriptor, %result, "Feed result");
            }

            self.report.steps.push(StepRecord::completed(
                Phase::Feed,
                descriptor.to_string(),
                elapsed_ms(started),
            ));
        }

        Ok(())
    }
}

fn log_dispatch(phase: Phase, descriptor: &Descriptor) {
    let verb = match phase {
        Phase::Crawl => "Crawling",
        Phase::Parse => "Parsing",
        Phase::Feed => "Feeding",
    };
    match &descriptor.service {
        Some(service) => info!("### {} '{}' from '{}'...", verb, descriptor.operation, service),
        None => info!("### {} '{}'...", verb, descriptor.operation),
    }
}

/// A local operation building capability parameters must return an object
fn into_params(operation: &str, value: Value) -> Result<Params, PipelineError> {
    match value {
        Value::Object(params) => Ok(params),
        other => Err(PipelineError::InvalidParameters {
            operation: operation.to_string(),
            found: json_type(&other).to_string(),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_params() {
        let params = into_params("users", json!({"query": "SELECT 1"})).unwrap();
        assert_eq!(params["query"], "SELECT 1");

        assert_eq!(
            into_params("users", json!(["SELECT 1"])),
            Err(PipelineError::InvalidParameters {
                operation: "users".to_string(),
                found: "an array".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_process_set_fails_before_any_phase() {
        let config = Config::from_yaml("crawlerfeeder:\n  crawlers: users\n").unwrap();
        let err = Orchestrator::new(config, "nightly", RunMode::Normal, Operations::new())
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::UnknownProcessSet { .. })
        ));
    }
}
