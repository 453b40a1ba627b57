//! crawlerfeeder - Crawl, parse and feed pipeline orchestrator
//!
//! Executes a list of tasks in a three steps process to crawl and feed from
//! data sources to data sources, under control of a declarative
//! configuration.
//!
//! # Architecture
//!
//! A run executes four phases in fixed order:
//! - instantiate: build every data source of the process set
//! - crawl: call crawl operations, store their results by operation name
//! - parse: call parse operations, which turn crawled data into parsed data
//! - feed: call feed operations, unless the run mode says otherwise
//!
//! A step descriptor `svc.op` first calls the local operation `op` with the
//! configuration of `svc` to build parameters, then calls `svc`'s `crawl`
//! or `feed` capability with them. A descriptor `op` calls the local
//! operation only.
//!
//! # Modules
//!
//! - `core`: Orchestration logic (Orchestrator, dispatch, run-mode gate, diagnostics)
//! - `domain`: Data structures (data stores, run report)
//! - `sources`: Data source capability and the built-in kinds
//! - `builtin`: Operations usable from configuration alone
//! - `config`: Configuration file loading
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run the default process set
//! crawlerfeeder --config pipeline.yaml
//!
//! # Run another process set without feeding anything
//! crawlerfeeder --config pipeline.yaml --process-set nightly --dry-run
//! ```

pub mod builtin;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod sources;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use crate::core::{
    Descriptor, Diagnostics, OperationTag, Operations, Orchestrator, Params, Phase,
    PipelineError, RunMode, SkipReason,
};
pub use domain::{DataStore, PhaseOutcome, RunReport, StepRecord, StepStatus, Workspace};
pub use sources::{DataSource, SourceKinds};
