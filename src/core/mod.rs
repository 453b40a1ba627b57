//! Core orchestration logic.
//!
//! This module contains:
//! - Pipeline: Process sets, step descriptors and phases
//! - Dispatch: Operation table and gated invocation
//! - Safety: Run modes and the run-mode gate
//! - Diagnostics: Warnings and errors recorded during a run
//! - Registry: Instantiated data sources
//! - Orchestrator: Main execution engine

pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod safety;

// Re-export commonly used types
pub use diagnostics::Diagnostics;
pub use dispatch::{Dispatch, Handler, Operation, Operations, Params};
pub use error::PipelineError;
pub use orchestrator::Orchestrator;
pub use pipeline::{Descriptor, NameList, Phase, ProcessSet, ProcessSetSection};
pub use registry::SourceRegistry;
pub use safety::{OperationTag, RunMode, SkipReason};
