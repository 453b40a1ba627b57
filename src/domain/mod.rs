//! Domain types for the crawlerfeeder orchestrator.
//!
//! This module contains the core data structures:
//! - Store: Crawled and parsed data, plus the workspace operations see
//! - Run: Report of a pipeline run

pub mod run;
pub mod store;

// Re-export commonly used types
pub use run::{PhaseOutcome, RunReport, StepRecord, StepStatus};
pub use store::{DataStore, Workspace};
