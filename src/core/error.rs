//! Fatal pipeline errors.
//!
//! Every variant aborts the run. Recoverable conditions are recorded in
//! [`Diagnostics`](super::Diagnostics) by the operations themselves.

use thiserror::Error;

use super::pipeline::Phase;

/// Configuration and store errors raised by the orchestration engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("The process set '{name}' does not exist. Include a section called '{section}' in the configuration file.")]
    UnknownProcessSet { name: String, section: String },

    #[error("Configuration section '{0}' does not exist")]
    MissingSection(String),

    #[error("Malformed step descriptor '{descriptor}': {reason}")]
    MalformedDescriptor { descriptor: String, reason: String },

    #[error("Unknown {phase} operation '{name}' (expected a handler registered as '{qualified}')")]
    UnknownOperation {
        phase: Phase,
        name: String,
        qualified: String,
    },

    #[error("Data source '{0}' has not been instantiated")]
    UnknownSource(String),

    #[error("Unknown data source kind '{kind}' for source '{source_name}'")]
    UnknownSourceKind { source_name: String, kind: String },

    #[error("Operation '{operation}' must return an object of parameters, got {found}")]
    InvalidParameters { operation: String, found: String },

    #[error("Key '{key}' already stored in the {store} data")]
    KeyExists { store: &'static str, key: String },

    #[error("No {store} data stored under '{key}'")]
    MissingData { store: &'static str, key: String },
}
