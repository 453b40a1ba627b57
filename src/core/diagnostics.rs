//! Warnings and errors accumulated during a run.
//!
//! Append-only while a run is in progress; the orchestrator clears it when a
//! new run starts. The run-mode gate only asks whether it is empty.

use serde::Serialize;
use tracing::{error, warn};

/// Ordered warning and error messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and surface it on the log stream
    pub fn add_warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Record an error and surface it on the log stream
    pub fn add_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        self.errors.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// True when neither warnings nor errors were recorded
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len() + self.errors.len()
    }

    pub(crate) fn clear(&mut self) {
        self.warnings.clear();
        self.errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_in_order() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.add_warning("first");
        diagnostics.add_warning("second");
        diagnostics.add_error("broken");

        assert_eq!(diagnostics.warnings(), ["first", "second"]);
        assert_eq!(diagnostics.errors(), ["broken"]);
        assert_eq!(diagnostics.len(), 3);
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn test_errors_alone_make_it_non_empty() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error("broken");
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_warning("stale");
        diagnostics.clear();
        assert!(diagnostics.is_empty());
    }
}
