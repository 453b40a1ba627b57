//! Run report.
//!
//! A RunReport records what a single pipeline run dispatched, in order,
//! and which steps or phases the run-mode gate skipped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::{Phase, RunMode, SkipReason};

/// Outcome of a single dispatched step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum StepStatus {
    /// Handler (and data source, if any) ran to completion
    Completed,

    /// Skipped by the run-mode gate
    Skipped(SkipReason),
}

/// Record of one dispatched step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    /// Phase the step belongs to
    pub phase: Phase,

    /// Descriptor as configured (`service.operation` or `operation`)
    pub descriptor: String,

    /// What happened
    pub status: StepStatus,

    /// Time taken in milliseconds
    pub duration_ms: u64,
}

impl StepRecord {
    pub fn completed(phase: Phase, descriptor: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            phase,
            descriptor: descriptor.into(),
            status: StepStatus::Completed,
            duration_ms,
        }
    }

    pub fn skipped(phase: Phase, descriptor: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            phase,
            descriptor: descriptor.into(),
            status: StepStatus::Skipped(reason),
            duration_ms: 0,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, StepStatus::Skipped(_))
    }
}

/// Whether the feed phase ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum PhaseOutcome {
    /// The phase has not been reached
    Pending,
    Ran,
    Skipped(SkipReason),
}

/// Summary of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique identifier for this run
    pub id: Uuid,

    /// Process set that was executed
    pub process_set: String,

    /// Run mode the run was executed in
    pub mode: RunMode,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (None while running)
    pub completed_at: Option<DateTime<Utc>>,

    /// Every dispatched step, in execution order
    pub steps: Vec<StepRecord>,

    /// Whether the feed phase ran
    pub feed: PhaseOutcome,

    /// Warnings recorded during the run
    pub warnings: Vec<String>,

    /// Errors recorded during the run
    pub errors: Vec<String>,
}

impl RunReport {
    /// Start a report for a new run
    pub fn new(process_set: impl Into<String>, mode: RunMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            process_set: process_set.into(),
            mode,
            started_at: Utc::now(),
            completed_at: None,
            steps: Vec::new(),
            feed: PhaseOutcome::Pending,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Steps of one phase, in execution order
    pub fn steps_in(&self, phase: Phase) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(move |step| step.phase == phase)
    }

    /// Descriptors of the completed steps of one phase
    pub fn completed(&self, phase: Phase) -> Vec<&str> {
        self.steps_in(phase)
            .filter(|step| !step.is_skipped())
            .map(|step| step.descriptor.as_str())
            .collect()
    }

    /// Descriptors the gate skipped in one phase
    pub fn skipped(&self, phase: Phase) -> Vec<&str> {
        self.steps_in(phase)
            .filter(|step| step.is_skipped())
            .map(|step| step.descriptor.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_filters_by_phase() {
        let mut report = RunReport::new("main", RunMode::SafeRun);
        report.steps.push(StepRecord::completed(Phase::Crawl, "db.users", 3));
        report.steps.push(StepRecord::completed(Phase::Feed, "db.store", 1));
        report
            .steps
            .push(StepRecord::skipped(Phase::Feed, "publish", SkipReason::Wet));

        assert_eq!(report.completed(Phase::Crawl), vec!["db.users"]);
        assert_eq!(report.completed(Phase::Feed), vec!["db.store"]);
        assert_eq!(report.skipped(Phase::Feed), vec!["publish"]);
        assert!(report.skipped(Phase::Parse).is_empty());
    }

    #[test]
    fn test_report_serialization() {
        let mut report = RunReport::new("main", RunMode::DryRun);
        report.feed = PhaseOutcome::Skipped(SkipReason::DryRun);
        report
            .steps
            .push(StepRecord::skipped(Phase::Feed, "publish", SkipReason::Wet));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "dry-run");
        assert_eq!(json["feed"]["status"], "skipped");
        assert_eq!(json["feed"]["reason"], "dry_run");
        assert_eq!(json["steps"][0]["status"]["reason"], "wet");
    }
}
