//! Run-mode gating.
//!
//! The run mode is chosen once per run and decides whether the feed phase
//! or an individual operation executes:
//! - `dry-run`: the feed phase never runs
//! - `skip-unsafe`: the feed phase is skipped once any diagnostic exists
//! - `safe-run`: wet operations never run, unsafe operations stop running
//!   once any diagnostic exists

use std::fmt;

use serde::{Deserialize, Serialize};

use super::diagnostics::Diagnostics;

/// Execution policy for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    #[default]
    Normal,
    DryRun,
    SkipUnsafe,
    SafeRun,
}

impl RunMode {
    /// Select a mode from the mutually exclusive command-line switches
    pub fn from_flags(dry_run: bool, skip_unsafe: bool, safe_run: bool) -> Self {
        match (dry_run, skip_unsafe, safe_run) {
            (true, _, _) => Self::DryRun,
            (_, true, _) => Self::SkipUnsafe,
            (_, _, true) => Self::SafeRun,
            _ => Self::Normal,
        }
    }

    /// Decide whether the whole feed phase must be skipped
    pub fn feed_gate(self, diagnostics: &Diagnostics) -> Option<SkipReason> {
        match self {
            Self::DryRun => Some(SkipReason::DryRun),
            Self::SkipUnsafe if !diagnostics.is_empty() => Some(SkipReason::SkipUnsafe),
            _ => None,
        }
    }

    /// Decide whether an operation carrying `tag` must be skipped right now
    pub fn operation_gate(self, tag: OperationTag, diagnostics: &Diagnostics) -> Option<SkipReason> {
        if self != Self::SafeRun {
            return None;
        }

        match tag {
            OperationTag::Wet => Some(SkipReason::Wet),
            OperationTag::Unsafe if !diagnostics.is_empty() => Some(SkipReason::Unsafe),
            _ => None,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "normal",
            Self::DryRun => "dry-run",
            Self::SkipUnsafe => "skip-unsafe",
            Self::SafeRun => "safe-run",
        };
        f.write_str(name)
    }
}

/// Per-operation marker read by the gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationTag {
    #[default]
    None,

    /// Changes the outside world; never runs in safe-run mode
    Wet,

    /// Only trustworthy on clean data; skipped in safe-run mode once
    /// warnings or errors were recorded
    Unsafe,
}

/// Why a phase or an operation was not executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    DryRun,
    SkipUnsafe,
    Wet,
    Unsafe,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::DryRun => "executed in dry-run mode",
            Self::SkipUnsafe => {
                "executed in skip-unsafe mode and there are warnings or errors registered during the process"
            }
            Self::Wet => "it is marked as wet and executed in safe-run mode",
            Self::Unsafe => {
                "it is marked as unsafe and executed in safe-run mode with warnings or errors registered"
            }
        };
        f.write_str(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirty() -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_warning("something odd");
        diagnostics
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(RunMode::from_flags(false, false, false), RunMode::Normal);
        assert_eq!(RunMode::from_flags(true, false, false), RunMode::DryRun);
        assert_eq!(RunMode::from_flags(false, true, false), RunMode::SkipUnsafe);
        assert_eq!(RunMode::from_flags(false, false, true), RunMode::SafeRun);
    }

    #[test]
    fn test_dry_run_always_skips_feed() {
        assert_eq!(
            RunMode::DryRun.feed_gate(&Diagnostics::new()),
            Some(SkipReason::DryRun)
        );
        assert_eq!(RunMode::DryRun.feed_gate(&dirty()), Some(SkipReason::DryRun));
    }

    #[test]
    fn test_skip_unsafe_depends_on_diagnostics() {
        assert_eq!(RunMode::SkipUnsafe.feed_gate(&Diagnostics::new()), None);
        assert_eq!(
            RunMode::SkipUnsafe.feed_gate(&dirty()),
            Some(SkipReason::SkipUnsafe)
        );
    }

    #[test]
    fn test_normal_and_safe_run_never_skip_feed() {
        assert_eq!(RunMode::Normal.feed_gate(&dirty()), None);
        assert_eq!(RunMode::SafeRun.feed_gate(&dirty()), None);
    }

    #[test]
    fn test_operation_gate_only_in_safe_run() {
        for mode in [RunMode::Normal, RunMode::DryRun, RunMode::SkipUnsafe] {
            assert_eq!(mode.operation_gate(OperationTag::Wet, &dirty()), None);
            assert_eq!(mode.operation_gate(OperationTag::Unsafe, &dirty()), None);
        }

        let safe = RunMode::SafeRun;
        let clean = Diagnostics::new();
        assert_eq!(safe.operation_gate(OperationTag::None, &dirty()), None);
        assert_eq!(safe.operation_gate(OperationTag::Wet, &clean), Some(SkipReason::Wet));
        assert_eq!(safe.operation_gate(OperationTag::Unsafe, &clean), None);
        assert_eq!(
            safe.operation_gate(OperationTag::Unsafe, &dirty()),
            Some(SkipReason::Unsafe)
        );
    }
}
