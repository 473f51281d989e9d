//! Balance Analyzer: trajectory + check suite → verdict.

mod checks;
mod verdict;

use serde::{Deserialize, Serialize};

use crate::economy::CheckTuning;
use crate::engine::Trajectory;

pub use checks::{Check, Evaluation, Milestone};
pub use verdict::{CheckOutcome, Severity, VerdictReport};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckSpec {
    pub check: Check,
    pub severity: Severity,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckSuite {
    pub checks: Vec<CheckSpec>,
}

impl CheckSuite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, check: Check, severity: Severity) -> Self {
        self.checks.push(CheckSpec { check, severity });
        self
    }

    /// The pacing gate: structural invariants plus the configured bounds.
    pub fn from_constants(c: &CheckTuning) -> Self {
        let mut suite = Self::new()
            .with(Check::NonNegativeCurrency, Severity::Error)
            .with(Check::NoLeak, Severity::Error)
            .with(Check::MonotonicProgress, Severity::Error)
            .with(Check::SoftLock { window: c.soft_lock_window }, Severity::Error)
            .with(
                Check::MilestoneWithin { milestone: Milestone::FirstWord, min_ticks: c.first_word.0, max_ticks: c.first_word.1 },
                Severity::Error,
            )
            .with(
                Check::MilestoneWithin { milestone: Milestone::FirstRoot, min_ticks: c.first_root.0, max_ticks: c.first_root.1 },
                Severity::Warning,
            )
            .with(
                Check::MilestoneWithin { milestone: Milestone::AllWords, min_ticks: c.all_words.0, max_ticks: c.all_words.1 },
                Severity::Error,
            )
            .with(Check::MaxPurchaseGap { max_ticks: c.max_purchase_gap }, Severity::Warning)
            .with(
                Check::DeadTimeRatio { max_ratio: c.dead_time_ratio, idle_after: c.dead_time_after },
                Severity::Warning,
            );
        for b in &c.producer_unlocks {
            suite = suite.with(
                Check::MilestoneWithin {
                    milestone: Milestone::ProducerUnlocked(b.producer),
                    min_ticks: b.min_ticks,
                    max_ticks: b.max_ticks,
                },
                Severity::Error,
            );
        }
        suite
    }
}

/// Evaluate every check; a failing check never short-circuits the rest.
pub fn analyze(trajectory: &Trajectory, suite: &CheckSuite) -> VerdictReport {
    let entries = suite
        .checks
        .iter()
        .map(|spec| {
            let Evaluation { failures, detail } = spec.check.evaluate(trajectory);
            CheckOutcome { check: spec.check.label(), severity: spec.severity, detail, failures }
        })
        .collect();
    VerdictReport { entries }
}
