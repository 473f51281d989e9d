use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::BalanceCheckFailure;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Fails the run.
    Error,
    /// Reported, never fails the run.
    Warning,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub check: String,
    pub severity: Severity,
    pub detail: String,
    pub failures: Vec<BalanceCheckFailure>,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One entry per check, in suite order. Evaluation never stops early, so a
/// report always covers every check.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VerdictReport {
    pub entries: Vec<CheckOutcome>,
}

impl VerdictReport {
    /// True unless an error-severity check failed.
    pub fn passed(&self) -> bool {
        self.entries.iter().all(|e| e.passed() || e.severity == Severity::Warning)
    }

    pub fn failures(&self) -> impl Iterator<Item = &BalanceCheckFailure> + '_ {
        self.entries
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .flat_map(|e| e.failures.iter())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &BalanceCheckFailure> + '_ {
        self.entries
            .iter()
            .filter(|e| e.severity == Severity::Warning)
            .flat_map(|e| e.failures.iter())
    }

    pub fn entry(&self, check: &str) -> Option<&CheckOutcome> {
        self.entries.iter().find(|e| e.check == check)
    }

    /// Per-check pass/fail table; offending tick ranges are listed under each failure.
    pub fn render_table(&self) -> String {
        let width = self.entries.iter().map(|e| e.check.len()).max().unwrap_or(5).max(5);
        let mut out = String::new();
        let _ = writeln!(out, "{:<6} {:<8} {:<width$}  DETAIL", "STATUS", "LEVEL", "CHECK");
        for e in &self.entries {
            let status = match (e.passed(), e.severity) {
                (true, _) => "PASS",
                (false, Severity::Error) => "FAIL",
                (false, Severity::Warning) => "WARN",
            };
            let level = match e.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            let _ = writeln!(out, "{status:<6} {level:<8} {:<width$}  {}", e.check, e.detail);
            for f in &e.failures {
                let _ = writeln!(out, "{:<6} {:<8} {:<width$}    ticks {}..{}: {}", "", "", "", f.ticks.0, f.ticks.1, f.message);
            }
        }
        let _ = writeln!(out, "verdict: {}", if self.passed() { "PASS" } else { "FAIL" });
        out
    }
}
