//! Individual checks. Each one is a pure predicate over a trajectory that
//! returns every offending tick range it finds.

use serde::{Deserialize, Serialize};

use crate::economy::ProducerId;
use crate::engine::{Sample, Trajectory};
use crate::error::{BalanceCheckFailure, FailureKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Milestone {
    FirstWord,
    FirstRoot,
    ProducerUnlocked(u16),
    LexiconSize(u32),
    AllWords,
}

impl Milestone {
    /// Tick of the first sample at which the milestone holds. Read from the
    /// sampled state, so a run resumed past the milestone reports its start.
    pub fn reached_at(&self, t: &Trajectory) -> Option<u64> {
        let found = match *self {
            Milestone::FirstWord => t.find(|s| s.view.lexicon_size >= 1),
            Milestone::FirstRoot => t.find(|s| s.roots_discovered > 0),
            Milestone::ProducerUnlocked(k) => t.find(|s| s.unlocked.contains(&ProducerId(k))),
            Milestone::LexiconSize(n) => t.find(|s| s.view.lexicon_size >= n),
            Milestone::AllWords => {
                let words = t.meta.words as u32;
                t.find(|s| s.view.lexicon_size >= words)
            }
        };
        found.map(Sample::tick)
    }

    pub fn label(&self) -> String {
        match self {
            Milestone::FirstWord => "first_word".into(),
            Milestone::FirstRoot => "first_root".into(),
            Milestone::ProducerUnlocked(k) => format!("producer_{k:02}_unlocked"),
            Milestone::LexiconSize(n) => format!("lexicon_{n}"),
            Milestone::AllWords => "all_words".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// Ticks from the run start to the milestone fall in `[min_ticks, max_ticks]`.
    MilestoneWithin { milestone: Milestone, min_ticks: u64, max_ticks: u64 },
    /// Once a producer is owned, no span longer than `window` ticks goes by
    /// without a purchase while progress remains.
    SoftLock { window: u64 },
    /// Currency only falls at samples that carry a purchase.
    NoLeak,
    NonNegativeCurrency,
    /// Lexicon size, owned counts and purchased upgrades never shrink.
    MonotonicProgress,
    /// No span longer than `max_ticks` between purchases, counted from the run start.
    MaxPurchaseGap { max_ticks: u64 },
    /// Waiting beyond `idle_after` ticks between purchases takes at most
    /// `max_ratio` of the run.
    DeadTimeRatio { max_ratio: f64, idle_after: u64 },
}

/// Failures plus a one-line summary for the report.
pub struct Evaluation {
    pub failures: Vec<BalanceCheckFailure>,
    pub detail: String,
}

impl Check {
    pub fn label(&self) -> String {
        match self {
            Check::MilestoneWithin { milestone, min_ticks, max_ticks } => {
                format!("{} in [{min_ticks}, {max_ticks}]", milestone.label())
            }
            Check::SoftLock { window } => format!("soft_lock (window {window})"),
            Check::NoLeak => "no_leak".into(),
            Check::NonNegativeCurrency => "non_negative_currency".into(),
            Check::MonotonicProgress => "monotonic_progress".into(),
            Check::MaxPurchaseGap { max_ticks } => format!("purchase_gap <= {max_ticks}"),
            Check::DeadTimeRatio { max_ratio, idle_after } => {
                format!("dead_time <= {max_ratio:.2} (idle after {idle_after})")
            }
        }
    }

    pub fn evaluate(&self, t: &Trajectory) -> Evaluation {
        match *self {
            Check::MilestoneWithin { milestone, min_ticks, max_ticks } => {
                milestone_within(t, milestone, min_ticks, max_ticks)
            }
            Check::SoftLock { window } => soft_lock(t, window),
            Check::NoLeak => no_leak(t),
            Check::NonNegativeCurrency => non_negative(t),
            Check::MonotonicProgress => monotonic(t),
            Check::MaxPurchaseGap { max_ticks } => purchase_gap(t, max_ticks),
            Check::DeadTimeRatio { max_ratio, idle_after } => dead_time(t, max_ratio, idle_after),
        }
    }
}

fn fail(kind: FailureKind, ticks: (u64, u64), message: String) -> BalanceCheckFailure {
    BalanceCheckFailure { kind, ticks, message }
}

fn start_tick(t: &Trajectory) -> u64 {
    t.first().map_or(0, Sample::tick)
}

fn milestone_within(t: &Trajectory, m: Milestone, min: u64, max: u64) -> Evaluation {
    let start = start_tick(t);
    let label = m.label();
    let Some(at) = m.reached_at(t) else {
        let end = t.final_tick();
        return Evaluation {
            failures: vec![fail(
                FailureKind::MilestoneNeverReached,
                (start, end),
                format!("{label} not reached in {} ticks", end - start),
            )],
            detail: "never reached".into(),
        };
    };
    let rel = at.saturating_sub(start);
    let failures = if rel < min {
        vec![fail(
            FailureKind::MilestoneOutOfBounds,
            (at, start + min),
            format!("{label} at tick {rel}, earlier than {min}"),
        )]
    } else if rel > max {
        vec![fail(
            FailureKind::MilestoneOutOfBounds,
            (start + max, at),
            format!("{label} at tick {rel}, later than {max}"),
        )]
    } else {
        Vec::new()
    };
    Evaluation { failures, detail: format!("reached at tick {rel}") }
}

fn completed(t: &Trajectory) -> bool {
    t.meta.words > 0 && t.last().is_some_and(|s| s.view.lexicon_size as usize >= t.meta.words)
}

fn soft_lock(t: &Trajectory, window: u64) -> Evaluation {
    let Some(first) = t.find(|s| s.view.total_owned() > 0) else {
        return Evaluation { failures: Vec::new(), detail: "no producer owned".into() };
    };
    let mut failures = Vec::new();
    let mut last = first.tick();
    let mut longest = 0;
    let from = last;
    for p in t.purchase_ticks().into_iter().filter(|&p| p > from) {
        let gap = p - last;
        longest = longest.max(gap);
        if gap > window {
            failures.push(fail(FailureKind::SoftLock, (last, p), format!("{gap} ticks without a purchase")));
        }
        last = p;
    }
    let end = t.final_tick();
    if !completed(t) && end - last > window {
        longest = longest.max(end - last);
        failures.push(fail(
            FailureKind::SoftLock,
            (last, end),
            format!("no purchase for the final {} ticks", end - last),
        ));
    }
    Evaluation { failures, detail: format!("longest stall {longest} ticks") }
}

fn no_leak(t: &Trajectory) -> Evaluation {
    let mut failures = Vec::new();
    for w in t.samples().windows(2) {
        let (a, b) = (&w[0], &w[1]);
        let tolerance = 1e-9 * a.view.currency.abs().max(1.0);
        if b.view.currency < a.view.currency - tolerance && !b.has_purchase() {
            failures.push(fail(
                FailureKind::Leak,
                (a.tick(), b.tick()),
                format!("currency fell {:.3} -> {:.3} without a purchase", a.view.currency, b.view.currency),
            ));
        }
    }
    let detail = format!("{} samples", t.samples().len());
    Evaluation { failures, detail }
}

fn non_negative(t: &Trajectory) -> Evaluation {
    let mut failures = Vec::new();
    let mut lowest = f64::INFINITY;
    for s in t.samples() {
        lowest = lowest.min(s.view.currency);
        if !(s.view.currency >= 0.0) {
            failures.push(fail(
                FailureKind::NegativeCurrency,
                (s.tick(), s.tick()),
                format!("currency {}", s.view.currency),
            ));
        }
    }
    Evaluation { failures, detail: format!("minimum {lowest:.2}") }
}

fn monotonic(t: &Trajectory) -> Evaluation {
    let mut failures = Vec::new();
    for w in t.samples().windows(2) {
        let (a, b) = (&w[0], &w[1]);
        let range = (a.tick(), b.tick());
        if b.view.lexicon_size < a.view.lexicon_size {
            failures.push(fail(
                FailureKind::Regression,
                range,
                format!("lexicon shrank {} -> {}", a.view.lexicon_size, b.view.lexicon_size),
            ));
        }
        for (key, &n) in &a.view.owned {
            if b.view.owned(key) < n {
                failures.push(fail(FailureKind::Regression, range, format!("{key} owned count shrank")));
            }
        }
        if !a.view.upgrades.is_subset(&b.view.upgrades) {
            failures.push(fail(FailureKind::Regression, range, "an upgrade was lost".into()));
        }
    }
    Evaluation { failures, detail: String::new() }
}

fn purchase_gap(t: &Trajectory, max_ticks: u64) -> Evaluation {
    let mut failures = Vec::new();
    let mut last = start_tick(t);
    let mut longest = 0;
    for p in t.purchase_ticks() {
        let gap = p.saturating_sub(last);
        longest = longest.max(gap);
        if gap > max_ticks {
            failures.push(fail(FailureKind::PurchaseGap, (last, p), format!("{gap} ticks between purchases")));
        }
        last = p;
    }
    Evaluation { failures, detail: format!("longest gap {longest} ticks") }
}

fn dead_time(t: &Trajectory, max_ratio: f64, idle_after: u64) -> Evaluation {
    let start = start_tick(t);
    let end = t.final_tick();
    let mut last = start;
    let mut dead = 0;
    for p in t.purchase_ticks().into_iter().chain([end]) {
        dead += p.saturating_sub(last).saturating_sub(idle_after);
        last = last.max(p);
    }
    let span = end.saturating_sub(start);
    let ratio = if span == 0 { 0.0 } else { dead as f64 / span as f64 };
    let failures = if ratio > max_ratio {
        vec![fail(
            FailureKind::DeadTime,
            (start, end),
            format!("{dead} of {span} ticks spent waiting ({:.1}%)", ratio * 100.0),
        )]
    } else {
        Vec::new()
    };
    Evaluation { failures, detail: format!("dead time {:.1}%", ratio * 100.0) }
}
