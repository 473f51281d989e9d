//! Simulation Engine.
//!
//! One tick is three phases on a single [`EconomyState`]:
//! 1. **accrual**: credit `income_per_tick` (saturating);
//! 2. **decision**: ask the [`Policy`] for an ordered intent list;
//! 3. **settlement**: settle intents in order, each atomically, rejections
//!    recorded and skipped; then the reveal pass flips newly satisfied gates.
//!
//! [`Engine::step`] is the only transition. Catch-up and full runs are loops
//! over it, so a batch of `n` ticks is bit-identical to `n` single steps. The
//! same function backs the live presenter.

mod cancel;
mod policy;
mod state;
mod trajectory;
mod view;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

use crate::economy::{EconomyDefinition, Item};
use crate::error::{PurchaseRejected, SnapshotError};

pub use cancel::CancelToken;
pub use policy::{GreedyCheapest, Idle, MilestoneRusher, PlayerIntents, Policy, PolicyKind, Scripted};
pub use state::{EconomyState, Event};
pub use trajectory::{RunMeta, Sample, Trajectory};
pub use view::{EconomyStateView, SNAPSHOT_VERSION};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Settlement {
    Applied { item: Item, cost: f64 },
    Rejected { item: Item, reason: PurchaseRejected },
}

/// What one tick (or one out-of-tick submission) did.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// Currency credited by accrual; zero for submissions.
    pub income: f64,
    pub settlements: Vec<Settlement>,
    pub events: Vec<Event>,
}

impl TickReport {
    pub fn rejections(&self) -> impl Iterator<Item = (Item, PurchaseRejected)> + '_ {
        self.settlements.iter().filter_map(|s| match *s {
            Settlement::Rejected { item, reason } => Some((item, reason)),
            Settlement::Applied { .. } => None,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatchUp {
    pub requested: u64,
    pub applied: u64,
    pub cancelled: bool,
    pub rejections: u64,
    pub events: Vec<Event>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLimits {
    pub max_ticks: u64,
    pub snapshot_interval: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StopCondition {
    Never,
    AllProducersUnlocked,
    AllWordsTranslated,
    LexiconSize(u32),
    AnyOf(Vec<StopCondition>),
}

impl StopCondition {
    pub fn is_met(&self, def: &EconomyDefinition, state: &EconomyState) -> bool {
        match self {
            StopCondition::Never => false,
            StopCondition::AllProducersUnlocked => {
                def.producers().iter().all(|p| state.is_unlocked(p.id))
            }
            StopCondition::AllWordsTranslated => state.all_words_translated(def),
            StopCondition::LexiconSize(n) => state.lexicon_size() >= *n,
            StopCondition::AnyOf(all) => all.iter().any(|c| c.is_met(def, state)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Condition,
    TickBudget,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub trajectory: Trajectory,
    pub stop: StopReason,
    pub ticks: u64,
    /// Rejection counts by reason label.
    pub rejections: BTreeMap<String, u64>,
}

pub struct Engine {
    def: Arc<EconomyDefinition>,
    state: EconomyState,
    /// Elapsed seconds not yet worth a whole tick.
    carry_seconds: f64,
    /// Reveals not yet reported (the initial reveal happens at construction).
    pending: Vec<Event>,
}

impl Engine {
    pub fn new(def: Arc<EconomyDefinition>) -> Self {
        let mut state = EconomyState::new(&def);
        let pending = state.reveal(&def);
        Self { def, state, carry_seconds: 0.0, pending }
    }

    /// Resume from a persisted view.
    pub fn restore(def: Arc<EconomyDefinition>, view: &EconomyStateView) -> Result<Self, SnapshotError> {
        let state = EconomyState::from_view(&def, view)?;
        Ok(Self { def, state, carry_seconds: 0.0, pending: Vec::new() })
    }

    pub fn definition(&self) -> &Arc<EconomyDefinition> {
        &self.def
    }

    pub fn state(&self) -> &EconomyState {
        &self.state
    }

    pub fn view(&self) -> EconomyStateView {
        self.state.view(&self.def)
    }

    pub fn carry_seconds(&self) -> f64 {
        self.carry_seconds
    }

    /// One full tick.
    pub fn step(&mut self, policy: &mut dyn Policy) -> TickReport {
        let income = self.state.income_per_tick(&self.def);
        self.state.accrue(income);
        self.decide_and_settle(policy, income)
    }

    /// Decision and settlement at the current tick, without accrual.
    pub fn submit(&mut self, policy: &mut dyn Policy) -> TickReport {
        self.decide_and_settle(policy, 0.0)
    }

    fn decide_and_settle(&mut self, policy: &mut dyn Policy, income: f64) -> TickReport {
        let intents = policy.decide(&self.def, &self.state);
        let tick = self.state.tick();
        let mut events = std::mem::take(&mut self.pending);
        let mut settlements = Vec::with_capacity(intents.len());

        for item in intents {
            match self.state.settle(&self.def, item) {
                Ok(cost) => {
                    trace!(tick, ?item, cost, "purchase settled");
                    events.push(Event::Purchased { item, cost });
                    settlements.push(Settlement::Applied { item, cost });
                }
                Err(reason) => {
                    trace!(tick, ?item, reason = reason.label(), "purchase rejected");
                    settlements.push(Settlement::Rejected { item, reason });
                }
            }
        }
        events.extend(self.state.reveal(&self.def));

        TickReport { tick, income, settlements, events }
    }

    /// Apply `ticks` ticks, polling `cancel` before each one. On cancellation
    /// the state is that of the last completed tick.
    pub fn catch_up(&mut self, ticks: u64, policy: &mut dyn Policy, cancel: &CancelToken) -> CatchUp {
        let mut out = CatchUp { requested: ticks, ..CatchUp::default() };
        for _ in 0..ticks {
            if cancel.is_cancelled() {
                out.cancelled = true;
                warn!(requested = ticks, applied = out.applied, "catch-up cancelled");
                break;
            }
            let report = self.step(policy);
            out.applied += 1;
            out.rejections += report.rejections().count() as u64;
            out.events.extend(report.events);
        }
        out
    }

    /// Convert elapsed time into whole ticks; the remainder (and any ticks a
    /// cancellation left unapplied) carries into the next call.
    pub fn catch_up_elapsed(&mut self, elapsed: Duration, policy: &mut dyn Policy, cancel: &CancelToken) -> CatchUp {
        let tick_seconds = self.def.globals().tick_seconds;
        let total = self.carry_seconds + elapsed.as_secs_f64();
        let whole = (total / tick_seconds).floor();
        let ticks = if whole.is_finite() && whole > 0.0 { whole as u64 } else { 0 };
        self.carry_seconds = (total - ticks as f64 * tick_seconds).max(0.0);

        let out = self.catch_up(ticks, policy, cancel);
        if out.cancelled {
            self.carry_seconds += (ticks - out.applied) as f64 * tick_seconds;
        }
        out
    }

    /// Record a trajectory until the stop condition holds, `max_ticks` ticks
    /// have been applied, or `cancel` fires.
    pub fn run(
        &mut self,
        policy: &mut dyn Policy,
        limits: &RunLimits,
        stop: &StopCondition,
        cancel: &CancelToken,
    ) -> Run {
        let meta = RunMeta {
            seed: self.def.seed(),
            policy: policy.name().to_string(),
            producers: self.def.producers().len(),
            words: self.def.words().len(),
            roots: self.def.roots().len(),
            tick_seconds: self.def.globals().tick_seconds,
        };
        let mut trajectory = Trajectory::new(meta);
        let start = self.state.tick();
        let interval = limits.snapshot_interval.max(1);
        let mut rejections: BTreeMap<String, u64> = BTreeMap::new();

        let pending = std::mem::take(&mut self.pending);
        trajectory.push(self.sample(pending));

        let reason = loop {
            if stop.is_met(&self.def, &self.state) {
                break StopReason::Condition;
            }
            if self.state.tick() - start >= limits.max_ticks {
                break StopReason::TickBudget;
            }
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            let report = self.step(policy);
            for (_, reason) in report.rejections() {
                *rejections.entry(reason.label().to_string()).or_insert(0) += 1;
            }
            if !report.events.is_empty() || (report.tick - start) % interval == 0 {
                trajectory.push(self.sample(report.events));
            }
        };

        if trajectory.final_tick() != self.state.tick() {
            trajectory.push(self.sample(Vec::new()));
        }

        let ticks = self.state.tick() - start;
        match reason {
            StopReason::TickBudget => warn!(policy = policy.name(), ticks, "run exhausted its tick budget"),
            StopReason::Cancelled => warn!(policy = policy.name(), ticks, "run cancelled"),
            StopReason::Condition => {}
        }
        info!(
            policy = policy.name(),
            seed = ?self.def.seed(),
            ticks,
            lexicon = self.state.lexicon_size(),
            stop = ?reason,
            "run finished"
        );

        Run { trajectory, stop: reason, ticks, rejections }
    }

    fn sample(&self, events: Vec<Event>) -> Sample {
        Sample {
            view: self.view(),
            income_per_tick: self.state.income_per_tick(&self.def),
            unlocked: self.state.unlocked_producers(),
            roots_discovered: self.state.roots_discovered(),
            events,
        }
    }
}
