//! Presenter: the only bridge between a UI and the live engine.
//!
//! Reads are snapshots ([`EconomyStateView`], [`Offer`] lists). Writes are
//! intents: [`Presenter::submit_purchase`] queues the item on the player's
//! [`PlayerIntents`] and runs it through the engine's own settlement path, so a
//! live purchase obeys exactly the rules the headless checks exercise.
//!
//! [`Presenter::advance`] runs under a wall-clock budget. Ticks the budget cuts
//! off are not lost; they carry into the next call.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::content;
use crate::economy::{self, EconomyDefinition, Item, TuningConstants};
use crate::engine::{CancelToken, CatchUp, Engine, EconomyStateView, Event, Idle, PlayerIntents, Settlement};
use crate::error::{PurchaseRejected, Result, SnapshotError};
use crate::mechanics::{cost, currency};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferKind {
    Producer,
    Upgrade,
    Word,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub key: String,
    pub name: String,
    pub kind: OfferKind,
    pub cost: f64,
    pub affordable: bool,
    /// Seconds of current income until affordable; `None` with no income.
    pub wait_seconds: Option<f64>,
    /// Units held, for producers.
    pub owned: Option<u64>,
    /// Units of a producer the current balance buys in one go.
    pub max_units: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Applied {
    pub key: String,
    pub cost: f64,
    pub currency_after: f64,
    /// Reveals the purchase triggered.
    pub events: Vec<Event>,
}

/// Wall-clock time one [`Presenter::advance`] call may spend simulating.
pub const DEFAULT_ADVANCE_BUDGET: Duration = Duration::from_secs(2);

pub struct Presenter {
    engine: Engine,
    idle: Idle,
    intents: PlayerIntents,
    advance_budget: Duration,
    notifications: Vec<Event>,
}

impl Presenter {
    /// Generate content for `seed`, build the economy, start a fresh game.
    pub fn new(seed: u64, constants: &TuningConstants) -> Result<Self> {
        let model = content::generate(seed, &constants.content)?;
        let def = economy::build(&model, constants)?;
        Ok(Self::from_definition(Arc::new(def)))
    }

    pub fn from_definition(def: Arc<EconomyDefinition>) -> Self {
        Self::from_engine(Engine::new(def))
    }

    fn from_engine(engine: Engine) -> Self {
        let mut presenter = Self {
            engine,
            idle: Idle,
            intents: PlayerIntents::default(),
            advance_budget: DEFAULT_ADVANCE_BUDGET,
            notifications: Vec::new(),
        };
        presenter.flush_reveals();
        presenter
    }

    /// Move reveals the engine holds from construction into the notification
    /// queue, so they never ride along with a later purchase.
    fn flush_reveals(&mut self) {
        let report = self.engine.submit(&mut self.intents);
        self.notifications.extend(report.events);
    }

    pub fn set_advance_budget(&mut self, budget: Duration) {
        self.advance_budget = budget;
    }

    /// Resume a persisted game against the same definition.
    pub fn restore(&mut self, view: &EconomyStateView) -> std::result::Result<(), SnapshotError> {
        let engine = Engine::restore(Arc::clone(self.engine.definition()), view)?;
        self.engine = engine;
        self.notifications.clear();
        Ok(())
    }

    pub fn definition(&self) -> &EconomyDefinition {
        self.engine.definition()
    }

    pub fn current_state(&self) -> EconomyStateView {
        self.engine.view()
    }

    /// Income per second at the current state.
    pub fn income_rate(&self) -> f64 {
        let def = self.engine.definition();
        self.engine.state().income_per_tick(def) / def.globals().tick_seconds
    }

    /// Everything whose gate is open and that has not been bought, with its current price.
    pub fn purchasable(&self) -> Vec<Offer> {
        let def = self.engine.definition();
        let state = self.engine.state();
        let income = state.income_per_tick(def);
        let tick_seconds = def.globals().tick_seconds;
        state
            .available(def)
            .into_iter()
            .map(|(item, price)| {
                let (kind, owned, max_units) = match item {
                    Item::Producer(p) => {
                        let owned = state.owned(p);
                        let max = def
                            .producer(p)
                            .map(|s| cost::max_affordable(s.base_cost, s.growth, owned, state.currency()));
                        (OfferKind::Producer, Some(owned), max)
                    }
                    Item::Upgrade(_) => (OfferKind::Upgrade, None, None),
                    Item::Word(_) => (OfferKind::Word, None, None),
                };
                Offer {
                    key: def.key(item).unwrap_or_default().to_string(),
                    name: def.name(item).unwrap_or_default().to_string(),
                    kind,
                    cost: price,
                    affordable: currency::affordable(state.currency(), price),
                    wait_seconds: cost::ticks_to_afford(price, state.currency(), income)
                        .map(|ticks| ticks.ceil() * tick_seconds),
                    owned,
                    max_units,
                }
            })
            .collect()
    }

    pub fn submit_purchase(&mut self, key: &str) -> std::result::Result<Applied, PurchaseRejected> {
        let item = self.engine.definition().item(key).ok_or(PurchaseRejected::UnknownItem)?;
        self.intents.push(item);
        let report = self.engine.submit(&mut self.intents);
        let reveals: Vec<Event> = report
            .events
            .iter()
            .copied()
            .filter(|e| !matches!(e, Event::Purchased { .. }))
            .collect();
        self.notifications.extend(reveals.iter().copied());
        match report.settlements.first() {
            Some(&Settlement::Applied { cost, .. }) => Ok(Applied {
                key: key.to_string(),
                cost,
                currency_after: self.engine.state().currency(),
                events: reveals,
            }),
            Some(&Settlement::Rejected { reason, .. }) => Err(reason),
            None => Err(PurchaseRejected::UnknownItem),
        }
    }

    /// Let `elapsed` wall-clock time pass with no player input. Stops early
    /// once the advance budget is spent; `cancelled` is then set and the
    /// remaining ticks are applied by later calls.
    pub fn advance(&mut self, elapsed: Duration) -> CatchUp {
        let cancel = CancelToken::with_budget(self.advance_budget);
        let out = self.engine.catch_up_elapsed(elapsed, &mut self.idle, &cancel);
        self.notifications.extend(out.events.iter().copied());
        out
    }

    /// Reveals (unlocks, discoveries, texts) since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.notifications)
    }
}
