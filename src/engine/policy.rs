//! Decision policies: who decides what to buy each tick.
//!
//! The engine treats every policy alike. It asks for an ordered intent list
//! after accrual and settles it; a policy that asks for something invalid just
//! collects a rejection.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::economy::{EconomyDefinition, Item};
use crate::mechanics::{cost, currency};

use super::state::EconomyState;

/// Upper bound on intents one synthetic policy plans per tick.
const MAX_INTENTS_PER_TICK: usize = 64;

pub trait Policy {
    fn name(&self) -> &str;

    /// Ordered purchase intents for the current (post-accrual) state.
    fn decide(&mut self, def: &EconomyDefinition, state: &EconomyState) -> Vec<Item>;
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn decide(&mut self, def: &EconomyDefinition, state: &EconomyState) -> Vec<Item> {
        (**self).decide(def, state)
    }
}

/// Buys nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Idle;

impl Policy for Idle {
    fn name(&self) -> &str {
        "idle"
    }
    fn decide(&mut self, _def: &EconomyDefinition, _state: &EconomyState) -> Vec<Item> {
        Vec::new()
    }
}

/// Repeatedly buys the cheapest available item while it is affordable.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyCheapest;

impl Policy for GreedyCheapest {
    fn name(&self) -> &str {
        "greedy_cheapest"
    }

    fn decide(&mut self, def: &EconomyDefinition, state: &EconomyState) -> Vec<Item> {
        plan(def, state, |def, s| {
            s.available(def).into_iter().min_by(|a, b| a.1.total_cmp(&b.1))
        })
    }
}

/// Translates the next word the moment it is affordable; otherwise buys the
/// income item with the shortest payback, if that payback fits the horizon.
#[derive(Clone, Copy, Debug)]
pub struct MilestoneRusher {
    pub payback_ticks: f64,
}

impl Policy for MilestoneRusher {
    fn name(&self) -> &str {
        "milestone_rusher"
    }

    fn decide(&mut self, def: &EconomyDefinition, state: &EconomyState) -> Vec<Item> {
        let horizon = self.payback_ticks;
        plan(def, state, |def, s| {
            let available = s.available(def);
            if let Some(&word) = available.iter().find(|(i, _)| matches!(i, Item::Word(_))) {
                if currency::affordable(s.currency(), word.1) {
                    return Some(word);
                }
            }
            available
                .into_iter()
                .filter(|(i, _)| !matches!(i, Item::Word(_)))
                .map(|(i, c)| (i, c, cost::payback(c, s.income_gain(def, i))))
                .filter(|&(_, _, p)| p <= horizon)
                .min_by(|a, b| a.2.total_cmp(&b.2))
                .map(|(i, c, _)| (i, c))
        })
    }
}

/// Greedy planning against a scratch copy: `choose` proposes one item; planning
/// stops at the first proposal that is missing or unaffordable.
fn plan<F>(def: &EconomyDefinition, state: &EconomyState, mut choose: F) -> Vec<Item>
where
    F: FnMut(&EconomyDefinition, &EconomyState) -> Option<(Item, f64)>,
{
    let mut intents = Vec::new();
    let mut scratch: Option<EconomyState> = None;
    while intents.len() < MAX_INTENTS_PER_TICK {
        let current = scratch.as_ref().unwrap_or(state);
        let Some((item, price)) = choose(def, current) else { break };
        if !currency::affordable(current.currency(), price) {
            break;
        }
        let mut next = current.clone();
        next.spend(price);
        next.apply(def, item);
        intents.push(item);
        scratch = Some(next);
    }
    intents
}

/// Fixed `(tick, item)` schedule. Entries whose tick has passed are emitted at
/// the next decision.
#[derive(Clone, Debug, Default)]
pub struct Scripted {
    script: Vec<(u64, Item)>,
    cursor: usize,
}

impl Scripted {
    pub fn new(mut script: Vec<(u64, Item)>) -> Self {
        script.sort_by_key(|&(t, _)| t);
        Self { script, cursor: 0 }
    }
}

impl Policy for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn decide(&mut self, _def: &EconomyDefinition, state: &EconomyState) -> Vec<Item> {
        let mut out = Vec::new();
        while let Some(&(t, item)) = self.script.get(self.cursor) {
            if t > state.tick() {
                break;
            }
            out.push(item);
            self.cursor += 1;
        }
        out
    }
}

/// Intents queued by a live player, drained in submission order.
#[derive(Clone, Debug, Default)]
pub struct PlayerIntents {
    queue: VecDeque<Item>,
}

impl PlayerIntents {
    pub fn push(&mut self, item: Item) {
        self.queue.push_back(item);
    }
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Policy for PlayerIntents {
    fn name(&self) -> &str {
        "player"
    }
    fn decide(&mut self, _def: &EconomyDefinition, _state: &EconomyState) -> Vec<Item> {
        self.queue.drain(..).collect()
    }
}

/// Synthetic policies selectable from configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyKind {
    Idle,
    GreedyCheapest,
    MilestoneRusher { payback_ticks: f64 },
}

impl PolicyKind {
    pub fn build(&self) -> Box<dyn Policy + Send> {
        match *self {
            PolicyKind::Idle => Box::new(Idle),
            PolicyKind::GreedyCheapest => Box::new(GreedyCheapest),
            PolicyKind::MilestoneRusher { payback_ticks } => Box::new(MilestoneRusher { payback_ticks }),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PolicyKind::Idle => "idle",
            PolicyKind::GreedyCheapest => "greedy_cheapest",
            PolicyKind::MilestoneRusher { .. } => "milestone_rusher",
        }
    }
}
