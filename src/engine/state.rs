//! Mutable economy state. Readable by anyone, writable only by the engine.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::content::{Lexicon, RootId, TextId, WordId};
use crate::economy::{EconomyDefinition, Effect, Item, ProducerId, UnlockPredicate, UpgradeId, UpgradeTarget};
use crate::error::{PurchaseRejected, SnapshotError};
use crate::mechanics::currency;

use super::view::{EconomyStateView, SNAPSHOT_VERSION};

/// Something the reveal phase (or a settlement) made visible.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Purchased { item: Item, cost: f64 },
    ProducerUnlocked(ProducerId),
    RootDiscovered(RootId),
    TextRevealed(TextId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct EconomyState {
    tick: u64,
    currency: f64,
    owned: Vec<u64>,
    upgrades: BTreeSet<UpgradeId>,
    lexicon: Lexicon,
    /// Product of multiplier effects per producer.
    mult: Vec<f64>,
    /// Sum of additive effects per producer.
    add: Vec<f64>,
    manual_mult: f64,
    manual_add: f64,
    text_mult: f64,
    text_add: f64,
    unlocked: Vec<bool>,
    root_progress: Vec<u32>,
    roots_discovered: Vec<bool>,
    text_progress: Vec<u32>,
    texts_revealed: Vec<bool>,
}

impl EconomyState {
    pub(crate) fn new(def: &EconomyDefinition) -> Self {
        let producers = def.producers().len();
        Self {
            tick: 0,
            currency: def.globals().starting_currency,
            owned: vec![0; producers],
            upgrades: BTreeSet::new(),
            lexicon: Lexicon::default(),
            mult: vec![1.0; producers],
            add: vec![0.0; producers],
            manual_mult: 1.0,
            manual_add: 0.0,
            text_mult: 1.0,
            text_add: 0.0,
            unlocked: vec![false; producers],
            root_progress: vec![0; def.roots().len()],
            roots_discovered: vec![false; def.roots().len()],
            text_progress: vec![0; def.texts().len()],
            texts_revealed: vec![false; def.texts().len()],
        }
    }

    /// Rebuild a state from a persisted view. Derived bookkeeping (effects,
    /// discoveries, reveals) is recomputed, so the result is what playing up to
    /// the view would have produced.
    pub(crate) fn from_view(def: &EconomyDefinition, view: &EconomyStateView) -> Result<Self, SnapshotError> {
        if view.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version { found: view.version, expected: SNAPSHOT_VERSION });
        }
        if !(view.currency >= 0.0) || !view.currency.is_finite() {
            return Err(SnapshotError::Currency(view.currency));
        }
        if view.lexicon_size as usize > def.words().len() {
            return Err(SnapshotError::LexiconOverflow { size: view.lexicon_size, words: def.words().len() });
        }

        let mut s = Self::new(def);
        s.tick = view.tick;
        s.currency = view.currency;
        for (key, &count) in &view.owned {
            match def.item(key) {
                Some(Item::Producer(p)) => s.owned[p.index()] = count,
                _ => return Err(SnapshotError::UnknownKey(key.clone())),
            }
        }
        for key in &view.upgrades {
            match def.item(key) {
                Some(Item::Upgrade(u)) => s.grant_upgrade(def, u),
                _ => return Err(SnapshotError::UnknownKey(key.clone())),
            }
        }
        for i in 0..view.lexicon_size {
            s.translate(def, WordId(i as u16));
        }
        // Everything already visible at save time stays silent on load.
        let _ = s.reveal(def);
        Ok(s)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }
    pub fn currency(&self) -> f64 {
        self.currency
    }
    pub fn owned(&self, p: ProducerId) -> u64 {
        self.owned.get(p.index()).copied().unwrap_or(0)
    }
    pub fn total_owned(&self) -> u64 {
        self.owned.iter().sum()
    }
    pub fn has_upgrade(&self, u: UpgradeId) -> bool {
        self.upgrades.contains(&u)
    }
    pub fn upgrades(&self) -> impl Iterator<Item = UpgradeId> + '_ {
        self.upgrades.iter().copied()
    }
    pub fn lexicon(&self) -> Lexicon {
        self.lexicon
    }
    pub fn lexicon_size(&self) -> u32 {
        self.lexicon.size()
    }
    pub fn is_unlocked(&self, p: ProducerId) -> bool {
        self.unlocked.get(p.index()).copied().unwrap_or(false)
    }
    /// Producers whose gate has opened, in id order.
    pub fn unlocked_producers(&self) -> Vec<ProducerId> {
        (0..self.unlocked.len()).filter(|&k| self.unlocked[k]).map(|k| ProducerId(k as u16)).collect()
    }
    pub fn roots_discovered(&self) -> u32 {
        self.roots_discovered.iter().filter(|&&d| d).count() as u32
    }
    pub fn root_discovered(&self, r: RootId) -> bool {
        self.roots_discovered.get(r.index()).copied().unwrap_or(false)
    }
    pub fn text_revealed(&self, t: TextId) -> bool {
        self.texts_revealed.get(t.index()).copied().unwrap_or(false)
    }

    pub fn all_words_translated(&self, def: &EconomyDefinition) -> bool {
        self.lexicon.size() as usize >= def.words().len()
    }

    pub fn unlock_met(&self, pred: &UnlockPredicate) -> bool {
        match *pred {
            UnlockPredicate::Always => true,
            UnlockPredicate::LexiconSize { size } => self.lexicon.size() >= size,
            UnlockPredicate::ProducerOwned { producer, count } => self.owned(producer) >= count,
        }
    }

    /// Output per second of one unit of `p`, effects included.
    pub fn unit_output(&self, def: &EconomyDefinition, p: ProducerId) -> f64 {
        match def.producer(p) {
            Some(spec) => spec.base_output * self.mult[p.index()] + self.add[p.index()],
            None => 0.0,
        }
    }

    /// Manual income per second, effects included.
    pub fn manual_rate(&self, def: &EconomyDefinition) -> f64 {
        def.globals().base_income * self.manual_mult + self.manual_add
    }

    /// Currency added by the next accrual phase.
    pub fn income_per_tick(&self, def: &EconomyDefinition) -> f64 {
        let mut per_second = self.manual_rate(def);
        for (k, &n) in self.owned.iter().enumerate() {
            if n > 0 {
                per_second += n as f64 * self.unit_output(def, ProducerId(k as u16));
            }
        }
        for (t, spec) in def.texts().iter().enumerate() {
            if self.texts_revealed[t] {
                per_second += (spec.rate_per_word * self.text_mult + self.text_add) * self.text_progress[t] as f64;
            }
        }
        per_second * def.globals().tick_seconds
    }

    /// Current price of `item`, or `None` if it is not in the definition.
    pub fn price(&self, def: &EconomyDefinition, item: Item) -> Option<f64> {
        match item {
            Item::Producer(p) => def.producer(p).map(|s| s.cost_at(self.owned(p))),
            Item::Upgrade(u) => def.upgrade(u).map(|s| s.cost),
            Item::Word(w) => def.word(w).map(|s| match s.root {
                Some(r) if self.root_discovered(r) => {
                    s.cost * def.roots().get(r.index()).map_or(1.0, |spec| spec.cost_multiplier)
                }
                _ => s.cost,
            }),
        }
    }

    /// Validity ignoring funds: unknown, then already purchased, then the unlock predicate.
    pub fn offerable(&self, def: &EconomyDefinition, item: Item) -> Result<f64, PurchaseRejected> {
        let cost = self.price(def, item).ok_or(PurchaseRejected::UnknownItem)?;
        let gate_open = match item {
            Item::Producer(p) => def.producer(p).is_some_and(|s| self.unlock_met(&s.unlock)),
            Item::Upgrade(u) => {
                if self.has_upgrade(u) {
                    return Err(PurchaseRejected::AlreadyPurchased);
                }
                def.upgrade(u).is_some_and(|s| self.unlock_met(&s.requires))
            }
            Item::Word(w) => {
                if self.lexicon.contains(w) {
                    return Err(PurchaseRejected::AlreadyPurchased);
                }
                w == self.lexicon.next()
            }
        };
        if gate_open { Ok(cost) } else { Err(PurchaseRejected::UnlockPredicateUnmet) }
    }

    /// Full settlement check: [`offerable`](Self::offerable), then funds.
    pub fn validate(&self, def: &EconomyDefinition, item: Item) -> Result<f64, PurchaseRejected> {
        let cost = self.offerable(def, item)?;
        if currency::affordable(self.currency, cost) {
            Ok(cost)
        } else {
            Err(PurchaseRejected::InsufficientFunds { cost, available: self.currency })
        }
    }

    /// Every item that could be bought given enough currency, in catalogue order.
    pub fn available(&self, def: &EconomyDefinition) -> Vec<(Item, f64)> {
        let producers = (0..def.producers().len()).map(|k| Item::Producer(ProducerId(k as u16)));
        let upgrades = (0..def.upgrades().len()).map(|u| Item::Upgrade(UpgradeId(u as u16)));
        let word = (!self.all_words_translated(def)).then(|| Item::Word(self.lexicon.next()));
        producers
            .chain(upgrades)
            .chain(word)
            .filter_map(|item| self.offerable(def, item).ok().map(|c| (item, c)))
            .collect()
    }

    /// Income gain per tick from buying `item` now, effects included.
    pub fn income_gain(&self, def: &EconomyDefinition, item: Item) -> f64 {
        let mut after = self.clone();
        after.apply(def, item);
        after.income_per_tick(def) - self.income_per_tick(def)
    }

    // ── mutation: engine only ───────────────────────────────────────────

    pub(crate) fn accrue(&mut self, amount: f64) {
        self.tick += 1;
        self.currency = currency::credit(self.currency, amount);
    }

    /// Validate, deduct and apply in one step. Nothing changes on rejection.
    pub(crate) fn settle(&mut self, def: &EconomyDefinition, item: Item) -> Result<f64, PurchaseRejected> {
        let cost = self.validate(def, item)?;
        let Some(rest) = currency::debit(self.currency, cost) else {
            return Err(PurchaseRejected::InsufficientFunds { cost, available: self.currency });
        };
        self.currency = rest;
        self.apply(def, item);
        Ok(cost)
    }

    /// Effect of owning `item`, without touching currency.
    pub(crate) fn apply(&mut self, def: &EconomyDefinition, item: Item) {
        match item {
            Item::Producer(p) => {
                if let Some(n) = self.owned.get_mut(p.index()) {
                    *n = n.saturating_add(1);
                }
            }
            Item::Upgrade(u) => self.grant_upgrade(def, u),
            Item::Word(w) => self.translate(def, w),
        }
    }

    pub(crate) fn spend(&mut self, cost: f64) {
        self.currency = (self.currency - cost).max(0.0);
    }

    fn grant_upgrade(&mut self, def: &EconomyDefinition, u: UpgradeId) {
        let Some(spec) = def.upgrade(u) else { return };
        if !self.upgrades.insert(u) {
            return;
        }
        for t in &spec.targets {
            let (mult, add) = match *t {
                UpgradeTarget::Producer(p) => match (self.mult.get_mut(p.index()), self.add.get_mut(p.index())) {
                    (Some(m), Some(a)) => (m, a),
                    _ => continue,
                },
                UpgradeTarget::Manual => (&mut self.manual_mult, &mut self.manual_add),
                UpgradeTarget::Texts => (&mut self.text_mult, &mut self.text_add),
            };
            match spec.effect {
                Effect::Multiplier(m) => *mult *= m,
                Effect::Additive(a) => *add += a,
            }
        }
    }

    fn translate(&mut self, def: &EconomyDefinition, w: WordId) {
        if !self.lexicon.discover(w) {
            return;
        }
        if let Some(r) = def.word(w).and_then(|s| s.root) {
            self.root_progress[r.index()] += 1;
        }
        for t in def.texts_of_word(w) {
            self.text_progress[t.index()] += 1;
        }
    }

    /// Reveal phase: flip every newly satisfied gate and report it.
    pub(crate) fn reveal(&mut self, def: &EconomyDefinition) -> Vec<Event> {
        let mut events = Vec::new();
        for (k, spec) in def.producers().iter().enumerate() {
            if !self.unlocked[k] && self.unlock_met(&spec.unlock) {
                self.unlocked[k] = true;
                events.push(Event::ProducerUnlocked(spec.id));
            }
        }
        for (r, spec) in def.roots().iter().enumerate() {
            if !self.roots_discovered[r] && self.root_progress[r] >= spec.discovery_threshold {
                self.roots_discovered[r] = true;
                events.push(Event::RootDiscovered(spec.root));
            }
        }
        for (t, spec) in def.texts().iter().enumerate() {
            if !self.texts_revealed[t] && self.lexicon.size() >= spec.unlock_lexicon {
                self.texts_revealed[t] = true;
                events.push(Event::TextRevealed(spec.text));
            }
        }
        events
    }

    pub fn view(&self, def: &EconomyDefinition) -> EconomyStateView {
        EconomyStateView {
            version: SNAPSHOT_VERSION,
            tick: self.tick,
            elapsed_seconds: self.tick as f64 * def.globals().tick_seconds,
            currency: self.currency,
            owned: def
                .producers()
                .iter()
                .map(|p| (p.key.clone(), self.owned[p.id.index()]))
                .collect(),
            upgrades: self
                .upgrades
                .iter()
                .filter_map(|&u| def.upgrade(u).map(|s| s.key.clone()))
                .collect(),
            lexicon_size: self.lexicon.size(),
        }
    }
}
