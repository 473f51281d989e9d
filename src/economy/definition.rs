//! Economy Definition: the immutable catalogue a run is played against.
//!
//! Ids are positions. [`EconomyDefinition::new`] renumbers every spec by its
//! index in [`DefinitionParts`], so `ProducerId(k)` is always `producers[k]` and
//! `WordId(i)` is always the `i`-th lexicon word.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::content::{RootId, TextId, WordId};
use crate::error::DefinitionError;
use crate::mechanics::cost;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProducerId(pub u16);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UpgradeId(pub u16);

impl ProducerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
impl UpgradeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Anything a policy (or a player) can ask to buy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Item {
    Producer(ProducerId),
    Upgrade(UpgradeId),
    /// Translate a word; only the next lexicon word is ever valid.
    Word(WordId),
}

/// Gate on an item. These three kinds are the whole vocabulary of gating.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnlockPredicate {
    Always,
    LexiconSize { size: u32 },
    ProducerOwned { producer: ProducerId, count: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Effect {
    /// Multiplies the base rate of each target.
    Multiplier(f64),
    /// Flat bonus per second: per owned unit, per translated text word, or to manual effort.
    Additive(f64),
}

/// What an upgrade's effect applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum UpgradeTarget {
    Producer(ProducerId),
    /// The player's own effort, [`Globals::base_income`].
    Manual,
    /// Income from every revealed text.
    Texts,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProducerSpec {
    pub id: ProducerId,
    pub key: String,
    pub name: String,
    pub base_cost: f64,
    pub growth: f64,
    /// Currency per second per owned unit.
    pub base_output: f64,
    pub unlock: UnlockPredicate,
}

impl ProducerSpec {
    /// Price of the next unit with `owned` units held.
    #[inline]
    pub fn cost_at(&self, owned: u64) -> f64 {
        cost::unit_cost(self.base_cost, self.growth, owned)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeSpec {
    pub id: UpgradeId,
    pub key: String,
    pub name: String,
    pub cost: f64,
    pub targets: Vec<UpgradeTarget>,
    pub effect: Effect,
    pub requires: UnlockPredicate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordSpec {
    pub word: WordId,
    pub key: String,
    pub surface: String,
    pub gloss: String,
    /// Family used for root discovery.
    pub root: Option<RootId>,
    /// Price before any root discount.
    pub cost: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RootSpec {
    pub root: RootId,
    pub key: String,
    pub form: String,
    pub gloss: String,
    pub words: Vec<WordId>,
    /// Translated words of this family before the root is discovered.
    pub discovery_threshold: u32,
    /// Applied to the family's word prices once discovered.
    pub cost_multiplier: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextSpec {
    pub text: TextId,
    pub key: String,
    pub name: String,
    /// Distinct words of the text.
    pub words: Vec<WordId>,
    pub unlock_lexicon: u32,
    /// Income per second per translated word, once revealed.
    pub rate_per_word: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Globals {
    pub tick_seconds: f64,
    pub starting_currency: f64,
    /// Income per second that needs no producer.
    pub base_income: f64,
}

impl Default for Globals {
    fn default() -> Self {
        Self { tick_seconds: 1.0, starting_currency: 0.0, base_income: 0.0 }
    }
}

/// Unvalidated input to [`EconomyDefinition::new`].
#[derive(Clone, Debug, Default)]
pub struct DefinitionParts {
    pub seed: Option<u64>,
    pub globals: Globals,
    pub producers: Vec<ProducerSpec>,
    pub upgrades: Vec<UpgradeSpec>,
    pub words: Vec<WordSpec>,
    pub roots: Vec<RootSpec>,
    pub texts: Vec<TextSpec>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EconomyDefinition {
    seed: Option<u64>,
    globals: Globals,
    producers: Vec<ProducerSpec>,
    upgrades: Vec<UpgradeSpec>,
    words: Vec<WordSpec>,
    roots: Vec<RootSpec>,
    texts: Vec<TextSpec>,
    items: BTreeMap<String, Item>,
    texts_of_word: Vec<Vec<TextId>>,
}

impl EconomyDefinition {
    pub fn new(parts: DefinitionParts) -> Result<Self, DefinitionError> {
        let DefinitionParts { seed, globals, mut producers, mut upgrades, mut words, mut roots, mut texts } =
            parts;

        for (i, p) in producers.iter_mut().enumerate() {
            p.id = ProducerId(i as u16);
        }
        for (i, u) in upgrades.iter_mut().enumerate() {
            u.id = UpgradeId(i as u16);
        }
        for (i, w) in words.iter_mut().enumerate() {
            w.word = WordId(i as u16);
        }
        for (i, r) in roots.iter_mut().enumerate() {
            r.root = RootId(i as u16);
        }
        for (i, t) in texts.iter_mut().enumerate() {
            t.text = TextId(i as u16);
        }

        check_globals(&globals)?;

        let mut keys = BTreeSet::new();
        let mut items = BTreeMap::new();
        let mut claim = |key: &str, item: Option<Item>| -> Result<(), DefinitionError> {
            if !keys.insert(key.to_string()) {
                return Err(DefinitionError::DuplicateKey(key.to_string()));
            }
            if let Some(item) = item {
                items.insert(key.to_string(), item);
            }
            Ok(())
        };
        for p in &producers {
            claim(&p.key, Some(Item::Producer(p.id)))?;
        }
        for u in &upgrades {
            claim(&u.key, Some(Item::Upgrade(u.id)))?;
        }
        for w in &words {
            claim(&w.key, Some(Item::Word(w.word)))?;
        }
        for r in &roots {
            claim(&r.key, None)?;
        }
        for t in &texts {
            claim(&t.key, None)?;
        }

        let ctx = Refs { producers: producers.len(), words: words.len(), roots: roots.len() };

        for (k, p) in producers.iter().enumerate() {
            if !(p.growth > 1.0) || !p.growth.is_finite() {
                return Err(DefinitionError::NonMonotonicCost { producer: p.key.clone(), growth: p.growth });
            }
            if !(p.base_output > 0.0) || !p.base_output.is_finite() {
                return Err(DefinitionError::ZeroOutput { producer: p.key.clone(), output: p.base_output });
            }
            positive(&p.key, "base_cost", p.base_cost)?;
            ctx.predicate(&p.key, &p.unlock, Some(k))?;
        }

        for u in &upgrades {
            positive(&u.key, "cost", u.cost)?;
            if u.targets.is_empty() {
                return Err(DefinitionError::InvalidConstant {
                    name: format!("{}.targets", u.key),
                    value: "[]".into(),
                });
            }
            for t in &u.targets {
                if let UpgradeTarget::Producer(p) = *t {
                    ctx.producer(&u.key, p)?;
                }
            }
            match u.effect {
                Effect::Multiplier(m) => positive(&u.key, "multiplier", m)?,
                Effect::Additive(a) if !(a >= 0.0) || !a.is_finite() => {
                    return Err(DefinitionError::InvalidConstant {
                        name: format!("{}.additive", u.key),
                        value: a.to_string(),
                    });
                }
                Effect::Additive(_) => {}
            }
            ctx.predicate(&u.key, &u.requires, None)?;
        }

        for w in &words {
            positive(&w.key, "cost", w.cost)?;
            if let Some(r) = w.root {
                ctx.root(&w.key, r)?;
            }
        }

        for r in &roots {
            for &w in &r.words {
                ctx.word(&r.key, w)?;
            }
            if r.discovery_threshold == 0 {
                return Err(DefinitionError::InvalidConstant {
                    name: format!("{}.discovery_threshold", r.key),
                    value: "0".into(),
                });
            }
            positive(&r.key, "cost_multiplier", r.cost_multiplier)?;
        }

        let mut texts_of_word = vec![Vec::new(); words.len()];
        for t in &texts {
            for &w in &t.words {
                ctx.word(&t.key, w)?;
                if !texts_of_word[w.index()].contains(&t.text) {
                    texts_of_word[w.index()].push(t.text);
                }
            }
            ctx.lexicon(&t.key, t.unlock_lexicon)?;
            if !(t.rate_per_word >= 0.0) || !t.rate_per_word.is_finite() {
                return Err(DefinitionError::InvalidConstant {
                    name: format!("{}.rate_per_word", t.key),
                    value: t.rate_per_word.to_string(),
                });
            }
        }

        debug!(
            producers = producers.len(),
            upgrades = upgrades.len(),
            words = words.len(),
            roots = roots.len(),
            texts = texts.len(),
            "economy definition validated"
        );

        Ok(Self { seed, globals, producers, upgrades, words, roots, texts, items, texts_of_word })
    }

    /// Content seed this definition was built from, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
    pub fn globals(&self) -> &Globals {
        &self.globals
    }
    pub fn producers(&self) -> &[ProducerSpec] {
        &self.producers
    }
    pub fn upgrades(&self) -> &[UpgradeSpec] {
        &self.upgrades
    }
    pub fn words(&self) -> &[WordSpec] {
        &self.words
    }
    pub fn roots(&self) -> &[RootSpec] {
        &self.roots
    }
    pub fn texts(&self) -> &[TextSpec] {
        &self.texts
    }

    pub fn producer(&self, id: ProducerId) -> Option<&ProducerSpec> {
        self.producers.get(id.index())
    }
    pub fn upgrade(&self, id: UpgradeId) -> Option<&UpgradeSpec> {
        self.upgrades.get(id.index())
    }
    pub fn word(&self, id: WordId) -> Option<&WordSpec> {
        self.words.get(id.index())
    }

    /// Purchasable item behind a stable key.
    pub fn item(&self, key: &str) -> Option<Item> {
        self.items.get(key).copied()
    }

    pub fn contains(&self, item: Item) -> bool {
        match item {
            Item::Producer(p) => p.index() < self.producers.len(),
            Item::Upgrade(u) => u.index() < self.upgrades.len(),
            Item::Word(w) => w.index() < self.words.len(),
        }
    }

    pub fn key(&self, item: Item) -> Option<&str> {
        match item {
            Item::Producer(p) => self.producer(p).map(|s| s.key.as_str()),
            Item::Upgrade(u) => self.upgrade(u).map(|s| s.key.as_str()),
            Item::Word(w) => self.word(w).map(|s| s.key.as_str()),
        }
    }

    pub fn name(&self, item: Item) -> Option<&str> {
        match item {
            Item::Producer(p) => self.producer(p).map(|s| s.name.as_str()),
            Item::Upgrade(u) => self.upgrade(u).map(|s| s.name.as_str()),
            Item::Word(w) => self.word(w).map(|s| s.surface.as_str()),
        }
    }

    pub fn texts_of_word(&self, word: WordId) -> &[TextId] {
        self.texts_of_word.get(word.index()).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn check_globals(g: &Globals) -> Result<(), DefinitionError> {
    positive("globals", "tick_seconds", g.tick_seconds)?;
    for (name, v) in [("starting_currency", g.starting_currency), ("base_income", g.base_income)] {
        if !(v >= 0.0) || !v.is_finite() {
            return Err(DefinitionError::InvalidConstant {
                name: format!("globals.{name}"),
                value: v.to_string(),
            });
        }
    }
    Ok(())
}

fn positive(owner: &str, field: &str, v: f64) -> Result<(), DefinitionError> {
    if v > 0.0 && v.is_finite() {
        Ok(())
    } else {
        Err(DefinitionError::InvalidConstant { name: format!("{owner}.{field}"), value: v.to_string() })
    }
}

/// Reference resolution against the entity counts of one definition.
struct Refs {
    producers: usize,
    words: usize,
    roots: usize,
}

impl Refs {
    fn producer(&self, owner: &str, p: ProducerId) -> Result<(), DefinitionError> {
        if p.index() < self.producers {
            Ok(())
        } else {
            Err(dangling(owner, format!("producer #{}", p.0)))
        }
    }

    fn word(&self, owner: &str, w: WordId) -> Result<(), DefinitionError> {
        if w.index() < self.words {
            Ok(())
        } else {
            Err(dangling(owner, format!("word #{}", w.0)))
        }
    }

    fn root(&self, owner: &str, r: RootId) -> Result<(), DefinitionError> {
        if r.index() < self.roots {
            Ok(())
        } else {
            Err(dangling(owner, format!("root #{}", r.0)))
        }
    }

    fn lexicon(&self, owner: &str, size: u32) -> Result<(), DefinitionError> {
        if size as usize <= self.words {
            Ok(())
        } else {
            Err(dangling(owner, format!("lexicon size {size}")))
        }
    }

    /// `position` is the owning producer's index; producers may only look backwards.
    fn predicate(&self, owner: &str, pred: &UnlockPredicate, position: Option<usize>) -> Result<(), DefinitionError> {
        match *pred {
            UnlockPredicate::Always => Ok(()),
            UnlockPredicate::LexiconSize { size } => self.lexicon(owner, size),
            UnlockPredicate::ProducerOwned { producer, .. } => {
                self.producer(owner, producer)?;
                match position {
                    Some(k) if producer.index() >= k => Err(DefinitionError::ForwardReference {
                        owner: owner.to_string(),
                        target: format!("producer #{}", producer.0),
                    }),
                    _ => Ok(()),
                }
            }
        }
    }
}

fn dangling(owner: &str, target: String) -> DefinitionError {
    DefinitionError::DanglingReference { owner: owner.to_string(), target }
}
