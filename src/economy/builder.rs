//! Content Model → Economy Definition.
//!
//! Producer `k` opens at lexicon milestone `k × words_per_producer`; every
//! `owned_gate_every`-th one is gated on its predecessor instead. Each producer
//! carries a ladder of upgrades priced off its own base cost; global upgrades act
//! on every producer, on manual income or on text income. Words are priced by
//! discovery position inside the configured tiers.

use tracing::debug;

use crate::content::{ContentModel, RootId, TextId, WordId};
use crate::economy::constants::{EconomyTuning, TuningConstants, UpgradeScope, WordTier};
use crate::economy::definition::{
    DefinitionParts, Effect, EconomyDefinition, Globals, ProducerId, ProducerSpec, RootSpec,
    TextSpec, UnlockPredicate, UpgradeId, UpgradeSpec, UpgradeTarget, WordSpec,
};
use crate::error::DefinitionError;

pub fn build(model: &ContentModel, constants: &TuningConstants) -> Result<EconomyDefinition, DefinitionError> {
    let t = &constants.economy;
    validate(t)?;
    if model.words.is_empty() {
        return Err(DefinitionError::EmptyLexicon);
    }
    let vocabulary = model.words.len();
    let wpp = t.words_per_producer as usize;

    let producers: Vec<ProducerSpec> = (0..vocabulary.div_ceil(wpp))
        .map(|k| producer(t, k))
        .collect();

    let mut upgrades = Vec::new();
    for p in &producers {
        for (r, &threshold) in t.upgrade_owned_thresholds.iter().enumerate() {
            let effect = if r == 0 {
                Effect::Additive(p.base_output * t.additive_fraction)
            } else {
                Effect::Multiplier(t.upgrade_multiplier)
            };
            upgrades.push(UpgradeSpec {
                id: UpgradeId(0),
                key: format!("upg_{:02}_{}", p.id.0, r),
                name: format!("{} Mk.{}", p.name, r + 1),
                cost: p.base_cost * t.upgrade_cost_factor * t.upgrade_cost_step.powi(r as i32),
                targets: vec![UpgradeTarget::Producer(p.id)],
                effect,
                requires: UnlockPredicate::ProducerOwned { producer: p.id, count: threshold },
            });
        }
    }
    let everyone: Vec<UpgradeTarget> = producers.iter().map(|p| UpgradeTarget::Producer(p.id)).collect();
    for (i, g) in t.global_upgrades.iter().enumerate() {
        let targets = match g.scope {
            UpgradeScope::Producers => everyone.clone(),
            UpgradeScope::Manual => vec![UpgradeTarget::Manual],
            UpgradeScope::Texts => vec![UpgradeTarget::Texts],
        };
        upgrades.push(UpgradeSpec {
            id: UpgradeId(0),
            key: format!("upg_global_{i}"),
            name: g.name.clone(),
            cost: g.cost,
            targets,
            effect: g.effect,
            requires: UnlockPredicate::LexiconSize { size: g.requires_lexicon.min(vocabulary as u32) },
        });
    }

    let words: Vec<WordSpec> = model
        .words
        .iter()
        .enumerate()
        .map(|(i, w)| WordSpec {
            word: WordId(i as u16),
            key: format!("word_{i:02}"),
            surface: w.surface.clone(),
            gloss: w.gloss.clone(),
            root: Some(w.primary_root()),
            cost: tier_cost(&t.word_tiers, i, vocabulary) * t.word_cost_scale,
        })
        .collect();

    let roots: Vec<RootSpec> = model
        .roots
        .iter()
        .enumerate()
        .map(|(i, r)| RootSpec {
            root: RootId(i as u16),
            key: format!("root_{i:02}"),
            form: r.form.clone(),
            gloss: r.gloss.clone(),
            words: model.words_of_root(r.id).map(|w| w.id).collect(),
            discovery_threshold: t.root_discovery_threshold,
            cost_multiplier: t.root_cost_multiplier,
        })
        .collect();

    let texts: Vec<TextSpec> = model
        .texts
        .iter()
        .enumerate()
        .map(|(i, x)| TextSpec {
            text: TextId(i as u16),
            key: format!("text_{i:02}"),
            name: x.name.clone(),
            words: model.unique_words_in_text(x.id),
            unlock_lexicon: x.unlock_lexicon.min(vocabulary as u32),
            rate_per_word: t.text_rate_per_word,
        })
        .collect();

    debug!(
        seed = model.seed,
        producers = producers.len(),
        upgrades = upgrades.len(),
        words = words.len(),
        "built economy definition"
    );

    EconomyDefinition::new(DefinitionParts {
        seed: Some(model.seed),
        globals: Globals {
            tick_seconds: t.tick_seconds,
            starting_currency: t.starting_currency,
            base_income: t.base_income,
        },
        producers,
        upgrades,
        words,
        roots,
        texts,
    })
}

fn producer(t: &EconomyTuning, k: usize) -> ProducerSpec {
    let unlock = if k == 0 {
        UnlockPredicate::Always
    } else if t.owned_gate_every > 0 && k % t.owned_gate_every as usize == 0 {
        UnlockPredicate::ProducerOwned { producer: ProducerId(k as u16 - 1), count: t.owned_gate_count }
    } else {
        UnlockPredicate::LexiconSize { size: (k * t.words_per_producer as usize) as u32 }
    };
    ProducerSpec {
        id: ProducerId(k as u16),
        key: format!("tool_{k:02}"),
        name: t
            .producer_names
            .get(k)
            .cloned()
            .unwrap_or_else(|| format!("Producer {}", k + 1)),
        base_cost: t.first_cost * t.cost_step.powi(k as i32),
        growth: t.first_growth + t.growth_step * k as f64,
        base_output: t.first_output * t.output_step.powi(k as i32),
        unlock,
    }
}

/// Price of the word at discovery position `i` of `n`: linear inside its tier's range.
pub fn tier_cost(tiers: &[WordTier], i: usize, n: usize) -> f64 {
    let frac = (i as f64 + 0.5) / n.max(1) as f64;
    let mut start = 0.0;
    for (j, tier) in tiers.iter().enumerate() {
        if frac <= tier.upto || j + 1 == tiers.len() {
            let span = (tier.upto - start).max(f64::EPSILON);
            let local = ((frac - start) / span).clamp(0.0, 1.0);
            return tier.cost.0 + (tier.cost.1 - tier.cost.0) * local;
        }
        start = tier.upto;
    }
    0.0
}

fn validate(t: &EconomyTuning) -> Result<(), DefinitionError> {
    let invalid = |name: &str, value: String| {
        Err(DefinitionError::InvalidConstant { name: format!("economy.{name}"), value })
    };
    if t.words_per_producer == 0 {
        return invalid("words_per_producer", "0".into());
    }
    if t.word_tiers.is_empty() {
        return invalid("word_tiers", "[]".into());
    }
    let mut prev = 0.0;
    for tier in &t.word_tiers {
        if !(tier.upto > prev) || tier.cost.0 <= 0.0 || tier.cost.1 < tier.cost.0 {
            return invalid("word_tiers", format!("{} {:?} up to {}", tier.name, tier.cost, tier.upto));
        }
        prev = tier.upto;
    }
    if !(t.word_cost_scale > 0.0) || !t.word_cost_scale.is_finite() {
        return invalid("word_cost_scale", t.word_cost_scale.to_string());
    }
    if !(t.cost_step > 0.0) || !(t.output_step > 0.0) {
        return invalid("cost_step/output_step", format!("{}/{}", t.cost_step, t.output_step));
    }
    Ok(())
}
