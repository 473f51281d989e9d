use std::collections::BTreeSet;

use bevy_prng::WyRand;
use tracing::debug;

use super::pools::{AFFIXES, CATEGORIES, CODAS, NUCLEI, ONSETS, TEXT_NAMES, glosses};
use super::{
    Affix, AffixId, AffixKind, ContentModel, ContentTuning, Root, RootId, SemanticCategory, Text,
    TextId, Word, WordId,
};
use crate::error::ContentGenerationError;
use crate::mechanics::stoch;

/// Draw attempts allowed for the whole root inventory.
const ROOT_DRAW_CEILING: usize = 10_000;

/// Generate a complete content model. Identical `(seed, tuning)` ⇒ identical model.
///
/// Words are derived in rounds: round 0 admits every bare root, each later round
/// applies affixes to every root (one affix in round 1, two from round 2) and adds
/// one two-root compound from round 2 on. A candidate whose surface form already
/// exists is dropped. Fails with [`ContentGenerationError::VocabularyShortfall`]
/// when `max_derivation_rounds` rounds cannot reach `target_vocabulary`.
pub fn generate(seed: u64, tuning: &ContentTuning) -> Result<ContentModel, ContentGenerationError> {
    validate(tuning)?;
    let mut rng = stoch::seeded(seed);

    let needed = tuning.root_count + AFFIXES.len();
    if needed > tuning.alphabet_size {
        return Err(ContentGenerationError::AlphabetExhausted {
            needed,
            available: tuning.alphabet_size,
        });
    }
    let mut alphabet: Vec<u8> = (0..tuning.alphabet_size).map(|g| g as u8).collect();
    stoch::shuffle(&mut rng, &mut alphabet);

    let roots = draw_roots(&mut rng, tuning, &alphabet)?;
    let affixes: Vec<Affix> = AFFIXES
        .iter()
        .enumerate()
        .map(|(i, &(form, kind, weight, pattern))| Affix {
            id: AffixId(i as u8),
            form: form.to_string(),
            kind,
            weight,
            pattern: pattern.to_string(),
            glyph: alphabet[roots.len() + i],
        })
        .collect();

    let (words, rounds) = derive_words(&mut rng, tuning, &roots, &affixes)?;
    debug!(seed, words = words.len(), rounds, "derived vocabulary");

    let texts = compose_texts(&mut rng, tuning, &roots, &words);
    Ok(ContentModel { seed, roots, affixes, words, texts })
}

fn validate(t: &ContentTuning) -> Result<(), ContentGenerationError> {
    let invalid = |name: &'static str, value: String| {
        Err(ContentGenerationError::InvalidConstant { name, value })
    };
    if t.root_count == 0 || t.root_count > 200 {
        return invalid("root_count", t.root_count.to_string());
    }
    if t.target_vocabulary == 0 {
        return invalid("target_vocabulary", t.target_vocabulary.to_string());
    }
    if t.alphabet_size > 256 {
        return invalid("alphabet_size", t.alphabet_size.to_string());
    }
    if t.text_slots.0 == 0 || t.text_slots.0 > t.text_slots.1 {
        return invalid("text_slots", format!("{:?}", t.text_slots));
    }
    if !(0.0..=1.0).contains(&t.text_category_bias) {
        return invalid("text_category_bias", t.text_category_bias.to_string());
    }
    Ok(())
}

fn draw_roots(
    rng: &mut WyRand,
    tuning: &ContentTuning,
    alphabet: &[u8],
) -> Result<Vec<Root>, ContentGenerationError> {
    let n = tuning.root_count;
    let mut categories: Vec<SemanticCategory> = (0..n).map(|i| CATEGORIES[i % CATEGORIES.len()]).collect();
    stoch::shuffle(rng, &mut categories);

    let mut pools: Vec<Vec<&str>> = CATEGORIES
        .iter()
        .map(|&c| {
            let mut p = glosses(c).to_vec();
            stoch::shuffle(rng, &mut p);
            p
        })
        .collect();

    let mut forms = BTreeSet::new();
    let mut attempts = 0usize;
    let mut roots = Vec::with_capacity(n);
    for (i, &category) in categories.iter().enumerate() {
        let form = loop {
            attempts += 1;
            if attempts > ROOT_DRAW_CEILING {
                return Err(ContentGenerationError::RootInventoryExhausted { requested: n });
            }
            let onset = stoch::pick(rng, ONSETS).copied().unwrap_or_default();
            let nucleus = stoch::pick(rng, NUCLEI).copied().unwrap_or_default();
            let coda = stoch::pick(rng, CODAS).copied().unwrap_or_default();
            let candidate = format!("{onset}{nucleus}{coda}");
            if forms.insert(candidate.clone()) {
                break candidate;
            }
        };
        let slot = CATEGORIES.iter().position(|&c| c == category).unwrap_or(0);
        let gloss = match pools[slot].pop() {
            Some(g) => g.to_string(),
            None => format!("{}-{}", category.label(), i),
        };
        roots.push(Root { id: RootId(i as u16), form, category, gloss, glyph: alphabet[i] });
    }
    Ok(roots)
}

struct Candidate {
    roots: Vec<RootId>,
    affixes: Vec<AffixId>,
}

struct Draft {
    roots: Vec<RootId>,
    affixes: Vec<AffixId>,
    surface: String,
    gloss: String,
    glyphs: Vec<u8>,
    complexity: u32,
}

struct Vocabulary<'a> {
    roots: &'a [Root],
    affixes: &'a [Affix],
    compound_penalty: u32,
    seen: BTreeSet<String>,
    drafts: Vec<Draft>,
}

impl<'a> Vocabulary<'a> {
    fn len(&self) -> usize {
        self.drafts.len()
    }

    /// Render and keep the candidate unless its surface form is taken.
    fn admit(&mut self, c: Candidate) -> bool {
        let mut surface: String = c.roots.iter().map(|r| self.roots[r.index()].form.as_str()).collect();
        let mut gloss = c
            .roots
            .iter()
            .map(|r| self.roots[r.index()].gloss.as_str())
            .collect::<Vec<_>>()
            .join("-");
        let mut glyphs: Vec<u8> = c.roots.iter().map(|r| self.roots[r.index()].glyph).collect();
        let mut complexity: u32 = c.roots.iter().map(|r| self.roots[r.index()].form.len() as u32).sum();
        complexity += self.compound_penalty * (c.roots.len() as u32).saturating_sub(1);

        for a in &c.affixes {
            let affix = &self.affixes[a.index()];
            match affix.kind {
                AffixKind::Prefix => {
                    surface.insert_str(0, &affix.form);
                    glyphs.insert(0, affix.glyph);
                }
                AffixKind::Suffix => {
                    surface.push_str(&affix.form);
                    glyphs.push(affix.glyph);
                }
            }
            gloss = affix.pattern.replace("{}", &gloss);
            complexity += affix.weight;
        }

        if !self.seen.insert(surface.clone()) {
            return false;
        }
        self.drafts.push(Draft {
            roots: c.roots,
            affixes: c.affixes,
            surface,
            gloss,
            glyphs,
            complexity,
        });
        true
    }
}

fn derive_words(
    rng: &mut WyRand,
    tuning: &ContentTuning,
    roots: &[Root],
    affixes: &[Affix],
) -> Result<(Vec<Word>, u32), ContentGenerationError> {
    let target = tuning.target_vocabulary;
    let mut vocab = Vocabulary {
        roots,
        affixes,
        compound_penalty: tuning.compound_penalty,
        seen: BTreeSet::new(),
        drafts: Vec::with_capacity(target),
    };

    for root in roots {
        if vocab.len() >= target {
            break;
        }
        vocab.admit(Candidate { roots: vec![root.id], affixes: Vec::new() });
    }

    let mut rounds = 0u32;
    while vocab.len() < target {
        if rounds >= tuning.max_derivation_rounds {
            return Err(ContentGenerationError::VocabularyShortfall {
                target,
                reached: vocab.len(),
                rounds,
            });
        }
        rounds += 1;
        let depth = (rounds as usize).min(2);

        for root in roots {
            if vocab.len() >= target {
                break;
            }
            let mut chosen: Vec<AffixId> = Vec::with_capacity(depth);
            for _ in 0..depth {
                let a = AffixId(stoch::below(rng, affixes.len()) as u8);
                if !chosen.contains(&a) {
                    chosen.push(a);
                }
            }
            vocab.admit(Candidate { roots: vec![root.id], affixes: chosen });
        }

        if rounds >= 2 && roots.len() >= 2 && vocab.len() < target {
            let a = stoch::below(rng, roots.len());
            let mut b = stoch::below(rng, roots.len() - 1);
            if b >= a {
                b += 1;
            }
            vocab.admit(Candidate {
                roots: vec![RootId(a as u16), RootId(b as u16)],
                affixes: Vec::new(),
            });
        }
        debug!(round = rounds, words = vocab.len(), target, "derivation round");
    }

    let mut drafts = vocab.drafts;
    drafts.sort_by(|a, b| a.complexity.cmp(&b.complexity).then_with(|| a.surface.cmp(&b.surface)));
    let words = drafts
        .into_iter()
        .enumerate()
        .map(|(i, d)| Word {
            id: WordId(i as u16),
            roots: d.roots,
            affixes: d.affixes,
            surface: d.surface,
            gloss: d.gloss,
            glyphs: d.glyphs,
            complexity: d.complexity,
        })
        .collect();
    Ok((words, rounds))
}

fn compose_texts(rng: &mut WyRand, tuning: &ContentTuning, roots: &[Root], words: &[Word]) -> Vec<Text> {
    let all: Vec<WordId> = words.iter().map(|w| w.id).collect();
    let mut texts = Vec::with_capacity(tuning.text_count);

    for t in 0..tuning.text_count {
        let category = CATEGORIES[t % CATEGORIES.len()];
        let own: Vec<WordId> = words
            .iter()
            .filter(|w| roots[w.primary_root().index()].category == category)
            .map(|w| w.id)
            .collect();

        let slot_count = stoch::between(rng, tuning.text_slots.0, tuning.text_slots.1);
        let mut slots = Vec::with_capacity(slot_count);
        for _ in 0..slot_count {
            let from_own = !own.is_empty() && stoch::bernoulli(rng, tuning.text_category_bias);
            let pool = if from_own { &own } else { &all };
            if let Some(&w) = stoch::pick(rng, pool) {
                slots.push(w);
            }
        }

        texts.push(Text {
            id: TextId(t as u16),
            name: TEXT_NAMES
                .get(t)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("Text {}", t + 1)),
            category,
            slots,
            unlock_lexicon: tuning
                .text_unlock_thresholds
                .get(t)
                .copied()
                .unwrap_or(8 * t as u32),
        });
    }

    cover_orphans(rng, &mut texts, words.len());
    texts
}

/// Every word must appear in at least one text: orphans first replace repeated
/// slots inside a text, then get appended to the shortest text.
fn cover_orphans(rng: &mut WyRand, texts: &mut [Text], vocabulary: usize) {
    if texts.is_empty() {
        return;
    }
    let covered: BTreeSet<WordId> = texts.iter().flat_map(|t| t.slots.iter().copied()).collect();
    let mut orphans: Vec<WordId> = (0..vocabulary)
        .map(|i| WordId(i as u16))
        .filter(|w| !covered.contains(w))
        .collect();
    stoch::shuffle(rng, &mut orphans);

    for text in texts.iter_mut() {
        let mut seen = BTreeSet::new();
        for slot in text.slots.iter_mut() {
            if orphans.is_empty() {
                break;
            }
            if !seen.insert(*slot) {
                if let Some(o) = orphans.pop() {
                    *slot = o;
                    seen.insert(o);
                }
            }
        }
    }

    while let Some(o) = orphans.pop() {
        if let Some(shortest) = texts.iter_mut().min_by_key(|t| t.slots.len()) {
            shortest.slots.push(o);
        }
    }
}
