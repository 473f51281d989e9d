//! Content Model: the procedurally generated language.
//!
//! Pure data. Nothing in here knows about ticks, currency or producers; the
//! economy builder consumes these value objects and decides what they cost.
//!
//! - [`Root`]: atomic morpheme (phonetic form + semantic category + glyph).
//! - [`Affix`]: fixed derivation rules applied around roots.
//! - [`Word`]: roots + affixes, with a surface form, gloss and complexity.
//! - [`Text`]: word slots that unlock with lexicon size.
//!
//! [`ContentModel::words`] is sorted by ascending complexity; that order *is*
//! the lexicon-discovery order, and the lexicon of size `n` is its first `n` words.

mod generate;
pub(crate) mod pools;

use serde::{Deserialize, Serialize};

pub use generate::generate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RootId(pub u16);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WordId(pub u16);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextId(pub u16);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AffixId(pub u8);

impl RootId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
impl WordId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
impl TextId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
impl AffixId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticCategory {
    Nature,
    Craft,
    Thought,
    Spirit,
}

impl SemanticCategory {
    pub fn label(self) -> &'static str {
        match self {
            SemanticCategory::Nature => "nature",
            SemanticCategory::Craft => "craft",
            SemanticCategory::Thought => "thought",
            SemanticCategory::Spirit => "spirit",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffixKind {
    Prefix,
    Suffix,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub id: RootId,
    /// Phonetic form, e.g. `kel`.
    pub form: String,
    pub category: SemanticCategory,
    pub gloss: String,
    /// Index into the glyph alphabet.
    pub glyph: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affix {
    pub id: AffixId,
    pub form: String,
    pub kind: AffixKind,
    /// Complexity contributed by this affix.
    pub weight: u32,
    /// Gloss pattern; `{}` stands for the inner gloss.
    pub pattern: String,
    pub glyph: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    /// Non-empty; the first root is the word's family for root discovery.
    pub roots: Vec<RootId>,
    /// Application order (innermost first).
    pub affixes: Vec<AffixId>,
    pub surface: String,
    pub gloss: String,
    /// Glyph indices in surface order.
    pub glyphs: Vec<u8>,
    pub complexity: u32,
}

impl Word {
    pub fn primary_root(&self) -> RootId {
        self.roots[0]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub id: TextId,
    pub name: String,
    pub category: SemanticCategory,
    /// Ordered slots; words may repeat.
    pub slots: Vec<WordId>,
    /// Lexicon size at which the text reveals itself.
    pub unlock_lexicon: u32,
}

/// Constants consumed by [`generate`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentTuning {
    pub root_count: usize,
    pub target_vocabulary: usize,
    pub max_derivation_rounds: u32,
    pub alphabet_size: usize,
    /// Complexity added per extra root in a compound.
    pub compound_penalty: u32,
    pub text_count: usize,
    /// Inclusive slot-count range per text.
    pub text_slots: (usize, usize),
    /// Probability that a slot is drawn from the text's own category.
    pub text_category_bias: f64,
    pub text_unlock_thresholds: Vec<u32>,
}

impl Default for ContentTuning {
    fn default() -> Self {
        Self {
            root_count: 5,
            target_vocabulary: 30,
            max_derivation_rounds: 16,
            alphabet_size: 26,
            compound_penalty: 3,
            text_count: 4,
            text_slots: (8, 12),
            text_category_bias: 0.5,
            text_unlock_thresholds: vec![0, 5, 12, 20],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentModel {
    pub seed: u64,
    pub roots: Vec<Root>,
    pub affixes: Vec<Affix>,
    /// Discovery order (ascending complexity).
    pub words: Vec<Word>,
    pub texts: Vec<Text>,
}

impl ContentModel {
    pub fn word(&self, id: WordId) -> Option<&Word> {
        self.words.get(id.index())
    }

    pub fn root(&self, id: RootId) -> Option<&Root> {
        self.roots.get(id.index())
    }

    /// The first `size` words: what a lexicon of that size has discovered.
    pub fn lexicon_prefix(&self, size: usize) -> &[Word] {
        &self.words[..size.min(self.words.len())]
    }

    /// Words whose family (primary root) is `root`, in discovery order.
    pub fn words_of_root(&self, root: RootId) -> impl Iterator<Item = &Word> + '_ {
        self.words.iter().filter(move |w| w.primary_root() == root)
    }

    /// Distinct words of a text, in first-slot order.
    pub fn unique_words_in_text(&self, text: TextId) -> Vec<WordId> {
        let mut out: Vec<WordId> = Vec::new();
        if let Some(t) = self.texts.get(text.index()) {
            for &w in &t.slots {
                if !out.contains(&w) {
                    out.push(w);
                }
            }
        }
        out
    }

    pub fn texts_containing(&self, word: WordId) -> impl Iterator<Item = &Text> + '_ {
        self.texts.iter().filter(move |t| t.slots.contains(&word))
    }
}

/// The discovered prefix of [`ContentModel::words`]. Append-only: the only way
/// to grow it is to discover the next word in order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexicon {
    size: u32,
}

impl Lexicon {
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The word that would be discovered next.
    pub fn next(&self) -> WordId {
        WordId(self.size as u16)
    }

    pub fn contains(&self, word: WordId) -> bool {
        u32::from(word.0) < self.size
    }

    /// Append `word` if it is the next one in discovery order.
    pub fn discover(&mut self, word: WordId) -> bool {
        if word != self.next() {
            return false;
        }
        self.size += 1;
        true
    }

    pub fn words<'a>(&self, model: &'a ContentModel) -> &'a [Word] {
        model.lexicon_prefix(self.size as usize)
    }
}
