//! Static inventories the generator draws from.

use super::{AffixKind, SemanticCategory};

pub(crate) const ONSETS: &[&str] = &[
    "k", "m", "th", "v", "z", "r", "d", "f", "g", "h", "s", "l", "n", "t", "p",
];
pub(crate) const NUCLEI: &[&str] = &["a", "e", "i", "o", "u", "y"];
pub(crate) const CODAS: &[&str] = &["l", "r", "n", "s", "m", "th", "rn", ""];

pub(crate) const CATEGORIES: [SemanticCategory; 4] = [
    SemanticCategory::Nature,
    SemanticCategory::Craft,
    SemanticCategory::Thought,
    SemanticCategory::Spirit,
];

pub(crate) fn glosses(category: SemanticCategory) -> &'static [&'static str] {
    match category {
        SemanticCategory::Nature => &[
            "water", "fire", "earth", "sky", "stone", "sun", "moon", "star", "tree", "river",
            "wind", "seed", "salt", "ash", "bone",
        ],
        SemanticCategory::Craft => &[
            "gather", "build", "speak", "carry", "mend", "trade", "plant", "harvest", "shelter",
            "guard", "weave", "forge", "carve", "kindle", "bind",
        ],
        SemanticCategory::Thought => &[
            "knowledge", "theorem", "axiom", "paradox", "chronicle", "cipher", "cosmology",
            "dialectic", "schema", "paradigm", "alchemy", "epitome",
        ],
        SemanticCategory::Spirit => &[
            "transcendence", "apotheosis", "eschatology", "pneuma", "anamnesis", "theurgy",
            "metempsychosis", "henosis",
        ],
    }
}

/// (form, kind, weight, gloss pattern). `{}` is replaced by the inner gloss.
pub(crate) const AFFIXES: &[(&str, AffixKind, u32, &str)] = &[
    ("an", AffixKind::Suffix, 1, "keeper of {}"),
    ("eth", AffixKind::Suffix, 1, "many {}"),
    ("os", AffixKind::Suffix, 1, "small {}"),
    ("ir", AffixKind::Suffix, 2, "the nature of {}"),
    ("ar", AffixKind::Suffix, 2, "place of {}"),
    ("ka", AffixKind::Prefix, 2, "to make {}"),
    ("ul", AffixKind::Prefix, 3, "without {}"),
    ("sen", AffixKind::Prefix, 3, "ancient {}"),
];

pub(crate) const TEXT_NAMES: &[&str] = &[
    "The Foundation Tablet",
    "The Builder's Record",
    "The Scholar's Codex",
    "The Hidden Archive",
];
