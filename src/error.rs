//! Error taxonomy.
//!
//! Only [`ContentGenerationError`] and [`DefinitionError`] abort a run; they are
//! configuration defects caught before any tick is simulated. [`PurchaseRejected`]
//! and [`BalanceCheckFailure`] are ordinary outcomes carried as data by the engine
//! and the analyzer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Procedural generation could not satisfy its constants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentGenerationError {
    #[error("vocabulary target {target} not reached: {reached} words after {rounds} derivation rounds")]
    VocabularyShortfall { target: usize, reached: usize, rounds: u32 },

    #[error("glyph alphabet too small: {needed} morphemes need glyphs, alphabet has {available}")]
    AlphabetExhausted { needed: usize, available: usize },

    #[error("could not draw {requested} distinct root forms")]
    RootInventoryExhausted { requested: usize },

    #[error("invalid content constant `{name}`: {value}")]
    InvalidConstant { name: &'static str, value: String },
}

/// The economy definition is ill-formed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    #[error("producer `{producer}` has cost growth {growth}; growth must be > 1")]
    NonMonotonicCost { producer: String, growth: f64 },

    #[error("producer `{producer}` has non-positive output {output}")]
    ZeroOutput { producer: String, output: f64 },

    #[error("`{owner}` references `{target}`, which does not exist")]
    DanglingReference { owner: String, target: String },

    #[error("producer `{owner}` is gated on later producer `{target}`")]
    ForwardReference { owner: String, target: String },

    #[error("duplicate key `{0}`")]
    DuplicateKey(String),

    #[error("invalid economy constant `{name}`: {value}")]
    InvalidConstant { name: String, value: String },

    #[error("content model has no words to build an economy from")]
    EmptyLexicon,
}

/// Why a purchase intent was not settled.
#[derive(Error, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PurchaseRejected {
    #[error("insufficient funds: costs {cost:.2}, have {available:.2}")]
    InsufficientFunds { cost: f64, available: f64 },

    #[error("already purchased")]
    AlreadyPurchased,

    #[error("unlock predicate unmet")]
    UnlockPredicateUnmet,

    #[error("unknown item")]
    UnknownItem,
}

impl PurchaseRejected {
    /// Stable label used for diagnostics counters.
    pub fn label(&self) -> &'static str {
        match self {
            PurchaseRejected::InsufficientFunds { .. } => "insufficient_funds",
            PurchaseRejected::AlreadyPurchased => "already_purchased",
            PurchaseRejected::UnlockPredicateUnmet => "unlock_predicate_unmet",
            PurchaseRejected::UnknownItem => "unknown_item",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    MilestoneOutOfBounds,
    MilestoneNeverReached,
    SoftLock,
    Leak,
    NegativeCurrency,
    Regression,
    PurchaseGap,
    DeadTime,
}

/// One failed balance check, with the tick range that triggered it.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind:?} over ticks {ticks:?}: {message}")]
pub struct BalanceCheckFailure {
    pub kind: FailureKind,
    pub ticks: (u64, u64),
    pub message: String,
}

/// A persisted snapshot does not fit the definition it is restored into.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("snapshot version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("snapshot references unknown key `{0}`")]
    UnknownKey(String),

    #[error("snapshot lexicon size {size} exceeds vocabulary of {words}")]
    LexiconOverflow { size: u32, words: usize },

    #[error("snapshot currency {0} is negative or not finite")]
    Currency(f64),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("constants parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("constants serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("constants version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
}

/// Aborting failures, as surfaced by the harness and the CLI.
#[derive(Error, Debug)]
pub enum Error {
    #[error("content generation failed: {0}")]
    Content(#[from] ContentGenerationError),

    #[error("economy definition rejected: {0}")]
    Definition(#[from] DefinitionError),

    #[error("snapshot rejected: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
