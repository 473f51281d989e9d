//! The constants surface: every tuning value the builder, the engine harness and
//! the analyzer consume, in one versioned value.
//!
//! Nothing reads constants from ambient state. Callers construct (or load) a
//! [`TuningConstants`] and pass it down, so two configurations can be compared in
//! the same process.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::content::ContentTuning;
use crate::economy::definition::Effect;
use crate::engine::{PolicyKind, StopCondition};
use crate::error::ConfigError;

/// Bumped whenever a field changes meaning.
pub const CONSTANTS_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConstants {
    pub version: u32,
    pub content: ContentTuning,
    pub economy: EconomyTuning,
    pub checks: CheckTuning,
    pub simulation: SimulationTuning,
}

impl Default for TuningConstants {
    fn default() -> Self {
        Self {
            version: CONSTANTS_VERSION,
            content: ContentTuning::default(),
            economy: EconomyTuning::default(),
            checks: CheckTuning::default(),
            simulation: SimulationTuning::default(),
        }
    }
}

impl TuningConstants {
    /// Parse TOML; missing fields fall back to defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let c: TuningConstants = toml::from_str(s)?;
        if c.version != CONSTANTS_VERSION {
            return Err(ConfigError::Version { found: c.version, expected: CONSTANTS_VERSION });
        }
        Ok(c)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Which income stream a global upgrade acts on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeScope {
    /// Every producer.
    #[default]
    Producers,
    /// Manual income.
    Manual,
    /// Text income.
    Texts,
}

/// A one-time upgrade outside the per-producer ladders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalUpgrade {
    pub name: String,
    pub cost: f64,
    pub effect: Effect,
    #[serde(default)]
    pub scope: UpgradeScope,
    /// Lexicon size before the upgrade is offered.
    #[serde(default)]
    pub requires_lexicon: u32,
}

/// A band of the vocabulary (by discovery position) and its cost range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordTier {
    pub name: String,
    /// Cumulative share of the vocabulary covered up to the end of this tier.
    pub upto: f64,
    pub cost: (f64, f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    pub tick_seconds: f64,
    pub starting_currency: f64,
    /// Manual income per second from the player's own effort.
    pub base_income: f64,

    /// A new producer every N lexicon words.
    pub words_per_producer: u32,
    pub producer_names: Vec<String>,
    pub first_cost: f64,
    pub cost_step: f64,
    pub first_growth: f64,
    pub growth_step: f64,
    pub first_output: f64,
    pub output_step: f64,
    /// Every N-th producer (k > 0) is gated on its predecessor's count instead of the lexicon.
    pub owned_gate_every: u32,
    pub owned_gate_count: u64,

    pub upgrade_cost_factor: f64,
    pub upgrade_cost_step: f64,
    /// One rung per entry: owned count of the producer before the rung is offered.
    pub upgrade_owned_thresholds: Vec<u64>,
    pub additive_fraction: f64,
    pub upgrade_multiplier: f64,
    pub global_upgrades: Vec<GlobalUpgrade>,

    pub word_tiers: Vec<WordTier>,
    pub word_cost_scale: f64,
    pub root_discovery_threshold: u32,
    pub root_cost_multiplier: f64,
    /// Income per second per translated word of a revealed text.
    pub text_rate_per_word: f64,
}

impl Default for EconomyTuning {
    fn default() -> Self {
        Self {
            tick_seconds: 1.0,
            starting_currency: 0.0,
            base_income: 0.5,

            words_per_producer: 6,
            producer_names: vec![
                "Worn Dictionary".into(),
                "Reference Grammar".into(),
                "Comparative Lexicon".into(),
                "Analytical Engine".into(),
                "Rosetta Apparatus".into(),
            ],
            first_cost: 15.0,
            cost_step: 10.0,
            first_growth: 1.15,
            growth_step: 0.05,
            first_output: 0.5,
            output_step: 2.0,
            owned_gate_every: 4,
            owned_gate_count: 5,

            upgrade_cost_factor: 10.0,
            upgrade_cost_step: 5.0,
            upgrade_owned_thresholds: vec![1, 10, 25],
            additive_fraction: 0.5,
            upgrade_multiplier: 2.0,
            global_upgrades: vec![
                GlobalUpgrade {
                    name: "Sharper Instinct".into(),
                    cost: 50.0,
                    effect: Effect::Additive(1.0),
                    scope: UpgradeScope::Manual,
                    requires_lexicon: 0,
                },
                GlobalUpgrade {
                    name: "Eureka Moments".into(),
                    cost: 500.0,
                    effect: Effect::Multiplier(2.0),
                    scope: UpgradeScope::Manual,
                    requires_lexicon: 0,
                },
                GlobalUpgrade {
                    name: "Research Methodology".into(),
                    cost: 300.0,
                    effect: Effect::Multiplier(1.25),
                    scope: UpgradeScope::Producers,
                    requires_lexicon: 5,
                },
                GlobalUpgrade {
                    name: "Contextual Analysis".into(),
                    cost: 1500.0,
                    effect: Effect::Multiplier(1.5),
                    scope: UpgradeScope::Texts,
                    requires_lexicon: 12,
                },
                GlobalUpgrade {
                    name: "Deep Study".into(),
                    cost: 3000.0,
                    effect: Effect::Multiplier(3.0),
                    scope: UpgradeScope::Manual,
                    requires_lexicon: 0,
                },
            ],

            word_tiers: vec![
                WordTier { name: "common".into(), upto: 10.0 / 30.0, cost: (10.0, 30.0) },
                WordTier { name: "everyday".into(), upto: 20.0 / 30.0, cost: (1_360.0, 5_440.0) },
                WordTier { name: "academic".into(), upto: 26.0 / 30.0, cost: (8_160.0, 27_200.0) },
                WordTier { name: "rare".into(), upto: 1.0, cost: (40_800.0, 136_000.0) },
            ],
            word_cost_scale: 1.0,
            root_discovery_threshold: 3,
            root_cost_multiplier: 0.7,
            text_rate_per_word: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProducerBound {
    pub producer: u16,
    pub min_ticks: u64,
    pub max_ticks: u64,
}

/// Pacing bounds, in ticks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckTuning {
    pub first_word: (u64, u64),
    pub first_root: (u64, u64),
    pub all_words: (u64, u64),
    pub soft_lock_window: u64,
    pub max_purchase_gap: u64,
    /// Largest share of the run spent waiting beyond `dead_time_after` ticks between purchases.
    pub dead_time_ratio: f64,
    pub dead_time_after: u64,
    pub producer_unlocks: Vec<ProducerBound>,
}

impl Default for CheckTuning {
    fn default() -> Self {
        Self {
            first_word: (15, 120),
            first_root: (300, 1800),
            all_words: (3600, 7200),
            soft_lock_window: 1200,
            max_purchase_gap: 300,
            dead_time_ratio: 0.30,
            dead_time_after: 60,
            producer_unlocks: vec![
                ProducerBound { producer: 1, min_ticks: 60, max_ticks: 300 },
                ProducerBound { producer: 2, min_ticks: 300, max_ticks: 1_200 },
                ProducerBound { producer: 3, min_ticks: 600, max_ticks: 1_800 },
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationTuning {
    pub seeds: Vec<u64>,
    pub policies: Vec<PolicyKind>,
    pub max_ticks: u64,
    pub snapshot_interval: u64,
    pub stop: StopCondition,
}

impl Default for SimulationTuning {
    fn default() -> Self {
        Self {
            seeds: vec![42, 7, 1337],
            policies: vec![
                PolicyKind::GreedyCheapest,
                PolicyKind::MilestoneRusher { payback_ticks: 300.0 },
            ],
            max_ticks: 14_400,
            snapshot_interval: 10,
            stop: StopCondition::AllWordsTranslated,
        }
    }
}
