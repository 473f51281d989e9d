//! The flat, versioned snapshot handed to the UI and the save layer.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Bumped whenever a field changes meaning.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Stable for identical seed, policy and constants. Keys are the definition's
/// item keys; maps and sets are ordered so the JSON form is byte-stable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EconomyStateView {
    pub version: u32,
    pub tick: u64,
    pub elapsed_seconds: f64,
    pub currency: f64,
    pub owned: BTreeMap<String, u64>,
    pub upgrades: BTreeSet<String>,
    pub lexicon_size: u32,
}

impl EconomyStateView {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn owned(&self, key: &str) -> u64 {
        self.owned.get(key).copied().unwrap_or(0)
    }

    pub fn total_owned(&self) -> u64 {
        self.owned.values().sum()
    }
}
