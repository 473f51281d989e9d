//! Recorded runs.

use serde::{Deserialize, Serialize};

use crate::economy::ProducerId;

use super::state::Event;
use super::view::EconomyStateView;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub seed: Option<u64>,
    pub policy: String,
    pub producers: usize,
    pub words: usize,
    pub roots: usize,
    pub tick_seconds: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub view: EconomyStateView,
    /// Income the next accrual will add.
    pub income_per_tick: f64,
    /// Producers unlocked so far, however long ago.
    pub unlocked: Vec<ProducerId>,
    pub roots_discovered: u32,
    /// Everything that happened on this tick.
    pub events: Vec<Event>,
}

impl Sample {
    pub fn tick(&self) -> u64 {
        self.view.tick
    }

    pub fn has_purchase(&self) -> bool {
        self.events.iter().any(|e| matches!(e, Event::Purchased { .. }))
    }
}

/// Append-only during a run, immutable afterwards. Samples are taken at the
/// starting tick, on every tick that produced an event, every
/// `snapshot_interval` ticks, and at the final tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub meta: RunMeta,
    samples: Vec<Sample>,
}

impl Trajectory {
    pub fn new(meta: RunMeta) -> Self {
        Self { meta, samples: Vec::new() }
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn final_tick(&self) -> u64 {
        self.samples.last().map_or(0, Sample::tick)
    }

    /// Ticks of every sample carrying a purchase, in order.
    pub fn purchase_ticks(&self) -> Vec<u64> {
        self.samples.iter().filter(|s| s.has_purchase()).map(Sample::tick).collect()
    }

    /// First sample satisfying `pred`.
    pub fn find(&self, mut pred: impl FnMut(&Sample) -> bool) -> Option<&Sample> {
        self.samples.iter().find(|s| pred(s))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
