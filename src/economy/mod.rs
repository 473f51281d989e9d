//! Economy: the constants surface, the validated definition, and the builder
//! that maps a content model onto producers, upgrades and word prices.

pub mod builder;
pub mod constants;
pub mod definition;

pub use builder::build;
pub use constants::{
    CONSTANTS_VERSION, CheckTuning, EconomyTuning, GlobalUpgrade, ProducerBound, SimulationTuning, TuningConstants,
    UpgradeScope,
};
pub use definition::{
    DefinitionParts, EconomyDefinition, Effect, Globals, Item, ProducerId, ProducerSpec, RootSpec,
    TextSpec, UnlockPredicate, UpgradeId, UpgradeSpec, UpgradeTarget, WordSpec,
};
