//! Headless balance suite: every (seed, policy) scenario, each on its own
//! content model, definition and state, run in parallel.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::analysis::{CheckSuite, VerdictReport, analyze};
use crate::content;
use crate::economy::{self, TuningConstants};
use crate::engine::{CancelToken, Engine, PolicyKind, RunLimits, StopReason, Trajectory};
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub seed: u64,
    pub policy: String,
    pub stop: StopReason,
    pub ticks: u64,
    pub lexicon_size: u32,
    pub words: usize,
    pub rejections: BTreeMap<String, u64>,
    pub verdict: VerdictReport,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }
}

/// Generate, build, run and analyze one scenario.
pub fn run_scenario(
    seed: u64,
    policy: &PolicyKind,
    constants: &TuningConstants,
    cancel: &CancelToken,
) -> Result<(ScenarioReport, Trajectory)> {
    let model = content::generate(seed, &constants.content)?;
    let def = Arc::new(economy::build(&model, constants)?);
    let mut engine = Engine::new(Arc::clone(&def));
    let mut p = policy.build();
    let limits = RunLimits {
        max_ticks: constants.simulation.max_ticks,
        snapshot_interval: constants.simulation.snapshot_interval,
    };
    let run = engine.run(&mut *p, &limits, &constants.simulation.stop, cancel);
    let verdict = analyze(&run.trajectory, &CheckSuite::from_constants(&constants.checks));

    let report = ScenarioReport {
        seed,
        policy: policy.label().to_string(),
        stop: run.stop,
        ticks: run.ticks,
        lexicon_size: engine.state().lexicon_size(),
        words: def.words().len(),
        rejections: run.rejections,
        verdict,
    };
    Ok((report, run.trajectory))
}

/// All of `simulation.seeds × simulation.policies`, in that order. The first
/// content or definition error aborts the suite.
pub fn run_suite(constants: &TuningConstants, cancel: &CancelToken) -> Result<Vec<ScenarioReport>> {
    let scenarios: Vec<(u64, PolicyKind)> = constants
        .simulation
        .seeds
        .iter()
        .flat_map(|&s| constants.simulation.policies.iter().map(move |p| (s, p.clone())))
        .collect();

    scenarios
        .par_iter()
        .map(|(seed, policy)| run_scenario(*seed, policy, constants, cancel).map(|(report, _)| report))
        .collect()
}
