//! Closed-loop tuning of one constant, `word_cost_scale`, so a policy's
//! time-to-all-words lands on a target.
//!
//! simulate = full headless run at the candidate scale, measure = actual/target,
//! update = proportional step in log space. The best iterate is returned, so
//! the result is never worse than the starting point.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::content::{self, ContentModel};
use crate::economy::{self, TuningConstants};
use crate::engine::{CancelToken, Engine, PolicyKind, RunLimits, StopCondition};
use crate::error::{Error, Result};
use crate::mechanics::control;
use crate::refine_det;

#[derive(Clone, Copy, Debug)]
pub struct CalibrateConfig {
    pub gain: f64,
    pub bounds: (f64, f64),
    /// Accept when |actual/target − 1| is at most this.
    pub tolerance: f64,
    pub max_iters: usize,
}

impl Default for CalibrateConfig {
    fn default() -> Self {
        Self { gain: 0.7, bounds: (0.05, 20.0), tolerance: 0.02, max_iters: 12 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Calibration {
    pub target_ticks: f64,
    pub initial_scale: f64,
    pub initial_ticks: u64,
    pub scale: f64,
    pub ticks: u64,
    pub iterations: usize,
    pub converged: bool,
}

impl Calibration {
    /// |ln(ticks / target)| of the returned scale.
    pub fn error(&self) -> f64 {
        log_error(self.ticks, self.target_ticks)
    }

    pub fn initial_error(&self) -> f64 {
        log_error(self.initial_ticks, self.target_ticks)
    }
}

fn log_error(ticks: u64, target: f64) -> f64 {
    (ticks.max(1) as f64 / target).ln().abs()
}

pub fn word_cost_scale(
    seed: u64,
    constants: &TuningConstants,
    policy: &PolicyKind,
    target_ticks: f64,
    cfg: &CalibrateConfig,
) -> Result<Calibration> {
    let model = content::generate(seed, &constants.content)?;
    let start = constants.economy.word_cost_scale;
    let (lo, hi) = cfg.bounds;

    let first: Cell<Option<(f64, u64)>> = Cell::new(None);
    let best: Cell<Option<(f64, u64)>> = Cell::new(None);
    let hit = Cell::new(false);
    let iterations = Cell::new(0usize);
    let failure: RefCell<Option<Error>> = RefCell::new(None);

    let simulate = |scale: &f64| -> Option<u64> {
        if failure.borrow().is_some() {
            return None;
        }
        match ticks_to_all_words(&model, constants, policy, *scale) {
            Ok(ticks) => {
                iterations.set(iterations.get() + 1);
                if first.get().is_none() {
                    first.set(Some((*scale, ticks)));
                }
                let better = best.get().is_none_or(|(_, b)| log_error(ticks, target_ticks) < log_error(b, target_ticks));
                if better {
                    best.set(Some((*scale, ticks)));
                }
                debug!(scale, ticks, target_ticks, "calibration run");
                Some(ticks)
            }
            Err(e) => {
                *failure.borrow_mut() = Some(e);
                None
            }
        }
    };
    let measure = |ticks: &Option<u64>| -> Option<f64> {
        let ratio = ticks.map(|t| t.max(1) as f64 / target_ticks);
        hit.set(ratio.is_some_and(|r| (r - 1.0).abs() <= cfg.tolerance));
        ratio
    };
    let update = |scale: &f64, ratio: &Option<f64>| -> f64 {
        match ratio {
            Some(r) => control::approach_ratio(*scale, 1.0 / r, cfg.gain, lo, hi),
            None => *scale,
        }
    };
    let converged = |prev: &f64, next: &f64| -> bool {
        hit.get() || failure.borrow().is_some() || (prev - next).abs() <= 1e-12 * prev.abs()
    };

    let _ = refine_det(start.clamp(lo, hi), simulate, measure, update, converged, cfg.max_iters);

    if let Some(e) = failure.into_inner() {
        return Err(e);
    }
    let (initial_scale, initial_ticks) = first.get().unwrap_or((start, 0));
    let (scale, ticks) = best.get().unwrap_or((initial_scale, initial_ticks));
    Ok(Calibration {
        target_ticks,
        initial_scale,
        initial_ticks,
        scale,
        ticks,
        iterations: iterations.get(),
        converged: hit.get(),
    })
}

/// Ticks until every word is translated (the tick budget if never).
fn ticks_to_all_words(
    model: &ContentModel,
    constants: &TuningConstants,
    policy: &PolicyKind,
    scale: f64,
) -> Result<u64> {
    let mut c = constants.clone();
    c.economy.word_cost_scale = scale;
    let def = Arc::new(economy::build(model, &c)?);
    let mut engine = Engine::new(def);
    let mut p = policy.build();
    let limits = RunLimits { max_ticks: c.simulation.max_ticks, snapshot_interval: c.simulation.snapshot_interval };
    let run = engine.run(&mut *p, &limits, &StopCondition::AllWordsTranslated, &CancelToken::new());
    Ok(run.ticks)
}
