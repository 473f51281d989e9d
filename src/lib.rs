/*!
`lingua_balance` — deterministic, headless economy simulation and balance
checks for a procedural-language idle game.

What it does
- Generates a small language from a seed: roots, affixes, words ordered by
  complexity (the lexicon-discovery order), and texts built from those words.
- Maps that language onto an economy: producers unlocked along the lexicon,
  upgrade ladders, word translation prices, root discounts, text income.
- Advances the economy tick by tick under a pluggable policy
  (`accrual → decision → settlement`), records a trajectory, and checks it
  against pacing bounds: milestone windows, soft-lock, no-leak,
  non-negative currency, monotonic progress.
- Exposes the same step function to a live UI through a read/intent presenter.

How to use (call surface only)
- `content::generate(seed, &constants.content)` → `ContentModel`
- `economy::build(&model, &constants)` → `EconomyDefinition`
- `Engine::new(Arc::new(def)).run(policy, limits, stop, cancel)` → `Run`
- `analysis::analyze(&run.trajectory, &CheckSuite::from_constants(..))` → `VerdictReport`
- or `suite::run_suite(&constants, &cancel)` for every seed × policy at once.

What it does NOT do
- No rendering, no input handling, no save-file I/O; the presenter hands out
  serializable snapshots and takes purchase intents, nothing more.
- No ambient configuration: every tuning value lives in one `TuningConstants`
  passed in by the caller.
*/

pub mod analysis;
#[cfg(feature = "calibrate")]
pub mod calibrate;
pub mod content;
pub mod economy;
pub mod engine;
pub mod error;
pub mod mechanics;
pub mod presenter;
pub mod suite;

pub use error::{Error, Result};

/// Deterministic refinement: θ_{t+1} = update(θ_t, measure(simulate(θ_t))).
///
/// Stops when `converged(θ_t, θ_{t+1})` holds or after `max_iters` steps and
/// returns the last θ.
pub fn refine_det<P, D, M, Sim, Meas, Upd, Conv>(
    mut theta: P,
    mut simulate: Sim,
    mut measure: Meas,
    mut update: Upd,
    converged: Conv,
    max_iters: usize,
) -> P
where
    Sim: FnMut(&P) -> D,
    Meas: FnMut(&D) -> M,
    Upd: FnMut(&P, &M) -> P,
    Conv: Fn(&P, &P) -> bool,
{
    for _ in 0..max_iters {
        let data = simulate(&theta);
        let pi = measure(&data);
        let theta_next = update(&theta, &pi);
        if converged(&theta, &theta_next) {
            return theta_next;
        }
        theta = theta_next;
    }
    theta
}
