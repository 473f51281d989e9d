// tests/calibrate.rs
#![cfg(feature = "calibrate")]

use lingua_balance::calibrate::{CalibrateConfig, word_cost_scale};
use lingua_balance::economy::TuningConstants;
use lingua_balance::engine::PolicyKind;
use lingua_balance::mechanics::control;
use lingua_balance::refine_det;

/* ──────────────────────────────────────────────────────────────────────────
1) The refinement loop itself
────────────────────────────────────────────────────────────────────────── */

#[test]
fn refine_det_converges_on_a_fixed_point() {
    // x ← x + 0.5 (10 − x)
    let x = refine_det(
        0.0_f64,
        |x: &f64| *x,
        |d: &f64| 10.0 - *d,
        |x: &f64, err: &f64| x + 0.5 * err,
        |a: &f64, b: &f64| (a - b).abs() < 1e-9,
        200,
    );
    assert!((x - 10.0).abs() < 1e-8);
}

#[test]
fn approach_ratio_moves_in_log_space_and_clamps() {
    let up = control::approach_ratio(1.0, 4.0, 0.5, 0.1, 10.0);
    assert!((up - 2.0).abs() < 1e-12);
    assert!((control::approach_ratio(5.0, 100.0, 1.0, 0.1, 10.0) - 10.0).abs() < 1e-9);
    assert!((control::approach_ratio(3.0, f64::NAN, 1.0, 0.1, 10.0) - 3.0).abs() < 1e-9);
}

/* ──────────────────────────────────────────────────────────────────────────
2) Word-cost calibration
────────────────────────────────────────────────────────────────────────── */

fn quick() -> CalibrateConfig {
    CalibrateConfig { max_iters: 4, ..CalibrateConfig::default() }
}

#[test]
fn calibration_never_ends_worse_than_it_started() {
    let c = TuningConstants::default();
    let cal = word_cost_scale(42, &c, &PolicyKind::GreedyCheapest, 4_000.0, &quick()).expect("calibrate");
    assert!(cal.iterations >= 1);
    assert!(cal.error() <= cal.initial_error());
    assert_eq!(cal.initial_scale, c.economy.word_cost_scale);
}

#[test]
fn calibration_on_target_stops_at_once() {
    let c = TuningConstants::default();
    let first = word_cost_scale(42, &c, &PolicyKind::GreedyCheapest, 1.0, &CalibrateConfig { max_iters: 1, ..quick() })
        .expect("one iteration");
    let cal = word_cost_scale(42, &c, &PolicyKind::GreedyCheapest, first.initial_ticks as f64, &quick())
        .expect("calibrate");
    assert!(cal.converged);
    assert_eq!(cal.iterations, 1);
    assert_eq!(cal.scale, c.economy.word_cost_scale);
    assert_eq!(cal.ticks, first.initial_ticks);
}
