// tests/presenter.rs
use std::time::Duration;

use lingua_balance::economy::{ProducerId, TuningConstants};
use lingua_balance::engine::{EconomyStateView, Event};
use lingua_balance::error::{PurchaseRejected, SnapshotError};
use lingua_balance::presenter::{DEFAULT_ADVANCE_BUDGET, OfferKind, Presenter};

fn game() -> Presenter {
    Presenter::new(42, &TuningConstants::default()).expect("default constants build")
}

/* ──────────────────────────────────────────────────────────────────────────
1) Reads
────────────────────────────────────────────────────────────────────────── */

#[test]
fn fresh_game_offers_the_first_producer_word_and_study_upgrades() {
    let g = game();
    let state = g.current_state();
    assert_eq!(state.tick, 0);
    assert_eq!(state.currency, 0.0);
    assert_eq!(state.lexicon_size, 0);
    assert!((g.income_rate() - 0.5).abs() < 1e-12);

    let offers = g.purchasable();
    let keys: Vec<&str> = offers.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, vec!["tool_00", "upg_global_0", "upg_global_1", "upg_global_4", "word_00"]);
    assert!(offers.iter().all(|o| !o.affordable));
    assert_eq!(offers[0].kind, OfferKind::Producer);
    assert_eq!(offers[0].owned, Some(0));
    assert_eq!(offers[0].max_units, Some(0));
    assert_eq!(offers[0].wait_seconds, Some(30.0));
    assert_eq!(offers[1].kind, OfferKind::Upgrade);
    assert_eq!(offers[1].cost, 50.0);
    assert_eq!(offers[4].kind, OfferKind::Word);
    assert_eq!(offers[4].max_units, None);
}

#[test]
fn offers_count_bulk_producer_purchases() {
    let mut g = game();
    // 0.5/s for 200 s: 100 buys 15 + 17.25 + 19.84 + 22.81 = 74.9, a fifth unit would pass 100
    g.advance(Duration::from_secs(200));
    let offer = g.purchasable().into_iter().find(|o| o.key == "tool_00").expect("offered");
    assert_eq!(offer.max_units, Some(4));
    assert_eq!(offer.wait_seconds, Some(0.0));
}

/* ──────────────────────────────────────────────────────────────────────────
2) Writes go through settlement
────────────────────────────────────────────────────────────────────────── */

#[test]
fn purchases_are_validated_like_any_intent() {
    let mut g = game();
    assert_eq!(g.submit_purchase("no_such_thing"), Err(PurchaseRejected::UnknownItem));
    assert_eq!(g.submit_purchase("word_01"), Err(PurchaseRejected::UnlockPredicateUnmet));
    assert!(matches!(g.submit_purchase("word_00"), Err(PurchaseRejected::InsufficientFunds { .. })));
    assert_eq!(g.current_state().tick, 0);

    let back = g.advance(Duration::from_secs(30));
    assert_eq!(back.applied, 30);
    assert!((g.current_state().currency - 15.0).abs() < 1e-9);

    let applied = g.submit_purchase("word_00").expect("affordable");
    assert!((applied.cost - 11.0).abs() < 1e-9);
    assert!((applied.currency_after - 4.0).abs() < 1e-9);
    assert_eq!(g.current_state().lexicon_size, 1);
    assert_eq!(g.submit_purchase("word_00"), Err(PurchaseRejected::AlreadyPurchased));
    // submissions never advance time
    assert_eq!(g.current_state().tick, 30);
}

#[test]
fn reveals_are_queued_for_the_ui() {
    let mut g = game();
    g.advance(Duration::from_secs(1));
    let events = g.drain_events();
    assert!(events.contains(&Event::ProducerUnlocked(ProducerId(0))));
    assert!(g.drain_events().is_empty());
}

#[test]
fn purchases_report_only_their_own_reveals() {
    let mut g = game();
    g.advance(Duration::from_secs(30));
    let applied = g.submit_purchase("word_00").expect("affordable");
    assert!(!applied.events.contains(&Event::ProducerUnlocked(ProducerId(0))));

    let queued = g.drain_events();
    let unlocks = queued.iter().filter(|&&e| e == Event::ProducerUnlocked(ProducerId(0))).count();
    assert_eq!(unlocks, 1);
}

#[test]
fn manual_upgrades_raise_the_click_rate() {
    let mut g = game();
    g.advance(Duration::from_secs(100));
    g.submit_purchase("upg_global_0").expect("50 of 50");
    assert!((g.income_rate() - 1.5).abs() < 1e-12);
}

#[test]
fn advance_carries_partial_seconds() {
    let mut g = game();
    assert_eq!(g.advance(Duration::from_millis(700)).applied, 0);
    assert_eq!(g.advance(Duration::from_millis(700)).applied, 1);
    assert_eq!(g.current_state().tick, 1);
}

#[test]
fn advance_stops_at_its_budget_and_keeps_the_rest() {
    let mut g = game();
    g.set_advance_budget(Duration::ZERO);
    let cut = g.advance(Duration::from_secs(60));
    assert!(cut.cancelled);
    assert_eq!((cut.requested, cut.applied), (60, 0));
    assert_eq!(g.current_state().tick, 0);

    g.set_advance_budget(DEFAULT_ADVANCE_BUDGET);
    let rest = g.advance(Duration::ZERO);
    assert!(!rest.cancelled);
    assert_eq!(rest.applied, 60);
    assert_eq!(g.current_state().tick, 60);
}

#[test]
fn a_huge_wait_returns_within_the_budget() {
    let mut g = game();
    g.set_advance_budget(Duration::from_millis(20));
    let out = g.advance(Duration::from_secs(1_000_000_000_000));
    assert!(out.cancelled);
    assert!(out.applied < out.requested);
    assert_eq!(g.current_state().tick, out.applied);
}

/* ──────────────────────────────────────────────────────────────────────────
3) Save and resume
────────────────────────────────────────────────────────────────────────── */

#[test]
fn snapshot_round_trips_through_json() {
    let mut g = game();
    g.advance(Duration::from_secs(60));
    g.submit_purchase("tool_00").expect("15 of 30 saved");
    g.submit_purchase("word_00").expect("11 of 15 left");

    let json = g.current_state().to_json().expect("json");
    let mut other = game();
    other.restore(&EconomyStateView::from_json(&json).expect("parse")).expect("restore");
    assert_eq!(other.current_state(), g.current_state());
    assert!((other.income_rate() - g.income_rate()).abs() < 1e-12);

    g.advance(Duration::from_secs(120));
    other.advance(Duration::from_secs(120));
    assert_eq!(other.current_state(), g.current_state());
}

#[test]
fn restore_rejects_a_bad_snapshot_and_keeps_playing() {
    let mut g = game();
    g.advance(Duration::from_secs(10));
    let mut v = g.current_state();
    v.version += 1;
    assert!(matches!(g.restore(&v), Err(SnapshotError::Version { .. })));
    assert_eq!(g.current_state().tick, 10);
}
