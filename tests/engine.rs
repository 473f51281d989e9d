// tests/engine.rs
use std::sync::Arc;
use std::time::Duration;

use lingua_balance::content::{TextId, WordId};
use lingua_balance::economy::{
    DefinitionParts, EconomyDefinition, Effect, Globals, Item, ProducerId, ProducerSpec, TuningConstants,
    TextSpec, UnlockPredicate, UpgradeId, UpgradeSpec, UpgradeTarget, WordSpec,
};
use lingua_balance::engine::{
    CancelToken, EconomyState, EconomyStateView, Engine, Event, GreedyCheapest, Idle, MilestoneRusher, PlayerIntents,
    Policy, RunLimits, Scripted, Settlement, StopCondition, StopReason,
};
use lingua_balance::error::{PurchaseRejected, SnapshotError};
use lingua_balance::{content, economy};

fn word(i: usize, cost: f64) -> WordSpec {
    WordSpec {
        word: WordId(0),
        key: format!("w{i}"),
        surface: format!("w{i}"),
        gloss: String::new(),
        root: None,
        cost,
    }
}

/// One producer (10, ×1.15, 1/s), base income 1/s, an upgrade, a second
/// producer behind lexicon 2, five cheap words.
fn tiny() -> Arc<EconomyDefinition> {
    let def = EconomyDefinition::new(DefinitionParts {
        seed: None,
        globals: Globals { tick_seconds: 1.0, starting_currency: 0.0, base_income: 1.0 },
        producers: vec![
            ProducerSpec {
                id: ProducerId(0),
                key: "quill".into(),
                name: "Quill".into(),
                base_cost: 10.0,
                growth: 1.15,
                base_output: 1.0,
                unlock: UnlockPredicate::Always,
            },
            ProducerSpec {
                id: ProducerId(1),
                key: "press".into(),
                name: "Press".into(),
                base_cost: 40.0,
                growth: 1.2,
                base_output: 4.0,
                unlock: UnlockPredicate::LexiconSize { size: 2 },
            },
        ],
        upgrades: vec![UpgradeSpec {
            id: UpgradeId(0),
            key: "ink".into(),
            name: "Ink".into(),
            cost: 5.0,
            targets: vec![UpgradeTarget::Producer(ProducerId(0))],
            effect: Effect::Multiplier(2.0),
            requires: UnlockPredicate::Always,
        }],
        words: (0..5).map(|i| word(i, 3.0 + i as f64)).collect(),
        ..DefinitionParts::default()
    });
    Arc::new(def.expect("tiny definition is valid"))
}

fn default_def(seed: u64) -> Arc<EconomyDefinition> {
    let c = TuningConstants::default();
    let model = content::generate(seed, &c.content).expect("content");
    Arc::new(economy::build(&model, &c).expect("definition"))
}

fn upgrade(key: &str, target: UpgradeTarget, effect: Effect) -> UpgradeSpec {
    UpgradeSpec {
        id: UpgradeId(0),
        key: key.into(),
        name: key.into(),
        cost: 5.0,
        targets: vec![target],
        effect,
        requires: UnlockPredicate::Always,
    }
}

/// Base income 1/s, no owned producers, three upgrades aimed at manual effort
/// and text income, one text over the first two words.
fn scoped() -> Arc<EconomyDefinition> {
    let tiny = tiny();
    let def = EconomyDefinition::new(DefinitionParts {
        globals: *tiny.globals(),
        producers: tiny.producers().to_vec(),
        upgrades: vec![
            upgrade("sharpen", UpgradeTarget::Manual, Effect::Additive(2.0)),
            upgrade("eureka", UpgradeTarget::Manual, Effect::Multiplier(2.0)),
            upgrade("context", UpgradeTarget::Texts, Effect::Multiplier(1.5)),
        ],
        words: (0..3).map(|i| word(i, 3.0 + i as f64)).collect(),
        texts: vec![TextSpec {
            text: TextId(0),
            key: "tablet".into(),
            name: "Tablet".into(),
            words: vec![WordId(0), WordId(1)],
            unlock_lexicon: 1,
            rate_per_word: 1.0,
        }],
        ..DefinitionParts::default()
    });
    Arc::new(def.expect("scoped definition is valid"))
}

const QUILL: Item = Item::Producer(ProducerId(0));
const PRESS: Item = Item::Producer(ProducerId(1));
const INK: Item = Item::Upgrade(UpgradeId(0));

/* ──────────────────────────────────────────────────────────────────────────
1) One tick: accrual, decision, settlement
────────────────────────────────────────────────────────────────────────── */

#[test]
fn scripted_purchase_settles_after_accrual_on_tick_ten() {
    let mut engine = Engine::new(tiny());
    let mut script = Scripted::new(vec![(10, QUILL)]);

    for _ in 0..9 {
        let r = engine.step(&mut script);
        assert!(r.settlements.is_empty());
    }
    assert!((engine.state().currency() - 9.0).abs() < 1e-12);

    let r = engine.step(&mut script);
    assert_eq!(r.tick, 10);
    assert_eq!(r.settlements, vec![Settlement::Applied { item: QUILL, cost: 10.0 }]);
    assert_eq!(engine.state().currency(), 0.0);
    assert_eq!(engine.state().owned(ProducerId(0)), 1);

    let next = engine.state().price(engine.definition(), QUILL).expect("priced");
    assert!((next - 11.5).abs() < 1e-9);
    assert!((engine.state().income_per_tick(engine.definition()) - 2.0).abs() < 1e-12);
}

#[test]
fn cost_is_closed_form_in_owned_count() {
    let def = tiny();
    let spec = def.producer(ProducerId(0)).expect("quill");
    assert_eq!(spec.cost_at(0), 10.0);
    assert!((spec.cost_at(40) - 10.0 * 1.15f64.powi(40)).abs() < 1e-6);
    for n in 0..50 {
        assert!(spec.cost_at(n + 1) > spec.cost_at(n));
    }
}

#[test]
fn repeated_intent_in_one_tick_is_rejected_not_charged_twice() {
    let mut engine = Engine::new(tiny());
    engine.catch_up(20, &mut Idle, &CancelToken::new());
    let before = engine.state().currency();

    let r = engine.step(&mut Scripted::new(vec![(0, INK), (0, INK)]));
    assert_eq!(
        r.settlements,
        vec![
            Settlement::Applied { item: INK, cost: 5.0 },
            Settlement::Rejected { item: INK, reason: PurchaseRejected::AlreadyPurchased },
        ]
    );
    // one accrual of base income, one charge
    assert!((engine.state().currency() - (before + 1.0 - 5.0)).abs() < 1e-12);
    assert!(engine.state().has_upgrade(UpgradeId(0)));
}

#[test]
fn unaffordable_intent_changes_nothing() {
    let mut engine = Engine::new(tiny());
    let r = engine.step(&mut Scripted::new(vec![(0, QUILL)]));
    assert_eq!(
        r.settlements,
        vec![Settlement::Rejected {
            item: QUILL,
            reason: PurchaseRejected::InsufficientFunds { cost: 10.0, available: 1.0 },
        }]
    );
    assert_eq!(engine.state().owned(ProducerId(0)), 0);
    assert_eq!(engine.state().currency(), 1.0);
}

#[test]
fn later_intents_see_earlier_settlements() {
    let mut engine = Engine::new(tiny());
    engine.catch_up(15, &mut Idle, &CancelToken::new());
    // 16 after accrual: quill (10) leaves 6, a second quill (11.5) no longer fits
    let r = engine.step(&mut Scripted::new(vec![(0, QUILL), (0, QUILL)]));
    assert!(matches!(r.settlements[0], Settlement::Applied { .. }));
    assert!(matches!(
        r.settlements[1],
        Settlement::Rejected { reason: PurchaseRejected::InsufficientFunds { .. }, .. }
    ));
}

#[test]
fn player_intents_settle_in_submission_order() {
    let mut engine = Engine::new(tiny());
    engine.catch_up(12, &mut Idle, &CancelToken::new());
    assert!((engine.state().currency() - 12.0).abs() < 1e-12);

    let mut intents = PlayerIntents::default();
    intents.push(INK);
    intents.push(QUILL);
    let r = engine.submit(&mut intents);
    assert_eq!(r.settlements[0], Settlement::Applied { item: INK, cost: 5.0 });
    assert!(matches!(
        r.settlements[1],
        Settlement::Rejected { item: QUILL, reason: PurchaseRejected::InsufficientFunds { .. } }
    ));
    assert_eq!(r.settlements.len(), 2);
    assert!(intents.is_empty());
    assert!(engine.submit(&mut intents).settlements.is_empty());
}

/* ──────────────────────────────────────────────────────────────────────────
2) Lexicon gating and reveals
────────────────────────────────────────────────────────────────────────── */

#[test]
fn words_are_translated_in_order_and_gate_producers() {
    let mut engine = Engine::new(tiny());
    engine.catch_up(80, &mut Idle, &CancelToken::new());

    let r = engine.submit(&mut Scripted::new(vec![(0, PRESS), (0, Item::Word(WordId(1)))]));
    assert!(r.rejections().all(|(_, why)| why == PurchaseRejected::UnlockPredicateUnmet));
    assert_eq!(r.rejections().count(), 2);

    let r = engine.submit(&mut Scripted::new(vec![
        (0, Item::Word(WordId(0))),
        (0, Item::Word(WordId(0))),
        (0, Item::Word(WordId(1))),
    ]));
    assert_eq!(r.rejections().map(|(_, why)| why).collect::<Vec<_>>(), vec![PurchaseRejected::AlreadyPurchased]);
    assert_eq!(engine.state().lexicon_size(), 2);
    assert!(r.events.contains(&Event::ProducerUnlocked(ProducerId(1))));
    assert!(engine.state().is_unlocked(ProducerId(1)));

    let r = engine.submit(&mut Scripted::new(vec![(0, PRESS)]));
    assert!(matches!(r.settlements[0], Settlement::Applied { item: PRESS, .. }));
}

#[test]
fn unknown_items_are_rejected() {
    let mut engine = Engine::new(tiny());
    let r = engine.submit(&mut Scripted::new(vec![(0, Item::Word(WordId(99))), (0, Item::Upgrade(UpgradeId(3)))]));
    assert!(r.rejections().all(|(_, why)| why == PurchaseRejected::UnknownItem));
}

#[test]
fn initial_reveal_is_reported_once() {
    let mut engine = Engine::new(tiny());
    let first = engine.step(&mut Idle);
    assert!(first.events.contains(&Event::ProducerUnlocked(ProducerId(0))));
    let second = engine.step(&mut Idle);
    assert!(second.events.is_empty());
}

/* ──────────────────────────────────────────────────────────────────────────
3) Catch-up: batches equal single ticks; cancellation; carried time
────────────────────────────────────────────────────────────────────────── */

#[test]
fn catch_up_matches_single_steps_bit_for_bit() {
    for def in [tiny(), default_def(42)] {
        let mut batched = Engine::new(Arc::clone(&def));
        let mut single = Engine::new(Arc::clone(&def));

        let out = batched.catch_up(500, &mut GreedyCheapest, &CancelToken::new());
        for _ in 0..500 {
            single.step(&mut GreedyCheapest);
        }
        assert_eq!(out.applied, 500);
        assert_eq!(batched.state(), single.state());
        assert_eq!(batched.state().currency().to_bits(), single.state().currency().to_bits());
    }
}

#[test]
fn cancelled_token_stops_before_the_first_tick() {
    let mut engine = Engine::new(tiny());
    let cancel = CancelToken::new();
    cancel.cancel();
    let out = engine.catch_up(1_000, &mut Idle, &cancel);
    assert!(out.cancelled);
    assert_eq!(out.applied, 0);
    assert_eq!(engine.state().tick(), 0);
}

/// Cancels the shared token during its n-th decision.
struct CancelAfter {
    left: u32,
    token: CancelToken,
}

impl Policy for CancelAfter {
    fn name(&self) -> &str {
        "cancel_after"
    }
    fn decide(&mut self, _def: &EconomyDefinition, _state: &EconomyState) -> Vec<Item> {
        self.left = self.left.saturating_sub(1);
        if self.left == 0 {
            self.token.cancel();
        }
        Vec::new()
    }
}

#[test]
fn cancellation_lands_on_a_tick_boundary() {
    let mut engine = Engine::new(tiny());
    let token = CancelToken::new();
    let mut policy = CancelAfter { left: 7, token: token.clone() };
    let out = engine.catch_up(1_000, &mut policy, &token);
    assert!(out.cancelled);
    assert_eq!(out.applied, 7);
    assert_eq!(engine.state().tick(), 7);
    assert!((engine.state().currency() - 7.0).abs() < 1e-12);
}

#[test]
fn elapsed_time_carries_fractions_between_calls() {
    let mut engine = Engine::new(tiny());
    let out = engine.catch_up_elapsed(Duration::from_millis(2_500), &mut Idle, &CancelToken::new());
    assert_eq!(out.applied, 2);
    assert!((engine.carry_seconds() - 0.5).abs() < 1e-9);

    let out = engine.catch_up_elapsed(Duration::from_millis(600), &mut Idle, &CancelToken::new());
    assert_eq!(out.applied, 1);
    assert!((engine.carry_seconds() - 0.1).abs() < 1e-9);
    assert_eq!(engine.state().tick(), 3);
}

#[test]
fn cancelled_elapsed_time_is_not_lost() {
    let mut engine = Engine::new(tiny());
    let cancel = CancelToken::new();
    cancel.cancel();
    let out = engine.catch_up_elapsed(Duration::from_secs(4), &mut Idle, &cancel);
    assert_eq!(out.applied, 0);
    assert!((engine.carry_seconds() - 4.0).abs() < 1e-9);

    let out = engine.catch_up_elapsed(Duration::ZERO, &mut Idle, &CancelToken::new());
    assert_eq!(out.applied, 4);
}

/* ──────────────────────────────────────────────────────────────────────────
4) Currency arithmetic saturates
────────────────────────────────────────────────────────────────────────── */

#[test]
fn currency_saturates_instead_of_overflowing() {
    let def = EconomyDefinition::new(DefinitionParts {
        globals: Globals { tick_seconds: 1.0, starting_currency: f64::MAX / 2.0, base_income: f64::MAX / 2.0 },
        ..DefinitionParts::default()
    })
    .expect("valid");
    let mut engine = Engine::new(Arc::new(def));
    engine.catch_up(5, &mut Idle, &CancelToken::new());
    assert_eq!(engine.state().currency(), f64::MAX);
}

/* ──────────────────────────────────────────────────────────────────────────
5) Full runs: determinism, stop reasons, rejection counters
────────────────────────────────────────────────────────────────────────── */

fn limits(max_ticks: u64) -> RunLimits {
    RunLimits { max_ticks, snapshot_interval: 10 }
}

#[test]
fn identical_inputs_give_identical_trajectories() {
    let run = |seed| {
        let mut engine = Engine::new(default_def(seed));
        engine.run(
            &mut MilestoneRusher { payback_ticks: 300.0 },
            &limits(2_000),
            &StopCondition::AllWordsTranslated,
            &CancelToken::new(),
        )
    };
    let a = run(1337);
    let b = run(1337);
    assert_eq!(a, b);
    assert_eq!(a.trajectory.to_json().expect("json"), b.trajectory.to_json().expect("json"));
}

#[test]
fn runs_report_why_they_stopped() {
    let mut engine = Engine::new(tiny());
    let run = engine.run(&mut Idle, &limits(50), &StopCondition::Never, &CancelToken::new());
    assert_eq!(run.stop, StopReason::TickBudget);
    assert_eq!(run.ticks, 50);
    assert_eq!(run.trajectory.final_tick(), 50);
    assert_eq!(run.trajectory.first().map(|s| s.view.tick), Some(0));

    let mut engine = Engine::new(tiny());
    let run = engine.run(&mut GreedyCheapest, &limits(1_000), &StopCondition::LexiconSize(2), &CancelToken::new());
    assert_eq!(run.stop, StopReason::Condition);
    assert_eq!(engine.state().lexicon_size(), 2);

    let mut engine = Engine::new(tiny());
    let cancel = CancelToken::new();
    cancel.cancel();
    let run = engine.run(&mut Idle, &limits(1_000), &StopCondition::Never, &cancel);
    assert_eq!(run.stop, StopReason::Cancelled);
    assert_eq!(run.ticks, 0);
}

#[test]
fn runs_stop_once_every_producer_is_unlocked() {
    let mut engine = Engine::new(tiny());
    let run = engine.run(&mut GreedyCheapest, &limits(1_000), &StopCondition::AllProducersUnlocked, &CancelToken::new());
    assert_eq!(run.stop, StopReason::Condition);
    assert!(engine.state().is_unlocked(ProducerId(1)));
    assert_eq!(engine.state().lexicon_size(), 2);
}

#[test]
fn any_of_stops_on_the_first_condition_met() {
    let either = StopCondition::AnyOf(vec![StopCondition::LexiconSize(4), StopCondition::AllProducersUnlocked]);
    let mut engine = Engine::new(tiny());
    let run = engine.run(&mut GreedyCheapest, &limits(1_000), &either, &CancelToken::new());
    assert_eq!(run.stop, StopReason::Condition);
    assert_eq!(engine.state().lexicon_size(), 2);

    let mut alone = Engine::new(tiny());
    let reference =
        alone.run(&mut GreedyCheapest, &limits(1_000), &StopCondition::AllProducersUnlocked, &CancelToken::new());
    assert_eq!(run.ticks, reference.ticks);

    let mut engine = Engine::new(tiny());
    let run = engine.run(&mut GreedyCheapest, &limits(50), &StopCondition::AnyOf(Vec::new()), &CancelToken::new());
    assert_eq!(run.stop, StopReason::TickBudget);
    assert_eq!(run.ticks, 50);
}

#[test]
fn runs_count_rejections_by_reason() {
    let mut engine = Engine::new(tiny());
    let mut script = Scripted::new(vec![(1, QUILL), (2, PRESS)]);
    let run = engine.run(&mut script, &limits(5), &StopCondition::Never, &CancelToken::new());
    assert_eq!(run.rejections.get("insufficient_funds"), Some(&1));
    assert_eq!(run.rejections.get("unlock_predicate_unmet"), Some(&1));
}

#[test]
fn trajectory_samples_every_purchase() {
    let mut engine = Engine::new(tiny());
    let run = engine.run(&mut GreedyCheapest, &limits(300), &StopCondition::AllWordsTranslated, &CancelToken::new());
    let bought = run
        .trajectory
        .samples()
        .iter()
        .flat_map(|s| s.events.iter())
        .filter(|e| matches!(e, Event::Purchased { .. }))
        .count() as u64;
    let view = engine.view();
    let upgrades = view.upgrades.len() as u64;
    assert_eq!(bought, view.total_owned() + upgrades + u64::from(view.lexicon_size));
}

/* ──────────────────────────────────────────────────────────────────────────
6) Snapshots
────────────────────────────────────────────────────────────────────────── */

#[test]
fn restore_resumes_the_same_game() {
    let def = default_def(7);
    let mut original = Engine::new(Arc::clone(&def));
    original.catch_up(900, &mut GreedyCheapest, &CancelToken::new());

    let json = original.view().to_json().expect("json");
    let view = EconomyStateView::from_json(&json).expect("parse");
    let mut restored = Engine::restore(Arc::clone(&def), &view).expect("restore");
    assert_eq!(restored.state(), original.state());

    original.catch_up(300, &mut GreedyCheapest, &CancelToken::new());
    restored.catch_up(300, &mut GreedyCheapest, &CancelToken::new());
    assert_eq!(restored.view(), original.view());
}

#[test]
fn restore_refuses_foreign_snapshots() {
    let def = tiny();
    let good = Engine::new(Arc::clone(&def)).view();

    let mut v = good.clone();
    v.version = 2;
    assert!(matches!(Engine::restore(Arc::clone(&def), &v), Err(SnapshotError::Version { found: 2, .. })));

    let mut v = good.clone();
    v.owned.insert("loom".into(), 1);
    assert!(matches!(Engine::restore(Arc::clone(&def), &v), Err(SnapshotError::UnknownKey(k)) if k == "loom"));

    let mut v = good.clone();
    v.lexicon_size = 6;
    assert!(matches!(Engine::restore(Arc::clone(&def), &v), Err(SnapshotError::LexiconOverflow { .. })));

    let mut v = good;
    v.currency = -1.0;
    assert!(matches!(Engine::restore(def, &v), Err(SnapshotError::Currency(_))));
}

/* ──────────────────────────────────────────────────────────────────────────
7) Upgrades on manual effort and text income
────────────────────────────────────────────────────────────────────────── */

#[test]
fn manual_and_text_upgrades_raise_income() {
    let def = scoped();
    let item = |key: &str| def.item(key).expect("known key");
    let mut engine = Engine::new(Arc::clone(&def));
    engine.catch_up(50, &mut Idle, &CancelToken::new());
    let income = |e: &Engine| e.state().income_per_tick(e.definition());
    assert!((income(&engine) - 1.0).abs() < 1e-12);

    let buy = |e: &mut Engine, key: &str| {
        let r = e.submit(&mut Scripted::new(vec![(0, item(key))]));
        assert!(matches!(r.settlements[..], [Settlement::Applied { .. }]), "{key}: {:?}", r.settlements);
    };

    buy(&mut engine, "sharpen");
    assert!((income(&engine) - 3.0).abs() < 1e-12);
    buy(&mut engine, "eureka");
    assert!((income(&engine) - 4.0).abs() < 1e-12, "multiplier scales the base, the flat bonus stays flat");

    buy(&mut engine, "w0");
    buy(&mut engine, "w1");
    assert!((income(&engine) - 6.0).abs() < 1e-12);
    buy(&mut engine, "context");
    assert!((income(&engine) - 7.0).abs() < 1e-12);
    assert_eq!(engine.state().owned(ProducerId(0)), 0);
}

#[test]
fn scoped_upgrades_survive_a_restore() {
    let def = scoped();
    let mut engine = Engine::new(Arc::clone(&def));
    engine.catch_up(50, &mut GreedyCheapest, &CancelToken::new());
    let restored = Engine::restore(Arc::clone(&def), &engine.view()).expect("restore");
    assert_eq!(
        restored.state().income_per_tick(&def),
        engine.state().income_per_tick(&def)
    );
}
