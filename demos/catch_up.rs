// demos/catch_up.rs
// Run with:
//   cargo run --example catch_up
//
// A player buys a few things, leaves for a while, and comes back: the absence
// is replayed as a catch-up batch, then a long batch is cut short by a budget.

use std::sync::Arc;
use std::time::Duration;

use lingua_balance::content;
use lingua_balance::economy::{self, TuningConstants};
use lingua_balance::engine::{CancelToken, Engine, Idle};
use lingua_balance::presenter::Presenter;

fn main() -> lingua_balance::Result<()> {
    let constants = TuningConstants::default();
    let mut game = Presenter::new(7, &constants)?;

    game.advance(Duration::from_secs(30));
    for key in ["word_00", "tool_00", "tool_00"] {
        match game.submit_purchase(key) {
            Ok(a) => println!("bought {key} for {:.2}, {:.2} left", a.cost, a.currency_after),
            Err(reason) => println!("{key} rejected: {reason}"),
        }
    }

    let saved = game.current_state().to_json().unwrap_or_default();
    println!("saved at tick {}: {} bytes", game.current_state().tick, saved.len());

    // Two and a half minutes away: 150 whole ticks, half a second carried.
    let back = game.advance(Duration::from_millis(150_500));
    println!(
        "away: {} ticks replayed, currency now {:.2}, income {:.2}/s",
        back.applied,
        game.current_state().currency,
        game.income_rate()
    );
    for e in game.drain_events() {
        println!("  ! {e:?}");
    }

    // A very long absence under a tight wall-clock budget.
    let model = content::generate(7, &constants.content)?;
    let def = Arc::new(economy::build(&model, &constants)?);
    let mut engine = Engine::new(def);
    let budget = CancelToken::with_budget(Duration::from_millis(5));
    let out = engine.catch_up(5_000_000, &mut Idle, &budget);
    println!(
        "long catch-up: {} of {} ticks before cancel={}; state is at tick {}",
        out.applied,
        out.requested,
        out.cancelled,
        engine.state().tick()
    );
    Ok(())
}
