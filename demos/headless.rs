// demos/headless.rs
// Run with:
//   cargo run --example headless
//
// One seed, one policy, start to finish: generate → build → run → analyze.

use std::sync::Arc;

use lingua_balance::analysis::{CheckSuite, analyze};
use lingua_balance::content;
use lingua_balance::economy::{self, TuningConstants};
use lingua_balance::engine::{CancelToken, Engine, GreedyCheapest, RunLimits, StopCondition};

fn main() -> lingua_balance::Result<()> {
    let constants = TuningConstants::default();
    let seed = 42;

    let model = content::generate(seed, &constants.content)?;
    println!("== Language (seed {seed}) ==");
    for r in &model.roots {
        println!("root  {:<6} {:<8} {}", r.form, r.category.label(), r.gloss);
    }
    for w in model.lexicon_prefix(8) {
        println!("word  {:<12} c={:<2} {}", w.surface, w.complexity, w.gloss);
    }

    let def = Arc::new(economy::build(&model, &constants)?);
    println!(
        "\n== Economy == {} producers, {} upgrades, {} words, {} texts",
        def.producers().len(),
        def.upgrades().len(),
        def.words().len(),
        def.texts().len()
    );

    let mut engine = Engine::new(Arc::clone(&def));
    let limits = RunLimits {
        max_ticks: constants.simulation.max_ticks,
        snapshot_interval: constants.simulation.snapshot_interval,
    };
    let run = engine.run(&mut GreedyCheapest, &limits, &StopCondition::AllWordsTranslated, &CancelToken::new());

    let view = engine.view();
    println!(
        "\n== Run == stop {:?} after {} ticks; currency {:.1}; lexicon {}/{}",
        run.stop,
        run.ticks,
        view.currency,
        view.lexicon_size,
        def.words().len()
    );
    for (key, n) in view.owned.iter().filter(|(_, n)| **n > 0) {
        println!("  {key} × {n}");
    }
    let learned = engine.state().lexicon().words(&model);
    if let Some(last) = learned.last() {
        println!("  last word learned: {} ({})", last.surface, last.gloss);
    }

    let report = analyze(&run.trajectory, &CheckSuite::from_constants(&constants.checks));
    println!();
    print!("{}", report.render_table());
    Ok(())
}
