//! lingua_balance CLI.
//!
//! `simulate` is the fail-fast gate: exit 0 only if every error-level check
//! passes for every scenario, 1 if any fails, 2 if the constants cannot even
//! produce an economy.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lingua_balance::economy::TuningConstants;
use lingua_balance::engine::CancelToken;
use lingua_balance::presenter::Presenter;
use lingua_balance::suite;

#[derive(Parser, Debug)]
#[command(name = "lingua_balance")]
#[command(about = "Headless economy simulation and balance checks")]
struct Cli {
    /// Tuning constants (TOML); built-in defaults when omitted
    #[arg(long, global = true)]
    constants: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every seed × policy scenario and print a pass/fail table per scenario
    Simulate {
        /// Override simulation.seeds, e.g. --seeds 1,2,3
        #[arg(long, value_delimiter = ',')]
        seeds: Vec<u64>,

        /// Override simulation.max_ticks
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Wall-clock budget for the whole suite, in milliseconds
        #[arg(long)]
        budget_ms: Option<u64>,

        /// Emit the reports as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Line-driven game loop over the presenter
    Play {
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Print the default constants as TOML
    Constants,

    /// Suggest a word_cost_scale that puts all-words time on target
    #[cfg(feature = "calibrate")]
    Calibrate {
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Target ticks; midpoint of checks.all_words when omitted
        #[arg(long)]
        target_ticks: Option<f64>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lingua_balance=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn load_constants(path: Option<&PathBuf>) -> lingua_balance::Result<TuningConstants> {
    match path {
        Some(p) => Ok(TuningConstants::load(p)?),
        None => Ok(TuningConstants::default()),
    }
}

fn execute(cli: Cli) -> lingua_balance::Result<ExitCode> {
    let mut constants = load_constants(cli.constants.as_ref())?;
    match cli.command {
        Command::Simulate { seeds, max_ticks, budget_ms, json } => {
            if !seeds.is_empty() {
                constants.simulation.seeds = seeds;
            }
            if let Some(m) = max_ticks {
                constants.simulation.max_ticks = m;
            }
            let cancel = match budget_ms {
                Some(ms) => CancelToken::with_budget(Duration::from_millis(ms)),
                None => CancelToken::new(),
            };
            let reports = suite::run_suite(&constants, &cancel)?;

            if json {
                match serde_json::to_string_pretty(&reports) {
                    Ok(s) => println!("{s}"),
                    Err(e) => eprintln!("error: {e}"),
                }
            } else {
                for r in &reports {
                    println!(
                        "== seed {} · {} · {} ticks · {}/{} words · stop {:?}",
                        r.seed, r.policy, r.ticks, r.lexicon_size, r.words, r.stop
                    );
                    print!("{}", r.verdict.render_table());
                    println!();
                }
            }

            let failed = reports.iter().filter(|r| !r.passed()).count();
            println!("{} of {} scenarios passed", reports.len() - failed, reports.len());
            Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::from(1) })
        }

        Command::Play { seed } => {
            play(Presenter::new(seed, &constants)?);
            Ok(ExitCode::SUCCESS)
        }

        Command::Constants => {
            print!("{}", TuningConstants::default().to_toml_string()?);
            Ok(ExitCode::SUCCESS)
        }

        #[cfg(feature = "calibrate")]
        Command::Calibrate { seed, target_ticks } => {
            use lingua_balance::calibrate::{self, CalibrateConfig};
            use lingua_balance::engine::PolicyKind;

            let (lo, hi) = constants.checks.all_words;
            let target = target_ticks.unwrap_or(0.5 * (lo + hi) as f64);
            let policy = constants.simulation.policies.first().cloned().unwrap_or(PolicyKind::GreedyCheapest);
            let c = calibrate::word_cost_scale(seed, &constants, &policy, target, &CalibrateConfig::default())?;
            println!(
                "word_cost_scale {:.4} -> {:.4}  (all words at tick {} -> {}, target {:.0}, {} runs{})",
                c.initial_scale,
                c.scale,
                c.initial_ticks,
                c.ticks,
                c.target_ticks,
                c.iterations,
                if c.converged { "" } else { ", not converged" }
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn play(mut presenter: Presenter) {
    println!("commands: state | list | buy KEY | wait SECONDS | save | quit");
    let stdin = io::stdin();
    let mut out = io::stdout();
    loop {
        let _ = write!(out, "> ");
        let _ = out.flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("state"), _) => {
                let v = presenter.current_state();
                println!(
                    "tick {}  currency {:.2}  income {:.2}/s  lexicon {}",
                    v.tick,
                    v.currency,
                    presenter.income_rate(),
                    v.lexicon_size
                );
                for (key, n) in v.owned.iter().filter(|(_, n)| **n > 0) {
                    println!("  {key} × {n}");
                }
            }
            (Some("list"), _) => {
                for o in presenter.purchasable() {
                    let mark = if o.affordable { "*" } else { " " };
                    let wait = match o.wait_seconds {
                        Some(s) if s > 0.0 => format!("in {s:.0}s"),
                        Some(_) => String::new(),
                        None => "never".into(),
                    };
                    println!("{mark} {:<14} {:>12.2} {:>9}  {}", o.key, o.cost, wait, o.name);
                }
            }
            (Some("buy"), Some(key)) => match presenter.submit_purchase(key) {
                Ok(a) => println!("bought {} for {:.2}; {:.2} left", a.key, a.cost, a.currency_after),
                Err(reason) => println!("rejected: {reason}"),
            },
            (Some("wait"), Some(secs)) => {
                match secs.parse::<f64>().ok().and_then(|s| Duration::try_from_secs_f64(s).ok()) {
                    Some(d) => {
                        let c = presenter.advance(d);
                        if c.cancelled {
                            println!("{} of {} ticks passed; the rest carries over", c.applied, c.requested);
                        } else {
                            println!("{} ticks passed", c.applied);
                        }
                    }
                    None => println!("wait takes a non-negative number of seconds"),
                }
            }
            (Some("save"), _) => match presenter.current_state().to_json() {
                Ok(s) => println!("{s}"),
                Err(e) => println!("error: {e}"),
            },
            (Some("quit"), _) => break,
            (None, _) => {}
            _ => println!("unknown command"),
        }
        for e in presenter.drain_events() {
            println!("  ! {e:?}");
        }
    }
}
