//! Headless CLI for Castles Clash.
//!
//! Runs full matches without rendering: single games, batch balance
//! sweeps, determinism verification, and tick throughput benchmarks.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use castles_core::config::SimConfig;
use castles_core::entities::Side;
use castles_core::math::Fixed;
use castles_core::simulation::Simulation;
use castles_headless::batch::{run_batch, BatchConfig};
use castles_headless::runner::{run_match_observed, TICK_MS};
use castles_headless::strategies;

#[derive(Parser)]
#[command(name = "castles_headless")]
#[command(about = "Headless Castles Clash match runner", version)]
struct Cli {
    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single match and print a summary
    Run {
        /// Simulation seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Tick budget before declaring a draw
        #[arg(long, default_value_t = 200_000)]
        max_ticks: u64,
        /// Draft strategy: first, idle, or round-robin
        #[arg(long, default_value = "first")]
        strategy: String,
        /// Print every simulation event
        #[arg(long)]
        events: bool,
    },
    /// Run many seeded matches and tally win rates
    Batch {
        /// Number of matches
        #[arg(long, default_value_t = 100)]
        count: u32,
        /// Seed of the first match
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Tick budget per match
        #[arg(long, default_value_t = 200_000)]
        max_ticks: u64,
        /// Draft strategy: first, idle, or round-robin
        #[arg(long, default_value = "first")]
        strategy: String,
        /// Write per-game JSON results here
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Re-run one seed several times and compare final state hashes
    Verify {
        /// Simulation seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Number of replays
        #[arg(long, default_value_t = 3)]
        runs: u32,
        /// Tick budget per replay
        #[arg(long, default_value_t = 50_000)]
        max_ticks: u64,
    },
    /// Measure tick throughput on a crowded battlefield
    Benchmark {
        /// Ticks to execute
        #[arg(long, default_value_t = 100_000)]
        ticks: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();

    let command = cli.command.unwrap_or(Commands::Run {
        seed: 0,
        max_ticks: 200_000,
        strategy: "first".to_string(),
        events: false,
    });

    match command {
        Commands::Run {
            seed,
            max_ticks,
            strategy,
            events,
        } => cmd_run(seed, max_ticks, &strategy, events),
        Commands::Batch {
            count,
            seed,
            max_ticks,
            strategy,
            output,
        } => cmd_batch(count, seed, max_ticks, &strategy, output),
        Commands::Verify {
            seed,
            runs,
            max_ticks,
        } => cmd_verify(seed, runs, max_ticks),
        Commands::Benchmark { ticks } => cmd_benchmark(ticks),
    }
}

fn cmd_run(seed: u64, max_ticks: u64, strategy_name: &str, print_events: bool) {
    let Some(mut strategy) = strategies::by_name(strategy_name) else {
        eprintln!("Unknown strategy '{strategy_name}' (try: first, idle, round-robin)");
        std::process::exit(1);
    };

    info!(seed, strategy = strategy_name, "running match");
    let config = SimConfig {
        rng_seed: seed,
        ..SimConfig::default()
    };
    let result = run_match_observed(config, strategy.as_mut(), max_ticks, |event| {
        if print_events {
            println!("{event:?}");
        }
    });

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Match failed: {e}");
            std::process::exit(1);
        }
    };

    eprintln!("{}", "=".repeat(50));
    eprintln!("Match summary (seed {})", summary.seed);
    eprintln!("{}", "=".repeat(50));
    match summary.winner {
        Some(Side::Left) => eprintln!("Winner:        left (controlled)"),
        Some(Side::Right) => eprintln!("Winner:        right (automated)"),
        None => eprintln!("Winner:        none (tick budget exhausted)"),
    }
    eprintln!("Ticks:         {}", summary.ticks);
    eprintln!("Sim time:      {} ms", summary.sim_time_ms);
    eprintln!(
        "Units spawned: {} left / {} right",
        summary.spawned_left, summary.spawned_right
    );
    eprintln!("Draft turns:   {}", summary.turns_resolved);
    eprintln!("State hash:    {:016x}", summary.state_hash);
}

fn cmd_batch(count: u32, seed: u64, max_ticks: u64, strategy: &str, output: Option<PathBuf>) {
    let config = BatchConfig {
        count,
        seed_start: seed,
        max_ticks,
        strategy: strategy.to_string(),
    };

    let results = match run_batch(&config) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Batch failed: {e}");
            std::process::exit(1);
        }
    };

    let s = &results.summary;
    eprintln!("{}", "=".repeat(50));
    eprintln!("Batch results ({} games, strategy {})", s.games, strategy);
    eprintln!("{}", "=".repeat(50));
    eprintln!("Left wins:     {}", s.wins_left);
    eprintln!("Right wins:    {}", s.wins_right);
    eprintln!("Draws:         {}", s.draws);
    eprintln!("Left win rate: {:.1}%", s.left_win_rate * 100.0);
    eprintln!("Avg ticks:     {:.0}", s.avg_ticks);
    eprintln!("Wall time:     {:.2}s", results.wall_seconds);

    if let Some(path) = output {
        if let Err(e) = results.save(&path) {
            eprintln!("Failed to write {}: {e}", path.display());
            std::process::exit(1);
        }
        eprintln!("Results written to {}", path.display());
    }
}

fn cmd_verify(seed: u64, runs: u32, max_ticks: u64) {
    info!(seed, runs, "verifying determinism");
    match castles_headless::batch::verify_determinism(seed, runs, max_ticks) {
        Ok(Ok(hash)) => {
            eprintln!("PASS: {runs} runs of seed {seed} agree on hash {hash:016x}");
        }
        Ok(Err((expected, actual))) => {
            eprintln!("FAIL: seed {seed} diverged ({expected:016x} vs {actual:016x})");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Verification failed to run: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_benchmark(ticks: u64) {
    let mut sim = match Simulation::new(SimConfig::default()) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Benchmark setup failed: {e}");
            std::process::exit(1);
        }
    };
    // Seed a crowded battlefield so ticks exercise combat, not just
    // production timers.
    for i in 0..20 {
        let x = 300 + i * 20;
        let _ = sim.spawn_unit_at(Side::Left, "ant", Fixed::from_num(x));
        let _ = sim.spawn_unit_at(Side::Right, "fencer", Fixed::from_num(1200 - x));
    }

    info!(ticks, "benchmarking");
    let dt = Fixed::from_num(TICK_MS);
    let start = Instant::now();
    for _ in 0..ticks {
        sim.update(dt);
    }
    let elapsed = start.elapsed().as_secs_f64();

    eprintln!("{}", "=".repeat(50));
    eprintln!("Benchmark: {ticks} ticks in {elapsed:.3}s");
    if elapsed > 0.0 {
        eprintln!("Throughput: {:.0} ticks/sec", ticks as f64 / elapsed);
    }
    eprintln!("{}", "=".repeat(50));
}
