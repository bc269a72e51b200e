//! Batch match execution and JSON result reporting.
//!
//! Batches fan seeded matches out across a rayon pool. Each match is
//! fully independent (own simulation, own strategy instance), so the
//! results are identical to a serial run.

use std::fs;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use castles_core::config::SimConfig;
use castles_core::entities::Side;
use castles_core::error::SimError;

use crate::runner::{run_match, MatchSummary};
use crate::strategies;

/// Errors raised while running or persisting a batch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The simulation rejected its configuration.
    #[error("simulation error: {0}")]
    Sim(#[from] SimError),
    /// The requested strategy name is not registered.
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),
    /// Reading or writing a results file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Results could not be serialized or parsed.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parameters for a batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of matches to run.
    pub count: u32,
    /// Seed of the first match; match `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Tick budget per match.
    pub max_ticks: u64,
    /// Strategy name for the controlled side.
    pub strategy: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count: 100,
            seed_start: 0,
            max_ticks: 200_000,
            strategy: "first".to_string(),
        }
    }
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches run.
    pub games: u32,
    /// Wins for the controlled (left) side.
    pub wins_left: u32,
    /// Wins for the automated (right) side.
    pub wins_right: u32,
    /// Matches that exhausted their tick budget.
    pub draws: u32,
    /// Left-side win rate over decided and drawn games alike.
    pub left_win_rate: f64,
    /// Mean ticks per match.
    pub avg_ticks: f64,
}

/// Full batch output: per-game records plus the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Strategy the controlled side played.
    pub strategy: String,
    /// One record per match, in seed order.
    pub games: Vec<MatchSummary>,
    /// Aggregate statistics.
    pub summary: BatchSummary,
    /// Wall-clock seconds the batch took.
    pub wall_seconds: f64,
}

impl BatchResults {
    /// Write results as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), BatchError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load results previously written by [`BatchResults::save`].
    pub fn load(path: &Path) -> Result<Self, BatchError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn summarize(games: &[MatchSummary]) -> BatchSummary {
    let mut summary = BatchSummary {
        games: games.len() as u32,
        wins_left: 0,
        wins_right: 0,
        draws: 0,
        left_win_rate: 0.0,
        avg_ticks: 0.0,
    };
    let mut total_ticks = 0u64;
    for game in games {
        total_ticks += game.ticks;
        match game.winner {
            Some(Side::Left) => summary.wins_left += 1,
            Some(Side::Right) => summary.wins_right += 1,
            None => summary.draws += 1,
        }
    }
    if summary.games > 0 {
        summary.left_win_rate = f64::from(summary.wins_left) / f64::from(summary.games);
        summary.avg_ticks = total_ticks as f64 / f64::from(summary.games);
    }
    summary
}

/// Run `config.count` seeded matches in parallel and aggregate them.
pub fn run_batch(config: &BatchConfig) -> Result<BatchResults, BatchError> {
    // Fail on a bad strategy name before spawning any work.
    if strategies::by_name(&config.strategy).is_none() {
        return Err(BatchError::UnknownStrategy(config.strategy.clone()));
    }

    info!(
        count = config.count,
        seed_start = config.seed_start,
        strategy = %config.strategy,
        "starting batch"
    );
    let start = Instant::now();

    let games = (0..config.count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start + u64::from(i);
            let sim_config = SimConfig {
                rng_seed: seed,
                ..SimConfig::default()
            };
            let mut strategy = strategies::by_name(&config.strategy)
                .ok_or_else(|| BatchError::UnknownStrategy(config.strategy.clone()))?;
            Ok(run_match(sim_config, strategy.as_mut(), config.max_ticks)?)
        })
        .collect::<Result<Vec<MatchSummary>, BatchError>>()?;

    let summary = summarize(&games);
    let wall_seconds = start.elapsed().as_secs_f64();
    info!(
        wins_left = summary.wins_left,
        wins_right = summary.wins_right,
        draws = summary.draws,
        wall_seconds,
        "batch finished"
    );

    Ok(BatchResults {
        strategy: config.strategy.clone(),
        games,
        summary,
        wall_seconds,
    })
}

/// Replay one seed several times and check every run lands on the same
/// final state hash. Returns the shared hash on success, or the first
/// diverging pair.
pub fn verify_determinism(
    seed: u64,
    runs: u32,
    max_ticks: u64,
) -> Result<Result<u64, (u64, u64)>, BatchError> {
    let mut baseline: Option<u64> = None;
    for _ in 0..runs {
        let config = SimConfig {
            rng_seed: seed,
            ..SimConfig::default()
        };
        let mut strategy = strategies::FirstOffer;
        let summary = run_match(config, &mut strategy, max_ticks)?;
        match baseline {
            None => baseline = Some(summary.state_hash),
            Some(expected) if expected != summary.state_hash => {
                return Ok(Err((expected, summary.state_hash)));
            }
            Some(_) => {}
        }
    }
    Ok(Ok(baseline.unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_batch_aggregates() {
        let config = BatchConfig {
            count: 4,
            max_ticks: 2_000,
            ..BatchConfig::default()
        };
        let results = run_batch(&config).unwrap();
        assert_eq!(results.games.len(), 4);
        assert_eq!(results.summary.games, 4);
        assert_eq!(
            results.summary.wins_left + results.summary.wins_right + results.summary.draws,
            4
        );
        // Seeds are assigned in order regardless of worker scheduling.
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let config = BatchConfig {
            strategy: "psychic".to_string(),
            ..BatchConfig::default()
        };
        assert!(matches!(
            run_batch(&config),
            Err(BatchError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_results_round_trip_through_json() {
        let config = BatchConfig {
            count: 2,
            max_ticks: 500,
            ..BatchConfig::default()
        };
        let results = run_batch(&config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        results.save(&path).unwrap();
        let loaded = BatchResults::load(&path).unwrap();

        assert_eq!(loaded.games.len(), results.games.len());
        assert_eq!(loaded.summary.games, results.summary.games);
        assert_eq!(loaded.games[0].state_hash, results.games[0].state_hash);
    }

    #[test]
    fn test_verify_determinism_passes() {
        let verdict = verify_determinism(11, 3, 2_000).unwrap();
        assert!(verdict.is_ok());
    }
}
