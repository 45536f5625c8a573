//! Parallel AI-vs-AI games for balance testing.
//!
//! Each game of a batch runs one scenario with its own seed
//! (`first_seed + index`) on the rayon pool, and the per-game metrics are
//! folded into a [`BatchSummary`]. Games are independent, so results are
//! identical however many threads run them.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::metrics::{BatchSummary, GameMetrics, MetricsCollector};
use crate::scenario::{Scenario, ScenarioError};

/// How often (in finished games) progress is logged.
const PROGRESS_EVERY: u32 = 50;

/// What to run in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Built-in scenario name or path to a RON scenario.
    pub scenario: String,
    /// Number of games.
    pub games: u32,
    /// Worker threads (0 = rayon's default pool).
    pub threads: usize,
    /// Where the CLI writes `batch_results.json`.
    pub output_dir: PathBuf,
    /// Seed of game 0; game `i` uses `first_seed + i`.
    pub first_seed: u64,
    /// Rounds per game, overriding the scenario's own count.
    pub rounds: Option<u32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::for_scenario("skirmish_1v1", 100)
    }
}

impl BatchConfig {
    /// `games` games of `scenario` with default settings.
    pub fn for_scenario(scenario: &str, games: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            games,
            threads: 0,
            output_dir: PathBuf::from("results"),
            first_seed: 0,
            rounds: None,
        }
    }

    /// Start seeds at `seed`.
    pub fn seeded(mut self, seed: u64) -> Self {
        self.first_seed = seed;
        self
    }

    /// Play `rounds` rounds per game.
    pub fn rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds);
        self
    }
}

/// A game that could not be played to the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedGame {
    /// Position in the batch.
    pub index: u32,
    /// Seed it was started with.
    pub seed: u64,
    /// Why it stopped.
    pub reason: String,
}

/// Everything a batch produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// The batch that was run.
    pub config: BatchConfig,
    /// Metrics of every finished game, in seed order.
    pub games: Vec<GameMetrics>,
    /// Aggregate over `games`.
    pub summary: BatchSummary,
    /// Games that failed.
    pub failures: Vec<FailedGame>,
    /// Wall-clock time of the run.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Write as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Read results written by [`BatchResults::write_json`].
    pub fn read_json(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(std::io::Error::other)
    }
}

/// Play one AI-only game of `scenario` to its round limit.
pub fn run_single_game(scenario: &Scenario, seed: u64, rounds: u32) -> Result<GameMetrics, String> {
    let mut game = scenario.build_with_seed(seed).map_err(|e| e.to_string())?;
    let mut collector = MetricsCollector::new(&game, &scenario.seat_labels());

    for _ in 0..rounds {
        let report = game.advance_ai_round().map_err(|e| e.to_string())?;
        collector.record_round(&report);
    }

    Ok(collector.finish(&game, format!("game_{seed}"), scenario.name.clone(), seed))
}

/// Run every game of a batch.
///
/// Fails up front if the scenario cannot be resolved; games that fail on
/// their own are listed in [`BatchResults::failures`].
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let scenario = Scenario::resolve(&config.scenario)?;
    let rounds = config.rounds.unwrap_or(scenario.rounds);
    let started = Instant::now();
    let finished = AtomicU32::new(0);

    info!(
        games = config.games,
        scenario = %scenario.name,
        rounds,
        threads = config.threads,
        "Starting batch run"
    );

    let play = |index: u32| {
        let seed = config.first_seed.wrapping_add(u64::from(index));
        let outcome = run_single_game(&scenario, seed, rounds).map_err(|reason| {
            warn!(game = index, seed, error = %reason, "Game failed");
            FailedGame {
                index,
                seed,
                reason,
            }
        });
        let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
        if done % PROGRESS_EVERY == 0 {
            info!(done, total = config.games, "Batch progress");
        }
        outcome
    };

    let outcomes: Vec<Result<GameMetrics, FailedGame>> = if config.threads > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
        {
            Ok(pool) => pool.install(|| (0..config.games).into_par_iter().map(play).collect()),
            Err(err) => {
                warn!(error = %err, "Could not build thread pool, using the global one");
                (0..config.games).into_par_iter().map(play).collect()
            }
        }
    } else {
        (0..config.games).into_par_iter().map(play).collect()
    };

    let mut games = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(metrics) => games.push(metrics),
            Err(failed) => failures.push(failed),
        }
    }

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = started.elapsed().as_secs_f64();
    info!(
        games = games.len(),
        failures = failures.len(),
        seconds = duration_seconds,
        "Batch complete"
    );

    Ok(BatchResults {
        config,
        games,
        summary,
        failures,
        duration_seconds,
    })
}

/// Play the same seed `runs` times and compare final state hashes.
pub fn verify_determinism(scenario: &Scenario, seed: u64, runs: u32) -> Result<bool, String> {
    let mut hashes = Vec::with_capacity(runs as usize);
    for _ in 0..runs {
        hashes.push(run_single_game(scenario, seed, scenario.rounds)?.final_state_hash);
    }
    Ok(hashes.windows(2).all(|w| w[0] == w[1]))
}
