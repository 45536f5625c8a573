//! `hereditus`: play, batch, verify and validate from the command line.
//!
//! ```bash
//! # JSON session on stdin/stdout
//! cargo run -p hereditus_headless
//!
//! # Run a session with a scenario's colonies already joined, recording it
//! cargo run -p hereditus_headless -- run --scenario skirmish_1v1 --record session.replay
//!
//! # 1000 AI games for balance numbers
//! cargo run -p hereditus_headless -- batch --scenario free_for_all --count 1000 --output results/
//!
//! # Verify determinism, or a recorded replay
//! cargo run -p hereditus_headless -- verify --seed 7 --runs 5
//! cargo run -p hereditus_headless -- verify --replay session.replay
//!
//! # Check config, AI profile and scenario files
//! cargo run -p hereditus_headless -- validate --config game.ron --profile turtle.ron
//! ```
//!
//! Stdout carries only protocol lines; logs go to stderr.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hereditus_core::prelude::{AiProfile, GameConfig, Replay, ReplayPlayer};
use hereditus_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "hereditus_headless")]
#[command(about = "Headless Hereditus runner for bots, balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single interactive game over stdin/stdout
    Run {
        /// Built-in scenario name or RON file whose colonies join first
        #[arg(short, long)]
        scenario: Option<String>,

        /// Game seed (defaults to the scenario's, or 0)
        #[arg(long)]
        seed: Option<u64>,

        /// Output state after every resolved round
        #[arg(long)]
        auto_state: bool,

        /// Write the session's replay to this file on exit
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Run batch of AI games for balance testing
    Batch {
        /// Scenario to run
        #[arg(short, long, default_value = "skirmish_1v1")]
        scenario: String,

        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Worker threads (0 = one per core)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Rounds per game (defaults to the scenario's)
        #[arg(short, long)]
        rounds: Option<u32>,
    },

    /// Verify determinism by running the same seed several times, or
    /// verify a recorded replay
    Verify {
        /// Scenario to test
        #[arg(short, long, default_value = "skirmish_1v1")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Replay file to verify instead
        #[arg(long)]
        replay: Option<PathBuf>,
    },

    /// Check RON config, AI profile and scenario files
    Validate {
        /// Game config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// AI profile file
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Scenario file
        #[arg(long)]
        scenario: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout belongs to the protocol
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            seed,
            auto_state,
            record,
        }) => cmd_run(scenario, seed, auto_state, record),
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
            rounds,
        }) => cmd_batch(scenario, count, parallel, output, seed, rounds),
        Some(Commands::Verify {
            replay: Some(file), ..
        }) => cmd_verify_replay(file),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
            replay: None,
        }) => cmd_verify(scenario, seed, runs),
        Some(Commands::Validate {
            config,
            profile,
            scenario,
        }) => cmd_validate(config, profile, scenario),
        None => cmd_run(None, None, false, None),
    }
}

/// Serve one JSON session on stdin/stdout.
fn cmd_run(
    scenario: Option<String>,
    seed: Option<u64>,
    auto_state: bool,
    record: Option<PathBuf>,
) -> ExitCode {
    let config = HeadlessConfig {
        auto_state,
        record_path: record,
    };

    let runner = match scenario {
        Some(name) => Scenario::resolve(&name).and_then(|scenario| {
            let seed = seed.unwrap_or(scenario.config.seed);
            HeadlessRunner::from_scenario(&scenario, seed, config)
        }),
        None => HeadlessRunner::with_config(GameConfig::with_seed(seed.unwrap_or(0)), config)
            .map_err(Into::into),
    };
    let mut runner = match runner {
        Ok(runner) => runner,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start session");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Starting interactive session");
    let stdin = io::stdin();
    let stdout = io::stdout();
    match runner.run(stdin.lock(), stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Session IO failed");
            ExitCode::FAILURE
        }
    }
}

/// Play a batch of AI games and write `batch_results.json`.
fn cmd_batch(
    scenario: String,
    count: u32,
    parallel: usize,
    output: PathBuf,
    seed: u64,
    rounds: Option<u32>,
) -> ExitCode {
    let mut config = BatchConfig::for_scenario(&scenario, count).seeded(seed);
    config.threads = parallel;
    config.output_dir = output;
    if let Some(rounds) = rounds {
        config = config.rounds(rounds);
    }
    let results_path = config.output_dir.join("batch_results.json");

    let results = match run_batch(config) {
        Ok(results) => results,
        Err(e) => {
            tracing::error!(error = %e, scenario = %scenario, "Batch run failed");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = results.write_json(&results_path) {
        tracing::error!(error = %e, path = %results_path.display(), "Failed to write results");
        return ExitCode::FAILURE;
    }

    let summary = &results.summary;
    eprintln!("{} games, {} draws, {:.1}s", results.games.len(), summary.draws, results.duration_seconds);
    for (profile, rate) in &summary.win_rates {
        let living = summary.avg_living.get(profile).copied().unwrap_or(0.0);
        eprintln!(
            "  {profile:<12} wins {:>5.1}%  avg living {living:>6.1}",
            rate * 100.0
        );
    }
    for failed in &results.failures {
        eprintln!("  game {} (seed {}) failed: {}", failed.index, failed.seed, failed.reason);
    }
    eprintln!("Results: {}", results_path.display());

    if results.failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Play one seed `runs` times and compare final hashes.
fn cmd_verify(scenario: String, seed: u64, runs: u32) -> ExitCode {
    tracing::info!(scenario = %scenario, seed, runs, "Verifying determinism");

    let scenario = match Scenario::resolve(&scenario) {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load scenario");
            return ExitCode::FAILURE;
        }
    };

    match verify_determinism(&scenario, seed, runs) {
        Ok(true) => {
            eprintln!("PASS: {runs} runs of seed {seed} ended on the same hash");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            eprintln!("FAIL: seed {seed} produced different hashes");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("FAIL: Game did not complete: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Re-run a recorded replay and compare its final hash
fn cmd_verify_replay(file: PathBuf) -> ExitCode {
    tracing::info!(file = %file.display(), "Verifying replay");

    let replay = match Replay::load(&file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to load replay: {e}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Replay of seed {}: {} entries over {} rounds",
        replay.seed(),
        replay.len(),
        replay.final_round
    );

    let mut player = match ReplayPlayer::new(replay) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to create replay player: {e}");
            return ExitCode::FAILURE;
        }
    };

    match player.verify() {
        Ok(true) => {
            eprintln!("PASS: replay reproduced hash {:016x}", player.replay().final_hash);
            ExitCode::SUCCESS
        }
        Ok(false) => {
            eprintln!("FAIL: Replay diverged");
            eprintln!("  Expected hash: {:016x}", player.replay().final_hash);
            eprintln!("  Actual hash:   {:016x}", player.game().state_hash());
            eprintln!(
                "  Rounds: expected {}, got {}",
                player.replay().final_round,
                player.game().round()
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("FAIL: Replay entry {} was refused: {e}", player.position());
            ExitCode::FAILURE
        }
    }
}

/// Check config, profile and scenario files
fn cmd_validate(
    config: Option<PathBuf>,
    profile: Option<PathBuf>,
    scenario: Option<PathBuf>,
) -> ExitCode {
    let mut checked = 0;
    let mut failed = 0;

    let mut report = |kind: &str, path: &PathBuf, result: Result<(), String>| {
        checked += 1;
        match result {
            Ok(()) => eprintln!("OK   {kind} {}", path.display()),
            Err(e) => {
                failed += 1;
                eprintln!("FAIL {kind} {}: {e}", path.display());
            }
        }
    };

    if let Some(path) = &config {
        let result = GameConfig::load(path).and_then(|c| c.validate());
        report("config", path, result.map_err(|e| e.to_string()));
    }
    if let Some(path) = &profile {
        let result = AiProfile::load(path).and_then(|p| p.validate());
        report("profile", path, result.map_err(|e| e.to_string()));
    }
    if let Some(path) = &scenario {
        let result = Scenario::load(path).map(|_| ());
        report("scenario", path, result.map_err(|e| e.to_string()));
    }

    if checked == 0 {
        eprintln!("Nothing to validate; pass --config, --profile or --scenario");
        return ExitCode::FAILURE;
    }
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
