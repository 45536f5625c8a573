//! Per-game and per-batch numbers for tuning AI profiles.
//!
//! A [`MetricsCollector`] watches the round reports of one game and turns
//! them into per-colony [`ColonyMetrics`]; [`BatchSummary`] aggregates many
//! games by AI profile.

use std::collections::BTreeMap;

use hereditus_core::combat::{AttackOutcome, Side};
use hereditus_core::game::{Game, RoundReport};
use serde::{Deserialize, Serialize};

/// What happened in one AI game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// `game_<seed>`.
    pub game_id: String,
    /// Scenario the game was built from.
    pub scenario: String,
    /// Game seed.
    pub seed: u64,
    /// Rounds played.
    pub rounds: u32,
    /// Profile label of the colony with the most living torbs (None = draw).
    pub winner: Option<String>,
    /// Per-colony metrics, in colony ID order.
    pub colonies: Vec<ColonyMetrics>,
    /// Final game state hash (for determinism validation).
    pub final_state_hash: u64,
}

/// Metrics for a single colony in a game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColonyMetrics {
    /// Colony name.
    pub name: String,
    /// AI profile name, or `human`.
    pub profile: String,

    // population
    /// Living torbs at the end.
    pub living: usize,
    /// Dead torbs at the end.
    pub dead: usize,
    /// Highest generation reached.
    pub max_generation: u32,
    /// Largest living population seen after any round.
    pub peak_population: usize,
    /// Food at the end.
    pub food: u32,

    // warfare
    /// Attacks ordered.
    pub attacks: u32,
    /// Battles and raids won, as attacker or defender.
    pub battles_won: u32,
    /// Battles lost, as attacker or defender.
    pub battles_lost: u32,
    /// Food taken from other colonies.
    pub food_stolen: u32,
    /// Food taken by other colonies.
    pub food_lost: u32,
    /// Scouting attempts that discovered their target.
    pub scouts_succeeded: u32,
    /// Round of the first attack order.
    pub first_attack_round: Option<u32>,
}

/// Collects metrics from round reports as a game runs.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    colonies: Vec<ColonyMetrics>,
    rounds: u32,
}

impl MetricsCollector {
    /// A collector for `game`, labelling colonies with `labels` in order.
    pub fn new(game: &Game, labels: &[String]) -> Self {
        let colonies = game
            .colonies()
            .iter()
            .enumerate()
            .map(|(i, colony)| ColonyMetrics {
                name: colony.name.clone(),
                profile: labels.get(i).cloned().unwrap_or_else(|| "unknown".to_string()),
                ..ColonyMetrics::default()
            })
            .collect();
        Self {
            colonies,
            rounds: 0,
        }
    }

    /// Fold one round report in.
    pub fn record_round(&mut self, report: &RoundReport) {
        self.rounds = report.round;

        for record in &report.scouting {
            if record.outcome.discovered() {
                if let Some(m) = self.colonies.get_mut(record.scout.index()) {
                    m.scouts_succeeded += 1;
                }
            }
        }

        for record in &report.attacks {
            let (a, d) = (record.attacker.index(), record.defender.index());
            if let Some(m) = self.colonies.get_mut(a) {
                m.attacks += 1;
                m.first_attack_round.get_or_insert(report.round);
            }
            let stolen = record.outcome.food_stolen();
            let winner = match record.outcome {
                AttackOutcome::NoSoldiers => None,
                AttackOutcome::Undefended { .. } => Some(Side::Attacker),
                AttackOutcome::Battle { result, .. } => result.winner,
            };
            let (won, lost) = match winner {
                Some(Side::Attacker) => (a, d),
                Some(Side::Defender) => (d, a),
                None => continue,
            };
            if let Some(m) = self.colonies.get_mut(won) {
                m.battles_won += 1;
                m.food_stolen += stolen;
            }
            if let Some(m) = self.colonies.get_mut(lost) {
                m.battles_lost += 1;
                m.food_lost += stolen;
            }
        }

        for summary in &report.colonies {
            if let Some(m) = self.colonies.get_mut(summary.id.index()) {
                m.peak_population = m.peak_population.max(summary.living);
            }
        }
    }

    /// Final metrics, taking end-of-game numbers from `game`.
    pub fn finish(mut self, game: &Game, game_id: String, scenario: String, seed: u64) -> GameMetrics {
        let precision = game.config().army.stat_precision;
        for (m, colony) in self.colonies.iter_mut().zip(game.colonies()) {
            let summary = colony.summary(precision);
            m.living = summary.living;
            m.dead = summary.dead;
            m.max_generation = summary.max_generation;
            m.food = summary.food;
            m.peak_population = m.peak_population.max(summary.living);
        }

        let best = self.colonies.iter().map(|m| m.living).max().unwrap_or(0);
        let leaders: Vec<&ColonyMetrics> =
            self.colonies.iter().filter(|m| m.living == best).collect();
        let winner = match leaders.as_slice() {
            [only] if best > 0 => Some(only.profile.clone()),
            _ => None,
        };

        GameMetrics {
            game_id,
            scenario,
            seed,
            rounds: self.rounds,
            winner,
            colonies: self.colonies,
            final_state_hash: game.state_hash(),
        }
    }
}

/// Aggregate statistics across many games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games folded into this summary.
    pub total_games: u32,
    /// Games won by each profile.
    pub wins_by_profile: BTreeMap<String, u32>,
    /// Win rates by profile.
    pub win_rates: BTreeMap<String, f64>,
    /// Games with no single leader.
    pub draws: u32,
    /// Average living torbs at the end, by profile.
    pub avg_living: BTreeMap<String, f64>,
    /// Average highest generation, by profile.
    pub avg_max_generation: BTreeMap<String, f64>,
    /// Average food stolen per game, by profile.
    pub avg_food_stolen: BTreeMap<String, f64>,
}

impl BatchSummary {
    /// Fold finished games into win rates and averages.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_games: games.len() as u32,
            ..Default::default()
        };

        let mut seats: BTreeMap<String, u32> = BTreeMap::new();
        let mut living: BTreeMap<String, f64> = BTreeMap::new();
        let mut generation: BTreeMap<String, f64> = BTreeMap::new();
        let mut stolen: BTreeMap<String, f64> = BTreeMap::new();

        for game in games {
            match &game.winner {
                Some(winner) => *summary.wins_by_profile.entry(winner.clone()).or_default() += 1,
                None => summary.draws += 1,
            }
            for colony in &game.colonies {
                *seats.entry(colony.profile.clone()).or_default() += 1;
                *living.entry(colony.profile.clone()).or_default() += colony.living as f64;
                *generation.entry(colony.profile.clone()).or_default() +=
                    f64::from(colony.max_generation);
                *stolen.entry(colony.profile.clone()).or_default() += f64::from(colony.food_stolen);
            }
        }

        for (profile, wins) in &summary.wins_by_profile {
            summary
                .win_rates
                .insert(profile.clone(), f64::from(*wins) / f64::from(summary.total_games));
        }
        for (profile, count) in seats {
            let count = f64::from(count);
            summary
                .avg_living
                .insert(profile.clone(), living.get(&profile).copied().unwrap_or(0.0) / count);
            summary.avg_max_generation.insert(
                profile.clone(),
                generation.get(&profile).copied().unwrap_or(0.0) / count,
            );
            summary
                .avg_food_stolen
                .insert(profile.clone(), stolen.get(&profile).copied().unwrap_or(0.0) / count);
        }
        summary
    }
}
