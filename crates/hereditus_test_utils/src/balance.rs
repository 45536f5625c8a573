//! Balance testing utilities.
//!
//! Runs many seeded battles between fixture armies, or many AI-vs-AI games,
//! and aggregates the outcomes so tests can assert on win rates.

use hereditus_core::combat::{battle_army, BattleEnd, Side};
use hereditus_core::config::ArmyConfig;
use hereditus_core::narrative::Chronicle;
use hereditus_core::prelude::AiProfile;
use serde::Serialize;

use crate::fixtures::{ai_game, army_colony, rng, Stats};

/// Statistics for a set of battles.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BattleStats {
    /// Total battles run.
    pub total_battles: u32,
    /// Wins for the attacker.
    pub attacker_wins: u32,
    /// Wins for the defender.
    pub defender_wins: u32,
    /// Retreats before either side was wiped out.
    pub retreats: u32,
    /// Battles stopped by the duel cap.
    pub stalemates: u32,
    /// Average duels per battle.
    pub avg_duels: f64,
}

impl BattleStats {
    /// Attacker win rate (0.0 to 1.0).
    pub fn attacker_win_rate(&self) -> f64 {
        if self.total_battles == 0 {
            return 0.5;
        }
        f64::from(self.attacker_wins) / f64::from(self.total_battles)
    }

    /// Defender win rate (0.0 to 1.0).
    pub fn defender_win_rate(&self) -> f64 {
        if self.total_battles == 0 {
            return 0.5;
        }
        f64::from(self.defender_wins) / f64::from(self.total_battles)
    }

    /// Check if the matchup is balanced (attacker rate within range).
    pub fn is_balanced(&self, min_rate: f64, max_rate: f64) -> bool {
        let rate = self.attacker_win_rate();
        rate >= min_rate && rate <= max_rate
    }
}

/// One side of a fixture battle.
#[derive(Debug, Clone, Copy)]
pub struct ArmySpec {
    /// Number of soldiers.
    pub soldiers: u64,
    /// Stats shared by every soldier.
    pub stats: Stats,
}

impl ArmySpec {
    /// `soldiers` soldiers with uniform stat `value`.
    #[must_use]
    pub const fn uniform(soldiers: u64, value: f64) -> Self {
        Self {
            soldiers,
            stats: Stats::uniform(value),
        }
    }
}

/// Fight `battles` seeded battles between fresh copies of two armies.
pub fn run_battles(
    attacker: ArmySpec,
    defender: ArmySpec,
    config: &ArmyConfig,
    battles: u32,
    seed: u64,
) -> BattleStats {
    let mut stats = BattleStats::default();
    let mut total_duels = 0u64;

    for n in 0..battles {
        let mut a = army_colony(0, "Attacker", attacker.soldiers, 1, attacker.stats);
        let mut d = army_colony(1, "Defender", defender.soldiers, 1_000, defender.stats);
        let mut chronicle = Chronicle::new();
        let mut rng = rng(seed.wrapping_add(u64::from(n)));

        let result = battle_army(&mut a, &mut d, config, &mut chronicle, &mut rng);
        stats.total_battles += 1;
        total_duels += u64::from(result.duels);
        match (result.winner, result.end) {
            (Some(Side::Attacker), _) => stats.attacker_wins += 1,
            (Some(Side::Defender), _) => stats.defender_wins += 1,
            (None, BattleEnd::Retreat) => stats.retreats += 1,
            (None, _) => stats.stalemates += 1,
        }
    }

    if stats.total_battles > 0 {
        stats.avg_duels = total_duels as f64 / f64::from(stats.total_battles);
    }
    stats
}

/// Outcome counts for AI profiles over many games.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileStats {
    /// Games run.
    pub games: u32,
    /// Living torbs at the end, summed per profile position.
    pub living: Vec<u64>,
    /// Food at the end, summed per profile position.
    pub food: Vec<u64>,
}

impl ProfileStats {
    /// Average living torbs for profile position `i`.
    pub fn avg_living(&self, i: usize) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.living.get(i).copied().unwrap_or(0) as f64 / f64::from(self.games)
    }
}

/// Play `games` AI games of `rounds` rounds each and sum up end states.
pub fn run_profile_games(profiles: &[AiProfile], games: u32, rounds: u32, seed: u64) -> ProfileStats {
    let mut stats = ProfileStats {
        games: 0,
        living: vec![0; profiles.len()],
        food: vec![0; profiles.len()],
    };

    for n in 0..games {
        let mut game = ai_game(seed.wrapping_add(u64::from(n)), profiles);
        for _ in 0..rounds {
            if let Err(err) = game.advance_ai_round() {
                tracing::warn!(error = %err, "Balance game stopped early");
                break;
            }
        }
        for (i, colony) in game.colonies().iter().enumerate() {
            stats.living[i] += colony.living_count() as u64;
            stats.food[i] += u64::from(colony.food);
        }
        stats.games += 1;
    }
    stats
}
