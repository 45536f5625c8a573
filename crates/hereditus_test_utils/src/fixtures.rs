//! Test fixtures and helpers.
//!
//! Hand-built genomes, torbs, colonies and games for consistent testing.
//! Fixture genomes use identical alleles so that combat stats are exact.

use hereditus_core::colony::{Colony, Controller};
use hereditus_core::config::GameConfig;
use hereditus_core::genetics::{Gene, Genome, AGILITY, STRENGTH, STURDINESS, VITALITY};
use hereditus_core::prelude::{AiProfile, ColonyId, Game, Torb, TorbId, TorbTag};
use hereditus_core::torb::Action;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Combat stats of a fixture genome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    /// Vitality allele; also the max hp.
    pub vitality: f64,
    /// Sturdiness allele.
    pub sturdiness: f64,
    /// Agility allele.
    pub agility: f64,
    /// Strength allele.
    pub strength: f64,
}

impl Stats {
    /// Every stat set to `value`.
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self {
            vitality: value,
            sturdiness: value,
            agility: value,
            strength: value,
        }
    }

    /// The genome these stats describe, two identical alleles per gene.
    #[must_use]
    pub fn genome(&self) -> Genome {
        [
            (VITALITY, self.vitality),
            (STURDINESS, self.sturdiness),
            (AGILITY, self.agility),
            (STRENGTH, self.strength),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), Gene::new(vec![value, value])))
        .collect()
    }
}

/// A deterministic RNG for tests.
#[must_use]
pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// A human controller.
#[must_use]
pub fn human(player: &str) -> Controller {
    Controller::Human {
        player: player.to_string(),
    }
}

/// A generation-zero torb with the given genome. The tag is reassigned when
/// the torb is adopted by a colony.
#[must_use]
pub fn torb(id: u64, colony: ColonyId, genes: Genome) -> Torb {
    Torb::new(TorbId(id), TorbTag::new(0, 0), "Fixture", colony, genes)
}

/// An empty colony using the default economy.
#[must_use]
pub fn empty_colony(id: u32, name: &str) -> Colony {
    let config = GameConfig::default();
    Colony::new(
        ColonyId(id),
        name,
        human("tester"),
        &config.colony,
        &config.army,
    )
}

/// A colony of `count` identical gatherers. Torb IDs start at
/// `first_id`.
#[must_use]
pub fn colony_with(id: u32, name: &str, count: u64, first_id: u64, stats: Stats) -> Colony {
    let mut colony = empty_colony(id, name);
    for n in 0..count {
        colony.adopt(torb(first_id + n, ColonyId(id), stats.genome()));
    }
    colony
}

/// A colony whose `count` torbs have all been trained and enlisted.
#[must_use]
pub fn army_colony(id: u32, name: &str, count: u64, first_id: u64, stats: Stats) -> Colony {
    let mut colony = colony_with(id, name, count, first_id, stats);
    let ids: Vec<TorbId> = colony.torbs().map(|t| t.id).collect();
    if !ids.is_empty() {
        colony
            .assign_action(&ids, Action::Training)
            .expect("fixture torbs are assignable");
    }
    let precision = GameConfig::default().army.stat_precision;
    colony.train_soldiers(precision, &mut rng(u64::from(id)));
    colony
}

/// A game with two human colonies, "Alicetown" and "Bobville".
#[must_use]
pub fn two_player_game(seed: u64) -> (Game, ColonyId, ColonyId) {
    let mut game = Game::new(GameConfig::with_seed(seed)).expect("default config is valid");
    let a = game
        .join_human("alice", "Alicetown")
        .expect("first colony joins");
    let b = game.join_human("bob", "Bobville").expect("second colony joins");
    (game, a, b)
}

/// A game of AI colonies, one per profile.
#[must_use]
pub fn ai_game(seed: u64, profiles: &[AiProfile]) -> Game {
    ai_game_with(GameConfig::with_seed(seed), profiles)
}

/// A game of AI colonies under a custom config.
#[must_use]
pub fn ai_game_with(config: GameConfig, profiles: &[AiProfile]) -> Game {
    let mut game = Game::new(config).expect("fixture config is valid");
    for profile in profiles {
        game.join_ai(profile.clone()).expect("AI colony joins");
    }
    game
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genome_has_combat_genes() {
        let genes = Stats::uniform(4.0).genome();
        assert_eq!(genes.len(), 4);
        assert!(genes.values().all(|g| g.alleles() == [4.0, 4.0]));
    }

    #[test]
    fn test_colony_with_tags_in_order() {
        let colony = colony_with(0, "Test", 3, 10, Stats::uniform(5.0));
        let tags: Vec<String> = colony.torbs().map(|t| t.tag.to_string()).collect();
        assert_eq!(tags, vec!["00-01", "00-02", "00-03"]);
        assert!(colony.torbs().all(|t| t.hp == 5));
    }

    #[test]
    fn test_army_colony_enlists_everyone() {
        let colony = army_colony(1, "Fort", 4, 1, Stats::uniform(9.0));
        assert_eq!(colony.army.len(), 4);
        assert_eq!(colony.count_action(Action::Soldiering), 4);
        let soldier = colony.army.soldiers().next().unwrap();
        assert!((soldier.power - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_ai_game_ready() {
        let game = ai_game(1, &[AiProfile::balanced(), AiProfile::breeder()]);
        assert_eq!(game.colonies().len(), 2);
        assert!(game.all_ready());
    }
}
