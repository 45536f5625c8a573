//! The round coordinator.
//!
//! A [`Game`] owns every colony, the chronicle, the torb ID allocator and
//! the seeded RNG. All commands and round resolution go through it, so two
//! games with the same seed and the same commands end in the same state.
//!
//! # Round flow
//!
//! 1. Colonies receive commands and call [`Game::end_turn`].
//! 2. When the last colony readies up, [`Game::next_round`] runs every
//!    colony's pipeline in (optionally shuffled) order.
//! 3. Readiness resets, the round counter advances, and AI colonies decide
//!    their next turn and ready themselves.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::{self, AiProfile, ColonyView};
use crate::colony::{Colony, ColonySummary, Controller};
use crate::combat::{self, AttackOutcome, ScoutOutcome};
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::genetics::EvolutionEngine;
use crate::ids::{parse_torb_tags, ColonyId, TorbId, TorbIdAllocator};
use crate::names;
use crate::narrative::{Chronicle, StoryKind};
use crate::player_facade::{ColonyCommand, GamePlayerFacade, PlayerFacade};
use crate::torb::{Action, Torb};

/// A scouting attempt made during a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutRecord {
    /// Colony that scouted.
    pub scout: ColonyId,
    /// Colony that was scouted.
    pub target: ColonyId,
    /// What happened.
    pub outcome: ScoutOutcome,
}

/// An attack carried out during a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackRecord {
    /// Colony that attacked.
    pub attacker: ColonyId,
    /// Colony that was attacked.
    pub defender: ColonyId,
    /// What happened.
    pub outcome: AttackOutcome,
}

/// Summary of one resolved round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    /// The round number after resolution.
    pub round: u32,
    /// Order in which colonies were processed.
    pub order: Vec<ColonyId>,
    /// Torbs born this round.
    pub births: usize,
    /// Torbs that died this round.
    pub deaths: usize,
    /// Scouting attempts.
    pub scouting: Vec<ScoutRecord>,
    /// Attacks.
    pub attacks: Vec<AttackRecord>,
    /// Per-colony state after the round.
    pub colonies: Vec<ColonySummary>,
}

/// One game instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    config: GameConfig,
    round: u32,
    colonies: Vec<Colony>,
    chronicle: Chronicle,
    torb_ids: TorbIdAllocator,
    rng: ChaCha8Rng,
}

impl Game {
    /// Create an empty game. Refuses an invalid config.
    pub fn new(config: GameConfig) -> Result<Self> {
        config.validate()?;
        EvolutionEngine::new(&config.evolution)?;
        info!(seed = config.seed, "Game created");
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            round: 0,
            colonies: Vec::new(),
            chronicle: Chronicle::new(),
            torb_ids: TorbIdAllocator::new(),
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The game's config.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Rounds resolved so far.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// All colonies in ID order.
    #[must_use]
    pub fn colonies(&self) -> &[Colony] {
        &self.colonies
    }

    /// A colony by ID.
    pub fn colony(&self, id: ColonyId) -> Result<&Colony> {
        self.colonies
            .get(id.index())
            .ok_or(GameError::UnknownColony(id))
    }

    fn colony_mut(&mut self, id: ColonyId) -> Result<&mut Colony> {
        self.colonies
            .get_mut(id.index())
            .ok_or(GameError::UnknownColony(id))
    }

    /// A colony by name.
    #[must_use]
    pub fn colony_by_name(&self, name: &str) -> Option<&Colony> {
        self.colonies.iter().find(|c| c.name == name)
    }

    /// A torb anywhere in the game.
    pub fn torb(&self, id: TorbId) -> Result<&Torb> {
        self.colonies
            .iter()
            .find_map(|c| c.torb(id))
            .ok_or(GameError::UnknownTorb(id))
    }

    /// The narrative log.
    #[must_use]
    pub fn chronicle(&self) -> &Chronicle {
        &self.chronicle
    }

    /// Colonies that have not ended their turn.
    #[must_use]
    pub fn unready(&self) -> Vec<ColonyId> {
        self.colonies
            .iter()
            .filter(|c| !c.ready)
            .map(|c| c.id)
            .collect()
    }

    /// Whether every colony has ended its turn.
    #[must_use]
    pub fn all_ready(&self) -> bool {
        !self.colonies.is_empty() && self.colonies.iter().all(|c| c.ready)
    }

    /// The AI's view of a colony.
    pub fn colony_view(&self, id: ColonyId) -> Result<ColonyView> {
        let colony = self.colony(id)?;
        Ok(ColonyView::of(colony, self.colonies.iter().map(|c| c.id)))
    }

    /// Per-colony summaries.
    #[must_use]
    pub fn summaries(&self) -> Vec<ColonySummary> {
        let precision = self.config.army.stat_precision;
        self.colonies.iter().map(|c| c.summary(precision)).collect()
    }

    /// Resolve a tag list such as `"00-01, 00-02"` inside one colony.
    pub fn resolve_tags(&self, colony: ColonyId, text: &str) -> Result<Vec<TorbId>> {
        let tags = parse_torb_tags(text)?;
        self.colony(colony)?.resolve_tags(&tags)
    }

    /// What this colony's scouts know about every discovered colony's army.
    pub fn scout_report(&self, id: ColonyId) -> Result<Vec<String>> {
        let colony = self.colony(id)?;
        let precision = self.config.army.stat_precision;
        let own = colony.army_summary(precision);
        if own.soldiers == 0 {
            let line = if own.training > 0 {
                "Our soldiers are still training."
            } else {
                "We cannot scout without an army."
            };
            return Ok(vec![line.to_string()]);
        }
        if colony.discovered().is_empty() {
            return Ok(vec!["Our scouts know of no other colonies.".to_string()]);
        }

        let mut lines = vec!["Your scouts have returned with the following info:".to_string()];
        for other in colony.discovered() {
            let other = self.colony(*other)?;
            let theirs = other.army_summary(precision);
            let line = theirs.describe_relative_to(&own).map_or_else(
                || format!("{}'s Army: Does not exist", other.name),
                |text| format!("{}'s Army: {text}", other.name),
            );
            lines.push(line);
        }
        Ok(lines)
    }

    // ------------------------------------------------------------------
    // Joining
    // ------------------------------------------------------------------

    /// Create a colony, seed its founders and welcome it.
    ///
    /// Colony names must be unique within the game.
    pub fn create_colony(&mut self, name: &str, controller: Controller) -> Result<ColonyId> {
        if self.colony_by_name(name).is_some() {
            return Err(GameError::InvalidOrder(format!(
                "a colony named '{name}' already exists"
            )));
        }
        let engine = EvolutionEngine::new(&self.config.evolution)?;
        let id = ColonyId(u32::try_from(self.colonies.len()).map_err(|_| {
            GameError::Configuration("too many colonies".to_string())
        })?);

        let mut colony = Colony::new(
            id,
            name,
            controller,
            &self.config.colony,
            &self.config.army,
        );
        colony.seed_founders(
            self.config.colony.starting_torbs,
            &engine,
            &mut self.torb_ids,
            &mut self.rng,
        );
        self.chronicle
            .record(id, StoryKind::System, "Welcome to Hereditus!");
        info!(colony = %id, name, ai = colony.controller.is_ai(), "Colony joined");
        self.colonies.push(colony);
        Ok(id)
    }

    /// A human player joins with a named colony.
    pub fn join_human(&mut self, player: &str, colony_name: &str) -> Result<ColonyId> {
        self.create_colony(
            colony_name,
            Controller::Human {
                player: player.to_string(),
            },
        )
    }

    /// An AI colony joins under a random themed name and plays its first
    /// turn at once.
    pub fn join_ai(&mut self, profile: AiProfile) -> Result<ColonyId> {
        profile.validate()?;
        let taken: Vec<String> = self.colonies.iter().map(|c| c.name.clone()).collect();
        let taken: Vec<&str> = taken.iter().map(String::as_str).collect();
        let name = names::unique_ai_colony_name(&taken, &mut self.rng);
        let id = self.create_colony(&name, Controller::Ai(profile))?;
        self.play_ai_turn(id);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Pair two torbs of a colony for breeding.
    pub fn breed(&mut self, colony: ColonyId, a: TorbId, b: TorbId) -> Result<()> {
        self.colony_mut(colony)?.pair_for_breeding(a, b)
    }

    /// Reassign torbs of a colony in bulk.
    pub fn assign_action(&mut self, colony: ColonyId, torbs: &[TorbId], action: Action) -> Result<()> {
        self.colony_mut(colony)?.assign_action(torbs, action)
    }

    /// Set or clear a colony's scout target.
    pub fn set_scout_target(&mut self, colony: ColonyId, target: Option<ColonyId>) -> Result<()> {
        if let Some(target) = target {
            self.colony(target)?;
        }
        self.colony_mut(colony)?.set_scout_target(target)
    }

    /// Set or clear a colony's attack target.
    pub fn set_attack_target(&mut self, colony: ColonyId, target: Option<ColonyId>) -> Result<()> {
        if let Some(target) = target {
            self.colony(target)?;
        }
        self.colony_mut(colony)?.set_attack_target(target)
    }

    /// Mark a colony ready. If it was the last one, the round resolves and
    /// its report is returned.
    pub fn end_turn(&mut self, colony: ColonyId) -> Result<Option<RoundReport>> {
        self.colony_mut(colony)?.ready_up();
        if self.all_ready() {
            return self.next_round().map(Some);
        }
        Ok(None)
    }

    /// Apply one command on behalf of a colony.
    pub fn apply_command(&mut self, colony: ColonyId, command: ColonyCommand) -> Result<Option<RoundReport>> {
        match command {
            ColonyCommand::Breed { a, b } => self.breed(colony, a, b).map(|()| None),
            ColonyCommand::Assign { torbs, action } => {
                self.assign_action(colony, &torbs, action).map(|()| None)
            }
            ColonyCommand::Scout { target } => self.set_scout_target(colony, target).map(|()| None),
            ColonyCommand::Attack { target } => {
                self.set_attack_target(colony, target).map(|()| None)
            }
            ColonyCommand::EndTurn => self.end_turn(colony),
        }
    }

    // ------------------------------------------------------------------
    // Round resolution
    // ------------------------------------------------------------------

    /// Resolve one round for every colony.
    ///
    /// Refused with [`GameError::NotReady`] if any colony has not ended its
    /// turn; nothing changes in that case.
    pub fn next_round(&mut self) -> Result<RoundReport> {
        let unready = self.unready();
        if !unready.is_empty() {
            return Err(GameError::NotReady { unready });
        }
        let report = self.resolve_round()?;
        self.play_ai_turns();
        Ok(report)
    }

    /// Let every unready AI colony play its turn, then resolve the round.
    ///
    /// This is how games without human players advance.
    pub fn advance_ai_round(&mut self) -> Result<RoundReport> {
        self.play_ai_turns();
        self.next_round()
    }

    fn resolve_round(&mut self) -> Result<RoundReport> {
        let engine = EvolutionEngine::new(&self.config.evolution)?;
        let round = self.round + 1;
        self.chronicle.set_round(round);

        let mut order: Vec<usize> = (0..self.colonies.len()).collect();
        if self.config.shuffle_colony_order {
            order.shuffle(&mut self.rng);
        }

        let torbs_before: usize = self.colonies.iter().map(Colony::torb_count).sum();
        let living_before: usize = self.colonies.iter().map(Colony::living_count).sum();
        let mut scouting = Vec::new();
        let mut attacks = Vec::new();

        for &idx in &order {
            self.colonies[idx].begin_round(
                &engine,
                &self.config.army,
                &mut self.torb_ids,
                &mut self.chronicle,
                &mut self.rng,
            );
            if let Some(record) = self.run_scouting(idx) {
                scouting.push(record);
            }
            if let Some(record) = self.run_attack(idx) {
                attacks.push(record);
            }
            self.colonies[idx].finish_round(round, &mut self.chronicle, &mut self.rng);
        }

        for colony in &mut self.colonies {
            colony.ready = false;
        }
        self.round = round;

        let torbs_after: usize = self.colonies.iter().map(Colony::torb_count).sum();
        let living_after: usize = self.colonies.iter().map(Colony::living_count).sum();
        let births = torbs_after - torbs_before;
        let deaths = (living_before + births).saturating_sub(living_after);
        info!(round, births, deaths, "Round resolved");

        Ok(RoundReport {
            round,
            order: order.iter().map(|&i| self.colonies[i].id).collect(),
            births,
            deaths,
            scouting,
            attacks,
            colonies: self.summaries(),
        })
    }

    fn run_scouting(&mut self, idx: usize) -> Option<ScoutRecord> {
        let target = self.colonies[idx].army.scout_target?;
        let Some((scout, other)) = pair_mut(&mut self.colonies, idx, target.index()) else {
            warn!(colony = idx, %target, "Scout target is not a valid colony, skipping");
            return None;
        };
        let outcome = combat::scout_colony(scout, other, &mut self.chronicle, &mut self.rng)?;
        debug!(scout = %scout.id, %target, ?outcome, "Scouting resolved");
        Some(ScoutRecord {
            scout: scout.id,
            target,
            outcome,
        })
    }

    fn run_attack(&mut self, idx: usize) -> Option<AttackRecord> {
        let target = self.colonies[idx].army.attack_target?;
        let Some((attacker, defender)) = pair_mut(&mut self.colonies, idx, target.index()) else {
            warn!(colony = idx, %target, "Attack target is not a valid colony, skipping");
            return None;
        };
        let outcome = combat::attack_colony(
            attacker,
            defender,
            &self.config.army,
            &mut self.chronicle,
            &mut self.rng,
        )?;
        Some(AttackRecord {
            attacker: attacker.id,
            defender: target,
            outcome,
        })
    }

    fn play_ai_turns(&mut self) {
        let ai: Vec<ColonyId> = self
            .colonies
            .iter()
            .filter(|c| c.controller.is_ai() && !c.ready)
            .map(|c| c.id)
            .collect();
        for id in ai {
            self.play_ai_turn(id);
        }
    }

    /// Decide and apply one AI turn through the colony's facade. Refused
    /// commands are logged and skipped; the colony always ends up ready.
    fn play_ai_turn(&mut self, id: ColonyId) {
        let Ok(colony) = self.colony(id) else {
            return;
        };
        let Some(profile) = colony.controller.ai_profile().cloned() else {
            return;
        };
        let Ok(view) = self.colony_view(id) else {
            return;
        };
        let commands = ai::decide(&view, &profile, &mut self.rng);

        if let Ok(mut facade) = GamePlayerFacade::new(self, id) {
            // EndTurn would resolve the round from inside another colony's turn.
            for command in commands.into_iter().filter(|c| *c != ColonyCommand::EndTurn) {
                if let Err(err) = facade.issue(command) {
                    warn!(colony = %id, error = %err, "AI command refused");
                }
            }
        }
        if let Ok(colony) = self.colony_mut(id) {
            colony.ready_up();
        }
    }

    // ------------------------------------------------------------------
    // Determinism and snapshots
    // ------------------------------------------------------------------

    /// Hash of the complete game state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.round.hash(&mut hasher);
        self.colonies.len().hash(&mut hasher);
        for colony in &self.colonies {
            colony.hash(&mut hasher);
        }
        self.chronicle.len().hash(&mut hasher);
        self.torb_ids.hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the whole game, RNG included.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Snapshot(format!("Failed to serialize game: {e}")))
    }

    /// Restore a game from [`Game::to_bytes`] output.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::Snapshot(format!("Failed to deserialize game: {e}")))
    }

    /// Write a snapshot to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| {
            GameError::Snapshot(format!("Failed to write '{}': {e}", path.display()))
        })?;
        info!(path = %path.display(), round = self.round, "Game saved");
        Ok(())
    }

    /// Read a snapshot from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            GameError::Snapshot(format!("Failed to read '{}': {e}", path.display()))
        })?;
        Self::from_bytes(&bytes)
    }
}

/// Mutable references to two distinct colonies.
fn pair_mut(colonies: &mut [Colony], a: usize, b: usize) -> Option<(&mut Colony, &mut Colony)> {
    if a == b || a >= colonies.len() || b >= colonies.len() {
        return None;
    }
    if a < b {
        let (left, right) = colonies.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else {
        let (left, right) = colonies.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TargetIssue;

    fn two_player_game(seed: u64) -> (Game, ColonyId, ColonyId) {
        let mut game = Game::new(GameConfig::with_seed(seed)).unwrap();
        let a = game.join_human("alice", "Alicetown").unwrap();
        let b = game.join_human("bob", "Bobville").unwrap();
        (game, a, b)
    }

    #[test]
    fn test_invalid_config_refused() {
        let mut config = GameConfig::default();
        config.evolution.alleles_per_gene = 0;
        assert!(matches!(
            Game::new(config),
            Err(GameError::Configuration(_))
        ));
    }

    #[test]
    fn test_join_seeds_and_welcomes() {
        let (game, a, _) = two_player_game(1);
        let colony = game.colony(a).unwrap();
        assert_eq!(colony.living_count(), 4);
        assert_eq!(colony.food, 5);
        assert_eq!(colony.army.morale, 50);
        assert_eq!(
            game.chronicle().for_colony(a).next().unwrap().text,
            "Welcome to Hereditus!"
        );
    }

    #[test]
    fn test_duplicate_colony_name_refused() {
        let (mut game, _, _) = two_player_game(1);
        assert!(game.join_human("carol", "Alicetown").is_err());
    }

    #[test]
    fn test_next_round_refused_until_all_ready() {
        let (mut game, a, b) = two_player_game(2);
        let before = game.state_hash();
        game.end_turn(a).unwrap();
        match game.next_round() {
            Err(GameError::NotReady { unready }) => assert_eq!(unready, vec![b]),
            other => panic!("expected NotReady, got {other:?}"),
        }
        assert_eq!(game.round(), 0);
        // Only the ready flag changed.
        assert!(game.colony(a).unwrap().ready);
        assert_ne!(before, game.state_hash());
    }

    #[test]
    fn test_end_turn_idempotent() {
        let (mut game, a, _) = two_player_game(3);
        assert!(game.end_turn(a).unwrap().is_none());
        let hash = game.state_hash();
        assert!(game.end_turn(a).unwrap().is_none());
        assert_eq!(hash, game.state_hash());
    }

    #[test]
    fn test_last_ready_resolves_round() {
        let (mut game, a, b) = two_player_game(4);
        game.end_turn(a).unwrap();
        let report = game.end_turn(b).unwrap().unwrap();
        assert_eq!(report.round, 1);
        assert_eq!(report.order.len(), 2);
        assert!(game.colonies().iter().all(|c| !c.ready));
        let year: Vec<_> = game
            .chronicle()
            .for_round(a, 1)
            .map(|e| e.text.as_str())
            .collect();
        assert!(year.contains(&"It is now year 1."));
        assert!(year.contains(&"Your Torbs gathered 7 food."));
    }

    #[test]
    fn test_targets_validated() {
        let (mut game, a, b) = two_player_game(5);
        assert!(matches!(
            game.set_attack_target(a, Some(b)),
            Err(GameError::InvalidTarget {
                reason: TargetIssue::Undiscovered,
                ..
            })
        ));
        assert!(matches!(
            game.set_scout_target(a, Some(ColonyId(9))),
            Err(GameError::UnknownColony(_))
        ));
        assert!(game.set_scout_target(a, Some(b)).is_ok());
    }

    #[test]
    fn test_scout_then_attack_flow() {
        let (mut game, a, b) = two_player_game(6);
        let soldiers: Vec<TorbId> = game.colony(a).unwrap().torbs().take(2).map(|t| t.id).collect();
        game.assign_action(a, &soldiers, Action::Training).unwrap();
        game.set_scout_target(a, Some(b)).unwrap();
        game.end_turn(a).unwrap();
        let report = game.end_turn(b).unwrap().unwrap();

        // Bob has no soldiers, so the scout always succeeds.
        assert_eq!(report.scouting.len(), 1);
        assert_eq!(report.scouting[0].outcome, ScoutOutcome::Undefended);
        assert!(game.colony(a).unwrap().has_discovered(b));
        // Targets are cleared at the end of the round.
        assert_eq!(game.colony(a).unwrap().army.scout_target, None);

        game.set_attack_target(a, Some(b)).unwrap();
        game.end_turn(b).unwrap();
        let report = game.end_turn(a).unwrap().unwrap();
        assert!(matches!(
            report.attacks[0].outcome,
            AttackOutcome::Undefended { .. }
        ));
    }

    #[test]
    fn test_scout_report_requires_army() {
        let (game, a, _) = two_player_game(7);
        assert_eq!(
            game.scout_report(a).unwrap(),
            vec!["We cannot scout without an army.".to_string()]
        );
    }

    #[test]
    fn test_ai_colonies_ready_themselves() {
        let mut game = Game::new(GameConfig::with_seed(8)).unwrap();
        let human = game.join_human("alice", "Alicetown").unwrap();
        let ai = game.join_ai(AiProfile::balanced()).unwrap();
        assert!(game.colony(ai).unwrap().ready);
        assert_eq!(game.unready(), vec![human]);

        let report = game.end_turn(human).unwrap().unwrap();
        assert_eq!(report.round, 1);
        assert!(game.colony(ai).unwrap().ready);
        assert!(!game.colony(human).unwrap().ready);
    }

    #[test]
    fn test_ai_turn_applies_orders_without_resolving() {
        let recruiter = AiProfile {
            name: "recruiter".to_string(),
            breed_fraction: 0.0,
            army_fraction: 1.0,
            aggression: 0.0,
            scout_chance: 0.0,
        };
        let mut recruited = 0;
        for seed in 0..20 {
            let mut game = Game::new(GameConfig::with_seed(seed)).unwrap();
            let first = game.join_ai(recruiter.clone()).unwrap();
            let second = game.join_ai(recruiter.clone()).unwrap();
            assert_eq!(game.round(), 0);
            assert!(game.unready().is_empty());
            for id in [first, second] {
                recruited += game.colony(id).unwrap().count_action(Action::Training);
            }
        }
        assert!(recruited > 0);
    }

    #[test]
    fn test_ai_only_game_advances() {
        let mut game = Game::new(GameConfig::with_seed(9)).unwrap();
        for _ in 0..3 {
            game.join_ai(AiProfile::aggressive()).unwrap();
        }
        let names: Vec<&str> = game.colonies().iter().map(|c| c.name.as_str()).collect();
        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 3);

        for expected in 1..=10 {
            let report = game.advance_ai_round().unwrap();
            assert_eq!(report.round, expected);
        }
        assert!(game
            .colonies()
            .iter()
            .all(|c| c.army.morale <= crate::army::MAX_MORALE));
    }

    #[test]
    fn test_resolve_tags() {
        let (game, a, _) = two_player_game(10);
        let ids = game.resolve_tags(a, "00-01, 00-03").unwrap();
        assert_eq!(ids.len(), 2);
        assert!(matches!(
            game.resolve_tags(a, "00-09"),
            Err(GameError::InvalidTorbTag(_))
        ));
    }

    #[test]
    fn test_snapshot_roundtrip_continues_identically() {
        let mut game = Game::new(GameConfig::with_seed(11)).unwrap();
        game.join_ai(AiProfile::balanced()).unwrap();
        game.join_ai(AiProfile::breeder()).unwrap();
        game.advance_ai_round().unwrap();

        let mut restored = Game::from_bytes(&game.to_bytes().unwrap()).unwrap();
        assert_eq!(game.state_hash(), restored.state_hash());
        for _ in 0..5 {
            game.advance_ai_round().unwrap();
            restored.advance_ai_round().unwrap();
        }
        assert_eq!(game.state_hash(), restored.state_hash());
    }

    #[test]
    fn test_save_and_load_file() {
        let mut game = Game::new(GameConfig::with_seed(12)).unwrap();
        game.join_ai(AiProfile::balanced()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.bin");
        game.save(&path).unwrap();
        let loaded = Game::load(&path).unwrap();
        assert_eq!(game.state_hash(), loaded.state_hash());
        assert!(matches!(
            Game::load(dir.path().join("missing.bin")),
            Err(GameError::Snapshot(_))
        ));
    }

    #[test]
    fn test_pair_mut() {
        let config = GameConfig::default();
        let make = |i: u32| {
            Colony::new(
                ColonyId(i),
                format!("C{i}"),
                Controller::Human {
                    player: String::new(),
                },
                &config.colony,
                &config.army,
            )
        };
        let mut colonies = vec![make(0), make(1), make(2)];
        let (x, y) = pair_mut(&mut colonies, 2, 0).unwrap();
        assert_eq!((x.id, y.id), (ColonyId(2), ColonyId(0)));
        assert!(pair_mut(&mut colonies, 1, 1).is_none());
        assert!(pair_mut(&mut colonies, 1, 3).is_none());
    }
}
