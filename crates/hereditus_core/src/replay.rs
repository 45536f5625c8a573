//! Replay journal for recording and re-running games.
//!
//! A replay stores the game config (seed included) and every state-changing
//! action in the order it happened. Re-applying the journal to a fresh
//! [`Game`] built from the same config reproduces the game exactly, which
//! the stored final hash lets us verify.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ai::AiProfile;
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::game::Game;
use crate::ids::ColonyId;
use crate::player_facade::ColonyCommand;

/// Bumped whenever [`ReplayEntry`] or [`Replay`] change shape.
pub const REPLAY_VERSION: u32 = 1;

/// One journaled action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplayEntry {
    /// A human player joined.
    JoinHuman {
        /// Player name.
        player: String,
        /// Colony name.
        colony: String,
    },
    /// An AI colony joined.
    JoinAi(AiProfile),
    /// A colony command that was accepted.
    Command {
        /// Issuing colony.
        colony: ColonyId,
        /// The command.
        command: ColonyCommand,
    },
    /// AI colonies played and the round resolved.
    AdvanceAi,
}

impl ReplayEntry {
    /// Apply this entry to `game`.
    pub fn apply(&self, game: &mut Game) -> Result<()> {
        match self {
            Self::JoinHuman { player, colony } => game.join_human(player, colony).map(|_| ()),
            Self::JoinAi(profile) => game.join_ai(profile.clone()).map(|_| ()),
            Self::Command { colony, command } => {
                game.apply_command(*colony, command.clone()).map(|_| ())
            }
            Self::AdvanceAi => game.advance_ai_round().map(|_| ()),
        }
    }
}

/// Everything needed to rebuild a session: config, joins and orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    /// [`REPLAY_VERSION`] at recording time.
    pub version: u32,
    /// Config the game was created with.
    pub config: GameConfig,
    /// Journaled actions in order.
    pub entries: Vec<ReplayEntry>,
    /// Round reached when the replay was finalized.
    pub final_round: u32,
    /// Hash of the game when recording stopped.
    pub final_hash: u64,
}

impl Replay {
    /// Start an empty journal for a game created with `config`.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self {
            version: REPLAY_VERSION,
            config,
            entries: Vec::new(),
            final_round: 0,
            final_hash: 0,
        }
    }

    /// The seed of the recorded game.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.config.seed
    }

    /// Append an entry.
    pub fn record(&mut self, entry: ReplayEntry) {
        self.entries.push(entry);
    }

    /// Apply `entry` to `game` and journal it if it was accepted.
    pub fn apply_and_record(&mut self, game: &mut Game, entry: ReplayEntry) -> Result<()> {
        entry.apply(game)?;
        self.entries.push(entry);
        Ok(())
    }

    /// Store the end state of the recorded game.
    pub fn finalize(&mut self, game: &Game) {
        self.final_round = game.round();
        self.final_hash = game.state_hash();
    }

    /// Number of journaled actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was journaled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Commands issued by one colony.
    pub fn commands_for(&self, colony: ColonyId) -> impl Iterator<Item = &ColonyCommand> {
        self.entries.iter().filter_map(move |entry| match entry {
            ReplayEntry::Command { colony: c, command } if *c == colony => Some(command),
            _ => None,
        })
    }

    /// Re-run the whole journal on a fresh game.
    pub fn rebuild(&self) -> Result<Game> {
        let mut player = ReplayPlayer::new(self.clone())?;
        while player.advance()? {}
        Ok(player.game)
    }

    /// Write as bincode.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::Snapshot(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::Snapshot(format!("Failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Read a bincode replay, refusing other format versions.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::Snapshot(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::Snapshot(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::Snapshot(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }

        Ok(replay)
    }
}

/// Steps through a replay against a freshly built game.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    game: Game,
    cursor: usize,
}

impl ReplayPlayer {
    /// Start playback from a fresh game.
    pub fn new(replay: Replay) -> Result<Self> {
        let game = Game::new(replay.config.clone())?;
        Ok(Self {
            replay,
            game,
            cursor: 0,
        })
    }

    /// Apply the next entry.
    ///
    /// Returns true if there are more entries to play.
    pub fn advance(&mut self) -> Result<bool> {
        if let Some(entry) = self.replay.entries.get(self.cursor) {
            entry.apply(&mut self.game)?;
            self.cursor += 1;
        }
        Ok(!self.is_finished())
    }

    /// Seek to just after entry `target`, replaying from the start if
    /// seeking backwards.
    pub fn seek(&mut self, target: usize) -> Result<()> {
        if target < self.cursor {
            self.game = Game::new(self.replay.config.clone())?;
            self.cursor = 0;
        }
        let target = target.min(self.replay.entries.len());
        while self.cursor < target {
            self.advance()?;
        }
        Ok(())
    }

    /// Entries applied so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// The game as of the current position.
    #[must_use]
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// The recording being stepped through.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Whether every entry has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.replay.entries.len()
    }

    /// Play to the end and compare against the stored final hash.
    pub fn verify(&mut self) -> Result<bool> {
        self.seek(self.replay.entries.len())?;
        Ok(self.game.state_hash() == self.replay.final_hash
            && self.game.round() == self.replay.final_round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torb::Action;

    /// A short two-colony game journaled as it is played.
    fn recorded_game(seed: u64) -> (Game, Replay) {
        let config = GameConfig::with_seed(seed);
        let mut game = Game::new(config.clone()).unwrap();
        let mut replay = Replay::new(config);

        replay
            .apply_and_record(
                &mut game,
                ReplayEntry::JoinHuman {
                    player: "alice".to_string(),
                    colony: "Alicetown".to_string(),
                },
            )
            .unwrap();
        replay
            .apply_and_record(&mut game, ReplayEntry::JoinAi(AiProfile::aggressive()))
            .unwrap();

        for _ in 0..4 {
            let home = ColonyId(0);
            let recruit = game
                .colony_view(home)
                .unwrap()
                .available
                .first()
                .copied();
            if let Some(torb) = recruit {
                replay
                    .apply_and_record(
                        &mut game,
                        ReplayEntry::Command {
                            colony: home,
                            command: ColonyCommand::Assign {
                                torbs: vec![torb],
                                action: Action::Training,
                            },
                        },
                    )
                    .unwrap();
            }
            replay
                .apply_and_record(
                    &mut game,
                    ReplayEntry::Command {
                        colony: home,
                        command: ColonyCommand::EndTurn,
                    },
                )
                .unwrap();
        }
        replay.finalize(&game);
        (game, replay)
    }

    #[test]
    fn test_refused_entries_not_journaled() {
        let config = GameConfig::with_seed(1);
        let mut game = Game::new(config.clone()).unwrap();
        let mut replay = Replay::new(config);
        let result = replay.apply_and_record(
            &mut game,
            ReplayEntry::Command {
                colony: ColonyId(3),
                command: ColonyCommand::EndTurn,
            },
        );
        assert!(result.is_err());
        assert!(replay.is_empty());
    }

    #[test]
    fn test_rebuild_matches_recorded_game() {
        let (game, replay) = recorded_game(42);
        assert_eq!(game.round(), 4);
        let rebuilt = replay.rebuild().unwrap();
        assert_eq!(rebuilt.state_hash(), game.state_hash());
        assert_eq!(rebuilt.chronicle(), game.chronicle());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let (_, replay) = recorded_game(7);
        assert!(ReplayPlayer::new(replay.clone()).unwrap().verify().unwrap());

        let mut tampered = replay;
        tampered.config.seed += 1;
        // A different seed either diverges or makes a journaled command
        // invalid; it never verifies.
        let verified = ReplayPlayer::new(tampered).unwrap().verify();
        assert!(!matches!(verified, Ok(true)));
    }

    #[test]
    fn test_seek_backwards_replays_from_start() {
        let (_, replay) = recorded_game(3);
        let mut player = ReplayPlayer::new(replay).unwrap();
        player.seek(4).unwrap();
        let hash_at_four = player.game().state_hash();
        player.seek(100).unwrap();
        assert!(player.is_finished());
        player.seek(4).unwrap();
        assert_eq!(player.position(), 4);
        assert_eq!(player.game().state_hash(), hash_at_four);
    }

    #[test]
    fn test_commands_for_filters_colony() {
        let (_, replay) = recorded_game(5);
        let ends = replay
            .commands_for(ColonyId(0))
            .filter(|c| **c == ColonyCommand::EndTurn)
            .count();
        assert_eq!(ends, 4);
        assert_eq!(replay.commands_for(ColonyId(1)).count(), 0);
    }

    #[test]
    fn test_replay_save_load() {
        let (_, replay) = recorded_game(9);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.replay");
        replay.save(&path).unwrap();

        let loaded = Replay::load(&path).unwrap();
        assert_eq!(loaded.seed(), 9);
        assert_eq!(loaded.entries, replay.entries);
        assert_eq!(loaded.final_hash, replay.final_hash);
    }
}
