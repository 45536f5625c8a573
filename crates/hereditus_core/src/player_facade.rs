//! Unified command surface for human players and AI colonies.
//!
//! AI turns and the headless runner both act on a colony through
//! [`GamePlayerFacade`]. The AI decides from a [`ColonyView`] holding only
//! its own colony and the colonies it has discovered, and every state
//! change is a [`ColonyCommand`] that can be journaled and re-applied.
//! The one exception is the AI's `EndTurn`: the game readies AI colonies
//! itself so an AI turn never resolves a round.

use serde::{Deserialize, Serialize};

use crate::ai::ColonyView;
use crate::error::Result;
use crate::game::{Game, RoundReport};
use crate::ids::{ColonyId, TorbId};
use crate::narrative::StoryEntry;
use crate::torb::Action;

/// One order for a colony.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColonyCommand {
    /// Pair two torbs for breeding at the next round.
    Breed {
        /// First parent.
        a: TorbId,
        /// Second parent.
        b: TorbId,
    },
    /// Reassign torbs to gathering, training or resting.
    Assign {
        /// Torbs to reassign.
        torbs: Vec<TorbId>,
        /// New action.
        action: Action,
    },
    /// Set or clear the scout target.
    Scout {
        /// Colony to scout, or `None` to clear.
        target: Option<ColonyId>,
    },
    /// Set or clear the attack target.
    Attack {
        /// Colony to attack, or `None` to clear.
        target: Option<ColonyId>,
    },
    /// Mark the colony ready.
    EndTurn,
}

/// What a player (human or AI) can do with one colony.
///
/// All orders flow through [`PlayerFacade::issue`]; there is no side door
/// that bypasses validation.
pub trait PlayerFacade {
    /// Apply one command.
    ///
    /// Returns the round report if this command completed a round.
    ///
    /// # Errors
    /// Returns an error if the command is refused; state is unchanged.
    fn issue(&mut self, command: ColonyCommand) -> Result<Option<RoundReport>>;

    /// Apply commands in order, stopping at the first refusal.
    ///
    /// Returns the last round report produced, if any.
    fn issue_all(&mut self, commands: Vec<ColonyCommand>) -> Result<Option<RoundReport>> {
        let mut report = None;
        for command in commands {
            if let Some(r) = self.issue(command)? {
                report = Some(r);
            }
        }
        Ok(report)
    }

    /// What this colony can see.
    fn view(&self) -> Result<ColonyView>;

    /// Narrative entries addressed to this colony.
    fn chronicle(&self) -> Vec<StoryEntry>;

    /// The colony this facade acts for.
    fn colony(&self) -> ColonyId;
}

/// [`PlayerFacade`] over a [`Game`] for one colony.
pub struct GamePlayerFacade<'a> {
    game: &'a mut Game,
    colony: ColonyId,
}

impl<'a> GamePlayerFacade<'a> {
    /// Act for `colony` in `game`.
    pub fn new(game: &'a mut Game, colony: ColonyId) -> Result<Self> {
        game.colony(colony)?;
        Ok(Self { game, colony })
    }

    /// The underlying game.
    #[must_use]
    pub fn game(&self) -> &Game {
        self.game
    }
}

impl PlayerFacade for GamePlayerFacade<'_> {
    fn issue(&mut self, command: ColonyCommand) -> Result<Option<RoundReport>> {
        self.game.apply_command(self.colony, command)
    }

    fn view(&self) -> Result<ColonyView> {
        self.game.colony_view(self.colony)
    }

    fn chronicle(&self) -> Vec<StoryEntry> {
        self.game
            .chronicle()
            .for_colony(self.colony)
            .cloned()
            .collect()
    }

    fn colony(&self) -> ColonyId {
        self.colony
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::error::GameError;

    #[test]
    fn test_facade_rejects_unknown_colony() {
        let mut game = Game::new(GameConfig::with_seed(1)).unwrap();
        assert!(matches!(
            GamePlayerFacade::new(&mut game, ColonyId(4)),
            Err(GameError::UnknownColony(_))
        ));
    }

    #[test]
    fn test_facade_issues_commands() {
        let mut game = Game::new(GameConfig::with_seed(1)).unwrap();
        let home = game.join_human("alice", "Alicetown").unwrap();
        let _rival = game.join_human("bob", "Bobville").unwrap();

        let mut facade = GamePlayerFacade::new(&mut game, home).unwrap();
        let view = facade.view().unwrap();
        assert_eq!(view.living, 4);
        let ids = view.available.clone();
        facade
            .issue(ColonyCommand::Breed { a: ids[0], b: ids[1] })
            .unwrap();
        facade
            .issue(ColonyCommand::Assign {
                torbs: vec![ids[2]],
                action: Action::Training,
            })
            .unwrap();
        assert_eq!(facade.issue(ColonyCommand::EndTurn).unwrap(), None);
        assert!(facade.chronicle()[0].text.contains("Welcome"));
        assert!(facade.game().colony(home).unwrap().ready);
    }

    #[test]
    fn test_last_end_turn_returns_report() {
        let mut game = Game::new(GameConfig::with_seed(2)).unwrap();
        let home = game.join_human("alice", "Alicetown").unwrap();
        let rival = game.join_human("bob", "Bobville").unwrap();

        GamePlayerFacade::new(&mut game, rival)
            .unwrap()
            .issue(ColonyCommand::EndTurn)
            .unwrap();
        let report = GamePlayerFacade::new(&mut game, home)
            .unwrap()
            .issue(ColonyCommand::EndTurn)
            .unwrap()
            .expect("round should advance");
        assert_eq!(report.round, 1);
        assert_eq!(game.round(), 1);
    }
}
