//! # Hereditus Core
//!
//! Round-resolution engine for Hereditus, a colony-management game where
//! players breed, train, feed, scout, and fight populations of Torbs.
//!
//! This crate contains **only** the simulation:
//! - No rendering
//! - No network or web IO
//! - No ambient randomness (every draw goes through the game's seeded RNG)
//! - No global registries (the [`game::Game`] owns every colony and torb)
//!
//! This separation enables:
//! - Headless AI-vs-AI batch runs
//! - Replays and snapshot save/load
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`genetics`] - Genes, alleles, breeding and mutation
//! - [`torb`] - The creature entity and its action state machine
//! - [`colony`] - Per-colony round pipeline and food economy
//! - [`army`] - Army roster, active-allele snapshots, morale
//! - [`combat`] - Scouting, duels, and battles between colonies
//! - [`game`] - Round coordinator owning all colonies
//! - [`ai`] - Decision logic for AI-controlled colonies
//! - [`player_facade`] - Command surface shared by humans and AI
//! - [`replay`] - Command journal for re-running and verifying games

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod army;
pub mod colony;
pub mod combat;
pub mod config;
pub mod error;
pub mod game;
pub mod genetics;
pub mod ids;
pub mod math;
pub mod names;
pub mod narrative;
pub mod player_facade;
pub mod replay;
pub mod torb;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiProfile, ColonyView};
    pub use crate::army::{ActiveAlleles, Army, ArmySummary, ArmyTorb};
    pub use crate::colony::{Colony, Controller};
    pub use crate::combat::{AttackOutcome, BattleResult, ScoutOutcome};
    pub use crate::config::{ArmyConfig, ColonyConfig, EvolutionConfig, GameConfig, MoraleCheck};
    pub use crate::error::{GameError, ParticipantIssue, Result, TargetIssue};
    pub use crate::game::{Game, RoundReport};
    pub use crate::genetics::{BreedingError, EvolutionEngine, Gene, Genome};
    pub use crate::ids::{ColonyId, TorbId, TorbTag};
    pub use crate::narrative::{Chronicle, StoryEntry, StoryKind};
    pub use crate::player_facade::{ColonyCommand, GamePlayerFacade, PlayerFacade};
    pub use crate::replay::{Replay, ReplayEntry, ReplayPlayer};
    pub use crate::torb::{Action, Torb};
}
