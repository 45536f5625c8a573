//! Named game setups: config, seated AIs, human seats and a round limit.
//!
//! Scenarios define the starting line-up of a headless game: the game
//! config, the human seats, the AI colonies and their profiles, and how many
//! rounds a batch game lasts.
//!
//! # Example RON
//!
//! ```ron
//! Scenario(
//!     name: "duel",
//!     description: "Two AI colonies",
//!     config: (seed: 3),
//!     humans: [],
//!     ai: [Preset("aggressive"), Custom((
//!         name: "turtle",
//!         breed_fraction: 0.5,
//!         army_fraction: 0.5,
//!         aggression: 0.1,
//!         scout_chance: 0.2,
//!     ))],
//!     rounds: 40,
//! )
//! ```

use std::path::Path;

use hereditus_core::prelude::{AiProfile, Game, GameConfig, GameError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Why a scenario could not be loaded or built.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// No file at the given path.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// The file exists but could not be read.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Not a valid scenario RON document.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// No built-in scenario or AI preset with this name.
    #[error("Unknown scenario or preset: {0}")]
    Unknown(String),
    /// The game refused the scenario's config or seats.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// A human seat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanSetup {
    /// Player name.
    pub player: String,
    /// Colony name.
    pub colony: String,
}

/// An AI seat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AiSetup {
    /// A built-in profile by name.
    Preset(String),
    /// A profile given inline.
    Custom(AiProfile),
}

impl AiSetup {
    /// Resolve to a concrete profile.
    pub fn profile(&self) -> Result<AiProfile, ScenarioError> {
        match self {
            Self::Preset(name) => {
                AiProfile::preset(name).ok_or_else(|| ScenarioError::Unknown(name.clone()))
            }
            Self::Custom(profile) => {
                profile.validate()?;
                Ok(profile.clone())
            }
        }
    }
}

/// A game setup that can be played repeatedly with different seeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Built-in name or file stem.
    pub name: String,
    /// One-line blurb for listings.
    pub description: String,
    /// Game config; its seed is replaced in batch runs.
    pub config: GameConfig,
    /// Human seats, joined first in order.
    pub humans: Vec<HumanSetup>,
    /// AI seats, joined after the humans.
    pub ai: Vec<AiSetup>,
    /// Rounds a batch game runs for.
    pub rounds: u32,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish_1v1()
    }
}

impl Scenario {
    /// Read a RON scenario file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse a RON scenario document.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = ron::from_str(ron)?;
        scenario.config.validate()?;
        for seat in &scenario.ai {
            seat.profile()?;
        }
        Ok(scenario)
    }

    /// A built-in scenario by name, or a RON file if `name` is a path.
    pub fn resolve(name: &str) -> Result<Self, ScenarioError> {
        match name {
            "skirmish_1v1" => Ok(Self::skirmish_1v1()),
            "free_for_all" => Ok(Self::free_for_all()),
            "breeders" => Ok(Self::breeders()),
            _ if name.ends_with(".ron") => Self::load(name),
            _ => Err(ScenarioError::Unknown(name.to_string())),
        }
    }

    /// Names of the built-in scenarios.
    #[must_use]
    pub const fn builtin_names() -> &'static [&'static str] {
        &["skirmish_1v1", "free_for_all", "breeders"]
    }

    /// Balanced AI against aggressive AI.
    #[must_use]
    pub fn skirmish_1v1() -> Self {
        Self {
            name: "skirmish_1v1".to_string(),
            description: "Balanced against aggressive, for profile matchup testing".to_string(),
            config: GameConfig::default(),
            humans: Vec::new(),
            ai: vec![
                AiSetup::Preset("balanced".to_string()),
                AiSetup::Preset("aggressive".to_string()),
            ],
            rounds: 50,
        }
    }

    /// One colony of every preset plus a second balanced one.
    #[must_use]
    pub fn free_for_all() -> Self {
        Self {
            name: "free_for_all".to_string(),
            description: "Four AI colonies competing for food".to_string(),
            config: GameConfig::default(),
            humans: Vec::new(),
            ai: ["balanced", "aggressive", "breeder", "balanced"]
                .into_iter()
                .map(|p| AiSetup::Preset(p.to_string()))
                .collect(),
            rounds: 60,
        }
    }

    /// Two breeders, for population-growth testing.
    #[must_use]
    pub fn breeders() -> Self {
        Self {
            name: "breeders".to_string(),
            description: "Two breeder colonies, mostly peaceful".to_string(),
            config: GameConfig::default(),
            humans: Vec::new(),
            ai: vec![
                AiSetup::Preset("breeder".to_string()),
                AiSetup::Preset("breeder".to_string()),
            ],
            rounds: 40,
        }
    }

    /// Build a game with the scenario's own seed.
    pub fn build(&self) -> Result<Game, ScenarioError> {
        self.build_with_seed(self.config.seed)
    }

    /// Build a game with every seat joined, using `seed`.
    pub fn build_with_seed(&self, seed: u64) -> Result<Game, ScenarioError> {
        let config = GameConfig {
            seed,
            ..self.config.clone()
        };
        let mut game = Game::new(config)?;
        for seat in &self.humans {
            game.join_human(&seat.player, &seat.colony)?;
        }
        for seat in &self.ai {
            game.join_ai(seat.profile()?)?;
        }
        info!(
            scenario = %self.name,
            seed,
            colonies = game.colonies().len(),
            "Scenario built"
        );
        Ok(game)
    }

    /// Profile name of every colony, humans reported as `human`.
    #[must_use]
    pub fn seat_labels(&self) -> Vec<String> {
        self.humans
            .iter()
            .map(|_| "human".to_string())
            .chain(self.ai.iter().map(|seat| match seat {
                AiSetup::Preset(name) => name.clone(),
                AiSetup::Custom(profile) => profile.name.clone(),
            }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_build() {
        for name in Scenario::builtin_names() {
            let scenario = Scenario::resolve(name).unwrap();
            let game = scenario.build().unwrap();
            assert_eq!(game.colonies().len(), scenario.ai.len());
            assert!(game.all_ready());
        }
    }

    #[test]
    fn test_unknown_scenario() {
        assert!(matches!(
            Scenario::resolve("capture_the_flag"),
            Err(ScenarioError::Unknown(_))
        ));
    }

    #[test]
    fn test_parse_ron_with_defaults() {
        let scenario = Scenario::from_ron_str(
            r#"(
                name: "duel",
                config: (seed: 3),
                humans: [(player: "alice", colony: "Alicetown")],
                ai: [Preset("aggressive"), Custom((
                    name: "turtle",
                    breed_fraction: 0.5,
                    army_fraction: 0.5,
                    aggression: 0.1,
                    scout_chance: 0.2,
                ))],
            )"#,
        )
        .unwrap();
        assert_eq!(scenario.config.seed, 3);
        assert_eq!(scenario.rounds, 50);
        assert_eq!(scenario.seat_labels(), vec!["human", "aggressive", "turtle"]);

        let game = scenario.build().unwrap();
        assert_eq!(game.colonies()[0].name, "Alicetown");
        assert_eq!(game.unready().len(), 1);
    }

    #[test]
    fn test_bad_preset_rejected() {
        let result = Scenario::from_ron_str(r#"(name: "x", ai: [Preset("pacifist")])"#);
        assert!(matches!(result, Err(ScenarioError::Unknown(_))));
    }

    #[test]
    fn test_seed_override() {
        let scenario = Scenario::skirmish_1v1();
        let a = scenario.build_with_seed(1).unwrap();
        let b = scenario.build_with_seed(1).unwrap();
        let c = scenario.build_with_seed(2).unwrap();
        assert_eq!(a.state_hash(), b.state_hash());
        assert_ne!(a.state_hash(), c.state_hash());
    }
}
