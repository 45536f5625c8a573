//! Game configuration.
//!
//! All tunables for one game instance. The structs deserialize from RON with
//! defaults for every field, so a config file only needs the values it
//! changes.
//!
//! # Example RON
//!
//! ```ron
//! GameConfig(
//!     seed: 42,
//!     evolution: (
//!         mutation_chance: 0.2,
//!     ),
//!     colony: (
//!         starting_torbs: 6,
//!     ),
//! )
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::genetics::COMBAT_GENES;

/// Most decimal places any rounding setting may ask for. `f64` carries
/// about 15 significant digits.
pub const MAX_PRECISION: u32 = 15;

/// Complete configuration for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the game's RNG.
    pub seed: u64,
    /// Process colonies in a shuffled order each round.
    pub shuffle_colony_order: bool,
    /// Genetics parameters.
    pub evolution: EvolutionConfig,
    /// Colony economy parameters.
    pub colony: ColonyConfig,
    /// Army and combat parameters.
    pub army: ArmyConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            shuffle_colony_order: true,
            evolution: EvolutionConfig::default(),
            colony: ColonyConfig::default(),
            army: ArmyConfig::default(),
        }
    }
}

impl GameConfig {
    /// Default config with a specific seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse and validate a config from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron)
            .map_err(|e| GameError::Configuration(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GameError::Configuration(format!("Failed to read '{}': {e}", path.display()))
        })?;
        Self::from_ron_str(&contents)
    }

    /// Check every section for values the engines cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.evolution.validate()?;
        self.colony.validate()?;
        self.army.validate()
    }
}

/// Genetics parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Trait names every torb carries a gene for.
    pub gene_list: Vec<String>,
    /// Alleles per gene for founders.
    pub alleles_per_gene: usize,
    /// Smallest random founder allele (inclusive).
    pub random_gene_min: u32,
    /// Largest random founder allele (exclusive).
    pub random_gene_max: u32,
    /// Chance each inherited allele mutates.
    pub mutation_chance: f64,
    /// Standard deviation of the relative mutation.
    pub mutation_dev: f64,
    /// Floor applied to every bred or mutated allele.
    pub min_allele: f64,
    /// Decimal places kept on bred alleles.
    pub precision: u32,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            gene_list: COMBAT_GENES.iter().map(|g| (*g).to_string()).collect(),
            alleles_per_gene: 2,
            random_gene_min: 1,
            random_gene_max: 10,
            mutation_chance: 0.1,
            mutation_dev: 0.15,
            min_allele: 1.0,
            precision: 4,
        }
    }
}

impl EvolutionConfig {
    fn validate(&self) -> Result<()> {
        if self.alleles_per_gene == 0 {
            return Err(config_error("alleles_per_gene must be at least 1"));
        }
        if self.random_gene_min < 1 {
            return Err(config_error("random_gene_min must be at least 1"));
        }
        if self.random_gene_max <= self.random_gene_min {
            return Err(config_error(format!(
                "random_gene_max ({}) must exceed random_gene_min ({})",
                self.random_gene_max, self.random_gene_min
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_chance) {
            return Err(config_error("mutation_chance must be within [0, 1]"));
        }
        if !self.mutation_dev.is_finite() || self.mutation_dev < 0.0 {
            return Err(config_error("mutation_dev must be a non-negative number"));
        }
        if !(self.min_allele >= 1.0) {
            return Err(config_error("min_allele must be at least 1"));
        }
        if self.precision > MAX_PRECISION {
            return Err(config_error(format!(
                "precision must be at most {MAX_PRECISION}"
            )));
        }

        let mut seen = BTreeSet::new();
        for gene in &self.gene_list {
            if !seen.insert(gene.as_str()) {
                return Err(config_error(format!("gene '{gene}' is listed twice")));
            }
        }
        for required in COMBAT_GENES {
            if !seen.contains(required) {
                return Err(config_error(format!("gene_list is missing '{required}'")));
            }
        }
        Ok(())
    }
}

/// Colony economy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyConfig {
    /// Founders seeded into every new colony.
    pub starting_torbs: u32,
    /// Food stock of a new colony.
    pub starting_food: u32,
    /// Food produced per gathering torb.
    pub gather_rate: f64,
    /// Flat hp restored by resting.
    pub rest_heal_flat: u32,
    /// Fraction of max hp restored by resting.
    pub rest_heal_perc: f64,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            starting_torbs: 4,
            starting_food: 5,
            gather_rate: 1.7,
            rest_heal_flat: 2,
            rest_heal_perc: 0.2,
        }
    }
}

impl ColonyConfig {
    fn validate(&self) -> Result<()> {
        if !self.gather_rate.is_finite() || self.gather_rate < 0.0 {
            return Err(config_error("gather_rate must be a non-negative number"));
        }
        if !self.rest_heal_perc.is_finite() || self.rest_heal_perc < 0.0 {
            return Err(config_error("rest_heal_perc must be a non-negative number"));
        }
        Ok(())
    }
}

/// When the attacker's morale is rolled during a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoraleCheck {
    /// Roll before every duel; the attacker may retreat mid-battle.
    #[default]
    PerDuel,
    /// Roll once when the battle starts; the army commits to the fight.
    PerBattle,
}

/// Army and combat parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmyConfig {
    /// Morale of a new army.
    pub starting_morale: u8,
    /// Lower bound of the morale roll (inclusive).
    pub morale_roll_min: u8,
    /// Upper bound of the morale roll (exclusive).
    pub morale_roll_max: u8,
    /// When the morale roll happens.
    pub morale_check: MoraleCheck,
    /// Duels fought before a battle is called off as a stalemate.
    pub max_duels: u32,
    /// Decimal places kept on power and resilience.
    pub stat_precision: u32,
}

impl Default for ArmyConfig {
    fn default() -> Self {
        Self {
            starting_morale: 50,
            morale_roll_min: 1,
            morale_roll_max: 50,
            morale_check: MoraleCheck::PerDuel,
            max_duels: 500,
            stat_precision: 2,
        }
    }
}

impl ArmyConfig {
    fn validate(&self) -> Result<()> {
        if self.starting_morale > crate::army::MAX_MORALE {
            return Err(config_error("starting_morale must be within [0, 100]"));
        }
        if self.morale_roll_max <= self.morale_roll_min {
            return Err(config_error("morale_roll_max must exceed morale_roll_min"));
        }
        if self.stat_precision > MAX_PRECISION {
            return Err(config_error(format!(
                "stat_precision must be at most {MAX_PRECISION}"
            )));
        }
        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> GameError {
    GameError::Configuration(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = GameConfig::from_ron_str(
            "(seed: 42, evolution: (mutation_chance: 0.2), colony: (starting_torbs: 6))",
        )
        .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.evolution.mutation_chance, 0.2);
        assert_eq!(config.evolution.alleles_per_gene, 2);
        assert_eq!(config.colony.starting_torbs, 6);
        assert_eq!(config.colony.starting_food, 5);
    }

    #[test]
    fn test_zero_alleles_rejected() {
        let mut config = GameConfig::default();
        config.evolution.alleles_per_gene = 0;
        assert!(matches!(
            config.validate(),
            Err(GameError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_combat_gene_rejected() {
        let mut config = GameConfig::default();
        config.evolution.gene_list.retain(|g| g != "agility");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("agility"));
    }

    #[test]
    fn test_duplicate_gene_rejected() {
        let mut config = GameConfig::default();
        config.evolution.gene_list.push("strength".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extra_gene_allowed() {
        let mut config = GameConfig::default();
        config.evolution.gene_list.push("fertility".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_gene_range_rejected() {
        let mut config = GameConfig::default();
        config.evolution.random_gene_max = config.evolution.random_gene_min;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mutation_chance_bounds() {
        let mut config = GameConfig::default();
        config.evolution.mutation_chance = 1.5;
        assert!(config.validate().is_err());
        config.evolution.mutation_chance = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_precision_bounded() {
        let mut config = GameConfig::default();
        config.evolution.precision = MAX_PRECISION;
        config.army.stat_precision = MAX_PRECISION;
        assert!(config.validate().is_ok());

        config.evolution.precision = 400;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("precision"));

        config.evolution.precision = 4;
        config.army.stat_precision = MAX_PRECISION + 1;
        assert!(matches!(
            config.validate(),
            Err(GameError::Configuration(_))
        ));
    }

    #[test]
    fn test_unparseable_ron_is_configuration_error() {
        assert!(matches!(
            GameConfig::from_ron_str("(seed: \"nope\")"),
            Err(GameError::Configuration(_))
        ));
    }
}
