//! Decision logic for AI-controlled colonies.
//!
//! [`decide`] is a pure function from a read-only [`ColonyView`] and an
//! [`AiProfile`] to a list of [`ColonyCommand`]s. The game applies the
//! commands through the same surface human players use.
//!
//! # Example RON
//!
//! ```ron
//! AiProfile(
//!     name: "turtle",
//!     breed_fraction: 0.5,
//!     army_fraction: 0.5,
//!     aggression: 0.1,
//!     scout_chance: 0.2,
//! )
//! ```

use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::colony::Colony;
use crate::error::{GameError, Result};
use crate::ids::{ColonyId, TorbId};
use crate::player_facade::ColonyCommand;
use crate::torb::Action;

/// Strategy parameters for an AI colony.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiProfile {
    /// Profile name, used in logs and reports.
    pub name: String,
    /// Upper bound on breeding pairs, as a fraction of living torbs.
    pub breed_fraction: f64,
    /// Desired soldiers plus recruits, as a fraction of living torbs.
    pub army_fraction: f64,
    /// Chance per turn of attacking a discovered colony.
    pub aggression: f64,
    /// Chance per turn of scouting an undiscovered colony.
    pub scout_chance: f64,
}

impl Default for AiProfile {
    fn default() -> Self {
        Self::balanced()
    }
}

impl AiProfile {
    /// A third of the colony breeds, a third soldiers.
    #[must_use]
    pub fn balanced() -> Self {
        Self {
            name: "balanced".to_string(),
            breed_fraction: 1.0 / 3.0,
            army_fraction: 1.0 / 3.0,
            aggression: 0.5,
            scout_chance: 0.5,
        }
    }

    /// Large army, attacks whenever it knows a target.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            name: "aggressive".to_string(),
            breed_fraction: 0.25,
            army_fraction: 0.5,
            aggression: 1.0,
            scout_chance: 0.8,
        }
    }

    /// Breeds heavily and keeps a token guard.
    #[must_use]
    pub fn breeder() -> Self {
        Self {
            name: "breeder".to_string(),
            breed_fraction: 0.5,
            army_fraction: 0.15,
            aggression: 0.1,
            scout_chance: 0.2,
        }
    }

    /// Look up a preset by name.
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "balanced" => Some(Self::balanced()),
            "aggressive" => Some(Self::aggressive()),
            "breeder" => Some(Self::breeder()),
            _ => None,
        }
    }

    /// Names of the built-in presets.
    #[must_use]
    pub const fn preset_names() -> &'static [&'static str] {
        &["balanced", "aggressive", "breeder"]
    }

    /// Parse and validate a profile from RON.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let profile: Self = ron::from_str(ron)
            .map_err(|e| GameError::Configuration(format!("Failed to parse AI profile: {e}")))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load and validate a profile from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GameError::Configuration(format!("Failed to read '{}': {e}", path.display()))
        })?;
        Self::from_ron_str(&contents)
    }

    /// Every fraction and chance must lie in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("breed_fraction", self.breed_fraction),
            ("army_fraction", self.army_fraction),
            ("aggression", self.aggression),
            ("scout_chance", self.scout_chance),
        ];
        for (field, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(GameError::Configuration(format!(
                    "AI profile '{}': {field} must be within [0, 1]",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// What an AI colony can see when deciding its turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColonyView {
    /// The deciding colony.
    pub colony: ColonyId,
    /// Food in stock.
    pub food: u32,
    /// Living torbs.
    pub living: usize,
    /// Enlisted soldiers.
    pub soldiers: usize,
    /// Torbs in training.
    pub training: usize,
    /// Torbs free for new orders: alive, fertile, fed, grown, and not
    /// already breeding, training or soldiering.
    pub available: Vec<TorbId>,
    /// Colonies already discovered.
    pub discovered: Vec<ColonyId>,
    /// Other colonies not yet discovered.
    pub undiscovered: Vec<ColonyId>,
}

impl ColonyView {
    /// Build the view of `colony` in a game containing `all` colonies.
    #[must_use]
    pub fn of(colony: &Colony, all: impl IntoIterator<Item = ColonyId>) -> Self {
        let available = colony
            .living()
            .filter(|t| {
                t.fertile
                    && !t.starving
                    && !t.growing
                    && !matches!(
                        t.action,
                        Action::Breeding | Action::Training | Action::Soldiering
                    )
            })
            .map(|t| t.id)
            .collect();
        let undiscovered = all
            .into_iter()
            .filter(|id| *id != colony.id && !colony.has_discovered(*id))
            .collect();
        Self {
            colony: colony.id,
            food: colony.food,
            living: colony.living_count(),
            soldiers: colony.army.len(),
            training: colony.count_action(Action::Training),
            available,
            discovered: colony.discovered().iter().copied().collect(),
            undiscovered,
        }
    }
}

/// Decide one turn for an AI colony.
///
/// Picks a random number of breeding pairs (fewer than
/// `living * breed_fraction`), tops the army up toward
/// `living * army_fraction`, maybe scouts an undiscovered colony, maybe
/// attacks a discovered one, and always ends the turn.
pub fn decide<R: Rng + ?Sized>(view: &ColonyView, profile: &AiProfile, rng: &mut R) -> Vec<ColonyCommand> {
    let mut commands = Vec::new();
    let mut free = view.available.clone();
    free.shuffle(rng);
    let mut free = free.into_iter();

    let pair_cap = fraction_of(view.living, profile.breed_fraction);
    let pairs = if pair_cap == 0 {
        0
    } else {
        rng.gen_range(0..pair_cap)
    };
    for _ in 0..pairs {
        let (Some(a), Some(b)) = (free.next(), free.next()) else {
            break;
        };
        commands.push(ColonyCommand::Breed { a, b });
    }

    let desired = fraction_of(view.living, profile.army_fraction);
    let needed = desired.saturating_sub(view.soldiers + view.training);
    let enlist = rng.gen_range(0..=needed);
    let recruits: Vec<TorbId> = free.by_ref().take(enlist).collect();
    if !recruits.is_empty() {
        commands.push(ColonyCommand::Assign {
            torbs: recruits,
            action: Action::Training,
        });
    }

    if let Some(&target) = view.undiscovered.choose(rng) {
        if rng.gen_bool(profile.scout_chance) {
            commands.push(ColonyCommand::Scout {
                target: Some(target),
            });
        }
    }
    if let Some(&target) = view.discovered.choose(rng) {
        if rng.gen_bool(profile.aggression) {
            commands.push(ColonyCommand::Attack {
                target: Some(target),
            });
        }
    }

    commands.push(ColonyCommand::EndTurn);
    debug!(
        colony = %view.colony,
        profile = %profile.name,
        pairs,
        desired,
        needed,
        commands = commands.len(),
        "AI decided"
    );
    commands
}

fn fraction_of(count: usize, fraction: f64) -> usize {
    (count as f64 * fraction).floor().max(0.0) as usize
}
