//! The torb: a creature with genes, health, lifecycle flags and an action.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::genetics::{max_hp_for, Genome, Offspring};
use crate::ids::{ColonyId, TorbId, TorbTag};

/// What a torb spends the round doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Produces food.
    #[default]
    Gathering,
    /// Paired with its context torb; bred at the next round.
    Breeding,
    /// Enlists at the next round.
    Training,
    /// Enlisted in the colony's army.
    Soldiering,
    /// Heals at the next round unless starving.
    Resting,
    /// A newborn; ignores orders until the next round.
    Growing,
    /// Terminal.
    Dead,
}

impl Action {
    /// Actions a player may assign in bulk.
    pub const ASSIGNABLE: [Action; 3] = [Action::Gathering, Action::Training, Action::Resting];

    /// Whether a player may assign this action in bulk.
    #[must_use]
    pub fn is_assignable(self) -> bool {
        Self::ASSIGNABLE.contains(&self)
    }

    /// Short label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gathering => "gathering",
            Self::Breeding => "breeding",
            Self::Training => "training",
            Self::Soldiering => "soldiering",
            Self::Resting => "resting",
            Self::Growing => "growing",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single creature.
///
/// Torbs are never removed from their colony. A dead torb stays in place
/// with `alive == false` and [`Action::Dead`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Torb {
    /// Game-wide identifier.
    pub id: TorbId,
    /// Generation and per-generation number inside the colony.
    pub tag: TorbTag,
    /// Display name.
    pub name: String,
    /// Owning colony.
    pub colony: ColonyId,
    /// One gene per configured trait.
    pub genes: Genome,
    /// Current hit points, `0..=max_hp`.
    pub hp: u32,
    /// Fixed at creation from the vitality gene.
    pub max_hp: u32,
    /// Whether the torb is alive.
    pub alive: bool,
    /// Whether the torb can breed this round.
    pub fertile: bool,
    /// Went hungry at the last meal.
    pub starving: bool,
    /// Newborn, ignores orders.
    pub growing: bool,
    /// Has been through training at least once.
    pub trained: bool,
    /// Current action.
    pub action: Action,
    /// Breeding partner while `action == Breeding`.
    pub context: Option<TorbId>,
}

impl Torb {
    /// Create a generation-zero founder with full health.
    #[must_use]
    pub fn new(
        id: TorbId,
        tag: TorbTag,
        name: impl Into<String>,
        colony: ColonyId,
        genes: Genome,
    ) -> Self {
        let max_hp = max_hp_for(&genes);
        Self {
            id,
            tag,
            name: name.into(),
            colony,
            genes,
            hp: max_hp,
            max_hp,
            alive: true,
            fertile: true,
            starving: false,
            growing: false,
            trained: false,
            action: Action::Gathering,
            context: None,
        }
    }

    /// Create a newborn from the breeding engine's output. Newborns stay
    /// infertile until the first fertility reset after they have grown.
    #[must_use]
    pub fn newborn(
        id: TorbId,
        tag: TorbTag,
        name: impl Into<String>,
        colony: ColonyId,
        offspring: Offspring,
    ) -> Self {
        Self {
            id,
            tag,
            name: name.into(),
            colony,
            genes: offspring.genes,
            hp: offspring.max_hp,
            max_hp: offspring.max_hp,
            alive: true,
            fertile: false,
            starving: false,
            growing: true,
            trained: false,
            action: Action::Growing,
            context: None,
        }
    }

    /// Generation number.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.tag.generation
    }

    /// Alive and not growing.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.alive && !self.growing
    }

    /// Apply an hp change, clamped to `0..=max_hp`.
    ///
    /// Returns `true` if this change killed the torb. Death clears fertility,
    /// the breeding partner and the action. Unpairing the partner and
    /// leaving the army are the colony's job.
    pub fn adjust_hp(&mut self, delta: i64) -> bool {
        if !self.alive {
            return false;
        }
        let hp = (i64::from(self.hp) + delta).clamp(0, i64::from(self.max_hp));
        self.hp = u32::try_from(hp).unwrap_or(0);
        if self.hp == 0 {
            self.alive = false;
            self.fertile = false;
            self.action = Action::Dead;
            self.context = None;
            debug!(torb = %self.id, name = %self.name, "Torb died");
            return true;
        }
        false
    }

    /// Change the action, unless the torb is growing or dead.
    ///
    /// Returns whether the change was applied.
    pub fn request_action(&mut self, action: Action, context: Option<TorbId>) -> bool {
        if self.growing || !self.alive {
            return false;
        }
        self.action = action;
        self.context = if action == Action::Breeding {
            context
        } else {
            None
        };
        true
    }

    /// Pair with `partner` for breeding.
    pub fn pair_with(&mut self, partner: TorbId) -> bool {
        self.request_action(Action::Breeding, Some(partner))
    }

    /// The breeding partner, if paired.
    #[must_use]
    pub fn partner(&self) -> Option<TorbId> {
        if self.action == Action::Breeding {
            self.context
        } else {
            None
        }
    }

    /// Player-facing status, e.g. `"Alive, Fertile"`.
    #[must_use]
    pub fn status(&self) -> String {
        let mut parts = vec![if !self.alive {
            "Dead"
        } else if self.starving {
            "Starving"
        } else {
            "Alive"
        }];
        parts.push(if self.fertile { "Fertile" } else { "Infertile" });
        if self.growing {
            parts.push("Juvenile");
        }
        parts.join(", ")
    }
}

impl Hash for Torb {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.tag.hash(state);
        self.name.hash(state);
        self.colony.hash(state);
        for (name, gene) in &self.genes {
            name.hash(state);
            gene.hash(state);
        }
        self.hp.hash(state);
        self.max_hp.hash(state);
        self.alive.hash(state);
        self.fertile.hash(state);
        self.starving.hash(state);
        self.growing.hash(state);
        self.trained.hash(state);
        self.action.hash(state);
        self.context.hash(state);
    }
}
