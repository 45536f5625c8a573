//! A colony's army: enlisted soldiers, morale, and round intentions.
//!
//! An [`ArmyTorb`] is a snapshot of one soldier's active alleles, taken at
//! enlistment. Power and resilience are derived once from that snapshot and
//! stay fixed while the torb is enlisted.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use rand::seq::IteratorRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ArmyConfig;
use crate::genetics::{Genome, AGILITY, STRENGTH, STURDINESS, VITALITY};
use crate::ids::{ColonyId, TorbId};
use crate::math::{geometric_mean, hash_f64, round_to};
use crate::torb::{Action, Torb};

/// Upper bound on army morale.
pub const MAX_MORALE: u8 = 100;

/// One allele per combat trait, sampled at enlistment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveAlleles {
    /// Strength allele.
    pub strength: f64,
    /// Agility allele.
    pub agility: f64,
    /// Vitality allele.
    pub vitality: f64,
    /// Sturdiness allele.
    pub sturdiness: f64,
}

impl ActiveAlleles {
    /// Sample one allele from each combat gene.
    ///
    /// Returns `None` if a combat gene is missing or empty.
    pub fn sample<R: Rng + ?Sized>(genes: &Genome, rng: &mut R) -> Option<Self> {
        let mut pick = |name: &str| genes.get(name).and_then(|g| g.choose(rng));
        Some(Self {
            strength: pick(STRENGTH)?,
            agility: pick(AGILITY)?,
            vitality: pick(VITALITY)?,
            sturdiness: pick(STURDINESS)?,
        })
    }

    /// `sqrt(strength * agility)`.
    #[must_use]
    pub fn power(&self, precision: u32) -> f64 {
        round_to(geometric_mean(self.strength, self.agility), precision)
    }

    /// `sqrt(vitality * sturdiness)`.
    #[must_use]
    pub fn resilience(&self, precision: u32) -> f64 {
        round_to(geometric_mean(self.vitality, self.sturdiness), precision)
    }
}

/// An enlisted soldier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmyTorb {
    /// The underlying torb.
    pub torb: TorbId,
    /// Alleles sampled at enlistment.
    pub active: ActiveAlleles,
    /// Derived attack stat.
    pub power: f64,
    /// Derived defence stat.
    pub resilience: f64,
}

impl ArmyTorb {
    /// Snapshot a torb's active alleles.
    pub fn enlist<R: Rng + ?Sized>(torb: &Torb, precision: u32, rng: &mut R) -> Option<Self> {
        let active = ActiveAlleles::sample(&torb.genes, rng)?;
        Some(Self {
            torb: torb.id,
            active,
            power: active.power(precision),
            resilience: active.resilience(precision),
        })
    }

    /// Upper bound of the speed draw in a duel.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.active.agility
    }
}

/// A colony's army.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Army {
    /// Morale, `0..=MAX_MORALE`.
    pub morale: u8,
    /// Colony to scout next round.
    pub scout_target: Option<ColonyId>,
    /// Colony to attack next round.
    pub attack_target: Option<ColonyId>,
    soldiers: BTreeMap<TorbId, ArmyTorb>,
}

impl Army {
    /// An empty army.
    #[must_use]
    pub fn new(starting_morale: u8) -> Self {
        Self {
            morale: starting_morale.min(MAX_MORALE),
            scout_target: None,
            attack_target: None,
            soldiers: BTreeMap::new(),
        }
    }

    /// Number of enlisted soldiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.soldiers.len()
    }

    /// Whether no soldiers are enlisted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.soldiers.is_empty()
    }

    /// Whether a torb is enlisted.
    #[must_use]
    pub fn contains(&self, torb: TorbId) -> bool {
        self.soldiers.contains_key(&torb)
    }

    /// A soldier by torb ID.
    #[must_use]
    pub fn get(&self, torb: TorbId) -> Option<&ArmyTorb> {
        self.soldiers.get(&torb)
    }

    /// Soldiers in ascending torb ID order.
    pub fn soldiers(&self) -> impl Iterator<Item = &ArmyTorb> {
        self.soldiers.values()
    }

    /// Add a snapshot, replacing any previous one for the same torb.
    pub fn insert(&mut self, soldier: ArmyTorb) {
        self.soldiers.insert(soldier.torb, soldier);
    }

    /// Remove a soldier.
    pub fn discharge(&mut self, torb: TorbId) -> Option<ArmyTorb> {
        self.soldiers.remove(&torb)
    }

    /// Drop every soldier whose torb is no longer soldiering.
    ///
    /// Returns the discharged torb IDs.
    pub fn purge(&mut self, torbs: &BTreeMap<TorbId, Torb>) -> Vec<TorbId> {
        let gone: Vec<TorbId> = self
            .soldiers
            .keys()
            .filter(|id| {
                torbs
                    .get(id)
                    .map_or(true, |t| !t.alive || t.action != Action::Soldiering)
            })
            .copied()
            .collect();
        for id in &gone {
            self.soldiers.remove(id);
        }
        gone
    }

    /// A uniformly random soldier.
    pub fn random_soldier<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&ArmyTorb> {
        self.soldiers.values().choose(rng)
    }

    /// Change morale, clamped to `0..=MAX_MORALE`.
    pub fn adjust_morale(&mut self, delta: i32) {
        let morale = (i32::from(self.morale) + delta).clamp(0, i32::from(MAX_MORALE));
        self.morale = u8::try_from(morale).unwrap_or(MAX_MORALE);
    }

    /// Roll against morale: `true` means the army keeps fighting.
    pub fn morale_holds<R: Rng + ?Sized>(&self, config: &ArmyConfig, rng: &mut R) -> bool {
        let roll = rng.gen_range(config.morale_roll_min..config.morale_roll_max);
        self.morale > roll
    }

    /// Clear scout and attack targets.
    pub fn clear_targets(&mut self) {
        self.scout_target = None;
        self.attack_target = None;
    }

    /// Sum of soldiers' power.
    #[must_use]
    pub fn power(&self, precision: u32) -> f64 {
        round_to(self.soldiers.values().map(|s| s.power).sum(), precision)
    }

    /// Sum of soldiers' resilience.
    #[must_use]
    pub fn resilience(&self, precision: u32) -> f64 {
        round_to(self.soldiers.values().map(|s| s.resilience).sum(), precision)
    }

    /// Total current hp of enlisted soldiers.
    #[must_use]
    pub fn health(&self, torbs: &BTreeMap<TorbId, Torb>) -> u32 {
        self.soldiers
            .keys()
            .filter_map(|id| torbs.get(id))
            .map(|t| t.hp)
            .sum()
    }

    /// Aggregate view of the army and its recruits.
    #[must_use]
    pub fn summary(&self, torbs: &BTreeMap<TorbId, Torb>, precision: u32) -> ArmySummary {
        ArmySummary {
            soldiers: self.len(),
            training: torbs
                .values()
                .filter(|t| t.action == Action::Training)
                .count(),
            health: self.health(torbs),
            max_health: self
                .soldiers
                .keys()
                .filter_map(|id| torbs.get(id))
                .map(|t| t.max_hp)
                .sum(),
            power: self.power(precision),
            resilience: self.resilience(precision),
            morale: self.morale,
        }
    }
}

impl Hash for Army {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.morale.hash(state);
        self.scout_target.hash(state);
        self.attack_target.hash(state);
        for soldier in self.soldiers.values() {
            soldier.torb.hash(state);
            hash_f64(soldier.active.strength, state);
            hash_f64(soldier.active.agility, state);
            hash_f64(soldier.active.vitality, state);
            hash_f64(soldier.active.sturdiness, state);
        }
    }
}

/// Aggregate army numbers shown to players and compared by scouts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmySummary {
    /// Enlisted soldiers.
    pub soldiers: usize,
    /// Torbs that enlist next round.
    pub training: usize,
    /// Total soldier hp.
    pub health: u32,
    /// Total soldier max hp.
    pub max_health: u32,
    /// Total soldier power.
    pub power: f64,
    /// Total soldier resilience.
    pub resilience: f64,
    /// Current morale.
    pub morale: u8,
}

const HEALTH_THRESHOLDS: [(f64, &str); 4] = [
    (0.95, "seems uninjured"),
    (0.7, "is lightly injured"),
    (0.4, "appears moderately injured"),
    (0.0, "looks like it's on the brink of collapse"),
];

const POWER_THRESHOLDS: [(f64, &str); 5] = [
    (1.4, "appears much stronger than our army"),
    (1.15, "seems somewhat stronger than our army"),
    (0.85, "looks about the same strength as ours"),
    (0.5, "is moderately weaker than ours"),
    (0.0, "is much weaker than our army"),
];

const RESILIENCE_THRESHOLDS: [(f64, &str); 5] = [
    (1.4, "appears much more resilient than ours"),
    (1.15, "seems somewhat more resilient than our army"),
    (0.85, "looks just as resilient as ours"),
    (0.5, "is moderately less resilient than ours"),
    (0.0, "is much less resilient than our army"),
];

/// First phrase whose threshold `value` exceeds, else the last one.
fn describe(value: f64, thresholds: &[(f64, &'static str)]) -> &'static str {
    thresholds
        .iter()
        .find(|(threshold, _)| value > *threshold)
        .or_else(|| thresholds.last())
        .map_or("", |(_, text)| text)
}

fn ratio(theirs: f64, ours: f64) -> f64 {
    if ours > 0.0 {
        theirs / ours
    } else {
        f64::INFINITY
    }
}

impl ArmySummary {
    /// Describe this (foreign) army relative to `own` the way a scout
    /// would: its health, then power and resilience compared to ours.
    ///
    /// Returns `None` if this army has no soldiers.
    #[must_use]
    pub fn describe_relative_to(&self, own: &ArmySummary) -> Option<String> {
        if self.soldiers == 0 || self.max_health == 0 {
            return None;
        }
        let health = f64::from(self.health) / f64::from(self.max_health);
        Some(format!(
            "{}, {}, and {}",
            describe(health, &HEALTH_THRESHOLDS),
            describe(ratio(self.power, own.power), &POWER_THRESHOLDS),
            describe(ratio(self.resilience, own.resilience), &RESILIENCE_THRESHOLDS),
        ))
    }
}
