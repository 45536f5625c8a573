//! Scouting and battles between colonies.
//!
//! This module implements the army phase of a round:
//! - Scouting: one random scout tests its resilience against one random
//!   enemy soldier's power
//! - Attacks: repeated 1v1 duels until one army is gone or morale breaks
//! - Duels: uniform draws for attack, defence and speed; the faster torb
//!   strikes first and the struck torb retaliates if it survives
//! - Plunder: the winning side takes food from the loser
//!
//! Every function takes the game's RNG explicitly, so battles replay
//! exactly under the same seed.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::army::ArmyTorb;
use crate::colony::Colony;
use crate::config::{ArmyConfig, MoraleCheck};
use crate::ids::TorbId;
use crate::math::{round_half_even, round_to_int};
use crate::narrative::{Chronicle, StoryKind};

/// Result of a scouting attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScoutOutcome {
    /// The scouting colony had no soldiers.
    NoSoldiers,
    /// The target had no soldiers; discovered unconditionally.
    Undefended,
    /// The scout's resilience beat the defender's power.
    Evaded {
        /// The scout.
        scout: TorbId,
    },
    /// The scout was outmatched but slipped away unseen.
    Lucky {
        /// The scout.
        scout: TorbId,
    },
    /// The scout was caught and hurt; nothing discovered.
    Repelled {
        /// The scout.
        scout: TorbId,
        /// Damage taken.
        damage: u32,
        /// Whether the scout died.
        died: bool,
    },
}

impl ScoutOutcome {
    /// Whether the target was discovered.
    #[must_use]
    pub const fn discovered(&self) -> bool {
        matches!(
            self,
            Self::Undefended | Self::Evaded { .. } | Self::Lucky { .. }
        )
    }
}

/// Which side of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The colony that ordered the attack.
    Attacker,
    /// The colony being attacked.
    Defender,
}

/// How a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEnd {
    /// One army has no soldiers left.
    Annihilation,
    /// The attacker's morale broke while both armies still stood.
    Retreat,
    /// The duel cap was reached.
    Stalemate,
}

/// Result of a full battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleResult {
    /// Winning side, if any.
    pub winner: Option<Side>,
    /// How the battle ended.
    pub end: BattleEnd,
    /// Duels fought.
    pub duels: u32,
    /// Attacking soldiers killed.
    pub attacker_losses: u32,
    /// Defending soldiers killed.
    pub defender_losses: u32,
}

/// Result of an attack order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackOutcome {
    /// The attacker had no soldiers; nothing happened.
    NoSoldiers,
    /// The defender had no soldiers; the attacker won without a fight.
    Undefended {
        /// Food taken from the defender.
        food_stolen: u32,
    },
    /// The armies fought.
    Battle {
        /// The battle itself.
        result: BattleResult,
        /// Food taken by the winner.
        food_stolen: u32,
    },
}

impl AttackOutcome {
    /// Food that changed hands.
    #[must_use]
    pub const fn food_stolen(&self) -> u32 {
        match self {
            Self::NoSoldiers => 0,
            Self::Undefended { food_stolen } | Self::Battle { food_stolen, .. } => *food_stolen,
        }
    }
}

/// Hp changes from one duel, both `<= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duel {
    /// Change to the first combatant's hp.
    pub first_delta: i64,
    /// Change to the second combatant's hp.
    pub second_delta: i64,
}

/// Uniform draw in `[1, max]`. A stat at or below 1 always draws 1.
fn sample_stat<R: Rng + ?Sized>(max: f64, rng: &mut R) -> f64 {
    if max <= 1.0 {
        1.0
    } else {
        rng.gen_range(1.0..=max)
    }
}

/// Damage from one strike: `round(attack - defense)`, never negative.
fn strike_damage(attack: f64, defense: f64) -> i64 {
    if attack > defense {
        round_to_int(attack - defense)
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy)]
struct DuelRoll {
    attack: f64,
    defense: f64,
    speed: f64,
}

impl DuelRoll {
    fn draw<R: Rng + ?Sized>(soldier: &ArmyTorb, rng: &mut R) -> Self {
        Self {
            attack: sample_stat(soldier.power, rng),
            defense: sample_stat(soldier.resilience, rng),
            speed: sample_stat(soldier.speed(), rng),
        }
    }
}

/// Resolve one duel between two soldiers with their current hp.
///
/// The faster combatant strikes first; a speed tie is a coin flip. If the
/// struck combatant survives, it strikes back.
pub fn torb_fight<R: Rng + ?Sized>(
    first: &ArmyTorb,
    first_hp: u32,
    second: &ArmyTorb,
    second_hp: u32,
    rng: &mut R,
) -> Duel {
    let a = DuelRoll::draw(first, rng);
    let b = DuelRoll::draw(second, rng);

    #[allow(clippy::float_cmp)]
    let first_leads = if a.speed == b.speed {
        rng.gen_bool(0.5)
    } else {
        a.speed > b.speed
    };

    let (lead, follow, follow_hp) = if first_leads {
        (a, b, second_hp)
    } else {
        (b, a, first_hp)
    };
    let opening = strike_damage(lead.attack, follow.defense);
    let reply = if opening < i64::from(follow_hp) {
        strike_damage(follow.attack, lead.defense)
    } else {
        0
    };

    if first_leads {
        Duel {
            first_delta: -reply,
            second_delta: -opening,
        }
    } else {
        Duel {
            first_delta: -opening,
            second_delta: -reply,
        }
    }
}

/// Try to discover the scouting colony's scout target.
///
/// Returns `None` if no target is set.
pub fn scout_colony<R: Rng + ?Sized>(
    scout: &mut Colony,
    target: &Colony,
    chronicle: &mut Chronicle,
    rng: &mut R,
) -> Option<ScoutOutcome> {
    if scout.army.scout_target != Some(target.id) {
        return None;
    }

    let Some(own) = scout.army.random_soldier(rng).cloned() else {
        chronicle.record(
            scout.id,
            StoryKind::Scouting,
            format!(
                "You ordered your Torbs to scout, but without training all they found was {}.",
                scout.name
            ),
        );
        return Some(ScoutOutcome::NoSoldiers);
    };

    let Some(enemy) = target.army.random_soldier(rng) else {
        scout.discover(target.id);
        chronicle.record(
            scout.id,
            StoryKind::Scouting,
            format!(
                "Your scout found {} and they reported that it appears undefended.",
                target.name
            ),
        );
        return Some(ScoutOutcome::Undefended);
    };

    let enemy_power = enemy.power;
    let own_resilience = own.resilience;
    let scout_name = scout
        .torb(own.torb)
        .map_or_else(|| own.torb.to_string(), |t| t.name.clone());

    if own_resilience > enemy_power {
        scout.discover(target.id);
        chronicle.record(
            scout.id,
            StoryKind::Scouting,
            format!(
                "An enemy soldier at {} tried to repel your scout, but {scout_name} was too nimble.",
                target.name
            ),
        );
        return Some(ScoutOutcome::Evaded { scout: own.torb });
    }

    let escape: f64 = rng.gen();
    if escape > enemy_power / own_resilience {
        scout.discover(target.id);
        chronicle.record(
            scout.id,
            StoryKind::Scouting,
            format!(
                "Your scout was lucky and wasn't caught by a soldier at {}.",
                target.name
            ),
        );
        return Some(ScoutOutcome::Lucky { scout: own.torb });
    }

    let max_damage = u32::try_from(round_to_int(enemy_power - own_resilience).max(0)).unwrap_or(0);
    let damage = rng.gen_range(0..=max_damage);
    let text = if scout.has_discovered(target.id) {
        format!(
            "Your scout was attacked when trying to scout {} and didn't get any new information.",
            target.name
        )
    } else {
        "Your scout was attacked when trying to scout an unknown colony and didn't get any information."
            .to_string()
    };
    chronicle.record(scout.id, StoryKind::Scouting, text);

    let cause = format!("wounds taken while scouting {}", target.name);
    let died = scout
        .adjust_torb_hp(own.torb, -i64::from(damage), &cause, chronicle)
        .unwrap_or_else(|err| {
            warn!(colony = %scout.id, torb = %own.torb, error = %err, "Scout vanished mid-phase");
            false
        });
    if died {
        scout.army.scout_target = None;
    }
    debug!(colony = %scout.id, target = %target.id, damage, died, "Scout repelled");
    Some(ScoutOutcome::Repelled {
        scout: own.torb,
        damage,
        died,
    })
}

/// Carry out the attacker's attack order against `defender`.
///
/// Returns `None` if the attacker's target is not `defender`.
pub fn attack_colony<R: Rng + ?Sized>(
    attacker: &mut Colony,
    defender: &mut Colony,
    config: &ArmyConfig,
    chronicle: &mut Chronicle,
    rng: &mut R,
) -> Option<AttackOutcome> {
    if attacker.army.attack_target != Some(defender.id) {
        return None;
    }

    if attacker.army.is_empty() {
        chronicle.record(
            attacker.id,
            StoryKind::Combat,
            format!(
                "You ordered an attack on {}, but without soldiers nobody marched.",
                defender.name
            ),
        );
        return Some(AttackOutcome::NoSoldiers);
    }

    if defender.army.is_empty() {
        let food_stolen = plunder(attacker, defender, config, rng);
        chronicle.record(
            attacker.id,
            StoryKind::Combat,
            format!(
                "Your army marched into {} unopposed and took {food_stolen} food.",
                defender.name
            ),
        );
        chronicle.record(
            defender.id,
            StoryKind::Combat,
            format!(
                "{} raided your undefended colony and took {food_stolen} food.",
                attacker.name
            ),
        );
        info!(attacker = %attacker.id, defender = %defender.id, food_stolen, "Undefended colony raided");
        return Some(AttackOutcome::Undefended { food_stolen });
    }

    let result = battle_army(attacker, defender, config, chronicle, rng);
    let food_stolen = match result.winner {
        Some(Side::Attacker) => plunder(attacker, defender, config, rng),
        Some(Side::Defender) => plunder(defender, attacker, config, rng),
        None => 0,
    };
    record_battle(attacker, defender, &result, food_stolen, chronicle);
    info!(
        attacker = %attacker.id,
        defender = %defender.id,
        winner = ?result.winner,
        end = ?result.end,
        duels = result.duels,
        food_stolen,
        "Battle resolved"
    );
    Some(AttackOutcome::Battle {
        result,
        food_stolen,
    })
}

/// Fight duels between the two armies until one is gone, the attacker's
/// morale breaks, or the duel cap is reached.
///
/// Morale is rolled before every duel under [`MoraleCheck::PerDuel`] and
/// once at the start under [`MoraleCheck::PerBattle`]. A broken roll while
/// both armies stand is a retreat with no winner.
pub fn battle_army<R: Rng + ?Sized>(
    attacker: &mut Colony,
    defender: &mut Colony,
    config: &ArmyConfig,
    chronicle: &mut Chronicle,
    rng: &mut R,
) -> BattleResult {
    let mut duels = 0;
    let mut attacker_losses = 0;
    let mut defender_losses = 0;
    let committed = config.morale_check == MoraleCheck::PerBattle
        && attacker.army.morale_holds(config, rng);

    let end = loop {
        if attacker.army.is_empty() || defender.army.is_empty() {
            break BattleEnd::Annihilation;
        }
        if duels >= config.max_duels {
            break BattleEnd::Stalemate;
        }
        let holds = match config.morale_check {
            MoraleCheck::PerDuel => attacker.army.morale_holds(config, rng),
            MoraleCheck::PerBattle => committed,
        };
        if !holds {
            break BattleEnd::Retreat;
        }

        let (Some(ours), Some(theirs)) = (
            attacker.army.random_soldier(rng).cloned(),
            defender.army.random_soldier(rng).cloned(),
        ) else {
            break BattleEnd::Annihilation;
        };
        let our_hp = attacker.torb(ours.torb).map_or(0, |t| t.hp);
        let their_hp = defender.torb(theirs.torb).map_or(0, |t| t.hp);
        let duel = torb_fight(&ours, our_hp, &theirs, their_hp, rng);
        duels += 1;

        let our_cause = format!("wounds in battle with {}", defender.name);
        let their_cause = format!("wounds in battle with {}", attacker.name);
        if apply_wound(attacker, ours.torb, duel.first_delta, &our_cause, chronicle) {
            attacker_losses += 1;
        }
        if apply_wound(defender, theirs.torb, duel.second_delta, &their_cause, chronicle) {
            defender_losses += 1;
        }

        // Larger hp delta inflicted wins the exchange.
        let inflicted = -duel.second_delta;
        let suffered = -duel.first_delta;
        if inflicted > suffered {
            attacker.army.adjust_morale(1);
            defender.army.adjust_morale(-1);
        } else if suffered > inflicted {
            attacker.army.adjust_morale(-1);
            defender.army.adjust_morale(1);
        }
    };
    let winner = match (attacker.army.is_empty(), defender.army.is_empty()) {
        (false, true) => Some(Side::Attacker),
        (true, false) => Some(Side::Defender),
        _ => None,
    };
    BattleResult {
        winner,
        end,
        duels,
        attacker_losses,
        defender_losses,
    }
}

fn apply_wound(
    colony: &mut Colony,
    torb: TorbId,
    delta: i64,
    cause: &str,
    chronicle: &mut Chronicle,
) -> bool {
    if delta == 0 {
        return false;
    }
    colony
        .adjust_torb_hp(torb, delta, cause, chronicle)
        .unwrap_or_else(|err| {
            warn!(colony = %colony.id, %torb, error = %err, "Soldier vanished mid-battle");
            colony.army.discharge(torb);
            false
        })
}

/// Move food from `loser` to `winner`.
///
/// The amount is uniform in `[min(loser_food, round(winner_power)), loser_food]`.
fn plunder<R: Rng + ?Sized>(
    winner: &mut Colony,
    loser: &mut Colony,
    config: &ArmyConfig,
    rng: &mut R,
) -> u32 {
    let power = round_half_even(winner.army.power(config.stat_precision)).max(0.0);
    let floor = u32::try_from(power as i64).unwrap_or(u32::MAX).min(loser.food);
    let amount = rng.gen_range(floor..=loser.food);
    loser.food -= amount;
    winner.food = winner.food.saturating_add(amount);
    amount
}

fn record_battle(
    attacker: &Colony,
    defender: &Colony,
    result: &BattleResult,
    food_stolen: u32,
    chronicle: &mut Chronicle,
) {
    let (to_attacker, to_defender) = match (result.winner, result.end) {
        (Some(Side::Attacker), _) => (
            format!(
                "Your army defeated the soldiers of {} and took {food_stolen} food.",
                defender.name
            ),
            format!(
                "{} overran your army and took {food_stolen} food.",
                attacker.name
            ),
        ),
        (Some(Side::Defender), _) => (
            format!(
                "Your army was wiped out attacking {}, who took {food_stolen} food in return.",
                defender.name
            ),
            format!(
                "Your soldiers drove off an attack from {} and took {food_stolen} food.",
                attacker.name
            ),
        ),
        (None, BattleEnd::Stalemate) => (
            format!(
                "The battle with {} dragged on without a victor and your army withdrew.",
                defender.name
            ),
            format!(
                "The battle with {} dragged on until their army withdrew.",
                attacker.name
            ),
        ),
        (None, _) => (
            format!(
                "Your army lost its nerve and retreated from {}.",
                defender.name
            ),
            format!(
                "Your soldiers held firm and {} retreated.",
                attacker.name
            ),
        ),
    };
    let losses = format!(
        " ({} of ours and {} of theirs fell in {} duels.)",
        result.attacker_losses, result.defender_losses, result.duels
    );
    chronicle.record(attacker.id, StoryKind::Combat, to_attacker + &losses);
    let losses = format!(
        " ({} of ours and {} of theirs fell in {} duels.)",
        result.defender_losses, result.attacker_losses, result.duels
    );
    chronicle.record(defender.id, StoryKind::Combat, to_defender + &losses);
}
