//! Colonies and the per-round phase pipeline.
//!
//! A round runs in two halves around the cross-colony army phase:
//!
//! 1. [`Colony::begin_round`]: reset fertility, grow newborns, resolve
//!    breeding pairs, rest, enlist recruits and purge the army.
//! 2. Scouting and attacks, driven by [`crate::combat`].
//! 3. [`Colony::finish_round`]: gather, eat, and write the year summary.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::AiProfile;
use crate::army::{Army, ArmySummary, ArmyTorb};
use crate::config::{ArmyConfig, ColonyConfig};
use crate::error::{GameError, ParticipantIssue, Result, TargetIssue};
use crate::genetics::EvolutionEngine;
use crate::ids::{ColonyId, TorbId, TorbIdAllocator, TorbTag};
use crate::math::{hash_f64, round_to_int};
use crate::names;
use crate::narrative::{Chronicle, StoryKind};
use crate::torb::{Action, Torb};

/// Who issues a colony's orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Controller {
    /// A human player.
    Human {
        /// Player handle.
        player: String,
    },
    /// The built-in AI with a strategy profile.
    Ai(AiProfile),
}

impl Controller {
    /// Whether the AI drives this colony.
    #[must_use]
    pub const fn is_ai(&self) -> bool {
        matches!(self, Self::Ai(_))
    }

    /// The AI profile, if any.
    #[must_use]
    pub const fn ai_profile(&self) -> Option<&AiProfile> {
        match self {
            Self::Ai(profile) => Some(profile),
            Self::Human { .. } => None,
        }
    }
}

impl Hash for Controller {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Human { player } => {
                0u8.hash(state);
                player.hash(state);
            }
            Self::Ai(profile) => {
                1u8.hash(state);
                profile.name.hash(state);
            }
        }
    }
}

/// What happened at the colony meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealOutcome {
    /// Torbs that ate (and the food consumed).
    pub ate: u32,
    /// Torbs that went hungry.
    pub hungry: u32,
}

/// Per-colony numbers reported after each round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonySummary {
    /// Colony ID.
    pub id: ColonyId,
    /// Colony name.
    pub name: String,
    /// Food in stock.
    pub food: u32,
    /// Living torbs.
    pub living: usize,
    /// Dead torbs.
    pub dead: usize,
    /// Living torbs that are still growing.
    pub growing: usize,
    /// Living torbs flagged starving.
    pub starving: usize,
    /// Highest generation among living torbs.
    pub max_generation: u32,
    /// Army numbers.
    pub army: ArmySummary,
}

/// A population of torbs with its food stock and army.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Colony {
    /// Identifier, also the colony's position in the game.
    pub id: ColonyId,
    /// Display name, unique within a game.
    pub name: String,
    /// Who gives orders.
    pub controller: Controller,
    /// Food in stock.
    pub food: u32,
    /// Whether the colony has ended its turn.
    pub ready: bool,
    /// Food per gathering torb.
    pub gather_rate: f64,
    /// Flat hp restored by resting.
    pub rest_heal_flat: u32,
    /// Fraction of max hp restored by resting.
    pub rest_heal_perc: f64,
    /// The colony's army.
    pub army: Army,
    torbs: BTreeMap<TorbId, Torb>,
    generation_counts: BTreeMap<u32, u32>,
    discovered: BTreeSet<ColonyId>,
}

impl Colony {
    /// An empty colony with the configured economy.
    #[must_use]
    pub fn new(
        id: ColonyId,
        name: impl Into<String>,
        controller: Controller,
        colony: &ColonyConfig,
        army: &ArmyConfig,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            controller,
            food: colony.starting_food,
            ready: false,
            gather_rate: colony.gather_rate,
            rest_heal_flat: colony.rest_heal_flat,
            rest_heal_perc: colony.rest_heal_perc,
            army: Army::new(army.starting_morale),
            torbs: BTreeMap::new(),
            generation_counts: BTreeMap::new(),
            discovered: BTreeSet::new(),
        }
    }

    /// Seed `count` generation-zero torbs with random genes.
    pub fn seed_founders<R: Rng + ?Sized>(
        &mut self,
        count: u32,
        engine: &EvolutionEngine,
        ids: &mut TorbIdAllocator,
        rng: &mut R,
    ) {
        for _ in 0..count {
            let genes = engine.protogenesis(rng);
            let tag = self.next_tag(0);
            let name = names::torb_name(rng);
            let torb = Torb::new(ids.allocate(), tag, name, self.id, genes);
            debug!(colony = %self.id, torb = %torb.id, %tag, max_hp = torb.max_hp, "Founder created");
            self.torbs.insert(torb.id, torb);
        }
    }

    fn next_tag(&mut self, generation: u32) -> TorbTag {
        let count = self.generation_counts.entry(generation).or_insert(0);
        *count += 1;
        TorbTag::new(generation, *count)
    }

    /// Add a torb built elsewhere, assigning it the next tag of its
    /// generation.
    pub fn adopt(&mut self, mut torb: Torb) -> TorbId {
        torb.tag = self.next_tag(torb.tag.generation);
        torb.colony = self.id;
        let id = torb.id;
        self.torbs.insert(id, torb);
        id
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All torbs, dead included, in ascending ID order.
    pub fn torbs(&self) -> impl Iterator<Item = &Torb> {
        self.torbs.values()
    }

    /// The torb map.
    #[must_use]
    pub fn torb_map(&self) -> &BTreeMap<TorbId, Torb> {
        &self.torbs
    }

    /// A torb by ID.
    #[must_use]
    pub fn torb(&self, id: TorbId) -> Option<&Torb> {
        self.torbs.get(&id)
    }

    #[cfg(test)]
    pub(crate) fn torb_mut(&mut self, id: TorbId) -> Option<&mut Torb> {
        self.torbs.get_mut(&id)
    }

    /// A torb by its player-facing tag.
    #[must_use]
    pub fn torb_by_tag(&self, tag: TorbTag) -> Option<&Torb> {
        self.torbs.values().find(|t| t.tag == tag)
    }

    /// Resolve tags to torb IDs; any unknown tag fails the whole list.
    pub fn resolve_tags(&self, tags: &[TorbTag]) -> Result<Vec<TorbId>> {
        tags.iter()
            .map(|tag| {
                self.torb_by_tag(*tag)
                    .map(|t| t.id)
                    .ok_or_else(|| GameError::InvalidTorbTag(tag.to_string()))
            })
            .collect()
    }

    /// Number of torbs ever created here.
    #[must_use]
    pub fn torb_count(&self) -> usize {
        self.torbs.len()
    }

    /// Living torbs.
    pub fn living(&self) -> impl Iterator<Item = &Torb> {
        self.torbs.values().filter(|t| t.alive)
    }

    /// Number of living torbs.
    #[must_use]
    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    /// Living torbs currently doing `action`.
    #[must_use]
    pub fn count_action(&self, action: Action) -> usize {
        self.living().filter(|t| t.action == action).count()
    }

    /// Colonies this colony has discovered.
    #[must_use]
    pub fn discovered(&self) -> &BTreeSet<ColonyId> {
        &self.discovered
    }

    /// Whether `other` has been discovered.
    #[must_use]
    pub fn has_discovered(&self, other: ColonyId) -> bool {
        self.discovered.contains(&other)
    }

    /// Record `other` as discovered. A colony never discovers itself.
    pub fn discover(&mut self, other: ColonyId) -> bool {
        other != self.id && self.discovered.insert(other)
    }

    /// Army numbers.
    #[must_use]
    pub fn army_summary(&self, precision: u32) -> ArmySummary {
        self.army.summary(&self.torbs, precision)
    }

    /// Per-colony numbers for reports.
    #[must_use]
    pub fn summary(&self, precision: u32) -> ColonySummary {
        ColonySummary {
            id: self.id,
            name: self.name.clone(),
            food: self.food,
            living: self.living_count(),
            dead: self.torbs.len() - self.living_count(),
            growing: self.living().filter(|t| t.growing).count(),
            starving: self.living().filter(|t| t.starving).count(),
            max_generation: self.living().map(Torb::generation).max().unwrap_or(0),
            army: self.army_summary(precision),
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    fn member(&self, id: TorbId) -> Result<&Torb> {
        self.torbs
            .get(&id)
            .ok_or(GameError::participant(id, ParticipantIssue::NotInColony))
    }

    fn check_pairable(&self, id: TorbId, partner: TorbId) -> Result<()> {
        let torb = self.member(id)?;
        let issue = if id == partner {
            Some(ParticipantIssue::SameTorb)
        } else if !torb.alive {
            Some(ParticipantIssue::Dead)
        } else if torb.growing {
            Some(ParticipantIssue::Growing)
        } else {
            match torb.action {
                Action::Training | Action::Soldiering => {
                    Some(ParticipantIssue::Occupied(torb.action))
                }
                Action::Breeding if torb.context != Some(partner) => {
                    Some(ParticipantIssue::Occupied(Action::Breeding))
                }
                _ => None,
            }
        };
        issue.map_or(Ok(()), |issue| Err(GameError::participant(id, issue)))
    }

    /// Pair two torbs for breeding at the next round.
    ///
    /// Both torbs are checked before either changes.
    pub fn pair_for_breeding(&mut self, a: TorbId, b: TorbId) -> Result<()> {
        self.check_pairable(a, b)?;
        self.check_pairable(b, a)?;
        for (torb, partner) in [(a, b), (b, a)] {
            if let Some(t) = self.torbs.get_mut(&torb) {
                t.pair_with(partner);
            }
        }
        debug!(colony = %self.id, %a, %b, "Torbs paired for breeding");
        Ok(())
    }

    /// Reassign torbs to `action` in bulk.
    ///
    /// Only gathering, training and resting may be assigned. Every torb is
    /// checked before any changes. A torb leaving breeding unpairs its
    /// partner; a soldier leaving soldiering is discharged at once.
    pub fn assign_action(&mut self, torbs: &[TorbId], action: Action) -> Result<()> {
        if !action.is_assignable() {
            return Err(GameError::InvalidOrder(format!(
                "'{action}' cannot be assigned directly"
            )));
        }
        if torbs.is_empty() {
            return Err(GameError::InvalidOrder("no torbs named".to_string()));
        }
        for &id in torbs {
            let torb = self.member(id)?;
            if !torb.alive {
                return Err(GameError::participant(id, ParticipantIssue::Dead));
            }
            if torb.growing {
                return Err(GameError::participant(id, ParticipantIssue::Growing));
            }
        }

        for &id in torbs {
            self.set_torb_action(id, action);
        }
        debug!(colony = %self.id, count = torbs.len(), %action, "Torbs reassigned");
        Ok(())
    }

    /// Change one torb's action, keeping pairings and the army consistent.
    fn set_torb_action(&mut self, id: TorbId, action: Action) {
        let Some(torb) = self.torbs.get_mut(&id) else {
            return;
        };
        let previous = torb.action;
        let partner = torb.partner();
        if !torb.request_action(action, None) {
            return;
        }
        if previous == Action::Soldiering && action != Action::Soldiering {
            self.army.discharge(id);
        }
        if let Some(partner) = partner {
            self.unpair(partner, id);
        }
    }

    /// Send `partner` back to gathering if it is still paired with `with`.
    fn unpair(&mut self, partner: TorbId, with: TorbId) {
        if let Some(p) = self.torbs.get_mut(&partner) {
            if p.partner() == Some(with) {
                p.request_action(Action::Gathering, None);
            }
        }
    }

    /// Set or clear the scout target. Self-targeting is refused.
    pub fn set_scout_target(&mut self, target: Option<ColonyId>) -> Result<()> {
        if let Some(target) = target {
            self.check_target(target, false)?;
        }
        self.army.scout_target = target;
        Ok(())
    }

    /// Set or clear the attack target. The target must have been discovered.
    pub fn set_attack_target(&mut self, target: Option<ColonyId>) -> Result<()> {
        if let Some(target) = target {
            self.check_target(target, true)?;
        }
        self.army.attack_target = target;
        Ok(())
    }

    fn check_target(&self, target: ColonyId, must_know: bool) -> Result<()> {
        let refuse = |reason| GameError::InvalidTarget {
            colony: self.id,
            target,
            reason,
        };
        if target == self.id {
            return Err(refuse(TargetIssue::SelfTarget));
        }
        if must_know && !self.has_discovered(target) {
            return Err(refuse(TargetIssue::Undiscovered));
        }
        Ok(())
    }

    /// Mark the colony ready. Returns `false` if it already was.
    pub fn ready_up(&mut self) -> bool {
        if self.ready {
            return false;
        }
        self.ready = true;
        info!(colony = %self.id, name = %self.name, "Colony readied up");
        true
    }

    // ------------------------------------------------------------------
    // Round phases
    // ------------------------------------------------------------------

    /// Apply an hp change to one torb, handling death bookkeeping.
    ///
    /// On death the torb leaves the army, its breeding partner is unpaired,
    /// and a death entry naming `cause` is written.
    pub fn adjust_torb_hp(
        &mut self,
        id: TorbId,
        delta: i64,
        cause: &str,
        chronicle: &mut Chronicle,
    ) -> Result<bool> {
        let torb = self.torbs.get_mut(&id).ok_or(GameError::UnknownTorb(id))?;
        let partner = torb.partner();
        if !torb.adjust_hp(delta) {
            return Ok(false);
        }
        let text = format!("'{}' (Torb {}) died from {cause}.", torb.name, torb.tag);
        chronicle.record(self.id, StoryKind::Death, text);
        self.army.discharge(id);
        if let Some(partner) = partner {
            self.unpair(partner, id);
        }
        Ok(true)
    }

    /// First half of a round: every phase before the army acts abroad.
    pub fn begin_round<R: Rng + ?Sized>(
        &mut self,
        engine: &EvolutionEngine,
        army: &ArmyConfig,
        ids: &mut TorbIdAllocator,
        chronicle: &mut Chronicle,
        rng: &mut R,
    ) {
        self.reset_fertility();
        self.grow();
        self.resolve_breeding(engine, ids, chronicle, rng);
        self.rest(chronicle);
        self.train_soldiers(army.stat_precision, rng);
        self.army.purge(&self.torbs);
    }

    /// Second half of a round: purge, gather, eat, and summarise.
    pub fn finish_round<R: Rng + ?Sized>(
        &mut self,
        round: u32,
        chronicle: &mut Chronicle,
        rng: &mut R,
    ) -> MealOutcome {
        self.army.purge(&self.torbs);
        self.army.clear_targets();
        self.gather(chronicle);
        let meal = self.colony_meal(chronicle, rng);
        chronicle.record(self.id, StoryKind::System, format!("It is now year {round}."));
        meal
    }

    /// Every living, non-growing torb becomes fertile.
    pub fn reset_fertility(&mut self) {
        for torb in self.torbs.values_mut().filter(|t| t.is_active()) {
            torb.fertile = true;
        }
    }

    /// Newborns finish growing and start gathering. Returns how many grew.
    pub fn grow(&mut self) -> usize {
        let mut grown = 0;
        for torb in self.torbs.values_mut().filter(|t| t.alive && t.growing) {
            torb.growing = false;
            torb.action = Action::Gathering;
            grown += 1;
        }
        grown
    }

    /// Breed every mutually paired couple. Returns the newborns' IDs.
    ///
    /// Both parents return to gathering whether or not breeding succeeded.
    /// A half-pairing (partner missing or paired elsewhere) is logged and
    /// skipped.
    pub fn resolve_breeding<R: Rng + ?Sized>(
        &mut self,
        engine: &EvolutionEngine,
        ids: &mut TorbIdAllocator,
        chronicle: &mut Chronicle,
        rng: &mut R,
    ) -> Vec<TorbId> {
        let mut checked = BTreeSet::new();
        let mut born = Vec::new();
        let breeders: Vec<(TorbId, Option<TorbId>)> = self
            .torbs
            .values()
            .filter(|t| t.alive && t.action == Action::Breeding)
            .map(|t| (t.id, t.context))
            .collect();

        for (id, context) in breeders {
            if checked.contains(&id) {
                continue;
            }
            checked.insert(id);
            let Some(partner_id) = context else {
                warn!(colony = %self.id, torb = %id, "Breeding torb has no partner, skipping");
                self.set_torb_action(id, Action::Gathering);
                continue;
            };
            checked.insert(partner_id);

            let paired_back = self
                .torbs
                .get(&partner_id)
                .is_some_and(|p| p.partner() == Some(id));
            if !paired_back {
                warn!(colony = %self.id, torb = %id, partner = %partner_id, "Breeding partner is not paired back, skipping");
                self.set_torb_action(id, Action::Gathering);
                continue;
            }

            let (Some(parent0), Some(parent1)) = (self.torbs.get(&id), self.torbs.get(&partner_id))
            else {
                continue;
            };
            match engine.breed(parent0, parent1, rng) {
                Ok(offspring) => {
                    let tag = self.next_tag(offspring.generation);
                    let name = names::torb_name(rng);
                    let child = Torb::newborn(ids.allocate(), tag, name, self.id, offspring);
                    chronicle.record(
                        self.id,
                        StoryKind::Breeding,
                        format!("A new Torb, '{}', was born", child.name),
                    );
                    debug!(colony = %self.id, child = %child.id, %tag, "Torb born");
                    born.push(child.id);
                    self.torbs.insert(child.id, child);
                    for parent in [id, partner_id] {
                        if let Some(p) = self.torbs.get_mut(&parent) {
                            p.fertile = false;
                        }
                    }
                }
                Err(err) => {
                    warn!(colony = %self.id, torb = %id, partner = %partner_id, error = %err, "Breeding refused");
                }
            }
            for parent in [id, partner_id] {
                if let Some(p) = self.torbs.get_mut(&parent) {
                    p.request_action(Action::Gathering, None);
                }
            }
        }
        born
    }

    /// Resting torbs that are not starving heal
    /// `round(rest_heal_flat + rest_heal_perc * max_hp)`. Returns how many
    /// rested.
    pub fn rest(&mut self, chronicle: &mut Chronicle) -> usize {
        let resting: Vec<(TorbId, u32)> = self
            .living()
            .filter(|t| t.action == Action::Resting && !t.starving)
            .map(|t| (t.id, t.max_hp))
            .collect();
        for &(id, max_hp) in &resting {
            let amount = round_to_int(
                f64::from(self.rest_heal_flat) + self.rest_heal_perc * f64::from(max_hp),
            );
            if let Err(err) = self.adjust_torb_hp(id, amount, "resting", chronicle) {
                warn!(colony = %self.id, torb = %id, error = %err, "Rest skipped torb");
            }
        }
        resting.len()
    }

    /// Recruits in training become trained soldiers and join the army.
    pub fn train_soldiers<R: Rng + ?Sized>(&mut self, precision: u32, rng: &mut R) -> usize {
        let mut enlisted = 0;
        for torb in self
            .torbs
            .values_mut()
            .filter(|t| t.alive && t.action == Action::Training)
        {
            torb.trained = true;
            torb.action = Action::Soldiering;
            match ArmyTorb::enlist(torb, precision, rng) {
                Some(entry) => {
                    self.army.insert(entry);
                    enlisted += 1;
                }
                None => {
                    warn!(colony = %self.id, torb = %torb.id, "Torb lacks combat genes, not enlisted");
                    torb.action = Action::Gathering;
                }
            }
        }
        enlisted
    }

    /// Gatherers add `round(count * gather_rate)` food. Returns the amount.
    pub fn gather(&mut self, chronicle: &mut Chronicle) -> u32 {
        let gatherers = self.count_action(Action::Gathering);
        let gathered =
            u32::try_from(round_to_int(gatherers as f64 * self.gather_rate).max(0)).unwrap_or(0);
        self.food = self.food.saturating_add(gathered);
        chronicle.record(
            self.id,
            StoryKind::Food,
            format!("Your Torbs gathered {gathered} food."),
        );
        gathered
    }

    /// Feed living torbs from stock.
    ///
    /// If there is less food than living torbs, `living - food` of them are
    /// chosen at random to go hungry: they are flagged starving and lose 1
    /// hp. Everyone else eats one food, clears starving and gains 1 hp.
    pub fn colony_meal<R: Rng + ?Sized>(
        &mut self,
        chronicle: &mut Chronicle,
        rng: &mut R,
    ) -> MealOutcome {
        let living: Vec<TorbId> = self.living().map(|t| t.id).collect();
        let shortfall = living.len().saturating_sub(self.food as usize);
        let hungry: BTreeSet<TorbId> = living.choose_multiple(rng, shortfall).copied().collect();

        let mut ate = 0u32;
        for id in living {
            let starving = hungry.contains(&id);
            if let Some(torb) = self.torbs.get_mut(&id) {
                torb.starving = starving;
            }
            let delta = if starving { -1 } else { 1 };
            if !starving {
                ate += 1;
            }
            if let Err(err) = self.adjust_torb_hp(id, delta, "starvation", chronicle) {
                warn!(colony = %self.id, torb = %id, error = %err, "Meal skipped torb");
            }
        }

        self.food = self.food.saturating_sub(ate);
        let hungry = u32::try_from(hungry.len()).unwrap_or(u32::MAX);
        chronicle.record(
            self.id,
            StoryKind::Food,
            format!("Your Torbs ate {ate} food and {hungry} went hungry."),
        );
        MealOutcome { ate, hungry }
    }
}

impl Hash for Colony {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
        self.controller.hash(state);
        self.food.hash(state);
        self.ready.hash(state);
        hash_f64(self.gather_rate, state);
        self.rest_heal_flat.hash(state);
        hash_f64(self.rest_heal_perc, state);
        self.army.hash(state);
        for torb in self.torbs.values() {
            torb.hash(state);
        }
        self.generation_counts.hash(state);
        self.discovered.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EvolutionConfig, GameConfig};
    use crate::genetics::{Gene, Genome, COMBAT_GENES};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn human() -> Controller {
        Controller::Human {
            player: "tester".to_string(),
        }
    }

    fn genes(vitality: f64) -> Genome {
        COMBAT_GENES
            .iter()
            .map(|g| {
                let value = if *g == crate::genetics::VITALITY {
                    vitality
                } else {
                    5.0
                };
                ((*g).to_string(), Gene::new(vec![value, value]))
            })
            .collect()
    }

    /// A colony with `n` founders of fixed vitality.
    fn colony_with(n: u64, vitality: f64) -> Colony {
        let config = GameConfig::default();
        let mut colony = Colony::new(ColonyId(0), "Test", human(), &config.colony, &config.army);
        for id in 1..=n {
            let torb = Torb::new(TorbId(id), TorbTag::new(0, 0), "T", ColonyId(0), genes(vitality));
            colony.adopt(torb);
        }
        colony
    }

    fn engine() -> EvolutionEngine {
        EvolutionEngine::new(&EvolutionConfig::default()).unwrap()
    }

    #[test]
    fn test_seed_founders() {
        let config = GameConfig::default();
        let mut colony = Colony::new(ColonyId(3), "Seeded", human(), &config.colony, &config.army);
        let mut ids = TorbIdAllocator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        colony.seed_founders(4, &engine(), &mut ids, &mut rng);

        assert_eq!(colony.living_count(), 4);
        let tags: Vec<String> = colony.torbs().map(|t| t.tag.to_string()).collect();
        assert_eq!(tags, vec!["00-01", "00-02", "00-03", "00-04"]);
        assert!(colony.torbs().all(|t| t.hp == t.max_hp && t.colony == ColonyId(3)));
    }

    #[test]
    fn test_meal_scenario_five_torbs_three_food() {
        let mut colony = colony_with(5, 6.0);
        for torb in colony.torbs.values_mut() {
            torb.hp = 4;
        }
        colony.food = 3;
        let mut log = Chronicle::new();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let meal = colony.colony_meal(&mut log, &mut rng);

        assert_eq!(meal, MealOutcome { ate: 3, hungry: 2 });
        assert_eq!(colony.food, 0);
        let starving: Vec<_> = colony.torbs().filter(|t| t.starving).collect();
        assert_eq!(starving.len(), 2);
        assert!(starving.iter().all(|t| t.hp == 3));
        assert!(colony.torbs().filter(|t| !t.starving).all(|t| t.hp == 5));
        assert_eq!(
            log.entries().last().unwrap().text,
            "Your Torbs ate 3 food and 2 went hungry."
        );
    }

    #[test]
    fn test_meal_heal_capped_at_max() {
        let mut colony = colony_with(2, 6.0);
        colony.food = 10;
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        colony.colony_meal(&mut Chronicle::new(), &mut rng);
        assert!(colony.torbs().all(|t| t.hp == 6 && !t.starving));
        assert_eq!(colony.food, 8);
    }

    #[test]
    fn test_starvation_death_is_chronicled() {
        let mut colony = colony_with(1, 1.0);
        colony.food = 0;
        let mut log = Chronicle::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        colony.colony_meal(&mut log, &mut rng);

        let torb = colony.torb(TorbId(1)).unwrap();
        assert!(!torb.alive);
        assert!(log
            .entries()
            .iter()
            .any(|e| e.kind == StoryKind::Death && e.text.contains("died from starvation")));
    }

    #[test]
    fn test_gather_rounds_half_to_even() {
        let mut colony = colony_with(5, 6.0);
        colony.food = 0;
        let gathered = colony.gather(&mut Chronicle::new());
        assert_eq!(gathered, 8);
        assert_eq!(colony.food, 8);
    }

    #[test]
    fn test_rest_heals_flat_plus_percent() {
        let mut colony = colony_with(1, 10.0);
        let torb = colony.torb_mut(TorbId(1)).unwrap();
        torb.hp = 1;
        torb.action = Action::Resting;
        colony.rest(&mut Chronicle::new());
        // round(2 + 0.2 * 10) = 4
        assert_eq!(colony.torb(TorbId(1)).unwrap().hp, 5);
    }

    #[test]
    fn test_starving_torbs_do_not_rest() {
        let mut colony = colony_with(1, 10.0);
        let torb = colony.torb_mut(TorbId(1)).unwrap();
        torb.hp = 1;
        torb.starving = true;
        torb.action = Action::Resting;
        colony.rest(&mut Chronicle::new());
        assert_eq!(colony.torb(TorbId(1)).unwrap().hp, 1);
    }

    #[test]
    fn test_pairing_is_symmetric_and_checked_first() {
        let mut colony = colony_with(3, 6.0);
        colony.pair_for_breeding(TorbId(1), TorbId(2)).unwrap();
        assert_eq!(colony.torb(TorbId(1)).unwrap().partner(), Some(TorbId(2)));
        assert_eq!(colony.torb(TorbId(2)).unwrap().partner(), Some(TorbId(1)));

        // Torb 2 is taken; torb 3 must stay untouched.
        let err = colony.pair_for_breeding(TorbId(3), TorbId(2)).unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidParticipant {
                torb: TorbId(2),
                issue: ParticipantIssue::Occupied(Action::Breeding)
            }
        ));
        assert_eq!(colony.torb(TorbId(3)).unwrap().action, Action::Gathering);
    }

    #[test]
    fn test_pairing_rejects_soldier_and_self() {
        let mut colony = colony_with(2, 6.0);
        colony.torb_mut(TorbId(2)).unwrap().action = Action::Soldiering;
        assert!(colony.pair_for_breeding(TorbId(1), TorbId(2)).is_err());
        assert!(matches!(
            colony.pair_for_breeding(TorbId(1), TorbId(1)),
            Err(GameError::InvalidParticipant {
                issue: ParticipantIssue::SameTorb,
                ..
            })
        ));
        assert_eq!(colony.torb(TorbId(1)).unwrap().action, Action::Gathering);
    }

    #[test]
    fn test_leaving_breeding_unpairs_partner() {
        let mut colony = colony_with(2, 6.0);
        colony.pair_for_breeding(TorbId(1), TorbId(2)).unwrap();
        colony.assign_action(&[TorbId(1)], Action::Training).unwrap();
        let partner = colony.torb(TorbId(2)).unwrap();
        assert_eq!(partner.action, Action::Gathering);
        assert_eq!(partner.context, None);
    }

    #[test]
    fn test_assign_validates_all_before_changing() {
        let mut colony = colony_with(2, 6.0);
        colony.torb_mut(TorbId(2)).unwrap().adjust_hp(-100);
        let err = colony
            .assign_action(&[TorbId(1), TorbId(2)], Action::Training)
            .unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidParticipant {
                torb: TorbId(2),
                issue: ParticipantIssue::Dead
            }
        ));
        assert_eq!(colony.torb(TorbId(1)).unwrap().action, Action::Gathering);
    }

    #[test]
    fn test_assign_rejects_unassignable_and_foreign() {
        let mut colony = colony_with(1, 6.0);
        assert!(matches!(
            colony.assign_action(&[TorbId(1)], Action::Soldiering),
            Err(GameError::InvalidOrder(_))
        ));
        assert!(matches!(
            colony.assign_action(&[TorbId(99)], Action::Gathering),
            Err(GameError::InvalidParticipant {
                issue: ParticipantIssue::NotInColony,
                ..
            })
        ));
        assert!(colony.assign_action(&[], Action::Gathering).is_err());
    }

    #[test]
    fn test_training_enlists_and_gathering_discharges() {
        let mut colony = colony_with(2, 6.0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        colony.assign_action(&[TorbId(1)], Action::Training).unwrap();
        assert_eq!(colony.train_soldiers(2, &mut rng), 1);
        assert!(colony.army.contains(TorbId(1)));
        assert!(colony.torb(TorbId(1)).unwrap().trained);

        colony.assign_action(&[TorbId(1)], Action::Gathering).unwrap();
        assert!(colony.army.is_empty());
    }

    #[test]
    fn test_breeding_round_produces_growing_child() {
        let mut colony = colony_with(2, 6.0);
        let mut ids = TorbIdAllocator::new();
        for _ in 0..2 {
            ids.allocate();
        }
        let mut log = Chronicle::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        colony.pair_for_breeding(TorbId(1), TorbId(2)).unwrap();

        let born = colony.resolve_breeding(&engine(), &mut ids, &mut log, &mut rng);

        assert_eq!(born.len(), 1);
        let child = colony.torb(born[0]).unwrap();
        assert!(child.growing);
        assert_eq!(child.action, Action::Growing);
        assert_eq!(child.tag, TorbTag::new(1, 1));
        for parent in [TorbId(1), TorbId(2)] {
            let p = colony.torb(parent).unwrap();
            assert!(!p.fertile);
            assert_eq!(p.action, Action::Gathering);
        }
        assert!(log.entries()[0].text.starts_with("A new Torb"));
    }

    #[test]
    fn test_growing_child_ignores_orders_until_grown() {
        let mut colony = colony_with(2, 6.0);
        let mut ids = TorbIdAllocator::new();
        ids.allocate();
        ids.allocate();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        colony.pair_for_breeding(TorbId(1), TorbId(2)).unwrap();
        let child = colony.resolve_breeding(&engine(), &mut ids, &mut Chronicle::new(), &mut rng)[0];

        assert!(colony.assign_action(&[child], Action::Training).is_err());
        assert_eq!(colony.grow(), 1);
        assert!(colony.assign_action(&[child], Action::Training).is_ok());
    }

    #[test]
    fn test_half_pairing_is_skipped() {
        let mut colony = colony_with(2, 6.0);
        colony.torb_mut(TorbId(1)).unwrap().pair_with(TorbId(2));
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let born = colony.resolve_breeding(
            &engine(),
            &mut TorbIdAllocator::new(),
            &mut Chronicle::new(),
            &mut rng,
        );
        assert!(born.is_empty());
        assert_eq!(colony.torb(TorbId(1)).unwrap().action, Action::Gathering);
    }

    #[test]
    fn test_death_removes_soldier_and_unpairs() {
        let mut colony = colony_with(3, 2.0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut log = Chronicle::new();
        colony.assign_action(&[TorbId(3)], Action::Training).unwrap();
        colony.train_soldiers(2, &mut rng);
        colony.pair_for_breeding(TorbId(1), TorbId(2)).unwrap();

        assert!(colony.adjust_torb_hp(TorbId(3), -5, "a test", &mut log).unwrap());
        assert!(colony.army.is_empty());
        assert!(colony.adjust_torb_hp(TorbId(1), -5, "a test", &mut log).unwrap());
        assert_eq!(colony.torb(TorbId(2)).unwrap().action, Action::Gathering);
    }

    #[test]
    fn test_targets() {
        let mut colony = colony_with(1, 6.0);
        assert!(matches!(
            colony.set_scout_target(Some(ColonyId(0))),
            Err(GameError::InvalidTarget {
                reason: TargetIssue::SelfTarget,
                ..
            })
        ));
        assert!(colony.set_scout_target(Some(ColonyId(1))).is_ok());
        assert!(matches!(
            colony.set_attack_target(Some(ColonyId(1))),
            Err(GameError::InvalidTarget {
                reason: TargetIssue::Undiscovered,
                ..
            })
        ));
        colony.discover(ColonyId(1));
        assert!(colony.set_attack_target(Some(ColonyId(1))).is_ok());
        assert!(colony.set_attack_target(None).is_ok());
        assert_eq!(colony.army.attack_target, None);
    }

    #[test]
    fn test_never_discovers_itself() {
        let mut colony = colony_with(1, 6.0);
        assert!(!colony.discover(ColonyId(0)));
        assert!(colony.discovered().is_empty());
    }

    #[test]
    fn test_ready_up_idempotent() {
        let mut colony = colony_with(1, 6.0);
        assert!(colony.ready_up());
        assert!(!colony.ready_up());
        assert!(colony.ready);
    }

    proptest! {
        #[test]
        fn prop_meal_starvation_count(living in 0u64..20, food in 0u32..30, seed in any::<u64>()) {
            let mut colony = colony_with(living, 9.0);
            colony.food = food;
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let meal = colony.colony_meal(&mut Chronicle::new(), &mut rng);

            let expected_hungry = (living as u32).saturating_sub(food);
            prop_assert_eq!(meal.hungry, expected_hungry);
            prop_assert_eq!(colony.torbs().filter(|t| t.starving).count() as u32, expected_hungry);
            prop_assert_eq!(colony.food, food.saturating_sub(living as u32 - expected_hungry));
        }
    }
}
