//! Genes, alleles, and the breeding engine.
//!
//! A torb carries one [`Gene`] per configured trait. Each gene is a short
//! list of numeric alleles; which allele is "active" is decided by random
//! draws at use sites, so allele order carries no meaning.

mod breeding;
mod gene;

use std::collections::BTreeMap;

pub use breeding::{max_hp_for, BreedingError, EvolutionEngine, Offspring};
pub use gene::Gene;

/// Trait driving max hp and resilience.
pub const VITALITY: &str = "vitality";
/// Trait driving resilience.
pub const STURDINESS: &str = "sturdiness";
/// Trait driving power and duel speed.
pub const AGILITY: &str = "agility";
/// Trait driving power.
pub const STRENGTH: &str = "strength";

/// Traits the army engine reads; every gene list must include them.
pub const COMBAT_GENES: [&str; 4] = [VITALITY, STURDINESS, AGILITY, STRENGTH];

/// All genes of one torb, keyed by trait name.
pub type Genome = BTreeMap<String, Gene>;
