//! The breeding engine: founder genes, inheritance, and mutation.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use thiserror::Error;
use tracing::debug;

use super::{Gene, Genome, VITALITY};
use crate::config::EvolutionConfig;
use crate::error::{GameError, ParticipantIssue, Result};
use crate::ids::TorbId;
use crate::math::{round_half_even, round_to};
use crate::torb::{Action, Torb};

/// Breeding refused before anything was changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BreedingError {
    /// One of the parents cannot breed.
    #[error("Torb {torb} cannot breed: it {issue}")]
    InvalidParents {
        /// The parent that failed the check.
        torb: TorbId,
        /// What is wrong with it.
        issue: ParticipantIssue,
    },

    /// A parent lacks a gene the engine is configured to breed.
    #[error("Torb {torb} has no '{gene}' gene")]
    MissingGene {
        /// The parent missing the gene.
        torb: TorbId,
        /// The configured trait name.
        gene: String,
    },
}

impl From<BreedingError> for GameError {
    fn from(err: BreedingError) -> Self {
        match err {
            BreedingError::InvalidParents { torb, issue } => Self::participant(torb, issue),
            BreedingError::MissingGene { .. } => Self::Configuration(err.to_string()),
        }
    }
}

/// Everything needed to create a child torb.
#[derive(Debug, Clone, PartialEq)]
pub struct Offspring {
    /// Inherited (and possibly mutated) genes.
    pub genes: Genome,
    /// `max(parent generations) + 1`.
    pub generation: u32,
    /// Derived from the first vitality allele.
    pub max_hp: u32,
    /// Number of alleles that mutated.
    pub mutations: usize,
}

/// Combines parents' genes into a child's genes.
///
/// The engine is pure: it reads both parents and returns the child's genes
/// without touching either parent. Applying the result (infertility,
/// spawning the child) is the colony's job, which makes a refused breeding
/// leave no trace.
#[derive(Debug, Clone)]
pub struct EvolutionEngine {
    config: EvolutionConfig,
    mutation: Normal<f64>,
}

impl EvolutionEngine {
    /// Build an engine for a config.
    pub fn new(config: &EvolutionConfig) -> Result<Self> {
        let mutation = Normal::new(0.0, config.mutation_dev)
            .map_err(|e| GameError::Configuration(format!("mutation_dev: {e}")))?;
        Ok(Self {
            config: config.clone(),
            mutation,
        })
    }

    /// The config this engine was built from.
    #[must_use]
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Random genes for a generation-zero torb.
    pub fn protogenesis<R: Rng + ?Sized>(&self, rng: &mut R) -> Genome {
        self.config
            .gene_list
            .iter()
            .map(|name| {
                let gene = Gene::random(
                    self.config.alleles_per_gene,
                    self.config.random_gene_min,
                    self.config.random_gene_max,
                    rng,
                );
                (name.clone(), gene)
            })
            .collect()
    }

    /// Check that `torb` may breed with `partner`.
    ///
    /// A torb already paired with `partner` is fine; paired with anyone
    /// else, or training, or soldiering, it is occupied.
    pub fn check_breedable(
        &self,
        torb: &Torb,
        partner: &Torb,
    ) -> std::result::Result<(), BreedingError> {
        let refuse = |issue| BreedingError::InvalidParents {
            torb: torb.id,
            issue,
        };
        if torb.id == partner.id {
            return Err(refuse(ParticipantIssue::SameTorb));
        }
        if !torb.alive {
            return Err(refuse(ParticipantIssue::Dead));
        }
        if torb.growing {
            return Err(refuse(ParticipantIssue::Growing));
        }
        if !torb.fertile {
            return Err(refuse(ParticipantIssue::Infertile));
        }
        match torb.action {
            Action::Training | Action::Soldiering => {
                Err(refuse(ParticipantIssue::Occupied(torb.action)))
            }
            Action::Breeding if torb.context != Some(partner.id) => {
                Err(refuse(ParticipantIssue::Occupied(Action::Breeding)))
            }
            _ => Ok(()),
        }
    }

    /// Breed two parents into a child's genes.
    pub fn breed<R: Rng + ?Sized>(
        &self,
        parent0: &Torb,
        parent1: &Torb,
        rng: &mut R,
    ) -> std::result::Result<Offspring, BreedingError> {
        self.check_breedable(parent0, parent1)?;
        self.check_breedable(parent1, parent0)?;

        let mut genes = Genome::new();
        let mut mutations = 0;
        for name in &self.config.gene_list {
            let gene0 = parent_gene(parent0, name)?;
            let gene1 = parent_gene(parent1, name)?;
            let inherited = self.inherit(gene0, gene1, rng);
            let (alleles, mutated) = self.mutate_and_shuffle(inherited, rng);
            mutations += mutated;
            genes.insert(name.clone(), Gene::new(alleles));
        }

        let generation = parent0.tag.generation.max(parent1.tag.generation) + 1;
        let max_hp = max_hp_for(&genes);
        debug!(
            parent0 = %parent0.id,
            parent1 = %parent1.id,
            generation,
            max_hp,
            mutations,
            "Bred offspring"
        );

        Ok(Offspring {
            genes,
            generation,
            max_hp,
            mutations,
        })
    }

    /// Inherit one gene before mutation.
    ///
    /// Both parents' alleles are shuffled. The first child allele is one of
    /// the two parents' first alleles; every later allele is the mean of
    /// the parents' alleles at that index. The child has as many alleles as
    /// the shorter parent gene.
    pub fn inherit<R: Rng + ?Sized>(&self, gene0: &Gene, gene1: &Gene, rng: &mut R) -> Vec<f64> {
        let p0 = gene0.shuffled(rng);
        let p1 = gene1.shuffled(rng);
        let count = p0.len().min(p1.len());

        (0..count)
            .map(|i| {
                let allele = if i == 0 {
                    if rng.gen_bool(0.5) {
                        p0[0]
                    } else {
                        p1[0]
                    }
                } else {
                    round_to((p0[i] + p1[i]) / 2.0, self.config.precision)
                };
                allele.max(self.config.min_allele)
            })
            .collect()
    }

    /// Mutate each allele with `mutation_chance`, then shuffle the list.
    ///
    /// A mutated allele becomes `allele * (1 + N(0, mutation_dev))`, rounded
    /// and floored like any bred allele. Returns the alleles and how many
    /// mutated.
    pub fn mutate_and_shuffle<R: Rng + ?Sized>(
        &self,
        alleles: Vec<f64>,
        rng: &mut R,
    ) -> (Vec<f64>, usize) {
        let threshold = 1.0 - self.config.mutation_chance;
        let mut mutated = 0;
        let mut out: Vec<f64> = alleles
            .into_iter()
            .map(|allele| {
                let roll: f64 = rng.gen();
                if roll >= threshold {
                    mutated += 1;
                    let amount = self.mutation.sample(rng);
                    round_to(allele * (1.0 + amount), self.config.precision)
                        .max(self.config.min_allele)
                } else {
                    allele
                }
            })
            .collect();
        out.shuffle(rng);
        (out, mutated)
    }
}

fn parent_gene<'a>(
    parent: &'a Torb,
    name: &str,
) -> std::result::Result<&'a Gene, BreedingError> {
    parent
        .genes
        .get(name)
        .ok_or_else(|| BreedingError::MissingGene {
            torb: parent.id,
            gene: name.to_string(),
        })
}

/// Max hp of a new torb: its first vitality allele, rounded, at least 1.
#[must_use]
pub fn max_hp_for(genes: &Genome) -> u32 {
    let allele = genes.get(VITALITY).and_then(|g| g.get(0)).unwrap_or(1.0);
    round_half_even(allele).max(1.0) as u32
}
