use std::hash::{Hash, Hasher};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::math::hash_f64;

/// The alleles of one trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    alleles: Vec<f64>,
}

impl Gene {
    /// Wrap a list of alleles.
    #[must_use]
    pub fn new(alleles: Vec<f64>) -> Self {
        Self { alleles }
    }

    /// Random founder gene: `count` integer alleles in `[min, max)`.
    pub fn random<R: Rng + ?Sized>(count: usize, min: u32, max: u32, rng: &mut R) -> Self {
        let alleles = (0..count)
            .map(|_| f64::from(rng.gen_range(min..max)))
            .collect();
        Self { alleles }
    }

    /// All alleles, in storage order.
    #[must_use]
    pub fn alleles(&self) -> &[f64] {
        &self.alleles
    }

    /// Number of alleles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    /// Whether the gene has no alleles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }

    /// Allele at a fixed position.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<f64> {
        self.alleles.get(idx).copied()
    }

    /// One allele chosen uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<f64> {
        self.alleles.choose(rng).copied()
    }

    /// A shuffled copy of the alleles.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let mut alleles = self.alleles.clone();
        alleles.shuffle(rng);
        alleles
    }
}

impl Hash for Gene {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.alleles.len().hash(state);
        for &allele in &self.alleles {
            hash_f64(allele, state);
        }
    }
}

impl std::fmt::Display for Gene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.alleles.iter().map(|a| format!("{a:.2}")).collect();
        write!(f, "[{}]", parts.join("|"))
    }
}
