//! Rule-output genomes and their genetic operators.
//!
//! A [`RuleGenome`] is one consequent-term index per rule, in the order given
//! by [`rule_index`](crate::rules::rule_index). It is the whole searchable
//! state: decoding it yields exactly one fuzzy controller.

use rand::Rng;
use serde::{Deserialize, Serialize};
use symbios_genetics::Genotype;
use thiserror::Error;

use crate::partition::TERM_COUNT;
use crate::rules::RULE_COUNT;

/// Error type for genomes that cannot be decoded into a rule base.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenomeError {
    /// The genome does not have one gene per rule.
    #[error("genome has {actual} genes, expected {expected}")]
    WrongLength {
        /// Required gene count.
        expected: usize,
        /// Gene count found.
        actual: usize,
    },
    /// A gene does not name an output term.
    #[error("gene {index} has value {value}, expected a term index below {}", TERM_COUNT)]
    GeneOutOfRange {
        /// Position of the offending gene.
        index: usize,
        /// Its value.
        value: u8,
    },
}

/// Consequent-term assignment for every rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleGenome {
    /// One output-term index per rule.
    pub genes: Vec<u8>,
}

impl RuleGenome {
    /// Wrap raw genes without checking them.
    ///
    /// Malformed genomes are legal values; they fail at decode time. Use
    /// [`validate`](Self::validate) to check eagerly.
    #[must_use]
    pub const fn new(genes: Vec<u8>) -> Self {
        Self { genes }
    }

    /// Every rule pointing at the same output term.
    #[must_use]
    pub fn uniform(term: u8) -> Self {
        Self {
            genes: vec![term; RULE_COUNT],
        }
    }

    /// A genome with every gene drawn uniformly from the output terms.
    #[must_use]
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            genes: (0..RULE_COUNT).map(|_| random_term(rng)).collect(),
        }
    }

    /// Check length and gene range.
    ///
    /// # Errors
    ///
    /// Returns the first [`GenomeError`] found.
    pub fn validate(&self) -> Result<(), GenomeError> {
        if self.genes.len() != RULE_COUNT {
            return Err(GenomeError::WrongLength {
                expected: RULE_COUNT,
                actual: self.genes.len(),
            });
        }
        match self
            .genes
            .iter()
            .position(|&g| usize::from(g) >= TERM_COUNT)
        {
            Some(index) => Err(GenomeError::GeneOutOfRange {
                index,
                value: self.genes[index],
            }),
            None => Ok(()),
        }
    }

    /// Number of genes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Whether there are no genes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Child taking each gene from either parent with equal probability.
    #[must_use]
    pub fn uniform_crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        Self {
            genes: self
                .genes
                .iter()
                .zip(&other.genes)
                .map(|(&a, &b)| if rng.random::<bool>() { a } else { b })
                .collect(),
        }
    }

    /// Number of positions where the genomes differ.
    #[must_use]
    pub fn distance(&self, other: &Self) -> usize {
        self.genes
            .iter()
            .zip(&other.genes)
            .filter(|(a, b)| a != b)
            .count()
            + self.genes.len().abs_diff(other.genes.len())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn random_term<R: Rng>(rng: &mut R) -> u8 {
    rng.random_range(0..TERM_COUNT as u8)
}

impl Genotype for RuleGenome {
    /// Reset each gene to a fresh uniform term with probability `rate`.
    fn mutate<R: Rng>(&mut self, rng: &mut R, rate: f32) {
        for gene in &mut self.genes {
            if rng.random::<f32>() < rate {
                *gene = random_term(rng);
            }
        }
    }

    /// Single-point crossover: `self` up to a random cut, `other` after it.
    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        let len = self.genes.len().min(other.genes.len());
        if len == 0 {
            return self.clone();
        }
        let cut = rng.random_range(0..len);
        let mut genes = self.genes[..cut].to_vec();
        genes.extend_from_slice(&other.genes[cut..len]);
        Self { genes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_random_genome_is_valid() {
        let mut rng = test_rng();
        for _ in 0..20 {
            let genome = RuleGenome::random(&mut rng);
            assert_eq!(genome.len(), RULE_COUNT);
            assert!(genome.validate().is_ok());
        }
    }

    #[test]
    fn test_random_genome_uses_every_term() {
        let mut rng = test_rng();
        let genome = RuleGenome::random(&mut rng);
        for term in 0..TERM_COUNT as u8 {
            assert!(genome.genes.contains(&term), "term {} never drawn", term);
        }
    }

    #[test]
    fn test_validate_errors() {
        let short = RuleGenome::new(vec![0; 10]);
        assert_eq!(
            short.validate(),
            Err(GenomeError::WrongLength {
                expected: RULE_COUNT,
                actual: 10
            })
        );

        let mut bad = RuleGenome::uniform(2);
        bad.genes[7] = 5;
        assert_eq!(
            bad.validate(),
            Err(GenomeError::GeneOutOfRange { index: 7, value: 5 })
        );
        assert!(bad.validate().unwrap_err().to_string().contains("gene 7"));
    }

    #[test]
    fn test_mutation_rate_bounds() {
        let mut rng = test_rng();
        let original = RuleGenome::random(&mut rng);

        let mut unchanged = original.clone();
        unchanged.mutate(&mut rng, 0.0);
        assert_eq!(unchanged, original);

        let mut mutated = original.clone();
        mutated.mutate(&mut rng, 1.0);
        assert!(mutated.validate().is_ok());
        // Every gene redrawn: roughly 4/5 should differ.
        assert!(mutated.distance(&original) > RULE_COUNT / 2);
    }

    #[test]
    fn test_single_point_crossover() {
        let mut rng = test_rng();
        let a = RuleGenome::uniform(0);
        let b = RuleGenome::uniform(4);

        for _ in 0..20 {
            let child = a.crossover(&b, &mut rng);
            assert_eq!(child.len(), RULE_COUNT);
            let cut = child.genes.iter().position(|&g| g == 4).unwrap_or(RULE_COUNT);
            assert!(child.genes[..cut].iter().all(|&g| g == 0));
            assert!(child.genes[cut..].iter().all(|&g| g == 4));
        }
    }

    #[test]
    fn test_uniform_crossover_mixes_parents() {
        let mut rng = test_rng();
        let a = RuleGenome::uniform(1);
        let b = RuleGenome::uniform(3);
        let child = a.uniform_crossover(&b, &mut rng);

        assert_eq!(child.len(), RULE_COUNT);
        assert!(child.genes.iter().all(|&g| g == 1 || g == 3));
        assert!(child.genes.contains(&1));
        assert!(child.genes.contains(&3));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut rng = test_rng();
        let genome = RuleGenome::random(&mut rng);
        let json = serde_json::to_string(&genome).expect("Serialization failed");
        let restored: RuleGenome = serde_json::from_str(&json).expect("Deserialization failed");
        assert_eq!(genome, restored);
    }
}
