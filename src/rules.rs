//! The fixed-shape rule base.
//!
//! There is exactly one rule per combination of left, front and right input
//! terms. Rules are numbered by [`rule_index`], a base-[`TERM_COUNT`]
//! positional code with the left term most significant, so the gene for
//! "left is `l`, front is `f`, right is `r`" is always at the same position.

use serde::{Deserialize, Serialize};

use crate::genome::{GenomeError, RuleGenome};
use crate::partition::TERM_COUNT;

/// Number of antecedent inputs per rule.
pub const INPUT_COUNT: usize = 3;

/// Total rules: one per input-term combination.
pub const RULE_COUNT: usize = TERM_COUNT * TERM_COUNT * TERM_COUNT;

/// Position of the rule for `(left, front, right)` input terms.
///
/// # Panics
///
/// Debug builds panic if any term is `>= TERM_COUNT`.
#[inline]
#[must_use]
pub const fn rule_index(left: usize, front: usize, right: usize) -> usize {
    debug_assert!(left < TERM_COUNT && front < TERM_COUNT && right < TERM_COUNT);
    (left * TERM_COUNT + front) * TERM_COUNT + right
}

/// Inverse of [`rule_index`]: the `(left, front, right)` terms of rule `index`.
#[inline]
#[must_use]
pub const fn rule_terms(index: usize) -> [usize; INPUT_COUNT] {
    [
        index / (TERM_COUNT * TERM_COUNT),
        (index / TERM_COUNT) % TERM_COUNT,
        index % TERM_COUNT,
    ]
}

/// `IF left is a AND front is b AND right is c THEN steering is d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    /// Input term indices, `[left, front, right]`.
    pub antecedent: [usize; INPUT_COUNT],
    /// Output term index.
    pub consequent: usize,
}

/// All [`RULE_COUNT`] rules, in [`rule_index`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBase {
    rules: Vec<Rule>,
}

impl RuleBase {
    /// Decode a genome: rule `i` takes output term `genome.genes[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`GenomeError`] if the genome has the wrong length or a gene
    /// outside the output terms.
    pub fn from_genome(genome: &RuleGenome) -> Result<Self, GenomeError> {
        genome.validate()?;
        let rules = genome
            .genes
            .iter()
            .enumerate()
            .map(|(i, &gene)| Rule {
                antecedent: rule_terms(i),
                consequent: usize::from(gene),
            })
            .collect();
        Ok(Self { rules })
    }

    /// Rules in order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The rule for `(left, front, right)`.
    #[must_use]
    pub fn get(&self, left: usize, front: usize, right: usize) -> Option<&Rule> {
        if left >= TERM_COUNT || front >= TERM_COUNT || right >= TERM_COUNT {
            return None;
        }
        self.rules.get(rule_index(left, front, right))
    }

    /// Re-encode as a genome.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_genome(&self) -> RuleGenome {
        RuleGenome::new(self.rules.iter().map(|r| r.consequent as u8).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_rule_index_matches_nested_enumeration() {
        let mut expected = 0;
        for left in 0..TERM_COUNT {
            for front in 0..TERM_COUNT {
                for right in 0..TERM_COUNT {
                    assert_eq!(rule_index(left, front, right), expected);
                    assert_eq!(rule_terms(expected), [left, front, right]);
                    expected += 1;
                }
            }
        }
        assert_eq!(expected, RULE_COUNT);
    }

    #[test]
    fn test_rule_index_corners() {
        assert_eq!(rule_index(0, 0, 0), 0);
        assert_eq!(rule_index(0, 0, 1), 1);
        assert_eq!(rule_index(0, 1, 0), 5);
        assert_eq!(rule_index(1, 0, 0), 25);
        assert_eq!(rule_index(4, 4, 4), 124);
    }

    #[test]
    fn test_decode_links_genes_to_rules() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let genome = RuleGenome::random(&mut rng);
        let base = RuleBase::from_genome(&genome).unwrap();

        assert_eq!(base.rules().len(), RULE_COUNT);
        let rule = base.get(3, 1, 4).unwrap();
        assert_eq!(rule.antecedent, [3, 1, 4]);
        assert_eq!(
            rule.consequent,
            usize::from(genome.genes[rule_index(3, 1, 4)])
        );
        assert!(base.get(5, 0, 0).is_none());
        assert_eq!(base.to_genome(), genome);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(
            RuleBase::from_genome(&RuleGenome::new(vec![1; RULE_COUNT - 1])),
            Err(GenomeError::WrongLength { .. })
        ));
        assert!(matches!(
            RuleBase::from_genome(&RuleGenome::uniform(9)),
            Err(GenomeError::GeneOutOfRange { index: 0, value: 9 })
        ));
    }
}
