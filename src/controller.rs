//! Mamdani fuzzy steering controller.
//!
//! A [`FuzzyController`] is compiled once per genome and then queried every
//! simulation step. Inference is min-AND over the three antecedents, max-OR
//! aggregation per output term, clipping of each output term at its
//! aggregated strength, and centroid defuzzification over a sampled output
//! universe.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::genome::{GenomeError, RuleGenome};
use crate::partition::{
    LinguisticPartition, PartitionError, DISTANCE_LABELS, STEERING_LABELS, TERM_COUNT,
};
use crate::rules::{RuleBase, INPUT_COUNT};
use crate::sensor::SensorReading;

/// Upper bound on the number of output samples used for the centroid.
pub const MAX_OUTPUT_SAMPLES: usize = 1_000_000;

/// Universes and defuzzification resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Universe shared by the three distance inputs.
    pub input_universe: (f64, f64),
    /// Universe of the steering output, in degrees.
    pub output_universe: (f64, f64),
    /// Spacing of the output samples used for the centroid.
    pub resolution: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            input_universe: (0.0, 100.0),
            output_universe: (-45.0, 45.0),
            resolution: 1.0,
        }
    }
}

/// Error type for controller construction failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    /// The genome cannot be decoded into a rule base.
    #[error("cannot build rule base: {0}")]
    InvalidGenome(#[from] GenomeError),
    /// A universe is empty or not finite.
    #[error(transparent)]
    InvalidPartition(#[from] PartitionError),
    /// The sample spacing is not a positive finite number.
    #[error("output resolution must be positive and finite, got {0}")]
    InvalidResolution(f64),
    /// The resolution is too fine for the output universe.
    #[error("resolution {resolution} needs more than {} output samples", MAX_OUTPUT_SAMPLES)]
    TooManySamples {
        /// Requested sample spacing.
        resolution: f64,
    },
}

/// Outcome of one inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Steering {
    /// Crisp steering angle in degrees.
    Angle(f64),
    /// The aggregated output was empty; no angle could be computed.
    NoDecision,
}

impl Steering {
    /// The angle, or straight ahead (0°) when there is no decision.
    #[must_use]
    pub const fn or_neutral(self) -> f64 {
        match self {
            Self::Angle(angle) => angle,
            Self::NoDecision => 0.0,
        }
    }

    /// Whether inference produced an angle.
    #[must_use]
    pub const fn is_decision(self) -> bool {
        matches!(self, Self::Angle(_))
    }
}

/// A compiled three-input, one-output fuzzy controller.
#[derive(Debug, Clone)]
pub struct FuzzyController {
    inputs: [LinguisticPartition; INPUT_COUNT],
    output: LinguisticPartition,
    rules: RuleBase,
    /// Output universe sample points.
    samples: Vec<f64>,
    /// Unclipped output term degrees at each sample.
    sample_degrees: Vec<[f64; TERM_COUNT]>,
}

impl FuzzyController {
    /// Build a controller with the reference universes.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidGenome`] for malformed genomes.
    pub fn new(genome: &RuleGenome) -> Result<Self, ControllerError> {
        Self::try_new(genome, &ControllerConfig::default())
    }

    /// Build a controller from a genome and explicit universes.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError`] if the genome is malformed, a universe is
    /// invalid, or the resolution is not positive or gives more than
    /// [`MAX_OUTPUT_SAMPLES`] samples.
    pub fn try_new(genome: &RuleGenome, config: &ControllerConfig) -> Result<Self, ControllerError> {
        let rules = RuleBase::from_genome(genome)?;

        let (in_min, in_max) = config.input_universe;
        let inputs = [
            LinguisticPartition::auto("s_left", in_min, in_max, DISTANCE_LABELS)?,
            LinguisticPartition::auto("s_front", in_min, in_max, DISTANCE_LABELS)?,
            LinguisticPartition::auto("s_right", in_min, in_max, DISTANCE_LABELS)?,
        ];
        let (out_min, out_max) = config.output_universe;
        let output = LinguisticPartition::auto("direction", out_min, out_max, STEERING_LABELS)?;

        if !(config.resolution.is_finite() && config.resolution > 0.0) {
            return Err(ControllerError::InvalidResolution(config.resolution));
        }
        #[allow(clippy::cast_precision_loss)]
        let sample_limit = MAX_OUTPUT_SAMPLES as f64;
        if (out_max - out_min) / config.resolution >= sample_limit {
            return Err(ControllerError::TooManySamples {
                resolution: config.resolution,
            });
        }

        let samples = sample_universe(out_min, out_max, config.resolution);
        let sample_degrees = samples.iter().map(|&x| output.fuzzify(x)).collect();

        Ok(Self {
            inputs,
            output,
            rules,
            samples,
            sample_degrees,
        })
    }

    /// Crisp distances in, crisp steering angle out.
    ///
    /// Returns [`Steering::NoDecision`] if any input is not finite or no rule
    /// fires with non-zero strength.
    #[must_use]
    pub fn infer(&self, left: f64, front: f64, right: f64) -> Steering {
        if !(left.is_finite() && front.is_finite() && right.is_finite()) {
            return Steering::NoDecision;
        }

        let l = self.inputs[0].fuzzify(left);
        let f = self.inputs[1].fuzzify(front);
        let r = self.inputs[2].fuzzify(right);

        // Strongest firing per output term.
        let mut strengths = [0.0_f64; TERM_COUNT];
        for rule in self.rules.rules() {
            let [a, b, c] = rule.antecedent;
            let firing = l[a].min(f[b]).min(r[c]);
            let slot = &mut strengths[rule.consequent];
            *slot = slot.max(firing);
        }

        if strengths.iter().all(|&s| s <= 0.0) {
            return Steering::NoDecision;
        }

        let mut weighted = 0.0;
        let mut area = 0.0;
        for (&x, degrees) in self.samples.iter().zip(&self.sample_degrees) {
            let mu = degrees
                .iter()
                .zip(&strengths)
                .map(|(&d, &s)| d.min(s))
                .fold(0.0, f64::max);
            weighted += x * mu;
            area += mu;
        }

        if area <= 0.0 {
            return Steering::NoDecision;
        }
        Steering::Angle(weighted / area)
    }

    /// Infer from a full sensor scan, using the left, front and right rays.
    #[must_use]
    pub fn infer_reading(&self, reading: &SensorReading) -> Steering {
        let [left, front, right] = reading.controller_inputs();
        self.infer(left, front, right)
    }

    /// Input partitions: left, front, right.
    #[must_use]
    pub const fn inputs(&self) -> &[LinguisticPartition; INPUT_COUNT] {
        &self.inputs
    }

    /// Output partition.
    #[must_use]
    pub const fn output(&self) -> &LinguisticPartition {
        &self.output
    }

    /// The decoded rule base.
    #[must_use]
    pub const fn rules(&self) -> &RuleBase {
        &self.rules
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn sample_universe(min: f64, max: f64, resolution: f64) -> Vec<f64> {
    let count = ((max - min) / resolution).floor() as usize + 1;
    (0..count)
        .map(|i| (min + resolution * i as f64).min(max))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::rule_index;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn controller(genome: &RuleGenome) -> FuzzyController {
        FuzzyController::new(genome).unwrap()
    }

    #[test]
    fn test_sampling_covers_universe() {
        let samples = sample_universe(-45.0, 45.0, 1.0);
        assert_eq!(samples.len(), 91);
        assert!((samples[0] + 45.0).abs() < 1e-12);
        assert!((samples[90] - 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_center_genome_steers_straight() {
        let c = controller(&RuleGenome::uniform(2));
        for (l, f, r) in [(0.0, 0.0, 0.0), (10.0, 55.0, 90.0), (100.0, 100.0, 100.0)] {
            let angle = c.infer(l, f, r).or_neutral();
            assert!(angle.abs() < 1e-9, "got {}", angle);
        }
    }

    #[test]
    fn test_uniform_interior_terms_return_term_centroid() {
        for term in 1..=3u8 {
            let c = controller(&RuleGenome::uniform(term));
            let expected = c.output().term_centroid(usize::from(term));
            for l in (0..=100).step_by(7) {
                for f in (0..=100).step_by(11) {
                    let Steering::Angle(angle) = c.infer(f64::from(l), f64::from(f), 50.0) else {
                        panic!("no decision for term {}", term);
                    };
                    assert!((angle - expected).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_extreme_terms_stay_on_their_side() {
        let left = controller(&RuleGenome::uniform(0));
        let right = controller(&RuleGenome::uniform(4));
        for x in [0.0, 12.0, 40.0, 100.0] {
            let a = left.infer(x, x, x).or_neutral();
            assert!((-45.0..=-22.5).contains(&a), "got {}", a);
            let b = right.infer(x, x, x).or_neutral();
            assert!((22.5..=45.0).contains(&b), "got {}", b);
            assert!((a + b).abs() < 1e-9);
        }
        // Full-strength firing clips nothing, so the shoulder centroid applies.
        let full = left.infer(0.0, 0.0, 0.0).or_neutral();
        assert!((full - left.output().term_centroid(0)).abs() < 0.5);
    }

    #[test]
    fn test_single_rule_dominates_at_peaks() {
        // Inputs exactly on term peaks fire exactly one rule.
        let mut genome = RuleGenome::uniform(2);
        genome.genes[rule_index(0, 0, 0)] = 3;
        let c = controller(&genome);

        let angle = c.infer(0.0, 0.0, 0.0).or_neutral();
        assert!((angle - 22.5).abs() < 1e-6);
        let angle = c.infer(50.0, 50.0, 50.0).or_neutral();
        assert!(angle.abs() < 1e-6);
    }

    #[test]
    fn test_infer_is_pure() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let c = controller(&RuleGenome::random(&mut rng));
        let first = c.infer(35.0, 80.0, 15.0);
        for _ in 0..10 {
            assert_eq!(c.infer(35.0, 80.0, 15.0), first);
        }
        assert!(first.is_decision());
    }

    #[test]
    fn test_outputs_stay_in_universe() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let c = controller(&RuleGenome::random(&mut rng));
        for l in (0..=100).step_by(5) {
            for f in (0..=100).step_by(5) {
                for r in (0..=100).step_by(25) {
                    let angle = c.infer(f64::from(l), f64::from(f), f64::from(r));
                    let Steering::Angle(a) = angle else {
                        panic!("complete rule base must always decide");
                    };
                    assert!((-45.0..=45.0).contains(&a));
                }
            }
        }
    }

    #[test]
    fn test_no_decision_on_non_finite_input() {
        let c = controller(&RuleGenome::uniform(1));
        assert_eq!(c.infer(f64::NAN, 10.0, 10.0), Steering::NoDecision);
        assert_eq!(c.infer(10.0, f64::INFINITY, 10.0), Steering::NoDecision);
        assert!((Steering::NoDecision.or_neutral()).abs() < 1e-12);
    }

    #[test]
    fn test_no_decision_outside_every_term() {
        // A resolution coarser than the universe leaves a single sample at -45,
        // where the centre term has no membership.
        let config = ControllerConfig {
            output_universe: (-45.0, 45.0),
            resolution: 100.0,
            ..ControllerConfig::default()
        };
        let c = FuzzyController::try_new(&RuleGenome::uniform(2), &config).unwrap();
        assert_eq!(c.infer(50.0, 50.0, 50.0), Steering::NoDecision);
    }

    #[test]
    fn test_malformed_genome_rejected() {
        let err = FuzzyController::new(&RuleGenome::new(vec![0; 3])).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidGenome(_)));
        assert!(err.to_string().contains("rule base"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let genome = RuleGenome::uniform(2);
        let config = ControllerConfig {
            resolution: 0.0,
            ..ControllerConfig::default()
        };
        assert!(matches!(
            FuzzyController::try_new(&genome, &config),
            Err(ControllerError::InvalidResolution(_))
        ));

        let config = ControllerConfig {
            resolution: 1e-12,
            ..ControllerConfig::default()
        };
        assert!(matches!(
            FuzzyController::try_new(&genome, &config),
            Err(ControllerError::TooManySamples { .. })
        ));

        let config = ControllerConfig {
            output_universe: (-1e300, 1e300),
            ..ControllerConfig::default()
        };
        assert!(matches!(
            FuzzyController::try_new(&genome, &config),
            Err(ControllerError::TooManySamples { .. })
        ));

        // A fine but bounded grid is still accepted.
        let config = ControllerConfig {
            resolution: 0.001,
            ..ControllerConfig::default()
        };
        assert!(FuzzyController::try_new(&genome, &config).is_ok());

        let config = ControllerConfig {
            input_universe: (10.0, -10.0),
            ..ControllerConfig::default()
        };
        assert!(matches!(
            FuzzyController::try_new(&genome, &config),
            Err(ControllerError::InvalidPartition(_))
        ));
    }
}
