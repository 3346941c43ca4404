//! Fitness: how long a genome's controller keeps the vehicle alive.
//!
//! Every evaluation builds a fresh controller and a fresh vehicle, then runs
//! scan → infer → advance until the vehicle dies or the step cap is reached.
//! Nothing here is random, so a genome always scores the same on the same map.

use serde::{Deserialize, Serialize};
use symbios_genetics::Evaluator;
use thiserror::Error;
use tracing::{debug, warn};

use crate::controller::{ControllerConfig, ControllerError, FuzzyController, Steering};
use crate::genome::RuleGenome;
use crate::sensor::{SensorArray, SensorConfig};
use crate::track::TrackMap;
use crate::vehicle::{Pose, Vehicle};

/// Parameters of a single simulated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Where every run starts.
    pub start: Pose,
    /// Step cap while scoring genomes.
    pub step_cap: usize,
    /// Step cap for the post-search replay of the best genome.
    pub replay_cap: usize,
    /// Ray layout and sampling.
    pub sensor: SensorConfig,
    /// Controller universes.
    pub controller: ControllerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: Pose::default(),
            step_cap: 200,
            replay_cap: 300,
            sensor: SensorConfig::default(),
            controller: ControllerConfig::default(),
        }
    }
}

/// Error type for invalid simulation parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Sampling step is zero or exceeds the horizon, or an angle is not finite.
    #[error("sensor step must be positive and no larger than the horizon")]
    InvalidSensor,
    /// The start pose is not finite.
    #[error("start pose ({x}, {y}, {heading}) is not finite")]
    InvalidStart {
        /// Start x.
        x: f64,
        /// Start y.
        y: f64,
        /// Start heading.
        heading: f64,
    },
    /// The controller universes cannot be partitioned.
    #[error("invalid controller configuration: {0}")]
    InvalidController(#[from] ControllerError),
}

/// Result of driving one controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// The vehicle after the run, with its full path.
    pub vehicle: Vehicle,
    /// Steps actually executed.
    pub steps: usize,
    /// Steps on which inference gave no decision and 0° was used.
    pub no_decisions: usize,
}

/// Scores rule genomes by simulated survival time on a fixed map.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator<'t> {
    track: &'t TrackMap,
    sensors: SensorArray,
    config: SimulationConfig,
}

impl<'t> FitnessEvaluator<'t> {
    /// Create an evaluator over `track`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError`] if the sensor layout, start pose or
    /// controller universes are invalid.
    pub fn new(track: &'t TrackMap, config: SimulationConfig) -> Result<Self, SimulationError> {
        if !config.sensor.is_valid() {
            return Err(SimulationError::InvalidSensor);
        }
        let Pose { x, y, heading } = config.start;
        if !(x.is_finite() && y.is_finite() && heading.is_finite()) {
            return Err(SimulationError::InvalidStart { x, y, heading });
        }
        // Surface universe problems now rather than as a zero score per genome.
        FuzzyController::try_new(&RuleGenome::uniform(0), &config.controller)?;

        Ok(Self {
            track,
            sensors: SensorArray::new(config.sensor.clone()),
            config,
        })
    }

    /// Evaluator with the reference parameters.
    #[must_use]
    pub fn reference(track: &'t TrackMap) -> Self {
        Self {
            track,
            sensors: SensorArray::default(),
            config: SimulationConfig::default(),
        }
    }

    /// The map every run is driven on.
    #[must_use]
    pub const fn track(&self) -> &TrackMap {
        self.track
    }

    /// Simulation parameters.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Steps survived by `genome`, capped at `step_cap`. Malformed genomes score 0.
    #[must_use]
    pub fn steps_survived(&self, genome: &RuleGenome) -> u32 {
        let steps = match self.run(genome, self.config.step_cap) {
            Ok(run) => run.steps,
            Err(err) => {
                warn!(%err, "malformed genome scored 0");
                return 0;
            }
        };
        debug!(steps, "genome evaluated");
        u32::try_from(steps).unwrap_or(u32::MAX)
    }

    /// Drive `genome` for the replay cap and keep the trajectory.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError`] if the genome cannot be decoded.
    pub fn replay(&self, genome: &RuleGenome) -> Result<Run, ControllerError> {
        self.run(genome, self.config.replay_cap)
    }

    /// Drive `genome` for at most `cap` steps.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError`] if the genome cannot be decoded.
    pub fn run(&self, genome: &RuleGenome, cap: usize) -> Result<Run, ControllerError> {
        let controller = FuzzyController::try_new(genome, &self.config.controller)?;
        Ok(self.drive(&controller, cap))
    }

    /// Drive an already-built controller for at most `cap` steps.
    #[must_use]
    pub fn drive(&self, controller: &FuzzyController, cap: usize) -> Run {
        let mut vehicle = Vehicle::new(self.config.start);
        let mut steps = 0;
        let mut no_decisions = 0;

        while vehicle.is_alive() && steps < cap {
            let reading = self.sensors.scan(&vehicle, self.track);
            let steering = controller.infer_reading(&reading);
            if steering == Steering::NoDecision {
                no_decisions += 1;
            }
            vehicle.advance(steering.or_neutral(), self.track);
            steps += 1;
        }

        Run {
            vehicle,
            steps,
            no_decisions,
        }
    }
}

/// Scalar fitness is the step count; it is also the single objective.
impl Evaluator<RuleGenome> for FitnessEvaluator<'_> {
    #[allow(clippy::cast_precision_loss)]
    fn evaluate(&self, genotype: &RuleGenome) -> (f32, Vec<f32>, Vec<f32>) {
        let steps = self.steps_survived(genotype) as f32;
        (steps, vec![steps], vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_straight_genome_hits_far_wall() {
        let track = TrackMap::reference();
        let evaluator = FitnessEvaluator::reference(&track);
        let run = evaluator.run(&RuleGenome::uniform(2), 200).unwrap();

        assert!(!run.vehicle.is_alive());
        // Along y = 15 the first wall cell is x = 99, 84 steps from x = 15.
        assert_eq!(run.steps, 84);
        assert!((run.vehicle.pose().x - 99.0).abs() < 1e-9);
        assert_eq!(run.no_decisions, 0);
        assert_eq!(run.vehicle.path().len(), run.steps + 1);
    }

    #[test]
    fn test_malformed_genome_scores_zero() {
        let track = TrackMap::reference();
        let evaluator = FitnessEvaluator::reference(&track);
        assert_eq!(evaluator.steps_survived(&RuleGenome::new(vec![2; 124])), 0);
        assert_eq!(evaluator.steps_survived(&RuleGenome::uniform(5)), 0);
    }

    #[test]
    fn test_spinning_genome_survives_cap() {
        let track = TrackMap::reference();
        let evaluator = FitnessEvaluator::reference(&track);
        // A constant 45° turn traces a tiny octagon around the start.
        assert_eq!(evaluator.steps_survived(&RuleGenome::uniform(0)), 200);
        let run = evaluator.replay(&RuleGenome::uniform(0)).unwrap();
        assert_eq!(run.steps, 300);
        assert!(run.vehicle.is_alive());
    }

    #[test]
    fn test_scores_bounded_and_deterministic() {
        let track = TrackMap::reference();
        let evaluator = FitnessEvaluator::reference(&track);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..10 {
            let genome = RuleGenome::random(&mut rng);
            let score = evaluator.steps_survived(&genome);
            assert!(score <= 200);
            assert_eq!(score, evaluator.steps_survived(&genome));
        }
    }

    #[test]
    fn test_evaluator_reports_steps_as_fitness() {
        let track = TrackMap::reference();
        let evaluator = FitnessEvaluator::reference(&track);
        let (fitness, objectives, descriptor) = evaluator.evaluate(&RuleGenome::uniform(2));
        assert!((fitness - 84.0).abs() < f32::EPSILON);
        assert_eq!(objectives, vec![fitness]);
        assert!(descriptor.is_empty());
    }

    #[test]
    fn test_config_validation() {
        let track = TrackMap::reference();
        assert!(FitnessEvaluator::new(&track, SimulationConfig::default()).is_ok());

        let config = SimulationConfig {
            sensor: SensorConfig {
                step: 0,
                ..SensorConfig::default()
            },
            ..SimulationConfig::default()
        };
        assert_eq!(
            FitnessEvaluator::new(&track, config).unwrap_err(),
            SimulationError::InvalidSensor
        );

        let config = SimulationConfig {
            start: Pose::new(f64::NAN, 1.0, 0.0),
            ..SimulationConfig::default()
        };
        assert!(matches!(
            FitnessEvaluator::new(&track, config),
            Err(SimulationError::InvalidStart { .. })
        ));

        let config = SimulationConfig {
            controller: ControllerConfig {
                output_universe: (1.0, 1.0),
                ..ControllerConfig::default()
            },
            ..SimulationConfig::default()
        };
        assert!(matches!(
            FitnessEvaluator::new(&track, config),
            Err(SimulationError::InvalidController(_))
        ));
    }
}
