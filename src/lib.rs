//! # Symbios Fuzzy
//!
//! Evolves the rule base of a Mamdani fuzzy steering controller for a
//! point vehicle driving on a 2-D occupancy grid.
//!
//! ## Features
//!
//! - **Fixed-Shape Rule Base**: One rule per combination of left, front and
//!   right distance terms (5 × 5 × 5 = 125), so a genome is just one output
//!   term per rule
//! - **Mamdani Inference**: Min for AND, clipped consequents, max aggregation,
//!   sampled centroid defuzzification
//! - **Deterministic Simulation**: Ray-cast sensors on a walled grid; fitness
//!   is the number of steps survived
//! - **Seeded Search**: Generational GA with truncation selection, optionally
//!   scored in parallel with `rayon`
//! - **Genotype Trait**: Implements `symbios_genetics::Genotype` for
//!   [`RuleGenome`] and `symbios_genetics::Evaluator` for [`FitnessEvaluator`]
//!
//! ## Quick Start
//!
//! ```rust
//! use symbios_fuzzy::{FitnessEvaluator, GaConfig, Optimizer, TrackMap};
//!
//! let track = TrackMap::reference();
//! let evaluator = FitnessEvaluator::reference(&track);
//!
//! let mut ga = Optimizer::new(GaConfig::default()).unwrap();
//! let outcome = ga.run(&evaluator);
//!
//! let replay = evaluator.replay(&outcome.best.genome).unwrap();
//! println!("best {} steps, replay {}", outcome.best.fitness, replay.steps);
//! ```
//!
//! ## Driving a Controller by Hand
//!
//! ```rust
//! use symbios_fuzzy::{FuzzyController, RuleGenome, Steering};
//!
//! // Every rule says "steer centre".
//! let controller = FuzzyController::new(&RuleGenome::uniform(2)).unwrap();
//! match controller.infer(15.0, 85.0, 85.0) {
//!     Steering::Angle(deg) => assert!(deg.abs() < 1e-9),
//!     Steering::NoDecision => unreachable!(),
//! }
//! ```
//!
//! ## Architecture
//!
//! ### Rule Indexing
//!
//! Rule `i` covers the terms `(l, f, r)` with `i = (l·5 + f)·5 + r`. See
//! [`rule_index`] and [`rule_terms`].
//!
//! ### Step Order
//!
//! Each simulation step scans all rays from the current pose, infers a
//! steering angle (0° when no rule fires), turns, moves one unit, then tests
//! the new cell. A vehicle that lands in an occupied or out-of-bounds cell is
//! dead and stays where it is.

pub mod controller;
pub mod fitness;
pub mod genome;
pub mod membership;
pub mod optimizer;
pub mod partition;
pub mod rules;
pub mod sensor;
pub mod track;
pub mod vehicle;

// Re-exports for convenience
pub use controller::{
    ControllerConfig, ControllerError, FuzzyController, Steering, MAX_OUTPUT_SAMPLES,
};
pub use fitness::{FitnessEvaluator, Run, SimulationConfig, SimulationError};
pub use genome::{GenomeError, RuleGenome};
pub use membership::Membership;
pub use optimizer::{
    ConfigError, Crossover, GaConfig, GenerationReport, Individual, Optimizer, SearchOutcome,
};
pub use partition::{
    LinguisticPartition, PartitionError, Term, DISTANCE_LABELS, STEERING_LABELS, TERM_COUNT,
};
pub use rules::{rule_index, rule_terms, Rule, RuleBase, INPUT_COUNT, RULE_COUNT};
pub use sensor::{SensorArray, SensorConfig, SensorReading, RAY_COUNT};
pub use track::{Obstacle, TrackConfig, TrackError, TrackMap, REFERENCE_MAP_SIZE};
pub use vehicle::{Pose, Vehicle};
