//! Generational genetic search over rule genomes.
//!
//! Each generation keeps the `parents` fittest individuals unchanged
//! (truncation selection), refills the population with children bred from
//! consecutive parent pairs, and mutates every child gene with probability
//! `mutation_rate`. Only children need scoring: parents keep the fitness they
//! were selected with, which is exact because evaluation is deterministic.
//!
//! Scores come from any [`Evaluator`]; only its scalar fitness is used. A NaN
//! fitness ranks below every number.
//!
//! All randomness comes from one seeded [`ChaCha8Rng`] advanced on the calling
//! thread, so a seed fully determines the search even when scoring runs in
//! parallel.

use std::cmp::Ordering;
use std::ops::ControlFlow;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use symbios_genetics::{Evaluator, Genotype};
use tracing::{debug, info, warn};

use crate::genome::{GenomeError, RuleGenome};

/// How two parents are recombined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Crossover {
    /// One random cut; genes before it from the first parent, the rest from the second.
    #[default]
    SinglePoint,
    /// Each gene from either parent with equal probability.
    Uniform,
}

/// Search parameters. The default is the reference run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaConfig {
    /// Individuals per generation.
    pub population_size: usize,
    /// Generations to breed.
    pub generations: usize,
    /// Survivors selected as parents each generation.
    pub parents: usize,
    /// Per-gene probability of being redrawn in a child.
    pub mutation_rate: f32,
    /// Recombination operator.
    pub crossover: Crossover,
    /// RNG seed for the initial population and all genetic operators.
    pub seed: u64,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 5,
            generations: 10,
            parents: 2,
            mutation_rate: 0.1,
            crossover: Crossover::SinglePoint,
            seed: 42,
        }
    }
}

impl GaConfig {
    /// Check the parameters against each other.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.parents == 0 || self.parents > self.population_size {
            return Err(ConfigError::InvalidParentCount {
                parents: self.parents,
                population: self.population_size,
            });
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::InvalidMutationRate(self.mutation_rate));
        }
        Ok(())
    }
}

/// Error type for searches that cannot start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Population size is zero.
    #[error("population must contain at least one individual")]
    EmptyPopulation,
    /// Parent count is zero or larger than the population.
    #[error("cannot select {parents} parents from a population of {population}")]
    InvalidParentCount {
        /// Requested parent count.
        parents: usize,
        /// Population size.
        population: usize,
    },
    /// Mutation rate is not a probability.
    #[error("mutation rate {0} is outside [0, 1]")]
    InvalidMutationRate(f32),
    /// The supplied initial population has the wrong size.
    #[error("initial population has {actual} genomes, expected {expected}")]
    PopulationSizeMismatch {
        /// Configured size.
        expected: usize,
        /// Supplied size.
        actual: usize,
    },
    /// A supplied genome does not match the rule base.
    #[error("initial genome {index} is invalid: {source}")]
    InvalidGenome {
        /// Position in the initial population.
        index: usize,
        /// What is wrong with it.
        source: GenomeError,
    },
}

/// A scored genome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// The genetic encoding.
    pub genome: RuleGenome,
    /// Scalar fitness. Higher is better.
    pub fitness: f32,
}

/// Summary handed to the generation hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Generations bred so far (0 for the initial population).
    pub generation: usize,
    /// Best fitness in this generation.
    pub best_fitness: f32,
    /// Mean fitness in this generation.
    pub mean_fitness: f64,
    /// Best fitness seen in any generation so far.
    pub best_ever: f32,
}

/// Final result of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Fittest individual ever scored.
    pub best: Individual,
    /// Best fitness per generation, starting with the initial population.
    pub history: Vec<f32>,
    /// Generations actually bred.
    pub generations: usize,
    /// Whether the hook stopped the search before `generations` was reached.
    pub stopped_early: bool,
}

/// Generational GA over [`RuleGenome`]s.
#[derive(Debug, Clone)]
pub struct Optimizer {
    config: GaConfig,
    rng: ChaCha8Rng,
    /// Current generation before scoring. Empty once scored.
    pending: Vec<RuleGenome>,
    /// Current generation after scoring, fittest first.
    scored: Vec<Individual>,
    best: Option<Individual>,
    history: Vec<f32>,
    generation: usize,
}

impl Optimizer {
    /// Start a search from a random initial population drawn from `config.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is inconsistent.
    pub fn new(config: GaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let initial = (0..config.population_size)
            .map(|_| RuleGenome::random(&mut rng))
            .collect();
        Ok(Self::from_parts(config, rng, initial))
    }

    /// Start a search from a given initial population.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is inconsistent, the
    /// population has the wrong size, or any genome is malformed.
    pub fn with_population(
        config: GaConfig,
        initial: Vec<RuleGenome>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if initial.len() != config.population_size {
            return Err(ConfigError::PopulationSizeMismatch {
                expected: config.population_size,
                actual: initial.len(),
            });
        }
        for (index, genome) in initial.iter().enumerate() {
            genome
                .validate()
                .map_err(|source| ConfigError::InvalidGenome { index, source })?;
        }
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self::from_parts(config, rng, initial))
    }

    fn from_parts(config: GaConfig, rng: ChaCha8Rng, initial: Vec<RuleGenome>) -> Self {
        Self {
            config,
            rng,
            pending: initial,
            scored: Vec::new(),
            best: None,
            history: Vec::new(),
            generation: 0,
        }
    }

    /// Search parameters.
    #[must_use]
    pub const fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Generations bred so far.
    #[must_use]
    pub const fn generation(&self) -> usize {
        self.generation
    }

    /// Best fitness per scored generation, starting with the initial population.
    #[must_use]
    pub fn fitness_history(&self) -> &[f32] {
        &self.history
    }

    /// Fittest individual scored so far.
    #[must_use]
    pub const fn best(&self) -> Option<&Individual> {
        self.best.as_ref()
    }

    /// The current scored generation, fittest first.
    #[must_use]
    pub fn population(&self) -> &[Individual] {
        &self.scored
    }

    /// Score the initial population if that has not happened yet.
    pub fn initialize<E: Evaluator<RuleGenome>>(&mut self, evaluator: &E) -> GenerationReport {
        if self.pending.is_empty() {
            return self.report();
        }
        let pending = std::mem::take(&mut self.pending);
        self.scored = score_all(pending, evaluator);
        self.record()
    }

    /// Breed and score one generation.
    pub fn step<E: Evaluator<RuleGenome>>(&mut self, evaluator: &E) -> GenerationReport {
        self.initialize(evaluator);

        let parents: Vec<Individual> = self.scored.drain(..self.config.parents).collect();
        let children = self.breed(&parents);
        let mut next = parents;
        next.extend(score_all(children, evaluator));

        self.scored = next;
        self.generation += 1;
        self.record()
    }

    /// Run every configured generation.
    pub fn run<E: Evaluator<RuleGenome>>(&mut self, evaluator: &E) -> SearchOutcome {
        self.run_with(evaluator, |_| ControlFlow::Continue(()))
    }

    /// Run every configured generation, calling `on_generation` after each.
    ///
    /// Returning [`ControlFlow::Break`] stops the search at that generation
    /// boundary; the best individual found so far is still reported.
    pub fn run_with<E, F>(&mut self, evaluator: &E, mut on_generation: F) -> SearchOutcome
    where
        E: Evaluator<RuleGenome>,
        F: FnMut(&GenerationReport) -> ControlFlow<()>,
    {
        let mut stopped_early = false;
        let report = self.initialize(evaluator);
        if on_generation(&report).is_break() {
            stopped_early = true;
        }

        while !stopped_early && self.generation < self.config.generations {
            let report = self.step(evaluator);
            if on_generation(&report).is_break() && self.generation < self.config.generations {
                stopped_early = true;
            }
        }

        if stopped_early {
            warn!(generation = self.generation, "search stopped early");
        }
        let outcome = self.outcome(stopped_early);
        debug!(
            best = outcome.best.fitness,
            generations = outcome.generations,
            "search finished"
        );
        outcome
    }

    fn breed(&mut self, parents: &[Individual]) -> Vec<RuleGenome> {
        let count = self.config.population_size - parents.len();
        (0..count)
            .map(|k| {
                let first = &parents[k % parents.len()].genome;
                let second = &parents[(k + 1) % parents.len()].genome;
                let mut child = match self.config.crossover {
                    Crossover::SinglePoint => first.crossover(second, &mut self.rng),
                    Crossover::Uniform => first.uniform_crossover(second, &mut self.rng),
                };
                child.mutate(&mut self.rng, self.config.mutation_rate);
                child
            })
            .collect()
    }

    /// Rank the scored generation and update best-ever and history.
    fn record(&mut self) -> GenerationReport {
        // Stable sort: on ties, survivors stay ahead of newer children.
        self.scored
            .sort_by(|a, b| cmp_fitness(b.fitness, a.fitness));

        if let Some(leader) = self.scored.first() {
            let improved = self.best.as_ref().map_or(true, |best| {
                cmp_fitness(leader.fitness, best.fitness) == Ordering::Greater
            });
            if improved {
                self.best = Some(leader.clone());
            }
            self.history.push(leader.fitness);
        }

        let report = self.report();
        info!(
            generation = report.generation,
            best = report.best_fitness,
            mean = report.mean_fitness,
            best_ever = report.best_ever,
            "generation scored"
        );
        report
    }

    fn report(&self) -> GenerationReport {
        let best_fitness = self.scored.first().map_or(0.0, |i| i.fitness);
        #[allow(clippy::cast_precision_loss)]
        let mean_fitness = if self.scored.is_empty() {
            0.0
        } else {
            self.scored.iter().map(|i| f64::from(i.fitness)).sum::<f64>()
                / self.scored.len() as f64
        };
        GenerationReport {
            generation: self.generation,
            best_fitness,
            mean_fitness,
            best_ever: self.best.as_ref().map_or(0.0, |b| b.fitness),
        }
    }

    fn outcome(&self, stopped_early: bool) -> SearchOutcome {
        let best = self.best.clone().unwrap_or_else(|| Individual {
            genome: self
                .scored
                .first()
                .map(|i| i.genome.clone())
                .or_else(|| self.pending.first().cloned())
                .unwrap_or_else(|| RuleGenome::uniform(0)),
            fitness: 0.0,
        });
        SearchOutcome {
            best,
            history: self.history.clone(),
            generations: self.generation,
            stopped_early,
        }
    }
}

/// Orders fitness values with NaN below every number.
fn cmp_fitness(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Score a batch of genomes, in parallel when the `parallel` feature is on.
///
/// Results keep the input order; all scores are in before this returns.
fn score_all<E: Evaluator<RuleGenome>>(genomes: Vec<RuleGenome>, evaluator: &E) -> Vec<Individual> {
    let score = |genome: RuleGenome| {
        let (fitness, _, _) = evaluator.evaluate(&genome);
        Individual { genome, fitness }
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        genomes.into_par_iter().map(score).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        genomes.into_iter().map(score).collect()
    }
}
