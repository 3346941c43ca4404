//! Evolve a fuzzy steering controller on the reference track.
//!
//! Runs the reference search, replays the best genome for the longer replay
//! cap and prints the fitness history, the trajectory and the genome as JSON.
//!
//! Run with: `cargo run --example evolve`
//! Set `RUST_LOG=symbios_fuzzy=debug` to see every evaluation.

use std::ops::ControlFlow;

use serde::Serialize;
use symbios_fuzzy::{
    FitnessEvaluator, GaConfig, Optimizer, TrackMap, DISTANCE_LABELS, STEERING_LABELS,
};
use tracing_subscriber::EnvFilter;

/// What gets written to stdout after the search.
#[derive(Serialize)]
struct Report<'a> {
    best_fitness: f32,
    history: &'a [f32],
    replay_steps: usize,
    replay_alive: bool,
    trajectory: &'a [(f64, f64)],
    genome: &'a [u8],
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("Fuzzy Steering Example");
    println!("======================\n");

    let config = GaConfig::default();
    println!("Population: {}", config.population_size);
    println!("Generations: {}", config.generations);
    println!("Parents: {}", config.parents);
    println!("Mutation rate: {}", config.mutation_rate);
    println!();

    let track = TrackMap::reference();
    let evaluator = FitnessEvaluator::reference(&track);
    let mut ga = Optimizer::new(config).expect("default config is valid");

    let outcome = ga.run_with(&evaluator, |report| {
        println!(
            "Gen {:3}: best={:3}, avg={:7.2}, best_ever={:3}",
            report.generation, report.best_fitness, report.mean_fitness, report.best_ever
        );
        // The step cap is the ceiling; nothing can do better.
        if report.best_ever >= evaluator.config().step_cap as f32 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    println!();
    println!("Evolution Complete!");
    println!("==================");
    println!("Best fitness: {}", outcome.best.fitness);
    if outcome.stopped_early {
        println!("Stopped after {} generations", outcome.generations);
    }

    let replay = evaluator
        .replay(&outcome.best.genome)
        .expect("best genome came from the search and is valid");
    println!(
        "Replay: {} steps, {}",
        replay.steps,
        if replay.vehicle.is_alive() {
            "survived"
        } else {
            "crashed"
        }
    );

    println!("\nFirst rules (left, front, right -> steering):");
    for (index, &gene) in outcome.best.genome.genes.iter().enumerate().take(10) {
        let [l, f, r] = symbios_fuzzy::rule_terms(index);
        println!(
            "  {:>2} {:>2} {:>2} -> {}",
            DISTANCE_LABELS[l],
            DISTANCE_LABELS[f],
            DISTANCE_LABELS[r],
            STEERING_LABELS[usize::from(gene)]
        );
    }

    let report = Report {
        best_fitness: outcome.best.fitness,
        history: &outcome.history,
        replay_steps: replay.steps,
        replay_alive: replay.vehicle.is_alive(),
        trajectory: replay.vehicle.path(),
        genome: &outcome.best.genome.genes,
    };
    match serde_json::to_string(&report) {
        Ok(json) => println!("\n{json}"),
        Err(err) => eprintln!("cannot serialize report: {err}"),
    }
}
