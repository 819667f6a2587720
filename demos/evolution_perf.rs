//! Quick evolution performance test

use genetic_paths::{
    EvolutionConfig, GenerationOrchestrator,
    compute::{Aabb, ObstacleField, evolution::Anchors},
    schema::{CrossoverConfig, CrossoverOperator, PopulationConfig},
};
use glam::Vec3;
use std::time::Instant;

const GENERATIONS: usize = 100;

fn world() -> ObstacleField {
    ObstacleField::with_ground(0.0).with_obstacle(Aabb::new(
        Vec3::new(180.0, -60.0, 0.0),
        Vec3::new(220.0, 60.0, 120.0),
    ))
}

fn run(config: EvolutionConfig) {
    let anchors = Anchors::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(400.0, 0.0, 10.0));
    let mut orchestrator = match GenerationOrchestrator::new(config, world(), anchors) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            eprintln!("  Invalid config: {}", e);
            return;
        }
    };

    let start = Instant::now();
    let mut completed = 0;
    let mut last_factor = 0.0;
    for _ in 0..GENERATIONS {
        if let Ok(stats) = orchestrator.run_generation() {
            completed += 1;
            last_factor = stats.fitness_factor;
        }
    }
    let elapsed = start.elapsed();

    let best = orchestrator.best();
    println!("  Generations:    {}", completed);
    println!("  Elapsed:        {:.3}s", elapsed.as_secs_f64());
    println!(
        "  Gens/sec:       {:.1}",
        completed as f64 / elapsed.as_secs_f64()
    );
    println!("  Fitness factor: {:.3}", last_factor);
    if let Some(best) = best {
        println!(
            "  Best fitness:   {:.2} ({} nodes, reached={})",
            best.fitness(),
            best.node_count(),
            best.flags().reached_target
        );
    }
    println!();
}

fn main() {
    println!("=== Evolution Performance Test ===\n");

    for operator in [CrossoverOperator::SinglePoint, CrossoverOperator::Uniform] {
        println!("Crossover: {:?}", operator);
        run(EvolutionConfig {
            crossover: CrossoverConfig {
                operator,
                ..Default::default()
            },
            random_seed: Some(42),
            ..Default::default()
        });
    }

    println!("=== Scalability Test ===\n");

    for size in [10, 20, 40, 80, 160] {
        println!("Population: {}", size);
        run(EvolutionConfig {
            population: PopulationConfig {
                size,
                ..Default::default()
            },
            random_seed: Some(42),
            ..Default::default()
        });
    }
}
