//! Genetic Paths CLI - Evolve paths through a scenario described in JSON.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::PathBuf;
use std::time::Instant;

use genetic_paths::{
    compute::evolution::{Anchors, GenerationOrchestrator, LogStatsSink},
    schema::ScenarioConfig,
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.json> [generations]", args[0]);
        eprintln!();
        eprintln!("Evolve waypoint paths from a JSON scenario.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  scenario.json  Path to scenario file");
        eprintln!("  generations    Number of generations to run (default: 50)");
        eprintln!();
        eprintln!("An example scenario is printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_scenario();
        return;
    }

    let scenario_path = PathBuf::from(&args[1]);
    let generations: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(50);

    let scenario = ScenarioConfig::load(&scenario_path).unwrap_or_else(|e| {
        eprintln!("Error loading scenario: {}", e);
        std::process::exit(1);
    });

    println!("Genetic Paths");
    println!("=============");
    println!("Start: {}", scenario.start);
    println!("Target: {}", scenario.target);
    println!(
        "Population: {} ({}-{} nodes)",
        scenario.evolution.population.size,
        scenario.evolution.population.min_nodes,
        scenario.evolution.population.max_nodes
    );
    println!("Obstacles: {}", scenario.world.obstacles.len());
    println!("Generations: {}", generations);
    println!();

    let tick = scenario.tick;
    let anchors = Anchors::new(scenario.start, scenario.target);
    let mut orchestrator =
        GenerationOrchestrator::new(scenario.evolution, scenario.world, anchors)
            .unwrap_or_else(|e| {
                eprintln!("Invalid evolution config: {}", e);
                std::process::exit(1);
            })
            .with_stats_sink(LogStatsSink);

    // Bound the simulated time so a run whose generations keep failing still ends.
    let ticks_per_generation =
        ((orchestrator.config().generation_interval / tick).ceil() as u64).saturating_add(1);
    let max_ticks = ticks_per_generation.saturating_mul(generations.saturating_mul(2).max(1));

    let start = Instant::now();
    let mut completed = 0;
    let mut ticks = 0;

    while completed < generations && ticks < max_ticks {
        ticks += 1;
        if let Some(stats) = orchestrator.maybe_run_generation(tick) {
            completed += 1;
            println!(
                "  Generation {}: avg={:.2} factor={:.1}% nodes={:.2} crossovers={} mutations={}",
                stats.generation,
                stats.average_fitness,
                stats.fitness_factor * 100.0,
                stats.average_node_count,
                stats.crossover_count,
                stats.mutations.total()
            );
        }
    }

    let elapsed = start.elapsed();

    println!();
    if completed < generations {
        println!("Stopped after {} of {} generations", completed, generations);
    }

    match orchestrator.best() {
        Some(best) => {
            println!("Best path (fitness {:.2}):", best.fitness());
            for (i, waypoint) in best.genome().waypoints().iter().enumerate() {
                println!("  {:>3}: {}", i, waypoint);
            }
            let flags = best.flags();
            println!(
                "  reached={} sight={} obstacle={} terrain={} steep={}",
                flags.reached_target,
                flags.can_see_target,
                flags.in_obstacle,
                flags.through_terrain,
                flags.slope_too_intense
            );
        }
        None => println!("No paths were evolved"),
    }

    println!(
        "Time: {:.2}s ({:.1} generations/s)",
        elapsed.as_secs_f32(),
        completed as f32 / elapsed.as_secs_f32().max(f32::EPSILON)
    );
}

fn print_example_scenario() {
    let scenario = ScenarioConfig::default();

    println!("Example scenario (scenario.json):");
    match serde_json::to_string_pretty(&scenario) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example: {}", e),
    }
}
