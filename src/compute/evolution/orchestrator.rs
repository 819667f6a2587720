//! Generation loop driving evaluation, selection, recombination and mutation.

use glam::Vec3;

use crate::compute::geometry::GeometryQuery;
use crate::schema::{ConfigError, EvolutionConfig, GenerationStats};

use super::crossover::Recombiner;
use super::fitness::FitnessEvaluator;
use super::genome::PathRng;
use super::individual::{DefaultPathFactory, PathFactory, PathIndividual};
use super::mutation::Mutator;
use super::selection::{SelectionError, select_mating_pool};
use super::visualization::{ColorCode, VisualizationSink, apply_color_codes};

/// Start and target points. Generations only run once both are known.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Anchors {
    pub start: Option<Vec3>,
    pub target: Option<Vec3>,
}

impl Anchors {
    pub fn new(start: Vec3, target: Vec3) -> Self {
        Self {
            start: Some(start),
            target: Some(target),
        }
    }
}

/// Whether a generation is currently in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrchestratorState {
    #[default]
    Idle,
    Running,
}

/// Receives the statistics of every completed generation.
pub trait StatsSink {
    fn on_generation(&mut self, stats: &GenerationStats);
}

impl<F: FnMut(&GenerationStats)> StatsSink for F {
    fn on_generation(&mut self, stats: &GenerationStats) {
        self(stats)
    }
}

/// Writes one `info` line per generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStatsSink;

impl StatsSink for LogStatsSink {
    fn on_generation(&mut self, stats: &GenerationStats) {
        log::info!(
            "Generation {}: avg fitness {:.2}/{:.2} ({:.1}%), avg nodes {:.2}, crossovers {}, mutations {}/{}/{}",
            stats.generation,
            stats.average_fitness,
            stats.maximum_fitness,
            stats.fitness_factor * 100.0,
            stats.average_node_count,
            stats.crossover_count,
            stats.mutations.translations,
            stats.mutations.insertions,
            stats.mutations.deletions,
        );
    }
}

/// Why a generation could not run.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Missing {0} anchor")]
    MissingAnchor(&'static str),
    #[error("Population is empty")]
    EmptyPopulation,
    #[error("Selection failed: {0}")]
    Selection(#[from] SelectionError),
}

/// Owns the population and runs one generation per elapsed interval.
pub struct GenerationOrchestrator<Q: GeometryQuery> {
    config: EvolutionConfig,
    query: Q,
    rng: PathRng,
    evaluator: FitnessEvaluator,
    recombiner: Recombiner,
    mutator: Mutator,
    factory: Box<dyn PathFactory>,
    stats_sinks: Vec<Box<dyn StatsSink>>,
    visualization: Option<Box<dyn VisualizationSink>>,
    population: Vec<PathIndividual>,
    anchors: Anchors,
    state: OrchestratorState,
    elapsed: f32,
    generation: u64,
}

impl<Q: GeometryQuery> GenerationOrchestrator<Q> {
    /// Validate `config` and create an orchestrator.
    ///
    /// The population is seeded immediately if the start anchor is known.
    pub fn new(config: EvolutionConfig, query: Q, anchors: Anchors) -> Result<Self, ConfigError> {
        config.validate()?;

        let rng = config.random_seed.map_or_else(PathRng::random, PathRng::new);
        let mut orchestrator = Self {
            rng,
            evaluator: FitnessEvaluator::new(config.fitness.clone()),
            recombiner: Recombiner::new(config.crossover.clone()),
            mutator: Mutator::new(config.mutation.clone()),
            config,
            query,
            factory: Box::new(DefaultPathFactory),
            stats_sinks: Vec::new(),
            visualization: None,
            population: Vec::new(),
            anchors,
            state: OrchestratorState::Idle,
            elapsed: 0.0,
            generation: 0,
        };

        if let Some(start) = anchors.start {
            orchestrator.seed_population(start);
        }
        Ok(orchestrator)
    }

    /// Replace the path factory.
    ///
    /// The outgoing factory destroys the current individuals and the new one
    /// recreates them from the same genomes.
    pub fn with_factory(mut self, factory: impl PathFactory + 'static) -> Self {
        let genomes: Vec<_> = self
            .population
            .drain(..)
            .map(|individual| {
                let genome = individual.genome().clone();
                self.factory.destroy(individual);
                genome
            })
            .collect();

        self.factory = Box::new(factory);
        self.population = genomes
            .into_iter()
            .map(|genome| self.factory.create(genome))
            .collect();
        self
    }

    pub fn with_stats_sink(mut self, sink: impl StatsSink + 'static) -> Self {
        self.stats_sinks.push(Box::new(sink));
        self
    }

    pub fn with_visualization_sink(mut self, sink: impl VisualizationSink + 'static) -> Self {
        self.visualization = Some(Box::new(sink));
        self
    }

    /// Discard the current population and seed a fresh one from the start anchor.
    pub fn initialize(&mut self) -> Result<(), GenerationError> {
        let start = self.anchors.start.ok_or(GenerationError::MissingAnchor("start"))?;
        self.seed_population(start);
        Ok(())
    }

    fn seed_population(&mut self, start: Vec3) {
        for individual in self.population.drain(..) {
            self.factory.destroy(individual);
        }

        for _ in 0..self.config.population.size {
            let genome = self.rng.random_genome(start, &self.config.population);
            self.population.push(self.factory.create(genome));
        }

        log::debug!(
            "Initialized {} paths from {:?}",
            self.population.len(),
            start
        );
    }

    /// Advance the generation timer by `delta` seconds.
    ///
    /// Runs a generation each time the accumulated time reaches the configured
    /// interval. Failed generations are logged and skipped.
    pub fn maybe_run_generation(&mut self, delta: f32) -> Option<GenerationStats> {
        if self.state == OrchestratorState::Running {
            return None;
        }

        self.elapsed += delta;
        if self.elapsed < self.config.generation_interval {
            return None;
        }
        self.elapsed = 0.0;

        self.state = OrchestratorState::Running;
        let result = self.run_generation();
        self.state = OrchestratorState::Idle;

        match result {
            Ok(stats) => Some(stats),
            Err(e) => {
                log::warn!("Skipping generation {}: {}", self.generation, e);
                None
            }
        }
    }

    /// Run one full generation immediately.
    pub fn run_generation(&mut self) -> Result<GenerationStats, GenerationError> {
        self.anchors.start.ok_or(GenerationError::MissingAnchor("start"))?;
        let target = self
            .anchors
            .target
            .ok_or(GenerationError::MissingAnchor("target"))?;

        if self.population.is_empty() {
            self.initialize()?;
        }

        // Snapping rewrites genomes in place; a skipped generation must restore them.
        let prior = self
            .config
            .fitness
            .snap_to_terrain
            .then(|| self.population.clone());

        let aggregates = self
            .evaluator
            .evaluate(&mut self.population, target, &self.query)
            .ok_or(GenerationError::EmptyPopulation)?;

        let selection = select_mating_pool(
            &self.population,
            aggregates.total_fitness,
            self.config.population.size,
            &mut self.rng,
        )
        .map(|pool| self.recombiner.recombine(&pool, &mut self.rng));

        let recombination = match selection {
            Ok(recombination) => recombination,
            Err(e) => {
                if let Some(prior) = prior {
                    self.population = prior;
                }
                return Err(e.into());
            }
        };

        let offspring: Vec<_> = recombination
            .offspring
            .into_iter()
            .map(|genome| self.factory.create(genome))
            .collect();
        for individual in std::mem::replace(&mut self.population, offspring) {
            self.factory.destroy(individual);
        }

        let mutations = self.mutator.mutate(&mut self.population, &mut self.rng);

        let aggregates = self
            .evaluator
            .evaluate(&mut self.population, target, &self.query)
            .ok_or(GenerationError::EmptyPopulation)?;

        apply_color_codes(&mut self.population, ColorCode::INVALID);
        if let Some(sink) = self.visualization.as_mut() {
            sink.on_population(&self.population);
        }

        let stats = GenerationStats {
            generation: self.generation,
            average_fitness: aggregates.average_fitness,
            maximum_fitness: aggregates.maximum_fitness,
            fitness_factor: aggregates.fitness_factor,
            average_node_count: aggregates.average_node_count,
            crossover_count: recombination.crossovers,
            mutations,
        };

        log::debug!(
            "Generation {}: best fitness {:.2}, {} mutations",
            self.generation,
            self.population.first().map_or(0.0, PathIndividual::fitness),
            mutations.total()
        );

        for sink in &mut self.stats_sinks {
            sink.on_generation(&stats);
        }
        self.generation += 1;

        Ok(stats)
    }

    /// Current population, sorted by descending fitness after each generation.
    pub fn population(&self) -> &[PathIndividual] {
        &self.population
    }

    /// Fittest individual of the last evaluation.
    pub fn best(&self) -> Option<&PathIndividual> {
        self.population.first()
    }

    pub fn anchors(&self) -> Anchors {
        self.anchors
    }

    /// Replace the anchors. A changed start point reseeds the population.
    pub fn set_anchors(&mut self, anchors: Anchors) -> Result<(), GenerationError> {
        let start_changed = anchors.start != self.anchors.start;
        self.anchors = anchors;
        if start_changed && anchors.start.is_some() {
            self.initialize()?;
        }
        Ok(())
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Number of completed generations.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::evolution::PathGenome;
    use crate::compute::{ObstacleField, OpenSpace};
    use crate::schema::FitnessWeights;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn seeded_config() -> EvolutionConfig {
        EvolutionConfig {
            random_seed: Some(42),
            ..Default::default()
        }
    }

    #[derive(Clone, Default)]
    struct CountingFactory {
        created: Rc<Cell<usize>>,
        destroyed: Rc<Cell<usize>>,
    }

    impl PathFactory for CountingFactory {
        fn create(&mut self, genome: PathGenome) -> PathIndividual {
            self.created.set(self.created.get() + 1);
            PathIndividual::new(genome)
        }

        fn destroy(&mut self, _individual: PathIndividual) {
            self.destroyed.set(self.destroyed.get() + 1);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = seeded_config();
        config.population.size = 3;
        assert!(GenerationOrchestrator::new(config, OpenSpace, Anchors::default()).is_err());
    }

    #[test]
    fn test_population_seeded_from_start() {
        let start = Vec3::new(1.0, 2.0, 3.0);
        let orchestrator =
            GenerationOrchestrator::new(seeded_config(), OpenSpace, Anchors::new(start, Vec3::X))
                .unwrap();

        assert_eq!(orchestrator.population().len(), 40);
        assert!(orchestrator.population().iter().all(|p| p.genome().first() == start));
        assert_eq!(orchestrator.generation(), 0);
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
    }

    #[test]
    fn test_missing_anchors() {
        let mut orchestrator =
            GenerationOrchestrator::new(seeded_config(), OpenSpace, Anchors::default()).unwrap();
        assert!(orchestrator.population().is_empty());
        assert!(matches!(
            orchestrator.run_generation(),
            Err(GenerationError::MissingAnchor("start"))
        ));

        orchestrator
            .set_anchors(Anchors {
                start: Some(Vec3::ZERO),
                target: None,
            })
            .unwrap();
        assert!(matches!(
            orchestrator.run_generation(),
            Err(GenerationError::MissingAnchor("target"))
        ));
        assert_eq!(orchestrator.maybe_run_generation(10.0), None);
        assert_eq!(orchestrator.generation(), 0);
    }

    #[test]
    fn test_timer_accumulates_and_resets() {
        let mut config = seeded_config();
        config.generation_interval = 1.0;
        let mut orchestrator = GenerationOrchestrator::new(
            config,
            OpenSpace,
            Anchors::new(Vec3::ZERO, Vec3::new(300.0, 0.0, 0.0)),
        )
        .unwrap();

        assert!(orchestrator.maybe_run_generation(0.4).is_none());
        assert!(orchestrator.maybe_run_generation(0.4).is_none());
        let stats = orchestrator.maybe_run_generation(0.4).unwrap();
        assert_eq!(stats.generation, 0);
        assert_eq!(orchestrator.generation(), 1);

        // Accumulator restarted from zero
        assert!(orchestrator.maybe_run_generation(0.5).is_none());
        assert_eq!(orchestrator.maybe_run_generation(0.5).unwrap().generation, 1);
        assert_eq!(orchestrator.state(), OrchestratorState::Idle);
    }

    #[test]
    fn test_generation_keeps_size_and_reports_stats() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&received);
        let factory = CountingFactory::default();

        let mut orchestrator = GenerationOrchestrator::new(
            seeded_config(),
            OpenSpace,
            Anchors::new(Vec3::ZERO, Vec3::new(200.0, 0.0, 0.0)),
        )
        .unwrap()
        .with_factory(factory.clone())
        .with_stats_sink(move |stats: &GenerationStats| sink.borrow_mut().push(stats.clone()));

        assert_eq!(factory.created.get(), 40);

        for _ in 0..3 {
            orchestrator.run_generation().unwrap();
        }

        assert_eq!(orchestrator.population().len(), 40);
        assert_eq!(factory.created.get(), 40 * 4);
        assert_eq!(factory.destroyed.get(), 40 * 3);

        let received = received.borrow();
        assert_eq!(received.len(), 3);
        for (index, stats) in received.iter().enumerate() {
            assert_eq!(stats.generation, index as u64);
            assert_eq!(stats.maximum_fitness, 600.0);
            assert!(stats.average_fitness >= 0.0);
            assert!(stats.crossover_count <= 20);
            assert!((stats.fitness_factor - stats.average_fitness / 600.0).abs() < 1e-5);
        }

        let fitness: Vec<_> = orchestrator.population().iter().map(|p| p.fitness()).collect();
        assert!(fitness.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_visualization_sink_sees_colored_population() {
        let seen = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&seen);

        let mut orchestrator = GenerationOrchestrator::new(
            seeded_config(),
            OpenSpace,
            Anchors::new(Vec3::ZERO, Vec3::new(200.0, 0.0, 0.0)),
        )
        .unwrap()
        .with_visualization_sink(move |population: &[PathIndividual]| {
            for individual in population {
                let invalid = individual.color == ColorCode::INVALID;
                assert_eq!(invalid, individual.flags().is_penalized());
            }
            counter.set(counter.get() + population.len());
        });

        orchestrator.run_generation().unwrap();
        assert_eq!(seen.get(), 40);
    }

    fn zero_weights() -> FitnessWeights {
        FitnessWeights {
            node_count: 0.0,
            proximity: 0.0,
            length: 0.0,
            line_of_sight: 0.0,
            target_reached: 0.0,
            slope: 0.0,
        }
    }

    fn genomes<Q: GeometryQuery>(orchestrator: &GenerationOrchestrator<Q>) -> Vec<PathGenome> {
        orchestrator
            .population()
            .iter()
            .map(|p| p.genome().clone())
            .collect()
    }

    fn assert_skipped_generation_keeps_genomes<Q: GeometryQuery>(
        orchestrator: &mut GenerationOrchestrator<Q>,
    ) {
        let before = genomes(orchestrator);

        assert!(matches!(
            orchestrator.run_generation(),
            Err(GenerationError::Selection(
                SelectionError::DegenerateFitness { .. }
            ))
        ));

        assert_eq!(before, genomes(orchestrator));
        assert_eq!(orchestrator.generation(), 0);
    }

    #[test]
    fn test_degenerate_fitness_keeps_population() {
        let mut config = seeded_config();
        config.fitness.weights = zero_weights();
        let mut orchestrator = GenerationOrchestrator::new(
            config,
            OpenSpace,
            Anchors::new(Vec3::ZERO, Vec3::new(200.0, 0.0, 0.0)),
        )
        .unwrap();

        assert_skipped_generation_keeps_genomes(&mut orchestrator);
    }

    #[test]
    fn test_degenerate_fitness_undoes_terrain_snapping() {
        let mut config = seeded_config();
        config.fitness.weights = zero_weights();
        config.fitness.snap_to_terrain = true;
        let start = Vec3::new(0.0, 0.0, 50.0);
        let mut orchestrator = GenerationOrchestrator::new(
            config,
            ObstacleField::with_ground(0.0),
            Anchors::new(start, Vec3::new(200.0, 0.0, 50.0)),
        )
        .unwrap();

        assert_skipped_generation_keeps_genomes(&mut orchestrator);
        assert!(orchestrator.population().iter().all(|p| p.genome().first() == start));
    }

    #[test]
    fn test_generation_index_survives_reseeding() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&received);
        let target = Vec3::new(200.0, 0.0, 0.0);

        let mut orchestrator =
            GenerationOrchestrator::new(seeded_config(), OpenSpace, Anchors::new(Vec3::ZERO, target))
                .unwrap()
                .with_stats_sink(move |stats: &GenerationStats| {
                    sink.borrow_mut().push(stats.generation)
                });

        orchestrator.run_generation().unwrap();
        orchestrator.run_generation().unwrap();

        let moved = Vec3::new(0.0, 50.0, 0.0);
        orchestrator.set_anchors(Anchors::new(moved, target)).unwrap();
        assert!(orchestrator.population().iter().all(|p| p.genome().first() == moved));
        orchestrator.run_generation().unwrap();

        orchestrator.initialize().unwrap();
        orchestrator.run_generation().unwrap();

        assert_eq!(*received.borrow(), vec![0, 1, 2, 3]);
        assert_eq!(orchestrator.generation(), 4);
    }

    #[test]
    fn test_replaced_factory_destroys_its_individuals() {
        let first = CountingFactory::default();
        let second = CountingFactory::default();

        let orchestrator = GenerationOrchestrator::new(
            seeded_config(),
            OpenSpace,
            Anchors::new(Vec3::ZERO, Vec3::X),
        )
        .unwrap();
        let before = genomes(&orchestrator);

        let orchestrator = orchestrator
            .with_factory(first.clone())
            .with_factory(second.clone());

        assert_eq!(first.created.get(), 40);
        assert_eq!(first.destroyed.get(), 40);
        assert_eq!(second.created.get(), 40);
        assert_eq!(second.destroyed.get(), 0);
        assert_eq!(before, genomes(&orchestrator));
    }

    #[test]
    fn test_population_moves_toward_target() {
        let target = Vec3::new(500.0, 0.0, 0.0);
        let mut config = seeded_config();
        config.population.size = 20;
        config.fitness.weights = FitnessWeights {
            node_count: 0.0,
            proximity: 100.0,
            length: 0.0,
            line_of_sight: 0.0,
            target_reached: 0.0,
            slope: 0.0,
        };
        config.mutation.probability = 100.0;
        config.mutation.translate_probability = 100.0;
        config.mutation.insert_probability = 0.0;
        config.mutation.delete_probability = 0.0;
        config.mutation.translation.target = crate::schema::WaypointPolicy::Last;

        let mut orchestrator =
            GenerationOrchestrator::new(config, OpenSpace, Anchors::new(Vec3::ZERO, target))
                .unwrap();

        let mean_distance = |population: &[PathIndividual]| {
            population
                .iter()
                .map(|p| p.genome().last().distance(target))
                .sum::<f32>()
                / population.len() as f32
        };

        let initial = mean_distance(orchestrator.population());
        for _ in 0..60 {
            orchestrator.run_generation().unwrap();
        }
        let evolved = mean_distance(orchestrator.population());

        assert!(
            evolved < initial * 0.8,
            "mean distance went from {initial} to {evolved}"
        );
    }
}
