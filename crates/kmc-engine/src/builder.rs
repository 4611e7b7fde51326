//! Builder for constructing an [`Engine`].

use kmc_carrier::CarrierStore;
use kmc_core::{KmcRng, OutputSchedule, RandomSource, RunConfig, SimClock};
use kmc_graph::SiteGraph;
use kmc_stats::{Aggregator, EnergyTracker};

use crate::selection::Selector;
use crate::{Engine, EngineError, EngineResult};

/// Builder for [`Engine<S>`].
///
/// The random source defaults to a [`KmcRng`] seeded from `config.seed`;
/// [`with_rng`](Self::with_rng) swaps in any other [`RandomSource`].
///
/// # Example
///
/// ```
/// use kmc_core::{RunBudget, RunConfig, RunMode, SiteId, Vec3};
/// use kmc_engine::{EngineBuilder, NoopObserver};
/// use kmc_graph::SiteGraphBuilder;
///
/// let mut b = SiteGraphBuilder::new();
/// let s: Vec<SiteId> = (0..3).map(|i| b.add_site(Vec3::new(i as f64, 0.0, 0.0), 0.0)).collect();
/// b.add_pair(s[0], s[1], 1.0, 1.0);
/// b.add_pair(s[1], s[2], 1.0, 1.0);
///
/// let config = RunConfig::new(1, 42, RunMode::FixedPopulation { budget: RunBudget::Steps(100) });
/// let mut engine = EngineBuilder::new(config, b.build().unwrap()).build().unwrap();
/// let summary = engine.run(&mut NoopObserver).unwrap();
/// assert_eq!(summary.steps, 100);
/// ```
pub struct EngineBuilder<S: RandomSource = KmcRng> {
    config: RunConfig,
    graph:  SiteGraph,
    rng:    S,
}

impl EngineBuilder<KmcRng> {
    pub fn new(config: RunConfig, graph: SiteGraph) -> Self {
        let rng = KmcRng::new(config.seed);
        Self { config, graph, rng }
    }
}

impl<S: RandomSource> EngineBuilder<S> {
    /// Replace the random source (scripted draws in tests, replica streams).
    pub fn with_rng<T: RandomSource>(self, rng: T) -> EngineBuilder<T> {
        EngineBuilder { config: self.config, graph: self.graph, rng }
    }

    /// Validate the configuration, inject the carriers, and return a
    /// ready-to-run [`Engine`].
    ///
    /// # Errors
    ///
    /// - [`EngineError::Config`] for an invalid [`RunConfig`].
    /// - [`EngineError::NoDecayEvents`] in lifetime mode on a graph without
    ///   decay events.
    /// - [`EngineError::Carrier`] if the injection pattern is invalid or more
    ///   carriers are requested than free matching sites exist.
    pub fn build(self) -> EngineResult<Engine<S>> {
        let Self { config, mut graph, mut rng } = self;
        config.validate()?;

        if config.mode.is_lifetime() && !graph.site_has_decay.iter().any(|&d| d) {
            return Err(EngineError::NoDecayEvents);
        }

        graph.reset_occupation();
        let mut store = CarrierStore::new(&graph, config.carrier_kind, &config.injection_pattern)?;
        store.inject(config.carriers, &graph, &mut rng)?;

        let stats = Aggregator::new(&config, &graph);
        let energy = match (config.mode.is_lifetime(), config.energy_tracking, store.get(0)) {
            (true, Some(settings), Some(first)) => Some(EnergyTracker::new(
                settings,
                first,
                graph.site_energy[first.site.index()],
            )),
            _ => None,
        };
        let output = OutputSchedule::new(config.output);

        Ok(Engine {
            config,
            graph,
            store,
            rng,
            clock:        SimClock::ZERO,
            insertions:   0,
            selector:     Selector::new(),
            stats,
            energy,
            output,
            time_limited: false,
        })
    }
}
