//! Independent replicas of one run.
//!
//! Every replica gets its own clone of the graph (occupancy and occupation
//! times are never shared) and its own stream from
//! [`KmcRng::for_replica`].  With the `parallel` feature replicas run on
//! Rayon's thread pool; results come back in replica order either way.

use kmc_core::{KmcRng, RunConfig};
use kmc_graph::SiteGraph;
use kmc_stats::RunSummary;

use crate::{EngineBuilder, EngineResult, NoopObserver};

/// Run replica `replica` of `config` on a private copy of `graph`.
pub fn run_replica(config: &RunConfig, graph: &SiteGraph, replica: u64) -> EngineResult<RunSummary> {
    let mut engine = EngineBuilder::new(config.clone(), graph.clone())
        .with_rng(KmcRng::for_replica(config.seed, replica))
        .build()?;
    let _span = tracing::info_span!("replica", replica).entered();
    engine.run(&mut NoopObserver)
}

/// Run `replicas` independent replicas and collect their summaries.
pub fn run_ensemble(config: &RunConfig, graph: &SiteGraph, replicas: u64) -> EngineResult<Vec<RunSummary>> {
    #[cfg(not(feature = "parallel"))]
    {
        (0..replicas).map(|r| run_replica(config, graph, r)).collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        (0..replicas)
            .into_par_iter()
            .map(|r| run_replica(config, graph, r))
            .collect()
    }
}
