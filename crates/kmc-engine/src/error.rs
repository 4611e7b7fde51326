use thiserror::Error;

use kmc_carrier::CarrierError;
use kmc_core::CoreError;
use kmc_graph::GraphError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Carrier(#[from] CarrierError),

    #[error(
        "total escape rate is zero at step {step} ({carriers} carriers): no carrier has a \
         viable outgoing event, the rate graph is malformed or disconnected"
    )]
    ZeroEscapeRate { step: u64, carriers: usize },

    #[error("no active carriers left to move")]
    NoCarriers,

    #[error("lifetime mode needs decay events, but the graph has none (apply a lifetime table)")]
    NoDecayEvents,

    #[error("occupancy invariant violated: {0}")]
    Invariant(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
