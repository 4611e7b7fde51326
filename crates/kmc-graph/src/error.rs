//! Graph-subsystem error type.

use thiserror::Error;

use kmc_core::SiteId;

/// Errors produced while building or loading a site graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("site {0} not found in graph")]
    UnknownSite(SiteId),

    #[error("hop event from {0} points back to the same site")]
    SelfLoop(SiteId),

    #[error("event from {from} has invalid rate {rate}: rates must be finite and non-negative")]
    InvalidRate { from: SiteId, rate: f64 },

    #[error("site {0} appears twice in the lifetime table or already has a decay event")]
    DuplicateDecay(SiteId),

    #[error("lifetime table has {rows} rows but the graph has {sites} sites")]
    LifetimeCount { sites: usize, rows: usize },

    #[error("site {site} has invalid lifetime {lifetime}: lifetimes must be finite and positive")]
    InvalidLifetime { site: SiteId, lifetime: f64 },

    #[error("site ids must be dense and ordered: expected {expected}, found {found}")]
    NonDenseIds { expected: u32, found: u32 },

    #[error("graph parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;
