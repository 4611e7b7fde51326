//! `kmc-graph`: the fixed network of sites and hop/decay events.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`graph`]    | `SiteGraph` (flat site arena + CSR events), `SiteGraphBuilder` |
//! | [`lifetime`] | `LifetimeRecord`, lifetime-table application, `DecayProbability` |
//! | [`loader`]   | CSV loaders for sites, events, and lifetime tables          |
//! | [`error`]    | `GraphError`, `GraphResult<T>`                              |
//!
//! Events store integer site indices, never references, so the graph has no
//! ownership cycles and clones cheaply for independent ensemble replicas.

pub mod error;
pub mod graph;
pub mod lifetime;
pub mod loader;


pub use error::{GraphError, GraphResult};
pub use graph::{SiteGraph, SiteGraphBuilder};
pub use lifetime::{apply_lifetimes, DecayProbability, LifetimeRecord};
pub use loader::{load_events_reader, load_graph_csv, load_lifetimes_csv, load_lifetimes_reader, load_sites_reader};
