//! `kmc-engine`: variable-step-size kinetic Monte Carlo.
//!
//! # One step
//!
//! ```text
//! R  = Σ escape_rate(site of carrier)         (R == 0 → EngineError)
//! dt = -ln(u) / R                              u ∈ (0, 1)
//! time += dt; every carrier: lifetime += dt, steps += 1;
//!             every held site: occupation_time += dt
//! select:  Level 1 carrier ∝ escape rate  ─┐  forbidden nodes /
//!          Level 2 event   ∝ event rate   ─┘  destinations, reset per step
//! commit:  Jump   → move carrier, accumulate displacement
//!          Decay  → record, then re-inject (lifetime) or retire (fixed)
//!          Idle   → nothing (all carriers surrounded)
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs ensemble replicas on Rayon's thread pool.         |
//! | `fx-hash`  | FxHash instead of SipHash for the forbidden-site sets. |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use kmc_engine::{EngineBuilder, NoopObserver};
//!
//! let graph = kmc_graph::load_graph_csv(&sites, &events, None)?;
//! let mut engine = EngineBuilder::new(config, graph).build()?;
//! let summary = engine.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod observer;
pub mod policy;
pub mod selection;

#[cfg(test)]
mod tests;

pub use builder::EngineBuilder;
pub use engine::{Engine, StepOutcome, StepReport};
pub use ensemble::{run_ensemble, run_replica};
pub use error::{EngineError, EngineResult};
pub use observer::{KmcObserver, NoopObserver};
pub use policy::{DecayAction, ModePolicy};
pub use selection::{ForbiddenSets, Selection, Selector, Stage};
