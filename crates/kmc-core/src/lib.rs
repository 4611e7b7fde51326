//! `kmc-core`: foundational types for the kinetic Monte Carlo transport engine.
//!
//! This crate is a dependency of every other `kmc-*` crate.  It has no
//! `kmc-*` dependencies and only a handful of external ones (`rand`,
//! `nalgebra`, `thiserror`, `tracing`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module           | Contents                                               |
//! |------------------|--------------------------------------------------------|
//! | [`ids`]          | `SiteId`, `EventId`, `CarrierId`                       |
//! | [`vector`]       | `Vec3`, `Mat3`, outer/elementwise products             |
//! | [`time`]         | `SimClock`, `RunBudget`, `OutputCadence`, `OutputSchedule` |
//! | [`config`]       | `RunConfig`, `RunMode`, `EnergyTracking`               |
//! | [`rng`]          | `RandomSource` trait, `KmcRng`                         |
//! | [`carrier_kind`] | `CarrierKind` enum                                     |
//! | [`error`]        | `CoreError`, `CoreResult`                              |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | `Serialize`/`Deserialize` on ids and configuration (needed by `kmc-cli`). |

pub mod carrier_kind;
pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;
pub mod vector;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use carrier_kind::CarrierKind;
pub use config::{EnergyTracking, RunConfig, RunMode};
pub use error::{CoreError, CoreResult};
pub use ids::{CarrierId, EventId, SiteId};
pub use rng::{KmcRng, RandomSource};
pub use time::{OutputCadence, OutputSchedule, RunBudget, SimClock};
pub use vector::{Mat3, Vec3};

/// Boltzmann constant in eV/K.
pub const BOLTZMANN_EV: f64 = 8.617_333_262e-5;

/// Metres per nanometre; fields are configured in V/m and used in V/nm.
pub const NM_PER_M: f64 = 1.0e9;
