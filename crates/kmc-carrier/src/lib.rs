//! `kmc-carrier`: mobile carriers and the single-occupancy bookkeeping.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`carrier`]   | `Carrier` (per-carrier clocks and displacement)            |
//! | [`occupancy`] | `Occupant`, `OccupancyMap`, `OccupancyViolation`           |
//! | [`store`]     | `CarrierStore`: injection, hops, re-injection, retirement  |
//! | [`error`]     | `CarrierError`, `CarrierResult<T>`                         |
//!
//! Carriers never hold references into the graph.  A carrier knows its
//! `SiteId`; the [`OccupancyMap`] knows which carrier sits on every site.  The
//! store keeps the two views in step, and [`OccupancyMap::violations`] checks
//! that they agree.

pub mod carrier;
pub mod error;
pub mod occupancy;
pub mod store;


pub use carrier::Carrier;
pub use error::{CarrierError, CarrierResult};
pub use occupancy::{OccupancyMap, OccupancyViolation, Occupant};
pub use store::CarrierStore;
