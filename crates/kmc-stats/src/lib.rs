//! `kmc-stats`: observables collected while the engine runs.
//!
//! Everything here is a side-effect consumer: the engine feeds it carriers,
//! committed hops, and decays, and nothing flows back into event selection.
//! Accumulation is append-only; the reduction into a [`RunSummary`] happens
//! once, in [`Aggregator::finish`].
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`diffusion`] | `DiffusionAccumulator`, `DiffusionTensor` (eigen-decomposed) |
//! | [`jump`]      | `JumpHistogram`                                           |
//! | [`decay`]     | `DecayRecord`, `DecayStats`, `DecaySummary`               |
//! | [`energy`]    | `EnergyTracker`, `EnergySample`                           |
//! | [`transport`] | mobility projection, `TimeDependenceSample`, `TransportReport` |
//! | [`summary`]   | `RunSummary`, `CarrierSummary`                            |
//! | [`aggregator`]| `Aggregator`, the owner of all of the above for one run   |
//! | [`error`]     | `StatsError`, `StatsResult<T>`                            |

pub mod aggregator;
pub mod decay;
pub mod diffusion;
pub mod energy;
pub mod error;
pub mod jump;
pub mod summary;
pub mod transport;


pub use aggregator::{Aggregator, RunOutcome};
pub use decay::{DecayRecord, DecayStats, DecaySummary};
pub use diffusion::{DiffusionAccumulator, DiffusionTensor};
pub use energy::{EnergySample, EnergyTracker};
pub use error::{StatsError, StatsResult};
pub use jump::JumpHistogram;
pub use summary::{CarrierSummary, DiffusionSummary, RunSummary};
pub use transport::{field_mobility, TimeDependenceSample, TransportReport};
