use thiserror::Error;

use kmc_core::{CarrierId, SiteId};

use crate::Occupant;

#[derive(Debug, Error)]
pub enum CarrierError {
    #[error(
        "carrier count exceeds site count: {requested} carriers requested but only \
         {available} free sites match the injection pattern"
    )]
    TooManyCarriers { requested: usize, available: usize },

    #[error("invalid injection pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("no free site matches the injection pattern {0:?}")]
    NoVacantSite(String),

    #[error("site {site} is not free (occupant: {occupant:?})")]
    SiteOccupied { site: SiteId, occupant: Occupant },

    #[error("{carrier} does not hold site {site}")]
    NotHolder { site: SiteId, carrier: CarrierId },

    #[error("site {0} not found in occupancy map")]
    UnknownSite(SiteId),

    #[error("no active carrier in slot {0}")]
    UnknownSlot(usize),
}

pub type CarrierResult<T> = Result<T, CarrierError>;
