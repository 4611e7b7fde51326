//! The site → occupant map that enforces single occupancy.

use std::fmt;

use kmc_core::{CarrierId, SiteId};
use kmc_graph::SiteGraph;

use crate::{Carrier, CarrierError, CarrierResult};

/// What currently sits on a site.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Occupant {
    #[default]
    Vacant,
    Carrier(CarrierId),
    /// Externally occupied for the whole run.
    Blocked,
}

impl Occupant {
    #[inline]
    pub fn is_vacant(self) -> bool {
        matches!(self, Occupant::Vacant)
    }
}

/// Single authority on which site holds which carrier.
///
/// Only [`crate::CarrierStore`] mutates it during a run.
#[derive(Clone, Debug)]
pub struct OccupancyMap {
    slots: Vec<Occupant>,
}

impl OccupancyMap {
    /// All sites vacant except those the graph marks as blocked.
    pub fn from_graph(graph: &SiteGraph) -> Self {
        let slots = graph
            .site_blocked
            .iter()
            .map(|&b| if b { Occupant::Blocked } else { Occupant::Vacant })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn get(&self, site: SiteId) -> Occupant {
        self.slots.get(site.index()).copied().unwrap_or(Occupant::Blocked)
    }

    /// The `occupied` flag of a site: anything but [`Occupant::Vacant`].
    #[inline]
    pub fn is_occupied(&self, site: SiteId) -> bool {
        !self.get(site).is_vacant()
    }

    pub fn vacant_count(&self) -> usize {
        self.slots.iter().filter(|o| o.is_vacant()).count()
    }

    /// Put `carrier` on a vacant `site`.
    pub fn occupy(&mut self, site: SiteId, carrier: CarrierId) -> CarrierResult<()> {
        let slot = self
            .slots
            .get_mut(site.index())
            .ok_or(CarrierError::UnknownSite(site))?;
        if !slot.is_vacant() {
            return Err(CarrierError::SiteOccupied { site, occupant: *slot });
        }
        *slot = Occupant::Carrier(carrier);
        Ok(())
    }

    /// Vacate `site`, which must currently hold `carrier`.
    pub fn release(&mut self, site: SiteId, carrier: CarrierId) -> CarrierResult<()> {
        let slot = self
            .slots
            .get_mut(site.index())
            .ok_or(CarrierError::UnknownSite(site))?;
        if *slot != Occupant::Carrier(carrier) {
            return Err(CarrierError::NotHolder { site, carrier });
        }
        *slot = Occupant::Vacant;
        Ok(())
    }

    /// Every way the map and the active carrier list disagree.
    ///
    /// Empty means the occupancy invariant holds: each active carrier's site
    /// is marked with that carrier, no site holds two carriers, and the map
    /// names no carrier that is not active there.
    pub fn violations(&self, carriers: &[Carrier]) -> Vec<OccupancyViolation> {
        let mut out = Vec::new();
        let mut seen = vec![None::<CarrierId>; self.slots.len()];

        for c in carriers {
            let Some(first) = seen.get_mut(c.site.index()) else {
                out.push(OccupancyViolation::OffGraph { carrier: c.id, site: c.site });
                continue;
            };
            if let Some(other) = *first {
                out.push(OccupancyViolation::Shared { site: c.site, first: other, second: c.id });
            } else {
                *first = Some(c.id);
            }
            let marked = self.slots[c.site.index()];
            if marked != Occupant::Carrier(c.id) {
                out.push(OccupancyViolation::Unmarked { carrier: c.id, site: c.site, marked });
            }
        }

        for (i, (slot, holder)) in self.slots.iter().zip(&seen).enumerate() {
            if let Occupant::Carrier(id) = *slot {
                if *holder != Some(id) {
                    out.push(OccupancyViolation::Stale { site: SiteId(i as u32), carrier: id });
                }
            }
        }
        out
    }
}

/// One disagreement between the occupancy map and the carrier list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OccupancyViolation {
    /// Two active carriers reference the same site.
    Shared { site: SiteId, first: CarrierId, second: CarrierId },
    /// A carrier's site is not marked as held by it.
    Unmarked { carrier: CarrierId, site: SiteId, marked: Occupant },
    /// The map names a carrier that is not on that site.
    Stale { site: SiteId, carrier: CarrierId },
    /// A carrier references a site outside the graph.
    OffGraph { carrier: CarrierId, site: SiteId },
}

impl fmt::Display for OccupancyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared { site, first, second } => {
                write!(f, "{first} and {second} both occupy {site}")
            }
            Self::Unmarked { carrier, site, marked } => {
                write!(f, "{carrier} sits on {site} but the map holds {marked:?}")
            }
            Self::Stale { site, carrier } => {
                write!(f, "{site} is marked for {carrier}, which is not there")
            }
            Self::OffGraph { carrier, site } => write!(f, "{carrier} references unknown {site}"),
        }
    }
}
