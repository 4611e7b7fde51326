//! `CarrierStore`: the active carrier set plus its occupancy map.
//!
//! # Slots
//!
//! Active carriers live in a `Vec` in injection order.  A *slot* is an index
//! into it.  Re-injection replaces a carrier in place, so slot 0 is always
//! the most senior position (the energy tracker follows it).  Retirement
//! removes the slot and shifts later carriers down.
//!
//! # Site choice
//!
//! Injection sites are drawn uniformly from the vacant sites whose `kind`
//! matches the injection glob.  Draws first try a few rejection samples over
//! all matching sites, then fall back to enumerating the vacant ones.  Both
//! paths are uniform over the vacant candidates.

use glob::Pattern;

use kmc_core::{CarrierId, CarrierKind, RandomSource, SiteId, Vec3};
use kmc_graph::SiteGraph;

use crate::{Carrier, CarrierError, CarrierResult, OccupancyMap, OccupancyViolation};

/// Rejection draws before falling back to an exact vacant-site scan.
const REJECTION_ATTEMPTS: usize = 32;

#[derive(Clone, Debug)]
pub struct CarrierStore {
    carriers:   Vec<Carrier>,
    occupancy:  OccupancyMap,
    kind:       CarrierKind,
    pattern:    String,
    /// Non-blocked sites whose kind matches `pattern`, ascending.
    candidates: Vec<SiteId>,
    next_id:    u64,
}

impl CarrierStore {
    /// Empty store over `graph`.  Fails if `pattern` is not a valid glob.
    pub fn new(graph: &SiteGraph, kind: CarrierKind, pattern: &str) -> CarrierResult<Self> {
        let glob = Pattern::new(pattern).map_err(|e| CarrierError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        let candidates: Vec<SiteId> = graph
            .site_ids()
            .filter(|s| !graph.site_blocked[s.index()] && glob.matches(&graph.site_kind[s.index()]))
            .collect();
        tracing::debug!(pattern, candidates = candidates.len(), "injection sites resolved");
        Ok(Self {
            carriers: Vec::new(),
            occupancy: OccupancyMap::from_graph(graph),
            kind,
            pattern: pattern.to_string(),
            candidates,
            next_id: 0,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.carriers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carriers.is_empty()
    }

    pub fn carriers(&self) -> &[Carrier] {
        &self.carriers
    }

    pub fn get(&self, slot: usize) -> Option<&Carrier> {
        self.carriers.get(slot)
    }

    pub fn occupancy(&self) -> &OccupancyMap {
        &self.occupancy
    }

    pub fn kind(&self) -> CarrierKind {
        self.kind
    }

    /// Id the next injected carrier will receive.
    pub fn next_id(&self) -> CarrierId {
        CarrierId(self.next_id)
    }

    /// Sum of the escape rates of every active carrier's site.
    pub fn total_escape_rate(&self, graph: &SiteGraph) -> f64 {
        self.carriers.iter().map(|c| graph.escape_rate(c.site)).sum()
    }

    pub fn violations(&self) -> Vec<OccupancyViolation> {
        self.occupancy.violations(&self.carriers)
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Inject `count` carriers on distinct, uniformly chosen vacant sites.
    ///
    /// Fails without injecting anything if fewer than `count` candidates are
    /// vacant.
    pub fn inject<R: RandomSource>(
        &mut self,
        count: usize,
        graph: &SiteGraph,
        rng:   &mut R,
    ) -> CarrierResult<()> {
        let mut vacant: Vec<SiteId> = self
            .candidates
            .iter()
            .copied()
            .filter(|&s| !self.occupancy.is_occupied(s))
            .collect();
        if count > vacant.len() {
            return Err(CarrierError::TooManyCarriers { requested: count, available: vacant.len() });
        }
        // Partial Fisher-Yates: the first `count` entries become the sample.
        for i in 0..count {
            let j = i + rng.index(vacant.len() - i);
            vacant.swap(i, j);
            self.place(vacant[i], graph)?;
        }
        tracing::debug!(count, "injected carriers");
        Ok(())
    }

    /// Move the carrier in `slot` to the vacant site `to`, adding `dr` to its
    /// displacement.
    pub fn hop(&mut self, slot: usize, to: SiteId, dr: Vec3) -> CarrierResult<()> {
        let carrier = self.carriers.get_mut(slot).ok_or(CarrierError::UnknownSlot(slot))?;
        self.occupancy.occupy(to, carrier.id)?;
        self.occupancy.release(carrier.site, carrier.id)?;
        carrier.site = to;
        carrier.displacement += dr;
        Ok(())
    }

    /// Replace the carrier in `slot` with a fresh one on a random vacant
    /// candidate site.  Returns the replaced carrier.
    ///
    /// The old site is released first, so it is itself eligible.
    pub fn reinject<R: RandomSource>(
        &mut self,
        slot:  usize,
        graph: &SiteGraph,
        rng:   &mut R,
    ) -> CarrierResult<Carrier> {
        let old = self.carriers.get(slot).ok_or(CarrierError::UnknownSlot(slot))?;
        self.occupancy.release(old.site, old.id)?;
        let site = self.draw_vacant(rng)?;
        let fresh = self.spawn(site, graph)?;
        Ok(std::mem::replace(&mut self.carriers[slot], fresh))
    }

    /// Remove the carrier in `slot` from the run and vacate its site.
    pub fn retire(&mut self, slot: usize) -> CarrierResult<Carrier> {
        let c = self.carriers.get(slot).ok_or(CarrierError::UnknownSlot(slot))?;
        self.occupancy.release(c.site, c.id)?;
        Ok(self.carriers.remove(slot))
    }

    /// Add `dt` to every carrier's lifetime and step count and to the
    /// occupation time of every occupied site.
    pub fn tick(&mut self, dt: f64, occupation_time: &mut [f64]) {
        for c in &mut self.carriers {
            c.tick(dt);
            occupation_time[c.site.index()] += dt;
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn place(&mut self, site: SiteId, graph: &SiteGraph) -> CarrierResult<()> {
        let carrier = self.spawn(site, graph)?;
        self.carriers.push(carrier);
        Ok(())
    }

    /// Mark `site` with a new id and build the carrier (not yet stored).
    fn spawn(&mut self, site: SiteId, graph: &SiteGraph) -> CarrierResult<Carrier> {
        let id = CarrierId(self.next_id);
        self.occupancy.occupy(site, id)?;
        self.next_id += 1;
        Ok(Carrier::new(id, self.kind, site, graph.site_pos[site.index()]))
    }

    fn draw_vacant<R: RandomSource>(&self, rng: &mut R) -> CarrierResult<SiteId> {
        if self.candidates.is_empty() {
            return Err(CarrierError::NoVacantSite(self.pattern.clone()));
        }
        for _ in 0..REJECTION_ATTEMPTS {
            let site = self.candidates[rng.index(self.candidates.len())];
            if !self.occupancy.is_occupied(site) {
                return Ok(site);
            }
        }
        let vacant: Vec<SiteId> = self
            .candidates
            .iter()
            .copied()
            .filter(|&s| !self.occupancy.is_occupied(s))
            .collect();
        if vacant.is_empty() {
            return Err(CarrierError::NoVacantSite(self.pattern.clone()));
        }
        Ok(vacant[rng.index(vacant.len())])
    }
}
