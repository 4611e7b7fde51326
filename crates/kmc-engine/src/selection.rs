//! Two-level event selection under single occupancy.
//!
//! # Stages
//!
//! ```text
//!            ┌──────────── RetrySource ─────────────┐
//!            ▼                                      │
//!   Level 1: pick a carrier ──► Level 2: pick one of its events
//!      │ (none allowed)            │        │
//!      ▼                           │        └── RetryDestination ──┐
//!    Idle                          ▼                               │
//!                                Commit (Jump | Decay)   ◄─────────┘
//! ```
//!
//! Level 1 draws a carrier proportionally to its site's escape rate, over
//! carriers whose site is not a forbidden node.  Level 2 draws an event
//! proportionally to its rate, over decay events and hops whose destination
//! is not forbidden.  Drawing over the allowed subset has the same
//! distribution as drawing over everything and re-drawing on a forbidden
//! hit, and it means every retry adds one site to a forbidden set.  A step
//! therefore needs at most `2 × site_count` retries.
//!
//! An occupied destination joins the forbidden destinations.  If that leaves
//! the carrier surrounded (no allowed event with a positive rate), its site
//! joins the forbidden nodes and selection returns to Level 1.  When every
//! carrier sits on a forbidden node the step commits nothing.

use kmc_carrier::{Carrier, OccupancyMap};
use kmc_core::{EventId, RandomSource, SiteId};
use kmc_graph::SiteGraph;

#[cfg(feature = "fx-hash")]
type SiteSet = rustc_hash::FxHashSet<SiteId>;
#[cfg(not(feature = "fx-hash"))]
type SiteSet = std::collections::HashSet<SiteId>;

// ── ForbiddenSets ─────────────────────────────────────────────────────────────

/// Sites excluded from selection for the rest of the current step.
#[derive(Clone, Debug, Default)]
pub struct ForbiddenSets {
    nodes:        SiteSet,
    destinations: SiteSet,
}

impl ForbiddenSets {
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.destinations.clear();
    }

    /// Returns `true` if `site` was newly added.
    pub fn forbid_node(&mut self, site: SiteId) -> bool {
        self.nodes.insert(site)
    }

    /// Returns `true` if `site` was newly added.
    pub fn forbid_destination(&mut self, site: SiteId) -> bool {
        self.destinations.insert(site)
    }

    #[inline]
    pub fn is_forbidden_node(&self, site: SiteId) -> bool {
        self.nodes.contains(&site)
    }

    #[inline]
    pub fn is_forbidden_destination(&self, site: SiteId) -> bool {
        self.destinations.contains(&site)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }
}

// ── Stage results ─────────────────────────────────────────────────────────────

/// The microscopic event a step commits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// The carrier in `slot` hops along `event` to the vacant site `to`.
    Jump { slot: usize, event: EventId, to: SiteId },
    /// The decay event of the carrier in `slot` fires.
    Decay { slot: usize, event: EventId },
    /// Every carrier is boxed in; only time advances.
    Idle,
}

/// Result of one Level-2 attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Commit(Selection),
    /// The destination was occupied; draw another event for the same carrier.
    RetryDestination,
    /// The carrier is surrounded; go back to Level 1.
    RetrySource,
}

// ── Selector ──────────────────────────────────────────────────────────────────

/// Owns the per-step forbidden sets and drives the two stages.
#[derive(Clone, Debug, Default)]
pub struct Selector {
    forbidden: ForbiddenSets,
    retries:   usize,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forbidden(&self) -> &ForbiddenSets {
        &self.forbidden
    }

    /// Retries (of either kind) spent by the last [`select`](Self::select).
    pub fn retries(&self) -> usize {
        self.retries
    }

    /// Run both stages until an event is committed or nothing is allowed.
    ///
    /// Both forbidden sets start empty.
    pub fn select<R: RandomSource>(
        &mut self,
        carriers:  &[Carrier],
        graph:     &SiteGraph,
        occupancy: &OccupancyMap,
        rng:       &mut R,
    ) -> Selection {
        self.forbidden.clear();
        self.retries = 0;

        'source: loop {
            let Some(slot) = self.choose_carrier(carriers, graph, rng) else {
                tracing::trace!(forbidden = self.forbidden.node_count(), "all carriers surrounded");
                return Selection::Idle;
            };
            loop {
                match self.choose_event(slot, carriers[slot].site, graph, occupancy, rng) {
                    Stage::Commit(selection) => return selection,
                    Stage::RetryDestination => {
                        self.retries += 1;
                    }
                    Stage::RetrySource => {
                        self.retries += 1;
                        continue 'source;
                    }
                }
            }
        }
    }

    /// Level 1: a carrier not on a forbidden node, weighted by escape rate.
    pub fn choose_carrier<R: RandomSource>(
        &self,
        carriers: &[Carrier],
        graph:    &SiteGraph,
        rng:      &mut R,
    ) -> Option<usize> {
        let weight = |c: &Carrier| {
            if self.forbidden.is_forbidden_node(c.site) { 0.0 } else { graph.escape_rate(c.site) }
        };
        let total: f64 = carriers.iter().map(weight).sum();
        if !(total > 0.0) {
            return None;
        }
        let target = rng.next_f64() * total;
        weighted_pick(carriers.iter().map(weight), target)
    }

    /// Level 2: one event of the carrier in `slot` sitting on `site`.
    pub fn choose_event<R: RandomSource>(
        &mut self,
        slot:      usize,
        site:      SiteId,
        graph:     &SiteGraph,
        occupancy: &OccupancyMap,
        rng:       &mut R,
    ) -> Stage {
        let total: f64 = graph.events(site).map(|e| self.event_weight(graph, e)).sum();
        if !(total > 0.0) {
            self.forbidden.forbid_node(site);
            return Stage::RetrySource;
        }
        let target = rng.next_f64() * total;
        let picked = weighted_pick(graph.events(site).map(|e| self.event_weight(graph, e)), target)
            .and_then(|i| graph.events(site).nth(i));
        let Some(event) = picked else {
            self.forbidden.forbid_node(site);
            return Stage::RetrySource;
        };

        let Some(to) = graph.destination(event) else {
            return Stage::Commit(Selection::Decay { slot, event });
        };
        if !occupancy.is_occupied(to) {
            return Stage::Commit(Selection::Jump { slot, event, to });
        }

        self.forbidden.forbid_destination(to);
        if self.is_surrounded(graph, site) {
            tracing::trace!(%site, "site surrounded by forbidden destinations");
            self.forbidden.forbid_node(site);
            Stage::RetrySource
        } else {
            Stage::RetryDestination
        }
    }

    /// `true` if no event of `site` with a positive rate is still allowed.
    pub fn is_surrounded(&self, graph: &SiteGraph, site: SiteId) -> bool {
        graph.events(site).all(|e| self.event_weight(graph, e) == 0.0)
    }

    #[inline]
    fn event_weight(&self, graph: &SiteGraph, event: EventId) -> f64 {
        match graph.destination(event) {
            Some(to) if self.forbidden.is_forbidden_destination(to) => 0.0,
            _ => graph.rate(event),
        }
    }
}

/// Index of the first weight whose running sum exceeds `target`.
///
/// Falls back to the last positive weight when rounding leaves `target` at
/// or above the computed total.
fn weighted_pick(weights: impl Iterator<Item = f64>, target: f64) -> Option<usize> {
    let mut acc = 0.0;
    let mut last_positive = None;
    for (i, w) in weights.enumerate() {
        if w > 0.0 {
            acc += w;
            last_positive = Some(i);
            if acc > target {
                return Some(i);
            }
        }
    }
    last_positive
}
