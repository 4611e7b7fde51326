//! Site graph representation and builder.
//!
//! # Data layout
//!
//! Sites live in a flat arena of parallel arrays indexed by `SiteId`.
//! Outgoing events use **Compressed Sparse Row (CSR)** format: the events of
//! site `s` occupy the `EventId` range
//!
//! ```text
//! site_out_start[s] .. site_out_start[s+1]
//! ```
//!
//! in every `event_*` array, in the order they were added to the builder.
//! Selecting a destination is therefore a contiguous scan of one slice.
//!
//! Decay events have `event_to == SiteId::INVALID` and `event_decay == true`.
//! Escape rates (sum of all outgoing rates, decay included) are computed once
//! at build time since events are immutable for the whole run.

use std::ops::Range;

use kmc_core::{EventId, SiteId, Vec3};

use crate::{GraphError, GraphResult};

// ── SiteGraph ─────────────────────────────────────────────────────────────────

/// Sites plus their outgoing hop and decay events.
///
/// All fields are `pub` for direct indexed access on the engine's hot path.
/// Do not construct directly; use [`SiteGraphBuilder`].  The two occupation
/// arrays are the only state that changes during a run.
#[derive(Clone, Debug)]
pub struct SiteGraph {
    // ── Site data ─────────────────────────────────────────────────────────
    /// Site position in nm.
    pub site_pos: Vec<Vec3>,

    /// Site energy in eV.
    pub site_energy: Vec<f64>,

    /// Site type label, matched by the injection pattern.
    pub site_kind: Vec<String>,

    /// Externally occupied sites.  A blocked site never hosts a carrier and
    /// counts as occupied for the whole run.
    pub site_blocked: Vec<bool>,

    /// `true` if the site owns a decay event.
    pub site_has_decay: Vec<bool>,

    /// Sum of all outgoing event rates (1/s).
    pub site_escape_rate: Vec<f64>,

    /// Accumulated time (s) a carrier has spent on each site.
    pub occupation_time: Vec<f64>,

    /// `occupation_time / total simulated time`, written at the end of a run.
    pub occupation_probability: Vec<f64>,

    // ── CSR event adjacency ───────────────────────────────────────────────
    /// CSR row pointer.  Length = `site_count + 1`.
    pub site_out_start: Vec<u32>,

    // ── Event data (indexed by EventId) ───────────────────────────────────
    pub event_from: Vec<SiteId>,

    /// Destination site, `SiteId::INVALID` for decay events.
    pub event_to: Vec<SiteId>,

    /// Rate in 1/s.
    pub event_rate: Vec<f64>,

    /// Displacement in nm carried by the hop (zero for decay events).
    pub event_dr: Vec<Vec3>,

    pub event_decay: Vec<bool>,
}

impl SiteGraph {
    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn site_count(&self) -> usize {
        self.site_pos.len()
    }

    pub fn event_count(&self) -> usize {
        self.event_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.site_pos.is_empty()
    }

    pub fn contains(&self, site: SiteId) -> bool {
        site.index() < self.site_count()
    }

    /// Iterator over all site ids in ascending order.
    pub fn site_ids(&self) -> impl Iterator<Item = SiteId> + '_ {
        (0..self.site_count() as u32).map(SiteId)
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    #[inline]
    fn event_range(&self, site: SiteId) -> Range<usize> {
        let start = self.site_out_start[site.index()] as usize;
        let end   = self.site_out_start[site.index() + 1] as usize;
        start..end
    }

    /// The outgoing events of `site`, in insertion order.
    #[inline]
    pub fn events(&self, site: SiteId) -> impl Iterator<Item = EventId> + '_ {
        self.event_range(site).map(|i| EventId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, site: SiteId) -> usize {
        self.event_range(site).len()
    }

    #[inline]
    pub fn escape_rate(&self, site: SiteId) -> f64 {
        self.site_escape_rate[site.index()]
    }

    #[inline]
    pub fn is_decay(&self, event: EventId) -> bool {
        self.event_decay[event.index()]
    }

    /// Destination of a hop event, `None` for a decay event.
    #[inline]
    pub fn destination(&self, event: EventId) -> Option<SiteId> {
        if self.event_decay[event.index()] {
            None
        } else {
            Some(self.event_to[event.index()])
        }
    }

    #[inline]
    pub fn rate(&self, event: EventId) -> f64 {
        self.event_rate[event.index()]
    }

    #[inline]
    pub fn displacement(&self, event: EventId) -> Vec3 {
        self.event_dr[event.index()]
    }

    /// Longest hop displacement in the graph (0 if there are no hops).
    pub fn max_jump_length(&self) -> f64 {
        self.event_dr
            .iter()
            .zip(&self.event_decay)
            .filter(|&(_, &decay)| !decay)
            .map(|(dr, _)| dr.norm())
            .fold(0.0, f64::max)
    }

    // ── Occupation bookkeeping ────────────────────────────────────────────

    /// Zero both occupation arrays (start of a run).
    pub fn reset_occupation(&mut self) {
        self.occupation_time.fill(0.0);
        self.occupation_probability.fill(0.0);
    }

    /// Convert accumulated occupation times into probabilities.
    ///
    /// Leaves probabilities at zero when no time has elapsed.
    pub fn finalize_occupation(&mut self, total_time: f64) {
        if total_time > 0.0 {
            for (p, &t) in self.occupation_probability.iter_mut().zip(&self.occupation_time) {
                *p = t / total_time;
            }
        }
    }
}

// ── SiteGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`SiteGraph`] incrementally, then call [`build`](Self::build).
///
/// Events may be added in any order.  `build()` groups them by source site
/// with a stable sort, so each site keeps its events in insertion order.
///
/// # Example
///
/// ```
/// use kmc_core::Vec3;
/// use kmc_graph::SiteGraphBuilder;
///
/// let mut b = SiteGraphBuilder::new();
/// let a = b.add_site(Vec3::new(0.0, 0.0, 0.0), 0.0);
/// let c = b.add_site(Vec3::new(1.0, 0.0, 0.0), 0.0);
/// b.add_pair(a, c, 1.0e12, 1.0e12); // forward and backward hop
/// let graph = b.build().unwrap();
/// assert_eq!(graph.site_count(), 2);
/// assert_eq!(graph.event_count(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SiteGraphBuilder {
    positions: Vec<Vec3>,
    energies:  Vec<f64>,
    kinds:     Vec<String>,
    blocked:   Vec<bool>,
    has_decay: Vec<bool>,
    raw_events: Vec<RawEvent>,
}

#[derive(Clone, Debug)]
struct RawEvent {
    from:  SiteId,
    to:    SiteId,
    rate:  f64,
    dr:    Vec3,
    decay: bool,
}

impl SiteGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate for the expected number of sites and events.
    pub fn with_capacity(sites: usize, events: usize) -> Self {
        Self {
            positions:  Vec::with_capacity(sites),
            energies:   Vec::with_capacity(sites),
            kinds:      Vec::with_capacity(sites),
            blocked:    Vec::with_capacity(sites),
            has_decay:  Vec::with_capacity(sites),
            raw_events: Vec::with_capacity(events),
        }
    }

    /// Add a free site with an empty kind label and return its `SiteId`
    /// (sequential from 0).
    pub fn add_site(&mut self, pos: Vec3, energy: f64) -> SiteId {
        self.add_site_with(pos, energy, "", false)
    }

    /// Add a site with an explicit kind label and external-occupation flag.
    pub fn add_site_with(&mut self, pos: Vec3, energy: f64, kind: &str, blocked: bool) -> SiteId {
        let id = SiteId(self.positions.len() as u32);
        self.positions.push(pos);
        self.energies.push(energy);
        self.kinds.push(kind.to_string());
        self.blocked.push(blocked);
        self.has_decay.push(false);
        id
    }

    /// Add a directed hop with an explicit displacement.  Validated in `build`.
    pub fn add_hop(&mut self, from: SiteId, to: SiteId, rate: f64, dr: Vec3) {
        self.raw_events.push(RawEvent { from, to, rate, dr, decay: false });
    }

    /// Add a directed hop whose displacement is `pos[to] - pos[from]`.
    ///
    /// Unknown endpoints are recorded with a zero displacement and rejected
    /// by `build`.
    pub fn add_hop_between(&mut self, from: SiteId, to: SiteId, rate: f64) {
        let dr = match (self.positions.get(from.index()), self.positions.get(to.index())) {
            (Some(a), Some(b)) => b - a,
            _ => Vec3::zeros(),
        };
        self.add_hop(from, to, rate, dr);
    }

    /// Convenience: hops in both directions with displacements from positions.
    pub fn add_pair(&mut self, a: SiteId, b: SiteId, rate_ab: f64, rate_ba: f64) {
        self.add_hop_between(a, b, rate_ab);
        self.add_hop_between(b, a, rate_ba);
    }

    /// Attach a decay event of `rate` to `site`.
    ///
    /// A site carries at most one decay event.
    pub fn add_decay(&mut self, site: SiteId, rate: f64) -> GraphResult<()> {
        let flag = self
            .has_decay
            .get_mut(site.index())
            .ok_or(GraphError::UnknownSite(site))?;
        if *flag {
            return Err(GraphError::DuplicateDecay(site));
        }
        *flag = true;
        self.raw_events.push(RawEvent {
            from:  site,
            to:    SiteId::INVALID,
            rate,
            dr:    Vec3::zeros(),
            decay: true,
        });
        Ok(())
    }

    pub fn site_count(&self) -> usize { self.positions.len() }
    pub fn event_count(&self) -> usize { self.raw_events.len() }

    pub fn has_decay(&self, site: SiteId) -> bool {
        self.has_decay.get(site.index()).copied().unwrap_or(false)
    }

    /// Validate all events and produce a [`SiteGraph`].
    ///
    /// Time complexity: O(E log E) for the stable sort by source site.
    pub fn build(self) -> GraphResult<SiteGraph> {
        let site_count = self.positions.len();

        for e in &self.raw_events {
            if e.from.index() >= site_count {
                return Err(GraphError::UnknownSite(e.from));
            }
            if !e.decay {
                if e.to.index() >= site_count {
                    return Err(GraphError::UnknownSite(e.to));
                }
                if e.to == e.from {
                    return Err(GraphError::SelfLoop(e.from));
                }
            }
            if !e.rate.is_finite() || e.rate < 0.0 {
                return Err(GraphError::InvalidRate { from: e.from, rate: e.rate });
            }
        }

        // Stable sort keeps each site's events in insertion order.
        let mut raw = self.raw_events;
        raw.sort_by_key(|e| e.from.0);

        let event_from:  Vec<SiteId> = raw.iter().map(|e| e.from).collect();
        let event_to:    Vec<SiteId> = raw.iter().map(|e| e.to).collect();
        let event_rate:  Vec<f64>    = raw.iter().map(|e| e.rate).collect();
        let event_dr:    Vec<Vec3>   = raw.iter().map(|e| e.dr).collect();
        let event_decay: Vec<bool>   = raw.iter().map(|e| e.decay).collect();

        let mut site_out_start = vec![0u32; site_count + 1];
        let mut site_escape_rate = vec![0.0_f64; site_count];
        for e in &raw {
            site_out_start[e.from.index() + 1] += 1;
            site_escape_rate[e.from.index()] += e.rate;
        }
        for i in 1..=site_count {
            site_out_start[i] += site_out_start[i - 1];
        }
        debug_assert_eq!(site_out_start[site_count] as usize, raw.len());

        Ok(SiteGraph {
            site_pos:               self.positions,
            site_energy:            self.energies,
            site_kind:              self.kinds,
            site_blocked:           self.blocked,
            site_has_decay:         self.has_decay,
            site_escape_rate,
            occupation_time:        vec![0.0; site_count],
            occupation_probability: vec![0.0; site_count],
            site_out_start,
            event_from,
            event_to,
            event_rate,
            event_dr,
            event_decay,
        })
    }
}
