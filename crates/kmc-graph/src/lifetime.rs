//! Per-site lifetime tables and decay probabilities.
//!
//! In lifetime mode every site needs exactly one decay event.  A lifetime
//! table lists one finite lifetime τ per site; applying it attaches a decay
//! event of rate `1/τ` to that site.

use kmc_core::SiteId;

use crate::{GraphError, GraphResult, SiteGraph, SiteGraphBuilder};

/// One row of a lifetime table.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LifetimeRecord {
    pub site:     SiteId,
    /// Lifetime in seconds.
    pub lifetime: f64,
}

/// Attach a decay event of rate `1/lifetime` to every site in `records`.
///
/// The table must cover the graph exactly: one row per site, no site twice,
/// no site that already carries a decay event.
pub fn apply_lifetimes(builder: &mut SiteGraphBuilder, records: &[LifetimeRecord]) -> GraphResult<()> {
    if records.len() != builder.site_count() {
        return Err(GraphError::LifetimeCount {
            sites: builder.site_count(),
            rows:  records.len(),
        });
    }
    for r in records {
        if r.site.index() >= builder.site_count() {
            return Err(GraphError::UnknownSite(r.site));
        }
        if !r.lifetime.is_finite() || r.lifetime <= 0.0 {
            return Err(GraphError::InvalidLifetime { site: r.site, lifetime: r.lifetime });
        }
        builder.add_decay(r.site, 1.0 / r.lifetime)?;
    }
    tracing::debug!(sites = records.len(), "applied lifetime table");
    Ok(())
}

/// How likely a carrier on a site decays rather than hops.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DecayProbability {
    pub site:     SiteId,
    /// `λ / (Σ outgoing hop rates + λ)`.
    pub outgoing: f64,
    /// `λ / (Σ incoming hop rates + λ)`.
    pub incoming: f64,
}

impl SiteGraph {
    /// Relative decay probability of every site against its outgoing and
    /// incoming hop rates.  Sites without a decay event report zero.
    pub fn decay_probabilities(&self) -> Vec<DecayProbability> {
        let n = self.site_count();
        let mut out_rate   = vec![0.0_f64; n];
        let mut in_rate    = vec![0.0_f64; n];
        let mut decay_rate = vec![0.0_f64; n];

        for i in 0..self.event_count() {
            let from = self.event_from[i].index();
            if self.event_decay[i] {
                decay_rate[from] += self.event_rate[i];
            } else {
                out_rate[from] += self.event_rate[i];
                in_rate[self.event_to[i].index()] += self.event_rate[i];
            }
        }

        let ratio = |lambda: f64, other: f64| {
            if lambda > 0.0 { lambda / (other + lambda) } else { 0.0 }
        };

        self.site_ids()
            .map(|site| {
                let i = site.index();
                DecayProbability {
                    site,
                    outgoing: ratio(decay_rate[i], out_rate[i]),
                    incoming: ratio(decay_rate[i], in_rate[i]),
                }
            })
            .collect()
    }
}
