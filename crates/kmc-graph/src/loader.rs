//! CSV loaders for the site graph and lifetime tables.
//!
//! # CSV formats
//!
//! `sites.csv`: one row per site, ids dense from 0 and in order.  `kind`
//! and `occupied` may be left empty:
//!
//! ```csv
//! id,x,y,z,energy,kind,occupied
//! 0,0.0,0.0,0.0,-5.1,DCV,0
//! 1,0.9,0.1,0.0,-5.0,DCV,0
//! ```
//!
//! `events.csv`: one row per directed event.  **`to`** is a site id or the
//! literal `decay`.  An empty displacement defaults to `pos[to] - pos[from]`:
//!
//! ```csv
//! from,to,rate,dx,dy,dz
//! 0,1,1.5e12,0.9,0.1,0.0
//! 1,0,2.0e11,,,
//! 0,decay,1.0e9,,,
//! ```
//!
//! `lifetimes.csv`: one row per site, lifetime in seconds:
//!
//! ```csv
//! site_id,lifetime
//! 0,1.0e-9
//! ```

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use kmc_core::{SiteId, Vec3};

use crate::{apply_lifetimes, GraphError, GraphResult, LifetimeRecord, SiteGraph, SiteGraphBuilder};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SiteRecord {
    id:       u32,
    x:        f64,
    y:        f64,
    z:        f64,
    energy:   f64,
    #[serde(default)]
    kind:     Option<String>,
    #[serde(default)]
    occupied: Option<u8>,
}

#[derive(Deserialize)]
struct EventRecord {
    from: u32,
    to:   String,
    rate: f64,
    #[serde(default)]
    dx:   Option<f64>,
    #[serde(default)]
    dy:   Option<f64>,
    #[serde(default)]
    dz:   Option<f64>,
}

#[derive(Deserialize)]
struct LifetimeRow {
    site_id:  u32,
    lifetime: f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a complete graph from CSV files, optionally applying a lifetime table.
pub fn load_graph_csv(
    sites:     &Path,
    events:    &Path,
    lifetimes: Option<&Path>,
) -> GraphResult<SiteGraph> {
    let mut builder = load_sites_reader(std::fs::File::open(sites)?)?;
    load_events_reader(std::fs::File::open(events)?, &mut builder)?;
    if let Some(path) = lifetimes {
        let records = load_lifetimes_csv(path)?;
        apply_lifetimes(&mut builder, &records)?;
    }
    let graph = builder.build()?;
    tracing::info!(
        sites  = graph.site_count(),
        events = graph.event_count(),
        "loaded site graph",
    );
    Ok(graph)
}

/// Read sites into a fresh builder.  Accepts any `Read` source.
pub fn load_sites_reader<R: Read>(reader: R) -> GraphResult<SiteGraphBuilder> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut builder = SiteGraphBuilder::new();

    for result in csv_reader.deserialize::<SiteRecord>() {
        let row = result.map_err(|e| GraphError::Parse(e.to_string()))?;
        let expected = builder.site_count() as u32;
        if row.id != expected {
            return Err(GraphError::NonDenseIds { expected, found: row.id });
        }
        builder.add_site_with(
            Vec3::new(row.x, row.y, row.z),
            row.energy,
            row.kind.as_deref().unwrap_or(""),
            row.occupied.unwrap_or(0) != 0,
        );
    }
    Ok(builder)
}

/// Read events into an existing builder (sites must already be loaded).
pub fn load_events_reader<R: Read>(reader: R, builder: &mut SiteGraphBuilder) -> GraphResult<()> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    for result in csv_reader.deserialize::<EventRecord>() {
        let row = result.map_err(|e| GraphError::Parse(e.to_string()))?;
        let from = SiteId(row.from);
        match row.to.trim() {
            "decay" => builder.add_decay(from, row.rate)?,
            n => {
                let to = n
                    .parse::<u32>()
                    .map(SiteId)
                    .map_err(|_| {
                        GraphError::Parse(format!(
                            "invalid destination {n:?}: expected \"decay\" or a site id (u32)"
                        ))
                    })?;
                match (row.dx, row.dy, row.dz) {
                    (Some(dx), Some(dy), Some(dz)) => {
                        builder.add_hop(from, to, row.rate, Vec3::new(dx, dy, dz));
                    }
                    (None, None, None) => builder.add_hop_between(from, to, row.rate),
                    _ => {
                        return Err(GraphError::Parse(format!(
                            "event {from} -> {to}: displacement must give all of dx, dy, dz or none"
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Load a lifetime table from a CSV file.
pub fn load_lifetimes_csv(path: &Path) -> GraphResult<Vec<LifetimeRecord>> {
    load_lifetimes_reader(std::fs::File::open(path)?)
}

/// Like [`load_lifetimes_csv`] but accepts any `Read` source.
pub fn load_lifetimes_reader<R: Read>(reader: R) -> GraphResult<Vec<LifetimeRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize::<LifetimeRow>()
        .map(|result| {
            let row = result.map_err(|e| GraphError::Parse(e.to_string()))?;
            Ok(LifetimeRecord { site: SiteId(row.site_id), lifetime: row.lifetime })
        })
        .collect()
}
