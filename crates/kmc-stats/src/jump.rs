//! Histogram of committed hop lengths.

use crate::{StatsError, StatsResult};

/// Equal-width bins from 0 to the longest hop in the graph.
///
/// Lengths at or beyond the upper edge land in the last bin.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JumpHistogram {
    pub bin_width: f64,
    pub counts:    Vec<u64>,
}

impl JumpHistogram {
    pub fn new(max_length: f64, bins: usize) -> StatsResult<Self> {
        if bins == 0 {
            return Err(StatsError::NoBins);
        }
        if !(max_length > 0.0) {
            return Err(StatsError::NoHops);
        }
        Ok(Self { bin_width: max_length / bins as f64, counts: vec![0; bins] })
    }

    pub fn record(&mut self, length: f64) {
        let last = self.counts.len() - 1;
        let bin = ((length / self.bin_width) as usize).min(last);
        self.counts[bin] += 1;
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `(lower edge, upper edge, count)` per bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, u64)> + '_ {
        self.counts.iter().enumerate().map(|(i, &n)| {
            let lo = i as f64 * self.bin_width;
            (lo, lo + self.bin_width, n)
        })
    }
}
