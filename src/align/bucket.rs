use chrono::NaiveDateTime;
use log::warn;

use std::collections::BTreeMap;

use super::grid::{Resolution, round_to_grid};
use crate::series::Sample;

/// Reducer applied to the values that share one grid point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregator {
    Sum,
    Average,
}

impl Aggregator {
    /// Reduce one bucket. Returns `None` for an empty bucket so that "no
    /// samples" is never mistaken for an aggregate of zero.
    pub fn reduce(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        let sum: f64 = values.iter().copied().sum();
        match self {
            Aggregator::Sum => Some(sum),
            Aggregator::Average => Some(sum / values.len() as f64),
        }
    }
}

/// Values grouped by the grid point their timestamp rounds to.
///
/// Built in a single pass; within a bucket values keep the order of the
/// samples they came from.
#[derive(Debug, Default)]
pub struct Buckets {
    groups: BTreeMap<NaiveDateTime, Vec<f64>>,
}

impl Buckets {
    pub fn collect(samples: &[Sample], resolution: Resolution) -> Self {
        let mut groups: BTreeMap<NaiveDateTime, Vec<f64>> = BTreeMap::new();

        for s in samples {
            let Some(grid_ts) = round_to_grid(s.ts, resolution) else {
                warn!(
                    "sample at {} has no {} grid point in range, skipping it",
                    s.ts, resolution
                );
                continue;
            };
            groups.entry(grid_ts).or_default().push(s.value);
        }

        Self { groups }
    }

    /// Raw values that landed on `grid_ts`, or `None` if no sample did.
    pub fn values_at(&self, grid_ts: &NaiveDateTime) -> Option<&[f64]> {
        self.groups
            .get(grid_ts)
            .map(Vec::as_slice)
            .filter(|values| !values.is_empty())
    }

    /// Occupied grid points with their values, ascending by timestamp.
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDateTime, &[f64])> {
        self.groups.iter().map(|(ts, values)| (ts, values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
