pub mod bucket;
pub mod grid;
pub mod merge;
pub mod resample;

pub use bucket::{Aggregator, Buckets};
pub use grid::{Resolution, round_to_grid};
pub use merge::{AlignedTable, FILL_VALUE, Row, merge};
pub use resample::{GridPoint, ResampledSeries, resample, resample_all};

use crate::error::AlignError;
use crate::series::Series;

/// Resample every series at `resolution` and join them onto the `key` series.
pub fn align(
    series: &[Series],
    key: &str,
    resolution: Resolution,
) -> Result<AlignedTable, AlignError> {
    merge(&resample_all(series, resolution), key)
}
