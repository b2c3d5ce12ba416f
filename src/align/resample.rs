use chrono::NaiveDateTime;
use log::debug;
use rayon::prelude::*;

use super::bucket::Buckets;
use super::grid::Resolution;
use crate::series::Series;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub ts: NaiveDateTime,
    pub value: f64,
}

/// A series reduced to one value per occupied grid point.
///
/// Points are strictly ascending by timestamp, so every grid timestamp occurs
/// at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledSeries {
    pub name: String,
    pub resolution: Resolution,
    pub points: Vec<GridPoint>,
}

impl ResampledSeries {
    pub fn value_at(&self, ts: &NaiveDateTime) -> Option<f64> {
        self.points
            .binary_search_by(|p| p.ts.cmp(ts))
            .ok()
            .map(|idx| self.points[idx].value)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.points.iter().map(|p| p.ts)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Snap every sample of `series` to the grid and reduce each bucket with the
/// series' aggregator. The input is left untouched.
pub fn resample(series: &Series, resolution: Resolution) -> ResampledSeries {
    let buckets = Buckets::collect(series.samples(), resolution);
    let aggregator = series.aggregator();

    let points: Vec<GridPoint> = buckets
        .iter()
        .filter_map(|(ts, values)| {
            aggregator
                .reduce(values)
                .map(|value| GridPoint { ts: *ts, value })
        })
        .collect();

    debug!(
        "{}: {} samples -> {} points at {}",
        series.name(),
        series.len(),
        points.len(),
        resolution
    );

    ResampledSeries {
        name: series.name().to_string(),
        resolution,
        points,
    }
}

/// Resample independent series in parallel. Output order matches input order.
pub fn resample_all(series: &[Series], resolution: Resolution) -> Vec<ResampledSeries> {
    series
        .par_iter()
        .map(|s| resample(s, resolution))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{Sample, SignalType};
    use chrono::NaiveDate;

    fn at(h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, 1)
            .and_then(|d| d.and_hms_opt(h, min, s))
            .expect("valid datetime")
    }

    fn res(minutes: u32) -> Resolution {
        Resolution::new(minutes).expect("valid resolution")
    }

    fn series(tag: &str, points: &[(NaiveDateTime, f64)]) -> Series {
        let samples = points.iter().map(|&(ts, v)| Sample::new(ts, v)).collect();
        Series::new(SignalType::from_tag(tag), samples)
    }

    #[test]
    fn test_resample_sums_cumulative_series() {
        let bolus = series("bolus", &[(at(10, 1, 0), 2.0), (at(10, 4, 0), 3.0)]);
        let out = resample(&bolus, res(5));

        assert_eq!(out.name, "bolus");
        assert_eq!(
            out.points,
            vec![
                GridPoint { ts: at(10, 0, 0), value: 2.0 },
                GridPoint { ts: at(10, 5, 0), value: 3.0 },
            ]
        );

        let out = resample(&bolus, res(15));
        assert_eq!(out.points, vec![GridPoint { ts: at(10, 0, 0), value: 5.0 }]);
    }

    #[test]
    fn test_resample_averages_level_series() {
        let cgm = series(
            "cgm",
            &[(at(10, 1, 0), 100.0), (at(10, 2, 0), 110.0), (at(10, 14, 0), 90.0)],
        );
        let out = resample(&cgm, res(5));

        assert_eq!(out.len(), 2);
        assert_eq!(out.value_at(&at(10, 0, 0)), Some(105.0));
        assert_eq!(out.value_at(&at(10, 15, 0)), Some(90.0));
        assert_eq!(out.value_at(&at(10, 5, 0)), None);
    }

    #[test]
    fn test_resample_groups_samples_that_differ_only_in_seconds() {
        let hr = series("hr", &[(at(10, 5, 10), 60.0), (at(10, 5, 50), 80.0)]);
        let out = resample(&hr, res(5));

        assert_eq!(out.points, vec![GridPoint { ts: at(10, 5, 0), value: 70.0 }]);
    }

    #[test]
    fn test_resample_orders_points_ascending_regardless_of_input_order() {
        let smbg = series(
            "smbg",
            &[(at(12, 0, 0), 3.0), (at(10, 0, 0), 1.0), (at(11, 0, 0), 2.0)],
        );
        let out = resample(&smbg, res(5));
        let ts: Vec<NaiveDateTime> = out.timestamps().collect();

        assert_eq!(ts, vec![at(10, 0, 0), at(11, 0, 0), at(12, 0, 0)]);
    }

    #[test]
    fn test_resample_is_deterministic_and_leaves_input_untouched() {
        let meal = series(
            "meal",
            &[(at(8, 2, 0), 30.0), (at(8, 3, 0), 15.0), (at(8, 2, 0), 5.0)],
        );
        let before = meal.samples().to_vec();

        let first = resample(&meal, res(5));
        let second = resample(&meal, res(5));

        assert_eq!(first, second);
        assert_eq!(meal.samples(), before.as_slice());
    }

    #[test]
    fn test_resample_empty_series_has_no_points() {
        let out = resample(&series("basal", &[]), res(5));
        assert!(out.is_empty());
    }

    #[test]
    fn test_resample_all_keeps_input_order() {
        let all = vec![
            series("cgm", &[(at(10, 0, 0), 100.0)]),
            series("basal", &[(at(10, 0, 0), 1.0)]),
            series("bolus", &[(at(10, 0, 0), 2.0)]),
        ];
        let names: Vec<String> = resample_all(&all, res(5))
            .into_iter()
            .map(|s| s.name)
            .collect();

        assert_eq!(names, vec!["cgm", "basal", "bolus"]);
    }
}
