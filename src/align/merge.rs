use chrono::NaiveDateTime;

use std::collections::{HashMap, HashSet};

use super::resample::ResampledSeries;
use crate::error::AlignError;

/// Value written for a grid point a series has no data for.
pub const FILL_VALUE: f64 = 0.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub ts: NaiveDateTime,
    /// One value per column, in `AlignedTable::columns` order.
    pub values: Vec<f64>,
}

/// Resampled series joined on grid timestamp. The rows are exactly the grid
/// points of the key series, which is always the first column.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl AlignedTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn key(&self) -> &str {
        &self.columns[0]
    }

    /// Cell lookup. `None` means the row or column does not exist; a cell
    /// that was filled reads as `FILL_VALUE`.
    pub fn value(&self, ts: &NaiveDateTime, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|row| row.ts == *ts)
            .map(|row| row.values[col])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Left-join every series onto the grid points of the `key` series.
///
/// Column order is the input order with the key moved to the front. Grid
/// points of other series that the key series lacks are dropped; key rows a
/// series has no value for get `FILL_VALUE`.
pub fn merge(series: &[ResampledSeries], key: &str) -> Result<AlignedTable, AlignError> {
    let mut seen = HashSet::new();
    for s in series {
        if !seen.insert(s.name.as_str()) {
            return Err(AlignError::DuplicateSeries(s.name.clone()));
        }
    }

    let key_series = series
        .iter()
        .find(|s| s.name == key)
        .ok_or_else(|| AlignError::KeySeriesNotFound {
            key: key.to_string(),
            available: series.iter().map(|s| s.name.clone()).collect(),
        })?;

    let others: Vec<&ResampledSeries> = series.iter().filter(|s| s.name != key).collect();
    let lookups: Vec<HashMap<NaiveDateTime, f64>> = others
        .iter()
        .map(|s| s.points.iter().map(|p| (p.ts, p.value)).collect())
        .collect();

    let mut columns = Vec::with_capacity(series.len());
    columns.push(key_series.name.clone());
    columns.extend(others.iter().map(|s| s.name.clone()));

    let rows = key_series
        .points
        .iter()
        .map(|p| {
            let mut values = Vec::with_capacity(columns.len());
            values.push(p.value);
            values.extend(
                lookups
                    .iter()
                    .map(|lookup| lookup.get(&p.ts).copied().unwrap_or(FILL_VALUE)),
            );
            Row { ts: p.ts, values }
        })
        .collect();

    Ok(AlignedTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{GridPoint, Resolution};
    use chrono::NaiveDate;

    fn at(h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, 1)
            .and_then(|d| d.and_hms_opt(h, min, 0))
            .expect("valid datetime")
    }

    fn resampled(name: &str, points: &[(NaiveDateTime, f64)]) -> ResampledSeries {
        ResampledSeries {
            name: name.to_string(),
            resolution: Resolution::new(5).unwrap(),
            points: points
                .iter()
                .map(|&(ts, value)| GridPoint { ts, value })
                .collect(),
        }
    }

    #[test]
    fn test_merge_rows_come_only_from_key_series() {
        let (t1, t2, t3, t4) = (at(10, 0), at(10, 5), at(10, 10), at(10, 15));
        let key = resampled("cgm", &[(t1, 100.0), (t2, 110.0), (t3, 120.0)]);
        let other = resampled("basal", &[(t1, 1.5), (t4, 2.0)]);

        let table = merge(&[key, other], "cgm").unwrap();
        let ts: Vec<NaiveDateTime> = table.rows().iter().map(|r| r.ts).collect();

        assert_eq!(ts, vec![t1, t2, t3]);
        assert_eq!(table.value(&t1, "basal"), Some(1.5));
        assert_eq!(table.value(&t2, "basal"), Some(0.0));
        assert_eq!(table.value(&t3, "basal"), Some(0.0));
        assert_eq!(table.value(&t4, "basal"), None);
    }

    #[test]
    fn test_merge_forces_key_column_first_and_keeps_other_order() {
        let t = at(10, 0);
        let series = vec![
            resampled("basal", &[(t, 1.0)]),
            resampled("bolus", &[(t, 2.0)]),
            resampled("cgm", &[(t, 100.0)]),
            resampled("meal", &[(t, 30.0)]),
        ];

        let table = merge(&series, "cgm").unwrap();

        assert_eq!(table.columns(), ["cgm", "basal", "bolus", "meal"]);
        assert_eq!(table.key(), "cgm");
        assert_eq!(table.rows()[0].values, vec![100.0, 1.0, 2.0, 30.0]);
    }

    #[test]
    fn test_merge_unknown_key_is_an_error() {
        let series = vec![resampled("cgm", &[]), resampled("hr", &[])];
        let err = merge(&series, "smbg").unwrap_err();

        assert_eq!(
            err,
            AlignError::KeySeriesNotFound {
                key: "smbg".to_string(),
                available: vec!["cgm".to_string(), "hr".to_string()],
            }
        );
    }

    #[test]
    fn test_merge_duplicate_series_is_an_error() {
        let series = vec![resampled("cgm", &[]), resampled("cgm", &[])];
        assert_eq!(
            merge(&series, "cgm"),
            Err(AlignError::DuplicateSeries("cgm".to_string()))
        );
    }

    #[test]
    fn test_merge_key_only_and_empty_key() {
        let table = merge(&[resampled("cgm", &[(at(9, 0), 90.0)])], "cgm").unwrap();
        assert_eq!(table.columns(), ["cgm"]);
        assert_eq!(table.len(), 1);

        let table = merge(
            &[resampled("cgm", &[]), resampled("bolus", &[(at(9, 0), 1.0)])],
            "cgm",
        )
        .unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), ["cgm", "bolus"]);
    }
}
