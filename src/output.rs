use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::align::{AlignedTable, Resolution};
use crate::config::OutputFormat;
use crate::data::ImportReport;

/// Layout of the time column in written tables.
pub const TIME_FORMAT: &str = "%m/%d/%Y %H:%M";
pub const TIME_HEADER: &str = "time";

pub fn format_time(ts: &NaiveDateTime) -> String {
    ts.format(TIME_FORMAT).to_string()
}

/// `out.csv` becomes `out_15.csv` when a run writes several resolutions.
pub fn output_path_for(base: &Path, resolution: Resolution, several: bool) -> PathBuf {
    if !several {
        return base.to_path_buf();
    }

    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{stem}_{}.{}", resolution.minutes(), ext.to_string_lossy()),
        None => format!("{stem}_{}", resolution.minutes()),
    };
    base.with_file_name(name)
}

pub fn write_csv<W: Write>(table: &AlignedTable, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(table.columns().len() + 1);
    header.push(TIME_HEADER);
    header.extend(table.columns().iter().map(String::as_str));
    wtr.write_record(&header)?;

    for row in table.rows() {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(format_time(&row.ts));
        record.extend(row.values.iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonTable<'a> {
    columns: &'a [String],
    rows: Vec<JsonRow<'a>>,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    time: String,
    values: &'a [f64],
}

pub fn write_json<W: Write>(table: &AlignedTable, writer: W) -> Result<()> {
    let doc = JsonTable {
        columns: table.columns(),
        rows: table
            .rows()
            .iter()
            .map(|row| JsonRow {
                time: format_time(&row.ts),
                values: &row.values,
            })
            .collect(),
    };
    serde_json::to_writer_pretty(writer, &doc)?;
    Ok(())
}

pub fn write_table(table: &AlignedTable, path: &Path, format: OutputFormat) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create output file: {:?}", path))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Csv => write_csv(table, &mut writer),
        OutputFormat::Json => write_json(table, &mut writer),
    }
    .with_context(|| format!("failed to write table to {:?}", path))?;

    writer
        .flush()
        .with_context(|| format!("failed to flush {:?}", path))
}

#[derive(Debug, Clone)]
pub struct TableReport {
    pub resolution: Resolution,
    pub path: PathBuf,
    pub rows: usize,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub series: usize,
    pub import: ImportReport,
    pub tables: Vec<TableReport>,
}

pub fn print_summary(summary: &RunSummary) {
    println!("Series imported:   {}", summary.series);
    println!("Records accepted:  {}", summary.import.accepted);
    println!("Records skipped:   {}", summary.import.skipped);
    println!("Values replaced:   {}", summary.import.substituted);

    for table in &summary.tables {
        println!(
            "{:>6} grid:       {} rows x [{}] -> {}",
            table.resolution.to_string(),
            table.rows,
            table.columns.join(", "),
            table.path.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{GridPoint, ResampledSeries, merge};
    use chrono::NaiveDate;

    fn at(h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, 1)
            .and_then(|d| d.and_hms_opt(h, min, 0))
            .expect("valid datetime")
    }

    fn table() -> AlignedTable {
        let res = Resolution::new(5).unwrap();
        let cgm = ResampledSeries {
            name: "cgm".to_string(),
            resolution: res,
            points: vec![
                GridPoint { ts: at(10, 0), value: 100.0 },
                GridPoint { ts: at(10, 5), value: 112.5 },
            ],
        };
        let bolus = ResampledSeries {
            name: "bolus".to_string(),
            resolution: res,
            points: vec![GridPoint { ts: at(10, 0), value: 5.0 }],
        };
        merge(&[bolus, cgm], "cgm").unwrap()
    }

    #[test]
    fn test_write_csv_time_first_then_merge_order_with_zero_fill() {
        let mut buf = Vec::new();
        write_csv(&table(), &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "time,cgm,bolus\n01/01/2019 10:00,100,5\n01/01/2019 10:05,112.5,0\n"
        );
    }

    #[test]
    fn test_write_json_uses_same_time_layout() {
        let mut buf = Vec::new();
        write_json(&table(), &mut buf).unwrap();

        let doc: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(doc["columns"], serde_json::json!(["cgm", "bolus"]));
        assert_eq!(doc["rows"][1]["time"], "01/01/2019 10:05");
        assert_eq!(doc["rows"][1]["values"], serde_json::json!([112.5, 0.0]));
    }

    #[test]
    fn test_output_path_for_single_resolution_is_unchanged() {
        let res = Resolution::new(5).unwrap();
        assert_eq!(
            output_path_for(Path::new("out/aligned.csv"), res, false),
            PathBuf::from("out/aligned.csv")
        );
    }

    #[test]
    fn test_output_path_for_several_resolutions_suffixes_stem() {
        let res = Resolution::new(15).unwrap();
        assert_eq!(
            output_path_for(Path::new("out/aligned.csv"), res, true),
            PathBuf::from("out/aligned_15.csv")
        );
        assert_eq!(
            output_path_for(Path::new("aligned"), res, true),
            PathBuf::from("aligned_15")
        );
    }
}
