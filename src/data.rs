use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime};
use csv::{ReaderBuilder, Trim};
use log::{info, warn};
use serde::Deserialize;

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::series::{Sample, Series};

/// Numeric stand-in for a CGM reading reported as "low".
pub const LOW_READING: f64 = 40.0;
/// Numeric stand-in for a CGM reading reported as "high".
pub const HIGH_READING: f64 = 300.0;

const TIME_COLUMN: &str = "time";
const VALUE_COLUMN: &str = "value";

/// Accepted naive layouts, tried in order after RFC 3339. Two-digit years come
/// before four-digit ones since `%Y` would also accept "19".
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Both fields stay textual so one bad cell only costs its own record.
#[derive(Debug, Deserialize)]
pub struct RawRecord {
    pub time: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub accepted: usize,
    pub skipped: usize,
    pub substituted: usize,
}

impl ImportReport {
    pub fn absorb(&mut self, other: ImportReport) {
        self.accepted += other.accepted;
        self.skipped += other.skipped;
        self.substituted += other.substituted;
    }
}

#[derive(Debug, Clone)]
pub struct ImportedSeries {
    pub path: PathBuf,
    pub series: Series,
    pub report: ImportReport,
}

/// Parse a timestamp in any of the supported layouts. Offsets are accepted but
/// the wall-clock time is kept as written.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedValue {
    Number(f64),
    Substituted(f64),
    Invalid,
}

/// Parse a measurement. Only the exact cells "low" and "high" map to
/// `LOW_READING` and `HIGH_READING`; numbers may carry surrounding
/// whitespace. Anything else that is not a finite number is invalid.
pub fn parse_value(raw: &str) -> ParsedValue {
    match raw {
        "low" => ParsedValue::Substituted(LOW_READING),
        "high" => ParsedValue::Substituted(HIGH_READING),
        _ => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => ParsedValue::Number(v),
            _ => ParsedValue::Invalid,
        },
    }
}

/// Read `time,value` records. Malformed records are logged and dropped as a
/// whole; only a missing header is fatal.
pub fn read_samples<R: Read>(reader: R, source: &str) -> Result<(Vec<Sample>, ImportReport)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .with_context(|| format!("failed to read CSV header of {source}"))?;
    for column in [TIME_COLUMN, VALUE_COLUMN] {
        if !headers.iter().any(|h| h == column) {
            bail!("{source}: missing required column {column:?}");
        }
    }

    let mut samples: Vec<Sample> = Vec::new();
    let mut report = ImportReport::default();

    for (idx, result) in rdr.deserialize::<RawRecord>().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                warn!("{source}:{line}: unreadable record, skipping ({err})");
                report.skipped += 1;
                continue;
            }
        };

        let Some(ts) = parse_timestamp(&record.time) else {
            warn!(
                "{source}:{line}: time {:?} is not properly formatted, skipping record",
                record.time
            );
            report.skipped += 1;
            continue;
        };

        let value = match parse_value(&record.value) {
            ParsedValue::Number(v) => v,
            ParsedValue::Substituted(v) => {
                warn!("{source}:{line}: replacing value {:?} with {v}", record.value);
                report.substituted += 1;
                v
            }
            ParsedValue::Invalid => {
                warn!(
                    "{source}:{line}: value {:?} is not properly formatted, skipping record",
                    record.value
                );
                report.skipped += 1;
                continue;
            }
        };

        samples.push(Sample::new(ts, value));
        report.accepted += 1;
    }

    Ok((samples, report))
}

/// Import one file as a series; the signal type comes from its file name.
pub fn import_series(path: &Path) -> Result<ImportedSeries> {
    let file =
        File::open(path).with_context(|| format!("failed to open input file: {:?}", path))?;
    let source = path.display().to_string();

    let (samples, report) = read_samples(file, &source)?;
    if samples.is_empty() {
        warn!("{source}: no usable records");
    }

    let series = Series::from_path(path, samples)
        .with_context(|| format!("failed to classify {source}"))?;

    info!(
        "{source}: imported {} records as {:?} ({} skipped, {} substituted)",
        report.accepted,
        series.name(),
        report.skipped,
        report.substituted
    );

    Ok(ImportedSeries {
        path: path.to_path_buf(),
        series,
        report,
    })
}

/// Files in `dir` whose extension matches, sorted by file name.
pub fn list_input_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read input directory {:?}", dir))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list input directory {:?}", dir))?
            .path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if path.is_file() && matches {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub fn import_directory(dir: &Path, extension: &str) -> Result<Vec<ImportedSeries>> {
    list_input_files(dir, extension)?
        .iter()
        .map(|path| import_series(path))
        .collect()
}
