use anyhow::{Context, Result, bail};
use log::info;

use crate::align::align;
use crate::config::Settings;
use crate::data::{ImportReport, import_directory};
use crate::output::{RunSummary, TableReport, output_path_for, write_table};
use crate::series::Series;

/// Import every series under `settings.input`, align them once per configured
/// resolution and write one table each.
pub fn run(settings: &Settings) -> Result<RunSummary> {
    let imported = import_directory(&settings.input, &settings.extension)?;
    if imported.is_empty() {
        bail!(
            "no .{} files found in {:?}",
            settings.extension,
            settings.input
        );
    }

    let mut import = ImportReport::default();
    for item in &imported {
        import.absorb(item.report);
    }
    let series: Vec<Series> = imported.into_iter().map(|item| item.series).collect();

    let several = settings.resolutions.len() > 1;
    let mut tables = Vec::with_capacity(settings.resolutions.len());

    for &resolution in &settings.resolutions {
        let table = align(&series, &settings.key, resolution)
            .with_context(|| format!("failed to align series at {resolution}"))?;

        let path = output_path_for(&settings.output, resolution, several);
        write_table(&table, &path, settings.format)?;
        info!(
            "{resolution}: wrote {} rows x {} columns to {:?}",
            table.len(),
            table.columns().len(),
            path
        );

        tables.push(TableReport {
            resolution,
            path,
            rows: table.len(),
            columns: table.columns().to_vec(),
        });
    }

    Ok(RunSummary {
        series: series.len(),
        import,
        tables,
    })
}
