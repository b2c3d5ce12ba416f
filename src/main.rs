use anyhow::Result;
use clap::Parser;

use std::path::PathBuf;

use series_align::config::{OutputFormat, Overrides, Settings};

/// Resample a folder of `<type>_*.csv` measurement files onto a fixed-minute
/// grid and join them into one table keyed by the chosen series.
#[derive(Debug, Parser)]
struct Args {
    /// Optional config file (toml, yaml, json, ...); CLI flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder holding the input files
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output table path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Series whose timestamps define the rows (e.g. cgm)
    #[arg(long)]
    key: Option<String>,

    /// Grid width in minutes; repeat for several tables (default: 5 and 15)
    #[arg(long = "resolution")]
    resolutions: Vec<u32>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let overrides = Overrides {
        input: args.input,
        output: args.output,
        key: args.key,
        resolutions: args.resolutions,
        format: args.format,
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;

    let summary = series_align::pipeline::run(&settings)?;

    series_align::output::print_summary(&summary);

    Ok(())
}
