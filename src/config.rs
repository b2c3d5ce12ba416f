use serde::Deserialize;
use thiserror::Error;

use std::path::{Path, PathBuf};

use crate::align::Resolution;

/// Prefix of environment variables read into `Settings`, e.g.
/// `SERIES_ALIGN_KEY=cgm` or `SERIES_ALIGN_RESOLUTIONS=5,15`.
pub const ENV_PREFIX: &str = "SERIES_ALIGN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file path is not valid UTF-8")]
    FilePathIntoString,
    #[error("failed to build settings: {0}")]
    SettingsInit(String),
    #[error("failed to deserialize settings: {0}")]
    Deserialize(String),
    #[error("at least one resolution is required")]
    NoResolutions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Directory holding one `<type>_<anything>.<extension>` file per series
    pub input: PathBuf,

    /// Output table path; suffixed with `_<minutes>` when several
    /// resolutions are requested
    pub output: PathBuf,

    /// Series whose grid points define the table rows (e.g. "cgm")
    pub key: String,

    /// Grid widths in minutes, one table each
    #[serde(default = "default_resolutions")]
    pub resolutions: Vec<Resolution>,

    #[serde(default)]
    pub format: OutputFormat,

    /// Extension of the input files to pick up
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_resolutions() -> Vec<Resolution> {
    [5, 15].into_iter().filter_map(|m| Resolution::new(m).ok()).collect()
}

fn default_extension() -> String {
    "csv".to_string()
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub key: Option<String>,
    pub resolutions: Vec<u32>,
    pub format: Option<OutputFormat>,
}

impl Settings {
    /// Layer an optional config file, `SERIES_ALIGN_*` environment variables
    /// and command line overrides, in that order of precedence (lowest first).
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::load_with_env(path, overrides, None)
    }

    /// Same as `load`, reading `SERIES_ALIGN_*` from `vars` instead of the
    /// process environment when given.
    fn load_with_env(
        path: Option<&Path>,
        overrides: &Overrides,
        vars: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            let filename = path.to_str().ok_or(ConfigError::FilePathIntoString)?;
            builder = builder.add_source(config::File::with_name(filename));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("resolutions")
                .source(vars),
        );

        let path_value = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());
        let resolutions = (!overrides.resolutions.is_empty()).then(|| {
            overrides
                .resolutions
                .iter()
                .map(|&m| i64::from(m))
                .collect::<Vec<i64>>()
        });

        let settings: Settings = builder
            .set_override_option("input", path_value(&overrides.input))
            .and_then(|b| b.set_override_option("output", path_value(&overrides.output)))
            .and_then(|b| b.set_override_option("key", overrides.key.clone()))
            .and_then(|b| b.set_override_option("resolutions", resolutions))
            .and_then(|b| {
                b.set_override_option("format", overrides.format.map(|f| f.as_str()))
            })
            .map_err(|err| ConfigError::SettingsInit(err.to_string()))?
            .build()
            .map_err(|err| ConfigError::SettingsInit(err.to_string()))?
            .try_deserialize()
            .map_err(|err| ConfigError::Deserialize(err.to_string()))?;

        if settings.resolutions.is_empty() {
            return Err(ConfigError::NoResolutions);
        }
        Ok(settings)
    }
}
