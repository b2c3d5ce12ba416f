use chrono::NaiveDateTime;

use std::fmt;
use std::path::Path;

use crate::align::Aggregator;
use crate::error::AlignError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub ts: NaiveDateTime,
    pub value: f64,
}

impl Sample {
    pub fn new(ts: NaiveDateTime, value: f64) -> Self {
        Self { ts, value }
    }
}

/// Kind of measurement carried by a series, derived from its tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignalType {
    Activity,
    Bolus,
    Meal,
    Cgm,
    Basal,
    Smbg,
    HeartRate,
    Other(String),
}

impl SignalType {
    /// Tags not listed here become `SignalType::Other`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "activity" => SignalType::Activity,
            "bolus" => SignalType::Bolus,
            "meal" => SignalType::Meal,
            "cgm" => SignalType::Cgm,
            "basal" => SignalType::Basal,
            "smbg" => SignalType::Smbg,
            "hr" => SignalType::HeartRate,
            other => SignalType::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            SignalType::Activity => "activity",
            SignalType::Bolus => "bolus",
            SignalType::Meal => "meal",
            SignalType::Cgm => "cgm",
            SignalType::Basal => "basal",
            SignalType::Smbg => "smbg",
            SignalType::HeartRate => "hr",
            SignalType::Other(tag) => tag,
        }
    }

    /// Cumulative events (doses, carbs, activity minutes) add up inside a
    /// bucket; everything else is a level and gets averaged.
    pub fn aggregator(&self) -> Aggregator {
        match self {
            SignalType::Activity | SignalType::Bolus | SignalType::Meal => Aggregator::Sum,
            _ => Aggregator::Average,
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Derive the signal type from a file name such as `cgm_small.csv`: the tag is
/// the part of the file stem before the first underscore.
pub fn classify(path: &Path) -> Result<SignalType, AlignError> {
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    match name.split_once('_') {
        Some((tag, _)) if !tag.is_empty() => Ok(SignalType::from_tag(tag)),
        _ => Err(AlignError::MissingClassification { name }),
    }
}

/// One imported measurement stream. Samples keep source order, including the
/// relative order of samples that share a timestamp.
#[derive(Debug, Clone)]
pub struct Series {
    name: String,
    signal: SignalType,
    aggregator: Aggregator,
    samples: Vec<Sample>,
}

impl Series {
    /// The series is named after its signal tag, which is also its column
    /// name in the aligned table.
    pub fn new(signal: SignalType, samples: Vec<Sample>) -> Self {
        Self {
            name: signal.tag().to_string(),
            aggregator: signal.aggregator(),
            signal,
            samples,
        }
    }

    pub fn from_path(path: &Path, samples: Vec<Sample>) -> Result<Self, AlignError> {
        Ok(Self::new(classify(path)?, samples))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signal(&self) -> &SignalType {
        &self.signal
    }

    pub fn aggregator(&self) -> Aggregator {
        self.aggregator
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
