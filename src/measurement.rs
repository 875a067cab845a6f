use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three kinds of measurement a bucket can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementType {
    /// Accumulated with `increment`
    Counts,
    /// First occurrence per slot, from `timing`
    Timings,
    /// Last value per slot, from `gauge`
    Gauges,
}

impl MeasurementType {
    /// Every measurement type.
    pub const ALL: [MeasurementType; 3] = [Self::Counts, Self::Timings, Self::Gauges];

    /// Name used in storage keys and in the catalog.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Counts => "counts",
            Self::Timings => "timings",
            Self::Gauges => "gauges",
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown measurement type '{0}' (expected counts, timings or gauges)")]
pub struct UnknownMeasurementType(pub String);

impl FromStr for MeasurementType {
    type Err = UnknownMeasurementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownMeasurementType(s.to_owned()))
    }
}
