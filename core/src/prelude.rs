use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum hypocentral distance (km) of stations used for Mw estimation.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 800.0;
/// Length (s) of the pre-event window used for baseline coordinates.
pub const DEFAULT_WINDOW_REF: f64 = 120.0;
/// Length (s) of the window scanned for the peak ground displacement.
pub const DEFAULT_WINDOW_PGD: f64 = 300.0;
/// Apparent propagation speed (km/s) masking samples before wave arrival.
pub const DEFAULT_VEL_MASK: f64 = 3.0;

/// Longitude/latitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Rupture initiation point, depth in km.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hypocenter {
    pub lon: f64,
    pub lat: f64,
    pub depth: f64,
}

impl Hypocenter {
    pub fn new(lon: f64, lat: f64, depth: f64) -> Self {
        Self { lon, lat, depth }
    }

    /// True when both points differ by less than the update tolerance.
    /// Depth differences are scaled by 0.01 before the comparison.
    pub fn is_close_to(&self, other: &Hypocenter) -> bool {
        let delta = (self.lon - other.lon)
            .abs()
            .max((self.lat - other.lat).abs())
            .max(0.01 * (self.depth - other.depth).abs());
        delta < 1.0e-5
    }
}

/// A station addressed either by registry index or by code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StationRef {
    Index(usize),
    Code(String),
}

impl From<usize> for StationRef {
    fn from(index: usize) -> Self {
        StationRef::Index(index)
    }
}

impl From<&str> for StationRef {
    fn from(code: &str) -> Self {
        StationRef::Code(code.to_string())
    }
}

impl From<String> for StationRef {
    fn from(code: String) -> Self {
        StationRef::Code(code)
    }
}

impl From<&String> for StationRef {
    fn from(code: &String) -> Self {
        StationRef::Code(code.clone())
    }
}

impl fmt::Display for StationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationRef::Index(index) => write!(f, "#{}", index),
            StationRef::Code(code) => f.write_str(code),
        }
    }
}

/// Statistic used to collapse the reference window into baseline coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaselineStatistic {
    #[default]
    Mean,
    Median,
    /// Mean after dropping `fraction` of the samples at each tail.
    TrimmedMean { fraction: f64 },
}

/// Options controlling how the pre-event baseline is (re)computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceOptions {
    pub window_ref: f64,
    pub force: bool,
    pub statistic: BaselineStatistic,
}

impl Default for ReferenceOptions {
    fn default() -> Self {
        Self {
            window_ref: DEFAULT_WINDOW_REF,
            force: false,
            statistic: BaselineStatistic::Mean,
        }
    }
}

/// Common error type for the network core.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("unknown station: {0}")]
    UnknownStation(String),
    #[error("station index {index} out of range ({count} stations)")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("station already registered: {0}")]
    DuplicateStation(String),
    #[error("origin time is not set")]
    OriginTimeUnset,
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("sampling mismatch: {0}")]
    SamplingMismatch(String),
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    #[error("invalid rate: {0}")]
    InvalidRate(String),
}

pub type NetworkResult<T> = Result<T, NetworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hypocenter_tolerance_scales_depth() {
        let base = Hypocenter::new(-71.0, -33.0, 30.0);
        assert!(base.is_close_to(&Hypocenter::new(-71.000_001, -33.0, 30.0005)));
        assert!(!base.is_close_to(&Hypocenter::new(-71.0, -33.0, 30.01)));
        assert!(!base.is_close_to(&Hypocenter::new(-71.0, -33.001, 30.0)));
    }

    #[test]
    fn reference_options_deserialize_with_defaults() {
        let options: ReferenceOptions =
            serde_json::from_str(r#"{"statistic": {"kind": "trimmed_mean", "fraction": 0.1}}"#)
                .unwrap();
        assert_eq!(options.window_ref, DEFAULT_WINDOW_REF);
        assert_eq!(
            options.statistic,
            BaselineStatistic::TrimmedMean { fraction: 0.1 }
        );
    }
}
