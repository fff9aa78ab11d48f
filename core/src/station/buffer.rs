//! Contract between the network and the per-station sample stores.

use crate::prelude::{NetworkResult, ReferenceOptions, DEFAULT_WINDOW_PGD};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Data layers carried by every station buffer. Each layer has east, north
/// and up components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Coords,
    StdCoords,
}

impl Layer {
    pub const ALL: [Layer; 2] = [Layer::Coords, Layer::StdCoords];
}

/// Sizing of a station buffer; durations in seconds, rate in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferConfig {
    pub length: f64,
    pub sampling_rate: f64,
    pub window_offset: f64,
}

impl BufferConfig {
    pub fn step(&self) -> f64 {
        1.0 / self.sampling_rate
    }

    /// Number of grid slots covering `length + window_offset`.
    pub fn capacity(&self) -> usize {
        let span = (self.length + self.window_offset) * self.sampling_rate;
        (span.round() as usize).max(1) + 1
    }
}

/// One epoch of local east/north/up coordinates (m) and their uncertainties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub t: f64,
    pub coords: [f64; 3],
    pub std_coords: [f64; 3],
}

impl Sample {
    pub fn new(t: f64, coords: [f64; 3], std_coords: [f64; 3]) -> Self {
        Self {
            t,
            coords,
            std_coords,
        }
    }
}

/// A full series handed to a buffer in one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesInput {
    pub times: Vec<f64>,
    pub coords: [Vec<f64>; 3],
    pub std_coords: [Vec<f64>; 3],
}

impl SeriesInput {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// All components must have one value per timestamp.
    pub fn is_consistent(&self) -> bool {
        let n = self.times.len();
        self.coords.iter().chain(self.std_coords.iter()).all(|c| c.len() == n)
    }
}

/// Samples of the requested layers over some time range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerSamples {
    pub times: Vec<f64>,
    pub layers: Vec<(Layer, [Vec<f64>; 3])>,
}

impl LayerSamples {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn layer(&self, layer: Layer) -> Option<&[Vec<f64>; 3]> {
        self.layers
            .iter()
            .find(|(candidate, _)| *candidate == layer)
            .map(|(_, values)| values)
    }

    /// Labelled view of the layers, keyed by layer.
    pub fn into_map(self) -> BTreeMap<Layer, [Vec<f64>; 3]> {
        self.layers.into_iter().collect()
    }
}

/// Layer values at a single instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSample {
    pub t: f64,
    pub layers: Vec<(Layer, [f64; 3])>,
}

impl PointSample {
    pub fn layer(&self, layer: Layer) -> Option<[f64; 3]> {
        self.layers
            .iter()
            .find(|(candidate, _)| *candidate == layer)
            .map(|(_, values)| *values)
    }

    pub fn into_map(self) -> BTreeMap<Layer, [f64; 3]> {
        self.layers.into_iter().collect()
    }
}

/// Parameters of a single windowed PGD query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PgdQuery {
    /// Start of the scanned window; the origin time when absent.
    pub t_s: Option<f64>,
    pub window_pgd: f64,
    pub only_hor: bool,
}

impl Default for PgdQuery {
    fn default() -> Self {
        Self {
            t_s: None,
            window_pgd: DEFAULT_WINDOW_PGD,
            only_hor: false,
        }
    }
}

/// Peak ground displacement (m) and the time it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PgdValue {
    pub pgd: f64,
    pub t_pgd: f64,
}

/// Displacement from the baseline (m) at one evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub t: f64,
    pub enu: [f64; 3],
    pub horizontal: f64,
}

/// Running PGD (m) after the origin time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PgdSeries {
    pub times: Vec<f64>,
    pub pgd: Vec<f64>,
}

impl PgdSeries {
    pub fn new(times: Vec<f64>, pgd: Vec<f64>) -> Self {
        Self { times, pgd }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// East/north/up displacement (m) from the baseline after the origin time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplacementSeries {
    pub times: Vec<f64>,
    pub enu: [Vec<f64>; 3],
}

/// Per-station windowed store of GNSS coordinates.
pub trait StationBuffer {
    fn with_config(config: &BufferConfig) -> Self
    where
        Self: Sized;
    fn config(&self) -> &BufferConfig;
    fn set_window_offset(&mut self, window_offset: f64);

    fn add_point(&mut self, sample: Sample);
    /// Replaces the buffer contents with `series`.
    fn set_series(&mut self, series: &SeriesInput) -> NetworkResult<()>;
    fn clear(&mut self);
    /// True when no data was received since construction or the last clear.
    fn is_cleared(&self) -> bool;

    fn t_first(&self) -> Option<f64>;
    fn t_last(&self) -> Option<f64>;
    /// Oldest timestamp still inside the nominal buffer length.
    fn t_oldest(&self) -> Option<f64>;

    fn point(&self, t: f64, layers: &[Layer]) -> Option<PointSample>;
    fn interval(&self, t_begin: f64, t_end: f64, layers: &[Layer]) -> LayerSamples;
    fn last(&self, window: f64, layers: &[Layer]) -> LayerSamples;
    fn first(&self, window: f64, layers: &[Layer]) -> LayerSamples;
    fn get(&self, layers: &[Layer]) -> LayerSamples;

    fn eval_ref_values(&mut self, t_origin: f64, options: &ReferenceOptions) -> NetworkResult<()>;
    fn ref_values(&self) -> Option<[f64; 3]>;
    fn ref_values_are_set(&self) -> bool {
        self.ref_values().is_some()
    }

    fn eval_pgd(
        &mut self,
        t_origin: f64,
        query: &PgdQuery,
        options: &ReferenceOptions,
    ) -> NetworkResult<PgdValue>;
    fn eval_offset(
        &mut self,
        t_eval: f64,
        t_origin: f64,
        options: &ReferenceOptions,
    ) -> NetworkResult<Offset>;
    fn pgd_timeseries(
        &mut self,
        t_origin: f64,
        window: f64,
        options: &ReferenceOptions,
    ) -> NetworkResult<PgdSeries>;
    fn ground_displ_timeseries(
        &mut self,
        t_origin: f64,
        window: f64,
        options: &ReferenceOptions,
    ) -> NetworkResult<DisplacementSeries>;
}
