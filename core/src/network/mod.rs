//! Network-wide context: station registry, event geometry and the fan-out of
//! queries to every station buffer.

pub mod evaluation;
pub mod geometry;
pub mod reference;

pub use geometry::NetworkGeometry;

use crate::math::projection::{Projector, TransverseMercator};
use crate::math::stats::StatsHelper;
use crate::prelude::{GeoPoint, NetworkError, NetworkResult, StationRef};
use crate::station::buffer::{
    BufferConfig, Layer, LayerSamples, PointSample, Sample, SeriesInput, StationBuffer,
};
use crate::station::registry::{BoundingRange, StationRegistry};
use crate::station::windowed::WindowedBuffer;
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use crate::units::{parse_duration, parse_rate};
use serde::{Deserialize, Serialize};

/// Buffer sizing in human-readable form, e.g. `length: 1h`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub length: String,
    pub sampling_rate: String,
    pub window_offset: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            length: "1h".into(),
            sampling_rate: "1/s".into(),
            window_offset: "7m".into(),
        }
    }
}

impl NetworkConfig {
    pub fn to_buffer_config(&self) -> NetworkResult<BufferConfig> {
        Ok(BufferConfig {
            length: parse_duration(&self.length)?,
            sampling_rate: parse_rate(&self.sampling_rate)?,
            window_offset: parse_duration(&self.window_offset)?,
        })
    }
}

/// Time span covered by the station buffers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvailableWindow {
    pub t_min: f64,
    pub t_oldest: f64,
    pub t_max: f64,
}

impl AvailableWindow {
    pub fn contains(&self, t: f64) -> bool {
        self.t_oldest < t && t < self.t_max
    }
}

/// Owns every station buffer plus the state of the event being analysed.
pub struct NetworkTimeSeries<B = WindowedBuffer, P = TransverseMercator> {
    buffer_config: BufferConfig,
    registry: StationRegistry<B>,
    geometry: NetworkGeometry,
    projector: P,
    logger: LogManager,
    metrics: MetricsRecorder,
}

impl NetworkTimeSeries<WindowedBuffer, TransverseMercator> {
    pub fn new(config: &NetworkConfig) -> NetworkResult<Self> {
        Ok(Self::with_parts(
            config.to_buffer_config()?,
            TransverseMercator::default(),
        ))
    }
}

impl<B: StationBuffer, P: Projector> NetworkTimeSeries<B, P> {
    pub fn with_parts(buffer_config: BufferConfig, projector: P) -> Self {
        Self {
            buffer_config,
            registry: StationRegistry::new(),
            geometry: NetworkGeometry::default(),
            projector,
            logger: LogManager::new("network"),
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn buffer_config(&self) -> &BufferConfig {
        &self.buffer_config
    }

    pub fn sampling_rate(&self) -> f64 {
        self.buffer_config.sampling_rate
    }

    pub fn registry(&self) -> &StationRegistry<B> {
        &self.registry
    }

    pub fn projector(&self) -> &P {
        &self.projector
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn n_stations(&self) -> usize {
        self.registry.len()
    }

    /// Registers a station with a fresh buffer. Stations without reference
    /// coordinates are skipped with a warning and `Ok(None)`.
    pub fn add_station(
        &mut self,
        code: &str,
        ref_coords: Option<GeoPoint>,
        name: &str,
    ) -> NetworkResult<Option<usize>> {
        let buffer = B::with_config(&self.buffer_config);
        self.registry.register(code, name, ref_coords, buffer)
    }

    /// Earliest first sample, oldest retained sample and latest sample over
    /// all stations holding data.
    pub fn available_window(&self) -> Option<AvailableWindow> {
        let mut window: Option<AvailableWindow> = None;
        for station in self.registry.iter() {
            let buffer = &station.buffer;
            let (Some(first), Some(oldest), Some(last)) =
                (buffer.t_first(), buffer.t_oldest(), buffer.t_last())
            else {
                continue;
            };
            window = Some(match window {
                None => AvailableWindow {
                    t_min: first,
                    t_oldest: oldest,
                    t_max: last,
                },
                Some(w) => AvailableWindow {
                    t_min: w.t_min.min(first),
                    t_oldest: w.t_oldest.min(oldest),
                    t_max: w.t_max.max(last),
                },
            });
        }
        window
    }

    pub fn available_window_contains(&self, t: f64) -> bool {
        self.available_window().is_some_and(|w| w.contains(t))
    }

    pub fn set_window_offset(&mut self, window_offset: f64) {
        self.buffer_config.window_offset = window_offset;
        for station in self.registry.iter_mut() {
            station.buffer.set_window_offset(window_offset);
        }
    }

    pub fn station_buffer(&self, station: &StationRef) -> NetworkResult<&B> {
        self.registry.buffer(station)
    }

    pub fn station_buffer_mut(&mut self, station: &StationRef) -> NetworkResult<&mut B> {
        self.registry.buffer_mut(station)
    }

    pub fn clear_data_at(&mut self, station: &StationRef) -> NetworkResult<()> {
        self.station_buffer_mut(station)?.clear();
        Ok(())
    }

    pub fn clear_all_data(&mut self) {
        for station in self.registry.iter_mut() {
            station.buffer.clear();
        }
    }

    pub fn station_buffer_is_empty(&self, station: &StationRef) -> NetworkResult<bool> {
        Ok(self.station_buffer(station)?.is_cleared())
    }

    pub fn station_is_available(&self, code: &str) -> bool {
        self.registry.contains(code)
    }

    pub fn get_coords(&self, station: &StationRef, layers: &[Layer]) -> NetworkResult<LayerSamples> {
        Ok(self.station_buffer(station)?.get(layers))
    }

    pub fn get_coords_near(
        &self,
        station: &StationRef,
        t: f64,
        layers: &[Layer],
    ) -> NetworkResult<Option<PointSample>> {
        Ok(self.station_buffer(station)?.point(t, layers))
    }

    pub fn get_interval(
        &self,
        station: &StationRef,
        t_begin: f64,
        t_end: f64,
        layers: &[Layer],
    ) -> NetworkResult<LayerSamples> {
        Ok(self.station_buffer(station)?.interval(t_begin, t_end, layers))
    }

    pub fn get_last(
        &self,
        station: &StationRef,
        window: f64,
        layers: &[Layer],
    ) -> NetworkResult<LayerSamples> {
        Ok(self.station_buffer(station)?.last(window, layers))
    }

    pub fn get_first(
        &self,
        station: &StationRef,
        window: f64,
        layers: &[Layer],
    ) -> NetworkResult<LayerSamples> {
        Ok(self.station_buffer(station)?.first(window, layers))
    }

    pub fn add_point_to_station(&mut self, station: &StationRef, sample: Sample) -> NetworkResult<()> {
        self.station_buffer_mut(station)?.add_point(sample);
        Ok(())
    }

    /// Loads a whole series into a station buffer. With `check_sampling_rate`
    /// a series sampled at an integer multiple of the network step is padded
    /// with NaN epochs first.
    pub fn set_station_timeseries(
        &mut self,
        station: &StationRef,
        series: &SeriesInput,
        check_sampling_rate: bool,
    ) -> NetworkResult<()> {
        let sampling_rate = self.sampling_rate();
        let buffer = self.registry.buffer_mut(station)?;
        if check_sampling_rate {
            let padded = pad_to_rate(series, sampling_rate, self.buffer_config.capacity())?;
            buffer.set_series(&padded)
        } else {
            buffer.set_series(series)
        }
    }

    pub fn ref_coords(&self, station: &StationRef) -> NetworkResult<GeoPoint> {
        self.registry.ref_coords(station)
    }

    pub fn ref_coord_vectors(&self, codes: Option<&[String]>) -> NetworkResult<(Vec<f64>, Vec<f64>)> {
        self.registry.ref_coord_vectors(codes)
    }

    pub fn bounding_range(&self) -> Option<BoundingRange> {
        self.registry.bounding_range()
    }

    pub fn station_codes(&self) -> Vec<String> {
        self.registry.codes()
    }

    pub fn station_code(&self, index: usize) -> NetworkResult<&str> {
        self.registry.code(index)
    }

    pub fn station_name(&self, station: &StationRef) -> NetworkResult<&str> {
        self.registry.name(station)
    }

    pub fn station_index(&self, code: &str) -> NetworkResult<usize> {
        self.registry.resolve(&StationRef::from(code))
    }

    pub fn get_indices<S: AsRef<str>>(&self, codes: &[S]) -> NetworkResult<Vec<usize>> {
        self.registry.indices_of(codes)
    }

    pub fn ref_values_at(&self, station: &StationRef) -> NetworkResult<Option<[f64; 3]>> {
        Ok(self.station_buffer(station)?.ref_values())
    }

    pub fn ref_values_are_set_at(&self, station: &StationRef) -> NetworkResult<bool> {
        Ok(self.station_buffer(station)?.ref_values_are_set())
    }
}

/// Spreads a series sampled every `m` network steps onto the network grid,
/// filling the inserted epochs with NaN. The last timestamp is kept and at
/// most `max_slots` epochs, the most recent ones, are produced.
fn pad_to_rate(
    series: &SeriesInput,
    sampling_rate: f64,
    max_slots: usize,
) -> NetworkResult<SeriesInput> {
    let Some(median_step) = StatsHelper::median_step(&series.times) else {
        return Ok(series.clone());
    };
    let beta = median_step * sampling_rate;
    if (beta - 1.0).abs() < 1.0e-8 {
        return Ok(series.clone());
    }
    let m = beta.round();
    if !(m >= 1.0) {
        return Err(NetworkError::SamplingMismatch(format!(
            "input step {} s is shorter than the network step {} s",
            median_step,
            1.0 / sampling_rate
        )));
    }
    let m = m as usize;
    if m == 1 {
        return Ok(series.clone());
    }
    if !series.is_consistent() {
        return Err(NetworkError::InvalidInput(
            "series components differ in length".into(),
        ));
    }

    let n = series.len();
    let total = (n - 1)
        .checked_mul(m)
        .and_then(|slots| slots.checked_add(1))
        .ok_or_else(|| {
            NetworkError::SamplingMismatch(format!("input step {} s is too long", median_step))
        })?;
    let n_aux = total.min(max_slots.max(1));
    let skipped = total - n_aux;
    let step = 1.0 / sampling_rate;
    let t_end = series.times[n - 1];
    let mut padded = SeriesInput {
        times: (0..n_aux)
            .map(|i| t_end - (n_aux - 1 - i) as f64 * step)
            .collect(),
        coords: Default::default(),
        std_coords: Default::default(),
    };
    for k in 0..3 {
        padded.coords[k] = vec![f64::NAN; n_aux];
        padded.std_coords[k] = vec![f64::NAN; n_aux];
        for i in skipped.div_ceil(m)..n {
            let slot = i * m - skipped;
            padded.coords[k][slot] = series.coords[k][i];
            padded.std_coords[k][slot] = series.std_coords[k][i];
        }
    }
    Ok(padded)
}
