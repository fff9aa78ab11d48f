//! Projectors and network builders shared by the unit tests.

use crate::math::projection::Projector;
use crate::network::NetworkTimeSeries;
use crate::prelude::GeoPoint;
use crate::station::buffer::{BufferConfig, Sample};
use crate::station::windowed::WindowedBuffer;
use std::cell::Cell;

/// Flat-earth projector: one degree is exactly 100 km on both axes.
#[derive(Debug, Default)]
pub struct PlanarProjector {
    lon0: f64,
    lat0: f64,
}

impl Projector for PlanarProjector {
    fn reset(&mut self, origin_lon: f64, origin_lat: f64) {
        self.lon0 = origin_lon;
        self.lat0 = origin_lat;
    }

    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        ((lon - self.lon0) * 100_000.0, (lat - self.lat0) * 100_000.0)
    }
}

/// [`PlanarProjector`] that counts how often it is used.
#[derive(Debug, Default)]
pub struct CountingProjector {
    inner: PlanarProjector,
    pub resets: usize,
    pub forwards: Cell<usize>,
}

impl CountingProjector {
    pub fn calls(&self) -> usize {
        self.resets + self.forwards.get()
    }
}

impl Projector for CountingProjector {
    fn reset(&mut self, origin_lon: f64, origin_lat: f64) {
        self.resets += 1;
        self.inner.reset(origin_lon, origin_lat);
    }

    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        self.forwards.set(self.forwards.get() + 1);
        self.inner.forward(lon, lat)
    }
}

pub fn buffer_config() -> BufferConfig {
    BufferConfig {
        length: 600.0,
        sampling_rate: 1.0,
        window_offset: 60.0,
    }
}

fn network_with<P: Projector>(
    projector: P,
    stations: &[(&str, f64, f64)],
) -> NetworkTimeSeries<WindowedBuffer, P> {
    let mut network = NetworkTimeSeries::with_parts(buffer_config(), projector);
    for (code, lon, lat) in stations {
        network
            .add_station(code, Some(GeoPoint::new(*lon, *lat)), code)
            .unwrap();
    }
    network
}

/// Network of `(code, lon, lat)` stations on the planar projector.
pub fn planar_network(stations: &[(&str, f64, f64)]) -> NetworkTimeSeries<WindowedBuffer, PlanarProjector> {
    network_with(PlanarProjector::default(), stations)
}

pub fn counting_network(
    stations: &[(&str, f64, f64)],
) -> NetworkTimeSeries<WindowedBuffer, CountingProjector> {
    network_with(CountingProjector::default(), stations)
}

/// Quiet samples until `t_arrival`, then a linear east ramp reaching
/// `amplitude` meters `rise` seconds later. One sample per second over
/// `[t_start, t_end)`.
pub fn ramp_samples(t_start: i64, t_end: i64, t_arrival: f64, rise: f64, amplitude: f64) -> Vec<Sample> {
    (t_start..t_end)
        .map(|t| {
            let t = t as f64;
            let east = if t < t_arrival {
                0.0
            } else {
                amplitude * ((t - t_arrival) / rise).min(1.0)
            };
            Sample::new(t, [east, 0.0, 0.0], [0.005; 3])
        })
        .collect()
}
