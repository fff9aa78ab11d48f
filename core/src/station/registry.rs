use crate::prelude::{GeoPoint, NetworkError, NetworkResult, StationRef};
use crate::station::buffer::StationBuffer;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A registered GNSS station and its sample buffer.
#[derive(Debug, Clone)]
pub struct Station<B> {
    pub code: String,
    pub name: String,
    pub ref_coords: GeoPoint,
    pub buffer: B,
}

/// Latitude and longitude extent, each as `(min, max)` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRange {
    pub lat: (f64, f64),
    pub lon: (f64, f64),
}

impl BoundingRange {
    fn around(point: GeoPoint) -> Self {
        Self {
            lat: (point.lat, point.lat),
            lon: (point.lon, point.lon),
        }
    }

    fn include(&mut self, point: GeoPoint) {
        self.lat = (self.lat.0.min(point.lat), self.lat.1.max(point.lat));
        self.lon = (self.lon.0.min(point.lon), self.lon.1.max(point.lon));
    }
}

/// Append-only list of stations with code and index lookup.
#[derive(Debug, Clone)]
pub struct StationRegistry<B> {
    stations: Vec<Station<B>>,
    code_to_index: HashMap<String, usize>,
    range: Option<BoundingRange>,
}

impl<B> Default for StationRegistry<B> {
    fn default() -> Self {
        Self {
            stations: Vec::new(),
            code_to_index: HashMap::new(),
            range: None,
        }
    }
}

impl<B: StationBuffer> StationRegistry<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a station and returns its index. A station without reference
    /// coordinates is skipped with a warning and `Ok(None)`.
    pub fn register(
        &mut self,
        code: &str,
        name: &str,
        ref_coords: Option<GeoPoint>,
        buffer: B,
    ) -> NetworkResult<Option<usize>> {
        let Some(ref_coords) = ref_coords else {
            warn!("station {}: no reference coordinates, not registered", code);
            return Ok(None);
        };
        if self.code_to_index.contains_key(code) {
            return Err(NetworkError::DuplicateStation(code.to_string()));
        }

        let index = self.stations.len();
        self.code_to_index.insert(code.to_string(), index);
        self.stations.push(Station {
            code: code.to_string(),
            name: name.to_string(),
            ref_coords,
            buffer,
        });
        match self.range.as_mut() {
            Some(range) => range.include(ref_coords),
            None => self.range = Some(BoundingRange::around(ref_coords)),
        }
        Ok(Some(index))
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.code_to_index.contains_key(code)
    }

    pub fn resolve(&self, station: &StationRef) -> NetworkResult<usize> {
        match station {
            StationRef::Index(index) if *index < self.stations.len() => Ok(*index),
            StationRef::Index(index) => Err(NetworkError::IndexOutOfRange {
                index: *index,
                count: self.stations.len(),
            }),
            StationRef::Code(code) => self
                .code_to_index
                .get(code)
                .copied()
                .ok_or_else(|| NetworkError::UnknownStation(code.clone())),
        }
    }

    /// Resolves every code or fails on the first unknown one.
    pub fn indices_of<S: AsRef<str>>(&self, codes: &[S]) -> NetworkResult<Vec<usize>> {
        codes
            .iter()
            .map(|code| {
                self.code_to_index
                    .get(code.as_ref())
                    .copied()
                    .ok_or_else(|| NetworkError::UnknownStation(code.as_ref().to_string()))
            })
            .collect()
    }

    pub fn bounding_range(&self) -> Option<BoundingRange> {
        self.range
    }

    pub fn station(&self, station: &StationRef) -> NetworkResult<&Station<B>> {
        let index = self.resolve(station)?;
        Ok(&self.stations[index])
    }

    pub fn station_mut(&mut self, station: &StationRef) -> NetworkResult<&mut Station<B>> {
        let index = self.resolve(station)?;
        Ok(&mut self.stations[index])
    }

    pub fn buffer(&self, station: &StationRef) -> NetworkResult<&B> {
        self.station(station).map(|s| &s.buffer)
    }

    pub fn buffer_mut(&mut self, station: &StationRef) -> NetworkResult<&mut B> {
        self.station_mut(station).map(|s| &mut s.buffer)
    }

    pub fn code(&self, index: usize) -> NetworkResult<&str> {
        self.station(&StationRef::Index(index))
            .map(|s| s.code.as_str())
    }

    pub fn name(&self, station: &StationRef) -> NetworkResult<&str> {
        self.station(station).map(|s| s.name.as_str())
    }

    pub fn ref_coords(&self, station: &StationRef) -> NetworkResult<GeoPoint> {
        self.station(station).map(|s| s.ref_coords)
    }

    pub fn codes(&self) -> Vec<String> {
        self.stations.iter().map(|s| s.code.clone()).collect()
    }

    /// Longitude and latitude vectors for the given codes, or for all
    /// stations in registration order.
    pub fn ref_coord_vectors(&self, codes: Option<&[String]>) -> NetworkResult<(Vec<f64>, Vec<f64>)> {
        let indices = match codes {
            Some(codes) => self.indices_of(codes)?,
            None => (0..self.stations.len()).collect(),
        };
        Ok(indices
            .into_iter()
            .map(|i| (self.stations[i].ref_coords.lon, self.stations[i].ref_coords.lat))
            .unzip())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station<B>> {
        self.stations.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Station<B>> {
        self.stations.iter_mut()
    }
}
