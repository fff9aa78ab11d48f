use crate::math::projection::Projector;
use crate::network::NetworkTimeSeries;
use crate::prelude::{GeoPoint, Hypocenter, DEFAULT_MAX_DISTANCE_KM};
use crate::station::buffer::StationBuffer;
use std::collections::BTreeMap;

/// Hypocenter, origin time and the hypocentral distance (km) of every
/// station closer than `max_distance`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkGeometry {
    hypocenter: Option<Hypocenter>,
    t_origin: Option<f64>,
    max_distance: Option<f64>,
    distances: BTreeMap<String, f64>,
}

impl NetworkGeometry {
    pub fn hypocenter(&self) -> Option<Hypocenter> {
        self.hypocenter
    }

    pub fn t_origin(&self) -> Option<f64> {
        self.t_origin
    }

    pub fn max_distance(&self) -> Option<f64> {
        self.max_distance
    }

    pub fn distances(&self) -> &BTreeMap<String, f64> {
        &self.distances
    }

    pub fn distance(&self, code: &str) -> Option<f64> {
        self.distances.get(code).copied()
    }

    /// `None` leaves the current origin time untouched.
    pub fn set_t_origin(&mut self, t_origin: Option<f64>) {
        if let Some(t) = t_origin {
            self.t_origin = Some(t);
        }
    }

    /// Moves the hypocenter and recomputes the distance map. Returns `false`
    /// without touching the projector when the change is within tolerance.
    pub fn set_hypocenter<'a, P: Projector>(
        &mut self,
        hypocenter: Hypocenter,
        max_distance: Option<f64>,
        stations: impl IntoIterator<Item = (&'a str, GeoPoint)>,
        projector: &mut P,
    ) -> bool {
        if self
            .hypocenter
            .is_some_and(|current| current.is_close_to(&hypocenter))
        {
            return false;
        }

        let max_distance = max_distance.unwrap_or(DEFAULT_MAX_DISTANCE_KM);
        self.max_distance = Some(max_distance);
        self.hypocenter = Some(hypocenter);
        projector.reset(hypocenter.lon, hypocenter.lat);

        let depth_2 = hypocenter.depth * hypocenter.depth;
        for (code, ref_coords) in stations {
            let (x, y) = projector.forward(ref_coords.lon, ref_coords.lat);
            let r = (depth_2 + (x * x + y * y) * 1.0e-6).sqrt();
            if r < max_distance {
                self.distances.insert(code.to_string(), r);
            } else {
                self.distances.remove(code);
            }
        }
        true
    }
}

impl<B: StationBuffer, P: Projector> NetworkTimeSeries<B, P> {
    pub fn geometry(&self) -> &NetworkGeometry {
        &self.geometry
    }

    /// Sets the event hypocenter (depth in km). Updates closer than the
    /// tolerance are ignored; returns whether distances were recomputed.
    pub fn set_hypocenter_coords(&mut self, hypocenter: Hypocenter, max_distance: Option<f64>) -> bool {
        let stations = self
            .registry
            .iter()
            .map(|station| (station.code.as_str(), station.ref_coords));
        let updated =
            self.geometry
                .set_hypocenter(hypocenter, max_distance, stations, &mut self.projector);
        if updated {
            self.logger.record(&format!(
                "hypocenter ({:.3}, {:.3}, {:.1} km): {} station(s) within {} km",
                hypocenter.lon,
                hypocenter.lat,
                hypocenter.depth,
                self.geometry.distances.len(),
                self.geometry.max_distance.unwrap_or(DEFAULT_MAX_DISTANCE_KM)
            ));
        }
        updated
    }

    pub fn set_t_origin(&mut self, t_origin: Option<f64>) {
        self.geometry.set_t_origin(t_origin);
    }

    pub fn hypocenter(&self) -> Option<Hypocenter> {
        self.geometry.hypocenter()
    }

    pub fn t_origin(&self) -> Option<f64> {
        self.geometry.t_origin()
    }

    pub fn max_distance(&self) -> Option<f64> {
        self.geometry.max_distance()
    }

    pub fn dist_to_hypocenter(&self, code: &str) -> Option<f64> {
        self.geometry.distance(code)
    }

    pub fn distances(&self) -> &BTreeMap<String, f64> {
        self.geometry.distances()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{counting_network, planar_network};

    #[test]
    fn station_at_epicenter_is_at_depth() {
        let mut network = planar_network(&[("EPIC", -71.25, -33.5)]);
        for depth in [0.0, 7.5, 35.0, 600.0] {
            network.set_hypocenter_coords(Hypocenter::new(-71.25, -33.5, depth), None);
            assert_eq!(network.dist_to_hypocenter("EPIC"), Some(depth));
        }
    }

    #[test]
    fn max_distance_is_exclusive() {
        let mut network = planar_network(&[("NEAR", 7.99, 0.0), ("FAR1", 8.01, 0.0)]);
        assert!(network.set_hypocenter_coords(Hypocenter::new(0.0, 0.0, 0.0), None));
        assert_eq!(network.max_distance(), Some(800.0));
        assert!((network.dist_to_hypocenter("NEAR").unwrap() - 799.0).abs() < 1e-6);
        assert_eq!(network.dist_to_hypocenter("FAR1"), None);
    }

    #[test]
    fn moving_the_hypocenter_drops_stale_entries() {
        let mut network = planar_network(&[("AAAA", 0.0, 0.0), ("BBBB", 5.0, 0.0)]);
        network.set_hypocenter_coords(Hypocenter::new(0.0, 0.0, 10.0), Some(300.0));
        assert_eq!(network.distances().len(), 1);
        assert!(network.distances().contains_key("AAAA"));

        network.set_hypocenter_coords(Hypocenter::new(5.0, 0.0, 10.0), Some(300.0));
        assert_eq!(network.distances().len(), 1);
        assert_eq!(network.dist_to_hypocenter("BBBB"), Some(10.0));
        assert_eq!(network.dist_to_hypocenter("AAAA"), None);
    }

    #[test]
    fn update_within_tolerance_is_a_no_op() {
        let mut network = counting_network(&[("AAAA", 1.0, 1.0), ("BBBB", 2.0, 2.0)]);
        assert!(network.set_hypocenter_coords(Hypocenter::new(1.5, 1.5, 20.0), None));
        let calls = network.projector().calls();
        assert_eq!(calls, 3);
        let distances = network.distances().clone();

        let nudged = Hypocenter::new(1.500_005, 1.499_995, 20.0005);
        assert!(!network.set_hypocenter_coords(nudged, Some(10.0)));
        assert_eq!(network.projector().calls(), calls);
        assert_eq!(network.distances(), &distances);
        assert_eq!(network.hypocenter(), Some(Hypocenter::new(1.5, 1.5, 20.0)));
        assert_eq!(network.max_distance(), Some(800.0));
    }

    #[test]
    fn station_without_coordinates_never_gets_a_distance() {
        let mut network = planar_network(&[("AAAA", 0.0, 0.0)]);
        network.add_station("NOCO", None, "").unwrap();
        network.set_hypocenter_coords(Hypocenter::new(0.0, 0.0, 5.0), None);
        assert!(!network.station_is_available("NOCO"));
        assert_eq!(network.dist_to_hypocenter("NOCO"), None);
        assert_eq!(network.distances().len(), 1);
    }

    #[test]
    fn origin_time_ignores_none() {
        let mut network = planar_network(&[]);
        assert_eq!(network.t_origin(), None);
        network.set_t_origin(Some(1_700_000_000.0));
        network.set_t_origin(None);
        assert_eq!(network.t_origin(), Some(1_700_000_000.0));
    }
}
