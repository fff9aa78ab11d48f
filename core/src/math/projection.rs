//! Geodetic to local planar coordinates.

use std::f64::consts::PI;

/// Converts geodetic coordinates to planar offsets (m) around a movable origin.
pub trait Projector {
    /// Re-centres the local frame on the given longitude/latitude (degrees).
    fn reset(&mut self, origin_lon: f64, origin_lat: f64);
    /// Easting and northing (m) of a point relative to the current origin.
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64);
}

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Transverse Mercator projection on the WGS84 ellipsoid with unit scale factor,
/// using the series expansion from Snyder (1987).
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    lon0: f64,
    m0: f64,
    e2: f64,
    ep2: f64,
}

impl TransverseMercator {
    pub fn new(origin_lon: f64, origin_lat: f64) -> Self {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let mut projector = Self {
            lon0: 0.0,
            m0: 0.0,
            e2,
            ep2: e2 / (1.0 - e2),
        };
        projector.reset(origin_lon, origin_lat);
        projector
    }

    fn meridian_arc(&self, phi: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        WGS84_A
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }
}

impl Default for TransverseMercator {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Projector for TransverseMercator {
    fn reset(&mut self, origin_lon: f64, origin_lat: f64) {
        self.lon0 = origin_lon.to_radians();
        self.m0 = self.meridian_arc(origin_lat.to_radians());
    }

    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let mut dlam = lon.to_radians() - self.lon0;
        if dlam > PI {
            dlam -= 2.0 * PI;
        } else if dlam < -PI {
            dlam += 2.0 * PI;
        }

        let (sin_phi, cos_phi) = phi.sin_cos();
        let n = WGS84_A / (1.0 - self.e2 * sin_phi * sin_phi).sqrt();
        let t = (sin_phi / cos_phi).powi(2);
        let c = self.ep2 * cos_phi * cos_phi;
        let a = dlam * cos_phi;
        let a2 = a * a;

        let x = n
            * (a + (1.0 - t + c) * a2 * a / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.ep2) * a2 * a2 * a / 120.0);
        let y = self.meridian_arc(phi) - self.m0
            + n * phi.tan()
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a2 * a2 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * self.ep2) * a2 * a2 * a2
                        / 720.0);
        (x, y)
    }
}
