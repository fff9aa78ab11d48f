use crate::generator::template::smooth_step;
use anyhow::{ensure, Context};
use pgdcore::prelude::{GeoPoint, Hypocenter};
use pgdcore::station::SeriesInput;
use pgdcore::ScalingLaw;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const KM_PER_DEGREE: f64 = 111.195;

/// Configuration for generating a synthetic station network and event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub stations: usize,
    /// Stations are spread uniformly in epicentral distance up to this (km).
    pub radius_km: f64,
    pub magnitude: f64,
    pub hypocenter: Hypocenter,
    pub origin_time: f64,
    /// Seconds of data before and after the origin time.
    pub pre_event: f64,
    pub post_event: f64,
    pub sampling_rate: f64,
    /// Speed (km/s) of the displacement front.
    pub wave_speed: f64,
    pub rise_time: f64,
    /// Peak amplitude (m) of the uniform noise added to every component.
    pub noise: f64,
    pub law: ScalingLaw,
    pub seed: u64,
    pub description: Option<String>,
    pub scenario: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            stations: 24,
            radius_km: 600.0,
            magnitude: 7.5,
            hypocenter: Hypocenter::new(-72.0, -35.0, 25.0),
            origin_time: 1_700_000_000.0,
            pre_event: 300.0,
            post_event: 300.0,
            sampling_rate: 1.0,
            wave_speed: 3.5,
            rise_time: 20.0,
            noise: 0.005,
            law: ScalingLaw::Melgar2015,
            seed: 0,
            description: None,
            scenario: None,
        }
    }
}

/// Station of a generated scenario with its full coordinate series.
#[derive(Debug, Clone)]
pub struct SyntheticStation {
    pub code: String,
    pub name: String,
    pub ref_coords: GeoPoint,
    pub hypocentral_km: f64,
    pub series: SeriesInput,
}

#[derive(Debug, Clone)]
pub struct ScenarioData {
    pub name: Option<String>,
    pub description: Option<String>,
    pub hypocenter: Hypocenter,
    pub origin_time: f64,
    pub stations: Vec<SyntheticStation>,
}

fn build_station(
    config: &GeneratorConfig,
    index: usize,
    rng: &mut StdRng,
) -> SyntheticStation {
    let hypocenter = config.hypocenter;
    let azimuth = rng.gen_range(0.0..2.0 * PI);
    let epicentral = rng.gen_range(10.0..config.radius_km.max(10.5));
    let (east_km, north_km) = (epicentral * azimuth.sin(), epicentral * azimuth.cos());
    let ref_coords = GeoPoint::new(
        hypocenter.lon + east_km / (KM_PER_DEGREE * hypocenter.lat.to_radians().cos()),
        hypocenter.lat + north_km / KM_PER_DEGREE,
    );

    let hypocentral_km = epicentral.hypot(hypocenter.depth);
    let amplitude = config.law.pgd_cm(config.magnitude, hypocentral_km) / 100.0;
    let t_arrival = config.origin_time + hypocentral_km / config.wave_speed;

    let step = 1.0 / config.sampling_rate;
    let count = ((config.pre_event + config.post_event) * config.sampling_rate).round() as usize;
    let t_start = config.origin_time - config.pre_event;
    let mut series = SeriesInput::default();
    for i in 0..count {
        let t = t_start + i as f64 * step;
        let shape = smooth_step(t, t_arrival, config.rise_time);
        let mut jitter = || {
            if config.noise > 0.0 {
                rng.gen_range(-config.noise..config.noise)
            } else {
                0.0
            }
        };
        let east = amplitude * azimuth.sin() * shape + jitter();
        let north = amplitude * azimuth.cos() * shape + jitter();
        let up = jitter();
        series.times.push(t);
        for (component, value) in series.coords.iter_mut().zip([east, north, up]) {
            component.push(value);
        }
        for component in series.std_coords.iter_mut() {
            component.push(config.noise.max(1.0e-3));
        }
    }

    SyntheticStation {
        code: format!("S{:03}", index),
        name: format!("synthetic station {}", index),
        ref_coords,
        hypocentral_km,
        series,
    }
}

pub fn build_scenario_from_config(config: &GeneratorConfig) -> anyhow::Result<ScenarioData> {
    ensure!(config.sampling_rate > 0.0, "sampling rate must be positive");
    ensure!(config.wave_speed > 0.0, "wave speed must be positive");
    let total = config
        .stations
        .checked_mul(((config.pre_event + config.post_event) * config.sampling_rate) as usize)
        .context("overflow computing sample count for generator")?;
    ensure!(total > 0, "scenario has no samples");

    let mut rng = StdRng::seed_from_u64(config.seed);
    let stations = (0..config.stations)
        .map(|index| build_station(config, index, &mut rng))
        .collect();

    Ok(ScenarioData {
        name: config.scenario.clone(),
        description: config.description.clone(),
        hypocenter: config.hypocenter,
        origin_time: config.origin_time,
        stations,
    })
}

pub fn build_scenario(stations: usize, magnitude: f64) -> anyhow::Result<ScenarioData> {
    let config = GeneratorConfig {
        stations,
        magnitude,
        ..Default::default()
    };
    build_scenario_from_config(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_builds_expected_sample_count() {
        let scenario = build_scenario(4, 7.0).unwrap();
        assert_eq!(scenario.stations.len(), 4);
        for station in &scenario.stations {
            assert_eq!(station.series.len(), 600);
            assert!(station.series.is_consistent());
        }
        assert_eq!(scenario.stations[3].code, "S003");
    }

    #[test]
    fn noiseless_station_reaches_predicted_offset() {
        let config = GeneratorConfig {
            stations: 1,
            noise: 0.0,
            seed: 7,
            ..Default::default()
        };
        let scenario = build_scenario_from_config(&config).unwrap();
        let station = &scenario.stations[0];
        let n = station.series.len();
        let last = (station.series.coords[0][n - 1]).hypot(station.series.coords[1][n - 1]);
        let expected = config.law.pgd_cm(config.magnitude, station.hypocentral_km) / 100.0;
        assert!((last - expected).abs() < 1e-9);
        assert_eq!(station.series.coords[0][0], 0.0);
    }

    #[test]
    fn same_seed_gives_same_network() {
        let a = build_scenario(3, 6.5).unwrap();
        let b = build_scenario(3, 6.5).unwrap();
        assert_eq!(a.stations[2].ref_coords, b.stations[2].ref_coords);
        assert_eq!(a.stations[2].series, b.stations[2].series);
    }

    #[test]
    fn scenario_keeps_name_and_description() {
        let config = GeneratorConfig {
            stations: 2,
            scenario: Some("maule".into()),
            description: Some("offshore thrust".into()),
            ..Default::default()
        };
        let scenario = build_scenario_from_config(&config).unwrap();
        assert_eq!(scenario.name.as_deref(), Some("maule"));
        assert_eq!(scenario.description.as_deref(), Some("offshore thrust"));
    }

    #[test]
    fn zero_rate_is_rejected() {
        let config = GeneratorConfig {
            sampling_rate: 0.0,
            ..Default::default()
        };
        assert!(build_scenario_from_config(&config).is_err());
    }
}
