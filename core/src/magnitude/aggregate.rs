//! Fusion of per-station PGD series into one network magnitude series.

use crate::magnitude::scaling::ScalingLaw;
use crate::math::stats::StatsHelper;
use crate::prelude::{DEFAULT_MAX_DISTANCE_KM, DEFAULT_VEL_MASK, DEFAULT_WINDOW_PGD};
use crate::station::buffer::PgdSeries;
use log::debug;
use ndarray::{s, Array1, Zip};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Averages below this value are reported as missing.
pub const MW_FLOOR: f64 = 1.0e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MwSeriesOptions {
    /// Apparent speed (km/s) used to mask samples before wave arrival.
    pub vel_mask: f64,
    /// Length (s) of the PGD series requested from every station.
    pub window: f64,
    pub max_distance: f64,
    pub law: ScalingLaw,
}

impl Default for MwSeriesOptions {
    fn default() -> Self {
        Self {
            vel_mask: DEFAULT_VEL_MASK,
            window: DEFAULT_WINDOW_PGD,
            max_distance: DEFAULT_MAX_DISTANCE_KM,
            law: ScalingLaw::Melgar2015,
        }
    }
}

/// Network Mw on a uniform grid of seconds since the origin time.
///
/// `mw` is NaN where no station contributed or where the average fell under
/// [`MW_FLOOR`]; `contributors` tells the two cases apart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkMwSeries {
    pub t: Vec<f64>,
    pub mw: Vec<f64>,
    pub contributors: Vec<usize>,
}

impl NetworkMwSeries {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Latest grid point carrying a value, as `(t, mw)`.
    pub fn latest(&self) -> Option<(f64, f64)> {
        self.t
            .iter()
            .zip(self.mw.iter())
            .rev()
            .find(|(_, mw)| mw.is_finite())
            .map(|(&t, &mw)| (t, mw))
    }

    pub fn peak(&self) -> Option<f64> {
        self.mw
            .iter()
            .copied()
            .filter(|mw| mw.is_finite())
            .fold(None, |peak, mw| Some(peak.map_or(mw, |p: f64| p.max(mw))))
    }
}

struct Contributor<'a> {
    series: &'a PgdSeries,
    distance: f64,
    t_mask: f64,
}

/// Combines station PGD series (m) into a network Mw series.
///
/// Each station only contributes from the sample nearest to its arrival mask
/// time `t_origin + r / vel_mask` onwards. Returns `None` when no station
/// has both a distance and PGD data.
pub fn aggregate_mw(
    pgd: &BTreeMap<String, PgdSeries>,
    distances: &BTreeMap<String, f64>,
    t_origin: f64,
    sampling_rate: f64,
    options: &MwSeriesOptions,
) -> Option<NetworkMwSeries> {
    if !(sampling_rate > 0.0) || !t_origin.is_finite() {
        return None;
    }

    let contributors: Vec<Contributor> = distances
        .iter()
        .filter(|(_, r)| **r <= options.max_distance)
        .filter_map(|(code, &r)| {
            let series = pgd.get(code).filter(|s| !s.is_empty())?;
            Some(Contributor {
                series,
                distance: r,
                t_mask: t_origin + r / options.vel_mask,
            })
        })
        .collect();
    if contributors.is_empty() {
        return None;
    }

    let (t_min, t_max) = contributors.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), c| {
            let first = c.series.times[0];
            let last = c.series.times[c.series.len() - 1];
            (lo.min(first), hi.max(last))
        },
    );

    let step = 1.0 / sampling_rate;
    let grid = Array1::range(t_min - t_origin, t_max - t_origin + 0.5 * step, step);
    let grid_times = grid.to_vec();
    let n = grid.len();
    let mut sum = Array1::<f64>::zeros(n);
    let mut count = Array1::<usize>::zeros(n);

    for contributor in &contributors {
        let times = &contributor.series.times;
        if contributor.t_mask > times[times.len() - 1] {
            continue;
        }
        let Some(k) = StatsHelper::nearest_index(times, contributor.t_mask) else {
            continue;
        };
        let Some(i1) = StatsHelper::nearest_index(&grid_times, times[k] - t_origin) else {
            continue;
        };
        let aux: Array1<f64> = contributor.series.pgd[k..]
            .iter()
            .map(|&p| options.law.mw_from_pgd_m(p, contributor.distance))
            .collect();
        let i2 = (i1 + aux.len()).min(n);
        Zip::from(sum.slice_mut(s![i1..i2]))
            .and(count.slice_mut(s![i1..i2]))
            .and(aux.slice(s![..i2 - i1]))
            .for_each(|total, hits, &mw| {
                if mw.is_finite() {
                    *total += mw;
                    *hits += 1;
                }
            });
    }

    let mw = Zip::from(&sum).and(&count).map_collect(|&total, &hits| {
        let average = total / hits.max(1) as f64;
        if average < MW_FLOOR {
            f64::NAN
        } else {
            average
        }
    });

    debug!(
        "aggregated {} station(s) onto {} grid points",
        contributors.len(),
        n
    );

    Some(NetworkMwSeries {
        t: grid_times,
        mw: mw.to_vec(),
        contributors: count.to_vec(),
    })
}
