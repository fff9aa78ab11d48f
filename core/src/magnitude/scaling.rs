//! PGD scaling laws. PGD enters in centimeters, hypocentral distance in km.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Melgar et al. (2015), GRL 42, 5197-5205:
/// `log10(PGD) = -4.434 + 1.047 Mw - 0.138 Mw log10(R)`.
pub fn mw_melgar(pgd_cm: f64, r_km: f64) -> f64 {
    (pgd_cm.log10() + 4.434) / (1.047 - 0.138 * r_km.log10())
}

/// Crowell et al. (2013), GRL 40, 6089-6094:
/// `ln(PGD) = -5.013 + 1.219 Mw - 0.178 Mw ln(R)`.
pub fn mw_crowell(pgd_cm: f64, r_km: f64) -> f64 {
    (pgd_cm.ln() + 5.013) / (1.219 - 0.178 * r_km.ln())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScalingLaw {
    #[default]
    Melgar2015,
    Crowell2013,
}

impl ScalingLaw {
    pub fn mw(self, pgd_cm: f64, r_km: f64) -> f64 {
        match self {
            ScalingLaw::Melgar2015 => mw_melgar(pgd_cm, r_km),
            ScalingLaw::Crowell2013 => mw_crowell(pgd_cm, r_km),
        }
    }

    /// Same as [`ScalingLaw::mw`] for a PGD given in meters.
    pub fn mw_from_pgd_m(self, pgd_m: f64, r_km: f64) -> f64 {
        self.mw(100.0 * pgd_m, r_km)
    }

    /// PGD (cm) the law predicts for a magnitude at a distance.
    pub fn pgd_cm(self, mw: f64, r_km: f64) -> f64 {
        match self {
            ScalingLaw::Melgar2015 => {
                10f64.powf(-4.434 + mw * (1.047 - 0.138 * r_km.log10()))
            }
            ScalingLaw::Crowell2013 => (-5.013 + mw * (1.219 - 0.178 * r_km.ln())).exp(),
        }
    }
}

/// Per-station magnitude estimate and the distance it was computed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MwEstimate {
    pub mw: f64,
    pub distance_km: f64,
}

/// Mw for every station present in both maps; `pgd_m` is in meters.
/// Stations whose estimate is not finite are left out.
pub fn mw_from_pgd(
    pgd_m: &BTreeMap<String, f64>,
    distances: &BTreeMap<String, f64>,
    law: ScalingLaw,
) -> BTreeMap<String, MwEstimate> {
    distances
        .iter()
        .filter_map(|(code, &r)| {
            let pgd = *pgd_m.get(code)?;
            let mw = law.mw_from_pgd_m(pgd, r);
            mw.is_finite().then(|| {
                (
                    code.clone(),
                    MwEstimate {
                        mw,
                        distance_km: r,
                    },
                )
            })
        })
        .collect()
}
