use crate::workflow::runner::WorkflowResult;
use pgdcore::magnitude::MwEstimate;
use pgdcore::NetworkMwSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latest network magnitude state served to HTTP clients.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MagnitudeModel {
    pub scenario: Option<String>,
    pub description: Option<String>,
    pub stations_registered: usize,
    pub stations_in_range: usize,
    pub final_mw: Option<f64>,
    pub peak_mw: Option<f64>,
    pub station_mw: BTreeMap<String, MwEstimate>,
    pub series: Option<NetworkMwSeries>,
}

impl MagnitudeModel {
    pub fn from_result(
        result: &WorkflowResult,
        scenario: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            scenario,
            description,
            stations_registered: result.stations_registered,
            stations_in_range: result.stations_in_range,
            final_mw: result.final_mw(),
            peak_mw: result.peak_mw(),
            station_mw: result.station_mw.clone(),
            series: result.series.clone(),
        }
    }
}
