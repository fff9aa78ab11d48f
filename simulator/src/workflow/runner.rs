use crate::generator::profile::{build_scenario_from_config, GeneratorConfig, ScenarioData};
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::{debug, info};
use pgdcore::magnitude::MwEstimate;
use pgdcore::prelude::{StationRef, DEFAULT_WINDOW_PGD};
use pgdcore::telemetry::MetricsSnapshot;
use pgdcore::{NetworkMwSeries, NetworkTimeSeries};
use std::collections::BTreeMap;

pub struct WorkflowResult {
    pub stations_registered: usize,
    pub stations_in_range: usize,
    pub baselines: usize,
    pub station_mw: BTreeMap<String, MwEstimate>,
    pub series: Option<NetworkMwSeries>,
    pub metrics: MetricsSnapshot,
}

impl WorkflowResult {
    pub fn final_mw(&self) -> Option<f64> {
        self.series.as_ref().and_then(|s| s.latest()).map(|(_, mw)| mw)
    }

    pub fn peak_mw(&self) -> Option<f64> {
        self.series.as_ref().and_then(|s| s.peak())
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn execute(&self, scenario: &ScenarioData) -> anyhow::Result<WorkflowResult> {
        let mut network =
            NetworkTimeSeries::new(&self.config.network).context("building station network")?;

        for station in &scenario.stations {
            let index = network
                .add_station(&station.code, Some(station.ref_coords), &station.name)
                .with_context(|| format!("registering station {}", station.code))?;
            let Some(index) = index else {
                continue;
            };
            debug!(
                "station {} registered at {:.1} km from the hypocenter",
                station.code, station.hypocentral_km
            );
            network
                .set_station_timeseries(&StationRef::Index(index), &station.series, true)
                .with_context(|| format!("loading series of {}", station.code))?;
        }

        network.set_hypocenter_coords(
            scenario.hypocenter,
            Some(self.config.aggregation.max_distance),
        );
        let baselines = network
            .eval_ref_values(Some(scenario.origin_time), &self.config.reference)
            .context("evaluating reference values")?;

        let station_mw = network
            .eval_pgd_and_mw(
                &BTreeMap::new(),
                DEFAULT_WINDOW_PGD,
                false,
                &self.config.reference,
                self.config.aggregation.law,
            )
            .context("evaluating station PGD")?;
        let series = network
            .mw_timeseries_from_pgd(None, &self.config.aggregation, &self.config.reference)
            .context("aggregating network Mw")?;

        let result = WorkflowResult {
            stations_registered: network.n_stations(),
            stations_in_range: network.distances().len(),
            baselines,
            station_mw,
            series,
            metrics: network.metrics(),
        };
        info!(
            "scenario {} ({}): {} stations, {} in range, final Mw {:?}",
            scenario.name.as_deref().unwrap_or("unnamed"),
            scenario.description.as_deref().unwrap_or("no description"),
            result.stations_registered,
            result.stations_in_range,
            result.final_mw()
        );
        Ok(result)
    }

    pub fn execute_config(&self, generator: &GeneratorConfig) -> anyhow::Result<WorkflowResult> {
        let scenario = build_scenario_from_config(generator).context("generating scenario")?;
        self.execute(&scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::build_scenario;
    use pgdcore::ScalingLaw;

    #[test]
    fn runner_recovers_scenario_magnitude() {
        let cfg = WorkflowConfig::from_args(8, 7.4, 25.0, 11, ScalingLaw::Melgar2015);
        let runner = Runner::new(cfg);
        let result = runner.execute_config(&runner.config().generator).unwrap();
        assert_eq!(result.stations_registered, 8);
        assert_eq!(result.baselines, 8);
        assert!(result.stations_in_range > 0);
        let final_mw = result.final_mw().unwrap();
        assert!((final_mw - 7.4).abs() < 0.3, "final Mw {}", final_mw);
        let series = result.series.as_ref().unwrap();
        assert_eq!(series.t.len(), series.mw.len());
    }

    #[test]
    fn runner_reports_no_series_when_stations_are_out_of_range() {
        let mut cfg = WorkflowConfig::from_args(3, 7.0, 20.0, 1, ScalingLaw::Melgar2015);
        cfg.aggregation.max_distance = 5.0;
        let runner = Runner::new(cfg);
        let scenario = build_scenario(3, 7.0).unwrap();
        let result = runner.execute(&scenario).unwrap();
        assert_eq!(result.stations_in_range, 0);
        assert!(result.series.is_none());
        assert!(result.final_mw().is_none());
        assert!(result.station_mw.is_empty());
    }
}
