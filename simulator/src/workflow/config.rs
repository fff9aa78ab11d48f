use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use pgdcore::prelude::ReferenceOptions;
use pgdcore::{MwSeriesOptions, NetworkConfig, ScalingLaw};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub network: NetworkConfig,
    pub reference: ReferenceOptions,
    pub aggregation: MwSeriesOptions,
    pub generator: GeneratorConfig,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(stations: usize, magnitude: f64, depth: f64, seed: u64, law: ScalingLaw) -> Self {
        let mut config = Self::default();
        config.generator.stations = stations;
        config.generator.magnitude = magnitude;
        config.generator.hypocenter.depth = depth;
        config.generator.seed = seed;
        config.generator.law = law;
        config.aggregation.law = law;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgdcore::prelude::BaselineStatistic;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_sets_generator_and_law() {
        let cfg = WorkflowConfig::from_args(12, 8.1, 40.0, 3, ScalingLaw::Crowell2013);
        assert_eq!(cfg.generator.stations, 12);
        assert_eq!(cfg.generator.hypocenter.depth, 40.0);
        assert_eq!(cfg.aggregation.law, ScalingLaw::Crowell2013);
        assert_eq!(cfg.network.sampling_rate, "1/s");
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"network:\n  length: 30m\n  sampling_rate: 1/s\nreference:\n  window_ref: 60\n  statistic:\n    kind: median\naggregation:\n  vel_mask: 2.5\n  law: crowell2013\ngenerator:\n  stations: 6\n  magnitude: 6.8\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.network.length, "30m");
        assert_eq!(cfg.network.window_offset, "7m");
        assert_eq!(cfg.reference.window_ref, 60.0);
        assert_eq!(cfg.reference.statistic, BaselineStatistic::Median);
        assert_eq!(cfg.aggregation.vel_mask, 2.5);
        assert_eq!(cfg.aggregation.law, ScalingLaw::Crowell2013);
        assert_eq!(cfg.aggregation.max_distance, 800.0);
        assert_eq!(cfg.generator.stations, 6);
    }

    #[test]
    fn config_load_reports_bad_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"aggregation: [1, 2]\n").unwrap();
        let path = temp.into_temp_path();
        let err = WorkflowConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("parsing workflow config"));
    }
}
