use crate::math::projection::Projector;
use crate::network::NetworkTimeSeries;
use crate::prelude::{NetworkError, NetworkResult, ReferenceOptions};
use crate::station::buffer::StationBuffer;

impl<B: StationBuffer, P: Projector> NetworkTimeSeries<B, P> {
    /// Sets the origin time when given, then (re)computes the pre-event
    /// baseline of every station. Stations lacking reference data are
    /// logged and skipped. Returns how many stations have a baseline.
    pub fn eval_ref_values(
        &mut self,
        t_origin: Option<f64>,
        options: &ReferenceOptions,
    ) -> NetworkResult<usize> {
        self.set_t_origin(t_origin);
        let t_origin = self.t_origin().ok_or(NetworkError::OriginTimeUnset)?;

        let mut ready = 0;
        for station in self.registry.iter_mut() {
            match station.buffer.eval_ref_values(t_origin, options) {
                Ok(()) => {
                    self.metrics.record_evaluated();
                    ready += 1;
                }
                Err(err) => {
                    self.metrics.record_failure();
                    self.logger.station_failure(&station.code, &err);
                }
            }
        }
        if ready == 0 && !self.registry.is_empty() {
            self.logger
                .warn(&format!("no station has data before origin time {}", t_origin));
        }
        Ok(ready)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::{BaselineStatistic, NetworkError, ReferenceOptions, StationRef};
    use crate::station::buffer::{Sample, StationBuffer};
    use crate::testing::{planar_network, ramp_samples};

    #[test]
    fn baselines_are_computed_for_stations_with_data() {
        let mut network = planar_network(&[("AAAA", 0.1, 0.0), ("BBBB", 0.2, 0.0)]);
        for sample in ramp_samples(0, 200, 150.0, 10.0, 0.4) {
            network.add_point_to_station(&"AAAA".into(), sample).unwrap();
        }

        let ready = network
            .eval_ref_values(Some(140.0), &ReferenceOptions::default())
            .unwrap();
        assert_eq!(ready, 1);
        assert_eq!(network.ref_values_at(&"AAAA".into()).unwrap(), Some([0.0; 3]));
        assert!(!network.ref_values_are_set_at(&StationRef::Index(1)).unwrap());
        assert_eq!(network.metrics().failed, 1);
    }

    #[test]
    fn missing_origin_time_is_an_error() {
        let mut network = planar_network(&[("AAAA", 0.1, 0.0)]);
        let result = network.eval_ref_values(None, &ReferenceOptions::default());
        assert_eq!(result, Err(NetworkError::OriginTimeUnset));
    }

    #[test]
    fn force_recomputes_existing_baseline() {
        let mut network = planar_network(&[("AAAA", 0.1, 0.0)]);
        let station = StationRef::from("AAAA");
        network
            .add_point_to_station(&station, Sample::new(0.0, [1.0, 0.0, 0.0], [0.0; 3]))
            .unwrap();
        let options = ReferenceOptions {
            statistic: BaselineStatistic::Median,
            ..Default::default()
        };
        network.eval_ref_values(Some(10.0), &options).unwrap();

        // a late sample inside the window only shows up when forced
        network
            .station_buffer_mut(&station)
            .unwrap()
            .add_point(Sample::new(5.0, [3.0, 0.0, 0.0], [0.0; 3]));
        network.eval_ref_values(None, &options).unwrap();
        assert_eq!(network.ref_values_at(&station).unwrap().unwrap()[0], 1.0);

        let forced = ReferenceOptions {
            force: true,
            ..options
        };
        network.eval_ref_values(None, &forced).unwrap();
        assert_eq!(network.ref_values_at(&station).unwrap().unwrap()[0], 2.0);
    }
}
