use crate::magnitude::aggregate::{aggregate_mw, MwSeriesOptions, NetworkMwSeries};
use crate::magnitude::scaling::{mw_from_pgd, MwEstimate, ScalingLaw};
use crate::math::projection::Projector;
use crate::network::NetworkTimeSeries;
use crate::prelude::{NetworkError, NetworkResult, ReferenceOptions, StationRef};
use crate::station::buffer::{DisplacementSeries, Offset, PgdQuery, PgdSeries, PgdValue, StationBuffer};
use std::collections::BTreeMap;

impl<B: StationBuffer, P: Projector> NetworkTimeSeries<B, P> {
    fn require_origin(&self) -> NetworkResult<f64> {
        self.t_origin().ok_or(NetworkError::OriginTimeUnset)
    }

    fn resolve_all(&self, stations: Option<&[StationRef]>) -> NetworkResult<Vec<usize>> {
        match stations {
            Some(stations) => stations.iter().map(|s| self.registry.resolve(s)).collect(),
            None => Ok((0..self.registry.len()).collect()),
        }
    }

    /// Runs `query` on each listed station. Failing stations are logged,
    /// counted and left out of the result.
    fn fan_out<T>(
        &mut self,
        indices: Vec<usize>,
        mut query: impl FnMut(&str, &mut B) -> Option<NetworkResult<T>>,
    ) -> BTreeMap<String, T> {
        let mut results = BTreeMap::new();
        for index in indices {
            let Ok(station) = self.registry.station_mut(&StationRef::Index(index)) else {
                continue;
            };
            match query(&station.code, &mut station.buffer) {
                Some(Ok(value)) => {
                    self.metrics.record_evaluated();
                    results.insert(station.code.clone(), value);
                }
                Some(Err(err)) => {
                    self.metrics.record_failure();
                    self.logger.station_failure(&station.code, &err);
                }
                None => {}
            }
        }
        results
    }

    pub fn eval_pgd_at_station(
        &mut self,
        station: &StationRef,
        query: &PgdQuery,
        options: &ReferenceOptions,
    ) -> NetworkResult<PgdValue> {
        let t_origin = self.require_origin()?;
        self.station_buffer_mut(station)?
            .eval_pgd(t_origin, query, options)
    }

    /// PGD of every station; `t_s` optionally overrides the window start
    /// per station code.
    pub fn eval_pgd(
        &mut self,
        t_s: &BTreeMap<String, f64>,
        window_pgd: f64,
        only_hor: bool,
        options: &ReferenceOptions,
    ) -> NetworkResult<BTreeMap<String, PgdValue>> {
        let t_origin = self.require_origin()?;
        let indices = self.resolve_all(None)?;
        Ok(self.fan_out(indices, |code, buffer| {
            let query = PgdQuery {
                t_s: t_s.get(code).copied(),
                window_pgd,
                only_hor,
            };
            Some(buffer.eval_pgd(t_origin, &query, options))
        }))
    }

    pub fn eval_offset_at_station(
        &mut self,
        station: &StationRef,
        t_eval: f64,
        options: &ReferenceOptions,
    ) -> NetworkResult<Offset> {
        let t_origin = self.require_origin()?;
        self.station_buffer_mut(station)?
            .eval_offset(t_eval, t_origin, options)
    }

    /// Offsets at the per-station evaluation times. Stations without an
    /// entry in `t_eval` are skipped.
    pub fn eval_offset(
        &mut self,
        t_eval: &BTreeMap<String, f64>,
        options: &ReferenceOptions,
    ) -> NetworkResult<BTreeMap<String, Offset>> {
        let t_origin = self.require_origin()?;
        let indices = self.resolve_all(None)?;
        Ok(self.fan_out(indices, |code, buffer| {
            let t = *t_eval.get(code)?;
            Some(buffer.eval_offset(t, t_origin, options))
        }))
    }

    /// PGD series of the given stations, or of all stations. Unknown
    /// stations fail the whole call before any buffer is queried.
    pub fn pgd_timeseries(
        &mut self,
        stations: Option<&[StationRef]>,
        window: f64,
        options: &ReferenceOptions,
    ) -> NetworkResult<BTreeMap<String, PgdSeries>> {
        let t_origin = self.require_origin()?;
        let indices = self.resolve_all(stations)?;
        Ok(self.fan_out(indices, |_, buffer| {
            Some(buffer.pgd_timeseries(t_origin, window, options))
        }))
    }

    pub fn ground_displ_timeseries(
        &mut self,
        stations: Option<&[StationRef]>,
        window: f64,
        options: &ReferenceOptions,
    ) -> NetworkResult<BTreeMap<String, DisplacementSeries>> {
        let t_origin = self.require_origin()?;
        let indices = self.resolve_all(stations)?;
        Ok(self.fan_out(indices, |_, buffer| {
            Some(buffer.ground_displ_timeseries(t_origin, window, options))
        }))
    }

    /// Mw per station in the distance map from PGD values in meters.
    pub fn mw_from_pgd(
        &self,
        pgd_m: &BTreeMap<String, f64>,
        law: ScalingLaw,
    ) -> BTreeMap<String, MwEstimate> {
        mw_from_pgd(pgd_m, self.geometry.distances(), law)
    }

    pub fn eval_pgd_and_mw(
        &mut self,
        t_s: &BTreeMap<String, f64>,
        window_pgd: f64,
        only_hor: bool,
        options: &ReferenceOptions,
        law: ScalingLaw,
    ) -> NetworkResult<BTreeMap<String, MwEstimate>> {
        let pgd: BTreeMap<String, f64> = self
            .eval_pgd(t_s, window_pgd, only_hor, options)?
            .into_iter()
            .map(|(code, value)| (code, value.pgd))
            .collect();
        Ok(self.mw_from_pgd(&pgd, law))
    }

    /// Network Mw series from the current buffers and distance map.
    /// `Ok(None)` means no station could contribute.
    pub fn mw_timeseries_from_pgd(
        &mut self,
        stations: Option<&[StationRef]>,
        mw_options: &MwSeriesOptions,
        options: &ReferenceOptions,
    ) -> NetworkResult<Option<NetworkMwSeries>> {
        let t_origin = self.require_origin()?;
        let pgd = self.pgd_timeseries(stations, mw_options.window, options)?;
        let series = aggregate_mw(
            &pgd,
            self.geometry.distances(),
            t_origin,
            self.sampling_rate(),
            mw_options,
        );
        match &series {
            Some(series) => self.logger.record(&format!(
                "network Mw over {} samples, latest {:?}",
                series.len(),
                series.latest()
            )),
            None => self.logger.record("network Mw: no contributing station"),
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use crate::magnitude::aggregate::MwSeriesOptions;
    use crate::magnitude::scaling::{mw_melgar, ScalingLaw};
    use crate::prelude::{Hypocenter, NetworkError, ReferenceOptions, StationRef};
    use crate::network::NetworkTimeSeries;
    use crate::station::windowed::WindowedBuffer;
    use crate::testing::{planar_network, ramp_samples, PlanarProjector};
    use std::collections::BTreeMap;

    /// Stations 50 km and 100 km east of the epicenter, event at t=100 s.
    fn event_network() -> NetworkTimeSeries<WindowedBuffer, PlanarProjector> {
        let mut network = planar_network(&[("NEAR", 0.5, 0.0), ("FAR1", 1.0, 0.0), ("IDLE", 0.2, 0.0)]);
        for sample in ramp_samples(0, 260, 116.0, 5.0, 0.05) {
            network.add_point_to_station(&"NEAR".into(), sample).unwrap();
        }
        for sample in ramp_samples(0, 260, 132.0, 5.0, 0.02) {
            network.add_point_to_station(&"FAR1".into(), sample).unwrap();
        }
        network.set_hypocenter_coords(Hypocenter::new(0.0, 0.0, 0.0), None);
        network.set_t_origin(Some(100.0));
        network
    }

    #[test]
    fn pgd_fan_out_skips_failing_stations() {
        let mut network = event_network();
        let options = ReferenceOptions::default();
        let pgd = network
            .eval_pgd(&BTreeMap::new(), 300.0, true, &options)
            .unwrap();
        assert_eq!(pgd.len(), 2);
        assert!((pgd["NEAR"].pgd - 0.05).abs() < 1e-12);
        assert_eq!(pgd["NEAR"].t_pgd, 121.0);
        assert!(!pgd.contains_key("IDLE"));
        assert!(network.metrics().failed >= 1);

        let late: BTreeMap<String, f64> = [("FAR1".to_string(), 300.0)].into_iter().collect();
        let pgd = network.eval_pgd(&late, 300.0, true, &options).unwrap();
        assert!(!pgd.contains_key("FAR1"));
        assert!(pgd.contains_key("NEAR"));
    }

    #[test]
    fn offsets_only_for_requested_stations() {
        let mut network = event_network();
        let t_eval: BTreeMap<String, f64> = [("FAR1".to_string(), 200.0)].into_iter().collect();
        let offsets = network
            .eval_offset(&t_eval, &ReferenceOptions::default())
            .unwrap();
        assert_eq!(offsets.len(), 1);
        assert!((offsets["FAR1"].horizontal - 0.02).abs() < 1e-12);

        let single = network
            .eval_offset_at_station(&"NEAR".into(), 200.0, &ReferenceOptions::default())
            .unwrap();
        assert!((single.enu[0] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn queries_need_an_origin_time() {
        let mut network = planar_network(&[("NEAR", 0.5, 0.0)]);
        let result = network.eval_pgd_at_station(
            &StationRef::Index(0),
            &Default::default(),
            &ReferenceOptions::default(),
        );
        assert_eq!(result, Err(NetworkError::OriginTimeUnset));
    }

    #[test]
    fn unknown_station_in_list_fails_the_batch() {
        let mut network = event_network();
        let stations = [StationRef::from("NEAR"), StationRef::from("NOPE")];
        let result = network.pgd_timeseries(Some(&stations), 300.0, &ReferenceOptions::default());
        assert!(matches!(result, Err(NetworkError::UnknownStation(_))));
    }

    #[test]
    fn displacement_series_covers_window_after_origin() {
        let mut network = event_network();
        let stations = [StationRef::from("NEAR")];
        let displ = network
            .ground_displ_timeseries(Some(&stations), 50.0, &ReferenceOptions::default())
            .unwrap();
        let near = &displ["NEAR"];
        assert_eq!(near.times.first(), Some(&100.0));
        assert_eq!(near.times.last(), Some(&150.0));
        assert_eq!(near.enu[0].last(), Some(&0.05));
    }

    #[test]
    fn pgd_and_mw_use_hypocentral_distance() {
        let mut network = event_network();
        let estimates = network
            .eval_pgd_and_mw(
                &BTreeMap::new(),
                300.0,
                false,
                &ReferenceOptions::default(),
                ScalingLaw::Melgar2015,
            )
            .unwrap();
        let near = estimates["NEAR"];
        assert!((near.distance_km - 50.0).abs() < 1e-9);
        assert!((near.mw - mw_melgar(5.0, 50.0)).abs() < 1e-9);
        assert!(!estimates.contains_key("IDLE"));
    }

    #[test]
    fn network_series_starts_at_each_arrival() {
        let mut network = event_network();
        let series = network
            .mw_timeseries_from_pgd(None, &MwSeriesOptions::default(), &ReferenceOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(series.t.first(), Some(&0.0));
        assert_eq!(series.t.last(), Some(&159.0));
        // NEAR masked until 116.7 s, FAR1 until 133.3 s
        let at = |t: f64| series.t.iter().position(|&x| x == t).unwrap();
        assert_eq!(series.contributors[at(16.0)], 0);
        assert_eq!(series.contributors[at(17.0)], 1);
        assert_eq!(series.contributors[at(33.0)], 2);
        assert!(series.mw[at(10.0)].is_nan());

        let final_mw = series.mw[at(159.0)];
        let expected = 0.5 * (mw_melgar(5.0, 50.0) + mw_melgar(2.0, 100.0));
        assert!((final_mw - expected).abs() < 1e-9);
    }

    #[test]
    fn no_distances_means_no_series() {
        let mut network = event_network();
        network.set_hypocenter_coords(Hypocenter::new(40.0, 40.0, 10.0), None);
        let series = network
            .mw_timeseries_from_pgd(None, &MwSeriesOptions::default(), &ReferenceOptions::default())
            .unwrap();
        assert!(series.is_none());
    }
}
