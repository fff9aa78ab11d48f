use crate::math::stats::StatsHelper;
use crate::prelude::{BaselineStatistic, NetworkError, NetworkResult, ReferenceOptions};
use crate::station::buffer::{
    BufferConfig, DisplacementSeries, Layer, LayerSamples, Offset, PgdQuery, PgdSeries, PgdValue,
    PointSample, Sample, SeriesInput, StationBuffer,
};
use log::debug;
use std::collections::VecDeque;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
struct Reference {
    values: [f64; 3],
    t_origin: f64,
    window_ref: f64,
    statistic: BaselineStatistic,
}

/// Sample store on a uniform time grid covering `length + window_offset`
/// seconds. Missing epochs are kept as NaN slots so indices map to time.
#[derive(Debug, Clone)]
pub struct WindowedBuffer {
    config: BufferConfig,
    times: VecDeque<f64>,
    coords: VecDeque<[f64; 3]>,
    std_coords: VecDeque<[f64; 3]>,
    reference: Option<Reference>,
    cleared: bool,
}

const NAN3: [f64; 3] = [f64::NAN; 3];

fn displacement(coords: &[f64; 3], reference: &[f64; 3], only_hor: bool) -> f64 {
    let de = coords[0] - reference[0];
    let dn = coords[1] - reference[1];
    if only_hor {
        de.hypot(dn)
    } else {
        let du = coords[2] - reference[2];
        (de * de + dn * dn + du * du).sqrt()
    }
}

impl WindowedBuffer {
    pub fn new(config: BufferConfig) -> Self {
        Self {
            config,
            times: VecDeque::new(),
            coords: VecDeque::new(),
            std_coords: VecDeque::new(),
            reference: None,
            cleared: true,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    fn capacity(&self) -> usize {
        self.config.capacity()
    }

    fn push_slot(&mut self, t: f64, coords: [f64; 3], std_coords: [f64; 3]) {
        self.times.push_back(t);
        self.coords.push_back(coords);
        self.std_coords.push_back(std_coords);
    }

    fn trim(&mut self) {
        let capacity = self.capacity();
        while self.times.len() > capacity {
            self.times.pop_front();
            self.coords.pop_front();
            self.std_coords.pop_front();
        }
    }

    fn index_range(&self, t_begin: f64, t_end: f64) -> Range<usize> {
        let start = self.times.partition_point(|&t| t < t_begin);
        let end = self.times.partition_point(|&t| t <= t_end);
        start..end.max(start)
    }

    fn collect(&self, range: Range<usize>, layers: &[Layer]) -> LayerSamples {
        let times = range.clone().map(|i| self.times[i]).collect();
        let layers = layers
            .iter()
            .map(|&layer| {
                let source = match layer {
                    Layer::Coords => &self.coords,
                    Layer::StdCoords => &self.std_coords,
                };
                let mut components: [Vec<f64>; 3] = Default::default();
                for i in range.clone() {
                    for (component, value) in components.iter_mut().zip(source[i].iter()) {
                        component.push(*value);
                    }
                }
                (layer, components)
            })
            .collect();
        LayerSamples { times, layers }
    }

    fn interpolate(&self, source: &VecDeque<[f64; 3]>, lo: usize, hi: usize, t: f64) -> [f64; 3] {
        let (t_lo, t_hi) = (self.times[lo], self.times[hi]);
        let weight = (t - t_lo) / (t_hi - t_lo);
        let nearest = if weight <= 0.5 { lo } else { hi };
        let mut out = NAN3;
        for (k, value) in out.iter_mut().enumerate() {
            let (a, b) = (source[lo][k], source[hi][k]);
            *value = if a.is_finite() && b.is_finite() {
                a + weight * (b - a)
            } else {
                source[nearest][k]
            };
        }
        out
    }

    fn reference_matches(&self, t_origin: f64, options: &ReferenceOptions) -> bool {
        self.reference.as_ref().is_some_and(|r| {
            r.t_origin == t_origin
                && r.window_ref == options.window_ref
                && r.statistic == options.statistic
        })
    }

    fn ensure_reference(
        &mut self,
        t_origin: f64,
        options: &ReferenceOptions,
    ) -> NetworkResult<[f64; 3]> {
        self.eval_ref_values(t_origin, options)?;
        self.reference
            .as_ref()
            .map(|r| r.values)
            .ok_or_else(|| NetworkError::InsufficientData("reference values unavailable".into()))
    }
}

impl StationBuffer for WindowedBuffer {
    fn with_config(config: &BufferConfig) -> Self {
        Self::new(*config)
    }

    fn config(&self) -> &BufferConfig {
        &self.config
    }

    fn set_window_offset(&mut self, window_offset: f64) {
        self.config.window_offset = window_offset;
        self.trim();
    }

    fn add_point(&mut self, sample: Sample) {
        if !sample.t.is_finite() {
            debug!("dropping sample with non-finite time {}", sample.t);
            return;
        }
        let step = self.config.step();
        if let Some(&last) = self.times.back() {
            if sample.t < last + 0.5 * step {
                debug!("dropping out-of-order sample at {} (last {})", sample.t, last);
                return;
            }
            let slots = ((sample.t - last) / step).round() as usize;
            if slots > self.capacity() {
                self.times.clear();
                self.coords.clear();
                self.std_coords.clear();
            } else {
                for k in 1..slots {
                    self.push_slot(last + k as f64 * step, NAN3, NAN3);
                }
            }
        }
        self.push_slot(sample.t, sample.coords, sample.std_coords);
        self.trim();
        self.cleared = false;
    }

    fn set_series(&mut self, series: &SeriesInput) -> NetworkResult<()> {
        if !series.is_consistent() {
            return Err(NetworkError::InvalidInput(
                "series components differ in length".into(),
            ));
        }
        self.clear();
        for i in 0..series.len() {
            self.add_point(Sample::new(
                series.times[i],
                [series.coords[0][i], series.coords[1][i], series.coords[2][i]],
                [
                    series.std_coords[0][i],
                    series.std_coords[1][i],
                    series.std_coords[2][i],
                ],
            ));
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.times.clear();
        self.coords.clear();
        self.std_coords.clear();
        self.reference = None;
        self.cleared = true;
    }

    fn is_cleared(&self) -> bool {
        self.cleared
    }

    fn t_first(&self) -> Option<f64> {
        self.times.front().copied()
    }

    fn t_last(&self) -> Option<f64> {
        self.times.back().copied()
    }

    fn t_oldest(&self) -> Option<f64> {
        let first = self.t_first()?;
        let last = self.t_last()?;
        Some(first.max(last - self.config.length))
    }

    fn point(&self, t: f64, layers: &[Layer]) -> Option<PointSample> {
        let (first, last) = (self.t_first()?, self.t_last()?);
        if !(first..=last).contains(&t) {
            return None;
        }
        let hi = self.times.partition_point(|&x| x < t);
        let values = |source: &VecDeque<[f64; 3]>| {
            if self.times[hi] == t {
                source[hi]
            } else {
                self.interpolate(source, hi - 1, hi, t)
            }
        };
        let layers = layers
            .iter()
            .map(|&layer| match layer {
                Layer::Coords => (layer, values(&self.coords)),
                Layer::StdCoords => (layer, values(&self.std_coords)),
            })
            .collect();
        Some(PointSample { t, layers })
    }

    fn interval(&self, t_begin: f64, t_end: f64, layers: &[Layer]) -> LayerSamples {
        self.collect(self.index_range(t_begin, t_end), layers)
    }

    fn last(&self, window: f64, layers: &[Layer]) -> LayerSamples {
        match self.t_last() {
            Some(last) => self.interval(last - window, last, layers),
            None => LayerSamples::default(),
        }
    }

    fn first(&self, window: f64, layers: &[Layer]) -> LayerSamples {
        match self.t_first() {
            Some(first) => self.interval(first, first + window, layers),
            None => LayerSamples::default(),
        }
    }

    fn get(&self, layers: &[Layer]) -> LayerSamples {
        self.collect(0..self.times.len(), layers)
    }

    fn eval_ref_values(&mut self, t_origin: f64, options: &ReferenceOptions) -> NetworkResult<()> {
        if !options.force && self.reference_matches(t_origin, options) {
            return Ok(());
        }
        self.reference = None;

        let start = self.times.partition_point(|&t| t < t_origin - options.window_ref);
        let end = self.times.partition_point(|&t| t < t_origin);
        let mut values = NAN3;
        for (k, value) in values.iter_mut().enumerate() {
            let component: Vec<f64> = (start..end).map(|i| self.coords[i][k]).collect();
            *value = StatsHelper::baseline(&component, options.statistic).ok_or_else(|| {
                NetworkError::InsufficientData(format!(
                    "no samples in reference window [{}, {})",
                    t_origin - options.window_ref,
                    t_origin
                ))
            })?;
        }

        self.reference = Some(Reference {
            values,
            t_origin,
            window_ref: options.window_ref,
            statistic: options.statistic,
        });
        Ok(())
    }

    fn ref_values(&self) -> Option<[f64; 3]> {
        self.reference.as_ref().map(|r| r.values)
    }

    fn eval_pgd(
        &mut self,
        t_origin: f64,
        query: &PgdQuery,
        options: &ReferenceOptions,
    ) -> NetworkResult<PgdValue> {
        let reference = self.ensure_reference(t_origin, options)?;
        let t_start = query.t_s.unwrap_or(t_origin);
        let mut peak: Option<PgdValue> = None;
        for i in self.index_range(t_start, t_start + query.window_pgd) {
            let d = displacement(&self.coords[i], &reference, query.only_hor);
            if d.is_finite() && peak.map_or(true, |p| d > p.pgd) {
                peak = Some(PgdValue {
                    pgd: d,
                    t_pgd: self.times[i],
                });
            }
        }
        peak.ok_or_else(|| {
            NetworkError::InsufficientData(format!("no valid samples after {}", t_start))
        })
    }

    fn eval_offset(
        &mut self,
        t_eval: f64,
        t_origin: f64,
        options: &ReferenceOptions,
    ) -> NetworkResult<Offset> {
        let reference = self.ensure_reference(t_origin, options)?;
        let coords = self
            .point(t_eval, &[Layer::Coords])
            .and_then(|p| p.layer(Layer::Coords))
            .ok_or_else(|| NetworkError::InsufficientData(format!("no data at {}", t_eval)))?;
        let enu = [
            coords[0] - reference[0],
            coords[1] - reference[1],
            coords[2] - reference[2],
        ];
        if enu.iter().any(|v| !v.is_finite()) {
            return Err(NetworkError::InsufficientData(format!(
                "gap in data at {}",
                t_eval
            )));
        }
        Ok(Offset {
            t: t_eval,
            enu,
            horizontal: enu[0].hypot(enu[1]),
        })
    }

    fn pgd_timeseries(
        &mut self,
        t_origin: f64,
        window: f64,
        options: &ReferenceOptions,
    ) -> NetworkResult<PgdSeries> {
        let reference = self.ensure_reference(t_origin, options)?;
        let mut series = PgdSeries::default();
        let mut running = f64::NAN;
        for i in self.index_range(t_origin, t_origin + window) {
            let d = displacement(&self.coords[i], &reference, false);
            if d.is_finite() && !(d <= running) {
                running = d;
            }
            if running.is_finite() {
                series.times.push(self.times[i]);
                series.pgd.push(running);
            }
        }
        Ok(series)
    }

    fn ground_displ_timeseries(
        &mut self,
        t_origin: f64,
        window: f64,
        options: &ReferenceOptions,
    ) -> NetworkResult<DisplacementSeries> {
        let reference = self.ensure_reference(t_origin, options)?;
        let mut series = DisplacementSeries::default();
        for i in self.index_range(t_origin, t_origin + window) {
            series.times.push(self.times[i]);
            for (k, component) in series.enu.iter_mut().enumerate() {
                component.push(self.coords[i][k] - reference[k]);
            }
        }
        Ok(series)
    }
}
