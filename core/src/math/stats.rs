use crate::prelude::BaselineStatistic;

pub struct StatsHelper;

impl StatsHelper {
    fn finite_sorted(samples: &[f64]) -> Vec<f64> {
        let mut values: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values
    }

    /// Mean of the finite samples, `None` when there are none.
    pub fn mean(samples: &[f64]) -> Option<f64> {
        let (sum, count) = samples
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    pub fn median(samples: &[f64]) -> Option<f64> {
        let values = Self::finite_sorted(samples);
        let n = values.len();
        if n == 0 {
            return None;
        }
        if n % 2 == 1 {
            Some(values[n / 2])
        } else {
            Some(0.5 * (values[n / 2 - 1] + values[n / 2]))
        }
    }

    /// Mean after discarding `fraction` of the finite samples at each tail.
    pub fn trimmed_mean(samples: &[f64], fraction: f64) -> Option<f64> {
        let values = Self::finite_sorted(samples);
        if values.is_empty() {
            return None;
        }
        let fraction = fraction.clamp(0.0, 0.5);
        let cut = (values.len() as f64 * fraction).floor() as usize;
        let kept = if 2 * cut >= values.len() {
            &values[..]
        } else {
            &values[cut..values.len() - cut]
        };
        Self::mean(kept)
    }

    pub fn baseline(samples: &[f64], statistic: BaselineStatistic) -> Option<f64> {
        match statistic {
            BaselineStatistic::Mean => Self::mean(samples),
            BaselineStatistic::Median => Self::median(samples),
            BaselineStatistic::TrimmedMean { fraction } => Self::trimmed_mean(samples, fraction),
        }
    }

    /// Index of the element closest to `target`; ties resolve to the first.
    pub fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, &value) in values.iter().enumerate() {
            let gap = (value - target).abs();
            match best {
                Some((_, best_gap)) if gap >= best_gap => {}
                _ => best = Some((idx, gap)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Median spacing between consecutive timestamps.
    pub fn median_step(times: &[f64]) -> Option<f64> {
        let steps: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
        Self::median(&steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_skips_non_finite_samples() {
        assert_eq!(StatsHelper::mean(&[]), None);
        assert_eq!(StatsHelper::mean(&[f64::NAN, f64::NAN]), None);
        assert_eq!(StatsHelper::mean(&[1.0, f64::NAN, 3.0]), Some(2.0));
    }

    #[test]
    fn median_handles_even_and_odd_lengths() {
        assert_eq!(StatsHelper::median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(StatsHelper::median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn trimmed_mean_drops_outliers() {
        let samples = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 100.0];
        assert_eq!(StatsHelper::trimmed_mean(&samples, 0.1), Some(1.0));
    }

    #[test]
    fn nearest_index_prefers_first_on_tie() {
        let times = [16.0, 17.0, 18.0, 19.0];
        assert_eq!(StatsHelper::nearest_index(&times, 50.0 / 3.0), Some(1));
        assert_eq!(StatsHelper::nearest_index(&times, 16.5), Some(0));
        assert_eq!(StatsHelper::nearest_index(&[], 1.0), None);
    }

    #[test]
    fn median_step_of_regular_series() {
        assert_eq!(StatsHelper::median_step(&[0.0, 2.0, 4.0, 6.0]), Some(2.0));
        assert_eq!(StatsHelper::median_step(&[0.0]), None);
    }
}
