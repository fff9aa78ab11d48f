use std::f64::consts::PI;

/// Cosine-tapered step: 0 before `t_arrival`, 1 after `t_arrival + rise`.
pub fn smooth_step(t: f64, t_arrival: f64, rise: f64) -> f64 {
    if t <= t_arrival {
        0.0
    } else if rise <= 0.0 || t >= t_arrival + rise {
        1.0
    } else {
        0.5 * (1.0 - (PI * (t - t_arrival) / rise).cos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_is_bounded_and_monotonic() {
        assert_eq!(smooth_step(9.0, 10.0, 4.0), 0.0);
        assert!((smooth_step(12.0, 10.0, 4.0) - 0.5).abs() < 1e-12);
        assert_eq!(smooth_step(14.0, 10.0, 4.0), 1.0);
        assert_eq!(smooth_step(10.5, 10.0, 0.0), 1.0);
        let values: Vec<f64> = (0..20).map(|i| smooth_step(i as f64 * 0.25, 1.0, 3.0)).collect();
        assert!(values.windows(2).all(|w| w[1] >= w[0]));
    }
}
