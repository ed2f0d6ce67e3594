//! Series statistics and resampling shared by the analysis and render stages.
//!
//! Every function is total over finite input: empty series, single samples and flat
//! ranges map to documented constants instead of NaN.

/// Number of points in the stored brightness series.
pub const SERIES_LEN: usize = 256;

/// Ranges narrower than this are treated as flat.
const DEGENERATE_RANGE: f64 = 1e-12;

pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Rounds to a fixed number of decimal places.
pub fn round_to(x: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (x * factor).round() / factor
}

/// Arithmetic mean; an empty series yields 0.
pub fn mean(series: &[f64]) -> f64 {
    series.iter().sum::<f64>() / series.len().max(1) as f64
}

/// Median of a sorted copy; even lengths average the two central values.
pub fn median(series: &[f64]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    let mut sorted = series.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Min–max scaling to [0, 1]. A flat series maps to a constant 0.5.
pub fn min_max(series: &[f64]) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }
    let min = series.iter().copied().fold(f64::INFINITY, f64::min);
    let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !(range >= DEGENERATE_RANGE) {
        return vec![0.5; series.len()];
    }
    series.iter().map(|&v| clamp01((v - min) / range)).collect()
}

/// Centered moving average. Edge samples average over the truncated window.
pub fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    if series.is_empty() || window <= 1 {
        return series.to_vec();
    }
    let half = window / 2;
    let last = series.len() - 1;
    (0..series.len())
        .map(|idx| {
            let start = idx.saturating_sub(half);
            let end = (idx + half).min(last);
            let slice = &series[start..=end];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Linearly interpolates `series` at fractional index `t`, clamped to the last sample.
pub fn sample_at(series: &[f64], t: f64) -> f64 {
    match series.len() {
        0 => 0.5,
        1 => series[0],
        len => {
            let last = len - 1;
            let t = t.clamp(0.0, last as f64);
            let i0 = t.floor() as usize;
            let i1 = (i0 + 1).min(last);
            let w = t - i0 as f64;
            series[i0] * (1.0 - w) + series[i1] * w
        }
    }
}

/// Resamples to exactly `count` points with `t = i * (len - 1) / (count - 1)`.
///
/// An empty series becomes a constant 0.5 and a single sample is replicated.
pub fn resample(series: &[f64], count: usize) -> Vec<f64> {
    match (series.len(), count) {
        (_, 0) => Vec::new(),
        (0, _) => vec![0.5; count],
        (1, _) => vec![series[0]; count],
        (_, 1) => vec![series[0]],
        (len, _) => {
            let span = (len - 1) as f64;
            let denom = (count - 1) as f64;
            (0..count)
                .map(|i| sample_at(series, i as f64 * span / denom))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[1.0, 3.0, 2.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_min_max_flat_series() {
        assert_eq!(min_max(&[5.0, 5.0, 5.0]), vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_min_max_bounds() {
        let out = min_max(&[2.0, 4.0, 3.0, 6.0]);
        assert_eq!(out, vec![0.0, 0.5, 0.25, 1.0]);
    }

    #[test]
    fn test_moving_average_truncated_edges() {
        let out = moving_average(&[0.0, 0.0, 10.0, 0.0, 0.0], 5);
        // Index 0 averages [0, 0, 10]; index 2 averages all five.
        assert!((out[0] - 10.0 / 3.0).abs() < 1e-12);
        assert!((out[1] - 2.5).abs() < 1e-12);
        assert!((out[2] - 2.0).abs() < 1e-12);
        assert!((out[4] - 10.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_resample_length_and_endpoints() {
        let series: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
        let out = resample(&series, SERIES_LEN);
        assert_eq!(out.len(), SERIES_LEN);
        assert_eq!(out[0], 0.0);
        assert!((out[SERIES_LEN - 1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_resample_is_idempotent_at_same_length() {
        let series: Vec<f64> = (0..37).map(|i| ((i * 7) % 11) as f64).collect();
        let once = resample(&min_max(&series), SERIES_LEN);
        let twice = resample(&once, SERIES_LEN);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_resample_short_series() {
        assert_eq!(resample(&[], 4), vec![0.5; 4]);
        assert_eq!(resample(&[0.3], 4), vec![0.3; 4]);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(119.996, 2), 120.0);
        assert_eq!(round_to(0.12346, 4), 0.1235);
    }
}
