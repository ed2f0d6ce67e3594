use crate::series;

/// Smoothing window for the onset envelope, in frames.
pub const SMOOTHING_WINDOW: usize = 5;

/// Positive frame-to-frame loudness increase. One shorter than `rms`.
pub fn onset_envelope(rms: &[f64]) -> Vec<f64> {
    rms.windows(2).map(|w| (w[1] - w[0]).max(0.0)).collect()
}

/// Onset envelope smoothed with a centered moving average, then scaled to [0, 1].
pub fn normalized_envelope(rms: &[f64]) -> Vec<f64> {
    let onset = onset_envelope(rms);
    let smoothed = series::moving_average(&onset, SMOOTHING_WINDOW);
    series::min_max(&smoothed)
}
