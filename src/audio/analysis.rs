use super::extract::extract_features;
use super::features::AnalysisResult;
use crate::config::AnalysisConfig;
use crate::error::{SpiroError, SpiroResult};
use crate::series::{self, SERIES_LEN};
use crate::tempo;

/// Run the full analysis over a mono buffer: features, tempo, then aggregate statistics.
///
/// Only structurally invalid input is an error. Short or silent clips produce a
/// result with fallback values.
pub fn analyze(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> SpiroResult<AnalysisResult> {
    if samples.is_empty() {
        return Err(SpiroError::EmptyInput);
    }
    if sample_rate == 0 {
        return Err(SpiroError::InvalidSampleRate { rate: sample_rate });
    }

    let duration = samples.len() as f64 / sample_rate as f64;

    log::info!(
        "Pass 1: Frame features (frame={}, hop={})...",
        config.frame_size,
        config.hop_size
    );
    let features = extract_features(samples, sample_rate, config.frame_size, config.hop_size)?;

    log::info!("Pass 2: Onset envelope & tempo ({:?})...", config.tempo_method);
    let hop_duration = config.hop_size as f64 / sample_rate as f64;
    let envelope = tempo::normalized_envelope(&features.rms);
    let estimator = config.tempo_method.estimator();
    let estimate = tempo::estimate_from_envelope(&envelope, hop_duration, estimator.as_ref());

    log::info!("Pass 3: Aggregation...");
    let rms_mean = series::mean(&features.rms);
    let centroid_mean = series::mean(&features.centroid);
    let centroid_median = series::median(&features.centroid);
    let centroid_series = series::resample(&series::min_max(&features.centroid), SERIES_LEN);

    log::info!(
        "Analysis: frames={}, duration={:.2}s, tempo={:.2} BPM{}, rms_mean={:.4}, centroid_mean={:.1}Hz",
        features.len(),
        duration,
        estimate.bpm,
        if estimate.fallback { " (fallback)" } else { "" },
        rms_mean,
        centroid_mean
    );

    Ok(AnalysisResult {
        bpm: estimate.bpm,
        rms_mean: series::round_to(rms_mean, 4),
        centroid_mean: series::round_to(centroid_mean, 2),
        centroid_median: series::round_to(centroid_median, 2),
        centroid_series,
        frames: features.len(),
        rms_series: features.rms,
        centroid_series_raw: features.centroid,
        envelope,
        duration: series::round_to(duration, 2),
        sample_rate,
        tempo_fallback: estimate.fallback,
    })
}
