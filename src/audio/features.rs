use serde::{Deserialize, Serialize};

/// Per-frame feature series, indexed by frame number.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureSeries {
    /// RMS amplitude of each frame (linear)
    pub rms: Vec<f64>,
    /// Spectral centroid of each frame (Hz)
    pub centroid: Vec<f64>,
}

impl FeatureSeries {
    pub fn len(&self) -> usize {
        self.rms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rms.is_empty()
    }
}

/// Detected tempo. `fallback` is set whenever `bpm` is the 120 BPM default
/// rather than an estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoEstimate {
    pub bpm: f64,
    pub fallback: bool,
}

/// Everything the renderer and the metadata export need from one analyzed clip.
///
/// Field names follow the export format consumed downstream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Tempo in BPM, 2 decimals
    pub bpm: f64,
    /// Mean frame RMS, 4 decimals
    pub rms_mean: f64,
    /// Mean spectral centroid in Hz, 2 decimals
    pub centroid_mean: f64,
    /// Median spectral centroid in Hz, 2 decimals
    pub centroid_median: f64,
    /// Min–max normalized centroid series resampled to 256 points
    pub centroid_series: Vec<f64>,
    pub rms_series: Vec<f64>,
    pub centroid_series_raw: Vec<f64>,
    /// Smoothed, normalized onset envelope
    pub envelope: Vec<f64>,
    pub frames: usize,
    /// Seconds, 2 decimals
    pub duration: f64,
    pub sample_rate: u32,
    pub tempo_fallback: bool,
}
