//! Tempo estimation from the loudness series.
//!
//! The loudness series is turned into a smoothed, normalized onset envelope which a
//! [`TempoEstimator`] strategy converts into BPM. Estimation is best effort: every
//! failure path ends in [`DEFAULT_BPM`] with the fallback flag set.

pub mod autocorr;
pub mod envelope;
pub mod ioi;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::features::TempoEstimate;
use crate::series;

pub use autocorr::AutocorrEstimator;
pub use envelope::{normalized_envelope, onset_envelope};
pub use ioi::IoiClusterEstimator;

pub const DEFAULT_BPM: f64 = 120.0;

/// Envelopes shorter than this are not worth estimating.
const MIN_ENVELOPE_LEN: usize = 9;
/// An envelope whose values all sit at or below this is treated as silent.
const ACTIVITY_FLOOR: f64 = 1e-4;

/// Shortest and longest beat period considered by the strategies (200 and 60 BPM).
pub const MIN_BEAT_INTERVAL: f64 = 0.3;
pub const MAX_BEAT_INTERVAL: f64 = 1.0;

/// One weighted envelope sample at a point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OnsetEvent {
    /// Seconds from the start of the clip
    pub time: f64,
    /// Normalized onset strength (0.0-1.0)
    pub weight: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum TempoError {
    #[error("no onsets found in envelope")]
    NoOnsets,

    #[error("envelope has no periodic structure")]
    NoPeriodicity,

    #[error("not enough events: {found} (need {needed})")]
    TooFewEvents { found: usize, needed: usize },
}

/// A replaceable tempo heuristic over weighted onset events.
pub trait TempoEstimator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns a tempo in BPM. The caller validates the value.
    fn estimate(&self, events: &[OnsetEvent], hop_duration: f64) -> Result<f64, TempoError>;
}

/// Available strategies, selectable from config and the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TempoMethod {
    /// Inter-onset-interval clustering
    #[default]
    Ioi,
    /// Envelope autocorrelation
    Autocorr,
}

impl TempoMethod {
    pub fn estimator(self) -> Box<dyn TempoEstimator> {
        match self {
            TempoMethod::Ioi => Box::new(IoiClusterEstimator::default()),
            TempoMethod::Autocorr => Box::new(AutocorrEstimator::default()),
        }
    }
}

/// Estimate tempo from an RMS series sampled every `hop_duration` seconds.
pub fn estimate_tempo(
    rms: &[f64],
    hop_duration: f64,
    estimator: &dyn TempoEstimator,
) -> TempoEstimate {
    let envelope = normalized_envelope(rms);
    estimate_from_envelope(&envelope, hop_duration, estimator)
}

/// Estimate tempo from an already normalized envelope.
pub fn estimate_from_envelope(
    envelope: &[f64],
    hop_duration: f64,
    estimator: &dyn TempoEstimator,
) -> TempoEstimate {
    if envelope.len() < MIN_ENVELOPE_LEN {
        return fallback(&format!("envelope too short ({} samples)", envelope.len()));
    }
    if envelope.iter().all(|&v| v <= ACTIVITY_FLOOR) {
        return fallback("empty envelope");
    }
    if !(hop_duration > 0.0 && hop_duration.is_finite()) {
        return fallback(&format!("invalid hop duration {}", hop_duration));
    }

    let events: Vec<OnsetEvent> = envelope
        .iter()
        .enumerate()
        .map(|(i, &weight)| OnsetEvent {
            time: i as f64 * hop_duration,
            weight,
        })
        .collect();

    match estimator.estimate(&events, hop_duration) {
        Ok(bpm) if bpm.is_finite() && bpm > 0.0 => {
            log::debug!("{} estimator: {:.2} BPM", estimator.name(), bpm);
            TempoEstimate {
                bpm: series::round_to(bpm, 2),
                fallback: false,
            }
        }
        Ok(bpm) => fallback(&format!("{} returned invalid tempo {}", estimator.name(), bpm)),
        Err(e) => fallback(&format!("{}: {}", estimator.name(), e)),
    }
}

fn fallback(reason: &str) -> TempoEstimate {
    log::warn!("Tempo estimation failed; fallback to {} BPM ({})", DEFAULT_BPM, reason);
    TempoEstimate {
        bpm: DEFAULT_BPM,
        fallback: true,
    }
}

/// Fold a beat period into the [`MIN_BEAT_INTERVAL`], [`MAX_BEAT_INTERVAL`] range by
/// doubling or halving.
pub(crate) fn fold_interval(mut interval: f64) -> f64 {
    if !(interval > 0.0 && interval.is_finite()) {
        return interval;
    }
    while interval < MIN_BEAT_INTERVAL {
        interval *= 2.0;
    }
    while interval > MAX_BEAT_INTERVAL {
        interval /= 2.0;
    }
    interval
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<f64, TempoError>);

    impl TempoEstimator for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn estimate(&self, _events: &[OnsetEvent], _hop: f64) -> Result<f64, TempoError> {
            match &self.0 {
                Ok(v) => Ok(*v),
                Err(_) => Err(TempoError::NoOnsets),
            }
        }
    }

    fn active_envelope(len: usize) -> Vec<f64> {
        (0..len).map(|i| if i % 4 == 0 { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_short_envelope_falls_back() {
        let est = Fixed(Ok(98.0));
        let t = estimate_from_envelope(&[0.0, 1.0, 0.5, 0.2, 0.9, 0.1, 0.0, 1.0], 0.05, &est);
        assert_eq!(t, TempoEstimate { bpm: 120.0, fallback: true });
    }

    #[test]
    fn test_quiet_envelope_falls_back() {
        let est = Fixed(Ok(98.0));
        let t = estimate_from_envelope(&[0.0; 32], 0.05, &est);
        assert_eq!(t, TempoEstimate { bpm: 120.0, fallback: true });
    }

    #[test]
    fn test_estimator_error_falls_back() {
        let est = Fixed(Err(TempoError::NoOnsets));
        let t = estimate_from_envelope(&active_envelope(32), 0.05, &est);
        assert_eq!(t, TempoEstimate { bpm: 120.0, fallback: true });
    }

    #[test]
    fn test_invalid_tempo_falls_back() {
        for bad in [f64::NAN, f64::INFINITY, 0.0, -10.0] {
            let est = Fixed(Ok(bad));
            let t = estimate_from_envelope(&active_envelope(32), 0.05, &est);
            assert!(t.fallback);
            assert_eq!(t.bpm, 120.0);
        }
    }

    #[test]
    fn test_valid_tempo_is_rounded() {
        let est = Fixed(Ok(97.45678));
        let t = estimate_from_envelope(&active_envelope(32), 0.05, &est);
        assert_eq!(t, TempoEstimate { bpm: 97.46, fallback: false });
    }

    #[test]
    fn test_flat_loudness_falls_back_with_every_method() {
        for method in [TempoMethod::Ioi, TempoMethod::Autocorr] {
            let t = estimate_tempo(&[0.0; 64], 1024.0 / 22050.0, method.estimator().as_ref());
            assert_eq!(t, TempoEstimate { bpm: 120.0, fallback: true });
        }
    }

    #[test]
    fn test_fold_interval() {
        assert!((fold_interval(0.25) - 0.5).abs() < 1e-12);
        assert!((fold_interval(1.6) - 0.8).abs() < 1e-12);
        assert!((fold_interval(0.5) - 0.5).abs() < 1e-12);
    }
}
