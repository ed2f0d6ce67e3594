//! Autocorrelation of the mean-removed envelope over beat-period lags.

use super::{OnsetEvent, TempoError, TempoEstimator, MAX_BEAT_INTERVAL, MIN_BEAT_INTERVAL};

#[derive(Clone, Debug, Default)]
pub struct AutocorrEstimator;

impl TempoEstimator for AutocorrEstimator {
    fn name(&self) -> &'static str {
        "autocorr"
    }

    fn estimate(&self, events: &[OnsetEvent], hop_duration: f64) -> Result<f64, TempoError> {
        let n = events.len();
        let mean = events.iter().map(|e| e.weight).sum::<f64>() / n.max(1) as f64;
        let x: Vec<f64> = events.iter().map(|e| e.weight - mean).collect();

        let energy: f64 = x.iter().map(|v| v * v).sum();
        if energy < 1e-12 {
            return Err(TempoError::NoPeriodicity);
        }

        let min_lag = ((MIN_BEAT_INTERVAL / hop_duration).floor() as usize).max(1);
        // At least two periods of the longest lag must fit in the envelope.
        let max_lag = ((MAX_BEAT_INTERVAL / hop_duration).ceil() as usize).min(n / 2);
        if min_lag >= max_lag {
            return Err(TempoError::TooFewEvents {
                found: n,
                needed: 2 * (min_lag + 1),
            });
        }

        // Biased: every lag is normalized by the zero-lag energy.
        let r = |lag: usize| -> f64 {
            x.iter().zip(&x[lag..]).map(|(a, b)| a * b).sum::<f64>() / energy
        };

        let (best_lag, best_r) = (min_lag..=max_lag)
            .map(|lag| (lag, r(lag)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or(TempoError::NoPeriodicity)?;
        if best_r <= 0.0 {
            return Err(TempoError::NoPeriodicity);
        }

        let mut lag = best_lag as f64;
        if best_lag > 1 && best_lag + 1 < n {
            let (prev, next) = (r(best_lag - 1), r(best_lag + 1));
            let denom = prev - 2.0 * best_r + next;
            if denom.abs() > 1e-12 {
                lag += (0.5 * (prev - next) / denom).clamp(-0.5, 0.5);
            }
        }

        log::debug!("autocorr: best lag {:.2} frames (r = {:.3})", lag, best_r);
        Ok(60.0 / (lag * hop_duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOP: f64 = 1024.0 / 22050.0;

    fn pulse_events(period: f64, seconds: f64) -> Vec<OnsetEvent> {
        let n = (seconds / HOP) as usize;
        let mut weights = vec![0.0; n];
        let mut t = 0.0;
        while t < seconds {
            let idx = (t / HOP).round() as usize;
            if idx < n {
                weights[idx] = 1.0;
            }
            t += period;
        }
        weights
            .into_iter()
            .enumerate()
            .map(|(i, weight)| OnsetEvent {
                time: i as f64 * HOP,
                weight,
            })
            .collect()
    }

    #[test]
    fn test_recovers_120_bpm() {
        let bpm = AutocorrEstimator.estimate(&pulse_events(0.5, 20.0), HOP).unwrap();
        assert!((bpm - 120.0).abs() < 5.0, "bpm = {}", bpm);
    }

    #[test]
    fn test_flat_envelope_has_no_periodicity() {
        let events: Vec<OnsetEvent> = (0..200)
            .map(|i| OnsetEvent {
                time: i as f64 * HOP,
                weight: 0.5,
            })
            .collect();
        assert_eq!(
            AutocorrEstimator.estimate(&events, HOP),
            Err(TempoError::NoPeriodicity)
        );
    }

    #[test]
    fn test_short_envelope_is_rejected() {
        let events = pulse_events(0.5, 0.5);
        assert!(matches!(
            AutocorrEstimator.estimate(&events, HOP),
            Err(TempoError::TooFewEvents { .. })
        ));
    }
}
