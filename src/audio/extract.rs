use std::sync::Arc;

use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::features::FeatureSeries;
use crate::error::{SpiroError, SpiroResult};

pub const FRAME_SIZE: usize = 2048;
pub const HOP_SIZE: usize = 1024;

/// Number of whole frames that fit in `len` samples. The trailing partial frame is dropped.
pub fn frame_count(len: usize, frame_size: usize, hop_size: usize) -> usize {
    if frame_size == 0 || hop_size == 0 || frame_size > len {
        return 0;
    }
    (len - frame_size) / hop_size + 1
}

/// Slice `samples` into overlapping frames and compute RMS and spectral centroid per frame.
///
/// A buffer shorter than one frame yields an empty pair. Frames are independent, so they
/// are processed in parallel; output order follows frame order.
pub fn extract_features(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
) -> SpiroResult<FeatureSeries> {
    if frame_size == 0 {
        return Err(SpiroError::config("frame_size", "must be greater than zero"));
    }
    if hop_size == 0 {
        return Err(SpiroError::config("hop_size", "must be greater than zero"));
    }

    let n = frame_count(samples.len(), frame_size, hop_size);
    if n == 0 {
        log::debug!(
            "Buffer of {} samples is shorter than one {}-sample frame",
            samples.len(),
            frame_size
        );
        return Ok(FeatureSeries::default());
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(frame_size);
    let hann = hann_window(frame_size);
    let bin_hz = sample_rate as f64 / frame_size as f64;

    let (rms, centroid): (Vec<f64>, Vec<f64>) = (0..n)
        .into_par_iter()
        .map(|frame_idx| {
            let start = frame_idx * hop_size;
            let frame = &samples[start..start + frame_size];
            (
                frame_rms(frame),
                spectral_centroid(frame, &hann, &fft, bin_hz),
            )
        })
        .unzip();

    Ok(FeatureSeries { rms, centroid })
}

fn frame_rms(frame: &[f32]) -> f64 {
    let sum_sq: f64 = frame.iter().map(|&s| s as f64 * s as f64).sum();
    (sum_sq / frame.len() as f64).sqrt()
}

/// Magnitude-weighted mean frequency over bins `0..N/2`. Silent frames report 0.
fn spectral_centroid(frame: &[f32], hann: &[f64], fft: &Arc<dyn Fft<f64>>, bin_hz: f64) -> f64 {
    let mut buffer: Vec<Complex<f64>> = frame
        .iter()
        .zip(hann)
        .map(|(&s, &w)| Complex::new(s as f64 * w, 0.0))
        .collect();
    fft.process(&mut buffer);

    let half = frame.len() / 2;
    let mut total = 0.0f64;
    let mut weighted = 0.0f64;
    for (k, c) in buffer[..half].iter().enumerate() {
        let mag = c.norm();
        total += mag;
        weighted += k as f64 * bin_hz * mag;
    }

    if total > 1e-10 && weighted.is_finite() {
        (weighted / total).max(0.0)
    } else {
        0.0
    }
}

fn hann_window(size: usize) -> Vec<f64> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos()))
        .collect()
}
