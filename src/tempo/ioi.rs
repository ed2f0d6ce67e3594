//! Inter-onset-interval clustering.
//!
//! Peaks are picked from the weighted envelope, every pair of peaks closer than
//! `max_ioi` contributes its interval to a cluster, and clusters are scored by their
//! own weight plus the weight of harmonically related clusters. The best cluster's mean
//! interval, folded into the 60-200 BPM range, is the beat period.

use super::{fold_interval, OnsetEvent, TempoError, TempoEstimator};

#[derive(Clone, Debug)]
pub struct IoiClusterEstimator {
    /// Half-width of the local-maximum test, in seconds
    pub peak_window: f64,
    /// The local mean looks back this many peak windows
    pub mean_window_multiplier: usize,
    /// Amount a peak must exceed the local mean by
    pub peak_threshold: f64,
    /// Shortest interval considered, in seconds
    pub min_ioi: f64,
    /// Longest interval considered, in seconds
    pub max_ioi: f64,
    /// Intervals closer than this share a cluster, in seconds
    pub cluster_width: f64,
}

impl Default for IoiClusterEstimator {
    fn default() -> Self {
        Self {
            peak_window: 0.1,
            mean_window_multiplier: 3,
            peak_threshold: 0.25,
            min_ioi: 0.07,
            max_ioi: 2.5,
            cluster_width: 0.025,
        }
    }
}

#[derive(Clone, Debug)]
struct Cluster {
    interval_sum: f64,
    count: usize,
    weight: f64,
}

impl Cluster {
    fn new(interval: f64, weight: f64) -> Self {
        Self {
            interval_sum: interval,
            count: 1,
            weight,
        }
    }

    fn mean(&self) -> f64 {
        self.interval_sum / self.count as f64
    }

    fn absorb(&mut self, other: &Cluster) {
        self.interval_sum += other.interval_sum;
        self.count += other.count;
        self.weight += other.weight;
    }
}

impl IoiClusterEstimator {
    /// Local maxima that stand out from the preceding envelope.
    pub fn pick_peaks(&self, events: &[OnsetEvent], hop_duration: f64) -> Vec<OnsetEvent> {
        let n = events.len();
        let w = ((self.peak_window / hop_duration).round() as usize).max(1);
        let back = w * self.mean_window_multiplier.max(1);
        let mut peaks = Vec::new();

        for i in 0..n {
            let value = events[i].weight;
            if value <= 0.0 {
                continue;
            }

            let lo = i.saturating_sub(w);
            let hi = (i + w).min(n - 1);
            // First sample of a plateau wins.
            let is_max = (lo..=hi).all(|j| {
                let other = events[j].weight;
                if j < i {
                    other < value
                } else {
                    other <= value
                }
            });
            if !is_max {
                continue;
            }

            let mean_lo = i.saturating_sub(back);
            let window = &events[mean_lo..=hi];
            let local_mean = window.iter().map(|e| e.weight).sum::<f64>() / window.len() as f64;
            if value >= local_mean + self.peak_threshold {
                peaks.push(events[i]);
            }
        }

        peaks
    }

    fn build_clusters(&self, peaks: &[OnsetEvent], width: f64) -> Vec<Cluster> {
        let mut clusters: Vec<Cluster> = Vec::new();

        for (i, a) in peaks.iter().enumerate() {
            for b in &peaks[i + 1..] {
                let ioi = b.time - a.time;
                if ioi > self.max_ioi {
                    break;
                }
                if ioi < self.min_ioi {
                    continue;
                }
                let weight = (a.weight * b.weight).sqrt();

                let nearest = clusters
                    .iter()
                    .enumerate()
                    .map(|(k, c)| (k, (c.mean() - ioi).abs()))
                    .filter(|&(_, d)| d < width)
                    .min_by(|x, y| x.1.total_cmp(&y.1))
                    .map(|(k, _)| k);
                match nearest {
                    Some(k) => clusters[k].absorb(&Cluster::new(ioi, weight)),
                    None => clusters.push(Cluster::new(ioi, weight)),
                }
            }
        }

        clusters.sort_by(|a, b| a.mean().total_cmp(&b.mean()));
        let mut merged: Vec<Cluster> = Vec::with_capacity(clusters.len());
        for cluster in clusters {
            if let Some(last) = merged.last_mut() {
                if (cluster.mean() - last.mean()).abs() < width {
                    last.absorb(&cluster);
                    continue;
                }
            }
            merged.push(cluster);
        }
        merged
    }
}

/// Credit given to a cluster whose interval is `n` times another's.
fn relationship_factor(n: usize) -> f64 {
    match n {
        1..=4 => (6 - n) as f64,
        5..=8 => 1.0,
        _ => 0.0,
    }
}

fn score_clusters(clusters: &[Cluster], width: f64) -> Vec<f64> {
    clusters
        .iter()
        .enumerate()
        .map(|(i, ci)| {
            let mut score = relationship_factor(1) * ci.weight;
            for (j, cj) in clusters.iter().enumerate() {
                if i == j {
                    continue;
                }
                let (small, large) = if ci.mean() < cj.mean() {
                    (ci.mean(), cj.mean())
                } else {
                    (cj.mean(), ci.mean())
                };
                let n = (large / small).round() as usize;
                if n >= 2 && (large - n as f64 * small).abs() < width * n as f64 {
                    score += relationship_factor(n) * cj.weight;
                }
            }
            score
        })
        .collect()
}

impl TempoEstimator for IoiClusterEstimator {
    fn name(&self) -> &'static str {
        "ioi"
    }

    fn estimate(&self, events: &[OnsetEvent], hop_duration: f64) -> Result<f64, TempoError> {
        let peaks = self.pick_peaks(events, hop_duration);
        match peaks.len() {
            0 => return Err(TempoError::NoOnsets),
            1 => return Err(TempoError::TooFewEvents { found: 1, needed: 2 }),
            _ => {}
        }

        // Peaks sit on the frame grid, so intervals jitter by up to one hop.
        let width = self.cluster_width.max(1.5 * hop_duration);
        let clusters = self.build_clusters(&peaks, width);
        let scores = score_clusters(&clusters, width);

        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .ok_or(TempoError::NoPeriodicity)?;

        let interval = fold_interval(clusters[best].mean());
        log::debug!(
            "ioi: {} peaks, {} clusters, best interval {:.4}s",
            peaks.len(),
            clusters.len(),
            interval
        );
        Ok(60.0 / interval)
    }
}
