//! Multi-rotor spirograph.
//!
//! The clip's tempo sets the size of the fixed ring, brightness perturbs the rotor
//! radii, loudness sets the pen offset, and the 256-point brightness series colors the
//! trace segment by segment.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::color::{stroke_style, StrokeStyle};
use super::stroke::{Point, StrokeSink, Viewport};
use crate::audio::features::AnalysisResult;
use crate::config::RenderConfig;
use crate::error::{SpiroError, SpiroResult};
use crate::series::{self, clamp01, SERIES_LEN};

const TEMPO_RANGE: f64 = 200.0;
const RMS_RANGE: f64 = 0.6;
const CENTROID_MIN: f64 = 500.0;
const CENTROID_MAX: f64 = 6000.0;

const SCALES_2: [f64; 2] = [0.4, 0.22];
const SCALES_3: [f64; 3] = [0.48, 0.28, 0.14];
const MODES: [RotorMode; 3] = [RotorMode::Inside, RotorMode::Inside, RotorMode::Outside];
const MIN_SCALE: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotorMode {
    /// Rolls inside its parent (hypocycloid)
    Inside,
    /// Rolls outside its parent (epicycloid)
    Outside,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotor {
    pub radius: f64,
    pub mode: RotorMode,
}

impl Rotor {
    /// Distance from the parent's center to this rotor's center.
    fn center_offset(&self, parent_radius: f64) -> f64 {
        match self.mode {
            RotorMode::Outside => parent_radius + self.radius,
            RotorMode::Inside => parent_radius - self.radius,
        }
    }

    /// Angular ratio for the next tier; sets the cusp frequency.
    fn angle_ratio(&self, parent_radius: f64) -> f64 {
        let r = if self.radius != 0.0 { self.radius } else { 1e-9 };
        self.center_offset(parent_radius) / r
    }
}

/// Inputs to one render call.
#[derive(Clone, Debug)]
pub struct RenderParams<'a> {
    pub tempo: f64,
    pub rms_mean: f64,
    pub centroid_mean: f64,
    /// Normalized brightness series, usually 256 points
    pub series: &'a [f64],
    pub layout: &'a RenderConfig,
}

impl<'a> RenderParams<'a> {
    /// Parameters for `analysis` drawn at `tempo` (the detected or a manual tempo).
    pub fn from_analysis(analysis: &'a AnalysisResult, tempo: f64, layout: &'a RenderConfig) -> Self {
        Self {
            tempo,
            rms_mean: analysis.rms_mean,
            centroid_mean: analysis.centroid_mean,
            series: &analysis.centroid_series,
            layout,
        }
    }
}

/// Clip statistics mapped to [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedStats {
    pub tempo: f64,
    pub loudness: f64,
    pub brightness: f64,
}

impl NormalizedStats {
    pub fn new(tempo: f64, rms_mean: f64, centroid_mean: f64) -> Self {
        Self {
            tempo: unit(tempo / TEMPO_RANGE),
            loudness: unit(rms_mean / RMS_RANGE),
            brightness: unit((centroid_mean - CENTROID_MIN) / (CENTROID_MAX - CENTROID_MIN)),
        }
    }
}

/// `clamp01` that also maps NaN to 0.
fn unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        clamp01(x)
    }
}

/// Build the rotor chain under a ring of `base_radius`. Only 2 and 3 rotors are defined.
pub fn rotor_chain(base_radius: f64, count: usize, brightness: f64) -> SpiroResult<Vec<Rotor>> {
    let scales: &[f64] = match count {
        2 => &SCALES_2,
        3 => &SCALES_3,
        count => return Err(SpiroError::UnsupportedRotorCount { count }),
    };
    let tweak = 1.0 + 0.15 * (brightness - 0.5);

    let mut parent = base_radius;
    Ok(scales
        .iter()
        .zip(MODES)
        .map(|(&scale, mode)| {
            let radius = parent * (scale * tweak).max(MIN_SCALE);
            parent = radius;
            Rotor { radius, mode }
        })
        .collect())
}

/// Pen position at angle `theta`: a fold over the rotor chain from the fixed ring inward.
pub fn pen_point(theta: f64, base_radius: f64, rotors: &[Rotor], pen_radius: f64) -> Point {
    let (center, _, angle) = rotors.iter().fold(
        (Point::default(), base_radius, theta),
        |(center, parent_radius, angle), rotor| {
            let d = rotor.center_offset(parent_radius);
            let next = Point::new(center.x + d * angle.cos(), center.y + d * angle.sin());
            (next, rotor.radius, rotor.angle_ratio(parent_radius) * theta)
        },
    );
    Point::new(
        center.x + pen_radius * angle.cos(),
        center.y + pen_radius * angle.sin(),
    )
}

/// `mapped` block of the export record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mapped {
    #[serde(rename = "R")]
    pub base_radius: f64,
    #[serde(rename = "r")]
    pub rotor_radius: f64,
    #[serde(rename = "p")]
    pub pen_radius: f64,
    pub rotors: usize,
}

/// `rotor_details` block of the export record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotorDetails {
    pub num_rotors: usize,
    pub rotor_modes: Vec<RotorMode>,
    pub rotor_radii: Vec<f64>,
}

/// Resolved geometry, rounded to 3 decimals for storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderSummary {
    pub mapped: Mapped,
    pub rotor_details: RotorDetails,
}

#[derive(Clone, Debug)]
pub struct RenderOutput {
    pub base_radius: f64,
    pub rotors: Vec<Rotor>,
    pub pen_radius: f64,
    pub stats: NormalizedStats,
    /// Pen positions in model units, `steps + 1` points
    pub path: Vec<Point>,
    /// Style of segment `i` (from `path[i]` to `path[i + 1]`)
    pub styles: Vec<StrokeStyle>,
}

impl RenderOutput {
    pub fn summary(&self) -> RenderSummary {
        let round = |x: f64| series::round_to(x, 3);
        RenderSummary {
            mapped: Mapped {
                base_radius: round(self.base_radius),
                rotor_radius: round(self.rotors[0].radius),
                pen_radius: round(self.pen_radius),
                rotors: self.rotors.len(),
            },
            rotor_details: RotorDetails {
                num_rotors: self.rotors.len(),
                rotor_modes: self.rotors.iter().map(|r| r.mode).collect(),
                rotor_radii: self.rotors.iter().map(|r| round(r.radius)).collect(),
            },
        }
    }

    pub fn segment_count(&self) -> usize {
        self.styles.len()
    }

    /// Stroke every segment onto `sink`, fitted to its surface.
    pub fn draw<S: StrokeSink + ?Sized>(&self, sink: &mut S) {
        let (width, height) = sink.size();
        let viewport = Viewport::fit(width, height, self.base_radius);
        for (pair, style) in self.path.windows(2).zip(&self.styles) {
            sink.stroke(
                viewport.project(pair[0]),
                viewport.project(pair[1]),
                style.color,
                style.width,
            );
        }
    }
}

fn validate(params: &RenderParams) -> SpiroResult<()> {
    let layout = params.layout;
    if !params.tempo.is_finite() || params.tempo <= 0.0 {
        return Err(SpiroError::config("tempo", format!("must be positive, got {}", params.tempo)));
    }
    if !(layout.step > 0.0 && layout.step.is_finite()) {
        return Err(SpiroError::config("step", format!("must be positive, got {}", layout.step)));
    }
    if !(layout.theta_factor > 0.0 && layout.theta_factor.is_finite()) {
        return Err(SpiroError::config(
            "theta_factor",
            format!("must be positive, got {}", layout.theta_factor),
        ));
    }
    if !layout.pen_ratio_base.is_finite() {
        return Err(SpiroError::config(
            "pen_ratio_base",
            format!("must be finite, got {}", layout.pen_ratio_base),
        ));
    }
    if !(layout.base_radius > 0.0 && layout.base_radius.is_finite()) {
        return Err(SpiroError::config(
            "base_radius",
            format!("must be positive, got {}", layout.base_radius),
        ));
    }
    Ok(())
}

/// Brightness series used when the clip produced none.
fn default_series() -> Vec<f64> {
    (0..SERIES_LEN)
        .map(|i| 0.5 + 0.5 * (2.0 * std::f64::consts::PI * i as f64 / (SERIES_LEN - 1) as f64).sin())
        .collect()
}

/// Resolve geometry and trace the pen path with per-segment styles.
pub fn render(params: &RenderParams) -> SpiroResult<RenderOutput> {
    validate(params)?;
    let layout = params.layout;

    let stats = NormalizedStats::new(params.tempo, params.rms_mean, params.centroid_mean);
    let base_radius = layout.base_radius * (0.9 + 0.2 * stats.tempo);
    let rotors = rotor_chain(base_radius, layout.rotors, stats.brightness)?;
    let last_radius = rotors.last().map_or(base_radius, |r| r.radius);
    let pen_radius = last_radius * (layout.pen_ratio_base * (0.85 + 0.3 * stats.loudness));

    let theta_total = layout.theta_factor * std::f64::consts::PI;
    let steps = ((theta_total / layout.step).floor() as usize).max(2);

    log::debug!(
        "Spiro: R={:.3}, rotors={:?}, p={:.3}, {} steps",
        base_radius,
        rotors,
        pen_radius,
        steps
    );

    let path: Vec<Point> = (0..=steps)
        .into_par_iter()
        .map(|i| pen_point(i as f64 * layout.step, base_radius, &rotors, pen_radius))
        .collect();

    let fallback_series;
    let series: &[f64] = if params.series.is_empty() {
        fallback_series = default_series();
        &fallback_series
    } else {
        params.series
    };
    let span = (series.len() - 1) as f64;
    let denom = (steps - 1).max(1) as f64;
    let styles: Vec<StrokeStyle> = (1..=steps)
        .map(|i| {
            let bright = unit(series::sample_at(series, i as f64 * span / denom));
            stroke_style(bright, stats.loudness)
        })
        .collect();

    Ok(RenderOutput {
        base_radius,
        rotors,
        pen_radius,
        stats,
        path,
        styles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::stroke::StrokeRecorder;
    use pretty_assertions::assert_eq;

    fn params<'a>(series: &'a [f64], layout: &'a RenderConfig) -> RenderParams<'a> {
        RenderParams {
            tempo: 120.0,
            rms_mean: 0.3,
            centroid_mean: 3000.0,
            series,
            layout,
        }
    }

    #[test]
    fn test_two_rotor_reference_render() {
        let layout = RenderConfig::default();
        let series = vec![0.5; SERIES_LEN];
        let out = render(&params(&series, &layout)).unwrap();

        assert!(out.base_radius >= 380.0 * 0.9 && out.base_radius <= 380.0 * 1.1);
        assert!((out.base_radius - 380.0 * (0.9 + 0.2 * 0.6)).abs() < 1e-9);
        assert_eq!(out.rotors.len(), 2);
        let summary = out.summary();
        assert_eq!(
            summary.rotor_details.rotor_modes,
            vec![RotorMode::Inside, RotorMode::Inside]
        );
        assert_eq!(summary.mapped.rotors, 2);
        assert_eq!(summary.mapped.base_radius, 387.6);
    }

    #[test]
    fn test_rotor_radii_shrink_per_tier() {
        let rotors = rotor_chain(400.0, 3, 0.5).unwrap();
        assert!((rotors[0].radius - 192.0).abs() < 1e-9);
        assert!((rotors[1].radius - 192.0 * 0.28).abs() < 1e-9);
        assert!((rotors[2].radius - 192.0 * 0.28 * 0.14).abs() < 1e-9);
        assert_eq!(rotors[2].mode, RotorMode::Outside);
        assert!(rotors.windows(2).all(|w| w[1].radius < w[0].radius));
    }

    #[test]
    fn test_unsupported_rotor_count() {
        for count in [0, 1, 4] {
            assert!(matches!(
                rotor_chain(380.0, count, 0.5),
                Err(SpiroError::UnsupportedRotorCount { .. })
            ));
        }
        let layout = RenderConfig {
            rotors: 5,
            ..RenderConfig::default()
        };
        assert!(render(&params(&[0.5], &layout)).is_err());
    }

    #[test]
    fn test_pen_point_at_zero_lies_on_x_axis() {
        let rotors = rotor_chain(380.0, 2, 0.5).unwrap();
        let p = pen_point(0.0, 380.0, &rotors, 10.0);
        let expected = (380.0 - rotors[0].radius) + (rotors[0].radius - rotors[1].radius) + 10.0;
        assert!((p.x - expected).abs() < 1e-9);
        assert!(p.y.abs() < 1e-12);
    }

    #[test]
    fn test_single_inside_rotor() {
        let rotors = vec![Rotor {
            radius: 1.0,
            mode: RotorMode::Inside,
        }];
        let start = pen_point(0.0, 3.0, &rotors, 1.0);
        assert!((start.x - 3.0).abs() < 1e-12);

        // Center at 2·(cos 60°, sin 60°), pen turned by (3 - 1) / 1 · 60°.
        let p = pen_point(std::f64::consts::PI / 3.0, 3.0, &rotors, 1.0);
        assert!((p.x - 0.5).abs() < 1e-9);
        assert!((p.y - 1.5 * 3f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_trace_sizes() {
        let layout = RenderConfig::default();
        let series = vec![0.2; SERIES_LEN];
        let out = render(&params(&series, &layout)).unwrap();
        let steps = (60.0 * std::f64::consts::PI / 0.01).floor() as usize;
        assert_eq!(out.path.len(), steps + 1);
        assert_eq!(out.segment_count(), steps);
    }

    #[test]
    fn test_render_is_deterministic() {
        let layout = RenderConfig::default();
        let series: Vec<f64> = (0..SERIES_LEN).map(|i| i as f64 / 255.0).collect();
        let a = render(&params(&series, &layout)).unwrap();
        let b = render(&params(&series, &layout)).unwrap();
        assert_eq!(a.summary(), b.summary());
        assert_eq!(a.path, b.path);
        assert_eq!(a.styles, b.styles);
    }

    #[test]
    fn test_empty_series_uses_default_colors() {
        let layout = RenderConfig {
            theta_factor: 2.0,
            ..RenderConfig::default()
        };
        let out = render(&params(&[], &layout)).unwrap();
        assert!(out.styles.iter().all(|s| s.width >= 2.0 && s.width <= 6.0));
        let first = out.styles.first().unwrap().color;
        let mid = out.styles[out.styles.len() / 4].color;
        assert_ne!(first, mid);
    }

    #[test]
    fn test_silent_stats_keep_radii_positive() {
        let layout = RenderConfig::default();
        let p = RenderParams {
            tempo: 120.0,
            rms_mean: 0.0,
            centroid_mean: 0.0,
            series: &[0.5; SERIES_LEN],
            layout: &layout,
        };
        let out = render(&p).unwrap();
        assert!(out.rotors.iter().all(|r| r.radius > 0.0));
        assert!(out.pen_radius > 0.0);
        assert!(out.path.iter().all(|pt| pt.x.is_finite() && pt.y.is_finite()));
    }

    #[test]
    fn test_invalid_tempo_is_rejected() {
        let layout = RenderConfig::default();
        let mut p = params(&[0.5], &layout);
        p.tempo = f64::NAN;
        assert!(matches!(render(&p), Err(SpiroError::Config { .. })));
    }

    #[test]
    fn test_draw_emits_one_stroke_per_segment() {
        let layout = RenderConfig {
            theta_factor: 1.0,
            ..RenderConfig::default()
        };
        let out = render(&params(&[0.1, 0.9], &layout)).unwrap();
        let mut recorder = StrokeRecorder::new(540, 540);
        out.draw(&mut recorder);
        assert_eq!(recorder.strokes.len(), out.segment_count());
        let (from, _, _, _) = recorder.strokes[0];
        assert!(from.x > 270.0 && from.x <= 540.0);
    }
}
