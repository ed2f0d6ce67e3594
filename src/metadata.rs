//! Export record pairing the analysis with the rendered geometry.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::audio::features::AnalysisResult;
use crate::error::SpiroResult;
use crate::render::spiro::{Mapped, RenderSummary, RotorDetails};
use crate::series::round_to;

const DESCRIPTION: &str = "Music-driven spirograph generated from audio features.";
const DEFAULT_IMAGE: &str = "spiro.png";

#[derive(Clone, Debug, Default)]
pub struct MetadataOptions {
    pub name: Option<String>,
    pub image_uri: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub bpm_auto: f64,
    pub bpm_used: f64,
    pub rms_mean: f64,
    pub centroid_mean: f64,
    pub centroid_median: f64,
    pub centroid_series_256: Vec<f64>,
    pub rms_series: Vec<f64>,
    pub centroid_series_raw: Vec<f64>,
    pub envelope: Vec<f64>,
    pub duration: f64,
    #[serde(rename = "sampleRate")]
    pub sample_rate: u32,
    pub frames: usize,
    pub tempo_fallback: bool,
    pub mapped: Mapped,
    pub rotor_details: RotorDetails,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<Attribute>,
    pub features: Features,
}

impl Metadata {
    pub fn to_json(&self) -> SpiroResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> SpiroResult<()> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Wrote metadata: {}", path.display());
        Ok(())
    }
}

fn attribute(trait_type: &str, value: f64) -> Attribute {
    Attribute {
        trait_type: trait_type.to_string(),
        value,
    }
}

/// Assemble the export record for a clip rendered at `tempo_used`.
pub fn build_metadata(
    analysis: &AnalysisResult,
    summary: &RenderSummary,
    tempo_used: f64,
    options: &MetadataOptions,
) -> Metadata {
    let name = options
        .name
        .clone()
        .unwrap_or_else(|| format!("SpiroMint #{:04}", analysis.frames.max(1)));
    let image = options
        .image_uri
        .clone()
        .unwrap_or_else(|| DEFAULT_IMAGE.to_string());

    Metadata {
        name,
        description: DESCRIPTION.to_string(),
        image,
        attributes: vec![
            attribute("bpm", round_to(tempo_used, 2)),
            attribute("avg_rms", analysis.rms_mean),
            attribute("centroid_med", analysis.centroid_median),
        ],
        features: Features {
            bpm_auto: analysis.bpm,
            bpm_used: tempo_used,
            rms_mean: analysis.rms_mean,
            centroid_mean: analysis.centroid_mean,
            centroid_median: analysis.centroid_median,
            centroid_series_256: analysis.centroid_series.clone(),
            rms_series: analysis.rms_series.clone(),
            centroid_series_raw: analysis.centroid_series_raw.clone(),
            envelope: analysis.envelope.clone(),
            duration: analysis.duration,
            sample_rate: analysis.sample_rate,
            frames: analysis.frames,
            tempo_fallback: analysis.tempo_fallback,
            mapped: summary.mapped.clone(),
            rotor_details: summary.rotor_details.clone(),
        },
    }
}
