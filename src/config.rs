use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audio::extract::{FRAME_SIZE, HOP_SIZE};
use crate::tempo::TempoMethod;

/// Contents of `spiromint.toml`. Every section and field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,
    #[serde(default)]
    pub tempo_method: TempoMethod,
}

/// Layout constants of the spirograph trace.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_rotors")]
    pub rotors: usize,
    /// The trace runs θ from 0 to `theta_factor * π`
    #[serde(default = "default_theta_factor")]
    pub theta_factor: f64,
    #[serde(default = "default_step")]
    pub step: f64,
    #[serde(default = "default_pen_ratio_base")]
    pub pen_ratio_base: f64,
    #[serde(default = "default_base_radius")]
    pub base_radius: f64,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub image_uri: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_size: default_frame_size(),
            hop_size: default_hop_size(),
            tempo_method: TempoMethod::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            rotors: default_rotors(),
            theta_factor: default_theta_factor(),
            step: default_step(),
            pen_ratio_base: default_pen_ratio_base(),
            base_radius: default_base_radius(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            dir: None,
            image_uri: None,
        }
    }
}

fn default_frame_size() -> usize { FRAME_SIZE }
fn default_hop_size() -> usize { HOP_SIZE }
fn default_rotors() -> usize { 2 }
fn default_theta_factor() -> f64 { 60.0 }
fn default_step() -> f64 { 0.01 }
fn default_pen_ratio_base() -> f64 { 0.85 }
fn default_base_radius() -> f64 { 380.0 }
fn default_size() -> u32 { 540 }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("Invalid config {}: {}", path.display(), e);
            None
        }
    }
}

/// `./spiromint.toml`, then `~/.config/spiromint/config.toml`, then the platform config dir.
pub fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from("spiromint.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("spiromint").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("spiromint").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
