//! Audio-driven spirograph generation.
//!
//! A decoded mono clip is reduced to loudness and brightness series, a tempo estimate
//! and a few summary statistics ([`analyze`]). Those drive a multi-rotor spirograph
//! ([`render`]) whose strokes can be drawn on any [`render::StrokeSink`], and the whole
//! result can be packaged as an export record ([`metadata::build_metadata`]).
//!
//! Every entry point is a pure function of its inputs; nothing is cached between calls.

pub mod audio;
pub mod config;
pub mod error;
pub mod metadata;
pub mod render;
pub mod series;
pub mod tempo;

pub use audio::analysis::analyze;
pub use audio::features::{AnalysisResult, FeatureSeries, TempoEstimate};
pub use config::{AnalysisConfig, RenderConfig};
pub use error::{SpiroError, SpiroResult};
pub use render::spiro::render;
