//! Error types for the analysis and render pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type SpiroResult<T> = Result<T, SpiroError>;

/// Errors that reach the caller. Numerical edge cases (flat series, short clips,
/// failed tempo estimation) are absorbed inside the stages and never show up here.
#[derive(Debug, Error)]
pub enum SpiroError {
    /// The sample buffer had no samples.
    #[error("sample buffer is empty")]
    EmptyInput,

    /// A sample rate of zero cannot produce timestamps or frequencies.
    #[error("invalid sample rate: {rate}")]
    InvalidSampleRate { rate: u32 },

    /// Rotor scale and mode tables exist only for 2 and 3 rotors.
    #[error("unsupported rotor count {count}: expected 2 or 3")]
    UnsupportedRotorCount { count: usize },

    /// Invalid configuration value.
    #[error("invalid configuration '{name}': {message}")]
    Config { name: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpiroError {
    /// Creates a configuration error.
    pub fn config(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            name: name.into(),
            message: message.into(),
        }
    }
}
