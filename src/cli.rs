use clap::Parser;
use std::path::PathBuf;

use spiromint::tempo::TempoMethod;

#[derive(Parser, Debug)]
#[command(name = "spiromint", about = "Paint a multi-rotor spirograph from an audio file")]
pub struct Cli {
    /// Input audio files (WAV, MP3, FLAC, OGG, AAC)
    pub inputs: Vec<PathBuf>,

    /// Directory for the PNG and metadata files
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Number of rotors (2 or 3)
    #[arg(short, long, default_value_t = 2)]
    pub rotors: usize,

    /// Draw at this tempo instead of the detected one
    #[arg(short, long)]
    pub tempo: Option<f64>,

    /// Canvas width and height in pixels
    #[arg(long, default_value_t = 540)]
    pub size: u32,

    /// Analysis frame size in samples
    #[arg(long, default_value_t = 2048)]
    pub frame_size: usize,

    /// Analysis hop size in samples
    #[arg(long, default_value_t = 1024)]
    pub hop_size: usize,

    /// Tempo estimation strategy
    #[arg(long, value_enum, default_value_t = TempoMethod::Ioi)]
    pub tempo_method: TempoMethod,

    /// Token name in the metadata (default: "SpiroMint #<frames>")
    #[arg(long)]
    pub name: Option<String>,

    /// Image URI recorded in the metadata (default: the PNG file name)
    #[arg(long)]
    pub image_uri: Option<String>,

    /// Only write the metadata, skip the PNG
    #[arg(long)]
    pub no_png: bool,

    /// Config file (default: ./spiromint.toml or ~/.config/spiromint/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
