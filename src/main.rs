mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use cli::Cli;
use spiromint::audio::decode::decode_audio;
use spiromint::config::{self, AnalysisConfig, RenderConfig};
use spiromint::metadata::{build_metadata, MetadataOptions};
use spiromint::render::{self, Canvas, RenderParams};
use spiromint::tempo::TempoMethod;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    let mut render_config = RenderConfig::default();
    let config_path = cli.config.clone().or_else(config::discover_config);
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Config values apply only where the CLI is still at its default
            if cli.rotors == 2 { cli.rotors = cfg.render.rotors; }
            if cli.size == 540 { cli.size = cfg.output.size; }
            if cli.frame_size == 2048 { cli.frame_size = cfg.analysis.frame_size; }
            if cli.hop_size == 1024 { cli.hop_size = cfg.analysis.hop_size; }
            if cli.tempo_method == TempoMethod::Ioi { cli.tempo_method = cfg.analysis.tempo_method; }
            if cli.out_dir == Path::new(".") {
                if let Some(dir) = cfg.output.dir {
                    cli.out_dir = dir;
                }
            }
            if cli.image_uri.is_none() {
                cli.image_uri = cfg.output.image_uri;
            }
            render_config = cfg.render;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }
    render_config.rotors = cli.rotors;

    if cli.inputs.is_empty() {
        anyhow::bail!("At least one input audio file is required");
    }
    if let Some(tempo) = cli.tempo {
        if !(tempo.is_finite() && tempo > 0.0) {
            anyhow::bail!("--tempo must be a positive number of BPM, got {}", tempo);
        }
    }

    let analysis_config = AnalysisConfig {
        frame_size: cli.frame_size,
        hop_size: cli.hop_size,
        tempo_method: cli.tempo_method,
    };

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("Failed to create output directory: {}", cli.out_dir.display()))?;

    log::info!("spiromint - audio-driven spirograph");
    log::info!("Inputs: {}", cli.inputs.len());
    log::info!("Output: {}", cli.out_dir.display());
    log::info!(
        "Rotors: {}, canvas {}x{}, tempo: {}",
        render_config.rotors,
        cli.size,
        cli.size,
        cli.tempo.map_or("auto".to_string(), |t| format!("{:.2} BPM", t))
    );

    let pb = ProgressBar::new(cli.inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let mut failures = 0usize;
    for input in &cli.inputs {
        pb.set_message(input.display().to_string());
        if let Err(e) = process_file(input, &cli, &analysis_config, &render_config) {
            log::error!("{}: {:#}", input.display(), e);
            failures += 1;
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    if failures > 0 {
        anyhow::bail!("{} of {} inputs failed", failures, cli.inputs.len());
    }
    log::info!("Done! Output: {}", cli.out_dir.display());
    Ok(())
}

fn output_stem(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("spiro")
        .to_string()
}

fn process_file(
    input: &Path,
    cli: &Cli,
    analysis_config: &AnalysisConfig,
    render_config: &RenderConfig,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    // 1. Decode
    let audio = decode_audio(input)?;

    // 2. Analyze
    let analysis = spiromint::analyze(&audio.samples, audio.sample_rate, analysis_config)
        .with_context(|| format!("Failed to analyze {}", input.display()))?;
    if analysis.tempo_fallback && cli.tempo.is_none() {
        log::warn!("Auto tempo failed; using {} BPM. Override with --tempo.", analysis.bpm);
    }

    // 3. Render
    let tempo_used = cli.tempo.unwrap_or(analysis.bpm);
    let params = RenderParams::from_analysis(&analysis, tempo_used, render_config);
    let output = render::render(&params)?;
    let summary = output.summary();
    log::info!(
        "Mapped: R={}, r={}, p={}, rotors={}",
        summary.mapped.base_radius,
        summary.mapped.rotor_radius,
        summary.mapped.pen_radius,
        summary.mapped.rotors
    );

    let stem = output_stem(input);
    let png_name = format!("{}.png", stem);
    if !cli.no_png {
        let mut canvas = Canvas::new(cli.size, cli.size);
        output.draw(&mut canvas);
        canvas.save_png(&cli.out_dir.join(&png_name))?;
    }

    // 4. Metadata
    let options = MetadataOptions {
        name: cli.name.clone(),
        image_uri: Some(cli.image_uri.clone().unwrap_or(png_name)),
    };
    let metadata = build_metadata(&analysis, &summary, tempo_used, &options);
    let metadata_path: PathBuf = cli.out_dir.join(format!("{}.metadata.json", stem));
    metadata.write(&metadata_path)?;

    Ok(())
}
