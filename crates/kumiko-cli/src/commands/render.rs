//! Offline render command.

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use kumiko_config::EngineConfig;
use kumiko_io::{RenderSettings, WavSpec, read_wav, render_with_input, write_wav};

use super::common::open_patch;

#[derive(Args)]
pub struct RenderArgs {
    /// Patch to render (path or saved patch name)
    patch: String,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Duration in seconds
    #[arg(short, long, default_value = "1.0")]
    seconds: f64,

    /// WAV file fed to the patch's inputs
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Sample rate (defaults to the engine config)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Block size (defaults to the engine config)
    #[arg(long)]
    block_size: Option<usize>,

    /// Output bit depth (16, 24 or 32 float)
    #[arg(long, default_value = "32")]
    bit_depth: u16,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

pub fn run(args: RenderArgs, config: &EngineConfig) -> anyhow::Result<()> {
    if ![16, 24, 32].contains(&args.bit_depth) {
        anyhow::bail!("Unsupported bit depth {} (use 16, 24 or 32)", args.bit_depth);
    }
    let patcher = open_patch(&args.patch, config)?;

    let inputs = match &args.input {
        Some(path) => {
            let (channels, spec) = read_wav(path)?;
            println!(
                "Input: {} ({} channel(s), {} Hz)",
                path.display(),
                spec.channels,
                spec.sample_rate
            );
            channels
        }
        None => Vec::new(),
    };

    let settings = RenderSettings {
        seconds: args.seconds,
        sample_rate: args.sample_rate.unwrap_or(config.sample_rate),
        block_size: args.block_size.unwrap_or(config.block_size),
    };
    println!(
        "Rendering {} s at {} Hz, {} samples per block...",
        settings.seconds, settings.sample_rate, settings.block_size
    );

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(settings.blocks() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let channels = render_with_input(&patcher, &settings, &inputs, |done, _| {
        pb.set_position(done as u64);
    })?;
    pb.finish_with_message("done");

    let spec = WavSpec {
        bits_per_sample: args.bit_depth,
        ..WavSpec::for_render(&settings, channels.len())
    };
    write_wav(&args.output, &channels, spec)?;

    let peak = channels
        .iter()
        .flatten()
        .fold(0.0f32, |peak, sample| peak.max(sample.abs()));
    println!(
        "Wrote {} ({} channel(s), peak {:.3})",
        args.output.display(),
        channels.len(),
        peak
    );
    Ok(())
}
