//! Real-time run command.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Args;
use kumiko_config::EngineConfig;
use kumiko_io::BlockDriver;
use kumiko_registry::take_print_history;

use super::common::open_patch;

#[derive(Args)]
pub struct RunArgs {
    /// Patch to run (path or saved patch name)
    patch: String,

    /// Sample rate (defaults to the engine config)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Block size (defaults to the engine config)
    #[arg(long)]
    block_size: Option<usize>,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    duration: Option<f64>,
}

pub fn run(args: RunArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let patcher = open_patch(&args.patch, config)?;
    let sample_rate = args.sample_rate.unwrap_or(config.sample_rate);
    let block_size = args.block_size.unwrap_or(config.block_size);

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut driver = BlockDriver::spawn(patcher, sample_rate, block_size)?;
    println!("Running at {sample_rate} Hz, {block_size} samples per block");
    if args.duration.is_none() {
        println!("\nPress Ctrl+C to stop...\n");
    }

    let deadline = args
        .duration
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
        .and_then(|duration| Instant::now().checked_add(duration));

    while running.load(Ordering::SeqCst) && driver.is_running() {
        std::thread::sleep(Duration::from_millis(20));
        for line in take_print_history() {
            println!("{line}");
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break;
        }
    }

    driver.stop();
    for line in take_print_history() {
        println!("{line}");
    }
    println!("Done! {} blocks processed.", driver.blocks());
    Ok(())
}
