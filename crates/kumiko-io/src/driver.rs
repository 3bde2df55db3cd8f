//! Real-time block driver.
//!
//! Without a sound card the driver stands in for the audio callback: a
//! dedicated thread pulls one block from the patcher every
//! `block_size / sample_rate` seconds and discards the output.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use kumiko_core::{Patcher, Sample};

use crate::{Error, Result, start_dsp};

/// Runs a patcher's signal chain at the block cadence on its own thread.
///
/// Dropping the driver stops the thread and the patcher's DSP.
pub struct BlockDriver {
    patcher: Arc<Patcher>,
    running: Arc<AtomicBool>,
    blocks: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl BlockDriver {
    /// Starts DSP on `patcher` and spawns the `kumiko-dsp` thread.
    pub fn spawn(patcher: Arc<Patcher>, sample_rate: u32, block_size: usize) -> Result<Self> {
        if sample_rate == 0 || block_size == 0 {
            return Err(Error::InvalidSettings(
                "sample rate and block size must be positive".to_string(),
            ));
        }
        start_dsp(&patcher, sample_rate as f32, block_size)?;

        let running = Arc::new(AtomicBool::new(true));
        let blocks = Arc::new(AtomicU64::new(0));
        let period = Duration::from_secs_f64(block_size as f64 / f64::from(sample_rate));

        let thread = std::thread::Builder::new().name("kumiko-dsp".to_string()).spawn({
            let patcher = Arc::clone(&patcher);
            let running = Arc::clone(&running);
            let blocks = Arc::clone(&blocks);
            move || run(&patcher, &running, &blocks, block_size, period)
        })?;
        tracing::info!(sample_rate, block_size, ?period, "block driver started");

        Ok(Self {
            patcher,
            running,
            blocks,
            thread: Some(thread),
        })
    }

    /// Blocks processed so far.
    pub fn blocks(&self) -> u64 {
        self.blocks.load(Ordering::Relaxed)
    }

    /// Whether the driver thread is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The patcher being driven.
    pub fn patcher(&self) -> &Arc<Patcher> {
        &self.patcher
    }

    /// Stops the thread, waits for it and stops DSP. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("block driver thread panicked");
            }
            self.patcher.stop();
            tracing::info!(blocks = self.blocks(), "block driver stopped");
        }
    }
}

impl Drop for BlockDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    patcher: &Patcher,
    running: &AtomicBool,
    blocks: &AtomicU64,
    block_size: usize,
    period: Duration,
) {
    let (input_channels, output_channels) = patcher.channels();
    let inputs: Vec<Vec<Sample>> = vec![vec![0.0; block_size]; input_channels];
    let mut outputs: Vec<Vec<Sample>> = vec![vec![0.0; block_size]; output_channels];
    let mut next = Instant::now();

    while running.load(Ordering::Acquire) {
        let ins: Vec<&[Sample]> = inputs.iter().map(Vec::as_slice).collect();
        let mut outs: Vec<&mut [Sample]> = outputs.iter_mut().map(Vec::as_mut_slice).collect();
        if !patcher.process(&ins, &mut outs) {
            tracing::debug!("patcher stopped under the block driver");
            running.store(false, Ordering::Release);
            break;
        }
        blocks.fetch_add(1, Ordering::Relaxed);

        next += period;
        let now = Instant::now();
        if next > now {
            std::thread::sleep(next - now);
        } else if now - next > period * 8 {
            tracing::debug!(behind = ?(now - next), "block driver overrun, resyncing");
            next = now;
        }
    }
}
