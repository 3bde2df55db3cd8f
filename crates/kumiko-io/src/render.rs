//! Offline rendering: run a patcher's signal chain faster than real time.

use kumiko_core::{Patcher, Sample};

use crate::{Error, Result, start_dsp};

/// Duration and format of an offline render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// Length of the render in seconds.
    pub seconds: f64,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per block.
    pub block_size: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            seconds: 1.0,
            sample_rate: 44100,
            block_size: 64,
        }
    }
}

impl RenderSettings {
    /// Total frames to produce.
    pub fn frames(&self) -> usize {
        (self.seconds * f64::from(self.sample_rate)).round().max(0.0) as usize
    }

    /// Blocks needed to cover [`frames`](Self::frames).
    pub fn blocks(&self) -> usize {
        self.frames().div_ceil(self.block_size.max(1))
    }

    fn validate(&self) -> Result<()> {
        if !self.seconds.is_finite() || self.seconds < 0.0 {
            return Err(Error::InvalidSettings(format!(
                "duration {} s is not a non-negative number",
                self.seconds
            )));
        }
        if self.sample_rate == 0 || self.block_size == 0 {
            return Err(Error::InvalidSettings(
                "sample rate and block size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Renders the patcher's output channels. See [`render_with_input`].
pub fn render(
    patcher: &Patcher,
    settings: &RenderSettings,
    progress: impl FnMut(usize, usize),
) -> Result<Vec<Vec<Sample>>> {
    render_with_input(patcher, settings, &[], progress)
}

/// Restarts DSP on `patcher` with `settings`, feeds `inputs` (one vector per
/// bus input channel, silence past their end) and collects one vector per bus
/// output channel. DSP is stopped afterwards.
///
/// `progress(done, total)` is called after every block.
pub fn render_with_input(
    patcher: &Patcher,
    settings: &RenderSettings,
    inputs: &[Vec<Sample>],
    mut progress: impl FnMut(usize, usize),
) -> Result<Vec<Vec<Sample>>> {
    settings.validate()?;
    let block_size = settings.block_size;
    let frames = settings.frames();
    let blocks = settings.blocks();

    start_dsp(patcher, settings.sample_rate as f32, block_size)?;
    let (input_channels, output_channels) = patcher.channels();
    tracing::info!(
        frames,
        blocks,
        input_channels,
        output_channels,
        "rendering"
    );

    let mut rendered: Vec<Vec<Sample>> = vec![Vec::with_capacity(frames); output_channels];
    let mut in_blocks: Vec<Vec<Sample>> = vec![vec![0.0; block_size]; input_channels];
    let mut out_blocks: Vec<Vec<Sample>> = vec![vec![0.0; block_size]; output_channels];

    for block in 0..blocks {
        let start = block * block_size;
        let len = block_size.min(frames - start);

        for (channel, buffer) in in_blocks.iter_mut().enumerate() {
            buffer.fill(0.0);
            if let Some(source) = inputs.get(channel)
                && start < source.len()
            {
                let n = len.min(source.len() - start);
                buffer[..n].copy_from_slice(&source[start..start + n]);
            }
        }

        let ins: Vec<&[Sample]> = in_blocks.iter().map(Vec::as_slice).collect();
        let mut outs: Vec<&mut [Sample]> = out_blocks.iter_mut().map(Vec::as_mut_slice).collect();
        patcher.process(&ins, &mut outs);

        for (target, buffer) in rendered.iter_mut().zip(&out_blocks) {
            target.extend_from_slice(&buffer[..len]);
        }
        progress(block + 1, blocks);
    }

    patcher.stop();
    Ok(rendered)
}
