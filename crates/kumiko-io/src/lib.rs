//! Signal I/O for kumiko patchers.
//!
//! This crate provides:
//!
//! - **Block driver**: [`BlockDriver`] runs a patcher's signal chain on its own
//!   thread at the block cadence
//! - **Offline rendering**: [`render`] and [`render_with_input`] pull a fixed
//!   duration of audio out of a patcher as fast as possible
//! - **WAV file I/O**: [`read_wav`] and [`write_wav`] for multi-channel files
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kumiko_io::{RenderSettings, render, write_wav, WavSpec};
//!
//! let settings = RenderSettings { seconds: 2.0, ..Default::default() };
//! let channels = render(&patcher, &settings, |_, _| {})?;
//! write_wav("out.wav", &channels, WavSpec::for_render(&settings, channels.len()))?;
//! ```

mod driver;
mod render;
mod wav;

use kumiko_core::{ChainError, PatchError, Patcher};

pub use driver::BlockDriver;
pub use render::{RenderSettings, render, render_with_input};
pub use wav::{WavSpec, read_wav, write_wav};

/// Error types for signal I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The patcher refused to start.
    #[error("patcher error: {0}")]
    Patch(#[from] PatchError),

    /// Render or driver settings are unusable.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for signal I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Starts DSP on `patcher`. A signal cycle is not fatal: the patcher runs
/// silence until the cycle is broken.
pub(crate) fn start_dsp(patcher: &Patcher, sample_rate: f32, block_size: usize) -> Result<()> {
    match patcher.start(sample_rate, block_size) {
        Ok(()) => Ok(()),
        Err(PatchError::Chain(ChainError::Cycle { boxes })) => {
            tracing::warn!(?boxes, "signal cycle, running silence until it is broken");
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}
