//! Signal buffers seen by objects during a block.

use super::Sample;
use super::schedule::Step;

/// Where a signal inlet reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Source {
    /// Not connected.
    Silence,
    /// One producer's outlet buffer.
    Single { step: usize, outlet: usize },
    /// Several producers summed into a mix buffer of the consuming step.
    Mix { slot: usize },
}

/// External audio channels shared between the backend and the chain.
///
/// Boxes such as `adc~` read [`bus_input`](SignalInputs::bus_input) and boxes
/// such as `dac~` add into [`bus_output`](SignalOutputs::bus_output).
#[derive(Debug, Clone, Default)]
pub struct AudioBus {
    pub(crate) inputs: Vec<Vec<Sample>>,
    pub(crate) outputs: Vec<Vec<Sample>>,
}

impl AudioBus {
    /// Creates a bus with the given channel counts and block size.
    pub fn new(input_channels: usize, output_channels: usize, block_size: usize) -> Self {
        Self {
            inputs: vec![vec![0.0; block_size]; input_channels],
            outputs: vec![vec![0.0; block_size]; output_channels],
        }
    }

    /// Changes the block size, zeroing every channel.
    pub fn resize(&mut self, block_size: usize) {
        for channel in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            channel.clear();
            channel.resize(block_size, 0.0);
        }
    }

    /// Number of input channels.
    pub fn input_channels(&self) -> usize {
        self.inputs.len()
    }

    /// Number of output channels.
    pub fn output_channels(&self) -> usize {
        self.outputs.len()
    }

    /// Input channel buffer.
    pub fn input_mut(&mut self, channel: usize) -> Option<&mut [Sample]> {
        self.inputs.get_mut(channel).map(Vec::as_mut_slice)
    }

    /// Output channel buffer.
    pub fn output(&self, channel: usize) -> Option<&[Sample]> {
        self.outputs.get(channel).map(Vec::as_slice)
    }

    /// Zeroes every output channel.
    pub fn clear_outputs(&mut self) {
        for channel in &mut self.outputs {
            channel.fill(0.0);
        }
    }
}

/// Read access to a step's signal inputs.
pub struct SignalInputs<'a> {
    pub(crate) sources: &'a [Source],
    pub(crate) done: &'a [Step],
    pub(crate) mix: &'a [Vec<Sample>],
    pub(crate) silence: &'a [Sample],
    pub(crate) bus: &'a [Vec<Sample>],
}

impl SignalInputs<'_> {
    /// Number of inlets.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True if the box has no inlets.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Samples arriving at `inlet`; silence when unconnected or out of range.
    pub fn input(&self, inlet: usize) -> &[Sample] {
        match self.sources.get(inlet) {
            Some(Source::Single { step, outlet }) => &self.done[*step].outputs[*outlet],
            Some(Source::Mix { slot }) => &self.mix[*slot],
            Some(Source::Silence) | None => self.silence,
        }
    }

    /// True if at least one signal connection feeds `inlet`.
    pub fn is_connected(&self, inlet: usize) -> bool {
        !matches!(self.sources.get(inlet), Some(Source::Silence) | None)
    }

    /// External input channel; silence when out of range.
    pub fn bus_input(&self, channel: usize) -> &[Sample] {
        self.bus.get(channel).map_or(self.silence, Vec::as_slice)
    }

    /// Samples per block.
    pub fn block_size(&self) -> usize {
        self.silence.len()
    }
}

/// Write access to a step's signal outputs.
pub struct SignalOutputs<'a> {
    pub(crate) outputs: &'a mut [Vec<Sample>],
    pub(crate) bus: &'a mut [Vec<Sample>],
}

impl SignalOutputs<'_> {
    /// Number of outlets.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// True if the box has no outlets.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Buffer for `outlet`; empty when out of range.
    pub fn output(&mut self, outlet: usize) -> &mut [Sample] {
        match self.outputs.get_mut(outlet) {
            Some(buffer) => buffer.as_mut_slice(),
            None => &mut [],
        }
    }

    /// External output channel. Several writers should add into it.
    pub fn bus_output(&mut self, channel: usize) -> Option<&mut [Sample]> {
        self.bus.get_mut(channel).map(Vec::as_mut_slice)
    }

    /// Number of external output channels.
    pub fn bus_channels(&self) -> usize {
        self.bus.len()
    }
}
