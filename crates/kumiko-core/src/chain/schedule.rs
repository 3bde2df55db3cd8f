//! The executable signal chain.
//!
//! A [`SignalChain`] is a flat list of steps in dependency order. Each step owns
//! the buffers for its outlets; during a block, step `k` reads the outputs of
//! steps `0..k` and writes its own. An in-place step owns no buffer: it
//! processes its single producer's buffer directly and its consumers read that
//! buffer afterwards.

use std::sync::Arc;

use crate::graph::{BoxId, Object};

use super::Sample;
use super::buffer::{AudioBus, SignalInputs, SignalOutputs, Source};

/// One box's place in the chain.
pub(crate) struct Step {
    pub id: BoxId,
    pub object: Arc<dyn Object>,
    pub inputs: Vec<Source>,
    /// Producer locations summed into `mix[slot]`.
    pub mixes: Vec<Vec<(usize, usize)>>,
    pub mix: Vec<Vec<Sample>>,
    pub outputs: Vec<Vec<Sample>>,
    /// Producer buffer processed in place instead of running `perform`.
    pub inplace: Option<(usize, usize)>,
}

/// Dependency-ordered pipeline of signal boxes.
pub struct SignalChain {
    pub(crate) steps: Vec<Step>,
    pub(crate) silence: Vec<Sample>,
    pub(crate) sample_rate: f32,
    pub(crate) block_size: usize,
}

impl SignalChain {
    /// Box IDs in execution order.
    pub fn order(&self) -> Vec<BoxId> {
        self.steps.iter().map(|s| s.id).collect()
    }

    /// Boxes processing their producer's buffer in place.
    pub fn inplace_boxes(&self) -> Vec<BoxId> {
        self.steps
            .iter()
            .filter(|s| s.inplace.is_some())
            .map(|s| s.id)
            .collect()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if no box takes part.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sample rate the boxes were prepared with.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Samples per block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Processes exactly one block through every step in order.
    pub fn tick(&mut self, bus: &mut AudioBus) {
        bus.clear_outputs();
        let AudioBus {
            inputs: bus_inputs,
            outputs: bus_outputs,
        } = bus;

        for k in 0..self.steps.len() {
            let (done, rest) = self.steps.split_at_mut(k);
            let Some(step) = rest.first_mut() else {
                break;
            };

            if let Some((producer, outlet)) = step.inplace {
                step.object.perform_inplace(&mut done[producer].outputs[outlet]);
                continue;
            }

            let Step {
                object,
                inputs,
                mixes,
                mix,
                outputs,
                ..
            } = step;

            for (buffer, sources) in mix.iter_mut().zip(mixes.iter()) {
                buffer.fill(0.0);
                for &(producer, outlet) in sources {
                    for (acc, x) in buffer.iter_mut().zip(&done[producer].outputs[outlet]) {
                        *acc += *x;
                    }
                }
            }

            let signal_inputs = SignalInputs {
                sources: inputs.as_slice(),
                done: &*done,
                mix: mix.as_slice(),
                silence: &self.silence,
                bus: bus_inputs.as_slice(),
            };
            let mut signal_outputs = SignalOutputs {
                outputs: outputs.as_mut_slice(),
                bus: bus_outputs.as_mut_slice(),
            };
            object.perform(&signal_inputs, &mut signal_outputs);
        }
    }

    /// Calls `release` on every box in the chain.
    pub fn release(&self) {
        for step in &self.steps {
            step.object.release();
        }
    }
}

impl std::fmt::Debug for SignalChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalChain")
            .field("order", &self.order())
            .field("sample_rate", &self.sample_rate)
            .field("block_size", &self.block_size)
            .finish()
    }
}
