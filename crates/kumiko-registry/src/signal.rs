//! Signal objects.
//!
//! Control-rate values reach the signal thread through [`AtomicSample`], so a
//! message never waits on a block in progress.

use std::f64::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use kumiko_core::{
    Atom, Construction, Context, Inlet, Object, Outlet, PatchError, Sample, SignalInputs,
    SignalOutputs,
};
use parking_lot::Mutex;

/// A sample shared between the control and signal threads.
#[derive(Debug, Default)]
pub struct AtomicSample(AtomicU32);

impl AtomicSample {
    /// Creates a value.
    pub fn new(value: Sample) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Current value.
    pub fn get(&self) -> Sample {
        Sample::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Replaces the value.
    pub fn set(&self, value: Sample) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

fn number_argument(c: &Construction<'_>, index: usize, default: Sample) -> Sample {
    let atom = c.argument(index);
    if atom.is_number() {
        atom.as_double() as Sample
    } else {
        default
    }
}

// --- sig~ ---

/// Turns a number into a constant signal.
struct Sig {
    value: AtomicSample,
}

impl Object for Sig {
    fn receive(&self, _ctx: &Context<'_>, _inlet: usize, atoms: &[Atom]) -> bool {
        match atoms.first() {
            Some(first) if first.is_number() => {
                self.value.set(first.as_double() as Sample);
                true
            }
            _ => false,
        }
    }

    fn prepare(&self, _sample_rate: f32, _block_size: usize) -> bool {
        true
    }

    fn perform(&self, _inputs: &SignalInputs<'_>, outputs: &mut SignalOutputs<'_>) {
        outputs.output(0).fill(self.value.get());
    }
}

pub(crate) fn sig(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    c.add_inlet(Inlet::control("value"));
    c.add_outlet(Outlet::signal("constant signal"));
    Ok(Arc::new(Sig {
        value: AtomicSample::new(number_argument(c, 0, 0.0)),
    }))
}

// --- osc~ ---

struct Phase {
    /// Normalized phase in [0, 1).
    position: f64,
    sample_rate: f64,
}

/// Cosine oscillator. A signal on the left inlet overrides the frequency.
struct Osc {
    frequency: AtomicSample,
    phase: Mutex<Phase>,
}

impl Object for Osc {
    fn receive(&self, _ctx: &Context<'_>, inlet: usize, atoms: &[Atom]) -> bool {
        let Some(first) = atoms.first().filter(|a| a.is_number()) else {
            return false;
        };
        match inlet {
            0 => self.frequency.set(first.as_double() as Sample),
            _ => self.phase.lock().position = first.as_double().rem_euclid(1.0),
        }
        true
    }

    fn prepare(&self, sample_rate: f32, _block_size: usize) -> bool {
        self.phase.lock().sample_rate = f64::from(sample_rate);
        true
    }

    fn perform(&self, inputs: &SignalInputs<'_>, outputs: &mut SignalOutputs<'_>) {
        let modulated = inputs.is_connected(0);
        let frequency_in = inputs.input(0);
        let base = f64::from(self.frequency.get());
        let mut phase = self.phase.lock();
        let sample_rate = phase.sample_rate.max(1.0);

        for (i, out) in outputs.output(0).iter_mut().enumerate() {
            *out = libm::cos(TAU * phase.position) as Sample;
            let frequency = if modulated {
                frequency_in.get(i).map_or(base, |&f| f64::from(f))
            } else {
                base
            };
            phase.position += frequency / sample_rate;
            phase.position -= libm::floor(phase.position);
        }
    }

    fn release(&self) {
        self.phase.lock().position = 0.0;
    }
}

pub(crate) fn osc(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    c.add_inlet(Inlet::both("frequency (Hz)"));
    c.add_inlet(Inlet::control("phase (0-1)").cold());
    c.add_outlet(Outlet::signal("cosine"));
    Ok(Arc::new(Osc {
        frequency: AtomicSample::new(number_argument(c, 0, 0.0)),
        phase: Mutex::new(Phase {
            position: 0.0,
            sample_rate: 44100.0,
        }),
    }))
}

// --- *~ and +~ ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalOperator {
    Add,
    Multiply,
}

impl SignalOperator {
    #[inline]
    fn apply(self, a: Sample, b: Sample) -> Sample {
        match self {
            SignalOperator::Add => a + b,
            SignalOperator::Multiply => a * b,
        }
    }
}

/// Combines the left signal with the right signal, or with a scalar while the
/// right inlet has no signal connection.
struct Binary {
    operator: SignalOperator,
    scalar: AtomicSample,
}

impl Object for Binary {
    fn receive(&self, _ctx: &Context<'_>, inlet: usize, atoms: &[Atom]) -> bool {
        match atoms.first() {
            Some(first) if inlet == 1 && first.is_number() => {
                self.scalar.set(first.as_double() as Sample);
                true
            }
            _ => false,
        }
    }

    fn prepare(&self, _sample_rate: f32, _block_size: usize) -> bool {
        true
    }

    fn perform(&self, inputs: &SignalInputs<'_>, outputs: &mut SignalOutputs<'_>) {
        let left = inputs.input(0);
        let out = outputs.output(0);
        if inputs.is_connected(1) {
            let right = inputs.input(1);
            for ((o, &a), &b) in out.iter_mut().zip(left).zip(right) {
                *o = self.operator.apply(a, b);
            }
        } else {
            let scalar = self.scalar.get();
            for (o, &a) in out.iter_mut().zip(left) {
                *o = self.operator.apply(a, scalar);
            }
        }
    }

    /// The in-place path is only taken when the left inlet is the sole signal
    /// input, so the scalar is always the right operand here.
    fn is_inplace(&self) -> bool {
        self.operator == SignalOperator::Multiply
    }

    fn perform_inplace(&self, buffer: &mut [Sample]) {
        let scalar = self.scalar.get();
        for x in buffer {
            *x = self.operator.apply(*x, scalar);
        }
    }
}

fn binary(c: &mut Construction<'_>, operator: SignalOperator) -> Arc<dyn Object> {
    c.add_inlet(Inlet::signal("left signal"));
    c.add_inlet(Inlet::both("right signal or scalar"));
    c.add_outlet(Outlet::signal("result"));
    let default = match operator {
        SignalOperator::Add => 0.0,
        SignalOperator::Multiply => 1.0,
    };
    Arc::new(Binary {
        operator,
        scalar: AtomicSample::new(number_argument(c, 0, default)),
    })
}

pub(crate) fn times_signal(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    Ok(binary(c, SignalOperator::Multiply))
}

pub(crate) fn plus_signal(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    Ok(binary(c, SignalOperator::Add))
}

// --- adc~ / dac~ ---

/// Parses 1-based channel arguments; no arguments means channels 1 and 2.
fn channels(c: &Construction<'_>) -> Result<Vec<usize>, PatchError> {
    if c.arguments().is_empty() {
        return Ok(vec![0, 1]);
    }
    c.arguments()
        .iter()
        .map(|atom| {
            if atom.is_long() && atom.as_long() >= 1 {
                Ok(atom.as_long() as usize - 1)
            } else {
                Err(PatchError::construction(
                    c.name().as_str(),
                    format!("invalid channel '{}'", atom.to_text()),
                ))
            }
        })
        .collect()
}

/// Copies external input channels onto its outlets.
struct Adc {
    channels: Vec<usize>,
}

impl Object for Adc {
    fn receive(&self, _ctx: &Context<'_>, _inlet: usize, _atoms: &[Atom]) -> bool {
        false
    }

    fn prepare(&self, _sample_rate: f32, _block_size: usize) -> bool {
        true
    }

    fn perform(&self, inputs: &SignalInputs<'_>, outputs: &mut SignalOutputs<'_>) {
        for (outlet, &channel) in self.channels.iter().enumerate() {
            let source = inputs.bus_input(channel);
            let out = outputs.output(outlet);
            let n = out.len().min(source.len());
            out[..n].copy_from_slice(&source[..n]);
        }
    }
}

pub(crate) fn adc(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    let channels = channels(c)?;
    for channel in &channels {
        c.add_outlet(Outlet::signal(format!("input channel {}", channel + 1)));
    }
    Ok(Arc::new(Adc { channels }))
}

/// Adds its inlets into external output channels.
struct Dac {
    channels: Vec<usize>,
}

impl Object for Dac {
    fn receive(&self, _ctx: &Context<'_>, _inlet: usize, _atoms: &[Atom]) -> bool {
        false
    }

    fn prepare(&self, _sample_rate: f32, _block_size: usize) -> bool {
        true
    }

    fn perform(&self, inputs: &SignalInputs<'_>, outputs: &mut SignalOutputs<'_>) {
        for (inlet, &channel) in self.channels.iter().enumerate() {
            if !inputs.is_connected(inlet) {
                continue;
            }
            let input = inputs.input(inlet);
            if let Some(bus) = outputs.bus_output(channel) {
                for (o, &x) in bus.iter_mut().zip(input) {
                    *o += x;
                }
            }
        }
    }
}

pub(crate) fn dac(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    let channels = channels(c)?;
    for channel in &channels {
        c.add_inlet(Inlet::signal(format!("output channel {}", channel + 1)));
    }
    Ok(Arc::new(Dac { channels }))
}
