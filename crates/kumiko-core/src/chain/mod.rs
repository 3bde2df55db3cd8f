//! Signal chain: block-rate execution of the signal part of a patch.
//!
//! The patcher derives a [`SignalChain`] from its signal connections whenever
//! their topology changes, never per block. Each block then runs
//! [`SignalChain::tick`], which calls every participating box once in
//! producer-before-consumer order.
//!
//! # Buffers
//!
//! - Every step owns one buffer per signal outlet.
//! - An inlet fed by one producer reads that producer's buffer directly; an
//!   inlet fed by several reads a per-inlet mix buffer summed at the start of
//!   the step; an unconnected inlet reads silence.
//! - A box that opts in with [`Object::is_inplace`](crate::Object::is_inplace)
//!   and has exactly one producer (which feeds nothing else) processes that
//!   producer's buffer in place.
//!
//! External audio enters and leaves through an [`AudioBus`].

mod buffer;
pub(crate) mod builder;
mod schedule;

pub use buffer::{AudioBus, SignalInputs, SignalOutputs};
pub use schedule::SignalChain;

/// Audio sample type.
pub type Sample = f32;
