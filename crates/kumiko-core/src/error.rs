//! Error types for graph and signal-chain operations.

use thiserror::Error;

use crate::graph::BoxId;

/// Errors raised while building the signal chain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    /// The signal connections form a cycle through these boxes.
    #[error("signal graph contains a cycle through boxes {boxes:?}")]
    Cycle {
        /// Boxes that could not be ordered.
        boxes: Vec<BoxId>,
    },

    /// Sample rate or block size is unusable.
    #[error("invalid DSP settings: sample rate {sample_rate}, block size {block_size}")]
    InvalidSettings {
        /// Requested sample rate.
        sample_rate: f32,
        /// Requested block size.
        block_size: usize,
    },
}

/// Errors raised by the Factory and the Patcher.
#[derive(Debug, Error)]
pub enum PatchError {
    /// No constructor is registered under this name.
    #[error("no such object: {0}")]
    UnknownObject(String),

    /// A box description had neither text nor name.
    #[error("empty box description")]
    EmptyDescription,

    /// The constructor rejected its arguments.
    #[error("cannot create '{name}': {reason}")]
    Construction {
        /// Object name.
        name: String,
        /// Why construction failed.
        reason: String,
    },

    /// The box does not exist (never created, or already removed).
    #[error("box {0} not found")]
    BoxNotFound(BoxId),

    /// Inlet index out of range.
    #[error("box {id} has no inlet {inlet}")]
    NoSuchInlet {
        /// Box addressed.
        id: BoxId,
        /// Requested inlet.
        inlet: usize,
    },

    /// Outlet index out of range.
    #[error("box {id} has no outlet {outlet}")]
    NoSuchOutlet {
        /// Box addressed.
        id: BoxId,
        /// Requested outlet.
        outlet: usize,
    },

    /// Outlet and inlet capabilities do not match.
    #[error("cannot connect {from}:{outlet} to {to}:{inlet}: incompatible port kinds")]
    IncompatiblePorts {
        /// Source box.
        from: BoxId,
        /// Source outlet.
        outlet: usize,
        /// Destination box.
        to: BoxId,
        /// Destination inlet.
        inlet: usize,
    },

    /// The same edge already exists.
    #[error("connection {from}:{outlet} -> {to}:{inlet} already exists")]
    DuplicateConnection {
        /// Source box.
        from: BoxId,
        /// Source outlet.
        outlet: usize,
        /// Destination box.
        to: BoxId,
        /// Destination inlet.
        inlet: usize,
    },

    /// A box cannot be wired to itself.
    #[error("cannot connect box {0} to itself")]
    SelfConnection(BoxId),

    /// No edge matches the request.
    #[error("connection {from}:{outlet} -> {to}:{inlet} not found")]
    ConnectionNotFound {
        /// Source box.
        from: BoxId,
        /// Source outlet.
        outlet: usize,
        /// Destination box.
        to: BoxId,
        /// Destination inlet.
        inlet: usize,
    },

    /// Control message sent to an inlet that only takes signals.
    #[error("inlet {inlet} of box {id} does not accept messages")]
    SignalOnlyInlet {
        /// Box addressed.
        id: BoxId,
        /// Inlet addressed.
        inlet: usize,
    },

    /// The scheduler thread could not be started.
    #[error("scheduler unavailable: {0}")]
    Scheduler(#[from] std::io::Error),

    /// Signal chain failure.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl PatchError {
    /// Create a construction error.
    pub fn construction(name: impl Into<String>, reason: impl Into<String>) -> Self {
        PatchError::Construction {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
