//! Kumiko Core - dataflow patching runtime
//!
//! Boxes are wired into a graph; control messages travel between them
//! synchronously, and the signal-carrying part of the graph is compiled into a
//! chain that runs once per audio block.
//!
//! # Core Abstractions
//!
//! ## Values
//!
//! - [`Symbol`] - Interned, identity-compared string
//! - [`Atom`] - Closed-variant dynamic value used for every message
//! - [`Dico`] - Hierarchical symbol → atoms container with a text notation
//!
//! ## Graph
//!
//! - [`Patcher`] - Owns boxes and connections; dispatches messages; drives DSP
//! - [`Object`] - The behavior a box implements
//! - [`Inlet`] / [`Outlet`] / [`Connection`] - Ports and edges
//! - [`Factory`] - Name → constructor registry
//!
//! ## Signal Processing
//!
//! - [`SignalChain`] - Dependency-ordered signal steps
//! - [`AudioBus`] - External input/output channels
//!
//! ## Box Services
//!
//! - [`AttributeManager`] - Typed, observable box properties
//! - [`Beacon`] - Named broadcast channel
//! - [`Clock`] / [`Scheduler`] - Deferred ticks bound to a box
//!
//! # Example
//!
//! ```rust
//! use kumiko_core::{Atom, Dico};
//!
//! let atoms = Atom::parse("foo \"bar 42\" 1 2 3.5");
//! assert_eq!(atoms.len(), 5);
//!
//! let mut dico = Dico::new();
//! dico.set("args", atoms);
//! let restored = Dico::from_text(&dico.to_text());
//! assert_eq!(restored, dico);
//! ```

pub mod atom;
pub mod attribute;
pub mod beacon;
pub mod chain;
pub mod clock;
pub mod dico;
pub mod error;
pub mod factory;
pub mod graph;
pub mod symbol;

pub use atom::{Atom, atoms_to_text};
pub use attribute::{
    AttrFlags, AttrKind, Attribute, AttributeEvent, AttributeListener, AttributeManager,
    FROZEN_ATTRIBUTES_KEY,
};
pub use beacon::{Beacon, BeaconRegistry, Castaway};
pub use chain::{AudioBus, Sample, SignalChain, SignalInputs, SignalOutputs};
pub use clock::{Clock, MAX_DELAY, Scheduler};
pub use dico::Dico;
pub use error::{ChainError, PatchError};
pub use factory::{Constructor, Factory, ObjectCategory, ObjectDescriptor};
pub use graph::{
    BoxHandle, BoxId, BoxInfo, Connection, Construction, Context, DEFAULT_MAX_DEPTH, Inlet,
    Object, Outlet, Patcher, Polarity, PortKind,
};
pub use symbol::{Symbol, SymbolTable};
