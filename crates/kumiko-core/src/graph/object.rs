//! The box contract.
//!
//! Concrete boxes implement [`Object`] and are built by a constructor that
//! receives a [`Construction`]: the constructor declares ports and attributes
//! and returns the object. At run time the object sees a [`Context`] through
//! which it emits messages.
//!
//! Objects are shared (`Arc<dyn Object>`) and called through `&self` from the
//! control thread, the signal thread and the scheduler thread, so mutable
//! state lives behind locks or atomics inside the object.

use std::sync::Arc;

use crate::atom::Atom;
use crate::attribute::{Attribute, AttributeManager};
use crate::beacon::Beacon;
use crate::chain::{Sample, SignalInputs, SignalOutputs};
use crate::clock::Clock;
use crate::dico::Dico;
use crate::error::PatchError;
use crate::factory::Factory;
use crate::symbol::Symbol;

use super::node::{BoxHandle, BoxId};
use super::patcher::{Patcher, PatcherInner};
use super::port::{Inlet, Outlet};

/// Behavior of a box.
pub trait Object: Send + Sync {
    /// Handles a message arriving at `inlet`. Returns true if it was understood.
    fn receive(&self, ctx: &Context<'_>, inlet: usize, atoms: &[Atom]) -> bool;

    /// Called when one of the box's clocks fires.
    fn tick(&self, _ctx: &Context<'_>) {}

    /// Readies the box for signal processing. Returning false keeps it out of
    /// the signal chain.
    fn prepare(&self, _sample_rate: f32, _block_size: usize) -> bool {
        false
    }

    /// Processes one block.
    fn perform(&self, _inputs: &SignalInputs<'_>, _outputs: &mut SignalOutputs<'_>) {}

    /// True if the box can process its single input buffer in place.
    fn is_inplace(&self) -> bool {
        false
    }

    /// Processes one block in place. Only called when [`is_inplace`](Self::is_inplace)
    /// is true and the chain builder found the box eligible.
    fn perform_inplace(&self, _buffer: &mut [Sample]) {}

    /// Called when signal processing stops.
    fn release(&self) {}
}

/// Run-time view of the patcher from inside a box.
pub struct Context<'a> {
    patcher: &'a Arc<PatcherInner>,
    id: BoxId,
}

impl<'a> Context<'a> {
    pub(crate) fn new(patcher: &'a Arc<PatcherInner>, id: BoxId) -> Self {
        Self { patcher, id }
    }

    /// The receiving box.
    pub fn id(&self) -> BoxId {
        self.id
    }

    /// Sends `atoms` out of `outlet`, synchronously, to every connected inlet in
    /// connection order.
    pub fn send(&self, outlet: usize, atoms: &[Atom]) {
        self.patcher.dispatch(self.id, outlet, atoms);
    }

    /// The owning patcher.
    pub fn patcher(&self) -> Patcher {
        Patcher::from_inner(Arc::clone(self.patcher))
    }

    /// A weak handle to the receiving box.
    pub fn handle(&self) -> BoxHandle {
        BoxHandle {
            patcher: Arc::downgrade(self.patcher),
            id: self.id,
        }
    }
}

/// Everything a constructor needs to build a box.
pub struct Construction<'a> {
    pub(crate) name: Symbol,
    pub(crate) arguments: Vec<Atom>,
    pub(crate) detail: &'a Dico,
    pub(crate) inlets: Vec<Inlet>,
    pub(crate) outlets: Vec<Outlet>,
    pub(crate) attributes: Arc<AttributeManager>,
    pub(crate) handle: BoxHandle,
    pub(crate) factory: &'a Arc<Factory>,
}

impl Construction<'_> {
    /// Registered name the box was created under.
    pub fn name(&self) -> Symbol {
        self.name
    }

    /// Creation arguments (the atoms after the name).
    pub fn arguments(&self) -> &[Atom] {
        &self.arguments
    }

    /// Argument `index`, or [`Atom::Undefined`].
    pub fn argument(&self, index: usize) -> Atom {
        self.arguments.get(index).cloned().unwrap_or_default()
    }

    /// The full construction description.
    pub fn detail(&self) -> &Dico {
        self.detail
    }

    /// Appends an inlet.
    pub fn add_inlet(&mut self, inlet: Inlet) {
        self.inlets.push(inlet);
    }

    /// Appends an outlet.
    pub fn add_outlet(&mut self, outlet: Outlet) {
        self.outlets.push(outlet);
    }

    /// Declares a box attribute. Values in the description are applied after
    /// the constructor returns.
    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.add_attribute(attribute);
    }

    /// The box's attribute manager.
    pub fn attributes(&self) -> &Arc<AttributeManager> {
        &self.attributes
    }

    /// Weak handle to the box being built.
    pub fn handle(&self) -> BoxHandle {
        self.handle.clone()
    }

    /// The factory building the box.
    pub fn factory(&self) -> &Arc<Factory> {
        self.factory
    }

    /// Looks up or creates the beacon called `name`.
    pub fn beacon(&self, name: impl Into<Symbol>) -> Arc<Beacon> {
        self.factory.create_beacon(name)
    }

    /// A clock ticking the box being built.
    pub fn clock(&self) -> Result<Clock, PatchError> {
        Ok(Clock::new(self.factory.scheduler()?, self.handle.clone()))
    }
}
