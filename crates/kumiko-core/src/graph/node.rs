//! Box identity and bookkeeping.
//!
//! Boxes live in their patcher's slot vector and are addressed by [`BoxId`].
//! IDs are assigned sequentially and never reused, so a stale ID or
//! [`BoxHandle`] resolves to "not found" instead of to a different box.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::atom::Atom;
use crate::attribute::{AttrKind, Attribute, AttributeManager};
use crate::symbol::Symbol;

use super::object::Object;
use super::patcher::PatcherInner;
use super::port::{Inlet, Outlet};

/// Stable identifier of a box within one patcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxId(pub(crate) u32);

impl BoxId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    /// Rebuilds an ID from its raw value (e.g. typed at the console).
    #[inline]
    pub fn from_index(index: u32) -> Self {
        Self(index)
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Weak, arena-checked reference to a box.
///
/// Holds the patcher weakly and the box by ID: if either is gone, operations
/// through the handle do nothing.
#[derive(Clone)]
pub struct BoxHandle {
    pub(crate) patcher: Weak<PatcherInner>,
    pub(crate) id: BoxId,
}

impl BoxHandle {
    /// The box ID.
    pub fn id(&self) -> BoxId {
        self.id
    }

    /// True if the patcher and the box both still exist.
    pub fn is_alive(&self) -> bool {
        self.patcher
            .upgrade()
            .is_some_and(|patcher| patcher.object(self.id).is_some())
    }

    /// Sends `atoms` out of the box's `outlet`. Returns false if the box is gone.
    pub fn send(&self, outlet: usize, atoms: &[Atom]) -> bool {
        let Some(patcher) = self.patcher.upgrade() else {
            return false;
        };
        if patcher.object(self.id).is_none() {
            return false;
        }
        patcher.dispatch(self.id, outlet, atoms);
        true
    }

    /// Runs the box's tick callback. Returns false if the box is gone.
    pub fn tick(&self) -> bool {
        let Some(patcher) = self.patcher.upgrade() else {
            return false;
        };
        let Some(object) = patcher.object(self.id) else {
            tracing::trace!(box_id = %self.id, "tick for removed box ignored");
            return false;
        };
        let ctx = super::object::Context::new(&patcher, self.id);
        object.tick(&ctx);
        true
    }
}

impl fmt::Debug for BoxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxHandle").field("id", &self.id).finish()
    }
}

/// A box as stored in the patcher.
pub(crate) struct BoxEntry {
    pub id: BoxId,
    pub name: Symbol,
    pub text: String,
    pub object: Arc<dyn Object>,
    pub inlets: Vec<Inlet>,
    pub outlets: Vec<Outlet>,
    pub attributes: Arc<AttributeManager>,
}

impl BoxEntry {
    pub fn has_signal_ports(&self) -> bool {
        self.inlets.iter().any(Inlet::accepts_signal) || self.outlets.iter().any(Outlet::is_signal)
    }

    pub fn info(&self) -> BoxInfo {
        BoxInfo {
            id: self.id,
            name: self.name,
            text: self.text.clone(),
            inlets: self.inlets.clone(),
            outlets: self.outlets.clone(),
        }
    }
}

/// Read-only description of a box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxInfo {
    /// Box ID.
    pub id: BoxId,
    /// Registered object name.
    pub name: Symbol,
    /// Creation text (name followed by arguments).
    pub text: String,
    /// Declared inlets.
    pub inlets: Vec<Inlet>,
    /// Declared outlets.
    pub outlets: Vec<Outlet>,
}

/// Declares the attributes every box carries.
pub(crate) fn add_common_attributes(attrs: &AttributeManager) {
    attrs.add_attribute(
        Attribute::new("position", AttrKind::Point, vec![Atom::Double(0.0), Atom::Double(0.0)])
            .with_label("Position")
            .with_category("Appearance")
            .with_order(1),
    );
    attrs.add_attribute(
        Attribute::new("size", AttrKind::Size, vec![Atom::Double(100.0), Atom::Double(20.0)])
            .with_label("Size")
            .with_category("Appearance")
            .with_order(2)
            .with_min(10.0),
    );
    attrs.add_attribute(
        Attribute::new("color", AttrKind::Color, vec![
            Atom::Double(0.9),
            Atom::Double(0.9),
            Atom::Double(0.9),
        ])
        .with_label("Background Color")
        .with_category("Appearance")
        .with_order(3),
    );
    attrs.add_attribute(
        Attribute::new("hidden", AttrKind::Bool, vec![Atom::Bool(false)])
            .with_label("Hide on Lock")
            .with_category("Behavior")
            .with_order(1),
    );
    attrs.add_attribute(
        Attribute::new("presentation", AttrKind::Bool, vec![Atom::Bool(false)])
            .with_label("Include in Presentation")
            .with_category("Behavior")
            .with_order(2),
    );
    attrs.add_attribute(
        Attribute::new("ignore_click", AttrKind::Bool, vec![Atom::Bool(false)])
            .with_label("Ignore Click")
            .with_category("Behavior")
            .with_order(3),
    );
}
