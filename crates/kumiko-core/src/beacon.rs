//! Named broadcast channels.
//!
//! A [`Beacon`] lets two boxes talk without a wire: receivers bind themselves as
//! [`Castaway`]s, senders ask the beacon for its live castaways and deliver to
//! each one. The beacon only keeps the list; it never delivers anything itself.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::atom::Atom;
use crate::symbol::Symbol;

/// Listener bound to a [`Beacon`].
pub trait Castaway: Send + Sync {
    /// Delivers a message sent through `beacon`.
    fn receive_beacon(&self, beacon: &Beacon, atoms: &[Atom]);
}

/// A named channel holding weak references to its castaways.
pub struct Beacon {
    name: Symbol,
    castaways: Mutex<Vec<Weak<dyn Castaway>>>,
}

impl Beacon {
    fn new(name: Symbol) -> Self {
        Self {
            name,
            castaways: Mutex::new(Vec::new()),
        }
    }

    /// Channel name.
    pub fn name(&self) -> Symbol {
        self.name
    }

    /// Binds `castaway`. Binding the same castaway twice keeps one registration.
    pub fn bind<C: Castaway + 'static>(&self, castaway: &Arc<C>) {
        let weak = Arc::downgrade(castaway);
        let weak: Weak<dyn Castaway> = weak;
        let mut castaways = self.castaways.lock();
        castaways.retain(|c| c.strong_count() > 0);
        if !castaways.iter().any(|c| c.ptr_eq(&weak)) {
            castaways.push(weak);
        }
    }

    /// Unbinds `castaway`.
    pub fn unbind<C: Castaway + 'static>(&self, castaway: &Arc<C>) {
        let weak = Arc::downgrade(castaway);
        let weak: Weak<dyn Castaway> = weak;
        self.castaways
            .lock()
            .retain(|c| c.strong_count() > 0 && !c.ptr_eq(&weak));
    }

    /// Currently live castaways, in binding order.
    pub fn castaways(&self) -> Vec<Arc<dyn Castaway>> {
        self.castaways.lock().iter().filter_map(Weak::upgrade).collect()
    }

    /// Delivers `atoms` to every live castaway.
    ///
    /// The castaway list is copied first, so a castaway may bind or unbind
    /// during delivery.
    pub fn broadcast(&self, atoms: &[Atom]) -> usize {
        let targets = self.castaways();
        for castaway in &targets {
            castaway.receive_beacon(self, atoms);
        }
        targets.len()
    }
}

impl std::fmt::Debug for Beacon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Beacon")
            .field("name", &self.name)
            .field("castaways", &self.castaways.lock().len())
            .finish()
    }
}

/// Name-keyed lookup-or-create table of beacons.
#[derive(Default)]
pub struct BeaconRegistry {
    beacons: Mutex<HashMap<Symbol, Arc<Beacon>>>,
}

impl BeaconRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the beacon called `name`, creating it on first request.
    pub fn create_beacon(&self, name: impl Into<Symbol>) -> Arc<Beacon> {
        let name = name.into();
        Arc::clone(
            self.beacons
                .lock()
                .entry(name)
                .or_insert_with(|| Arc::new(Beacon::new(name))),
        )
    }

    /// Returns the beacon called `name` if it exists.
    pub fn beacon(&self, name: impl Into<Symbol>) -> Option<Arc<Beacon>> {
        self.beacons.lock().get(&name.into()).cloned()
    }

    /// Number of beacons created so far.
    pub fn len(&self) -> usize {
        self.beacons.lock().len()
    }

    /// Returns true if no beacon exists.
    pub fn is_empty(&self) -> bool {
        self.beacons.lock().is_empty()
    }

    /// Drops every beacon.
    pub fn clear(&self) {
        self.beacons.lock().clear();
    }
}
