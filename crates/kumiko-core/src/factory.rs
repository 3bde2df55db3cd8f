//! Object factory: name → constructor registry.
//!
//! The factory also owns the process-level services boxes share: the beacon
//! registry and the scheduler thread behind every [`Clock`](crate::Clock).
//! Both are torn down by [`Factory::shutdown`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use kumiko_core::{Atom, Construction, Context, Factory, Inlet, Object, ObjectCategory,
//!     ObjectDescriptor, PatchError, Patcher};
//!
//! struct Sink;
//!
//! impl Object for Sink {
//!     fn receive(&self, _ctx: &Context<'_>, _inlet: usize, _atoms: &[Atom]) -> bool {
//!         true
//!     }
//! }
//!
//! fn sink(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
//!     c.add_inlet(Inlet::control("anything"));
//!     Ok(Arc::new(Sink))
//! }
//!
//! let factory = Arc::new(Factory::new());
//! factory.register(ObjectDescriptor::new("sink", "Swallows messages", ObjectCategory::Control), sink);
//!
//! let patcher = Patcher::new(factory);
//! let id = patcher.create_from_text("sink").unwrap();
//! assert!(patcher.send(id, 0, &[Atom::Long(1)]).unwrap());
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use crate::beacon::{Beacon, BeaconRegistry};
use crate::clock::Scheduler;
use crate::error::PatchError;
use crate::graph::{Construction, Object};
use crate::symbol::Symbol;

/// Builds a box: declares ports and attributes on the construction and returns
/// the object.
pub type Constructor = fn(&mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError>;

/// Category of object for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectCategory {
    /// Message arithmetic, routing and printing.
    Control,
    /// Signal generators and processors.
    Signal,
    /// Clock-driven objects.
    Timing,
    /// Wireless messaging over beacons.
    Communication,
}

impl ObjectCategory {
    /// Human-readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            ObjectCategory::Control => "Control",
            ObjectCategory::Signal => "Signal",
            ObjectCategory::Timing => "Timing",
            ObjectCategory::Communication => "Communication",
        }
    }
}

/// Describes a registered object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    /// Name used to create the object.
    pub name: Symbol,
    /// One-line description.
    pub description: &'static str,
    /// Listing category.
    pub category: ObjectCategory,
}

impl ObjectDescriptor {
    /// Creates a descriptor.
    pub fn new(name: &str, description: &'static str, category: ObjectCategory) -> Self {
        Self {
            name: Symbol::intern(name),
            description,
            category,
        }
    }
}

struct Registration {
    descriptor: ObjectDescriptor,
    constructor: Constructor,
    alias_of: Option<Symbol>,
}

/// Registry of object constructors plus shared box services.
#[derive(Default)]
pub struct Factory {
    objects: RwLock<IndexMap<Symbol, Registration>>,
    beacons: BeaconRegistry,
    scheduler: Mutex<Option<Arc<Scheduler>>>,
}

impl Factory {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `constructor` under `descriptor.name`.
    ///
    /// Returns false (and logs an error) if the name is taken.
    pub fn register(&self, descriptor: ObjectDescriptor, constructor: Constructor) -> bool {
        let name = descriptor.name;
        let mut objects = self.objects.write();
        if objects.contains_key(&name) {
            tracing::error!(object = %name, "object already registered");
            return false;
        }
        objects.insert(
            name,
            Registration {
                descriptor,
                constructor,
                alias_of: None,
            },
        );
        true
    }

    /// Makes `alias` create the same object as `target`.
    pub fn register_alias(&self, alias: &str, target: &str) -> bool {
        let alias = Symbol::intern(alias);
        let target = Symbol::intern(target);
        let mut objects = self.objects.write();
        if objects.contains_key(&alias) {
            tracing::error!(object = %alias, "object already registered");
            return false;
        }
        let Some(original) = objects.get(&target) else {
            tracing::error!(object = %target, alias = %alias, "alias target not registered");
            return false;
        };
        let registration = Registration {
            descriptor: original.descriptor.clone(),
            constructor: original.constructor,
            alias_of: Some(target),
        };
        objects.insert(alias, registration);
        true
    }

    /// True if `name` can be created.
    pub fn has(&self, name: impl Into<Symbol>) -> bool {
        self.objects.read().contains_key(&name.into())
    }

    /// Constructor registered under `name`.
    pub fn constructor(&self, name: impl Into<Symbol>) -> Option<Constructor> {
        self.objects.read().get(&name.into()).map(|r| r.constructor)
    }

    /// Descriptor registered under `name` (aliases report their target's).
    pub fn descriptor(&self, name: impl Into<Symbol>) -> Option<ObjectDescriptor> {
        self.objects
            .read()
            .get(&name.into())
            .map(|r| r.descriptor.clone())
    }

    /// Every creatable name, aliases included, in registration order.
    pub fn names(&self) -> Vec<Symbol> {
        self.objects.read().keys().copied().collect()
    }

    /// Descriptors of registered objects, aliases excluded.
    pub fn descriptors(&self) -> Vec<ObjectDescriptor> {
        self.objects
            .read()
            .values()
            .filter(|r| r.alias_of.is_none())
            .map(|r| r.descriptor.clone())
            .collect()
    }

    /// Descriptors in one category.
    pub fn descriptors_in_category(&self, category: ObjectCategory) -> Vec<ObjectDescriptor> {
        self.descriptors()
            .into_iter()
            .filter(|d| d.category == category)
            .collect()
    }

    /// Number of registered names, aliases included.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    // --- Services ---

    /// Looks up or creates the beacon called `name`.
    pub fn create_beacon(&self, name: impl Into<Symbol>) -> Arc<Beacon> {
        self.beacons.create_beacon(name)
    }

    /// The beacon registry.
    pub fn beacons(&self) -> &BeaconRegistry {
        &self.beacons
    }

    /// The scheduler, started on first use.
    pub fn scheduler(&self) -> Result<Arc<Scheduler>, PatchError> {
        let mut scheduler = self.scheduler.lock();
        if let Some(existing) = scheduler.as_ref() {
            return Ok(Arc::clone(existing));
        }
        let started = Arc::new(Scheduler::new()?);
        *scheduler = Some(Arc::clone(&started));
        Ok(started)
    }

    /// Stops the scheduler and drops every beacon. Registrations are kept;
    /// services restart on next use.
    pub fn shutdown(&self) {
        if let Some(scheduler) = self.scheduler.lock().take() {
            scheduler.shutdown();
        }
        self.beacons.clear();
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("objects", &self.len())
            .field("beacons", &self.beacons.len())
            .finish()
    }
}
