//! Typed, observable properties attached to graph nodes.
//!
//! An [`AttributeManager`] owns a set of named [`Attribute`]s and a list of weakly
//! held [`AttributeListener`]s. All mutation goes through the manager so that
//! change notification happens in exactly one place.
//!
//! # Locking
//!
//! The manager holds two independent locks: one for the attribute map and one for
//! the listener list. They are never held at the same time, and neither is held
//! while a listener runs, so a listener may freely call back into the manager
//! (read another attribute, or even set one) from inside its callback.
//!
//! # Example
//!
//! ```rust
//! use kumiko_core::{Atom, Attribute, AttrKind, AttributeManager};
//!
//! let attrs = AttributeManager::new();
//! attrs.add_attribute(
//!     Attribute::new("gain", AttrKind::Double, vec![Atom::Double(1.0)]).with_range(0.0, 2.0),
//! );
//! assert!(attrs.set_attribute_value("gain", &[Atom::Double(5.0)]));
//! assert_eq!(attrs.attribute_value("gain"), vec![Atom::Double(2.0)]);
//! ```

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::atom::Atom;
use crate::dico::Dico;
use crate::symbol::Symbol;

/// Reserved Dico key listing the attributes that were written frozen.
pub const FROZEN_ATTRIBUTES_KEY: &str = "frozen_attributes";

/// Behavior flags for an attribute.
///
/// ```rust
/// use kumiko_core::AttrFlags;
///
/// let flags = AttrFlags::INVISIBLE.union(AttrFlags::UNSAVED);
/// assert!(flags.contains(AttrFlags::UNSAVED));
/// assert!(!flags.contains(AttrFlags::SILENT));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttrFlags(u8);

impl AttrFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Not shown by inspectors.
    pub const INVISIBLE: Self = Self(1 << 0);
    /// Rejects value changes through the setter.
    pub const DISABLED: Self = Self(1 << 1);
    /// Skipped by [`AttributeManager::write`] and [`AttributeManager::read`].
    pub const UNSAVED: Self = Self(1 << 2);
    /// Changes are stored but listeners are not notified.
    pub const SILENT: Self = Self(1 << 3);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns `self` with the bits of `other` cleared.
    #[inline]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Raw bit representation.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for AttrFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Value kind of an attribute, which decides how incoming atoms are conformed.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrKind {
    /// A single boolean.
    Bool,
    /// A single integer.
    Long,
    /// A single float.
    Double,
    /// A single symbol.
    Symbol,
    /// One of a fixed list of symbols, stored as its index.
    Enum(Vec<Symbol>),
    /// Two floats (x, y).
    Point,
    /// Two floats (width, height); honors the minimum and the ratio.
    Size,
    /// Four floats (x, y, width, height).
    Rect,
    /// RGBA floats in `[0, 1]`; three components get an opaque alpha.
    Color,
    /// Verbatim atom list.
    List,
}

impl AttrKind {
    /// Short name used in inspectors and the console.
    pub fn name(&self) -> &'static str {
        match self {
            AttrKind::Bool => "bool",
            AttrKind::Long => "long",
            AttrKind::Double => "double",
            AttrKind::Symbol => "symbol",
            AttrKind::Enum(_) => "enum",
            AttrKind::Point => "point",
            AttrKind::Size => "size",
            AttrKind::Rect => "rect",
            AttrKind::Color => "color",
            AttrKind::List => "list",
        }
    }

    fn components(&self) -> usize {
        match self {
            AttrKind::Point | AttrKind::Size => 2,
            AttrKind::Rect | AttrKind::Color => 4,
            _ => 1,
        }
    }

    fn zero(&self) -> Vec<Atom> {
        match self {
            AttrKind::Bool => vec![Atom::Bool(false)],
            AttrKind::Long | AttrKind::Enum(_) => vec![Atom::Long(0)],
            AttrKind::Double => vec![Atom::Double(0.0)],
            AttrKind::Symbol => vec![Atom::Symbol(Symbol::empty())],
            AttrKind::Point | AttrKind::Size | AttrKind::Rect => {
                vec![Atom::Double(0.0); self.components()]
            }
            AttrKind::Color => vec![
                Atom::Double(0.0),
                Atom::Double(0.0),
                Atom::Double(0.0),
                Atom::Double(1.0),
            ],
            AttrKind::List => Vec::new(),
        }
    }
}

/// Event delivered to [`AttributeListener`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeEvent {
    /// The stored value changed.
    ValueChanged,
    /// The behavior flags changed.
    BehaviorChanged,
}

/// Receives attribute change notifications.
pub trait AttributeListener: Send + Sync {
    /// Called after `name` changed. No manager lock is held during the call.
    fn attribute_changed(&self, manager: &AttributeManager, name: Symbol, event: AttributeEvent);
}

/// A typed, named property.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: Symbol,
    label: String,
    category: Symbol,
    order: i64,
    kind: AttrKind,
    min: Option<f64>,
    max: Option<f64>,
    ratio: Option<f64>,
    value: Vec<Atom>,
    default: Vec<Atom>,
    frozen: Option<Vec<Atom>>,
    flags: AttrFlags,
}

impl Attribute {
    /// Creates an attribute whose current value is its (conformed) default.
    pub fn new(name: impl Into<Symbol>, kind: AttrKind, default: Vec<Atom>) -> Self {
        let name = name.into();
        let mut attr = Self {
            name,
            label: name.as_str().to_string(),
            category: Symbol::intern("Default"),
            order: 0,
            value: kind.zero(),
            default: Vec::new(),
            kind,
            min: None,
            max: None,
            ratio: None,
            frozen: None,
            flags: AttrFlags::NONE,
        };
        attr.default = attr.conform(&default).unwrap_or_else(|| attr.kind.zero());
        attr.value.clone_from(&attr.default);
        attr
    }

    /// Sets the human-readable label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the inspector category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<Symbol>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the ordering key within the category.
    #[must_use]
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    /// Sets both numeric limits and re-applies the default.
    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.reconform_default();
        self
    }

    /// Sets the lower numeric limit and re-applies the default.
    #[must_use]
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self.reconform_default();
        self
    }

    /// Sets a height/width ratio for [`AttrKind::Size`] attributes.
    #[must_use]
    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = (ratio > 0.0).then_some(ratio);
        self.reconform_default();
        self
    }

    /// Sets the behavior flags.
    #[must_use]
    pub fn with_flags(mut self, flags: AttrFlags) -> Self {
        self.flags = flags;
        self
    }

    fn reconform_default(&mut self) {
        if let Some(default) = self.conform(&self.default) {
            self.default = default;
        }
        self.value.clone_from(&self.default);
    }

    /// Attribute name.
    pub fn name(&self) -> Symbol {
        self.name
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Inspector category.
    pub fn category(&self) -> Symbol {
        self.category
    }

    /// Ordering key within the category.
    pub fn order(&self) -> i64 {
        self.order
    }

    /// Value kind.
    pub fn kind(&self) -> &AttrKind {
        &self.kind
    }

    /// Current value.
    pub fn value(&self) -> &[Atom] {
        &self.value
    }

    /// Default value.
    pub fn default_value(&self) -> &[Atom] {
        &self.default
    }

    /// Frozen snapshot, if any.
    pub fn frozen_value(&self) -> Option<&[Atom]> {
        self.frozen.as_deref()
    }

    /// Behavior flags.
    pub fn flags(&self) -> AttrFlags {
        self.flags
    }

    /// For [`AttrKind::Enum`], the symbol at the stored index.
    pub fn enum_symbol(&self) -> Option<Symbol> {
        match &self.kind {
            AttrKind::Enum(items) => {
                let index = usize::try_from(self.value.first()?.as_long()).ok()?;
                items.get(index).copied()
            }
            _ => None,
        }
    }

    fn clamp(&self, value: f64) -> f64 {
        let mut value = value;
        if let Some(min) = self.min {
            value = value.max(min);
        }
        if let Some(max) = self.max {
            value = value.min(max);
        }
        value
    }

    /// Converts incoming atoms to this attribute's stored shape.
    ///
    /// Returns `None` when the atoms cannot express a value of this kind.
    pub fn conform(&self, atoms: &[Atom]) -> Option<Vec<Atom>> {
        match &self.kind {
            AttrKind::List => Some(atoms.to_vec()),
            AttrKind::Bool => atoms.first().map(|a| vec![Atom::Bool(a.as_bool())]),
            AttrKind::Long => {
                let first = atoms.first().filter(|a| a.is_number())?;
                let mut value = first.as_long();
                if let Some(min) = self.min
                    && (value as f64) < min
                {
                    value = min.ceil() as i64;
                }
                if let Some(max) = self.max
                    && (value as f64) > max
                {
                    value = max.floor() as i64;
                }
                Some(vec![Atom::Long(value)])
            }
            AttrKind::Double => {
                let first = atoms.first().filter(|a| a.is_number())?;
                Some(vec![Atom::Double(self.clamp(first.as_double()))])
            }
            AttrKind::Symbol => {
                let first = atoms.first()?;
                let symbol = if first.is_symbol() {
                    first.as_symbol()
                } else {
                    Symbol::intern(&first.to_text())
                };
                Some(vec![Atom::Symbol(symbol)])
            }
            AttrKind::Enum(items) => {
                let first = atoms.first()?;
                let index = if first.is_symbol() {
                    items.iter().position(|s| *s == first.as_symbol())?
                } else if first.is_number() && !items.is_empty() {
                    usize::try_from(first.as_long().max(0))
                        .unwrap_or(0)
                        .min(items.len() - 1)
                } else {
                    return None;
                };
                Some(vec![Atom::from(index)])
            }
            AttrKind::Point | AttrKind::Rect => {
                let numbers = self.numbers(atoms)?;
                Some(numbers.into_iter().map(Atom::Double).collect())
            }
            AttrKind::Size => {
                let mut numbers = self.numbers(atoms)?;
                if let Some(ratio) = self.ratio {
                    numbers[1] = self.clamp(numbers[0] * ratio);
                }
                Some(numbers.into_iter().map(Atom::Double).collect())
            }
            AttrKind::Color => {
                let given: Vec<f64> = atoms
                    .iter()
                    .take_while(|a| a.is_number())
                    .take(4)
                    .map(Atom::as_double)
                    .collect();
                if given.len() < 3 {
                    return None;
                }
                let alpha = given.get(3).copied().unwrap_or(1.0);
                Some(
                    [given[0], given[1], given[2], alpha]
                        .into_iter()
                        .map(|c| Atom::Double(c.clamp(0.0, 1.0)))
                        .collect(),
                )
            }
        }
    }

    /// Leading numeric components, missing ones taken from the current value.
    fn numbers(&self, atoms: &[Atom]) -> Option<Vec<f64>> {
        let count = self.kind.components();
        let given: Vec<f64> = atoms
            .iter()
            .take_while(|a| a.is_number())
            .take(count)
            .map(Atom::as_double)
            .collect();
        if given.is_empty() {
            return None;
        }
        Some(
            (0..count)
                .map(|i| {
                    let raw = given
                        .get(i)
                        .copied()
                        .unwrap_or_else(|| self.value.get(i).map_or(0.0, Atom::as_double));
                    self.clamp(raw)
                })
                .collect(),
        )
    }
}

struct Binding {
    listener: Weak<dyn AttributeListener>,
    /// Empty means every attribute.
    names: Vec<Symbol>,
}

impl Binding {
    fn wants(&self, name: Symbol) -> bool {
        self.names.is_empty() || self.names.contains(&name)
    }
}

/// Owner of a set of attributes and their listeners.
#[derive(Default)]
pub struct AttributeManager {
    attrs: Mutex<IndexMap<Symbol, Attribute>>,
    listeners: Mutex<Vec<Binding>>,
}

impl AttributeManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an attribute, replacing any previous one with the same name.
    pub fn add_attribute(&self, attribute: Attribute) {
        self.attrs.lock().insert(attribute.name, attribute);
    }

    /// Removes an attribute. Returns false if it was not declared.
    pub fn remove_attribute(&self, name: impl Into<Symbol>) -> bool {
        self.attrs.lock().shift_remove(&name.into()).is_some()
    }

    /// Returns true if `name` is declared.
    pub fn has_attribute(&self, name: impl Into<Symbol>) -> bool {
        self.attrs.lock().contains_key(&name.into())
    }

    /// Snapshot of one attribute.
    pub fn attribute(&self, name: impl Into<Symbol>) -> Option<Attribute> {
        self.attrs.lock().get(&name.into()).cloned()
    }

    /// Declared names in declaration order.
    pub fn attribute_names(&self) -> Vec<Symbol> {
        self.attrs.lock().keys().copied().collect()
    }

    /// Current value of `name`, or an empty list if undeclared.
    pub fn attribute_value(&self, name: impl Into<Symbol>) -> Vec<Atom> {
        self.attrs
            .lock()
            .get(&name.into())
            .map(|a| a.value.clone())
            .unwrap_or_default()
    }

    /// Sets the value of `name`.
    ///
    /// Returns true only if the stored value changed. Undeclared or disabled
    /// attributes and atoms that do not fit the kind are rejected. Listeners are
    /// notified after the attribute lock is released.
    pub fn set_attribute_value(&self, name: impl Into<Symbol>, atoms: &[Atom]) -> bool {
        self.store(name.into(), atoms, true)
    }

    fn store(&self, name: Symbol, atoms: &[Atom], respect_disabled: bool) -> bool {
        let notify = {
            let mut attrs = self.attrs.lock();
            let Some(attr) = attrs.get_mut(&name) else {
                tracing::debug!(attribute = %name, "set on undeclared attribute");
                return false;
            };
            if respect_disabled && attr.flags.contains(AttrFlags::DISABLED) {
                return false;
            }
            let Some(value) = attr.conform(atoms) else {
                tracing::debug!(attribute = %name, kind = attr.kind.name(), "value does not fit attribute kind");
                return false;
            };
            if same_atoms(&value, &attr.value) {
                return false;
            }
            attr.value = value;
            !attr.flags.contains(AttrFlags::SILENT)
        };
        if notify {
            self.notify(name, AttributeEvent::ValueChanged);
        }
        true
    }

    /// Sets or clears behavior flags on `name`. Returns true if the flags changed.
    pub fn set_attribute_behavior(
        &self,
        name: impl Into<Symbol>,
        flags: AttrFlags,
        enabled: bool,
    ) -> bool {
        let name = name.into();
        {
            let mut attrs = self.attrs.lock();
            let Some(attr) = attrs.get_mut(&name) else {
                return false;
            };
            let updated = if enabled {
                attr.flags.union(flags)
            } else {
                attr.flags.difference(flags)
            };
            if updated == attr.flags {
                return false;
            }
            attr.flags = updated;
        }
        self.notify(name, AttributeEvent::BehaviorChanged);
        true
    }

    /// Restores the default value of `name`. Returns true if the value changed.
    pub fn reset_attribute(&self, name: impl Into<Symbol>) -> bool {
        let name = name.into();
        let default = match self.attrs.lock().get(&name) {
            Some(attr) => attr.default.clone(),
            None => return false,
        };
        self.store(name, &default, false)
    }

    /// Restores every default value.
    pub fn reset_all(&self) {
        for name in self.attribute_names() {
            self.reset_attribute(name);
        }
    }

    /// Records (or clears) a frozen snapshot of the current value.
    pub fn freeze_attribute(&self, name: impl Into<Symbol>, frozen: bool) -> bool {
        let mut attrs = self.attrs.lock();
        let Some(attr) = attrs.get_mut(&name.into()) else {
            return false;
        };
        attr.frozen = frozen.then(|| attr.value.clone());
        true
    }

    /// Visible attributes grouped by category (first-declared category first),
    /// each group sorted by ordering key then name.
    pub fn attributes_by_category(&self) -> Vec<(Symbol, Vec<Attribute>)> {
        let mut groups: IndexMap<Symbol, Vec<Attribute>> = IndexMap::new();
        for attr in self.attrs.lock().values() {
            if !attr.flags.contains(AttrFlags::INVISIBLE) {
                groups.entry(attr.category).or_default().push(attr.clone());
            }
        }
        groups
            .into_iter()
            .map(|(category, mut attrs)| {
                attrs.sort_by(|a, b| a.order.cmp(&b.order).then(a.name.cmp(&b.name)));
                (category, attrs)
            })
            .collect()
    }

    // --- Listeners ---

    /// Binds `listener`, optionally filtered to `names` (empty = all).
    ///
    /// Binding an already-bound listener replaces its filter.
    pub fn bind<L: AttributeListener + 'static>(&self, listener: &Arc<L>, names: &[Symbol]) {
        let weak = Arc::downgrade(listener);
        let weak: Weak<dyn AttributeListener> = weak;
        let mut listeners = self.listeners.lock();
        listeners.retain(|b| b.listener.strong_count() > 0);
        if let Some(existing) = listeners.iter_mut().find(|b| b.listener.ptr_eq(&weak)) {
            existing.names = names.to_vec();
        } else {
            listeners.push(Binding {
                listener: weak,
                names: names.to_vec(),
            });
        }
    }

    /// Unbinds `listener`.
    pub fn unbind<L: AttributeListener + 'static>(&self, listener: &Arc<L>) {
        let weak = Arc::downgrade(listener);
        let weak: Weak<dyn AttributeListener> = weak;
        self.listeners
            .lock()
            .retain(|b| b.listener.strong_count() > 0 && !b.listener.ptr_eq(&weak));
    }

    /// Number of live bound listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|b| b.listener.strong_count() > 0)
            .count()
    }

    fn notify(&self, name: Symbol, event: AttributeEvent) {
        let targets: Vec<Arc<dyn AttributeListener>> = {
            let mut listeners = self.listeners.lock();
            listeners.retain(|b| b.listener.strong_count() > 0);
            listeners
                .iter()
                .filter(|b| b.wants(name))
                .filter_map(|b| b.listener.upgrade())
                .collect()
        };
        for listener in targets {
            listener.attribute_changed(self, name, event);
        }
    }

    // --- Persistence ---

    /// Writes every saved attribute into `dico`.
    ///
    /// Frozen attributes write their snapshot and are listed under
    /// [`FROZEN_ATTRIBUTES_KEY`].
    pub fn write(&self, dico: &mut Dico) {
        let attrs = self.attrs.lock();
        let mut frozen_names = Vec::new();
        for attr in attrs.values() {
            if attr.flags.contains(AttrFlags::UNSAVED) {
                continue;
            }
            match &attr.frozen {
                Some(snapshot) => {
                    dico.set(attr.name, snapshot.clone());
                    frozen_names.push(Atom::Symbol(attr.name));
                }
                None => dico.set(attr.name, attr.value.clone()),
            }
        }
        if !frozen_names.is_empty() {
            dico.set(FROZEN_ATTRIBUTES_KEY, frozen_names);
        }
    }

    /// Applies every saved attribute present in `dico`, restoring frozen snapshots.
    pub fn read(&self, dico: &Dico) {
        self.restore(dico, false);
    }

    /// Applies every declared attribute present in `dico`, saved or not.
    ///
    /// Used on a box's construction description; frozen snapshots listed
    /// there are restored as by [`read`](Self::read).
    pub fn apply(&self, dico: &Dico) {
        self.restore(dico, true);
    }

    fn restore(&self, dico: &Dico, include_unsaved: bool) {
        let frozen: Vec<Symbol> = dico
            .get(FROZEN_ATTRIBUTES_KEY)
            .iter()
            .filter(|a| a.is_symbol())
            .map(Atom::as_symbol)
            .collect();
        let names: Vec<Symbol> = self
            .attrs
            .lock()
            .values()
            .filter(|a| include_unsaved || !a.flags.contains(AttrFlags::UNSAVED))
            .map(|a| a.name)
            .collect();
        for name in names {
            if !dico.has(name) {
                continue;
            }
            self.store(name, dico.get(name), false);
            if frozen.contains(&name) {
                self.freeze_attribute(name, true);
            }
        }
    }
}

/// Value equality for change detection: a NaN matches a NaN.
fn same_atoms(a: &[Atom], b: &[Atom]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|pair| match pair {
            (Atom::Double(x), Atom::Double(y)) => x == y || (x.is_nan() && y.is_nan()),
            (Atom::Vector(x), Atom::Vector(y)) => same_atoms(x, y),
            (x, y) => x == y,
        })
}

impl std::fmt::Debug for AttributeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeManager")
            .field("attributes", &self.attribute_names())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        hits: AtomicUsize,
        seen_other: Mutex<Vec<Atom>>,
    }

    impl AttributeListener for Counter {
        fn attribute_changed(&self, manager: &AttributeManager, name: Symbol, event: AttributeEvent) {
            if event == AttributeEvent::ValueChanged {
                self.hits.fetch_add(1, Ordering::SeqCst);
            }
            // Re-entrant read of a different attribute.
            if name.as_str() == "gain" {
                *self.seen_other.lock() = manager.attribute_value("mode");
            }
        }
    }

    fn manager() -> AttributeManager {
        let attrs = AttributeManager::new();
        attrs.add_attribute(
            Attribute::new("gain", AttrKind::Double, vec![Atom::Double(1.0)]).with_range(0.0, 2.0),
        );
        attrs.add_attribute(Attribute::new(
            "mode",
            AttrKind::Enum(vec![Symbol::from("lin"), Symbol::from("log")]),
            vec![Atom::from("log")],
        ));
        attrs
    }

    #[test]
    fn test_unchanged_value_does_not_notify() {
        let attrs = manager();
        let counter = Arc::new(Counter::default());
        attrs.bind(&counter, &[]);

        assert!(!attrs.set_attribute_value("gain", &[Atom::Double(1.0)]));
        assert_eq!(counter.hits.load(Ordering::SeqCst), 0);

        assert!(attrs.set_attribute_value("gain", &[Atom::Double(0.5)]));
        assert_eq!(counter.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_reenters_manager() {
        let attrs = manager();
        let counter = Arc::new(Counter::default());
        attrs.bind(&counter, &[]);
        attrs.set_attribute_value("gain", &[Atom::Double(0.25)]);
        assert_eq!(*counter.seen_other.lock(), vec![Atom::Long(1)]);
    }

    #[test]
    fn test_listener_writes_back_without_deadlock() {
        struct Follower;
        impl AttributeListener for Follower {
            fn attribute_changed(&self, manager: &AttributeManager, name: Symbol, _: AttributeEvent) {
                if name.as_str() == "gain" {
                    let gain = manager.attribute_value("gain");
                    manager.set_attribute_value("mirror", &gain);
                }
            }
        }
        let attrs = manager();
        attrs.add_attribute(Attribute::new("mirror", AttrKind::Double, vec![]));
        let follower = Arc::new(Follower);
        attrs.bind(&follower, &[]);
        attrs.set_attribute_value("gain", &[Atom::Double(1.5)]);
        assert_eq!(attrs.attribute_value("mirror"), vec![Atom::Double(1.5)]);
    }

    #[test]
    fn test_filtered_listener() {
        let attrs = manager();
        let counter = Arc::new(Counter::default());
        attrs.bind(&counter, &[Symbol::from("mode")]);
        attrs.set_attribute_value("gain", &[Atom::Double(0.1)]);
        assert_eq!(counter.hits.load(Ordering::SeqCst), 0);
        attrs.set_attribute_value("mode", &[Atom::from("lin")]);
        assert_eq!(counter.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bind_twice_keeps_one_registration() {
        let attrs = manager();
        let counter = Arc::new(Counter::default());
        attrs.bind(&counter, &[]);
        attrs.bind(&counter, &[]);
        assert_eq!(attrs.listener_count(), 1);
        attrs.set_attribute_value("gain", &[Atom::Double(0.3)]);
        assert_eq!(counter.hits.load(Ordering::SeqCst), 1);

        attrs.unbind(&counter);
        attrs.set_attribute_value("gain", &[Atom::Double(0.4)]);
        assert_eq!(counter.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let attrs = manager();
        let counter = Arc::new(Counter::default());
        attrs.bind(&counter, &[]);
        drop(counter);
        assert_eq!(attrs.listener_count(), 0);
        assert!(attrs.set_attribute_value("gain", &[Atom::Double(0.9)]));
    }

    #[test]
    fn test_disabled_and_silent() {
        let attrs = manager();
        let counter = Arc::new(Counter::default());
        attrs.bind(&counter, &[]);

        attrs.set_attribute_behavior("gain", AttrFlags::DISABLED, true);
        assert!(!attrs.set_attribute_value("gain", &[Atom::Double(0.2)]));
        attrs.set_attribute_behavior("gain", AttrFlags::DISABLED, false);

        attrs.set_attribute_behavior("gain", AttrFlags::SILENT, true);
        assert!(attrs.set_attribute_value("gain", &[Atom::Double(0.2)]));
        assert_eq!(counter.hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_enum_by_symbol_and_index() {
        let attrs = manager();
        assert_eq!(
            attrs.attribute("mode").and_then(|a| a.enum_symbol()),
            Some(Symbol::from("log"))
        );
        assert!(attrs.set_attribute_value("mode", &[Atom::Long(0)]));
        assert!(!attrs.set_attribute_value("mode", &[Atom::from("cubic")]));
        assert!(attrs.set_attribute_value("mode", &[Atom::Long(99)]));
        assert_eq!(attrs.attribute_value("mode"), vec![Atom::Long(1)]);
    }

    #[test]
    fn test_geometry_constraints() {
        let size = Attribute::new("size", AttrKind::Size, vec![Atom::Long(100), Atom::Long(20)])
            .with_min(10.0);
        assert_eq!(
            size.conform(&[Atom::Long(4), Atom::Long(50)]),
            Some(vec![Atom::Double(10.0), Atom::Double(50.0)])
        );
        // A single component keeps the other from the current value.
        assert_eq!(
            size.conform(&[Atom::Long(30)]),
            Some(vec![Atom::Double(30.0), Atom::Double(20.0)])
        );

        let square = Attribute::new("size", AttrKind::Size, vec![Atom::Long(40), Atom::Long(0)])
            .with_ratio(1.0);
        assert_eq!(square.value(), &[Atom::Double(40.0), Atom::Double(40.0)]);

        let color = Attribute::new("color", AttrKind::Color, vec![]);
        assert_eq!(
            color.conform(&[Atom::Double(2.0), Atom::Double(0.5), Atom::Long(0)]),
            Some(vec![
                Atom::Double(1.0),
                Atom::Double(0.5),
                Atom::Double(0.0),
                Atom::Double(1.0)
            ])
        );
        assert_eq!(color.conform(&[Atom::Double(0.5)]), None);
    }

    #[test]
    fn test_reset_restores_default() {
        let attrs = manager();
        attrs.set_attribute_value("gain", &[Atom::Double(0.1)]);
        assert!(attrs.reset_attribute("gain"));
        assert_eq!(attrs.attribute_value("gain"), vec![Atom::Double(1.0)]);
        assert!(!attrs.reset_attribute("gain"));
    }

    #[test]
    fn test_write_read_with_frozen_and_unsaved() {
        let attrs = manager();
        attrs.add_attribute(
            Attribute::new("scratch", AttrKind::Long, vec![Atom::Long(7)])
                .with_flags(AttrFlags::UNSAVED),
        );
        attrs.set_attribute_value("gain", &[Atom::Double(0.5)]);
        attrs.freeze_attribute("gain", true);
        attrs.set_attribute_value("gain", &[Atom::Double(1.5)]);

        let mut dico = Dico::new();
        attrs.write(&mut dico);
        assert!(!dico.has("scratch"));
        assert_eq!(dico.get_atom("gain"), Atom::Double(0.5));
        assert_eq!(dico.get(FROZEN_ATTRIBUTES_KEY), &[Atom::from("gain")]);

        let restored = manager();
        restored.read(&dico);
        let gain = restored.attribute("gain").unwrap();
        assert_eq!(gain.value(), &[Atom::Double(0.5)]);
        assert_eq!(gain.frozen_value(), Some(&[Atom::Double(0.5)][..]));
    }

    #[test]
    fn test_apply_sets_unsaved_and_frozen() {
        let attrs = manager();
        attrs.add_attribute(
            Attribute::new("scratch", AttrKind::Long, vec![Atom::Long(0)])
                .with_flags(AttrFlags::UNSAVED),
        );
        let mut dico = Dico::new();
        dico.set_atom("scratch", Atom::Long(7));
        dico.set_atom("gain", Atom::Double(0.25));
        dico.set(FROZEN_ATTRIBUTES_KEY, vec![Atom::from("gain")]);

        attrs.apply(&dico);
        assert_eq!(attrs.attribute_value("scratch"), vec![Atom::Long(7)]);
        let gain = attrs.attribute("gain").unwrap();
        assert_eq!(gain.frozen_value(), Some(&[Atom::Double(0.25)][..]));

        // Persistence still skips unsaved attributes.
        let restored = manager();
        restored.add_attribute(
            Attribute::new("scratch", AttrKind::Long, vec![Atom::Long(0)])
                .with_flags(AttrFlags::UNSAVED),
        );
        restored.read(&dico);
        assert_eq!(restored.attribute_value("scratch"), vec![Atom::Long(0)]);
    }

    #[test]
    fn test_long_keeps_full_precision() {
        let attrs = AttributeManager::new();
        attrs.add_attribute(Attribute::new("id", AttrKind::Long, vec![Atom::Long(0)]));
        attrs.add_attribute(
            Attribute::new("count", AttrKind::Long, vec![Atom::Long(0)]).with_range(-3.5, 9.5),
        );

        assert!(attrs.set_attribute_value("id", &[Atom::Long(9_007_199_254_740_993)]));
        assert_eq!(attrs.attribute_value("id"), vec![Atom::Long(9_007_199_254_740_993)]);
        assert!(attrs.set_attribute_value("id", &[Atom::Long(i64::MIN)]));
        assert_eq!(attrs.attribute_value("id"), vec![Atom::Long(i64::MIN)]);

        attrs.set_attribute_value("count", &[Atom::Long(i64::MAX)]);
        assert_eq!(attrs.attribute_value("count"), vec![Atom::Long(9)]);
        attrs.set_attribute_value("count", &[Atom::Long(-10)]);
        assert_eq!(attrs.attribute_value("count"), vec![Atom::Long(-3)]);
        attrs.set_attribute_value("count", &[Atom::Long(4)]);
        assert_eq!(attrs.attribute_value("count"), vec![Atom::Long(4)]);
    }

    #[test]
    fn test_nan_set_twice_notifies_once() {
        let attrs = AttributeManager::new();
        attrs.add_attribute(Attribute::new("level", AttrKind::Double, vec![Atom::Double(0.0)]));
        let counter = Arc::new(Counter::default());
        attrs.bind(&counter, &[]);

        assert!(attrs.set_attribute_value("level", &[Atom::Double(f64::NAN)]));
        assert!(!attrs.set_attribute_value("level", &[Atom::Double(f64::NAN)]));
        assert_eq!(counter.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_attributes_by_category() {
        let attrs = AttributeManager::new();
        attrs.add_attribute(
            Attribute::new("b", AttrKind::Bool, vec![]).with_category("Behavior").with_order(2),
        );
        attrs.add_attribute(
            Attribute::new("a", AttrKind::Bool, vec![]).with_category("Behavior").with_order(1),
        );
        attrs.add_attribute(
            Attribute::new("hidden", AttrKind::Bool, vec![])
                .with_category("Appearance")
                .with_flags(AttrFlags::INVISIBLE),
        );
        let groups = attrs.attributes_by_category();
        assert_eq!(groups.len(), 1);
        let names: Vec<&str> = groups[0].1.iter().map(|a| a.name().as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
