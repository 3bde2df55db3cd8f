//! Interned symbols.
//!
//! Every name that flows through the runtime (object names, attribute names,
//! message selectors, beacon names, Dico keys) is a [`Symbol`]. Interning the
//! same text twice yields the same instance, so equality and hashing work on
//! the address alone and never touch the string bytes.
//!
//! Symbols live for the whole process: the table leaks each distinct string
//! once and never frees it.
//!
//! ```rust
//! use kumiko_core::Symbol;
//!
//! let a = Symbol::intern("bang");
//! let b = Symbol::from("bang");
//! assert_eq!(a, b);
//! assert!(a.ptr_eq(b));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};

/// Process-wide string interner.
///
/// Read-mostly: lookups of already-interned text take a shared lock, and
/// only the first sighting of a string upgrades to exclusive access.
pub struct SymbolTable {
    strings: RwLock<HashSet<&'static str>>,
}

impl SymbolTable {
    fn new() -> Self {
        Self {
            strings: RwLock::new(HashSet::new()),
        }
    }

    /// Returns the process-wide table, creating it on first use.
    pub fn global() -> &'static SymbolTable {
        static TABLE: OnceLock<SymbolTable> = OnceLock::new();
        TABLE.get_or_init(SymbolTable::new)
    }

    /// Interns `text`, returning the unique symbol for it.
    pub fn intern(&self, text: &str) -> Symbol {
        let strings = self.strings.upgradable_read();
        if let Some(existing) = strings.get(text) {
            return Symbol(existing);
        }
        let mut strings = RwLockUpgradableReadGuard::upgrade(strings);
        let leaked: &'static str = Box::leak(text.to_owned().into_boxed_str());
        strings.insert(leaked);
        Symbol(leaked)
    }

    /// Returns true if `text` has already been interned.
    pub fn contains(&self, text: &str) -> bool {
        self.strings.read().contains(text)
    }

    /// Returns the number of distinct symbols interned so far.
    pub fn len(&self) -> usize {
        self.strings.read().len()
    }

    /// Returns true if nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.strings.read().is_empty()
    }
}

/// An interned, identity-comparable string.
#[derive(Clone, Copy)]
pub struct Symbol(&'static str);

impl Symbol {
    /// Interns `text` in the global table.
    pub fn intern(text: &str) -> Self {
        SymbolTable::global().intern(text)
    }

    /// The empty symbol.
    pub fn empty() -> Self {
        Self::intern("")
    }

    /// Returns the interned text.
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.0
    }

    /// Returns true if the symbol is the empty string.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if both symbols are the same interned instance.
    #[inline]
    pub fn ptr_eq(self, other: Symbol) -> bool {
        std::ptr::eq(self.0.as_ptr(), other.0.as_ptr()) && self.0.len() == other.0.len()
    }
}

impl PartialEq for Symbol {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(*other)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0.as_ptr() as usize).hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(other.0)
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for Symbol {
    fn from(text: &str) -> Self {
        Self::intern(text)
    }
}

impl From<String> for Symbol {
    fn from(text: String) -> Self {
        Self::intern(&text)
    }
}

impl From<&String> for Symbol {
    fn from(text: &String) -> Self {
        Self::intern(text)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.0)
    }
}
