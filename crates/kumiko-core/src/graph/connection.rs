//! Directed edges between boxes.

use super::node::BoxId;

/// An edge from `from`'s outlet to `to`'s inlet.
///
/// `signal` is fixed at connect time from the outlet kind; signal edges feed the
/// signal chain, the others carry messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Source box.
    pub from: BoxId,
    /// Source outlet index.
    pub outlet: usize,
    /// Destination box.
    pub to: BoxId,
    /// Destination inlet index.
    pub inlet: usize,
    /// True if the edge carries a signal.
    pub signal: bool,
}

impl Connection {
    /// True if the edge touches `id` at either end.
    pub fn touches(&self, id: BoxId) -> bool {
        self.from == id || self.to == id
    }

    /// True if the edge joins the same ports as the given endpoints.
    pub fn joins(&self, from: BoxId, outlet: usize, to: BoxId, inlet: usize) -> bool {
        self.from == from && self.outlet == outlet && self.to == to && self.inlet == inlet
    }
}
