//! Message objects: arithmetic, printing and routing.

use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};

use kumiko_core::{
    Atom, Construction, Context, Inlet, Object, Outlet, PatchError, Symbol, atoms_to_text,
};
use parking_lot::Mutex;

/// Lines kept by [`print_history`].
pub const PRINT_HISTORY_LEN: usize = 256;

pub(crate) fn bang() -> Atom {
    Atom::Symbol(Symbol::intern("bang"))
}

pub(crate) fn is_bang(atom: &Atom) -> bool {
    atom.is_symbol() && atom.as_symbol().as_str() == "bang"
}

// --- Arithmetic ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Add,
    Multiply,
}

impl Operator {
    /// Two longs stay a long (wrapping); anything else computes in doubles.
    fn apply(self, left: &Atom, right: &Atom) -> Atom {
        if let (Atom::Long(a), Atom::Long(b)) = (left, right) {
            return Atom::Long(match self {
                Operator::Add => a.wrapping_add(*b),
                Operator::Multiply => a.wrapping_mul(*b),
            });
        }
        let (a, b) = (left.as_double(), right.as_double());
        Atom::Double(match self {
            Operator::Add => a + b,
            Operator::Multiply => a * b,
        })
    }
}

/// `+` and `*`: the left inlet is hot and outputs, the right one stores.
struct Arithmetic {
    operator: Operator,
    right: Mutex<Atom>,
    last: Mutex<Atom>,
}

impl Object for Arithmetic {
    fn receive(&self, ctx: &Context<'_>, inlet: usize, atoms: &[Atom]) -> bool {
        let Some(first) = atoms.first() else {
            return false;
        };

        if inlet == 1 {
            if !first.is_number() {
                return false;
            }
            *self.right.lock() = first.clone();
            return true;
        }

        if is_bang(first) {
            let last = self.last.lock().clone();
            ctx.send(0, &[last]);
            return true;
        }
        if !first.is_number() {
            return false;
        }
        // A list sets the right operand first.
        if let Some(second) = atoms.get(1).filter(|a| a.is_number()) {
            *self.right.lock() = second.clone();
        }
        let result = {
            let right = self.right.lock();
            self.operator.apply(first, &right)
        };
        *self.last.lock() = result.clone();
        ctx.send(0, &[result]);
        true
    }
}

fn arithmetic(c: &mut Construction<'_>, operator: Operator) -> Arc<dyn Object> {
    c.add_inlet(Inlet::control("left operand, outputs"));
    c.add_inlet(Inlet::control("right operand").cold());
    c.add_outlet(Outlet::control("result"));
    let argument = c.argument(0);
    let right = if argument.is_number() {
        argument
    } else {
        Atom::Long(0)
    };
    Arc::new(Arithmetic {
        operator,
        right: Mutex::new(right),
        last: Mutex::new(Atom::Long(0)),
    })
}

pub(crate) fn plus(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    Ok(arithmetic(c, Operator::Add))
}

pub(crate) fn times(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    Ok(arithmetic(c, Operator::Multiply))
}

// --- Print ---

fn history() -> &'static Mutex<VecDeque<String>> {
    static HISTORY: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();
    HISTORY.get_or_init(|| Mutex::new(VecDeque::with_capacity(PRINT_HISTORY_LEN)))
}

/// The most recent lines written by `print` boxes, oldest first.
pub fn print_history() -> Vec<String> {
    history().lock().iter().cloned().collect()
}

/// Drains the `print` history.
pub fn take_print_history() -> Vec<String> {
    history().lock().drain(..).collect()
}

/// Writes every message to the console log, prefixed by its arguments.
struct Print {
    prefix: String,
}

impl Object for Print {
    fn receive(&self, ctx: &Context<'_>, _inlet: usize, atoms: &[Atom]) -> bool {
        let line = format!("{}: {}", self.prefix, atoms_to_text(atoms));
        tracing::info!(target: "kumiko::print", box_id = %ctx.id(), "{line}");
        let mut history = history().lock();
        if history.len() == PRINT_HISTORY_LEN {
            history.pop_front();
        }
        history.push_back(line);
        true
    }
}

pub(crate) fn print(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    c.add_inlet(Inlet::control("anything to print"));
    let prefix = if c.arguments().is_empty() {
        "print".to_string()
    } else {
        atoms_to_text(c.arguments())
    };
    Ok(Arc::new(Print { prefix }))
}

// --- Pass ---

struct Pass;

impl Object for Pass {
    fn receive(&self, ctx: &Context<'_>, _inlet: usize, atoms: &[Atom]) -> bool {
        ctx.send(0, atoms);
        true
    }
}

pub(crate) fn pass(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    c.add_inlet(Inlet::control("anything"));
    c.add_outlet(Outlet::control("the same message"));
    Ok(Arc::new(Pass))
}
