//! Built-in object catalog for the kumiko patching runtime.
//!
//! This crate registers the standard boxes with a [`Factory`] so they can be
//! created by name from patch text or the console.
//!
//! # Objects
//!
//! | Name | Category | Behavior |
//! |------|----------|----------|
//! | `+`, `*` | Control | Hot left / cold right arithmetic; the argument sets the right operand |
//! | `print` | Control | Logs each message, prefixed by its arguments |
//! | `pass` | Control | Outputs what it receives |
//! | `send`, `receive` (`s`, `r`) | Communication | Wireless messaging over a named beacon |
//! | `delay` | Timing | Bang after a delay |
//! | `metro` | Timing | Repeating bang; `interval` attribute |
//! | `sig~` | Signal | Number to constant signal |
//! | `osc~` | Signal | Cosine oscillator |
//! | `*~`, `+~` | Signal | Signal arithmetic (`*~` runs in place when it can) |
//! | `adc~`, `dac~` | Signal | External input / output channels |
//!
//! # Example
//!
//! ```rust
//! use kumiko_core::{Atom, Patcher};
//!
//! let patcher = Patcher::new(kumiko_registry::factory());
//! let add = patcher.create_from_text("+ 1").unwrap();
//! let print = patcher.create_from_text("print answer").unwrap();
//! patcher.connect(add, 0, print, 0).unwrap();
//! patcher.send(add, 0, &[Atom::Long(41)]).unwrap();
//!
//! assert!(kumiko_registry::print_history().contains(&"answer: 42".to_string()));
//! ```

mod communication;
mod control;
mod signal;
mod timing;

use std::sync::Arc;

use kumiko_core::{Constructor, Factory, ObjectCategory, ObjectDescriptor};

pub use control::{PRINT_HISTORY_LEN, print_history, take_print_history};
pub use signal::AtomicSample;
pub use timing::DEFAULT_METRO_INTERVAL_MS;

/// Every built-in object with its constructor, in listing order.
pub fn builtins() -> Vec<(ObjectDescriptor, Constructor)> {
    use ObjectCategory::{Communication, Control, Signal, Timing};

    let table: [(&str, &'static str, ObjectCategory, Constructor); 14] = [
        ("+", "Adds the right operand to the left", Control, control::plus),
        ("*", "Multiplies the left operand by the right", Control, control::times),
        ("print", "Logs messages to the console", Control, control::print),
        ("pass", "Outputs what it receives", Control, control::pass),
        ("send", "Broadcasts messages on a named beacon", Communication, communication::send),
        ("receive", "Outputs messages broadcast on a named beacon", Communication, communication::receive),
        ("delay", "Bangs after a delay", Timing, timing::delay),
        ("metro", "Bangs repeatedly", Timing, timing::metro),
        ("sig~", "Converts a number to a constant signal", Signal, signal::sig),
        ("osc~", "Cosine oscillator", Signal, signal::osc),
        ("*~", "Multiplies signals", Signal, signal::times_signal),
        ("+~", "Adds signals", Signal, signal::plus_signal),
        ("adc~", "Reads external input channels", Signal, signal::adc),
        ("dac~", "Writes external output channels", Signal, signal::dac),
    ];

    table
        .into_iter()
        .map(|(name, description, category, constructor)| {
            (ObjectDescriptor::new(name, description, category), constructor)
        })
        .collect()
}

/// Registers every built-in object (and the `s` / `r` aliases) with
/// `factory`. Returns how many names were added.
pub fn register_builtins(factory: &Factory) -> usize {
    let mut added = 0;
    for (descriptor, constructor) in builtins() {
        if factory.register(descriptor, constructor) {
            added += 1;
        }
    }
    for (alias, target) in [("s", "send"), ("r", "receive")] {
        if factory.register_alias(alias, target) {
            added += 1;
        }
    }
    tracing::debug!(objects = added, "built-in objects registered");
    added
}

/// A fresh factory holding every built-in object.
pub fn factory() -> Arc<Factory> {
    let factory = Factory::new();
    register_builtins(&factory);
    Arc::new(factory)
}
