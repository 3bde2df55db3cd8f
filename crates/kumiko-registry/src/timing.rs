//! Clock-driven objects.
//!
//! A [`Clock`] has no cancel operation, so both objects keep the deadline they
//! expect to fire at. A tick that arrives when no deadline is armed, or before
//! the armed one, belongs to a superseded request and is ignored.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kumiko_core::{
    Atom, AttrKind, Attribute, AttributeManager, Clock, Construction, Context, Inlet, MAX_DELAY,
    Object, Outlet, PatchError,
};
use parking_lot::Mutex;

use crate::control::{bang, is_bang};

/// Interval used by `metro` when none is given.
pub const DEFAULT_METRO_INTERVAL_MS: f64 = 500.0;

fn milliseconds(ms: f64) -> Duration {
    if ms.is_finite() {
        Duration::from_secs_f64((ms / 1000.0).clamp(0.0, MAX_DELAY.as_secs_f64()))
    } else {
        Duration::ZERO
    }
}

fn is_word(atom: &Atom, word: &str) -> bool {
    atom.is_symbol() && atom.as_symbol().as_str() == word
}

/// Armed deadline shared by the timing objects.
#[derive(Default)]
struct Deadline(Mutex<Option<Instant>>);

impl Deadline {
    fn arm(&self, at: Instant) {
        *self.0.lock() = Some(at);
    }

    fn disarm(&self) {
        *self.0.lock() = None;
    }

    #[cfg(test)]
    fn is_armed(&self) -> bool {
        self.0.lock().is_some()
    }

    /// Takes the deadline if it has been reached.
    fn take_due(&self) -> Option<Instant> {
        let mut deadline = self.0.lock();
        match *deadline {
            Some(at) if Instant::now() >= at => deadline.take(),
            _ => None,
        }
    }
}

// --- delay ---

/// Outputs a bang once the delay expires.
struct Delay {
    clock: Clock,
    milliseconds: Mutex<f64>,
    deadline: Deadline,
}

impl Delay {
    fn start(&self) -> bool {
        let wait = milliseconds(*self.milliseconds.lock());
        self.deadline.arm(Instant::now() + wait);
        self.clock.delay_for(wait)
    }
}

impl Object for Delay {
    fn receive(&self, _ctx: &Context<'_>, inlet: usize, atoms: &[Atom]) -> bool {
        let Some(first) = atoms.first() else {
            return false;
        };
        match inlet {
            0 if is_bang(first) => self.start(),
            0 if is_word(first, "stop") => {
                self.deadline.disarm();
                true
            }
            0 if first.is_number() => {
                *self.milliseconds.lock() = first.as_double();
                self.start()
            }
            1 if first.is_number() => {
                *self.milliseconds.lock() = first.as_double();
                true
            }
            _ => false,
        }
    }

    fn tick(&self, ctx: &Context<'_>) {
        if self.deadline.take_due().is_some() {
            ctx.send(0, &[bang()]);
        }
    }
}

pub(crate) fn delay(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    c.add_inlet(Inlet::control("bang starts, stop cancels, number sets and starts"));
    c.add_inlet(Inlet::control("delay time (ms)").cold());
    c.add_outlet(Outlet::control("bang"));
    let initial = c.argument(0);
    Ok(Arc::new(Delay {
        clock: c.clock()?,
        milliseconds: Mutex::new(if initial.is_number() {
            initial.as_double()
        } else {
            0.0
        }),
        deadline: Deadline::default(),
    }))
}

// --- metro ---

/// Outputs a bang every `interval` milliseconds while running.
struct Metro {
    clock: Clock,
    attributes: Arc<AttributeManager>,
    deadline: Deadline,
}

impl Metro {
    fn interval(&self) -> Duration {
        let value = self.attributes.attribute_value("interval");
        milliseconds(
            value
                .first()
                .map_or(DEFAULT_METRO_INTERVAL_MS, Atom::as_double),
        )
    }

    /// Arms the next tick and then bangs, so a downstream `stop` wins.
    fn start(&self, ctx: &Context<'_>) {
        let interval = self.interval();
        self.deadline.arm(Instant::now() + interval);
        self.clock.delay_for(interval);
        ctx.send(0, &[bang()]);
    }
}

impl Object for Metro {
    fn receive(&self, ctx: &Context<'_>, inlet: usize, atoms: &[Atom]) -> bool {
        let Some(first) = atoms.first() else {
            return false;
        };
        if inlet == 1 {
            if !first.is_number() {
                return false;
            }
            self.attributes
                .set_attribute_value("interval", std::slice::from_ref(first));
            return true;
        }

        if is_bang(first) || is_word(first, "start") {
            self.start(ctx);
        } else if is_word(first, "stop") {
            self.deadline.disarm();
        } else if first.is_number() {
            if first.as_double() == 0.0 {
                self.deadline.disarm();
            } else {
                self.start(ctx);
            }
        } else {
            return false;
        }
        true
    }

    fn tick(&self, ctx: &Context<'_>) {
        let Some(due) = self.deadline.take_due() else {
            return;
        };
        let now = Instant::now();
        let interval = self.interval();
        // Keep the grid unless we fell a whole interval behind.
        let mut next = due + interval;
        if next <= now {
            next = now + interval;
        }
        self.deadline.arm(next);
        self.clock.delay_for(next - now);
        ctx.send(0, &[bang()]);
    }
}

pub(crate) fn metro(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    c.add_inlet(Inlet::control("non-zero/bang/start runs, 0/stop halts"));
    c.add_inlet(Inlet::control("interval (ms)").cold());
    c.add_outlet(Outlet::control("bang"));

    let initial = c.argument(0);
    let interval = if initial.is_number() {
        initial.as_double().max(1.0)
    } else {
        DEFAULT_METRO_INTERVAL_MS
    };
    c.add_attribute(
        Attribute::new("interval", AttrKind::Double, vec![Atom::Double(interval)])
            .with_label("Interval (ms)")
            .with_category("Behavior")
            .with_min(1.0),
    );

    Ok(Arc::new(Metro {
        clock: c.clock()?,
        attributes: Arc::clone(c.attributes()),
        deadline: Deadline::default(),
    }))
}
