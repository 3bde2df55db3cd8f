//! Wireless messaging: `send` and `receive` meet on a named beacon.

use std::sync::Arc;

use kumiko_core::{
    Atom, Beacon, BoxHandle, Castaway, Construction, Context, Inlet, Object, Outlet, PatchError,
    Symbol,
};

fn beacon_name(c: &Construction<'_>) -> Result<Symbol, PatchError> {
    let name = c.argument(0);
    if name.is_symbol() && !name.as_symbol().is_empty() {
        Ok(name.as_symbol())
    } else {
        Err(PatchError::construction(
            c.name().as_str(),
            "expects a beacon name",
        ))
    }
}

/// Broadcasts every message on its beacon.
struct Broadcaster {
    beacon: Arc<Beacon>,
}

impl Object for Broadcaster {
    fn receive(&self, _ctx: &Context<'_>, _inlet: usize, atoms: &[Atom]) -> bool {
        let reached = self.beacon.broadcast(atoms);
        tracing::trace!(beacon = %self.beacon.name(), reached, "sent");
        true
    }
}

pub(crate) fn send(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    let name = beacon_name(c)?;
    c.add_inlet(Inlet::control("message to broadcast"));
    Ok(Arc::new(Broadcaster {
        beacon: c.beacon(name),
    }))
}

/// Outputs whatever its beacon broadcasts. The beacon only holds it weakly,
/// so removing the box unbinds it.
struct Receive {
    handle: BoxHandle,
}

impl Castaway for Receive {
    fn receive_beacon(&self, _beacon: &Beacon, atoms: &[Atom]) {
        self.handle.send(0, atoms);
    }
}

impl Object for Receive {
    fn receive(&self, _ctx: &Context<'_>, _inlet: usize, _atoms: &[Atom]) -> bool {
        false
    }
}

pub(crate) fn receive(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    let name = beacon_name(c)?;
    c.add_outlet(Outlet::control("received message"));
    let object = Arc::new(Receive { handle: c.handle() });
    c.beacon(name).bind(&object);
    Ok(object)
}
