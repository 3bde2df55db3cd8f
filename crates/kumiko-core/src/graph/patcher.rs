//! The patcher: one graph instance.
//!
//! A [`Patcher`] owns its boxes (in a slot vector addressed by [`BoxId`]), its
//! connections (in insertion order) and the signal chain derived from them.
//!
//! # Locking
//!
//! - The box/connection collections sit behind one `RwLock`. Every operation
//!   that calls into a box (message dispatch, chain building, attribute I/O)
//!   first copies what it needs out of the lock and releases it.
//! - DSP state (running flag, bus, current chain) sits behind its own `Mutex`.
//!   The two locks are never held together.
//!
//! # Dispatch
//!
//! Messages propagate synchronously: [`Context::send`] calls `receive` on each
//! connected inlet in connection order before returning. Recursion depth is
//! counted per thread and capped (see [`Patcher::set_max_depth`]); a message
//! that would exceed the cap is dropped and logged, which turns a feedback loop
//! into an error instead of a stack overflow.

use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::atom::{Atom, atoms_to_text};
use crate::attribute::AttributeManager;
use crate::chain::builder::{self, SignalGraph, SignalNode};
use crate::chain::{AudioBus, Sample, SignalChain};
use crate::dico::Dico;
use crate::error::{ChainError, PatchError};
use crate::factory::Factory;
use crate::symbol::Symbol;

use super::connection::Connection;
use super::node::{BoxEntry, BoxHandle, BoxId, BoxInfo, add_common_attributes};
use super::object::{Construction, Context, Object};
use super::port::{Inlet, Outlet};

/// Default cap on nested message deliveries.
pub const DEFAULT_MAX_DEPTH: usize = 512;

const DEFAULT_SAMPLE_RATE: f32 = 44100.0;
const DEFAULT_BLOCK_SIZE: usize = 64;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Counts one level of nested delivery on this thread.
struct DepthGuard;

impl DepthGuard {
    fn enter(max: usize) -> Option<Self> {
        DEPTH.with(|depth| {
            let current = depth.get();
            if current >= max {
                None
            } else {
                depth.set(current + 1);
                Some(DepthGuard)
            }
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

#[derive(Default)]
struct Graph {
    boxes: Vec<Option<BoxEntry>>,
    connections: Vec<Connection>,
    /// Bumped on every change to the signal topology.
    version: u64,
}

impl Graph {
    fn entry(&self, id: BoxId) -> Option<&BoxEntry> {
        self.boxes.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn live(&self) -> impl Iterator<Item = &BoxEntry> {
        self.boxes.iter().flatten()
    }

    fn signal_snapshot(&self) -> SignalGraph {
        SignalGraph {
            nodes: self
                .live()
                .filter(|e| e.has_signal_ports())
                .map(|e| SignalNode {
                    id: e.id,
                    object: Arc::clone(&e.object),
                    inlets: e.inlets.iter().map(Inlet::accepts_signal).collect(),
                    outlets: e.outlets.iter().map(Outlet::is_signal).collect(),
                })
                .collect(),
            edges: self.connections.iter().filter(|c| c.signal).copied().collect(),
            version: self.version,
        }
    }

    /// Validates a new edge and returns whether it carries a signal.
    fn check_connection(
        &self,
        from: BoxId,
        outlet: usize,
        to: BoxId,
        inlet: usize,
    ) -> Result<bool, PatchError> {
        if from == to {
            return Err(PatchError::SelfConnection(from));
        }
        let source = self.entry(from).ok_or(PatchError::BoxNotFound(from))?;
        let destination = self.entry(to).ok_or(PatchError::BoxNotFound(to))?;
        let out = source
            .outlets
            .get(outlet)
            .ok_or(PatchError::NoSuchOutlet { id: from, outlet })?;
        let port = destination
            .inlets
            .get(inlet)
            .ok_or(PatchError::NoSuchInlet { id: to, inlet })?;
        if !port.accepts(out) {
            return Err(PatchError::IncompatiblePorts {
                from,
                outlet,
                to,
                inlet,
            });
        }
        if self
            .connections
            .iter()
            .any(|c| c.joins(from, outlet, to, inlet))
        {
            return Err(PatchError::DuplicateConnection {
                from,
                outlet,
                to,
                inlet,
            });
        }
        Ok(out.is_signal())
    }
}

struct Dsp {
    running: bool,
    sample_rate: f32,
    block_size: usize,
    bus: AudioBus,
    chain: Option<SignalChain>,
    /// Topology version of the installed chain (stale rebuilds are dropped).
    chain_version: u64,
}

impl Dsp {
    fn run_block(&mut self) {
        match &mut self.chain {
            Some(chain) => chain.tick(&mut self.bus),
            None => self.bus.clear_outputs(),
        }
    }
}

pub(crate) struct PatcherInner {
    factory: Arc<Factory>,
    graph: RwLock<Graph>,
    dsp: Mutex<Dsp>,
    max_depth: AtomicUsize,
}

impl PatcherInner {
    pub(crate) fn object(&self, id: BoxId) -> Option<Arc<dyn Object>> {
        self.graph.read().entry(id).map(|e| Arc::clone(&e.object))
    }

    /// Fans `atoms` out of `from`'s `outlet` to every connected message inlet.
    pub(crate) fn dispatch(self: &Arc<Self>, from: BoxId, outlet: usize, atoms: &[Atom]) {
        let targets: Vec<(BoxId, usize, Arc<dyn Object>)> = {
            let graph = self.graph.read();
            graph
                .connections
                .iter()
                .filter(|c| !c.signal && c.from == from && c.outlet == outlet)
                .filter_map(|c| {
                    graph
                        .entry(c.to)
                        .map(|e| (c.to, c.inlet, Arc::clone(&e.object)))
                })
                .collect()
        };
        for (to, inlet, object) in &targets {
            self.deliver(*to, *inlet, object, atoms);
        }
    }

    fn deliver(
        self: &Arc<Self>,
        id: BoxId,
        inlet: usize,
        object: &Arc<dyn Object>,
        atoms: &[Atom],
    ) -> bool {
        let max = self.max_depth.load(Ordering::Relaxed);
        let Some(_guard) = DepthGuard::enter(max) else {
            tracing::error!(box_id = %id, max_depth = max, "message dropped: dispatch depth exceeded (feedback loop?)");
            return false;
        };
        let ctx = Context::new(self, id);
        let handled = object.receive(&ctx, inlet, atoms);
        if !handled {
            tracing::warn!(box_id = %id, inlet, message = %atoms_to_text(atoms), "message not understood");
        }
        handled
    }

    /// Rebuilds the chain if DSP is running. A failed build leaves the patcher
    /// running silence.
    fn rebuild_chain(&self) -> Result<(), ChainError> {
        let (sample_rate, block_size) = {
            let dsp = self.dsp.lock();
            if !dsp.running {
                return Ok(());
            }
            (dsp.sample_rate, dsp.block_size)
        };

        let snapshot = self.graph.read().signal_snapshot();
        let version = snapshot.version;
        let result = builder::build(snapshot, sample_rate, block_size);

        let mut dsp = self.dsp.lock();
        if !dsp.running || version < dsp.chain_version {
            return Ok(());
        }
        dsp.chain_version = version;
        match result {
            Ok(chain) => {
                let previous = dsp.chain.replace(chain);
                drop(dsp);
                drop(previous);
                Ok(())
            }
            Err(error) => {
                let previous = dsp.chain.take();
                drop(dsp);
                drop(previous);
                tracing::error!(%error, "signal chain disabled");
                Err(error)
            }
        }
    }

    fn is_running(&self) -> bool {
        self.dsp.lock().running
    }
}

/// A graph of boxes and connections.
///
/// Cloning a `Patcher` clones a handle to the same graph.
#[derive(Clone)]
pub struct Patcher {
    inner: Arc<PatcherInner>,
}

impl Patcher {
    /// Creates an empty patcher building boxes through `factory`.
    pub fn new(factory: Arc<Factory>) -> Self {
        Self {
            inner: Arc::new(PatcherInner {
                factory,
                graph: RwLock::new(Graph::default()),
                dsp: Mutex::new(Dsp {
                    running: false,
                    sample_rate: DEFAULT_SAMPLE_RATE,
                    block_size: DEFAULT_BLOCK_SIZE,
                    bus: AudioBus::new(2, 2, DEFAULT_BLOCK_SIZE),
                    chain: None,
                    chain_version: 0,
                }),
                max_depth: AtomicUsize::new(DEFAULT_MAX_DEPTH),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<PatcherInner>) -> Self {
        Self { inner }
    }

    /// The factory boxes are built with.
    pub fn factory(&self) -> &Arc<Factory> {
        &self.inner.factory
    }

    /// Sets the cap on nested message deliveries (minimum 1).
    pub fn set_max_depth(&self, depth: usize) {
        self.inner.max_depth.store(depth.max(1), Ordering::Relaxed);
    }

    /// Current cap on nested message deliveries.
    pub fn max_depth(&self) -> usize {
        self.inner.max_depth.load(Ordering::Relaxed)
    }

    // --- Boxes ---

    /// Creates a box from a description.
    ///
    /// The description holds either `text` (name followed by arguments, as a
    /// single string or as atoms) or `name` plus `arguments`. Any declared
    /// attribute found in the description is applied after construction.
    pub fn create(&self, detail: &Dico) -> Result<BoxId, PatchError> {
        let (name, arguments) = describe(detail).inspect_err(|error| {
            tracing::error!(%error, "cannot create box");
        })?;

        let Some(constructor) = self.inner.factory.constructor(name) else {
            tracing::error!(object = %name, "no such object");
            return Err(PatchError::UnknownObject(name.as_str().to_string()));
        };

        let id = {
            let mut graph = self.inner.graph.write();
            let id = BoxId(graph.boxes.len() as u32);
            graph.boxes.push(None);
            id
        };

        let attributes = Arc::new(AttributeManager::new());
        add_common_attributes(&attributes);

        let mut text_atoms = Vec::with_capacity(arguments.len() + 1);
        text_atoms.push(Atom::Symbol(name));
        text_atoms.extend(arguments.iter().cloned());

        let mut construction = Construction {
            name,
            arguments,
            detail,
            inlets: Vec::new(),
            outlets: Vec::new(),
            attributes: Arc::clone(&attributes),
            handle: BoxHandle {
                patcher: Arc::downgrade(&self.inner),
                id,
            },
            factory: &self.inner.factory,
        };
        let object = constructor(&mut construction).inspect_err(|error| {
            tracing::error!(box_id = %id, object = %name, %error, "construction failed");
        })?;
        let Construction {
            inlets, outlets, ..
        } = construction;

        attributes.apply(detail);

        let entry = BoxEntry {
            id,
            name,
            text: atoms_to_text(&text_atoms),
            object,
            inlets,
            outlets,
            attributes,
        };
        let signal = entry.has_signal_ports();
        {
            let mut graph = self.inner.graph.write();
            graph.boxes[id.0 as usize] = Some(entry);
            if signal {
                graph.version += 1;
            }
        }
        tracing::debug!(box_id = %id, object = %name, "box created");

        if signal {
            let _ = self.inner.rebuild_chain();
        }
        Ok(id)
    }

    /// Creates a box from text such as `"osc~ 440"`.
    pub fn create_from_text(&self, text: &str) -> Result<BoxId, PatchError> {
        let mut detail = Dico::new();
        detail.set("text", Atom::parse(text));
        self.create(&detail)
    }

    /// Removes a box and every connection touching it.
    pub fn remove(&self, id: BoxId) -> Result<(), PatchError> {
        let entry = {
            let mut graph = self.inner.graph.write();
            let Some(entry) = graph.boxes.get_mut(id.0 as usize).and_then(Option::take) else {
                drop(graph);
                tracing::error!(box_id = %id, "remove: box does not exist or was already removed");
                return Err(PatchError::BoxNotFound(id));
            };
            let before = graph.connections.len();
            graph.connections.retain(|c| !c.touches(id));
            let dropped = before - graph.connections.len();
            if entry.has_signal_ports() {
                graph.version += 1;
            }
            tracing::debug!(box_id = %id, object = %entry.name, connections = dropped, "box removed");
            entry
        };

        if entry.has_signal_ports() {
            let _ = self.inner.rebuild_chain();
            if self.inner.is_running() {
                entry.object.release();
            }
        }
        Ok(())
    }

    /// Removes every box and connection.
    pub fn clear(&self) {
        let entries: Vec<BoxEntry> = {
            let mut graph = self.inner.graph.write();
            graph.connections.clear();
            graph.version += 1;
            graph.boxes.iter_mut().filter_map(Option::take).collect()
        };
        let _ = self.inner.rebuild_chain();
        if self.inner.is_running() {
            for entry in entries.iter().filter(|e| e.has_signal_ports()) {
                entry.object.release();
            }
        }
        tracing::debug!(boxes = entries.len(), "patcher cleared");
    }

    /// Connects `from`'s `outlet` to `to`'s `inlet`.
    ///
    /// Rejected when either box or port is missing, when the inlet does not
    /// accept what the outlet produces, when the edge already exists, or when
    /// both ends are the same box.
    pub fn connect(
        &self,
        from: BoxId,
        outlet: usize,
        to: BoxId,
        inlet: usize,
    ) -> Result<(), PatchError> {
        let signal = {
            let mut graph = self.inner.graph.write();
            let signal = graph
                .check_connection(from, outlet, to, inlet)
                .inspect_err(|error| {
                    tracing::error!(box_id = %from, %error, "connect failed");
                })?;
            graph.connections.push(Connection {
                from,
                outlet,
                to,
                inlet,
                signal,
            });
            if signal {
                graph.version += 1;
            }
            signal
        };
        tracing::debug!(from = %from, outlet, to = %to, inlet, signal, "connected");
        if signal {
            let _ = self.inner.rebuild_chain();
        }
        Ok(())
    }

    /// Removes the edge from `from`'s `outlet` to `to`'s `inlet`.
    pub fn disconnect(
        &self,
        from: BoxId,
        outlet: usize,
        to: BoxId,
        inlet: usize,
    ) -> Result<(), PatchError> {
        let signal = {
            let mut graph = self.inner.graph.write();
            let Some(pos) = graph
                .connections
                .iter()
                .position(|c| c.joins(from, outlet, to, inlet))
            else {
                drop(graph);
                let error = PatchError::ConnectionNotFound {
                    from,
                    outlet,
                    to,
                    inlet,
                };
                tracing::error!(box_id = %from, %error, "disconnect failed");
                return Err(error);
            };
            let removed = graph.connections.remove(pos);
            if removed.signal {
                graph.version += 1;
            }
            removed.signal
        };
        tracing::debug!(from = %from, outlet, to = %to, inlet, "disconnected");
        if signal {
            let _ = self.inner.rebuild_chain();
        }
        Ok(())
    }

    /// Delivers `atoms` to `id`'s `inlet` from outside the graph.
    ///
    /// Returns whether the box understood the message.
    pub fn send(&self, id: BoxId, inlet: usize, atoms: &[Atom]) -> Result<bool, PatchError> {
        let object = {
            let graph = self.inner.graph.read();
            let entry = graph.entry(id).ok_or(PatchError::BoxNotFound(id))?;
            let port = entry
                .inlets
                .get(inlet)
                .ok_or(PatchError::NoSuchInlet { id, inlet })?;
            if !port.accepts_control() {
                return Err(PatchError::SignalOnlyInlet { id, inlet });
            }
            Arc::clone(&entry.object)
        };
        Ok(self.inner.deliver(id, inlet, &object, atoms))
    }

    // --- Queries ---

    /// IDs of live boxes, ascending.
    pub fn box_ids(&self) -> Vec<BoxId> {
        self.inner.graph.read().live().map(|e| e.id).collect()
    }

    /// Description of one box.
    pub fn box_info(&self, id: BoxId) -> Option<BoxInfo> {
        self.inner.graph.read().entry(id).map(BoxEntry::info)
    }

    /// The box's object.
    pub fn object(&self, id: BoxId) -> Option<Arc<dyn Object>> {
        self.inner.object(id)
    }

    /// A weak handle to the box.
    pub fn handle(&self, id: BoxId) -> Option<BoxHandle> {
        self.inner.graph.read().entry(id).map(|_| BoxHandle {
            patcher: Arc::downgrade(&self.inner),
            id,
        })
    }

    /// The box's attribute manager.
    pub fn attributes(&self, id: BoxId) -> Option<Arc<AttributeManager>> {
        self.inner
            .graph
            .read()
            .entry(id)
            .map(|e| Arc::clone(&e.attributes))
    }

    /// Sets attribute `name` of box `id`. Returns whether the value changed.
    pub fn set_attribute(
        &self,
        id: BoxId,
        name: impl Into<Symbol>,
        atoms: &[Atom],
    ) -> Result<bool, PatchError> {
        let attributes = self.attributes(id).ok_or(PatchError::BoxNotFound(id))?;
        Ok(attributes.set_attribute_value(name, atoms))
    }

    /// All connections in insertion order.
    pub fn connections(&self) -> Vec<Connection> {
        self.inner.graph.read().connections.clone()
    }

    /// Number of live boxes.
    pub fn box_count(&self) -> usize {
        self.inner.graph.read().live().count()
    }

    /// Number of connections.
    pub fn connection_count(&self) -> usize {
        self.inner.graph.read().connections.len()
    }

    // --- Persistence ---

    /// Serializes boxes (with their attributes) and links.
    pub fn write(&self) -> Dico {
        let (boxes, links) = {
            let graph = self.inner.graph.read();
            let boxes: Vec<(BoxId, String, Arc<AttributeManager>)> = graph
                .live()
                .map(|e| (e.id, e.text.clone(), Arc::clone(&e.attributes)))
                .collect();
            (boxes, graph.connections.clone())
        };

        let box_atoms: Vec<Atom> = boxes
            .into_iter()
            .map(|(id, text, attributes)| {
                let mut dico = Dico::new();
                dico.set_atom("id", id.index());
                dico.set_atom("text", text);
                attributes.write(&mut dico);
                Atom::dico(dico)
            })
            .collect();
        let link_atoms: Vec<Atom> = links
            .iter()
            .map(|c| {
                let mut dico = Dico::new();
                dico.set("from", vec![Atom::from(c.from.index()), Atom::from(c.outlet)]);
                dico.set("to", vec![Atom::from(c.to.index()), Atom::from(c.inlet)]);
                Atom::dico(dico)
            })
            .collect();

        let mut patch = Dico::new();
        patch.set("boxes", box_atoms);
        patch.set("links", link_atoms);
        patch
    }

    /// Replaces the contents with a patch written by [`write`](Self::write).
    ///
    /// Boxes and links that fail are logged and skipped. Returns the number of
    /// boxes created.
    pub fn read(&self, patch: &Dico) -> usize {
        self.clear();
        let mut ids: std::collections::HashMap<i64, BoxId> = std::collections::HashMap::new();
        for atom in patch.get("boxes") {
            let Some(detail) = atom.as_dico() else {
                continue;
            };
            let saved = detail.get_atom("id");
            if let Ok(id) = self.create(detail)
                && saved.is_number()
            {
                ids.insert(saved.as_long(), id);
            }
        }
        for atom in patch.get("links") {
            let Some(link) = atom.as_dico() else {
                continue;
            };
            let (from, to) = (link.get("from"), link.get("to"));
            if from.len() < 2 || to.len() < 2 {
                tracing::warn!("skipping malformed link");
                continue;
            }
            let (Some(&source), Some(&destination)) =
                (ids.get(&from[0].as_long()), ids.get(&to[0].as_long()))
            else {
                tracing::warn!("skipping link to missing box");
                continue;
            };
            let _ = self.connect(
                source,
                from[1].as_long().max(0) as usize,
                destination,
                to[1].as_long().max(0) as usize,
            );
        }
        ids.len()
    }

    // --- Signal processing ---

    /// Sets the external channel counts.
    pub fn set_channels(&self, inputs: usize, outputs: usize) {
        let mut dsp = self.inner.dsp.lock();
        let block_size = dsp.block_size;
        dsp.bus = AudioBus::new(inputs, outputs, block_size);
    }

    /// Starts signal processing: prepares boxes and builds the chain.
    ///
    /// A cyclic signal graph is reported as an error; processing still runs
    /// (producing silence) until the cycle is broken.
    pub fn start(&self, sample_rate: f32, block_size: usize) -> Result<(), PatchError> {
        if block_size == 0 || !sample_rate.is_finite() || sample_rate <= 0.0 {
            let error = ChainError::InvalidSettings {
                sample_rate,
                block_size,
            };
            tracing::error!(%error, "dsp start failed");
            return Err(error.into());
        }
        if self.is_running() {
            self.stop();
        }
        {
            let mut dsp = self.inner.dsp.lock();
            dsp.running = true;
            dsp.sample_rate = sample_rate;
            dsp.block_size = block_size;
            dsp.bus.resize(block_size);
            dsp.chain = None;
            dsp.chain_version = 0;
        }
        self.inner.rebuild_chain()?;
        tracing::info!(sample_rate, block_size, "dsp started");
        Ok(())
    }

    /// Stops signal processing and releases every box in the chain.
    pub fn stop(&self) {
        let chain = {
            let mut dsp = self.inner.dsp.lock();
            if !dsp.running {
                return;
            }
            dsp.running = false;
            dsp.bus.clear_outputs();
            dsp.chain.take()
        };
        if let Some(chain) = chain {
            chain.release();
        }
        tracing::info!("dsp stopped");
    }

    /// True between [`start`](Self::start) and [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    /// Processes one block with whatever is on the input bus. Returns false when
    /// not running.
    pub fn tick(&self) -> bool {
        let mut dsp = self.inner.dsp.lock();
        if !dsp.running {
            return false;
        }
        dsp.run_block();
        true
    }

    /// Copies `inputs` onto the bus, processes one block, and copies the bus
    /// outputs into `outputs`. Missing channels read or write silence.
    pub fn process(&self, inputs: &[&[Sample]], outputs: &mut [&mut [Sample]]) -> bool {
        let mut dsp = self.inner.dsp.lock();
        if !dsp.running {
            for out in outputs.iter_mut() {
                out.fill(0.0);
            }
            return false;
        }
        for (channel, input) in inputs.iter().enumerate() {
            if let Some(buffer) = dsp.bus.input_mut(channel) {
                let n = buffer.len().min(input.len());
                buffer[..n].copy_from_slice(&input[..n]);
                buffer[n..].fill(0.0);
            }
        }
        dsp.run_block();
        for (channel, out) in outputs.iter_mut().enumerate() {
            match dsp.bus.output(channel) {
                Some(buffer) => {
                    let n = buffer.len().min(out.len());
                    out[..n].copy_from_slice(&buffer[..n]);
                    out[n..].fill(0.0);
                }
                None => out.fill(0.0),
            }
        }
        true
    }

    /// Execution order of the current chain, if one is installed.
    pub fn chain_order(&self) -> Option<Vec<BoxId>> {
        self.inner.dsp.lock().chain.as_ref().map(SignalChain::order)
    }

    /// Boxes of the current chain that process in place.
    pub fn inplace_boxes(&self) -> Vec<BoxId> {
        self.inner
            .dsp
            .lock()
            .chain
            .as_ref()
            .map(SignalChain::inplace_boxes)
            .unwrap_or_default()
    }

    /// Sample rate of the last start.
    pub fn sample_rate(&self) -> f32 {
        self.inner.dsp.lock().sample_rate
    }

    /// Block size of the last start.
    pub fn block_size(&self) -> usize {
        self.inner.dsp.lock().block_size
    }

    /// Number of (input, output) bus channels.
    pub fn channels(&self) -> (usize, usize) {
        let dsp = self.inner.dsp.lock();
        (dsp.bus.input_channels(), dsp.bus.output_channels())
    }
}

impl std::fmt::Debug for Patcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Patcher")
            .field("boxes", &self.box_count())
            .field("connections", &self.connection_count())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Splits a box description into name and arguments.
fn describe(detail: &Dico) -> Result<(Symbol, Vec<Atom>), PatchError> {
    let atoms: Vec<Atom> = if detail.has("text") {
        match detail.get("text") {
            [single] if single.is_symbol() => Atom::parse(single.as_symbol().as_str()),
            many => many.to_vec(),
        }
    } else {
        let mut atoms = vec![detail.get_atom("name")];
        atoms.extend(detail.get("arguments").iter().cloned());
        atoms
    };

    match atoms.split_first() {
        Some((first, rest)) if first.is_symbol() && !first.as_symbol().is_empty() => {
            Ok((first.as_symbol(), rest.to_vec()))
        }
        _ => Err(PatchError::EmptyDescription),
    }
}
