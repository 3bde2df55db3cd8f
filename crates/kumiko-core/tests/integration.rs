//! End-to-end behavior of the patching runtime with small test objects.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

use kumiko_core::{
    Atom, AttrFlags, AttrKind, Attribute, AttributeEvent, AttributeListener, AttributeManager, Beacon,
    BoxId, Castaway, ChainError, Clock, Construction, Context, Dico, Factory, Inlet, Object,
    ObjectCategory, ObjectDescriptor, Outlet, PatchError, Patcher, Sample, SignalInputs,
    SignalOutputs, Symbol,
};

// --- Test objects ---

/// Forwards every message to the beacon named by its argument.
struct Record {
    beacon: Arc<Beacon>,
}

impl Object for Record {
    fn receive(&self, _ctx: &Context<'_>, _inlet: usize, atoms: &[Atom]) -> bool {
        self.beacon.broadcast(atoms);
        true
    }
}

fn record(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    c.add_inlet(Inlet::control("messages"));
    let name = c.argument(0).as_symbol();
    Ok(Arc::new(Record {
        beacon: c.beacon(name),
    }))
}

/// Outputs whatever arrives.
struct Pass;

impl Object for Pass {
    fn receive(&self, ctx: &Context<'_>, _inlet: usize, atoms: &[Atom]) -> bool {
        ctx.send(0, atoms);
        true
    }
}

fn pass(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    c.add_inlet(Inlet::control("anything"));
    c.add_outlet(Outlet::control("anything"));
    Ok(Arc::new(Pass))
}

/// Hot left / cold right addition.
struct Add {
    right: Mutex<f64>,
}

impl Object for Add {
    fn receive(&self, ctx: &Context<'_>, inlet: usize, atoms: &[Atom]) -> bool {
        let Some(first) = atoms.first().filter(|a| a.is_number()) else {
            return false;
        };
        if inlet == 1 {
            *self.right.lock() = first.as_double();
        } else {
            let sum = first.as_double() + *self.right.lock();
            ctx.send(0, &[Atom::Double(sum)]);
        }
        true
    }
}

fn add(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    c.add_inlet(Inlet::control("left"));
    c.add_inlet(Inlet::control("right").cold());
    c.add_outlet(Outlet::control("sum"));
    Ok(Arc::new(Add {
        right: Mutex::new(c.argument(0).as_double()),
    }))
}

/// Constant signal.
struct Sig {
    value: Sample,
}

impl Object for Sig {
    fn receive(&self, _ctx: &Context<'_>, _inlet: usize, _atoms: &[Atom]) -> bool {
        false
    }

    fn prepare(&self, _sample_rate: f32, _block_size: usize) -> bool {
        true
    }

    fn perform(&self, _inputs: &SignalInputs<'_>, outputs: &mut SignalOutputs<'_>) {
        outputs.output(0).fill(self.value);
    }
}

fn sig(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    c.add_outlet(Outlet::signal("constant"));
    Ok(Arc::new(Sig {
        value: c.argument(0).as_double() as Sample,
    }))
}

/// Doubles its input; may run in place.
struct Twice;

impl Object for Twice {
    fn receive(&self, _ctx: &Context<'_>, _inlet: usize, _atoms: &[Atom]) -> bool {
        false
    }

    fn prepare(&self, _sample_rate: f32, _block_size: usize) -> bool {
        true
    }

    fn perform(&self, inputs: &SignalInputs<'_>, outputs: &mut SignalOutputs<'_>) {
        let input = inputs.input(0).to_vec();
        for (out, x) in outputs.output(0).iter_mut().zip(input) {
            *out = 2.0 * x;
        }
    }

    fn is_inplace(&self) -> bool {
        true
    }

    fn perform_inplace(&self, buffer: &mut [Sample]) {
        for x in buffer {
            *x *= 2.0;
        }
    }
}

fn twice(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    c.add_inlet(Inlet::signal("in"));
    c.add_outlet(Outlet::signal("out"));
    Ok(Arc::new(Twice))
}

/// Adds its input to bus output 0.
struct Out;

impl Object for Out {
    fn receive(&self, _ctx: &Context<'_>, _inlet: usize, _atoms: &[Atom]) -> bool {
        false
    }

    fn prepare(&self, _sample_rate: f32, _block_size: usize) -> bool {
        true
    }

    fn perform(&self, inputs: &SignalInputs<'_>, outputs: &mut SignalOutputs<'_>) {
        let input = inputs.input(0).to_vec();
        if let Some(bus) = outputs.bus_output(0) {
            for (out, x) in bus.iter_mut().zip(input) {
                *out += x;
            }
        }
    }
}

fn out(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    c.add_inlet(Inlet::signal("in"));
    Ok(Arc::new(Out))
}

/// Reports on its beacon after a delay.
struct Later {
    clock: Clock,
    beacon: Arc<Beacon>,
}

impl Object for Later {
    fn receive(&self, _ctx: &Context<'_>, _inlet: usize, atoms: &[Atom]) -> bool {
        let ms = atoms.first().map_or(0.0, Atom::as_double);
        self.clock.delay(ms)
    }

    fn tick(&self, ctx: &Context<'_>) {
        self.beacon.broadcast(&[Atom::from(ctx.id().index())]);
    }
}

fn later(c: &mut Construction<'_>) -> Result<Arc<dyn Object>, PatchError> {
    c.add_inlet(Inlet::control("delay"));
    c.add_attribute(Attribute::new("label", AttrKind::Symbol, vec![Atom::from("none")]));
    c.add_attribute(
        Attribute::new("scratch", AttrKind::Long, vec![Atom::Long(0)])
            .with_flags(AttrFlags::UNSAVED),
    );
    Ok(Arc::new(Later {
        clock: c.clock()?,
        beacon: c.beacon(c.argument(0).as_symbol()),
    }))
}

fn factory() -> Arc<Factory> {
    let factory = Factory::new();
    let entries: [(&str, kumiko_core::Constructor, ObjectCategory); 7] = [
        ("record", record, ObjectCategory::Communication),
        ("pass", pass, ObjectCategory::Control),
        ("add", add, ObjectCategory::Control),
        ("sig", sig, ObjectCategory::Signal),
        ("twice", twice, ObjectCategory::Signal),
        ("out", out, ObjectCategory::Signal),
        ("later", later, ObjectCategory::Timing),
    ];
    for (name, constructor, category) in entries {
        factory.register(ObjectDescriptor::new(name, "test object", category), constructor);
    }
    Arc::new(factory)
}

/// Castaway collecting everything it receives.
struct Collector {
    tx: Sender<Vec<Atom>>,
}

fn collect(factory: &Factory, beacon: &str) -> (Arc<Collector>, Receiver<Vec<Atom>>) {
    let (tx, rx) = unbounded();
    let collector = Arc::new(Collector { tx });
    factory.create_beacon(beacon).bind(&collector);
    (collector, rx)
}

impl Castaway for Collector {
    fn receive_beacon(&self, _beacon: &Beacon, atoms: &[Atom]) {
        let _ = self.tx.send(atoms.to_vec());
    }
}

fn drain(rx: &Receiver<Vec<Atom>>) -> Vec<Vec<Atom>> {
    rx.try_iter().collect()
}

// --- Values ---

#[test]
fn test_symbol_identity() {
    let a = Symbol::intern("integration_identity");
    let b = Symbol::intern("integration_identity");
    assert!(a.ptr_eq(b));
}

#[test]
fn test_parse_reference_line() {
    let atoms = Atom::parse("foo \"bar 42\" 1 2 3.25");
    assert_eq!(
        atoms,
        vec![
            Atom::from("foo"),
            Atom::from("bar 42"),
            Atom::Long(1),
            Atom::Long(2),
            Atom::Double(3.25)
        ]
    );
    assert!(atoms[4].is_double());
}

#[test]
fn test_numeric_casts() {
    assert!(Atom::Long(7).is_number());
    assert!(Atom::Double(-7.9).is_number());
    assert_eq!(Atom::Long(7).as_double(), 7.0);
    assert_eq!(Atom::Double(-7.9).as_long(), -7);
    assert_eq!(Atom::Double(7.9).as_long(), 7);
}

#[test]
fn test_dico_nested_round_trip() {
    let mut inner = Dico::new();
    inner.set_atom("depth", 2);
    inner.set("values", vec![Atom::Double(0.5), Atom::from("x y")]);
    let mut outer = Dico::new();
    outer.set_atom("name", "root");
    outer.set_atom("child", inner);

    let restored = Dico::from_text(&outer.to_text());
    assert_eq!(restored.keys(), outer.keys());
    assert_eq!(restored, outer);
    let child = restored.get_dico("child").unwrap();
    assert_eq!(child.get_atom("depth"), Atom::Long(2));
}

// --- Connections ---

#[test]
fn test_signal_to_control_inlet_fails() {
    let patcher = Patcher::new(factory());
    let s = patcher.create_from_text("sig 1").unwrap();
    let p = patcher.create_from_text("pass").unwrap();
    assert!(matches!(
        patcher.connect(s, 0, p, 0),
        Err(PatchError::IncompatiblePorts { .. })
    ));
    assert_eq!(patcher.connection_count(), 0);
}

#[test]
fn test_control_to_signal_inlet_fails() {
    let patcher = Patcher::new(factory());
    let p = patcher.create_from_text("pass").unwrap();
    let t = patcher.create_from_text("twice").unwrap();
    assert!(patcher.connect(p, 0, t, 0).is_err());
}

#[test]
fn test_duplicate_connection_rejected() {
    let patcher = Patcher::new(factory());
    let a = patcher.create_from_text("pass").unwrap();
    let b = patcher.create_from_text("pass").unwrap();
    patcher.connect(a, 0, b, 0).unwrap();
    assert!(matches!(
        patcher.connect(a, 0, b, 0),
        Err(PatchError::DuplicateConnection { .. })
    ));
    assert_eq!(patcher.connection_count(), 1);
}

#[test]
fn test_self_connection_and_bad_ports() {
    let patcher = Patcher::new(factory());
    let a = patcher.create_from_text("pass").unwrap();
    let b = patcher.create_from_text("pass").unwrap();
    assert!(matches!(
        patcher.connect(a, 0, a, 0),
        Err(PatchError::SelfConnection(_))
    ));
    assert!(matches!(
        patcher.connect(a, 3, b, 0),
        Err(PatchError::NoSuchOutlet { .. })
    ));
    assert!(matches!(
        patcher.connect(a, 0, b, 9),
        Err(PatchError::NoSuchInlet { .. })
    ));
    assert!(matches!(
        patcher.connect(a, 0, BoxId::from_index(99), 0),
        Err(PatchError::BoxNotFound(_))
    ));
}

#[test]
fn test_remove_drops_connections() {
    let patcher = Patcher::new(factory());
    let a = patcher.create_from_text("pass").unwrap();
    let b = patcher.create_from_text("pass").unwrap();
    patcher.connect(a, 0, b, 0).unwrap();
    assert_eq!(patcher.connection_count(), 1);

    patcher.remove(b).unwrap();
    assert_eq!(patcher.connection_count(), 0);
    assert_eq!(patcher.box_count(), 1);

    // Double removal is reported, not fatal.
    assert!(matches!(patcher.remove(b), Err(PatchError::BoxNotFound(_))));
    // IDs are never reused.
    let c = patcher.create_from_text("pass").unwrap();
    assert_ne!(c, b);
}

#[test]
fn test_disconnect() {
    let patcher = Patcher::new(factory());
    let a = patcher.create_from_text("pass").unwrap();
    let b = patcher.create_from_text("pass").unwrap();
    patcher.connect(a, 0, b, 0).unwrap();
    patcher.disconnect(a, 0, b, 0).unwrap();
    assert!(patcher.disconnect(a, 0, b, 0).is_err());
}

#[test]
fn test_unknown_object() {
    let patcher = Patcher::new(factory());
    assert!(matches!(
        patcher.create_from_text("no-such-thing 1 2"),
        Err(PatchError::UnknownObject(_))
    ));
    assert!(matches!(
        patcher.create_from_text(""),
        Err(PatchError::EmptyDescription)
    ));
    assert_eq!(patcher.box_count(), 0);
}

// --- Dispatch ---

#[test]
fn test_fan_out_follows_connection_order() {
    let factory = factory();
    let (_collector, rx) = collect(&factory, "order");
    let patcher = Patcher::new(Arc::clone(&factory));

    let source = patcher.create_from_text("pass").unwrap();
    let first = patcher.create_from_text("add 100").unwrap();
    let second = patcher.create_from_text("add 200").unwrap();
    let sink = patcher.create_from_text("record order").unwrap();
    patcher.connect(source, 0, second, 0).unwrap();
    patcher.connect(source, 0, first, 0).unwrap();
    patcher.connect(first, 0, sink, 0).unwrap();
    patcher.connect(second, 0, sink, 0).unwrap();

    assert!(patcher.send(source, 0, &[Atom::Long(1)]).unwrap());
    assert_eq!(
        drain(&rx),
        vec![vec![Atom::Double(201.0)], vec![Atom::Double(101.0)]]
    );
}

#[test]
fn test_hot_and_cold_inlets() {
    let factory = factory();
    let (_collector, rx) = collect(&factory, "sum");
    let patcher = Patcher::new(Arc::clone(&factory));
    let adder = patcher.create_from_text("add").unwrap();
    let sink = patcher.create_from_text("record sum").unwrap();
    patcher.connect(adder, 0, sink, 0).unwrap();

    patcher.send(adder, 1, &[Atom::Long(10)]).unwrap();
    assert!(drain(&rx).is_empty());
    patcher.send(adder, 0, &[Atom::Long(5)]).unwrap();
    assert_eq!(drain(&rx), vec![vec![Atom::Double(15.0)]]);

    // Unhandled messages report false.
    assert!(!patcher.send(adder, 0, &[Atom::from("bang")]).unwrap());
}

#[test]
fn test_feedback_loop_is_capped() {
    let factory = factory();
    let (_collector, rx) = collect(&factory, "loop");
    let patcher = Patcher::new(Arc::clone(&factory));
    patcher.set_max_depth(16);

    let a = patcher.create_from_text("pass").unwrap();
    let b = patcher.create_from_text("pass").unwrap();
    let sink = patcher.create_from_text("record loop").unwrap();
    patcher.connect(a, 0, b, 0).unwrap();
    patcher.connect(b, 0, a, 0).unwrap();
    patcher.connect(b, 0, sink, 0).unwrap();

    patcher.send(a, 0, &[Atom::from("ping")]).unwrap();
    let hits = drain(&rx).len();
    assert!(hits > 0 && hits < 16);

    // The depth counter unwinds: a later message still gets through.
    patcher.disconnect(b, 0, a, 0).unwrap();
    patcher.send(a, 0, &[Atom::from("pong")]).unwrap();
    assert_eq!(drain(&rx), vec![vec![Atom::from("pong")]]);
}

#[test]
fn test_send_to_signal_inlet_rejected() {
    let patcher = Patcher::new(factory());
    let t = patcher.create_from_text("twice").unwrap();
    assert!(matches!(
        patcher.send(t, 0, &[Atom::Long(1)]),
        Err(PatchError::SignalOnlyInlet { .. })
    ));
}

// --- Attributes ---

struct Changes {
    names: Mutex<Vec<Symbol>>,
}

impl AttributeListener for Changes {
    fn attribute_changed(&self, manager: &AttributeManager, name: Symbol, event: AttributeEvent) {
        assert_eq!(event, AttributeEvent::ValueChanged);
        // Reading back inside the callback must not deadlock.
        assert!(!manager.attribute_value(name).is_empty());
        self.names.lock().push(name);
    }
}

#[test]
fn test_box_attributes_and_notifications() {
    let patcher = Patcher::new(factory());
    let mut detail = Dico::new();
    detail.set_atom("text", "later x");
    detail.set("position", vec![Atom::Long(30), Atom::Long(40)]);
    detail.set_atom("label", "hello");
    let id = patcher.create(&detail).unwrap();

    let attrs = patcher.attributes(id).unwrap();
    assert_eq!(
        attrs.attribute_value("position"),
        vec![Atom::Double(30.0), Atom::Double(40.0)]
    );
    assert_eq!(attrs.attribute_value("label"), vec![Atom::from("hello")]);

    let changes = Arc::new(Changes {
        names: Mutex::new(Vec::new()),
    });
    attrs.bind(&changes, &[]);
    assert!(!patcher.set_attribute(id, "label", &[Atom::from("hello")]).unwrap());
    assert!(patcher.set_attribute(id, "label", &[Atom::from("bye")]).unwrap());
    assert!(patcher.set_attribute(id, "size", &[Atom::Long(1), Atom::Long(1)]).unwrap());
    assert_eq!(*changes.names.lock(), vec![Symbol::from("label"), Symbol::from("size")]);
    assert_eq!(
        attrs.attribute_value("size"),
        vec![Atom::Double(10.0), Atom::Double(10.0)]
    );
}

#[test]
fn test_unsaved_attribute_applies_at_creation() {
    let patcher = Patcher::new(factory());
    let mut detail = Dico::new();
    detail.set_atom("text", "later x");
    detail.set_atom("scratch", Atom::Long(7));
    let id = patcher.create(&detail).unwrap();
    assert_eq!(
        patcher.attributes(id).unwrap().attribute_value("scratch"),
        vec![Atom::Long(7)]
    );

    let saved = patcher.write();
    let boxes = saved.get("boxes");
    let written = boxes[0].as_dico().unwrap();
    assert!(!written.has("scratch"));
}

// --- Beacons ---

#[test]
fn test_beacon_reaches_bound_only() {
    let factory = factory();
    let beacon = factory.create_beacon("radio");
    let (tx, rx) = unbounded();
    let kept = Arc::new(Collector { tx: tx.clone() });
    let gone = Arc::new(Collector { tx: tx.clone() });
    let unbound = Arc::new(Collector { tx });
    beacon.bind(&kept);
    beacon.bind(&kept);
    beacon.bind(&gone);
    beacon.bind(&unbound);
    beacon.unbind(&unbound);
    drop(gone);

    assert_eq!(beacon.broadcast(&[Atom::Long(1)]), 1);
    assert_eq!(drain(&rx).len(), 1);
    assert!(Arc::ptr_eq(&beacon, &factory.create_beacon("radio")));
}

// --- Clock ---

#[test]
fn test_clock_fires_only_for_live_box() {
    let factory = factory();
    let (_collector, rx) = collect(&factory, "ticks");
    let patcher = Patcher::new(Arc::clone(&factory));

    let alive = patcher.create_from_text("later ticks").unwrap();
    let removed = patcher.create_from_text("later ticks").unwrap();
    patcher.send(alive, 0, &[Atom::Long(20)]).unwrap();
    patcher.send(removed, 0, &[Atom::Long(20)]).unwrap();
    patcher.remove(removed).unwrap();

    let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(first, vec![Atom::from(alive.index())]);
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    factory.shutdown();
}

// --- Signal chain ---

#[test]
fn test_diamond_chain_order_and_output() {
    let patcher = Patcher::new(factory());
    let sink = patcher.create_from_text("out").unwrap();
    let a = patcher.create_from_text("twice").unwrap();
    let b = patcher.create_from_text("twice").unwrap();
    let source = patcher.create_from_text("sig 1").unwrap();
    patcher.connect(source, 0, a, 0).unwrap();
    patcher.connect(source, 0, b, 0).unwrap();
    patcher.connect(a, 0, sink, 0).unwrap();
    patcher.connect(b, 0, sink, 0).unwrap();

    patcher.start(48000.0, 16).unwrap();
    let order = patcher.chain_order().unwrap();
    let pos = |id: BoxId| order.iter().position(|x| *x == id).unwrap();
    assert!(pos(source) < pos(a) && pos(source) < pos(b));
    assert!(pos(a) < pos(sink) && pos(b) < pos(sink));
    assert!(patcher.inplace_boxes().is_empty());

    let mut left = vec![0.0; 16];
    let mut right = vec![0.0; 16];
    assert!(patcher.process(&[], &mut [left.as_mut_slice(), right.as_mut_slice()]));
    assert_eq!(left, vec![4.0; 16]);
    assert_eq!(right, vec![0.0; 16]);
    patcher.stop();
    assert!(!patcher.tick());
}

#[test]
fn test_chain_rebuilds_on_topology_change() {
    let patcher = Patcher::new(factory());
    let source = patcher.create_from_text("sig 0.5").unwrap();
    let sink = patcher.create_from_text("out").unwrap();
    patcher.start(44100.0, 8).unwrap();

    let mut left = vec![0.0; 8];
    patcher.process(&[], &mut [left.as_mut_slice()]);
    assert_eq!(left, vec![0.0; 8]);

    patcher.connect(source, 0, sink, 0).unwrap();
    patcher.process(&[], &mut [left.as_mut_slice()]);
    assert_eq!(left, vec![0.5; 8]);

    let gain = patcher.create_from_text("twice").unwrap();
    patcher.disconnect(source, 0, sink, 0).unwrap();
    patcher.connect(source, 0, gain, 0).unwrap();
    patcher.connect(gain, 0, sink, 0).unwrap();
    assert_eq!(patcher.inplace_boxes(), vec![gain]);
    patcher.process(&[], &mut [left.as_mut_slice()]);
    assert_eq!(left, vec![1.0; 8]);

    patcher.remove(gain).unwrap();
    patcher.process(&[], &mut [left.as_mut_slice()]);
    assert_eq!(left, vec![0.0; 8]);
    patcher.stop();
}

#[test]
fn test_signal_cycle_is_a_configuration_error() {
    let patcher = Patcher::new(factory());
    let a = patcher.create_from_text("twice").unwrap();
    let b = patcher.create_from_text("twice").unwrap();
    patcher.connect(a, 0, b, 0).unwrap();
    patcher.connect(b, 0, a, 0).unwrap();

    match patcher.start(48000.0, 32) {
        Err(PatchError::Chain(ChainError::Cycle { boxes })) => {
            assert!(boxes.contains(&a) && boxes.contains(&b));
        }
        other => panic!("expected a cycle error, got {other:?}"),
    }
    assert!(patcher.is_running());
    assert!(patcher.chain_order().is_none());
    assert!(patcher.tick());

    patcher.disconnect(b, 0, a, 0).unwrap();
    assert_eq!(patcher.chain_order().map(|o| o.len()), Some(2));
    patcher.stop();
}

// --- Persistence ---

#[test]
fn test_patch_write_read_round_trip() {
    let factory = factory();
    let patcher = Patcher::new(Arc::clone(&factory));
    let a = patcher.create_from_text("add 3").unwrap();
    let b = patcher.create_from_text("record saved").unwrap();
    patcher.connect(a, 0, b, 0).unwrap();
    patcher
        .set_attribute(a, "position", &[Atom::Long(5), Atom::Long(6)])
        .unwrap();

    let text = patcher.write().to_text();
    let copy = Patcher::new(Arc::clone(&factory));
    assert_eq!(copy.read(&Dico::from_text(&text)), 2);
    assert_eq!(copy.box_count(), 2);
    assert_eq!(copy.connection_count(), 1);

    let ids = copy.box_ids();
    let info = copy.box_info(ids[0]).unwrap();
    assert_eq!(info.text, "add 3");
    assert_eq!(
        copy.attributes(ids[0]).unwrap().attribute_value("position"),
        vec![Atom::Double(5.0), Atom::Double(6.0)]
    );

    let (_collector, rx) = collect(&factory, "saved");
    copy.send(ids[0], 0, &[Atom::Long(1)]).unwrap();
    assert_eq!(drain(&rx), vec![vec![Atom::Double(4.0)]]);
}

#[test]
fn test_numeric_looking_argument_survives_save() {
    let factory = factory();
    let patcher = Patcher::new(Arc::clone(&factory));
    let mut detail = Dico::new();
    detail.set("text", vec![Atom::from("record"), Atom::from("42")]);
    patcher.create(&detail).unwrap();

    let text = patcher.write().to_text();
    let copy = Patcher::new(Arc::clone(&factory));
    assert_eq!(copy.read(&Dico::from_text(&text)), 1);
    let id = copy.box_ids()[0];
    assert_eq!(copy.box_info(id).unwrap().text, "record \"42\"");

    let (_collector, rx) = collect(&factory, "42");
    copy.send(id, 0, &[Atom::Long(1)]).unwrap();
    assert_eq!(drain(&rx), vec![vec![Atom::Long(1)]]);
}
