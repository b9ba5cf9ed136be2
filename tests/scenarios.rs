//! End-to-end scenarios through the public API.

use approx::assert_relative_eq;

use harvester_core::circuit::{snap_to_grid, Circuit, ComponentId, Point, PointRef};
use harvester_core::components::ComponentKind;
use harvester_core::simulation::{Measurements, PulsePhase, Session, Simulator, StageSelection};
use harvester_core::HarvestError;

fn point(c: &Circuit, id: ComponentId, name: &str) -> PointRef {
    c.point_ref(id, name).unwrap()
}

#[test]
fn test_placed_points_follow_catalog_offsets() {
    let mut c = Circuit::new();
    for (i, kind) in ComponentKind::ALL.iter().enumerate() {
        let (x, y) = (33.0 + 47.0 * i as f64, 191.0 - 13.0 * i as f64);
        let id = c.add_component(kind.name(), x, y).unwrap();
        let placed = c.component(id).unwrap();
        let origin = Point::new(snap_to_grid(x), snap_to_grid(y));
        assert_eq!(placed.position, origin);

        let spec = kind.spec();
        assert_eq!(placed.connection_points.len(), spec.points.len());
        for (p, s) in placed.connection_points.iter().zip(spec.points) {
            assert_eq!(p.id, s.id);
            assert_eq!(p.absolute, Point::new(origin.x + s.offset.x, origin.y + s.offset.y));
        }
    }
}

#[test]
fn test_self_and_duplicate_wires_are_rejected() {
    let mut c = Circuit::new();
    let piezo = c.add_component("piezo_single", 80.0, 100.0).unwrap();
    let bridge = c.add_component("bridge_rectifier", 260.0, 100.0).unwrap();

    let err = c
        .connect(point(&c, piezo, "ac1"), point(&c, piezo, "ac2"))
        .unwrap_err();
    assert_eq!(err, HarvestError::SelfConnection { component: piezo });

    c.connect(point(&c, piezo, "ac1"), point(&c, bridge, "ac1"))
        .unwrap();
    // reversed order is the same unordered pair
    let err = c
        .connect(point(&c, bridge, "ac1"), point(&c, piezo, "ac1"))
        .unwrap_err();
    assert!(matches!(err, HarvestError::DuplicateWire { .. }));
    assert_eq!(c.wires().len(), 1);
}

#[test]
fn test_removal_cascades_to_wires() {
    let mut c = Circuit::new();
    let report = c.apply_template(harvester_core::circuit::template("regulated_system").unwrap());
    let storage = report.components[2];

    c.remove_component(storage).unwrap();
    assert!(c.wires().iter().all(|w| !w.touches(storage)));
    // rectifier ac pair and regulator-to-port survive
    assert_eq!(c.wires().len(), 4);
    assert_eq!(c.remove_component(storage), Err(HarvestError::missing_component(storage)));
}

#[test]
fn test_no_generator_means_zero_snapshot() {
    for name in ["basic_harvester", "regulated_system"] {
        let mut session = Session::new();
        session.load_template(name).unwrap();
        session.start_simulation().unwrap();
        session.advance(1000.0);
        assert_eq!(session.measurements(), Measurements::default());
        assert!(session.circuit().wires().iter().all(|w| !w.active));
    }
}

#[test]
fn test_repeated_passes_are_stable() {
    let mut session = Session::new();
    let report = session.load_template("basic_harvester").unwrap();
    session.start_simulation().unwrap();
    session.activate_generator(report.components[0], 1.0).unwrap();

    let first = session.resimulate();
    let flags: Vec<bool> = session.circuit().wires().iter().map(|w| w.active).collect();
    let second = session.resimulate();
    assert_eq!(second.generator_voltage, first.generator_voltage);
    assert_eq!(second.rectifier_voltage, first.rectifier_voltage);
    assert_eq!(second.load_current_ma, first.load_current_ma);
    assert!(second.storage_voltage >= first.storage_voltage);
    assert_eq!(
        session.circuit().wires().iter().map(|w| w.active).collect::<Vec<_>>(),
        flags
    );

    // storage converges on its input
    for _ in 0..1000 {
        session.resimulate();
    }
    let last = session.measurements().storage_voltage;
    let next = session.resimulate().storage_voltage;
    assert_relative_eq!(next, last, epsilon = 1e-6);
}

#[test]
fn test_move_keeps_hit_identities() {
    let mut c = Circuit::new();
    let piezo = c.add_component("piezo_single", 80.0, 100.0).unwrap();
    let bridge = c.add_component("bridge_rectifier", 260.0, 100.0).unwrap();
    let wire = c
        .connect(point(&c, piezo, "ac1"), point(&c, bridge, "ac1"))
        .unwrap();

    let before = c.component(piezo).unwrap().point("ac1").unwrap().absolute;
    assert_eq!(c.connection_point_at(before.x, before.y), Some(point(&c, piezo, "ac1")));
    assert_eq!(c.wire_at(before.x, before.y).map(|w| w.id), Some(wire));

    c.move_component(piezo, 80.0, 400.0).unwrap();
    let after = c.component(piezo).unwrap().point("ac1").unwrap().absolute;
    assert_eq!(after, Point::new(before.x, before.y + 300.0));
    assert_eq!(c.connection_point_at(after.x, after.y), Some(point(&c, piezo, "ac1")));
    assert_eq!(c.wire_at(after.x, after.y).map(|w| w.id), Some(wire));
    assert_eq!(c.wire(wire).unwrap().start.position, after);
}

#[test]
fn test_rectifier_without_storage() {
    let mut session = Session::new();
    let piezo = session.add_component("piezo_single", 80.0, 100.0).unwrap();
    session.add_component("bridge_rectifier", 260.0, 100.0).unwrap();
    session.start_simulation().unwrap();
    session.activate_generator(piezo, 1.0).unwrap();

    let m = session.measurements();
    assert_relative_eq!(m.rectifier_voltage, 13.6, epsilon = 1e-12);
    assert_eq!(m.stored_energy_uj, 0.0);
    assert_eq!(m.storage_voltage, 0.0);
}

#[test]
fn test_storage_charges_toward_rectifier_output() {
    let mut session = Session::new();
    let piezo = session.add_component("piezo_single", 80.0, 100.0).unwrap();
    session.add_component("bridge_rectifier", 260.0, 100.0).unwrap();
    let cap = session.add_component("capacitor_1mf", 440.0, 110.0).unwrap();
    session.start_simulation().unwrap();
    session.activate_generator(piezo, 1.0).unwrap();

    let state = &session.circuit().component(cap).unwrap().state;
    assert!(state.voltage > 0.0 && state.voltage < 13.6);
    assert_relative_eq!(state.voltage, 13.6 * 0.08, epsilon = 1e-12);
    assert_relative_eq!(state.stored_energy, 0.5 * 0.001 * state.voltage * state.voltage);
    assert_relative_eq!(
        session.measurements().stored_energy_uj,
        state.stored_energy * 1e6,
        epsilon = 1e-9
    );
}

#[test]
fn test_decay_from_full_press_reaches_zero() {
    let mut session = Session::new();
    let piezo = session.add_component("piezo_single", 80.0, 100.0).unwrap();
    session.start_simulation().unwrap();
    session.activate_generator(piezo, 1.0).unwrap();

    let mut waited = 0.0;
    while session.pulse_phase(piezo) != PulsePhase::Idle {
        session.advance(50.0);
        waited += 50.0;
        assert!(waited < 10_000.0, "pulse never ended");
    }
    let generator = &session.circuit().component(piezo).unwrap().state;
    assert_eq!(generator.voltage, 0.0);
    assert!(!generator.active);
    assert_eq!(waited, 3100.0);
}

#[test]
fn test_singleton_per_role_is_reported() {
    let mut session = Session::new();
    session.load_template("basic_harvester").unwrap();
    let extra = session.add_component("capacitor_100uf", 440.0, 300.0).unwrap();

    assert_eq!(session.config().engine.stage_selection, StageSelection::FirstPlaced);
    assert_eq!(session.view().unmodeled, vec![extra]);
}

#[test]
fn test_regulated_system_powers_nothing_at_usb_voltage() {
    let mut session = Session::new();
    let report = session.load_template("regulated_system").unwrap();
    session.start_simulation().unwrap();
    session.start_auto_step(5.0).unwrap();
    session.advance(20_000.0);

    let regulator = session.circuit().component(report.components[3]).unwrap();
    let port = session.circuit().component(report.components[4]).unwrap();
    assert!(regulator.state.active);
    assert_eq!(regulator.state.voltage, 3.3);
    assert!(!port.state.active);

    session.stop_simulation();
    assert!(session.scheduler().is_empty());
    assert_eq!(session.measurements(), Measurements::default());
}

#[test]
fn test_simulator_is_usable_without_a_session() {
    let mut c = Circuit::new();
    c.add_component("battery_liion", 0.0, 0.0).unwrap();
    c.add_component("schottky_diode", 200.0, 0.0).unwrap();
    let m = Simulator::new().simulate(&mut c, 0.0);
    assert_eq!(m, Measurements::default());
}
