//! Staged propagation pass.

use serde::Serialize;

use crate::circuit::{Circuit, ComponentId};
use crate::components::{ElectricalParams, StageRole};
use crate::error::{HarvestError, Result};

use super::{CHARGING_RATE, DISCHARGE_TIME_STEP, DISCHARGE_UNIT_SCALE};

/// Which instance stands in for a stage when several share a role.
///
/// The engine models one representative per stage. Other instances of the
/// same role stay on the canvas but carry no derived state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageSelection {
    /// The earliest-placed instance of the role
    #[default]
    FirstPlaced,
}

/// Configuration for the simulation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Fraction of the remaining gap closed per pass while storage charges.
    pub charging_rate: f64,
    /// Unit scale in the load discharge step.
    pub discharge_unit_scale: f64,
    /// Time step folded into the load discharge step.
    pub discharge_time_step: f64,
    pub stage_selection: StageSelection,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            charging_rate: CHARGING_RATE,
            discharge_unit_scale: DISCHARGE_UNIT_SCALE,
            discharge_time_step: DISCHARGE_TIME_STEP,
            stage_selection: StageSelection::FirstPlaced,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage charging rate. 1.0 charges to the input in a single
    /// pass.
    ///
    /// [`validate`](Self::validate) rejects rates outside (0, 1].
    pub fn with_charging_rate(mut self, charging_rate: f64) -> Self {
        self.charging_rate = charging_rate;
        self
    }

    /// Set the load discharge time step.
    pub fn with_discharge_time_step(mut self, discharge_time_step: f64) -> Self {
        self.discharge_time_step = discharge_time_step;
        self
    }

    /// Check every field is usable by the engine.
    pub fn validate(&self) -> Result<()> {
        if !(self.charging_rate > 0.0 && self.charging_rate <= 1.0) {
            return Err(HarvestError::invalid_parameter(
                "charging_rate",
                format!("must be in (0, 1], got {}", self.charging_rate),
            ));
        }
        if !(self.discharge_unit_scale.is_finite() && self.discharge_unit_scale > 0.0) {
            return Err(HarvestError::invalid_parameter(
                "discharge_unit_scale",
                format!("must be positive, got {}", self.discharge_unit_scale),
            ));
        }
        if !(self.discharge_time_step.is_finite() && self.discharge_time_step >= 0.0) {
            return Err(HarvestError::invalid_parameter(
                "discharge_time_step",
                format!("must be non-negative, got {}", self.discharge_time_step),
            ));
        }
        Ok(())
    }

    /// Voltage drop per pass on a storage element of `capacitance` farads
    /// feeding a load that draws `current_ma`.
    pub fn discharge_step(&self, current_ma: f64, capacitance: f64) -> f64 {
        let current = current_ma / self.discharge_unit_scale;
        current / (capacitance * self.discharge_unit_scale) * self.discharge_time_step
    }
}

/// Aggregate outputs of one pass, for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Measurements {
    /// Sum of all active generator voltages (V)
    pub generator_voltage: f64,
    /// Rectifier output (V)
    pub rectifier_voltage: f64,
    /// Storage voltage after charging, before the load draws (V)
    pub storage_voltage: f64,
    /// Load current (mA)
    pub load_current_ma: f64,
    /// Power delivered to the load (mW)
    pub power_mw: f64,
    /// Energy in storage (µJ)
    pub stored_energy_uj: f64,
}

/// The representative of each non-generator stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stages {
    pub rectifier: Option<ComponentId>,
    pub storage: Option<ComponentId>,
    pub regulator: Option<ComponentId>,
    pub load: Option<ComponentId>,
}

impl Stages {
    /// Pick the representatives for a circuit.
    pub fn select(circuit: &Circuit, selection: StageSelection) -> Self {
        Self {
            rectifier: representative(circuit, StageRole::Rectifier, selection),
            storage: representative(circuit, StageRole::Storage, selection),
            regulator: representative(circuit, StageRole::Regulator, selection),
            load: representative(circuit, StageRole::Load, selection),
        }
    }
}

/// The instance that models `role`, if any is placed.
pub fn representative(circuit: &Circuit, role: StageRole, selection: StageSelection) -> Option<ComponentId> {
    match selection {
        StageSelection::FirstPlaced => circuit
            .components()
            .iter()
            .find(|c| c.role() == Some(role))
            .map(|c| c.id),
    }
}

/// Placed instances of a modeled role that are not its representative.
///
/// Generators are never listed: every active generator contributes.
pub fn unmodeled_components(circuit: &Circuit, selection: StageSelection) -> Vec<ComponentId> {
    let stages = Stages::select(circuit, selection);
    circuit
        .components()
        .iter()
        .filter(|c| {
            let representative = match c.role() {
                Some(StageRole::Rectifier) => stages.rectifier,
                Some(StageRole::Storage) => stages.storage,
                Some(StageRole::Regulator) => stages.regulator,
                Some(StageRole::Load) => stages.load,
                Some(StageRole::Generator) | None => return false,
            };
            representative != Some(c.id)
        })
        .map(|c| c.id)
        .collect()
}

/// Mark every wire touching `id` as carrying current.
fn energize(circuit: &mut Circuit, id: ComponentId) {
    for wire in circuit.wires_mut().iter_mut().filter(|w| w.touches(id)) {
        wire.active = true;
    }
}

/// The simulation engine.
///
/// Each [`simulate`](Simulator::simulate) call is one complete pass; the only
/// state carried between passes lives on the circuit (generator and storage
/// voltages).
#[derive(Debug, Default)]
pub struct Simulator {
    config: EngineConfig,
    measurements: Measurements,
}

impl Simulator {
    /// Create a new simulator with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a new simulator with custom configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            measurements: Measurements::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot from the most recent pass.
    pub fn measurements(&self) -> Measurements {
        self.measurements
    }

    /// Zero the snapshot.
    pub fn reset(&mut self) {
        self.measurements = Measurements::default();
    }

    /// Run one propagation pass over the circuit.
    ///
    /// `now_ms` stamps loads that switch on during this pass.
    pub fn simulate(&mut self, circuit: &mut Circuit, now_ms: f64) -> Measurements {
        let mut m = Measurements::default();
        for wire in circuit.wires_mut() {
            wire.active = false;
        }

        let generators: Vec<(ComponentId, f64)> = circuit
            .components()
            .iter()
            .filter(|c| c.role() == Some(StageRole::Generator) && c.state.voltage > 0.0)
            .map(|c| (c.id, c.state.voltage))
            .collect();

        if generators.is_empty() {
            self.measurements = m;
            return m;
        }

        m.generator_voltage = generators.iter().map(|(_, v)| v).sum();
        for (id, _) in &generators {
            energize(circuit, *id);
        }

        let stages = Stages::select(circuit, self.config.stage_selection);

        let rectified = stages.rectifier.map(|id| rectify(circuit, id, m.generator_voltage));
        if let Some(v) = rectified {
            m.rectifier_voltage = v;
        }

        let stored = stages.storage.and_then(|id| {
            let input = rectified.unwrap_or(m.generator_voltage);
            self.charge(circuit, id, input)
        });
        if let Some((voltage, energy)) = stored {
            m.storage_voltage = voltage;
            m.stored_energy_uj = energy * 1e6;
        }

        let regulated = stages
            .regulator
            .and_then(|id| regulate(circuit, id, stored.map(|(v, _)| v)));

        if let Some(id) = stages.load {
            let supply = regulated.or(stored.map(|(v, _)| v)).unwrap_or(0.0);
            let current_ma = self.drive_load(circuit, id, supply, stages.storage, now_ms);
            m.load_current_ma = current_ma;
            m.power_mw = supply * current_ma;
        }

        tracing::debug!(
            "Pass: gen {:.2}V rect {:.2}V store {:.3}V load {:.1}mA",
            m.generator_voltage,
            m.rectifier_voltage,
            m.storage_voltage,
            m.load_current_ma
        );
        self.measurements = m;
        m
    }

    /// Step storage toward `input`; returns (voltage, energy in joules).
    fn charge(&self, circuit: &mut Circuit, id: ComponentId, input: f64) -> Option<(f64, f64)> {
        let component = circuit.component_mut(id)?;
        let ElectricalParams::Storage { capacitance, .. } = component.params else {
            return None;
        };

        let state = &mut component.state;
        let charging = input > state.voltage;
        if charging {
            state.voltage += (input - state.voltage) * self.config.charging_rate;
            state.active = true;
        }
        state.stored_energy = 0.5 * capacitance * state.voltage * state.voltage;
        let result = (state.voltage, state.stored_energy);

        if charging {
            energize(circuit, id);
        }
        Some(result)
    }

    /// Switch the load on or off for `supply`; returns the drawn current (mA).
    fn drive_load(
        &self,
        circuit: &mut Circuit,
        id: ComponentId,
        supply: f64,
        storage: Option<ComponentId>,
        now_ms: f64,
    ) -> f64 {
        let Some(load) = circuit.component_mut(id) else {
            return 0.0;
        };
        let ElectricalParams::Load { voltage, current_ma } = load.params else {
            return 0.0;
        };

        if supply < voltage {
            load.state.current = 0.0;
            load.state.active = false;
            load.state.activated_at = None;
            return 0.0;
        }

        load.state.current = current_ma;
        load.state.active = true;
        load.state.activated_at.get_or_insert(now_ms);
        energize(circuit, id);

        if let Some(cap) = storage {
            if let Some(cap) = circuit.component_mut(cap) {
                if let ElectricalParams::Storage { capacitance, .. } = cap.params {
                    let step = self.config.discharge_step(current_ma, capacitance);
                    cap.state.voltage = (cap.state.voltage - step).max(0.0);
                }
            }
        }
        current_ma
    }
}

/// Rectifier output for a generator input.
fn rectify(circuit: &mut Circuit, id: ComponentId, input: f64) -> f64 {
    let Some(rectifier) = circuit.component_mut(id) else {
        return 0.0;
    };
    let ElectricalParams::Rectifier { voltage_drop, .. } = rectifier.params else {
        return 0.0;
    };

    let output = (input - voltage_drop).max(0.0);
    rectifier.state.voltage = output;
    rectifier.state.active = output > 0.0;
    if output > 0.0 {
        energize(circuit, id);
    }
    output
}

/// Regulator output when fed from storage; `None` while it is off.
fn regulate(circuit: &mut Circuit, id: ComponentId, storage_voltage: Option<f64>) -> Option<f64> {
    let regulator = circuit.component_mut(id)?;
    let ElectricalParams::Regulator { input_min, output, .. } = regulator.params else {
        return None;
    };

    match storage_voltage {
        Some(v) if v >= input_min => {
            regulator.state.voltage = output;
            regulator.state.active = true;
            energize(circuit, id);
            Some(output)
        }
        _ => {
            regulator.state.voltage = 0.0;
            regulator.state.active = false;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn set_voltage(circuit: &mut Circuit, id: ComponentId, v: f64) {
        circuit.component_mut(id).unwrap().state.voltage = v;
    }

    fn wire(c: &mut Circuit, a: ComponentId, pa: &str, b: ComponentId, pb: &str) {
        let from = c.point_ref(a, pa).unwrap();
        let to = c.point_ref(b, pb).unwrap();
        c.connect(from, to).unwrap();
    }

    #[test]
    fn test_config_validation() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::new().with_charging_rate(1.0).validate().is_ok());
        for rate in [0.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                EngineConfig::new().with_charging_rate(rate).validate(),
                Err(HarvestError::InvalidParameter { .. })
            ));
        }
        assert!(EngineConfig::new()
            .with_discharge_time_step(f64::INFINITY)
            .validate()
            .is_err());
    }

    #[test]
    fn test_no_generator_means_zero_snapshot() {
        let mut c = Circuit::new();
        c.apply_template(crate::circuit::template("regulated_system").unwrap());
        let cap = c.components()[2].id;
        set_voltage(&mut c, cap, 9.0);

        let mut sim = Simulator::new();
        let m = sim.simulate(&mut c, 0.0);
        assert_eq!(m, Measurements::default());
        assert!(c.wires().iter().all(|w| !w.active));
    }

    #[test]
    fn test_rectifier_drop() {
        let mut c = Circuit::new();
        let piezo = c.add_component("piezo_single", 80.0, 100.0).unwrap();
        c.add_component("bridge_rectifier", 260.0, 100.0).unwrap();
        set_voltage(&mut c, piezo, 15.0);

        let m = Simulator::new().simulate(&mut c, 0.0);
        assert_relative_eq!(m.generator_voltage, 15.0);
        assert_relative_eq!(m.rectifier_voltage, 13.6, epsilon = 1e-12);
        assert_eq!(m.stored_energy_uj, 0.0);
    }

    #[test]
    fn test_rectifier_never_negative() {
        let mut c = Circuit::new();
        let piezo = c.add_component("piezo_single", 0.0, 0.0).unwrap();
        let bridge = c.add_component("bridge_rectifier", 200.0, 0.0).unwrap();
        wire(&mut c, bridge, "dc_pos", piezo, "ac1");
        set_voltage(&mut c, piezo, 1.0);

        let m = Simulator::new().simulate(&mut c, 0.0);
        assert_eq!(m.rectifier_voltage, 0.0);
        let r = c.component(bridge).unwrap();
        assert!(!r.state.active);
        // still live through the generator
        assert!(c.wires()[0].active);
    }

    #[test]
    fn test_generators_sum() {
        let mut c = Circuit::new();
        let a = c.add_component("piezo_single", 0.0, 0.0).unwrap();
        let b = c.add_component("piezo_series", 0.0, 200.0).unwrap();
        set_voltage(&mut c, a, 15.0);
        set_voltage(&mut c, b, 30.0);
        let m = Simulator::new().simulate(&mut c, 0.0);
        assert_relative_eq!(m.generator_voltage, 45.0);
    }

    #[test]
    fn test_storage_charges_from_raw_generator_without_rectifier() {
        let mut c = Circuit::new();
        let piezo = c.add_component("piezo_single", 0.0, 0.0).unwrap();
        let cap = c.add_component("capacitor_100uf", 200.0, 0.0).unwrap();
        set_voltage(&mut c, piezo, 10.0);

        let m = Simulator::new().simulate(&mut c, 0.0);
        assert_relative_eq!(m.storage_voltage, 0.8, epsilon = 1e-12);
        let state = &c.component(cap).unwrap().state;
        assert!(state.active);
        assert_relative_eq!(state.stored_energy, 0.5 * 0.0001 * 0.8 * 0.8, epsilon = 1e-15);
    }

    #[test]
    fn test_storage_above_input_only_recomputes_energy() {
        let mut c = Circuit::new();
        let piezo = c.add_component("piezo_single", 0.0, 0.0).unwrap();
        let cap = c.add_component("capacitor_1mf", 200.0, 0.0).unwrap();
        wire(&mut c, piezo, "ac1", cap, "positive");
        set_voltage(&mut c, piezo, 2.0);
        set_voltage(&mut c, cap, 5.0);

        let m = Simulator::new().simulate(&mut c, 0.0);
        assert_eq!(m.storage_voltage, 5.0);
        assert_relative_eq!(m.stored_energy_uj, 0.5 * 0.001 * 25.0 * 1e6, epsilon = 1e-9);
        assert!(!c.component(cap).unwrap().state.active);
    }

    #[test]
    fn test_regulator_threshold() {
        let mut c = Circuit::new();
        let piezo = c.add_component("piezo_series", 0.0, 0.0).unwrap();
        let cap = c.add_component("capacitor_10mf", 200.0, 0.0).unwrap();
        let reg = c.add_component("lm7805", 400.0, 0.0).unwrap();
        set_voltage(&mut c, piezo, 30.0);

        set_voltage(&mut c, cap, 4.0);
        Simulator::new().simulate(&mut c, 0.0);
        // 4.0 + 26 * 0.08 = 6.08 < 7
        assert!(!c.component(reg).unwrap().state.active);
        assert_eq!(c.component(reg).unwrap().state.voltage, 0.0);

        set_voltage(&mut c, cap, 7.0);
        Simulator::new().simulate(&mut c, 0.0);
        assert!(c.component(reg).unwrap().state.active);
        assert_eq!(c.component(reg).unwrap().state.voltage, 5.0);
    }

    #[test]
    fn test_regulator_without_storage_stays_off() {
        let mut c = Circuit::new();
        let piezo = c.add_component("piezo_series", 0.0, 0.0).unwrap();
        let reg = c.add_component("ltc3588", 200.0, 0.0).unwrap();
        let led = c.add_component("led_red", 400.0, 0.0).unwrap();
        set_voltage(&mut c, piezo, 30.0);

        let m = Simulator::new().simulate(&mut c, 0.0);
        assert!(!c.component(reg).unwrap().state.active);
        assert!(!c.component(led).unwrap().state.active);
        assert_eq!(m.load_current_ma, 0.0);
    }

    #[test]
    fn test_load_draws_and_discharges_storage() {
        let mut c = Circuit::new();
        let piezo = c.add_component("piezo_single", 0.0, 0.0).unwrap();
        let cap = c.add_component("capacitor_1mf", 200.0, 0.0).unwrap();
        let led = c.add_component("led_red", 400.0, 0.0).unwrap();
        wire(&mut c, cap, "positive", led, "anode");
        set_voltage(&mut c, piezo, 3.0);
        set_voltage(&mut c, cap, 2.5);

        let m = Simulator::new().simulate(&mut c, 42.0);
        let charged = 2.5 + 0.5 * 0.08;
        assert_relative_eq!(m.storage_voltage, charged, epsilon = 1e-12);
        assert_eq!(m.load_current_ma, 20.0);
        assert_relative_eq!(m.power_mw, charged * 20.0, epsilon = 1e-9);

        // (20 mA / 1000) / (1 mF * 1000) * 0.01
        let after = c.component(cap).unwrap().state.voltage;
        assert_relative_eq!(after, charged - 0.0002, epsilon = 1e-12);

        let load = &c.component(led).unwrap().state;
        assert!(load.active);
        assert_eq!(load.activated_at, Some(42.0));
        assert!(c.wires()[0].active);
    }

    #[test]
    fn test_regulated_supply_feeds_load() {
        let mut c = Circuit::new();
        c.apply_template(crate::circuit::template("regulated_system").unwrap());
        let ids: Vec<_> = c.components().iter().map(|x| x.id).collect();
        set_voltage(&mut c, ids[0], 30.0);
        set_voltage(&mut c, ids[2], 6.0);

        let m = Simulator::new().simulate(&mut c, 0.0);
        // ltc3588 outputs 3.3V, below the usb port's 5V
        assert!(c.component(ids[3]).unwrap().state.active);
        assert_eq!(m.load_current_ma, 0.0);
        assert!(!c.component(ids[4]).unwrap().state.active);
        // the port's wires carry nothing of their own, but the regulator's do
        assert!(c.wires().iter().all(|w| w.active));
    }

    #[test]
    fn test_load_falls_back_to_storage_when_regulator_off() {
        let mut c = Circuit::new();
        let piezo = c.add_component("piezo_single", 0.0, 0.0).unwrap();
        let cap = c.add_component("capacitor_1mf", 200.0, 0.0).unwrap();
        c.add_component("lm7805", 400.0, 0.0).unwrap();
        let led = c.add_component("led_white", 600.0, 0.0).unwrap();
        set_voltage(&mut c, piezo, 15.0);
        set_voltage(&mut c, cap, 4.0);

        let m = Simulator::new().simulate(&mut c, 0.0);
        assert!(c.component(led).unwrap().state.active);
        assert_eq!(m.load_current_ma, 20.0);
    }

    #[test]
    fn test_discharge_floors_at_zero() {
        let config = EngineConfig::new().with_discharge_time_step(1000.0);
        let mut c = Circuit::new();
        let piezo = c.add_component("piezo_single", 0.0, 0.0).unwrap();
        let cap = c.add_component("capacitor_100uf", 200.0, 0.0).unwrap();
        c.add_component("usb_port", 400.0, 0.0).unwrap();
        set_voltage(&mut c, piezo, 15.0);
        set_voltage(&mut c, cap, 6.0);

        Simulator::with_config(config).simulate(&mut c, 0.0);
        assert_eq!(c.component(cap).unwrap().state.voltage, 0.0);
    }

    #[test]
    fn test_only_first_of_a_role_is_modeled() {
        let mut c = Circuit::new();
        let piezo = c.add_component("piezo_single", 0.0, 0.0).unwrap();
        let first = c.add_component("bridge_rectifier", 200.0, 0.0).unwrap();
        let second = c.add_component("bridge_rectifier", 400.0, 0.0).unwrap();
        set_voltage(&mut c, piezo, 15.0);

        Simulator::new().simulate(&mut c, 0.0);
        assert!(c.component(first).unwrap().state.active);
        assert!(!c.component(second).unwrap().state.active);
        assert_eq!(
            representative(&c, StageRole::Rectifier, StageSelection::FirstPlaced),
            Some(first)
        );
        assert_eq!(unmodeled_components(&c, StageSelection::default()), vec![second]);
    }

    #[test]
    fn test_repeated_passes_converge() {
        let mut c = Circuit::new();
        c.apply_template(crate::circuit::template("basic_harvester").unwrap());
        let piezo = c.components()[0].id;
        let cap = c.components()[2].id;
        set_voltage(&mut c, piezo, 15.0);

        let mut sim = Simulator::new();
        let previous = (0..600).map(|_| sim.simulate(&mut c, 0.0)).last().unwrap();
        let flags: Vec<bool> = c.wires().iter().map(|w| w.active).collect();
        let v = c.component(cap).unwrap().state.voltage;

        let next = sim.simulate(&mut c, 0.0);
        assert_eq!(next.generator_voltage, previous.generator_voltage);
        assert_eq!(next.rectifier_voltage, previous.rectifier_voltage);
        assert_eq!(next.load_current_ma, previous.load_current_ma);
        assert_relative_eq!(next.storage_voltage, previous.storage_voltage, epsilon = 1e-9);
        assert_relative_eq!(c.component(cap).unwrap().state.voltage, v, epsilon = 1e-9);
        assert_eq!(c.wires().iter().map(|w| w.active).collect::<Vec<_>>(), flags);
    }
}
