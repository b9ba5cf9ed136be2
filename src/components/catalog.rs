//! Static catalog table.

use super::{ComponentKind, ComponentSpec, ConnectionPointSpec as Pin, ElectricalParams, Polarity};
use crate::error::Result;

use Polarity::{Ac, Negative, Positive};

const PIEZO_NARROW: &[Pin] = &[Pin::new("ac1", 20.0, 40.0, Ac), Pin::new("ac2", 100.0, 40.0, Ac)];
const PIEZO_WIDE: &[Pin] = &[Pin::new("ac1", 20.0, 40.0, Ac), Pin::new("ac2", 140.0, 40.0, Ac)];
const PIEZO_TALL: &[Pin] = &[Pin::new("ac1", 20.0, 60.0, Ac), Pin::new("ac2", 100.0, 60.0, Ac)];
const PIEZO_QUAD: &[Pin] = &[Pin::new("ac1", 20.0, 60.0, Ac), Pin::new("ac2", 140.0, 60.0, Ac)];

const DIODE: &[Pin] = &[
    Pin::new("anode", 10.0, 25.0, Positive),
    Pin::new("cathode", 70.0, 25.0, Negative),
];

const BRIDGE: &[Pin] = &[
    Pin::new("ac1", 10.0, 50.0, Ac),
    Pin::new("ac2", 110.0, 50.0, Ac),
    Pin::new("dc_pos", 60.0, 10.0, Positive),
    Pin::new("dc_neg", 60.0, 90.0, Negative),
];

const CAP_SMALL: &[Pin] = &[
    Pin::new("positive", 20.0, 40.0, Positive),
    Pin::new("negative", 60.0, 40.0, Negative),
];
const CAP_MEDIUM: &[Pin] = &[
    Pin::new("positive", 25.0, 40.0, Positive),
    Pin::new("negative", 75.0, 40.0, Negative),
];
const CAP_LARGE: &[Pin] = &[
    Pin::new("positive", 30.0, 40.0, Positive),
    Pin::new("negative", 90.0, 40.0, Negative),
];

const BATTERY: &[Pin] = &[
    Pin::new("positive", 20.0, 30.0, Positive),
    Pin::new("negative", 80.0, 30.0, Negative),
];

const LM7805: &[Pin] = &[
    Pin::new("input", 20.0, 25.0, Positive),
    Pin::new("ground", 60.0, 70.0, Negative),
    Pin::new("output", 100.0, 25.0, Positive),
];
const LTC3588: &[Pin] = &[
    Pin::new("vin", 20.0, 25.0, Positive),
    Pin::new("gnd", 60.0, 70.0, Negative),
    Pin::new("vout", 100.0, 25.0, Positive),
];

const LED: &[Pin] = &[
    Pin::new("anode", 15.0, 30.0, Positive),
    Pin::new("cathode", 45.0, 30.0, Negative),
];

const USB: &[Pin] = &[
    Pin::new("vbus", 20.0, 20.0, Positive),
    Pin::new("gnd", 20.0, 40.0, Negative),
];

/// Catalog entries, indexed by `ComponentKind` discriminant.
static CATALOG: [ComponentSpec; 16] = [
    ComponentSpec {
        kind: ComponentKind::PiezoSingle,
        label: "15V/2mA",
        width: 120.0,
        height: 80.0,
        params: ElectricalParams::Generator { voltage_peak: 15.0, current_peak_ma: 2.0 },
        points: PIEZO_NARROW,
    },
    ComponentSpec {
        kind: ComponentKind::PiezoSeries,
        label: "30V/2mA",
        width: 160.0,
        height: 80.0,
        params: ElectricalParams::Generator { voltage_peak: 30.0, current_peak_ma: 2.0 },
        points: PIEZO_WIDE,
    },
    ComponentSpec {
        kind: ComponentKind::PiezoParallel,
        label: "15V/4mA",
        width: 120.0,
        height: 120.0,
        params: ElectricalParams::Generator { voltage_peak: 15.0, current_peak_ma: 4.0 },
        points: PIEZO_TALL,
    },
    ComponentSpec {
        kind: ComponentKind::PiezoQuad,
        label: "30V/4mA",
        width: 160.0,
        height: 120.0,
        params: ElectricalParams::Generator { voltage_peak: 30.0, current_peak_ma: 4.0 },
        points: PIEZO_QUAD,
    },
    ComponentSpec {
        kind: ComponentKind::Diode,
        label: "0.7V",
        width: 80.0,
        height: 50.0,
        params: ElectricalParams::Diode { forward_voltage: 0.7 },
        points: DIODE,
    },
    ComponentSpec {
        kind: ComponentKind::BridgeRectifier,
        label: "Bridge",
        width: 120.0,
        height: 100.0,
        params: ElectricalParams::Rectifier { voltage_drop: 1.4, efficiency: 0.9 },
        points: BRIDGE,
    },
    ComponentSpec {
        kind: ComponentKind::SchottkyDiode,
        label: "0.3V",
        width: 80.0,
        height: 50.0,
        params: ElectricalParams::Diode { forward_voltage: 0.3 },
        points: DIODE,
    },
    ComponentSpec {
        kind: ComponentKind::Capacitor100uf,
        label: "100µF/16V",
        width: 80.0,
        height: 80.0,
        params: ElectricalParams::Storage { capacitance: 0.0001, voltage_rating: 16.0 },
        points: CAP_SMALL,
    },
    ComponentSpec {
        kind: ComponentKind::Capacitor1mf,
        label: "1mF/25V",
        width: 100.0,
        height: 80.0,
        params: ElectricalParams::Storage { capacitance: 0.001, voltage_rating: 25.0 },
        points: CAP_MEDIUM,
    },
    ComponentSpec {
        kind: ComponentKind::Capacitor10mf,
        label: "10mF/16V",
        width: 120.0,
        height: 80.0,
        params: ElectricalParams::Storage { capacitance: 0.01, voltage_rating: 16.0 },
        points: CAP_LARGE,
    },
    ComponentSpec {
        kind: ComponentKind::BatteryLiion,
        label: "3.7V Li-ion",
        width: 100.0,
        height: 60.0,
        params: ElectricalParams::Battery { voltage: 3.7, capacity_mah: 2000.0 },
        points: BATTERY,
    },
    ComponentSpec {
        kind: ComponentKind::Lm7805,
        label: "5V Reg",
        width: 120.0,
        height: 80.0,
        params: ElectricalParams::Regulator { input_min: 7.0, output: 5.0, efficiency: 0.7 },
        points: LM7805,
    },
    ComponentSpec {
        kind: ComponentKind::Ltc3588,
        label: "3.3V Reg",
        width: 120.0,
        height: 80.0,
        params: ElectricalParams::Regulator { input_min: 2.7, output: 3.3, efficiency: 0.9 },
        points: LTC3588,
    },
    ComponentSpec {
        kind: ComponentKind::LedRed,
        label: "Red LED",
        width: 60.0,
        height: 60.0,
        params: ElectricalParams::Load { voltage: 2.0, current_ma: 20.0 },
        points: LED,
    },
    ComponentSpec {
        kind: ComponentKind::LedWhite,
        label: "White LED",
        width: 60.0,
        height: 60.0,
        params: ElectricalParams::Load { voltage: 3.3, current_ma: 20.0 },
        points: LED,
    },
    ComponentSpec {
        kind: ComponentKind::UsbPort,
        label: "USB Port",
        width: 100.0,
        height: 60.0,
        params: ElectricalParams::Load { voltage: 5.0, current_ma: 500.0 },
        points: USB,
    },
];

pub(super) fn entry(kind: ComponentKind) -> &'static ComponentSpec {
    &CATALOG[kind as usize]
}

/// Every catalog entry, in declaration order.
pub fn catalog() -> &'static [ComponentSpec] {
    &CATALOG
}

/// Look up a catalog entry by its kind name.
pub fn spec_for(kind: &str) -> Result<&'static ComponentSpec> {
    kind.parse::<ComponentKind>().map(|k| k.spec())
}
