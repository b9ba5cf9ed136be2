//! Component catalog.
//!
//! This module describes every placeable component:
//! - Generators: single, series, parallel and quad piezo discs
//! - Rectification: bridge rectifier, plain and Schottky diodes
//! - Storage: electrolytic capacitors, Li-ion cell
//! - Regulation: LM7805, LTC3588
//! - Loads: LEDs, USB port
//!
//! Catalog entries are immutable `'static` data. Placed instances copy the
//! electrical parameters out of the entry, so nothing a session does can
//! reach back into the catalog.

mod catalog;

pub use catalog::{catalog, spec_for};

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::circuit::Point;
use crate::error::{HarvestError, Result};

/// Terminal polarity of a connection point, and the polarity class of a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
    Ac,
}

impl Polarity {
    /// Polarity class of a wire joining two terminals.
    ///
    /// AC wins over everything, then negative, then positive.
    pub fn wire_class(a: Polarity, b: Polarity) -> Polarity {
        match (a, b) {
            (Polarity::Ac, _) | (_, Polarity::Ac) => Polarity::Ac,
            (Polarity::Negative, _) | (_, Polarity::Negative) => Polarity::Negative,
            _ => Polarity::Positive,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Positive => write!(f, "positive"),
            Polarity::Negative => write!(f, "negative"),
            Polarity::Ac => write!(f, "ac"),
        }
    }
}

/// A named terminal at a fixed offset from the component's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConnectionPointSpec {
    pub id: &'static str,
    pub offset: Point,
    pub polarity: Polarity,
}

impl ConnectionPointSpec {
    const fn new(id: &'static str, x: f64, y: f64, polarity: Polarity) -> Self {
        Self {
            id,
            offset: Point::new(x, y),
            polarity,
        }
    }
}

/// One of the five stages of the harvesting chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageRole {
    Generator,
    Rectifier,
    Storage,
    Regulator,
    Load,
}

impl StageRole {
    /// All roles in propagation order.
    pub const ALL: [StageRole; 5] = [
        StageRole::Generator,
        StageRole::Rectifier,
        StageRole::Storage,
        StageRole::Regulator,
        StageRole::Load,
    ];
}

/// Electrical parameters, typed per component family.
///
/// Currents are in milliamps, capacitances in farads, everything else in
/// volts or dimensionless ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ElectricalParams {
    Generator { voltage_peak: f64, current_peak_ma: f64 },
    Rectifier { voltage_drop: f64, efficiency: f64 },
    Diode { forward_voltage: f64 },
    Storage { capacitance: f64, voltage_rating: f64 },
    Battery { voltage: f64, capacity_mah: f64 },
    Regulator { input_min: f64, output: f64, efficiency: f64 },
    Load { voltage: f64, current_ma: f64 },
}

impl ElectricalParams {
    /// The simulation stage this family takes part in, if any.
    ///
    /// Diodes and batteries can be placed and wired but are not modeled.
    pub fn role(&self) -> Option<StageRole> {
        match self {
            ElectricalParams::Generator { .. } => Some(StageRole::Generator),
            ElectricalParams::Rectifier { .. } => Some(StageRole::Rectifier),
            ElectricalParams::Storage { .. } => Some(StageRole::Storage),
            ElectricalParams::Regulator { .. } => Some(StageRole::Regulator),
            ElectricalParams::Load { .. } => Some(StageRole::Load),
            ElectricalParams::Diode { .. } | ElectricalParams::Battery { .. } => None,
        }
    }
}

/// Immutable catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentSpec {
    pub kind: ComponentKind,
    pub label: &'static str,
    pub width: f64,
    pub height: f64,
    pub params: ElectricalParams,
    pub points: &'static [ConnectionPointSpec],
}

impl ComponentSpec {
    /// Look up a connection point by id.
    pub fn point(&self, id: &str) -> Option<&'static ConnectionPointSpec> {
        self.points.iter().find(|p| p.id == id)
    }
}

/// Every kind of component the catalog knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    PiezoSingle,
    PiezoSeries,
    PiezoParallel,
    PiezoQuad,
    Diode,
    BridgeRectifier,
    SchottkyDiode,
    Capacitor100uf,
    Capacitor1mf,
    Capacitor10mf,
    BatteryLiion,
    Lm7805,
    Ltc3588,
    LedRed,
    LedWhite,
    UsbPort,
}

impl ComponentKind {
    /// All kinds, in catalog order.
    pub const ALL: [ComponentKind; 16] = [
        ComponentKind::PiezoSingle,
        ComponentKind::PiezoSeries,
        ComponentKind::PiezoParallel,
        ComponentKind::PiezoQuad,
        ComponentKind::Diode,
        ComponentKind::BridgeRectifier,
        ComponentKind::SchottkyDiode,
        ComponentKind::Capacitor100uf,
        ComponentKind::Capacitor1mf,
        ComponentKind::Capacitor10mf,
        ComponentKind::BatteryLiion,
        ComponentKind::Lm7805,
        ComponentKind::Ltc3588,
        ComponentKind::LedRed,
        ComponentKind::LedWhite,
        ComponentKind::UsbPort,
    ];

    /// Catalog name, as used by templates and the renderer.
    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::PiezoSingle => "piezo_single",
            ComponentKind::PiezoSeries => "piezo_series",
            ComponentKind::PiezoParallel => "piezo_parallel",
            ComponentKind::PiezoQuad => "piezo_quad",
            ComponentKind::Diode => "diode",
            ComponentKind::BridgeRectifier => "bridge_rectifier",
            ComponentKind::SchottkyDiode => "schottky_diode",
            ComponentKind::Capacitor100uf => "capacitor_100uf",
            ComponentKind::Capacitor1mf => "capacitor_1mf",
            ComponentKind::Capacitor10mf => "capacitor_10mf",
            ComponentKind::BatteryLiion => "battery_liion",
            ComponentKind::Lm7805 => "lm7805",
            ComponentKind::Ltc3588 => "ltc3588",
            ComponentKind::LedRed => "led_red",
            ComponentKind::LedWhite => "led_white",
            ComponentKind::UsbPort => "usb_port",
        }
    }

    /// The catalog entry for this kind.
    pub fn spec(&self) -> &'static ComponentSpec {
        catalog::entry(*self)
    }

    /// Stage role of this kind, if modeled.
    pub fn role(&self) -> Option<StageRole> {
        self.spec().params.role()
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComponentKind {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self> {
        ComponentKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| HarvestError::UnknownKind { kind: s.to_string() })
    }
}
