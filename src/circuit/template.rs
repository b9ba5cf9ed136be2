//! Starter circuits.
//!
//! A template is a literal list of placements and a literal list of wires
//! between `(placement index, terminal)` pairs. Templates are applied through
//! the ordinary [`Circuit::place`] and [`Circuit::connect`] operations, so
//! they obey every graph invariant.

use serde::Serialize;

use super::graph::Circuit;
use super::types::{ComponentId, WireId};
use crate::components::ComponentKind;
use crate::error::{HarvestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub kind: ComponentKind,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemplateWire {
    pub from: usize,
    pub from_point: &'static str,
    pub to: usize,
    pub to_point: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Template {
    pub name: &'static str,
    pub components: &'static [Placement],
    pub wires: &'static [TemplateWire],
}

/// What a template load produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateReport {
    pub components: Vec<ComponentId>,
    pub wires: Vec<WireId>,
    /// Wires that could not be created, with the reason
    pub skipped: Vec<HarvestError>,
}

const fn place(kind: ComponentKind, x: f64, y: f64) -> Placement {
    Placement { kind, x, y }
}

const fn wire(from: usize, from_point: &'static str, to: usize, to_point: &'static str) -> TemplateWire {
    TemplateWire {
        from,
        from_point,
        to,
        to_point,
    }
}

static TEMPLATES: [Template; 2] = [
    Template {
        name: "basic_harvester",
        components: &[
            place(ComponentKind::PiezoSingle, 80.0, 100.0),
            place(ComponentKind::BridgeRectifier, 260.0, 100.0),
            place(ComponentKind::Capacitor1mf, 440.0, 110.0),
            place(ComponentKind::LedRed, 600.0, 110.0),
        ],
        wires: &[
            wire(0, "ac1", 1, "ac1"),
            wire(0, "ac2", 1, "ac2"),
            wire(1, "dc_pos", 2, "positive"),
            wire(1, "dc_neg", 2, "negative"),
            wire(2, "positive", 3, "anode"),
            wire(2, "negative", 3, "cathode"),
        ],
    },
    Template {
        name: "regulated_system",
        components: &[
            place(ComponentKind::PiezoSeries, 60.0, 80.0),
            place(ComponentKind::BridgeRectifier, 280.0, 80.0),
            place(ComponentKind::Capacitor10mf, 460.0, 90.0),
            place(ComponentKind::Ltc3588, 640.0, 80.0),
            place(ComponentKind::UsbPort, 820.0, 90.0),
        ],
        wires: &[
            wire(0, "ac1", 1, "ac1"),
            wire(0, "ac2", 1, "ac2"),
            wire(1, "dc_pos", 2, "positive"),
            wire(1, "dc_neg", 2, "negative"),
            wire(2, "positive", 3, "vin"),
            wire(2, "negative", 3, "gnd"),
            wire(3, "vout", 4, "vbus"),
            wire(3, "gnd", 4, "gnd"),
        ],
    },
];

/// All built-in templates.
pub fn templates() -> &'static [Template] {
    &TEMPLATES
}

/// Look up a built-in template by name.
pub fn template(name: &str) -> Result<&'static Template> {
    TEMPLATES
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| HarvestError::UnknownTemplate {
            name: name.to_string(),
        })
}

impl Circuit {
    /// Replace the circuit's contents with a template.
    ///
    /// A wire naming a placement index or terminal that does not exist is
    /// skipped; the rest of the template still loads.
    pub fn apply_template(&mut self, template: &Template) -> TemplateReport {
        self.clear();

        let mut report = TemplateReport {
            components: template
                .components
                .iter()
                .map(|p| self.place(p.kind, p.x, p.y))
                .collect(),
            ..Default::default()
        };

        for w in template.wires {
            match self.template_wire(&report.components, w) {
                Ok(id) => report.wires.push(id),
                Err(e) => {
                    tracing::warn!("Skipping wire in template '{}': {}", template.name, e);
                    report.skipped.push(e);
                }
            }
        }

        tracing::info!(
            "Loaded template '{}' ({} components, {} wires)",
            template.name,
            report.components.len(),
            report.wires.len()
        );
        report
    }

    fn template_wire(&mut self, placed: &[ComponentId], w: &TemplateWire) -> Result<WireId> {
        let lookup = |index: usize| {
            placed
                .get(index)
                .copied()
                .ok_or_else(|| HarvestError::missing(format!("template component #{index}")))
        };
        let from = self.point_ref(lookup(w.from)?, w.from_point)?;
        let to = self.point_ref(lookup(w.to)?, w.to_point)?;
        self.connect(from, to)
    }
}
