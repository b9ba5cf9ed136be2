//! Circuit graph structure.

use serde::Serialize;

use super::interaction::Interaction;
use super::types::{ComponentId, Point, PointRef, WireId};
use crate::components::{ComponentKind, ComponentSpec, ElectricalParams, Polarity, StageRole};
use crate::error::{HarvestError, Result};

/// A connection point on a placed component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionPoint {
    pub id: &'static str,
    /// Offset from the component's top-left corner
    pub offset: Point,
    pub polarity: Polarity,
    /// Canvas position, always `position + offset` of the owner
    pub absolute: Point,
}

/// Derived electrical state of a placed component.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ElectricalState {
    /// Terminal / output voltage in volts
    pub voltage: f64,
    /// Drawn current in milliamps (loads only)
    pub current: f64,
    pub active: bool,
    /// Stored energy in joules (storage only)
    pub stored_energy: f64,
    /// Session clock (ms) when the component last switched on
    pub activated_at: Option<f64>,
}

impl ElectricalState {
    /// Back to the powered-off state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A component placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentInstance {
    pub id: ComponentId,
    pub kind: ComponentKind,
    /// Top-left corner, grid-snapped
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Per-instance copy of the catalog parameters
    pub params: ElectricalParams,
    pub connection_points: Vec<ConnectionPoint>,
    pub state: ElectricalState,
}

impl ComponentInstance {
    fn new(id: ComponentId, spec: &ComponentSpec, position: Point) -> Self {
        let connection_points = spec
            .points
            .iter()
            .map(|p| ConnectionPoint {
                id: p.id,
                offset: p.offset,
                polarity: p.polarity,
                absolute: position + p.offset,
            })
            .collect();

        Self {
            id,
            kind: spec.kind,
            position,
            width: spec.width,
            height: spec.height,
            params: spec.params,
            connection_points,
            state: ElectricalState::default(),
        }
    }

    /// Stage role of this component, if it takes part in the simulation.
    pub fn role(&self) -> Option<StageRole> {
        self.params.role()
    }

    /// Find a connection point by id.
    pub fn point(&self, id: &str) -> Option<&ConnectionPoint> {
        self.connection_points.iter().find(|p| p.id == id)
    }

    /// Inclusive bounding-box test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.position.x
            && p.x <= self.position.x + self.width
            && p.y >= self.position.y
            && p.y <= self.position.y + self.height
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
        for point in &mut self.connection_points {
            point.absolute = position + point.offset;
        }
    }
}

/// One end of a wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WireEnd {
    pub point: PointRef,
    pub polarity: Polarity,
    /// Cached canvas position of the referenced point
    pub position: Point,
}

/// A wire between two connection points on distinct components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wire {
    pub id: WireId,
    pub start: WireEnd,
    pub end: WireEnd,
    pub polarity: Polarity,
    /// Set by the simulation pass when current flows
    pub active: bool,
}

impl Wire {
    /// Whether either end sits on the given component.
    pub fn touches(&self, component: ComponentId) -> bool {
        self.start.point.component == component || self.end.point.component == component
    }

    /// Whether this wire joins `a` and `b`, in either direction.
    pub fn joins(&self, a: PointRef, b: PointRef) -> bool {
        (self.start.point == a && self.end.point == b) || (self.start.point == b && self.end.point == a)
    }
}

/// The mutable circuit: placed components, wires, and editor state.
#[derive(Debug, Default)]
pub struct Circuit {
    pub(super) components: Vec<ComponentInstance>,
    pub(super) wires: Vec<Wire>,
    pub(super) next_component_id: usize,
    pub(super) next_wire_id: usize,
    pub(super) interaction: Interaction,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self {
            next_component_id: 1,
            next_wire_id: 1,
            ..Default::default()
        }
    }

    /// Components in insertion (z-) order.
    pub fn components(&self) -> &[ComponentInstance] {
        &self.components
    }

    /// Wires in creation order.
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn component(&self, id: ComponentId) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.iter().find(|w| w.id == id)
    }

    pub(crate) fn component_mut(&mut self, id: ComponentId) -> Option<&mut ComponentInstance> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    pub(crate) fn components_mut(&mut self) -> &mut [ComponentInstance] {
        &mut self.components
    }

    pub(crate) fn wires_mut(&mut self) -> &mut [Wire] {
        &mut self.wires
    }

    /// Place a component by catalog name. The position is snapped to the grid.
    pub fn add_component(&mut self, kind: &str, x: f64, y: f64) -> Result<ComponentId> {
        let kind: ComponentKind = kind.parse()?;
        Ok(self.place(kind, x, y))
    }

    /// Place a component of a known kind.
    pub fn place(&mut self, kind: ComponentKind, x: f64, y: f64) -> ComponentId {
        let id = ComponentId(self.next_component_id);
        self.next_component_id += 1;

        let position = Point::new(x, y).snapped();
        self.components.push(ComponentInstance::new(id, kind.spec(), position));
        tracing::debug!("Placed {} as {} at ({}, {})", kind, id, position.x, position.y);
        id
    }

    /// Move a component, snapping to the grid and refreshing every cached
    /// point and wire-end position that depends on it.
    pub fn move_component(&mut self, id: ComponentId, x: f64, y: f64) -> Result<()> {
        let position = Point::new(x, y).snapped();
        let component = self
            .component_mut(id)
            .ok_or_else(|| HarvestError::missing_component(id))?;
        component.set_position(position);
        let component = component.clone();

        for wire in self.wires.iter_mut().filter(|w| w.touches(id)) {
            for end in [&mut wire.start, &mut wire.end] {
                if end.point.component == id {
                    if let Some(p) = component.point(end.point.point) {
                        end.position = p.absolute;
                    }
                }
            }
        }
        Ok(())
    }

    /// Remove a component together with every wire touching it.
    pub fn remove_component(&mut self, id: ComponentId) -> Result<()> {
        let index = self
            .components
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| HarvestError::missing_component(id))?;

        self.wires.retain(|w| !w.touches(id));
        self.components.remove(index);
        self.interaction.forget(id);
        tracing::debug!("Removed {}", id);
        Ok(())
    }

    /// Resolve a connection point by component id and point name.
    pub fn point_ref(&self, component: ComponentId, point: &str) -> Result<PointRef> {
        let instance = self
            .component(component)
            .ok_or_else(|| HarvestError::missing_component(component))?;
        let point = instance
            .point(point)
            .ok_or_else(|| HarvestError::missing(format!("{component}.{point}")))?;
        Ok(PointRef::new(component, point.id))
    }

    fn wire_end(&self, point: PointRef) -> Result<WireEnd> {
        let cp = self
            .component(point.component)
            .and_then(|c| c.point(point.point))
            .ok_or_else(|| HarvestError::missing(point.to_string()))?;
        Ok(WireEnd {
            point,
            polarity: cp.polarity,
            position: cp.absolute,
        })
    }

    /// Wire two connection points on distinct components.
    pub fn connect(&mut self, a: PointRef, b: PointRef) -> Result<WireId> {
        let start = self.wire_end(a)?;
        let end = self.wire_end(b)?;

        if a.component == b.component {
            return Err(HarvestError::SelfConnection {
                component: a.component,
            });
        }
        if self.wires.iter().any(|w| w.joins(a, b)) {
            return Err(HarvestError::DuplicateWire {
                a: a.to_string(),
                b: b.to_string(),
            });
        }

        let id = WireId(self.next_wire_id);
        self.next_wire_id += 1;
        let polarity = Polarity::wire_class(start.polarity, end.polarity);
        self.wires.push(Wire {
            id,
            start,
            end,
            polarity,
            active: false,
        });
        tracing::debug!("Created {} wire {} from {} to {}", polarity, id, a, b);
        Ok(id)
    }

    /// Remove a wire. Unknown ids are ignored.
    pub fn disconnect(&mut self, id: WireId) {
        self.wires.retain(|w| w.id != id);
    }

    /// Remove everything. Ids keep counting up.
    pub fn clear(&mut self) {
        self.components.clear();
        self.wires.clear();
        self.interaction = Interaction::default();
    }
}
