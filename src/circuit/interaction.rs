//! Editor state the renderer draws on top of the circuit: selection, the
//! wire being drafted, the hovered terminal, and the component being dragged.

use serde::Serialize;

use super::graph::{Circuit, ComponentInstance};
use super::types::{ComponentId, Point, PointRef, WireId};
use crate::error::{HarvestError, Result};

/// Straight preview line from the draft's first terminal to the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviewLine {
    pub from: Point,
    pub to: Point,
}

/// A component being dragged, with the cursor's offset from its corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Drag {
    pub component: ComponentId,
    pub grab_offset: Point,
}

/// Editor state owned by a [`Circuit`].
///
/// Every component id held here refers to a placed component; removing the
/// component clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Interaction {
    pub selected: Option<ComponentId>,
    pub wire_mode: bool,
    /// First terminal of a wire being drafted
    pub wire_start: Option<PointRef>,
    pub preview: Option<PreviewLine>,
    pub hovered: Option<PointRef>,
    pub drag: Option<Drag>,
}

impl Interaction {
    /// Drop every reference to a component that is going away.
    pub(super) fn forget(&mut self, id: ComponentId) {
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.wire_start.is_some_and(|p| p.component == id) {
            self.wire_start = None;
            self.preview = None;
        }
        if self.hovered.is_some_and(|p| p.component == id) {
            self.hovered = None;
        }
        if self.drag.is_some_and(|d| d.component == id) {
            self.drag = None;
        }
    }
}

impl Circuit {
    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Select a component, or clear the selection with `None`.
    pub fn select(&mut self, id: Option<ComponentId>) -> Result<()> {
        if let Some(id) = id {
            if self.component(id).is_none() {
                return Err(HarvestError::missing_component(id));
            }
        }
        self.interaction.selected = id;
        Ok(())
    }

    pub fn selected(&self) -> Option<&ComponentInstance> {
        self.interaction.selected.and_then(|id| self.component(id))
    }

    pub fn set_wire_mode(&mut self, on: bool) {
        self.interaction.wire_mode = on;
        if !on {
            self.cancel_wire();
        }
    }

    /// Drop the wire being drafted.
    pub fn cancel_wire(&mut self) {
        self.interaction.wire_start = None;
        self.interaction.preview = None;
    }

    /// Handle a click on a terminal while in wire mode.
    ///
    /// The first click starts a draft. The second click on another component
    /// creates the wire and ends the draft; a second click on the same
    /// component is rejected and the draft is kept.
    pub fn click_point(&mut self, point: PointRef) -> Result<Option<WireId>> {
        if !self.interaction.wire_mode {
            return Ok(None);
        }
        // validate before touching the draft
        self.point_ref(point.component, point.point)?;

        let Some(start) = self.interaction.wire_start else {
            self.interaction.wire_start = Some(point);
            return Ok(None);
        };
        if start.component == point.component {
            return Err(HarvestError::SelfConnection {
                component: point.component,
            });
        }

        let result = self.connect(start, point);
        self.cancel_wire();
        result.map(Some)
    }

    /// Handle a canvas click in wire mode: clicks on a terminal go to
    /// [`click_point`](Self::click_point), clicks on empty space drop the draft.
    pub fn click_canvas(&mut self, x: f64, y: f64) -> Result<Option<WireId>> {
        match self.connection_point_at(x, y) {
            Some(point) => self.click_point(point),
            None => {
                self.cancel_wire();
                Ok(None)
            }
        }
    }

    /// Stretch the preview line to the cursor.
    pub fn update_preview(&mut self, x: f64, y: f64) {
        let from = self
            .interaction
            .wire_start
            .and_then(|p| self.component(p.component).and_then(|c| c.point(p.point)))
            .map(|cp| cp.absolute);
        self.interaction.preview = from.map(|from| PreviewLine {
            from,
            to: Point::new(x, y),
        });
    }

    /// Record the terminal under the cursor.
    pub fn hover(&mut self, x: f64, y: f64) -> Option<PointRef> {
        self.interaction.hovered = self.connection_point_at(x, y);
        self.interaction.hovered
    }

    /// Grab the topmost component under the cursor. Ignored in wire mode.
    pub fn begin_drag(&mut self, x: f64, y: f64) -> Option<ComponentId> {
        if self.interaction.wire_mode {
            return None;
        }
        let cursor = Point::new(x, y);
        self.interaction.drag = self.component_at(x, y).map(|c| Drag {
            component: c.id,
            grab_offset: Point::new(cursor.x - c.position.x, cursor.y - c.position.y),
        });
        self.interaction.drag.map(|d| d.component)
    }

    /// Move the grabbed component so the grab point follows the cursor.
    pub fn drag_to(&mut self, x: f64, y: f64) -> Result<()> {
        match self.interaction.drag {
            Some(drag) => self.move_component(
                drag.component,
                x - drag.grab_offset.x,
                y - drag.grab_offset.y,
            ),
            None => Ok(()),
        }
    }

    pub fn end_drag(&mut self) {
        self.interaction.drag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circuit() -> (Circuit, ComponentId, ComponentId) {
        let mut c = Circuit::new();
        let piezo = c.add_component("piezo_single", 80.0, 100.0).unwrap();
        let bridge = c.add_component("bridge_rectifier", 260.0, 100.0).unwrap();
        (c, piezo, bridge)
    }

    #[test]
    fn test_wire_draft_flow() {
        let (mut c, piezo, bridge) = circuit();
        c.set_wire_mode(true);

        // piezo ac2 sits at (180, 140)
        assert_eq!(c.click_canvas(181.0, 139.0).unwrap(), None);
        assert_eq!(c.interaction().wire_start, Some(PointRef::new(piezo, "ac2")));

        c.update_preview(220.0, 150.0);
        let preview = c.interaction().preview.unwrap();
        assert_eq!(preview.from, Point::new(180.0, 140.0));

        // bridge ac1 sits at (270, 150)
        let wire = c.click_canvas(270.0, 150.0).unwrap().unwrap();
        let w = c.wire(wire).unwrap();
        assert_eq!(w.start.point, PointRef::new(piezo, "ac2"));
        assert_eq!(w.end.point, PointRef::new(bridge, "ac1"));
        assert!(c.interaction().wire_start.is_none());
        assert!(c.interaction().preview.is_none());
    }

    #[test]
    fn test_same_component_click_keeps_draft() {
        let (mut c, piezo, _) = circuit();
        c.set_wire_mode(true);
        c.click_point(PointRef::new(piezo, "ac1")).unwrap();
        let err = c.click_point(PointRef::new(piezo, "ac2")).unwrap_err();
        assert_eq!(err, HarvestError::SelfConnection { component: piezo });
        assert_eq!(c.interaction().wire_start, Some(PointRef::new(piezo, "ac1")));
    }

    #[test]
    fn test_empty_click_cancels_draft() {
        let (mut c, piezo, _) = circuit();
        c.set_wire_mode(true);
        c.click_point(PointRef::new(piezo, "ac1")).unwrap();
        assert_eq!(c.click_canvas(5.0, 5.0).unwrap(), None);
        assert!(c.interaction().wire_start.is_none());
    }

    #[test]
    fn test_clicks_ignored_outside_wire_mode() {
        let (mut c, piezo, _) = circuit();
        assert_eq!(c.click_point(PointRef::new(piezo, "ac1")).unwrap(), None);
        assert!(c.interaction().wire_start.is_none());
    }

    #[test]
    fn test_drag_keeps_grab_offset() {
        let (mut c, _, bridge) = circuit();
        assert_eq!(c.begin_drag(300.0, 150.0), Some(bridge));
        c.drag_to(400.0, 250.0).unwrap();
        assert_eq!(c.component(bridge).unwrap().position, Point::new(360.0, 200.0));
        c.end_drag();
        assert!(c.interaction().drag.is_none());
    }

    #[test]
    fn test_remove_forgets_interaction_refs() {
        let (mut c, piezo, _) = circuit();
        c.select(Some(piezo)).unwrap();
        c.set_wire_mode(true);
        c.click_point(PointRef::new(piezo, "ac1")).unwrap();
        c.hover(100.0, 140.0);
        assert_eq!(c.interaction().hovered, Some(PointRef::new(piezo, "ac1")));

        c.remove_component(piezo).unwrap();
        assert_eq!(c.interaction(), &Interaction {
            wire_mode: true,
            ..Default::default()
        });
        assert!(c.selected().is_none());
    }

    #[test]
    fn test_select_missing() {
        let (mut c, _, _) = circuit();
        assert!(c.select(Some(ComponentId(42))).is_err());
        assert!(c.select(None).is_ok());
    }
}
