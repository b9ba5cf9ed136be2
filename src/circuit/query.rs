//! Spatial queries: terminal, component and wire hit tests.
//!
//! Wires are drawn as an orthogonal three-segment route
//!
//! ```text
//! start ──────┐ (mid_x, start.y)
//!             │
//!             └────── end      (mid_x, end.y)
//! ```
//!
//! with `mid_x` halfway between the two ends. Hit testing uses the same
//! route the renderer draws.

use super::graph::{Circuit, ComponentInstance, Wire};
use super::types::{Point, PointRef};
use crate::{POINT_HIT_RADIUS, WIRE_HIT_DISTANCE};

/// The four corners of a wire's route, start to end.
pub fn route(wire: &Wire) -> [Point; 4] {
    let start = wire.start.position;
    let end = wire.end.position;
    let mid_x = (start.x + end.x) / 2.0;
    [start, Point::new(mid_x, start.y), Point::new(mid_x, end.y), end]
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(a);
    }

    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

impl Circuit {
    /// First terminal within [`POINT_HIT_RADIUS`] of `(x, y)`.
    ///
    /// Components are scanned in insertion order and each component's
    /// terminals in catalog order; the first hit wins.
    pub fn connection_point_at(&self, x: f64, y: f64) -> Option<PointRef> {
        let cursor = Point::new(x, y);
        self.components.iter().find_map(|c| {
            c.connection_points
                .iter()
                .find(|p| p.absolute.distance(cursor) <= POINT_HIT_RADIUS)
                .map(|p| PointRef::new(c.id, p.id))
        })
    }

    /// Topmost component whose bounding box contains `(x, y)`.
    pub fn component_at(&self, x: f64, y: f64) -> Option<&ComponentInstance> {
        let cursor = Point::new(x, y);
        self.components.iter().rev().find(|c| c.contains(cursor))
    }

    /// First wire whose route passes within [`WIRE_HIT_DISTANCE`] of `(x, y)`.
    pub fn wire_at(&self, x: f64, y: f64) -> Option<&Wire> {
        let cursor = Point::new(x, y);
        self.wires.iter().find(|w| {
            route(w)
                .windows(2)
                .any(|seg| distance_to_segment(cursor, seg[0], seg[1]) <= WIRE_HIT_DISTANCE)
        })
    }
}
