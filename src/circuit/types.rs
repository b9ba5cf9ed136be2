//! Core types for circuit representation.

use std::fmt;
use std::ops::Add;

use serde::Serialize;

use crate::GRID_SIZE;

/// A position on the canvas, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Snap both coordinates to the nearest grid line.
    pub fn snapped(&self) -> Point {
        Point::new(snap_to_grid(self.x), snap_to_grid(self.y))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Round a coordinate to the nearest multiple of [`GRID_SIZE`].
pub fn snap_to_grid(v: f64) -> f64 {
    (v / GRID_SIZE).round() * GRID_SIZE
}

/// A unique identifier for a placed component.
///
/// Ids are handed out in increasing order and never reused within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ComponentId(pub usize);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "comp_{}", self.0)
    }
}

/// A unique identifier for a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WireId(pub usize);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wire_{}", self.0)
    }
}

/// Typed reference to one connection point of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PointRef {
    pub component: ComponentId,
    pub point: &'static str,
}

impl PointRef {
    pub fn new(component: ComponentId, point: &'static str) -> Self {
        Self { component, point }
    }
}

impl fmt::Display for PointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(0.0), 0.0);
        assert_eq!(snap_to_grid(9.0), 0.0);
        assert_eq!(snap_to_grid(10.0), 20.0);
        assert_eq!(snap_to_grid(87.0), 80.0);
        assert_eq!(snap_to_grid(-11.0), -20.0);
    }

    #[test]
    fn test_point_distance() {
        assert_eq!(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0);
    }
}
