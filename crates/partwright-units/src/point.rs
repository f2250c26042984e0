//! Points in the single global assembly frame.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Length;

/// A coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// West to east.
    X,
    /// South to north.
    Y,
    /// Bottom to top.
    Z,
}

impl Axis {
    /// All three axes in `x, y, z` order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// A point built from three lengths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: Length,
    /// Y coordinate.
    pub y: Length,
    /// Z coordinate.
    pub z: Length,
}

impl Point {
    /// The origin.
    pub const ORIGIN: Point = Point {
        x: Length::ZERO,
        y: Length::ZERO,
        z: Length::ZERO,
    };

    /// Create a new point.
    pub fn new(x: Length, y: Length, z: Length) -> Self {
        Self { x, y, z }
    }

    /// Coordinate along `axis`.
    pub fn component(&self, axis: Axis) -> Length {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Copy with the X coordinate replaced.
    pub fn with_x(self, x: Length) -> Self {
        Self { x, ..self }
    }

    /// Copy with the Y coordinate replaced.
    pub fn with_y(self, y: Length) -> Self {
        Self { y, ..self }
    }

    /// Copy with the Z coordinate replaced.
    pub fn with_z(self, z: Length) -> Self {
        Self { z, ..self }
    }

    /// Translate by per-axis deltas.
    pub fn offset(self, dx: Length, dy: Length, dz: Length) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// Component-wise minimum.
    pub fn min(self, other: Point) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
        }
    }

    /// Component-wise maximum.
    pub fn max(self, other: Point) -> Self {
        Self {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
            z: self.z.max(other.z),
        }
    }

    /// Midpoint between two points.
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
        }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> Length {
        Length::mm(nalgebra::distance(&self.to_point3(), &other.to_point3()))
    }

    /// Whether two points coincide within the linear tolerance.
    pub fn approx_eq(&self, other: &Point) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| self.component(axis).approx_eq(other.component(axis)))
    }

    /// Convert to an nalgebra point in millimeters.
    pub fn to_point3(&self) -> nalgebra::Point3<f64> {
        nalgebra::Point3::new(self.x.as_mm(), self.y.as_mm(), self.z.as_mm())
    }

    /// Build from an nalgebra point in millimeters.
    pub fn from_point3(p: &nalgebra::Point3<f64>) -> Self {
        Self::new(Length::mm(p.x), Length::mm(p.y), Length::mm(p.z))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_component_access() {
        let p = Point::new(Length::mm(1.0), Length::mm(2.0), Length::mm(3.0));
        assert_eq!(p.component(Axis::X), Length::mm(1.0));
        assert_eq!(p.component(Axis::Y), Length::mm(2.0));
        assert_eq!(p.component(Axis::Z), Length::mm(3.0));
    }

    #[test]
    fn test_offset_and_with() {
        let p = Point::ORIGIN.offset(Length::inch(1.0), Length::ZERO, -Length::mm(2.0));
        assert_eq!(p.x, Length::mm(25.4));
        assert_eq!(p.z, Length::mm(-2.0));
        let q = p.with_z(Length::mm(5.0));
        assert_eq!(q.x, p.x);
        assert_eq!(q.z, Length::mm(5.0));
    }

    #[test]
    fn test_distance_uses_millimeters() {
        let a = Point::ORIGIN;
        let b = Point::new(Length::mm(3.0), Length::mm(4.0), Length::ZERO);
        assert_relative_eq!(a.distance(&b), Length::mm(5.0));
    }

    #[test]
    fn test_nalgebra_round_trip() {
        let p = Point::new(Length::inch(1.0), Length::cm(2.0), Length::mm(-3.0));
        let q = Point::from_point3(&p.to_point3());
        assert!(p.approx_eq(&q));
    }

    #[test]
    fn test_min_max_midpoint() {
        let a = Point::new(Length::mm(0.0), Length::mm(10.0), Length::mm(-1.0));
        let b = Point::new(Length::mm(4.0), Length::mm(2.0), Length::mm(1.0));
        let lo = a.min(b);
        let hi = a.max(b);
        assert_eq!(lo, Point::new(Length::mm(0.0), Length::mm(2.0), Length::mm(-1.0)));
        assert_eq!(hi, Point::new(Length::mm(4.0), Length::mm(10.0), Length::mm(1.0)));
        assert_eq!(a.midpoint(b), Point::new(Length::mm(2.0), Length::mm(6.0), Length::ZERO));
    }
}
