//! Axis-aligned bounding boxes with an enforced corner ordering.

use serde::{Deserialize, Serialize};

use crate::error::{Result, UnitsError};
use crate::{Axis, Length, Point};

/// An axis-aligned box given by its south-west-bottom and north-east-top
/// corners.
///
/// The corners are private: every constructor checks `low <= high` on all
/// three axes, and deserialization goes through the same check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBox", into = "RawBox")]
pub struct BoundingBox {
    low: Point,
    high: Point,
}

#[derive(Serialize, Deserialize)]
struct RawBox {
    low: Point,
    high: Point,
}

impl TryFrom<RawBox> for BoundingBox {
    type Error = UnitsError;

    fn try_from(raw: RawBox) -> Result<Self> {
        BoundingBox::new(raw.low, raw.high)
    }
}

impl From<BoundingBox> for RawBox {
    fn from(b: BoundingBox) -> Self {
        RawBox {
            low: b.low,
            high: b.high,
        }
    }
}

impl BoundingBox {
    /// Create a box, rejecting corner pairs where `low` exceeds `high` on
    /// any axis.
    pub fn new(low: Point, high: Point) -> Result<Self> {
        for axis in Axis::ALL {
            let (lo, hi) = (low.component(axis), high.component(axis));
            if !(lo <= hi) {
                return Err(UnitsError::InvertedBox {
                    axis,
                    low: lo,
                    high: hi,
                });
            }
        }
        Ok(Self { low, high })
    }

    /// Create a box from two opposite corners given in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    /// South-west-bottom corner.
    pub fn low(&self) -> Point {
        self.low
    }

    /// North-east-top corner.
    pub fn high(&self) -> Point {
        self.high
    }

    /// Size along `axis`.
    pub fn extent(&self, axis: Axis) -> Length {
        self.high.component(axis) - self.low.component(axis)
    }

    /// Size along X.
    pub fn dx(&self) -> Length {
        self.extent(Axis::X)
    }

    /// Size along Y.
    pub fn dy(&self) -> Length {
        self.extent(Axis::Y)
    }

    /// Size along Z.
    pub fn dz(&self) -> Length {
        self.extent(Axis::Z)
    }

    /// Center point.
    pub fn center(&self) -> Point {
        self.low.midpoint(self.high)
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            low: self.low.min(other.low),
            high: self.high.max(other.high),
        }
    }

    /// Whether `p` lies inside or on the boundary.
    pub fn contains(&self, p: &Point) -> bool {
        Axis::ALL.iter().all(|&axis| {
            let v = p.component(axis);
            self.low.component(axis) <= v && v <= self.high.component(axis)
        })
    }

    /// Whether `other` lies entirely inside this box.
    pub fn encloses(&self, other: &BoundingBox) -> bool {
        self.contains(&other.low) && self.contains(&other.high)
    }
}
