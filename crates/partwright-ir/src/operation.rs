//! Machining operation definitions.

use std::fmt;

use partwright_units::{BoundingBox, Length};
use serde::{Deserialize, Serialize};

/// Stock material, e.g. `Plastic` / `HDPE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// Material family ("Plastic", "Aluminum", ...).
    pub family: String,
    /// Specific grade ("HDPE", "6061-T6", ...).
    pub name: String,
}

impl Material {
    /// Create a new material.
    pub fn new(family: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            name: name.into(),
        }
    }
}

/// Display color name used by visualizers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub String);

impl Color {
    /// Create a named color.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// A face of an axis-aligned part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    /// +Z face.
    Top,
    /// -Z face.
    Bottom,
    /// +Y face.
    North,
    /// -Y face.
    South,
    /// +X face.
    East,
    /// -X face.
    West,
}

impl Face {
    /// Parse the single-letter shop shorthand (`t`, `b`, `n`, `s`, `e`, `w`).
    pub fn from_code(code: char) -> Option<Face> {
        match code.to_ascii_lowercase() {
            't' => Some(Face::Top),
            'b' => Some(Face::Bottom),
            'n' => Some(Face::North),
            's' => Some(Face::South),
            'e' => Some(Face::East),
            'w' => Some(Face::West),
            _ => None,
        }
    }

    /// The opposite face.
    pub fn opposite(self) -> Face {
        match self {
            Face::Top => Face::Bottom,
            Face::Bottom => Face::Top,
            Face::North => Face::South,
            Face::South => Face::North,
            Face::East => Face::West,
            Face::West => Face::East,
        }
    }

    /// Whether this is the top or bottom face.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Face::Top | Face::Bottom)
    }
}

/// Which side of a fastener a hole provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engagement {
    /// Tapped hole the fastener threads into.
    Threaded,
    /// Close-fit through hole the fastener passes through.
    Clearance,
}

impl Engagement {
    /// The engagement the other side of the joint must declare.
    pub fn complement(self) -> Engagement {
        match self {
            Engagement::Threaded => Engagement::Clearance,
            Engagement::Clearance => Engagement::Threaded,
        }
    }
}

impl fmt::Display for Engagement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engagement::Threaded => f.write_str("threaded"),
            Engagement::Clearance => f.write_str("clearance"),
        }
    }
}

/// Pocket modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PocketFlags {
    /// Cut all the way through the stock.
    pub through: bool,
    /// Visualization-only pocket; never machined.
    pub debug: bool,
}

impl PocketFlags {
    /// A plain blind pocket.
    pub const BLIND: PocketFlags = PocketFlags {
        through: false,
        debug: false,
    };

    /// A pocket cut through the stock.
    pub const THROUGH: PocketFlags = PocketFlags {
        through: true,
        debug: false,
    };
}

/// A single machining command.
///
/// Coordinates are always in the global assembly frame, even after a
/// [`Operation::Mount`] changes the setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Operation {
    /// Start from a rectangular block of material.
    StockBlock {
        /// Operation label.
        label: String,
        /// Stock material.
        material: Material,
        /// Display color.
        color: Color,
        /// Extent of the block.
        bounding_box: BoundingBox,
    },
    /// Clamp the part in the vice; starts a new setup.
    Mount {
        /// Operation label.
        label: String,
        /// Face pointing up.
        top: Face,
        /// Face pressed against the fixed vice jaw.
        jaw: Face,
        /// Extra material clearance along X.
        extra_dx: Length,
        /// Extra material clearance along Y.
        extra_dy: Length,
    },
    /// Drill tooling-plate mounting holes on a grid.
    DrillPattern {
        /// Operation label.
        label: String,
        /// Plate row indices to drill.
        rows: Vec<u32>,
        /// Plate column indices to drill.
        columns: Vec<u32>,
        /// `(row, column)` pairs to skip.
        exclusions: Vec<(u32, u32)>,
    },
    /// Move the part onto a named fixture.
    MountOnFixture {
        /// Operation label.
        label: String,
        /// Fixture name.
        fixture: String,
    },
    /// Rectangular exterior contour.
    Contour {
        /// Operation label.
        label: String,
        /// Corner radius of the contour.
        corner_radius: Length,
    },
    /// Rectangular pocket.
    Pocket {
        /// Operation label.
        label: String,
        /// Extent of the removed material.
        bounding_box: BoundingBox,
        /// End mill radius.
        tool_radius: Length,
        /// Pocket modifiers.
        flags: PocketFlags,
    },
    /// Re-indexing boundary for tool offsets.
    FenceCheckpoint,
    /// A hole that takes one side of a fastener.
    Fasten {
        /// Hole identifier, unique within the part.
        hole: String,
        /// Name of the fastener.
        fastener: String,
        /// Which side of the fastener this hole is.
        engagement: Engagement,
    },
}

/// Tag of an [`Operation`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// [`Operation::StockBlock`].
    StockBlock,
    /// [`Operation::Mount`].
    Mount,
    /// [`Operation::DrillPattern`].
    DrillPattern,
    /// [`Operation::MountOnFixture`].
    MountOnFixture,
    /// [`Operation::Contour`].
    Contour,
    /// [`Operation::Pocket`].
    Pocket,
    /// [`Operation::FenceCheckpoint`].
    FenceCheckpoint,
    /// [`Operation::Fasten`].
    Fasten,
}

impl Operation {
    /// The variant tag.
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::StockBlock { .. } => OperationKind::StockBlock,
            Operation::Mount { .. } => OperationKind::Mount,
            Operation::DrillPattern { .. } => OperationKind::DrillPattern,
            Operation::MountOnFixture { .. } => OperationKind::MountOnFixture,
            Operation::Contour { .. } => OperationKind::Contour,
            Operation::Pocket { .. } => OperationKind::Pocket,
            Operation::FenceCheckpoint => OperationKind::FenceCheckpoint,
            Operation::Fasten { .. } => OperationKind::Fasten,
        }
    }

    /// The operation label, if the variant carries one.
    ///
    /// `Fasten` operations report their hole id.
    pub fn label(&self) -> Option<&str> {
        match self {
            Operation::StockBlock { label, .. }
            | Operation::Mount { label, .. }
            | Operation::DrillPattern { label, .. }
            | Operation::MountOnFixture { label, .. }
            | Operation::Contour { label, .. }
            | Operation::Pocket { label, .. } => Some(label),
            Operation::Fasten { hole, .. } => Some(hole),
            Operation::FenceCheckpoint => None,
        }
    }

    /// Whether this is a visualization-only operation.
    pub fn is_debug(&self) -> bool {
        matches!(self, Operation::Pocket { flags, .. } if flags.debug)
    }

    /// The box carried by stock blocks and pockets.
    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        match self {
            Operation::StockBlock { bounding_box, .. } | Operation::Pocket { bounding_box, .. } => {
                Some(bounding_box)
            }
            _ => None,
        }
    }
}
