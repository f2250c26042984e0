#![warn(missing_docs)]

//! Intermediate representation for partwright builds.
//!
//! This crate defines the records a finished assembly hands to a downstream
//! geometry/CAM engine: per-part ordered [`OperationLog`]s with their
//! published [`BoundingBox`], and the fastener table that `Fasten`
//! operations refer to by name.
//!
//! The IR is purely declarative. Turning it into solids or toolpaths is
//! the consumer's job.

mod log;
mod operation;

pub use log::{OperationLog, Setup};
pub use operation::{
    Color, Engagement, Face, Material, Operation, OperationKind, PocketFlags,
};

use partwright_units::{BoundingBox, Point};
use serde::{Deserialize, Serialize};

/// Report format version.
pub const REPORT_VERSION: &str = "0.1";

/// A built part as handed to the geometry engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    /// Slash-separated path from the assembly root, e.g.
    /// `Stencil_Frame/Frame_Block`.
    pub path: String,
    /// Part name.
    pub name: String,
    /// Published extent in the global frame.
    pub bounding_box: BoundingBox,
    /// Manufacturing sequence.
    pub operations: OperationLog,
}

/// One side of a fastener as recorded in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// Path of the consuming part.
    pub part: String,
    /// Hole id within that part.
    pub hole: String,
    /// Which side of the joint the hole is.
    pub engagement: Engagement,
}

/// A configured fastener joining two parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastenerRecord {
    /// Fastener name.
    pub name: String,
    /// Size/spec token, e.g. `#4-40`.
    pub spec: String,
    /// Head-side endpoint.
    pub head: Point,
    /// Tip-side endpoint.
    pub tip: Point,
    /// The consuming parts, in attach order.
    pub attachments: Vec<AttachmentRecord>,
}

/// A complete build report, the output format of a partwright build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Format version string.
    pub version: String,
    /// Assembly (root) name.
    pub assembly: String,
    /// Parts in declaration order, root first.
    pub parts: Vec<PartRecord>,
    /// Fasteners in declaration order.
    pub fasteners: Vec<FastenerRecord>,
}

impl BuildReport {
    /// Create an empty report for `assembly`.
    pub fn new(assembly: impl Into<String>) -> Self {
        Self {
            version: REPORT_VERSION.to_string(),
            assembly: assembly.into(),
            parts: Vec::new(),
            fasteners: Vec::new(),
        }
    }

    /// Find a part by path.
    pub fn part(&self, path: &str) -> Option<&PartRecord> {
        self.parts.iter().find(|p| p.path == path)
    }

    /// Find a fastener by name.
    pub fn fastener(&self, name: &str) -> Option<&FastenerRecord> {
        self.fasteners.iter().find(|f| f.name == name)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partwright_units::Length;

    fn sample_report() -> BuildReport {
        let mut log = OperationLog::new();
        let stock = BoundingBox::new(
            Point::ORIGIN,
            Point::new(Length::inch(2.0), Length::inch(1.0), Length::inch(0.8)),
        )
        .expect("box");
        log.push(Operation::StockBlock {
            label: "Block".into(),
            material: Material::new("Plastic", "HDPE"),
            color: Color::new("tan"),
            bounding_box: stock,
        });
        log.push(Operation::FenceCheckpoint);
        log.push(Operation::Fasten {
            hole: "Screw_1".into(),
            fastener: "screw_1".into(),
            engagement: Engagement::Threaded,
        });

        let mut report = BuildReport::new("Fixture");
        report.parts.push(PartRecord {
            path: "Fixture/Block".into(),
            name: "Block".into(),
            bounding_box: stock,
            operations: log,
        });
        report.fasteners.push(FastenerRecord {
            name: "screw_1".into(),
            spec: "#4-40".into(),
            head: Point::new(Length::mm(5.0), Length::mm(5.0), Length::inch(0.8)),
            tip: Point::new(Length::mm(5.0), Length::mm(5.0), Length::ZERO),
            attachments: vec![AttachmentRecord {
                part: "Fixture/Block".into(),
                hole: "Screw_1".into(),
                engagement: Engagement::Threaded,
            }],
        });
        report
    }

    #[test]
    fn roundtrip_report() {
        let report = sample_report();
        let json = report.to_json().expect("serialize");
        let restored = BuildReport::from_json(&json).expect("deserialize");
        assert_eq!(report, restored);
        assert_eq!(restored.version, REPORT_VERSION);
    }

    #[test]
    fn lookup_by_path_and_name() {
        let report = sample_report();
        let part = report.part("Fixture/Block").expect("part");
        assert_eq!(part.operations.len(), 3);
        assert!(report.part("Fixture/Missing").is_none());
        assert_eq!(report.fastener("screw_1").map(|f| f.spec.as_str()), Some("#4-40"));
    }

    #[test]
    fn engagement_serializes_lowercase() {
        let json = serde_json::to_string(&Engagement::Clearance).unwrap();
        assert_eq!(json, r#""clearance""#);
    }
}
