//! Shared fasteners joining two parts.
//!
//! A fastener is created on the assembly, configured once by one part
//! (endpoints plus a spec token), then attached by exactly two parts, one
//! threaded and one clearance. Protocol violations are returned to the
//! caller and also recorded on the fastener, so [`FastenerRegistry::validate`]
//! can report all of them together after the build.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use partwright_ir::{AttachmentRecord, Engagement, FastenerRecord};
use partwright_units::Point;

use crate::error::{BuildError, FastenerError, ValidationReport};
use crate::tree::validate_name;

/// Where a fastener is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastenerStage {
    /// Declared, no geometry yet.
    Created,
    /// Endpoints and spec set.
    Configured,
    /// Two parts attached.
    Consumed,
}

/// Endpoints and spec of a configured fastener.
#[derive(Debug, Clone, PartialEq)]
pub struct FastenerGeometry {
    /// Head-side endpoint.
    pub head: Point,
    /// Tip-side endpoint.
    pub tip: Point,
    /// Size/spec token, e.g. `#4-40`.
    pub spec: String,
}

impl FastenerGeometry {
    fn same_joint(&self, other: &FastenerGeometry) -> bool {
        (self.head.approx_eq(&other.head) && self.tip.approx_eq(&other.tip))
            || (self.head.approx_eq(&other.tip) && self.tip.approx_eq(&other.head))
    }
}

/// One part's side of a fastener.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// Path of the consuming part.
    pub part: String,
    /// Hole id within that part.
    pub hole: String,
    /// Threaded or clearance.
    pub engagement: Engagement,
    /// Index of the `Fasten` operation in the part's log.
    pub op_index: usize,
}

#[derive(Default)]
struct FastenerState {
    geometry: Option<FastenerGeometry>,
    attachments: Vec<Attachment>,
    violations: Vec<FastenerError>,
}

struct FastenerCell {
    name: String,
    state: Mutex<FastenerState>,
}

/// Cloneable handle to a fastener owned by a [`FastenerRegistry`].
#[derive(Clone)]
pub struct Fastener {
    cell: Arc<FastenerCell>,
}

impl Fastener {
    fn new(name: String) -> Self {
        Self {
            cell: Arc::new(FastenerCell {
                name,
                state: Mutex::new(FastenerState::default()),
            }),
        }
    }

    /// Fastener name.
    pub fn name(&self) -> &str {
        &self.cell.name
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> FastenerStage {
        let state = self.cell.state.lock();
        match (&state.geometry, state.attachments.len()) {
            (None, _) => FastenerStage::Created,
            (Some(_), n) if n >= 2 => FastenerStage::Consumed,
            (Some(_), _) => FastenerStage::Configured,
        }
    }

    /// Whether endpoints have been set.
    pub fn is_configured(&self) -> bool {
        self.cell.state.lock().geometry.is_some()
    }

    /// Endpoints and spec, once configured.
    pub fn geometry(&self) -> Option<FastenerGeometry> {
        self.cell.state.lock().geometry.clone()
    }

    /// Attached sides in attach order.
    pub fn attachments(&self) -> Vec<Attachment> {
        self.cell.state.lock().attachments.clone()
    }

    fn same_handle(&self, other: &Fastener) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    fn reject(&self, state: &mut FastenerState, error: FastenerError) -> Result<(), FastenerError> {
        state.violations.push(error.clone());
        Err(error)
    }
}

impl fmt::Debug for Fastener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fastener")
            .field("name", &self.cell.name)
            .field("stage", &self.stage())
            .finish()
    }
}

/// All fasteners of an assembly, in declaration order.
#[derive(Debug, Default)]
pub struct FastenerRegistry {
    fasteners: Vec<Fastener>,
    by_name: HashMap<String, usize>,
}

impl FastenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a fastener. Names must be well formed and unique.
    pub fn create(&mut self, name: impl Into<String>) -> Result<Fastener, BuildError> {
        let name = name.into();
        validate_name(&name)?;
        if self.by_name.contains_key(&name) {
            return Err(BuildError::Configuration {
                name,
                reason: "duplicate fastener".to_string(),
            });
        }
        let fastener = Fastener::new(name.clone());
        self.by_name.insert(name, self.fasteners.len());
        self.fasteners.push(fastener.clone());
        Ok(fastener)
    }

    /// Look up a fastener by name.
    pub fn get(&self, name: &str) -> Option<&Fastener> {
        self.by_name.get(name).map(|&i| &self.fasteners[i])
    }

    /// Fasteners in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Fastener> {
        self.fasteners.iter()
    }

    /// Number of fasteners.
    pub fn len(&self) -> usize {
        self.fasteners.len()
    }

    /// True if no fastener was declared.
    pub fn is_empty(&self) -> bool {
        self.fasteners.is_empty()
    }

    fn check_registered(&self, fastener: &Fastener) -> Result<(), FastenerError> {
        match self.get(fastener.name()) {
            Some(own) if own.same_handle(fastener) => Ok(()),
            _ => Err(FastenerError::Unregistered {
                fastener: fastener.name().to_string(),
            }),
        }
    }

    /// Set endpoints and spec on behalf of `part`, whose log is at
    /// `op_index`. Only the first call takes effect.
    pub fn configure(
        &self,
        fastener: &Fastener,
        head: Point,
        tip: Point,
        spec: impl Into<String>,
        part: &str,
        op_index: usize,
    ) -> Result<(), FastenerError> {
        self.check_registered(fastener)?;
        let mut state = fastener.cell.state.lock();
        if state.geometry.is_some() {
            let error = FastenerError::AlreadyConfigured {
                fastener: fastener.name().to_string(),
                part: part.to_string(),
                op_index,
            };
            return fastener.reject(&mut state, error);
        }
        state.geometry = Some(FastenerGeometry {
            head,
            tip,
            spec: spec.into(),
        });
        Ok(())
    }

    /// Attach one part's side. At most two distinct parts may attach.
    pub fn attach(&self, fastener: &Fastener, attachment: Attachment) -> Result<(), FastenerError> {
        self.check_registered(fastener)?;
        let name = fastener.name().to_string();
        let mut state = fastener.cell.state.lock();
        if state.geometry.is_none() {
            return fastener.reject(&mut state, FastenerError::NotConfigured { fastener: name });
        }
        if state.attachments.iter().any(|a| a.part == attachment.part) {
            let error = FastenerError::DuplicateConsumer {
                fastener: name,
                part: attachment.part,
                op_index: attachment.op_index,
            };
            return fastener.reject(&mut state, error);
        }
        if state.attachments.len() >= 2 {
            let error = FastenerError::TooManyConsumers {
                fastener: name,
                part: attachment.part,
                op_index: attachment.op_index,
            };
            return fastener.reject(&mut state, error);
        }
        state.attachments.push(attachment);
        Ok(())
    }

    /// Check every fastener and report all violations together.
    pub fn validate(&self) -> Result<(), ValidationReport> {
        let mut violations = Vec::new();
        let mut seen: Vec<(&str, FastenerGeometry)> = Vec::new();

        for fastener in &self.fasteners {
            let name = fastener.name();
            let state = fastener.cell.state.lock();
            violations.extend(state.violations.iter().cloned());

            let Some(geometry) = &state.geometry else {
                violations.push(FastenerError::NotConfigured {
                    fastener: name.to_string(),
                });
                continue;
            };

            match state.attachments.as_slice() {
                [first, second] => {
                    if first.engagement == second.engagement {
                        violations.push(FastenerError::MismatchedEngagement {
                            fastener: name.to_string(),
                            engagement: first.engagement,
                            first: first.part.clone(),
                            first_op_index: first.op_index,
                            second: second.part.clone(),
                            second_op_index: second.op_index,
                        });
                    }
                }
                other => violations.push(FastenerError::MissingConsumers {
                    fastener: name.to_string(),
                    count: other.len(),
                }),
            }

            if let Some((other, _)) = seen.iter().find(|(_, g)| g.same_joint(geometry)) {
                violations.push(FastenerError::DuplicateGeometry {
                    fastener: name.to_string(),
                    other: other.to_string(),
                });
            }
            seen.push((name, geometry.clone()));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport { violations })
        }
    }

    /// Report records for every configured fastener, in declaration order.
    pub fn records(&self) -> Vec<FastenerRecord> {
        self.fasteners
            .iter()
            .filter_map(|fastener| {
                let state = fastener.cell.state.lock();
                let geometry = state.geometry.as_ref()?;
                Some(FastenerRecord {
                    name: fastener.name().to_string(),
                    spec: geometry.spec.clone(),
                    head: geometry.head,
                    tip: geometry.tip,
                    attachments: state
                        .attachments
                        .iter()
                        .map(|a| AttachmentRecord {
                            part: a.part.clone(),
                            hole: a.hole.clone(),
                            engagement: a.engagement,
                        })
                        .collect(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partwright_units::Length;

    fn p(x: f64, y: f64, z: f64) -> Point {
        Point::new(Length::mm(x), Length::mm(y), Length::mm(z))
    }

    fn side(part: &str, engagement: Engagement) -> Attachment {
        side_at(part, engagement, 4)
    }

    fn side_at(part: &str, engagement: Engagement, op_index: usize) -> Attachment {
        Attachment {
            part: part.to_string(),
            hole: "Screw_1".to_string(),
            engagement,
            op_index,
        }
    }

    #[test]
    fn test_threaded_and_clearance_pair_validates() {
        let mut registry = FastenerRegistry::new();
        let screw = registry.create("clamp_screw").unwrap();
        assert_eq!(screw.stage(), FastenerStage::Created);

        registry.configure(&screw, p(0.0, 0.0, 10.0), p(0.0, 0.0, -5.0), "#4-40", "F/Clamp", 2).unwrap();
        assert_eq!(screw.stage(), FastenerStage::Configured);

        registry.attach(&screw, side("F/Clamp", Engagement::Clearance)).unwrap();
        registry.attach(&screw, side("F/Block", Engagement::Threaded)).unwrap();
        assert_eq!(screw.stage(), FastenerStage::Consumed);
        assert!(registry.validate().is_ok());

        let records = registry.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].spec, "#4-40");
        assert_eq!(records[0].attachments[1].part, "F/Block");
    }

    #[test]
    fn test_third_consumer_rejected() {
        let mut registry = FastenerRegistry::new();
        let screw = registry.create("s").unwrap();
        registry.configure(&screw, p(0.0, 0.0, 1.0), Point::ORIGIN, "#4-40", "F/Clamp", 2).unwrap();
        registry.attach(&screw, side("F/A", Engagement::Clearance)).unwrap();
        registry.attach(&screw, side("F/B", Engagement::Threaded)).unwrap();

        let err = registry.attach(&screw, side("F/C", Engagement::Threaded)).unwrap_err();
        assert_eq!(
            err,
            FastenerError::TooManyConsumers {
                fastener: "s".into(),
                part: "F/C".into(),
                op_index: 4,
            }
        );
        assert_eq!(screw.attachments().len(), 2);
        let report = registry.validate().unwrap_err();
        assert_eq!(report.violations, vec![err]);
    }

    #[test]
    fn test_both_threaded_fails_validation() {
        let mut registry = FastenerRegistry::new();
        let screw = registry.create("s").unwrap();
        registry.configure(&screw, p(0.0, 0.0, 1.0), Point::ORIGIN, "#4-40", "F/Clamp", 2).unwrap();
        registry.attach(&screw, side_at("F/A", Engagement::Threaded, 3)).unwrap();
        registry.attach(&screw, side_at("F/B", Engagement::Threaded, 7)).unwrap();

        let report = registry.validate().unwrap_err();
        assert_eq!(
            report.violations,
            vec![FastenerError::MismatchedEngagement {
                fastener: "s".into(),
                engagement: Engagement::Threaded,
                first: "F/A".into(),
                first_op_index: 3,
                second: "F/B".into(),
                second_op_index: 7,
            }]
        );
    }

    #[test]
    fn test_configure_twice_keeps_first_geometry() {
        let mut registry = FastenerRegistry::new();
        let screw = registry.create("s").unwrap();
        registry.configure(&screw, p(0.0, 0.0, 1.0), Point::ORIGIN, "#4-40", "F/Clamp", 2).unwrap();
        let err = registry
            .configure(&screw, p(9.0, 9.0, 9.0), Point::ORIGIN, "#6-32", "F/Other", 5)
            .unwrap_err();
        assert_eq!(
            err,
            FastenerError::AlreadyConfigured {
                fastener: "s".into(),
                part: "F/Other".into(),
                op_index: 5,
            }
        );
        assert_eq!(screw.geometry().map(|g| g.spec), Some("#4-40".to_string()));
    }

    #[test]
    fn test_attach_before_configure_rejected() {
        let mut registry = FastenerRegistry::new();
        let screw = registry.create("s").unwrap();
        let err = registry.attach(&screw, side("F/A", Engagement::Threaded)).unwrap_err();
        assert!(matches!(err, FastenerError::NotConfigured { .. }));
        assert!(screw.attachments().is_empty());
    }

    #[test]
    fn test_validation_reports_every_violation() {
        let mut registry = FastenerRegistry::new();
        let unused = registry.create("unused").unwrap();
        let lonely = registry.create("lonely").unwrap();
        let twice = registry.create("twice").unwrap();
        let renamed = registry.create("renamed").unwrap();

        registry.configure(&lonely, p(1.0, 0.0, 1.0), p(1.0, 0.0, 0.0), "#4-40", "F/Clamp", 2).unwrap();
        registry.attach(&lonely, side("F/A", Engagement::Clearance)).unwrap();

        registry.configure(&twice, p(0.0, 0.0, 1.0), Point::ORIGIN, "#4-40", "F/Clamp", 2).unwrap();
        registry.attach(&twice, side("F/A", Engagement::Clearance)).unwrap();
        assert!(registry.attach(&twice, side_at("F/A", Engagement::Threaded, 9)).is_err());
        assert!(registry
            .configure(&twice, p(5.0, 5.0, 5.0), Point::ORIGIN, "#6-32", "F/B", 1)
            .is_err());
        registry.attach(&twice, side("F/B", Engagement::Threaded)).unwrap();

        // Same joint as `twice`, endpoints swapped.
        registry.configure(&renamed, Point::ORIGIN, p(0.0, 0.0, 1.0), "#4-40", "F/Clamp", 2).unwrap();
        registry.attach(&renamed, side("F/C", Engagement::Clearance)).unwrap();
        registry.attach(&renamed, side("F/D", Engagement::Threaded)).unwrap();

        let report = registry.validate().unwrap_err();
        assert_eq!(report.violations.len(), 5);
        assert!(matches!(report.violations[0], FastenerError::NotConfigured { .. }));
        assert!(matches!(report.violations[1], FastenerError::MissingConsumers { count: 1, .. }));
        assert_eq!(
            report.violations[2],
            FastenerError::DuplicateConsumer {
                fastener: "twice".into(),
                part: "F/A".into(),
                op_index: 9,
            }
        );
        assert_eq!(
            report.violations[3],
            FastenerError::AlreadyConfigured {
                fastener: "twice".into(),
                part: "F/B".into(),
                op_index: 1,
            }
        );
        assert_eq!(
            report.violations[4],
            FastenerError::DuplicateGeometry {
                fastener: "renamed".into(),
                other: "twice".into(),
            }
        );
        assert_eq!(report.for_fastener("twice").count(), 2);
        assert_eq!(unused.stage(), FastenerStage::Created);
        assert_eq!(twice.geometry().map(|g| g.spec), Some("#4-40".to_string()));

        let text = report.to_string();
        assert!(text.starts_with("fastener validation failed with 5 violation(s)"));
        assert!(text.contains("'F/B' configured it again at operation 1"));
    }

    #[test]
    fn test_duplicate_and_foreign_fasteners_rejected() {
        let mut registry = FastenerRegistry::new();
        registry.create("s").unwrap();
        assert!(matches!(
            registry.create("s"),
            Err(BuildError::Configuration { .. })
        ));
        assert!(registry.create("bad name").is_err());

        let mut other = FastenerRegistry::new();
        let foreign = other.create("s").unwrap();
        let err = registry
            .configure(&foreign, Point::ORIGIN, p(0.0, 0.0, 1.0), "#4-40", "F/Clamp", 2)
            .unwrap_err();
        assert!(matches!(err, FastenerError::Unregistered { .. }));
    }
}
