//! Construct steps and the context they record operations through.

use std::any::{type_name, Any};
use std::collections::HashSet;
use std::sync::Arc;

use partwright_ir::{Color, Engagement, Face, Material, Operation, OperationLog, PocketFlags};
use partwright_units::{BoundingBox, Length, Point};
use tracing::{trace, warn};

use crate::error::{BuildError, FastenerError, Result};
use crate::fastener::{Attachment, Fastener};
use crate::scheduler::{BuiltPart, Scheduler};
use crate::tree::PartId;

/// The build step of one part.
///
/// A construct step reads other parts only through the context, computes
/// its operations from its own configuration and what it read, and records
/// them on the context. It must not assume anything about build order
/// beyond what it resolves itself.
pub trait Construct: Send + Sync {
    /// Record this part's operations on `ctx`.
    fn construct(&self, ctx: &mut ConstructContext<'_>) -> Result<()>;
}

/// A [`Construct`] backed by a closure. Create one with [`from_fn`].
pub struct FromFn<F>(F);

/// Wrap a closure as a construct step.
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&mut ConstructContext<'_>) -> Result<()> + Send + Sync,
{
    FromFn(f)
}

impl<F> Construct for FromFn<F>
where
    F: Fn(&mut ConstructContext<'_>) -> Result<()> + Send + Sync,
{
    fn construct(&self, ctx: &mut ConstructContext<'_>) -> Result<()> {
        (self.0)(ctx)
    }
}

/// Construct step of a pure assembly: builds the children in declaration
/// order and publishes their combined extent. Records no operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PureAssembly;

impl Construct for PureAssembly {
    fn construct(&self, ctx: &mut ConstructContext<'_>) -> Result<()> {
        ctx.assemble_children()
    }
}

/// Everything a construct step can see and do.
pub struct ConstructContext<'s> {
    scheduler: &'s mut Scheduler,
    part: PartId,
    path: String,
    log: OperationLog,
    debug_ops: Vec<Operation>,
    bounding_box: Option<BoundingBox>,
    published: Option<Arc<dyn Any + Send + Sync>>,
    holes: HashSet<String>,
}

impl<'s> ConstructContext<'s> {
    pub(crate) fn new(scheduler: &'s mut Scheduler, part: PartId, path: String) -> Self {
        Self {
            scheduler,
            part,
            path,
            log: OperationLog::new(),
            debug_ops: Vec::new(),
            bounding_box: None,
            published: None,
            holes: HashSet::new(),
        }
    }

    // =========================================================================
    // Reading other parts
    // =========================================================================

    /// Handle of the part being built.
    pub fn part(&self) -> PartId {
        self.part
    }

    /// Path of the part being built.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bounding box of another part, building it first if needed.
    pub fn resolve(&mut self, id: PartId) -> Result<BoundingBox> {
        self.scheduler.resolve(id)
    }

    /// Another part's full build result, building it first if needed.
    pub fn built(&mut self, id: PartId) -> Result<Arc<BuiltPart>> {
        self.scheduler.ensure_built(id)
    }

    /// The value another part published, building it first if needed.
    pub fn published<T: Any + Send + Sync>(&mut self, id: PartId) -> Result<Arc<T>> {
        let part = self.scheduler.ensure_built(id)?;
        part.published::<T>().ok_or_else(|| BuildError::MissingPublished {
            part: part.path().to_string(),
            expected: type_name::<T>(),
        })
    }

    /// The parent part.
    pub fn parent(&self) -> Result<PartId> {
        self.scheduler
            .tree
            .parent(self.part)
            .ok_or_else(|| self.unknown("<parent>"))
    }

    /// A sibling by name.
    pub fn sibling(&self, name: &str) -> Result<PartId> {
        let parent = self.parent()?;
        self.scheduler
            .tree
            .child(parent, name)
            .ok_or_else(|| self.unknown(name))
    }

    /// A child by name.
    pub fn child(&self, name: &str) -> Result<PartId> {
        self.scheduler
            .tree
            .child(self.part, name)
            .ok_or_else(|| self.unknown(name))
    }

    /// Children in declaration order.
    pub fn children(&self) -> Vec<PartId> {
        self.scheduler.tree.children(self.part).to_vec()
    }

    /// Any part by its path from the root.
    pub fn lookup(&self, path: &str) -> Result<PartId> {
        self.scheduler
            .tree
            .find(path)
            .ok_or_else(|| self.unknown(path))
    }

    fn unknown(&self, name: &str) -> BuildError {
        BuildError::UnknownPart {
            from: self.path.clone(),
            name: name.to_string(),
        }
    }

    // =========================================================================
    // Recording operations
    // =========================================================================

    fn next_index(&self) -> usize {
        self.log.len()
    }

    fn checked_box(&self, low: Point, high: Point) -> Result<BoundingBox> {
        BoundingBox::new(low, high).map_err(|source| BuildError::GeometryInvariant {
            part: self.path.clone(),
            op_index: self.next_index(),
            source,
        })
    }

    fn invalid(&self, reason: String) -> BuildError {
        BuildError::InvalidParameter {
            part: self.path.clone(),
            op_index: self.next_index(),
            reason,
        }
    }

    fn check_tool_radius(&self, radius: Length) -> Result<()> {
        if radius > Length::ZERO {
            Ok(())
        } else {
            Err(self.invalid(format!("tool radius {radius} must be positive")))
        }
    }

    /// Start from (or add) a block of material.
    ///
    /// The first block sets the published bounding box; later blocks grow
    /// it.
    pub fn stock_block(
        &mut self,
        label: impl Into<String>,
        material: Material,
        color: Color,
        low: Point,
        high: Point,
    ) -> Result<usize> {
        let bounding_box = self.checked_box(low, high)?;
        self.bounding_box = Some(match self.bounding_box {
            Some(current) => current.union(&bounding_box),
            None => bounding_box,
        });
        Ok(self.log.push(Operation::StockBlock {
            label: label.into(),
            material,
            color,
            bounding_box,
        }))
    }

    /// Clamp the part in the vice with `top` facing up and `jaw` against the
    /// fixed jaw. Starts a new setup.
    pub fn mount(
        &mut self,
        label: impl Into<String>,
        top: Face,
        jaw: Face,
        extra_dx: Length,
        extra_dy: Length,
    ) -> Result<usize> {
        if top == jaw || top == jaw.opposite() {
            return Err(self.invalid(format!("jaw face {jaw:?} is parallel to top face {top:?}")));
        }
        if !(extra_dx >= Length::ZERO && extra_dy >= Length::ZERO) {
            return Err(self.invalid("mount clearance must not be negative".to_string()));
        }
        Ok(self.log.push(Operation::Mount {
            label: label.into(),
            top,
            jaw,
            extra_dx,
            extra_dy,
        }))
    }

    /// Drill tooling-plate holes at the given row/column indices.
    pub fn drill_pattern(
        &mut self,
        label: impl Into<String>,
        rows: &[u32],
        columns: &[u32],
        exclusions: &[(u32, u32)],
    ) -> usize {
        self.log.push(Operation::DrillPattern {
            label: label.into(),
            rows: rows.to_vec(),
            columns: columns.to_vec(),
            exclusions: exclusions.to_vec(),
        })
    }

    /// Move the part onto a fixture.
    pub fn mount_on_fixture(&mut self, label: impl Into<String>, fixture: impl Into<String>) -> usize {
        self.log.push(Operation::MountOnFixture {
            label: label.into(),
            fixture: fixture.into(),
        })
    }

    /// Rectangular exterior contour.
    pub fn contour(&mut self, label: impl Into<String>, corner_radius: Length) -> Result<usize> {
        if !(corner_radius >= Length::ZERO) {
            return Err(self.invalid(format!("corner radius {corner_radius} must not be negative")));
        }
        Ok(self.log.push(Operation::Contour {
            label: label.into(),
            corner_radius,
        }))
    }

    /// Rectangular pocket between `low` and `high`.
    ///
    /// Debug pockets have no final index until the part finishes; record
    /// them with [`debug_pocket`](Self::debug_pocket) instead.
    pub fn pocket(
        &mut self,
        label: impl Into<String>,
        low: Point,
        high: Point,
        tool_radius: Length,
        flags: PocketFlags,
    ) -> Result<usize> {
        if flags.debug {
            return Err(self.invalid("debug pockets go through debug_pocket".to_string()));
        }
        let bounding_box = self.checked_box(low, high)?;
        self.check_tool_radius(tool_radius)?;
        Ok(self.log.push(Operation::Pocket {
            label: label.into(),
            bounding_box,
            tool_radius,
            flags,
        }))
    }

    /// Visualization-only pocket, blind or `through`.
    ///
    /// Debug pockets are kept aside and appended after every structural
    /// operation when the part finishes; they never touch the published
    /// box.
    pub fn debug_pocket(
        &mut self,
        label: impl Into<String>,
        low: Point,
        high: Point,
        tool_radius: Length,
        through: bool,
    ) -> Result<()> {
        let bounding_box = self.checked_box(low, high)?;
        self.check_tool_radius(tool_radius)?;
        self.debug_ops.push(Operation::Pocket {
            label: label.into(),
            bounding_box,
            tool_radius,
            flags: PocketFlags {
                through,
                debug: true,
            },
        });
        Ok(())
    }

    /// Tool-offset re-indexing boundary.
    pub fn fence(&mut self) -> usize {
        self.log.push(Operation::FenceCheckpoint)
    }

    // =========================================================================
    // Fasteners
    // =========================================================================

    /// Give a fastener its geometry.
    ///
    /// Configuring twice is a protocol violation: it is recorded on the
    /// fastener and reported when the assembly is validated, and the first
    /// geometry stays in effect. A fastener from another assembly is an
    /// error of this part's build.
    pub fn configure_fastener(
        &mut self,
        fastener: &Fastener,
        head: Point,
        tip: Point,
        spec: impl Into<String>,
    ) -> Result<()> {
        let op_index = self.next_index();
        match self
            .scheduler
            .fasteners
            .configure(fastener, head, tip, spec, &self.path, op_index)
        {
            Ok(()) => Ok(()),
            Err(error @ FastenerError::Unregistered { .. }) => Err(BuildError::Fastener {
                part: self.path.clone(),
                op_index,
                source: error,
            }),
            Err(error) => {
                warn!(part = %self.path, %error, "fastener protocol violation");
                Ok(())
            }
        }
    }

    /// Record a hole that takes one side of `fastener`.
    ///
    /// The fastener must already be configured; resolve the part that
    /// configures it first. Attach-count violations are recorded and
    /// reported at validation time.
    pub fn fasten(
        &mut self,
        hole: impl Into<String>,
        fastener: &Fastener,
        engagement: Engagement,
    ) -> Result<usize> {
        let hole = hole.into();
        let op_index = self.next_index();
        if !fastener.is_configured() {
            return Err(BuildError::Fastener {
                part: self.path.clone(),
                op_index,
                source: FastenerError::NotConfigured {
                    fastener: fastener.name().to_string(),
                },
            });
        }
        if !self.holes.insert(hole.clone()) {
            return Err(self.invalid(format!("hole id '{hole}' used twice")));
        }

        let attachment = Attachment {
            part: self.path.clone(),
            hole: hole.clone(),
            engagement,
            op_index,
        };
        match self.scheduler.fasteners.attach(fastener, attachment) {
            Ok(()) => {}
            Err(error @ FastenerError::Unregistered { .. }) => {
                return Err(BuildError::Fastener {
                    part: self.path.clone(),
                    op_index,
                    source: error,
                });
            }
            Err(error) => warn!(part = %self.path, %error, "fastener protocol violation"),
        }
        trace!(part = %self.path, fastener = fastener.name(), %engagement, "fasten");
        Ok(self.log.push(Operation::Fasten {
            hole,
            fastener: fastener.name().to_string(),
            engagement,
        }))
    }

    // =========================================================================
    // Publishing
    // =========================================================================

    /// Publish a typed value for other parts to read once this part is
    /// built. A later call replaces an earlier one.
    pub fn publish<T: Any + Send + Sync>(&mut self, value: T) {
        self.published = Some(Arc::new(value));
    }

    /// Build every child in declaration order and take their combined
    /// extent as this part's box.
    pub fn assemble_children(&mut self) -> Result<()> {
        for child in self.children() {
            let child_box = self.scheduler.resolve(child)?;
            self.bounding_box = Some(match self.bounding_box {
                Some(current) => current.union(&child_box),
                None => child_box,
            });
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<BuiltPart> {
        let Some(bounding_box) = self.bounding_box else {
            return Err(BuildError::NoStock { part: self.path });
        };
        let mut operations = self.log;
        for op in self.debug_ops {
            operations.push(op);
        }
        let name = self
            .scheduler
            .tree
            .name(self.part)
            .unwrap_or_default()
            .to_string();
        Ok(BuiltPart {
            id: self.part,
            name,
            path: self.path,
            bounding_box,
            operations,
            published: self.published,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fastener::FastenerRegistry;
    use crate::tree::PartTree;
    use partwright_ir::OperationKind;

    fn hdpe() -> Material {
        Material::new("Plastic", "HDPE")
    }

    fn p(x: f64, y: f64, z: f64) -> Point {
        Point::new(Length::mm(x), Length::mm(y), Length::mm(z))
    }

    fn build_single(construct: impl Construct + 'static) -> Result<Arc<BuiltPart>> {
        let mut tree = PartTree::new("Root", PureAssembly)?;
        let root = tree.root();
        let id = tree.add(root, "Part", construct)?;
        let mut scheduler = Scheduler::new(tree, FastenerRegistry::new());
        scheduler.ensure_built(id)
    }

    #[test]
    fn test_debug_pockets_go_last_and_do_not_grow_box() {
        let part = build_single(from_fn(|ctx| {
            ctx.stock_block("Block", hdpe(), Color::new("tan"), p(0.0, 0.0, 0.0), p(10.0, 10.0, 5.0))?;
            ctx.debug_pocket("Debug", p(-20.0, -20.0, 0.0), p(30.0, 0.0, 5.0), Length::mm(6.0), false)?;
            ctx.mount("Top_Vice", Face::Top, Face::North, Length::ZERO, Length::ZERO)?;
            ctx.pocket("Pocket", p(2.0, 2.0, 3.0), p(8.0, 8.0, 5.0), Length::mm(1.0), PocketFlags::BLIND)?;
            Ok(())
        }))
        .unwrap();

        let kinds = part.operations().kinds();
        assert_eq!(
            kinds,
            vec![
                OperationKind::StockBlock,
                OperationKind::Mount,
                OperationKind::Pocket,
                OperationKind::Pocket
            ]
        );
        match part.operations().get(3) {
            Some(Operation::Pocket { flags, .. }) => {
                assert!(flags.debug);
                assert!(!flags.through);
            }
            other => panic!("expected debug pocket, got {other:?}"),
        }
        assert_eq!(part.bounding_box(), BoundingBox::new(p(0.0, 0.0, 0.0), p(10.0, 10.0, 5.0)).unwrap());
    }

    #[test]
    fn test_later_blocks_grow_box() {
        let part = build_single(from_fn(|ctx| {
            ctx.stock_block("Flat", hdpe(), Color::new("cyan"), p(-5.0, -5.0, -1.0), p(5.0, 5.0, 0.0))?;
            ctx.stock_block("Fold", hdpe(), Color::new("cyan"), p(-5.0, -5.0, -6.0), p(-4.0, 5.0, 0.0))?;
            ctx.pocket("Cut", p(-1.0, -1.0, -1.0), p(1.0, 1.0, 0.0), Length::mm(0.5), PocketFlags::THROUGH)?;
            Ok(())
        }))
        .unwrap();
        assert_eq!(part.bounding_box().low(), p(-5.0, -5.0, -6.0));
        assert_eq!(part.bounding_box().high(), p(5.0, 5.0, 0.0));
    }

    #[test]
    fn test_inverted_pocket_rejected_with_index() {
        let err = build_single(from_fn(|ctx| {
            ctx.stock_block("Block", hdpe(), Color::new("tan"), p(0.0, 0.0, 0.0), p(10.0, 10.0, 5.0))?;
            ctx.fence();
            ctx.pocket("Bad", p(0.0, 0.0, 5.0), p(10.0, 10.0, 0.0), Length::mm(1.0), PocketFlags::BLIND)?;
            Ok(())
        }))
        .unwrap_err();
        match err {
            BuildError::GeometryInvariant { part, op_index, .. } => {
                assert_eq!(part, "Root/Part");
                assert_eq!(op_index, 2);
            }
            other => panic!("expected geometry error, got {other}"),
        }
    }

    #[test]
    fn test_bad_parameters_rejected() {
        let zero_tool = build_single(from_fn(|ctx| {
            ctx.stock_block("Block", hdpe(), Color::new("tan"), p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))?;
            ctx.pocket("P", p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0), Length::ZERO, PocketFlags::BLIND)?;
            Ok(())
        }));
        assert!(matches!(zero_tool, Err(BuildError::InvalidParameter { op_index: 1, .. })));

        let parallel_jaw = build_single(from_fn(|ctx| {
            ctx.stock_block("Block", hdpe(), Color::new("tan"), p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))?;
            ctx.mount("Vice", Face::Top, Face::Bottom, Length::ZERO, Length::ZERO)?;
            Ok(())
        }));
        assert!(matches!(parallel_jaw, Err(BuildError::InvalidParameter { .. })));

        let negative_radius = build_single(from_fn(|ctx| {
            ctx.stock_block("Block", hdpe(), Color::new("tan"), p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))?;
            ctx.contour("Contour", Length::mm(-1.0))?;
            Ok(())
        }));
        assert!(matches!(negative_radius, Err(BuildError::InvalidParameter { .. })));

        let nan = Length::mm(f64::NAN);
        let nan_clearance = build_single(from_fn(move |ctx| {
            ctx.stock_block("Block", hdpe(), Color::new("tan"), p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))?;
            ctx.mount("Vice", Face::Top, Face::West, nan, Length::ZERO)?;
            Ok(())
        }));
        assert!(matches!(nan_clearance, Err(BuildError::InvalidParameter { op_index: 1, .. })));

        let nan_radius = build_single(from_fn(move |ctx| {
            ctx.stock_block("Block", hdpe(), Color::new("tan"), p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))?;
            ctx.contour("Contour", nan)?;
            Ok(())
        }));
        assert!(matches!(nan_radius, Err(BuildError::InvalidParameter { op_index: 1, .. })));
    }

    #[test]
    fn test_part_without_stock_fails() {
        let err = build_single(from_fn(|ctx| {
            ctx.fence();
            Ok(())
        }))
        .unwrap_err();
        assert!(matches!(err, BuildError::NoStock { .. }));
    }

    #[test]
    fn test_published_value_typed_access() {
        #[derive(Debug, PartialEq)]
        struct Thickness(Length);

        let mut tree = PartTree::new("Root", PureAssembly).unwrap();
        let root = tree.root();
        tree.add(
            root,
            "Sheet",
            from_fn(|ctx| {
                ctx.stock_block("Sheet", hdpe(), Color::new("cyan"), p(0.0, 0.0, -1.0), p(10.0, 10.0, 0.0))?;
                ctx.publish(Thickness(Length::mm(1.0)));
                Ok(())
            }),
        )
        .unwrap();
        let reader = tree
            .add(
                root,
                "Reader",
                from_fn(|ctx| {
                    let sheet = ctx.sibling("Sheet")?;
                    let thickness = ctx.published::<Thickness>(sheet)?;
                    assert!(ctx.published::<String>(sheet).is_err());
                    ctx.stock_block("Block", hdpe(), Color::new("tan"), p(0.0, 0.0, 0.0), p(1.0, 1.0, 0.0).with_z(thickness.0))?;
                    Ok(())
                }),
            )
            .unwrap();
        let mut scheduler = Scheduler::new(tree, FastenerRegistry::new());
        let built = scheduler.ensure_built(reader).unwrap();
        assert_eq!(built.bounding_box().dz(), Length::mm(1.0));
    }

    #[test]
    fn test_unknown_sibling_reported() {
        let err = build_single(from_fn(|ctx| {
            ctx.sibling("Nope")?;
            Ok(())
        }))
        .unwrap_err();
        match err {
            BuildError::UnknownPart { from, name } => {
                assert_eq!(from, "Root/Part");
                assert_eq!(name, "Nope");
            }
            other => panic!("expected unknown part, got {other}"),
        }
    }
}
