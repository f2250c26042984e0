//! Assembly declaration and the whole-assembly build.

use std::sync::Arc;

use partwright_ir::{BuildReport, PartRecord};
use slotmap::SecondaryMap;
use tracing::{info, info_span};

use crate::construct::{Construct, PureAssembly};
use crate::error::Result;
use crate::fastener::{Fastener, FastenerRegistry};
use crate::scheduler::{BuiltPart, Scheduler};
use crate::tree::{PartId, PartTree};

/// A declared assembly: the part tree plus the fasteners joining its parts.
///
/// Declaration happens up front; [`Assembly::build`] then pulls every part
/// through the scheduler and validates the fasteners.
pub struct Assembly {
    tree: PartTree,
    fasteners: FastenerRegistry,
}

impl Assembly {
    /// Create an assembly whose root is named `name`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            tree: PartTree::new(name, PureAssembly)?,
            fasteners: FastenerRegistry::new(),
        })
    }

    /// The root part.
    pub fn root(&self) -> PartId {
        self.tree.root()
    }

    /// Declare a machined part under `parent`.
    pub fn add_part(
        &mut self,
        parent: PartId,
        name: impl Into<String>,
        construct: impl Construct + 'static,
    ) -> Result<PartId> {
        self.tree.add(parent, name, construct)
    }

    /// Declare a sub-assembly under `parent`. Its box is the union of its
    /// children's boxes.
    pub fn add_assembly(&mut self, parent: PartId, name: impl Into<String>) -> Result<PartId> {
        self.tree.add(parent, name, PureAssembly)
    }

    /// Declare a fastener.
    pub fn fastener(&mut self, name: impl Into<String>) -> Result<Fastener> {
        self.fasteners.create(name)
    }

    /// The declared part tree.
    pub fn tree(&self) -> &PartTree {
        &self.tree
    }

    /// The declared fasteners.
    pub fn fasteners(&self) -> &FastenerRegistry {
        &self.fasteners
    }

    /// Build every part and validate the fasteners.
    ///
    /// Parts are requested in declaration pre-order and the root last; any
    /// part may pull in others earlier. The first failure aborts the build.
    pub fn build(self) -> Result<BuiltAssembly> {
        let root = self.tree.root();
        let name = self.tree.name(root).unwrap_or_default().to_string();
        let span = info_span!("build", assembly = %name);
        let _guard = span.enter();
        info!(
            parts = self.tree.len(),
            fasteners = self.fasteners.len(),
            "building assembly"
        );

        let mut scheduler = Scheduler::new(self.tree, self.fasteners);
        for id in scheduler.tree().pre_order() {
            if id != root {
                scheduler.ensure_built(id)?;
            }
        }
        let root_part = scheduler.ensure_built(root)?;
        scheduler.fasteners().validate()?;

        let (tree, fasteners, parts) = scheduler.into_parts();
        info!(
            low = %root_part.bounding_box().low(),
            high = %root_part.bounding_box().high(),
            "assembly built"
        );
        Ok(BuiltAssembly {
            name,
            tree,
            fasteners,
            parts,
            root: root_part,
        })
    }
}

/// A fully built and validated assembly.
#[derive(Debug)]
pub struct BuiltAssembly {
    name: String,
    tree: PartTree,
    fasteners: FastenerRegistry,
    parts: SecondaryMap<PartId, Arc<BuiltPart>>,
    root: Arc<BuiltPart>,
}

impl BuiltAssembly {
    /// Assembly (root) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The root part.
    pub fn root(&self) -> &Arc<BuiltPart> {
        &self.root
    }

    /// A built part by handle.
    pub fn get(&self, id: PartId) -> Option<&Arc<BuiltPart>> {
        self.parts.get(id)
    }

    /// A built part by path, e.g. `Stencil_Frame/Stencil`.
    pub fn part(&self, path: &str) -> Option<&Arc<BuiltPart>> {
        self.tree.find(path).and_then(|id| self.parts.get(id))
    }

    /// Built parts in declaration pre-order, root first.
    pub fn parts(&self) -> impl Iterator<Item = &Arc<BuiltPart>> + '_ {
        self.tree
            .pre_order()
            .into_iter()
            .filter_map(move |id| self.parts.get(id))
    }

    /// The part tree.
    pub fn tree(&self) -> &PartTree {
        &self.tree
    }

    /// The validated fasteners.
    pub fn fasteners(&self) -> &FastenerRegistry {
        &self.fasteners
    }

    /// Report for the downstream geometry engine.
    pub fn report(&self) -> BuildReport {
        let mut report = BuildReport::new(self.name.clone());
        report.parts = self
            .parts()
            .map(|part| PartRecord {
                path: part.path().to_string(),
                name: part.name().to_string(),
                bounding_box: part.bounding_box(),
                operations: part.operations().clone(),
            })
            .collect();
        report.fasteners = self.fasteners.records();
        report
    }
}
