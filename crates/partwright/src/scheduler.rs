//! Memoizing, cycle-detecting construction scheduler.
//!
//! Parts are built on demand: [`Scheduler::resolve`] runs a part's construct
//! step the first time the part is asked for and hands out the memoized
//! result afterwards. A construct step may resolve other parts, so the
//! build order falls out of the data dependencies without being computed
//! up front.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use partwright_ir::OperationLog;
use partwright_units::BoundingBox;
use slotmap::SecondaryMap;
use tracing::{debug, debug_span};

use crate::construct::ConstructContext;
use crate::error::{BuildError, Result};
use crate::fastener::FastenerRegistry;
use crate::tree::{PartId, PartTree};

/// Build state of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartState {
    /// Construct step has not run.
    Unbuilt,
    /// Construct step is running, or failed.
    Building,
    /// Construct step finished; results are published.
    Built,
}

enum Slot {
    Building,
    Failed,
    Built(Arc<BuiltPart>),
}

/// The immutable result of a part's construct step.
pub struct BuiltPart {
    pub(crate) id: PartId,
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) bounding_box: BoundingBox,
    pub(crate) operations: OperationLog,
    pub(crate) published: Option<Arc<dyn Any + Send + Sync>>,
}

impl BuiltPart {
    /// Handle of the part.
    pub fn id(&self) -> PartId {
        self.id
    }

    /// Part name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slash-separated path from the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Published extent in the global frame.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Manufacturing sequence.
    pub fn operations(&self) -> &OperationLog {
        &self.operations
    }

    /// The value published by the construct step, if it has type `T`.
    pub fn published<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.published
            .as_ref()
            .and_then(|value| Arc::clone(value).downcast::<T>().ok())
    }
}

impl fmt::Debug for BuiltPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltPart")
            .field("path", &self.path)
            .field("bounding_box", &self.bounding_box)
            .field("operations", &self.operations.len())
            .field("published", &self.published.is_some())
            .finish()
    }
}

/// Pull-based evaluator over a [`PartTree`].
pub struct Scheduler {
    pub(crate) tree: PartTree,
    pub(crate) fasteners: FastenerRegistry,
    slots: SecondaryMap<PartId, Slot>,
    construct_counts: SecondaryMap<PartId, usize>,
    stack: Vec<PartId>,
    failure: Option<BuildError>,
}

impl Scheduler {
    /// Create a scheduler with every part unbuilt.
    pub fn new(tree: PartTree, fasteners: FastenerRegistry) -> Self {
        Self {
            tree,
            fasteners,
            slots: SecondaryMap::new(),
            construct_counts: SecondaryMap::new(),
            stack: Vec::new(),
            failure: None,
        }
    }

    /// The part tree being built.
    pub fn tree(&self) -> &PartTree {
        &self.tree
    }

    /// The fasteners of the assembly.
    pub fn fasteners(&self) -> &FastenerRegistry {
        &self.fasteners
    }

    /// Current state of a part.
    pub fn state(&self, id: PartId) -> PartState {
        match self.slots.get(id) {
            None => PartState::Unbuilt,
            Some(Slot::Building | Slot::Failed) => PartState::Building,
            Some(Slot::Built(_)) => PartState::Built,
        }
    }

    /// The first cycle or construct failure of this build, if any.
    ///
    /// Once set, every later request fails with it and no further part
    /// becomes built, even if a construct step discarded the error it saw.
    pub fn failure(&self) -> Option<&BuildError> {
        self.failure.as_ref()
    }

    /// How many times the construct step of `id` has started.
    pub fn construct_count(&self, id: PartId) -> usize {
        self.construct_counts.get(id).copied().unwrap_or(0)
    }

    /// Build `id` if needed and return its bounding box.
    pub fn resolve(&mut self, id: PartId) -> Result<BoundingBox> {
        self.ensure_built(id).map(|part| part.bounding_box())
    }

    /// Build `id` if needed and return the built part.
    ///
    /// Fails with [`BuildError::Cycle`] when `id` is already being built
    /// further up the resolution chain. The first failure is sticky: a part
    /// whose construct step failed stays in [`PartState::Building`] and
    /// every later request, for any part, returns that failure.
    pub fn ensure_built(&mut self, id: PartId) -> Result<Arc<BuiltPart>> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        match self.slots.get(id) {
            Some(Slot::Built(part)) => return Ok(Arc::clone(part)),
            Some(Slot::Building) => {
                let error = self.cycle_error(id);
                return Err(self.fail(error));
            }
            Some(Slot::Failed) => {
                let error = BuildError::PartFailed {
                    part: self.tree.path(id),
                };
                return Err(self.fail(error));
            }
            None => {}
        }

        let construct = self.tree.construct(id).ok_or_else(|| BuildError::UnknownPart {
            from: self.current_path(),
            name: format!("{id:?}"),
        })?;
        let path = self.tree.path(id);
        let span = debug_span!("resolve", part = %path);
        let _guard = span.enter();

        self.slots.insert(id, Slot::Building);
        let count = self.construct_count(id);
        self.construct_counts.insert(id, count + 1);
        self.stack.push(id);

        let outcome = {
            let mut ctx = ConstructContext::new(self, id, path);
            match construct.construct(&mut ctx) {
                Ok(()) => ctx.finish(),
                Err(e) => Err(e),
            }
        };
        self.stack.pop();

        // A failure further down the chain wins over a step that carried on.
        let outcome = match (outcome, self.failure.clone()) {
            (_, Some(first)) => Err(first),
            (outcome, None) => outcome,
        };
        let part = match outcome {
            Ok(part) => Arc::new(part),
            Err(error) => {
                self.slots.insert(id, Slot::Failed);
                debug!(%error, "construct failed");
                return Err(self.fail(error));
            }
        };
        debug!(
            operations = part.operations.len(),
            low = %part.bounding_box.low(),
            high = %part.bounding_box.high(),
            "built"
        );
        self.slots.insert(id, Slot::Built(Arc::clone(&part)));
        Ok(part)
    }

    /// The built part for `id`, without building it.
    pub fn built(&self, id: PartId) -> Option<Arc<BuiltPart>> {
        match self.slots.get(id) {
            Some(Slot::Built(part)) => Some(Arc::clone(part)),
            _ => None,
        }
    }

    pub(crate) fn current_path(&self) -> String {
        self.stack
            .last()
            .map(|&id| self.tree.path(id))
            .unwrap_or_default()
    }

    /// Record `error` as the build's failure unless one is already set.
    fn fail(&mut self, error: BuildError) -> BuildError {
        self.failure.get_or_insert(error).clone()
    }

    fn cycle_error(&self, id: PartId) -> BuildError {
        let Some(start) = self.stack.iter().position(|&p| p == id) else {
            return BuildError::PartFailed {
                part: self.tree.path(id),
            };
        };
        let chain = self.stack[start..]
            .iter()
            .chain(std::iter::once(&id))
            .map(|&p| self.tree.path(p))
            .collect();
        BuildError::Cycle { chain }
    }

    /// Split into the tree, fasteners and every built part.
    pub(crate) fn into_parts(self) -> (PartTree, FastenerRegistry, SecondaryMap<PartId, Arc<BuiltPart>>) {
        let built = self
            .slots
            .into_iter()
            .filter_map(|(id, slot)| match slot {
                Slot::Built(part) => Some((id, part)),
                Slot::Building | Slot::Failed => None,
            })
            .collect();
        (self.tree, self.fasteners, built)
    }
}
