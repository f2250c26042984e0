//! Declaration tree of parts.

use std::fmt;
use std::sync::Arc;

use slotmap::SlotMap;

use crate::construct::Construct;
use crate::error::{BuildError, Result};

slotmap::new_key_type! {
    /// Handle to a part in a [`PartTree`].
    pub struct PartId;
}

/// Separator between names in a part path.
pub const PATH_SEPARATOR: char = '/';

struct PartNode {
    name: String,
    parent: Option<PartId>,
    children: Vec<PartId>,
    construct: Arc<dyn Construct>,
}

/// The static part hierarchy: names, parent/child wiring and each part's
/// construct step.
///
/// Parents own their children in declaration order; children keep a plain
/// [`PartId`] back to their parent.
pub struct PartTree {
    nodes: SlotMap<PartId, PartNode>,
    root: PartId,
}

/// Check that `name` is usable as a part or fastener name.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.chars().any(char::is_whitespace) {
        Some("name contains whitespace")
    } else if name.contains(PATH_SEPARATOR) {
        Some("name contains '/'")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(BuildError::Configuration {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

impl PartTree {
    /// Create a tree with a single root part.
    pub fn new(root_name: impl Into<String>, construct: impl Construct + 'static) -> Result<Self> {
        let name = root_name.into();
        validate_name(&name)?;
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(PartNode {
            name,
            parent: None,
            children: Vec::new(),
            construct: Arc::new(construct),
        });
        Ok(Self { nodes, root })
    }

    /// Declare a child of `parent`.
    ///
    /// Names must be unique among siblings.
    pub fn add(
        &mut self,
        parent: PartId,
        name: impl Into<String>,
        construct: impl Construct + 'static,
    ) -> Result<PartId> {
        let name = name.into();
        validate_name(&name)?;
        let Some(parent_node) = self.nodes.get(parent) else {
            return Err(BuildError::Configuration {
                name,
                reason: "parent is not part of this tree".to_string(),
            });
        };
        if self.child(parent, &name).is_some() {
            return Err(BuildError::Configuration {
                reason: format!("duplicate sibling under '{}'", parent_node.name),
                name,
            });
        }
        let id = self.nodes.insert(PartNode {
            name,
            parent: Some(parent),
            children: Vec::new(),
            construct: Arc::new(construct),
        });
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    /// The root part.
    pub fn root(&self) -> PartId {
        self.root
    }

    /// Number of parts, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` belongs to this tree.
    pub fn contains(&self, id: PartId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Name of a part.
    pub fn name(&self, id: PartId) -> Option<&str> {
        self.nodes.get(id).map(|n| n.name.as_str())
    }

    /// Parent of a part (`None` for the root).
    pub fn parent(&self, id: PartId) -> Option<PartId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of a part in declaration order.
    pub fn children(&self, id: PartId) -> &[PartId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Child of `parent` named `name`.
    pub fn child(&self, parent: PartId, name: &str) -> Option<PartId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.name(c) == Some(name))
    }

    /// Slash-separated path from the root, e.g. `Stencil_Frame/Stencil`.
    pub fn path(&self, id: PartId) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.nodes.get(current) {
                Some(node) => {
                    names.push(node.name.as_str());
                    cursor = node.parent;
                }
                None => break,
            }
        }
        names.reverse();
        names.join("/")
    }

    /// Find a part by its path from the root.
    pub fn find(&self, path: &str) -> Option<PartId> {
        let mut segments = path.split(PATH_SEPARATOR);
        if segments.next()? != self.name(self.root)? {
            return None;
        }
        segments.try_fold(self.root, |current, segment| self.child(current, segment))
    }

    /// All parts, root first, each followed by its children in declaration
    /// order.
    pub fn pre_order(&self) -> Vec<PartId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    pub(crate) fn construct(&self, id: PartId) -> Option<Arc<dyn Construct>> {
        self.nodes.get(id).map(|n| Arc::clone(&n.construct))
    }
}

impl fmt::Debug for PartTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.pre_order().into_iter().map(|id| self.path(id)))
            .finish()
    }
}
