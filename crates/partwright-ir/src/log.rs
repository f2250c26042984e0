//! Append-only, ordered operation log.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{Operation, OperationKind};

/// The ordered machining sequence of one part.
///
/// Operations can only be appended; the index returned by [`push`] stays
/// valid for the lifetime of the log.
///
/// [`push`]: OperationLog::push
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationLog {
    operations: Vec<Operation>,
}

/// One fixturing of a part: a mount and the operations machined in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    /// Index of the `Mount` operation that starts the setup.
    pub mount: usize,
    /// Indices of the operations that follow the mount, up to the next
    /// mount or the end of the log.
    pub operations: Range<usize>,
}

impl OperationLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation, returning its index.
    pub fn push(&mut self, op: Operation) -> usize {
        self.operations.push(op);
        self.operations.len() - 1
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operation at `index`.
    pub fn get(&self, index: usize) -> Option<&Operation> {
        self.operations.get(index)
    }

    /// Iterate in manufacturing order.
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// All operations as a slice.
    pub fn as_slice(&self) -> &[Operation] {
        &self.operations
    }

    /// Variant tags in order.
    pub fn kinds(&self) -> Vec<OperationKind> {
        self.operations.iter().map(Operation::kind).collect()
    }

    /// Index of the first operation carrying `label`.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.operations
            .iter()
            .position(|op| op.label() == Some(label))
    }

    /// Whether a `FenceCheckpoint` lies strictly between indices `a` and `b`.
    pub fn fence_between(&self, a: usize, b: usize) -> bool {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        self.operations
            .iter()
            .enumerate()
            .skip(start + 1)
            .take_while(|(i, _)| *i < end)
            .any(|(_, op)| matches!(op, Operation::FenceCheckpoint))
    }

    /// Split the log into setups, one per `Mount`.
    ///
    /// Operations before the first mount (stock definition) belong to no
    /// setup.
    pub fn setups(&self) -> Vec<Setup> {
        let mounts: Vec<usize> = self
            .operations
            .iter()
            .enumerate()
            .filter(|(_, op)| matches!(op, Operation::Mount { .. }))
            .map(|(i, _)| i)
            .collect();

        mounts
            .iter()
            .enumerate()
            .map(|(n, &mount)| {
                let end = mounts.get(n + 1).copied().unwrap_or(self.operations.len());
                Setup {
                    mount,
                    operations: mount + 1..end,
                }
            })
            .collect()
    }

    /// Operations that are not visualization-only.
    pub fn structural(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| !op.is_debug())
    }
}

impl<'a> IntoIterator for &'a OperationLog {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
