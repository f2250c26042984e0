//! Error types for building assemblies.

use std::fmt;

use partwright_ir::Engagement;
use partwright_units::UnitsError;
use thiserror::Error;

/// Errors that abort an assembly build.
#[derive(Error, Debug, Clone)]
pub enum BuildError {
    /// A malformed declaration, rejected before any build starts.
    #[error("invalid configuration for '{name}': {reason}")]
    Configuration {
        /// Offending part or fastener name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A part was reached again while it was still being built.
    #[error("reference cycle: {}", chain.join(" -> "))]
    Cycle {
        /// Part paths from the first visit to the re-entry.
        chain: Vec<String>,
    },

    /// A part was requested again after its construct step failed.
    #[error("part '{part}' failed earlier in this build")]
    PartFailed {
        /// Part path.
        part: String,
    },

    /// A box or pocket corner pair violates `low <= high`.
    #[error("geometry invariant violated in '{part}' at operation {op_index}: {source}")]
    GeometryInvariant {
        /// Part path.
        part: String,
        /// Index the operation would have had in the log.
        op_index: usize,
        /// Underlying unit error.
        #[source]
        source: UnitsError,
    },

    /// An operation parameter is out of range (e.g. a non-positive tool
    /// radius).
    #[error("invalid parameter in '{part}' at operation {op_index}: {reason}")]
    InvalidParameter {
        /// Part path.
        part: String,
        /// Index the operation would have had in the log.
        op_index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// A machined part finished without any stock block.
    #[error("part '{part}' finished without a stock block")]
    NoStock {
        /// Part path.
        part: String,
    },

    /// A part lookup failed.
    #[error("'{from}' cannot find part '{name}'")]
    UnknownPart {
        /// Path of the part doing the lookup.
        from: String,
        /// Name or path that was looked up.
        name: String,
    },

    /// A part did not publish a value of the requested type.
    #[error("part '{part}' published no value of type {expected}")]
    MissingPublished {
        /// Part path.
        part: String,
        /// Requested type name.
        expected: &'static str,
    },

    /// A fastening step could not be recorded.
    #[error("fastener error in '{part}' at operation {op_index}: {source}")]
    Fastener {
        /// Part path.
        part: String,
        /// Index the operation would have had in the log.
        op_index: usize,
        /// Underlying fastener error.
        #[source]
        source: FastenerError,
    },

    /// Fastener consistency check failed after the build.
    #[error(transparent)]
    Validation(#[from] ValidationReport),
}

/// Fastener protocol violations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FastenerError {
    /// `configure` was called a second time.
    #[error("fastener '{fastener}' is already configured; '{part}' configured it again at operation {op_index}")]
    AlreadyConfigured {
        /// Fastener name.
        fastener: String,
        /// Part that configured it the second time.
        part: String,
        /// Log position of that part when it did.
        op_index: usize,
    },

    /// A part fastened against a fastener with no geometry yet.
    #[error("fastener '{fastener}' is not configured")]
    NotConfigured {
        /// Fastener name.
        fastener: String,
    },

    /// A third part tried to attach.
    #[error("fastener '{fastener}' already has two consumers; '{part}' rejected at operation {op_index}")]
    TooManyConsumers {
        /// Fastener name.
        fastener: String,
        /// Part that tried to attach.
        part: String,
        /// Its operation index.
        op_index: usize,
    },

    /// The same part attached twice.
    #[error("part '{part}' attached to fastener '{fastener}' twice, again at operation {op_index}")]
    DuplicateConsumer {
        /// Fastener name.
        fastener: String,
        /// The repeating part.
        part: String,
        /// Operation index of the repeated attach.
        op_index: usize,
    },

    /// Fewer than two parts consumed the fastener.
    #[error("fastener '{fastener}' has {count} consumer(s), expected 2")]
    MissingConsumers {
        /// Fastener name.
        fastener: String,
        /// Number of attachments.
        count: usize,
    },

    /// Both sides declared the same engagement.
    #[error(
        "fastener '{fastener}' has both sides {engagement} ('{first}' at operation {first_op_index}, '{second}' at operation {second_op_index})"
    )]
    MismatchedEngagement {
        /// Fastener name.
        fastener: String,
        /// The engagement both sides declared.
        engagement: Engagement,
        /// First consuming part.
        first: String,
        /// Operation index of the first `Fasten`.
        first_op_index: usize,
        /// Second consuming part.
        second: String,
        /// Operation index of the second `Fasten`.
        second_op_index: usize,
    },

    /// Two differently named fasteners describe the same physical joint.
    #[error("fastener '{fastener}' duplicates the geometry of '{other}'")]
    DuplicateGeometry {
        /// Later fastener name.
        fastener: String,
        /// Earlier fastener with the same endpoints.
        other: String,
    },

    /// The fastener handle belongs to a different registry.
    #[error("fastener '{fastener}' is not registered in this assembly")]
    Unregistered {
        /// Fastener name.
        fastener: String,
    },
}

impl FastenerError {
    /// Name of the fastener this error concerns.
    pub fn fastener(&self) -> &str {
        match self {
            FastenerError::AlreadyConfigured { fastener, .. }
            | FastenerError::NotConfigured { fastener }
            | FastenerError::TooManyConsumers { fastener, .. }
            | FastenerError::DuplicateConsumer { fastener, .. }
            | FastenerError::MissingConsumers { fastener, .. }
            | FastenerError::MismatchedEngagement { fastener, .. }
            | FastenerError::DuplicateGeometry { fastener, .. }
            | FastenerError::Unregistered { fastener } => fastener,
        }
    }
}

/// Every fastener violation found after a build.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// Violations in fastener declaration order.
    pub violations: Vec<FastenerError>,
}

impl ValidationReport {
    /// Violations concerning `fastener`.
    pub fn for_fastener<'a>(&'a self, fastener: &'a str) -> impl Iterator<Item = &'a FastenerError> {
        self.violations
            .iter()
            .filter(move |v| v.fastener() == fastener)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fastener validation failed with {} violation(s)",
            self.violations.len()
        )?;
        for v in &self.violations {
            write!(f, "\n  - {v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
