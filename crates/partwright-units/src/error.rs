//! Error types for unit construction and box invariants.

use thiserror::Error;

use crate::{Axis, Length};

/// Errors that can occur while building lengths, points or boxes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitsError {
    /// A fractional inch literal could not be parsed.
    #[error("invalid inch literal '{0}'")]
    InvalidFraction(String),

    /// A fractional inch literal has a zero denominator.
    #[error("zero denominator in inch literal '{0}'")]
    ZeroDenominator(String),

    /// A value was NaN or infinite.
    #[error("non-finite length value {0}")]
    NonFinite(f64),

    /// A box corner pair violates `low <= high` on some axis.
    #[error("inverted box on {axis} axis: low {low} > high {high}")]
    InvertedBox {
        /// The first offending axis.
        axis: Axis,
        /// Low coordinate on that axis.
        low: Length,
        /// High coordinate on that axis.
        high: Length,
    },
}

/// Result type for unit operations.
pub type Result<T> = std::result::Result<T, UnitsError>;
