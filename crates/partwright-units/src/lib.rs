#![warn(missing_docs)]

//! Unit-safe geometric primitives for partwright.
//!
//! [`Length`] stores millimeters internally and is built from inches,
//! centimeters or millimeters. [`Point`] is a triple of lengths in the one
//! global assembly frame, and [`BoundingBox`] is a pair of points whose
//! corner ordering is checked at construction.
//!
//! # Example
//!
//! ```
//! use partwright_units::{BoundingBox, Length, Point};
//!
//! let low = Point::new(Length::ZERO, Length::ZERO, -Length::inch(0.4));
//! let high = Point::new(Length::cm(15.0), Length::cm(10.0), Length::inch(0.4));
//! let frame = BoundingBox::new(low, high).unwrap();
//! assert_eq!(frame.dz(), Length::inch_fraction("4/5").unwrap());
//! ```

mod bbox;
mod error;
mod length;
mod point;

pub use bbox::BoundingBox;
pub use error::{Result, UnitsError};
pub use length::{Length, LINEAR_TOLERANCE, MM_PER_CM, MM_PER_INCH};
pub use point::{Axis, Point};
