//! Scalar length with a millimeter canonical representation.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UnitsError};

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Millimeters per centimeter.
pub const MM_PER_CM: f64 = 10.0;

/// Linear tolerance used by [`Length::approx_eq`], in millimeters.
pub const LINEAR_TOLERANCE: f64 = 1e-9;

/// A signed length.
///
/// Every constructor normalizes to millimeters, so lengths built from
/// inches, centimeters and millimeters compare and combine directly:
///
/// ```
/// use partwright_units::Length;
///
/// assert_eq!(Length::inch(1.0), Length::mm(25.4));
/// assert_eq!(Length::inch_fraction("1/2").unwrap(), Length::inch(0.5));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Length {
    mm: f64,
}

impl Length {
    /// The zero length.
    pub const ZERO: Length = Length { mm: 0.0 };

    /// Length from millimeters.
    pub fn mm(value: f64) -> Self {
        Self { mm: value }
    }

    /// Length from centimeters.
    pub fn cm(value: f64) -> Self {
        Self {
            mm: value * MM_PER_CM,
        }
    }

    /// Length from decimal inches.
    pub fn inch(value: f64) -> Self {
        Self {
            mm: value * MM_PER_INCH,
        }
    }

    /// Length from millimeters, rejecting NaN and infinities.
    pub fn try_mm(value: f64) -> Result<Self> {
        if value.is_finite() {
            Ok(Self::mm(value))
        } else {
            Err(UnitsError::NonFinite(value))
        }
    }

    /// Length from an inch literal.
    ///
    /// Accepts simple fractions (`"3/4"`), mixed numbers (`"1 1/2"`), an
    /// optional leading minus sign, and plain decimals (`"0.8"`).
    pub fn inch_fraction(text: &str) -> Result<Self> {
        parse_inches(text).map(Self::inch)
    }

    /// Value in millimeters.
    pub fn as_mm(self) -> f64 {
        self.mm
    }

    /// Value in centimeters.
    pub fn as_cm(self) -> f64 {
        self.mm / MM_PER_CM
    }

    /// Value in inches.
    pub fn as_inch(self) -> f64 {
        self.mm / MM_PER_INCH
    }

    /// Whether this is exactly the zero length.
    pub fn is_zero(self) -> bool {
        self.mm == 0.0
    }

    /// Absolute value.
    pub fn abs(self) -> Self {
        Self { mm: self.mm.abs() }
    }

    /// The smaller of two lengths.
    pub fn min(self, other: Self) -> Self {
        Self {
            mm: self.mm.min(other.mm),
        }
    }

    /// The larger of two lengths.
    pub fn max(self, other: Self) -> Self {
        Self {
            mm: self.mm.max(other.mm),
        }
    }

    /// Equality within [`LINEAR_TOLERANCE`].
    pub fn approx_eq(self, other: Self) -> bool {
        (self.mm - other.mm).abs() < LINEAR_TOLERANCE
    }
}

fn parse_inches(text: &str) -> Result<f64> {
    let invalid = || UnitsError::InvalidFraction(text.to_string());
    let trimmed = text.trim();
    let (sign, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest.trim_start()),
        None => (1.0, trimmed),
    };

    let terms: Vec<&str> = body.split_whitespace().collect();
    let magnitude = match terms.as_slice() {
        [term] => parse_term(term, text)?,
        [whole, fraction] if fraction.contains('/') => {
            let whole: u64 = whole.parse().map_err(|_| invalid())?;
            whole as f64 + parse_term(fraction, text)?
        }
        _ => return Err(invalid()),
    };
    Ok(sign * magnitude)
}

fn parse_term(term: &str, text: &str) -> Result<f64> {
    let invalid = || UnitsError::InvalidFraction(text.to_string());
    if let Some((num, den)) = term.split_once('/') {
        let num: u64 = num.parse().map_err(|_| invalid())?;
        let den: u64 = den.parse().map_err(|_| invalid())?;
        if den == 0 {
            return Err(UnitsError::ZeroDenominator(text.to_string()));
        }
        return Ok(num as f64 / den as f64);
    }
    if term.starts_with(['+', '-']) {
        return Err(invalid());
    }
    let value: f64 = term.parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(UnitsError::NonFinite(value));
    }
    Ok(value)
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}mm", self.mm)
    }
}

impl Add for Length {
    type Output = Length;

    fn add(self, rhs: Length) -> Length {
        Length::mm(self.mm + rhs.mm)
    }
}

impl Sub for Length {
    type Output = Length;

    fn sub(self, rhs: Length) -> Length {
        Length::mm(self.mm - rhs.mm)
    }
}

impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Length) {
        self.mm += rhs.mm;
    }
}

impl SubAssign for Length {
    fn sub_assign(&mut self, rhs: Length) {
        self.mm -= rhs.mm;
    }
}

impl Neg for Length {
    type Output = Length;

    fn neg(self) -> Length {
        Length::mm(-self.mm)
    }
}

impl Mul<f64> for Length {
    type Output = Length;

    fn mul(self, rhs: f64) -> Length {
        Length::mm(self.mm * rhs)
    }
}

impl Mul<Length> for f64 {
    type Output = Length;

    fn mul(self, rhs: Length) -> Length {
        Length::mm(self * rhs.mm)
    }
}

impl Div<f64> for Length {
    type Output = Length;

    fn div(self, rhs: f64) -> Length {
        Length::mm(self.mm / rhs)
    }
}

/// Ratio of two lengths.
impl Div for Length {
    type Output = f64;

    fn div(self, rhs: Length) -> f64 {
        self.mm / rhs.mm
    }
}

impl Sum for Length {
    fn sum<I: Iterator<Item = Length>>(iter: I) -> Length {
        iter.fold(Length::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Length> for Length {
    fn sum<I: Iterator<Item = &'a Length>>(iter: I) -> Length {
        iter.copied().sum()
    }
}

impl AbsDiffEq for Length {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        LINEAR_TOLERANCE
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.mm.abs_diff_eq(&other.mm, epsilon)
    }
}

impl RelativeEq for Length {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.mm.relative_eq(&other.mm, epsilon, max_relative)
    }
}
