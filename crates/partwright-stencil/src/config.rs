//! Stencil frame configuration.

use std::path::Path;

use partwright_units::Length;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from configuring or declaring the stencil frame.
#[derive(Error, Debug)]
pub enum StencilError {
    /// Configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is not valid TOML for [`StencilFrameConfig`].
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be written as TOML.
    #[error("cannot serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Dimensions that cannot produce a frame.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Declaring or building the assembly failed.
    #[error(transparent)]
    Build(#[from] partwright::BuildError),
}

/// Result type for stencil frame operations.
pub type Result<T> = std::result::Result<T, StencilError>;

/// Dimensions and options of the stencil frame.
///
/// Lengths are millimeters in TOML. Missing keys fall back to the
/// defaults: a 15 cm x 10 cm, 1 mm sheet with 1/4" folds held in a 0.8"
/// frame with #4-40 screws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StencilFrameConfig {
    /// Add visualization-only debug pockets to every part.
    pub debug: bool,
    /// Thickness of the frame block; clamps span the same height.
    pub frame_thickness: Length,
    /// Unfolded sheet width (X), folds included.
    pub sheet_width: Length,
    /// Sheet depth (Y).
    pub sheet_depth: Length,
    /// Sheet material thickness.
    pub sheet_thickness: Length,
    /// Height of the folded-down east and west edges.
    pub fold_amount: Length,
    /// Spec token for every clamp screw.
    pub screw_spec: String,
}

impl Default for StencilFrameConfig {
    fn default() -> Self {
        Self {
            debug: false,
            frame_thickness: Length::inch(0.8),
            sheet_width: Length::cm(15.0),
            sheet_depth: Length::cm(10.0),
            sheet_thickness: Length::mm(1.0),
            fold_amount: Length::inch(0.25),
            screw_spec: "#4-40".to_string(),
        }
    }
}

impl StencilFrameConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Width of the flat part of the sheet, between the folds.
    pub fn flat_width(&self) -> Length {
        self.sheet_width - 2.0 * self.fold_amount
    }

    /// Check that the dimensions fit together.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("frame_thickness", self.frame_thickness),
            ("sheet_width", self.sheet_width),
            ("sheet_depth", self.sheet_depth),
            ("sheet_thickness", self.sheet_thickness),
            ("fold_amount", self.fold_amount),
        ];
        for (field, value) in positive {
            if !(value > Length::ZERO) {
                return Err(StencilError::InvalidConfig(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }
        if self.fold_amount <= self.sheet_thickness {
            return Err(StencilError::InvalidConfig(
                "fold_amount must exceed sheet_thickness".into(),
            ));
        }
        if self.flat_width() <= 2.0 * self.sheet_thickness {
            return Err(StencilError::InvalidConfig(
                "sheet_width leaves no flat area between the folds".into(),
            ));
        }
        // The stencil lock is cut 1 mm below the folds.
        if self.fold_amount + Length::mm(1.0) >= self.frame_thickness / 2.0 {
            return Err(StencilError::InvalidConfig(
                "folds do not fit in the lower half of the frame".into(),
            ));
        }
        if self.screw_spec.trim().is_empty() {
            return Err(StencilError::InvalidConfig("screw_spec is empty".into()));
        }
        Ok(())
    }
}
