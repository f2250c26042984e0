//! The folded stencil sheet.

use partwright::{BuildError, Construct, ConstructContext};
use partwright_ir::{Color, Face, Material};
use partwright_units::{Length, Point};

use crate::config::StencilFrameConfig;

/// Dimensions the stencil publishes for the parts that hold it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilDimensions {
    /// Height of the folded edges.
    pub fold_amount: Length,
    /// Flat width between the folds (X).
    pub dx: Length,
    /// Depth (Y).
    pub dy: Length,
    /// Sheet thickness.
    pub thickness: Length,
}

/// A flat sheet centered on the origin with its top face at z = 0 and its
/// east and west edges folded down.
pub struct Stencil {
    config: StencilFrameConfig,
}

impl Stencil {
    /// Stencil for `config`.
    pub fn new(config: StencilFrameConfig) -> Self {
        Self { config }
    }
}

impl Construct for Stencil {
    fn construct(&self, ctx: &mut ConstructContext<'_>) -> Result<(), BuildError> {
        let fold_amount = self.config.fold_amount;
        let dx = self.config.flat_width();
        let dy = self.config.sheet_depth;
        let thickness = self.config.sheet_thickness;
        let zero = Length::ZERO;

        let material = Material::new("Plastic", "HDPE");
        let color = Color::new("cyan");

        ctx.stock_block(
            "Stencil_Flat",
            material.clone(),
            color.clone(),
            Point::new(-dx / 2.0, -dy / 2.0, -thickness),
            Point::new(dx / 2.0, dy / 2.0, zero),
        )?;
        ctx.stock_block(
            "West_Fold",
            material.clone(),
            color.clone(),
            Point::new(-dx / 2.0, -dy / 2.0, -fold_amount),
            Point::new(-dx / 2.0 + thickness, dy / 2.0, zero),
        )?;
        ctx.stock_block(
            "East_Fold",
            material,
            color,
            Point::new(dx / 2.0 - thickness, -dy / 2.0, -fold_amount),
            Point::new(dx / 2.0, dy / 2.0, zero),
        )?;

        if self.config.debug {
            ctx.mount("Top_Vice", Face::Top, Face::North, zero, zero)?;
            let extra = Length::inch(0.25);
            ctx.debug_pocket(
                "Debug",
                Point::new(-dx / 2.0 - extra, -dy / 2.0 - extra, -fold_amount - extra),
                Point::new(dx / 2.0 + extra, zero, zero),
                Length::inch(0.25),
                true,
            )?;
        }

        ctx.publish(StencilDimensions {
            fold_amount,
            dx,
            dy,
            thickness,
        });
        Ok(())
    }
}
