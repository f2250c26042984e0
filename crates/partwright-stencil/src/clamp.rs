//! East and west clamps that press the stencil folds against the frame.

use partwright::{BuildError, Construct, ConstructContext, Fastener};
use partwright_ir::{Color, Engagement, Face, Material, PocketFlags};
use partwright_units::{Length, Point};

use crate::config::StencilFrameConfig;
use crate::{screw_rows, STENCIL};

/// Which fold a clamp holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClampSide {
    /// Screws into the frame block.
    East,
    /// Screws into the bottom clamp.
    West,
}

/// A clamp bar over one stencil fold.
///
/// The clamp configures its two screws; it takes the clearance side and
/// the part underneath takes the threaded side.
pub struct Clamp {
    side: ClampSide,
    config: StencilFrameConfig,
    screws: [Fastener; 2],
}

impl Clamp {
    /// Clamp on `side` using `screws`.
    pub fn new(side: ClampSide, config: StencilFrameConfig, screws: [Fastener; 2]) -> Self {
        Self {
            side,
            config,
            screws,
        }
    }
}

impl Construct for Clamp {
    fn construct(&self, ctx: &mut ConstructContext<'_>) -> Result<(), BuildError> {
        let is_east = self.side == ClampSide::East;
        let stencil_id = ctx.sibling(STENCIL)?;
        let stencil = ctx.resolve(stencil_id)?;
        let (stencil_low, stencil_high) = (stencil.low(), stencil.high());

        let zero = Length::ZERO;
        let dx = Length::inch(0.75);
        let x20 = stencil_high.x + dx / 2.0;
        let x18 = stencil_high.x;
        let x16 = stencil_high.x - dx / 2.0;
        let x4 = stencil_low.x + dx / 2.0;
        let x2 = stencil_low.x;
        let x0 = stencil_low.x - dx / 2.0;

        let end_mill_radius = Length::inch(0.5);
        let extra_dy = Length::inch(0.5);
        let y20 = stencil_high.y + extra_dy + end_mill_radius;
        let y19 = stencil_high.y + extra_dy;
        let y1 = stencil_low.y - extra_dy;
        let y0 = stencil_low.y - extra_dy - end_mill_radius;

        let z20 = self.config.frame_thickness / 2.0;
        let z10 = stencil_high.z;
        let z5 = stencil_low.z;
        let z0 = -self.config.frame_thickness / 2.0;

        let (label, west, east) = if is_east {
            ("East_Clamp", x16, x20)
        } else {
            ("West_Clamp", x0, x4)
        };
        ctx.stock_block(
            label,
            Material::new("Plastic", "HDPE"),
            Color::new("purple"),
            Point::new(west, y1, z0),
            Point::new(east, y19, z20),
        )?;

        let extra = Length::inch(0.25);
        ctx.mount("Vice_Bottom", Face::Bottom, Face::West, extra, extra)?;
        ctx.drill_pattern("Plate_Drill", &[0], &[0], &[]);
        ctx.mount_on_fixture("Plate_Mount", "Tooling_Plate");
        ctx.contour("Exterior_Contour", Length::inch(0.25))?;

        let end_mill_radius = Length::inch(3.0 / 16.0);
        let (label, pocket_west, pocket_east) = if is_east {
            ("East_Stencil_Pocket", x16, x18)
        } else {
            ("West_Stencil_Pocket", x2, x4)
        };
        ctx.pocket(
            label,
            Point::new(pocket_west, y0, z0),
            Point::new(pocket_east, y20, z10),
            end_mill_radius,
            PocketFlags::BLIND,
        )?;
        ctx.pocket(
            "Bottom_Remove",
            Point::new(west, y0, z0),
            Point::new(east, y20, z5),
            end_mill_radius,
            PocketFlags::BLIND,
        )?;

        // Screws go through the solid strip outside the fold.
        let screw_x = if is_east { (x18 + x20) / 2.0 } else { (x0 + x2) / 2.0 };
        let tip_z = z0 + (z5 - z0) / 2.0;
        for (i, (screw, y)) in self.screws.iter().zip(screw_rows(&stencil)).enumerate() {
            let head = Point::new(screw_x, y, z20);
            ctx.configure_fastener(screw, head, head.with_z(tip_z), self.config.screw_spec.as_str())?;
            ctx.fasten(format!("Screw_{}", i + 1), screw, Engagement::Clearance)?;
        }

        if self.config.debug {
            let extra = Length::inch(0.5);
            ctx.debug_pocket(
                "Debug",
                Point::new(x0 - extra, y0 - extra, z0),
                Point::new(x20 + extra, zero, z20),
                end_mill_radius,
                false,
            )?;
        }
        Ok(())
    }
}
