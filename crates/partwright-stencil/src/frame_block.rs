//! The main frame block everything else sits in.

use partwright::{BuildError, Construct, ConstructContext, Fastener};
use partwright_ir::{Color, Engagement, Face, Material, PocketFlags};
use partwright_units::{Length, Point};

use crate::config::StencilFrameConfig;
use crate::stencil::StencilDimensions;
use crate::{BOTTOM_CLAMP, EAST_CLAMP, STENCIL, WEST_CLAMP};

/// Values the frame block publishes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDimensions {
    /// Block thickness.
    pub dz: Length,
    /// Clearance between the stencil and the frame in Y.
    pub y_gap: Length,
}

/// Frame block with a through pocket for the bottom clamp and stencil and
/// landings for the east clamp and stencil lock.
pub struct FrameBlock {
    config: StencilFrameConfig,
    east_screws: [Fastener; 2],
    bottom_screws: [Fastener; 2],
}

impl FrameBlock {
    /// Frame block receiving the east clamp and bottom clamp screws.
    pub fn new(
        config: StencilFrameConfig,
        east_screws: [Fastener; 2],
        bottom_screws: [Fastener; 2],
    ) -> Self {
        Self {
            config,
            east_screws,
            bottom_screws,
        }
    }
}

impl Construct for FrameBlock {
    fn construct(&self, ctx: &mut ConstructContext<'_>) -> Result<(), BuildError> {
        let stencil_id = ctx.sibling(STENCIL)?;
        let stencil = ctx.resolve(stencil_id)?;
        let sheet = ctx.published::<StencilDimensions>(stencil_id)?;
        let east_clamp = ctx.sibling(EAST_CLAMP)?;
        let east_clamp = ctx.resolve(east_clamp)?;
        let west_clamp = ctx.sibling(WEST_CLAMP)?;
        let west_clamp = ctx.resolve(west_clamp)?;
        let bottom_clamp = ctx.sibling(BOTTOM_CLAMP)?;
        let bottom_clamp = ctx.resolve(bottom_clamp)?;

        let zero = Length::ZERO;
        let end_mill_radius = Length::inch(0.5);
        let gap_dx = Length::inch(0.25);
        let east_dx = Length::inch(1.0);
        let west_dx = Length::inch(1.0);
        let x20 = east_clamp.high().x + east_dx;
        let x15 = east_clamp.high().x;
        let x13 = stencil.high().x - sheet.thickness;
        let x12 = east_clamp.low().x;
        let x11 = east_clamp.low().x - end_mill_radius;
        let x5 = bottom_clamp.low().x - gap_dx;
        let x0 = bottom_clamp.low().x - gap_dx - west_dx;

        let material_dy = Length::inch(1.0);
        let y20 = east_clamp.high().y + material_dy;
        let y15 = east_clamp.high().y;
        let y12 = stencil.high().y;
        let y10 = zero;
        let y8 = stencil.low().y;
        let y5 = west_clamp.low().y;
        let y0 = west_clamp.low().y - material_dy;

        let dz = self.config.frame_thickness;
        let z10 = dz / 2.0;
        let z5 = stencil.high().z;
        let z3 = stencil.high().z - sheet.thickness;
        let z1 = stencil.high().z - sheet.fold_amount - Length::mm(1.0);
        let z0 = -dz / 2.0;

        ctx.stock_block(
            "Frame_Block",
            Material::new("Plastic", "HDPE"),
            Color::new("tan"),
            Point::new(x0, y0, z0),
            Point::new(x20, y20, z10),
        )?;

        let extra = Length::inch(0.25);
        ctx.mount("Top_Vice", Face::Top, Face::North, extra, extra)?;
        ctx.drill_pattern("Plate_Drill", &[0, 2, 5, 9, 13, 17], &[0, 4, 8], &[]);
        ctx.mount_on_fixture("Top_Plate", "Tooling_Plate");
        ctx.contour("Exterior_Contour", Length::inch(1.0 / 16.0))?;

        let radius = Length::inch(0.25);
        ctx.pocket(
            "Main_Pocket",
            Point::new(x5, y5, z0),
            Point::new(x12, y15, z10),
            radius,
            PocketFlags::THROUGH,
        )?;
        ctx.fence();

        ctx.pocket(
            "Clamp_Pocket",
            Point::new(x11, y5, z5),
            Point::new(x15, y15, z10),
            radius,
            PocketFlags::BLIND,
        )?;
        ctx.fence();

        let radius = Length::inch(3.0 / 16.0);
        ctx.pocket(
            "Stencil_Landing",
            Point::new(x11, y8, z3),
            Point::new(x15, y12, z10),
            radius,
            PocketFlags::BLIND,
        )?;
        ctx.pocket(
            "Stencil_Lock",
            Point::new(x13, y5, z1),
            Point::new(x15, y15, z10),
            radius,
            PocketFlags::BLIND,
        )?;

        for (i, screw) in self.east_screws.iter().enumerate() {
            ctx.fasten(format!("East_Screw_{}", i + 1), screw, Engagement::Threaded)?;
        }
        for (i, screw) in self.bottom_screws.iter().enumerate() {
            ctx.fasten(format!("Bottom_Screw_{}", i + 1), screw, Engagement::Threaded)?;
        }

        if self.config.debug {
            let extra = Length::inch(0.5);
            ctx.debug_pocket(
                "Debug",
                Point::new(x0 - extra, y0, z0),
                Point::new(x20 + extra, y10, z10),
                radius,
                true,
            )?;
        }

        ctx.publish(FrameDimensions {
            dz,
            y_gap: Length::inch(0.5),
        });
        Ok(())
    }
}
