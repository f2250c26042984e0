//! The block the west clamp screws into.

use partwright::{BuildError, Construct, ConstructContext, Fastener};
use partwright_ir::{Color, Engagement, Face, Material, PocketFlags};
use partwright_units::{Length, Point};

use crate::config::StencilFrameConfig;
use crate::stencil::StencilDimensions;
use crate::{screw_rows, STENCIL, WEST_CLAMP};

/// Block under the west clamp, itself screwed sideways into the frame
/// block.
pub struct BottomClamp {
    config: StencilFrameConfig,
    west_screws: [Fastener; 2],
    frame_screws: [Fastener; 2],
}

impl BottomClamp {
    /// Bottom clamp receiving `west_screws` and configuring `frame_screws`.
    pub fn new(
        config: StencilFrameConfig,
        west_screws: [Fastener; 2],
        frame_screws: [Fastener; 2],
    ) -> Self {
        Self {
            config,
            west_screws,
            frame_screws,
        }
    }
}

impl Construct for BottomClamp {
    fn construct(&self, ctx: &mut ConstructContext<'_>) -> Result<(), BuildError> {
        let stencil_id = ctx.sibling(STENCIL)?;
        let stencil = ctx.resolve(stencil_id)?;
        let sheet = ctx.published::<StencilDimensions>(stencil_id)?;
        let west_clamp_id = ctx.sibling(WEST_CLAMP)?;
        let west_clamp = ctx.resolve(west_clamp_id)?;
        let (clamp_low, clamp_high) = (west_clamp.low(), west_clamp.high());

        let zero = Length::ZERO;
        let west_dx = Length::inch(0.75);
        let end_mill_radius = Length::inch(0.5);
        let x21 = clamp_high.x + end_mill_radius;
        let x20 = clamp_high.x;
        let x15 = stencil.low().x + sheet.thickness;
        let x10 = clamp_low.x;
        let x0 = clamp_low.x - west_dx;

        let y20 = clamp_high.y + end_mill_radius;
        let y19 = clamp_high.y;
        let y15 = stencil.high().y;
        let y10 = zero;
        let y5 = stencil.low().y;
        let y1 = clamp_low.y;
        let y0 = clamp_low.y - end_mill_radius;

        let z20 = self.config.frame_thickness / 2.0;
        let z10 = stencil.high().z;
        let z6 = stencil.high().z - sheet.thickness;
        let z4 = stencil.high().z - sheet.fold_amount - Length::mm(1.0);
        let z0 = -self.config.frame_thickness / 2.0;

        ctx.stock_block(
            "Bottom_Clamp",
            Material::new("Plastic", "HDPE"),
            Color::new("lime"),
            Point::new(x0, y1, z0),
            Point::new(x20, y19, z20),
        )?;

        let extra = Length::inch(0.25);
        ctx.mount("Top_Vice", Face::Top, Face::West, extra, extra)?;
        ctx.drill_pattern("Plate_Drill", &[0], &[0], &[]);
        ctx.mount_on_fixture("Top_Plate", "Tooling_Plate");
        let radius = Length::inch(1.0 / 16.0);
        ctx.contour("Exterior_Contour", radius)?;

        // Landing for the west clamp.
        ctx.pocket(
            "Clamp_Pocket",
            Point::new(x10, y0, z10),
            Point::new(x20, y20, z20),
            radius,
            PocketFlags::BLIND,
        )?;
        ctx.fence();

        ctx.pocket(
            "Stencil_Landing",
            Point::new(x10, y5, z6),
            Point::new(x21, y15, z20),
            radius,
            PocketFlags::BLIND,
        )?;
        ctx.pocket(
            "Stencil_Lock",
            Point::new(x10, y1, z4),
            Point::new(x15, y19, z20),
            radius,
            PocketFlags::BLIND,
        )?;

        for (i, screw) in self.west_screws.iter().enumerate() {
            ctx.fasten(format!("West_Screw_{}", i + 1), screw, Engagement::Threaded)?;
        }

        // Horizontal screws out of the west face, across the gap, ending
        // halfway into the frame block's west wall.
        let screw_z = z0 / 2.0;
        let reach = Length::inch(0.25) + Length::inch(0.5);
        for (i, (screw, y)) in self.frame_screws.iter().zip(screw_rows(&stencil)).enumerate() {
            let head = Point::new(x0 + Length::inch(0.25), y, screw_z);
            let tip = head.with_x(x0 - reach);
            ctx.configure_fastener(screw, head, tip, self.config.screw_spec.as_str())?;
            ctx.fasten(format!("Frame_Screw_{}", i + 1), screw, Engagement::Clearance)?;
        }

        if self.config.debug {
            let extra = Length::inch(1.0);
            ctx.debug_pocket(
                "Debug",
                Point::new(x0 - extra, y0 - extra, z0),
                Point::new(x20 + extra, y10, z20),
                Length::inch(0.5),
                true,
            )?;
        }
        Ok(())
    }
}
