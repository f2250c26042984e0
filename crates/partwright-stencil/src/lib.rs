#![warn(missing_docs)]

//! Frame that holds a folded solder-paste stencil, declared as a
//! partwright assembly.
//!
//! The assembly has five parts under `Stencil_Frame`:
//!
//! - `Stencil`: the sheet itself, with its east and west edges folded down.
//! - `Frame_Block`: the main block, pocketed around everything else.
//! - `East_Clamp` and `West_Clamp`: bars pressing the folds down.
//! - `Bottom_Clamp`: the block the west clamp screws into.
//!
//! Every dimension is derived from the stencil and from the parts each
//! piece sits against, so changing the sheet size in
//! [`StencilFrameConfig`] moves the whole frame with it.
//!
//! ```
//! use partwright_stencil::{build_stencil_frame, StencilFrameConfig};
//!
//! let built = build_stencil_frame(&StencilFrameConfig::default())?;
//! let frame = built.part("Stencil_Frame/Frame_Block").expect("declared");
//! assert!(frame.bounding_box().encloses(&built.part("Stencil_Frame/Stencil").expect("declared").bounding_box()));
//! # Ok::<(), partwright_stencil::StencilError>(())
//! ```

mod bottom_clamp;
mod clamp;
mod config;
mod frame_block;
mod stencil;

pub use bottom_clamp::BottomClamp;
pub use clamp::{Clamp, ClampSide};
pub use config::{Result, StencilError, StencilFrameConfig};
pub use frame_block::{FrameBlock, FrameDimensions};
pub use stencil::{Stencil, StencilDimensions};

use partwright::{Assembly, BuiltAssembly, Fastener};
use partwright_units::{BoundingBox, Length};
use tracing::info;

/// Name of the assembly root.
pub const STENCIL_FRAME: &str = "Stencil_Frame";
/// Name of the stencil part.
pub const STENCIL: &str = "Stencil";
/// Name of the frame block part.
pub const FRAME_BLOCK: &str = "Frame_Block";
/// Name of the east clamp part.
pub const EAST_CLAMP: &str = "East_Clamp";
/// Name of the west clamp part.
pub const WEST_CLAMP: &str = "West_Clamp";
/// Name of the bottom clamp part.
pub const BOTTOM_CLAMP: &str = "Bottom_Clamp";

/// Y positions of a screw pair: just outside the stencil's north and south
/// edges.
pub(crate) fn screw_rows(stencil: &BoundingBox) -> [Length; 2] {
    let inset = Length::inch(0.25);
    [stencil.low().y - inset, stencil.high().y + inset]
}

fn screw_pair(assembly: &mut Assembly, prefix: &str) -> partwright::Result<[Fastener; 2]> {
    Ok([
        assembly.fastener(format!("{prefix}_screw_1"))?,
        assembly.fastener(format!("{prefix}_screw_2"))?,
    ])
}

/// Declare the stencil frame assembly.
pub fn stencil_frame(config: &StencilFrameConfig) -> Result<Assembly> {
    config.validate()?;

    let mut assembly = Assembly::new(STENCIL_FRAME)?;
    let root = assembly.root();
    let east_screws = screw_pair(&mut assembly, "east")?;
    let west_screws = screw_pair(&mut assembly, "west")?;
    let bottom_screws = screw_pair(&mut assembly, "bottom")?;

    assembly.add_part(root, STENCIL, Stencil::new(config.clone()))?;
    assembly.add_part(
        root,
        FRAME_BLOCK,
        FrameBlock::new(config.clone(), east_screws.clone(), bottom_screws.clone()),
    )?;
    assembly.add_part(
        root,
        EAST_CLAMP,
        Clamp::new(ClampSide::East, config.clone(), east_screws),
    )?;
    assembly.add_part(
        root,
        WEST_CLAMP,
        Clamp::new(ClampSide::West, config.clone(), west_screws.clone()),
    )?;
    assembly.add_part(
        root,
        BOTTOM_CLAMP,
        BottomClamp::new(config.clone(), west_screws, bottom_screws),
    )?;

    info!(
        debug = config.debug,
        parts = assembly.tree().len(),
        fasteners = assembly.fasteners().len(),
        "stencil frame declared"
    );
    Ok(assembly)
}

/// Declare and build the stencil frame.
pub fn build_stencil_frame(config: &StencilFrameConfig) -> Result<BuiltAssembly> {
    Ok(stencil_frame(config)?.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declares_five_parts_and_six_screws() {
        let assembly = stencil_frame(&StencilFrameConfig::default()).unwrap();
        assert_eq!(assembly.tree().len(), 6);
        assert_eq!(assembly.fasteners().len(), 6);
        let names: Vec<_> = assembly.fasteners().iter().map(|f| f.name().to_string()).collect();
        assert_eq!(names[0], "east_screw_1");
        assert_eq!(names[5], "bottom_screw_2");
    }

    #[test]
    fn test_invalid_config_rejected_before_declaring() {
        let config = StencilFrameConfig {
            fold_amount: Length::ZERO,
            ..Default::default()
        };
        assert!(matches!(stencil_frame(&config), Err(StencilError::InvalidConfig(_))));
    }

    #[test]
    fn test_screw_rows_straddle_stencil() {
        let stencil = BoundingBox::new(
            partwright_units::Point::new(Length::mm(-10.0), Length::mm(-50.0), Length::mm(-6.0)),
            partwright_units::Point::ORIGIN.with_y(Length::mm(50.0)),
        )
        .unwrap();
        let [south, north] = screw_rows(&stencil);
        assert_eq!(south, Length::mm(-50.0) - Length::inch(0.25));
        assert_eq!(north, Length::mm(50.0) + Length::inch(0.25));
    }
}
