#![warn(missing_docs)]

//! Lazy, dependency-ordered part builder for machined assemblies.
//!
//! An [`Assembly`] is a tree of named parts. Each part has a
//! [`Construct`] step that records its manufacturing operations on a
//! [`ConstructContext`]; operation dimensions are usually computed from the
//! bounding boxes of other parts, which the step asks for with
//! [`ConstructContext::resolve`]. Parts are built on first request and
//! memoized, and a part that is reached again while still being built
//! fails the build with [`BuildError::Cycle`].
//!
//! Parts that must be screwed together share a [`Fastener`]: one side
//! configures it, both sides record a `Fasten` operation, and the assembly
//! validates every fastener once all parts are built.
//!
//! # Example
//!
//! ```
//! use partwright::{from_fn, Assembly};
//! use partwright_ir::{Color, Material};
//! use partwright_units::{Length, Point};
//!
//! let mut assembly = Assembly::new("Stack")?;
//! let root = assembly.root();
//! assembly.add_part(root, "Base", from_fn(|ctx| {
//!     let high = Point::new(Length::inch(2.0), Length::inch(2.0), Length::inch(1.0));
//!     ctx.stock_block("Block", Material::new("Plastic", "HDPE"), Color::new("tan"), Point::ORIGIN, high)?;
//!     Ok(())
//! }))?;
//! assembly.add_part(root, "Top", from_fn(|ctx| {
//!     let base = ctx.sibling("Base")?;
//!     let z0 = ctx.resolve(base)?.high().z;
//!     let low = Point::ORIGIN.with_z(z0);
//!     let high = Point::new(Length::inch(1.0), Length::inch(1.0), z0 + Length::inch(0.25));
//!     ctx.stock_block("Block", Material::new("Plastic", "HDPE"), Color::new("cyan"), low, high)?;
//!     Ok(())
//! }))?;
//!
//! let built = assembly.build()?;
//! let top = built.part("Stack/Top").expect("declared");
//! assert_eq!(top.bounding_box().low().z, Length::inch(1.0));
//! # Ok::<(), partwright::BuildError>(())
//! ```

pub mod assembly;
pub mod construct;
pub mod error;
pub mod fastener;
pub mod scheduler;
pub mod tree;

pub use assembly::{Assembly, BuiltAssembly};
pub use construct::{from_fn, Construct, ConstructContext, FromFn, PureAssembly};
pub use error::{BuildError, FastenerError, Result, ValidationReport};
pub use fastener::{Attachment, Fastener, FastenerGeometry, FastenerRegistry, FastenerStage};
pub use scheduler::{BuiltPart, PartState, Scheduler};
pub use tree::{PartId, PartTree, PATH_SEPARATOR};
