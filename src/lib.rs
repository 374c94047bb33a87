//! crate3d: a 3D bin-packing engine for shipping.
//!
//! Given a multiset of rectangular items and a palette of candidate boxes,
//! [`packer::pack`] chooses the best box and produces a concrete parcel
//! assignment. [`packer::space_after_packing`] and [`packer::how_many_fit`]
//! expose the same placement core as standalone diagnostics.

pub mod api;
pub mod config;
pub mod geometry;
pub mod model;
pub mod packer;
pub mod types;
pub mod units;

pub use model::{BoxType, FitReport, Item, PackError, PackResult, Parcel, SpaceReport, ValidationError};
pub use packer::{how_many_fit, pack, space_after_packing};
pub use types::Dims;
