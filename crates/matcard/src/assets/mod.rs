//! # Asset Loading
//!
//! Material cards and the texture images they reference.

pub mod image_loader;
pub mod materials;

pub use image_loader::ImageData;
pub use materials::{CardLoader, CardParser, LoadedCard, MaterialCache, MaterialCard, MaterialLibrary};
