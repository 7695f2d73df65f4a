//! # Rendering
//!
//! Renderer-facing side of the crate: the material model with its resolution
//! cascade, and the plugins that write resolved materials for a renderer.

pub mod material;
pub mod plugins;

pub use material::{MaterialError, MaterialKind, MaterialResolver, ResolutionContext, StandardMaterial};
pub use plugins::{MaterialExporter, RendererFeatures, RendererPlugin, RendererRegistry};
