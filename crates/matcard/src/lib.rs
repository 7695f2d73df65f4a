//! # matcard
//!
//! Material cards for renderers: parses `.FCMat` material cards and turns
//! them into renderer-native material definitions.
//!
//! ## Features
//!
//! - **Card parsing**: INI-style cards flattened to ordered key/value maps
//! - **Standard materials**: Diffuse, Disney, Glass, Substance PBR, Mixed, Carpaint, Emission
//! - **Passthrough**: Renderer-native lines carried verbatim by the card
//! - **Textures**: `Texture("name", index)` references with per-renderer defaults
//! - **Resolution cascade**: passthrough, standard, parent (`Father`) and fallback
//! - **Renderer plugins**: OSPRay Studio and Wavefront MTL built in
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use matcard::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let card = Arc::new(CardLoader::load("materials/Steel.FCMat")?);
//!     let library = MaterialLibrary::from_config(&ApplicationConfig::default());
//!     let registry = RendererRegistry::with_builtin_plugins();
//!     let exporter = MaterialExporter::new(&registry, MaterialResolver::new(&library));
//!
//!     let ctx = ResolutionContext::new("Bracket", Vec3::new(0.8, 0.8, 0.8));
//!     println!("{}", exporter.export("Ospray", Some(&card), &ctx)?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;

pub mod assets;
pub mod config;
pub mod foundation;
pub mod render;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        assets::materials::{CardLoader, CardParser, LoadedCard, MaterialCard, MaterialLibrary},
        config::Config,
        core::config::{ApplicationConfig, DuplicateKeyPolicy},
        foundation::math::Vec3,
        render::material::{
            MaterialError, MaterialKind, MaterialResolver, ResolutionContext, ResolvedMaterial, StandardMaterial,
        },
        render::plugins::{MaterialExporter, RendererPlugin, RendererRegistry},
    };
}

pub use assets::materials::{CardParser, MaterialCard, ParseError};
pub use render::material::{MaterialError, MaterialResult};
