//! Material model and resolution
//!
//! Turns parsed material cards into something a renderer can write:
//! passthrough scripts, standard materials with validated textures, or a
//! fallback color.

pub mod builder;
pub mod error;
pub mod passthrough;
pub mod resolver;
pub mod schema;
pub mod standard;
pub mod texture;
pub mod value;

pub use builder::StandardMaterialBuilder;
pub use error::{MaterialError, MaterialResult};
pub use passthrough::{substitute_pseudovariables, PassthroughAssembler, PassthroughBlock, PassthroughLine};
pub use resolver::{
    FallbackSource, MaterialLookup, MaterialResolver, NoLookup, Resolution, ResolutionContext, ResolvedMaterial,
};
pub use schema::{DefaultValue, MaterialKind, ParamSpec};
pub use standard::{MaterialParameter, StandardMaterial, TYPE_KEY};
pub use texture::{ResolvedParam, TextureDefinition, TextureReference, TextureResolver, TextureSupport, TextureTable};
pub use value::{Literal, ParamType, ParamValue};
