//! Material resolution cascade
//!
//! Decides what an object's material becomes for a given renderer:
//!
//! 1. the card's passthrough lines for that renderer, if any;
//! 2. otherwise its standard material, if `Render.Type` is set;
//! 3. otherwise the same steps on the parent card named by `Father`;
//! 4. otherwise a matte fallback color.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::assets::materials::LoadedCard;
use crate::core::config::ResolverConfig;
use crate::foundation::math::{is_unit_color, rgb, Vec3, WHITE};
use super::error::{MaterialError, MaterialResult};
use super::passthrough::{PassthroughAssembler, PassthroughBlock};
use super::standard::StandardMaterial;
use super::texture::{TextureResolver, TextureTable};
use super::value::parse_color;

/// The object a material is resolved for
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionContext {
    /// Object name, substituted for `%NAME%`
    pub name: String,
    /// Object display color, components in 0-1
    pub default_color: Vec3,
}

impl ResolutionContext {
    /// Create a context
    pub fn new(name: impl Into<String>, default_color: Vec3) -> Self {
        Self {
            name: name.into(),
            default_color,
        }
    }
}

/// Where a fallback color came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackSource {
    /// `DiffuseColor` of the named material card
    MaterialColor(String),
    /// The object's own color
    ObjectColor,
    /// Nothing usable, plain white
    White,
}

/// Outcome of the cascade
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedMaterial {
    /// Renderer-native lines, pseudovariables already substituted
    Passthrough(PassthroughBlock),
    /// Standard material with its card's textures
    Standard {
        /// The material
        material: StandardMaterial,
        /// Textures declared by the card that defined the material
        textures: TextureTable,
    },
    /// Matte material of a single color
    Fallback {
        /// Diffuse color
        color: Vec3,
        /// Where the color came from
        source: FallbackSource,
    },
}

impl ResolvedMaterial {
    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passthrough(_) => "passthrough",
            Self::Standard { .. } => "standard",
            Self::Fallback { .. } => "fallback",
        }
    }
}

/// A resolved material and the card that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The resolved material
    pub material: ResolvedMaterial,
    /// Name of the card that produced it (`None` for objects without material)
    pub source: Option<String>,
}

/// Finds material cards by name
pub trait MaterialLookup {
    /// Look up a card by exact material name
    fn find_material(&self, name: &str) -> Option<Arc<LoadedCard>>;
}

impl MaterialLookup for HashMap<String, Arc<LoadedCard>> {
    fn find_material(&self, name: &str) -> Option<Arc<LoadedCard>> {
        self.get(name).cloned()
    }
}

/// Lookup that knows no materials, so parents are never found
pub struct NoLookup;

impl MaterialLookup for NoLookup {
    fn find_material(&self, _name: &str) -> Option<Arc<LoadedCard>> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CascadeState {
    TryPassthrough,
    TryStandard,
    TryParent,
    Fallback,
}

/// Runs the resolution cascade
pub struct MaterialResolver<'a> {
    lookup: &'a dyn MaterialLookup,
    config: ResolverConfig,
}

impl<'a> MaterialResolver<'a> {
    /// Create a resolver with the default configuration
    pub fn new(lookup: &'a dyn MaterialLookup) -> Self {
        Self::with_config(lookup, ResolverConfig::default())
    }

    /// Create a resolver
    pub fn with_config(lookup: &'a dyn MaterialLookup, config: ResolverConfig) -> Self {
        Self { lookup, config }
    }

    /// Resolve a card for a renderer
    ///
    /// Standard material errors and parent cycles are returned; a parent
    /// that cannot be found leads to the fallback.
    ///
    /// # Arguments
    /// * `card` - The object's material card
    /// * `renderer` - Exact renderer name, for passthrough lookup
    /// * `ctx` - The object being rendered
    pub fn resolve(
        &self,
        card: &Arc<LoadedCard>,
        renderer: &str,
        ctx: &ResolutionContext,
    ) -> MaterialResult<Resolution> {
        let mut chain: Vec<Arc<LoadedCard>> = vec![Arc::clone(card)];
        let mut visited: Vec<String> = vec![card.name.clone()];
        let mut visited_set: HashSet<String> = visited.iter().cloned().collect();
        let mut current = Arc::clone(card);
        let mut state = CascadeState::TryPassthrough;

        loop {
            log::trace!("Material '{}': {:?}", current.name, state);
            state = match state {
                CascadeState::TryPassthrough => match PassthroughAssembler::assemble(&current.card, renderer) {
                    Some(block) => {
                        return Ok(Resolution {
                            material: ResolvedMaterial::Passthrough(block.substitute(ctx)),
                            source: Some(current.name.clone()),
                        });
                    }
                    None => CascadeState::TryStandard,
                },
                CascadeState::TryStandard => match StandardMaterial::from_card(&current.card, &current.name)? {
                    Some(material) => {
                        let textures = current.textures()?;
                        let texture_resolver = TextureResolver::new(&textures);
                        for (_, reference) in material.texture_references() {
                            texture_resolver.validate(reference)?;
                        }
                        return Ok(Resolution {
                            material: ResolvedMaterial::Standard { material, textures },
                            source: Some(current.name.clone()),
                        });
                    }
                    None => CascadeState::TryParent,
                },
                CascadeState::TryParent => {
                    let parent_name = current
                        .card
                        .get(&self.config.parent_key)
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string);

                    match parent_name {
                        None => CascadeState::Fallback,
                        Some(parent_name) if visited_set.contains(&parent_name) => {
                            visited.push(parent_name);
                            return Err(MaterialError::CyclicMaterial { chain: visited });
                        }
                        Some(parent_name) => match self.lookup.find_material(&parent_name) {
                            Some(parent) => {
                                log::debug!("Material '{}': following parent '{}'", current.name, parent_name);
                                visited_set.insert(parent_name.clone());
                                visited.push(parent_name);
                                chain.push(Arc::clone(&parent));
                                current = parent;
                                CascadeState::TryPassthrough
                            }
                            None => {
                                log::warn!(
                                    "Material '{}': parent material '{}' not found, using fallback",
                                    current.name, parent_name
                                );
                                CascadeState::Fallback
                            }
                        },
                    }
                }
                CascadeState::Fallback => {
                    return Ok(Resolution {
                        material: self.fallback(&chain, ctx),
                        source: Some(card.name.clone()),
                    });
                }
            };
        }
    }

    /// Resolve a material, never failing
    ///
    /// Objects without material get the fallback right away. Resolution
    /// errors are logged and replaced by the fallback of the root card.
    pub fn resolve_or_fallback(
        &self,
        card: Option<&Arc<LoadedCard>>,
        renderer: &str,
        ctx: &ResolutionContext,
    ) -> Resolution {
        let Some(card) = card else {
            return Resolution {
                material: self.fallback(&[], ctx),
                source: None,
            };
        };

        self.resolve(card, renderer, ctx).unwrap_or_else(|e| {
            log::warn!("Object '{}': {}. Using fallback material", ctx.name, e);
            Resolution {
                material: self.fallback(std::slice::from_ref(card), ctx),
                source: Some(card.name.clone()),
            }
        })
    }

    /// Matte material from the first usable diffuse color along the chain,
    /// then the object color, then white
    pub fn fallback(&self, chain: &[Arc<LoadedCard>], ctx: &ResolutionContext) -> ResolvedMaterial {
        let from_card = chain.iter().find_map(|card| {
            let text = card.card.get(&self.config.diffuse_color_key)?;
            match parse_color(text) {
                Ok(color) => Some((color, FallbackSource::MaterialColor(card.name.clone()))),
                Err(reason) => {
                    log::debug!("Material '{}': ignoring {}: {}", card.name, self.config.diffuse_color_key, reason);
                    None
                }
            }
        });

        let (color, source) = from_card.unwrap_or_else(|| {
            if is_unit_color(&ctx.default_color) {
                (ctx.default_color, FallbackSource::ObjectColor)
            } else {
                (rgb(WHITE), FallbackSource::White)
            }
        });

        ResolvedMaterial::Fallback { color, source }
    }
}
