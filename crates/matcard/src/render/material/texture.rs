//! Texture definitions, texture references and their resolution
//!
//! Cards declare textures under `Render.Textures.<Name>.*`:
//!
//! ```text
//! Render.Textures.Wood.Images.0 = wood_albedo.png
//! Render.Textures.Wood.Images.1 = wood_normal.png
//! Render.Textures.Wood.Scale = 2.0
//! Render.Textures.Wood.Rotation = 90
//! Render.Textures.Wood.TranslationU = 0.5
//! Render.Textures.Wood.TranslationV = 0.0
//! ```
//!
//! and reference them from parameters as `Texture("Wood", 0)`, optionally
//! followed by `; <default>` for renderers that cannot consume the texture.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::assets::image_loader::ImageData;
use crate::assets::materials::{CardLoader, MaterialCard};
use super::error::{MaterialError, MaterialResult};
use super::value::{parse_float, Literal, ParamType, ParamValue};

const TEXTURES_PREFIX: &str = "Render.Textures.";
const IMAGES_INFIX: &str = ".Images.";

/// Reference from a parameter to an image of a texture
#[derive(Debug, Clone, PartialEq)]
pub struct TextureReference {
    /// Texture name
    pub texture: String,
    /// Image index within the texture
    pub index: u32,
    /// Literal used by renderers that cannot consume the texture
    pub default: Option<Literal>,
}

impl TextureReference {
    /// Create a reference without default
    pub fn new(texture: impl Into<String>, index: u32) -> Self {
        Self {
            texture: texture.into(),
            index,
            default: None,
        }
    }

    /// Attach a default literal
    pub fn with_default(mut self, default: Literal) -> Self {
        self.default = Some(default);
        self
    }

    /// Parse `Texture("name", index) [; default]`
    ///
    /// Returns `Ok(None)` when the text is not a texture expression at all,
    /// and an error when it starts like one but is malformed.
    pub fn parse(text: &str, param_type: ParamType) -> Result<Option<Self>, String> {
        let Some(rest) = text.trim().strip_prefix("Texture") else {
            return Ok(None);
        };
        let rest = rest
            .trim_start()
            .strip_prefix('(')
            .ok_or_else(|| format!("expected '(' after Texture in '{}'", text.trim()))?
            .trim_start();

        // Quoted texture name
        let quote = rest
            .chars()
            .next()
            .filter(|c| *c == '"' || *c == '\'')
            .ok_or_else(|| "texture name must be quoted".to_string())?;
        let rest = &rest[1..];
        let end = rest
            .find(quote)
            .ok_or_else(|| "unterminated texture name".to_string())?;
        let texture = &rest[..end];
        if texture.is_empty() {
            return Err("empty texture name".to_string());
        }

        let rest = rest[end + 1..]
            .trim_start()
            .strip_prefix(',')
            .ok_or_else(|| "expected ',' after texture name".to_string())?;
        let close = rest
            .find(')')
            .ok_or_else(|| "expected ')' after image index".to_string())?;
        let index_text = rest[..close].trim();
        let index: u32 = index_text
            .parse()
            .map_err(|_| format!("'{}' is not a valid image index", index_text))?;

        let tail = rest[close + 1..].trim();
        let default = if tail.is_empty() {
            None
        } else {
            let default_text = tail
                .strip_prefix(';')
                .ok_or_else(|| format!("unexpected '{}' after texture reference", tail))?;
            if param_type == ParamType::TextureOnly {
                return Err("texture-only parameters take no default value".to_string());
            }
            Some(Literal::parse(default_text, param_type)?)
        };

        Ok(Some(Self {
            texture: texture.to_string(),
            index,
            default,
        }))
    }
}

impl fmt::Display for TextureReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quote = if self.texture.contains('"') { '\'' } else { '"' };
        write!(f, "Texture({q}{}{q}, {})", self.texture, self.index, q = quote)?;
        if let Some(default) = &self.default {
            write!(f, " ; {}", default)?;
        }
        Ok(())
    }
}

/// A texture declared by a card
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDefinition {
    /// Texture name
    pub name: String,
    /// Image files by index, resolved against the card directory
    pub images: BTreeMap<u32, PathBuf>,
    /// Uniform scale
    pub scale: f32,
    /// Rotation in degrees
    pub rotation: f32,
    /// Translation along U
    pub translation_u: f32,
    /// Translation along V
    pub translation_v: f32,
}

impl TextureDefinition {
    /// Create a texture with no images and identity mapping
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            images: BTreeMap::new(),
            scale: 1.0,
            rotation: 0.0,
            translation_u: 0.0,
            translation_v: 0.0,
        }
    }

    /// Add an image
    pub fn with_image(mut self, index: u32, path: impl Into<PathBuf>) -> Self {
        self.images.insert(index, path.into());
        self
    }

    /// Path of an image
    pub fn image(&self, index: u32) -> Option<&Path> {
        self.images.get(&index).map(PathBuf::as_path)
    }

    /// Read and decode an image
    ///
    /// Images are only read when a consumer actually needs the pixels.
    pub fn load_image(&self, index: u32) -> MaterialResult<ImageData> {
        let path = self.image(index).ok_or_else(|| MaterialError::MissingImageIndex {
            texture: self.name.clone(),
            index,
        })?;
        ImageData::from_file(path)
    }
}

/// All textures declared by a card
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureTable {
    textures: BTreeMap<String, TextureDefinition>,
}

impl TextureTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the textures declared by a card
    ///
    /// Relative image paths are resolved against `base_dir`. Unrecognized
    /// `Render.Textures.*` keys are ignored.
    pub fn from_card(card: &MaterialCard, base_dir: &Path) -> MaterialResult<Self> {
        let mut table = Self::new();

        for (rest, entry) in card.with_prefix(TEXTURES_PREFIX) {
            let invalid = |reason: String| MaterialError::InvalidParameter {
                key: entry.key.clone(),
                value: entry.value.clone(),
                reason,
            };

            if let Some((name, index_text)) = rest.rsplit_once(IMAGES_INFIX) {
                let index: u32 = index_text
                    .parse()
                    .map_err(|_| invalid(format!("'{}' is not a valid image index", index_text)))?;
                let path = CardLoader::resolve_texture_path(base_dir, &entry.value);
                table.entry(name).images.insert(index, path);
                continue;
            }

            let Some((name, field)) = rest.rsplit_once('.') else {
                log::debug!("Ignoring texture key '{}'", entry.key);
                continue;
            };
            if !matches!(field, "Scale" | "Rotation" | "TranslationU" | "TranslationV") {
                log::debug!("Ignoring texture key '{}'", entry.key);
                continue;
            }
            let value = parse_float(&entry.value).map_err(invalid)?;
            let texture = table.entry(name);
            match field {
                "Scale" => texture.scale = value,
                "Rotation" => texture.rotation = value,
                "TranslationU" => texture.translation_u = value,
                _ => texture.translation_v = value,
            }
        }

        Ok(table)
    }

    fn entry(&mut self, name: &str) -> &mut TextureDefinition {
        self.textures
            .entry(name.to_string())
            .or_insert_with(|| TextureDefinition::new(name))
    }

    /// Add or replace a texture
    pub fn insert(&mut self, texture: TextureDefinition) {
        self.textures.insert(texture.name.clone(), texture);
    }

    /// Get a texture by name
    pub fn get(&self, name: &str) -> Option<&TextureDefinition> {
        self.textures.get(name)
    }

    /// Iterate over textures, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &TextureDefinition> {
        self.textures.values()
    }

    /// Number of textures
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// Whether a renderer can consume a texture for a given parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSupport {
    /// The texture is used as is
    Supported,
    /// The texture is replaced by the reference default
    Unsupported {
        /// Whether the renderer must write some value for the parameter
        requires_value: bool,
    },
}

/// A parameter value ready for a renderer
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedParam<'a> {
    /// Literal value (possibly a texture default)
    Literal(Literal),
    /// Validated texture image
    Texture {
        /// Texture definition
        texture: &'a TextureDefinition,
        /// Image index
        index: u32,
        /// Image path
        path: &'a Path,
    },
    /// The renderer skips this parameter
    Omitted,
}

/// Validates texture references against a texture table
pub struct TextureResolver<'a> {
    textures: &'a TextureTable,
}

impl<'a> TextureResolver<'a> {
    /// Create a resolver over a texture table
    pub fn new(textures: &'a TextureTable) -> Self {
        Self { textures }
    }

    /// Check that a reference points at an existing image
    ///
    /// Image 0 is mandatory for every referenced texture.
    pub fn validate(&self, reference: &TextureReference) -> MaterialResult<&'a TextureDefinition> {
        let texture = self
            .textures
            .get(&reference.texture)
            .ok_or_else(|| MaterialError::MissingTexture {
                texture: reference.texture.clone(),
            })?;

        for index in [0, reference.index] {
            if !texture.images.contains_key(&index) {
                return Err(MaterialError::MissingImageIndex {
                    texture: reference.texture.clone(),
                    index,
                });
            }
        }

        Ok(texture)
    }

    /// Resolve a reference for a renderer with the given support
    ///
    /// # Arguments
    /// * `reference` - The texture reference
    /// * `support` - What the renderer can do with a texture here
    /// * `parameter` - Parameter name, for error reporting
    /// * `renderer` - Renderer name, for error reporting
    pub fn resolve(
        &self,
        reference: &TextureReference,
        support: TextureSupport,
        parameter: &str,
        renderer: &str,
    ) -> MaterialResult<ResolvedParam<'a>> {
        let texture = self.validate(reference)?;

        match support {
            TextureSupport::Supported => {
                let path = texture.image(reference.index).ok_or_else(|| MaterialError::MissingImageIndex {
                    texture: reference.texture.clone(),
                    index: reference.index,
                })?;
                Ok(ResolvedParam::Texture {
                    texture,
                    index: reference.index,
                    path,
                })
            }
            TextureSupport::Unsupported { requires_value } => match (&reference.default, requires_value) {
                (Some(default), _) => {
                    log::debug!(
                        "Renderer '{}' cannot use texture '{}' for '{}', using default {}",
                        renderer, reference.texture, parameter, default
                    );
                    Ok(ResolvedParam::Literal(default.clone()))
                }
                (None, false) => {
                    log::warn!(
                        "Renderer '{}' cannot use texture '{}' for '{}', skipping parameter",
                        renderer, reference.texture, parameter
                    );
                    Ok(ResolvedParam::Omitted)
                }
                (None, true) => Err(MaterialError::NoDefaultAvailable {
                    parameter: parameter.to_string(),
                    renderer: renderer.to_string(),
                }),
            },
        }
    }

    /// Resolve any parameter value; literals pass through unchanged
    pub fn resolve_value(
        &self,
        value: &ParamValue,
        support: TextureSupport,
        parameter: &str,
        renderer: &str,
    ) -> MaterialResult<ResolvedParam<'a>> {
        match value {
            ParamValue::Literal(literal) => Ok(ResolvedParam::Literal(literal.clone())),
            ParamValue::Texture(reference) => self.resolve(reference, support, parameter, renderer),
        }
    }
}
