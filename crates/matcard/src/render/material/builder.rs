//! Programmatic construction of standard materials
//!
//! Provides a builder API for creating standard materials in code, with
//! presets for the common kinds.

use crate::foundation::math::Vec3;
use super::error::{MaterialError, MaterialResult};
use super::schema::MaterialKind;
use super::standard::StandardMaterial;
use super::texture::TextureReference;
use super::value::{Literal, ParamValue};

/// Builder for standard materials
///
/// # Examples
/// ```
/// use matcard::render::material::{MaterialKind, StandardMaterialBuilder};
/// use matcard::foundation::math::Vec3;
///
/// let glass = StandardMaterialBuilder::new(MaterialKind::Glass)
///     .float("IOR", 1.33)
///     .color("Color", Vec3::new(0.9, 0.95, 1.0))
///     .build()
///     .unwrap();
/// assert_eq!(glass.float("IOR"), Some(1.33));
/// ```
pub struct StandardMaterialBuilder {
    material: StandardMaterial,
    error: Option<MaterialError>,
}

impl StandardMaterialBuilder {
    /// Start from a material of the given kind with schema defaults
    pub fn new(kind: MaterialKind) -> Self {
        Self {
            material: StandardMaterial::new(kind),
            error: None,
        }
    }

    /// Set a color parameter
    pub fn color(self, name: &str, color: Vec3) -> Self {
        self.value(name, ParamValue::Literal(Literal::Rgb(color)))
    }

    /// Set a scalar parameter
    pub fn float(self, name: &str, value: f32) -> Self {
        self.value(name, ParamValue::Literal(Literal::Float(value)))
    }

    /// Point a parameter at a texture image
    pub fn texture(self, name: &str, reference: TextureReference) -> Self {
        self.value(name, ParamValue::Texture(reference))
    }

    /// Set any parameter value
    ///
    /// The first invalid value is reported by `build`.
    pub fn value(mut self, name: &str, value: ParamValue) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.material.set(name, value) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Build the final material
    pub fn build(self) -> MaterialResult<StandardMaterial> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.material),
        }
    }

    // Presets

    /// Matte material of a single color
    pub fn diffuse(color: Vec3) -> Self {
        Self::new(MaterialKind::Diffuse).color("Color", color)
    }

    /// Glass with the given index of refraction and tint
    pub fn glass(ior: f32, color: Vec3) -> Self {
        Self::new(MaterialKind::Glass).float("IOR", ior).color("Color", color)
    }

    /// Light-emitting surface
    pub fn emission(color: Vec3, power: f32) -> Self {
        Self::new(MaterialKind::Emission).color("Color", color).float("Power", power)
    }
}
