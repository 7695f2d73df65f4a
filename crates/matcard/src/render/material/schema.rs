//! Standard material kinds and their parameter schemas
//!
//! Each kind has a fixed list of parameters (name, type, default). Card keys
//! are `Render.<Kind>.<Parameter>`, e.g. `Render.Glass.IOR` or
//! `Render.Mixed.Diffuse.Color`.

use std::fmt;
use std::str::FromStr;

use super::value::{Literal, ParamType};
use crate::foundation::math::rgb;

/// Default value of a schema parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    /// RGB color
    Rgb([f32; 3]),
    /// Scalar
    Float(f32),
    /// Texture-only parameters have no default
    None,
}

/// One parameter of a material schema
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Parameter name, as used in card keys
    pub name: &'static str,
    /// Expected value type
    pub param_type: ParamType,
    /// Value used when the card omits the parameter
    pub default: DefaultValue,
}

impl ParamSpec {
    const fn rgb(name: &'static str, default: [f32; 3]) -> Self {
        Self { name, param_type: ParamType::Rgb, default: DefaultValue::Rgb(default) }
    }

    const fn float(name: &'static str, default: f32) -> Self {
        Self { name, param_type: ParamType::Float, default: DefaultValue::Float(default) }
    }

    const fn texture_only(name: &'static str) -> Self {
        Self { name, param_type: ParamType::TextureOnly, default: DefaultValue::None }
    }

    /// Default as a literal
    pub fn default_literal(&self) -> Option<Literal> {
        match self.default {
            DefaultValue::Rgb(c) => Some(Literal::Rgb(rgb(c))),
            DefaultValue::Float(v) => Some(Literal::Float(v)),
            DefaultValue::None => None,
        }
    }

    /// Check if the parameter only accepts textures
    pub fn is_texture_only(&self) -> bool {
        self.param_type == ParamType::TextureOnly
    }
}

const GREY: [f32; 3] = [0.8, 0.8, 0.8];
const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

const BUMP: ParamSpec = ParamSpec::texture_only("Bump");
const NORMAL: ParamSpec = ParamSpec::texture_only("Normal");
const DISPLACEMENT: ParamSpec = ParamSpec::texture_only("Displacement");

static DIFFUSE: [ParamSpec; 4] = [ParamSpec::rgb("Color", GREY), BUMP, NORMAL, DISPLACEMENT];

static DISNEY: [ParamSpec; 14] = [
    ParamSpec::rgb("BaseColor", GREY),
    ParamSpec::float("Subsurface", 0.0),
    ParamSpec::float("Metallic", 0.0),
    ParamSpec::float("Specular", 0.0),
    ParamSpec::float("SpecularTint", 0.0),
    ParamSpec::float("Roughness", 0.0),
    ParamSpec::float("Anisotropic", 0.0),
    ParamSpec::float("Sheen", 0.0),
    ParamSpec::float("SheenTint", 0.0),
    ParamSpec::float("ClearCoat", 0.0),
    ParamSpec::float("ClearCoatGloss", 0.0),
    BUMP,
    NORMAL,
    DISPLACEMENT,
];

static GLASS: [ParamSpec; 5] = [
    ParamSpec::float("IOR", 1.5),
    ParamSpec::rgb("Color", WHITE),
    BUMP,
    NORMAL,
    DISPLACEMENT,
];

static SUBSTANCE_PBR: [ParamSpec; 7] = [
    ParamSpec::rgb("BaseColor", GREY),
    ParamSpec::float("Roughness", 0.0),
    ParamSpec::float("Metallic", 0.0),
    ParamSpec::float("Specular", 0.5),
    BUMP,
    NORMAL,
    DISPLACEMENT,
];

static MIXED: [ParamSpec; 7] = [
    ParamSpec::rgb("Diffuse.Color", GREY),
    ParamSpec::float("Glass.IOR", 1.5),
    ParamSpec::rgb("Glass.Color", WHITE),
    ParamSpec::float("Transparency", 0.5),
    BUMP,
    NORMAL,
    DISPLACEMENT,
];

static CARPAINT: [ParamSpec; 4] = [ParamSpec::rgb("BaseColor", [0.8, 0.2, 0.2]), BUMP, NORMAL, DISPLACEMENT];

static EMISSION: [ParamSpec; 5] = [
    ParamSpec::rgb("Color", WHITE),
    ParamSpec::float("Power", 10.0),
    BUMP,
    NORMAL,
    DISPLACEMENT,
];

/// Renderer-agnostic material kinds, selected by `Render.Type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// Matte material
    Diffuse,
    /// Disney principled BSDF
    Disney,
    /// Clear or tinted glass
    Glass,
    /// Substance-style metallic/roughness PBR
    SubstancePbr,
    /// Blend of a diffuse and a glass material
    Mixed,
    /// Car paint
    Carpaint,
    /// Light-emitting surface
    Emission,
}

impl MaterialKind {
    /// All kinds, in declaration order
    pub const ALL: [Self; 7] = [
        Self::Diffuse,
        Self::Disney,
        Self::Glass,
        Self::SubstancePbr,
        Self::Mixed,
        Self::Carpaint,
        Self::Emission,
    ];

    /// Name used in `Render.Type` and in parameter keys
    pub fn card_name(self) -> &'static str {
        match self {
            Self::Diffuse => "Diffuse",
            Self::Disney => "Disney",
            Self::Glass => "Glass",
            Self::SubstancePbr => "Substance_PBR",
            Self::Mixed => "Mixed",
            Self::Carpaint => "Carpaint",
            Self::Emission => "Emission",
        }
    }

    /// Look up a kind by its exact card name
    pub fn from_card_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.card_name() == name)
    }

    /// Parameter schema of this kind
    pub fn schema(self) -> &'static [ParamSpec] {
        match self {
            Self::Diffuse => &DIFFUSE,
            Self::Disney => &DISNEY,
            Self::Glass => &GLASS,
            Self::SubstancePbr => &SUBSTANCE_PBR,
            Self::Mixed => &MIXED,
            Self::Carpaint => &CARPAINT,
            Self::Emission => &EMISSION,
        }
    }

    /// Find a parameter of this kind
    pub fn param(self, name: &str) -> Option<&'static ParamSpec> {
        self.schema().iter().find(|spec| spec.name == name)
    }

    /// Card key of a parameter, e.g. `Render.Glass.IOR`
    pub fn param_key(self, name: &str) -> String {
        format!("Render.{}.{}", self.card_name(), name)
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.card_name())
    }
}

impl FromStr for MaterialKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_card_name(s).ok_or_else(|| format!("unknown material type '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_names_round_trip() {
        for kind in MaterialKind::ALL {
            assert_eq!(MaterialKind::from_card_name(kind.card_name()), Some(kind));
        }
        assert_eq!("Substance_PBR".parse::<MaterialKind>(), Ok(MaterialKind::SubstancePbr));
        // Exact, case-sensitive match
        assert!("diffuse".parse::<MaterialKind>().is_err());
    }

    #[test]
    fn test_every_kind_has_texture_only_maps() {
        for kind in MaterialKind::ALL {
            for name in ["Bump", "Normal", "Displacement"] {
                let spec = kind.param(name).unwrap();
                assert!(spec.is_texture_only());
                assert_eq!(spec.default_literal(), None);
            }
        }
    }

    #[test]
    fn test_diffuse_default() {
        let spec = MaterialKind::Diffuse.param("Color").unwrap();
        assert_eq!(spec.default_literal(), Some(Literal::Rgb(rgb([0.8, 0.8, 0.8]))));
    }

    #[test]
    fn test_param_key() {
        assert_eq!(MaterialKind::Mixed.param_key("Glass.IOR"), "Render.Mixed.Glass.IOR");
        assert_eq!(MaterialKind::SubstancePbr.param_key("Roughness"), "Render.Substance_PBR.Roughness");
    }
}
