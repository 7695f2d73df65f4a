//! Parameter values: literals and texture references
//!
//! Card values are parsed against the parameter type declared by the
//! material schema. Decimal separators are always `.`.

use std::fmt;

use crate::foundation::math::Vec3;
use super::texture::TextureReference;

/// Type of a material parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// RGB color, `(r, g, b)`
    Rgb,
    /// Scalar
    Float,
    /// Accepts texture references only (bump, normal, displacement)
    TextureOnly,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb => write!(f, "RGB"),
            Self::Float => write!(f, "float"),
            Self::TextureOnly => write!(f, "texture"),
        }
    }
}

/// A literal parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// RGB color
    Rgb(Vec3),
    /// Scalar
    Float(f32),
}

impl Literal {
    /// Parse a literal of the given type
    pub fn parse(text: &str, param_type: ParamType) -> Result<Self, String> {
        match param_type {
            ParamType::Rgb => parse_color(text).map(Self::Rgb),
            ParamType::Float => parse_float(text).map(Self::Float),
            ParamType::TextureOnly => Err("parameter only accepts a texture reference".to_string()),
        }
    }

    /// The type this literal satisfies
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::Rgb(_) => ParamType::Rgb,
            Self::Float(_) => ParamType::Float,
        }
    }

    /// Color value, if this is a color
    pub fn as_color(&self) -> Option<Vec3> {
        match self {
            Self::Rgb(c) => Some(*c),
            Self::Float(_) => None,
        }
    }

    /// Scalar value, if this is a scalar
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Rgb(_) => None,
        }
    }
}

impl fmt::Display for Literal {
    /// Card syntax: `(r, g, b)` or a bare number
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb(c) => write!(f, "({}, {}, {})", c.x, c.y, c.z),
            Self::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A parameter value as written in a card
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Literal value
    Literal(Literal),
    /// `Texture("name", index)` with optional `; default`
    Texture(TextureReference),
}

impl ParamValue {
    /// Parse a card value for a parameter of the given type
    pub fn parse(text: &str, param_type: ParamType) -> Result<Self, String> {
        if let Some(reference) = TextureReference::parse(text, param_type)? {
            return Ok(Self::Texture(reference));
        }
        Literal::parse(text, param_type).map(Self::Literal)
    }

    /// Literal value, if not a texture
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(l) => Some(l),
            Self::Texture(_) => None,
        }
    }

    /// Texture reference, if any
    pub fn as_texture(&self) -> Option<&TextureReference> {
        match self {
            Self::Texture(t) => Some(t),
            Self::Literal(_) => None,
        }
    }

    /// Check if this value is a texture reference
    pub fn is_texture(&self) -> bool {
        matches!(self, Self::Texture(_))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(l) => l.fmt(f),
            Self::Texture(t) => t.fmt(f),
        }
    }
}

/// Parse a finite scalar
pub fn parse_float(text: &str) -> Result<f32, String> {
    let text = text.trim();
    let value: f32 = text
        .parse()
        .map_err(|_| format!("'{}' is not a number", text))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{}' is not a finite number", text))
    }
}

/// Parse a color written as `(r, g, b)` or `(r, g, b, a)`
///
/// Parentheses are optional. The alpha component, when present, is dropped.
pub fn parse_color(text: &str) -> Result<Vec3, String> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(trimmed);

    let components = inner
        .split(',')
        .map(parse_float)
        .collect::<Result<Vec<f32>, String>>()?;

    match components.as_slice() {
        [r, g, b] | [r, g, b, _] => Ok(Vec3::new(*r, *g, *b)),
        _ => Err(format!("'{}' is not an RGB color", trimmed)),
    }
}
