//! Standard (renderer-agnostic) materials
//!
//! A standard material is a `MaterialKind` plus one value per parameter of
//! the kind's schema. Values are kept as written in the card: literals or
//! texture references. Images are never touched here.

use crate::assets::materials::MaterialCard;
use crate::foundation::math::Vec3;
use super::error::{MaterialError, MaterialResult};
use super::schema::{MaterialKind, ParamSpec};
use super::texture::TextureReference;
use super::value::{Literal, ParamType, ParamValue};

/// Card key selecting the material kind
pub const TYPE_KEY: &str = "Render.Type";

/// A schema parameter with its value
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialParameter {
    /// Schema entry
    pub spec: &'static ParamSpec,
    /// Current value; `None` only for unset texture-only parameters
    pub value: Option<ParamValue>,
    /// Whether the value was given explicitly (as opposed to the default)
    pub explicit: bool,
}

impl MaterialParameter {
    fn with_default(spec: &'static ParamSpec) -> Self {
        Self {
            spec,
            value: spec.default_literal().map(ParamValue::Literal),
            explicit: false,
        }
    }

    /// Parameter name
    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    /// Literal value, if the parameter holds one
    pub fn literal(&self) -> Option<&Literal> {
        self.value.as_ref().and_then(ParamValue::as_literal)
    }

    /// Texture reference, if the parameter holds one
    pub fn texture(&self) -> Option<&TextureReference> {
        self.value.as_ref().and_then(ParamValue::as_texture)
    }
}

/// Check that a value fits a parameter type
pub(crate) fn check_value(spec: &ParamSpec, value: &ParamValue) -> Result<(), String> {
    match (spec.param_type, value) {
        (ParamType::TextureOnly, ParamValue::Literal(_)) => {
            Err("parameter only accepts a texture reference".to_string())
        }
        (ParamType::TextureOnly, ParamValue::Texture(t)) if t.default.is_some() => {
            Err("texture-only parameters take no default value".to_string())
        }
        (expected, ParamValue::Literal(l)) if l.param_type() != expected => {
            Err(format!("expected {} value, got {}", expected, l.param_type()))
        }
        (expected, ParamValue::Texture(TextureReference { default: Some(l), .. })) if l.param_type() != expected => {
            Err(format!("expected {} default, got {}", expected, l.param_type()))
        }
        _ => Ok(()),
    }
}

/// A renderer-agnostic material
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    kind: MaterialKind,
    parameters: Vec<MaterialParameter>,
}

impl StandardMaterial {
    /// Create a material of the given kind with every parameter at its default
    pub fn new(kind: MaterialKind) -> Self {
        Self {
            kind,
            parameters: kind.schema().iter().map(MaterialParameter::with_default).collect(),
        }
    }

    /// Build a standard material from a card
    ///
    /// Returns `Ok(None)` when the card has no `Render.Type`. Parameters
    /// missing from the card keep their schema defaults; keys under
    /// `Render.<Kind>.` that the schema does not know are ignored.
    ///
    /// # Arguments
    /// * `card` - The parsed card
    /// * `material_name` - Material name, for error reporting
    pub fn from_card(card: &MaterialCard, material_name: &str) -> MaterialResult<Option<Self>> {
        let Some(type_name) = card.get(TYPE_KEY) else {
            return Ok(None);
        };
        let kind = MaterialKind::from_card_name(type_name).ok_or_else(|| MaterialError::UnknownMaterialType {
            material: material_name.to_string(),
            type_name: type_name.to_string(),
        })?;

        let mut material = Self::new(kind);
        for parameter in &mut material.parameters {
            let key = kind.param_key(parameter.spec.name);
            let Some(text) = card.get(&key) else {
                continue;
            };
            let value = ParamValue::parse(text, parameter.spec.param_type).map_err(|reason| {
                MaterialError::InvalidParameter {
                    key: key.clone(),
                    value: text.to_string(),
                    reason,
                }
            })?;
            parameter.value = Some(value);
            parameter.explicit = true;
        }

        let prefix = format!("Render.{}.", kind.card_name());
        for (rest, entry) in card.with_prefix(&prefix) {
            if kind.param(rest).is_none() {
                log::debug!(
                    "Material '{}': ignoring unknown {} parameter '{}' (line {})",
                    material_name, kind, rest, entry.line
                );
            }
        }

        Ok(Some(material))
    }

    /// Material kind
    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    /// All parameters, in schema order
    pub fn parameters(&self) -> &[MaterialParameter] {
        &self.parameters
    }

    /// Get a parameter by name
    pub fn get(&self, name: &str) -> Option<&MaterialParameter> {
        self.parameters.iter().find(|p| p.spec.name == name)
    }

    /// Get a parameter value by name
    pub fn value(&self, name: &str) -> Option<&ParamValue> {
        self.get(name).and_then(|p| p.value.as_ref())
    }

    /// Literal color of a parameter
    pub fn color(&self, name: &str) -> Option<Vec3> {
        self.get(name).and_then(MaterialParameter::literal).and_then(Literal::as_color)
    }

    /// Literal scalar of a parameter
    pub fn float(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(MaterialParameter::literal).and_then(Literal::as_float)
    }

    /// Set a parameter explicitly
    pub fn set(&mut self, name: &str, value: ParamValue) -> MaterialResult<()> {
        let kind = self.kind;
        let parameter = self
            .parameters
            .iter_mut()
            .find(|p| p.spec.name == name)
            .ok_or_else(|| MaterialError::InvalidParameter {
                key: kind.param_key(name),
                value: value.to_string(),
                reason: format!("{} materials have no such parameter", kind),
            })?;
        check_value(parameter.spec, &value).map_err(|reason| MaterialError::InvalidParameter {
            key: kind.param_key(name),
            value: value.to_string(),
            reason,
        })?;
        parameter.value = Some(value);
        parameter.explicit = true;
        Ok(())
    }

    /// Parameters holding texture references
    pub fn texture_references(&self) -> impl Iterator<Item = (&MaterialParameter, &TextureReference)> {
        self.parameters.iter().filter_map(|p| p.texture().map(|t| (p, t)))
    }

    /// Serialize `Render.Type` and every explicit parameter to card syntax
    pub fn to_card_entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![(TYPE_KEY.to_string(), self.kind.card_name().to_string())];
        entries.extend(self.parameters.iter().filter(|p| p.explicit).filter_map(|p| {
            p.value
                .as_ref()
                .map(|value| (self.kind.param_key(p.spec.name), value.to_string()))
        }));
        entries
    }

    /// Serialize to a card holding only this material's keys
    pub fn to_card(&self) -> MaterialCard {
        MaterialCard::from_pairs(self.to_card_entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::materials::CardParser;

    fn build(text: &str) -> MaterialResult<Option<StandardMaterial>> {
        let card = CardParser::parse(text).unwrap();
        StandardMaterial::from_card(&card, "Test")
    }

    #[test]
    fn test_diffuse_default_color() {
        let material = build("Render.Type = Diffuse\n").unwrap().unwrap();
        assert_eq!(material.kind(), MaterialKind::Diffuse);
        assert_eq!(material.color("Color"), Some(Vec3::new(0.8, 0.8, 0.8)));
        assert!(!material.get("Color").unwrap().explicit);
    }

    #[test]
    fn test_no_type() {
        assert!(build("Render.Diffuse.Color = (1, 0, 0)\n").unwrap().is_none());
    }

    #[test]
    fn test_unknown_type() {
        let result = build("Render.Type = Velvet\n");
        assert!(matches!(
            result,
            Err(MaterialError::UnknownMaterialType { ref type_name, .. }) if type_name == "Velvet"
        ));
    }

    #[test]
    fn test_disney_parameters() {
        let material = build(
            r#"
Render.Type = Disney
Render.Disney.BaseColor = (0.9, 0.1, 0.1)
Render.Disney.Metallic = 0.7
Render.Disney.Roughness = Texture("Scratches", 0) ; 0.35
Render.Disney.Normal = Texture("Scratches", 1)
Render.Disney.Shininess = 12
"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(material.color("BaseColor"), Some(Vec3::new(0.9, 0.1, 0.1)));
        assert_eq!(material.float("Metallic"), Some(0.7));
        assert_eq!(material.float("Specular"), Some(0.0));

        let roughness = material.get("Roughness").unwrap().texture().unwrap();
        assert_eq!(roughness.texture, "Scratches");
        assert_eq!(roughness.default, Some(Literal::Float(0.35)));

        assert_eq!(material.texture_references().count(), 2);
        // Unknown "Shininess" is ignored
        assert!(material.get("Shininess").is_none());
    }

    #[test]
    fn test_mixed_nested_keys() {
        let material = build(
            "Render.Type = Mixed\nRender.Mixed.Glass.IOR = 1.33\nRender.Mixed.Transparency = 0.8\n",
        )
        .unwrap()
        .unwrap();
        assert_eq!(material.float("Glass.IOR"), Some(1.33));
        assert_eq!(material.float("Transparency"), Some(0.8));
        assert_eq!(material.color("Diffuse.Color"), Some(Vec3::new(0.8, 0.8, 0.8)));
    }

    #[test]
    fn test_invalid_parameter() {
        let result = build("Render.Type = Glass\nRender.Glass.IOR = (1, 1, 1)\n");
        assert!(matches!(result, Err(MaterialError::InvalidParameter { ref key, .. }) if key == "Render.Glass.IOR"));

        let result = build("Render.Type = Glass\nRender.Glass.Bump = 0.5\n");
        assert!(matches!(result, Err(MaterialError::InvalidParameter { .. })));
    }

    #[test]
    fn test_round_trip_through_card() {
        let original = build(
            r#"
Render.Type = Substance_PBR
Render.Substance_PBR.BaseColor = Texture("Paint", 0) ; (0.2, 0.3, 0.4)
Render.Substance_PBR.Roughness = 0.25
Render.Substance_PBR.Specular = 0.5
Render.Substance_PBR.Bump = Texture("Paint", 2)
"#,
        )
        .unwrap()
        .unwrap();

        let entries = original.to_card_entries();
        assert_eq!(entries[0], ("Render.Type".to_string(), "Substance_PBR".to_string()));
        // Specular is explicit even though it equals the default
        assert_eq!(entries.len(), 5);

        let card = CardParser::parse(&original.to_card().to_fcmat_string()).unwrap();
        let rebuilt = StandardMaterial::from_card(&card, "Test").unwrap().unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_set_checks_types() {
        let mut material = StandardMaterial::new(MaterialKind::Glass);
        assert!(material.set("IOR", ParamValue::Literal(Literal::Float(1.45))).is_ok());
        assert!(material.set("IOR", ParamValue::Literal(Literal::Rgb(Vec3::zeros()))).is_err());
        assert!(material.set("Sheen", ParamValue::Literal(Literal::Float(0.1))).is_err());
        assert!(material
            .set("Color", ParamValue::Texture(TextureReference::new("Tint", 0).with_default(Literal::Float(1.0))))
            .is_err());
        assert_eq!(material.float("IOR"), Some(1.45));
    }
}
