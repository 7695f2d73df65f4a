//! OSPRay Studio renderer plugin
//!
//! Writes materials in the MTL dialect read by OSPRay Studio's OBJ importer,
//! mostly as `principled` materials. Colors are linearized.

use std::fmt::Write as _;
use std::path::Path;

use super::{resolve_param, RendererFeatures, RendererPlugin};
use crate::foundation::math::{is_unit_color, Vec3};
use crate::render::material::resolver::{Resolution, ResolvedMaterial};
use crate::render::material::{
    Literal, MaterialKind, MaterialResult, ParamType, ParamValue, ResolutionContext, ResolvedParam,
    StandardMaterial, TextureDefinition, TextureResolver, TextureSupport, TextureTable,
};

/// Index of refraction OSPRay uses for Disney materials and their coat
const DISNEY_IOR: f32 = 1.5;

/// OSPRay Studio plugin
pub struct OsprayPlugin;

impl OsprayPlugin {
    /// Registered renderer name
    pub const NAME: &'static str = "Ospray";
}

/// OSPRay field written for a parameter, `None` when OSPRay has no use for it
fn field(kind: MaterialKind, parameter: &str) -> Option<&'static str> {
    let field = match (kind, parameter) {
        (_, "Bump" | "Displacement") => return None,
        (MaterialKind::Disney, "Subsurface" | "SpecularTint") => return None,
        (_, "Normal") => "normal",
        (MaterialKind::Diffuse | MaterialKind::Mixed, "Color" | "Diffuse.Color") => "baseColor",
        (MaterialKind::Emission, "Color") => "color",
        (MaterialKind::Emission, "Power") => "intensity",
        (MaterialKind::Glass | MaterialKind::Mixed, "Color" | "Glass.Color") => "transmissionColor",
        (MaterialKind::Glass | MaterialKind::Mixed, "IOR" | "Glass.IOR") => "ior",
        (MaterialKind::Mixed, "Transparency") => "transmission",
        (_, "BaseColor") => "baseColor",
        (_, "Metallic") => "metallic",
        (_, "Specular") => "specular",
        (_, "Roughness") => "roughness",
        (_, "Anisotropic") => "anisotropy",
        (_, "Sheen") => "sheen",
        (_, "SheenTint") => "sheenTint",
        (_, "ClearCoat") => "coat",
        (_, "ClearCoatGloss") => "coatRoughness",
        _ => return None,
    };
    Some(field)
}

fn texture_block(field: &str, texture: &TextureDefinition, path: &Path) -> String {
    format!(
        "# Texture {f}\nmap_{f} {path}\nmap_{f}.rotation {rotation}\nmap_{f}.scale {scale} {scale}\nmap_{f}.translation {u} {v}",
        f = field,
        path = path.display(),
        rotation = texture.rotation,
        scale = texture.scale,
        u = texture.translation_u,
        v = texture.translation_v,
    )
}

/// Accumulates the lines of one material
struct SdlWriter<'a> {
    plugin: &'a OsprayPlugin,
    material: &'a StandardMaterial,
    textures: TextureResolver<'a>,
    lines: Vec<String>,
    texture_blocks: Vec<String>,
}

impl<'a> SdlWriter<'a> {
    fn new(plugin: &'a OsprayPlugin, material: &'a StandardMaterial, textures: &'a TextureTable) -> Self {
        Self {
            plugin,
            material,
            textures: TextureResolver::new(textures),
            lines: Vec::new(),
            texture_blocks: Vec::new(),
        }
    }

    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn param(&mut self, parameter: &str) -> MaterialResult<()> {
        let kind = self.material.kind();
        let Some(field) = field(kind, parameter) else {
            if self.material.value(parameter).is_some_and(ParamValue::is_texture) {
                log::warn!("'{}::{}' is not supported by {}, skipping", kind, parameter, OsprayPlugin::NAME);
            }
            return Ok(());
        };

        match resolve_param(self.plugin, self.material, &self.textures, parameter)? {
            ResolvedParam::Literal(Literal::Rgb(color)) => {
                let c = self.plugin.output_color(&color);
                self.line(format!("{} {} {} {}", field, c.x, c.y, c.z));
            }
            ResolvedParam::Literal(Literal::Float(value)) => {
                let value = self.adjust(parameter, value);
                self.line(format!("{} {}", field, value));
            }
            ResolvedParam::Texture { texture, path, .. } => {
                let is_color = kind.param(parameter).is_some_and(|spec| spec.param_type == ParamType::Rgb);
                let value = match parameter {
                    // Normal map strength
                    "Normal" => "4.0",
                    _ if is_color => "1.0 1.0 1.0",
                    _ => "1.0",
                };
                self.line(format!("{} {}", field, value));
                self.texture_blocks.push(texture_block(field, texture, path));
            }
            ResolvedParam::Omitted => {}
        }
        Ok(())
    }

    /// Float values OSPRay reads differently from the card
    fn adjust(&self, parameter: &str, value: f32) -> f32 {
        match parameter {
            // Gloss to roughness
            "ClearCoatGloss" => 1.0 - value,
            // Metallic surfaces need a non-zero specular
            "Specular" if value <= 0.0 => match self.material.value("Metallic") {
                Some(ParamValue::Texture(_)) => 1.0,
                Some(ParamValue::Literal(Literal::Float(metallic))) if metallic.abs() > f32::EPSILON => *metallic,
                _ => value,
            },
            _ => value,
        }
    }

    fn scalar(&self, parameter: &str) -> MaterialResult<Option<f32>> {
        match resolve_param(self.plugin, self.material, &self.textures, parameter)? {
            ResolvedParam::Literal(literal) => Ok(literal.as_float()),
            _ => Ok(None),
        }
    }

    fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        for block in &self.texture_blocks {
            out.push('\n');
            out.push_str(block);
        }
        out.push('\n');
        out
    }
}

impl OsprayPlugin {
    fn write_standard(&self, name: &str, material: &StandardMaterial, textures: &TextureTable) -> MaterialResult<String> {
        let mut w = SdlWriter::new(self, material, textures);
        w.line(format!("newmtl {}", name));

        match material.kind() {
            MaterialKind::Diffuse => {
                w.line("# Diffuse");
                w.line("type principled");
                w.param("Color")?;
                w.line("metallic 0");
                w.line("specular 0");
                w.line("diffuse 1");
            }
            MaterialKind::Disney => {
                w.line("# Disney");
                w.line("type principled");
                w.param("BaseColor")?;
                w.line("# No subsurface scattering (Ospray limitation)");
                w.param("Subsurface")?;
                w.param("Metallic")?;
                w.param("Specular")?;
                w.line("# No specular tint (Ospray limitation)");
                w.param("SpecularTint")?;
                for parameter in ["Roughness", "Anisotropic", "Sheen", "SheenTint", "ClearCoat", "ClearCoatGloss"] {
                    w.param(parameter)?;
                }
            }
            MaterialKind::Glass => {
                w.line("# Glass");
                w.line("type principled");
                w.param("IOR")?;
                w.param("Color")?;
                w.line("transmission 1");
                w.line("specular 1");
                w.line("metallic 0");
                w.line("diffuse 0");
                w.line("opacity 1");
            }
            MaterialKind::SubstancePbr => {
                w.line(format!("# Pbr ('{}')", name));
                w.line("type principled");
                w.param("BaseColor")?;
                w.line("# No subsurface scattering (Ospray limitation)");
                w.param("Metallic")?;
                w.param("Specular")?;
                w.param("Roughness")?;
            }
            MaterialKind::Mixed => {
                let transparency = w.scalar("Transparency")?.unwrap_or(0.5);
                w.line("# Mixed");
                w.line("type principled");
                w.param("Diffuse.Color")?;
                w.param("Glass.IOR")?;
                w.line(format!("transmission {}", transparency));
                w.param("Glass.Color")?;
                w.line(format!("opacity {}", 1.0 - transparency));
                w.line("specular 0.5");
            }
            MaterialKind::Carpaint => {
                w.line("# Carpaint");
                w.line("type carPaint");
                w.param("BaseColor")?;
            }
            MaterialKind::Emission => {
                w.line(format!("# Emission ('{}')", name));
                w.line("type luminous");
                w.param("Color")?;
                w.param("Power")?;
                w.line("transparency 0.0");
            }
        }

        w.param("Normal")?;
        w.param("Bump")?;
        w.param("Displacement")?;

        if material.kind() == MaterialKind::Disney {
            w.line(format!("ior {}", DISNEY_IOR));
            w.line(format!("coatIor {}", DISNEY_IOR));
        }

        Ok(w.finish())
    }

    /// Simple OBJ material; white when the color is out of range
    fn write_fallback(&self, name: &str, color: &Vec3) -> String {
        let linear = self.output_color(color);
        let c = if is_unit_color(&linear) { linear } else { Vec3::new(1.0, 1.0, 1.0) };
        let mut out = String::new();
        let _ = writeln!(out, "newmtl {}", name);
        let _ = writeln!(out, "# Fallback");
        let _ = writeln!(out, "type obj");
        let _ = writeln!(out, "kd {} {} {}", c.x, c.y, c.z);
        let _ = writeln!(out, "ns 2");
        out
    }
}

impl RendererPlugin for OsprayPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn features(&self) -> RendererFeatures {
        RendererFeatures::TEXTURES | RendererFeatures::LINEAR_COLOR
    }

    fn texture_support(&self, _kind: MaterialKind, parameter: &str) -> TextureSupport {
        match parameter {
            "Bump" | "Displacement" => TextureSupport::Unsupported { requires_value: false },
            "IOR" | "Glass.IOR" | "ClearCoatGloss" | "Subsurface" | "SpecularTint" | "Transparency" => {
                TextureSupport::Unsupported { requires_value: true }
            }
            _ => TextureSupport::Supported,
        }
    }

    fn write_material(&self, name: &str, resolution: &Resolution, _ctx: &ResolutionContext) -> MaterialResult<String> {
        match &resolution.material {
            ResolvedMaterial::Passthrough(block) => Ok(format!("newmtl {}\n# Passthrough\n{}\n", name, block.script())),
            ResolvedMaterial::Standard { material, textures } => self.write_standard(name, material, textures),
            ResolvedMaterial::Fallback { color, .. } => Ok(self.write_fallback(name, color)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::materials::CardLoader;
    use crate::render::material::{MaterialError, MaterialResolver, NoLookup};
    use std::sync::Arc;

    fn write(card_text: &str) -> MaterialResult<String> {
        let card = Arc::new(CardLoader::parse_str(card_text, "/cards").unwrap());
        let lookup = NoLookup;
        let ctx = ResolutionContext::new("Part", Vec3::new(1.0, 0.0, 0.0));
        let resolution = MaterialResolver::new(&lookup).resolve(&card, OsprayPlugin::NAME, &ctx)?;
        OsprayPlugin.write_material("Part", &resolution, &ctx)
    }

    #[test]
    fn test_diffuse() {
        let text = write("Render.Type = Diffuse\nRender.Diffuse.Color = (1, 0, 0)\n").unwrap();
        assert_eq!(
            text,
            "newmtl Part\n# Diffuse\ntype principled\nbaseColor 1 0 0\nmetallic 0\nspecular 0\ndiffuse 1\n"
        );
    }

    #[test]
    fn test_disney_specular_follows_metallic() {
        let text = write("Render.Type = Disney\nRender.Disney.Metallic = 0.75\nRender.Disney.ClearCoatGloss = 0.25\n").unwrap();
        assert!(text.contains("\nmetallic 0.75\n"));
        assert!(text.contains("\nspecular 0.75\n"));
        assert!(text.contains("\ncoatRoughness 0.75\n"));
        assert!(text.ends_with("ior 1.5\ncoatIor 1.5\n"));
        assert!(!text.contains("subsurface"));
    }

    #[test]
    fn test_texture_maps() {
        let text = write(
            r#"
Render.Type = Substance_PBR
Render.Substance_PBR.BaseColor = Texture("Paint", 0)
Render.Substance_PBR.Bump = Texture("Paint", 1)
Render.Textures.Paint.Images.0 = paint.png
Render.Textures.Paint.Images.1 = bump.png
Render.Textures.Paint.Scale = 2
Render.Textures.Paint.Rotation = 45
"#,
        )
        .unwrap();

        assert!(text.contains("# Pbr ('Part')\n"));
        assert!(text.contains("\nbaseColor 1.0 1.0 1.0\n"));
        assert!(text.contains("# Texture baseColor\nmap_baseColor /cards/paint.png\nmap_baseColor.rotation 45\nmap_baseColor.scale 2 2\nmap_baseColor.translation 0 0"));
        // Bump maps are not supported and skipped
        assert!(!text.contains("bump.png"));
    }

    #[test]
    fn test_normal_map_strength() {
        let text = write(
            "Render.Type = Diffuse\nRender.Diffuse.Normal = Texture(\"N\", 0)\nRender.Textures.N.Images.0 = n.png\n",
        )
        .unwrap();
        assert!(text.contains("\nnormal 4.0\n# Texture normal\nmap_normal /cards/n.png\n"));
    }

    #[test]
    fn test_unsupported_texture_uses_default() {
        let text = write(
            "Render.Type = Glass\nRender.Glass.IOR = Texture(\"Ior\", 0) ; 1.33\nRender.Textures.Ior.Images.0 = ior.png\n",
        )
        .unwrap();
        assert!(text.contains("\nior 1.33\n"));
        assert!(text.contains("\ntransmissionColor 1 1 1\n"));

        let result = write("Render.Type = Glass\nRender.Glass.IOR = Texture(\"Ior\", 0)\nRender.Textures.Ior.Images.0 = ior.png\n");
        assert!(matches!(result, Err(MaterialError::NoDefaultAvailable { .. })));
    }

    #[test]
    fn test_mixed() {
        let text = write("Render.Type = Mixed\nRender.Mixed.Transparency = 0.25\n").unwrap();
        assert!(text.contains("\ntransmission 0.25\n"));
        assert!(text.contains("\nopacity 0.75\n"));
        assert!(text.contains("\nspecular 0.5\n"));

        // Transparency drives two fields, so a texture falls back to its default
        let text = write(
            "Render.Type = Mixed\nRender.Mixed.Transparency = Texture(\"T\", 0) ; 0.25\nRender.Textures.T.Images.0 = t.png\n",
        )
        .unwrap();
        assert!(text.contains("\ntransmission 0.25\n"));
        assert!(!text.contains("t.png"));
    }

    #[test]
    fn test_passthrough_and_fallback() {
        let text = write("Render.Ospray.0001 = type principled\nRender.Ospray.0002 = # for %NAME%\n").unwrap();
        assert_eq!(text, "newmtl Part\n# Passthrough\ntype principled\n# for Part\n");

        let fallback = OsprayPlugin.write_fallback("Part", &Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(fallback, "newmtl Part\n# Fallback\ntype obj\nkd 1 0 0\nns 2\n");

        let white = OsprayPlugin.write_fallback("Part", &Vec3::new(3.0, 0.0, 0.0));
        assert!(white.contains("kd 1 1 1"));
    }
}
