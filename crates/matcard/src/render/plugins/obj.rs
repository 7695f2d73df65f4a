//! Wavefront MTL renderer plugin
//!
//! Plain MTL has no physically based model, so standard materials are
//! approximated with the Phong fields. Colors stay in sRGB.

use super::{resolve_param, RendererFeatures, RendererPlugin};
use crate::foundation::math::Vec3;
use crate::render::material::resolver::{Resolution, ResolvedMaterial};
use crate::render::material::{
    Literal, MaterialKind, MaterialResult, ParamType, ResolutionContext, ResolvedParam, StandardMaterial,
    StandardMaterialBuilder, TextureResolver, TextureSupport, TextureTable,
};

/// Wavefront MTL plugin
pub struct ObjPlugin;

impl ObjPlugin {
    /// Registered renderer name
    pub const NAME: &'static str = "Obj";
}

fn format_color(c: &Vec3) -> String {
    format!("{} {} {}", c.x, c.y, c.z)
}

struct MtlWriter<'a> {
    plugin: &'a ObjPlugin,
    material: &'a StandardMaterial,
    textures: TextureResolver<'a>,
    lines: Vec<String>,
}

impl<'a> MtlWriter<'a> {
    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Write a color statement, plus its map when textured
    fn color(&mut self, statement: &str, parameter: &str) -> MaterialResult<()> {
        match resolve_param(self.plugin, self.material, &self.textures, parameter)? {
            ResolvedParam::Literal(Literal::Rgb(color)) => {
                let c = self.plugin.output_color(&color);
                self.line(format!("{} {}", statement, format_color(&c)));
            }
            ResolvedParam::Texture { path, .. } => {
                self.line(format!("{} 1 1 1", statement));
                self.line(format!("map_{} {}", statement, path.display()));
            }
            _ => {}
        }
        Ok(())
    }

    fn scalar(&self, parameter: &str) -> MaterialResult<Option<f32>> {
        match resolve_param(self.plugin, self.material, &self.textures, parameter)? {
            ResolvedParam::Literal(literal) => Ok(literal.as_float()),
            _ => Ok(None),
        }
    }

    /// Normal and bump maps
    fn maps(&mut self) -> MaterialResult<()> {
        for (parameter, statement) in [("Normal", "map_Bump"), ("Bump", "bump")] {
            if let ResolvedParam::Texture { path, .. } = resolve_param(self.plugin, self.material, &self.textures, parameter)? {
                self.line(format!("{} {}", statement, path.display()));
            }
        }
        resolve_param(self.plugin, self.material, &self.textures, "Displacement")?;
        Ok(())
    }
}

impl ObjPlugin {
    fn write_standard(&self, name: &str, material: &StandardMaterial, textures: &TextureTable) -> MaterialResult<String> {
        let mut w = MtlWriter {
            plugin: self,
            material,
            textures: TextureResolver::new(textures),
            lines: vec![format!("newmtl {}", name)],
        };

        match material.kind() {
            MaterialKind::Diffuse => {
                w.color("Kd", "Color")?;
                w.line("Ks 0 0 0");
                w.line("illum 1");
            }
            MaterialKind::Disney | MaterialKind::SubstancePbr => {
                w.color("Kd", "BaseColor")?;
                let specular = w.scalar("Specular")?.unwrap_or(0.0);
                let metallic = w.scalar("Metallic")?.unwrap_or(0.0);
                let ks = specular.max(metallic);
                w.line(format!("Ks {} {} {}", ks, ks, ks));
                let roughness = w.scalar("Roughness")?.unwrap_or(0.0);
                w.line(format!("Ns {}", (1.0 - roughness.clamp(0.0, 1.0)) * 1000.0));
                w.line("illum 2");
            }
            MaterialKind::Glass => {
                w.line("Kd 0 0 0");
                w.line("Ks 1 1 1");
                w.color("Tf", "Color")?;
                if let Some(ior) = w.scalar("IOR")? {
                    w.line(format!("Ni {}", ior));
                }
                w.line("illum 7");
            }
            MaterialKind::Mixed => {
                w.color("Kd", "Diffuse.Color")?;
                w.color("Tf", "Glass.Color")?;
                if let Some(ior) = w.scalar("Glass.IOR")? {
                    w.line(format!("Ni {}", ior));
                }
                let transparency = w.scalar("Transparency")?.unwrap_or(0.5);
                w.line(format!("d {}", 1.0 - transparency));
                w.line("illum 4");
            }
            MaterialKind::Carpaint => {
                w.color("Kd", "BaseColor")?;
                w.line("Ks 0.5 0.5 0.5");
                w.line("Ns 250");
                w.line("illum 2");
            }
            MaterialKind::Emission => {
                w.color("Kd", "Color")?;
                w.color("Ke", "Color")?;
                if let Some(power) = w.scalar("Power")? {
                    w.line(format!("# Power {}", power));
                }
                w.line("illum 0");
            }
        }

        w.maps()?;

        let mut out = w.lines.join("\n");
        out.push('\n');
        Ok(out)
    }
}

impl RendererPlugin for ObjPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn features(&self) -> RendererFeatures {
        RendererFeatures::TEXTURES
    }

    fn texture_support(&self, kind: MaterialKind, parameter: &str) -> TextureSupport {
        let param_type = kind.param(parameter).map(|spec| spec.param_type);
        match (parameter, param_type) {
            ("Bump" | "Normal", _) | (_, Some(ParamType::Rgb)) => TextureSupport::Supported,
            (_, Some(ParamType::TextureOnly)) => TextureSupport::Unsupported { requires_value: false },
            _ => TextureSupport::Unsupported { requires_value: true },
        }
    }

    fn write_material(&self, name: &str, resolution: &Resolution, _ctx: &ResolutionContext) -> MaterialResult<String> {
        match &resolution.material {
            ResolvedMaterial::Passthrough(block) => Ok(format!("newmtl {}\n{}\n", name, block.script())),
            ResolvedMaterial::Standard { material, textures } => self.write_standard(name, material, textures),
            ResolvedMaterial::Fallback { color, .. } => {
                let material = StandardMaterialBuilder::diffuse(*color).build()?;
                self.write_standard(name, &material, &TextureTable::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::materials::CardLoader;
    use crate::render::material::{MaterialResolver, NoLookup};
    use std::sync::Arc;

    fn write(card_text: &str) -> String {
        let card = Arc::new(CardLoader::parse_str(card_text, "/cards").unwrap());
        let lookup = NoLookup;
        let ctx = ResolutionContext::new("Part", Vec3::new(0.5, 0.5, 0.5));
        let resolution = MaterialResolver::new(&lookup).resolve(&card, ObjPlugin::NAME, &ctx).unwrap();
        ObjPlugin.write_material("Part", &resolution, &ctx).unwrap()
    }

    #[test]
    fn test_diffuse_with_texture() {
        let text = write(
            "Render.Type = Diffuse\nRender.Diffuse.Color = Texture(\"Wood\", 0)\nRender.Diffuse.Normal = Texture(\"Wood\", 1)\nRender.Textures.Wood.Images.0 = wood.png\nRender.Textures.Wood.Images.1 = wood_n.png\n",
        );
        assert_eq!(
            text,
            "newmtl Part\nKd 1 1 1\nmap_Kd /cards/wood.png\nKs 0 0 0\nillum 1\nmap_Bump /cards/wood_n.png\n"
        );
    }

    #[test]
    fn test_pbr_shininess() {
        let text = write("Render.Type = Substance_PBR\nRender.Substance_PBR.Roughness = 0.25\n");
        assert!(text.contains("\nKs 0.5 0.5 0.5\n"));
        assert!(text.contains("\nNs 750\n"));
    }

    #[test]
    fn test_glass_and_mixed() {
        let glass = write("Render.Type = Glass\nRender.Glass.IOR = 1.33\n");
        assert!(glass.contains("\nTf 1 1 1\nNi 1.33\nillum 7\n"));

        let mixed = write("Render.Type = Mixed\nRender.Mixed.Transparency = 0.75\n");
        assert!(mixed.contains("\nd 0.25\n"));
    }

    #[test]
    fn test_float_texture_uses_default() {
        let text = write(
            "Render.Type = Disney\nRender.Disney.Roughness = Texture(\"R\", 0) ; 0.5\nRender.Textures.R.Images.0 = r.png\n",
        );
        assert!(text.contains("\nNs 500\n"));
        assert!(!text.contains("r.png"));
    }

    #[test]
    fn test_passthrough_and_fallback() {
        assert_eq!(write("Render.Obj.0001 = Kd 0 1 0\n"), "newmtl Part\nKd 0 1 0\n");
        assert_eq!(write("Name = Bare\n"), "newmtl Part\nKd 0.5 0.5 0.5\nKs 0 0 0\nillum 1\n");
    }
}
