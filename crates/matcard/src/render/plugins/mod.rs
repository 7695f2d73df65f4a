//! Renderer plugins
//!
//! A renderer plugin turns a resolved material into renderer-native text.
//! Plugins are registered by exact name in a `RendererRegistry`; the name is
//! also the key passthrough lines are looked up under
//! (`Render.<name>.<NNNN>`).

pub mod obj;
pub mod ospray;

pub use obj::ObjPlugin;
pub use ospray::OsprayPlugin;

use std::collections::HashMap;
use std::sync::Arc;

use bitflags::bitflags;

use crate::assets::materials::LoadedCard;
use crate::foundation::math::{srgb_to_linear, Vec3};
use crate::render::material::{
    MaterialError, MaterialKind, MaterialResolver, MaterialResult, ResolutionContext, ResolvedParam,
    StandardMaterial, TextureResolver, TextureSupport,
};
use crate::render::material::resolver::Resolution;

bitflags! {
    /// Capabilities of a renderer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RendererFeatures: u32 {
        /// Can consume texture images
        const TEXTURES = 1 << 0;
        /// Expects colors in linear space rather than sRGB
        const LINEAR_COLOR = 1 << 1;
    }
}

/// A renderer that can write materials
pub trait RendererPlugin: Send + Sync {
    /// Exact renderer name, e.g. "Ospray"
    fn name(&self) -> &str;

    /// Renderer capabilities
    fn features(&self) -> RendererFeatures;

    /// What the renderer can do with a texture on a given parameter
    ///
    /// By default, renderers with `TEXTURES` accept textures everywhere, and
    /// others need the reference default for every non texture-only parameter.
    fn texture_support(&self, kind: MaterialKind, parameter: &str) -> TextureSupport {
        if self.features().contains(RendererFeatures::TEXTURES) {
            TextureSupport::Supported
        } else {
            TextureSupport::Unsupported {
                requires_value: kind.param(parameter).map_or(true, |spec| !spec.is_texture_only()),
            }
        }
    }

    /// Write a resolved material
    ///
    /// # Arguments
    /// * `name` - Material name in the output
    /// * `resolution` - Outcome of the resolution cascade
    /// * `ctx` - The object being rendered
    fn write_material(&self, name: &str, resolution: &Resolution, ctx: &ResolutionContext) -> MaterialResult<String>;

    /// Convert an sRGB color to what the renderer expects
    fn output_color(&self, color: &Vec3) -> Vec3 {
        if self.features().contains(RendererFeatures::LINEAR_COLOR) {
            srgb_to_linear(color)
        } else {
            *color
        }
    }
}

/// Resolve one parameter of a standard material for a plugin
///
/// Returns `Omitted` for texture-only parameters that were never set.
pub fn resolve_param<'t>(
    plugin: &dyn RendererPlugin,
    material: &StandardMaterial,
    textures: &TextureResolver<'t>,
    parameter: &str,
) -> MaterialResult<ResolvedParam<'t>> {
    match material.value(parameter) {
        Some(value) => textures.resolve_value(
            value,
            plugin.texture_support(material.kind(), parameter),
            parameter,
            plugin.name(),
        ),
        None => Ok(ResolvedParam::Omitted),
    }
}

/// Renderer plugins by exact name
pub struct RendererRegistry {
    plugins: HashMap<String, Box<dyn RendererPlugin>>,
}

impl RendererRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in plugins
    pub fn with_builtin_plugins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(OsprayPlugin));
        registry.register(Box::new(ObjPlugin));
        registry
    }

    /// Register a plugin, replacing any plugin with the same name
    pub fn register(&mut self, plugin: Box<dyn RendererPlugin>) -> Option<Box<dyn RendererPlugin>> {
        let name = plugin.name().to_string();
        log::debug!("Registering renderer plugin '{}'", name);
        let previous = self.plugins.insert(name.clone(), plugin);
        if previous.is_some() {
            log::warn!("Renderer plugin '{}' replaced", name);
        }
        previous
    }

    /// Get a plugin by exact (case-sensitive) name
    pub fn get(&self, name: &str) -> Option<&dyn RendererPlugin> {
        self.plugins.get(name).map(|plugin| plugin.as_ref())
    }

    /// Get a plugin by name, failing with `UnknownRenderer`
    pub fn require(&self, name: &str) -> MaterialResult<&dyn RendererPlugin> {
        self.get(name).ok_or_else(|| MaterialError::UnknownRenderer(name.to_string()))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if no plugin is registered
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::with_builtin_plugins()
    }
}

/// Resolves materials and writes them with a registered plugin
pub struct MaterialExporter<'a> {
    registry: &'a RendererRegistry,
    resolver: MaterialResolver<'a>,
}

impl<'a> MaterialExporter<'a> {
    /// Create an exporter
    pub fn new(registry: &'a RendererRegistry, resolver: MaterialResolver<'a>) -> Self {
        Self { registry, resolver }
    }

    /// Write the material of an object for a renderer
    ///
    /// Only an unknown renderer is an error. Resolution or writing failures
    /// are logged and the fallback material is written instead.
    pub fn export(
        &self,
        renderer: &str,
        card: Option<&Arc<LoadedCard>>,
        ctx: &ResolutionContext,
    ) -> MaterialResult<String> {
        let plugin = self.registry.require(renderer)?;
        let resolution = self.resolver.resolve_or_fallback(card, plugin.name(), ctx);
        log::debug!(
            "Object '{}': {} material from {:?}",
            ctx.name,
            resolution.material.label(),
            resolution.source
        );

        match plugin.write_material(&ctx.name, &resolution, ctx) {
            Ok(text) => Ok(text),
            Err(e) => {
                log::warn!("Object '{}': renderer '{}' failed: {}. Using fallback material", ctx.name, renderer, e);
                let chain: Vec<Arc<LoadedCard>> = card.into_iter().cloned().collect();
                let fallback = Resolution {
                    material: self.resolver.fallback(&chain, ctx),
                    source: resolution.source,
                };
                plugin.write_material(&ctx.name, &fallback, ctx)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::materials::CardLoader;
    use crate::render::material::NoLookup;

    struct Plain;

    impl RendererPlugin for Plain {
        fn name(&self) -> &str {
            "Plain"
        }

        fn features(&self) -> RendererFeatures {
            RendererFeatures::empty()
        }

        fn write_material(&self, name: &str, resolution: &Resolution, _ctx: &ResolutionContext) -> MaterialResult<String> {
            Ok(format!("{} {}", name, resolution.material.label()))
        }
    }

    #[test]
    fn test_registry_lookup_is_exact() {
        let registry = RendererRegistry::with_builtin_plugins();
        assert_eq!(registry.names(), ["Obj", "Ospray"]);
        assert!(registry.get("Ospray").is_some());
        assert!(registry.get("ospray").is_none());
        assert!(matches!(registry.require("Cycles"), Err(MaterialError::UnknownRenderer(ref n)) if n == "Cycles"));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = RendererRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.register(Box::new(Plain)).is_none());
        assert!(registry.register(Box::new(Plain)).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_default_texture_support() {
        let plain = Plain;
        assert_eq!(
            plain.texture_support(MaterialKind::Diffuse, "Color"),
            TextureSupport::Unsupported { requires_value: true }
        );
        assert_eq!(
            plain.texture_support(MaterialKind::Diffuse, "Bump"),
            TextureSupport::Unsupported { requires_value: false }
        );
        assert_eq!(plain.output_color(&Vec3::new(0.5, 0.5, 0.5)), Vec3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_export_falls_back_on_write_error() {
        let mut registry = RendererRegistry::new();
        registry.register(Box::new(Plain));
        let lookup = NoLookup;
        let exporter = MaterialExporter::new(&registry, MaterialResolver::new(&lookup));
        let ctx = ResolutionContext::new("Cube", Vec3::new(0.5, 0.5, 0.5));

        let card = Arc::new(CardLoader::parse_str("Render.Type = Glass\n", ".").unwrap());
        assert_eq!(exporter.export("Plain", Some(&card), &ctx).unwrap(), "Cube standard");
        assert_eq!(exporter.export("Plain", None, &ctx).unwrap(), "Cube fallback");
        assert!(exporter.export("Nope", None, &ctx).is_err());
    }

    #[test]
    fn test_export_recovers_from_missing_default() {
        // Obj cannot use a texture for IOR and the reference has no default
        let registry = RendererRegistry::with_builtin_plugins();
        let lookup = NoLookup;
        let exporter = MaterialExporter::new(&registry, MaterialResolver::new(&lookup));
        let ctx = ResolutionContext::new("Lens", Vec3::new(0.0, 0.0, 1.0));

        let card = Arc::new(
            CardLoader::parse_str(
                "Render.Type = Glass\nRender.Glass.IOR = Texture(\"Ior\", 0)\nRender.Textures.Ior.Images.0 = ior.png\n",
                ".",
            )
            .unwrap(),
        );
        let text = exporter.export("Obj", Some(&card), &ctx).unwrap();
        assert!(text.starts_with("newmtl Lens\n"));
        assert!(text.contains("Kd 0 0 1"));
    }
}
