//! Math utilities and types
//!
//! Colors are carried as `Vec3` with components in the 0..=1 range.

pub use nalgebra::Vector3;

/// 3D vector type, used for RGB colors
pub type Vec3 = Vector3<f32>;

/// Pure white, the last resort for fallback materials
pub const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// Build a color from an `[r, g, b]` array
pub fn rgb(components: [f32; 3]) -> Vec3 {
    Vec3::new(components[0], components[1], components[2])
}

/// Check that every component lies in the 0..=1 range
pub fn is_unit_color(color: &Vec3) -> bool {
    color.iter().all(|c| (0.0..=1.0).contains(c))
}

/// Convert a single sRGB component to linear space
pub fn srgb_to_linear_component(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert an sRGB color to linear space
///
/// Renderers consume linear colors while material cards and object colors
/// are authored in sRGB.
pub fn srgb_to_linear(color: &Vec3) -> Vec3 {
    color.map(srgb_to_linear_component)
}
