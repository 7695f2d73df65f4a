//! Image loading for texture data
//!
//! Texture images are decoded on demand, never while parsing or resolving.

use std::path::Path;

use crate::render::material::{MaterialError, MaterialResult};

/// Decoded image data
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of color channels (always 4, RGBA)
    pub channels: u8,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> MaterialResult<Self> {
        let path = path.as_ref();
        log::debug!("Loading image from: {:?}", path);

        let img = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(source) => MaterialError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => MaterialError::ImageLoad {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        })?;

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();
        log::info!("Loaded image {}x{} from {:?}", width, height, path);

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
            channels: 4,
        })
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        std::fs::write(&path, png_bytes(4, 2)).unwrap();

        let image = ImageData::from_file(&path).unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(image.size_bytes(), 4 * 2 * 4);
        assert_eq!(&image.data[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_missing_file() {
        let result = ImageData::from_file("does/not/exist.png");
        assert!(matches!(result, Err(MaterialError::Io { .. })));
    }

    #[test]
    fn test_not_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"not an image").unwrap();

        let result = ImageData::from_file(&path);
        assert!(matches!(result, Err(MaterialError::ImageLoad { .. })));
    }
}
