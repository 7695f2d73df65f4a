//! Material loading and resolution errors

use std::path::PathBuf;

use thiserror::Error;

use crate::assets::materials::ParseError;

/// Errors raised while loading cards or resolving materials
#[derive(Error, Debug)]
pub enum MaterialError {
    /// Malformed card text
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Malformed card file
    #[error("Parse error in {path:?}: {source}")]
    CardParse {
        /// Card file
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: ParseError,
    },

    /// Card or image file could not be read
    #[error("Failed to read {path:?}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// `Render.Type` names no known material kind
    #[error("Material '{material}': unknown material type '{type_name}'")]
    UnknownMaterialType {
        /// Material name
        material: String,
        /// Value of `Render.Type`
        type_name: String,
    },

    /// A parameter value could not be interpreted
    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidParameter {
        /// Card key
        key: String,
        /// Raw value
        value: String,
        /// What went wrong
        reason: String,
    },

    /// A texture reference names a texture the card does not define
    #[error("Texture '{texture}' is not defined")]
    MissingTexture {
        /// Texture name
        texture: String,
    },

    /// A texture lacks the referenced image (or the mandatory image 0)
    #[error("Texture '{texture}' has no image with index {index}")]
    MissingImageIndex {
        /// Texture name
        texture: String,
        /// Missing image index
        index: u32,
    },

    /// The renderer needs a literal for a texture it cannot use, and the
    /// reference carries no default
    #[error("Renderer '{renderer}' cannot use a texture for '{parameter}' and no default value was given")]
    NoDefaultAvailable {
        /// Parameter name
        parameter: String,
        /// Renderer name
        renderer: String,
    },

    /// The parent material chain loops
    #[error("Cyclic material chain: {}", chain.join(" -> "))]
    CyclicMaterial {
        /// Material names in visiting order, ending with the repeated one
        chain: Vec<String>,
    },

    /// No renderer plugin is registered under this name
    #[error("Unknown renderer '{0}'")]
    UnknownRenderer(String),

    /// A texture image could not be decoded
    #[error("Failed to load image {path:?}: {message}")]
    ImageLoad {
        /// Image file
        path: PathBuf,
        /// Decoder message
        message: String,
    },
}

/// Result alias for material operations
pub type MaterialResult<T> = Result<T, MaterialError>;
