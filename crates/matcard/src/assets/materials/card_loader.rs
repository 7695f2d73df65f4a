//! Material card loader
//!
//! Reads card files, remembers where they came from, and resolves texture
//! image paths relative to the card's directory.

use std::fs;
use std::path::{Path, PathBuf};

use super::card_parser::{CardParser, MaterialCard};
use crate::core::config::ParserConfig;
use crate::render::material::{MaterialError, MaterialResult, TextureTable};

/// Card key holding the material's display name
pub const NAME_KEY: &str = "Name";

/// A parsed card together with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCard {
    /// Parsed key/value mapping
    pub card: MaterialCard,
    /// Directory relative texture paths are resolved against
    pub base_dir: PathBuf,
    /// Card file, if loaded from disk
    pub source: Option<PathBuf>,
    /// Material name: the `Name` key, else the file stem, else "Unnamed"
    pub name: String,
}

impl LoadedCard {
    /// Wrap a parsed card
    pub fn new(card: MaterialCard, base_dir: impl Into<PathBuf>, source: Option<PathBuf>) -> Self {
        let name = card
            .get(NAME_KEY)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| {
                source
                    .as_deref()
                    .and_then(Path::file_stem)
                    .map(|s| s.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "Unnamed".to_string());

        Self {
            card,
            base_dir: base_dir.into(),
            source,
            name,
        }
    }

    /// Textures declared by the card, with image paths resolved
    pub fn textures(&self) -> MaterialResult<TextureTable> {
        TextureTable::from_card(&self.card, &self.base_dir)
    }

    /// Resolve a path relative to the card directory
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        CardLoader::resolve_texture_path(&self.base_dir, path)
    }
}

/// Material card loader
pub struct CardLoader;

impl CardLoader {
    /// Load a card file with the default parser configuration
    pub fn load(path: impl AsRef<Path>) -> MaterialResult<LoadedCard> {
        Self::load_with(path, &ParserConfig::default())
    }

    /// Load a card file
    ///
    /// # Arguments
    /// * `path` - Path to the .FCMat file
    /// * `config` - Parser options
    pub fn load_with(path: impl AsRef<Path>, config: &ParserConfig) -> MaterialResult<LoadedCard> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|source| MaterialError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let card = CardParser::parse_with(&contents, config).map_err(|source| MaterialError::CardParse {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("Loaded material card {:?} ({} keys)", path, card.len());
        Ok(LoadedCard::new(card, Self::get_card_directory(path), Some(path.to_path_buf())))
    }

    /// Parse card text held in memory
    pub fn parse_str(contents: &str, base_dir: impl Into<PathBuf>) -> MaterialResult<LoadedCard> {
        Self::parse_str_with(contents, base_dir, &ParserConfig::default())
    }

    /// Parse card text held in memory with explicit parser options
    pub fn parse_str_with(
        contents: &str,
        base_dir: impl Into<PathBuf>,
        config: &ParserConfig,
    ) -> MaterialResult<LoadedCard> {
        let card = CardParser::parse_with(contents, config)?;
        Ok(LoadedCard::new(card, base_dir, None))
    }

    /// Directory containing a card file
    pub fn get_card_directory(card_path: &Path) -> PathBuf {
        match card_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Resolve a texture path from a card
    ///
    /// Absolute paths are kept; relative paths are joined to the card directory.
    pub fn resolve_texture_path(base_dir: &Path, texture_path: &str) -> PathBuf {
        let path = Path::new(texture_path.trim());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }
}
