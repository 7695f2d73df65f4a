//! Card cache for deduplicating loaded material cards
//!
//! Provides a caching layer on top of `CardLoader` so the same card file is
//! parsed once, and reparsed only when it changes on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use super::card_loader::{CardLoader, LoadedCard};
use crate::core::config::ParserConfig;
use crate::render::material::MaterialResult;

/// Cache entry with card and metadata
#[derive(Clone)]
struct CacheEntry {
    /// Cached card
    card: Arc<LoadedCard>,
    /// File modification time when loaded
    modified_time: Option<SystemTime>,
}

impl CacheEntry {
    fn is_stale(&self, path: &Path) -> bool {
        match (self.modified_time, modified_time(path)) {
            (Some(cached), Some(current)) => current > cached,
            // Can't determine, keep the cached card
            _ => false,
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

/// Thread-safe card cache keyed by file path
pub struct MaterialCache {
    cache: RwLock<HashMap<PathBuf, CacheEntry>>,
    parser: ParserConfig,
}

impl MaterialCache {
    /// Create a new empty cache with the default parser configuration
    pub fn new() -> Self {
        Self::with_parser_config(ParserConfig::default())
    }

    /// Create a new empty cache parsing cards with the given options
    pub fn with_parser_config(parser: ParserConfig) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            parser,
        }
    }

    /// Load a card, using the cache if the file has not changed
    ///
    /// # Returns
    /// A shared reference to the cached card
    pub fn load_or_get(&self, path: impl AsRef<Path>) -> MaterialResult<Arc<LoadedCard>> {
        let path = path.as_ref();

        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = cache.get(path) {
                if !entry.is_stale(path) {
                    return Ok(Arc::clone(&entry.card));
                }
                log::debug!("Card {:?} changed on disk, reloading", path);
            }
        }

        let card = Arc::new(CardLoader::load_with(path, &self.parser)?);
        let entry = CacheEntry {
            card: Arc::clone(&card),
            modified_time: modified_time(path),
        };

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.insert(path.to_path_buf(), entry);

        Ok(card)
    }

    /// Get the number of cached cards
    pub fn len(&self) -> usize {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MaterialCache {
    fn default() -> Self {
        Self::new()
    }
}
