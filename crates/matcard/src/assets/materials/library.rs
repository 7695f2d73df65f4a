//! Material library
//!
//! Indexes material cards by material name so parent (`Father`) references
//! can be followed. Cards come from directory scans or are inserted directly.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::card_loader::{CardLoader, LoadedCard};
use super::material_cache::MaterialCache;
use crate::core::config::{ApplicationConfig, LibraryConfig, ParserConfig};
use crate::render::material::{MaterialLookup, MaterialResult};

enum LibraryEntry {
    /// Card on disk, loaded through the cache
    File(PathBuf),
    /// Card held in memory
    Memory(Arc<LoadedCard>),
}

/// Name-indexed collection of material cards
pub struct MaterialLibrary {
    config: LibraryConfig,
    parser: ParserConfig,
    cache: MaterialCache,
    entries: BTreeMap<String, LibraryEntry>,
}

impl MaterialLibrary {
    /// Create an empty library
    pub fn new(config: LibraryConfig, parser: ParserConfig) -> Self {
        Self {
            config,
            cache: MaterialCache::with_parser_config(parser.clone()),
            parser,
            entries: BTreeMap::new(),
        }
    }

    /// Create an empty library from the application configuration
    pub fn from_config(config: &ApplicationConfig) -> Self {
        Self::new(config.library.clone(), config.parser.clone())
    }

    /// Scan every configured search path
    ///
    /// Returns the number of cards added. Unreadable or malformed cards are
    /// logged and skipped.
    pub fn scan(&mut self) -> usize {
        let search_paths: Vec<PathBuf> = self.config.search_paths.iter().map(PathBuf::from).collect();
        search_paths.iter().map(|dir| self.scan_dir(dir)).sum()
    }

    /// Scan a directory recursively for cards
    ///
    /// Returns the number of cards indexed. Directories reached twice, for
    /// example through a symlink back to a parent, are scanned once.
    pub fn scan_dir(&mut self, dir: &Path) -> usize {
        self.scan_dir_visited(dir, &mut HashSet::new())
    }

    fn scan_dir_visited(&mut self, dir: &Path, visited: &mut HashSet<PathBuf>) -> usize {
        match fs::canonicalize(dir) {
            Ok(canonical) => {
                if !visited.insert(canonical) {
                    log::debug!("Already scanned {:?}, skipping", dir);
                    return 0;
                }
            }
            Err(e) => {
                log::warn!("Cannot scan material directory {:?}: {}", dir, e);
                return 0;
            }
        }

        let mut paths = match fs::read_dir(dir) {
            Ok(entries) => entries.filter_map(|e| e.ok().map(|e| e.path())).collect::<Vec<_>>(),
            Err(e) => {
                log::warn!("Cannot scan material directory {:?}: {}", dir, e);
                return 0;
            }
        };
        // Deterministic order so the first card of a given name wins consistently
        paths.sort();

        let mut added = 0;
        for path in paths {
            if path.is_dir() {
                added += self.scan_dir_visited(&path, visited);
                continue;
            }
            let is_card = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| self.config.is_card_extension(e));
            if !is_card {
                continue;
            }
            match self.load_and_index(&path) {
                Ok((_, true)) => added += 1,
                Ok((_, false)) => {}
                Err(e) => log::warn!("Skipping material card {:?}: {}", path, e),
            }
        }

        log::debug!("Found {} material cards in {:?}", added, dir);
        added
    }

    /// Load a card file and index it under its material name
    pub fn add_card(&mut self, path: impl AsRef<Path>) -> MaterialResult<Arc<LoadedCard>> {
        self.load_and_index(path.as_ref()).map(|(card, _)| card)
    }

    /// Load a card and index it, reporting whether its name was new
    fn load_and_index(&mut self, path: &Path) -> MaterialResult<(Arc<LoadedCard>, bool)> {
        let card = self.load_file(path)?;
        let entry = if self.config.enable_caching {
            LibraryEntry::File(path.to_path_buf())
        } else {
            LibraryEntry::Memory(Arc::clone(&card))
        };
        let indexed = self.index(card.name.clone(), entry);
        Ok((card, indexed))
    }

    /// Index a card held in memory under its material name
    pub fn insert(&mut self, card: LoadedCard) -> Arc<LoadedCard> {
        let card = Arc::new(card);
        self.index(card.name.clone(), LibraryEntry::Memory(Arc::clone(&card)));
        card
    }

    fn index(&mut self, name: String, entry: LibraryEntry) -> bool {
        if self.entries.contains_key(&name) {
            log::warn!("Duplicate material name '{}', keeping the first definition", name);
            return false;
        }
        self.entries.insert(name, entry);
        true
    }

    fn load_file(&self, path: &Path) -> MaterialResult<Arc<LoadedCard>> {
        if self.config.enable_caching {
            self.cache.load_or_get(path)
        } else {
            CardLoader::load_with(path, &self.parser).map(Arc::new)
        }
    }

    /// Get a card by material name
    pub fn get(&self, name: &str) -> Option<Arc<LoadedCard>> {
        match self.entries.get(name)? {
            LibraryEntry::Memory(card) => Some(Arc::clone(card)),
            LibraryEntry::File(path) => match self.cache.load_or_get(path) {
                Ok(card) => Some(card),
                Err(e) => {
                    log::warn!("Failed to load material '{}' from {:?}: {}", name, path, e);
                    None
                }
            },
        }
    }

    /// Material names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of indexed materials
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the library is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Card cache backing file entries
    pub fn cache(&self) -> &MaterialCache {
        &self.cache
    }
}

impl MaterialLookup for MaterialLibrary {
    fn find_material(&self, name: &str) -> Option<Arc<LoadedCard>> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_card(dir: &Path, file: &str, contents: &str) -> PathBuf {
        let path = dir.join(file);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_scan_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_card(dir.path(), "Steel.FCMat", "Name = Steel\nRender.Type = Diffuse\n");
        write_card(dir.path(), "notes.txt", "not a card");
        write_card(dir.path(), "Broken.FCMat", "this line has no separator\n");
        fs::create_dir(dir.path().join("glass")).unwrap();
        write_card(&dir.path().join("glass"), "Window.fcmat", "Render.Type = Glass\n");

        let config = LibraryConfig::default().with_search_path(dir.path().to_string_lossy());
        let mut library = MaterialLibrary::new(config, ParserConfig::default());
        assert_eq!(library.scan(), 2);

        let names: Vec<&str> = library.names().collect();
        assert_eq!(names, ["Steel", "Window"]);
        assert_eq!(library.get("Window").unwrap().card.get("Render.Type"), Some("Glass"));
        assert!(library.get("Broken").is_none());
        assert_eq!(library.cache().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_symlink_loop() {
        let dir = tempfile::tempdir().unwrap();
        write_card(dir.path(), "A.FCMat", "Render.Type = Diffuse\n");
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let mut library = MaterialLibrary::new(LibraryConfig::default(), ParserConfig::default());
        assert_eq!(library.scan_dir(dir.path()), 1);
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_duplicate_names_counted_once() {
        let dir = tempfile::tempdir().unwrap();
        write_card(dir.path(), "One.FCMat", "Name = Steel\nRender.Type = Diffuse\n");
        write_card(dir.path(), "Two.FCMat", "Name = Steel\nRender.Type = Glass\n");

        let mut library = MaterialLibrary::new(LibraryConfig::default(), ParserConfig::default());
        assert_eq!(library.scan_dir(dir.path()), 1);
        assert_eq!(library.get("Steel").unwrap().card.get("Render.Type"), Some("Diffuse"));
    }

    #[test]
    fn test_missing_search_path() {
        let config = LibraryConfig::default().with_search_path("/no/such/material/dir");
        let mut library = MaterialLibrary::new(config, ParserConfig::default());
        assert_eq!(library.scan(), 0);
        assert!(library.is_empty());
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut library = MaterialLibrary::new(LibraryConfig::default(), ParserConfig::default());
        library.insert(CardLoader::parse_str("Name = Base\nRender.Type = Diffuse\n", ".").unwrap());
        library.insert(CardLoader::parse_str("Name = Base\nRender.Type = Glass\n", ".").unwrap());

        assert_eq!(library.len(), 1);
        let found = library.find_material("Base").unwrap();
        assert_eq!(found.card.get("Render.Type"), Some("Diffuse"));
        assert!(library.find_material("base").is_none());
    }

    #[test]
    fn test_without_caching() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_card(dir.path(), "Red.FCMat", "Render.Type = Diffuse\n");

        let config = LibraryConfig {
            enable_caching: false,
            ..LibraryConfig::default()
        };
        let mut library = MaterialLibrary::new(config, ParserConfig::default());
        library.add_card(&path).unwrap();

        assert!(library.get("Red").is_some());
        assert!(library.cache().is_empty());
    }
}
