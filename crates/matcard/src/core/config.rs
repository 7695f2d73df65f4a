//! # Unified Configuration System
//!
//! All configuration structures for card parsing, material resolution, the
//! material library and logging live here.
//!
//! ## Configuration Categories
//!
//! - **Parser Config**: duplicate key handling
//! - **Resolver Config**: which card keys drive the cascade
//! - **Library Config**: where cards are searched and whether they are cached
//! - **Logging Config**: default log filter for the tools

use serde::{Serialize, Deserialize};

use crate::config::Config;

/// What to do when a card defines the same key more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicateKeyPolicy {
    /// Keep the value of the last occurrence (at the position of the first)
    #[default]
    LastWins,
    /// Keep the first occurrence and ignore the rest
    FirstWins,
    /// Fail parsing
    Reject,
}

/// # Parser Configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Duplicate key handling
    pub duplicate_keys: DuplicateKeyPolicy,
}

impl ParserConfig {
    /// Set the duplicate key policy
    pub fn with_duplicate_keys(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_keys = policy;
        self
    }
}

/// # Resolver Configuration
///
/// Names of the plain (non `Render.`) card keys consulted during the
/// material resolution cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Key naming the parent material
    pub parent_key: String,
    /// Key holding the material's own diffuse color, used for fallbacks
    pub diffuse_color_key: String,
}

impl ResolverConfig {
    /// Set the parent material key
    pub fn with_parent_key(mut self, key: impl Into<String>) -> Self {
        self.parent_key = key.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for (label, key) in [
            ("parent_key", &self.parent_key),
            ("diffuse_color_key", &self.diffuse_color_key),
        ] {
            if key.trim().is_empty() {
                return Err(format!("{} cannot be empty", label));
            }
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            parent_key: "Father".to_string(),
            diffuse_color_key: "DiffuseColor".to_string(),
        }
    }
}

/// # Library Configuration
///
/// Where material cards are looked up when resolving parent references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directories scanned for material cards
    pub search_paths: Vec<String>,
    /// File extensions recognized as material cards (without the dot)
    pub extensions: Vec<String>,
    /// Whether loaded cards are cached and reused
    pub enable_caching: bool,
}

impl LibraryConfig {
    /// Add a search directory
    pub fn with_search_path(mut self, path: impl Into<String>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Check if a file extension denotes a material card (case-insensitive)
    pub fn is_card_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            extensions: vec!["FCMat".to_string()],
            enable_caching: true,
        }
    }
}

/// # Logging Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log filter (overridden by `RUST_LOG`)
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Card parser configuration
    pub parser: ParserConfig,
    /// Resolver configuration
    pub resolver: ResolverConfig,
    /// Material library configuration
    pub library: LibraryConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.resolver.validate()?;
        if self.library.extensions.is_empty() {
            return Err("At least one card extension is required".to_string());
        }
        Ok(())
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApplicationConfig::default();
        assert_eq!(config.parser.duplicate_keys, DuplicateKeyPolicy::LastWins);
        assert_eq!(config.resolver.parent_key, "Father");
        assert!(config.library.is_card_extension("fcmat"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matcard.toml");
        std::fs::write(&path, "[parser]\nduplicate_keys = \"Reject\"\n").unwrap();

        let config = ApplicationConfig::load_from_file(&path).unwrap();
        assert_eq!(config.parser.duplicate_keys, DuplicateKeyPolicy::Reject);
        assert_eq!(config.resolver.diffuse_color_key, "DiffuseColor");
        assert!(config.library.enable_caching);
    }

    #[test]
    fn test_save_and_load_ron() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matcard.ron");

        let mut config = ApplicationConfig::default();
        config.resolver = config.resolver.with_parent_key("Parent");
        config.library = config.library.with_search_path("materials");
        config.save_to_file(&path).unwrap();

        let loaded = ApplicationConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.resolver.parent_key, "Parent");
        assert_eq!(loaded.library.search_paths, vec!["materials".to_string()]);
    }

    #[test]
    fn test_unsupported_format() {
        let result = ApplicationConfig::load_from_file("matcard.yaml");
        assert!(matches!(result, Err(crate::config::ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut config = ApplicationConfig::default();
        config.resolver.parent_key = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
