//! Material card (.FCMat) parser
//!
//! Parses INI-style material cards into a flat, ordered key/value mapping.
//! Sections only group lines: `[Rendering]` and `[General]` keys end up in the
//! same mapping. Values are taken literally, there is no quoting syntax.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::core::config::{DuplicateKeyPolicy, ParserConfig};

/// Errors raised while parsing a material card
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A line that is neither blank, a comment, a section header nor `key = value`
    #[error("Line {line}: expected 'key = value', found '{content}'")]
    MissingSeparator {
        /// 1-based line number
        line: usize,
        /// Offending line, trimmed
        content: String,
    },

    /// A `= value` line with nothing before the separator
    #[error("Line {line}: empty key")]
    EmptyKey {
        /// 1-based line number
        line: usize,
    },

    /// Same key defined twice under `DuplicateKeyPolicy::Reject`
    #[error("Line {line}: duplicate key '{key}' (first defined on line {first_line})")]
    DuplicateKey {
        /// The repeated key
        key: String,
        /// 1-based line number of the repetition
        line: usize,
        /// 1-based line number of the first definition
        first_line: usize,
    },
}

/// One `key = value` line of a card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardEntry {
    /// Dotted key, e.g. `Render.Diffuse.Color`
    pub key: String,
    /// Literal value, trimmed
    pub value: String,
    /// Section the entry was found in, if any
    pub section: Option<String>,
    /// 1-based source line (0 for entries added programmatically)
    pub line: usize,
}

/// Ordered mapping of card keys to values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialCard {
    entries: Vec<CardEntry>,
    index: HashMap<String, usize>,
}

impl MaterialCard {
    /// Create an empty card
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a card from `(key, value)` pairs, later pairs overriding earlier ones
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut card = Self::new();
        for (key, value) in pairs {
            card.insert(key, value);
        }
        card
    }

    /// Set a value, replacing any existing one in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.push_entry(
            CardEntry {
                key: key.into(),
                value: value.into(),
                section: None,
                line: 0,
            },
            DuplicateKeyPolicy::LastWins,
        )
        .ok();
    }

    /// Get the value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entry(key).map(|e| e.value.as_str())
    }

    /// Get the full entry for a key
    pub fn entry(&self, key: &str) -> Option<&CardEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Check if a key is defined
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the card is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in file order
    pub fn iter(&self) -> impl Iterator<Item = &CardEntry> {
        self.entries.iter()
    }

    /// Iterate over entries whose key starts with `prefix`, yielding the
    /// remainder of the key alongside the entry
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a CardEntry)> + 'a {
        self.entries
            .iter()
            .filter_map(move |e| e.key.strip_prefix(prefix).map(|rest| (rest, e)))
    }

    /// Write the card back to .FCMat text
    pub fn to_fcmat_string(&self) -> String {
        let mut out = String::new();
        let mut current_section: Option<&str> = None;

        for entry in &self.entries {
            let section = entry.section.as_deref();
            if section.is_some() && section != current_section {
                if !out.is_empty() {
                    out.push('\n');
                }
                let _ = writeln!(out, "[{}]", section.unwrap_or_default());
                current_section = section;
            }
            let _ = writeln!(out, "{} = {}", entry.key, entry.value);
        }

        out
    }

    fn push_entry(&mut self, entry: CardEntry, policy: DuplicateKeyPolicy) -> Result<(), ParseError> {
        match self.index.get(&entry.key) {
            None => {
                self.index.insert(entry.key.clone(), self.entries.len());
                self.entries.push(entry);
            }
            Some(&i) => match policy {
                DuplicateKeyPolicy::LastWins => {
                    log::debug!(
                        "Key '{}' redefined on line {} (first on line {}), keeping last value",
                        entry.key, entry.line, self.entries[i].line
                    );
                    self.entries[i].value = entry.value;
                }
                DuplicateKeyPolicy::FirstWins => {
                    log::debug!(
                        "Key '{}' redefined on line {}, keeping value from line {}",
                        entry.key, entry.line, self.entries[i].line
                    );
                }
                DuplicateKeyPolicy::Reject => {
                    return Err(ParseError::DuplicateKey {
                        first_line: self.entries[i].line,
                        key: entry.key,
                        line: entry.line,
                    });
                }
            },
        }
        Ok(())
    }
}

/// Material card parser
pub struct CardParser;

impl CardParser {
    /// Parse card contents with the default configuration (last key wins)
    pub fn parse(contents: &str) -> Result<MaterialCard, ParseError> {
        Self::parse_with(contents, &ParserConfig::default())
    }

    /// Parse card contents
    ///
    /// # Arguments
    /// * `contents` - The text contents of the card
    /// * `config` - Parser options (duplicate key policy)
    pub fn parse_with(contents: &str, config: &ParserConfig) -> Result<MaterialCard, ParseError> {
        let mut card = MaterialCard::new();
        let mut section: Option<String> = None;
        let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);

        for (line_num, raw) in contents.lines().enumerate() {
            let line_num = line_num + 1;
            let line = raw.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = Some(name.trim().to_string());
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| ParseError::MissingSeparator {
                line: line_num,
                content: line.to_string(),
            })?;

            let key = key.trim();
            if key.is_empty() {
                return Err(ParseError::EmptyKey { line: line_num });
            }

            card.push_entry(
                CardEntry {
                    key: key.to_string(),
                    value: value.trim().to_string(),
                    section: section.clone(),
                    line: line_num,
                },
                config.duplicate_keys,
            )?;
        }

        log::trace!("Parsed card with {} keys", card.len());
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_card() {
        let card_content = r#"
; Simple material
[General]
Name = Red Paint

[Rendering]
DiffuseColor = (0.8, 0.2, 0.2, 0.0)
Render.Type = Diffuse
Render.Diffuse.Color = (0.8, 0.2, 0.2)
"#;

        let card = CardParser::parse(card_content).unwrap();
        assert_eq!(card.len(), 4);
        assert_eq!(card.get("Name"), Some("Red Paint"));
        assert_eq!(card.get("Render.Type"), Some("Diffuse"));
        assert_eq!(card.get("Render.Diffuse.Color"), Some("(0.8, 0.2, 0.2)"));
        assert_eq!(card.entry("Render.Type").unwrap().section.as_deref(), Some("Rendering"));
    }

    #[test]
    fn test_values_are_literal() {
        let card = CardParser::parse("Render.Ospray.0001 = \"quoted\" = still value \n").unwrap();
        assert_eq!(card.get("Render.Ospray.0001"), Some("\"quoted\" = still value"));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let card = CardParser::parse("Render.Type = Glass\nrender.type = Diffuse\n").unwrap();
        assert_eq!(card.len(), 2);
        assert_eq!(card.get("Render.Type"), Some("Glass"));
        assert_eq!(card.get("render.type"), Some("Diffuse"));
    }

    #[test]
    fn test_missing_separator() {
        let result = CardParser::parse("[Rendering]\nRender.Type Diffuse\n");
        assert_eq!(
            result,
            Err(ParseError::MissingSeparator {
                line: 2,
                content: "Render.Type Diffuse".to_string()
            })
        );
    }

    #[test]
    fn test_empty_key() {
        let result = CardParser::parse("= orphan value\n");
        assert_eq!(result, Err(ParseError::EmptyKey { line: 1 }));
    }

    #[test]
    fn test_duplicate_last_wins() {
        let card = CardParser::parse("A = 1\nB = 2\nA = 3\n").unwrap();
        assert_eq!(card.get("A"), Some("3"));
        // Position of the first occurrence is kept
        let keys: Vec<&str> = card.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn test_duplicate_first_wins() {
        let config = ParserConfig::default().with_duplicate_keys(DuplicateKeyPolicy::FirstWins);
        let card = CardParser::parse_with("A = 1\nA = 3\n", &config).unwrap();
        assert_eq!(card.get("A"), Some("1"));
    }

    #[test]
    fn test_duplicate_reject() {
        let config = ParserConfig::default().with_duplicate_keys(DuplicateKeyPolicy::Reject);
        let result = CardParser::parse_with("Render.X.0001 = a\n\nRender.X.0001 = b\n", &config);
        assert_eq!(
            result,
            Err(ParseError::DuplicateKey {
                key: "Render.X.0001".to_string(),
                line: 3,
                first_line: 1
            })
        );
    }

    #[test]
    fn test_prefix_iteration() {
        let card = CardParser::parse("Render.Textures.Wood.Scale = 2\nRender.Type = Diffuse\nRender.Textures.Wood.Rotation = 45\n").unwrap();
        let rest: Vec<&str> = card.with_prefix("Render.Textures.").map(|(rest, _)| rest).collect();
        assert_eq!(rest, vec!["Wood.Scale", "Wood.Rotation"]);
    }

    #[test]
    fn test_write_back() {
        let text = "[General]\nName = Steel\n\n[Rendering]\nRender.Type = Glass\n";
        let card = CardParser::parse(text).unwrap();
        assert_eq!(card.to_fcmat_string(), text);

        let reparsed = CardParser::parse(&card.to_fcmat_string()).unwrap();
        assert_eq!(reparsed.get("Render.Type"), Some("Glass"));
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let card = CardParser::parse("\u{feff}[Rendering]\nRender.Type = Diffuse\n").unwrap();
        assert_eq!(card.get("Render.Type"), Some("Diffuse"));
    }
}
