//! Material card loading subsystem
//!
//! Parsing, file loading, caching, and name-indexed libraries of `.FCMat` cards.

pub mod card_parser;
pub mod card_loader;
pub mod material_cache;
pub mod library;

pub use card_parser::{CardEntry, CardParser, MaterialCard, ParseError};
pub use card_loader::{CardLoader, LoadedCard, NAME_KEY};
pub use material_cache::MaterialCache;
pub use library::MaterialLibrary;
