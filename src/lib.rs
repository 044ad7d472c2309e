//! Province Atlas - In-Memory Data Layer for Strategy-Game Map Editing
//!
//! This library holds the province records of a strategy-game mod in a flat,
//! ordered collection, keeps them queryable through a derived classification
//! hierarchy, and moves them between memory and the semicolon-delimited
//! province file the game engines read.
//!
//! # Architecture
//!
//! - **[`Province`]**: One classified geographic record
//! - **[`Catalogs`]**: Fixed classification sets with case-insensitive lookup,
//!   built per [`Ruleset`]
//! - **[`ProvinceStore`]**: Flat collection plus the live hierarchy index,
//!   mutated only through index-aware operations
//! - **[`ProvinceDatabase`]**: Load/save orchestration with single-flight
//!   background loading
//! - **[`parse_text`]** / **[`write_provinces`]**: Tolerant reader and
//!   version-aware writer for the province file
//!
//! # Consistency
//!
//! The hierarchy index is a cache over the flat collection: at every
//! quiescent point it equals a full rebuild, it never holds empty buckets,
//! and it aggregates per-record assignments without forcing a strict tree.

mod catalog;
mod index;
mod loader;
mod multimap;
mod parser;
mod record;
mod store;
mod text;
mod writer;

// Public API exports
pub use catalog::{Area, Catalog, Catalogs, Climate, Continent, Region, Ruleset, Terrain};
pub use loader::{DatabaseConfig, LoadOutcome, ProvinceDatabase};
pub use multimap::MultiMap;
pub use parser::{COLUMN_COUNT, MIN_ROW_TOKENS, ParseReport, ParseWarning, parse_text};
pub use record::{MapPoint, Province, ProvinceId};
pub use store::{ProvinceStore, StoreInfo};
pub use text::{CachedResolver, NameResolver, StaticResolver, display_name, localization_key};
pub use writer::{FILE_HEADER, FileLayout, render_provinces, write_provinces};

/// Error types for the data layer
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("duplicate province id {0}")]
    DuplicateId(ProvinceId),

    #[error("no province with id {0}")]
    UnknownId(ProvinceId),

    #[error("background load failed: {0}")]
    Background(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_public_exports() {
        // Verify that the main entry points are accessible
        let _: fn(Ruleset) -> Catalogs = Catalogs::new;
        let _: fn(Arc<dyn NameResolver>) -> ProvinceStore = ProvinceStore::new;
        let _: fn(DatabaseConfig, Arc<dyn NameResolver>) -> ProvinceDatabase =
            ProvinceDatabase::new;
    }

    #[test]
    fn test_error_messages_carry_context() {
        let error = StoreError::DuplicateId(ProvinceId(12));
        assert_eq!(error.to_string(), "duplicate province id 12");
        let error = StoreError::UnknownId(ProvinceId(7));
        assert_eq!(error.to_string(), "no province with id 7");
    }
}
