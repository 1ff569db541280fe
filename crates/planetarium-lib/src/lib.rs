//! Planetarium Library - Tiered Star Catalog Queries
//!
//! This library answers "which stars are visible" questions against a catalog of millions of
//! stars while keeping the working set handed to a renderer bounded to a few hundred entries.
//! Stars are partitioned by apparent magnitude into an always-loaded brightest tier plus three
//! hexagonal spatial-index tiers of increasing resolution, and every query transparently falls
//! back between tiers without duplicating results.
//!
//! # Architecture
//!
//! - **[`CatalogStore`]**: Read-only row source (in-memory or SQLite)
//! - **[`SpatialIndex`]**: Hexagonal cell capability, backed by [`H3Index`]
//! - **[`TieredCatalog`]**: Tier descriptors and single-tier reads
//! - **[`QueryEngine`]**: Magnitude, viewport, nearest-star and text queries
//! - **[`ConstellationGraph`]**: Constellation metadata, borders and figure lines
//! - **[`SkyCatalog`]**: High-level manager wiring all of the above together
//!
//! # Performance Characteristics
//!
//! - **Brightest query**: O(B) where B = brightest tier size (~300)
//! - **Viewport query**: O(B + C×K) where C = covering cells, K = stars per cell
//! - **Nearest query**: O(B + K₀ + K₁ + K₂), one cell per tier

mod catalog;
mod config;
mod constellation;
mod constellation_graph;
mod designation;
pub mod geometry;
mod query;
pub mod spatial;
#[cfg(feature = "sqlite")]
pub mod sqlite;
mod star;
pub mod store;
pub mod synthetic;
mod tier;

// Public API exports
pub use catalog::{CatalogInfo, SkyCatalog, TierInfo};
pub use config::{Config, NearestSearch};
pub use constellation::{Constellation, ConstellationAbbr};
pub use constellation_graph::{ConstellationGraph, ConstellationLine};
pub use designation::{BayerFlamsteed, GreekLetter};
pub use query::{QueryEngine, SearchPattern};
pub use spatial::{CellId, CellKey, H3Index, Resolution, SpatialError, SpatialIndex};
pub use star::{CatalogIds, MultipleStar, SpectralClass, Star, StarId, StarInfo, Variability};
pub use store::{CatalogStore, InMemoryStore, StoreError};
pub use tier::{MagnitudeBand, Tier, TierDescriptor, TieredCatalog};

/// Error types for catalog queries
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Viewport polygon needs exactly 4 vertices, got {0}")]
    InvalidVertexCount(usize),

    #[error("Undefined tier: {0}")]
    UndefinedTier(String),

    #[error("Invalid search pattern: {0}")]
    InvalidSearchPattern(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Spatial index error: {0}")]
    SpatialIndex(#[from] SpatialError),
}

impl CatalogError {
    /// Whether the request itself was rejected (as opposed to a failing collaborator)
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            CatalogError::InvalidVertexCount(_)
                | CatalogError::UndefinedTier(_)
                | CatalogError::InvalidSearchPattern(_)
                | CatalogError::InvalidCoordinate(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
