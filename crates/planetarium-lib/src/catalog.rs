//! SkyCatalog - Top-level manager for the store, spatial index and queries
//!
//! This module wires a [`CatalogStore`] and a [`SpatialIndex`] into the query engine and the
//! constellation graph, and reports catalog statistics.

use crate::constellation_graph::ConstellationGraph;
use crate::query::QueryEngine;
use crate::spatial::{H3Index, SpatialIndex};
use crate::store::CatalogStore;
use crate::synthetic::SyntheticCatalog;
use crate::tier::{Tier, TieredCatalog};
use crate::{Config, Result};

#[cfg(feature = "serde")]
use serde::Serialize;
use std::sync::Arc;

/// Statistics for one tier
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TierInfo {
    pub tier: Tier,
    /// Cell resolution the tier is keyed at
    pub resolution: u8,
    /// Number of stars stored in the tier
    pub count: usize,
    pub min_magnitude: Option<f64>,
    pub max_magnitude: Option<f64>,
}

/// Information about the catalog
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CatalogInfo {
    /// Brightest tier first, then the spatial tiers in order
    pub tiers: Vec<TierInfo>,
    /// Distinct stars across the spatial tiers
    pub star_count: usize,
    pub constellation_count: usize,
}

/// Top-level catalog handle
#[derive(Clone)]
pub struct SkyCatalog {
    config: Config,
    engine: QueryEngine,
    constellations: ConstellationGraph,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SkyCatalog {
    /// Open a catalog over a store and a spatial index
    ///
    /// Learns the tier layout from the store, failing if a configured tier is missing.
    pub fn open(
        config: Config,
        store: Arc<dyn CatalogStore>,
        index: Arc<dyn SpatialIndex>,
    ) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("catalog::open");

        let tiers = TieredCatalog::open(store, &config)?;
        let engine = QueryEngine::new(tiers.clone(), index, config.nearest_search);
        let constellations = ConstellationGraph::new(tiers);

        tracing::info!(
            brightest = engine.catalog().brightest().count,
            spatial_tiers = engine.catalog().spatial_tiers().len(),
            "opened star catalog"
        );

        Ok(Self {
            config,
            engine,
            constellations,
        })
    }

    /// Open the default synthetic catalog with the H3 index
    pub fn synthetic(config: Config) -> Result<Self> {
        let index = Arc::new(H3Index::new());
        let store = SyntheticCatalog::default().build(index.as_ref())?;
        Self::open(config, Arc::new(store), index)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Star queries
    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Constellation lookups
    pub fn constellations(&self) -> &ConstellationGraph {
        &self.constellations
    }

    /// Per-tier counts and magnitude ranges plus the constellation count
    pub fn info(&self) -> Result<CatalogInfo> {
        let catalog = self.engine.catalog();
        let tiers: Vec<TierInfo> = catalog
            .descriptors()
            .map(|descriptor| TierInfo {
                tier: descriptor.tier,
                resolution: descriptor.cell_resolution.level(),
                count: descriptor.count,
                min_magnitude: descriptor.band.map(|band| band.min),
                max_magnitude: descriptor.band.map(|band| band.max),
            })
            .collect();
        let star_count = catalog
            .spatial_tiers()
            .iter()
            .map(|descriptor| descriptor.count)
            .sum();
        let constellation_count = catalog.store().constellations()?.len();

        Ok(CatalogInfo {
            tiers,
            star_count,
            constellation_count,
        })
    }
}
