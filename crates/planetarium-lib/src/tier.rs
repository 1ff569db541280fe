//! Magnitude tiers and the reads that go through them
//!
//! The catalog is split into an always-loaded brightest tier and a list of spatial tiers,
//! each keyed by cells at its own resolution and holding a successively fainter magnitude
//! band. [`TieredCatalog`] owns the descriptor list and is the only component that talks to
//! the store for star rows.

use crate::spatial::{CellKey, Resolution};
use crate::star::StarId;
use crate::store::{CatalogStore, RowFilter, StarRow};
use crate::{CatalogError, Config, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::Serialize;

/// A catalog tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Tier {
    /// The N brightest stars, keyed at resolution 0
    Brightest,
    /// A spatial tier keyed by cells at the given resolution
    Spatial(u8),
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Brightest => write!(f, "brightest"),
            Tier::Spatial(resolution) => write!(f, "spatial {resolution}"),
        }
    }
}

impl FromStr for Tier {
    type Err = CatalogError;

    /// Parses `brightest` or a spatial resolution (`0`, `s0`, `spatial 0`)
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        if s == "brightest" || s == "b" {
            return Ok(Tier::Brightest);
        }
        let digits = s
            .strip_prefix("spatial")
            .or_else(|| s.strip_prefix('s'))
            .unwrap_or(s.as_str())
            .trim();
        digits
            .parse::<u8>()
            .map(Tier::Spatial)
            .map_err(|_| CatalogError::UndefinedTier(s.clone()))
    }
}

/// Magnitude range covered by a tier
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MagnitudeBand {
    /// Brightest magnitude in the tier
    pub min: f64,
    /// Faintest magnitude in the tier
    pub max: f64,
}

impl MagnitudeBand {
    /// Whether some star of this band can pass the cutoff
    #[inline]
    pub fn reaches(&self, max_magnitude: Option<f64>) -> bool {
        max_magnitude.is_none_or(|max| self.min <= max)
    }
}

/// Layout of one tier as learned from the store
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TierDescriptor {
    pub tier: Tier,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_resolution"))]
    pub cell_resolution: Resolution,
    pub count: usize,
    /// Absent for an empty tier
    pub band: Option<MagnitudeBand>,
}

impl TierDescriptor {
    /// Whether a read with this cutoff can return anything
    #[inline]
    pub fn reaches(&self, max_magnitude: Option<f64>) -> bool {
        self.band.is_some_and(|band| band.reaches(max_magnitude))
    }
}

#[cfg(feature = "serde")]
fn serialize_resolution<S: serde::Serializer>(
    resolution: &Resolution,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u8(resolution.level())
}

/// Tier descriptors plus single-tier reads against the store
#[derive(Clone)]
pub struct TieredCatalog {
    store: Arc<dyn CatalogStore>,
    brightest: TierDescriptor,
    spatial: Vec<TierDescriptor>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TieredCatalog {
    /// Learn the tier layout from the store
    ///
    /// Fails with `UndefinedTier` when a configured tier is missing from the store or the
    /// spatial resolutions are not strictly increasing.
    pub fn open(store: Arc<dyn CatalogStore>, config: &Config) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("tier::open");

        if config.spatial_resolutions.is_empty() {
            return Err(CatalogError::UndefinedTier(
                "no spatial tiers configured".to_string(),
            ));
        }
        if config.spatial_resolutions.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CatalogError::UndefinedTier(format!(
                "spatial resolutions must be strictly increasing, got {:?}",
                config.spatial_resolutions
            )));
        }

        let brightest = Self::describe(store.as_ref(), Tier::Brightest, Resolution::ZERO)?;
        let spatial = config
            .spatial_resolutions
            .iter()
            .map(|&level| {
                let resolution = Resolution::new(level)?;
                Self::describe(store.as_ref(), Tier::Spatial(level), resolution)
            })
            .collect::<Result<Vec<_>>>()?;

        if brightest.count != config.brightest_count {
            tracing::warn!(
                expected = config.brightest_count,
                actual = brightest.count,
                "brightest tier size differs from configuration"
            );
        }

        Ok(Self {
            store,
            brightest,
            spatial,
        })
    }

    fn describe(
        store: &dyn CatalogStore,
        tier: Tier,
        cell_resolution: Resolution,
    ) -> Result<TierDescriptor> {
        let stats = store
            .tier_stats(tier)?
            .ok_or_else(|| CatalogError::UndefinedTier(format!("{tier} is missing from the store")))?;

        let descriptor = TierDescriptor {
            tier,
            cell_resolution,
            count: stats.count,
            band: stats
                .magnitude_range
                .map(|(min, max)| MagnitudeBand { min, max }),
        };
        tracing::debug!(
            %tier,
            count = descriptor.count,
            band = ?descriptor.band,
            "loaded tier"
        );
        Ok(descriptor)
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    pub fn brightest(&self) -> &TierDescriptor {
        &self.brightest
    }

    /// Spatial tiers, coarsest first
    pub fn spatial_tiers(&self) -> &[TierDescriptor] {
        &self.spatial
    }

    /// Brightest tier followed by the spatial tiers in order
    pub fn descriptors(&self) -> impl Iterator<Item = &TierDescriptor> {
        std::iter::once(&self.brightest).chain(self.spatial.iter())
    }

    /// Descriptor of a tier, or `UndefinedTier`
    pub fn descriptor(&self, tier: Tier) -> Result<&TierDescriptor> {
        self.descriptors()
            .find(|descriptor| descriptor.tier == tier)
            .ok_or_else(|| CatalogError::UndefinedTier(tier.to_string()))
    }

    /// Finest spatial resolution in the layout
    pub fn finest_resolution(&self) -> Resolution {
        self.spatial
            .last()
            .map(|descriptor| descriptor.cell_resolution)
            .unwrap_or(Resolution::ZERO)
    }

    /// Rows of a tier up to a magnitude, brightest first
    pub fn read_by_magnitude(&self, tier: Tier, max_magnitude: Option<f64>) -> Result<Vec<StarRow>> {
        self.descriptor(tier)?;
        let filter = RowFilter::all().max_magnitude(max_magnitude);
        Ok(self.store.read_rows(tier, &filter)?)
    }

    /// Rows of one cell of a tier up to a magnitude, brightest first
    pub fn read_by_cell(
        &self,
        tier: Tier,
        cell: CellKey,
        max_magnitude: Option<f64>,
    ) -> Result<Vec<StarRow>> {
        self.descriptor(tier)?;
        let filter = RowFilter::all().in_cell(cell).max_magnitude(max_magnitude);
        let rows = self.store.read_rows(tier, &filter)?;
        tracing::trace!(%tier, %cell, rows = rows.len(), "read cell");
        Ok(rows)
    }

    /// Row for a star id together with the tier it was found in
    ///
    /// Looks in the brightest tier first, then the spatial tiers in order.
    pub fn read_by_id(&self, id: StarId) -> Result<Option<(Tier, StarRow)>> {
        let filter = RowFilter::with_id(id);
        for descriptor in self.descriptors() {
            if let Some(row) = self.store.read_rows(descriptor.tier, &filter)?.into_iter().next() {
                return Ok(Some((descriptor.tier, row)));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for TieredCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TieredCatalog")
            .field("brightest", &self.brightest)
            .field("spatial", &self.spatial)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, StoreError};
    use nalgebra::Vector3;

    fn row(id: u64, magnitude: f64) -> StarRow {
        StarRow {
            id: StarId(id),
            magnitude,
            coordinate: Vector3::new(0.0, 1.0, 0.0),
            spectral_class: None,
            cell: CellKey::parse("8001fffffffffff").ok(),
        }
    }

    fn store() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.insert_row(Tier::Brightest, row(1, 0.5));
        store.insert_row(Tier::Brightest, row(2, 1.5));
        store.insert_row(Tier::Spatial(0), row(2, 1.5));
        store.insert_row(Tier::Spatial(0), row(3, 4.0));
        store.insert_row(Tier::Spatial(1), row(4, 7.0));
        store.add_tier(Tier::Spatial(2));
        store
    }

    fn catalog() -> TieredCatalog {
        TieredCatalog::open(Arc::new(store()), &Config::default()).unwrap()
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("brightest".parse::<Tier>().unwrap(), Tier::Brightest);
        assert_eq!("2".parse::<Tier>().unwrap(), Tier::Spatial(2));
        assert_eq!("S1".parse::<Tier>().unwrap(), Tier::Spatial(1));
        assert_eq!("spatial 0".parse::<Tier>().unwrap(), Tier::Spatial(0));
        assert!("faint".parse::<Tier>().is_err());
    }

    #[test]
    fn test_open_learns_bands() {
        let catalog = catalog();
        assert_eq!(catalog.brightest().count, 2);
        assert_eq!(
            catalog.brightest().band,
            Some(MagnitudeBand { min: 0.5, max: 1.5 })
        );
        assert_eq!(catalog.spatial_tiers().len(), 3);
        assert!(catalog.spatial_tiers()[2].band.is_none());
        assert!(!catalog.spatial_tiers()[2].reaches(None));
        assert_eq!(catalog.finest_resolution(), Resolution::TWO);

        let tiers: Vec<Tier> = catalog.descriptors().map(|d| d.tier).collect();
        assert_eq!(
            tiers,
            vec![
                Tier::Brightest,
                Tier::Spatial(0),
                Tier::Spatial(1),
                Tier::Spatial(2)
            ]
        );
    }

    #[test]
    fn test_open_rejects_missing_tier() {
        let config = Config {
            spatial_resolutions: vec![0, 1, 2, 3],
            ..Config::default()
        };
        let err = TieredCatalog::open(Arc::new(store()), &config).unwrap_err();
        assert!(matches!(err, CatalogError::UndefinedTier(_)));
    }

    #[test]
    fn test_open_rejects_unordered_resolutions() {
        let config = Config {
            spatial_resolutions: vec![1, 0],
            ..Config::default()
        };
        assert!(TieredCatalog::open(Arc::new(store()), &config).is_err());
    }

    #[test]
    fn test_open_propagates_store_failure() {
        let mut store = store();
        store.set_unavailable(Some("locked".into()));
        let err = TieredCatalog::open(Arc::new(store), &Config::default()).unwrap_err();
        assert!(matches!(err, CatalogError::Store(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_reads_reject_undefined_tier() {
        let catalog = catalog();
        let err = catalog.read_by_magnitude(Tier::Spatial(7), None).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_read_by_magnitude_filters() {
        let catalog = catalog();
        let rows = catalog
            .read_by_magnitude(Tier::Brightest, Some(1.0))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, StarId(1));
    }

    #[test]
    fn test_read_by_id_prefers_brightest() {
        let catalog = catalog();
        let (tier, row) = catalog.read_by_id(StarId(2)).unwrap().unwrap();
        assert_eq!(tier, Tier::Brightest);
        assert_eq!(row.magnitude, 1.5);

        let (tier, _) = catalog.read_by_id(StarId(4)).unwrap().unwrap();
        assert_eq!(tier, Tier::Spatial(1));
        assert!(catalog.read_by_id(StarId(99)).unwrap().is_none());
    }
}
