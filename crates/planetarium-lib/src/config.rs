//! Catalog layout and query configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How far the nearest-star query looks around the query point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NearestSearch {
    /// Only the cell containing the point, at each resolution.
    /// A closer star just across a cell boundary can be missed.
    #[default]
    SameCell,
    /// The containing cell plus every cell within `k` grid steps of it
    CellRing(u32),
}

/// Configuration for a tiered catalog
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Expected size of the always-loaded brightest tier.
    /// Default: 300
    pub brightest_count: usize,
    /// Table holding the brightest tier in SQLite catalogs.
    /// Default: "stars_brightest_300"
    pub brightest_table: String,
    /// Resolution of each spatial tier, coarsest (brightest band) first.
    /// Default: [0, 1, 2]
    pub spatial_resolutions: Vec<u8>,
    /// Neighbourhood probed by nearest-star queries
    pub nearest_search: NearestSearch,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            brightest_count: 300,
            brightest_table: "stars_brightest_300".to_string(),
            spatial_resolutions: vec![0, 1, 2],
            nearest_search: NearestSearch::SameCell,
        }
    }
}
