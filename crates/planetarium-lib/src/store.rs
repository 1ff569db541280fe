//! Read-only catalog store capability
//!
//! A [`CatalogStore`] holds one row table per tier plus the star detail and constellation
//! tables. It answers indexed lookups only; tier fallback, deduplication and geometry all
//! happen above it. [`InMemoryStore`] is the in-process adapter used by tests, benchmarks and
//! the synthetic catalog.

use crate::spatial::CellKey;
use crate::star::{SpectralClass, StarId};
use crate::tier::Tier;
use nalgebra::Vector3;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Errors raised by a catalog store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Unavailable(String),

    #[error("Corrupt catalog data: {0}")]
    Corrupt(String),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A star row as stored in a tier table
#[derive(Debug, Clone, PartialEq)]
pub struct StarRow {
    pub id: StarId,
    pub magnitude: f64,
    /// Position in the equatorial frame, not necessarily unit length
    pub coordinate: Vector3<f64>,
    pub spectral_class: Option<SpectralClass>,
    /// Cell key at the tier's resolution
    pub cell: Option<CellKey>,
}

impl StarRow {
    /// Magnitude ascending, ties broken by id
    pub fn magnitude_order(a: &StarRow, b: &StarRow) -> Ordering {
        a.magnitude
            .total_cmp(&b.magnitude)
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Row filter for a tier read
///
/// Every present field must match. Results are always ordered by magnitude ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFilter {
    pub id: Option<StarId>,
    pub cell: Option<CellKey>,
    pub max_magnitude: Option<f64>,
}

impl RowFilter {
    /// Match every row
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_id(id: StarId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn in_cell(mut self, cell: CellKey) -> Self {
        self.cell = Some(cell);
        self
    }

    pub fn max_magnitude(mut self, max_magnitude: Option<f64>) -> Self {
        self.max_magnitude = max_magnitude;
        self
    }

    /// Whether a row passes the filter
    pub fn matches(&self, row: &StarRow) -> bool {
        self.id.is_none_or(|id| row.id == id)
            && self.cell.is_none_or(|cell| row.cell == Some(cell))
            && self.max_magnitude.is_none_or(|max| row.magnitude <= max)
    }
}

/// Summary of one tier table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierStats {
    pub count: usize,
    /// Brightest and faintest magnitude, absent for an empty table
    pub magnitude_range: Option<(f64, f64)>,
}

/// Raw detail columns for a star
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailRow {
    pub id: StarId,
    pub hip: Option<i64>,
    pub hd: Option<i64>,
    pub hr: Option<i64>,
    pub gl: Option<String>,
    pub bf: Option<String>,
    pub proper: Option<String>,
    pub mag: Option<f64>,
    pub absmag: Option<f64>,
    pub spect: Option<String>,
    pub ci: Option<f64>,
    pub lum: Option<f64>,
    pub var: Option<String>,
    pub var_min: Option<f64>,
    pub var_max: Option<f64>,
    pub bayer: Option<String>,
    pub flam: Option<i64>,
    pub con: Option<String>,
    pub comp: Option<i64>,
    pub comp_primary: Option<i64>,
    pub base: Option<String>,
}

/// Detail lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailQuery {
    Hip(u32),
    Hd(u32),
    Hr(u32),
    /// Case-insensitive substring of the proper name
    ProperName(String),
}

impl DetailQuery {
    pub fn matches(&self, row: &DetailRow) -> bool {
        match self {
            DetailQuery::Hip(n) => row.hip == Some(i64::from(*n)),
            DetailQuery::Hd(n) => row.hd == Some(i64::from(*n)),
            DetailQuery::Hr(n) => row.hr == Some(i64::from(*n)),
            DetailQuery::ProperName(fragment) => {
                let fragment = fragment.to_lowercase();
                row.proper
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&fragment))
            }
        }
    }
}

/// Constellation lookup key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstellationKey {
    Id(u32),
    /// Display name or abbreviation, case-insensitive
    Name(String),
}

/// A constellation row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstellationRow {
    pub id: u32,
    pub name: String,
    pub abbr: String,
    pub genitive: String,
}

impl ConstellationKey {
    pub fn matches(&self, row: &ConstellationRow) -> bool {
        match self {
            ConstellationKey::Id(id) => row.id == *id,
            ConstellationKey::Name(name) => {
                let name = name.trim();
                row.name.eq_ignore_ascii_case(name) || row.abbr.eq_ignore_ascii_case(name)
            }
        }
    }
}

/// Read-only indexed catalog store
///
/// All methods are idempotent reads. A store that cannot answer must return an error rather
/// than a partial result.
pub trait CatalogStore: Send + Sync {
    /// Rows of one tier matching the filter, ordered by magnitude ascending
    fn read_rows(&self, tier: Tier, filter: &RowFilter) -> StoreResult<Vec<StarRow>>;

    /// Row count and magnitude range of a tier, `None` if the store has no such tier
    fn tier_stats(&self, tier: Tier) -> StoreResult<Option<TierStats>>;

    fn read_detail(&self, id: StarId) -> StoreResult<Option<DetailRow>>;

    fn find_details(&self, query: &DetailQuery) -> StoreResult<Vec<DetailRow>>;

    fn read_constellation(&self, key: &ConstellationKey) -> StoreResult<Option<ConstellationRow>>;

    /// All constellations ordered by id
    fn constellations(&self) -> StoreResult<Vec<ConstellationRow>>;

    /// Abbreviations sharing a border with `abbr` (either direction of the border table)
    fn border_neighbors(&self, abbr: &str) -> StoreResult<Vec<String>>;

    /// Figure line endpoints of a constellation
    fn constellation_lines(&self, constellation_id: u32) -> StoreResult<Vec<(StarId, StarId)>>;
}

/// In-memory catalog store
///
/// Tier rows are kept sorted by magnitude on insert.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tiers: BTreeMap<Tier, Vec<StarRow>>,
    details: HashMap<StarId, DetailRow>,
    constellations: Vec<ConstellationRow>,
    borders: Vec<(String, String)>,
    lines: Vec<(u32, StarId, StarId)>,
    unavailable: Option<String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a tier table, possibly empty
    pub fn add_tier(&mut self, tier: Tier) {
        self.tiers.entry(tier).or_default();
    }

    pub fn insert_row(&mut self, tier: Tier, row: StarRow) {
        let rows = self.tiers.entry(tier).or_default();
        let position =
            rows.partition_point(|existing| StarRow::magnitude_order(existing, &row).is_lt());
        rows.insert(position, row);
    }

    pub fn insert_detail(&mut self, row: DetailRow) {
        self.details.insert(row.id, row);
    }

    pub fn insert_constellation(&mut self, row: ConstellationRow) {
        let position = self
            .constellations
            .partition_point(|existing| existing.id < row.id);
        self.constellations.insert(position, row);
    }

    pub fn insert_border(&mut self, abbr: &str, neighbor: &str) {
        self.borders.push((abbr.to_string(), neighbor.to_string()));
    }

    pub fn insert_line(&mut self, constellation_id: u32, star1: StarId, star2: StarId) {
        self.lines.push((constellation_id, star1, star2));
    }

    /// Make every subsequent read fail, or restore the store with `None`
    pub fn set_unavailable(&mut self, reason: Option<String>) {
        self.unavailable = reason;
    }

    fn check_available(&self) -> StoreResult<()> {
        match &self.unavailable {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

impl CatalogStore for InMemoryStore {
    fn read_rows(&self, tier: Tier, filter: &RowFilter) -> StoreResult<Vec<StarRow>> {
        self.check_available()?;
        Ok(self
            .tiers
            .get(&tier)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filter.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn tier_stats(&self, tier: Tier) -> StoreResult<Option<TierStats>> {
        self.check_available()?;
        Ok(self.tiers.get(&tier).map(|rows| TierStats {
            count: rows.len(),
            magnitude_range: rows
                .first()
                .zip(rows.last())
                .map(|(first, last)| (first.magnitude, last.magnitude)),
        }))
    }

    fn read_detail(&self, id: StarId) -> StoreResult<Option<DetailRow>> {
        self.check_available()?;
        Ok(self.details.get(&id).cloned())
    }

    fn find_details(&self, query: &DetailQuery) -> StoreResult<Vec<DetailRow>> {
        self.check_available()?;
        let mut rows: Vec<DetailRow> = self
            .details
            .values()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    fn read_constellation(&self, key: &ConstellationKey) -> StoreResult<Option<ConstellationRow>> {
        self.check_available()?;
        Ok(self
            .constellations
            .iter()
            .find(|row| key.matches(row))
            .cloned())
    }

    fn constellations(&self) -> StoreResult<Vec<ConstellationRow>> {
        self.check_available()?;
        Ok(self.constellations.clone())
    }

    fn border_neighbors(&self, abbr: &str) -> StoreResult<Vec<String>> {
        self.check_available()?;
        let mut neighbors: Vec<String> = Vec::new();
        for (a, b) in &self.borders {
            let other = if a.eq_ignore_ascii_case(abbr) {
                b
            } else if b.eq_ignore_ascii_case(abbr) {
                a
            } else {
                continue;
            };
            if !neighbors.iter().any(|n| n == other) {
                neighbors.push(other.clone());
            }
        }
        Ok(neighbors)
    }

    fn constellation_lines(&self, constellation_id: u32) -> StoreResult<Vec<(StarId, StarId)>> {
        self.check_available()?;
        Ok(self
            .lines
            .iter()
            .filter(|(id, _, _)| *id == constellation_id)
            .map(|(_, a, b)| (*a, *b))
            .collect())
    }
}
