//! Query engine - tier fallback, viewport and nearest-star queries
//!
//! Every multi-tier query walks the tier descriptors in order (brightest first, then the
//! spatial tiers coarse to fine) and accumulates into a seen-id set, so a star stored in more
//! than one tier is returned once.

use crate::config::NearestSearch;
use crate::geometry;
use crate::spatial::{CellId, CellKey, Resolution, SpatialIndex};
use crate::star::{Star, StarId, StarInfo};
use crate::store::{DetailQuery, StarRow};
use crate::tier::{Tier, TierDescriptor, TieredCatalog};
use crate::{CatalogError, Result};

use geo::Point;
use nalgebra::Vector3;
use rayon::prelude::*;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

/// Catalog identifier search (`HIP 11767`, `hd8890`, `Hr 424`)
static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(hip|hd|hr)\s*(\d\S*)\s*$").expect("identifier pattern is valid")
});

/// Number of corners a viewport polygon must have
const VIEWPORT_VERTICES: usize = 4;

/// Parsed text search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPattern {
    Hip(u32),
    Hd(u32),
    Hr(u32),
    /// Case-insensitive proper-name fragment
    Name(String),
}

impl SearchPattern {
    /// Parse free text into a search
    ///
    /// A recognised catalog prefix followed by a malformed number is rejected rather than
    /// treated as a name.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::InvalidSearchPattern(
                "search text is empty".to_string(),
            ));
        }

        if let Some(captures) = IDENTIFIER_PATTERN.captures(trimmed) {
            let number: u32 = captures[2].parse().map_err(|_| {
                CatalogError::InvalidSearchPattern(format!(
                    "malformed catalog number in {trimmed:?}"
                ))
            })?;
            return Ok(match captures[1].to_ascii_lowercase().as_str() {
                "hip" => SearchPattern::Hip(number),
                "hd" => SearchPattern::Hd(number),
                _ => SearchPattern::Hr(number),
            });
        }

        Ok(SearchPattern::Name(trimmed.to_string()))
    }

    fn detail_query(&self) -> DetailQuery {
        match self {
            SearchPattern::Hip(n) => DetailQuery::Hip(*n),
            SearchPattern::Hd(n) => DetailQuery::Hd(*n),
            SearchPattern::Hr(n) => DetailQuery::Hr(*n),
            SearchPattern::Name(name) => DetailQuery::ProperName(name.clone()),
        }
    }
}

/// Duplicate-free star accumulator for a single query
#[derive(Default)]
struct Accumulator {
    seen: HashSet<StarId>,
    stars: Vec<Star>,
}

impl Accumulator {
    fn extend(&mut self, rows: Vec<StarRow>) {
        for row in rows {
            if self.seen.contains(&row.id) {
                continue;
            }
            match Star::from_row(&row) {
                Some(star) => {
                    self.seen.insert(row.id);
                    self.stars.push(star);
                }
                None => tracing::warn!(id = %row.id, "skipping malformed star row"),
            }
        }
    }

    fn into_sorted(mut self) -> Vec<Star> {
        sort_by_magnitude(&mut self.stars);
        self.stars
    }
}

fn sort_by_magnitude(stars: &mut [Star]) {
    stars.sort_by(|a, b| {
        a.magnitude()
            .total_cmp(&b.magnitude())
            .then_with(|| a.id().cmp(&b.id()))
    });
}

/// Read-only query surface over a tiered catalog
#[derive(Clone)]
pub struct QueryEngine {
    catalog: TieredCatalog,
    index: Arc<dyn SpatialIndex>,
    nearest_search: NearestSearch,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl QueryEngine {
    pub fn new(
        catalog: TieredCatalog,
        index: Arc<dyn SpatialIndex>,
        nearest_search: NearestSearch,
    ) -> Self {
        Self {
            catalog,
            index,
            nearest_search,
        }
    }

    pub fn catalog(&self) -> &TieredCatalog {
        &self.catalog
    }

    pub fn index(&self) -> &Arc<dyn SpatialIndex> {
        &self.index
    }

    /// The whole brightest tier, brightest first
    pub fn brightest_stars(&self) -> Result<Vec<Star>> {
        self.stars_in_tier(Tier::Brightest, None)
    }

    /// All stars up to a magnitude across every tier, brightest first
    pub fn stars(&self, max_magnitude: f64) -> Result<Vec<Star>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("query::stars");

        let cutoff = Some(max_magnitude);
        let mut accumulator = Accumulator::default();
        accumulator.extend(self.catalog.read_by_magnitude(Tier::Brightest, cutoff)?);

        // The brightest tier alone answers cutoffs up to its faintest star
        let beyond_brightest = self
            .catalog
            .brightest()
            .band
            .is_none_or(|band| max_magnitude > band.max);

        let mut tiers_read = 1;
        if beyond_brightest {
            for descriptor in self.catalog.spatial_tiers() {
                if !descriptor.reaches(cutoff) {
                    continue;
                }
                accumulator.extend(self.catalog.read_by_magnitude(descriptor.tier, cutoff)?);
                tiers_read += 1;
            }
        }

        let stars = accumulator.into_sorted();
        tracing::debug!(
            max_magnitude,
            tiers_read,
            stars = stars.len(),
            "magnitude query"
        );
        Ok(stars)
    }

    /// Stars of a single tier, brightest first
    pub fn stars_in_tier(&self, tier: Tier, max_magnitude: Option<f64>) -> Result<Vec<Star>> {
        let mut accumulator = Accumulator::default();
        accumulator.extend(self.catalog.read_by_magnitude(tier, max_magnitude)?);
        Ok(accumulator.stars)
    }

    /// Stars of one cell of a tier, brightest first
    pub fn stars_in_cell(
        &self,
        cell: CellKey,
        tier: Tier,
        max_magnitude: Option<f64>,
    ) -> Result<Vec<Star>> {
        let mut accumulator = Accumulator::default();
        accumulator.extend(self.catalog.read_by_cell(tier, cell, max_magnitude)?);
        Ok(accumulator.stars)
    }

    /// Stars inside a viewport quadrilateral
    ///
    /// Corners are geographic points (`x` = longitude, `y` = latitude, radians). The brightest
    /// tier is always included, followed by the one spatial tier whose resolution is the finest
    /// at which all corners share a cell. The result is duplicate-free and ordered by tier, then
    /// by coverage cell id, then by magnitude.
    pub fn stars_in_viewport(
        &self,
        corners: &[Point<f64>],
        max_magnitude: Option<f64>,
    ) -> Result<Vec<Star>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("query::stars_in_viewport");

        if corners.len() != VIEWPORT_VERTICES {
            return Err(CatalogError::InvalidVertexCount(corners.len()));
        }
        for corner in corners {
            validate_lat_lon(corner.y(), corner.x())?;
        }

        let resolution = self.viewport_resolution(corners)?;
        let polygon = geometry::viewport_polygon(corners);

        let mut accumulator = Accumulator::default();
        accumulator.extend(
            self.catalog
                .read_by_magnitude(Tier::Brightest, max_magnitude)?,
        );

        let mut cells_read = 0;
        let chosen = self
            .catalog
            .spatial_tiers()
            .iter()
            .find(|d| d.cell_resolution == resolution && d.reaches(max_magnitude));
        if let Some(descriptor) = chosen {
            let cells = self
                .index
                .cells_covering_polygon(&polygon, descriptor.cell_resolution)?;
            cells_read = cells.len();

            let batches = cells
                .par_iter()
                .map(|&cell| {
                    let key = self.index.cell_to_key(cell);
                    self.catalog
                        .read_by_cell(descriptor.tier, key, max_magnitude)
                })
                .collect::<Result<Vec<_>>>()?;

            for rows in batches {
                accumulator.extend(rows);
            }
        }

        tracing::debug!(
            resolution = resolution.level(),
            cells_read,
            stars = accumulator.stars.len(),
            "viewport query"
        );
        Ok(accumulator.stars)
    }

    /// Finest spatial resolution at which all corners still share one cell
    fn viewport_resolution(&self, corners: &[Point<f64>]) -> Result<Resolution> {
        let spatial = self.catalog.spatial_tiers();
        let Some(first) = spatial.first() else {
            return Ok(Resolution::ZERO);
        };

        let mut chosen = first.cell_resolution;
        for descriptor in spatial.iter().skip(1) {
            if !self.corners_share_cell(corners, descriptor.cell_resolution)? {
                break;
            }
            chosen = descriptor.cell_resolution;
        }
        Ok(chosen)
    }

    fn corners_share_cell(&self, corners: &[Point<f64>], resolution: Resolution) -> Result<bool> {
        let mut shared: Option<CellId> = None;
        for corner in corners {
            let cell = self.index.cell_at(corner.y(), corner.x(), resolution)?;
            match shared {
                Some(existing) if existing != cell => return Ok(false),
                _ => shared = Some(cell),
            }
        }
        Ok(true)
    }

    /// Star with the smallest angular separation from a direction
    ///
    /// Each tier is searched in the cell containing the direction at that tier's resolution
    /// (plus neighbouring cells under [`NearestSearch::CellRing`]). `max_angular_distance` is
    /// in radians. Finding nothing is `Ok(None)`.
    pub fn closest_star(
        &self,
        point: &Vector3<f64>,
        max_magnitude: Option<f64>,
        max_angular_distance: Option<f64>,
    ) -> Result<Option<Star>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("query::closest_star");

        let direction = geometry::normalize(point).ok_or_else(|| {
            CatalogError::InvalidCoordinate("query direction is a zero vector".to_string())
        })?;
        if let Some(distance) = max_angular_distance {
            if !(distance.is_finite() && distance >= 0.0) {
                return Err(CatalogError::InvalidCoordinate(format!(
                    "maximum angular distance must be a non-negative number, got {distance}"
                )));
            }
        }
        let (lat, lon) = geometry::cartesian_to_lat_lon(&direction).ok_or_else(|| {
            CatalogError::InvalidCoordinate("query direction is a zero vector".to_string())
        })?;

        // Cells per resolution, shared by tiers keyed at the same resolution
        let mut probes: SmallVec<[(Resolution, SmallVec<[CellId; 7]>); 4]> = SmallVec::new();
        let mut best: Option<(f64, Star)> = None;
        let mut examined = 0;

        let descriptors: Vec<&TierDescriptor> = self.catalog.descriptors().collect();
        for descriptor in descriptors {
            if !descriptor.reaches(max_magnitude) {
                continue;
            }

            let resolution = descriptor.cell_resolution;
            let cells = match probes.iter().find(|(r, _)| *r == resolution) {
                Some((_, cells)) => cells.clone(),
                None => {
                    let cells = self.probe_cells(lat, lon, resolution)?;
                    probes.push((resolution, cells.clone()));
                    cells
                }
            };

            for cell in cells {
                let key = self.index.cell_to_key(cell);
                for row in self
                    .catalog
                    .read_by_cell(descriptor.tier, key, max_magnitude)?
                {
                    examined += 1;
                    let Some(star) = Star::from_row(&row) else {
                        tracing::warn!(id = %row.id, "skipping malformed star row");
                        continue;
                    };
                    let Some(separation) = geometry::angular_separation(&direction, star.coordinate())
                    else {
                        continue;
                    };
                    if max_angular_distance.is_some_and(|max| separation > max) {
                        continue;
                    }
                    let closer = best.as_ref().is_none_or(|(best_separation, best_star)| {
                        separation < *best_separation
                            || (separation == *best_separation && star.id() < best_star.id())
                    });
                    if closer {
                        best = Some((separation, star));
                    }
                }
            }
        }

        tracing::debug!(
            examined,
            found = best.is_some(),
            "nearest-star query"
        );
        Ok(best.map(|(_, star)| star))
    }

    fn probe_cells(
        &self,
        lat: f64,
        lon: f64,
        resolution: Resolution,
    ) -> Result<SmallVec<[CellId; 7]>> {
        let cell = self.index.cell_at(lat, lon, resolution)?;
        Ok(match self.nearest_search {
            NearestSearch::SameCell => smallvec::smallvec![cell],
            NearestSearch::CellRing(k) => self.index.cell_ring(cell, k)?.into_iter().collect(),
        })
    }

    /// Stars matching a catalog identifier or a proper-name fragment, brightest first
    ///
    /// Matching stars come back with their detail record attached.
    pub fn search_stars(&self, text: &str) -> Result<Vec<Star>> {
        let pattern = SearchPattern::parse(text)?;
        let details = self
            .catalog
            .store()
            .find_details(&pattern.detail_query())?;

        let mut stars = Vec::with_capacity(details.len());
        let mut seen = HashSet::new();
        for detail in details {
            if !seen.insert(detail.id) {
                continue;
            }
            let Some(star) = self.star(detail.id)? else {
                tracing::debug!(id = %detail.id, "search hit has no catalog position");
                continue;
            };
            star.attach_info(Arc::new(StarInfo::from_row(detail)));
            stars.push(star);
        }
        sort_by_magnitude(&mut stars);

        tracing::debug!(?pattern, stars = stars.len(), "text search");
        Ok(stars)
    }

    /// Star by id, looking in the brightest tier first
    pub fn star(&self, id: StarId) -> Result<Option<Star>> {
        Ok(self
            .catalog
            .read_by_id(id)?
            .and_then(|(_, row)| Star::from_row(&row)))
    }

    /// Detail record for a star id
    pub fn star_info(&self, id: StarId) -> Result<Option<Arc<StarInfo>>> {
        Ok(self
            .catalog
            .store()
            .read_detail(id)?
            .map(|row| Arc::new(StarInfo::from_row(row))))
    }

    /// Load and attach the detail record of a star
    ///
    /// Returns whether the star carries a record afterwards.
    pub fn attach_info(&self, star: &Star) -> Result<bool> {
        if star.info().is_some() {
            return Ok(true);
        }
        Ok(match self.star_info(star.id())? {
            Some(info) => star.attach_info(info),
            None => false,
        })
    }
}

fn validate_lat_lon(lat: f64, lon: f64) -> Result<()> {
    if !lat.is_finite() || !lon.is_finite() || lat.abs() > std::f64::consts::FRAC_PI_2 + 1e-9 {
        return Err(CatalogError::InvalidCoordinate(format!(
            "viewport corner out of range: lat={lat}, lon={lon}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::lat_lon_point;
    use crate::spatial::H3Index;
    use crate::store::{
        CatalogStore, ConstellationKey, ConstellationRow, DetailRow, InMemoryStore, RowFilter,
        StoreError, StoreResult, TierStats,
    };
    use crate::synthetic::SyntheticCatalog;
    use crate::Config;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn engine_with(config: &Config) -> QueryEngine {
        let index = Arc::new(H3Index::new());
        let store = SyntheticCatalog::default().build(index.as_ref()).unwrap();
        let catalog = TieredCatalog::open(Arc::new(store), config).unwrap();
        QueryEngine::new(catalog, index, config.nearest_search)
    }

    fn engine() -> QueryEngine {
        engine_with(&Config::default())
    }

    fn ids(stars: &[Star]) -> Vec<StarId> {
        stars.iter().map(Star::id).collect()
    }

    fn assert_sorted_unique(stars: &[Star]) {
        for pair in stars.windows(2) {
            assert!(pair[0].magnitude() <= pair[1].magnitude());
        }
        let unique: HashSet<_> = stars.iter().map(Star::id).collect();
        assert_eq!(unique.len(), stars.len());
    }

    /// Store that can be switched to failing after the catalog was opened
    struct FlakyStore {
        inner: InMemoryStore,
        failing: AtomicBool,
    }

    impl FlakyStore {
        fn check(&self) -> StoreResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("connection lost".into()));
            }
            Ok(())
        }
    }

    impl CatalogStore for FlakyStore {
        fn read_rows(&self, tier: Tier, filter: &RowFilter) -> StoreResult<Vec<StarRow>> {
            self.check()?;
            self.inner.read_rows(tier, filter)
        }
        fn tier_stats(&self, tier: Tier) -> StoreResult<Option<TierStats>> {
            self.check()?;
            self.inner.tier_stats(tier)
        }
        fn read_detail(&self, id: StarId) -> StoreResult<Option<DetailRow>> {
            self.check()?;
            self.inner.read_detail(id)
        }
        fn find_details(&self, query: &DetailQuery) -> StoreResult<Vec<DetailRow>> {
            self.check()?;
            self.inner.find_details(query)
        }
        fn read_constellation(
            &self,
            key: &ConstellationKey,
        ) -> StoreResult<Option<ConstellationRow>> {
            self.check()?;
            self.inner.read_constellation(key)
        }
        fn constellations(&self) -> StoreResult<Vec<ConstellationRow>> {
            self.check()?;
            self.inner.constellations()
        }
        fn border_neighbors(&self, abbr: &str) -> StoreResult<Vec<String>> {
            self.check()?;
            self.inner.border_neighbors(abbr)
        }
        fn constellation_lines(&self, id: u32) -> StoreResult<Vec<(StarId, StarId)>> {
            self.check()?;
            self.inner.constellation_lines(id)
        }
    }

    fn flaky_engine() -> (QueryEngine, Arc<FlakyStore>) {
        let index = Arc::new(H3Index::new());
        let store = Arc::new(FlakyStore {
            inner: SyntheticCatalog::default().build(index.as_ref()).unwrap(),
            failing: AtomicBool::new(false),
        });
        let catalog = TieredCatalog::open(store.clone(), &Config::default()).unwrap();
        (
            QueryEngine::new(catalog, index, NearestSearch::SameCell),
            store,
        )
    }

    fn square(lat: f64, lon: f64, half: f64) -> [Point<f64>; 4] {
        [
            lat_lon_point(lat - half, lon - half),
            lat_lon_point(lat - half, lon + half),
            lat_lon_point(lat + half, lon + half),
            lat_lon_point(lat + half, lon - half),
        ]
    }

    #[test]
    fn test_search_pattern_parse() {
        assert_eq!(SearchPattern::parse("HIP 11767").unwrap(), SearchPattern::Hip(11767));
        assert_eq!(SearchPattern::parse("hd8890").unwrap(), SearchPattern::Hd(8890));
        assert_eq!(SearchPattern::parse("  Hr   424 ").unwrap(), SearchPattern::Hr(424));
        assert_eq!(
            SearchPattern::parse("Hipparcos").unwrap(),
            SearchPattern::Name("Hipparcos".into())
        );
        assert!(matches!(
            SearchPattern::parse("HIP 12x"),
            Err(CatalogError::InvalidSearchPattern(_))
        ));
        assert!(matches!(
            SearchPattern::parse("HD 99999999999"),
            Err(CatalogError::InvalidSearchPattern(_))
        ));
        assert!(matches!(
            SearchPattern::parse("   "),
            Err(CatalogError::InvalidSearchPattern(_))
        ));
    }

    #[test]
    fn test_brightest_scenario() {
        let engine = engine();
        let brightest = engine.brightest_stars().unwrap();
        assert_eq!(brightest.len(), 300);
        assert_sorted_unique(&brightest);
        assert_eq!(brightest.last().unwrap().magnitude(), 3.5);
    }

    #[test]
    fn test_magnitude_query_scenario() {
        let engine = engine();

        let first_magnitude = engine.stars(1.0).unwrap();
        assert!(!first_magnitude.is_empty());
        assert!(first_magnitude.len() < 50);
        assert!(first_magnitude.iter().all(|s| s.magnitude() <= 1.0));
        assert_sorted_unique(&first_magnitude);

        let faint = engine.stars(8.0).unwrap();
        assert!(faint.len() > 300);
        assert!(faint.iter().all(|s| s.magnitude() <= 8.0));
        assert_sorted_unique(&faint);
    }

    #[test]
    fn test_magnitude_query_is_monotonic() {
        let engine = engine();
        let cutoffs = [-1.0, 1.0, 3.5, 4.2, 6.0, 7.3, 9.0, 12.0];
        let mut previous: HashSet<StarId> = HashSet::new();
        for cutoff in cutoffs {
            let stars = engine.stars(cutoff).unwrap();
            assert_sorted_unique(&stars);
            assert!(stars.iter().all(|s| s.magnitude() <= cutoff));

            let current: HashSet<StarId> = stars.iter().map(Star::id).collect();
            assert!(previous.is_subset(&current), "stars({cutoff}) lost stars");
            previous = current;
        }
    }

    #[test]
    fn test_magnitude_query_deduplicates_across_tiers() {
        let engine = engine();
        // The brightest stars are also stored in spatial tier 0
        let stars = engine.stars(5.0).unwrap();
        let brightest = engine.brightest_stars().unwrap();
        let all: HashSet<StarId> = stars.iter().map(Star::id).collect();
        assert!(brightest.iter().all(|s| all.contains(&s.id())));
        assert_sorted_unique(&stars);
    }

    #[test]
    fn test_viewport_rejects_wrong_vertex_count_before_io() {
        let (engine, store) = flaky_engine();
        store.failing.store(true, Ordering::SeqCst);

        let corners = square(0.2, 0.2, 0.1);
        let err = engine.stars_in_viewport(&corners[..3], None).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidVertexCount(3)));

        let five = [corners[0], corners[1], corners[2], corners[3], corners[0]];
        let err = engine.stars_in_viewport(&five, None).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidVertexCount(5)));
    }

    #[test]
    fn test_viewport_rejects_invalid_corner() {
        let engine = engine();
        let mut corners = square(0.2, 0.2, 0.1);
        corners[2] = lat_lon_point(f64::NAN, 0.0);
        assert!(matches!(
            engine.stars_in_viewport(&corners, None),
            Err(CatalogError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn test_viewport_contains_brightest() {
        let engine = engine();
        for (lat, lon, half, max) in [
            (0.0, 0.0, 0.3, None),
            (0.5, 2.0, 0.05, Some(6.0)),
            (-0.7, -1.0, 0.01, Some(2.0)),
            (0.1, std::f64::consts::PI - 0.01, 0.05, None),
        ] {
            let viewport = engine
                .stars_in_viewport(&square(lat, lon, half), max)
                .unwrap();
            let in_viewport: HashSet<StarId> = viewport.iter().map(Star::id).collect();
            assert_eq!(in_viewport.len(), viewport.len(), "duplicates in viewport");

            let brightest = engine.stars_in_tier(Tier::Brightest, max).unwrap();
            assert!(brightest.iter().all(|s| in_viewport.contains(&s.id())));
            if let Some(max) = max {
                assert!(viewport.iter().all(|s| s.magnitude() <= max));
            }
        }
    }

    #[test]
    fn test_viewport_order_is_reproducible() {
        let engine = engine();
        let corners = square(0.3, -0.4, 0.2);
        let first = engine.stars_in_viewport(&corners, None).unwrap();
        let second = engine.stars_in_viewport(&corners, None).unwrap();
        assert_eq!(ids(&first), ids(&second));

        // Brightest tier leads the result
        let brightest = engine.brightest_stars().unwrap();
        assert_eq!(ids(&first[..brightest.len()]), ids(&brightest));
    }

    #[test]
    fn test_small_viewport_reaches_finest_tier() {
        let engine = engine();
        let index = engine.index().clone();

        // A finest-resolution cell concentric with its coarser parent, holding at least one star,
        // so a tiny viewport at its center has all corners in one cell at every resolution
        let (cell, cell_stars) = engine
            .stars_in_tier(Tier::Spatial(2), None)
            .unwrap()
            .into_iter()
            .find_map(|star| {
                let (lat, lon) = geometry::cartesian_to_lat_lon(star.coordinate())?;
                let fine = index.cell_at(lat, lon, Resolution::TWO).ok()?;
                let coarse = index.cell_at(lat, lon, Resolution::ONE).ok()?;
                let center_child = h3o::CellIndex::try_from(coarse.0)
                    .ok()?
                    .center_child(h3o::Resolution::Two)?;
                if u64::from(center_child) != fine.0 {
                    return None;
                }
                let stars = engine
                    .stars_in_cell(index.cell_to_key(fine), Tier::Spatial(2), None)
                    .ok()?;
                Some((fine, stars))
            })
            .unwrap();
        assert!(!cell_stars.is_empty());
        let center = h3o::LatLng::from(h3o::CellIndex::try_from(cell.0).unwrap());

        let corners = square(center.lat_radians(), center.lng_radians(), 0.002);
        let viewport = engine.stars_in_viewport(&corners, None).unwrap();
        let in_viewport: HashSet<StarId> = viewport.iter().map(Star::id).collect();

        assert!(cell_stars.iter().all(|s| in_viewport.contains(&s.id())));
    }

    #[test]
    fn test_small_viewport_reads_only_finest_tier() {
        let engine = engine();
        let index = engine.index().clone();
        let catalog = engine.catalog();

        // Center of a finest-resolution cell that is the center child of its parent
        let center = engine
            .stars_in_tier(Tier::Spatial(2), None)
            .unwrap()
            .into_iter()
            .find_map(|star| {
                let (lat, lon) = geometry::cartesian_to_lat_lon(star.coordinate())?;
                let fine = index.cell_at(lat, lon, Resolution::TWO).ok()?;
                let coarse = index.cell_at(lat, lon, Resolution::ONE).ok()?;
                let center_child = h3o::CellIndex::try_from(coarse.0)
                    .ok()?
                    .center_child(h3o::Resolution::Two)?;
                (u64::from(center_child) == fine.0).then(|| h3o::LatLng::from(center_child))
            })
            .unwrap();

        let corners = square(center.lat_radians(), center.lng_radians(), 0.002);
        let viewport = engine.stars_in_viewport(&corners, None).unwrap();
        let brightest: HashSet<StarId> =
            engine.brightest_stars().unwrap().iter().map(Star::id).collect();

        for star in viewport.iter().filter(|s| !brightest.contains(&s.id())) {
            let (tier, _) = catalog.read_by_id(star.id()).unwrap().unwrap();
            assert_eq!(tier, Tier::Spatial(2), "star {:?} read from {tier}", star.id());
        }
    }

    #[test]
    fn test_large_viewport_stays_on_coarse_tier() {
        let engine = engine();
        let viewport = engine
            .stars_in_viewport(&square(0.0, 0.0, 0.8), None)
            .unwrap();
        assert!(viewport.iter().all(|s| s.magnitude() <= 6.0));
    }

    #[test]
    fn test_viewport_store_failure_aborts() {
        let (engine, store) = flaky_engine();
        store.failing.store(true, Ordering::SeqCst);
        let err = engine
            .stars_in_viewport(&square(0.0, 0.0, 0.2), None)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Store(StoreError::Unavailable(_))));
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_closest_star_scenario() {
        let engine = engine();

        let polaris = engine
            .closest_star(&Vector3::new(0.0, 0.0, 1.0), Some(4.0), None)
            .unwrap()
            .unwrap();
        let info = engine.star_info(polaris.id()).unwrap().unwrap();
        assert_eq!(info.proper_name.as_deref(), Some("Polaris"));

        let south = engine
            .closest_star(&Vector3::new(0.0, 0.0, -1.0), Some(1.0), None)
            .unwrap();
        assert!(south.is_none());
    }

    #[test]
    fn test_closest_star_respects_distance() {
        let engine = engine();
        let pole = Vector3::new(0.0, 0.0, 1.0);

        // Polaris is about 0.74 degrees from the pole
        assert!(
            engine
                .closest_star(&pole, Some(4.0), Some(0.5_f64.to_radians()))
                .unwrap()
                .is_none()
        );

        for direction in [
            Vector3::new(1.0, 0.2, 0.1),
            Vector3::new(-0.3, 0.8, -0.5),
            Vector3::new(0.0, -1.0, 0.05),
        ] {
            let limit = 5.0_f64.to_radians();
            if let Some(star) = engine.closest_star(&direction, None, Some(limit)).unwrap() {
                let separation = geometry::angular_separation(&direction, star.coordinate()).unwrap();
                assert!(separation <= limit);
            }
        }
    }

    #[test]
    fn test_closest_star_unnormalized_input() {
        let engine = engine();
        let a = engine
            .closest_star(&Vector3::new(0.0, 0.0, 1.0), Some(4.0), None)
            .unwrap();
        let b = engine
            .closest_star(&Vector3::new(0.0, 0.0, 250.0), Some(4.0), None)
            .unwrap();
        assert_eq!(a.map(|s| s.id()), b.map(|s| s.id()));
    }

    #[test]
    fn test_closest_star_rejects_bad_input() {
        let engine = engine();
        assert!(matches!(
            engine.closest_star(&Vector3::zeros(), None, None),
            Err(CatalogError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            engine.closest_star(&Vector3::x(), None, Some(-1.0)),
            Err(CatalogError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn test_cell_ring_search_is_never_farther() {
        let same_cell = engine();
        let ring = engine_with(&Config {
            nearest_search: NearestSearch::CellRing(1),
            ..Config::default()
        });

        for direction in [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.2, -0.9, 0.3),
            Vector3::new(-0.6, -0.1, -0.7),
        ] {
            let a = same_cell.closest_star(&direction, Some(7.0), None).unwrap();
            let b = ring.closest_star(&direction, Some(7.0), None).unwrap();
            let sep = |s: &Star| geometry::angular_separation(&direction, s.coordinate()).unwrap();
            match (a, b) {
                (Some(a), Some(b)) => assert!(sep(&b) <= sep(&a) + 1e-12),
                (Some(_), None) => panic!("ring search lost a candidate"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_star_agrees_with_cell_query() {
        let engine = engine();
        let catalog = engine.catalog();

        for id in [1, 12, 1005, 1500, 2500, 5000] {
            let (tier, row) = catalog.read_by_id(StarId(id)).unwrap().unwrap();
            let star = engine.star(StarId(id)).unwrap().unwrap();
            let in_cell = engine
                .stars_in_cell(row.cell.unwrap(), tier, None)
                .unwrap();
            let same = in_cell.iter().find(|s| s.id() == star.id()).unwrap();
            assert_eq!(same.magnitude(), star.magnitude());
            assert_eq!(same.coordinate(), star.coordinate());
        }
    }

    #[test]
    fn test_stars_in_cell_rejects_undefined_tier() {
        let engine = engine();
        let key = CellKey::parse("8001fffffffffff").unwrap();
        let err = engine.stars_in_cell(key, Tier::Spatial(9), None).unwrap_err();
        assert!(matches!(err, CatalogError::UndefinedTier(_)));
    }

    #[test]
    fn test_search_by_identifier() {
        let engine = engine();
        for text in ["HIP 11767", "hd8890", "Hr 424"] {
            let stars = engine.search_stars(text).unwrap();
            assert_eq!(stars.len(), 1, "{text}");
            let info = stars[0].info().unwrap();
            assert_eq!(info.proper_name.as_deref(), Some("Polaris"));
        }
        assert!(engine.search_stars("HIP 1").unwrap().is_empty());
    }

    #[test]
    fn test_search_by_name_sorted_by_magnitude() {
        let engine = engine();
        let stars = engine.search_stars("alni").unwrap();
        let names: Vec<_> = stars
            .iter()
            .map(|s| s.info().unwrap().proper_name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["Alnilam".to_string(), "Alnitak".to_string()]);

        assert!(engine.search_stars("no such star").unwrap().is_empty());
    }

    #[test]
    fn test_search_rejects_malformed_input() {
        let engine = engine();
        assert!(engine.search_stars("").unwrap_err().is_invalid_argument());
        assert!(engine.search_stars("HR 4x4").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_attach_info() {
        let engine = engine();
        let sirius = engine.search_stars("sirius").unwrap().remove(0);
        let bare = engine.star(sirius.id()).unwrap().unwrap();
        assert!(bare.info().is_none());
        assert!(engine.attach_info(&bare).unwrap());
        assert_eq!(bare.info().unwrap().ids.hip, Some(32349));

        // Filler stars have no detail record
        let filler = engine.star(StarId(5000)).unwrap().unwrap();
        assert!(!engine.attach_info(&filler).unwrap());
    }

    #[test]
    fn test_concurrent_queries() {
        let engine = Arc::new(engine());
        let expected = engine.stars(6.0).unwrap().len();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || engine.stars(6.0).unwrap().len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
