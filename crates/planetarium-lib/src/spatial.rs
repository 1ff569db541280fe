//! Hexagonal spatial index capability
//!
//! The catalog never does cell math itself. It consumes the [`SpatialIndex`] trait, which maps
//! geographic points to cells, covers polygons with cells and encodes cells to the stable string
//! keys the store is indexed by. [`H3Index`] is the production adapter, backed by `h3o`.

use crate::geometry;
use geo::Polygon;
use h3o::geom::{ContainmentMode, TilerBuilder};
use std::f64::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Finest resolution the H3 grid defines
const MAX_RESOLUTION: u8 = 15;

/// Maximum length of a cell key (a 64-bit cell id in hexadecimal)
const CELL_KEY_CAPACITY: usize = 16;

/// Errors raised by a spatial index
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpatialError {
    #[error("Invalid resolution: {0}")]
    InvalidResolution(u8),

    #[error("Invalid geographic point: lat={lat}, lon={lon}")]
    InvalidPoint { lat: f64, lon: f64 },

    #[error("Invalid cell key: {0:?}")]
    InvalidCellKey(String),

    #[error("Invalid cell id: {0:#x}")]
    InvalidCell(u64),

    #[error("Polygon coverage failed: {0}")]
    Coverage(String),
}

/// Spatial index resolution level (0 = coarsest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct Resolution(u8);

impl Resolution {
    pub const ZERO: Resolution = Resolution(0);
    pub const ONE: Resolution = Resolution(1);
    pub const TWO: Resolution = Resolution(2);

    /// Create a resolution, rejecting levels the grid does not define
    pub fn new(level: u8) -> Result<Self, SpatialError> {
        if level > MAX_RESOLUTION {
            return Err(SpatialError::InvalidResolution(level));
        }
        Ok(Self(level))
    }

    /// Numeric level
    #[inline]
    pub const fn level(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Resolution {
    type Error = SpatialError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Resolution::new(level)
    }
}

impl From<Resolution> for u8 {
    fn from(resolution: Resolution) -> Self {
        resolution.0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque cell identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u64);

/// Stable string form of a cell, as stored in the catalog
///
/// Keys are lowercase hexadecimal and at most 16 characters long, so they live in a
/// fixed-capacity inline buffer instead of a heap allocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    bytes: [u8; CELL_KEY_CAPACITY],
    len: u8,
}

impl CellKey {
    /// Encode a cell id as its lowercase hexadecimal key (no leading zeros)
    pub fn from_cell(cell: CellId) -> Self {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";

        let mut bytes = [0u8; CELL_KEY_CAPACITY];
        let value = cell.0;
        let len = if value == 0 {
            1
        } else {
            (64 - value.leading_zeros() as usize).div_ceil(4)
        };

        for (i, byte) in bytes[..len].iter_mut().enumerate() {
            let shift = 4 * (len - 1 - i);
            *byte = DIGITS[((value >> shift) & 0xf) as usize];
        }
        if value == 0 {
            bytes[0] = b'0';
        }

        Self {
            bytes,
            len: len as u8,
        }
    }

    /// Parse a stored key, validating length and character set
    pub fn parse(key: &str) -> Result<Self, SpatialError> {
        let trimmed = key.trim();
        if trimmed.is_empty()
            || trimmed.len() > CELL_KEY_CAPACITY
            || !trimmed.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(SpatialError::InvalidCellKey(key.to_string()));
        }

        let mut bytes = [0u8; CELL_KEY_CAPACITY];
        for (dst, src) in bytes.iter_mut().zip(trimmed.bytes()) {
            *dst = src.to_ascii_lowercase();
        }
        Ok(Self {
            bytes,
            len: trimmed.len() as u8,
        })
    }

    /// Decode the key back into a cell id
    pub fn to_cell(&self) -> Result<CellId, SpatialError> {
        u64::from_str_radix(self.as_str(), 16)
            .map(CellId)
            .map_err(|_| SpatialError::InvalidCellKey(self.as_str().to_string()))
    }

    /// Borrow the key as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        // Construction only ever writes ASCII hex digits
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellKey({})", self.as_str())
    }
}

impl FromStr for CellKey {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellKey::parse(s)
    }
}

impl From<CellId> for CellKey {
    fn from(cell: CellId) -> Self {
        CellKey::from_cell(cell)
    }
}

/// Capability for mapping sky positions to hierarchical hexagonal cells
///
/// Points are geographic: latitude and longitude in radians. Implementations must be
/// deterministic, since the catalog was keyed with the same mapping at build time.
pub trait SpatialIndex: Send + Sync {
    /// Cell containing the point at the given resolution
    fn cell_at(&self, lat: f64, lon: f64, resolution: Resolution) -> Result<CellId, SpatialError>;

    /// Cells covering the polygon at the given resolution
    ///
    /// The returned set must contain every cell intersecting the polygon. It may contain extra
    /// cells near the boundary. An implementation that cannot enumerate the full set must fail
    /// rather than return a partial answer.
    fn cells_covering_polygon(
        &self,
        polygon: &Polygon<f64>,
        resolution: Resolution,
    ) -> Result<Vec<CellId>, SpatialError>;

    /// The cell and all cells within `k` grid steps of it
    fn cell_ring(&self, cell: CellId, k: u32) -> Result<Vec<CellId>, SpatialError>;

    /// Stable string form of a cell
    fn cell_to_key(&self, cell: CellId) -> CellKey {
        CellKey::from_cell(cell)
    }

    /// Parse a stable string form back into a cell
    fn cell_from_key(&self, key: &str) -> Result<CellId, SpatialError> {
        CellKey::parse(key)?.to_cell()
    }
}

/// H3 spatial index adapter backed by `h3o`
#[derive(Debug, Clone, Copy, Default)]
pub struct H3Index;

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl H3Index {
    /// Create a new H3 adapter
    pub fn new() -> Self {
        Self
    }

    fn h3_resolution(resolution: Resolution) -> Result<h3o::Resolution, SpatialError> {
        h3o::Resolution::try_from(resolution.level())
            .map_err(|_| SpatialError::InvalidResolution(resolution.level()))
    }

    fn h3_cell(cell: CellId) -> Result<h3o::CellIndex, SpatialError> {
        h3o::CellIndex::try_from(cell.0).map_err(|_| SpatialError::InvalidCell(cell.0))
    }

    fn lat_lng(lat: f64, lon: f64) -> Result<h3o::LatLng, SpatialError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(SpatialError::InvalidPoint { lat, lon });
        }
        let lat = lat.clamp(-FRAC_PI_2, FRAC_PI_2);
        h3o::LatLng::from_radians(lat, geometry::wrap_longitude(lon))
            .map_err(|_| SpatialError::InvalidPoint { lat, lon })
    }
}

impl SpatialIndex for H3Index {
    fn cell_at(&self, lat: f64, lon: f64, resolution: Resolution) -> Result<CellId, SpatialError> {
        let h3_resolution = Self::h3_resolution(resolution)?;
        let cell = Self::lat_lng(lat, lon)?.to_cell(h3_resolution);
        Ok(CellId(u64::from(cell)))
    }

    /// Coverage by h3o's polygon tiler in `Covers` mode
    ///
    /// Vertices are wrapped back into `[-π, π)` so edges crossing the antimeridian span more
    /// than π and the tiler splits them. Cells are returned sorted by id.
    fn cells_covering_polygon(
        &self,
        polygon: &Polygon<f64>,
        resolution: Resolution,
    ) -> Result<Vec<CellId>, SpatialError> {
        let h3_resolution = Self::h3_resolution(resolution)?;
        let mut exterior = polygon.exterior().clone();
        for coord in exterior.coords_mut() {
            if !coord.x.is_finite() || !coord.y.is_finite() {
                return Err(SpatialError::Coverage(
                    "polygon has non-finite vertices".to_string(),
                ));
            }
            coord.x = geometry::wrap_longitude(coord.x);
            coord.y = coord.y.clamp(-FRAC_PI_2, FRAC_PI_2);
        }

        let mut tiler = TilerBuilder::new(h3_resolution)
            .disable_radians_conversion()
            .containment_mode(ContainmentMode::Covers)
            .build();
        tiler
            .add(Polygon::new(exterior, Vec::new()))
            .map_err(|e| SpatialError::Coverage(e.to_string()))?;

        let mut cells: Vec<CellId> = tiler
            .into_coverage()
            .map(|cell| CellId(u64::from(cell)))
            .collect();
        cells.sort_unstable();
        cells.dedup();

        tracing::trace!(
            resolution = resolution.level(),
            cells = cells.len(),
            "covered viewport polygon"
        );

        Ok(cells)
    }

    fn cell_ring(&self, cell: CellId, k: u32) -> Result<Vec<CellId>, SpatialError> {
        let cell = Self::h3_cell(cell)?;
        Ok(cell
            .grid_disk::<Vec<_>>(k)
            .into_iter()
            .map(|c| CellId(u64::from(c)))
            .collect())
    }
}
