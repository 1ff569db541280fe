//! Star entities and their lazily attached detail records

use crate::designation::BayerFlamsteed;
use crate::geometry;
use crate::store::{DetailRow, StarRow};
use nalgebra::Vector3;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Catalog-unique star identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StarId(pub u64);

impl fmt::Display for StarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StarId {
    fn from(id: u64) -> Self {
        StarId(id)
    }
}

/// Single-letter spectral class code (`O`, `B`, `A`, `F`, `G`, `K`, `M`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SpectralClass(char);

impl SpectralClass {
    /// Create from an upper-case ASCII letter
    pub fn new(code: char) -> Option<Self> {
        code.is_ascii_uppercase().then_some(Self(code))
    }

    /// Parse a stored class code, using its first character
    pub fn from_code(code: &str) -> Option<Self> {
        code.trim().chars().next().and_then(SpectralClass::new)
    }

    /// Extract the class from a raw spectral type such as `K3III`, `sdB5` or `dM2e`
    ///
    /// A leading subdwarf (`sd`) or dwarf (`d`) prefix is dropped (case-insensitive, only when
    /// more text follows), then the first upper-case letter is the class.
    pub fn from_spectral_type(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let lower = raw.to_ascii_lowercase();

        let remaining = if lower.starts_with("sd") && raw.len() > 2 {
            raw.get(2..)?
        } else if lower.starts_with('d') && raw.len() > 1 {
            raw.get(1..)?
        } else {
            raw
        };

        remaining.chars().find(char::is_ascii_uppercase).map(Self)
    }

    #[inline]
    pub fn code(self) -> char {
        self.0
    }
}

impl fmt::Display for SpectralClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog star
///
/// Equality and hashing use the id alone. The detail record starts out absent and can be
/// attached exactly once, from any thread.
#[derive(Debug, Clone)]
pub struct Star {
    id: StarId,
    magnitude: f64,
    coordinate: Vector3<f64>,
    spectral_class: Option<SpectralClass>,
    info: OnceLock<Arc<StarInfo>>,
}

impl Star {
    pub fn new(
        id: StarId,
        magnitude: f64,
        coordinate: Vector3<f64>,
        spectral_class: Option<SpectralClass>,
    ) -> Self {
        Self {
            id,
            magnitude,
            coordinate,
            spectral_class,
            info: OnceLock::new(),
        }
    }

    /// Convert a store row, rejecting rows without a usable magnitude or direction
    pub(crate) fn from_row(row: &StarRow) -> Option<Self> {
        if !row.magnitude.is_finite() {
            return None;
        }
        geometry::normalize(&row.coordinate)?;
        Some(Self::new(
            row.id,
            row.magnitude,
            row.coordinate,
            row.spectral_class,
        ))
    }

    #[inline]
    pub fn id(&self) -> StarId {
        self.id
    }

    /// Apparent magnitude (lower is brighter)
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Position in the equatorial frame, as stored (not necessarily unit length)
    #[inline]
    pub fn coordinate(&self) -> &Vector3<f64> {
        &self.coordinate
    }

    /// Unit direction toward the star
    pub fn direction(&self) -> Vector3<f64> {
        geometry::normalize(&self.coordinate).unwrap_or_else(Vector3::z)
    }

    #[inline]
    pub fn spectral_class(&self) -> Option<SpectralClass> {
        self.spectral_class
    }

    /// Attached detail record, if any
    pub fn info(&self) -> Option<&StarInfo> {
        self.info.get().map(Arc::as_ref)
    }

    /// Attach the detail record
    ///
    /// Returns whether the star carries an info record afterwards. A record for a different
    /// star id is never attached; a second attach keeps the first record.
    pub fn attach_info(&self, info: Arc<StarInfo>) -> bool {
        if info.id == self.id {
            let _ = self.info.set(info);
        }
        self.info.get().is_some()
    }
}

impl PartialEq for Star {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Star {}

impl Hash for Star {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Cross-catalog identifiers
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CatalogIds {
    /// Hipparcos catalog number
    pub hip: Option<u32>,
    /// Henry Draper catalog number
    pub hd: Option<u32>,
    /// Harvard Revised (Yale Bright Star) number
    pub hr: Option<u32>,
    /// Gliese catalog designation
    pub gliese: Option<String>,
    /// Raw combined Bayer/Flamsteed text
    pub bayer_flamsteed: Option<String>,
}

/// Variable-star information
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Variability {
    pub designation: Option<String>,
    pub min_magnitude: Option<f64>,
    pub max_magnitude: Option<f64>,
}

impl Variability {
    pub fn is_variable(&self) -> bool {
        self.designation.is_some() || self.min_magnitude.is_some() || self.max_magnitude.is_some()
    }
}

/// Multiple-star system linkage
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MultipleStar {
    /// Component number within the system
    pub component: Option<u32>,
    /// Id of the primary component
    pub component_primary: Option<StarId>,
    /// Catalog id of the system base
    pub base: Option<String>,
}

/// Detail record for a star
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct StarInfo {
    pub id: StarId,
    pub ids: CatalogIds,
    pub proper_name: Option<String>,
    pub magnitude: Option<f64>,
    pub absolute_magnitude: Option<f64>,
    pub luminosity: Option<f64>,
    pub color_index: Option<f64>,
    pub spectral_type: Option<String>,
    pub variability: Variability,
    pub multiple: MultipleStar,
    pub designation: Option<BayerFlamsteed>,
}

impl StarInfo {
    /// Build from a raw detail row
    ///
    /// Blank text becomes `None` and out-of-range catalog numbers are dropped.
    pub fn from_row(row: DetailRow) -> Self {
        let bayer = non_empty(row.bayer);
        let constellation = non_empty(row.con);
        let flamsteed = row.flam.and_then(|n| u16::try_from(n).ok());
        let designation =
            BayerFlamsteed::from_catalog(bayer.as_deref(), flamsteed, constellation.as_deref());

        Self {
            id: row.id,
            ids: CatalogIds {
                hip: catalog_number(row.hip),
                hd: catalog_number(row.hd),
                hr: catalog_number(row.hr),
                gliese: non_empty(row.gl),
                bayer_flamsteed: non_empty(row.bf),
            },
            proper_name: non_empty(row.proper),
            magnitude: finite(row.mag),
            absolute_magnitude: finite(row.absmag),
            luminosity: finite(row.lum),
            color_index: finite(row.ci),
            spectral_type: non_empty(row.spect),
            variability: Variability {
                designation: non_empty(row.var),
                min_magnitude: finite(row.var_min),
                max_magnitude: finite(row.var_max),
            },
            multiple: MultipleStar {
                component: catalog_number(row.comp),
                component_primary: row
                    .comp_primary
                    .and_then(|id| u64::try_from(id).ok())
                    .map(StarId),
                base: non_empty(row.base),
            },
            designation,
        }
    }

    /// Best human-readable label: proper name, designation, then catalog numbers
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.proper_name {
            return name.clone();
        }
        if let Some(designation) = &self.designation {
            return designation.to_string();
        }
        if let Some(hip) = self.ids.hip {
            return format!("HIP {hip}");
        }
        if let Some(hd) = self.ids.hd {
            return format!("HD {hd}");
        }
        if let Some(hr) = self.ids.hr {
            return format!("HR {hr}");
        }
        format!("#{}", self.id)
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn catalog_number(value: Option<i64>) -> Option<u32> {
    value.and_then(|n| u32::try_from(n).ok())
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
