//! Constellation identity and the fixed table of constellation centers

use nalgebra::Vector3;
use std::fmt;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

/// The 88 IAU constellation abbreviations (Serpens appears once, as `Ser`)
const IAU_ABBREVIATIONS: [&str; 88] = [
    "And", "Ant", "Aps", "Aql", "Aqr", "Ara", "Ari", "Aur", "Boo", "CMa", "CMi", "CVn", "Cae",
    "Cam", "Cap", "Car", "Cas", "Cen", "Cep", "Cet", "Cha", "Cir", "Cnc", "Col", "Com", "CrA",
    "CrB", "Crt", "Cru", "Crv", "Cyg", "Del", "Dor", "Dra", "Equ", "Eri", "For", "Gem", "Gru",
    "Her", "Hor", "Hya", "Hyi", "Ind", "LMi", "Lac", "Leo", "Lep", "Lib", "Lup", "Lyn", "Lyr",
    "Men", "Mic", "Mon", "Mus", "Nor", "Oct", "Oph", "Ori", "Pav", "Peg", "Per", "Phe", "Pic",
    "PsA", "Psc", "Pup", "Pyx", "Ret", "Scl", "Sco", "Sct", "Ser", "Sex", "Sge", "Sgr", "Tau",
    "Tel", "TrA", "Tri", "Tuc", "UMa", "UMi", "Vel", "Vir", "Vol", "Vul",
];

/// Serpens border abbreviation, shared by its two display regions
pub(crate) const SERPENS: &str = "Ser";

/// Serpens Caput and Serpens Cauda display regions
pub(crate) const SERPENS_PARTS: [&str; 2] = ["Ser1", "Ser2"];

/// Unit vector toward the center of each displayed constellation region (equatorial frame)
static CENTERS: [(&str, [f64; 3]); 89] = [
    ("And", [0.776620, 0.167202, 0.607376]),
    ("Ant", [-0.758358, 0.369057, -0.537300]),
    ("Aps", [-0.118741, -0.224263, -0.967268]),
    ("Aqr", [0.885488, -0.425205, -0.187381]),
    ("Aql", [0.422664, -0.904344, 0.059306]),
    ("Ara", [-0.090382, -0.543010, -0.834848]),
    ("Ari", [0.720296, 0.595880, 0.355107]),
    ("Aur", [-0.013618, 0.743020, 0.669131]),
    ("Boo", [-0.648968, -0.557216, 0.518027]),
    ("Cae", [0.263043, 0.742812, -0.615661]),
    ("Cam", [-0.239506, 0.257739, 0.936060]),
    ("Cnc", [-0.601636, 0.723388, 0.338738]),
    ("CVn", [-0.732274, -0.221087, 0.644124]),
    ("CMa", [-0.199748, 0.904741, -0.376224]),
    ("CMi", [-0.416051, 0.902484, 0.111469]),
    ("Cap", [0.681244, -0.663638, -0.309017]),
    ("Car", [-0.292822, 0.342850, -0.892586]),
    ("Cas", [0.438814, 0.157983, 0.884581]),
    ("Cen", [-0.651726, -0.187495, -0.734915]),
    ("Cep", [0.281950, -0.162784, 0.945519]),
    ("Cet", [0.898795, 0.420070, -0.125333]),
    ("Cha", [-0.176469, 0.063011, -0.982287]),
    ("Cir", [-0.354308, -0.283854, -0.891007]),
    ("Col", [0.029980, 0.817600, -0.575005]),
    ("Com", [-0.898873, -0.188603, 0.395546]),
    ("CrA", [0.127616, -0.742679, -0.657375]),
    ("CrB", [-0.451409, -0.711306, 0.538771]),
    ("Crv", [-0.942588, -0.109061, -0.315649]),
    ("Crt", [-0.949504, 0.152936, -0.273959]),
    ("Cru", [-0.493529, -0.058413, -0.867765]),
    ("Cyg", [0.447410, -0.555473, 0.700909]),
    ("Del", [0.634003, -0.746269, 0.202787]),
    ("Dor", [0.100616, 0.498999, -0.860742]),
    ("Dra", [-0.265979, -0.286227, 0.920505]),
    ("Equ", [0.734531, -0.664865, 0.135716]),
    ("Eri", [0.569116, 0.666349, -0.481754]),
    ("For", [0.632956, 0.569917, -0.523986]),
    ("Gem", [-0.255246, 0.887224, 0.384295]),
    ("Gru", [0.634327, -0.270563, -0.724172]),
    ("Her", [-0.141052, -0.875724, 0.461749]),
    ("Hor", [0.390501, 0.452399, -0.801776]),
    ("Hya", [-0.963106, 0.098678, -0.250380]),
    ("Hyi", [0.281165, 0.197606, -0.939094]),
    ("Ind", [0.434939, -0.255688, -0.863396]),
    ("Lac", [0.638962, -0.272540, 0.719340]),
    ("Leo", [-0.915528, 0.332321, 0.226651]),
    ("LMi", [-0.759761, 0.374672, 0.531399]),
    ("Lep", [0.106216, 0.939534, -0.325568]),
    ("Lib", [-0.645722, -0.717147, -0.262189]),
    ("Lup", [-0.488887, -0.548715, -0.678160]),
    ("Lyn", [-0.336262, 0.585961, 0.737277]),
    ("Lyr", [0.176950, -0.782006, 0.597625]),
    ("Men", [0.032739, 0.213949, -0.976296]),
    ("Mic", [0.563878, -0.575814, -0.592013]),
    ("Mon", [-0.273955, 0.961728, 0.005236]),
    ("Mus", [-0.334705, -0.052114, -0.940881]),
    ("Nor", [-0.325976, -0.531945, -0.781520]),
    ("Oct", [0.131091, -0.035126, -0.990748]),
    ("Oph", [-0.157511, -0.977906, -0.137445]),
    ("Ori", [0.109153, 0.988696, 0.102793]),
    ("Pav", [0.167711, -0.374046, -0.912120]),
    ("Peg", [0.888573, -0.314660, 0.333807]),
    ("Per", [0.475892, 0.522998, 0.707107]),
    ("Phe", [0.641807, 0.159426, -0.750111]),
    ("Pic", [0.045117, 0.593109, -0.803857]),
    ("Psc", [0.963888, 0.121767, 0.236838]),
    ("PsA", [0.774942, -0.374622, -0.509041]),
    ("Pup", [-0.274948, 0.809970, -0.518027]),
    ("Pyx", [-0.619509, 0.635944, -0.460200]),
    ("Ret", [0.259014, 0.427682, -0.866025]),
    ("Sge", [0.396088, -0.859181, 0.323917]),
    ("Sgr", [0.249598, -0.842627, -0.477159]),
    ("Sco", [-0.255295, -0.853649, -0.453990]),
    ("Scl", [0.841508, 0.097366, -0.531399]),
    ("Sct", [0.171909, -0.969994, -0.171929]),
    ("Ser1", [-0.540682, -0.823110, 0.173648]),
    ("Ser2", [0.031291, -0.995703, -0.087156]),
    ("Sex", [-0.898251, 0.437136, -0.045363]),
    ("Tau", [0.322583, 0.910946, 0.257133]),
    ("Tel", [0.214724, -0.591555, -0.777146]),
    ("Tri", [0.717506, 0.460631, 0.522499]),
    ("TrA", [-0.200545, -0.364790, -0.909236]),
    ("Tuc", [0.409243, -0.023597, -0.912120]),
    ("UMa", [-0.623075, 0.113794, 0.773840]),
    ("UMi", [-0.150635, -0.150635, 0.977046]),
    ("Vel", [-0.547581, 0.402238, -0.733730]),
    ("Vir", [-0.930134, -0.359842, -0.073238]),
    ("Vol", [-0.156762, 0.307663, -0.938493]),
    ("Vul", [0.501977, -0.759845, 0.413104]),
];

/// Canonical constellation abbreviation
///
/// Parsing is case-insensitive and always yields the canonical spelling (`uma` → `UMa`).
/// Accepted values are the 88 IAU abbreviations plus the Serpens display regions `Ser1`/`Ser2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstellationAbbr(&'static str);

impl ConstellationAbbr {
    /// Parse an abbreviation, returning `None` when it is not a known constellation
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        IAU_ABBREVIATIONS
            .iter()
            .chain(SERPENS_PARTS.iter())
            .find(|abbr| abbr.eq_ignore_ascii_case(text))
            .map(|abbr| ConstellationAbbr(*abbr))
    }

    /// Canonical spelling
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Whether this is one of the 88 IAU abbreviations (as opposed to a Serpens region)
    pub fn is_iau(&self) -> bool {
        IAU_ABBREVIATIONS.contains(&self.0)
    }

    /// Abbreviation used by the border table (`Ser1`/`Ser2` → `Ser`)
    pub fn border_key(&self) -> ConstellationAbbr {
        if SERPENS_PARTS.contains(&self.0) {
            ConstellationAbbr(SERPENS)
        } else {
            *self
        }
    }

    /// Precomputed center direction, if the abbreviation names a displayed region
    pub fn center(&self) -> Option<Vector3<f64>> {
        CENTERS
            .iter()
            .find(|(abbr, _)| *abbr == self.0)
            .map(|(_, [x, y, z])| Vector3::new(*x, *y, *z))
    }
}

impl fmt::Display for ConstellationAbbr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(feature = "serde")]
impl Serialize for ConstellationAbbr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

/// A constellation as listed by the catalog
///
/// Equality and hashing use the abbreviation alone.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Constellation {
    id: u32,
    name: String,
    abbreviation: ConstellationAbbr,
    genitive: String,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_center"))]
    center: Vector3<f64>,
}

impl Constellation {
    /// Build a constellation from catalog text
    ///
    /// Returns `None` when the abbreviation is unknown or has no center entry, which
    /// is the case for the combined `Ser` border abbreviation.
    pub fn new(id: u32, name: &str, abbreviation: &str, genitive: &str) -> Option<Self> {
        let abbreviation = ConstellationAbbr::parse(abbreviation)?;
        let center = abbreviation.center()?;
        Some(Self {
            id,
            name: name.trim().to_string(),
            abbreviation,
            genitive: genitive.trim().to_string(),
            center,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abbreviation(&self) -> ConstellationAbbr {
        self.abbreviation
    }

    pub fn genitive(&self) -> &str {
        &self.genitive
    }

    /// Unit vector toward the constellation center
    pub fn center(&self) -> &Vector3<f64> {
        &self.center
    }
}

impl PartialEq for Constellation {
    fn eq(&self, other: &Self) -> bool {
        self.abbreviation == other.abbreviation
    }
}

impl Eq for Constellation {}

impl Hash for Constellation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.abbreviation.hash(state);
    }
}

#[cfg(feature = "serde")]
fn serialize_center<S: Serializer>(center: &Vector3<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    [center.x, center.y, center.z].serialize(serializer)
}
