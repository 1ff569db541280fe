//! Deterministic synthetic catalog
//!
//! Builds an [`InMemoryStore`] laid out like a real tiered catalog: a brightest tier made of
//! real first-magnitude stars (including Polaris) topped up with generated stars, plus
//! generated spatial tiers of successively fainter bands. The brightest stars are also stored
//! in the first spatial tier, as the catalog build does. Constellation rows, a sample of
//! borders and a few figure lines are included.
//!
//! Generated stars sit on a Fibonacci sphere that keeps clear of both celestial poles.

use crate::geometry;
use crate::spatial::{Resolution, SpatialError, SpatialIndex};
use crate::star::{SpectralClass, StarId};
use crate::store::{ConstellationRow, DetailRow, InMemoryStore, StarRow};
use crate::tier::Tier;
use nalgebra::Vector3;

/// Generated stars stay below this |z| (about 8 degrees from either pole)
const MAX_FILLER_Z: f64 = 0.99;

/// First id handed to generated stars
const FILLER_ID_START: u64 = 1000;

const SPECTRAL_CYCLE: [char; 7] = ['O', 'B', 'A', 'F', 'G', 'K', 'M'];

/// A real star: (proper name, RA hours, Dec degrees, magnitude, spectral type, HIP, HD, HR,
/// Bayer, Flamsteed, constellation)
type NamedStar = (
    &'static str,
    f64,
    f64,
    f64,
    &'static str,
    i64,
    i64,
    i64,
    &'static str,
    Option<i64>,
    &'static str,
);

#[rustfmt::skip]
const NAMED_STARS: [NamedStar; 28] = [
    ("Sirius", 6.7525, -16.716, -1.44, "A0m...", 32349, 48915, 2491, "Alp", Some(9), "CMa"),
    ("Canopus", 6.3992, -52.696, -0.62, "F0Ib", 30438, 45348, 2326, "Alp", None, "Car"),
    ("Arcturus", 14.2610, 19.182, -0.05, "K1.5IIIFe-0.5", 69673, 124897, 5340, "Alp", Some(16), "Boo"),
    ("Rigil Kentaurus", 14.6600, -60.834, -0.01, "G2V", 71683, 128620, 5459, "Alp-1", None, "Cen"),
    ("Vega", 18.6156, 38.784, 0.03, "A0Vvar", 91262, 172167, 7001, "Alp", Some(3), "Lyr"),
    ("Capella", 5.2782, 45.998, 0.08, "G5IIIe+G0III", 24608, 34029, 1708, "Alp", Some(13), "Aur"),
    ("Rigel", 5.2423, -8.202, 0.18, "B8Ia", 24436, 34085, 1713, "Bet", Some(19), "Ori"),
    ("Procyon", 7.6550, 5.225, 0.40, "F5IV-V", 37279, 61421, 2943, "Alp", Some(10), "CMi"),
    ("Achernar", 1.6286, -57.237, 0.45, "B3Vpe", 7588, 10144, 472, "Alp", None, "Eri"),
    ("Betelgeuse", 5.9195, 7.407, 0.45, "M2Ib", 27989, 39801, 2061, "Alp", Some(58), "Ori"),
    ("Hadar", 14.0637, -60.373, 0.61, "B1III", 68702, 122451, 5267, "Bet", None, "Cen"),
    ("Altair", 19.8464, 8.868, 0.76, "A7IV-V", 97649, 187642, 7557, "Alp", Some(53), "Aql"),
    ("Acrux", 12.4433, -63.099, 0.77, "B0.5IV", 60718, 108248, 4730, "Alp-1", None, "Cru"),
    ("Aldebaran", 4.5987, 16.509, 0.87, "K5III", 21421, 29139, 1457, "Alp", Some(87), "Tau"),
    ("Spica", 13.4199, -11.161, 0.98, "B1V", 65474, 116658, 5056, "Alp", Some(67), "Vir"),
    ("Antares", 16.4901, -26.432, 1.06, "M1Ib+B2.5V", 80763, 148478, 6134, "Alp", Some(21), "Sco"),
    ("Pollux", 7.7553, 28.026, 1.16, "K0IIIvar", 37826, 62509, 2990, "Bet", Some(78), "Gem"),
    ("Fomalhaut", 22.9608, -29.622, 1.17, "A3V", 113368, 216956, 8728, "Alp", Some(24), "PsA"),
    ("Deneb", 20.6905, 45.280, 1.25, "A2Ia", 102098, 197345, 7924, "Alp", Some(50), "Cyg"),
    ("Mimosa", 12.7953, -59.689, 1.25, "B0.5III", 62434, 111123, 4853, "Bet", None, "Cru"),
    ("Bellatrix", 5.4189, 6.350, 1.64, "B2III", 25336, 35468, 1790, "Gam", Some(24), "Ori"),
    ("Alnilam", 5.6036, -1.202, 1.69, "B0Ia", 26311, 37128, 1903, "Eps", Some(46), "Ori"),
    ("Alnitak", 5.6793, -1.943, 1.74, "O9.7Ibe", 26727, 37742, 1948, "Zet", Some(50), "Ori"),
    ("Polaris", 2.5303, 89.264, 1.97, "F7:Ib-IIv SB", 11767, 8890, 424, "Alp", Some(1), "UMi"),
    ("Saiph", 5.7959, -9.670, 2.07, "B0.5Iavar", 27366, 38771, 2004, "Kap", Some(53), "Ori"),
    ("Kochab", 14.8451, 74.156, 2.07, "K4IIIvar", 72607, 131873, 5563, "Bet", Some(7), "UMi"),
    ("Sadr", 20.3705, 40.257, 2.23, "F8Ib", 100453, 194093, 7796, "Gam", Some(37), "Cyg"),
    ("Mintaka", 5.5334, -0.299, 2.25, "O9.5II", 25930, 36486, 1852, "Del", Some(34), "Ori"),
];

/// Constellation display regions: (abbreviation, name, genitive)
const CONSTELLATIONS: [(&str, &str, &str); 89] = [
    ("And", "Andromeda", "Andromedae"),
    ("Ant", "Antlia", "Antliae"),
    ("Aps", "Apus", "Apodis"),
    ("Aqr", "Aquarius", "Aquarii"),
    ("Aql", "Aquila", "Aquilae"),
    ("Ara", "Ara", "Arae"),
    ("Ari", "Aries", "Arietis"),
    ("Aur", "Auriga", "Aurigae"),
    ("Boo", "Boötes", "Boötis"),
    ("Cae", "Caelum", "Caeli"),
    ("Cam", "Camelopardalis", "Camelopardalis"),
    ("Cnc", "Cancer", "Cancri"),
    ("CVn", "Canes Venatici", "Canum Venaticorum"),
    ("CMa", "Canis Major", "Canis Majoris"),
    ("CMi", "Canis Minor", "Canis Minoris"),
    ("Cap", "Capricornus", "Capricorni"),
    ("Car", "Carina", "Carinae"),
    ("Cas", "Cassiopeia", "Cassiopeiae"),
    ("Cen", "Centaurus", "Centauri"),
    ("Cep", "Cepheus", "Cephei"),
    ("Cet", "Cetus", "Ceti"),
    ("Cha", "Chamaeleon", "Chamaeleontis"),
    ("Cir", "Circinus", "Circini"),
    ("Col", "Columba", "Columbae"),
    ("Com", "Coma Berenices", "Comae Berenices"),
    ("CrA", "Corona Australis", "Coronae Australis"),
    ("CrB", "Corona Borealis", "Coronae Borealis"),
    ("Crv", "Corvus", "Corvi"),
    ("Crt", "Crater", "Crateris"),
    ("Cru", "Crux", "Crucis"),
    ("Cyg", "Cygnus", "Cygni"),
    ("Del", "Delphinus", "Delphini"),
    ("Dor", "Dorado", "Doradus"),
    ("Dra", "Draco", "Draconis"),
    ("Equ", "Equuleus", "Equulei"),
    ("Eri", "Eridanus", "Eridani"),
    ("For", "Fornax", "Fornacis"),
    ("Gem", "Gemini", "Geminorum"),
    ("Gru", "Grus", "Gruis"),
    ("Her", "Hercules", "Herculis"),
    ("Hor", "Horologium", "Horologii"),
    ("Hya", "Hydra", "Hydrae"),
    ("Hyi", "Hydrus", "Hydri"),
    ("Ind", "Indus", "Indi"),
    ("Lac", "Lacerta", "Lacertae"),
    ("Leo", "Leo", "Leonis"),
    ("LMi", "Leo Minor", "Leonis Minoris"),
    ("Lep", "Lepus", "Leporis"),
    ("Lib", "Libra", "Librae"),
    ("Lup", "Lupus", "Lupi"),
    ("Lyn", "Lynx", "Lyncis"),
    ("Lyr", "Lyra", "Lyrae"),
    ("Men", "Mensa", "Mensae"),
    ("Mic", "Microscopium", "Microscopii"),
    ("Mon", "Monoceros", "Monocerotis"),
    ("Mus", "Musca", "Muscae"),
    ("Nor", "Norma", "Normae"),
    ("Oct", "Octans", "Octantis"),
    ("Oph", "Ophiuchus", "Ophiuchi"),
    ("Ori", "Orion", "Orionis"),
    ("Pav", "Pavo", "Pavonis"),
    ("Peg", "Pegasus", "Pegasi"),
    ("Per", "Perseus", "Persei"),
    ("Phe", "Phoenix", "Phoenicis"),
    ("Pic", "Pictor", "Pictoris"),
    ("Psc", "Pisces", "Piscium"),
    ("PsA", "Piscis Austrinus", "Piscis Austrini"),
    ("Pup", "Puppis", "Puppis"),
    ("Pyx", "Pyxis", "Pyxidis"),
    ("Ret", "Reticulum", "Reticuli"),
    ("Sge", "Sagitta", "Sagittae"),
    ("Sgr", "Sagittarius", "Sagittarii"),
    ("Sco", "Scorpius", "Scorpii"),
    ("Scl", "Sculptor", "Sculptoris"),
    ("Sct", "Scutum", "Scuti"),
    ("Ser1", "Serpens", "Serpentis"),
    ("Ser2", "Serpens", "Serpentis"),
    ("Sex", "Sextans", "Sextantis"),
    ("Tau", "Taurus", "Tauri"),
    ("Tel", "Telescopium", "Telescopii"),
    ("Tri", "Triangulum", "Trianguli"),
    ("TrA", "Triangulum Australe", "Trianguli Australis"),
    ("Tuc", "Tucana", "Tucanae"),
    ("UMa", "Ursa Major", "Ursae Majoris"),
    ("UMi", "Ursa Minor", "Ursae Minoris"),
    ("Vel", "Vela", "Velorum"),
    ("Vir", "Virgo", "Virginis"),
    ("Vol", "Volans", "Volantis"),
    ("Vul", "Vulpecula", "Vulpeculae"),
];

/// Sample of constellation borders (the combined Serpens region is `Ser`)
const BORDERS: [(&str, &str); 16] = [
    ("Ori", "Tau"),
    ("Ori", "Gem"),
    ("Ori", "Mon"),
    ("Ori", "Eri"),
    ("Ori", "Lep"),
    ("CMa", "Mon"),
    ("CMa", "Lep"),
    ("Lyr", "Cyg"),
    ("Lyr", "Her"),
    ("UMi", "Dra"),
    ("UMi", "Cep"),
    ("UMi", "Cam"),
    ("Ser", "Oph"),
    ("Ser", "Her"),
    ("Ser", "Boo"),
    ("Ser", "Aql"),
];

/// Figure lines by constellation abbreviation and proper names of their endpoints
const LINES: [(&str, &str, &str); 9] = [
    ("Ori", "Betelgeuse", "Bellatrix"),
    ("Ori", "Bellatrix", "Mintaka"),
    ("Ori", "Mintaka", "Alnilam"),
    ("Ori", "Alnilam", "Alnitak"),
    ("Ori", "Alnitak", "Saiph"),
    ("Ori", "Saiph", "Rigel"),
    ("Ori", "Rigel", "Mintaka"),
    ("UMi", "Polaris", "Kochab"),
    ("Cyg", "Deneb", "Sadr"),
];

/// Line endpoint that is missing from the star tables
pub const DANGLING_LINE_STAR: StarId = StarId(999_999);

/// One generated spatial tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticTier {
    pub resolution: u8,
    /// Generated stars in this tier (excluding brightest stars copied into it)
    pub count: usize,
    /// Faintest magnitude; the band starts where the previous tier ended
    pub max_magnitude: f64,
}

/// Synthetic catalog layout
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticCatalog {
    /// Size of the brightest tier (at least the number of named stars)
    pub brightest_count: usize,
    /// Magnitude of the faintest brightest-tier star
    pub brightest_max_magnitude: f64,
    pub spatial: Vec<SyntheticTier>,
}

impl Default for SyntheticCatalog {
    fn default() -> Self {
        Self {
            brightest_count: 300,
            brightest_max_magnitude: 3.5,
            spatial: vec![
                SyntheticTier {
                    resolution: 0,
                    count: 600,
                    max_magnitude: 6.0,
                },
                SyntheticTier {
                    resolution: 1,
                    count: 1500,
                    max_magnitude: 8.0,
                },
                SyntheticTier {
                    resolution: 2,
                    count: 3000,
                    max_magnitude: 10.0,
                },
            ],
        }
    }
}

impl SyntheticCatalog {
    /// Scale every generated tier by a factor (used by benchmarks)
    pub fn scaled(factor: usize) -> Self {
        let mut catalog = Self::default();
        for tier in &mut catalog.spatial {
            tier.count *= factor.max(1);
        }
        catalog
    }

    /// Total number of distinct stars the catalog will hold
    pub fn star_count(&self) -> usize {
        self.brightest_count.max(NAMED_STARS.len())
            + self.spatial.iter().map(|tier| tier.count).sum::<usize>()
    }

    /// Generate the store, keying cells with the given index
    pub fn build(&self, index: &dyn SpatialIndex) -> Result<InMemoryStore, SpatialError> {
        let mut store = InMemoryStore::new();
        store.add_tier(Tier::Brightest);
        for tier in &self.spatial {
            store.add_tier(Tier::Spatial(tier.resolution));
        }
        let first_spatial = self.spatial.first().copied();

        let mut names: Vec<(&'static str, StarId)> = Vec::with_capacity(NAMED_STARS.len());
        for (i, named) in NAMED_STARS.iter().enumerate() {
            let id = StarId(i as u64 + 1);
            let (name, ra, dec, magnitude, spect, hip, hd, hr, bayer, flam, con) = *named;
            let coordinate = geometry::ra_dec_to_cartesian(ra, dec);
            let spectral_class = SpectralClass::from_spectral_type(spect);

            store.insert_row(
                Tier::Brightest,
                star_row(index, id, magnitude, coordinate, spectral_class, Resolution::ZERO)?,
            );
            if let Some(tier) = first_spatial {
                store.insert_row(
                    Tier::Spatial(tier.resolution),
                    star_row(
                        index,
                        id,
                        magnitude,
                        coordinate,
                        spectral_class,
                        Resolution::new(tier.resolution)?,
                    )?,
                );
            }
            store.insert_detail(DetailRow {
                id,
                hip: Some(hip),
                hd: Some(hd),
                hr: Some(hr),
                proper: Some(name.to_string()),
                mag: Some(magnitude),
                spect: Some(spect.to_string()),
                bayer: Some(bayer.to_string()),
                flam,
                con: Some(con.to_string()),
                ..DetailRow::default()
            });
            names.push((name, id));
        }

        let mut next_id = FILLER_ID_START;

        // Brightest-tier filler, spread up to the tier's faintest magnitude
        let brightest_named_max = NAMED_STARS
            .iter()
            .map(|named| named.3)
            .fold(f64::NEG_INFINITY, f64::max)
            .max(1.0);
        let filler = self.brightest_count.saturating_sub(NAMED_STARS.len());
        for i in 0..filler {
            let magnitude = band_magnitude(brightest_named_max, self.brightest_max_magnitude, i, filler);
            let coordinate = fibonacci_direction(i, filler, 0.0);
            let id = StarId(next_id);
            next_id += 1;
            let spectral_class = cycle_class(i);

            store.insert_row(
                Tier::Brightest,
                star_row(index, id, magnitude, coordinate, spectral_class, Resolution::ZERO)?,
            );
            if let Some(tier) = first_spatial {
                store.insert_row(
                    Tier::Spatial(tier.resolution),
                    star_row(
                        index,
                        id,
                        magnitude,
                        coordinate,
                        spectral_class,
                        Resolution::new(tier.resolution)?,
                    )?,
                );
            }
        }

        // Spatial tiers
        let mut band_start = self.brightest_max_magnitude;
        for (t, tier) in self.spatial.iter().enumerate() {
            let resolution = Resolution::new(tier.resolution)?;
            for i in 0..tier.count {
                let magnitude = band_magnitude(band_start, tier.max_magnitude, i, tier.count);
                let coordinate = fibonacci_direction(i, tier.count, 0.7 * (t as f64 + 1.0));
                let id = StarId(next_id);
                next_id += 1;
                store.insert_row(
                    Tier::Spatial(tier.resolution),
                    star_row(index, id, magnitude, coordinate, cycle_class(i + t), resolution)?,
                );
            }
            band_start = tier.max_magnitude;
        }

        // Constellations
        for (i, (abbr, name, genitive)) in CONSTELLATIONS.iter().enumerate() {
            store.insert_constellation(ConstellationRow {
                id: i as u32 + 1,
                name: name.to_string(),
                abbr: abbr.to_string(),
                genitive: genitive.to_string(),
            });
        }
        for (abbr, neighbor) in BORDERS {
            store.insert_border(abbr, neighbor);
        }

        let star_id = |name: &str| names.iter().find(|(n, _)| *n == name).map(|(_, id)| *id);
        for (abbr, from, to) in LINES {
            if let (Some(constellation), Some(from), Some(to)) =
                (constellation_id(abbr), star_id(from), star_id(to))
            {
                store.insert_line(constellation, from, to);
            }
        }
        if let (Some(orion), Some(rigel)) = (constellation_id("Ori"), star_id("Rigel")) {
            store.insert_line(orion, rigel, DANGLING_LINE_STAR);
        }

        tracing::debug!(stars = self.star_count(), "built synthetic catalog");
        Ok(store)
    }
}

/// Id assigned to a constellation display region in the synthetic catalog
pub fn constellation_id(abbr: &str) -> Option<u32> {
    CONSTELLATIONS
        .iter()
        .position(|(a, _, _)| a.eq_ignore_ascii_case(abbr))
        .map(|i| i as u32 + 1)
}

fn star_row(
    index: &dyn SpatialIndex,
    id: StarId,
    magnitude: f64,
    coordinate: Vector3<f64>,
    spectral_class: Option<SpectralClass>,
    resolution: Resolution,
) -> Result<StarRow, SpatialError> {
    let (lat, lon) = geometry::cartesian_to_lat_lon(&coordinate).ok_or(SpatialError::InvalidPoint {
        lat: f64::NAN,
        lon: f64::NAN,
    })?;
    let cell = index.cell_at(lat, lon, resolution)?;
    Ok(StarRow {
        id,
        magnitude,
        coordinate,
        spectral_class,
        cell: Some(index.cell_to_key(cell)),
    })
}

/// The i-th of n magnitudes spread over (start, end], ending exactly at `end`
fn band_magnitude(start: f64, end: f64, i: usize, n: usize) -> f64 {
    start + (end - start) * (i + 1) as f64 / n as f64
}

/// The i-th of n points on a Fibonacci sphere, kept away from the poles
fn fibonacci_direction(i: usize, n: usize, phase: f64) -> Vector3<f64> {
    let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    let z = MAX_FILLER_Z * (1.0 - 2.0 * (i as f64 + 0.5) / n as f64);
    let radius = (1.0 - z * z).sqrt();
    let theta = golden_angle * i as f64 + phase;
    Vector3::new(radius * theta.cos(), radius * theta.sin(), z)
}

fn cycle_class(i: usize) -> Option<SpectralClass> {
    SpectralClass::new(SPECTRAL_CYCLE[i % SPECTRAL_CYCLE.len()])
}
