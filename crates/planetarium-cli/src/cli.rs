use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use planetarium_lib::{CellKey, Tier};
use std::path::PathBuf;

/// Command-line settings
#[derive(Parser, Debug)]
#[command(name = "planetarium", version)]
#[command(about = "Query tiered, spatially indexed star catalogs")]
pub struct Settings {
    /// Catalog database file (repeat to attach more files to the first)
    #[arg(long = "db", value_name = "FILE", required_unless_present = "synthetic")]
    pub db: Vec<PathBuf>,

    /// Use the built-in synthetic catalog instead of a database
    #[arg(long, conflicts_with = "db")]
    pub synthetic: bool,

    /// JSON file overriding the default catalog configuration
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Search neighbouring cells up to this many grid steps in nearest-star queries
    #[arg(long, value_name = "K")]
    pub cell_ring: Option<u32>,

    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print tier layout and catalog statistics
    Info,
    /// List the always-loaded brightest tier
    Brightest,
    /// List every star up to a magnitude
    Stars {
        /// Faintest apparent magnitude to include
        #[arg(allow_negative_numbers = true)]
        max_mag: f64,
    },
    /// List the stars of one tier
    Tier {
        /// Tier name: "brightest" or a spatial resolution such as "0" or "s1"
        tier: Tier,
        /// Faintest apparent magnitude to include
        #[arg(long, allow_negative_numbers = true)]
        max_mag: Option<f64>,
    },
    /// List the stars of one spatial cell
    Cell {
        /// Cell key (hexadecimal H3 index)
        key: CellKey,
        /// Tier the cell belongs to
        tier: Tier,
        /// Faintest apparent magnitude to include
        #[arg(long, allow_negative_numbers = true)]
        max_mag: Option<f64>,
    },
    /// List the stars inside a four-corner viewport
    Viewport {
        /// Four corners as "lat,lon" in degrees
        #[arg(num_args = 4, value_name = "LAT,LON", value_parser = parse_corner, allow_hyphen_values = true)]
        corners: Vec<(f64, f64)>,
        /// Faintest apparent magnitude to include
        #[arg(long, allow_negative_numbers = true)]
        max_mag: Option<f64>,
    },
    /// Find the star closest to a direction
    Closest {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        #[arg(allow_negative_numbers = true)]
        z: f64,
        /// Faintest apparent magnitude to consider
        #[arg(long, allow_negative_numbers = true)]
        max_mag: Option<f64>,
        /// Maximum angular distance in degrees
        #[arg(long)]
        max_dist_deg: Option<f64>,
    },
    /// Search by catalog identifier (HIP, HD, HR) or proper name
    Search {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Show one star with its catalog details
    Star { id: u64 },
    /// Show a constellation by name or abbreviation
    Constellation { name: String },
    /// List constellations sharing a border
    Neighbors { abbr: String },
    /// List the figure lines of a constellation
    Lines { name: String },
}

/// Parse a "lat,lon" corner given in degrees
fn parse_corner(text: &str) -> Result<(f64, f64), String> {
    let (lat, lon) = text
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON but got {text:?}"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude {lat:?}: {e}"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude {lon:?}: {e}"))?;
    Ok((lat, lon))
}
