//! `planetarium` - query tiered star catalogs from the command line

mod cli;
mod logging;
mod output;

use anyhow::Context;
use clap::Parser;
use cli::{Command, Settings};
use nalgebra::Vector3;
use output::{ConstellationRecord, LineRecord, OutputFormat, StarRecord, print_records};
use planetarium_lib::geometry::lat_lon_point;
use planetarium_lib::sqlite::SqliteStore;
use planetarium_lib::{Config, H3Index, NearestSearch, QueryEngine, SkyCatalog, Star, StarId};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let settings = Settings::parse();
    logging::setup_logging();

    let config = load_config(&settings)?;
    let catalog = open_catalog(&settings, config)?;
    run(&settings, &catalog)
}

/// Default configuration, overlaid with the JSON file and command-line overrides
fn load_config(settings: &Settings) -> anyhow::Result<Config> {
    let mut config = match &settings.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(k) = settings.cell_ring {
        config.nearest_search = NearestSearch::CellRing(k);
    }
    tracing::debug!(?config, "configuration");
    Ok(config)
}

fn open_catalog(settings: &Settings, config: Config) -> anyhow::Result<SkyCatalog> {
    if settings.synthetic {
        tracing::info!("using the synthetic catalog");
        return Ok(SkyCatalog::synthetic(config)?);
    }

    let store = SqliteStore::open(settings.db.as_slice(), &config.brightest_table)
        .context("opening catalog database")?;
    Ok(SkyCatalog::open(
        config,
        Arc::new(store),
        Arc::new(H3Index::new()),
    )?)
}

fn run(settings: &Settings, catalog: &SkyCatalog) -> anyhow::Result<()> {
    let format = settings.format;
    let engine = catalog.engine();
    let constellations = catalog.constellations();

    match &settings.command {
        Command::Info => output::print_info(format, &catalog.info()?)?,
        Command::Brightest => print_stars(engine, format, &engine.brightest_stars()?)?,
        Command::Stars { max_mag } => print_stars(engine, format, &engine.stars(*max_mag)?)?,
        Command::Tier { tier, max_mag } => {
            print_stars(engine, format, &engine.stars_in_tier(*tier, *max_mag)?)?
        }
        Command::Cell { key, tier, max_mag } => {
            print_stars(engine, format, &engine.stars_in_cell(*key, *tier, *max_mag)?)?
        }
        Command::Viewport { corners, max_mag } => {
            let corners: Vec<_> = corners
                .iter()
                .map(|&(lat, lon)| lat_lon_point(lat.to_radians(), lon.to_radians()))
                .collect();
            print_stars(engine, format, &engine.stars_in_viewport(&corners, *max_mag)?)?
        }
        Command::Closest {
            x,
            y,
            z,
            max_mag,
            max_dist_deg,
        } => {
            let point = Vector3::new(*x, *y, *z);
            let star = engine.closest_star(&point, *max_mag, max_dist_deg.map(f64::to_radians))?;
            match star {
                Some(star) => print_stars(engine, format, std::slice::from_ref(&star))?,
                None => eprintln!("No star found."),
            }
        }
        Command::Search { text } => {
            print_stars(engine, format, &engine.search_stars(&text.join(" "))?)?
        }
        Command::Star { id } => match engine.star(StarId(*id))? {
            Some(star) => {
                engine.attach_info(&star)?;
                output::print_star(format, &star)?
            }
            None => anyhow::bail!("star {id} is not in the catalog"),
        },
        Command::Constellation { name } => {
            let constellation = constellations
                .constellation_by_name(name)?
                .with_context(|| format!("unknown constellation {name:?}"))?;
            print_records(format, &[ConstellationRecord::from(&constellation)])?
        }
        Command::Neighbors { abbr } => {
            let records: Vec<ConstellationRecord> = constellations
                .neighbors(abbr)?
                .iter()
                .map(ConstellationRecord::from)
                .collect();
            print_records(format, &records)?
        }
        Command::Lines { name } => {
            let constellation = constellations
                .constellation_by_name(name)?
                .with_context(|| format!("unknown constellation {name:?}"))?;
            let records: Vec<LineRecord> = constellations
                .lines(&constellation)?
                .iter()
                .map(LineRecord::from)
                .collect();
            print_records(format, &records)?
        }
    }
    Ok(())
}

/// Print stars, attaching detail records where the store has them
fn print_stars(engine: &QueryEngine, format: OutputFormat, stars: &[Star]) -> anyhow::Result<()> {
    for star in stars {
        engine.attach_info(star)?;
    }
    let records: Vec<StarRecord> = stars.iter().map(StarRecord::from).collect();
    print_records(format, &records)
}
