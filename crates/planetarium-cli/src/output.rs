//! Table, JSON and CSV rendering of query results

use clap::ValueEnum;
use planetarium_lib::geometry::cartesian_to_lat_lon;
use planetarium_lib::{CatalogInfo, Constellation, ConstellationLine, Star, StarInfo};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// A flat, serializable result row
pub trait Record: Serialize {
    const HEADER: &'static [&'static str];

    fn fields(&self) -> Vec<String>;
}

#[derive(Debug, Serialize)]
pub struct StarRecord {
    pub id: u64,
    pub magnitude: f64,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub spectral_class: Option<char>,
    pub name: Option<String>,
}

impl From<&Star> for StarRecord {
    fn from(star: &Star) -> Self {
        let (dec, ra) = cartesian_to_lat_lon(star.coordinate()).unwrap_or_default();
        Self {
            id: star.id().0,
            magnitude: star.magnitude(),
            ra_deg: ra.to_degrees().rem_euclid(360.0),
            dec_deg: dec.to_degrees(),
            spectral_class: star.spectral_class().map(|class| class.code()),
            name: star.info().map(StarInfo::display_name),
        }
    }
}

impl Record for StarRecord {
    const HEADER: &'static [&'static str] = &["id", "mag", "ra_deg", "dec_deg", "class", "name"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            format!("{:.2}", self.magnitude),
            format!("{:.4}", self.ra_deg),
            format!("{:+.4}", self.dec_deg),
            self.spectral_class.map(String::from).unwrap_or_default(),
            self.name.clone().unwrap_or_default(),
        ]
    }
}

#[derive(Debug, Serialize)]
pub struct ConstellationRecord {
    pub id: u32,
    pub abbreviation: &'static str,
    pub name: String,
    pub genitive: String,
}

impl From<&Constellation> for ConstellationRecord {
    fn from(constellation: &Constellation) -> Self {
        Self {
            id: constellation.id(),
            abbreviation: constellation.abbreviation().as_str(),
            name: constellation.name().to_string(),
            genitive: constellation.genitive().to_string(),
        }
    }
}

impl Record for ConstellationRecord {
    const HEADER: &'static [&'static str] = &["id", "abbr", "name", "genitive"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.abbreviation.to_string(),
            self.name.clone(),
            self.genitive.clone(),
        ]
    }
}

#[derive(Debug, Serialize)]
pub struct LineRecord {
    pub from: u64,
    pub to: u64,
    pub from_mag: f64,
    pub to_mag: f64,
}

impl From<&ConstellationLine> for LineRecord {
    fn from(line: &ConstellationLine) -> Self {
        Self {
            from: line.from.id().0,
            to: line.to.id().0,
            from_mag: line.from.magnitude(),
            to_mag: line.to.magnitude(),
        }
    }
}

impl Record for LineRecord {
    const HEADER: &'static [&'static str] = &["from", "to", "from_mag", "to_mag"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.from.to_string(),
            self.to.to_string(),
            format!("{:.2}", self.from_mag),
            format!("{:.2}", self.to_mag),
        ]
    }
}

/// Print records in the requested format
pub fn print_records<R: Record>(format: OutputFormat, records: &[R]) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print_table(records),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Csv => print_csv(records),
    }
    Ok(())
}

fn print_table<R: Record>(records: &[R]) {
    if records.is_empty() {
        println!("No results.");
        return;
    }

    let rows: Vec<Vec<String>> = records.iter().map(Record::fields).collect();
    let mut widths: Vec<usize> = R::HEADER.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, field) in widths.iter_mut().zip(row) {
            *width = (*width).max(field.chars().count());
        }
    }

    let line = |fields: &[String]| {
        fields
            .iter()
            .zip(&widths)
            .map(|(field, &width)| format!("{field:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = R::HEADER.iter().map(|h| h.to_string()).collect();
    println!("{}", line(header.as_slice()));
    for row in &rows {
        println!("{}", line(row.as_slice()));
    }
    println!("\nTotal results: {}", rows.len());
}

fn print_csv<R: Record>(records: &[R]) {
    println!("{}", R::HEADER.join(","));
    for record in records {
        let fields: Vec<String> = record.fields().iter().map(|f| csv_field(f)).collect();
        println!("{}", fields.join(","));
    }
}

/// Quote a CSV field when it contains a separator, quote or newline
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Print catalog statistics
pub fn print_info(format: OutputFormat, info: &CatalogInfo) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(info)?),
        OutputFormat::Table | OutputFormat::Csv => {
            let separator = if format == OutputFormat::Csv { "," } else { "\t" };
            println!(
                "{}",
                ["tier", "resolution", "count", "min_mag", "max_mag"].join(separator)
            );
            for tier in &info.tiers {
                println!(
                    "{}",
                    [
                        tier.tier.to_string(),
                        tier.resolution.to_string(),
                        tier.count.to_string(),
                        optional_magnitude(tier.min_magnitude),
                        optional_magnitude(tier.max_magnitude),
                    ]
                    .join(separator)
                );
            }
            if format == OutputFormat::Table {
                println!("\nStars: {}", info.star_count);
                println!("Constellations: {}", info.constellation_count);
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct StarDetail<'a> {
    star: StarRecord,
    info: Option<&'a StarInfo>,
}

/// Print one star together with its detail record
pub fn print_star(format: OutputFormat, star: &Star) -> anyhow::Result<()> {
    let record = StarRecord::from(star);
    match format {
        OutputFormat::Json => {
            let detail = StarDetail {
                star: record,
                info: star.info(),
            };
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        OutputFormat::Csv => print_csv(&[record]),
        OutputFormat::Table => {
            for (name, value) in StarRecord::HEADER.iter().zip(record.fields()) {
                println!("{name:>14}: {value}");
            }
            let Some(info) = star.info() else {
                println!("{:>14}: none", "details");
                return Ok(());
            };
            let rows = [
                ("hip", info.ids.hip.map(|n| n.to_string())),
                ("hd", info.ids.hd.map(|n| n.to_string())),
                ("hr", info.ids.hr.map(|n| n.to_string())),
                ("gliese", info.ids.gliese.clone()),
                ("designation", info.designation.map(|d| d.to_string())),
                ("spectral_type", info.spectral_type.clone()),
                ("abs_mag", info.absolute_magnitude.map(|m| format!("{m:.2}"))),
                ("color_index", info.color_index.map(|c| format!("{c:.3}"))),
                ("luminosity", info.luminosity.map(|l| format!("{l:.1}"))),
                ("variable", info.variability.designation.clone()),
            ];
            for (name, value) in rows {
                if let Some(value) = value {
                    println!("{name:>14}: {value}");
                }
            }
        }
    }
    Ok(())
}

fn optional_magnitude(magnitude: Option<f64>) -> String {
    magnitude.map(|m| format!("{m:.2}")).unwrap_or_default()
}
