//! Constellation metadata, border adjacency and figure lines

use crate::constellation::{Constellation, ConstellationAbbr, SERPENS, SERPENS_PARTS};
use crate::star::Star;
use crate::store::{ConstellationKey, ConstellationRow};
use crate::tier::TieredCatalog;
use crate::Result;

/// A figure line between two catalog stars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstellationLine {
    pub from: Star,
    pub to: Star,
}

/// Constellation lookups backed by the catalog store
#[derive(Debug, Clone)]
pub struct ConstellationGraph {
    catalog: TieredCatalog,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ConstellationGraph {
    pub fn new(catalog: TieredCatalog) -> Self {
        Self { catalog }
    }

    fn from_row(row: ConstellationRow) -> Option<Constellation> {
        let constellation = Constellation::new(row.id, &row.name, &row.abbr, &row.genitive);
        if constellation.is_none() {
            tracing::warn!(id = row.id, abbr = %row.abbr, "skipping constellation without a center");
        }
        constellation
    }

    /// Constellation by catalog id
    pub fn constellation(&self, id: u32) -> Result<Option<Constellation>> {
        Ok(self
            .catalog
            .store()
            .read_constellation(&ConstellationKey::Id(id))?
            .and_then(Self::from_row))
    }

    /// Constellation by display name or abbreviation, case-insensitive
    pub fn constellation_by_name(&self, name: &str) -> Result<Option<Constellation>> {
        Ok(self
            .catalog
            .store()
            .read_constellation(&ConstellationKey::Name(name.trim().to_string()))?
            .and_then(Self::from_row))
    }

    /// Every constellation with a known center, ordered by id
    pub fn constellations(&self) -> Result<Vec<Constellation>> {
        Ok(self
            .catalog
            .store()
            .constellations()?
            .into_iter()
            .filter_map(Self::from_row)
            .collect())
    }

    /// Constellations sharing a border with `abbr`
    ///
    /// The two Serpens regions share the border entry `Ser`, so each reports the neighbours
    /// of the whole constellation, and a `Ser` neighbour expands to both regions. Unknown
    /// abbreviations have no neighbours.
    pub fn neighbors(&self, abbr: &str) -> Result<Vec<Constellation>> {
        let Some(abbr) = ConstellationAbbr::parse(abbr) else {
            return Ok(Vec::new());
        };
        let border_key = abbr.border_key();

        let mut expanded: Vec<&str> = Vec::new();
        let raw = self.catalog.store().border_neighbors(border_key.as_str())?;
        for neighbor in &raw {
            if neighbor.eq_ignore_ascii_case(SERPENS) {
                expanded.extend(SERPENS_PARTS);
            } else {
                expanded.push(neighbor);
            }
        }

        let mut neighbors: Vec<Constellation> = Vec::with_capacity(expanded.len());
        for neighbor in expanded {
            if ConstellationAbbr::parse(neighbor).is_some_and(|n| n.border_key() == border_key) {
                continue;
            }
            match self.constellation_by_name(neighbor)? {
                Some(constellation) if !neighbors.contains(&constellation) => {
                    neighbors.push(constellation)
                }
                Some(_) => {}
                None => tracing::warn!(%abbr, neighbor, "border names an unknown constellation"),
            }
        }
        Ok(neighbors)
    }

    /// Figure lines of a constellation, resolved to catalog stars
    ///
    /// Lines with an endpoint missing from the star tables are skipped.
    pub fn lines(&self, constellation: &Constellation) -> Result<Vec<ConstellationLine>> {
        let pairs = self
            .catalog
            .store()
            .constellation_lines(constellation.id())?;

        let mut lines = Vec::with_capacity(pairs.len());
        for (from_id, to_id) in pairs {
            let from = self.catalog.read_by_id(from_id)?;
            let to = self.catalog.read_by_id(to_id)?;
            let endpoints = from
                .and_then(|(_, row)| Star::from_row(&row))
                .zip(to.and_then(|(_, row)| Star::from_row(&row)));
            match endpoints {
                Some((from, to)) => lines.push(ConstellationLine { from, to }),
                None => tracing::warn!(
                    constellation = %constellation.abbreviation(),
                    from = %from_id,
                    to = %to_id,
                    "skipping figure line with a missing star"
                ),
            }
        }
        Ok(lines)
    }
}
