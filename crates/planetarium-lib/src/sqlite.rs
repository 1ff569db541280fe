//! SQLite catalog store
//!
//! Reads catalogs in the layout produced by the catalog build scripts. Star tiers live in
//! `stars_brightest_<N>` and `stars_h3_<r>`, details in `stars_info`, and constellations in
//! `constellations`, `constellation_borders` and `constellation_lines`. The tables may be
//! spread over several files; every file after the first is attached to the same connection.

use crate::spatial::CellKey;
use crate::star::{SpectralClass, StarId};
use crate::store::{
    CatalogStore, ConstellationKey, ConstellationRow, DetailQuery, DetailRow, RowFilter,
    StarRow, StoreError, StoreResult, TierStats,
};
use crate::tier::Tier;
use nalgebra::Vector3;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params, params_from_iter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const DETAIL_COLUMNS: &str = "id, hip, hd, hr, gl, bf, proper, mag, absmag, spect, ci, lum, \
                              var, var_min, var_max, bayer, flam, con, comp, comp_primary, base";

/// Which optional tables the catalog files provide
#[derive(Debug, Clone, Copy, Default)]
struct Tables {
    details: bool,
    constellations: bool,
    borders: bool,
    lines: bool,
}

/// Read-only store over one or more SQLite catalog files
pub struct SqliteStore {
    connection: Mutex<Connection>,
    brightest_table: String,
    tables: Tables,
}

impl SqliteStore {
    /// Open catalog files read-only, attaching every file after the first
    pub fn open<P: AsRef<Path>>(paths: &[P], brightest_table: &str) -> StoreResult<Self> {
        let (main, attached) = paths
            .split_first()
            .ok_or_else(|| StoreError::Unavailable("no catalog files given".to_string()))?;

        let connection = Self::open_file(main.as_ref())?;
        for (i, path) in attached.iter().enumerate() {
            let path = path.as_ref();
            if !path.is_file() {
                return Err(StoreError::Unavailable(format!(
                    "catalog file not found: {}",
                    path.display()
                )));
            }
            connection.execute(
                &format!("ATTACH DATABASE ?1 AS aux{}", i + 1),
                params![path.to_string_lossy()],
            )?;
            tracing::debug!(path = %path.display(), "attached catalog file");
        }

        Self::from_connection(connection, brightest_table)
    }

    fn open_file(path: &Path) -> StoreResult<Connection> {
        if !path.is_file() {
            return Err(StoreError::Unavailable(format!(
                "catalog file not found: {}",
                path.display()
            )));
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(path, flags)?;
        tracing::debug!(path = %path.display(), "opened catalog file");
        Ok(connection)
    }

    /// Wrap an existing connection
    pub fn from_connection(connection: Connection, brightest_table: &str) -> StoreResult<Self> {
        if !is_identifier(brightest_table) {
            return Err(StoreError::Corrupt(format!(
                "invalid brightest table name: {brightest_table:?}"
            )));
        }

        let tables = Tables {
            details: table_exists(&connection, "stars_info")?,
            constellations: table_exists(&connection, "constellations")?,
            borders: table_exists(&connection, "constellation_borders")?,
            lines: table_exists(&connection, "constellation_lines")?,
        };
        tracing::debug!(?tables, "catalog tables");

        Ok(Self {
            connection: Mutex::new(connection),
            brightest_table: brightest_table.to_string(),
            tables,
        })
    }

    fn connection(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| StoreError::Unavailable("catalog connection lock poisoned".to_string()))
    }

    /// Table and cell column for a tier
    fn tier_table(&self, tier: Tier) -> (String, String) {
        match tier {
            Tier::Brightest => (self.brightest_table.clone(), "h3_0".to_string()),
            Tier::Spatial(resolution) => (
                format!("stars_h3_{resolution}"),
                format!("h3_{resolution}"),
            ),
        }
    }
}

impl CatalogStore for SqliteStore {
    fn read_rows(&self, tier: Tier, filter: &RowFilter) -> StoreResult<Vec<StarRow>> {
        let (table, cell_column) = self.tier_table(tier);

        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(id) = filter.id {
            values.push(Value::Integer(star_id_to_sql(id)?));
            conditions.push(format!("id = ?{}", values.len()));
        }
        if let Some(cell) = filter.cell {
            values.push(Value::Text(cell.as_str().to_string()));
            conditions.push(format!("{cell_column} = ?{}", values.len()));
        }
        if let Some(max) = filter.max_magnitude {
            values.push(Value::Real(max));
            conditions.push(format!("mag <= ?{}", values.len()));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT id, mag, x, y, z, spect_class, {cell_column} FROM {table}{where_clause} \
             ORDER BY mag ASC, id ASC"
        );

        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(&sql)?;
        let rows = statement
            .query_map(params_from_iter(values.iter()), star_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().flatten().collect())
    }

    fn tier_stats(&self, tier: Tier) -> StoreResult<Option<TierStats>> {
        let (table, _) = self.tier_table(tier);
        let connection = self.connection()?;
        if !table_exists(&connection, &table)? {
            return Ok(None);
        }

        let (count, min, max): (i64, Option<f64>, Option<f64>) = connection.query_row(
            &format!("SELECT COUNT(*), MIN(mag), MAX(mag) FROM {table}"),
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(Some(TierStats {
            count: usize::try_from(count).unwrap_or(0),
            magnitude_range: min.zip(max),
        }))
    }

    fn read_detail(&self, id: StarId) -> StoreResult<Option<DetailRow>> {
        if !self.tables.details {
            return Ok(None);
        }
        let connection = self.connection()?;
        let mut statement =
            connection.prepare_cached(&format!("SELECT {DETAIL_COLUMNS} FROM stars_info WHERE id = ?1"))?;
        Ok(statement
            .query_row(params![star_id_to_sql(id)?], detail_row)
            .optional()?)
    }

    fn find_details(&self, query: &DetailQuery) -> StoreResult<Vec<DetailRow>> {
        if !self.tables.details {
            return Ok(Vec::new());
        }

        let (condition, value) = match query {
            DetailQuery::Hip(n) => ("hip = ?1", Value::Integer(i64::from(*n))),
            DetailQuery::Hd(n) => ("hd = ?1", Value::Integer(i64::from(*n))),
            DetailQuery::Hr(n) => ("hr = ?1", Value::Integer(i64::from(*n))),
            DetailQuery::ProperName(fragment) => (
                "proper LIKE ?1 ESCAPE '\\'",
                Value::Text(format!("%{}%", escape_like(fragment))),
            ),
        };

        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(&format!(
            "SELECT {DETAIL_COLUMNS} FROM stars_info WHERE {condition} ORDER BY id"
        ))?;
        let rows = statement
            .query_map(params![value], detail_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn read_constellation(&self, key: &ConstellationKey) -> StoreResult<Option<ConstellationRow>> {
        if !self.tables.constellations {
            return Ok(None);
        }

        let connection = self.connection()?;
        let row = match key {
            ConstellationKey::Id(id) => connection
                .query_row(
                    "SELECT id, name, abbr, genitive FROM constellations WHERE id = ?1",
                    params![id],
                    constellation_row,
                )
                .optional()?,
            ConstellationKey::Name(name) => connection
                .query_row(
                    "SELECT id, name, abbr, genitive FROM constellations \
                     WHERE name = ?1 COLLATE NOCASE OR abbr = ?1 COLLATE NOCASE \
                     ORDER BY id LIMIT 1",
                    params![name.trim()],
                    constellation_row,
                )
                .optional()?,
        };
        Ok(row)
    }

    fn constellations(&self) -> StoreResult<Vec<ConstellationRow>> {
        if !self.tables.constellations {
            return Ok(Vec::new());
        }
        let connection = self.connection()?;
        let mut statement = connection
            .prepare_cached("SELECT id, name, abbr, genitive FROM constellations ORDER BY id")?;
        let rows = statement
            .query_map([], constellation_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn border_neighbors(&self, abbr: &str) -> StoreResult<Vec<String>> {
        if !self.tables.borders {
            return Ok(Vec::new());
        }
        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(
            "SELECT abbr, neighbor FROM constellation_borders \
             WHERE abbr = ?1 COLLATE NOCASE OR neighbor = ?1 COLLATE NOCASE ORDER BY rowid",
        )?;
        let pairs = statement
            .query_map(params![abbr], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut neighbors: Vec<String> = Vec::new();
        for (a, b) in pairs {
            let other = if a.eq_ignore_ascii_case(abbr) { b } else { a };
            if !neighbors.contains(&other) {
                neighbors.push(other);
            }
        }
        Ok(neighbors)
    }

    fn constellation_lines(&self, constellation_id: u32) -> StoreResult<Vec<(StarId, StarId)>> {
        if !self.tables.lines {
            return Ok(Vec::new());
        }
        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(
            "SELECT star1, star2 FROM constellation_lines \
             WHERE constellation_id = ?1 ORDER BY rowid",
        )?;
        let pairs = statement
            .query_map(params![constellation_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pairs
            .into_iter()
            .filter_map(|(a, b)| {
                let pair = u64::try_from(a).ok().zip(u64::try_from(b).ok());
                if pair.is_none() {
                    tracing::warn!(constellation_id, a, b, "skipping line with negative star id");
                }
                pair.map(|(a, b)| (StarId(a), StarId(b)))
            })
            .collect())
    }
}

/// Map a tier row, returning `None` for rows that cannot describe a star
fn star_row(row: &Row<'_>) -> rusqlite::Result<Option<StarRow>> {
    let id: i64 = row.get(0)?;
    let Ok(id) = u64::try_from(id) else {
        tracing::warn!(id, "skipping row with negative id");
        return Ok(None);
    };
    let magnitude: Option<f64> = row.get(1)?;
    let coordinate: (Option<f64>, Option<f64>, Option<f64>) = (row.get(2)?, row.get(3)?, row.get(4)?);
    let spectral_class: Option<String> = row.get(5)?;
    let cell: Option<String> = row.get(6)?;

    let (Some(x), Some(y), Some(z)) = coordinate else {
        tracing::warn!(id, "skipping row without coordinates");
        return Ok(None);
    };

    Ok(Some(StarRow {
        id: StarId(id),
        magnitude: magnitude.unwrap_or(f64::NAN),
        coordinate: Vector3::new(x, y, z),
        spectral_class: spectral_class.as_deref().and_then(SpectralClass::from_code),
        cell: cell.as_deref().and_then(|key| CellKey::parse(key).ok()),
    }))
}

fn detail_row(row: &Row<'_>) -> rusqlite::Result<DetailRow> {
    let id: i64 = row.get(0)?;
    Ok(DetailRow {
        id: StarId(u64::try_from(id).unwrap_or_default()),
        hip: row.get(1)?,
        hd: row.get(2)?,
        hr: row.get(3)?,
        gl: row.get(4)?,
        bf: row.get(5)?,
        proper: row.get(6)?,
        mag: row.get(7)?,
        absmag: row.get(8)?,
        spect: row.get(9)?,
        ci: row.get(10)?,
        lum: row.get(11)?,
        var: row.get(12)?,
        var_min: row.get(13)?,
        var_max: row.get(14)?,
        bayer: row.get(15)?,
        flam: row.get(16)?,
        con: row.get(17)?,
        comp: row.get(18)?,
        comp_primary: row.get(19)?,
        base: row.get(20)?,
    })
}

fn constellation_row(row: &Row<'_>) -> rusqlite::Result<ConstellationRow> {
    Ok(ConstellationRow {
        id: row.get(0)?,
        name: row.get(1)?,
        abbr: row.get(2)?,
        genitive: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
    })
}

/// Whether a table exists in the main or any attached database
fn table_exists(connection: &Connection, table: &str) -> StoreResult<bool> {
    let columns: i64 = connection.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1)",
        params![table],
        |row| row.get(0),
    )?;
    Ok(columns > 0)
}

fn star_id_to_sql(id: StarId) -> StoreResult<i64> {
    i64::try_from(id.0).map_err(|_| StoreError::Corrupt(format!("star id out of range: {id}")))
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryEngine;
    use crate::spatial::{H3Index, Resolution, SpatialIndex};
    use crate::tier::TieredCatalog;
    use crate::{Config, NearestSearch, geometry};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// (id, mag, ra hours, dec degrees, spectral class)
    const STARS: [(i64, f64, f64, f64, &str); 5] = [
        (1, 1.97, 2.5303, 89.264, "F"),
        (2, -1.44, 6.7525, -16.716, "A"),
        (3, 0.03, 18.6156, 38.784, "A"),
        (4, 4.5, 2.0, 80.0, "K"),
        (5, 7.5, 3.0, 88.0, "M"),
    ];

    fn create_star_table(connection: &Connection, table: &str, resolution: u8, rows: &[usize]) {
        let index = H3Index::new();
        let column = format!("h3_{resolution}");
        connection
            .execute_batch(&format!(
                "CREATE TABLE {table} (id INTEGER PRIMARY KEY, mag REAL, x REAL, y REAL, z REAL, \
                 spect_class TEXT, {column} TEXT);
                 CREATE INDEX idx_{table}_{column} ON {table}({column});
                 CREATE INDEX idx_{table}_mag ON {table}(mag);"
            ))
            .unwrap();

        for &i in rows {
            let (id, mag, ra, dec, class) = STARS[i];
            // Stored coordinates are in parsecs, not unit vectors
            let v = geometry::ra_dec_to_cartesian(ra, dec) * 12.5;
            let (lat, lon) = geometry::cartesian_to_lat_lon(&v).unwrap();
            let cell = index
                .cell_at(lat, lon, Resolution::new(resolution).unwrap())
                .unwrap();
            connection
                .execute(
                    &format!(
                        "INSERT INTO {table} (id, mag, x, y, z, spect_class, {column}) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                    ),
                    params![id, mag, v.x, v.y, v.z, class, index.cell_to_key(cell).as_str()],
                )
                .unwrap();
        }
    }

    /// Star tiers in one file, details and constellations in another
    fn fixture() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let stars_path = dir.path().join("stars.sqlite3");
        let info_path = dir.path().join("info.sqlite3");

        let stars = Connection::open(&stars_path).unwrap();
        create_star_table(&stars, "stars_brightest_3", 0, &[1, 2, 0]);
        create_star_table(&stars, "stars_h3_0", 0, &[0, 1, 2, 3]);
        create_star_table(&stars, "stars_h3_1", 1, &[4]);
        create_star_table(&stars, "stars_h3_2", 2, &[]);
        stars
            .execute(
                "INSERT INTO stars_h3_1 (id, mag, x, y, z, spect_class, h3_1) \
                 VALUES (6, NULL, NULL, NULL, NULL, NULL, NULL)",
                [],
            )
            .unwrap();

        let info = Connection::open(&info_path).unwrap();
        info.execute_batch(&format!(
            "CREATE TABLE stars_info (id INTEGER PRIMARY KEY, hip INTEGER, hd INTEGER, hr INTEGER, \
             gl TEXT, bf TEXT, proper TEXT, mag REAL, absmag REAL, spect TEXT, ci REAL, lum REAL, \
             var TEXT, var_min REAL, var_max REAL, bayer TEXT, flam INTEGER, con TEXT, comp INTEGER, \
             comp_primary INTEGER, base TEXT);
             INSERT INTO stars_info ({DETAIL_COLUMNS}) VALUES
               (1, 11767, 8890, 424, NULL, '1Alp UMi', 'Polaris', 1.97, -3.64, 'F7:Ib-IIv SB', 0.636,
                2200.0, 'Alp UMi', 1.86, 2.13, 'Alp', 1, 'UMi', 1, 1, NULL),
               (2, 32349, 48915, 2491, 'Gl 244A', '9Alp CMa', 'Sirius', -1.44, 1.45, 'A0m...', 0.009,
                22.8, '', NULL, NULL, 'Alp', 9, 'CMa', 1, 2, NULL),
               (3, 91262, 172167, 7001, NULL, '3Alp Lyr', 'Vega', 0.03, 0.6, 'A0Vvar', -0.001,
                49.9, NULL, NULL, NULL, 'Alp', 3, 'Lyr', 1, 3, NULL),
               (7, NULL, NULL, NULL, NULL, NULL, '50% Star', 9.0, NULL, NULL, NULL,
                NULL, NULL, NULL, NULL, NULL, NULL, NULL, NULL, NULL, NULL);
             CREATE TABLE constellations (id INTEGER PRIMARY KEY, name TEXT, abbr TEXT, genitive TEXT);
             INSERT INTO constellations VALUES
               (1, 'Ursa Minor', 'UMi', 'Ursae Minoris'),
               (2, 'Lyra', 'Lyr', 'Lyrae'),
               (3, 'Draco', 'Dra', 'Draconis');
             CREATE TABLE constellation_borders (abbr TEXT, neighbor TEXT);
             INSERT INTO constellation_borders VALUES ('UMi', 'Dra'), ('Dra', 'Lyr'), ('Lyr', 'Dra');
             CREATE TABLE constellation_lines (constellation_id INTEGER, star1 INTEGER, star2 INTEGER);
             INSERT INTO constellation_lines VALUES (1, 1, 4), (2, 3, 99);"
        ))
        .unwrap();

        (dir, stars_path, info_path)
    }

    fn open() -> (TempDir, SqliteStore) {
        let (dir, stars, info) = fixture();
        let store = SqliteStore::open(&[stars, info], "stars_brightest_3").unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.sqlite3");
        assert!(matches!(
            SqliteStore::open(&[missing], "stars_brightest_300"),
            Err(StoreError::Unavailable(_))
        ));
        let none: [PathBuf; 0] = [];
        assert!(SqliteStore::open(&none, "stars_brightest_300").is_err());
    }

    #[test]
    fn test_rejects_unsafe_table_name() {
        let (_dir, stars, _) = fixture();
        assert!(matches!(
            SqliteStore::open(&[stars], "stars; DROP TABLE x"),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_read_rows_ordered_and_filtered() {
        let (_dir, store) = open();

        let rows = store.read_rows(Tier::Brightest, &RowFilter::all()).unwrap();
        let ids: Vec<u64> = rows.iter().map(|row| row.id.0).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(rows[0].spectral_class.map(SpectralClass::code), Some('A'));
        assert!(rows.iter().all(|row| row.cell.is_some()));

        let rows = store
            .read_rows(Tier::Spatial(0), &RowFilter::all().max_magnitude(Some(1.0)))
            .unwrap();
        assert_eq!(rows.len(), 2);

        let polaris_cell = store
            .read_rows(Tier::Spatial(0), &RowFilter::with_id(StarId(1)))
            .unwrap()[0]
            .cell
            .unwrap();
        let rows = store
            .read_rows(Tier::Spatial(0), &RowFilter::all().in_cell(polaris_cell))
            .unwrap();
        assert!(rows.iter().any(|row| row.id == StarId(1)));
        assert!(rows.iter().all(|row| row.cell == Some(polaris_cell)));
    }

    #[test]
    fn test_rows_without_coordinates_are_skipped() {
        let (_dir, store) = open();
        let rows = store.read_rows(Tier::Spatial(1), &RowFilter::all()).unwrap();
        let ids: Vec<u64> = rows.iter().map(|row| row.id.0).collect();
        assert_eq!(ids, vec![5]);
    }

    #[test]
    fn test_tier_stats() {
        let (_dir, store) = open();
        let stats = store.tier_stats(Tier::Brightest).unwrap().unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.magnitude_range, Some((-1.44, 1.97)));

        let empty = store.tier_stats(Tier::Spatial(2)).unwrap().unwrap();
        assert_eq!(empty.count, 0);
        assert!(empty.magnitude_range.is_none());

        assert!(store.tier_stats(Tier::Spatial(3)).unwrap().is_none());
    }

    #[test]
    fn test_details_from_attached_file() {
        let (_dir, store) = open();
        let sirius = store.read_detail(StarId(2)).unwrap().unwrap();
        assert_eq!(sirius.hip, Some(32349));
        assert_eq!(sirius.proper.as_deref(), Some("Sirius"));
        assert!(store.read_detail(StarId(42)).unwrap().is_none());

        let found = store.find_details(&DetailQuery::Hr(7001)).unwrap();
        assert_eq!(found[0].id, StarId(3));

        let found = store
            .find_details(&DetailQuery::ProperName("IRI".into()))
            .unwrap();
        assert_eq!(found.len(), 1);

        // LIKE wildcards in the fragment match literally
        let found = store
            .find_details(&DetailQuery::ProperName("%".into()))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, StarId(7));
    }

    #[test]
    fn test_without_detail_tables() {
        let (_dir, stars, _) = fixture();
        let store = SqliteStore::open(&[stars], "stars_brightest_3").unwrap();
        assert!(store.read_detail(StarId(1)).unwrap().is_none());
        assert!(store.constellations().unwrap().is_empty());
        assert!(store.border_neighbors("UMi").unwrap().is_empty());
    }

    #[test]
    fn test_constellation_tables() {
        let (_dir, store) = open();
        assert_eq!(store.constellations().unwrap().len(), 3);

        let lyra = store
            .read_constellation(&ConstellationKey::Name("lyr".into()))
            .unwrap()
            .unwrap();
        assert_eq!(lyra.name, "Lyra");
        let by_name = store
            .read_constellation(&ConstellationKey::Name("URSA MINOR".into()))
            .unwrap()
            .unwrap();
        assert_eq!(by_name.id, 1);

        assert_eq!(store.border_neighbors("dra").unwrap(), vec!["UMi", "Lyr"]);
        assert_eq!(
            store.constellation_lines(1).unwrap(),
            vec![(StarId(1), StarId(4))]
        );
    }

    #[test]
    fn test_queries_over_sqlite() {
        let (_dir, store) = open();
        let config = Config {
            brightest_count: 3,
            brightest_table: "stars_brightest_3".into(),
            ..Config::default()
        };
        let catalog = TieredCatalog::open(Arc::new(store), &config).unwrap();
        let engine = QueryEngine::new(catalog, Arc::new(H3Index::new()), NearestSearch::SameCell);

        let stars = engine.stars(2.0).unwrap();
        assert_eq!(stars.len(), 3);
        let stars = engine.stars(10.0).unwrap();
        assert_eq!(stars.len(), 5);

        let closest = engine
            .closest_star(&nalgebra::Vector3::z(), Some(4.0), None)
            .unwrap()
            .unwrap();
        assert_eq!(closest.id(), StarId(1));

        let found = engine.search_stars("HIP 11767").unwrap();
        assert_eq!(found[0].info().unwrap().proper_name.as_deref(), Some("Polaris"));
    }
}
