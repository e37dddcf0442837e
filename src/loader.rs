use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use csv::{ReaderBuilder, StringRecord};
use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::derive::discover_missed_match_columns;
use crate::error::LoadError;
use crate::record::{
    COL_AGE, COL_DATE_OF_INJURY, COL_DATE_OF_RETURN, COL_FIFA_RATING, COL_INJURY, COL_NAME,
    COL_POSITION, COL_SEASON, COL_TEAM, InjuryRecord, InjuryTable, REQUIRED_COLUMNS,
};

const NA_TOKENS: [&str; 14] = [
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "#NA",
    "<NA>", "#N/A N/A",
];

// Loads are keyed by the identifier the caller passed; the source is static
// for the life of the process, so entries are never evicted.
static LOADED: Lazy<Mutex<HashMap<PathBuf, Arc<InjuryTable>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

struct ColumnIndex {
    name: usize,
    team: usize,
    position: usize,
    age: usize,
    season: Option<usize>,
    fifa_rating: usize,
    injury: usize,
    date_of_injury: usize,
    date_of_return: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String], source_name: &str) -> Result<Self, LoadError> {
        let find = |col: &str| headers.iter().position(|h| h.trim() == col);
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| find(*col).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::unparsable(
                source_name,
                format!("missing required column(s): {}", missing.join(", ")),
            ));
        }
        let required = |col: &str| find(col).unwrap_or_default();
        Ok(Self {
            name: required(COL_NAME),
            team: required(COL_TEAM),
            position: required(COL_POSITION),
            age: required(COL_AGE),
            season: find(COL_SEASON),
            fifa_rating: required(COL_FIFA_RATING),
            injury: required(COL_INJURY),
            date_of_injury: required(COL_DATE_OF_INJURY),
            date_of_return: required(COL_DATE_OF_RETURN),
        })
    }
}

/// Load a table from disk without touching the cache.
pub fn load_records(path: &Path) -> Result<InjuryTable, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::SourceNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let table = load_records_from_reader(file, &path.display().to_string())?;
    info!(
        path = %path.display(),
        records = table.len(),
        missed_match_columns = table.missed_match_columns.len(),
        "loaded injury records"
    );
    Ok(table)
}

/// Load a table once per identifier; later calls share the same table.
/// Failures are returned to the caller and not remembered.
pub fn load_cached(path: &Path) -> Result<Arc<InjuryTable>, LoadError> {
    {
        let guard = LOADED.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(table) = guard.get(path) {
            debug!(path = %path.display(), "injury records served from cache");
            return Ok(Arc::clone(table));
        }
    }

    let table = Arc::new(load_records(path)?);
    let mut guard = LOADED.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let entry = guard
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::clone(&table));
    Ok(Arc::clone(entry))
}

pub fn load_records_from_reader<R: Read>(
    rdr: R,
    source_name: &str,
) -> Result<InjuryTable, LoadError> {
    // Short rows are padded with missing cells; rows longer than the header
    // are rejected below.
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(rdr);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| LoadError::unparsable(source_name, err.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::unparsable(source_name, "no header row"));
    }

    let index = ColumnIndex::resolve(&headers, source_name)?;
    let missed_match_columns = discover_missed_match_columns(&headers);

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|err| LoadError::unparsable(source_name, err.to_string()))?;
        if row.len() > headers.len() {
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            return Err(LoadError::unparsable(
                source_name,
                format!(
                    "line {line} has {} fields, but the header has {}",
                    row.len(),
                    headers.len()
                ),
            ));
        }
        let mut record = InjuryRecord {
            name: text_cell(&row, index.name),
            team_name: text_cell(&row, index.team),
            position: text_cell(&row, index.position),
            age: whole_number_cell(&row, index.age),
            season: index.season.and_then(|idx| text_cell(&row, idx)),
            fifa_rating: rating_cell(&row, index.fifa_rating),
            injury: text_cell(&row, index.injury),
            date_of_injury: text_cell(&row, index.date_of_injury),
            date_of_return: text_cell(&row, index.date_of_return),
            ..Default::default()
        };
        record.missed_match_results = missed_match_columns
            .iter()
            .map(|col| text_cell(&row, col.index))
            .collect();
        records.push(record);
    }

    Ok(InjuryTable {
        headers,
        missed_match_columns,
        records,
    })
}

pub fn is_missing_value(raw: &str) -> bool {
    let cleaned = raw.trim();
    cleaned.is_empty() || NA_TOKENS.contains(&cleaned)
}

fn text_cell(row: &StringRecord, idx: usize) -> Option<String> {
    let raw = row.get(idx)?;
    if is_missing_value(raw) {
        return None;
    }
    Some(raw.trim().to_string())
}

// Ages sometimes come through as "27.0".
fn whole_number_cell(row: &StringRecord, idx: usize) -> Option<u32> {
    let raw = text_cell(row, idx)?;
    if let Ok(value) = raw.parse::<u32>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(value as u32)
}

fn rating_cell(row: &StringRecord, idx: usize) -> Option<f64> {
    let value = text_cell(row, idx)?.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}
