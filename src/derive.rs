use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::record::{DerivedMetrics, InjuryRecord, InjuryTable, MissedMatchColumn};

pub const MISSED_MATCH_TOKEN: &str = "missed_match_Result";

// Source dates look like "Nov 12, 2022"; some exports spell the month out.
const DATE_FORMATS: [&str; 2] = ["%b %d, %Y", "%B %d, %Y"];

pub fn is_missed_match_column(name: &str) -> bool {
    name.contains(MISSED_MATCH_TOKEN)
}

/// Every header carrying a missed-match outcome, in header order.
pub fn discover_missed_match_columns(headers: &[String]) -> Vec<MissedMatchColumn> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, name)| is_missed_match_column(name))
        .map(|(index, name)| MissedMatchColumn {
            index,
            name: name.clone(),
        })
        .collect()
}

pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, fmt) {
            return Some(date);
        }
    }
    None
}

pub fn recovery_days(injured_on: Option<NaiveDate>, returned_on: Option<NaiveDate>) -> Option<i64> {
    let (Some(injured_on), Some(returned_on)) = (injured_on, returned_on) else {
        return None;
    };
    Some((returned_on - injured_on).num_days())
}

pub fn derive_record_metrics(record: &InjuryRecord) -> DerivedMetrics {
    let injured_on = record.date_of_injury.as_deref().and_then(parse_match_date);
    let returned_on = record.date_of_return.as_deref().and_then(parse_match_date);
    DerivedMetrics {
        injured_on,
        returned_on,
        recovery_days: recovery_days(injured_on, returned_on),
    }
}

/// Copy of `table` with per-record metrics filled in. Bad dates become
/// missing metrics, never errors.
pub fn derive_metrics(table: &InjuryTable) -> InjuryTable {
    let mut unparsed = 0usize;
    let records = table
        .records
        .iter()
        .map(|record| {
            let metrics = derive_record_metrics(record);
            if record.date_of_injury.is_some() && metrics.injured_on.is_none() {
                unparsed += 1;
            }
            if record.date_of_return.is_some() && metrics.returned_on.is_none() {
                unparsed += 1;
            }
            InjuryRecord {
                metrics,
                ..record.clone()
            }
        })
        .collect::<Vec<_>>();

    if unparsed > 0 {
        warn!(unparsed, "date values could not be parsed and were treated as missing");
    }
    let inverted = records.iter().filter(|r| r.has_inverted_dates()).count();
    if inverted > 0 {
        warn!(inverted, "records have a return date before the injury date");
    }
    debug!(records = records.len(), "derived recovery metrics");

    InjuryTable {
        headers: table.headers.clone(),
        missed_match_columns: table.missed_match_columns.clone(),
        records,
    }
}

pub fn normalize_outcome(raw: &str) -> Option<String> {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return None;
    }
    Some(cleaned.to_lowercase())
}

/// All missed-match values across `records`, column by column, lowercased.
pub fn flatten_match_outcomes<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a InjuryRecord>,
    I::IntoIter: Clone,
{
    let records = records.into_iter();
    let columns = records
        .clone()
        .map(|r| r.missed_match_results.len())
        .max()
        .unwrap_or(0);

    let mut out = Vec::new();
    for col in 0..columns {
        for record in records.clone() {
            let Some(Some(value)) = record.missed_match_results.get(col) else {
                continue;
            };
            if let Some(outcome) = normalize_outcome(value) {
                out.push(outcome);
            }
        }
    }
    out
}
