use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const COL_NAME: &str = "Name";
pub const COL_TEAM: &str = "Team Name";
pub const COL_POSITION: &str = "Position";
pub const COL_AGE: &str = "Age";
pub const COL_SEASON: &str = "Season";
pub const COL_FIFA_RATING: &str = "FIFA rating";
pub const COL_INJURY: &str = "Injury";
pub const COL_DATE_OF_INJURY: &str = "Date of Injury";
pub const COL_DATE_OF_RETURN: &str = "Date of return";

pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_NAME,
    COL_TEAM,
    COL_POSITION,
    COL_AGE,
    COL_FIFA_RATING,
    COL_INJURY,
    COL_DATE_OF_INJURY,
    COL_DATE_OF_RETURN,
];

/// A header column whose values record the outcome of one missed match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedMatchColumn {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub injured_on: Option<NaiveDate>,
    pub returned_on: Option<NaiveDate>,
    pub recovery_days: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InjuryRecord {
    pub name: Option<String>,
    pub team_name: Option<String>,
    pub position: Option<String>,
    pub age: Option<u32>,
    pub season: Option<String>,
    pub fifa_rating: Option<f64>,
    pub injury: Option<String>,
    pub date_of_injury: Option<String>,
    pub date_of_return: Option<String>,
    // Aligned with `InjuryTable::missed_match_columns`.
    pub missed_match_results: Vec<Option<String>>,
    #[serde(default)]
    pub metrics: DerivedMetrics,
}

impl InjuryRecord {
    pub fn recovery_days(&self) -> Option<i64> {
        self.metrics.recovery_days
    }

    pub fn has_inverted_dates(&self) -> bool {
        self.metrics.recovery_days.is_some_and(|days| days < 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InjuryTable {
    pub headers: Vec<String>,
    pub missed_match_columns: Vec<MissedMatchColumn>,
    pub records: Vec<InjuryRecord>,
}

impl InjuryTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
