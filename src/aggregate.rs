use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::derive::flatten_match_outcomes;
use crate::record::InjuryRecord;

pub const NOT_AVAILABLE: &str = "N/A";
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_injuries: usize,
    // None when there is nothing to average.
    pub mean_recovery_days: Option<f64>,
    pub most_common_injury: String,
    pub inverted_date_records: usize,
}

impl Kpis {
    pub fn mean_recovery_label(&self) -> String {
        match self.mean_recovery_days {
            Some(mean) => format!("{mean:.1} Days"),
            None => NOT_AVAILABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeRecoveryPoint {
    pub name: Option<String>,
    pub team_name: Option<String>,
    pub age: Option<u32>,
    pub recovery_days: i64,
    pub injury: Option<String>,
    pub fifa_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "counts", rename_all = "snake_case")]
pub enum MatchOutcomeTally {
    NoData,
    Counts(Vec<CategoryCount>),
}

impl MatchOutcomeTally {
    pub fn count_of(&self, outcome: &str) -> usize {
        match self {
            MatchOutcomeTally::NoData => 0,
            MatchOutcomeTally::Counts(counts) => counts
                .iter()
                .find(|c| c.category == outcome)
                .map(|c| c.count)
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub kpis: Kpis,
    pub by_team: Vec<CategoryCount>,
    pub by_position: Vec<CategoryCount>,
    pub recovery_histogram: Vec<HistogramBin>,
    pub age_vs_recovery: Vec<AgeRecoveryPoint>,
    pub match_outcomes: MatchOutcomeTally,
}

pub fn summarize(records: &[InjuryRecord], histogram_bins: usize) -> DashboardSummary {
    DashboardSummary {
        kpis: kpis(records),
        by_team: count_by(records.iter().map(|r| r.team_name.as_deref())),
        by_position: count_by(records.iter().map(|r| r.position.as_deref())),
        recovery_histogram: recovery_histogram(records, histogram_bins),
        age_vs_recovery: age_vs_recovery(records),
        match_outcomes: match_outcome_tally(records),
    }
}

pub fn kpis(records: &[InjuryRecord]) -> Kpis {
    Kpis {
        total_injuries: records.len(),
        mean_recovery_days: mean_recovery_days(records),
        most_common_injury: most_common_injury(records),
        inverted_date_records: records.iter().filter(|r| r.has_inverted_dates()).count(),
    }
}

pub fn mean_recovery_days(records: &[InjuryRecord]) -> Option<f64> {
    let days: Vec<i64> = records.iter().filter_map(InjuryRecord::recovery_days).collect();
    if days.is_empty() {
        return None;
    }
    let total: i64 = days.iter().sum();
    Some(total as f64 / days.len() as f64)
}

/// Mode of the injury label; ties go to the alphabetically first label.
pub fn most_common_injury(records: &[InjuryRecord]) -> String {
    count_by(records.iter().map(|r| r.injury.as_deref()))
        .into_iter()
        .next()
        .map(|c| c.category)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Frequency table, most frequent first, ties by category.
pub fn count_by<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut out: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    out
}

pub fn match_outcome_tally(records: &[InjuryRecord]) -> MatchOutcomeTally {
    let outcomes = flatten_match_outcomes(records);
    if outcomes.is_empty() {
        return MatchOutcomeTally::NoData;
    }
    MatchOutcomeTally::Counts(count_by(outcomes.iter().map(|o| Some(o.as_str()))))
}

pub fn recovery_histogram(records: &[InjuryRecord], bins: usize) -> Vec<HistogramBin> {
    let days: Vec<i64> = records.iter().filter_map(InjuryRecord::recovery_days).collect();
    let (Some(&min), Some(&max)) = (days.iter().min(), days.iter().max()) else {
        return Vec::new();
    };
    if min == max {
        return vec![HistogramBin {
            lower: min as f64,
            upper: max as f64,
            count: days.len(),
        }];
    }

    let bins = bins.max(1);
    let lo = min as f64;
    let width = (max - min) as f64 / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: lo + width * i as f64,
            upper: lo + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for d in days {
        // The top edge belongs to the last bin.
        let idx = (((d - min) as f64 / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

pub fn age_vs_recovery(records: &[InjuryRecord]) -> Vec<AgeRecoveryPoint> {
    records
        .iter()
        .filter_map(|r| {
            Some(AgeRecoveryPoint {
                name: r.name.clone(),
                team_name: r.team_name.clone(),
                age: r.age,
                recovery_days: r.recovery_days()?,
                injury: r.injury.clone(),
                fifa_rating: r.fifa_rating,
            })
        })
        .collect()
}
