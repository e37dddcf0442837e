use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::InjuryRecord;

pub const DEFAULT_TEAM_SELECTION: usize = 3;

/// Drop every record that cannot take part in analysis: no recovery
/// duration, no team or no position.
pub fn retain_complete(records: Vec<InjuryRecord>) -> Vec<InjuryRecord> {
    let before = records.len();
    let kept: Vec<InjuryRecord> = records.into_iter().filter(is_complete).collect();
    debug!(
        kept = kept.len(),
        dropped = before - kept.len(),
        "applied completeness filter"
    );
    kept
}

pub fn is_complete(record: &InjuryRecord) -> bool {
    record.metrics.recovery_days.is_some()
        && record.team_name.is_some()
        && record.position.is_some()
}

/// Team and position selections. An empty set places no restriction on its
/// dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub teams: BTreeSet<String>,
    pub positions: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn new<T, P>(teams: T, positions: P) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            teams: teams.into_iter().map(Into::into).collect(),
            positions: positions.into_iter().map(Into::into).collect(),
        }
    }

    /// First `team_count` teams and every position.
    pub fn initial(teams: &[String], positions: &[String], team_count: usize) -> Self {
        Self {
            teams: teams.iter().take(team_count).cloned().collect(),
            positions: positions.iter().cloned().collect(),
        }
    }

    pub fn matches(&self, record: &InjuryRecord) -> bool {
        dimension_matches(&self.teams, record.team_name.as_deref())
            && dimension_matches(&self.positions, record.position.as_deref())
    }

    pub fn toggle_team(&mut self, team: &str) {
        toggle(&mut self.teams, team);
    }

    pub fn toggle_position(&mut self, position: &str) {
        toggle(&mut self.positions, position);
    }
}

fn dimension_matches(selected: &BTreeSet<String>, value: Option<&str>) -> bool {
    if selected.is_empty() {
        return true;
    }
    value.is_some_and(|v| selected.contains(v))
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

pub fn apply_selection(records: &[InjuryRecord], criteria: &FilterCriteria) -> Vec<InjuryRecord> {
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

pub fn team_options(records: &[InjuryRecord]) -> Vec<String> {
    distinct_sorted(records.iter().filter_map(|r| r.team_name.as_deref()))
}

pub fn position_options(records: &[InjuryRecord]) -> Vec<String> {
    distinct_sorted(records.iter().filter_map(|r| r.position.as_deref()))
}

fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DerivedMetrics;

    fn record(team: Option<&str>, position: Option<&str>, days: Option<i64>) -> InjuryRecord {
        InjuryRecord {
            team_name: team.map(str::to_string),
            position: position.map(str::to_string),
            metrics: DerivedMetrics {
                recovery_days: days,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut criteria = FilterCriteria::default();
        criteria.toggle_team("Arsenal");
        assert!(criteria.teams.contains("Arsenal"));
        criteria.toggle_team("Arsenal");
        assert!(criteria.teams.is_empty());
    }

    #[test]
    fn initial_selection_takes_leading_teams_and_all_positions() {
        let teams: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        let positions: Vec<String> = ["DF", "GK"].iter().map(|s| s.to_string()).collect();
        let criteria = FilterCriteria::initial(&teams, &positions, 3);
        assert_eq!(criteria.teams.len(), 3);
        assert!(!criteria.teams.contains("D"));
        assert_eq!(criteria.positions.len(), 2);
    }

    #[test]
    fn incomplete_records_are_dropped() {
        let kept = retain_complete(vec![
            record(Some("A"), Some("GK"), Some(3)),
            record(None, Some("GK"), Some(3)),
            record(Some("A"), None, Some(3)),
            record(Some("A"), Some("GK"), None),
        ]);
        assert_eq!(kept.len(), 1);
    }
}
