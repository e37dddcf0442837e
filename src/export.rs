use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::aggregate::{CategoryCount, MatchOutcomeTally, NOT_AVAILABLE};
use crate::pipeline::DashboardView;
use crate::record::InjuryRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub records: usize,
    pub teams: usize,
    pub positions: usize,
    pub histogram_bins: usize,
    pub outcomes: usize,
}

impl ExportReport {
    pub fn describe(&self, path: &Path) -> String {
        format!(
            "Exported {} record(s), {} team(s), {} position(s), {} histogram bin(s), {} outcome(s) to {}",
            self.records,
            self.teams,
            self.positions,
            self.histogram_bins,
            self.outcomes,
            path.display()
        )
    }
}

/// Write the filtered table and every aggregate of `view` to an xlsx
/// workbook, one sheet per output.
pub fn export_dashboard(
    path: &Path,
    view: &DashboardView,
    result_columns: &[String],
) -> Result<ExportReport> {
    let summary = &view.summary;

    let mut header = vec![
        "Name".to_string(),
        "Team Name".to_string(),
        "Position".to_string(),
        "Age".to_string(),
        "Season".to_string(),
        "FIFA rating".to_string(),
        "Injury".to_string(),
        "Date of Injury".to_string(),
        "Date of return".to_string(),
        "Recovery Duration".to_string(),
    ];
    header.extend(result_columns.iter().cloned());
    let mut record_rows = vec![header];
    record_rows.extend(view.records.iter().map(record_row));

    let kpi_rows = vec![
        vec!["Metric".to_string(), "Value".to_string()],
        vec![
            "Total Injuries Recorded".to_string(),
            summary.kpis.total_injuries.to_string(),
        ],
        vec![
            "Avg. Recovery Time".to_string(),
            summary.kpis.mean_recovery_label(),
        ],
        vec![
            "Most Common Injury".to_string(),
            summary.kpis.most_common_injury.clone(),
        ],
        vec![
            "Return Before Injury".to_string(),
            summary.kpis.inverted_date_records.to_string(),
        ],
        vec![
            "Teams Selected".to_string(),
            joined_or_all(view.criteria.teams.iter()),
        ],
        vec![
            "Positions Selected".to_string(),
            joined_or_all(view.criteria.positions.iter()),
        ],
    ];

    let team_rows = count_rows("Team Name", &summary.by_team);
    let position_rows = count_rows("Position", &summary.by_position);

    let mut histogram_rows = vec![vec![
        "From (days)".to_string(),
        "To (days)".to_string(),
        "Players".to_string(),
    ]];
    histogram_rows.extend(summary.recovery_histogram.iter().map(|bin| {
        vec![
            format!("{:.1}", bin.lower),
            format!("{:.1}", bin.upper),
            bin.count.to_string(),
        ]
    }));

    let mut scatter_rows = vec![vec![
        "Name".to_string(),
        "Team Name".to_string(),
        "Age".to_string(),
        "Recovery Duration".to_string(),
        "Injury".to_string(),
        "FIFA rating".to_string(),
    ]];
    scatter_rows.extend(summary.age_vs_recovery.iter().map(|p| {
        vec![
            p.name.clone().unwrap_or_default(),
            p.team_name.clone().unwrap_or_default(),
            opt_to_string(p.age),
            p.recovery_days.to_string(),
            p.injury.clone().unwrap_or_default(),
            opt_to_string(p.fifa_rating),
        ]
    }));

    let outcome_rows = match &summary.match_outcomes {
        MatchOutcomeTally::Counts(counts) => count_rows("Match Result", counts),
        MatchOutcomeTally::NoData => vec![vec![
            "No missed match data available for current selection.".to_string(),
        ]],
    };

    let mut workbook = Workbook::new();
    for (name, rows) in [
        ("Summary", &kpi_rows),
        ("Records", &record_rows),
        ("ByTeam", &team_rows),
        ("ByPosition", &position_rows),
        ("RecoveryDays", &histogram_rows),
        ("AgeVsRecovery", &scatter_rows),
        ("MatchOutcomes", &outcome_rows),
    ] {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        write_rows(sheet, rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        records: view.records.len(),
        teams: summary.by_team.len(),
        positions: summary.by_position.len(),
        histogram_bins: summary.recovery_histogram.len(),
        outcomes: match &summary.match_outcomes {
            MatchOutcomeTally::Counts(counts) => counts.len(),
            MatchOutcomeTally::NoData => 0,
        },
    })
}

fn record_row(record: &InjuryRecord) -> Vec<String> {
    let mut row = vec![
        record.name.clone().unwrap_or_default(),
        record.team_name.clone().unwrap_or_default(),
        record.position.clone().unwrap_or_default(),
        opt_to_string(record.age),
        record.season.clone().unwrap_or_default(),
        opt_to_string(record.fifa_rating),
        record.injury.clone().unwrap_or_default(),
        record.date_of_injury.clone().unwrap_or_default(),
        record.date_of_return.clone().unwrap_or_default(),
        opt_to_string(record.recovery_days()),
    ];
    row.extend(
        record
            .missed_match_results
            .iter()
            .map(|v| v.clone().unwrap_or_default()),
    );
    row
}

fn count_rows(label: &str, counts: &[CategoryCount]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![label.to_string(), "Count".to_string()]];
    rows.extend(
        counts
            .iter()
            .map(|c| vec![c.category.clone(), c.count.to_string()]),
    );
    rows
}

fn joined_or_all<'a>(values: impl Iterator<Item = &'a String>) -> String {
    let joined = values.map(String::as_str).collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "All".to_string()
    } else {
        joined
    }
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
