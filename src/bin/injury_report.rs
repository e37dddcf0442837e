use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use injury_impact::aggregate::MatchOutcomeTally;
use injury_impact::config::Config;
use injury_impact::export;
use injury_impact::{FilterCriteria, Pipeline};

#[derive(Debug, Default)]
struct Args {
    data: Option<PathBuf>,
    teams: Vec<String>,
    positions: Vec<String>,
    json: bool,
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "injury_impact=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let args = parse_args(std::env::args().skip(1));
    let data_path = args.data.clone().unwrap_or(config.data_path.clone());

    let pipeline = Pipeline::open(&data_path)
        .with_context(|| format!("unable to load injury data from {}", data_path.display()))?
        .with_histogram_bins(config.histogram_bins);

    let criteria = FilterCriteria::new(args.teams, args.positions);
    let view = pipeline.run(&criteria);

    if let Some(path) = args.export.as_ref() {
        let columns: Vec<String> = pipeline
            .missed_match_columns()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let report = export::export_dashboard(path, &view, &columns)?;
        eprintln!("{}", report.describe(path));
    }

    if args.json {
        let json = serde_json::to_string_pretty(&view.summary).context("serialize summary")?;
        println!("{json}");
        return Ok(());
    }

    let summary = &view.summary;
    println!("Player injuries report");
    println!("Source: {}", data_path.display());
    println!(
        "Records: {} loaded, {} analysis-ready, {} skipped",
        pipeline.source().len(),
        pipeline.cleaned().len(),
        pipeline.dropped()
    );
    println!();
    println!("Total injuries recorded: {}", summary.kpis.total_injuries);
    println!("Avg. recovery time: {}", summary.kpis.mean_recovery_label());
    println!("Most common injury: {}", summary.kpis.most_common_injury);
    if summary.kpis.inverted_date_records > 0 {
        println!(
            "Return date before injury date: {} record(s)",
            summary.kpis.inverted_date_records
        );
    }

    println!();
    println!("Injuries by team:");
    for row in &summary.by_team {
        println!(" - {}: {}", row.category, row.count);
    }
    println!("Injuries by position:");
    for row in &summary.by_position {
        println!(" - {}: {}", row.category, row.count);
    }
    println!("Match outcomes while injured:");
    match &summary.match_outcomes {
        MatchOutcomeTally::NoData => {
            println!(" No missed match data available for current selection.")
        }
        MatchOutcomeTally::Counts(counts) => {
            for row in counts {
                println!(" - {}: {}", row.category, row.count);
            }
        }
    }

    Ok(())
}

fn parse_args(raw: impl Iterator<Item = String>) -> Args {
    let raw: Vec<String> = raw.collect();
    let mut args = Args::default();
    let mut idx = 0;
    while idx < raw.len() {
        let arg = raw[idx].as_str();
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag, Some(value.to_string())),
            None => (arg, None),
        };
        let takes_value = matches!(flag, "--data" | "--team" | "--position" | "--export");
        let value = if takes_value && inline.is_none() {
            idx += 1;
            raw.get(idx).cloned()
        } else {
            inline
        };
        let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        match flag {
            "--data" => args.data = value.map(PathBuf::from).or(args.data),
            "--team" => args.teams.extend(value),
            "--position" => args.positions.extend(value),
            "--export" => args.export = value.map(PathBuf::from).or(args.export),
            "--json" => args.json = true,
            other => eprintln!("ignoring unknown argument: {other}"),
        }
        idx += 1;
    }
    args
}
