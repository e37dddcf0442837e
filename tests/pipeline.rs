use std::path::PathBuf;

use injury_impact::aggregate::{MatchOutcomeTally, NOT_AVAILABLE};
use injury_impact::filter::apply_selection;
use injury_impact::loader::load_records_from_reader;
use injury_impact::{FilterCriteria, Pipeline};

const HEADER: &str = "Name,Team Name,Position,Age,FIFA rating,Injury,Date of Injury,Date of return";

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn pipeline_from(raw: &str) -> Pipeline {
    let table = load_records_from_reader(raw.as_bytes(), "inline.csv").expect("csv should parse");
    Pipeline::from_table(table)
}

fn sample() -> Pipeline {
    Pipeline::open(&fixture_path("player_injuries_sample.csv")).expect("fixture should load")
}

#[test]
fn single_arsenal_record_scenario() {
    let raw = format!("{HEADER}\nAaron Ramsdale,Arsenal,GK,24,82,Knock,\"Jan 1, 2023\",\"Jan 11, 2023\"\n");
    let pipeline = pipeline_from(&raw);
    assert_eq!(pipeline.cleaned().len(), 1);
    assert_eq!(pipeline.cleaned()[0].recovery_days(), Some(10));

    let arsenal = pipeline.run(&FilterCriteria::new(["Arsenal"], Vec::<String>::new()));
    assert_eq!(arsenal.records.len(), 1);

    let chelsea = pipeline.run(&FilterCriteria::new(["Chelsea"], Vec::<String>::new()));
    assert!(chelsea.records.is_empty());
}

#[test]
fn outcome_tally_scenario_is_case_insensitive() {
    let raw = format!(
        "{HEADER},missed_match_Result1,missed_match_Result2\n\
         A,Arsenal,GK,24,82,Knock,\"Jan 1, 2023\",\"Jan 11, 2023\",Win,loss\n\
         B,Arsenal,DF,27,79,Knock,\"Feb 1, 2023\",\"Feb 5, 2023\",Draw,\n"
    );
    let view = pipeline_from(&raw).run(&FilterCriteria::default());
    let MatchOutcomeTally::Counts(counts) = &view.summary.match_outcomes else {
        panic!("expected outcome counts");
    };
    assert_eq!(counts.len(), 3);
    assert_eq!(view.summary.match_outcomes.count_of("win"), 1);
    assert_eq!(view.summary.match_outcomes.count_of("loss"), 1);
    assert_eq!(view.summary.match_outcomes.count_of("draw"), 1);
    assert_eq!(view.summary.match_outcomes.count_of("Win"), 0);
}

#[test]
fn completeness_filter_drops_unusable_records() {
    let pipeline = sample();
    assert_eq!(pipeline.source().len(), 8);
    assert_eq!(pipeline.cleaned().len(), 5);
    assert_eq!(pipeline.dropped(), 3);
    for record in pipeline.cleaned() {
        assert!(record.recovery_days().is_some());
        assert!(record.team_name.is_some());
        assert!(record.position.is_some());
    }
}

#[test]
fn recovery_days_follow_date_difference() {
    let pipeline = sample();
    let days: Vec<(Option<&str>, Option<i64>)> = pipeline
        .cleaned()
        .iter()
        .map(|r| (r.name.as_deref(), r.recovery_days()))
        .collect();
    assert_eq!(
        days,
        vec![
            (Some("Bukayo Saka"), Some(10)),
            (Some("Gabriel Jesus"), Some(84)),
            (Some("Reece James"), Some(77)),
            (Some("Rodri"), Some(11)),
            (Some("Ederson"), Some(-5)),
        ]
    );
}

#[test]
fn empty_selection_is_unrestricted() {
    let pipeline = sample();
    let all = pipeline.run(&FilterCriteria::default());
    assert_eq!(all.records, pipeline.cleaned());

    let only_positions = FilterCriteria::new(Vec::<String>::new(), ["GK", "Right-Back"]);
    let filtered = apply_selection(pipeline.cleaned(), &only_positions);
    assert_eq!(filtered.len(), 2);
}

#[test]
fn team_and_position_filters_compose_with_and() {
    let pipeline = sample();
    let criteria = FilterCriteria::new(["Arsenal", "Chelsea"], ["Right-Back", "GK"]);
    let view = pipeline.run(&criteria);
    let names: Vec<&str> = view.records.iter().filter_map(|r| r.name.as_deref()).collect();
    assert_eq!(names, vec!["Reece James"]);
}

#[test]
fn summary_over_sample() {
    let view = sample().run(&FilterCriteria::default());
    let kpis = &view.summary.kpis;
    assert_eq!(kpis.total_injuries, 5);
    let mean = kpis.mean_recovery_days.expect("mean should exist");
    assert!((mean - 35.4).abs() < 1e-9);
    assert_eq!(kpis.most_common_injury, "Hamstring injury");
    assert_eq!(kpis.inverted_date_records, 1);

    let teams: Vec<(&str, usize)> = view
        .summary
        .by_team
        .iter()
        .map(|c| (c.category.as_str(), c.count))
        .collect();
    assert_eq!(
        teams,
        vec![("Arsenal", 2), ("Manchester City", 2), ("Chelsea", 1)]
    );
    assert_eq!(view.summary.by_position.len(), 5);

    assert_eq!(view.summary.match_outcomes.count_of("win"), 4);
    assert_eq!(view.summary.match_outcomes.count_of("lose"), 2);
    assert_eq!(view.summary.match_outcomes.count_of("draw"), 1);

    let histogram_total: usize = view.summary.recovery_histogram.iter().map(|b| b.count).sum();
    assert_eq!(histogram_total, 5);
    assert_eq!(view.summary.recovery_histogram.len(), 20);

    assert_eq!(view.summary.age_vs_recovery.len(), 5);
    let ederson = view
        .summary
        .age_vs_recovery
        .iter()
        .find(|p| p.name.as_deref() == Some("Ederson"))
        .expect("ederson point");
    assert_eq!(ederson.age, Some(29));
    assert_eq!(ederson.recovery_days, -5);
    assert_eq!(ederson.fifa_rating, Some(88.0));
}

#[test]
fn empty_view_degrades_without_failing() {
    let view = sample().run(&FilterCriteria::new(["Liverpool"], Vec::<String>::new()));
    assert!(view.records.is_empty());
    assert_eq!(view.summary.kpis.total_injuries, 0);
    assert_eq!(view.summary.kpis.mean_recovery_days, None);
    assert_eq!(view.summary.kpis.most_common_injury, NOT_AVAILABLE);
    assert!(view.summary.by_team.is_empty());
    assert!(view.summary.recovery_histogram.is_empty());
    assert!(view.summary.age_vs_recovery.is_empty());
    assert_eq!(view.summary.match_outcomes, MatchOutcomeTally::NoData);
}

#[test]
fn missing_outcomes_do_not_suppress_other_outputs() {
    let view = sample().run(&FilterCriteria::new(Vec::<String>::new(), ["GK"]));
    assert_eq!(view.summary.match_outcomes, MatchOutcomeTally::NoData);
    assert_eq!(view.summary.kpis.total_injuries, 1);
    assert_eq!(view.summary.by_team.len(), 1);
    assert_eq!(view.summary.recovery_histogram.len(), 1);
}

#[test]
fn initial_criteria_picks_first_teams_and_all_positions() {
    let pipeline = sample();
    let criteria = pipeline.initial_criteria(2);
    let teams: Vec<&str> = criteria.teams.iter().map(String::as_str).collect();
    assert_eq!(teams, vec!["Arsenal", "Chelsea"]);
    assert_eq!(criteria.positions.len(), pipeline.position_options().len());
}

#[test]
fn summary_serializes_to_json() {
    let view = sample().run(&FilterCriteria::new(Vec::<String>::new(), ["GK"]));
    let json = serde_json::to_value(&view.summary).expect("summary should serialize");
    assert_eq!(json["kpis"]["total_injuries"], 1);
    assert_eq!(json["match_outcomes"]["status"], "no_data");
}
