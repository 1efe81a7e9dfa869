use agent_scorecard::config::ScoringConfig;
use agent_scorecard::workflows::performance::{
    render_quality_report, write_cleaned, write_semantic, EfficiencyCategory, Field,
    PerformancePipeline, PerformanceTier, SemanticColumn, MIN_DAYS_WORKED,
};
use chrono::{NaiveDate, NaiveDateTime};

const EXPORT: &[u8] = include_bytes!("fixtures/performance_export.csv");

fn processed_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, 3)
        .and_then(|date| date.and_hms_opt(14, 5, 0))
        .expect("valid timestamp")
}

/// Eight agents: seven with twelve dated days whose metrics improve with their index,
/// and a ninth-day agent with the best numbers of all.
fn ranking_export() -> String {
    let names = [
        "ADAMS,AMY", "BROWN,BEN", "CLARK,CAL", "DAVIS,DEE", "EVANS,ELI", "FOSTER,FAY",
        "GARCIA,GUS", "HILL,HAL",
    ];
    let mut csv = String::from(
        "Manager Hierarchy - Name,Date - Year,Date - Month,Date - Day,Talk,Hold,ACW,AHT,\
         Interaction Count,Resolution Rate,Conformance,Talk Available %\n",
    );
    for (index, name) in names.iter().enumerate() {
        let days = if index == 7 { MIN_DAYS_WORKED - 1 } else { 12 };
        let quality = 70 + 3 * index;
        let aht = 360 - 10 * index;
        for day in 1..=days {
            csv.push_str(&format!(
                "\"{name}\",2025,March,{day},250,5,30,{aht},40,{quality}%,{quality}%,{quality}%\n"
            ));
        }
    }
    csv
}

#[test]
fn cleaning_retains_rows_and_reports_quality() {
    let outcome = PerformancePipeline::default()
        .clean_reader(EXPORT)
        .expect("export cleans");
    let quality = &outcome.quality;

    assert_eq!(quality.rows_in, 6);
    assert_eq!(quality.rows_out, 6);
    assert_eq!(outcome.dataset.events.len(), 6);
    assert_eq!(quality.invalid_dates, 1);
    assert_eq!(quality.unparsed_names, 1);
    assert_eq!(quality.duplicate_rows, 1);
    assert!(quality
        .percentage_columns
        .contains(&"talk_available_%".to_string()));
    assert!(quality
        .missing_values_after
        .iter()
        .all(|entry| !["talk", "hold", "acw", "aht"].contains(&entry.column.as_str())));

    let smith = &outcome.dataset.events[0];
    assert_eq!(smith.name.last.as_deref(), Some("SMITH"));
    assert_eq!(smith.name.middle_initial.as_deref(), Some("A"));
    assert_eq!(smith.date, NaiveDate::from_ymd_opt(2025, 1, 6));
    assert_eq!(smith.resolution_rate, Some(85.0));
    let score = smith.performance_score.expect("score derived");
    assert!((score - 87.4).abs() < 1e-9);

    let invalid = &outcome.dataset.events[3];
    assert_eq!(invalid.date, None);
    assert_eq!(invalid.agent_name.as_deref(), Some("DOE,JANE"));

    let nguyen = &outcome.dataset.events[4];
    assert!(nguyen.name.is_empty());
    assert_eq!(nguyen.talk, Some(0.0));
    assert_eq!(nguyen.calls_per_hour, Some(0.0));
    assert_eq!(nguyen.performance_score, None);
    assert_eq!(nguyen.goals.all_met(), Some(true));

    assert!(outcome.dataset.columns.contains(Field::CallsPerHour));
    assert_eq!(outcome.dataset.extra_labels, vec!["notes".to_string()]);

    let text = render_quality_report(quality);
    assert!(text.contains("duplicate_rows: 1"));
    let json = serde_json::to_value(quality).expect("quality report serializes");
    assert_eq!(json["rows_in"], 6);
}

#[test]
fn cleaned_export_is_readable_csv() {
    let outcome = PerformancePipeline::default()
        .clean_reader(EXPORT)
        .expect("export cleans");
    let mut buffer = Vec::new();
    write_cleaned(&outcome.dataset, &mut buffer).expect("write cleaned");

    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(headers.get(0), Some("manager_hierarchy_manager"));
    assert!(headers.iter().any(|header| header == "performance_score"));
    assert!(headers.iter().any(|header| header == "notes"));
    assert_eq!(reader.records().count(), 6);
}

#[test]
fn semantic_stage_renames_tiers_and_rescales() {
    let outcome = PerformancePipeline::default()
        .run_reader(EXPORT, processed_at())
        .expect("pipeline runs");
    let semantic = &outcome.semantic;

    let header = semantic.header();
    assert_eq!(
        &header[..4],
        &["manager_name", "location", "supervisor_name", "agent_name"]
    );
    assert_eq!(header.last(), Some(&"processed_timestamp"));
    assert!(header.contains(&"notes"));
    assert!(semantic.has(SemanticColumn::PerformanceTier));
    assert!(semantic.log.missing_columns.is_empty());
    assert!(semantic.log.validation.missing_critical_columns.is_empty());
    assert_eq!(semantic.log.validation.total_rows, 6);

    let first = &semantic.records[0];
    assert_eq!(first.performance_tier, Some(PerformanceTier::ExceedsExpectations));
    assert_eq!(first.first_call_resolution_rate, Some(0.85));
    assert_eq!(first.performance_year, Some(2025));
    assert_eq!(first.week_of_year, Some(2));
    assert_eq!(first.efficiency_category, Some(EfficiencyCategory::High));
    assert_eq!(semantic.records[2].performance_tier, Some(PerformanceTier::Outstanding));

    let mut buffer = Vec::new();
    write_semantic(semantic, &mut buffer).expect("write semantic");
    let text = String::from_utf8(buffer).expect("utf8");
    assert!(text.lines().nth(1).expect("first row").ends_with("2025-09-03 14:05:00"));
}

#[test]
fn aggregation_groups_parsed_identities() {
    let outcome = PerformancePipeline::default()
        .run_reader(EXPORT, processed_at())
        .expect("pipeline runs");

    let names: Vec<&str> = outcome
        .summaries
        .iter()
        .map(|summary| summary.agent_name.as_str())
        .collect();
    assert_eq!(names, vec!["DOE,JANE", "SMITH,JOHN A"]);

    let doe = &outcome.summaries[0];
    assert_eq!(doe.days_worked, 1);
    assert_eq!(doe.total_interactions_period, Some(98.0));
    assert_eq!(doe.avg_interactions_per_day, Some(98.0));

    let smith = &outcome.summaries[1];
    assert_eq!(smith.days_worked, 3);
    assert_eq!(smith.first_performance_date, NaiveDate::from_ymd_opt(2025, 1, 6));
    assert_eq!(smith.last_performance_date, NaiveDate::from_ymd_opt(2025, 1, 7));
    assert!(smith.composite_performance_score.is_some());
    assert!(outcome.ranking.top.is_empty());
}

#[test]
fn ranking_excludes_low_activity_agents() {
    let export = ranking_export();
    let outcome = PerformancePipeline::default()
        .run_reader(export.as_bytes(), processed_at())
        .expect("pipeline runs");

    assert_eq!(outcome.summaries.len(), 8);
    assert_eq!(outcome.ranking.qualified, 7);

    let ranked: Vec<(&str, Option<usize>)> = outcome
        .ranking
        .top
        .iter()
        .map(|summary| (summary.agent_last_name.as_str(), summary.rank))
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("GARCIA", Some(1)),
            ("FOSTER", Some(2)),
            ("EVANS", Some(3)),
            ("DAVIS", Some(4)),
            ("CLARK", Some(5)),
        ]
    );

    let scores: Vec<f64> = outcome
        .ranking
        .top
        .iter()
        .filter_map(|summary| summary.composite_performance_score)
        .collect();
    assert!(scores.windows(2).all(|pair| pair[0] > pair[1]));
}

#[test]
fn top_n_follows_scoring_configuration() {
    let scoring = ScoringConfig {
        top_n: 2,
        ..ScoringConfig::default()
    };
    let export = ranking_export();
    let outcome = PerformancePipeline::new(&scoring)
        .run_reader(export.as_bytes(), processed_at())
        .expect("pipeline runs");
    assert_eq!(outcome.ranking.top.len(), 2);
}
