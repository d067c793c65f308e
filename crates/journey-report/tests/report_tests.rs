use chrono::NaiveDate;
use journey_core::{fetch_cfp_submissions, TouchpointType};
use journey_report::{
    cfp_schedule, format_metric_goal, journey_overview, pain_point_report, pain_points_csv,
    persona_summary, touchpoint_report, touchpoints_csv, write_export, ReportScope,
    TOUCHPOINTS_CSV,
};
use journey_test_utils::demo_fixture;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn demo_persona_summary() {
    let (fixture, _demo) = demo_fixture().await;
    let state = fixture.controller.state();

    let summary = persona_summary(&state.stages, &ReportScope::All).unwrap();
    let counts: Vec<_> = summary.iter().map(|s| (s.stage_name.as_str(), s.count())).collect();
    // Evaluate links all three personas across its two steps
    assert_eq!(counts, [("Discover", 2), ("Evaluate", 3), ("Adopt", 2)]);
}

#[tokio::test]
async fn pain_point_export_parses_back() {
    let (fixture, demo) = demo_fixture().await;
    let state = fixture.controller.state();

    let scope = ReportScope::Stage(demo.stages[0].clone());
    let report = pain_point_report(&state.stages, &scope).unwrap();
    assert_eq!(report.rows.len(), 1);

    let export = pain_points_csv(&report.rows);
    let mut reader = csv::Reader::from_reader(export.contents.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[2], "Description");

    let record = reader.records().next().unwrap().unwrap();
    assert_eq!(&record[0], "Discover");
    assert_eq!(&record[2], report.rows[0].pain_point.description.as_str());
    assert!(record[2].contains('"'));
    assert_eq!(&record[3], "medium");
}

#[tokio::test]
async fn severity_and_type_histograms() {
    let (fixture, _demo) = demo_fixture().await;
    let state = fixture.controller.state();

    let pains = pain_point_report(&state.stages, &ReportScope::All).unwrap();
    assert_eq!(pains.by_severity["high"], 2);
    assert_eq!(pains.by_severity["medium"], 1);
    assert_eq!(pains.by_severity["none"], 1);

    let touches = touchpoint_report(&state.stages, &ReportScope::All).unwrap();
    assert_eq!(touches.rows.len(), 4);
    assert_eq!(touches.by_type[&TouchpointType::Docs], 1);
    assert_eq!(touches.by_type[&TouchpointType::Email], 0);

    let json = serde_json::to_value(&touches.by_type).unwrap();
    assert_eq!(json["Blog Post"], 1);
}

#[tokio::test]
async fn touchpoint_export_to_disk() {
    let (fixture, _demo) = demo_fixture().await;
    let state = fixture.controller.state();
    let report = touchpoint_report(&state.stages, &ReportScope::All).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = write_export(dir.path(), &touchpoints_csv(&report.rows)).unwrap();
    assert!(path.ends_with(TOUCHPOINTS_CSV));

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let urls: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[5].to_string())
        .collect();
    assert_eq!(urls.iter().filter(|u| u.is_empty()).count(), 2);
}

#[tokio::test]
async fn metric_goals_render() {
    let (fixture, _demo) = demo_fixture().await;
    let state = fixture.controller.state();

    let goals: Vec<String> = state
        .stages
        .iter()
        .flat_map(|s| &s.steps)
        .flat_map(|s| &s.metrics)
        .map(format_metric_goal)
        .collect();
    assert_eq!(goals, ["25,000", "60%", "N/A"]);
}

#[tokio::test]
async fn overview_and_schedule() {
    let (fixture, _demo) = demo_fixture().await;
    let state = fixture.controller.state();

    let overview = journey_overview(&state.stages, &state.personas);
    assert_eq!(overview.stages, 3);
    assert_eq!(overview.steps, 5);
    assert_eq!(overview.personas, 3);
    assert_eq!(overview.pain_points, 4);
    assert_eq!(overview.metrics, 3);

    let submissions = fetch_cfp_submissions(fixture.gateway.as_ref()).await.unwrap();
    let today = NaiveDate::from_ymd_opt(2026, 5, 27).unwrap();
    let labels: Vec<String> = cfp_schedule(submissions, today)
        .iter()
        .map(|e| e.label())
        .collect();
    assert_eq!(labels, ["In 5 days", "Dec 15, 2026"]);
}
