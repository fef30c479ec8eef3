use pretty_assertions::assert_eq;
use retag_core::{
    ErrorCategory, Family, Outcome, ReportSink, RunConfig, RunController, RunMode, Selection,
};
use serde_json::json;

use super::fake_api::{FakeApi, dashboard, fleet, mapping};

fn run_config(selections: &str) -> RunConfig {
    RunConfig::from_json(&format!(
        r#"{{"tags": {{"env:staging": "env:production", "team:core": "team:platform"}}{selections}}}"#
    ))
    .unwrap()
}

#[tokio::test]
async fn report_lists_changes_without_writing() {
    let api = fleet();
    let report = RunController::new(&api, mapping(), RunMode::Report)
        .run(&run_config(""))
        .await
        .unwrap();

    assert_eq!(report.mode, RunMode::Report);
    assert_eq!(report.family(Family::Dashboards).unwrap().changed_ids(), vec!["d1"]);
    assert_eq!(report.family(Family::Monitors).unwrap().changed_ids(), vec!["1"]);
    assert_eq!(report.family(Family::Synthetics).unwrap().changed_ids(), vec!["s1"]);
    assert!(!report.has_failures());
    assert!(api.puts().is_empty());

    let d2 = &report.family(Family::Dashboards).unwrap().records[1];
    assert_eq!(d2.id, "d2");
    assert_eq!(d2.outcome, Outcome::Unchanged);
}

#[tokio::test]
async fn commit_writes_exactly_what_report_lists() {
    let report_api = fleet();
    let reported = RunController::new(&report_api, mapping(), RunMode::Report)
        .run(&run_config(""))
        .await
        .unwrap();

    let commit_api = fleet();
    let committed = RunController::new(&commit_api, mapping(), RunMode::Commit)
        .run(&run_config(""))
        .await
        .unwrap();

    for family in Family::ALL {
        assert_eq!(
            reported.family(family).unwrap().changed_ids(),
            committed.family(family).unwrap().changed_ids(),
            "{family} disagrees between modes"
        );
    }
    assert_eq!(
        commit_api.put_paths(),
        vec!["dashboard/d1", "monitor/1", "synthetics/tests/browser/s1"]
    );
}

#[tokio::test]
async fn commit_strips_server_managed_fields() {
    let api = fleet();
    RunController::new(&api, mapping(), RunMode::Commit)
        .run(&run_config(""))
        .await
        .unwrap();

    let puts = api.puts();
    let (_, dashboard) = &puts[0];
    assert_eq!(
        dashboard,
        &json!({
            "title": "Dashboard d1",
            "layout_type": "ordered",
            "widgets": [
                {"id": 100, "definition": {"type": "timeseries", "requests": [
                    {"q": "avg:system.cpu.user{env:production,team:platform}"}
                ]}},
                {"id": 101, "definition": {"type": "note", "content": "env:staging lives here"}}
            ]
        })
    );

    let (_, monitor) = &puts[1];
    assert_eq!(
        monitor,
        &json!({
            "name": "CPU high",
            "query": "avg(last_5m):avg:system.cpu.user{env:production} > 90",
            "tags": ["team:platform"]
        })
    );

    let (_, synthetic) = &puts[2];
    assert_eq!(
        synthetic,
        &json!({"name": "Login", "type": "browser", "tags": ["env:production", "team:web"]})
    );
}

#[tokio::test]
async fn monitors_are_walked_from_the_listing() {
    let api = fleet();
    RunController::new(&api, mapping(), RunMode::Report)
        .run(&run_config(r#", "dashboards": [], "synthetics": []"#))
        .await
        .unwrap();
    assert_eq!(api.gets(), vec!["monitor"]);
}

#[tokio::test]
async fn allow_list_filters_and_reports_missing_ids() {
    let api = fleet();
    let report = RunController::new(&api, mapping(), RunMode::Report)
        .run(&run_config(
            r#", "dashboards": ["d2", "ghost"], "monitors": [], "synthetics": ["*"]"#,
        ))
        .await
        .unwrap();

    let dashboards = report.family(Family::Dashboards).unwrap();
    assert_eq!(
        dashboards.records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        vec!["d2"]
    );
    assert!(dashboards.changed_ids().is_empty());
    assert_eq!(dashboards.missing, vec!["ghost"]);
    assert!(!api.gets().contains(&"dashboard/d1".to_string()));

    let monitors = report.family(Family::Monitors).unwrap();
    assert!(monitors.skipped);
    assert!(monitors.records.is_empty());
    assert!(!api.gets().contains(&"monitor".to_string()));

    assert_eq!(report.family(Family::Synthetics).unwrap().changed_ids(), vec!["s1"]);
}

fn fleet_with_unsupported_widget() -> FakeApi {
    let mut broken = dashboard("d0", "avg:system.cpu.user{env:staging}");
    broken["widgets"][0]["definition"]["requests"] = json!([{
        "queries": [{"data_source": "metrics", "name": "query1", "query": "avg:cpu{env:staging}"}],
        "formulas": [{"formula": "query1"}]
    }]);
    fleet()
        .with(
            "dashboard",
            json!({"dashboards": [{"id": "d0"}, {"id": "d1"}, {"id": "d2"}]}),
        )
        .with("dashboard/d0", broken)
}

#[tokio::test]
async fn unsupported_query_shape_fails_only_that_dashboard() {
    let api = fleet_with_unsupported_widget();
    let report = RunController::new(&api, mapping(), RunMode::Commit)
        .run(&run_config(""))
        .await
        .unwrap();

    assert!(report.has_failures());
    let dashboards = report.family(Family::Dashboards).unwrap();
    let failures: Vec<_> = dashboards.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id, "d0");
    let Outcome::Failed { category, error } = &failures[0].outcome else {
        panic!("expected a failed outcome");
    };
    assert_eq!(category, "UNSUPPORTED_QUERY_SHAPE");
    assert!(
        error.contains("dashboard d0: widgets[0].definition.requests[0]"),
        "unexpected error: {error}"
    );

    assert_eq!(dashboards.changed_ids(), vec!["d1"]);
    assert!(!api.put_paths().contains(&"dashboard/d0".to_string()));
    assert!(api.put_paths().contains(&"dashboard/d1".to_string()));
}

#[tokio::test]
async fn strict_mode_aborts_on_first_failure() {
    let api = fleet_with_unsupported_widget();
    let err = RunController::new(&api, mapping(), RunMode::Commit)
        .strict(true)
        .run(&run_config(""))
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::UnsupportedQueryShape);
    assert!(api.puts().is_empty());
}

#[tokio::test]
async fn failed_listing_aborts_the_run() {
    let api = FakeApi::default().with("dashboard", json!({"dashboards": []}));
    let err = RunController::new(&api, mapping(), RunMode::Report)
        .run(&run_config(""))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::TransportError);
    assert!(err.to_string().contains("GET monitor returned 404"));
}

#[tokio::test]
async fn missing_detail_is_isolated() {
    let api = fleet().with(
        "dashboard",
        json!({"dashboards": [{"id": "gone"}, {"id": "d1"}]}),
    );
    let mut sink = ReportSink;
    let report = RunController::new(&api, mapping(), RunMode::Report)
        .run_family(Family::Dashboards, &Selection::All, &mut sink)
        .await
        .unwrap();

    let gone = &report.records[0];
    assert!(!gone.changed);
    assert!(matches!(
        &gone.outcome,
        Outcome::Failed { category, .. } if category == "TRANSPORT_ERROR"
    ));
    assert_eq!(report.changed_ids(), vec!["d1"]);
}

#[tokio::test]
async fn synthetic_without_update_endpoint_is_structural() {
    let api = fleet().with(
        "synthetics/tests",
        json!({"tests": [
            {"public_id": "m1", "type": "mobile"},
            {"public_id": "s1", "type": "browser"}
        ]}),
    );
    let mut sink = ReportSink;
    let report = RunController::new(&api, mapping(), RunMode::Report)
        .run_family(Family::Synthetics, &Selection::All, &mut sink)
        .await
        .unwrap();

    assert!(matches!(
        &report.records[0].outcome,
        Outcome::Failed { category, error }
            if category == "STRUCTURAL_ERROR" && error.contains("synthetic m1")
    ));
    assert_eq!(report.changed_ids(), vec!["s1"]);
}

#[tokio::test]
async fn second_run_over_migrated_fleet_changes_nothing() {
    let api = fleet();
    RunController::new(&api, mapping(), RunMode::Commit)
        .run(&run_config(""))
        .await
        .unwrap();

    let mut migrated = fleet();
    for (path, body) in api.puts() {
        migrated = migrated.with(&path, body);
    }
    // Monitors are walked from the listing, so the listing carries the new body.
    let mut monitor = api.puts()[1].1.clone();
    monitor["id"] = json!(1);
    migrated = migrated.with("monitor", json!([monitor]));

    let rerun = RunController::new(&migrated, mapping(), RunMode::Report)
        .run(&run_config(""))
        .await
        .unwrap();
    for family in Family::ALL {
        assert!(
            rerun.family(family).unwrap().changed_ids().is_empty(),
            "{family} changed on second pass"
        );
    }
}
