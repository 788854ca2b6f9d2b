mod common;

use common::{RecordingWriter, TestWorkspace, floats, ints, table, text};
use dq_charts::classify::Strategy;
use dq_charts::data::Table;
use dq_charts::error::{FetchError, PipelineError};
use dq_charts::pipeline::{
    METRICS_SNAPSHOT, Outcome, Pipeline, RAW_SNAPSHOT, chart_table, validate_table,
};
use dq_charts::render::PanelBody;
use dq_charts::source::{Capabilities, DuckDbSource, Engine};

#[test]
fn mixed_columns_yield_one_histogram_and_one_bar_chart() {
    let workspace = TestWorkspace::new();
    let source = table(vec![
        ints("X", &[Some(1), Some(2), None]),
        text("Y", &[Some("a"), Some("b"), Some("a")]),
    ]);
    let writer = RecordingWriter::default();
    let run = chart_table(&source, workspace.path(), &writer).expect("chart run");

    assert_eq!(run.report.histograms(), 1);
    assert_eq!(run.report.bar_charts(), 1);
    assert_eq!(run.report.skipped(), 0);
    assert_eq!(run.report.total_charts(), 2);
    assert_eq!(writer.filenames(), vec!["X_histogram.png", "Y_barchart.png"]);

    let bars = writer.figure("Y_barchart.png").expect("bar figure");
    match &bars.panels[0].body {
        PanelBody::Bars { bars, .. } => {
            let labels: Vec<_> = bars.iter().map(|b| (b.label.as_str(), b.count)).collect();
            assert_eq!(labels, vec![("a", 2), ("b", 1)]);
        }
        other => panic!("expected bars, got {other:?}"),
    }
}

#[test]
fn rerunning_unchanged_data_plans_identical_figures() {
    let workspace = TestWorkspace::new();
    let values = (0..120).map(|v| Some(f64::from(v) * 1.5)).collect::<Vec<_>>();
    let source = table(vec![floats("AMOUNT", &values)]);

    let first = RecordingWriter::default();
    let second = RecordingWriter::default();
    chart_table(&source, workspace.path(), &first).expect("first run");
    chart_table(&source, workspace.path(), &second).expect("second run");

    assert_eq!(first.filenames(), vec!["AMOUNT_ranges_barchart.png"]);
    assert_eq!(
        first.figure("AMOUNT_ranges_barchart.png"),
        second.figure("AMOUNT_ranges_barchart.png")
    );
}

#[test]
fn one_failing_chart_does_not_stop_the_rest() {
    let workspace = TestWorkspace::new();
    let source = table(vec![
        ints("A", &[Some(1), Some(2)]),
        ints("B", &[Some(3), Some(4)]),
        ints("C", &[Some(5), Some(6)]),
    ]);
    let writer = RecordingWriter::failing_on(&["B_histogram.png"]);
    let run = chart_table(&source, workspace.path(), &writer).expect("chart run");

    assert_eq!(writer.filenames(), vec!["A_histogram.png", "C_histogram.png"]);
    assert_eq!(run.report.failed(), 1);
    assert_eq!(run.report.total_charts(), 2);
    let failed = &run.report.outcomes[1];
    assert_eq!(failed.column, "B");
    assert_eq!(failed.strategy, Strategy::Histogram);
    assert!(matches!(failed.outcome, Outcome::Failed(_)));
}

#[test]
fn derived_dashboard_metrics_are_charted_too() {
    let workspace = TestWorkspace::new();
    let source = table(vec![
        ints("CHARGED_OFF_STATEMENTS", &[Some(1), Some(2), Some(3)]),
        ints("OPEN_STATEMENTS", &[Some(10), Some(10), Some(0)]),
    ]);
    let writer = RecordingWriter::default();
    let run = chart_table(&source, workspace.path(), &writer).expect("chart run");

    assert!(run.derivation.table.contains("TABLEAU_PBAD_PER_OPEN"));
    assert!(
        writer
            .filenames()
            .contains(&"TABLEAU_PBAD_PER_OPEN_histogram.png".to_string())
    );
}

#[test]
fn output_directory_is_created_once_and_reused() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("nested").join("charts");
    let source = table(vec![ints("X", &[Some(1)])]);
    let writer = RecordingWriter::default();
    chart_table(&source, &output, &writer).expect("first run");
    chart_table(&source, &output, &writer).expect("second run");
    assert!(output.is_dir());
}

#[test]
fn uncreatable_output_directory_is_fatal() {
    let workspace = TestWorkspace::new();
    let blocker = workspace.write("blocker", "not a directory");
    let source = table(vec![ints("X", &[Some(1)])]);
    let err = chart_table(&source, &blocker.join("charts"), &RecordingWriter::default())
        .expect_err("output dir under a file");
    assert!(matches!(err, PipelineError::OutputDir { .. }));
}

#[test]
fn fetch_failure_propagates() {
    let workspace = TestWorkspace::new();
    let failing = |_: &str| -> Result<Table, FetchError> {
        Err(FetchError::Other("connection refused".into()))
    };
    let pipeline = Pipeline::new(failing, RecordingWriter::default());
    let err = pipeline
        .validate_metrics("select 1", workspace.path())
        .expect_err("fetch fails");
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn validation_renders_every_pair_even_without_assumptions() {
    let workspace = TestWorkspace::new();
    let source = table(vec![
        floats("PRINCIPAL_BALANCE_OPEN_ACCOUNTS", &[Some(20.0), Some(30.0)]),
        floats("CREDIT_LIMIT_OPEN_ACCOUNTS", &[Some(100.0), Some(100.0)]),
    ]);
    let writer = RecordingWriter::default();
    let run = validate_table(&source, workspace.path(), &writer, None).expect("validation run");

    assert_eq!(run.report.rendered(), 10);
    assert_eq!(run.report.failed(), 0);
    let util = writer.figure("UTIL_validation.png").expect("util figure");
    assert_eq!(util.panels[0].title, "UTIL - Actual");
    assert_eq!(util.panels[1].title, "UTIL - Assumption (Not Available)");
    let dq30 = writer.figure("DQ30_validation.png").expect("dq30 figure");
    assert_eq!(dq30.panels.len(), 1);
}

#[test]
fn validation_snapshots_raw_and_derived_tables() {
    let workspace = TestWorkspace::new();
    let snapshots = workspace.path().join("snapshots");
    let sql = "SELECT * FROM (VALUES (1, 4), (3, 0)) t(BKT2_ACCOUNTS, OPEN_STATEMENTS)";
    let source = DuckDbSource::in_memory(Engine::Columnar, Capabilities::default())
        .expect("open duckdb");
    let pipeline = Pipeline::new(source, RecordingWriter::default()).with_snapshots(&snapshots);
    let run = pipeline
        .validate_metrics(sql, &workspace.path().join("charts"))
        .expect("validation run");

    assert_eq!(run.report.artifacts().count(), 10);
    let raw = std::fs::read_to_string(snapshots.join(RAW_SNAPSHOT)).expect("raw snapshot");
    assert_eq!(raw, "BKT2_ACCOUNTS,OPEN_STATEMENTS\n1,4\n3,0\n");
    let metrics =
        std::fs::read_to_string(snapshots.join(METRICS_SNAPSHOT)).expect("metrics snapshot");
    let header = metrics.lines().next().expect("header row");
    assert!(header.contains("ACTUAL_DQ30"));
    assert!(metrics.lines().nth(1).expect("first row").ends_with(",0.25"));
}
