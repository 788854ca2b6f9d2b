//! End-to-end runs: fetch, derive, classify and render.
//!
//! Only a failed fetch or an uncreatable output directory aborts a run. Every
//! chart is attempted independently and its outcome is recorded.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::{
    classify::{self, ChartKind, SkipReason, Strategy},
    data::{Column, Table},
    derive::{self, Derivation, MetricFamily},
    error::{PipelineError, RenderError},
    io_utils,
    render::{self, Artifact, ChartWriter},
    source::TableSource,
    validation::{self, METRIC_PAIRS},
};

pub const RAW_SNAPSHOT: &str = "raw_sql_output.csv";
pub const METRICS_SNAPSHOT: &str = "calculated_metrics.csv";

#[derive(Debug)]
pub enum Outcome {
    Rendered(Artifact),
    Skipped(SkipReason),
    Failed(RenderError),
}

#[derive(Debug)]
pub struct ColumnOutcome {
    pub column: String,
    pub strategy: Strategy,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct ChartReport {
    pub outcomes: Vec<ColumnOutcome>,
}

impl ChartReport {
    fn rendered(&self, strategy: Strategy) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.strategy == strategy && matches!(o.outcome, Outcome::Rendered(_)))
            .count()
    }

    pub fn histograms(&self) -> usize {
        self.rendered(Strategy::Histogram)
    }

    pub fn bar_charts(&self) -> usize {
        self.rendered(Strategy::CategoricalBar)
    }

    pub fn range_charts(&self) -> usize {
        self.rendered(Strategy::RangedBar)
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Skipped(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Failed(_)))
            .count()
    }

    pub fn total_charts(&self) -> usize {
        self.histograms() + self.bar_charts() + self.range_charts()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.outcomes.iter().filter_map(|o| match &o.outcome {
            Outcome::Rendered(artifact) => Some(artifact),
            _ => None,
        })
    }
}

#[derive(Debug)]
pub struct PairOutcome {
    pub label: &'static str,
    pub result: Result<Artifact, RenderError>,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub outcomes: Vec<PairOutcome>,
}

impl ValidationReport {
    pub fn rendered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.rendered()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }
}

#[derive(Debug)]
pub struct ChartRun {
    pub derivation: Derivation,
    pub report: ChartReport,
}

#[derive(Debug)]
pub struct ValidationRun {
    pub derivation: Derivation,
    pub report: ValidationReport,
}

pub struct Pipeline<S, W> {
    source: S,
    writer: W,
    snapshot_dir: Option<PathBuf>,
}

impl<S: TableSource, W: ChartWriter> Pipeline<S, W> {
    pub fn new(source: S, writer: W) -> Self {
        Self {
            source,
            writer,
            snapshot_dir: None,
        }
    }

    /// Writes CSV copies of the fetched and derived tables during validation.
    pub fn with_snapshots(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    pub fn chart_columns(&self, query: &str, output_dir: &Path) -> Result<ChartRun, PipelineError> {
        let table = self.source.fetch_table(query)?;
        chart_table(&table, output_dir, &self.writer)
    }

    pub fn validate_metrics(
        &self,
        query: &str,
        output_dir: &Path,
    ) -> Result<ValidationRun, PipelineError> {
        let table = self.source.fetch_table(query)?;
        validate_table(&table, output_dir, &self.writer, self.snapshot_dir.as_deref())
    }
}

/// Derives dashboard metrics on `table` and charts every column.
pub fn chart_table<W: ChartWriter + ?Sized>(
    table: &Table,
    output_dir: &Path,
    writer: &W,
) -> Result<ChartRun, PipelineError> {
    let specs = derive::metric_specs(MetricFamily::Dashboard, table);
    let derivation = derive::derive(table, &specs);
    prepare_output_dir(output_dir)?;

    let mut report = ChartReport::default();
    for column in derivation.table.columns() {
        let strategy = classify::classify(column);
        let outcome = match strategy {
            Strategy::Skip(reason) => {
                warn!("Skipping {}: {reason}", column.name());
                Outcome::Skipped(reason)
            }
            Strategy::Histogram => draw(column, ChartKind::Histogram, output_dir, writer),
            Strategy::RangedBar => draw(column, ChartKind::RangedBar, output_dir, writer),
            Strategy::CategoricalBar => {
                draw(column, ChartKind::CategoricalBar, output_dir, writer)
            }
        };
        report.outcomes.push(ColumnOutcome {
            column: column.name().to_string(),
            strategy,
            outcome,
        });
    }
    info!(
        "Charts complete: {} histogram(s), {} bar chart(s), {} range chart(s), {} skipped, {} failed",
        report.histograms(),
        report.bar_charts(),
        report.range_charts(),
        report.skipped(),
        report.failed()
    );
    Ok(ChartRun { derivation, report })
}

/// Derives actual metrics on `table` and renders every validation pair.
pub fn validate_table<W: ChartWriter + ?Sized>(
    table: &Table,
    output_dir: &Path,
    writer: &W,
    snapshot_dir: Option<&Path>,
) -> Result<ValidationRun, PipelineError> {
    if let Some(dir) = snapshot_dir {
        snapshot(table, dir, RAW_SNAPSHOT);
    }
    let specs = derive::metric_specs(MetricFamily::Actual, table);
    let derivation = derive::derive(table, &specs);
    if let Some(dir) = snapshot_dir {
        snapshot(&derivation.table, dir, METRICS_SNAPSHOT);
    }
    prepare_output_dir(output_dir)?;

    let mut report = ValidationReport::default();
    for pair in &METRIC_PAIRS {
        let result = validation::render_pair(&derivation.table, pair, output_dir, writer);
        match &result {
            Ok(artifact) => info!("Created {}", artifact.filename),
            Err(err) => warn!("Error creating chart for {}: {err}", pair.label),
        }
        report.outcomes.push(PairOutcome {
            label: pair.label,
            result,
        });
    }
    info!(
        "Validation complete: {} chart(s) created, {} failed",
        report.rendered(),
        report.failed()
    );
    Ok(ValidationRun { derivation, report })
}

fn draw<W: ChartWriter + ?Sized>(
    column: &Column,
    kind: ChartKind,
    output_dir: &Path,
    writer: &W,
) -> Outcome {
    match render::render(column, kind, output_dir, writer) {
        Ok(artifact) => {
            info!("Created {} for {}", artifact.filename, column.name());
            Outcome::Rendered(artifact)
        }
        Err(err) => {
            warn!("Error processing column {}: {err}", column.name());
            Outcome::Failed(err)
        }
    }
}

fn prepare_output_dir(path: &Path) -> Result<(), PipelineError> {
    io_utils::ensure_output_dir(path).map_err(|source| PipelineError::OutputDir {
        path: path.to_path_buf(),
        source,
    })
}

fn snapshot(table: &Table, dir: &Path, filename: &str) {
    let path = dir.join(filename);
    let written = io_utils::ensure_output_dir(dir)
        .map_err(anyhow::Error::from)
        .and_then(|()| io_utils::write_table_csv(table, &path));
    match written {
        Ok(()) => info!("Saved {} rows to {path:?}", table.row_count()),
        Err(err) => warn!("Could not save snapshot {path:?}: {err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Figure;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        written: RefCell<Vec<PathBuf>>,
    }

    impl ChartWriter for Recorder {
        fn write(&self, _figure: &Figure, path: &Path) -> Result<(), RenderError> {
            self.written.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn report_counts_by_strategy() {
        let dir = tempfile::tempdir().expect("temp dir");
        let table = Table::from_columns(vec![
            Column::from_f64("X", vec![Some(1.0), Some(2.0), None]),
            Column::from_f64("EMPTY", vec![None, None, None]),
        ])
        .expect("table");
        let recorder = Recorder::default();
        let run = chart_table(&table, dir.path(), &recorder).expect("chart run");
        assert_eq!(run.report.histograms(), 1);
        assert_eq!(run.report.skipped(), 1);
        assert_eq!(run.report.total_charts(), 1);
        assert_eq!(
            recorder.written.borrow().as_slice(),
            &[dir.path().join("X_histogram.png")]
        );
    }

    #[test]
    fn fetch_failure_aborts_before_output() {
        let dir = tempfile::tempdir().expect("temp dir");
        let output = dir.path().join("charts");
        let source = |_: &str| -> Result<Table, crate::error::FetchError> {
            Err(crate::error::FetchError::Other("warehouse unreachable".into()))
        };
        let pipeline = Pipeline::new(source, Recorder::default());
        let err = pipeline
            .chart_columns("select 1", &output)
            .expect_err("fetch should fail");
        assert!(matches!(err, PipelineError::Fetch(_)));
        assert!(!output.exists());
    }
}
