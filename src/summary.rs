//! Plain-text run summaries printed after a run.

use std::fmt::Write as _;

use crate::pipeline::{ChartReport, Outcome, ValidationReport};

/// One line per column with its strategy and outcome, then the run totals.
pub fn chart_summary(report: &ChartReport) -> String {
    let rows = report
        .outcomes
        .iter()
        .map(|o| {
            let outcome = match &o.outcome {
                Outcome::Rendered(artifact) => artifact.filename.clone(),
                Outcome::Skipped(reason) => format!("skipped: {reason}"),
                Outcome::Failed(err) => format!("failed: {err}"),
            };
            [o.column.clone(), o.strategy.to_string(), outcome]
        })
        .collect::<Vec<_>>();
    let mut output = render_table(["column", "strategy", "outcome"], rows);
    let _ = writeln!(output);
    let _ = writeln!(output, "Histograms: {}", report.histograms());
    let _ = writeln!(output, "Bar charts: {}", report.bar_charts());
    let _ = writeln!(output, "Range charts: {}", report.range_charts());
    let _ = writeln!(output, "Skipped columns: {}", report.skipped());
    if report.failed() > 0 {
        let _ = writeln!(output, "Failed columns: {}", report.failed());
    }
    let _ = writeln!(output, "Total charts: {}", report.total_charts());
    output
}

pub fn validation_summary(report: &ValidationReport) -> String {
    let rows = report
        .outcomes
        .iter()
        .map(|o| {
            let outcome = match &o.result {
                Ok(artifact) => artifact.filename.clone(),
                Err(err) => format!("failed: {err}"),
            };
            [o.label.to_string(), outcome]
        })
        .collect::<Vec<_>>();
    let mut output = render_table(["metric", "outcome"], rows);
    let _ = writeln!(output);
    let _ = writeln!(output, "Validation charts: {}", report.rendered());
    if report.failed() > 0 {
        let _ = writeln!(output, "Failed charts: {}", report.failed());
    }
    output
}

/// Left-aligned columns two spaces apart, with a dashed rule under the
/// header. Control characters in cells become spaces.
fn render_table<const N: usize>(headers: [&str; N], rows: Vec<[String; N]>) -> String {
    let rows = rows
        .into_iter()
        .map(|row| row.map(|cell| one_line(&cell)))
        .collect::<Vec<_>>();
    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header = headers.map(String::from);
    let rule = widths.map(|w| "-".repeat(w));
    for cells in [header, rule].into_iter().chain(rows) {
        let _ = writeln!(output, "{}", format_row(&cells, &widths));
    }
    output
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (cell, &width) in cells.iter().zip(widths) {
        let _ = write!(line, "{cell:<width$}  ");
    }
    line.trim_end().to_string()
}

fn one_line(cell: &str) -> String {
    cell.chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}
