//! Side-by-side charts comparing derived actuals with their assumptions.

use std::path::Path;

use crate::{
    data::{Column, Table},
    error::RenderError,
    render::{Artifact, ChartWriter, Figure, Fill, Panel, PanelBody, render_figure},
    stats::{self, HISTOGRAM_BINS, Summary},
};

pub const PAIR_SIZE: (u32, u32) = (1920, 720);
pub const SINGLE_SIZE: (u32, u32) = (960, 720);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Actual on the left, assumption (if any column is configured) on the right.
    Compare { assumption: Option<&'static str> },
    ActualOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricPair {
    pub label: &'static str,
    pub actual: &'static str,
    pub layout: Layout,
}

impl MetricPair {
    const fn compare(label: &'static str, actual: &'static str, assumption: &'static str) -> Self {
        Self {
            label,
            actual,
            layout: Layout::Compare {
                assumption: Some(assumption),
            },
        }
    }

    pub fn filename(&self) -> String {
        format!("{}_validation.png", self.label)
    }
}

pub const METRIC_PAIRS: [MetricPair; 10] = [
    MetricPair::compare("PBAD_PER_OPEN", "ACTUAL_PBAD_PER_OPEN", "PBAD"),
    MetricPair::compare("SEVERITY", "ACTUAL_SEVERITY", "SEVERITY"),
    MetricPair::compare("UTIL", "ACTUAL_UTIL", "UTILIZATION"),
    MetricPair::compare("CREDIT_LINE", "ACTUAL_CREDIT_LINE", "CREDIT_LINE"),
    MetricPair::compare("CASH_ADVANCE", "ACTUAL_CASH_ADVANCE", "CASH_ADVANCE_AGGREGATE"),
    MetricPair::compare("PENALTY", "ACTUAL_PENALTY", "PENALTY_AGGREGATE"),
    MetricPair::compare("PVOL", "ACTUAL_PVOL", "PVOL_AGGREGATE"),
    MetricPair::compare("ATTRITION", "ACTUAL_ATTRITION", "ATTRITION_AGGREGATE"),
    MetricPair::compare("OUTSTANDING", "ACTUAL_OUTSTANDING", "OUTSTANDING_AGGREGATE"),
    MetricPair {
        label: "DQ30",
        actual: "ACTUAL_DQ30",
        layout: Layout::ActualOnly,
    },
];

/// Plans and writes the validation chart for one pair.
pub fn render_pair<W: ChartWriter + ?Sized>(
    table: &Table,
    pair: &MetricPair,
    output_dir: &Path,
    writer: &W,
) -> Result<Artifact, RenderError> {
    render_figure(&plan_pair(table, pair), pair.filename(), output_dir, writer)
}

pub fn plan_pair(table: &Table, pair: &MetricPair) -> Figure {
    let actual = present_values(table.column(pair.actual));
    match pair.layout {
        Layout::ActualOnly => {
            let (w, h) = SINGLE_SIZE;
            let panel = match Summary::of(&actual) {
                Some(summary) => histogram_panel(
                    format!("{} - Actual Only", pair.label),
                    &summary,
                    format!("Actual {}", pair.label),
                    &actual,
                    Fill::SkyBlue,
                ),
                None => Panel::message(
                    format!("{} - Actual (No Data)", pair.label),
                    format!("No {} data available", pair.label),
                ),
            };
            Figure::single(w, h, panel)
        }
        Layout::Compare { assumption } => {
            let (w, h) = PAIR_SIZE;
            let left = match Summary::of(&actual) {
                Some(summary) => histogram_panel(
                    format!("{} - Actual", pair.label),
                    &summary,
                    format!("Actual {}", pair.label),
                    &actual,
                    Fill::SkyBlue,
                ),
                None => Panel::message(
                    format!("{} - Actual (No Data)", pair.label),
                    "No actual data available",
                ),
            };
            let right = assumption_panel(pair.label, assumption.and_then(|name| table.column(name)));
            Figure {
                width: w,
                height: h,
                panels: vec![left, right],
            }
        }
    }
}

fn assumption_panel(label: &str, column: Option<&Column>) -> Panel {
    let Some(column) = column else {
        return Panel::message(
            format!("{label} - Assumption (Not Available)"),
            "No assumption column found",
        );
    };
    let values = column.present_f64();
    match Summary::of(&values) {
        Some(summary) => histogram_panel(
            format!("{label} - Assumption"),
            &summary,
            format!("Assumption {label}"),
            &values,
            Fill::LightCoral,
        ),
        None => Panel::message(
            format!("{label} - Assumption (No Data)"),
            "No assumption data available",
        ),
    }
}

fn histogram_panel(
    title: String,
    summary: &Summary,
    x_label: String,
    values: &[f64],
    fill: Fill,
) -> Panel {
    Panel {
        title,
        subtitle: Some(format!(
            "Mean: {:.4}, Count: {}",
            summary.mean, summary.count
        )),
        x_label,
        y_label: String::from("Frequency"),
        body: PanelBody::Histogram {
            bins: stats::histogram(values, HISTOGRAM_BINS),
            fill,
        },
    }
}

fn present_values(column: Option<&Column>) -> Vec<f64> {
    column.map(Column::present_f64).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(label: &str) -> MetricPair {
        METRIC_PAIRS
            .into_iter()
            .find(|p| p.label == label)
            .expect("known pair")
    }

    fn table(columns: Vec<Column>) -> Table {
        Table::from_columns(columns).expect("valid table")
    }

    #[test]
    fn pairs_cover_nine_comparisons_and_one_single_panel() {
        let single = METRIC_PAIRS
            .iter()
            .filter(|p| p.layout == Layout::ActualOnly)
            .count();
        assert_eq!(METRIC_PAIRS.len(), 10);
        assert_eq!(single, 1);
        assert_eq!(pair("DQ30").actual, "ACTUAL_DQ30");
        assert_eq!(
            pair("UTIL").layout,
            Layout::Compare {
                assumption: Some("UTILIZATION")
            }
        );
    }

    #[test]
    fn missing_assumption_column_keeps_actual_histogram() {
        let table = table(vec![Column::from_f64(
            "ACTUAL_UTIL",
            vec![Some(0.25), Some(0.5), None],
        )]);
        let figure = plan_pair(&table, &pair("UTIL"));
        assert_eq!((figure.width, figure.height), PAIR_SIZE);
        assert_eq!(figure.panels[0].title, "UTIL - Actual");
        assert_eq!(
            figure.panels[0].subtitle.as_deref(),
            Some("Mean: 0.3750, Count: 2")
        );
        assert_eq!(figure.panels[1].title, "UTIL - Assumption (Not Available)");
        assert_eq!(
            figure.panels[1].body,
            PanelBody::Message("No assumption column found".into())
        );
    }

    #[test]
    fn empty_columns_plan_no_data_panels() {
        let table = table(vec![
            Column::from_f64("ACTUAL_SEVERITY", vec![None, None]),
            Column::from_f64("SEVERITY", vec![None, None]),
        ]);
        let figure = plan_pair(&table, &pair("SEVERITY"));
        assert_eq!(figure.panels[0].title, "SEVERITY - Actual (No Data)");
        assert_eq!(figure.panels[1].title, "SEVERITY - Assumption (No Data)");
        assert_eq!(
            figure.panels[1].body,
            PanelBody::Message("No assumption data available".into())
        );
    }

    #[test]
    fn dq30_is_a_single_panel() {
        let table = table(vec![Column::from_f64("ACTUAL_DQ30", vec![Some(0.1)])]);
        let figure = plan_pair(&table, &pair("DQ30"));
        assert_eq!((figure.width, figure.height), SINGLE_SIZE);
        assert_eq!(figure.panels.len(), 1);
        assert_eq!(figure.panels[0].title, "DQ30 - Actual Only");
        assert_eq!(figure.panels[0].x_label, "Actual DQ30");

        let empty = plan_pair(&Table::new(), &pair("DQ30"));
        assert_eq!(empty.panels[0].title, "DQ30 - Actual (No Data)");
        assert_eq!(
            empty.panels[0].body,
            PanelBody::Message("No DQ30 data available".into())
        );
    }
}
