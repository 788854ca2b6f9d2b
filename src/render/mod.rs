//! Chart planning and rasterization.
//!
//! A chart is first planned as a [`Figure`] (bins, bars, titles) from one
//! column, which is pure and comparable between runs. A [`ChartWriter`] then
//! turns the figure into an image file.

pub mod figure;
pub mod png;
pub mod typography;

use std::path::{Path, PathBuf};

use crate::{
    classify::ChartKind,
    data::Column,
    error::RenderError,
    frequency,
    stats::{self, HISTOGRAM_BINS, RANGE_BUCKETS, Summary, format_number},
};

pub use figure::{Bar, Figure, Fill, Panel, PanelBody};
pub use png::PngWriter;

pub const HISTOGRAM_SIZE: (u32, u32) = (1200, 720);
pub const BAR_CHART_SIZE: (u32, u32) = (1440, 720);
pub const NO_DATA: &str = "No data to plot";

pub trait ChartWriter {
    fn write(&self, figure: &Figure, path: &Path) -> Result<(), RenderError>;
}

impl<W: ChartWriter + ?Sized> ChartWriter for &W {
    fn write(&self, figure: &Figure, path: &Path) -> Result<(), RenderError> {
        (**self).write(figure, path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub output_dir: PathBuf,
}

impl Artifact {
    pub fn new(filename: impl Into<String>, output_dir: &Path) -> Self {
        Self {
            filename: filename.into(),
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.output_dir.join(&self.filename)
    }
}

/// Plans and writes one chart for `column`.
pub fn render<W: ChartWriter + ?Sized>(
    column: &Column,
    kind: ChartKind,
    output_dir: &Path,
    writer: &W,
) -> Result<Artifact, RenderError> {
    render_figure(
        &plan_column(column, kind),
        kind.filename(column.name()),
        output_dir,
        writer,
    )
}

/// Writes an already planned figure as `output_dir/filename`.
pub fn render_figure<W: ChartWriter + ?Sized>(
    figure: &Figure,
    filename: String,
    output_dir: &Path,
    writer: &W,
) -> Result<Artifact, RenderError> {
    let artifact = Artifact::new(filename, output_dir);
    writer.write(figure, &artifact.path())?;
    Ok(artifact)
}

pub fn plan_column(column: &Column, kind: ChartKind) -> Figure {
    match kind {
        ChartKind::Histogram => {
            let (w, h) = HISTOGRAM_SIZE;
            Figure::single(w, h, histogram_panel(column))
        }
        ChartKind::RangedBar => {
            let (w, h) = BAR_CHART_SIZE;
            Figure::single(w, h, ranged_bar_panel(column))
        }
        ChartKind::CategoricalBar => {
            let (w, h) = BAR_CHART_SIZE;
            Figure::single(w, h, categorical_bar_panel(column))
        }
    }
}

fn histogram_panel(column: &Column) -> Panel {
    let values = column.present_f64();
    let Some(summary) = Summary::of(&values) else {
        return Panel::message(column.name(), NO_DATA);
    };
    Panel {
        title: format!("{} Distribution", column.name()),
        subtitle: Some(format!(
            "Mean: {}, Min: {}, Max: {}",
            format_number(summary.mean),
            format_number(summary.min),
            format_number(summary.max)
        )),
        x_label: column.name().to_string(),
        y_label: String::from("Frequency"),
        body: PanelBody::Histogram {
            bins: stats::histogram(&values, HISTOGRAM_BINS),
            fill: Fill::SkyBlue,
        },
    }
}

fn ranged_bar_panel(column: &Column) -> Panel {
    let values = column.present_f64();
    let Some(buckets) = stats::range_buckets(&values, RANGE_BUCKETS) else {
        return Panel::message(column.name(), NO_DATA);
    };
    Panel {
        title: format!("{} Distribution by Ranges", column.name()),
        subtitle: Some(format!("Total Records: {}", values.len())),
        x_label: format!("{} Ranges", column.name()),
        y_label: String::from("Count"),
        body: PanelBody::Bars {
            bars: buckets
                .into_iter()
                .map(|bucket| Bar {
                    label: bucket.label,
                    count: bucket.count,
                })
                .collect(),
            fill: Fill::LightGreen,
        },
    }
}

fn categorical_bar_panel(column: &Column) -> Panel {
    let counts = frequency::value_counts(column);
    if counts.is_empty() {
        return Panel::message(column.name(), NO_DATA);
    }
    Panel {
        title: format!("{} Value Counts", column.name()),
        subtitle: Some(format!("Unique Values: {}", counts.len())),
        x_label: column.name().to_string(),
        y_label: String::from("Count"),
        body: PanelBody::Bars {
            bars: counts
                .into_iter()
                .map(|vc| Bar {
                    label: vc.value,
                    count: vc.count,
                })
                .collect(),
            fill: Fill::LightCoral,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    #[test]
    fn histogram_title_reports_summary_statistics() {
        let column = Column::new(
            "X",
            vec![Some(Value::Integer(1)), Some(Value::Integer(2)), None],
        );
        let figure = plan_column(&column, ChartKind::Histogram);
        let panel = &figure.panels[0];
        assert_eq!(panel.title, "X Distribution");
        assert_eq!(
            panel.subtitle.as_deref(),
            Some("Mean: 1.5000, Min: 1, Max: 2")
        );
        match &panel.body {
            PanelBody::Histogram { bins, .. } => {
                assert_eq!(bins.len(), HISTOGRAM_BINS);
                assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
            }
            other => panic!("expected histogram body, got {other:?}"),
        }
    }

    #[test]
    fn empty_histogram_plans_placeholder() {
        let column = Column::new("X", vec![None, None]);
        let figure = plan_column(&column, ChartKind::Histogram);
        assert_eq!(figure.panels[0].body, PanelBody::Message(NO_DATA.into()));
    }

    #[test]
    fn zero_width_range_plans_placeholder() {
        let column = Column::from_f64("X", vec![Some(4.0); 3]);
        let figure = plan_column(&column, ChartKind::RangedBar);
        assert!(figure.panels[0].is_placeholder());
    }

    #[test]
    fn artifact_path_joins_directory_and_filename() {
        let artifact = Artifact::new("X_histogram.png", Path::new("charts"));
        assert_eq!(artifact.path(), Path::new("charts").join("X_histogram.png"));
    }
}
