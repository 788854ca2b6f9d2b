use std::{fmt::Display, path::Path};

use log::debug;
use plotters::{
    coord::Shift,
    prelude::*,
    style::{
        FontTransform,
        text_anchor::{HPos, Pos, VPos},
    },
};

use super::{
    ChartWriter,
    figure::{Bar, Figure, Fill, Panel, PanelBody},
    typography::{self, FONT_FAMILY},
};
use crate::{error::RenderError, stats::Bin};

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Rasterizes figures into PNG files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngWriter;

impl ChartWriter for PngWriter {
    fn write(&self, figure: &Figure, path: &Path) -> Result<(), RenderError> {
        let labelled = typography::labels_available();
        let root = BitMapBackend::new(path, (figure.width, figure.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let areas = root.split_evenly((1, figure.panels.len().max(1)));
        for (area, panel) in areas.iter().zip(&figure.panels) {
            draw_panel(area, panel, labelled)?;
        }
        root.present().map_err(draw_err)?;
        debug!("Wrote {path:?}");
        Ok(())
    }
}

fn draw_err<E: Display>(err: E) -> RenderError {
    RenderError::Draw(err.to_string())
}

fn color(fill: Fill) -> RGBColor {
    match fill {
        Fill::SkyBlue => RGBColor(135, 206, 235),
        Fill::LightGreen => RGBColor(144, 238, 144),
        Fill::LightCoral => RGBColor(240, 128, 128),
    }
}

fn draw_panel(area: &Area<'_>, panel: &Panel, labelled: bool) -> Result<(), RenderError> {
    match &panel.body {
        PanelBody::Histogram { bins, fill } => draw_histogram(area, panel, bins, *fill, labelled),
        PanelBody::Bars { bars, fill } => draw_bars(area, panel, bars, *fill, labelled),
        PanelBody::Message(message) => draw_message(area, panel, message, labelled),
    }
}

fn draw_histogram(
    area: &Area<'_>,
    panel: &Panel,
    bins: &[Bin],
    fill: Fill,
    labelled: bool,
) -> Result<(), RenderError> {
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Err(RenderError::Draw(format!(
            "{}: values have no finite range to bin",
            panel.title
        )));
    };
    if !first.start.is_finite() || !last.end.is_finite() {
        return Err(RenderError::Draw(format!(
            "{}: histogram range {}..{} is not finite",
            panel.title, first.start, last.end
        )));
    }
    let peak = bins.iter().map(|b| b.count).max().unwrap_or(0);
    let y_max = (peak as f64 * 1.1).max(1.0);

    let mut builder = ChartBuilder::on(area);
    builder.margin(20);
    if labelled {
        builder
            .caption(panel.caption(), (FONT_FAMILY, 22))
            .x_label_area_size(45)
            .y_label_area_size(60);
    }
    let mut chart = builder
        .build_cartesian_2d(first.start..last.end, 0f64..y_max)
        .map_err(draw_err)?;
    if labelled {
        chart
            .configure_mesh()
            .x_desc(panel.x_label.as_str())
            .y_desc(panel.y_label.as_str())
            .draw()
            .map_err(draw_err)?;
    }
    let shade = color(fill);
    chart
        .draw_series(bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.start, 0.0), (bin.end, bin.count as f64)],
                shade.mix(0.7).filled(),
            )
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(bins.iter().filter(|bin| bin.count > 0).map(|bin| {
            Rectangle::new(
                [(bin.start, 0.0), (bin.end, bin.count as f64)],
                BLACK.stroke_width(1),
            )
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_bars(
    area: &Area<'_>,
    panel: &Panel,
    bars: &[Bar],
    fill: Fill,
    labelled: bool,
) -> Result<(), RenderError> {
    if bars.is_empty() {
        return Ok(());
    }
    let peak = bars.iter().map(|b| b.count).max().unwrap_or(0);
    let y_max = (peak as f64 * 1.15).max(1.0);
    let x_max = bars.len() as f64 - 0.5;

    let mut builder = ChartBuilder::on(area);
    builder.margin(20);
    if labelled {
        builder
            .caption(panel.caption(), (FONT_FAMILY, 22))
            .x_label_area_size(90)
            .y_label_area_size(60);
    }
    let mut chart = builder
        .build_cartesian_2d(-0.5f64..x_max, 0f64..y_max)
        .map_err(draw_err)?;
    if labelled {
        let tick_label = |x: &f64| {
            let nearest = x.round();
            if (x - nearest).abs() > 1e-6 || nearest < 0.0 {
                return String::new();
            }
            bars.get(nearest as usize)
                .map(|bar| bar.label.clone())
                .unwrap_or_default()
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len())
            .x_label_formatter(&tick_label)
            .x_label_style((FONT_FAMILY, 13).into_font().transform(FontTransform::Rotate90))
            .x_desc(panel.x_label.as_str())
            .y_desc(panel.y_label.as_str())
            .draw()
            .map_err(draw_err)?;
    }
    let shade = color(fill);
    chart
        .draw_series(bars.iter().enumerate().map(|(idx, bar)| {
            let center = idx as f64;
            Rectangle::new(
                [(center - 0.4, 0.0), (center + 0.4, bar.count as f64)],
                shade.mix(0.7).filled(),
            )
        }))
        .map_err(draw_err)?;
    if labelled {
        let offset = y_max * 0.01;
        chart
            .draw_series(bars.iter().enumerate().map(|(idx, bar)| {
                Text::new(
                    bar.count.to_string(),
                    (idx as f64 - 0.1, bar.count as f64 + offset),
                    (FONT_FAMILY, 13).into_font(),
                )
            }))
            .map_err(draw_err)?;
    }
    Ok(())
}

fn draw_message(
    area: &Area<'_>,
    panel: &Panel,
    message: &str,
    labelled: bool,
) -> Result<(), RenderError> {
    if !labelled {
        return Ok(());
    }
    let body = area
        .titled(&panel.caption(), (FONT_FAMILY, 22).into_font())
        .map_err(draw_err)?;
    let (width, height) = body.dim_in_pixel();
    let style = TextStyle::from((FONT_FAMILY, 24).into_font())
        .pos(Pos::new(HPos::Center, VPos::Center));
    body.draw(&Text::new(
        message.to_string(),
        ((width / 2) as i32, (height / 2) as i32),
        style,
    ))
    .map_err(draw_err)?;
    Ok(())
}
