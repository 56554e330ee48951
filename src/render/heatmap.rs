//! Annotated heatmaps: one colored cell per matrix entry, first row on top.

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::colorbar::draw_colorbar;
use super::palette::{extent, Colormap};
use super::{Canvas, RenderError, RenderOptions};
use crate::chart::{AxisValue, ChartSpec, HeatmapData};

pub fn check(data: &HeatmapData) -> Result<(), RenderError> {
    let Some(first) = data.matrix.first() else {
        return Err(RenderError::InvalidData("heatmap matrix is empty".into()));
    };
    let expected = first.len();
    if expected == 0 {
        return Err(RenderError::InvalidData("heatmap rows are empty".into()));
    }
    for (row, cells) in data.matrix.iter().enumerate() {
        if cells.len() != expected {
            return Err(RenderError::NonRectangularMatrix {
                row,
                expected,
                found: cells.len(),
            });
        }
    }
    if data.matrix.iter().flatten().any(|v| !v.is_finite()) {
        return Err(RenderError::InvalidData("heatmap contains non-finite values".into()));
    }
    Ok(())
}

/// Tick labels for `count` rows or columns; indices fill in missing names.
pub fn axis_labels(labels: Option<&[AxisValue]>, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            labels
                .and_then(|l| l.get(i))
                .map(ToString::to_string)
                .unwrap_or_else(|| i.to_string())
        })
        .collect()
}

/// Readable annotation color against a cell of the given normalized value.
fn annotation_color(t: f64) -> &'static RGBColor {
    if t > 0.6 {
        &WHITE
    } else {
        &BLACK
    }
}

pub fn draw_heatmap(
    area: &Canvas<'_>,
    spec: &ChartSpec,
    data: &HeatmapData,
    opts: &RenderOptions,
) -> Result<(), RenderError> {
    let rows = data.matrix.len();
    let cols = data.matrix.first().map_or(0, Vec::len);
    let xlabels = axis_labels(data.xlabels.as_deref(), cols);
    let ylabels = axis_labels(data.ylabels.as_deref(), rows);
    let (min, max) = extent(data.matrix.iter().flatten().copied()).unwrap_or((0.0, 1.0));

    let (plot, legend) = area.split_horizontally(area.dim_in_pixel().0 as i32 - opts.px_i(70.0));

    let x_formatter = |v: &f64| label_at(&xlabels, *v);
    // Row 0 is drawn at the top, so the y axis counts down.
    let y_formatter = |v: &f64| label_at(&ylabels, rows as f64 - 1.0 - *v);

    let mut chart = ChartBuilder::on(&plot)
        .margin(opts.px_i(10.0))
        .x_label_area_size(opts.px_i(32.0))
        .y_label_area_size(opts.px_i(64.0))
        .build_cartesian_2d(-0.5..(cols as f64 - 0.5), -0.5..(rows as f64 - 0.5))?;

    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh()
        .x_labels(cols)
        .y_labels(rows)
        .label_style(opts.text(10.0))
        .axis_desc_style(opts.text(11.0))
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter);
    if let Some(xlabel) = &spec.xlabel {
        mesh.x_desc(xlabel.as_str());
    }
    if let Some(ylabel) = &spec.ylabel {
        mesh.y_desc(ylabel.as_str());
    }
    mesh.draw()?;

    let cells: Vec<(f64, f64, f64)> = data
        .matrix
        .iter()
        .enumerate()
        .flat_map(|(i, row)| {
            let y = (rows - 1 - i) as f64;
            row.iter().enumerate().map(move |(j, &v)| (j as f64, y, v))
        })
        .collect();

    chart.draw_series(cells.iter().map(|&(x, y, v)| {
        Rectangle::new(
            [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
            Colormap::YlOrRd.map(v, min, max).filled(),
        )
    }))?;
    chart.draw_series(cells.iter().map(|&(x, y, _)| {
        Rectangle::new(
            [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
            WHITE.stroke_width(opts.px_u(0.5)),
        )
    }))?;

    let anchor = Pos::new(HPos::Center, VPos::Center);
    chart.draw_series(cells.iter().map(|&(x, y, v)| {
        let t = super::palette::normalize(v, min, max);
        let style = opts.text(9.0).pos(anchor).color(annotation_color(t));
        Text::new(format!("{v:.1}"), (x, y), style)
    }))?;

    draw_colorbar(&legend, min, max, Colormap::YlOrRd, opts)
}

fn label_at(labels: &[String], v: f64) -> String {
    let idx = v.round();
    if (v - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}
