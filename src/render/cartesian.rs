//! Line, bar, area and scatter charts on x/y axes.

use std::ops::Range;

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use super::colorbar::draw_colorbar;
use super::palette::{extent, resolve_colors, Colormap, SERIES_BLUE};
use super::{Canvas, RenderError, RenderOptions};
use crate::chart::{AxisValue, BarData, ChartSpec, ScatterData, SeriesData};

type XyChart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Which grid lines to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grid {
    Both,
    HorizontalOnly,
}

/// `y` must pair one-to-one with `x`, be non-empty and finite.
pub fn check_xy(x_len: usize, y: &[f64]) -> Result<(), RenderError> {
    if x_len != y.len() {
        return Err(RenderError::LengthMismatch {
            key: "y",
            expected: x_len,
            found: y.len(),
        });
    }
    if y.is_empty() {
        return Err(RenderError::InvalidData("no data points".into()));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(RenderError::InvalidData("y contains non-finite values".into()));
    }
    Ok(())
}

/// Horizontal placement of data points.
///
/// Numeric x values are used as coordinates directly. Any text value turns the
/// axis categorical: point `i` sits at `i` and is labelled with its category.
#[derive(Debug, Clone, PartialEq)]
pub struct XAxis {
    pub positions: Vec<f64>,
    pub categories: Option<Vec<String>>,
}

impl XAxis {
    pub fn from_values(x: &[AxisValue]) -> Self {
        let numeric: Option<Vec<f64>> = x
            .iter()
            .map(|v| v.as_number().filter(|n| n.is_finite()))
            .collect();
        match numeric {
            Some(positions) => Self {
                positions,
                categories: None,
            },
            None => Self {
                positions: (0..x.len()).map(|i| i as f64).collect(),
                categories: Some(x.iter().map(ToString::to_string).collect()),
            },
        }
    }

    pub fn range(&self) -> Result<Range<f64>, RenderError> {
        match &self.categories {
            Some(categories) => Ok(-0.5..(categories.len() as f64 - 0.5)),
            None => {
                let (lo, hi) = extent(self.positions.iter().copied()).unwrap_or((0.0, 1.0));
                if (hi - lo).abs() < f64::EPSILON {
                    plottable("x", (lo - 1.0)..(hi + 1.0))
                } else {
                    let pad = (hi - lo) * 0.05;
                    plottable("x", (lo - pad)..(hi + pad))
                }
            }
        }
    }

    /// Category name for a tick at `v`; empty between categories.
    pub fn label_at(&self, v: f64) -> String {
        let Some(categories) = &self.categories else {
            return format_number(v);
        };
        let idx = v.round();
        if (v - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        categories.get(idx as usize).cloned().unwrap_or_default()
    }
}

/// Value range with headroom; pinned to zero when bars or areas grow from it.
pub fn value_range(values: &[f64], include_zero: bool) -> Result<Range<f64>, RenderError> {
    let (mut lo, mut hi) = extent(values.iter().copied()).unwrap_or((0.0, 1.0));
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 1.0;
        hi += 1.0;
    }
    let pad = (hi - lo) * 0.08;
    let lo = if include_zero && lo == 0.0 { 0.0 } else { lo - pad };
    let hi = if include_zero && hi == 0.0 { 0.0 } else { hi + pad };
    plottable("y", lo..hi)
}

/// An axis whose span overflows `f64` cannot be meshed.
fn plottable(axis: &str, range: Range<f64>) -> Result<Range<f64>, RenderError> {
    if (range.end - range.start).is_finite() {
        Ok(range)
    } else {
        Err(RenderError::InvalidData(format!("{axis} values span too wide a range to plot")))
    }
}

fn format_number(v: f64) -> String {
    if v.fract().abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format!("{v:.2}")
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

fn build_chart<'a, 'b>(
    area: &'a Canvas<'b>,
    x: Range<f64>,
    y: Range<f64>,
    opts: &RenderOptions,
) -> Result<XyChart<'a, 'b>, RenderError> {
    let chart = ChartBuilder::on(area)
        .margin(opts.px_i(10.0))
        .x_label_area_size(opts.px_i(32.0))
        .y_label_area_size(opts.px_i(48.0))
        .build_cartesian_2d(x, y)?;
    Ok(chart)
}

fn draw_mesh(
    chart: &mut XyChart<'_, '_>,
    spec: &ChartSpec,
    axis: &XAxis,
    grid: Grid,
    opts: &RenderOptions,
) -> Result<(), RenderError> {
    let x_formatter = |v: &f64| axis.label_at(*v);
    let y_formatter = |v: &f64| format_number(*v);

    let mut mesh = chart.configure_mesh();
    mesh.label_style(opts.text(10.0))
        .axis_desc_style(opts.text(11.0))
        .light_line_style(WHITE)
        .bold_line_style(BLACK.mix(0.12))
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter);

    if let Some(categories) = &axis.categories {
        mesh.x_labels(categories.len());
    }
    if grid == Grid::HorizontalOnly {
        mesh.disable_x_mesh();
    }
    if let Some(xlabel) = &spec.xlabel {
        mesh.x_desc(xlabel.as_str());
    }
    if let Some(ylabel) = &spec.ylabel {
        mesh.y_desc(ylabel.as_str());
    }
    mesh.draw()?;
    Ok(())
}

/// Polyline with circular markers; legend when the series is labelled.
pub fn draw_line(
    area: &Canvas<'_>,
    spec: &ChartSpec,
    data: &SeriesData,
    opts: &RenderOptions,
) -> Result<(), RenderError> {
    let axis = XAxis::from_values(&data.x);
    let mut chart = build_chart(area, axis.range()?, value_range(&data.y, false)?, opts)?;
    draw_mesh(&mut chart, spec, &axis, Grid::Both, opts)?;

    let points: Vec<(f64, f64)> = axis.positions.iter().copied().zip(data.y.iter().copied()).collect();
    let line_style = SERIES_BLUE.stroke_width(opts.px_u(2.0));

    let series = chart.draw_series(LineSeries::new(points.iter().copied(), line_style))?;
    let legend_label = data.label.as_deref().filter(|l| !l.trim().is_empty());
    if let Some(label) = legend_label {
        let swatch = opts.px_i(14.0);
        series
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + swatch, y)], line_style));
    }

    let radius = opts.px_i(4.0);
    chart.draw_series(
        points
            .iter()
            .map(|&p| Circle::new(p, radius, SERIES_BLUE.filled())),
    )?;

    if legend_label.is_some() {
        chart
            .configure_series_labels()
            .label_font(opts.text(10.0))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .draw()?;
    }
    Ok(())
}

/// One drawn bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: RGBColor,
}

/// Bars in input order with their resolved colors.
pub fn bars(data: &BarData) -> Vec<Bar> {
    let colors = resolve_colors(data.colors.as_deref(), data.x.len());
    data.x
        .iter()
        .zip(data.y.iter())
        .zip(colors)
        .map(|((x, &value), color)| Bar {
            label: x.to_string(),
            value,
            color,
        })
        .collect()
}

/// Vertical bars, one per category, horizontal grid only.
pub fn draw_bar(
    area: &Canvas<'_>,
    spec: &ChartSpec,
    data: &BarData,
    opts: &RenderOptions,
) -> Result<(), RenderError> {
    let bars = bars(data);
    let axis = XAxis {
        positions: (0..bars.len()).map(|i| i as f64).collect(),
        categories: Some(bars.iter().map(|b| b.label.clone()).collect()),
    };
    let mut chart = build_chart(area, axis.range()?, value_range(&data.y, true)?, opts)?;
    draw_mesh(&mut chart, spec, &axis, Grid::HorizontalOnly, opts)?;

    const HALF_WIDTH: f64 = 0.4;
    chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
        let x = i as f64;
        Rectangle::new(
            [(x - HALF_WIDTH, 0.0), (x + HALF_WIDTH, bar.value)],
            bar.color.mix(0.8).filled(),
        )
    }))?;
    chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
        let x = i as f64;
        Rectangle::new(
            [(x - HALF_WIDTH, 0.0), (x + HALF_WIDTH, bar.value)],
            BLACK.stroke_width(1),
        )
    }))?;
    Ok(())
}

/// Filled region under the curve at 40% opacity, plus the curve.
pub fn draw_area(
    area: &Canvas<'_>,
    spec: &ChartSpec,
    data: &SeriesData,
    opts: &RenderOptions,
) -> Result<(), RenderError> {
    let axis = XAxis::from_values(&data.x);
    let mut chart = build_chart(area, axis.range()?, value_range(&data.y, true)?, opts)?;
    draw_mesh(&mut chart, spec, &axis, Grid::Both, opts)?;

    let points: Vec<(f64, f64)> = axis.positions.iter().copied().zip(data.y.iter().copied()).collect();
    chart.draw_series(AreaSeries::new(points.iter().copied(), 0.0, SERIES_BLUE.mix(0.4)))?;
    chart.draw_series(LineSeries::new(
        points.iter().copied(),
        SERIES_BLUE.stroke_width(opts.px_u(2.0)),
    ))?;
    Ok(())
}

/// Marker radius in points for a marker area given in points squared.
pub fn marker_radius(size: f64) -> f64 {
    if size.is_finite() && size > 0.0 {
        size.sqrt() / 2.0
    } else {
        0.0
    }
}

/// Point markers colored on a continuous scale, with a color legend.
pub fn draw_scatter(
    area: &Canvas<'_>,
    spec: &ChartSpec,
    data: &ScatterData,
    opts: &RenderOptions,
) -> Result<(), RenderError> {
    let (plot, legend) = area.split_horizontally(area.dim_in_pixel().0 as i32 - opts.px_i(70.0));

    let axis = XAxis::from_values(&data.x);
    let mut chart = build_chart(&plot, axis.range()?, value_range(&data.y, false)?, opts)?;
    draw_mesh(&mut chart, spec, &axis, Grid::Both, opts)?;

    let sizes = data.sizes_or_default();
    let color_values = data.color_values();
    let (cmin, cmax) = extent(color_values.iter().copied()).unwrap_or((0.0, 1.0));

    let markers: Vec<((f64, f64), i32, RGBColor)> = axis
        .positions
        .iter()
        .zip(data.y.iter())
        .zip(sizes.iter().zip(color_values.iter()))
        .map(|((&x, &y), (&size, &c))| {
            let radius = opts.px(marker_radius(size)).round() as i32;
            ((x, y), radius, Colormap::Viridis.map(c, cmin, cmax))
        })
        .filter(|(_, radius, _)| *radius > 0)
        .collect();

    chart.draw_series(
        markers
            .iter()
            .map(|&(p, r, color)| Circle::new(p, r, color.mix(0.6).filled())),
    )?;
    chart.draw_series(
        markers
            .iter()
            .map(|&(p, r, _)| Circle::new(p, r, BLACK.stroke_width(1))),
    )?;

    draw_colorbar(&legend, cmin, cmax, Colormap::Viridis, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartData;
    use crate::render::palette::SET3;
    use crate::render::{ChartRenderer, RenderOptions};

    fn text(values: &[&str]) -> Vec<AxisValue> {
        values.iter().map(|s| AxisValue::Text(s.to_string())).collect()
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = check_xy(3, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            RenderError::LengthMismatch { key: "y", expected: 3, found: 2 }
        ));
        assert!(check_xy(0, &[]).is_err());
        assert!(check_xy(1, &[f64::NAN]).is_err());
        assert!(check_xy(2, &[1.0, 2.0]).is_ok());
    }

    #[test]
    fn text_x_makes_axis_categorical() {
        let axis = XAxis::from_values(&text(&["Q1", "Q2", "Q3"]));
        assert_eq!(axis.positions, vec![0.0, 1.0, 2.0]);
        assert_eq!(axis.range().unwrap(), -0.5..2.5);
        assert_eq!(axis.label_at(1.0), "Q2");
        assert_eq!(axis.label_at(1.5), "");
        assert_eq!(axis.label_at(7.0), "");
    }

    #[test]
    fn numeric_x_is_used_directly() {
        let axis = XAxis::from_values(&[AxisValue::Number(2020.0), AxisValue::Number(2024.0)]);
        assert_eq!(axis.positions, vec![2020.0, 2024.0]);
        assert!(axis.categories.is_none());
        let range = axis.range().unwrap();
        assert!(range.start < 2020.0 && range.end > 2024.0);
        assert_eq!(axis.label_at(2022.0), "2022");
    }

    #[test]
    fn value_range_pins_zero_for_bars() {
        let range = value_range(&[100.0, 140.0], true).unwrap();
        assert_eq!(range.start, 0.0);
        assert!(range.end > 140.0);

        let free = value_range(&[100.0, 140.0], false).unwrap();
        assert!(free.start > 0.0 && free.start < 100.0);

        let flat = value_range(&[5.0, 5.0], false).unwrap();
        assert!(flat.start < 5.0 && flat.end > 5.0);
    }

    #[test]
    fn overflowing_span_is_invalid_data() {
        assert!(matches!(
            value_range(&[-1e308, 1e308], true),
            Err(RenderError::InvalidData(_))
        ));
        assert!(value_range(&[1e308, 1e308], false).is_ok());
        let wide = XAxis::from_values(&[AxisValue::Number(-1e308), AxisValue::Number(1e308)]);
        assert!(matches!(wide.range(), Err(RenderError::InvalidData(_))));
    }

    #[test]
    fn overflowing_bar_and_area_fail_instead_of_hanging() {
        let renderer = ChartRenderer::new(RenderOptions::new(400, 240));
        let bar = ChartSpec {
            title: "Overflow".into(),
            xlabel: None,
            ylabel: None,
            data: ChartData::Bar(BarData {
                x: text(&["a", "b"]),
                y: vec![-1e308, 1e308],
                colors: None,
            }),
        };
        assert!(matches!(renderer.render(&bar), Err(RenderError::InvalidData(_))));

        let area = ChartSpec {
            title: "Overflow".into(),
            xlabel: None,
            ylabel: None,
            data: ChartData::Area(SeriesData {
                x: vec![AxisValue::Number(-1e308), AxisValue::Number(1e308)],
                y: vec![1.0, 2.0],
                label: None,
            }),
        };
        assert!(matches!(renderer.render(&area), Err(RenderError::InvalidData(_))));
    }

    #[test]
    fn bars_keep_input_order_and_palette() {
        let data = BarData {
            x: text(&["Q1", "Q2", "Q3", "Q4"]),
            y: vec![100.0, 120.0, 115.0, 140.0],
            colors: None,
        };
        let bars = bars(&data);
        let values: Vec<f64> = bars.iter().map(|b| b.value).collect();
        assert_eq!(values, vec![100.0, 120.0, 115.0, 140.0]);
        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Q1", "Q2", "Q3", "Q4"]);
        let colors: Vec<RGBColor> = bars.iter().map(|b| b.color).collect();
        assert_eq!(colors, SET3[..4].to_vec());
    }

    #[test]
    fn explicit_bar_colors_are_used() {
        let data = BarData {
            x: text(&["A", "B"]),
            y: vec![1.0, 2.0],
            colors: Some(vec!["#ff0000".into(), "blue".into()]),
        };
        let bars = bars(&data);
        assert_eq!(bars[0].color, RGBColor(255, 0, 0));
        assert_eq!(bars[1].color, RGBColor(31, 119, 180));
    }

    #[test]
    fn default_marker_is_five_points() {
        assert_eq!(marker_radius(100.0), 5.0);
        assert_eq!(marker_radius(-4.0), 0.0);
    }

    #[test]
    fn negative_bars_and_categorical_scatter_render() {
        let renderer = ChartRenderer::new(RenderOptions::new(500, 300));
        let bar = ChartSpec {
            title: "Net income".into(),
            xlabel: Some("Year".into()),
            ylabel: Some("bn".into()),
            data: ChartData::Bar(BarData {
                x: text(&["2022", "2023", "2024"]),
                y: vec![-20.0, 5.0, 30.0],
                colors: None,
            }),
        };
        assert!(!renderer.render(&bar).unwrap().image_bytes.is_empty());

        let scatter = ChartSpec {
            title: "Spread".into(),
            xlabel: None,
            ylabel: None,
            data: ChartData::Scatter(ScatterData {
                x: text(&["a", "b", "c"]),
                y: vec![1.0, 3.0, 2.0],
                sizes: Some(vec![40.0, 400.0]),
                colors: Some(vec![0.1, 0.5, 0.9]),
            }),
        };
        assert!(!renderer.render(&scatter).unwrap().image_bytes.is_empty());
    }

    #[test]
    fn labelled_line_renders_with_legend() {
        let renderer = ChartRenderer::new(RenderOptions::new(500, 300));
        let line = ChartSpec {
            title: "Revenue".into(),
            xlabel: None,
            ylabel: None,
            data: ChartData::Line(SeriesData {
                x: text(&["Q1", "Q2"]),
                y: vec![1.0, 2.0],
                label: Some("Revenue".into()),
            }),
        };
        assert!(!renderer.render(&line).unwrap().image_bytes.is_empty());
    }
}
