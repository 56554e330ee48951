use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::palette::Colormap;
use super::{Canvas, RenderError, RenderOptions};

const BANDS: i32 = 64;
const TICKS: usize = 5;

/// Vertical color legend for a continuous scale spanning `min..=max`.
pub fn draw_colorbar(
    area: &Canvas<'_>,
    min: f64,
    max: f64,
    cmap: Colormap,
    opts: &RenderOptions,
) -> Result<(), RenderError> {
    let (width, height) = area.dim_in_pixel();
    let (width, height) = (width as i32, height as i32);

    let top = opts.px_i(16.0);
    let bottom = height - opts.px_i(36.0);
    let left = opts.px_i(4.0);
    let right = (left + opts.px_i(12.0)).min(width);
    if bottom - top < BANDS || right <= left {
        return Ok(());
    }

    let span = (bottom - top) as f64;
    for band in 0..BANDS {
        // Top band is the maximum.
        let y0 = top + (span * band as f64 / BANDS as f64).round() as i32;
        let y1 = top + (span * (band + 1) as f64 / BANDS as f64).round() as i32;
        let t = 1.0 - (band as f64 + 0.5) / BANDS as f64;
        area.draw(&Rectangle::new([(left, y0), (right, y1)], cmap.at(t).filled()))?;
    }
    area.draw(&Rectangle::new([(left, top), (right, bottom)], BLACK.stroke_width(1)))?;

    let style = opts
        .text(9.0)
        .pos(Pos::new(HPos::Left, VPos::Center));
    for (i, value) in tick_values(min, max).into_iter().enumerate() {
        let y = bottom - (span * i as f64 / (TICKS - 1) as f64).round() as i32;
        area.draw(&PathElement::new(
            vec![(right, y), (right + opts.px_i(3.0), y)],
            BLACK.stroke_width(1),
        ))?;
        area.draw(&Text::new(
            tick_label(value),
            (right + opts.px_i(5.0), y),
            style.clone(),
        ))?;
    }
    Ok(())
}

/// Evenly spaced tick values from `min` to `max`.
pub fn tick_values(min: f64, max: f64) -> Vec<f64> {
    (0..TICKS)
        .map(|i| min + (max - min) * i as f64 / (TICKS - 1) as f64)
        .collect()
}

fn tick_label(value: f64) -> String {
    if value.abs() >= 1000.0 || value.fract().abs() < 1e-9 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_span_the_range() {
        assert_eq!(tick_values(0.0, 4.0), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(tick_values(2.0, 2.0), vec![2.0; 5]);
    }

    #[test]
    fn tick_labels_drop_needless_decimals() {
        assert_eq!(tick_label(3.0), "3");
        assert_eq!(tick_label(1.25), "1.25");
        assert_eq!(tick_label(12345.6), "12346");
    }
}
