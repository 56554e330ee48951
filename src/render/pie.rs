//! Pie charts, drawn as polygons in pixel space.
//!
//! Wedges start at 12 o'clock and run counterclockwise. Each wedge is pushed
//! out along its bisector by its explode fraction of the radius, and the whole
//! pie sits on a soft offset shadow.

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::palette::resolve_colors;
use super::{Canvas, RenderError, RenderOptions};
use crate::chart::PieData;

const START_DEG: f64 = 90.0;

/// Angular extent and annotation of one wedge.
#[derive(Debug, Clone, PartialEq)]
pub struct Wedge {
    pub label: String,
    pub start_deg: f64,
    pub end_deg: f64,
    pub explode: f64,
    pub percent: f64,
}

impl Wedge {
    pub fn mid_deg(&self) -> f64 {
        (self.start_deg + self.end_deg) / 2.0
    }

    pub fn sweep_deg(&self) -> f64 {
        self.end_deg - self.start_deg
    }
}

pub fn check(data: &PieData) -> Result<(), RenderError> {
    if data.labels.len() != data.values.len() {
        return Err(RenderError::LengthMismatch {
            key: "values",
            expected: data.labels.len(),
            found: data.values.len(),
        });
    }
    if data.values.is_empty() {
        return Err(RenderError::InvalidData("pie has no wedges".into()));
    }
    if data.values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(RenderError::InvalidData(
            "pie values must be finite and non-negative".into(),
        ));
    }
    if data.values.iter().sum::<f64>() <= 0.0 {
        return Err(RenderError::InvalidData("pie values sum to zero".into()));
    }
    Ok(())
}

/// Wedges in input order. Assumes [`check`] passed.
pub fn wedges(data: &PieData) -> Vec<Wedge> {
    let total: f64 = data.values.iter().sum();
    let explode = data.explode_values();
    let mut start = START_DEG;
    data.labels
        .iter()
        .zip(data.values.iter())
        .zip(explode)
        .map(|((label, &value), explode)| {
            let fraction = value / total;
            let end = start + 360.0 * fraction;
            let wedge = Wedge {
                label: label.to_string(),
                start_deg: start,
                end_deg: end,
                explode: explode.max(0.0),
                percent: fraction * 100.0,
            };
            start = end;
            wedge
        })
        .collect()
}

fn polar(center: (f64, f64), radius: f64, deg: f64) -> (i32, i32) {
    let rad = deg.to_radians();
    (
        (center.0 + radius * rad.cos()).round() as i32,
        (center.1 - radius * rad.sin()).round() as i32,
    )
}

fn wedge_outline(center: (f64, f64), radius: f64, wedge: &Wedge) -> Vec<(i32, i32)> {
    let steps = (wedge.sweep_deg().ceil() as usize).max(2);
    let mut points = Vec::with_capacity(steps + 2);
    points.push((center.0.round() as i32, center.1.round() as i32));
    for i in 0..=steps {
        let deg = wedge.start_deg + wedge.sweep_deg() * i as f64 / steps as f64;
        points.push(polar(center, radius, deg));
    }
    points
}

fn wedge_center(center: (f64, f64), radius: f64, wedge: &Wedge) -> (f64, f64) {
    let rad = wedge.mid_deg().to_radians();
    let shift = wedge.explode * radius;
    (center.0 + shift * rad.cos(), center.1 - shift * rad.sin())
}

pub fn draw_pie(area: &Canvas<'_>, data: &PieData, opts: &RenderOptions) -> Result<(), RenderError> {
    let (width, height) = area.dim_in_pixel();
    let center = (width as f64 / 2.0, height as f64 / 2.0);
    let radius = width.min(height) as f64 / 2.0 * 0.72;

    let wedges = wedges(data);
    let colors = resolve_colors(data.colors.as_deref(), wedges.len());
    let visible: Vec<(&Wedge, RGBColor)> = wedges
        .iter()
        .zip(colors)
        .filter(|(w, _)| w.sweep_deg() > 0.0)
        .collect();

    let shadow_offset = radius * 0.025;
    for (wedge, _) in &visible {
        let c = wedge_center(center, radius, wedge);
        let shadow_center = (c.0 + shadow_offset, c.1 + shadow_offset);
        area.draw(&Polygon::new(
            wedge_outline(shadow_center, radius, wedge),
            BLACK.mix(0.3).filled(),
        ))?;
    }

    for (wedge, color) in &visible {
        let c = wedge_center(center, radius, wedge);
        let outline = wedge_outline(c, radius, wedge);
        area.draw(&Polygon::new(outline.clone(), color.filled()))?;
        let mut closed = outline;
        closed.push(closed[0]);
        area.draw(&PathElement::new(closed, WHITE.stroke_width(opts.px_u(1.0))))?;
    }

    let percent_style = opts.bold_text(10.0).pos(Pos::new(HPos::Center, VPos::Center));
    for (wedge, _) in &visible {
        let c = wedge_center(center, radius, wedge);
        let mid = wedge.mid_deg();

        area.draw(&Text::new(
            format!("{:.1}%", wedge.percent),
            polar(c, radius * 0.6, mid),
            percent_style.clone(),
        ))?;

        let hpos = if mid.to_radians().cos() >= 0.0 {
            HPos::Left
        } else {
            HPos::Right
        };
        area.draw(&Text::new(
            wedge.label.clone(),
            polar(c, radius * 1.1, mid),
            opts.text(10.0).pos(Pos::new(hpos, VPos::Center)),
        ))?;
    }
    Ok(())
}
