//! Chart rendering: a validated [`ChartSpec`] in, PNG bytes out.
//!
//! Each render owns its canvas (pixel buffer + bitmap backend) for the duration
//! of one call; both are dropped on every exit path before the result is
//! returned, so nothing accumulates across a batch.

pub mod cartesian;
pub mod colorbar;
pub mod heatmap;
pub mod palette;
pub mod pie;

use std::sync::LazyLock;
use std::time::Duration;

use base64::Engine as _;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle, TextStyle};
use thiserror::Error;

use crate::chart::{ChartConfig, ChartData, ChartKind, ChartSpec, SchemaError};
use crate::config::{CHART_HEIGHT_PX, CHART_WIDTH_PX};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid chart spec: {0}")]
    Schema(#[from] SchemaError),

    #[error("Heatmap matrix is not rectangular: row {row} has {found} cells, expected {expected}")]
    NonRectangularMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Length mismatch: '{key}' has {found} entries, expected {expected}")]
    LengthMismatch {
        key: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid chart data: {0}")]
    InvalidData(String),

    #[error("Drawing backend error: {0}")]
    Backend(String),

    #[error("PNG encoding error: {0}")]
    Encode(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Render timed out after {0:?}")]
    Timeout(Duration),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Backend(e.to_string())
    }
}

/// Canvas used by every drawing routine.
pub type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub(crate) const FONT_FAMILY: &str = "sans-serif";
const FONT_REGULAR: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const FONT_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

static FONTS: LazyLock<Result<(), String>> = LazyLock::new(|| {
    register_font(FONT_FAMILY, FontStyle::Normal, FONT_REGULAR)
        .map_err(|_| "regular face: invalid font data".to_string())?;
    register_font(FONT_FAMILY, FontStyle::Bold, FONT_BOLD)
        .map_err(|_| "bold face: invalid font data".to_string())?;
    Ok(())
});

fn ensure_fonts() -> Result<(), RenderError> {
    (*FONTS).clone().map_err(RenderError::Font)
}

/// Output geometry. Lengths given to drawing routines are in points at
/// 100 dpi on a 1000 px wide figure, scaled to the actual width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: CHART_WIDTH_PX,
            height: CHART_HEIGHT_PX,
        }
    }
}

impl RenderOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Points to pixels.
    pub fn px(&self, points: f64) -> f64 {
        points * self.width as f64 / 1000.0 * 100.0 / 72.0
    }

    pub fn px_i(&self, points: f64) -> i32 {
        self.px(points).round().max(1.0) as i32
    }

    pub fn px_u(&self, points: f64) -> u32 {
        self.px(points).round().max(1.0) as u32
    }

    pub fn text(&self, points: f64) -> TextStyle<'static> {
        TextStyle::from((FONT_FAMILY, self.px(points)).into_font())
    }

    pub fn bold_text(&self, points: f64) -> TextStyle<'static> {
        TextStyle::from((FONT_FAMILY, self.px(points)).into_font().style(FontStyle::Bold))
    }
}

/// One rendered chart.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub title: String,
    pub chart_type: ChartKind,
    pub image_bytes: Vec<u8>,
}

impl RenderedChart {
    pub fn image_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.image_bytes)
    }
}

/// Stateless renderer; cheap to copy into worker threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartRenderer {
    options: RenderOptions,
}

impl ChartRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Validate a wire config, then render it.
    pub fn render_config(&self, config: &ChartConfig) -> Result<RenderedChart, RenderError> {
        let spec = ChartSpec::from_config(config)?;
        self.render(&spec)
    }

    /// Render a spec to PNG. Deterministic for identical input.
    pub fn render(&self, spec: &ChartSpec) -> Result<RenderedChart, RenderError> {
        let _span =
            tracing::debug_span!("render_chart", chart_type = %spec.kind(), title = %spec.title)
                .entered();

        check_data(&spec.data)?;
        ensure_fonts()?;

        let RenderOptions { width, height } = self.options;
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidData("output size must be non-zero".into()));
        }

        let mut pixels = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            root.fill(&WHITE)?;
            let title = display_title(spec);
            let body = root.titled(&title, self.options.bold_text(14.0))?;
            self.draw(&body, spec)?;
            root.present()?;
        }

        let image_bytes = encode_png(&pixels, width, height)?;
        tracing::debug!(bytes = image_bytes.len(), "Chart rendered");

        Ok(RenderedChart {
            title: spec.title.clone(),
            chart_type: spec.kind(),
            image_bytes,
        })
    }

    fn draw(&self, body: &Canvas<'_>, spec: &ChartSpec) -> Result<(), RenderError> {
        let opts = &self.options;
        match &spec.data {
            ChartData::Line(data) => cartesian::draw_line(body, spec, data, opts),
            ChartData::Bar(data) => cartesian::draw_bar(body, spec, data, opts),
            ChartData::Area(data) => cartesian::draw_area(body, spec, data, opts),
            ChartData::Scatter(data) => cartesian::draw_scatter(body, spec, data, opts),
            ChartData::Pie(data) => pie::draw_pie(body, data, opts),
            ChartData::Heatmap(data) => heatmap::draw_heatmap(body, spec, data, opts),
        }
    }
}

/// Shape checks that must pass before a canvas is acquired.
fn check_data(data: &ChartData) -> Result<(), RenderError> {
    match data {
        ChartData::Line(d) | ChartData::Area(d) => cartesian::check_xy(d.x.len(), &d.y),
        ChartData::Bar(d) => cartesian::check_xy(d.x.len(), &d.y),
        ChartData::Scatter(d) => cartesian::check_xy(d.x.len(), &d.y),
        ChartData::Pie(d) => pie::check(d),
        ChartData::Heatmap(d) => heatmap::check(d),
    }
}

fn display_title(spec: &ChartSpec) -> String {
    let title = spec.title.trim();
    if title.is_empty() {
        format!("{} chart", spec.kind())
    } else {
        title.to_string()
    }
}

fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .encode(pixels, width, height, image::ColorType::Rgb8)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::demo_configs;
    use image::GenericImageView;
    use serde_json::json;

    fn small() -> ChartRenderer {
        ChartRenderer::new(RenderOptions::new(640, 384))
    }

    fn config(value: serde_json::Value) -> ChartConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn bundled_fonts_register() {
        assert!(ensure_fonts().is_ok());
        assert!(ensure_fonts().is_ok());
    }

    #[test]
    fn every_demo_chart_renders_to_png() {
        let renderer = small();
        for demo in demo_configs() {
            let chart = renderer.render_config(&demo).unwrap();
            assert!(!chart.image_bytes.is_empty(), "{} rendered empty", demo.chart_type);
            assert_eq!(&chart.image_bytes[..8], b"\x89PNG\r\n\x1a\n");
            assert_eq!(chart.title, demo.title);
        }
    }

    #[test]
    fn output_has_configured_resolution() {
        let chart = ChartRenderer::default()
            .render_config(&demo_configs()[1])
            .unwrap();
        let decoded = image::load_from_memory(&chart.image_bytes).unwrap();
        assert_eq!(decoded.dimensions(), (CHART_WIDTH_PX, CHART_HEIGHT_PX));
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = small();
        let a = renderer.render_config(&demo_configs()[2]).unwrap();
        let b = renderer.render_config(&demo_configs()[2]).unwrap();
        assert_eq!(a.image_bytes, b.image_bytes);
    }

    #[test]
    fn unknown_chart_type_is_render_error() {
        let err = small()
            .render_config(&config(json!({"chart_type": "radar", "title": "x", "data": {}})))
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::Schema(SchemaError::UnsupportedChartType(_))
        ));
    }

    #[test]
    fn missing_key_is_render_error() {
        let err = small()
            .render_config(&config(json!({"chart_type": "line", "title": "x", "data": {"x": [1]}})))
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::Schema(SchemaError::MissingKey { key: "y", .. })
        ));
    }

    #[test]
    fn ragged_heatmap_fails_rectangular_succeeds() {
        let renderer = small();
        let ragged = renderer
            .render_config(&config(json!({
                "chart_type": "heatmap",
                "title": "Ragged",
                "data": {"matrix": [[1, 2, 3], [4, 5]]}
            })))
            .unwrap_err();
        assert!(matches!(
            ragged,
            RenderError::NonRectangularMatrix { row: 1, expected: 3, found: 2 }
        ));

        let square = renderer
            .render_config(&config(json!({
                "chart_type": "heatmap",
                "title": "Square",
                "data": {"matrix": [[1, 2], [3, 4]]}
            })))
            .unwrap();
        assert!(!square.image_bytes.is_empty());
    }

    #[test]
    fn empty_title_still_renders() {
        let chart = small()
            .render_config(&config(json!({
                "chart_type": "area",
                "data": {"x": [1, 2, 3], "y": [3, 1, 2]}
            })))
            .unwrap();
        assert_eq!(chart.title, "");
        assert_eq!(chart.chart_type, ChartKind::Area);
    }

    #[test]
    fn base64_payload_decodes_to_image_bytes() {
        let chart = small().render_config(&demo_configs()[0]).unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(chart.image_base64())
            .unwrap();
        assert_eq!(decoded, chart.image_bytes);
    }

    #[test]
    fn points_scale_with_width() {
        let base = RenderOptions::new(1000, 600);
        let double = RenderOptions::new(2000, 1200);
        assert!((double.px(10.0) - 2.0 * base.px(10.0)).abs() < 1e-9);
        assert_eq!(base.px_u(0.0), 1);
    }
}
