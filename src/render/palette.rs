//! Categorical palette, continuous color scales and color-name parsing.

use plotters::style::RGBColor;

/// Twelve-color qualitative palette, cycled for categorical data.
pub const SET3: [RGBColor; 12] = [
    RGBColor(141, 211, 199),
    RGBColor(255, 255, 179),
    RGBColor(190, 186, 218),
    RGBColor(251, 128, 114),
    RGBColor(128, 177, 211),
    RGBColor(253, 180, 98),
    RGBColor(179, 222, 105),
    RGBColor(252, 205, 229),
    RGBColor(217, 217, 217),
    RGBColor(188, 128, 189),
    RGBColor(204, 235, 197),
    RGBColor(255, 237, 111),
];

/// Series color for line and area charts.
pub const SERIES_BLUE: RGBColor = RGBColor(31, 119, 180);

/// Palette color for category `index`.
pub fn categorical(index: usize) -> RGBColor {
    SET3[index % SET3.len()]
}

/// Explicit colors where parseable, palette colors elsewhere.
pub fn resolve_colors(requested: Option<&[String]>, count: usize) -> Vec<RGBColor> {
    (0..count)
        .map(|i| {
            requested
                .and_then(|colors| colors.get(i))
                .and_then(|c| {
                    let parsed = parse_color(c);
                    if parsed.is_none() {
                        tracing::debug!(color = %c, "Unrecognized color, using palette");
                    }
                    parsed
                })
                .unwrap_or_else(|| categorical(i))
        })
        .collect()
}

/// Parse `#rrggbb`, `#rgb` or a basic color name.
pub fn parse_color(raw: &str) -> Option<RGBColor> {
    let value = raw.trim().to_lowercase();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    let rgb = match value.as_str() {
        "red" => (214, 39, 40),
        "green" => (44, 160, 44),
        "blue" => (31, 119, 180),
        "orange" => (255, 127, 14),
        "purple" => (148, 103, 189),
        "brown" => (140, 86, 75),
        "pink" => (227, 119, 194),
        "gray" | "grey" => (127, 127, 127),
        "olive" => (188, 189, 34),
        "cyan" => (23, 190, 207),
        "yellow" => (255, 221, 0),
        "navy" => (0, 0, 128),
        "teal" => (0, 128, 128),
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        _ => return None,
    };
    Some(RGBColor(rgb.0, rgb.1, rgb.2))
}

fn parse_hex(hex: &str) -> Option<RGBColor> {
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(RGBColor(
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
        )),
        3 => {
            let mut out = [0u8; 3];
            for (slot, c) in out.iter_mut().zip(hex.chars()) {
                let v = c.to_digit(16)? as u8;
                *slot = v * 17;
            }
            Some(RGBColor(out[0], out[1], out[2]))
        }
        _ => None,
    }
}

/// Continuous color scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    /// Perceptually uniform dark-purple to yellow; scatter color values.
    Viridis,
    /// Light yellow to dark red; heatmap cells.
    YlOrRd,
}

const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

const YLORRD: [(u8, u8, u8); 5] = [
    (255, 255, 204),
    (254, 217, 118),
    (253, 141, 60),
    (227, 26, 28),
    (128, 0, 38),
];

impl Colormap {
    fn anchors(&self) -> &'static [(u8, u8, u8)] {
        match self {
            Self::Viridis => &VIRIDIS,
            Self::YlOrRd => &YLORRD,
        }
    }

    /// Color at position `t` in [0, 1]; out-of-range input is clamped.
    pub fn at(&self, t: f64) -> RGBColor {
        let anchors = self.anchors();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let scaled = t * (anchors.len() - 1) as f64;
        let lower = (scaled.floor() as usize).min(anchors.len() - 2);
        let frac = scaled - lower as f64;
        let (a, b) = (anchors[lower], anchors[lower + 1]);
        let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
    }

    /// Color for `value` on the scale spanning `min..=max`.
    pub fn map(&self, value: f64, min: f64, max: f64) -> RGBColor {
        self.at(normalize(value, min, max))
    }
}

/// Position of `value` within `min..=max`; 0.5 when the range is degenerate.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if (max - min).abs() < f64::EPSILON {
        0.5
    } else {
        (value - min) / (max - min)
    }
}

/// Min and max of finite values, if any.
pub fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles() {
        assert_eq!(categorical(0), SET3[0]);
        assert_eq!(categorical(12), SET3[0]);
        assert_eq!(categorical(13), SET3[1]);
    }

    #[test]
    fn parses_hex_and_names() {
        assert_eq!(parse_color("#ff0000"), Some(RGBColor(255, 0, 0)));
        assert_eq!(parse_color(" #0F0 "), Some(RGBColor(0, 255, 0)));
        assert_eq!(parse_color("Navy"), Some(RGBColor(0, 0, 128)));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
        assert_eq!(parse_color("chartreuse-ish"), None);
    }

    #[test]
    fn unparseable_colors_fall_back_to_palette() {
        let requested = vec!["#000000".to_string(), "nope".to_string()];
        let colors = resolve_colors(Some(requested.as_slice()), 3);
        assert_eq!(colors, vec![RGBColor(0, 0, 0), SET3[1], SET3[2]]);
    }

    #[test]
    fn colormap_endpoints() {
        assert_eq!(Colormap::Viridis.at(0.0), RGBColor(68, 1, 84));
        assert_eq!(Colormap::Viridis.at(1.0), RGBColor(253, 231, 37));
        assert_eq!(Colormap::YlOrRd.at(-3.0), RGBColor(255, 255, 204));
        assert_eq!(Colormap::YlOrRd.at(f64::NAN), RGBColor(255, 255, 204));
        assert_eq!(Colormap::YlOrRd.at(0.5), RGBColor(253, 141, 60));
    }

    #[test]
    fn degenerate_range_maps_to_middle() {
        assert_eq!(normalize(3.0, 3.0, 3.0), 0.5);
        assert_eq!(normalize(5.0, 0.0, 10.0), 0.5);
    }

    #[test]
    fn extent_skips_non_finite() {
        assert_eq!(extent(vec![3.0, f64::NAN, -1.0, 7.0]), Some((-1.0, 7.0)));
        assert_eq!(extent(Vec::<f64>::new()), None);
    }
}
