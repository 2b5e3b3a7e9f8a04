use std::str::FromStr;

use clap::ValueEnum;
use image::Rgb;
use serde::Deserialize;

/// Shape drawn at the top of each bin in the points style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointShape {
    Block,
    Slab,
    #[default]
    Circle,
    Donut,
}

/// Style selector as given on the command line or in the config file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    #[default]
    Bars,
    Points,
    Line,
    Fill,
    Radial,
}

/// Fully resolved style with its geometry parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Style {
    Bars,
    Points { shape: PointShape, width: f64 },
    Line { thickness: f64 },
    Fill,
    /// `inner_radius` is a fraction of the largest radius that fits the frame
    Radial { inner_radius: f64 },
}

/// Styles drawn as an upright panel with bins growing up from the bottom row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PanelStyle {
    Bars,
    Points { shape: PointShape, width: f64 },
    Line { thickness: f64 },
    Fill,
}

/// Vertical duplication applied to a rendered panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mirror {
    #[default]
    Off,
    /// Bins grow outward from the horizontal center line
    Center,
    /// Bins grow inward from the top and bottom edges
    Edges,
}

impl TryFrom<u8> for Mirror {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mirror::Off),
            1 => Ok(Mirror::Center),
            2 => Ok(Mirror::Edges),
            other => Err(format!("mirror must be 0, 1 or 2, got {other}")),
        }
    }
}

/// Static parameters shared by every rendered frame of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleParams {
    pub width: u32,
    pub height: u32,
    pub bin_width: f64,
    pub bin_spacing: f64,
    pub style: Style,
    pub color: Rgb<u8>,
    pub background: Rgb<u8>,
    pub mirror: Mirror,
}

impl StyleParams {
    /// Horizontal pixel span of bin `k`.
    pub fn bin_span(&self, k: usize) -> (u32, u32) {
        let left = k as f64 * (self.bin_width + self.bin_spacing);
        let x0 = (left as u32).min(self.width);
        let x1 = ((left + self.bin_width) as u32).min(self.width);
        (x0, x1)
    }

    pub fn bin_center(&self, k: usize) -> f64 {
        k as f64 * (self.bin_width + self.bin_spacing) + self.bin_width / 2.0
    }
}

/// Opaque color given as hex (`rrggbb` or `rgb`, `#` optional) or as a CSS
/// color name such as `red` or `hotpink`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HexColor(pub Rgb<u8>);

impl FromStr for HexColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let color = csscolorparser::parse(s.trim()).map_err(|e| format!("invalid color '{s}': {e}"))?;
        match color.to_rgba8() {
            [r, g, b, 255] => Ok(HexColor(Rgb([r, g, b]))),
            _ => Err(format!("color '{s}' must be opaque")),
        }
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!("ff69b4".parse::<HexColor>().unwrap().0, Rgb([255, 105, 180]));
        assert_eq!("FF69B4".parse::<HexColor>().unwrap().0, Rgb([255, 105, 180]));
        assert_eq!("#acf".parse::<HexColor>().unwrap().0, Rgb([170, 204, 255]));
    }

    #[test]
    fn parses_css_color_names() {
        assert_eq!("hotpink".parse::<HexColor>().unwrap().0, Rgb([255, 105, 180]));
        assert_eq!("Red".parse::<HexColor>().unwrap().0, Rgb([255, 0, 0]));
        assert_eq!(" white ".parse::<HexColor>().unwrap().0, Rgb([255, 255, 255]));
    }

    #[test]
    fn rejects_unknown_and_translucent_colors() {
        assert!("notacolor".parse::<HexColor>().is_err());
        assert!("transparent".parse::<HexColor>().is_err());
        assert!("#ff000080".parse::<HexColor>().is_err());
        assert!("".parse::<HexColor>().is_err());
    }

    #[test]
    fn mirror_from_number() {
        assert_eq!(Mirror::try_from(1).unwrap(), Mirror::Center);
        assert!(Mirror::try_from(3).is_err());
    }

    #[test]
    fn bin_spans_follow_width_and_spacing() {
        let params = StyleParams {
            width: 100,
            height: 10,
            bin_width: 5.0,
            bin_spacing: 5.0,
            style: Style::Bars,
            color: Rgb([255, 255, 255]),
            background: Rgb([0, 0, 0]),
            mirror: Mirror::Off,
        };
        assert_eq!(params.bin_span(0), (0, 5));
        assert_eq!(params.bin_span(3), (30, 35));
        assert_eq!(params.bin_span(20), (100, 100));
        assert_eq!(params.bin_center(1), 12.5);
    }
}
