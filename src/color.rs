//! Color and gradient specifiers shared by tour colors and export backgrounds.
//!
//! Accepted forms:
//! - `#rgb`, `#rrggbb`, `#rrggbbaa`
//! - a handful of named colors (`white`, `black`, `navy`, ...)
//! - `linear-gradient(<angle>deg | to <side>, <color> [<pct>%], <color> [<pct>%], ...)`

use std::str::FromStr;

use image::Rgba;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColorError {
    #[error("unsupported color {0:?}")]
    Unsupported(String),

    #[error("gradient needs at least two color stops: {0:?}")]
    TooFewStops(String),

    #[error("invalid gradient direction {0:?}")]
    Direction(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub color: Rgba<u8>,
    /// Offset along the gradient line, 0.0..=1.0
    pub position: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpec {
    Solid(Rgba<u8>),
    LinearGradient { angle_deg: f32, stops: Vec<ColorStop> },
}

impl ColorSpec {
    /// Representative color, used where a gradient cannot be drawn (text tint)
    pub fn primary(&self) -> Rgba<u8> {
        match self {
            ColorSpec::Solid(c) => *c,
            ColorSpec::LinearGradient { stops, .. } => stops[0].color,
        }
    }

    /// Color at pixel `(x, y)` of a `width` x `height` area
    pub fn color_at(&self, x: u32, y: u32, width: u32, height: u32) -> Rgba<u8> {
        match self {
            ColorSpec::Solid(c) => *c,
            ColorSpec::LinearGradient { angle_deg, stops } => {
                let t = gradient_offset(*angle_deg, x, y, width, height);
                sample_stops(stops, t)
            }
        }
    }
}

impl FromStr for ColorSpec {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let lower = s.to_ascii_lowercase();
        if let Some(inner) = lower
            .strip_prefix("linear-gradient(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_gradient(inner, s);
        }
        parse_color(&lower).map(ColorSpec::Solid)
    }
}

fn parse_gradient(inner: &str, original: &str) -> Result<ColorSpec, ColorError> {
    let mut parts: Vec<&str> = inner.split(',').map(str::trim).collect();

    // CSS default direction is top to bottom
    let mut angle_deg = 180.0;
    if let Some(&first) = parts.first() {
        if let Some(deg) = first.strip_suffix("deg") {
            angle_deg = deg
                .trim()
                .parse()
                .map_err(|_| ColorError::Direction(first.to_string()))?;
            parts.remove(0);
        } else if let Some(side) = first.strip_prefix("to ") {
            angle_deg = side_angle(side.trim()).ok_or_else(|| ColorError::Direction(first.to_string()))?;
            parts.remove(0);
        }
    }

    if parts.len() < 2 {
        return Err(ColorError::TooFewStops(original.to_string()));
    }

    let mut colors = Vec::with_capacity(parts.len());
    let mut positions = Vec::with_capacity(parts.len());
    for part in &parts {
        let mut tokens = part.split_whitespace();
        let color = tokens
            .next()
            .ok_or_else(|| ColorError::Unsupported(part.to_string()))?;
        colors.push(parse_color(color)?);
        let position = match tokens.next() {
            Some(pct) => Some(
                pct.strip_suffix('%')
                    .and_then(|p| p.parse::<f32>().ok())
                    .ok_or_else(|| ColorError::Unsupported(part.to_string()))?
                    / 100.0,
            ),
            None => None,
        };
        positions.push(position);
    }

    // Explicit offsets are honoured only when every stop has one.
    let last = (colors.len() - 1) as f32;
    let stops = colors
        .into_iter()
        .enumerate()
        .map(|(i, color)| ColorStop {
            color,
            position: if positions.iter().all(Option::is_some) {
                positions[i].unwrap_or_default().clamp(0.0, 1.0)
            } else {
                i as f32 / last
            },
        })
        .collect();

    Ok(ColorSpec::LinearGradient { angle_deg, stops })
}

fn side_angle(side: &str) -> Option<f32> {
    match side {
        "top" => Some(0.0),
        "top right" | "right top" => Some(45.0),
        "right" => Some(90.0),
        "bottom right" | "right bottom" => Some(135.0),
        "bottom" => Some(180.0),
        "bottom left" | "left bottom" => Some(225.0),
        "left" => Some(270.0),
        "top left" | "left top" => Some(315.0),
        _ => None,
    }
}

fn parse_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| ColorError::Unsupported(s.to_string()));
    }
    let rgb = match s {
        "white" => [255, 255, 255],
        "black" => [0, 0, 0],
        "gray" | "grey" => [128, 128, 128],
        "red" => [255, 0, 0],
        "blue" => [0, 0, 255],
        "navy" => [0, 0, 128],
        "pink" => [255, 192, 203],
        "orange" => [255, 165, 0],
        "yellow" => [255, 255, 0],
        "green" => [0, 128, 0],
        "purple" => [128, 0, 128],
        _ => return Err(ColorError::Unsupported(s.to_string())),
    };
    Ok(Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(Rgba([nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17, 255])),
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

/// Position of a pixel along a CSS gradient line (0deg points up, 90deg right)
fn gradient_offset(angle_deg: f32, x: u32, y: u32, width: u32, height: u32) -> f32 {
    let rad = angle_deg.to_radians();
    let (dx, dy) = (rad.sin(), -rad.cos());
    let (w, h) = (width as f32, height as f32);
    let length = (w * dx).abs() + (h * dy).abs();
    if length == 0.0 {
        return 0.0;
    }
    let px = x as f32 + 0.5 - w / 2.0;
    let py = y as f32 + 0.5 - h / 2.0;
    ((px * dx + py * dy) / length + 0.5).clamp(0.0, 1.0)
}

fn sample_stops(stops: &[ColorStop], t: f32) -> Rgba<u8> {
    let first = stops[0];
    if t <= first.position {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.position {
            let span = b.position - a.position;
            let f = if span <= f32::EPSILON { 1.0 } else { (t - a.position) / span };
            return lerp(a.color, b.color, f);
        }
    }
    stops[stops.len() - 1].color
}

fn lerp(a: Rgba<u8>, b: Rgba<u8>, f: f32) -> Rgba<u8> {
    let mix = |i: usize| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * f).round() as u8;
    Rgba([mix(0), mix(1), mix(2), mix(3)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!("#fff".parse(), Ok(ColorSpec::Solid(Rgba([255, 255, 255, 255]))));
        assert_eq!("#1E90FF".parse(), Ok(ColorSpec::Solid(Rgba([30, 144, 255, 255]))));
        assert_eq!("#00000080".parse(), Ok(ColorSpec::Solid(Rgba([0, 0, 0, 128]))));
        assert!("#12345".parse::<ColorSpec>().is_err());
    }

    #[test]
    fn gradient_without_offsets_spreads_stops_evenly() {
        let spec: ColorSpec = "linear-gradient(90deg, #000, #888, #fff)".parse().unwrap();
        let ColorSpec::LinearGradient { angle_deg, stops } = spec else {
            panic!("expected gradient");
        };
        assert_eq!(angle_deg, 90.0);
        let positions: Vec<f32> = stops.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn horizontal_gradient_runs_left_to_right() {
        let spec: ColorSpec = "linear-gradient(to right, #000000, #ffffff)".parse().unwrap();
        let left = spec.color_at(0, 5, 100, 10);
        let right = spec.color_at(99, 5, 100, 10);
        assert!(left[0] < 5);
        assert!(right[0] > 250);
    }

    #[test]
    fn single_stop_gradient_is_rejected() {
        assert!(matches!(
            "linear-gradient(45deg, #fff)".parse::<ColorSpec>(),
            Err(ColorError::TooFewStops(_))
        ));
    }
}
