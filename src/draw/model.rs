use crate::draw::geometry::Point;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

pub const MIN_LINE_WIDTH: u32 = 1;
pub const MAX_LINE_WIDTH: u32 = 10;
pub const MAX_OPACITY: u8 = 100;
const FONT_SIZE_PER_WIDTH: u32 = 5;

/// RGB color written as `#rrggbb`. Remembers whether it was spelled with
/// uppercase digits so it is echoed back the way it came in; the spelling
/// does not take part in equality.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    uppercase: bool,
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        self.to_rgb_array() == other.to_rgb_array()
    }
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_rgb_array().hash(state);
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            uppercase: false,
        }
    }

    pub const fn with_uppercase_hex(self) -> Self {
        Self {
            uppercase: true,
            ..self
        }
    }

    pub const fn to_rgb_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_rgb_array(color: [u8; 3]) -> Self {
        Self::rgb(color[0], color[1], color[2])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uppercase {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        }
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    /// Accepts `#rrggbb` and the short `#rgb` form.
    fn from_str(s: &str) -> Result<Self> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| anyhow!("color '{s}' must start with '#'"))?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow!("color '{s}' contains non-hex digits"));
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16);
        let color = match hex.len() {
            6 => Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            ),
            3 => {
                let expand = |idx: usize| channel(&hex[idx..idx + 1]).map(|v| v * 17);
                Self::rgb(expand(0)?, expand(1)?, expand(2)?)
            }
            _ => return Err(anyhow!("color '{s}' must have 3 or 6 hex digits")),
        };
        let uppercase = hex.chars().any(|c| c.is_ascii_uppercase())
            && !hex.chars().any(|c| c.is_ascii_lowercase());
        Ok(if uppercase {
            color.with_uppercase_hex()
        } else {
            color
        })
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Pen,
    Eraser,
    Rectangle,
    Ellipse,
    Arrow,
    Text,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Pen,
        Mode::Eraser,
        Mode::Rectangle,
        Mode::Ellipse,
        Mode::Arrow,
        Mode::Text,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Pen => "pen",
            Mode::Eraser => "eraser",
            Mode::Rectangle => "rectangle",
            Mode::Ellipse => "ellipse",
            Mode::Arrow => "arrow",
            Mode::Text => "text",
        }
    }

    pub fn is_freehand(self) -> bool {
        matches!(self, Mode::Pen | Mode::Eraser)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s.trim())
            .ok_or_else(|| anyhow!("unknown draw mode '{s}'"))
    }
}

/// Current drawing style. Only changed through bus commands or config load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub line_width: u32,
    pub stroke_color: Color,
    pub background_color: Color,
    pub fill_color: Option<Color>,
    pub opacity: u8,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            line_width: 5,
            stroke_color: Color::BLACK,
            background_color: Color::WHITE,
            fill_color: None,
            opacity: 80,
        }
    }
}

impl Style {
    pub fn font_size(&self) -> u32 {
        self.line_width * FONT_SIZE_PER_WIDTH
    }

    pub fn shape_style(&self) -> ShapeStyle {
        ShapeStyle {
            outline: Some(self.stroke_color),
            fill: self.fill_color,
            width: self.line_width,
        }
    }

    pub fn stroke_style(&self, color: Color) -> ShapeStyle {
        ShapeStyle {
            outline: Some(color),
            fill: None,
            width: self.line_width,
        }
    }
}

pub fn clamp_line_width(width: u32) -> u32 {
    width.clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH)
}

pub fn clamp_opacity(opacity: u32) -> u8 {
    opacity.min(u32::from(MAX_OPACITY)) as u8
}

/// Paint attributes handed to the canvas alongside a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeStyle {
    pub outline: Option<Color>,
    pub fill: Option<Color>,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Smoothed segment with round caps.
    Line { from: Point, to: Point },
    Rectangle { corner_a: Point, corner_b: Point },
    Oval { corner_a: Point, corner_b: Point },
    Polygon { points: Vec<Point> },
    Text { at: Point, text: String, size: u32 },
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Line { .. } => "line",
            Shape::Rectangle { .. } => "rectangle",
            Shape::Oval { .. } => "oval",
            Shape::Polygon { .. } => "polygon",
            Shape::Text { .. } => "text",
        }
    }
}

/// Undo grouping class of a committed primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTag {
    StrokeStart,
    StrokeContinuation,
    Discrete,
}

impl PrimitiveTag {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveTag::StrokeStart => "manual-start",
            PrimitiveTag::StrokeContinuation => "manual",
            PrimitiveTag::Discrete => "shape",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveHandle(pub u64);
