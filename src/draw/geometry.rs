use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::f64::consts::FRAC_PI_6;
use std::fmt;
use std::str::FromStr;

/// Fraction of the shaft length used for the arrowhead barbs.
pub const ARROW_HEAD_SCALE: f64 = 0.2;

static GEOMETRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)x(\d+)([+-])(-?\d+)([+-])(-?\d+)$").expect("geometry regex compiles")
});

static RATIO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*[xX:]\s*(\d+)\s*$").expect("ratio regex compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x as f64, y as f64)
    }
}

/// How a rectangle or ellipse drag interprets the two pointer positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragConstraint {
    /// Anchor and pointer are opposite corners.
    #[default]
    Free,
    /// One axis follows the signed delta of the other, corner pinned to the anchor.
    Square,
    /// Anchor is the center of a square bounding box.
    Centered,
}

/// Barb points of the arrowhead at `tip` for a shaft starting at `anchor`.
///
/// The reverse shaft vector is rotated by +30 degrees for the first barb and
/// by -30 degrees for the second, then scaled by [`ARROW_HEAD_SCALE`].
pub fn arrow_tips(anchor: Point, tip: Point) -> (Point, Point) {
    let dx = anchor.x - tip.x;
    let dy = anchor.y - tip.y;
    let (sin, cos) = FRAC_PI_6.sin_cos();

    let tip1 = Point::new(
        tip.x + ARROW_HEAD_SCALE * (dx * cos + dy * sin),
        tip.y + ARROW_HEAD_SCALE * (dy * cos - dx * sin),
    );
    let tip2 = Point::new(
        tip.x + ARROW_HEAD_SCALE * (dx * cos - dy * sin),
        tip.y + ARROW_HEAD_SCALE * (dy * cos + dx * sin),
    );
    (tip1, tip2)
}

/// Single closed outline covering shaft and head: anchor, tip, barb, tip, barb, tip.
pub fn arrow_polygon(anchor: Point, tip: Point) -> Vec<Point> {
    let (tip1, tip2) = arrow_tips(anchor, tip);
    vec![anchor, tip, tip1, tip, tip2, tip]
}

/// Opposite corners of a rectangle dragged from `anchor` to `current`.
pub fn rectangle_corners(
    anchor: (i32, i32),
    current: (i32, i32),
    constraint: DragConstraint,
) -> (Point, Point) {
    let (sx, sy) = anchor;
    let (x, y) = current;
    match constraint {
        DragConstraint::Free => (Point::from(anchor), Point::from(current)),
        DragConstraint::Square => (Point::from(anchor), square_corner(anchor, current)),
        DragConstraint::Centered => {
            let radius = (sx - x).min(sy - y) as f64;
            centered_box(Point::from(anchor), radius)
        }
    }
}

/// Bounding box of an ellipse dragged from `anchor` to `current`.
///
/// Identical to [`rectangle_corners`] except the centered variant, whose
/// radius is the Euclidean distance between the two points.
pub fn ellipse_bounds(
    anchor: (i32, i32),
    current: (i32, i32),
    constraint: DragConstraint,
) -> (Point, Point) {
    match constraint {
        DragConstraint::Centered => {
            let dx = (anchor.0 - current.0) as f64;
            let dy = (anchor.1 - current.1) as f64;
            centered_box(Point::from(anchor), (dx * dx + dy * dy).sqrt())
        }
        other => rectangle_corners(anchor, current, other),
    }
}

fn square_corner((sx, sy): (i32, i32), (x, _y): (i32, i32)) -> Point {
    Point::from((x, sy - (sx - x)))
}

fn centered_box(center: Point, radius: f64) -> (Point, Point) {
    (
        Point::new(center.x - radius, center.y - radius),
        Point::new(center.x + radius, center.y + radius),
    )
}

/// Window placement in the `WxH+X+Y` form used by window managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowGeometry {
    pub width: i32,
    pub height: i32,
    pub x: i32,
    pub y: i32,
}

impl WindowGeometry {
    pub const fn new(width: i32, height: i32, x: i32, y: i32) -> Self {
        Self {
            width,
            height,
            x,
            y,
        }
    }

    pub fn position(self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn size(self) -> (i32, i32) {
        (self.width, self.height)
    }
}

impl fmt::Display for WindowGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

impl FromStr for WindowGeometry {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = GEOMETRY_RE
            .captures(s.trim())
            .ok_or_else(|| anyhow!("invalid window geometry '{s}', expected WxH+X+Y"))?;
        let number = |idx: usize| -> Result<i32> {
            caps[idx]
                .parse::<i32>()
                .with_context(|| format!("parse geometry component '{}'", &caps[idx]))
        };
        let signed = |sign_idx: usize, value_idx: usize| -> Result<i32> {
            let value = number(value_idx)?;
            Ok(if &caps[sign_idx] == "-" { -value } else { value })
        };
        Ok(Self {
            width: number(1)?,
            height: number(2)?,
            x: signed(3, 4)?,
            y: signed(5, 6)?,
        })
    }
}

/// Fixed width:height ratio the overlay is letterboxed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("aspect ratio components must be positive, got {width}x{height}"));
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = RATIO_RE
            .captures(s)
            .ok_or_else(|| anyhow!("invalid aspect ratio '{s}', expected WxH"))?;
        let width = caps[1].parse().context("parse ratio width")?;
        let height = caps[2].parse().context("parse ratio height")?;
        Self::new(width, height)
    }
}

/// Shrinks the overshooting dimension of `geometry` to match `ratio`, splitting
/// the removed excess (floor-halved) onto the leading edge.
pub fn aspect_fit(geometry: WindowGeometry, ratio: AspectRatio) -> WindowGeometry {
    let (rw, rh) = (i64::from(ratio.width), i64::from(ratio.height));
    let mut width = i64::from(geometry.width);
    let mut height = i64::from(geometry.height);
    let mut x = i64::from(geometry.x);
    let mut y = i64::from(geometry.y);

    let diff = width * rh - height * rw;
    if diff < 0 {
        let excess = height - (width * rh).div_euclid(rw);
        y += excess.div_euclid(2);
        height -= excess;
    } else if diff > 0 {
        let excess = width - (height * rw).div_euclid(rh);
        x += excess.div_euclid(2);
        width -= excess;
    }

    WindowGeometry {
        width: width as i32,
        height: height as i32,
        x: x as i32,
        y: y as i32,
    }
}
