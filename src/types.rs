use serde::{Deserialize, Serialize};

/// A 2D point in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Largest absolute per-axis difference to `other`.
    pub fn max_axis_delta(&self, other: &Point) -> f64 {
        let d = *self - *other;
        d.x.abs().max(d.y.abs())
    }

    /// Midpoint between two points.
    pub fn midpoint(&self, other: &Point) -> Point {
        (*self + *other) * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// Integer pupil center in full-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PupilCenter {
    pub x: i32,
    pub y: i32,
}

impl PupilCenter {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<PupilCenter> for Point {
    fn from(c: PupilCenter) -> Self {
        Point::new(c.x as f64, c.y as f64)
    }
}

/// An axis-aligned pixel rectangle defined by top-left corner, width, and height.
///
/// Covers the half-open ranges `x..x + width` and `y..y + height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding box spanning `[min, max)` of the rounded point coordinates.
    ///
    /// Coordinates beyond the `i32` range saturate. Returns `None` for an
    /// empty point set or if any coordinate is not finite.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        if !points.iter().all(Point::is_finite) {
            return None;
        }
        let first = points.first()?;
        let (mut min_x, mut min_y) = (first.x.round() as i32, first.y.round() as i32);
        let (mut max_x, mut max_y) = (min_x, min_y);
        for p in &points[1..] {
            let (x, y) = (p.x.round() as i32, p.y.round() as i32);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        // i32 span always fits in u32
        Some(Self::new(
            min_x,
            min_y,
            (max_x as i64 - min_x as i64) as u32,
            (max_y as i64 - min_y as i64) as u32,
        ))
    }

    /// Clamp this box to an image of the given dimensions.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as i64, height as i64);
        let x0 = (self.x as i64).clamp(0, w);
        let y0 = (self.y as i64).clamp(0, h);
        let x1 = (self.x as i64 + self.width as i64).clamp(0, w);
        let y1 = (self.y as i64 + self.height as i64).clamp(0, h);
        Self::new(
            x0 as i32,
            y0 as i32,
            (x1 - x0).max(0) as u32,
            (y1 - y0).max(0) as u32,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Integer center as computed for contour bounding rectangles: `x + w / 2`.
    pub fn center(&self) -> PupilCenter {
        PupilCenter::new(
            self.x.saturating_add((self.width / 2) as i32),
            self.y.saturating_add((self.height / 2) as i32),
        )
    }
}

/// A facial shape represented as a collection of landmark points.
/// The 68-point iBUG scheme is expected for eye-region extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub points: Vec<Point>,
}

impl Shape {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn num_landmarks(&self) -> usize {
        self.points.len()
    }
}
