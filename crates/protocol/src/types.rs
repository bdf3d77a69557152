use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A 2D vector. Used both for positions and for displacements; which one a
/// value represents only matters when it goes through an [`AffineTransform`].
///
/// [`AffineTransform`]: crate::AffineTransform
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const UNIT: Vec2 = Vec2 { x: 1.0, y: 1.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn with_x(self, x: f64) -> Self {
        Self { x, ..self }
    }

    pub fn with_y(self, y: f64) -> Self {
        Self { y, ..self }
    }

    /// Component-wise product.
    pub fn times_pointwise(self, other: Vec2) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }

    /// Component-wise quotient.
    pub fn divided_by_pointwise(self, other: Vec2) -> Self {
        Self::new(self.x / other.x, self.y / other.y)
    }

    pub fn min(self, other: Vec2) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    pub fn max(self, other: Vec2) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Clamp each component into `[lo, hi]`. When `hi < lo` on an axis the
    /// lower bound wins, so the result is never below `lo`.
    pub fn clamp(self, lo: Vec2, hi: Vec2) -> Self {
        Self::new(self.x.min(hi.x).max(lo.x), self.y.min(hi.y).max(lo.y))
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn approx_eq(self, other: Vec2, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// An axis-aligned rectangle described by its top-left `origin` and `size`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const EMPTY: Rect = Rect {
        origin: Vec2::ZERO,
        size: Vec2::ZERO,
    };

    /// The NDC square `[-1, 1] x [-1, 1]`.
    pub const NDC: Rect = Rect {
        origin: Vec2 { x: -1.0, y: -1.0 },
        size: Vec2 { x: 2.0, y: 2.0 },
    };

    pub const fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    pub fn from_xywh(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    /// Build the rectangle spanned by two opposite corners, in any order.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min, max - min)
    }

    pub fn width(&self) -> f64 {
        self.size.x
    }

    pub fn height(&self) -> f64 {
        self.size.y
    }

    pub fn left(&self) -> f64 {
        self.origin.x
    }

    pub fn right(&self) -> f64 {
        self.origin.x + self.size.x
    }

    pub fn top(&self) -> f64 {
        self.origin.y
    }

    pub fn bottom(&self) -> f64 {
        self.origin.y + self.size.y
    }

    pub fn top_left(&self) -> Vec2 {
        self.origin
    }

    pub fn top_right(&self) -> Vec2 {
        Vec2::new(self.right(), self.top())
    }

    pub fn bottom_left(&self) -> Vec2 {
        Vec2::new(self.left(), self.bottom())
    }

    pub fn bottom_right(&self) -> Vec2 {
        self.origin + self.size
    }

    pub fn center(&self) -> Vec2 {
        self.origin + self.size / 2.0
    }

    pub fn with_origin(&self, origin: Vec2) -> Self {
        Self::new(origin, self.size)
    }

    pub fn with_size(&self, size: Vec2) -> Self {
        Self::new(self.origin, size)
    }

    pub fn is_empty(&self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Move every edge inwards by `amount`. The size never goes negative.
    pub fn shrink(&self, amount: f64) -> Self {
        let delta = Vec2::new(amount, amount);
        Self::new(
            self.origin + delta,
            (self.size - delta * 2.0).max(Vec2::ZERO),
        )
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Whether the two rectangles overlap in a region of positive area.
    pub fn has_intersection_with(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    pub fn intersect_with(&self, other: &Rect) -> Rect {
        let min = self.top_left().max(other.top_left());
        let max = self.bottom_right().min(other.bottom_right()).max(min);
        Rect::new(min, max - min)
    }

    /// The point inside this rectangle closest to `point`.
    pub fn closest_point_to(&self, point: Vec2) -> Vec2 {
        point.clamp(self.top_left(), self.bottom_right())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Convert hue (degrees), saturation and value (both `[0, 1]`) to RGB
    /// using the six-sector piecewise-linear formula.
    pub fn from_hsv(hue: f64, saturation: f64, value: f64) -> Self {
        let hue = hue.rem_euclid(360.0);
        let chroma = value * saturation;
        let sector = hue / 60.0;
        let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
        let (r, g, b) = match sector as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = value - chroma;
        Self::rgb((r + m) as f32, (g + m) as f32, (b + m) as f32)
    }

    /// Components as 8-bit channels, rounded.
    pub fn to_rgba8(self) -> [u8; 4] {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [channel(self.r), channel(self.g), channel(self.b), channel(self.a)]
    }

    /// `#rrggbb` hex string (alpha is dropped).
    pub fn to_hex(self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}
