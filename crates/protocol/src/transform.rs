use serde::{Deserialize, Serialize};

use crate::types::{Rect, Vec2};

/// A 2D affine transform, stored as the top two rows of a 3x3 matrix whose
/// bottom row is fixed to `(0, 0, 1)`:
///
/// ```text
/// | m00 m01 m02 |
/// | m10 m11 m12 |
/// |  0   0   1  |
/// ```
///
/// Composition is matrix multiplication: `a.times(&b)` applies `b` first,
/// then `a`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub m00: f64,
    pub m01: f64,
    pub m02: f64,
    pub m10: f64,
    pub m11: f64,
    pub m12: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        m00: 1.0,
        m01: 0.0,
        m02: 0.0,
        m10: 0.0,
        m11: 1.0,
        m12: 0.0,
    };

    pub fn new(m00: f64, m01: f64, m02: f64, m10: f64, m11: f64, m12: f64) -> Self {
        Self {
            m00,
            m01,
            m02,
            m10,
            m11,
            m12,
        }
    }

    pub fn translation(t: Vec2) -> Self {
        Self::new(1.0, 0.0, t.x, 0.0, 1.0, t.y)
    }

    pub fn scale(s: Vec2) -> Self {
        Self::new(s.x, 0.0, 0.0, 0.0, s.y, 0.0)
    }

    /// The transform that maps `from` onto `to`, scaling and translating each
    /// axis independently.
    pub fn between_rects(from: &Rect, to: &Rect) -> Self {
        Self::translation(to.origin)
            .times(&Self::scale(to.size.divided_by_pointwise(from.size)))
            .times(&Self::translation(-from.origin))
    }

    pub fn translation_part(&self) -> Vec2 {
        Vec2::new(self.m02, self.m12)
    }

    pub fn scale_part(&self) -> Vec2 {
        Vec2::new(self.m00, self.m11)
    }

    /// `self * other`: the result applies `other` first.
    pub fn times(&self, other: &AffineTransform) -> AffineTransform {
        AffineTransform::new(
            self.m00 * other.m00 + self.m01 * other.m10,
            self.m00 * other.m01 + self.m01 * other.m11,
            self.m00 * other.m02 + self.m01 * other.m12 + self.m02,
            self.m10 * other.m00 + self.m11 * other.m10,
            self.m10 * other.m01 + self.m11 * other.m11,
            self.m10 * other.m02 + self.m11 * other.m12 + self.m12,
        )
    }

    pub fn then_translate(&self, t: Vec2) -> AffineTransform {
        Self::translation(t).times(self)
    }

    pub fn then_scale(&self, s: Vec2) -> AffineTransform {
        Self::scale(s).times(self)
    }

    pub fn determinant(&self) -> f64 {
        self.m00 * self.m11 - self.m01 * self.m10
    }

    /// The inverse transform, or `None` when the linear part is singular or
    /// any coefficient is not finite.
    pub fn inverted(&self) -> Option<AffineTransform> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = AffineTransform::new(
            self.m11 / det,
            -self.m01 / det,
            (self.m01 * self.m12 - self.m11 * self.m02) / det,
            -self.m10 / det,
            self.m00 / det,
            (self.m10 * self.m02 - self.m00 * self.m12) / det,
        );
        inv.is_finite().then_some(inv)
    }

    pub fn is_finite(&self) -> bool {
        [self.m00, self.m01, self.m02, self.m10, self.m11, self.m12]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Apply the linear part only (displacements ignore translation).
    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            v.x * self.m00 + v.y * self.m01,
            v.x * self.m10 + v.y * self.m11,
        )
    }

    pub fn inverse_transform_vector(&self, v: Vec2) -> Option<Vec2> {
        self.inverted().map(|inv| inv.transform_vector(v))
    }

    pub fn transform_position(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x * self.m00 + p.y * self.m01 + self.m02,
            p.x * self.m10 + p.y * self.m11 + self.m12,
        )
    }

    pub fn inverse_transform_position(&self, p: Vec2) -> Option<Vec2> {
        self.inverted().map(|inv| inv.transform_position(p))
    }

    /// Transform a rectangle by its two corners. The result is normalized so
    /// its size is non-negative even when an axis is flipped.
    pub fn transform_rect(&self, r: &Rect) -> Rect {
        Rect::from_corners(
            self.transform_position(r.top_left()),
            self.transform_position(r.bottom_right()),
        )
    }

    pub fn inverse_transform_rect(&self, r: &Rect) -> Option<Rect> {
        self.inverted().map(|inv| inv.transform_rect(r))
    }

    /// Column-major 3x3 matrix, as expected by a GLSL `mat3` uniform.
    pub fn to_mat3_column_major(&self) -> [f32; 9] {
        [
            self.m00 as f32,
            self.m10 as f32,
            0.0,
            self.m01 as f32,
            self.m11 as f32,
            0.0,
            self.m02 as f32,
            self.m12 as f32,
            1.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn composition_applies_right_operand_first() {
        let t = AffineTransform::translation(Vec2::new(10.0, 0.0));
        let s = AffineTransform::scale(Vec2::new(2.0, 2.0));
        let p = Vec2::new(1.0, 1.0);
        // Scale then translate.
        assert_eq!(t.times(&s).transform_position(p), Vec2::new(12.0, 2.0));
        // Translate then scale.
        assert_eq!(s.times(&t).transform_position(p), Vec2::new(22.0, 2.0));
    }

    #[test]
    fn inverse_round_trips_positions_and_vectors() {
        let t = AffineTransform::new(3.0, 0.5, -7.0, 0.25, -2.0, 11.0);
        let inv = t.inverted().unwrap_or_default();
        for p in [
            Vec2::new(0.0, 0.0),
            Vec2::new(-4.5, 13.0),
            Vec2::new(1e4, -2e3),
        ] {
            assert!(inv.transform_position(t.transform_position(p)).approx_eq(p, 1e-6));
            assert!(inv.transform_vector(t.transform_vector(p)).approx_eq(p, 1e-6));
        }
        let identity = inv.times(&t);
        assert!((identity.m00 - 1.0).abs() < EPS);
        assert!(identity.m01.abs() < EPS);
        assert!(identity.m02.abs() < 1e-6);
    }

    #[test]
    fn singular_transform_has_no_inverse() {
        let t = AffineTransform::scale(Vec2::new(0.0, 1.0));
        assert!(t.inverted().is_none());
        assert!(t.inverse_transform_position(Vec2::UNIT).is_none());
    }

    #[test]
    fn vectors_ignore_translation() {
        let t = AffineTransform::translation(Vec2::new(5.0, 5.0)).then_scale(Vec2::new(2.0, 3.0));
        assert_eq!(t.transform_vector(Vec2::new(1.0, 1.0)), Vec2::new(2.0, 3.0));
        assert_eq!(t.transform_position(Vec2::new(1.0, 1.0)), Vec2::new(12.0, 18.0));
    }

    #[test]
    fn between_rects_maps_corners() {
        let from = Rect::from_xywh(10.0, 20.0, 100.0, 50.0);
        let to = Rect::from_xywh(0.0, 0.0, 800.0, 600.0);
        let t = AffineTransform::between_rects(&from, &to);
        assert!(t.transform_position(from.top_left()).approx_eq(to.top_left(), EPS));
        assert!(
            t.transform_position(from.bottom_right())
                .approx_eq(to.bottom_right(), EPS)
        );
    }

    #[test]
    fn flipped_rect_is_normalized() {
        let flip = AffineTransform::scale(Vec2::new(1.0, -1.0));
        let r = flip.transform_rect(&Rect::from_xywh(0.0, 2.0, 4.0, 3.0));
        assert_eq!(r, Rect::from_xywh(0.0, -5.0, 4.0, 3.0));
    }

    #[test]
    fn column_major_layout() {
        let t = AffineTransform::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_eq!(
            t.to_mat3_column_major(),
            [1.0, 4.0, 0.0, 2.0, 5.0, 0.0, 3.0, 6.0, 1.0]
        );
    }
}
