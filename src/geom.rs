//! Points and 2D affine transforms in user space.

use std::convert;

use lyon_geom::{euclid, Angle, Transform};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A `Point` consists of an x and y coordinate.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(C)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Mirror `other` through this point.
    pub fn reflect(self, other: Point) -> Point {
        Point::new(2.0 * self.x - other.x, 2.0 * self.y - other.y)
    }

    pub(crate) fn offset(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl convert::From<(f64, f64)> for Point {
    fn from(val: (f64, f64)) -> Self {
        Self { x: val.0, y: val.1 }
    }
}

/// A 2D affine matrix.
///
/// The coefficients follow the SVG `matrix(a b c d e f)` order and apply to a
/// point as:
///
/// ```text
/// x' = a·x + c·y + e
/// y' = b·x + d·y + f
/// ```
#[derive(Debug, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AffineTransform {
    /// Scale x.
    pub a: f64,
    /// Shear y.
    pub b: f64,
    /// Shear x.
    pub c: f64,
    /// Scale y.
    pub d: f64,
    /// Translate x.
    pub e: f64,
    /// Translate y.
    pub f: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Transform<f64>> for AffineTransform {
    fn from(t: Transform<f64>) -> Self {
        Self::new(t.m11, t.m12, t.m21, t.m22, t.m31, t.m32)
    }
}

impl AffineTransform {
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    #[allow(clippy::many_single_char_names)]
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn to_lyon(self) -> Transform<f64> {
        Transform::new(self.a, self.b, self.c, self.d, self.e, self.f)
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Transform::translation(tx, ty).into()
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Transform::scale(sx, sy).into()
    }

    /// Rotation by `angle` radians around the origin.
    pub fn rotate(angle: f64) -> Self {
        Transform::rotation(Angle::radians(angle)).into()
    }

    /// Rotation by `angle` radians around `(cx, cy)`.
    pub fn rotate_about(angle: f64, cx: f64, cy: f64) -> Self {
        Self::translate(cx, cy)
            .concat(&Self::rotate(angle))
            .concat(&Self::translate(-cx, -cy))
    }

    /// Shear along the x axis by `angle` radians.
    pub fn skew_x(angle: f64) -> Self {
        Self::new(1.0, 0.0, angle.tan(), 1.0, 0.0, 0.0)
    }

    /// Shear along the y axis by `angle` radians.
    pub fn skew_y(angle: f64) -> Self {
        Self::new(1.0, angle.tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// Post-multiply: returns `self · other`, so `other` applies to a point
    /// first.
    pub fn concat(&self, other: &AffineTransform) -> AffineTransform {
        other.to_lyon().then(&self.to_lyon()).into()
    }

    pub fn apply(&self, p: Point) -> Point {
        let p = self.to_lyon().transform_point(euclid::point2(p.x, p.y));
        Point::new(p.x, p.y)
    }

    /// Return the inverse transform, or `None` if the matrix is singular.
    pub fn invert(&self) -> Option<AffineTransform> {
        self.to_lyon().inverse().map(Self::from)
    }

    #[allow(clippy::float_cmp)]
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// True if every coefficient is finite.
    pub fn is_finite(&self) -> bool {
        self.coefficients().iter().all(|v| v.is_finite())
    }

    pub fn coefficients(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

#[cfg(test)]
pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point(p: Point, x: f64, y: f64) {
        assert!(
            approx_eq(p.x, x) && approx_eq(p.y, y),
            "expected ({}, {}), got {:?}",
            x,
            y,
            p
        );
    }

    #[test]
    fn test_reflect() {
        let anchor = Point::new(10.0, 0.0);
        assert_eq!(anchor.reflect(Point::new(10.0, 10.0)), Point::new(10.0, -10.0));
        assert_eq!(anchor.reflect(anchor), anchor);
    }

    #[test]
    fn test_concat_order() {
        // Translate after scale: the scale is applied to the point first.
        let t = AffineTransform::translate(10.0, 5.0).concat(&AffineTransform::scale(2.0, 2.0));
        assert_point(t.apply(Point::new(1.0, 1.0)), 12.0, 7.0);

        let t = AffineTransform::scale(2.0, 2.0).concat(&AffineTransform::translate(10.0, 5.0));
        assert_point(t.apply(Point::new(1.0, 1.0)), 22.0, 12.0);
    }

    #[test]
    fn test_rotate_about() {
        let t = AffineTransform::rotate_about(std::f64::consts::FRAC_PI_2, 10.0, 10.0);
        assert_point(t.apply(Point::new(10.0, 10.0)), 10.0, 10.0);
        assert_point(t.apply(Point::new(20.0, 10.0)), 10.0, 20.0);
    }

    #[test]
    fn test_skew() {
        let t = AffineTransform::skew_x(std::f64::consts::FRAC_PI_4);
        assert_point(t.apply(Point::new(0.0, 2.0)), 2.0, 2.0);
        let t = AffineTransform::skew_y(std::f64::consts::FRAC_PI_4);
        assert_point(t.apply(Point::new(3.0, 0.0)), 3.0, 3.0);
    }

    #[test]
    fn test_invert() {
        let t = AffineTransform::new(2.0, 1.0, -1.0, 3.0, 4.0, -7.0);
        let inv = t.invert().unwrap();
        let p = Point::new(3.5, -2.25);
        assert_point(inv.apply(t.apply(p)), 3.5, -2.25);
        assert!(AffineTransform::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_identity() {
        assert!(AffineTransform::default().is_identity());
        assert!(!AffineTransform::translate(1.0, 0.0).is_identity());
        assert_eq!(
            AffineTransform::identity().coefficients(),
            [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
        );
    }
}
