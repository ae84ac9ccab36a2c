// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The two value types the rest of the crate is built on: a point (or
//! vector) in the real plane, and a 2×2 linear map acting on it.

use num::Zero;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// A point in the real plane.  Also serves as a vector, since the
/// affine machinery only ever needs elementwise addition and
/// subtraction.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Point {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Point {
    /// Builds a point from its two components.
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// True when both components are finite.  Orbits of an expanding
    /// map can overflow; the raster uses this to skip them.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, scale: f64) -> Point {
        Point::new(self.x * scale, self.y * scale)
    }
}

impl Zero for Point {
    fn zero() -> Self {
        Point::new(0.0, 0.0)
    }

    fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// The 2×2 real matrix `[[a, b], [c, d]]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinearMap {
    /// Row 1, column 1.
    pub a: f64,
    /// Row 1, column 2.
    pub b: f64,
    /// Row 2, column 1.
    pub c: f64,
    /// Row 2, column 2.
    pub d: f64,
}

impl LinearMap {
    /// Builds the matrix `[[a, b], [c, d]]`.
    pub const fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        LinearMap { a, b, c, d }
    }

    /// The identity map.
    pub const fn identity() -> Self {
        LinearMap::new(1.0, 0.0, 0.0, 1.0)
    }

    /// Uniform scaling by `s`.
    pub const fn scale(s: f64) -> Self {
        LinearMap::new(s, 0.0, 0.0, s)
    }

    /// `(a*x + b*y, c*x + d*y)`
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.a * p.x + self.b * p.y, self.c * p.x + self.d * p.y)
    }

    /// Determinant; its absolute value is the area scaling factor.
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Matrix product `self · other`, i.e. apply `other` first.
    pub fn compose(&self, other: &LinearMap) -> LinearMap {
        LinearMap::new(
            self.a * other.a + self.b * other.c,
            self.a * other.b + self.b * other.d,
            self.c * other.a + self.d * other.c,
            self.c * other.b + self.d * other.d,
        )
    }
}

impl Default for LinearMap {
    fn default() -> Self {
        LinearMap::identity()
    }
}

/// Rows in brackets, each value printed in full so it parses back to
/// the same `f64`.
impl fmt::Display for LinearMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[[{},{}],[{},{}]]",
            self.a, self.b, self.c, self.d
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_is_row_by_column() {
        let m = LinearMap::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(m.apply(Point::new(3.0, 4.0)), Point::new(11.0, 25.0));
    }

    #[test]
    fn identity_leaves_points_alone() {
        let p = Point::new(-0.25, 7.5);
        assert_eq!(LinearMap::identity().apply(p), p);
    }

    #[test]
    fn compose_applies_right_operand_first() {
        let rotate = LinearMap::new(0.0, -1.0, 1.0, 0.0);
        let squash = LinearMap::new(1.0, 0.0, 0.0, 0.5);
        let p = Point::new(1.0, 0.0);
        assert_eq!(
            squash.compose(&rotate).apply(p),
            squash.apply(rotate.apply(p))
        );
    }

    #[test]
    fn determinant_of_shrink() {
        assert_eq!(LinearMap::scale(0.5).determinant(), 0.25);
    }

    #[test]
    fn point_arithmetic() {
        let p = Point::new(1.0, 2.0);
        let q = Point::new(0.5, -1.0);
        assert_eq!(p + q, Point::new(1.5, 1.0));
        assert_eq!(p - q, Point::new(0.5, 3.0));
        assert_eq!(-p, Point::new(-1.0, -2.0));
        assert_eq!(p * 2.0, Point::new(2.0, 4.0));
        assert!(Point::zero().is_zero());
    }

    #[test]
    fn non_finite_points_are_flagged() {
        assert!(Point::new(1.0, 2.0).is_finite());
        assert!(!Point::new(std::f64::INFINITY, 0.0).is_finite());
        assert!(!Point::new(0.0, std::f64::NAN).is_finite());
    }

    #[test]
    fn display_renders_four_entries() {
        assert_eq!(
            format!("{}", LinearMap::scale(0.5)),
            "[[0.5,0],[0,0.5]]"
        );
    }

    #[test]
    fn display_keeps_every_digit() {
        let m = LinearMap::new(0.123456789, -0.04, 0.23, 1e-9);
        let text = format!("{}", m);
        assert_eq!(text, "[[0.123456789,-0.04],[0.23,0.000000001]]");
        let parsed: Vec<f64> = text
            .trim_matches(|c| c == '[' || c == ']')
            .split(|c| c == ',' || c == '[' || c == ']')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(parsed, vec![m.a, m.b, m.c, m.d]);
    }
}
