// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Affine transforms of the plane.  An affine transform is a linear map
//! followed by a translation, and is fully described by six values:
//!
//! ```text
//!     | a b | | x |   | e |
//! T = |     | |   | + |   |
//!     | c d | | y |   | f |
//! ```
//!
//! Each transform also carries a name and a display colour.  Neither
//! affects the geometry; the colour lets a renderer tint points by the
//! transform that produced them.

use image::Rgb;
use rand::Rng;
use std::fmt;

use crate::linear::{LinearMap, Point};

/// The name given to a transform when the caller does not supply one.
pub const DEFAULT_NAME: &str = "Affine Transform";

/// Colour of a visited pixel when no tinting is requested.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// A colour with three independently sampled channels, each rounded
/// from a uniform draw in `[0, 255]`.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Rgb<u8> {
    let mut channel = || (rng.gen::<f64>() * 255.0).round() as u8;
    Rgb([channel(), channel(), channel()])
}

/// Channel-wise integer average of two colours.  Applied once per orbit
/// step, it drifts a point's colour toward the transforms it visits most.
pub fn blend(current: Rgb<u8>, toward: Rgb<u8>) -> Rgb<u8> {
    let avg = |i: usize| ((u16::from(current.0[i]) + u16::from(toward.0[i])) / 2) as u8;
    Rgb([avg(0), avg(1), avg(2)])
}

/// `p -> map·p + shift`, plus cosmetic metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct AffineTransform {
    map: LinearMap,
    shift: Point,
    name: String,
    color: Rgb<u8>,
}

impl AffineTransform {
    /// Builds the transform `[[a, b], [c, d]]·p + [e, f]`.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        AffineTransform::from_parts(LinearMap::new(a, b, c, d), Point::new(e, f))
    }

    /// Builds a transform from a pre-built map and shift.  Equivalent to
    /// [`AffineTransform::new`] with the same six scalars.
    pub fn from_parts(map: LinearMap, shift: Point) -> Self {
        AffineTransform {
            map,
            shift,
            name: DEFAULT_NAME.to_string(),
            color: WHITE,
        }
    }

    /// Replaces the name.
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Replaces the display colour.
    pub fn with_color(mut self, color: Rgb<u8>) -> Self {
        self.color = color;
        self
    }

    /// Replaces the display colour with one drawn from `rng`.
    pub fn with_random_color<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let color = random_color(rng);
        self.with_color(color)
    }

    /// Applies the transform to a point.
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        self.map.apply(p) + self.shift
    }

    /// The linear part.
    pub fn map(&self) -> &LinearMap {
        &self.map
    }

    /// The translation.
    pub fn shift(&self) -> Point {
        self.shift
    }

    /// The six defining scalars `(a, b, c, d, e, f)`.
    pub fn coefficients(&self) -> [f64; 6] {
        [
            self.map.a,
            self.map.b,
            self.map.c,
            self.map.d,
            self.shift.x,
            self.shift.y,
        ]
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display colour.
    pub fn color(&self) -> Rgb<u8> {
        self.color
    }

    /// A transform whose linear part has determinant of absolute value
    /// below one shrinks areas.  Not required for a valid system (the
    /// fern's stem map is singular), but useful for diagnostics.
    pub fn is_contraction(&self) -> bool {
        self.map.determinant().abs() < 1.0
    }
}

/// The linear part then the shift, every value printed in full.
impl fmt::Display for AffineTransform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [{}, {}]", self.map, self.shift.x, self.shift.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn six_scalars_round_trip_through_accessors() {
        let t = AffineTransform::new(0.85, 0.04, -0.04, 0.85, 0.0, 1.6);
        assert_eq!(t.map(), &LinearMap::new(0.85, 0.04, -0.04, 0.85));
        assert_eq!(t.shift(), Point::new(0.0, 1.6));
        assert_eq!(t.coefficients(), [0.85, 0.04, -0.04, 0.85, 0.0, 1.6]);
    }

    #[test]
    fn both_constructors_agree() {
        let a = AffineTransform::new(0.2, -0.26, 0.23, 0.22, 0.0, 1.6);
        let b = AffineTransform::from_parts(
            LinearMap::new(0.2, -0.26, 0.23, 0.22),
            Point::new(0.0, 1.6),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn apply_is_map_plus_shift() {
        let t = AffineTransform::new(0.5, 0.0, 0.0, 0.5, 0.5, 0.0);
        assert_eq!(t.apply(Point::new(1.0, 1.0)), Point::new(1.0, 0.5));
    }

    #[test]
    fn shift_does_not_leak_into_differences() {
        let t = AffineTransform::new(-0.15, 0.28, 0.26, 0.24, 0.0, 0.44);
        let samples = [
            (Point::new(0.3, -0.7), Point::new(-1.0, 0.25)),
            (Point::new(5.0, 5.0), Point::new(0.0, 0.0)),
            (Point::new(-2.5, 1.0), Point::new(0.125, -0.5)),
        ];
        for (p1, p2) in samples.iter() {
            let lhs = t.apply(*p1) - t.apply(*p2);
            let rhs = t.map().apply(*p1 - *p2);
            assert!((lhs.x - rhs.x).abs() < 1e-12);
            assert!((lhs.y - rhs.y).abs() < 1e-12);
        }
    }

    #[test]
    fn display_reproduces_the_scalars() {
        let t = AffineTransform::new(0.5, 0.0, 0.0, 0.5, 0.0, 0.5);
        assert_eq!(
            format!("{}", t),
            "[[0.5,0],[0,0.5]] [0, 0.5]"
        );
        let fern_leaf = AffineTransform::new(-0.15, 0.28, 0.26, 0.24, 0.0, 0.44);
        assert_eq!(
            format!("{}", fern_leaf),
            "[[-0.15,0.28],[0.26,0.24]] [0, 0.44]"
        );
    }

    #[test]
    fn metadata_defaults_and_overrides() {
        let t = AffineTransform::new(0.0, 0.0, 0.0, 0.16, 0.0, 0.0);
        assert_eq!(t.name(), DEFAULT_NAME);
        assert_eq!(t.color(), WHITE);
        let t = t.with_name("stem").with_color(Rgb([10, 200, 30]));
        assert_eq!(t.name(), "stem");
        assert_eq!(t.color(), Rgb([10, 200, 30]));
    }

    #[test]
    fn random_colors_follow_the_rng() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        assert_eq!(random_color(&mut a), random_color(&mut b));
    }

    #[test]
    fn blend_averages_channels() {
        assert_eq!(
            blend(Rgb([255, 0, 100]), Rgb([1, 255, 100])),
            Rgb([128, 127, 100])
        );
    }

    #[test]
    fn contraction_check() {
        assert!(AffineTransform::new(0.5, 0.0, 0.0, 0.5, 0.0, 0.0).is_contraction());
        assert!(!AffineTransform::new(2.0, 0.0, 0.0, 1.0, 0.0, 0.0).is_contraction());
    }
}
