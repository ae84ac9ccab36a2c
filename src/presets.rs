// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Known attractors, for testing and demonstration.

use image::Rgb;
use std::fmt;
use std::str::FromStr;

use crate::affine::AffineTransform;
use crate::error::{IfsError, Result};
use crate::linear::{LinearMap, Point};
use crate::raster::Region;
use crate::system::Ifs;

/// A named system together with the region of the plane its attractor
/// occupies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Preset {
    /// Three equally weighted half-scale maps.
    Sierpinski,
    /// Barnsley's four-map fern.
    Fern,
}

/// The Sierpinski triangle on the unit square.
pub fn sierpinski_triangle() -> Ifs {
    let shrink = LinearMap::scale(0.5);
    let maps = vec![
        AffineTransform::from_parts(shrink, Point::new(0.0, 0.0))
            .with_name("lower left")
            .with_color(Rgb([230, 57, 70])),
        AffineTransform::from_parts(shrink, Point::new(0.5, 0.0))
            .with_name("lower right")
            .with_color(Rgb([69, 123, 157])),
        AffineTransform::from_parts(shrink, Point::new(0.0, 0.5))
            .with_name("upper")
            .with_color(Rgb([241, 250, 238])),
    ];
    build(maps, vec![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0])
}

/// Barnsley's fern.
pub fn barnsley_fern() -> Ifs {
    let maps = vec![
        AffineTransform::new(0.0, 0.0, 0.0, 0.16, 0.0, 0.0)
            .with_name("stem")
            .with_color(Rgb([120, 72, 0])),
        AffineTransform::new(0.85, 0.04, -0.04, 0.85, 0.0, 1.6)
            .with_name("smaller leaflets")
            .with_color(Rgb([34, 139, 34])),
        AffineTransform::new(0.20, -0.26, 0.23, 0.22, 0.0, 1.6)
            .with_name("largest left leaflet")
            .with_color(Rgb([154, 205, 50])),
        AffineTransform::new(-0.15, 0.28, 0.26, 0.24, 0.0, 0.44)
            .with_name("largest right leaflet")
            .with_color(Rgb([0, 100, 0])),
    ];
    build(maps, vec![0.01, 0.85, 0.07, 0.07])
}

// The preset coefficients are fixed and valid; a failure here is a bug
// in this file, not a caller error.
fn build(maps: Vec<AffineTransform>, weights: Vec<f64>) -> Ifs {
    match Ifs::new(maps, weights) {
        Ok(ifs) => ifs,
        Err(e) => unreachable!("preset system is invalid: {}", e),
    }
}

impl Preset {
    /// Every preset, in declaration order.
    pub const ALL: [Preset; 2] = [Preset::Sierpinski, Preset::Fern];

    /// The name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Preset::Sierpinski => "sierpinski",
            Preset::Fern => "fern",
        }
    }

    /// Builds the system.
    pub fn system(self) -> Ifs {
        match self {
            Preset::Sierpinski => sierpinski_triangle(),
            Preset::Fern => barnsley_fern(),
        }
    }

    /// The attractor's approximate bounding box.
    pub fn region(self) -> Region {
        match self {
            Preset::Sierpinski => Region {
                xmin: 0.0,
                xmax: 1.0,
                ymin: 0.0,
                ymax: 1.0,
            },
            Preset::Fern => Region {
                xmin: -1.0,
                xmax: 3.0,
                ymin: 0.0,
                ymax: 10.0,
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = IfsError;

    fn from_str(s: &str) -> Result<Self> {
        Preset::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| IfsError::InvalidParameters(format!("unknown preset '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sierpinski_has_three_equal_half_scale_maps() {
        let ifs = sierpinski_triangle();
        assert_eq!(ifs.len(), 3);
        for t in ifs.transforms() {
            assert_eq!(t.map(), &LinearMap::scale(0.5));
        }
        let shifts: Vec<Point> = ifs.transforms().map(|t| t.shift()).collect();
        assert_eq!(
            shifts,
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.5, 0.0),
                Point::new(0.0, 0.5)
            ]
        );
        for w in ifs.weights() {
            assert_eq!(w, 1.0 / 3.0);
        }
    }

    #[test]
    fn fern_uses_the_canonical_coefficients() {
        let ifs = barnsley_fern();
        let weights: Vec<f64> = ifs.weights().collect();
        assert_eq!(weights, vec![0.01, 0.85, 0.07, 0.07]);
        assert_eq!(
            ifs.transform(1).map(|t| t.coefficients()),
            Some([0.85, 0.04, -0.04, 0.85, 0.0, 1.6])
        );
        assert_eq!(
            ifs.transform(3).map(|t| t.coefficients()),
            Some([-0.15, 0.28, 0.26, 0.24, 0.0, 0.44])
        );
    }

    #[test]
    fn presets_parse_from_their_names() {
        for p in Preset::ALL.iter() {
            assert_eq!(p.name().parse::<Preset>(), Ok(*p));
        }
        assert!("dragon".parse::<Preset>().is_err());
    }

    #[test]
    fn regions_are_well_formed() {
        for p in Preset::ALL.iter() {
            let r = p.region();
            assert!(r.xmin < r.xmax && r.ymin < r.ymax);
        }
    }
}
