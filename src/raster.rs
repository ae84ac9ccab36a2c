// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Raster struct, which describes a relationship between
//! a rectangle on the integral plane (the pixel grid) and a rectangle
//! on the real plane, and accumulates the points plotted into it.
//!
//! Orientation: pixel row 0 is the top of the image and corresponds to
//! `ymax`; rows increase as y decreases.  Columns increase with x.  Only
//! points strictly inside the region are plotted, so anything on its
//! boundary, `(xmin, ymin)` included, is dropped.

use image::{Rgb, RgbImage};
use itertools::iproduct;
use tracing::debug;

use crate::affine::WHITE;
use crate::error::{IfsError, Result};
use crate::linear::Point;

/// Axis-aligned rectangle of the real plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Region {
    /// Least x value shown.
    pub xmin: f64,
    /// Greatest x value shown.
    pub xmax: f64,
    /// Least y value shown.
    pub ymin: f64,
    /// Greatest y value shown.
    pub ymax: f64,
}

impl Region {
    /// From the left-lower and right-upper corners.
    pub fn from_corners(leftlower: Point, rightupper: Point) -> Self {
        Region {
            xmin: leftlower.x,
            xmax: rightupper.x,
            ymin: leftlower.y,
            ymax: rightupper.y,
        }
    }

    /// `[-1, 1] × [-1, 1]`, the square random seeds are drawn from.
    pub const fn unit() -> Self {
        Region {
            xmin: -1.0,
            xmax: 1.0,
            ymin: -1.0,
            ymax: 1.0,
        }
    }

    /// True when `p` lies strictly inside.
    pub fn contains(&self, p: &Point) -> bool {
        p.x > self.xmin && p.x < self.xmax && p.y > self.ymin && p.y < self.ymax
    }
}

/// Largest grid a raster will allocate.  Both dimensions then also fit
/// the `u32` the image encoder takes.
pub const MAX_PIXELS: usize = 1 << 28;

/// Column and row of a pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pixel(pub usize, pub usize);

/// A pixel grid over a region of the plane.
#[derive(Clone, Debug)]
pub struct Raster {
    width: usize,
    height: usize,
    region: Region,
    // Pixels per unit along x and y.
    grid_factors: (f64, f64),
    hits: Vec<u32>,
    image: RgbImage,
}

impl Raster {
    /// A black `width × height` raster over `[xmin, xmax] × [ymin, ymax]`.
    pub fn new(
        width: usize,
        height: usize,
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
    ) -> Result<Raster> {
        Raster::from_region(
            width,
            height,
            Region {
                xmin,
                xmax,
                ymin,
                ymax,
            },
        )
    }

    /// As [`Raster::new`], with the bounds given as a [`Region`].
    ///
    /// Bounds must be finite with a finite, positive extent on each
    /// axis, and the grid may hold at most [`MAX_PIXELS`] pixels.
    pub fn from_region(width: usize, height: usize, region: Region) -> Result<Raster> {
        let bounds = [region.xmin, region.xmax, region.ymin, region.ymax];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(IfsError::InvalidRegion(format!(
                "bounds must be finite, got {:?}",
                region
            )));
        }
        if !(region.xmin < region.xmax) {
            return Err(IfsError::InvalidRegion(format!(
                "xmin ({}) must be less than xmax ({})",
                region.xmin, region.xmax
            )));
        }
        if !(region.ymin < region.ymax) {
            return Err(IfsError::InvalidRegion(format!(
                "ymin ({}) must be less than ymax ({})",
                region.ymin, region.ymax
            )));
        }
        if width == 0 || height == 0 {
            return Err(IfsError::InvalidRegion(format!(
                "a {}x{} raster has no pixels",
                width, height
            )));
        }
        match width.checked_mul(height) {
            Some(pixels) if pixels <= MAX_PIXELS => {}
            _ => {
                return Err(IfsError::InvalidRegion(format!(
                    "a {}x{} raster exceeds {} pixels",
                    width, height, MAX_PIXELS
                )))
            }
        }

        let grid_factors = (
            (width as f64) / (region.xmax - region.xmin),
            (height as f64) / (region.ymax - region.ymin),
        );
        // Zero when an extent overflows, infinite when it underflows.
        let usable = |f: f64| f.is_finite() && f > 0.0;
        if !usable(grid_factors.0) || !usable(grid_factors.1) {
            return Err(IfsError::InvalidRegion(format!(
                "{:?} cannot be divided into a {}x{} grid",
                region, width, height
            )));
        }
        debug!(width, height, ?region, "created raster");
        Ok(Raster {
            width,
            height,
            region,
            grid_factors,
            hits: vec![0; width * height],
            image: RgbImage::new(width as u32, height as u32),
        })
    }

    /// Pixels per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The region of the plane covered.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Never true; empty rasters cannot be built.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Given a point on the real plane, the pixel containing it, or
    /// `None` when the point is outside the region or truncates onto
    /// the grid's far edge.
    pub fn point_to_pixel(&self, point: &Point) -> Option<Pixel> {
        if !self.region.contains(point) {
            return None;
        }
        let column = ((point.x - self.region.xmin) * self.grid_factors.0) as usize;
        let from_bottom = ((point.y - self.region.ymin) * self.grid_factors.1) as usize;
        if column >= self.width || from_bottom >= self.height {
            return None;
        }
        Some(Pixel(column, self.height - 1 - from_bottom))
    }

    /// The point at the centre of a pixel.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Point {
        Point::new(
            self.region.xmin + (pixel.0 as f64 + 0.5) / self.grid_factors.0,
            self.region.ymax - (pixel.1 as f64 + 0.5) / self.grid_factors.1,
        )
    }

    /// Linear offset of the pixel containing `point`, row-major from
    /// the top-left corner.
    pub fn point_to_offset(&self, point: &Point) -> Option<usize> {
        self.point_to_pixel(point)
            .map(|Pixel(column, row)| row * self.width + column)
    }

    /// Marks the pixel containing `point` white.  Returns whether the
    /// point landed on the grid.
    pub fn plot(&mut self, point: &Point) -> bool {
        self.plot_colored(point, WHITE)
    }

    /// Marks the pixel containing `point` with `color`; later plots to
    /// the same pixel overwrite earlier ones.  Returns whether the point
    /// landed on the grid.
    pub fn plot_colored(&mut self, point: &Point, color: Rgb<u8>) -> bool {
        match self.point_to_pixel(point) {
            Some(Pixel(column, row)) => {
                let offset = row * self.width + column;
                self.hits[offset] = self.hits[offset].saturating_add(1);
                self.image.put_pixel(column as u32, row as u32, color);
                true
            }
            None => false,
        }
    }

    /// Number of times each pixel was plotted, row-major.
    pub fn hits(&self) -> &[u32] {
        &self.hits
    }

    /// Colour of a pixel, or `None` off the grid.
    pub fn pixel(&self, pixel: &Pixel) -> Option<Rgb<u8>> {
        if pixel.0 < self.width && pixel.1 < self.height {
            Some(*self.image.get_pixel(pixel.0 as u32, pixel.1 as u32))
        } else {
            None
        }
    }

    /// True when the pixel has been plotted at least once.
    pub fn is_visited(&self, pixel: &Pixel) -> bool {
        pixel.0 < self.width
            && pixel.1 < self.height
            && self.hits[pixel.1 * self.width + pixel.0] > 0
    }

    /// Number of distinct pixels plotted.
    pub fn visited(&self) -> usize {
        self.hits.iter().filter(|&&h| h > 0).count()
    }

    /// Every plotted pixel, row by row.
    pub fn visited_pixels(&self) -> Vec<Pixel> {
        iproduct!(0..self.height, 0..self.width)
            .filter(|&(row, column)| self.hits[row * self.width + column] > 0)
            .map(|(row, column)| Pixel(column, row))
            .collect()
    }

    /// Distinct plotted pixels in each row, top row first.
    pub fn row_counts(&self) -> Vec<usize> {
        self.hits
            .chunks(self.width)
            .map(|row| row.iter().filter(|&&h| h > 0).count())
            .collect()
    }

    /// Folds `other` into this raster: hit counts add, and every pixel
    /// `other` plotted takes its colour.  Both must cover the same grid
    /// and region.
    pub fn merge(&mut self, other: &Raster) -> Result<()> {
        if self.width != other.width || self.height != other.height || self.region != other.region
        {
            return Err(IfsError::InvalidRegion(
                "only rasters over the same grid and region can be merged".to_string(),
            ));
        }
        for (offset, &h) in other.hits.iter().enumerate() {
            if h == 0 {
                continue;
            }
            self.hits[offset] = self.hits[offset].saturating_add(h);
            let (column, row) = ((offset % self.width) as u32, (offset / self.width) as u32);
            self.image
                .put_pixel(column, row, *other.image.get_pixel(column, row));
        }
        Ok(())
    }

    /// The colour grid, ready for encoding.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Consumes the raster, yielding the colour grid.
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}
