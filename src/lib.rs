#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Iterated function system renderer
//!
//! An iterated function system (IFS) is a finite set of affine
//! contraction maps, each with a probability of being chosen.  Take a
//! point anywhere in the plane, pick a map at random according to
//! those probabilities, apply it, and repeat: after a handful of steps
//! the point is indistinguishable from a point on the system's
//! attractor, a fractal such as the Sierpinski triangle or Barnsley's
//! fern.  Sending thousands of random seed points through the system
//! and marking the pixel under each resulting point draws the
//! attractor.
//!
//! The crate is split the same way the computation is: `system` holds
//! the weighted maps and the random choice between them, `evaluator`
//! produces orbits, `raster` maps points onto a pixel grid, and
//! `render` decides which orbit points land in the grid and in what
//! colour.  Encoding the grid into an image file is left to the caller.

pub mod affine;
pub mod error;
pub mod evaluator;
pub mod linear;
pub mod presets;
pub mod raster;
pub mod render;
pub mod system;

pub use affine::AffineTransform;
pub use error::{IfsError, Result};
pub use evaluator::{DeterministicEvaluator, Evaluator, Orbit, RandomEvaluator};
pub use linear::{LinearMap, Point};
pub use presets::Preset;
pub use raster::{Pixel, Raster, Region, MAX_PIXELS};
pub use render::{render, render_threaded, RenderStats, Selection, Shading};
pub use system::Ifs;
