// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Plots a collection of orbits into a raster.  Which points of each
//! orbit get plotted (a single iteration, the last point, or everything
//! after a burn-in) and how they are coloured are both chosen here;
//! the evaluator always hands over complete orbits.

use image::Rgb;
use std::fmt;
use std::panic;
use std::str::FromStr;
use tracing::debug;

use crate::affine::{blend, WHITE};
use crate::error::{IfsError, Result};
use crate::evaluator::Orbit;
use crate::raster::Raster;
use crate::system::Ifs;

/// Enough steps for an orbit seeded in the unit square to settle onto
/// the attractor.
pub const DEFAULT_BURN_IN: usize = 25;

/// Which points of each orbit to plot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Only the point after this many steps.  Every orbit must be long
    /// enough to have it.
    Iteration(usize),
    /// Only the final point.
    Last,
    /// Every point after discarding the first `burn_in`.
    Tail {
        /// Number of leading points skipped.
        burn_in: usize,
    },
}

/// How plotted pixels are coloured.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shading {
    /// Every point white.
    White,
    /// The colour of the transform that produced the point; seeds are
    /// white.
    Transform,
    /// Starts white and blends toward each transform's colour as the
    /// orbit visits it.
    Blend,
}

impl Shading {
    /// Every shading, in declaration order.
    pub const ALL: [Shading; 3] = [Shading::White, Shading::Transform, Shading::Blend];

    /// The name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Shading::White => "white",
            Shading::Transform => "transform",
            Shading::Blend => "blend",
        }
    }
}

impl fmt::Display for Shading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Shading {
    type Err = IfsError;

    fn from_str(s: &str) -> Result<Self> {
        Shading::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| IfsError::InvalidParameters(format!("unknown shading '{}'", s)))
    }
}

/// What happened to the selected points.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Points that landed on the grid.
    pub plotted: usize,
    /// Points outside the region, silently skipped.
    pub dropped: usize,
}

impl RenderStats {
    fn add(&mut self, other: RenderStats) {
        self.plotted += other.plotted;
        self.dropped += other.dropped;
    }
}

fn check_orbits(orbits: &[Orbit], ifs: &Ifs, selection: Selection) -> Result<()> {
    if let Some(&choice) = orbits
        .iter()
        .flat_map(|o| o.choices())
        .find(|&&c| c >= ifs.len())
    {
        return Err(IfsError::InvalidParameters(format!(
            "an orbit chose transform {} from a system of {}",
            choice,
            ifs.len()
        )));
    }
    if let Selection::Iteration(i) = selection {
        if let Some(short) = orbits.iter().find(|o| o.len() <= i) {
            return Err(IfsError::InvalidParameters(format!(
                "iteration {} is past the end of an orbit of {} points",
                i,
                short.len()
            )));
        }
    }
    Ok(())
}

fn plot_orbit(
    orbit: &Orbit,
    tints: &[Rgb<u8>],
    raster: &mut Raster,
    selection: Selection,
    shading: Shading,
) -> RenderStats {
    let mut stats = RenderStats::default();
    if orbit.is_empty() {
        return stats;
    }
    let (first, last) = match selection {
        Selection::Iteration(i) => (i, i),
        Selection::Last => (orbit.len() - 1, orbit.len() - 1),
        Selection::Tail { burn_in } => (burn_in, orbit.len() - 1),
    };

    let mut color: Rgb<u8> = WHITE;
    for (k, point) in orbit.points().iter().enumerate().take(last + 1) {
        if k > 0 {
            let tint = tints[orbit.choices()[k - 1]];
            color = match shading {
                Shading::White => WHITE,
                Shading::Transform => tint,
                Shading::Blend => blend(color, tint),
            };
        }
        if k < first {
            continue;
        }
        if raster.plot_colored(point, color) {
            stats.plotted += 1;
        } else {
            stats.dropped += 1;
        }
    }
    stats
}

fn tints_of(ifs: &Ifs) -> Vec<Rgb<u8>> {
    ifs.transforms().map(|t| t.color()).collect()
}

/// Plots the selected points of every orbit, in order.  Out-of-region
/// points are counted as dropped, never an error.  Orbits must come from
/// `ifs`, or at least from a system with as many transforms.
pub fn render(
    orbits: &[Orbit],
    ifs: &Ifs,
    raster: &mut Raster,
    selection: Selection,
    shading: Shading,
) -> Result<RenderStats> {
    check_orbits(orbits, ifs, selection)?;
    let tints = tints_of(ifs);
    let mut stats = RenderStats::default();
    for orbit in orbits {
        stats.add(plot_orbit(orbit, &tints, raster, selection, shading));
    }
    debug!(
        plotted = stats.plotted,
        dropped = stats.dropped,
        visited = raster.visited(),
        "rendered orbits"
    );
    Ok(stats)
}

/// As [`render`], with the orbits split into contiguous chunks, one per
/// thread, each plotted into its own raster.  The partial rasters are
/// merged in chunk order, so the result matches [`render`] exactly.
pub fn render_threaded(
    orbits: &[Orbit],
    ifs: &Ifs,
    raster: &mut Raster,
    selection: Selection,
    shading: Shading,
    threads: usize,
) -> Result<RenderStats> {
    if threads == 0 {
        return Err(IfsError::InvalidParameters(
            "the thread count must be positive".to_string(),
        ));
    }
    if threads == 1 || orbits.len() < 2 {
        return render(orbits, ifs, raster, selection, shading);
    }
    check_orbits(orbits, ifs, selection)?;
    let tints = tints_of(ifs);

    let blank = Raster::from_region(raster.width(), raster.height(), raster.region())?;
    let chunk_size = (orbits.len() + threads - 1) / threads;
    let mut partials: Vec<(Raster, RenderStats)> = vec![];
    let scoped = crossbeam::scope(|spawner| {
        let handles: Vec<_> = orbits
            .chunks(chunk_size)
            .map(|chunk| {
                let tints = &tints;
                let mut partial = blank.clone();
                spawner.spawn(move |_| {
                    let mut stats = RenderStats::default();
                    for orbit in chunk {
                        stats.add(plot_orbit(orbit, tints, &mut partial, selection, shading));
                    }
                    (partial, stats)
                })
            })
            .collect();
        for handle in handles {
            match handle.join() {
                Ok(done) => partials.push(done),
                Err(cause) => panic::resume_unwind(cause),
            }
        }
    });
    if let Err(cause) = scoped {
        panic::resume_unwind(cause);
    }

    let mut stats = RenderStats::default();
    for (partial, partial_stats) in &partials {
        raster.merge(partial)?;
        stats.add(*partial_stats);
    }
    debug!(
        plotted = stats.plotted,
        dropped = stats.dropped,
        visited = raster.visited(),
        threads,
        "rendered orbits"
    );
    Ok(stats)
}
