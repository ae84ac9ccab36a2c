// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Orbit evaluation.  An iterated function system can be evaluated
//! probabilistically, by sending a cloud of random seed points forward
//! through randomly chosen transforms, or exhaustively, by applying
//! every possible sequence of transforms up to some depth.  Both
//! strategies produce the same thing: a collection of orbits.

use crossbeam::thread::ScopedJoinHandle;
use itertools::Itertools;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::panic;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::error::{IfsError, Result};
use crate::linear::Point;
use crate::system::Ifs;

/// Upper bound on the number of orbits an exhaustive run may produce.
pub const MAX_DETERMINISTIC_ORBITS: u64 = 1 << 20;

/// The trajectory of one seed point: the seed itself followed by one
/// point per iteration, plus the index of the transform that produced
/// each of those points.
#[derive(Clone, Debug, PartialEq)]
pub struct Orbit {
    points: Vec<Point>,
    choices: Vec<usize>,
}

impl Orbit {
    fn with_capacity(seed: Point, iterations: usize) -> Self {
        let mut points = Vec::with_capacity(iterations + 1);
        points.push(seed);
        Orbit {
            points,
            choices: Vec::with_capacity(iterations),
        }
    }

    fn push(&mut self, choice: usize, point: Point) {
        self.choices.push(choice);
        self.points.push(point);
    }

    /// Every visited point, seed first.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// `choices()[i]` is the transform that produced `points()[i + 1]`.
    pub fn choices(&self) -> &[usize] {
        &self.choices
    }

    /// Number of points, i.e. iterations plus one.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Never true for an orbit produced by an evaluator.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The starting point.
    pub fn seed(&self) -> Point {
        self.points[0]
    }

    /// The point after `iteration` steps.
    pub fn get(&self, iteration: usize) -> Option<Point> {
        self.points.get(iteration).copied()
    }

    /// The final point.
    pub fn last(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// The points left after discarding the first `burn_in`.
    pub fn tail(&self, burn_in: usize) -> &[Point] {
        self.points.get(burn_in..).unwrap_or(&[])
    }
}

/// A strategy for evaluating an iterated function system.
pub trait Evaluator {
    /// Steps per orbit; every orbit has `iterations() + 1` points.
    fn iterations(&self) -> usize;

    /// Produces the full collection of orbits.
    fn run(&self) -> Vec<Orbit>;
}

struct Job {
    index: usize,
    start: Point,
    rng_seed: u64,
}

/// Monte-Carlo evaluation: many independent seed points, each iterated
/// through randomly chosen transforms.
pub struct RandomEvaluator {
    ifs: Ifs,
    point_count: usize,
    iterations: usize,
    threads: usize,
    rng_seed: Option<u64>,
    seeds: Option<Vec<Point>>,
}

impl RandomEvaluator {
    /// `point_count` random seeds, `iterations` steps each.  Both must
    /// be positive.
    pub fn new(ifs: Ifs, point_count: usize, iterations: usize) -> Result<Self> {
        if point_count == 0 {
            return Err(IfsError::InvalidParameters(
                "the point count must be positive".to_string(),
            ));
        }
        if iterations == 0 {
            return Err(IfsError::InvalidParameters(
                "the iteration count must be positive".to_string(),
            ));
        }
        Ok(RandomEvaluator {
            ifs,
            point_count,
            iterations,
            threads: 1,
            rng_seed: None,
            seeds: None,
        })
    }

    /// Spread orbits over this many worker threads.
    pub fn with_threads(mut self, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(IfsError::InvalidParameters(
                "the thread count must be positive".to_string(),
            ));
        }
        self.threads = threads;
        Ok(self)
    }

    /// Makes [`Evaluator::run`] reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Use these starting points instead of random ones.  The point
    /// count becomes the number of seeds.
    pub fn with_seeds(mut self, seeds: Vec<Point>) -> Result<Self> {
        if seeds.is_empty() {
            return Err(IfsError::InvalidParameters(
                "at least one seed point is required".to_string(),
            ));
        }
        self.point_count = seeds.len();
        self.seeds = Some(seeds);
        Ok(self)
    }

    /// The system being evaluated.
    pub fn ifs(&self) -> &Ifs {
        &self.ifs
    }

    /// Number of orbits per run.
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Iterates a single seed point, drawing one transform per step
    /// from `rng`.
    pub fn run_one<R: Rng + ?Sized>(&self, seed: Point, rng: &mut R) -> Orbit {
        let mut orbit = Orbit::with_capacity(seed, self.iterations);
        let mut p = seed;
        for _ in 0..self.iterations {
            let (choice, transform) = self.ifs.choose(rng);
            p = transform.apply(p);
            orbit.push(choice, p);
        }
        orbit
    }

    /// Generates every orbit, drawing from `rng` only on this thread:
    /// the seed points (unless supplied) and one sub-generator seed per
    /// orbit.  The output is therefore the same for any thread count.
    pub fn run_all<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Orbit> {
        let square = Uniform::new_inclusive(-1.0_f64, 1.0_f64);
        let jobs: Vec<Job> = (0..self.point_count)
            .map(|index| {
                let start = match self.seeds {
                    Some(ref seeds) => seeds[index],
                    None => Point::new(square.sample(rng), square.sample(rng)),
                };
                Job {
                    index,
                    start,
                    rng_seed: rng.gen(),
                }
            })
            .collect();

        debug!(
            points = self.point_count,
            iterations = self.iterations,
            threads = self.threads,
            "evaluating orbits"
        );
        let orbits = if self.threads <= 1 || jobs.len() <= 1 {
            jobs.into_iter().map(|job| self.run_job(job)).collect()
        } else {
            self.run_threaded(jobs)
        };
        debug!(orbits = orbits.len(), "finished evaluating orbits");
        orbits
    }

    fn run_job(&self, job: Job) -> Orbit {
        let mut rng = StdRng::seed_from_u64(job.rng_seed);
        self.run_one(job.start, &mut rng)
    }

    fn run_threaded(&self, jobs: Vec<Job>) -> Vec<Orbit> {
        let count = jobs.len();
        let jobs = Arc::new(Mutex::new(jobs.into_iter()));

        let mut finished: Vec<(usize, Orbit)> = Vec::with_capacity(count);
        let scoped = crossbeam::scope(|spawner| {
            let handles: Vec<ScopedJoinHandle<Vec<(usize, Orbit)>>> = (0..self.threads)
                .map(|_| {
                    let jobs = jobs.clone();
                    spawner.spawn(move |_| {
                        let mut done = vec![];
                        loop {
                            let job = {
                                jobs.lock()
                                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                                    .next()
                            };
                            match job {
                                Some(job) => done.push((job.index, self.run_job(job))),
                                None => {
                                    break;
                                }
                            }
                        }
                        done
                    })
                })
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(done) => finished.extend(done),
                    Err(cause) => panic::resume_unwind(cause),
                }
            }
        });
        if let Err(cause) = scoped {
            panic::resume_unwind(cause);
        }

        finished.sort_by_key(|&(index, _)| index);
        finished.into_iter().map(|(_, orbit)| orbit).collect()
    }
}

impl Evaluator for RandomEvaluator {
    fn iterations(&self) -> usize {
        self.iterations
    }

    fn run(&self) -> Vec<Orbit> {
        let mut rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.run_all(&mut rng)
    }
}

/// Exhaustive evaluation: for every seed, one orbit per sequence of
/// `depth` transforms, in lexicographic order of transform indices.
pub struct DeterministicEvaluator {
    ifs: Ifs,
    depth: usize,
    seeds: Vec<Point>,
}

impl DeterministicEvaluator {
    /// Fails when `depth` is zero, there are no seeds, or the run would
    /// produce more than [`MAX_DETERMINISTIC_ORBITS`] orbits.
    pub fn new(ifs: Ifs, depth: usize, seeds: Vec<Point>) -> Result<Self> {
        if depth == 0 {
            return Err(IfsError::InvalidParameters(
                "the enumeration depth must be positive".to_string(),
            ));
        }
        if seeds.is_empty() {
            return Err(IfsError::InvalidParameters(
                "at least one seed point is required".to_string(),
            ));
        }
        let too_many = IfsError::InvalidParameters(format!(
            "{} transforms to depth {} exceeds {} orbits",
            ifs.len(),
            depth,
            MAX_DETERMINISTIC_ORBITS
        ));
        let per_seed = if depth > u32::max_value() as usize {
            None
        } else {
            (ifs.len() as u64).checked_pow(depth as u32)
        };
        match per_seed.and_then(|n| n.checked_mul(seeds.len() as u64)) {
            Some(total) if total <= MAX_DETERMINISTIC_ORBITS => {}
            _ => return Err(too_many),
        }
        Ok(DeterministicEvaluator { ifs, depth, seeds })
    }

    /// Number of orbits [`Evaluator::run`] will return.
    pub fn orbit_count(&self) -> usize {
        self.seeds.len() * self.ifs.len().pow(self.depth as u32)
    }
}

impl Evaluator for DeterministicEvaluator {
    fn iterations(&self) -> usize {
        self.depth
    }

    fn run(&self) -> Vec<Orbit> {
        debug!(
            seeds = self.seeds.len(),
            depth = self.depth,
            orbits = self.orbit_count(),
            "enumerating orbits"
        );
        let transforms: Vec<_> = self.ifs.transforms().collect();
        let mut orbits = Vec::with_capacity(self.orbit_count());
        for &seed in &self.seeds {
            for sequence in itertools::repeat_n(0..self.ifs.len(), self.depth)
                .multi_cartesian_product()
            {
                let mut orbit = Orbit::with_capacity(seed, self.depth);
                let mut p = seed;
                for choice in sequence {
                    p = transforms[choice].apply(p);
                    orbit.push(choice, p);
                }
                orbits.push(orbit);
            }
        }
        orbits
    }
}
