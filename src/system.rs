// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The iterated function system: an ordered list of affine transforms,
//! each paired with the probability of being selected at any given
//! step.  Evaluating every transform at every step is possible (see
//! `DeterministicEvaluator`), but the usual approach is probabilistic,
//! which is what `choose_transform` supports.

use rand::Rng;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::affine::AffineTransform;
use crate::error::{IfsError, Result};

/// Absolute tolerance on the sum of the weights.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq)]
struct Entry {
    transform: AffineTransform,
    weight: f64,
}

/// An ordered, weighted set of affine transforms.
///
/// Clones share the underlying list.  `add_transform` copies it first
/// if anyone else holds it, so no clone ever sees another's changes.
#[derive(Clone, Debug, PartialEq)]
pub struct Ifs {
    entries: Arc<Vec<Entry>>,
}

fn check_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(IfsError::InvalidSystem(format!(
            "weight {} is not a finite non-negative number",
            weight
        )));
    }
    Ok(())
}

fn check_total(entries: &[Entry]) -> Result<()> {
    let total: f64 = entries.iter().map(|e| e.weight).sum();
    if (total - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(IfsError::InvalidSystem(format!(
            "weights sum to {}, not 1.0",
            total
        )));
    }
    Ok(())
}

impl Ifs {
    /// A system in which every transform is equally likely.
    pub fn uniform(transforms: Vec<AffineTransform>) -> Result<Self> {
        if transforms.is_empty() {
            return Err(IfsError::InvalidSystem(
                "a system needs at least one transform".to_string(),
            ));
        }
        let weight = 1.0 / transforms.len() as f64;
        let weights = vec![weight; transforms.len()];
        Ifs::new(transforms, weights)
    }

    /// A system with explicit selection probabilities, which must be
    /// non-negative, one per transform, and sum to one.
    pub fn new(transforms: Vec<AffineTransform>, weights: Vec<f64>) -> Result<Self> {
        if transforms.is_empty() {
            return Err(IfsError::InvalidSystem(
                "a system needs at least one transform".to_string(),
            ));
        }
        if transforms.len() != weights.len() {
            return Err(IfsError::InvalidSystem(format!(
                "{} transforms but {} weights",
                transforms.len(),
                weights.len()
            )));
        }
        for &weight in &weights {
            check_weight(weight)?;
        }
        let entries: Vec<Entry> = transforms
            .into_iter()
            .zip(weights)
            .map(|(transform, weight)| Entry { transform, weight })
            .collect();
        check_total(&entries)?;
        debug!(transforms = entries.len(), "built iterated function system");
        Ok(Ifs {
            entries: Arc::new(entries),
        })
    }

    /// Appends a transform.  The new weight must keep the total at one,
    /// so the existing weights have to leave room for it.  On failure
    /// the system is left unchanged.
    pub fn add_transform(&mut self, transform: AffineTransform, weight: f64) -> Result<()> {
        check_weight(weight)?;
        let total: f64 = self.weights().sum::<f64>() + weight;
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(IfsError::InvalidSystem(format!(
                "adding weight {} brings the total to {}, not 1.0",
                weight, total
            )));
        }
        Arc::make_mut(&mut self.entries).push(Entry { transform, weight });
        Ok(())
    }

    /// Number of transforms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; an empty system cannot be built.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The transform at `index`.
    pub fn transform(&self, index: usize) -> Option<&AffineTransform> {
        self.entries.get(index).map(|e| &e.transform)
    }

    /// The transforms, in order.
    pub fn transforms(&self) -> impl Iterator<Item = &AffineTransform> {
        self.entries.iter().map(|e| &e.transform)
    }

    /// The weights, in order.
    pub fn weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|e| e.weight)
    }

    /// Index of the transform selected by a uniform draw `u` in `[0, 1)`.
    ///
    /// Walks the cumulative weights and returns the first index whose
    /// running total reaches `u`, so a draw landing exactly on a boundary
    /// selects the earlier transform.  Rounding can leave the final total
    /// a hair below `u`; the last transform is returned in that case.
    pub fn select(&self, u: f64) -> usize {
        let mut running_total = 0.0;
        for (i, entry) in self.entries.iter().enumerate() {
            running_total += entry.weight;
            if u <= running_total {
                return i;
            }
        }
        self.entries.len() - 1
    }

    /// Draws one value from `rng` and returns the index of the selected
    /// transform.
    pub fn choose_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.select(rng.gen::<f64>())
    }

    /// Draws one value from `rng` and returns the selected transform
    /// along with its index.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, &AffineTransform) {
        let index = self.choose_index(rng);
        (index, &self.entries[index].transform)
    }

    /// Draws one value from `rng` and returns the selected transform.
    pub fn choose_transform<R: Rng + ?Sized>(&self, rng: &mut R) -> &AffineTransform {
        self.choose(rng).1
    }
}

impl fmt::Display for Ifs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "transform: ")?;
        for entry in self.entries.iter() {
            writeln!(
                f,
                "\t{} at {}%",
                entry.transform,
                (100.0 * entry.weight) as i64
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn shrink_toward(e: f64, f: f64) -> AffineTransform {
        AffineTransform::new(0.5, 0.0, 0.0, 0.5, e, f)
    }

    fn triangle() -> Vec<AffineTransform> {
        vec![
            shrink_toward(0.0, 0.0),
            shrink_toward(0.5, 0.0),
            shrink_toward(0.0, 0.5),
        ]
    }

    fn weight_sum(ifs: &Ifs) -> f64 {
        ifs.weights().sum()
    }

    #[test]
    fn empty_system_is_rejected() {
        assert!(matches!(
            Ifs::uniform(vec![]),
            Err(IfsError::InvalidSystem(_))
        ));
        assert!(matches!(
            Ifs::new(vec![], vec![]),
            Err(IfsError::InvalidSystem(_))
        ));
    }

    #[test]
    fn mismatched_counts_are_rejected() {
        let r = Ifs::new(triangle(), vec![0.5, 0.5]);
        assert!(matches!(r, Err(IfsError::InvalidSystem(_))));
    }

    #[test]
    fn weights_must_sum_to_one() {
        let r = Ifs::new(triangle(), vec![0.5, 0.25, 0.2]);
        assert!(matches!(r, Err(IfsError::InvalidSystem(_))));
    }

    #[test]
    fn negative_weights_are_rejected() {
        let r = Ifs::new(triangle(), vec![1.5, -0.25, -0.25]);
        assert!(matches!(r, Err(IfsError::InvalidSystem(_))));
    }

    #[test]
    fn hand_entered_thirds_are_accepted() {
        let ifs = Ifs::new(triangle(), vec![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]).unwrap();
        assert!((weight_sum(&ifs) - 1.0).abs() < WEIGHT_TOLERANCE);
    }

    #[test]
    fn uniform_assigns_equal_weights() {
        let ifs = Ifs::uniform(triangle()).unwrap();
        assert_eq!(ifs.len(), 3);
        for w in ifs.weights() {
            assert_eq!(w, 1.0 / 3.0);
        }
    }

    #[test]
    fn add_transform_rejects_an_overfull_total() {
        let mut ifs = Ifs::new(vec![shrink_toward(0.0, 0.0)], vec![1.0]).unwrap();
        let r = ifs.add_transform(shrink_toward(0.5, 0.0), 0.5);
        assert!(matches!(r, Err(IfsError::InvalidSystem(_))));
        assert_eq!(ifs.len(), 1);
        assert!((weight_sum(&ifs) - 1.0).abs() < WEIGHT_TOLERANCE);
    }

    #[test]
    fn add_transform_accepts_a_weight_that_keeps_the_total() {
        let mut ifs = Ifs::new(
            vec![shrink_toward(0.0, 0.0), shrink_toward(0.5, 0.0)],
            vec![0.5, 0.5],
        )
        .unwrap();
        ifs.add_transform(shrink_toward(0.0, 0.5), 0.0).unwrap();
        assert_eq!(ifs.len(), 3);
        assert!((weight_sum(&ifs) - 1.0).abs() < WEIGHT_TOLERANCE);
        assert!(ifs.add_transform(shrink_toward(0.5, 0.5), -0.0).is_ok());
        assert!(ifs.add_transform(shrink_toward(0.5, 0.5), std::f64::NAN).is_err());
        assert_eq!(ifs.len(), 4);
    }

    #[test]
    fn clones_do_not_see_each_others_additions() {
        let original = Ifs::new(vec![shrink_toward(0.0, 0.0)], vec![1.0]).unwrap();
        let mut copy = original.clone();
        copy.add_transform(shrink_toward(0.5, 0.5), 0.0).unwrap();
        assert_eq!(original.len(), 1);
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn select_walks_cumulative_weights() {
        let ifs = Ifs::new(triangle(), vec![0.25, 0.5, 0.25]).unwrap();
        assert_eq!(ifs.select(0.0), 0);
        assert_eq!(ifs.select(0.1), 0);
        assert_eq!(ifs.select(0.3), 1);
        assert_eq!(ifs.select(0.74), 1);
        assert_eq!(ifs.select(0.9), 2);
    }

    #[test]
    fn boundary_draw_selects_the_earlier_transform() {
        let ifs = Ifs::new(triangle(), vec![0.25, 0.5, 0.25]).unwrap();
        assert_eq!(ifs.select(0.25), 0);
        assert_eq!(ifs.select(0.75), 1);
    }

    #[test]
    fn drift_past_the_last_total_falls_back_to_the_last_transform() {
        let ifs = Ifs::new(
            vec![shrink_toward(0.0, 0.0), shrink_toward(0.5, 0.0)],
            vec![0.5, 0.5 - 1e-12],
        )
        .unwrap();
        assert!(weight_sum(&ifs) < 0.999_999_999_999_5);
        assert_eq!(ifs.select(0.999_999_999_999_9), 1);
    }

    #[test]
    fn zero_weight_transforms_are_never_chosen() {
        let ifs = Ifs::new(triangle(), vec![0.5, 0.0, 0.5]).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10_000 {
            assert_ne!(ifs.choose_index(&mut rng), 1);
        }
    }

    #[test]
    fn choices_are_reproducible_under_a_fixed_seed() {
        let ifs = Ifs::uniform(triangle()).unwrap();
        let draw = |seed: u64| -> Vec<usize> {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..64).map(|_| ifs.choose_index(&mut rng)).collect()
        };
        assert_eq!(draw(42), draw(42));
        assert_ne!(draw(42), draw(43));

        // Each choice consumes exactly one f64 draw.
        let mut rng = StdRng::seed_from_u64(42);
        let expected: Vec<usize> = (0..64).map(|_| ifs.select(rng.gen::<f64>())).collect();
        assert_eq!(draw(42), expected);
    }

    #[test]
    fn choose_transform_returns_the_selected_entry() {
        let ifs = Ifs::new(triangle(), vec![0.0, 1.0, 0.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(ifs.choose_transform(&mut rng), &shrink_toward(0.5, 0.0));
    }

    #[test]
    fn choose_pairs_the_index_with_its_transform() {
        let ifs = Ifs::uniform(triangle()).unwrap();
        let mut by_pair = StdRng::seed_from_u64(8);
        let mut by_index = StdRng::seed_from_u64(8);
        for _ in 0..32 {
            let (index, transform) = ifs.choose(&mut by_pair);
            assert_eq!(index, ifs.choose_index(&mut by_index));
            assert_eq!(Some(transform), ifs.transform(index));
        }
    }

    #[test]
    fn display_lists_each_transform_with_its_percentage() {
        let ifs = Ifs::new(
            vec![shrink_toward(0.0, 0.0), shrink_toward(0.5, 0.0)],
            vec![0.25, 0.75],
        )
        .unwrap();
        let text = format!("{}", ifs);
        assert!(text.starts_with("transform: \n"));
        assert!(text.contains("[0, 0] at 25%\n"));
        assert!(text.contains("[0.5, 0] at 75%\n"));
    }
}
