// MIT License
//
// Copyright (c) 2026 Raja Lehtihet & Wael El Oraiby
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//
//! Dense bit-array representation of a subset of `[0, U)`.
//!
//! Backs the synthetic-set generators used to measure estimation error: a
//! base set is Bernoulli-sampled from the universe and a correlated partner
//! is derived by randomly flipping members in and out. Set operations reduce
//! to word-wise AND/OR plus popcounts.

use rand::Rng;
use rand::distr::{Bernoulli, Distribution};

use crate::SketchError;
use crate::jaccard::JaccardIndex;

/// A subset of `[0, U)` stored as one bit per universe element.
///
/// # Example
/// ```rust
/// use dynsketch::bitarray::BitArray;
///
/// let mut set = BitArray::new(1_000).unwrap();
/// set.flip(3);
/// set.flip(500);
///
/// assert!(set.get(3));
/// assert!(!set.get(4));
/// assert_eq!(set.count_ones(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitArray {
    bit_len: usize,
    words: Vec<u64>,
}

impl BitArray {
    /// Creates an empty set over the universe `[0, universe)`.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidParameter`] when `universe == 0`.
    pub fn new(universe: u32) -> Result<Self, SketchError> {
        if universe == 0 {
            return Err(SketchError::InvalidParameter(
                "universe must be greater than zero",
            ));
        }

        let bit_len = universe as usize;
        Ok(Self {
            bit_len,
            words: vec![0; bit_len.div_ceil(64)],
        })
    }

    /// Bernoulli-samples a set: each universe element is included with
    /// probability `p`, using the thread RNG.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidParameter`] for an empty universe or a
    /// probability outside `[0, 1]`.
    pub fn random(universe: u32, p: f64) -> Result<Self, SketchError> {
        Self::from_rng(universe, p, &mut rand::rng())
    }

    /// Bernoulli-samples a set from the supplied generator.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidParameter`] for an empty universe or a
    /// probability outside `[0, 1]`.
    pub fn from_rng<R: Rng + ?Sized>(
        universe: u32,
        p: f64,
        rng: &mut R,
    ) -> Result<Self, SketchError> {
        let mut array = Self::new(universe)?;
        let include = bernoulli(p)?;
        for index in 0..universe {
            if include.sample(rng) {
                array.flip(index);
            }
        }
        Ok(array)
    }

    /// Derives a correlated set: every member is dropped with probability
    /// `p1`, every non-member added with probability `p2`. Uses the thread
    /// RNG.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidParameter`] for probabilities outside
    /// `[0, 1]`.
    pub fn perturbed(&self, p1: f64, p2: f64) -> Result<Self, SketchError> {
        self.perturbed_from_rng(p1, p2, &mut rand::rng())
    }

    /// Derives a correlated set from the supplied generator.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidParameter`] for probabilities outside
    /// `[0, 1]`.
    pub fn perturbed_from_rng<R: Rng + ?Sized>(
        &self,
        p1: f64,
        p2: f64,
        rng: &mut R,
    ) -> Result<Self, SketchError> {
        let drop_member = bernoulli(p1)?;
        let add_stranger = bernoulli(p2)?;

        let mut derived = self.clone();
        for index in 0..self.bit_len as u32 {
            let member = self.get(index);
            if (member && drop_member.sample(rng)) || (!member && add_stranger.sample(rng)) {
                derived.flip(index);
            }
        }
        Ok(derived)
    }

    /// Returns the universe size `U`.
    pub fn universe(&self) -> u32 {
        self.bit_len as u32
    }

    /// Toggles membership of one element.
    pub fn flip(&mut self, index: u32) {
        debug_assert!((index as usize) < self.bit_len, "index outside universe");
        self.words[index as usize / 64] ^= 1 << (index % 64);
    }

    /// Returns `true` when the element is a member.
    pub fn get(&self, index: u32) -> bool {
        debug_assert!((index as usize) < self.bit_len, "index outside universe");
        self.words[index as usize / 64] & (1 << (index % 64)) != 0
    }

    /// Returns the cardinality of the set.
    pub fn count_ones(&self) -> u64 {
        self.words.iter().map(|word| u64::from(word.count_ones())).sum()
    }

    /// Returns `|self ∩ other|`.
    ///
    /// # Errors
    /// Returns [`SketchError::IncompatibleSketches`] for differing universes.
    pub fn intersection_size(&self, other: &Self) -> Result<u64, SketchError> {
        self.ensure_same_universe(other)?;
        Ok(self
            .words
            .iter()
            .zip(other.words.iter())
            .map(|(left, right)| u64::from((left & right).count_ones()))
            .sum())
    }

    /// Returns `|self ∪ other|`.
    ///
    /// # Errors
    /// Returns [`SketchError::IncompatibleSketches`] for differing universes.
    pub fn union_size(&self, other: &Self) -> Result<u64, SketchError> {
        self.ensure_same_universe(other)?;
        Ok(self
            .words
            .iter()
            .zip(other.words.iter())
            .map(|(left, right)| u64::from((left | right).count_ones()))
            .sum())
    }

    /// Returns the exact Jaccard similarity of the two sets. Two empty sets
    /// count as identical.
    ///
    /// # Errors
    /// Returns [`SketchError::IncompatibleSketches`] for differing universes.
    pub fn jaccard(&self, other: &Self) -> Result<f64, SketchError> {
        let union = self.union_size(other)?;
        if union == 0 {
            return Ok(1.0);
        }
        Ok(self.intersection_size(other)? as f64 / union as f64)
    }

    fn ensure_same_universe(&self, other: &Self) -> Result<(), SketchError> {
        if self.bit_len != other.bit_len {
            return Err(SketchError::IncompatibleSketches(
                "bit arrays must share one universe",
            ));
        }
        Ok(())
    }
}

impl JaccardIndex for BitArray {
    fn jaccard_index(&self, other: &Self) -> Result<f64, SketchError> {
        self.jaccard(other)
    }
}

fn bernoulli(p: f64) -> Result<Bernoulli, SketchError> {
    Bernoulli::new(p).map_err(|_| {
        SketchError::InvalidParameter("probability must be within 0 and 1")
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::BitArray;

    #[test]
    fn constructor_rejects_an_empty_universe() {
        assert!(BitArray::new(0).is_err());
        assert!(BitArray::new(1).is_ok());
    }

    #[test]
    fn flip_toggles_membership() {
        let mut set = BitArray::new(130).unwrap();
        assert!(!set.get(129));
        set.flip(129);
        assert!(set.get(129));
        set.flip(129);
        assert!(!set.get(129));
    }

    #[test]
    fn count_matches_a_naive_scan() {
        let mut rng = StdRng::seed_from_u64(21);
        let set = BitArray::from_rng(1_000, 0.3, &mut rng).unwrap();

        let naive = (0..1_000).filter(|&index| set.get(index)).count() as u64;
        assert_eq!(set.count_ones(), naive);
    }

    #[test]
    fn sampling_extremes_are_exact() {
        let mut rng = StdRng::seed_from_u64(22);
        let empty = BitArray::from_rng(256, 0.0, &mut rng).unwrap();
        assert_eq!(empty.count_ones(), 0);

        let full = BitArray::from_rng(256, 1.0, &mut rng).unwrap();
        assert_eq!(full.count_ones(), 256);
    }

    #[test]
    fn sampling_rejects_bad_probabilities() {
        assert!(BitArray::random(64, -0.1).is_err());
        assert!(BitArray::random(64, 1.5).is_err());
    }

    #[test]
    fn zero_perturbation_is_an_exact_copy() {
        let mut rng = StdRng::seed_from_u64(23);
        let base = BitArray::from_rng(512, 0.2, &mut rng).unwrap();
        let copy = base.perturbed_from_rng(0.0, 0.0, &mut rng).unwrap();
        assert_eq!(base, copy);
    }

    #[test]
    fn total_perturbation_is_the_complement() {
        let mut rng = StdRng::seed_from_u64(24);
        let base = BitArray::from_rng(512, 0.4, &mut rng).unwrap();
        let complement = base.perturbed_from_rng(1.0, 1.0, &mut rng).unwrap();

        for index in 0..512 {
            assert_ne!(base.get(index), complement.get(index));
        }
    }

    #[test]
    fn set_operations_match_naive_loops() {
        let mut rng = StdRng::seed_from_u64(25);
        let left = BitArray::from_rng(777, 0.3, &mut rng).unwrap();
        let right = left.perturbed_from_rng(0.2, 0.1, &mut rng).unwrap();

        let mut intersection = 0_u64;
        let mut union = 0_u64;
        for index in 0..777 {
            if left.get(index) && right.get(index) {
                intersection += 1;
            }
            if left.get(index) || right.get(index) {
                union += 1;
            }
        }

        assert_eq!(left.intersection_size(&right).unwrap(), intersection);
        assert_eq!(left.union_size(&right).unwrap(), union);
        assert_eq!(
            left.jaccard(&right).unwrap(),
            intersection as f64 / union as f64
        );
    }

    #[test]
    fn jaccard_boundaries() {
        let mut left = BitArray::new(128).unwrap();
        let mut right = BitArray::new(128).unwrap();
        assert_eq!(left.jaccard(&right).unwrap(), 1.0);

        left.flip(1);
        right.flip(2);
        assert_eq!(left.jaccard(&right).unwrap(), 0.0);

        right.flip(2);
        right.flip(1);
        assert_eq!(left.jaccard(&right).unwrap(), 1.0);
    }

    #[test]
    fn set_operations_reject_mismatched_universes() {
        let left = BitArray::new(128).unwrap();
        let right = BitArray::new(256).unwrap();
        assert!(left.intersection_size(&right).is_err());
        assert!(left.union_size(&right).is_err());
        assert!(left.jaccard(&right).is_err());
    }

    #[test]
    fn random_sampling_lands_near_its_probability() {
        let mut rng = StdRng::seed_from_u64(26);
        let set = BitArray::from_rng(100_000, 0.05, &mut rng).unwrap();
        let density = set.count_ones() as f64 / 100_000.0;
        assert!((density - 0.05).abs() < 0.01, "density={density}");
    }
}
