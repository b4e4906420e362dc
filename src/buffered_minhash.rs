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
//! Buffered bottom-l MinHash with deletion support.
//!
//! Each of the `k` signature rows keeps the `l` smallest hash values it has
//! seen instead of just the minimum, so a deleted minimum can usually be
//! recovered from the rest of the buffer. Once any row runs dry, the sketch
//! can no longer be maintained from the stream alone: all rows reset and
//! [`remove`](BufferedMinHash::remove) reports a *fault* so the caller can
//! replay the underlying set (or accept a biased estimate).

use std::collections::HashSet;

use crate::SketchError;
use crate::hash::{self, HashFamily};
use crate::jaccard::JaccardIndex;

/// MinHash sketch over `k` rows of `l` buffered hash values.
///
/// Each row holds an unordered multiset of up to `l` values below its
/// admission threshold; the row's signature is the buffer minimum. Rows are a
/// flat `k * l` array scanned linearly, which wins for the small buffer depths
/// the sketch is normally run with.
///
/// # Example
/// ```rust
/// use dynsketch::buffered_minhash::BufferedMinHash;
/// use dynsketch::hash::tabulation_family;
///
/// let family = tabulation_family(4).unwrap();
/// let mut left = BufferedMinHash::with_hashes(4, 2, family.clone()).unwrap();
/// let mut right = BufferedMinHash::with_hashes(4, 2, family).unwrap();
///
/// for value in [1_u32, 2, 3, 4, 5] {
///     left.insert(value);
///     right.insert(value);
/// }
///
/// assert_eq!(left.estimate_jaccard(&right).unwrap(), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct BufferedMinHash {
    k: usize,
    l: usize,
    /// Row-major `k * l`; only the first `sizes[row]` slots of a row are live.
    buffers: Vec<u32>,
    sizes: Vec<usize>,
    /// Admission threshold per row; `u32::MAX` until the row first fills.
    /// Never tightened on remove, so it decays into an over-approximation.
    deltas: Vec<u32>,
    signature: Vec<u32>,
    hashes: HashFamily,
    elements: Option<HashSet<u32>>,
}

impl BufferedMinHash {
    /// Creates a sketch with a freshly drawn tabulation family.
    ///
    /// Sketches that should be comparable must share one family; build it once
    /// with [`tabulation_family`](crate::hash::tabulation_family) and use
    /// [`with_hashes`](Self::with_hashes) instead.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidParameter`] when `k == 0` or `l == 0`.
    pub fn new(k: usize, l: usize) -> Result<Self, SketchError> {
        if k == 0 {
            return Err(SketchError::InvalidParameter(
                "row count must be greater than zero",
            ));
        }
        Self::with_hashes(k, l, hash::tabulation_family(k)?)
    }

    /// Creates a sketch over a shared hash family of exactly `k` functions.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidParameter`] when `k == 0`, `l == 0`, or
    /// the family arity differs from `k`.
    pub fn with_hashes(k: usize, l: usize, hashes: HashFamily) -> Result<Self, SketchError> {
        if k == 0 {
            return Err(SketchError::InvalidParameter(
                "row count must be greater than zero",
            ));
        }
        if l == 0 {
            return Err(SketchError::InvalidParameter(
                "buffer depth must be greater than zero",
            ));
        }
        if hashes.len() != k {
            return Err(SketchError::InvalidParameter(
                "hash family arity must equal the row count",
            ));
        }

        Ok(Self {
            k,
            l,
            buffers: vec![u32::MAX; k * l],
            sizes: vec![0; k],
            deltas: vec![u32::MAX; k],
            signature: vec![u32::MAX; k],
            hashes,
            elements: None,
        })
    }

    /// Enables the element mirror: live elements are kept in an explicit set
    /// and replayed automatically when a fault resets the rows.
    pub fn with_element_mirror(mut self) -> Self {
        self.elements = Some(HashSet::new());
        self
    }

    /// Returns the number of signature rows `k`.
    pub fn rows(&self) -> usize {
        self.k
    }

    /// Returns the per-row buffer depth `l`.
    pub fn buffer_depth(&self) -> usize {
        self.l
    }

    /// Returns the shared hash family.
    pub fn hashes(&self) -> &HashFamily {
        &self.hashes
    }

    /// Returns `true` when every row buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.sizes.iter().all(|&size| size == 0)
    }

    /// Returns the mirrored element set, when the mirror is enabled.
    pub fn mirrored_elements(&self) -> Option<&HashSet<u32>> {
        self.elements.as_ref()
    }

    /// Adds one element to the sketch.
    pub fn insert(&mut self, x: u32) {
        if let Some(elements) = &mut self.elements {
            elements.insert(x);
        }
        self.insert_hashed(x);
    }

    /// Removes one element from the sketch.
    ///
    /// Returns `true` when a row ran dry: every row has been reset and, unless
    /// the element mirror repaired the sketch, the caller must replay the
    /// underlying set to keep the estimator unbiased. Remaining rows are not
    /// visited after a fault. Returns `false` otherwise.
    pub fn remove(&mut self, x: u32) -> bool {
        if let Some(elements) = &mut self.elements {
            elements.remove(&x);
        }

        for row in 0..self.k {
            let h = self.hashes[row].hash(x);
            if h > self.deltas[row] {
                continue;
            }

            let base = row * self.l;
            let len = self.sizes[row];
            let Some(found) = self.buffers[base..base + len].iter().position(|&v| v == h)
            else {
                continue;
            };

            self.buffers[base + found] = self.buffers[base + len - 1];
            self.sizes[row] = len - 1;

            if self.sizes[row] == 0 {
                self.reset_rows();
                self.replay_mirror();
                return true;
            }

            if self.signature[row] == h {
                self.signature[row] = self.row_min(row);
            }
        }

        false
    }

    /// Returns the current `k`-value MinHash signature.
    ///
    /// The slice stays valid and unchanged until the next mutation.
    pub fn signature(&self) -> &[u32] {
        &self.signature
    }

    /// Estimates Jaccard similarity as the fraction of agreeing signature rows.
    ///
    /// # Errors
    /// Returns [`SketchError::IncompatibleSketches`] unless both sketches have
    /// the same shape and share one hash family.
    pub fn estimate_jaccard(&self, other: &Self) -> Result<f64, SketchError> {
        if self.k != other.k || self.l != other.l {
            return Err(SketchError::IncompatibleSketches(
                "row count and buffer depth must match",
            ));
        }
        if !hash::same_family(&self.hashes, &other.hashes) {
            return Err(SketchError::IncompatibleSketches(
                "sketches must share one hash family",
            ));
        }

        let matches = self
            .signature
            .iter()
            .zip(other.signature.iter())
            .filter(|(left, right)| left == right)
            .count();
        Ok(matches as f64 / self.k as f64)
    }

    /// Resets the sketch to the empty state, clearing the mirror as well.
    pub fn clear(&mut self) {
        self.reset_rows();
        if let Some(elements) = &mut self.elements {
            elements.clear();
        }
    }

    fn insert_hashed(&mut self, x: u32) {
        for row in 0..self.k {
            let h = self.hashes[row].hash(x);
            if h > self.deltas[row] {
                continue;
            }

            let base = row * self.l;
            if self.sizes[row] < self.l {
                self.buffers[base + self.sizes[row]] = h;
                self.sizes[row] += 1;
            } else {
                let current_max = self.deltas[row];
                for slot in &mut self.buffers[base..base + self.l] {
                    if *slot == current_max {
                        *slot = h;
                        break;
                    }
                }
            }

            if self.sizes[row] == self.l {
                self.deltas[row] = self.row_max(row);
            }

            if h < self.signature[row] {
                self.signature[row] = h;
            }
        }
    }

    fn replay_mirror(&mut self) {
        if let Some(elements) = self.elements.take() {
            for &x in &elements {
                self.insert_hashed(x);
            }
            self.elements = Some(elements);
        }
    }

    fn reset_rows(&mut self) {
        self.sizes.fill(0);
        self.deltas.fill(u32::MAX);
        self.signature.fill(u32::MAX);
    }

    fn row_min(&self, row: usize) -> u32 {
        let base = row * self.l;
        self.buffers[base..base + self.sizes[row]]
            .iter()
            .copied()
            .min()
            .unwrap_or(u32::MAX)
    }

    fn row_max(&self, row: usize) -> u32 {
        let base = row * self.l;
        self.buffers[base..base + self.sizes[row]]
            .iter()
            .copied()
            .max()
            .unwrap_or(u32::MAX)
    }
}

impl JaccardIndex for BufferedMinHash {
    fn jaccard_index(&self, other: &Self) -> Result<f64, SketchError> {
        self.estimate_jaccard(other)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::BufferedMinHash;
    use crate::hash::{HashFamily, HashFn, tabulation_family, tabulation_family_from_rng};

    fn identity_family(k: usize) -> HashFamily {
        let family: Vec<HashFn> = (0..k).map(|_| HashFn::Identity).collect();
        Arc::from(family)
    }

    /// Checks the per-row structural invariants. The threshold is only
    /// required to dominate the buffer; after removes it may exceed the true
    /// maximum.
    fn assert_invariants(sketch: &BufferedMinHash) {
        for row in 0..sketch.k {
            let base = row * sketch.l;
            let live = &sketch.buffers[base..base + sketch.sizes[row]];

            assert!(sketch.sizes[row] <= sketch.l);
            assert!(live.iter().all(|&value| value <= sketch.deltas[row]));

            if sketch.sizes[row] == sketch.l {
                assert_eq!(sketch.deltas[row], *live.iter().max().unwrap());
            }
            if live.is_empty() {
                assert_eq!(sketch.signature[row], u32::MAX);
            } else {
                assert_eq!(sketch.signature[row], *live.iter().min().unwrap());
            }
        }
    }

    #[test]
    fn constructor_validates_parameters() {
        assert!(BufferedMinHash::new(0, 2).is_err());
        assert!(BufferedMinHash::new(2, 0).is_err());
        assert!(BufferedMinHash::new(4, 2).is_ok());
        assert!(BufferedMinHash::with_hashes(4, 2, identity_family(3)).is_err());
    }

    #[test]
    fn empty_sketch_signature_is_all_absent() {
        let sketch = BufferedMinHash::new(4, 2).unwrap();
        assert!(sketch.is_empty());
        assert!(sketch.signature().iter().all(|&value| value == u32::MAX));
    }

    #[test]
    fn identical_streams_produce_identical_signatures() {
        let family = tabulation_family(4).unwrap();
        let mut left = BufferedMinHash::with_hashes(4, 2, family.clone()).unwrap();
        let mut right = BufferedMinHash::with_hashes(4, 2, family).unwrap();

        for value in [1_u32, 2, 3, 4, 5] {
            left.insert(value);
            right.insert(value);
        }

        assert_eq!(left.signature(), right.signature());
        assert_eq!(left.estimate_jaccard(&right).unwrap(), 1.0);
    }

    #[test]
    fn disjoint_sets_have_low_similarity() {
        let mut rng = StdRng::seed_from_u64(0xD15);
        let family = tabulation_family_from_rng(64, &mut rng).unwrap();
        let mut left = BufferedMinHash::with_hashes(64, 4, family.clone()).unwrap();
        let mut right = BufferedMinHash::with_hashes(64, 4, family).unwrap();

        for value in 1_u32..=100 {
            left.insert(value);
        }
        for value in 101_u32..=200 {
            right.insert(value);
        }

        let estimate = left.estimate_jaccard(&right).unwrap();
        assert!(estimate <= 0.15, "estimate={estimate}");
    }

    #[test]
    fn draining_a_single_slot_row_faults() {
        let mut sketch = BufferedMinHash::new(1, 1).unwrap();
        let values: Vec<u32> = (0..10).map(|i| i * 17 + 3).collect();
        for &value in &values {
            sketch.insert(value);
        }

        let mut faulted = false;
        for &value in &values {
            faulted |= sketch.remove(value);
        }
        assert!(faulted);
        assert!(sketch.is_empty());
    }

    #[test]
    fn fault_resets_to_the_empty_signature() {
        let mut sketch = BufferedMinHash::new(4, 2).unwrap();
        sketch.insert(7);
        assert!(sketch.remove(7));
        assert!(sketch.is_empty());
        assert!(sketch.signature().iter().all(|&value| value == u32::MAX));
    }

    #[test]
    fn duplicates_occupy_separate_buffer_slots() {
        let mut sketch = BufferedMinHash::with_hashes(1, 2, identity_family(1)).unwrap();
        sketch.insert(5);
        sketch.insert(5);
        assert_eq!(sketch.signature(), &[5]);

        // The first removal only consumes one of the two occurrences.
        assert!(!sketch.remove(5));
        assert_eq!(sketch.signature(), &[5]);
        assert!(sketch.remove(5));
    }

    #[test]
    fn full_buffer_insert_replaces_the_maximum() {
        let mut sketch = BufferedMinHash::with_hashes(1, 2, identity_family(1)).unwrap();
        sketch.insert(30);
        sketch.insert(20);
        sketch.insert(10);
        assert_eq!(sketch.signature(), &[10]);
        assert_invariants(&sketch);

        // 30 was evicted, so removing it must not touch the buffer.
        assert!(!sketch.remove(30));
        assert_eq!(sketch.signature(), &[10]);
        assert!(!sketch.remove(20));
        assert!(sketch.remove(10));
    }

    #[test]
    fn threshold_is_not_tightened_on_remove() {
        let mut sketch = BufferedMinHash::with_hashes(1, 2, identity_family(1)).unwrap();
        sketch.insert(10);
        sketch.insert(20);
        assert!(!sketch.remove(20));

        // The stale threshold (20) still rejects 25, so the only live value
        // is 10 and removing it must drain the row.
        sketch.insert(25);
        assert!(sketch.remove(10));
    }

    #[test]
    fn removed_minimum_is_recovered_from_the_buffer() {
        let mut sketch = BufferedMinHash::with_hashes(1, 3, identity_family(1)).unwrap();
        sketch.insert(10);
        sketch.insert(20);
        sketch.insert(30);
        assert_eq!(sketch.signature(), &[10]);

        assert!(!sketch.remove(10));
        assert_eq!(sketch.signature(), &[20]);
        assert_invariants(&sketch);
    }

    #[test]
    fn mirror_replays_live_elements_after_a_fault() {
        let family = identity_family(2);
        let mut sketch = BufferedMinHash::with_hashes(2, 1, family.clone())
            .unwrap()
            .with_element_mirror();
        for value in 1_u32..=20 {
            sketch.insert(value);
        }

        // The row minimum is 1, so removing it drains the depth-1 buffers.
        assert!(sketch.remove(1));
        assert_eq!(sketch.mirrored_elements().unwrap().len(), 19);

        let mut fresh = BufferedMinHash::with_hashes(2, 1, family).unwrap();
        for &value in sketch.mirrored_elements().unwrap() {
            fresh.insert(value);
        }
        assert_eq!(sketch.signature(), fresh.signature());
        assert_eq!(sketch.signature(), &[2, 2]);
    }

    #[test]
    fn estimate_rejects_foreign_families() {
        let left = BufferedMinHash::new(4, 2).unwrap();
        let right = BufferedMinHash::new(4, 2).unwrap();
        assert!(left.estimate_jaccard(&right).is_err());

        let shallow = BufferedMinHash::with_hashes(4, 3, left.hashes().clone()).unwrap();
        assert!(left.estimate_jaccard(&shallow).is_err());
    }

    #[test]
    fn clear_resets_state_and_mirror() {
        let mut sketch = BufferedMinHash::new(4, 2).unwrap().with_element_mirror();
        for value in 0_u32..16 {
            sketch.insert(value);
        }
        sketch.clear();
        assert!(sketch.is_empty());
        assert!(sketch.mirrored_elements().unwrap().is_empty());
        assert!(sketch.signature().iter().all(|&value| value == u32::MAX));
    }

    #[test]
    fn invariants_hold_across_a_random_workload() {
        let mut rng = StdRng::seed_from_u64(0xBEEF);
        let family = tabulation_family_from_rng(8, &mut rng).unwrap();
        let mut sketch = BufferedMinHash::with_hashes(8, 4, family).unwrap();

        let mut live: Vec<u32> = Vec::new();
        for _ in 0..2_000 {
            if live.is_empty() || rng.random_range(0..10) < 6 {
                let value: u32 = rng.random();
                sketch.insert(value);
                live.push(value);
            } else {
                let index = rng.random_range(0..live.len());
                let value = live.swap_remove(index);
                sketch.remove(value);
            }
            assert_invariants(&sketch);
        }
    }
}
