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
//! Counting-array similarity sketch with native deletions.
//!
//! A matrix of signed counters, one row per possible least-significant-bit of
//! a pairwise hash, absorbs inserts and deletes symmetrically, so the sketch
//! never needs the fault/replay protocol of the buffered MinHash. A signature
//! is the `t`-value MinHash of the occupied columns of one row; the row is
//! chosen from the current set size, so the expected column population matches
//! the sampling rate the estimator is analyzed for.
//!
//! Row 0 doubles as a column aggregate: every update lands in the row selected
//! by the hash *and* in row 0, except that updates already landing in row 0
//! are not counted twice. Row 0 therefore counts every live element exactly
//! once, which keeps `size` equal to the row-0 column sum.

use crate::SketchError;
use crate::hash::{self, HashFamily, HashFn, PairwiseHash};
use crate::jaccard::JaccardIndex;

/// Log2 of the top of the 32-bit universe; also the lsb assigned to zero.
const UNIVERSE_LOG2: usize = 31;

/// Number of counter rows: one per lsb value.
const ROWS: usize = UNIVERSE_LOG2 + 1;

/// Similarity sketch over a `32 x c` signed counting matrix.
///
/// # Example
/// ```rust
/// use dynsketch::counting_minhash::CountingMinHash;
///
/// let mut sketch = CountingMinHash::new(128, 16).unwrap();
/// for value in 0_u32..1_000 {
///     sketch.insert(value);
/// }
/// for value in 0_u32..1_000 {
///     sketch.remove(value);
/// }
///
/// // Deletions cancel insertions exactly.
/// assert_eq!(sketch.size(), 0);
/// assert!(sketch.signature().iter().all(|&value| value == u32::MAX));
/// ```
#[derive(Debug, Clone)]
pub struct CountingMinHash {
    columns: usize,
    /// Row-major `ROWS * columns` signed counters.
    counters: Vec<i64>,
    /// Full-width pairwise hash; its lsb selects the row.
    h1: HashFn,
    /// Pairwise hash into `[0, columns)`; selects the column.
    h2: HashFn,
    /// The `t` MinHash functions applied to occupied column indices.
    hashes: HashFamily,
    size: i64,
    /// Scratch for the last signature query; overwritten by the next one.
    signature: Vec<u32>,
}

impl CountingMinHash {
    /// Creates a sketch with freshly drawn pairwise hashes: a full-width row
    /// hash, a column hash into `[0, c)`, and `t` MinHash functions.
    ///
    /// Sketches that should be comparable must share their hashes; build them
    /// once and use [`with_hashes`](Self::with_hashes) instead.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidParameter`] when `c == 0` or `t == 0`.
    pub fn new(c: u32, t: usize) -> Result<Self, SketchError> {
        if c == 0 {
            return Err(SketchError::InvalidParameter(
                "column count must be greater than zero",
            ));
        }

        let h1 = HashFn::Pairwise(PairwiseHash::random(u32::MAX)?);
        let h2 = HashFn::Pairwise(PairwiseHash::random(c)?);
        Self::with_hashes(c, h1, h2, hash::pairwise_family(t, u32::MAX)?)
    }

    /// Creates a sketch over shared hashes; the MinHash family's arity is `t`.
    ///
    /// `h2` must map into `[0, c)`.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidParameter`] when `c == 0`, the family is
    /// empty, or `h2` is a pairwise hash with a different bucket count.
    pub fn with_hashes(
        c: u32,
        h1: HashFn,
        h2: HashFn,
        hashes: HashFamily,
    ) -> Result<Self, SketchError> {
        if c == 0 {
            return Err(SketchError::InvalidParameter(
                "column count must be greater than zero",
            ));
        }
        if hashes.is_empty() {
            return Err(SketchError::InvalidParameter(
                "family must contain at least one hash function",
            ));
        }
        if let HashFn::Pairwise(pairwise) = &h2
            && pairwise.buckets() != c
        {
            return Err(SketchError::InvalidParameter(
                "column hash buckets must equal the column count",
            ));
        }

        let columns = c as usize;
        let t = hashes.len();
        Ok(Self {
            columns,
            counters: vec![0; ROWS * columns],
            h1,
            h2,
            hashes,
            size: 0,
            signature: vec![u32::MAX; t],
        })
    }

    /// Returns the column count `c`.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Returns the number of counter rows (one per lsb value).
    pub fn rows(&self) -> usize {
        ROWS
    }

    /// Returns the signature width `t`.
    pub fn num_hashes(&self) -> usize {
        self.hashes.len()
    }

    /// Returns the current cardinality of the represented multiset.
    pub fn size(&self) -> u64 {
        self.size.max(0) as u64
    }

    /// Returns `true` when insertions and deletions currently cancel out.
    pub fn is_empty(&self) -> bool {
        self.size <= 0
    }

    /// Adds one element to the sketch.
    pub fn insert(&mut self, x: u32) {
        self.update(x, 1);
    }

    /// Removes one element from the sketch.
    ///
    /// Always returns `false`: counters absorb deletions natively and the
    /// sketch never faults.
    pub fn remove(&mut self, x: u32) -> bool {
        self.update(x, -1);
        false
    }

    /// Returns the size-adapted MinHash signature with default tuning.
    ///
    /// The returned slice is a scratch buffer shared by all signature queries;
    /// copy it before issuing the next one if the values are still needed.
    pub fn signature(&mut self) -> &[u32] {
        self.signature_with(1.0, 1.0)
    }

    /// Returns the MinHash signature of the row matching `alpha * r * size`.
    ///
    /// See [`signature`](Self::signature) for the scratch-buffer caveat.
    pub fn signature_with(&mut self, alpha: f64, r: f64) -> &[u32] {
        let row = Self::clamp_row((alpha * r * self.size.max(0) as f64).log2().floor());
        self.row_signature(row)
    }

    /// Fills the scratch buffer with the `t` MinHash values of one row and
    /// returns it. Rows past the last are clamped to the last.
    pub fn row_signature(&mut self, row: usize) -> &[u32] {
        let row = row.min(ROWS - 1);
        for index in 0..self.hashes.len() {
            self.signature[index] = self.min_hash_value(index, row);
        }
        &self.signature
    }

    /// Estimates Jaccard similarity from the signatures of the deepest row
    /// both size ranges support.
    ///
    /// When the ranges `[log2(a*r*size), log2(a*size)]` of the two sketches do
    /// not intersect, the sets differ too much in scale for row signatures to
    /// be comparable and the size ratio `min/max` is returned instead.
    ///
    /// # Errors
    /// Returns [`SketchError::IncompatibleSketches`] unless both sketches have
    /// the same shape and share `h1`, `h2`, and the MinHash family.
    pub fn estimate_jaccard(
        &self,
        other: &Self,
        alpha: f64,
        r: f64,
    ) -> Result<f64, SketchError> {
        if self.columns != other.columns || self.hashes.len() != other.hashes.len() {
            return Err(SketchError::IncompatibleSketches(
                "column count and signature width must match",
            ));
        }
        if self.h1 != other.h1 || self.h2 != other.h2 {
            return Err(SketchError::IncompatibleSketches(
                "sketches must share their row and column hashes",
            ));
        }
        if !hash::same_family(&self.hashes, &other.hashes) {
            return Err(SketchError::IncompatibleSketches(
                "sketches must share one hash family",
            ));
        }

        let size_left = self.size.max(0) as f64;
        let size_right = other.size.max(0) as f64;

        let sx_left = (alpha * r * size_left).log2().floor();
        let dx_left = (alpha * size_left).log2().floor();
        let sx_right = (alpha * r * size_right).log2().floor();
        let dx_right = (alpha * size_right).log2().floor();

        if dx_left < sx_right || sx_left > dx_right {
            return Ok(size_left.min(size_right) / size_left.max(size_right));
        }

        let row = Self::clamp_row(dx_left.min(dx_right));
        let matches = (0..self.hashes.len())
            .filter(|&index| self.min_hash_value(index, row) == other.min_hash_value(index, row))
            .count();
        Ok(matches as f64 / self.hashes.len() as f64)
    }

    /// Resets every counter and the running size.
    pub fn clear(&mut self) {
        self.counters.fill(0);
        self.size = 0;
        self.signature.fill(u32::MAX);
    }

    fn update(&mut self, x: u32, op: i64) {
        let row = Self::lsb(self.h1.hash(x));
        let column = self.h2.hash(x) as usize;
        debug_assert!(column < self.columns, "column hash out of range");

        self.counters[row * self.columns + column] += op;
        if row != 0 {
            self.counters[column] += op;
        }
        self.size += op;
    }

    /// MinHash of one row under one function: the minimum over occupied
    /// columns of the hashed flat column index, `u32::MAX` for an empty row.
    fn min_hash_value(&self, index: usize, row: usize) -> u32 {
        let hash = &self.hashes[index];
        let base = row * self.columns;
        let mut min = u32::MAX;
        for column in 0..self.columns {
            if self.counters[base + column] != 0 {
                min = min.min(hash.hash((base + column) as u32));
            }
        }
        min
    }

    /// 0-based index of the least significant set bit; zero maps to the top
    /// row, as if the bit were just past the universe.
    fn lsb(y: u32) -> usize {
        if y == 0 {
            UNIVERSE_LOG2
        } else {
            y.trailing_zeros() as usize
        }
    }

    fn clamp_row(row: f64) -> usize {
        row.max(0.0).min((ROWS - 1) as f64) as usize
    }
}

impl JaccardIndex for CountingMinHash {
    fn jaccard_index(&self, other: &Self) -> Result<f64, SketchError> {
        self.estimate_jaccard(other, 1.0, 1.0)
    }
}
