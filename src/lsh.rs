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
//! LSH banding over a corpus of MinHash signatures.
//!
//! Splits each signature into `b` bands of `r` rows and buckets signatures by
//! band content; every pair that collides in at least one band becomes a
//! candidate. Bands never straddle each other's rows, and a colliding pair is
//! reported once no matter how many bands agree.

use std::collections::{HashMap, HashSet};

use crate::SketchError;

/// Computes the candidate pairs of a signature corpus.
///
/// Every signature must hold exactly `bands * rows_per_band` values. The
/// result contains each unordered candidate `(a, b)` once, with `a < b`;
/// a corpus of fewer than two signatures yields no candidates.
///
/// # Example
/// ```rust
/// use dynsketch::lsh::candidate_pairs;
///
/// let signatures = [[1_u32, 2, 3, 4], [1, 2, 5, 6], [7, 8, 9, 10]];
/// let pairs = candidate_pairs(&signatures, 2, 2).unwrap();
///
/// // Only the first two signatures agree on a whole band.
/// assert_eq!(pairs.len(), 1);
/// assert!(pairs.contains(&(0, 1)));
/// ```
///
/// # Errors
/// Returns [`SketchError::InvalidParameter`] when a dimension is zero or a
/// signature has the wrong length.
pub fn candidate_pairs<S: AsRef<[u32]>>(
    signatures: &[S],
    rows_per_band: usize,
    bands: usize,
) -> Result<HashSet<(usize, usize)>, SketchError> {
    if rows_per_band == 0 {
        return Err(SketchError::InvalidParameter(
            "rows_per_band must be greater than zero",
        ));
    }
    if bands == 0 {
        return Err(SketchError::InvalidParameter(
            "bands must be greater than zero",
        ));
    }

    let width = rows_per_band
        .checked_mul(bands)
        .ok_or(SketchError::InvalidParameter(
            "bands * rows_per_band overflows usize",
        ))?;
    if signatures
        .iter()
        .any(|signature| signature.as_ref().len() != width)
    {
        return Err(SketchError::InvalidParameter(
            "signature length must equal bands * rows_per_band",
        ));
    }

    let mut pairs = HashSet::new();
    for band in 0..bands {
        let start = band * rows_per_band;
        let end = start + rows_per_band;

        let mut buckets: HashMap<&[u32], Vec<usize>> = HashMap::new();
        for (index, signature) in signatures.iter().enumerate() {
            buckets
                .entry(&signature.as_ref()[start..end])
                .or_default()
                .push(index);
        }

        for bucket in buckets.values() {
            // Indices were pushed in increasing order, so every emitted pair
            // is already ordered.
            for (position, &left) in bucket.iter().enumerate() {
                for &right in &bucket[position + 1..] {
                    pairs.insert((left, right));
                }
            }
        }
    }

    Ok(pairs)
}
