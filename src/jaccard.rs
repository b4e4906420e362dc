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
//! Jaccard similarity: the exact ground truth and the shared estimator trait.

use std::collections::HashSet;

use crate::SketchError;

/// Returns the exact Jaccard similarity `|A ∩ B| / |A ∪ B|` of two explicit
/// sets. Two empty sets count as identical.
///
/// Exposed for test assertions and accuracy experiments; sketches exist so
/// that production code never has to call this.
pub fn jaccard(left: &HashSet<u32>, right: &HashSet<u32>) -> f64 {
    let intersection = left.intersection(right).count();
    let union = left.len() + right.len() - intersection;
    if union == 0 {
        return 1.0;
    }
    intersection as f64 / union as f64
}

/// Common API for types that can estimate Jaccard similarity against their
/// own kind.
///
/// The returned value is in `[0, 1]`:
/// - `0.0` means disjoint sets,
/// - `1.0` means identical sets.
///
/// # Example
/// ```rust
/// use dynsketch::buffered_minhash::BufferedMinHash;
/// use dynsketch::hash::tabulation_family;
/// use dynsketch::jaccard::JaccardIndex;
///
/// fn compare<S: JaccardIndex>(left: &S, right: &S) -> f64 {
///     left.jaccard_index(right).unwrap()
/// }
///
/// let family = tabulation_family(16).unwrap();
/// let mut left = BufferedMinHash::with_hashes(16, 2, family.clone()).unwrap();
/// let mut right = BufferedMinHash::with_hashes(16, 2, family).unwrap();
/// for value in 0_u32..100 {
///     left.insert(value);
///     right.insert(value);
/// }
///
/// assert_eq!(compare(&left, &right), 1.0);
/// ```
pub trait JaccardIndex {
    /// Returns the estimated Jaccard index `|A ∩ B| / |A ∪ B|`.
    ///
    /// # Errors
    /// Implementations return [`SketchError::IncompatibleSketches`] when two
    /// sketches are not compatible for comparison.
    fn jaccard_index(&self, other: &Self) -> Result<f64, SketchError>;
}
