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
//! Dynamic similarity sketches for streaming sets with deletions.
//!
//! The crate estimates the Jaccard similarity of sets drawn from a 32-bit
//! integer universe without keeping the sets themselves, while the sets keep
//! changing: every sketch supports `insert` *and* `remove`.
//!
//! - [`buffered_minhash::BufferedMinHash`] keeps the bottom-l hash values per
//!   signature row and signals a *fault* when deletions exhaust a row.
//! - [`counting_minhash::CountingMinHash`] absorbs deletions natively in a
//!   logarithmic counting matrix and adapts its signature row to the set size.
//! - [`hash`] provides the tabulation and pairwise hash functions both
//!   sketches are built over, shareable across sketches.
//! - [`lsh`] turns a corpus of signatures into candidate pairs by banding.
//! - [`bitarray::BitArray`] generates the synthetic correlated sets the
//!   accuracy experiments measure against.
//! - [`jaccard`] holds the exact ground truth and the estimator trait.
//! - [`sketch::DynamicSketch`] is a tagged variant over the two sketch kinds.

use thiserror::Error;

pub mod bitarray;
pub mod buffered_minhash;
pub mod counting_minhash;
pub mod hash;
pub mod jaccard;
pub mod lsh;
pub mod sketch;

/// Errors returned by sketch constructors and comparison operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SketchError {
    /// Returned when a constructor receives an invalid argument.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    /// Returned when comparing two sketches that do not share a shape or a
    /// hash family.
    #[error("incompatible sketches: {0}")]
    IncompatibleSketches(&'static str),
}
