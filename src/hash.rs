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
//! Hash functions over the 32-bit integer universe.
//!
//! Sketches that estimate pairwise similarity must be built over the *same*
//! hash functions, so functions are first-class values here: a [`HashFamily`]
//! is a reference-counted, read-only slice of [`HashFn`] instances that any
//! number of sketches can share. Every randomized constructor has a
//! `from_rng` form for reproducible construction from a seeded generator.

use std::sync::Arc;

use rand::Rng;

use crate::SketchError;

/// Largest prime below 2^64, the modulus of the pairwise family.
pub const PAIRWISE_PRIME: u64 = 18_446_744_073_709_550_671;

/// A shared, immutable collection of hash functions.
///
/// Cloning a family is cheap and preserves identity: two sketches built from
/// clones of the same family are comparable.
pub type HashFamily = Arc<[HashFn]>;

/// Simple tabulation hashing on 4-bit nibbles.
///
/// Eight tables of sixteen random entries cover all 32 input bits; a hash is
/// the XOR of one lookup per nibble. The scheme is 3-independent. Table
/// entries span the full 32-bit range; callers with a smaller universe reduce
/// the output externally.
///
/// # Example
/// ```rust
/// use dynsketch::hash::TabulationHash;
///
/// let hash = TabulationHash::random();
/// let value = hash.hash(42);
/// assert_eq!(hash.hash(42), value);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabulationHash {
    tables: [[u32; 16]; 8],
}

impl TabulationHash {
    /// Draws the lookup tables from the thread RNG.
    pub fn random() -> Self {
        Self::from_rng(&mut rand::rng())
    }

    /// Draws the lookup tables from the supplied generator.
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut tables = [[0_u32; 16]; 8];
        for table in &mut tables {
            for entry in table.iter_mut() {
                *entry = rng.random();
            }
        }
        Self { tables }
    }

    /// Hashes one value.
    #[inline]
    pub fn hash(&self, x: u32) -> u32 {
        let mut result = 0;
        for (nibble, table) in self.tables.iter().enumerate() {
            result ^= table[((x >> (4 * nibble)) & 0xF) as usize];
        }
        result
    }
}

/// Pairwise-independent hashing into `[0, n)`.
///
/// Computes `((a * x + b) mod M) mod n` with `M` prime and `a != 0`; `a` and
/// `b` are drawn uniformly from `[0, n)` at construction. The arithmetic stays
/// in `u64` and cannot overflow for 32-bit inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairwiseHash {
    a: u64,
    b: u64,
    n: u64,
}

impl PairwiseHash {
    /// Draws the coefficients from the thread RNG.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidParameter`] when `n == 0`.
    pub fn random(n: u32) -> Result<Self, SketchError> {
        Self::from_rng(n, &mut rand::rng())
    }

    /// Draws the coefficients from the supplied generator.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidParameter`] when `n == 0`.
    pub fn from_rng<R: Rng + ?Sized>(n: u32, rng: &mut R) -> Result<Self, SketchError> {
        if n == 0 {
            return Err(SketchError::InvalidParameter(
                "bucket count must be greater than zero",
            ));
        }

        let mut a = rng.random_range(0..u64::from(n));
        if a == 0 {
            a = 1;
        }
        let b = rng.random_range(0..u64::from(n));
        Ok(Self { a, b, n: u64::from(n) })
    }

    /// Returns the bucket count `n`.
    pub fn buckets(&self) -> u32 {
        self.n as u32
    }

    /// Hashes one value into `[0, n)`.
    #[inline]
    pub fn hash(&self, x: u32) -> u32 {
        ((self.a * u64::from(x) + self.b) % PAIRWISE_PRIME % self.n) as u32
    }
}

/// One hash function from the family.
///
/// The identity variant exists for tests that need to steer hash values
/// exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashFn {
    /// Simple tabulation hashing, full 32-bit range.
    Tabulation(TabulationHash),
    /// Pairwise-independent hashing into a bucket range.
    Pairwise(PairwiseHash),
    /// `h(x) = x`.
    Identity,
}

impl HashFn {
    /// Hashes one value.
    #[inline]
    pub fn hash(&self, x: u32) -> u32 {
        match self {
            Self::Tabulation(tabulation) => tabulation.hash(x),
            Self::Pairwise(pairwise) => pairwise.hash(x),
            Self::Identity => x,
        }
    }
}

/// Builds a family of `count` tabulation hashes from the thread RNG.
///
/// # Errors
/// Returns [`SketchError::InvalidParameter`] when `count == 0`.
pub fn tabulation_family(count: usize) -> Result<HashFamily, SketchError> {
    tabulation_family_from_rng(count, &mut rand::rng())
}

/// Builds a family of `count` tabulation hashes from the supplied generator.
///
/// # Errors
/// Returns [`SketchError::InvalidParameter`] when `count == 0`.
pub fn tabulation_family_from_rng<R: Rng + ?Sized>(
    count: usize,
    rng: &mut R,
) -> Result<HashFamily, SketchError> {
    if count == 0 {
        return Err(SketchError::InvalidParameter(
            "family must contain at least one hash function",
        ));
    }

    Ok((0..count)
        .map(|_| HashFn::Tabulation(TabulationHash::from_rng(rng)))
        .collect())
}

/// Builds a family of `count` pairwise hashes into `[0, n)` from the thread RNG.
///
/// # Errors
/// Returns [`SketchError::InvalidParameter`] when `count == 0` or `n == 0`.
pub fn pairwise_family(count: usize, n: u32) -> Result<HashFamily, SketchError> {
    pairwise_family_from_rng(count, n, &mut rand::rng())
}

/// Builds a family of `count` pairwise hashes into `[0, n)` from the supplied
/// generator.
///
/// # Errors
/// Returns [`SketchError::InvalidParameter`] when `count == 0` or `n == 0`.
pub fn pairwise_family_from_rng<R: Rng + ?Sized>(
    count: usize,
    n: u32,
    rng: &mut R,
) -> Result<HashFamily, SketchError> {
    if count == 0 {
        return Err(SketchError::InvalidParameter(
            "family must contain at least one hash function",
        ));
    }

    let mut family = Vec::with_capacity(count);
    for _ in 0..count {
        family.push(HashFn::Pairwise(PairwiseHash::from_rng(n, rng)?));
    }
    Ok(family.into())
}

/// Returns `true` when two families are interchangeable for comparison:
/// either the same allocation or structurally equal functions.
pub(crate) fn same_family(left: &HashFamily, right: &HashFamily) -> bool {
    Arc::ptr_eq(left, right) || left == right
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{
        HashFn, PairwiseHash, TabulationHash, pairwise_family, pairwise_family_from_rng,
        same_family, tabulation_family, tabulation_family_from_rng,
    };

    #[test]
    fn tabulation_is_deterministic_once_constructed() {
        let hash = TabulationHash::random();
        for x in [0_u32, 1, 0xFFFF_FFFF, 0xDEAD_BEEF] {
            assert_eq!(hash.hash(x), hash.hash(x));
        }
    }

    #[test]
    fn tabulation_reads_every_nibble() {
        let mut rng = StdRng::seed_from_u64(7);
        let hash = TabulationHash::from_rng(&mut rng);

        // Flipping a high nibble must be able to change the output; with
        // random tables a collision across all eight probes is negligible.
        let mut changed = 0;
        for nibble in 0..8 {
            if hash.hash(0) != hash.hash(1 << (4 * nibble)) {
                changed += 1;
            }
        }
        assert!(changed >= 7, "changed={changed}");
    }

    #[test]
    fn pairwise_stays_in_bucket_range() {
        let hash = PairwiseHash::random(1_000).unwrap();
        for x in [0_u32, 1, 999, 1_000, u32::MAX] {
            assert!(hash.hash(x) < 1_000);
        }
    }

    #[test]
    fn pairwise_rejects_zero_buckets() {
        assert!(PairwiseHash::random(0).is_err());
    }

    #[test]
    fn identity_returns_its_input() {
        assert_eq!(HashFn::Identity.hash(0), 0);
        assert_eq!(HashFn::Identity.hash(12_345), 12_345);
        assert_eq!(HashFn::Identity.hash(u32::MAX), u32::MAX);
    }

    #[test]
    fn family_builders_reject_empty_families() {
        assert!(tabulation_family(0).is_err());
        assert!(pairwise_family(0, 128).is_err());
        assert!(pairwise_family(4, 0).is_err());
    }

    #[test]
    fn seeded_families_are_reproducible() {
        let mut first = StdRng::seed_from_u64(99);
        let mut second = StdRng::seed_from_u64(99);

        let left = tabulation_family_from_rng(8, &mut first).unwrap();
        let right = tabulation_family_from_rng(8, &mut second).unwrap();
        assert_eq!(left, right);

        let mut first = StdRng::seed_from_u64(99);
        let mut second = StdRng::seed_from_u64(99);
        let left = pairwise_family_from_rng(8, 256, &mut first).unwrap();
        let right = pairwise_family_from_rng(8, 256, &mut second).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn family_identity_accepts_clones_and_equal_contents() {
        let family = tabulation_family(4).unwrap();
        let clone = family.clone();
        assert!(same_family(&family, &clone));

        let mut first = StdRng::seed_from_u64(3);
        let mut second = StdRng::seed_from_u64(3);
        let left = tabulation_family_from_rng(4, &mut first).unwrap();
        let right = tabulation_family_from_rng(4, &mut second).unwrap();
        assert!(same_family(&left, &right));

        let other = tabulation_family(4).unwrap();
        assert!(!same_family(&family, &other));
    }
}
