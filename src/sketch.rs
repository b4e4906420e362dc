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
//! A tagged variant over the two sketch kinds.
//!
//! Callers that stream updates without caring which estimator backs them can
//! hold a [`DynamicSketch`]; everyone else should use the concrete types,
//! whose similarity APIs carry kind-specific tuning.

use crate::buffered_minhash::BufferedMinHash;
use crate::counting_minhash::CountingMinHash;

/// Either sketch kind behind the shared insert/remove/signature surface.
///
/// # Example
/// ```rust
/// use dynsketch::buffered_minhash::BufferedMinHash;
/// use dynsketch::sketch::DynamicSketch;
///
/// let mut sketch = DynamicSketch::from(BufferedMinHash::new(8, 2).unwrap());
/// sketch.insert(42);
/// assert!(!sketch.remove(7));
/// assert_eq!(sketch.signature().len(), 8);
/// ```
#[derive(Debug, Clone)]
pub enum DynamicSketch {
    /// Buffered bottom-l MinHash; deletions may fault.
    Buffered(BufferedMinHash),
    /// Counting-array MinHash; deletions never fault.
    Counting(CountingMinHash),
}

impl DynamicSketch {
    /// Adds one element.
    pub fn insert(&mut self, x: u32) {
        match self {
            Self::Buffered(sketch) => sketch.insert(x),
            Self::Counting(sketch) => sketch.insert(x),
        }
    }

    /// Removes one element; `true` signals a fault that needs a replay.
    pub fn remove(&mut self, x: u32) -> bool {
        match self {
            Self::Buffered(sketch) => sketch.remove(x),
            Self::Counting(sketch) => sketch.remove(x),
        }
    }

    /// Returns the current signature with each kind's default tuning.
    pub fn signature(&mut self) -> &[u32] {
        match self {
            Self::Buffered(sketch) => sketch.signature(),
            Self::Counting(sketch) => sketch.signature(),
        }
    }
}

impl From<BufferedMinHash> for DynamicSketch {
    fn from(sketch: BufferedMinHash) -> Self {
        Self::Buffered(sketch)
    }
}

impl From<CountingMinHash> for DynamicSketch {
    fn from(sketch: CountingMinHash) -> Self {
        Self::Counting(sketch)
    }
}

#[cfg(test)]
mod tests {
    use super::DynamicSketch;
    use crate::buffered_minhash::BufferedMinHash;
    use crate::counting_minhash::CountingMinHash;

    #[test]
    fn both_kinds_share_the_update_surface() {
        let mut sketches = [
            DynamicSketch::from(BufferedMinHash::new(4, 2).unwrap()),
            DynamicSketch::from(CountingMinHash::new(32, 4).unwrap()),
        ];

        for sketch in &mut sketches {
            for value in 0_u32..100 {
                sketch.insert(value);
            }
            assert_eq!(sketch.signature().len(), 4);
        }
    }

    #[test]
    fn only_the_buffered_kind_faults() {
        let mut buffered = DynamicSketch::from(BufferedMinHash::new(1, 1).unwrap());
        buffered.insert(9);
        assert!(buffered.remove(9));

        let mut counting = DynamicSketch::from(CountingMinHash::new(16, 4).unwrap());
        counting.insert(9);
        assert!(!counting.remove(9));
    }
}
