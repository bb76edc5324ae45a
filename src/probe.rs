//! Probe sequences for open addressing.
//!
//! A `ProbeSeq` yields exactly `size` slot indices for one key. All three
//! strategies visit every slot once when `size` is a power of two:
//! - Linear steps by 1.
//! - DoubleHash steps by an odd stride, which is coprime with `size`.
//! - Quadratic adds triangular numbers, `i(i+1)/2`, which form a
//!   permutation modulo any power of two.

/// Collision-resolution strategy.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ProbeStrategy {
    /// `(h + i) mod size`
    #[default]
    Linear,
    /// `(h + i(i+1)/2) mod size`
    Quadratic,
    /// `(h + i * s) mod size` with `s` a second, odd hash of the key.
    DoubleHash,
}

/// Iterator over the slot indices probed for one key.
#[derive(Clone, Debug)]
pub struct ProbeSeq {
    strategy: ProbeStrategy,
    mask: usize,
    pos: usize,
    stride: usize,
    attempt: usize,
    limit: usize,
}

impl ProbeSeq {
    /// `size` must be a power of two. `stride` only matters for
    /// `DoubleHash` and is forced odd here.
    pub(crate) fn new(strategy: ProbeStrategy, home: usize, stride: usize, size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        Self {
            strategy,
            mask: size - 1,
            pos: home,
            stride: stride | 1,
            attempt: 0,
            limit: size,
        }
    }

    /// Number of attempts made so far.
    pub fn attempts(&self) -> usize {
        self.attempt
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.attempt == self.limit {
            return None;
        }
        let idx = self.pos & self.mask;
        self.attempt += 1;
        let step = match self.strategy {
            ProbeStrategy::Linear => 1,
            ProbeStrategy::Quadratic => self.attempt,
            ProbeStrategy::DoubleHash => self.stride,
        };
        self.pos = self.pos.wrapping_add(step);
        Some(idx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.limit - self.attempt;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ProbeSeq {}
