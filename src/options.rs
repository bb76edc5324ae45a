//! Table configuration.

use crate::comparer::{BytesComparer, KeyComparer};
use crate::hashers::{FnvHash, KeyHasher, KnuthHash};
use crate::probe::ProbeStrategy;
use thiserror::Error;

/// Initial number of slots for a default table.
pub const DEFAULT_SIZE: usize = 1 << 10;

/// Occupancy ratio above which an insert first grows the table.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.65;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("table size must be non-zero")]
    ZeroSize,
    #[error("table size must be a power of two, got {0}")]
    SizeNotPowerOfTwo(usize),
    #[error("load factor must be in (0, 1], got {0}")]
    InvalidLoadFactor(f64),
}

/// Builder for `OpenAddressingTable::with_options`.
///
/// Defaults: Knuth primary hash, byte-wise comparer, linear probing,
/// 1024 slots, load factor 0.65. With `ProbeStrategy::DoubleHash` and no
/// `double_hasher`, FNV-1 supplies the stride.
#[derive(Clone, Debug)]
pub struct HashOptions<H = KnuthHash, D = FnvHash, C = BytesComparer> {
    pub(crate) hasher: H,
    pub(crate) double_hasher: Option<D>,
    pub(crate) comparer: C,
    pub(crate) strategy: ProbeStrategy,
    pub(crate) size: usize,
    pub(crate) load_factor: f64,
}

impl HashOptions {
    pub fn new() -> Self {
        Self {
            hasher: KnuthHash,
            double_hasher: None,
            comparer: BytesComparer,
            strategy: ProbeStrategy::Linear,
            size: DEFAULT_SIZE,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl Default for HashOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, D, C> HashOptions<H, D, C> {
    pub fn hasher<H2: KeyHasher>(self, hasher: H2) -> HashOptions<H2, D, C> {
        HashOptions {
            hasher,
            double_hasher: self.double_hasher,
            comparer: self.comparer,
            strategy: self.strategy,
            size: self.size,
            load_factor: self.load_factor,
        }
    }

    /// Secondary hash for `ProbeStrategy::DoubleHash`. Ignored by the other
    /// strategies.
    pub fn double_hasher<D2: KeyHasher>(self, double_hasher: D2) -> HashOptions<H, D2, C> {
        HashOptions {
            hasher: self.hasher,
            double_hasher: Some(double_hasher),
            comparer: self.comparer,
            strategy: self.strategy,
            size: self.size,
            load_factor: self.load_factor,
        }
    }

    pub fn comparer<C2: KeyComparer>(self, comparer: C2) -> HashOptions<H, D, C2> {
        HashOptions {
            hasher: self.hasher,
            double_hasher: self.double_hasher,
            comparer,
            strategy: self.strategy,
            size: self.size,
            load_factor: self.load_factor,
        }
    }

    pub fn strategy(mut self, strategy: ProbeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Initial slot count. Must be a non-zero power of two.
    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Growth threshold in `(0, 1]`.
    pub fn load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ZeroSize);
        }
        if !self.size.is_power_of_two() {
            return Err(ConfigError::SizeNotPowerOfTwo(self.size));
        }
        // NaN fails both comparisons.
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(ConfigError::InvalidLoadFactor(self.load_factor));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashers::HashContext;

    #[test]
    fn defaults_are_valid() {
        let o = HashOptions::new();
        assert_eq!(o.size, 1024);
        assert_eq!(o.strategy, ProbeStrategy::Linear);
        assert_eq!(o.load_factor, 0.65);
        assert!(o.double_hasher.is_none());
        assert_eq!(o.validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_sizes() {
        assert_eq!(HashOptions::new().size(0).validate(), Err(ConfigError::ZeroSize));
        assert_eq!(
            HashOptions::new().size(3).validate(),
            Err(ConfigError::SizeNotPowerOfTwo(3))
        );
        assert_eq!(
            HashOptions::new().size(1000).validate(),
            Err(ConfigError::SizeNotPowerOfTwo(1000))
        );
        assert_eq!(HashOptions::new().size(1).validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_load_factors() {
        for lf in [0.0, -0.5, 1.01, f64::INFINITY] {
            assert_eq!(
                HashOptions::new().load_factor(lf).validate(),
                Err(ConfigError::InvalidLoadFactor(lf))
            );
        }
        assert!(matches!(
            HashOptions::new().load_factor(f64::NAN).validate(),
            Err(ConfigError::InvalidLoadFactor(_))
        ));
        assert_eq!(HashOptions::new().load_factor(1.0).validate(), Ok(()));
    }

    #[test]
    fn builder_swaps_components_and_keeps_settings() {
        let o = HashOptions::new()
            .size(8)
            .strategy(ProbeStrategy::DoubleHash)
            .load_factor(0.5)
            .hasher(|_: &HashContext, _: &[u8]| 0usize)
            .double_hasher(KnuthHash)
            .comparer(|a: &[u8], b: &[u8]| a == b);
        assert_eq!(o.size, 8);
        assert_eq!(o.strategy, ProbeStrategy::DoubleHash);
        assert_eq!(o.load_factor, 0.5);
        assert_eq!(o.double_hasher, Some(KnuthHash));
        assert_eq!(o.validate(), Ok(()));
    }
}
