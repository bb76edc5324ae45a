//! Key hashers: the primary Knuth multiplicative hash and the FNV-1 hash
//! used as the default double-hashing stride.
//!
//! Hashers see the table through a `HashContext` so they can depend on
//! the current size and on the per-table shift parameter.

/// 32-bit golden-ratio constant used by the multiplicative hash.
const KNUTH_MULTIPLIER: u64 = 2_654_435_769;

const FNV_OFFSET_BASIS: u64 = 14_695_981_039_346_656_037;
const FNV_PRIME: u64 = 1_099_511_628_211;

/// Table state visible to a hasher.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HashContext {
    size: usize,
    shift: u32,
}

impl HashContext {
    // Tables only build contexts from validated sizes and drawn shifts.
    pub(crate) fn new(size: usize, shift: u32) -> Self {
        debug_assert!(size > 0, "hash context with zero size");
        debug_assert!(shift < 32, "shift parameter out of range");
        Self { size, shift }
    }

    /// Context for exercising a hasher outside a table. `None` unless
    /// `size` is non-zero and `shift` is below 32.
    pub fn try_new(size: usize, shift: u32) -> Option<Self> {
        (size > 0 && shift < 32).then_some(Self { size, shift })
    }

    /// Number of slots in the table.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Per-table random shift parameter `p` in `[0, 32)`.
    pub fn shift(&self) -> u32 {
        self.shift
    }
}

/// Maps a key to a slot index.
///
/// Results are expected in `0..ctx.size()`; larger values are reduced by
/// the probe sequence. Implementations must be deterministic for a fixed
/// context and key.
pub trait KeyHasher {
    fn hash_key(&self, ctx: &HashContext, key: &[u8]) -> usize;
}

impl<F> KeyHasher for F
where
    F: Fn(&HashContext, &[u8]) -> usize,
{
    #[inline]
    fn hash_key(&self, ctx: &HashContext, key: &[u8]) -> usize {
        self(ctx, key)
    }
}

/// Multiplicative hash (Cormen et al. 11.3.2, Knuth vol. 3 §6.4).
///
/// The key is folded into an integer with a position-sensitive product,
/// multiplied by the golden-ratio constant, and the surviving high bits
/// (selected by the context's shift) are reduced modulo the table size.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct KnuthHash;

impl KnuthHash {
    /// Order-dependent product of `byte[i] + i`, wrapping at 32 bits.
    pub fn fold(key: &[u8]) -> u32 {
        key.iter().enumerate().fold(1u32, |acc, (i, &b)| {
            acc.wrapping_mul(u32::from(b).wrapping_add(i as u32))
        })
    }

    /// The fold is a signed 32-bit value; widening sign-extends it, so
    /// folds with the top bit set fill the upper word with ones.
    pub fn widen(folded: u32) -> u64 {
        folded as i32 as i64 as u64
    }
}

impl KeyHasher for KnuthHash {
    #[inline]
    fn hash_key(&self, ctx: &HashContext, key: &[u8]) -> usize {
        let folded = Self::widen(Self::fold(key));
        let hash = folded.wrapping_mul(KNUTH_MULTIPLIER) >> (32 - ctx.shift());
        (hash % ctx.size() as u64) as usize
    }
}

/// FNV-1 (multiply, then xor) over the key bytes, reduced modulo the size.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FnvHash;

impl FnvHash {
    pub fn raw(key: &[u8]) -> u64 {
        key.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
            hash.wrapping_mul(FNV_PRIME) ^ u64::from(b)
        })
    }
}

impl KeyHasher for FnvHash {
    #[inline]
    fn hash_key(&self, ctx: &HashContext, key: &[u8]) -> usize {
        (Self::raw(key) % ctx.size() as u64) as usize
    }
}

/// Resolved secondary hasher: the caller's, or FNV-1 when none was given.
#[derive(Clone, Debug)]
pub(crate) enum Secondary<D> {
    Fnv(FnvHash),
    Custom(D),
}

impl<D: KeyHasher> KeyHasher for Secondary<D> {
    #[inline]
    fn hash_key(&self, ctx: &HashContext, key: &[u8]) -> usize {
        match self {
            Secondary::Fnv(h) => h.hash_key(ctx, key),
            Secondary::Custom(h) => h.hash_key(ctx, key),
        }
    }
}
