//! Key equality.

/// Decides whether a stored key and a query key are the same key.
///
/// Both lengths are carried by the slices. A comparer only has to be
/// consistent with the hashers in use: keys it considers equal must hash
/// to the same value.
pub trait KeyComparer {
    fn keys_equal(&self, stored: &[u8], query: &[u8]) -> bool;
}

impl<F> KeyComparer for F
where
    F: Fn(&[u8], &[u8]) -> bool,
{
    #[inline]
    fn keys_equal(&self, stored: &[u8], query: &[u8]) -> bool {
        self(stored, query)
    }
}

/// Equal length and equal bytes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BytesComparer;

impl KeyComparer for BytesComparer {
    #[inline]
    fn keys_equal(&self, stored: &[u8], query: &[u8]) -> bool {
        stored == query
    }
}
