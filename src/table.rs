//! OpenAddressingTable: byte-keyed open addressing over a flat slot array.
//!
//! The slot array only holds ids into a `SlotMap` arena that owns each
//! key copy and value. Probing, tombstones and rehashing touch the slot
//! array; values never move, so a `Handle` stays valid across rehashes
//! until its entry is deleted.

use crate::comparer::{BytesComparer, KeyComparer};
use crate::guard::OpGuard;
use crate::hashers::{FnvHash, HashContext, KeyHasher, KnuthHash, Secondary};
use crate::options::{ConfigError, HashOptions};
use crate::probe::{ProbeSeq, ProbeStrategy};
use rand::Rng;
use slotmap::{DefaultKey, SlotMap};
use std::fmt;
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }

    pub fn key<'a, V, H, D, C>(&self, table: &'a OpenAddressingTable<V, H, D, C>) -> Option<&'a [u8]> {
        table.handle_key(*self)
    }

    pub fn value<'a, V, H, D, C>(&self, table: &'a OpenAddressingTable<V, H, D, C>) -> Option<&'a V> {
        table.handle_value(*self)
    }

    pub fn value_mut<'a, V, H, D, C>(
        &self,
        table: &'a mut OpenAddressingTable<V, H, D, C>,
    ) -> Option<&'a mut V> {
        table.handle_value_mut(*self)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InsertError {
    #[error("key already present")]
    DuplicateKey,
    #[error("no free slot after probing all {size} slots")]
    ProbeExhausted { size: usize },
    #[error("cannot grow table beyond {size} slots")]
    CapacityOverflow { size: usize },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Slot {
    Empty,
    Tombstone,
    Occupied(DefaultKey),
}

#[derive(Debug)]
struct Entry<V> {
    key: Box<[u8]>,
    value: V,
}

pub struct OpenAddressingTable<V, H = KnuthHash, D = FnvHash, C = BytesComparer> {
    probing: Probing<H, D, C>,
    store: Store<V>,
    guard: OpGuard,
}

/// Everything needed to turn a key into a probe sequence and to test a
/// slot against it.
struct Probing<H, D, C> {
    hasher: H,
    double_hasher: Option<Secondary<D>>, // Some iff strategy == DoubleHash
    comparer: C,
    strategy: ProbeStrategy,
    shift: u32,
}

impl<H: KeyHasher, D: KeyHasher, C> Probing<H, D, C> {
    fn sequence(&self, size: usize, key: &[u8]) -> ProbeSeq {
        let ctx = HashContext::new(size, self.shift);
        let home = self.hasher.hash_key(&ctx, key);
        // Computed once per operation; ProbeSeq forces it odd.
        let stride = match &self.double_hasher {
            Some(d) => d.hash_key(&ctx, key),
            None => 1,
        };
        ProbeSeq::new(self.strategy, home, stride, size)
    }
}

/// Slot array plus the arena owning keys and values.
struct Store<V> {
    slots: Vec<Slot>,
    entries: SlotMap<DefaultKey, Entry<V>>,
    tombstones: usize,
    load_factor: f64,
}

impl<V> Store<V> {
    fn with_size(size: usize, load_factor: f64) -> Self {
        Self {
            slots: vec![Slot::Empty; size],
            entries: SlotMap::with_key(),
            tombstones: 0,
            load_factor,
        }
    }

    /// Slot position and arena id of the entry matching `key`.
    fn find<H, D, C>(&self, p: &Probing<H, D, C>, key: &[u8]) -> Option<(usize, DefaultKey)>
    where
        H: KeyHasher,
        D: KeyHasher,
        C: KeyComparer,
    {
        for pos in p.sequence(self.slots.len(), key) {
            match self.slots[pos] {
                Slot::Empty => return None,
                Slot::Tombstone => continue,
                Slot::Occupied(k) => {
                    let hit = self
                        .entries
                        .get(k)
                        .map(|e| p.comparer.keys_equal(&e.key, key))
                        .unwrap_or(false);
                    if hit {
                        return Some((pos, k));
                    }
                }
            }
        }
        None
    }

    /// First empty or tombstoned slot on `key`'s probe sequence.
    fn vacant<H, D, C>(&self, p: &Probing<H, D, C>, key: &[u8]) -> Result<usize, InsertError>
    where
        H: KeyHasher,
        D: KeyHasher,
    {
        let size = self.slots.len();
        p.sequence(size, key)
            .find(|&pos| !matches!(self.slots[pos], Slot::Occupied(_)))
            .ok_or_else(|| {
                tracing::warn!(size, "probe sequence exhausted without a free slot");
                InsertError::ProbeExhausted { size }
            })
    }

    fn fits(&self, count: usize, size: usize) -> bool {
        count as f64 / size as f64 <= self.load_factor
    }

    /// Make room for one more entry.
    ///
    /// Tombstones count against the load factor, so misses keep finding an
    /// `Empty` slot under delete/insert churn. When the total is over, the
    /// table is rebuilt at the same size if live entries fill at most half
    /// the budget, and doubled until they fit otherwise.
    fn reserve_one<H, D, C>(&mut self, p: &Probing<H, D, C>) -> Result<(), InsertError>
    where
        H: KeyHasher,
        D: KeyHasher,
    {
        let size = self.slots.len();
        let needed = self.entries.len() + 1;
        if self.fits(needed + self.tombstones, size) {
            return Ok(());
        }
        let mut target = size;
        if !self.fits(needed.saturating_mul(2), size) {
            target = double(target)?;
            while !self.fits(needed, target) {
                target = double(target)?;
            }
        }
        self.rehash(p, target)
    }

    /// Re-place every live entry into `new_size` slots, rehashing the
    /// stored key bytes at the new size. Tombstones are dropped.
    fn rehash<H, D, C>(
        &mut self,
        p: &Probing<H, D, C>,
        new_size: usize,
    ) -> Result<(), InsertError>
    where
        H: KeyHasher,
        D: KeyHasher,
    {
        let old_size = self.slots.len();
        tracing::debug!(
            from = old_size,
            to = new_size,
            live = self.entries.len(),
            tombstones = self.tombstones,
            "rehashing table"
        );
        let old = std::mem::replace(&mut self.slots, vec![Slot::Empty; new_size]);
        self.tombstones = 0;
        for slot in old {
            let Slot::Occupied(k) = slot else { continue };
            let pos = match self.entries.get(k) {
                Some(e) => self.vacant(p, &e.key)?,
                None => continue,
            };
            self.slots[pos] = Slot::Occupied(k);
        }
        Ok(())
    }

    /// Place a key known to be absent.
    fn insert_new<H, D, C>(&mut self, p: &Probing<H, D, C>, key: &[u8], value: V) -> Result<Handle, InsertError>
    where
        H: KeyHasher,
        D: KeyHasher,
    {
        self.reserve_one(p)?;
        let pos = self.vacant(p, key)?;
        if self.slots[pos] == Slot::Tombstone {
            self.tombstones -= 1;
        }
        let k = self.entries.insert(Entry {
            key: key.into(),
            value,
        });
        self.slots[pos] = Slot::Occupied(k);
        Ok(Handle::new(k))
    }

    fn bury(&mut self, pos: usize, k: DefaultKey) -> Option<Entry<V>> {
        self.slots[pos] = Slot::Tombstone;
        self.tombstones += 1;
        self.entries.remove(k)
    }
}

fn double(size: usize) -> Result<usize, InsertError> {
    size.checked_mul(2).ok_or(InsertError::CapacityOverflow { size })
}

fn random_shift<R: Rng>(rng: &mut R) -> u32 {
    rng.random_range(0..32)
}

impl<V> OpenAddressingTable<V> {
    /// Default table: Knuth hash, byte-wise keys, linear probing, 1024 slots.
    pub fn new() -> Self {
        Self::build(HashOptions::new(), random_shift(&mut rand::rng()))
    }
}

impl<V> Default for OpenAddressingTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over entries in `OpenAddressingTable`, in no particular order.
pub struct Iter<'a, V> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Handle, &'a [u8], &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(k, e)| (Handle::new(k), &*e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over entries with mutable values.
pub struct IterMut<'a, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Entry<V>>,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (Handle, &'a [u8], &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(k, e)| (Handle::new(k), &*e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

// Accessors that never call user code.
impl<V, H, D, C> OpenAddressingTable<V, H, D, C> {
    /// Current number of slots. Always a power of two.
    pub fn size(&self) -> usize {
        self.store.slots.len()
    }

    /// Number of occupied slots.
    pub fn used(&self) -> usize {
        self.store.entries.len()
    }

    pub fn len(&self) -> usize {
        self.store.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.store.entries.is_empty()
    }

    /// Slots emptied by deletion since the last rehash.
    pub fn tombstones(&self) -> usize {
        self.store.tombstones
    }

    pub fn strategy(&self) -> ProbeStrategy {
        self.probing.strategy
    }

    pub fn shift(&self) -> u32 {
        self.probing.shift
    }

    /// Configured growth threshold.
    pub fn max_load_factor(&self) -> f64 {
        self.store.load_factor
    }

    /// Current `used / size`.
    pub fn load(&self) -> f64 {
        self.used() as f64 / self.size() as f64
    }

    pub fn hash_context(&self) -> HashContext {
        HashContext::new(self.size(), self.probing.shift)
    }

    pub(crate) fn handle_key(&self, h: Handle) -> Option<&[u8]> {
        let _g = self.guard.enter("handle_key");
        self.store.entries.get(h.raw_handle()).map(|e| &*e.key)
    }

    pub(crate) fn handle_value(&self, h: Handle) -> Option<&V> {
        let _g = self.guard.enter("handle_value");
        self.store.entries.get(h.raw_handle()).map(|e| &e.value)
    }

    pub(crate) fn handle_value_mut(&mut self, h: Handle) -> Option<&mut V> {
        let _g = self.guard.enter("handle_value_mut");
        self.store
            .entries
            .get_mut(h.raw_handle())
            .map(|e| &mut e.value)
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            it: self.store.entries.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            it: self.store.entries.iter_mut(),
        }
    }
}

impl<V, H, D, C> OpenAddressingTable<V, H, D, C>
where
    H: KeyHasher,
    D: KeyHasher,
    C: KeyComparer,
{
    /// Build a table from explicit options, drawing the hash shift from
    /// the thread-local RNG.
    pub fn with_options(options: HashOptions<H, D, C>) -> Result<Self, ConfigError> {
        Self::with_options_and_rng(options, &mut rand::rng())
    }

    /// Like `with_options`, with the shift drawn from `rng`. A seeded RNG
    /// makes slot placement reproducible.
    pub fn with_options_and_rng<R: Rng>(
        options: HashOptions<H, D, C>,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self::build(options, random_shift(rng)))
    }

    // `options` must already be valid.
    fn build(options: HashOptions<H, D, C>, shift: u32) -> Self {
        let double_hasher = match options.strategy {
            ProbeStrategy::DoubleHash => Some(match options.double_hasher {
                Some(d) => Secondary::Custom(d),
                None => Secondary::Fnv(FnvHash),
            }),
            ProbeStrategy::Linear | ProbeStrategy::Quadratic => None,
        };
        tracing::debug!(
            size = options.size,
            shift,
            strategy = ?options.strategy,
            load_factor = options.load_factor,
            "open addressing table initialized"
        );
        Self {
            probing: Probing {
                hasher: options.hasher,
                double_hasher,
                comparer: options.comparer,
                strategy: options.strategy,
                shift,
            },
            store: Store::with_size(options.size, options.load_factor),
            guard: OpGuard::new(),
        }
    }

    /// Slot indices probed for `key` at the current size.
    pub fn probe_sequence<K: AsRef<[u8]>>(&self, key: K) -> ProbeSeq {
        let _g = self.guard.enter("probe_sequence");
        self.probing.sequence(self.size(), key.as_ref())
    }

    /// Insert `key -> value`. An equal key already present keeps its slot
    /// and gets the new value; the previous value is returned.
    pub fn insert<K: AsRef<[u8]>>(&mut self, key: K, value: V) -> Result<Option<V>, InsertError> {
        let _g = self.guard.enter("insert");
        let key = key.as_ref();
        if let Some((_, k)) = self.store.find(&self.probing, key) {
            if let Some(e) = self.store.entries.get_mut(k) {
                return Ok(Some(std::mem::replace(&mut e.value, value)));
            }
        }
        self.store
            .insert_new(&self.probing, key, value)
            .map(|_| None)
    }

    /// Insert a new key, rejecting keys already present.
    pub fn try_insert<K: AsRef<[u8]>>(&mut self, key: K, value: V) -> Result<Handle, InsertError> {
        let _g = self.guard.enter("try_insert");
        let key = key.as_ref();
        if self.store.find(&self.probing, key).is_some() {
            return Err(InsertError::DuplicateKey);
        }
        self.store.insert_new(&self.probing, key, value)
    }

    /// Like `try_insert`, running `default` only when the key is new.
    pub fn try_insert_with<K, F>(&mut self, key: K, default: F) -> Result<Handle, InsertError>
    where
        K: AsRef<[u8]>,
        F: FnOnce() -> V,
    {
        let _g = self.guard.enter("try_insert_with");
        let key = key.as_ref();
        if self.store.find(&self.probing, key).is_some() {
            return Err(InsertError::DuplicateKey);
        }
        self.store.insert_new(&self.probing, key, default())
    }

    pub fn lookup<K: AsRef<[u8]>>(&self, key: K) -> Option<&V> {
        let _g = self.guard.enter("lookup");
        let (_, k) = self.store.find(&self.probing, key.as_ref())?;
        self.store.entries.get(k).map(|e| &e.value)
    }

    pub fn lookup_mut<K: AsRef<[u8]>>(&mut self, key: K) -> Option<&mut V> {
        let _g = self.guard.enter("lookup_mut");
        let (_, k) = self.store.find(&self.probing, key.as_ref())?;
        self.store.entries.get_mut(k).map(|e| &mut e.value)
    }

    pub fn find<K: AsRef<[u8]>>(&self, key: K) -> Option<Handle> {
        let _g = self.guard.enter("find");
        self.store
            .find(&self.probing, key.as_ref())
            .map(|(_, k)| Handle::new(k))
    }

    pub fn contains_key<K: AsRef<[u8]>>(&self, key: K) -> bool {
        let _g = self.guard.enter("contains_key");
        self.store.find(&self.probing, key.as_ref()).is_some()
    }

    /// Delete `key`, returning its value. Absent keys are a no-op.
    ///
    /// The slot becomes a tombstone that later probes skip over; it is
    /// reused by inserts and dropped by the next rehash.
    pub fn delete<K: AsRef<[u8]>>(&mut self, key: K) -> Option<V> {
        let _g = self.guard.enter("delete");
        let key = key.as_ref();
        let Some((pos, k)) = self.store.find(&self.probing, key) else {
            tracing::trace!(key_len = key.len(), "delete of absent key");
            return None;
        };
        self.store.bury(pos, k).map(|e| e.value)
    }

    /// Delete the entry behind `handle`, returning its key and value.
    pub fn remove(&mut self, handle: Handle) -> Option<(Box<[u8]>, V)> {
        let _g = self.guard.enter("remove");
        let k = handle.raw_handle();
        let slots = &self.store.slots;
        let key = &self.store.entries.get(k)?.key;
        let pos = self
            .probing
            .sequence(slots.len(), key)
            .take_while(|&pos| slots[pos] != Slot::Empty)
            .find(|&pos| slots[pos] == Slot::Occupied(k))?;

        self.store.bury(pos, k).map(|e| (e.key, e.value))
    }
}

impl<V, H, D, C> fmt::Debug for OpenAddressingTable<V, H, D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAddressingTable")
            .field("strategy", &self.probing.strategy)
            .field("size", &self.store.slots.len())
            .field("used", &self.store.entries.len())
            .field("tombstones", &self.store.tombstones)
            .field("shift", &self.probing.shift)
            .field("load_factor", &self.store.load_factor)
            .finish()
    }
}
