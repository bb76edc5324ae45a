//! probe-table: an open-addressing hash table keyed by byte strings, with
//! pluggable hashers, key comparers and probing strategies.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a flat-array hash table whose every policy (primary hash,
//!   secondary hash, key equality, probe sequence, growth threshold) is
//!   chosen at construction and can be reasoned about on its own.
//! - Layers:
//!   - `hashers`/`comparer`: strategy traits plus the default Knuth
//!     multiplicative hash, FNV-1 stride hash and byte-wise comparer.
//!     Closures implement both traits.
//!   - `probe`: `ProbeSeq`, one iterator shared by every operation.
//!   - `OpenAddressingTable<V, H, D, C>`: slot array of
//!     `Empty | Tombstone | Occupied(id)` over a `SlotMap` arena owning the
//!     key copies and values. Returns stable `Handle`s.
//!
//! Constraints
//! - Single-threaded: the table is `Send` (when its parts are) but not
//!   `Sync`; share it behind one lock per table.
//! - `size` is always a power of two, so probe arithmetic is a mask and an
//!   odd double-hash stride reaches every slot.
//! - At most one slot holds a given key. `insert` replaces the value of an
//!   equal key; `try_insert` rejects it.
//! - Every operation is bounded by `size` probes.
//!
//! Growth
//! - Before placing a new key, the table rehashes when
//!   `(used + tombstones + 1) / size` would exceed the load factor
//!   (default 0.65). It keeps its size when live entries fill at most half
//!   of that budget and doubles until they fit otherwise.
//!   Rehash re-hashes the stored key bytes at the new size and drops all
//!   tombstones; nothing is cached per entry.
//! - The table never shrinks.
//!
//! Deletion
//! - A deleted slot becomes a tombstone. Lookups skip tombstones and stop
//!   at the first never-used slot; inserts reuse the first tombstone on
//!   their path. `used` counts live entries only.
//!
//! Hash randomization
//! - Each table draws a shift `p` in `[0, 32)` that selects which bits of
//!   the multiplicative hash survive. Pass a seeded `rand::Rng` to
//!   `OpenAddressingTable::with_options_and_rng` for reproducible layouts.
//!
//! Reentrancy
//! - Hashers and comparers are user code run mid-operation. A debug-only
//!   guard panics if they call back into the same table.
//!
//! Notes and non-goals
//! - No iteration order guarantees.
//! - No concurrent access, persistence or shrinking.

mod comparer;
mod guard;
mod hashers;
mod options;
mod probe;
mod table;
mod table_proptest;

// Public surface
pub use comparer::{BytesComparer, KeyComparer};
pub use hashers::{FnvHash, HashContext, KeyHasher, KnuthHash};
pub use options::{ConfigError, HashOptions, DEFAULT_LOAD_FACTOR, DEFAULT_SIZE};
pub use probe::{ProbeSeq, ProbeStrategy};
pub use table::{Handle, InsertError, Iter, IterMut, OpenAddressingTable};
