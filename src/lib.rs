//! oa-hashmap: a single-threaded HashMap built on open addressing with
//! linear probing and tombstone deletion.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep the whole map in one flat slot array so every operation
//!   is a short, cache-friendly walk over contiguous memory.
//! - Layout: `OpenAddressingMap<K, V, S>` owns a boxed slice of slots,
//!   each `Empty`, `Occupied { hash, key, value }`, or `Tombstone`.
//!   Capacity is always a power of two, so the start index is
//!   `hash & (capacity - 1)` and probing steps +1 with wraparound.
//!
//! Probe and tombstone discipline
//! - A lookup walks from the start index until it hits the key's
//!   occupied slot (found) or an empty slot (absent). Tombstones and
//!   non-matching entries are stepped over, never terminal: a removal
//!   marks its slot `Tombstone` rather than `Empty` so that keys
//!   displaced past it remain reachable.
//! - Inserts reuse the first tombstone seen on the probe path when the
//!   walk ends at an empty slot.
//!
//! Growth invariants
//! - An insert that would push `live + tombstones` past a 0.7 load
//!   factor first doubles the array (repeating until the live count
//!   alone fits) and reinserts every live entry; tombstones are dropped
//!   and the tombstone count resets to zero.
//! - The array therefore always keeps at least one empty slot, which is
//!   what makes every probe terminate. A probe that traverses the full
//!   capacity without resolving indicates corrupted state and panics.
//!
//! Hasher and rehashing invariants
//! - Each occupied slot stores a precomputed `u64` hash. Probing
//!   compares stored hashes before invoking `Eq`, and rehashing indexes
//!   by the stored hash alone; `K: Hash` is never invoked after
//!   insertion, so resize runs no user code.
//!
//! Reentrancy policy
//! - Operations that execute user `Hash`/`Eq`/`PartialEq` hold a
//!   debug-only reentrancy guard; user code calling back into the same
//!   map panics in debug builds instead of observing a mid-probe table.
//!
//! Notes and non-goals
//! - Single-threaded: the map is `!Sync`; callers needing to share it
//!   across threads must synchronize externally.
//! - Keys must keep a stable hash/equality relation while stored;
//!   violating that silently strands entries (the usual HashMap
//!   contract), it is not runtime-checked.
//! - Iteration order is slot order and carries no guarantee.
//! - `clear` returns to the baseline capacity rather than retaining the
//!   grown array.

mod open_addressing_map;
mod reentrancy;

// Public surface
pub use open_addressing_map::{
    IntoIter, Iter, IterMut, Keys, OpenAddressingMap, Values, ValuesMut, DEFAULT_CAPACITY,
};
