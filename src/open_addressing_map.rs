//! OpenAddressingMap: flat slot array with linear probing and tombstones.

use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;

/// Baseline capacity for `new()` and the capacity `clear()` resets to.
pub const DEFAULT_CAPACITY: usize = 16;

/// Smallest capacity `with_capacity` will allocate after round-up.
const MIN_CAPACITY: usize = 4;

/// One position in the slot array. A removed entry becomes `Tombstone`,
/// never `Empty`: probe chains for keys inserted past it must keep
/// walking through this index. Tombstones only disappear on rehash.
#[derive(Clone, Debug)]
enum Slot<K, V> {
    Empty,
    Tombstone,
    Occupied { hash: u64, key: K, value: V },
}

impl<K, V> Default for Slot<K, V> {
    fn default() -> Self {
        Slot::Empty
    }
}

/// Outcome of walking a probe sequence for one key.
enum Probe {
    /// The key's occupied slot.
    Found(usize),
    /// The key is absent; this index is where an insert would land
    /// (first tombstone on the path, else the terminating empty slot).
    Vacant(usize),
}

/// A map storing every entry directly in one contiguous slot array.
///
/// Collisions are resolved by linear probing: each operation starts at
/// `hash & (capacity - 1)` and steps forward one slot at a time,
/// wrapping at the end. Inserts that would push the table past a 0.7
/// load factor (tombstones included) double the array and reinsert the
/// live entries, so the array always keeps at least one empty slot and
/// every probe terminates.
///
/// Each occupied slot stores the key's precomputed `u64` hash. Probing
/// compares stored hashes before calling `Eq`, and rehashing reuses
/// them, so `K: Hash` never runs after insertion.
pub struct OpenAddressingMap<K, V, S = ahash::RandomState> {
    slots: Box<[Slot<K, V>]>, // length is the capacity, always a power of two
    live: usize,
    tombstones: usize,
    hasher: S,
    reentrancy: DebugReentrancy,
}

impl<K, V> OpenAddressingMap<K, V> {
    /// An empty map with the default hasher and baseline capacity.
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, Default::default())
    }

    /// An empty map with room for `capacity` slots (rounded up to a
    /// power of two). Inserting past the load factor still grows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V, S: Default> Default for OpenAddressingMap<K, V, S> {
    fn default() -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default())
    }
}

fn empty_slots<K, V>(capacity: usize) -> Box<[Slot<K, V>]> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, Slot::default);
    slots.into_boxed_slice()
}

impl<K, V, S> OpenAddressingMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let capacity = capacity.next_power_of_two().max(MIN_CAPACITY);
        Self {
            slots: empty_slots(capacity),
            live: 0,
            tombstones: 0,
            hasher,
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Total slot count, occupied or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Drops every entry and returns to the baseline capacity.
    pub fn clear(&mut self) {
        self.slots = empty_slots(DEFAULT_CAPACITY);
        self.live = 0;
        self.tombstones = 0;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            slots: self.slots.iter_mut(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }
}

impl<K, V: PartialEq, S> OpenAddressingMap<K, V, S> {
    /// Whether any live entry holds `value`. Linear scan.
    pub fn contains_value(&self, value: &V) -> bool {
        let _g = self.reentrancy.enter();
        self.values().any(|v| v == value)
    }
}

impl<K, V, S> OpenAddressingMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn hash_of<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Walk the probe sequence for `key` starting at its hash-derived
    /// index: stop at the first empty slot (absent) or at the occupied
    /// slot whose key matches. Tombstones and non-matching entries are
    /// stepped over; the first tombstone seen is remembered as the
    /// insertion point so removed slots get reused.
    fn probe<Q>(&self, hash: u64, key: &Q) -> Probe
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mask = self.slots.len() - 1;
        let mut index = hash as usize & mask;
        let mut first_tombstone = None;
        for _ in 0..self.slots.len() {
            match &self.slots[index] {
                Slot::Empty => return Probe::Vacant(first_tombstone.unwrap_or(index)),
                Slot::Tombstone => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(index);
                    }
                }
                Slot::Occupied {
                    hash: stored,
                    key: occupant,
                    ..
                } => {
                    if *stored == hash && occupant.borrow() == key {
                        return Probe::Found(index);
                    }
                }
            }
            index = (index + 1) & mask;
        }
        // The resize in `insert` keeps at least one slot empty, so a
        // full traversal means the counters or slots are corrupt.
        panic!("probe sequence exhausted the table: load-factor invariant violated");
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        match self.probe(self.hash_of(key), key) {
            Probe::Found(index) => match &self.slots[index] {
                Slot::Occupied { value, .. } => Some(value),
                _ => unreachable!("probe resolved to a non-occupied slot"),
            },
            Probe::Vacant(_) => None,
        }
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        match self.probe(self.hash_of(key), key) {
            Probe::Found(index) => match &mut self.slots[index] {
                Slot::Occupied { value, .. } => Some(value),
                _ => unreachable!("probe resolved to a non-occupied slot"),
            },
            Probe::Vacant(_) => None,
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        matches!(self.probe(self.hash_of(key), key), Probe::Found(_))
    }

    /// Insert or update. Returns the previous value when `key` was
    /// already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        // Grow before probing (and before the guard: resize runs no
        // user code), so the probe below cannot exhaust the array.
        if self.over_threshold(self.live + self.tombstones + 1) {
            self.grow_to_fit(self.live + 1);
        }
        let _g = self.reentrancy.enter();
        let hash = self.hash_of(&key);
        match self.probe(hash, &key) {
            Probe::Found(index) => match &mut self.slots[index] {
                Slot::Occupied { value: slot, .. } => Some(mem::replace(slot, value)),
                _ => unreachable!("probe resolved to a non-occupied slot"),
            },
            Probe::Vacant(index) => {
                if matches!(self.slots[index], Slot::Tombstone) {
                    self.tombstones -= 1;
                }
                self.slots[index] = Slot::Occupied { hash, key, value };
                self.live += 1;
                None
            }
        }
    }

    /// Remove `key`, returning its value. The slot becomes a tombstone
    /// so other keys probing through this index stay reachable.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        match self.probe(self.hash_of(key), key) {
            Probe::Found(index) => {
                self.live -= 1;
                self.tombstones += 1;
                match mem::replace(&mut self.slots[index], Slot::Tombstone) {
                    Slot::Occupied { key, value, .. } => Some((key, value)),
                    _ => unreachable!("probe resolved to a non-occupied slot"),
                }
            }
            Probe::Vacant(_) => None,
        }
    }

    /// Grow now if `additional` more inserts could cross the load
    /// threshold, so a bulk load resizes at most once up front.
    pub fn reserve(&mut self, additional: usize) {
        let target = self.live + additional;
        if self.over_threshold(target + self.tombstones + 1) {
            self.grow_to_fit(target);
        }
    }

    // Load threshold of 0.7 in integer arithmetic.
    fn over_threshold(&self, used: usize) -> bool {
        used * 10 > self.capacity() * 7
    }

    fn grow_to_fit(&mut self, live_target: usize) {
        let mut new_capacity = self.capacity() * 2;
        while (live_target + 1) * 10 > new_capacity * 7 {
            new_capacity *= 2;
        }
        self.rehash_into(new_capacity);
    }

    /// Move every live entry into a fresh array of `new_capacity`
    /// slots, dropping tombstones. Placement uses the stored hashes and
    /// only looks for empty slots (live keys are unique, so no equality
    /// checks run). `live` is unchanged.
    fn rehash_into(&mut self, new_capacity: usize) {
        let old = mem::replace(&mut self.slots, empty_slots(new_capacity));
        self.tombstones = 0;
        let mask = new_capacity - 1;
        for slot in old.into_vec() {
            if let Slot::Occupied { hash, key, value } = slot {
                let mut index = hash as usize & mask;
                while !matches!(self.slots[index], Slot::Empty) {
                    index = (index + 1) & mask;
                }
                self.slots[index] = Slot::Occupied { hash, key, value };
            }
        }
    }
}

impl<K, V, S> Extend<(K, V)> for OpenAddressingMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        // Pre-size once; the result is identical to sequential inserts.
        let (low, _) = iter.size_hint();
        self.reserve(low);
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for OpenAddressingMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> fmt::Debug for OpenAddressingMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Clone, V: Clone, S: Clone> Clone for OpenAddressingMap<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            live: self.live,
            tombstones: self.tombstones,
            hasher: self.hasher.clone(),
            reentrancy: DebugReentrancy::new(),
        }
    }
}

/// Iterator over `(&K, &V)` in slot order (no ordering guarantee).
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Slot::Occupied { key, value, .. } = self.slots.next()? {
                return Some((key, value));
            }
        }
    }
}

/// Iterator over `(&K, &mut V)`. Keys stay immutable: rewriting a key
/// in place would break its probe chain.
pub struct IterMut<'a, K, V> {
    slots: core::slice::IterMut<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Slot::Occupied { key, value, .. } = self.slots.next()? {
                return Some((&*key, value));
            }
        }
    }
}

/// Owning iterator over `(K, V)`.
pub struct IntoIter<K, V> {
    slots: std::vec::IntoIter<Slot<K, V>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Slot::Occupied { key, value, .. } = self.slots.next()? {
                return Some((key, value));
            }
        }
    }
}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }
}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }
}

pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }
}

impl<K, V, S> IntoIterator for OpenAddressingMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            slots: self.slots.into_vec().into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a OpenAddressingMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut OpenAddressingMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
