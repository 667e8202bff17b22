use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub type FastHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

pub type FastHashSet<K> = rustc_hash::FxHashSet<K>;

/// Maps identifiers to values. Scopes and the global namespace use this.
pub type NameMap<V> = FastHashMap<Arc<str>, V>;

#[inline]
pub fn name_map_new<V>() -> NameMap<V> {
    rustc_hash::FxHashMap::default()
}

#[inline]
pub fn name_map_with_capacity<V>(capacity: usize) -> NameMap<V> {
    rustc_hash::FxHashMap::with_capacity_and_hasher(capacity, Default::default())
}

#[inline]
pub fn fast_hash_set_with_capacity<K>(capacity: usize) -> FastHashSet<K> {
    rustc_hash::FxHashSet::with_capacity_and_hasher(capacity, Default::default())
}

/// Hash that is the same on every run and platform, for seeding.
pub fn stable_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}
