use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use im::OrdMap;

use super::Value;

/// Persistent string-keyed map. Keys iterate in sorted order, which keeps
/// rendering and serialization deterministic.
#[derive(Clone, Default)]
pub struct DictValue {
    entries: Arc<OrdMap<Arc<str>, Value>>,
}

impl DictValue {
    pub fn new() -> Self {
        Self::default()
    }

    fn wrap(entries: OrdMap<Arc<str>, Value>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Value)> + '_ {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Arc<str>> + '_ {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.entries.values()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &DictValue) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    pub fn put(&self, key: impl Into<Arc<str>>, value: Value) -> DictValue {
        Self::wrap(self.entries.update(key.into(), value))
    }

    /// Remove `key`; a missing key returns this same instance.
    pub fn delete(&self, key: &str) -> DictValue {
        if !self.contains_key(key) {
            return self.clone();
        }
        Self::wrap(self.entries.without(key))
    }

    /// Entries of `other` win over entries of `self`.
    pub fn merge(&self, other: &DictValue) -> DictValue {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut merged = (*self.entries).clone();
        for (key, value) in other.iter() {
            merged.insert(key.clone(), value.clone());
        }
        Self::wrap(merged)
    }
}

impl<K: Into<Arc<str>>> FromIterator<(K, Value)> for DictValue {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self::wrap(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl PartialEq for DictValue {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }
}

impl Hash for DictValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for (key, value) in self.iter() {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl fmt::Debug for DictValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
