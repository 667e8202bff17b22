use std::sync::Arc;

use crate::util::fast_map::{NameMap, name_map_new, name_map_with_capacity};
use crate::val::Value;

/// One lexical scope: the names bound by a let block, a match arm, a
/// function call or a pattern.
#[derive(Debug, Clone, Default)]
pub struct MemorySpace {
    bindings: NameMap<Value>,
}

impl MemorySpace {
    pub fn new() -> Self {
        Self { bindings: name_map_new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bindings: name_map_with_capacity(capacity),
        }
    }

    /// Bind `name`, shadowing an earlier binding of the same name in this scope.
    #[inline]
    pub fn bind(&mut self, name: impl Into<Arc<str>>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Value)> + '_ {
        self.bindings.iter()
    }

    /// Copy every binding of `other` into this scope, overriding clashes.
    pub fn absorb(&mut self, other: &MemorySpace) {
        for (name, value) in other.iter() {
            self.bindings.insert(name.clone(), value.clone());
        }
    }
}
